// ==========================================
// 窗帘软装报价系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::{MeasurementUnit, DEFAULT_MM_THRESHOLD};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 单位量级推断阈值(轴数值达到该值按毫米口径)
    pub const UNIT_INFERENCE_MM_THRESHOLD: &str = "import/unit_inference_mm_threshold";

    /// 未声明单位且无法推断时的默认网格单位
    pub const DEFAULT_GRID_UNIT: &str = "import/default_grid_unit";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（scope_id='global'）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    // ==========================================
    // 类型化读取
    // ==========================================

    /// 单位量级推断阈值
    pub fn get_unit_inference_mm_threshold(&self) -> Result<f64, Box<dyn Error>> {
        let raw = self.get_config_or_default(
            config_keys::UNIT_INFERENCE_MM_THRESHOLD,
            &DEFAULT_MM_THRESHOLD.to_string(),
        )?;
        let value: f64 = raw
            .parse()
            .map_err(|e| format!("配置值格式错误 ({}): {}", raw, e))?;
        Ok(value)
    }

    /// 默认网格单位
    pub fn get_default_grid_unit(&self) -> Result<MeasurementUnit, Box<dyn Error>> {
        let raw = self.get_config_or_default(config_keys::DEFAULT_GRID_UNIT, "cm")?;
        MeasurementUnit::from_str(&raw)
            .ok_or_else(|| format!("配置值格式错误 ({}): 期望 mm/cm", raw).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_without_rows() {
        let config = setup();
        assert_eq!(
            config.get_unit_inference_mm_threshold().unwrap(),
            DEFAULT_MM_THRESHOLD
        );
        assert_eq!(
            config.get_default_grid_unit().unwrap(),
            MeasurementUnit::Cm
        );
    }

    #[test]
    fn test_set_and_read_back() {
        let config = setup();
        config
            .set_config_value(config_keys::UNIT_INFERENCE_MM_THRESHOLD, "800")
            .unwrap();
        assert_eq!(config.get_unit_inference_mm_threshold().unwrap(), 800.0);

        config
            .set_config_value(config_keys::DEFAULT_GRID_UNIT, "mm")
            .unwrap();
        assert_eq!(
            config.get_default_grid_unit().unwrap(),
            MeasurementUnit::Mm
        );
    }

    #[test]
    fn test_overwrite_value() {
        let config = setup();
        config
            .set_config_value(config_keys::DEFAULT_GRID_UNIT, "mm")
            .unwrap();
        config
            .set_config_value(config_keys::DEFAULT_GRID_UNIT, "cm")
            .unwrap();
        assert_eq!(
            config.get_default_grid_unit().unwrap(),
            MeasurementUnit::Cm
        );
    }
}
