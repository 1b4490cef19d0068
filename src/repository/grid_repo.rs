// ==========================================
// 窗帘软装报价系统 - 价格网格仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 存储: pricing_grid 表,grid_data 为 JSON 文本
// 生命周期: 上传创建 → 只读使用 → 软删除(active=0)或硬删除
// ==========================================

use crate::domain::pricing_grid::{GridData, PricingGrid};
use crate::domain::types::MeasurementUnit;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PricingGridRepository - 价格网格仓储
// ==========================================
pub struct PricingGridRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PricingGridRepository {
    /// 创建仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入新网格
    pub fn insert(&self, grid: &PricingGrid) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let grid_data_json = serde_json::to_string(&grid.grid_data)?;

        conn.execute(
            r#"
            INSERT INTO pricing_grid (grid_id, name, unit, grid_data, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                grid.grid_id,
                grid.name,
                grid.unit.map(|u| u.to_db_str()),
                grid_data_json,
                grid.active,
                grid.created_at,
                grid.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按 grid_id 查询(含已软删除)
    pub fn find_by_id(&self, grid_id: &str) -> RepositoryResult<Option<PricingGrid>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT grid_id, name, unit, grid_data, active, created_at, updated_at
            FROM pricing_grid
            WHERE grid_id = ?1
            "#,
        )?;
        let grid = stmt
            .query_row(params![grid_id], Self::map_row)
            .optional()?;
        Ok(grid)
    }

    /// 按名称查询(仅 active)
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<PricingGrid>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT grid_id, name, unit, grid_data, active, created_at, updated_at
            FROM pricing_grid
            WHERE name = ?1 AND active = 1
            "#,
        )?;
        let grid = stmt.query_row(params![name], Self::map_row).optional()?;
        Ok(grid)
    }

    /// 列出网格
    ///
    /// # 参数
    /// - include_inactive: 是否包含已软删除的网格
    pub fn list(&self, include_inactive: bool) -> RepositoryResult<Vec<PricingGrid>> {
        let conn = self.get_conn()?;
        let sql = if include_inactive {
            r#"
            SELECT grid_id, name, unit, grid_data, active, created_at, updated_at
            FROM pricing_grid
            ORDER BY name
            "#
        } else {
            r#"
            SELECT grid_id, name, unit, grid_data, active, created_at, updated_at
            FROM pricing_grid
            WHERE active = 1
            ORDER BY name
            "#
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], Self::map_row)?;

        let mut grids = Vec::new();
        for row in rows {
            grids.push(row?);
        }
        Ok(grids)
    }

    /// 软删除(active=0)
    ///
    /// # 返回
    /// - true: 有记录被标记
    pub fn soft_delete(&self, grid_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE pricing_grid SET active = 0, updated_at = ?2 WHERE grid_id = ?1",
            params![grid_id, Utc::now()],
        )?;
        Ok(affected > 0)
    }

    /// 硬删除
    pub fn hard_delete(&self, grid_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM pricing_grid WHERE grid_id = ?1",
            params![grid_id],
        )?;
        Ok(affected > 0)
    }

    /// 行映射
    fn map_row(row: &Row<'_>) -> rusqlite::Result<PricingGrid> {
        let unit_str: Option<String> = row.get(2)?;
        let grid_data_json: String = row.get(3)?;
        let grid_data: GridData = serde_json::from_str(&grid_data_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        Ok(PricingGrid {
            grid_id: row.get(0)?,
            name: row.get(1)?,
            unit: unit_str.as_deref().and_then(MeasurementUnit::from_str),
            grid_data,
            active: row.get(4)?,
            created_at: row.get::<_, DateTime<Utc>>(5)?,
            updated_at: row.get::<_, DateTime<Utc>>(6)?,
        })
    }
}
