// ==========================================
// 窗帘软装报价系统 - 窗户报价汇总仓储
// ==========================================
// 红线: Repository 不含业务逻辑;派生在引擎层完成后才落库
// 存储: window_summary 表,整体 payload 为 JSON 文本,
//       window_id 为 upsert 键(最后写入者胜,无乐观锁)
// ==========================================

use crate::domain::window_summary::WindowSummary;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// WindowSummaryRepository - 报价汇总仓储
// ==========================================
pub struct WindowSummaryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WindowSummaryRepository {
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

    /// 按 window_id upsert(最后写入者胜)
    pub fn upsert(&self, summary: &WindowSummary) -> RepositoryResult<()> {
        if summary.window_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "window_id 不能为空".to_string(),
            ));
        }

        let conn = self.get_conn()?;
        let payload = serde_json::to_string(summary)?;

        conn.execute(
            r#"
            INSERT INTO window_summary (window_id, treatment_category, total_cost, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(window_id) DO UPDATE SET
                treatment_category = excluded.treatment_category,
                total_cost = excluded.total_cost,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            params![
                summary.window_id,
                summary.treatment_category,
                summary.total_cost,
                payload,
                summary.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按 window_id 查询
    pub fn find_by_window_id(&self, window_id: &str) -> RepositoryResult<Option<WindowSummary>> {
        let conn = self.get_conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM window_summary WHERE window_id = ?1",
                params![window_id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => {
                let summary: WindowSummary = serde_json::from_str(&json)?;
                Ok(Some(summary))
            }
            None => Ok(None),
        }
    }

    /// 列出全部汇总记录
    pub fn list(&self) -> RepositoryResult<Vec<WindowSummary>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT payload FROM window_summary ORDER BY window_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut summaries = Vec::new();
        for row in rows {
            let summary: WindowSummary = serde_json::from_str(&row?)?;
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// 删除汇总记录
    pub fn delete(&self, window_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM window_summary WHERE window_id = ?1",
            params![window_id],
        )?;
        Ok(affected > 0)
    }
}
