// ==========================================
// 赛事报名管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载与查询
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_ERROR_PREVIEW_LIMIT, DEFAULT_PROGRESS_INTERVAL,
};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 配置键: 进度上报间隔
pub const KEY_PROGRESS_INTERVAL: &str = "import/progress_interval";
/// 配置键: 错误预览条数
pub const KEY_ERROR_PREVIEW_LIMIT: &str = "import/error_preview_limit";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建(对传入连接再次应用统一 PRAGMA,幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 读取 usize 配置,缺失用默认值,格式错误报 ValueError
    fn get_usize_or(&self, key: &str, default: usize) -> ConfigResult<usize> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::ValueError {
                key: key.to_string(),
                value: raw,
            }),
        }
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_progress_interval(&self) -> ConfigResult<usize> {
        let interval = self.get_usize_or(KEY_PROGRESS_INTERVAL, DEFAULT_PROGRESS_INTERVAL)?;
        // 间隔为 0 会让上报失去意义,按 1 处理
        Ok(interval.max(1))
    }

    async fn get_error_preview_limit(&self) -> ConfigResult<usize> {
        self.get_usize_or(KEY_ERROR_PREVIEW_LIMIT, DEFAULT_ERROR_PREVIEW_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize_schema;

    fn manager_with(pairs: &[(&str, &str)]) -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        for (key, value) in pairs {
            conn.execute(
                "INSERT INTO config_kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .unwrap();
        }
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let config = manager_with(&[]);
        assert_eq!(
            config.get_progress_interval().await.unwrap(),
            DEFAULT_PROGRESS_INTERVAL
        );
        assert_eq!(
            config.get_error_preview_limit().await.unwrap(),
            DEFAULT_ERROR_PREVIEW_LIMIT
        );
    }

    #[tokio::test]
    async fn test_reads_configured_values() {
        let config = manager_with(&[(KEY_PROGRESS_INTERVAL, "100")]);
        assert_eq!(config.get_progress_interval().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_zero_interval_clamped_to_one() {
        let config = manager_with(&[(KEY_PROGRESS_INTERVAL, "0")]);
        assert_eq!(config.get_progress_interval().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_value_is_error() {
        let config = manager_with(&[(KEY_PROGRESS_INTERVAL, "beaucoup")]);
        assert!(matches!(
            config.get_progress_interval().await,
            Err(ConfigError::ValueError { .. })
        ));
    }
}
