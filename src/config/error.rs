// ==========================================
// 赛事报名管理系统 - 配置层错误类型
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("配置查询失败: {0}")]
    QueryError(String),

    #[error("配置值格式错误 (key: {key}, value: {value})")]
    ValueError { key: String, value: String },
}

impl ConfigError {
    /// 关联的配置键(若有)
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::ValueError { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::QueryError(err.to_string())
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
