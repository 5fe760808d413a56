// ==========================================
// 赛事报名管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级问题不走错误通道,折叠进 ImportOutcome.errors;
//       本类型只承载批次无法启动的前置失败
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 前置失败（批次不启动）=====
    #[error("未找到数据行")]
    EmptyTable,

    #[error("必填字段未映射: {field}（请先为名/姓指定源列）")]
    MissingRequiredMapping { field: &'static str },

    #[error("字段映射冲突: 列 \"{column}\" 已被 {existing} 占用,身份字段 {field} 不可共用源列")]
    MappingConflict {
        column: String,
        existing: &'static str,
        field: &'static str,
    },

    // ===== 文件相关错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<crate::config::ConfigError> for ImportError {
    fn from(err: crate::config::ConfigError) -> Self {
        ImportError::ConfigReadError {
            key: err.key().unwrap_or("-").to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
