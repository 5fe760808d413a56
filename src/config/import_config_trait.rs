// ==========================================
// 赛事报名管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口(不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use async_trait::async_trait;

/// 进度上报间隔默认值(行)
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// 批次汇总里展示给运营的错误条目上限默认值
pub const DEFAULT_ERROR_PREVIEW_LIMIT: usize = 5;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager(从 config_kv 表读取), StaticImportConfig
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 进度上报与协作式让出的行间隔
    ///
    /// # 默认值
    /// - 50
    async fn get_progress_interval(&self) -> ConfigResult<usize>;

    /// 批次汇总展示的错误条目上限
    ///
    /// # 默认值
    /// - 5
    async fn get_error_preview_limit(&self) -> ConfigResult<usize>;
}

// ==========================================
// StaticImportConfig - 固定值配置
// ==========================================
// 用途: 测试与无配置库场景
#[derive(Debug, Clone)]
pub struct StaticImportConfig {
    pub progress_interval: usize,
    pub error_preview_limit: usize,
}

impl Default for StaticImportConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            error_preview_limit: DEFAULT_ERROR_PREVIEW_LIMIT,
        }
    }
}

#[async_trait]
impl ImportConfigReader for StaticImportConfig {
    async fn get_progress_interval(&self) -> ConfigResult<usize> {
        Ok(self.progress_interval)
    }

    async fn get_error_preview_limit(&self) -> ConfigResult<usize> {
        Ok(self.error_preview_limit)
    }
}
