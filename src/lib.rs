// ==========================================
// 赛事报名管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 成绩/历史报名批量导入与身份比对管道
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 收尾派生计算
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施(连接初始化/PRAGMA 统一)
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Gender, ImportKind, ReconciliationDecision};

// 领域实体
pub use domain::{
    Athlete, IdentityKey, ImportBatch, ImportOptions, ImportOutcome, ImportRowError, ImportTarget,
    RawEntryRecord, Registration,
};

// 导入管道
pub use importer::{
    CanonicalField, EntryImporter, EntryImporterImpl, FieldMapper, FieldMapping, FormatDetector,
    ImportError, LogProgress, NoopProgress, ProgressReporter, RawTable, ReconciliationEngine,
    TableLayout, TableParser, ValueNormalizer,
};

// 仓储与引擎
pub use engine::{CategoryRecalculator, SqliteCategoryRecalc};
pub use repository::{AthleteRepository, RepositoryError, SqliteAthleteRepository};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "赛事报名管理系统";
