// ==========================================
// 赛事报名管理系统 - 导入层
// ==========================================
// 职责: 外部成绩/报名文件 → 选手库
// 流程: 探测 → 解析 → 映射 → 归一化 → 身份比对 → 落库
// ==========================================

// 模块声明
pub mod entry_importer_impl;
pub mod entry_importer_trait;
pub mod error;
pub mod field_mapper;
pub mod format_detector;
pub mod reconciliation;
pub mod table_parser;
pub mod value_normalizer;

// 重导出核心类型
pub use entry_importer_impl::EntryImporterImpl;
pub use entry_importer_trait::{EntryImporter, LogProgress, NoopProgress, ProgressReporter};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{CanonicalField, FieldMapper, FieldMapping};
pub use format_detector::{DetectedFormat, FormatDetector, VENDOR_SIGNATURE};
pub use reconciliation::ReconciliationEngine;
pub use table_parser::{RawTable, TableLayout, TableParser};
pub use value_normalizer::ValueNormalizer;
