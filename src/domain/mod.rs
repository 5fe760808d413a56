// ==========================================
// 赛事报名管理系统 - 领域模型层
// ==========================================
// 职责: 实体与类型定义,不含业务流程
// ==========================================

pub mod athlete;
pub mod entry;
pub mod types;

pub use athlete::{Athlete, IdentityKey, Registration};
pub use entry::{
    ImportBatch, ImportOptions, ImportOutcome, ImportRowError, ImportTarget, RawEntryRecord,
};
pub use types::{Gender, ImportKind, ReconciliationDecision};
