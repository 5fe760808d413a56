// ==========================================
// 赛事报名管理系统 - 身份比对引擎实现
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.5 身份比对
// 职责: 单行记录 vs 选手库 → CREATE_NEW / REUSE_EXISTING / SKIP_DUPLICATE
// 红线: 身份仅由(名, 姓, 出生日期)三元组判定,邮箱不参与去重;
//       出生日期缺失永不匹配,宁可重建不可误合并
// ==========================================

use crate::domain::athlete::IdentityKey;
use crate::domain::entry::RawEntryRecord;
use crate::domain::types::ReconciliationDecision;
use crate::repository::athlete_repo::AthleteRepository;
use tracing::warn;

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    /// 比对单行记录
    ///
    /// # 流程
    /// 1. 按姓名(忽略大小写)查候选选手
    /// 2. 候选中找出生日期精确相等者;无 → CREATE_NEW
    /// 3. 命中者已关联本比赛 → SKIP_DUPLICATE,否则 REUSE_EXISTING
    ///
    /// # 失败语义
    /// 选手库查询失败记日志并按 CREATE_NEW 处理(fail-open,
    /// 避免临时故障卡死整个批次;该策略待产品确认)
    pub async fn reconcile<R: AthleteRepository>(
        &self,
        repo: &R,
        record: &RawEntryRecord,
        race_id: &str,
    ) -> ReconciliationDecision {
        let first_name = record.first_name.as_deref().unwrap_or("");
        let last_name = record.last_name.as_deref().unwrap_or("");

        let candidates = match repo.find_athletes_by_name(first_name, last_name).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    row = record.row_number,
                    error = %e,
                    "选手库查询失败,按新建处理"
                );
                return ReconciliationDecision::CreateNew;
            }
        };

        let key = IdentityKey::new(first_name, last_name, record.birth_date);
        let Some(matched) = candidates.iter().find(|a| key.matches(a)) else {
            return ReconciliationDecision::CreateNew;
        };

        match repo.is_registered(matched.athlete_id, race_id).await {
            Ok(true) => ReconciliationDecision::SkipDuplicate,
            Ok(false) => ReconciliationDecision::ReuseExisting(matched.athlete_id),
            Err(e) => {
                warn!(
                    row = record.row_number,
                    athlete_id = matched.athlete_id,
                    error = %e,
                    "报名关联查询失败,按新建处理"
                );
                ReconciliationDecision::CreateNew
            }
        }
    }
}
