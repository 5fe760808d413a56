// ==========================================
// 赛事报名管理系统 - 选手仓储 Trait
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 6. 外部接口
// 职责: 定义选手/报名数据访问接口(不包含实现)
// 红线: Repository 不含业务规则,只做数据 CRUD;
//       重复报名由 UNIQUE(athlete_id, race_id) 兜底并以
//       DuplicateRegistration 显式暴露
// ==========================================

use crate::domain::athlete::Athlete;
use crate::domain::entry::{ImportBatch, ImportTarget, RawEntryRecord};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// AthleteRepository Trait
// ==========================================
// 用途: 导入管道消费的选手库接口
// 实现者: SqliteAthleteRepository
#[async_trait]
pub trait AthleteRepository: Send + Sync {
    // ===== 查询 =====

    /// 按姓名查找候选选手(忽略大小写)
    ///
    /// # 返回
    /// - Ok(Vec<Athlete>): 姓名匹配的全部候选(可能为空)
    async fn find_athletes_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> RepositoryResult<Vec<Athlete>>;

    /// 选手是否已关联指定比赛
    async fn is_registered(&self, athlete_id: i64, race_id: &str) -> RepositoryResult<bool>;

    // ===== 写入 =====

    /// 新建选手
    ///
    /// # 返回
    /// - Ok(i64): 新选手的 athlete_id
    async fn create_athlete(&self, record: &RawEntryRecord) -> RepositoryResult<i64>;

    /// 将选手关联到比赛(写入成绩/报名字段)
    ///
    /// # 返回
    /// - Ok(i64): registration_id
    /// - Err(DuplicateRegistration): 唯一约束拦截的重复报名
    async fn create_registration(
        &self,
        athlete_id: i64,
        target: &ImportTarget,
        record: &RawEntryRecord,
    ) -> RepositoryResult<i64>;

    // ===== 批次审计 =====

    /// 落一条导入批次审计记录
    async fn insert_import_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    // ===== 统计(测试与运营用) =====

    /// 统计选手总数
    async fn count_athletes(&self) -> RepositoryResult<usize>;

    /// 统计某比赛的报名数
    async fn count_registrations(&self, race_id: &str) -> RepositoryResult<usize>;
}
