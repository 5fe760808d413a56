// ==========================================
// 赛事报名管理系统 - 导入编排 Trait
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.6 批次编排
// 职责: 定义批量导入接口与进度上报接口(不包含实现)
// ==========================================

use crate::domain::entry::{ImportOptions, ImportOutcome, ImportTarget};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapping;
use crate::importer::table_parser::RawTable;
use async_trait::async_trait;
use tracing::info;

// ==========================================
// EntryImporter Trait
// ==========================================
// 用途: 批量导入主接口
// 实现者: EntryImporterImpl
#[async_trait]
pub trait EntryImporter: Send + Sync {
    /// 导入一张已解析、已映射的表
    ///
    /// # 参数
    /// - table: 解析产物(只读)
    /// - mapping: 已校验或待校验的字段映射
    /// - target: 目标赛事/比赛
    /// - options: 流程种类、历史报名附加列、取消标记等
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 计数器 + 有序错误列表(批次唯一产物)
    /// - Err: 前置失败(空表/必填映射缺失),未处理任何行
    async fn import_table(
        &self,
        table: &RawTable,
        mapping: &FieldMapping,
        target: &ImportTarget,
        options: &ImportOptions,
    ) -> ImportResult<ImportOutcome>;

    /// 从原始分隔文本导入(探测布局 + 解析 + 自动映射)
    ///
    /// # 说明
    /// - 识别到厂商布局时使用其预置映射,否则对列头查字典
    /// - 需要手工调整映射的调用方应自行组合探测/解析/映射后走 import_table
    async fn import_text(
        &self,
        text: &str,
        target: &ImportTarget,
        options: &ImportOptions,
    ) -> ImportResult<ImportOutcome>;
}

// ==========================================
// ProgressReporter Trait
// ==========================================
// 用途: 批次进度流 (当前行, 总行数);上报频率由配置控制
pub trait ProgressReporter: Send + Sync {
    fn report(&self, current_row: usize, total_rows: usize);
}

/// 静默进度上报(非交互场景)
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _current_row: usize, _total_rows: usize) {}
}

/// 日志进度上报
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, current_row: usize, total_rows: usize) {
        info!(current = current_row, total = total_rows, "导入进度");
    }
}
