// ==========================================
// 赛事报名管理系统 - 导入领域模型
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 3. 数据模型
// 生命周期: RawEntryRecord 仅存活于单行处理;
//           ImportOutcome 是批次返回给调用方的唯一产物
// ==========================================

use crate::domain::types::{Gender, ImportKind};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

// ==========================================
// RawEntryRecord - 归一化后的单行记录
// ==========================================
// 用途: 导入管道中间产物（表格解析 → 字段映射 → 值归一化 → 此结构）
// 说明: 不可解析的日期/成绩/数字一律降级为 None,不产生行错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntryRecord {
    // ===== 身份字段 =====
    pub first_name: Option<String>,      // 名（批次前置校验要求已映射）
    pub last_name: Option<String>,       // 姓（批次前置校验要求已映射）
    pub birth_date: Option<NaiveDate>,   // 出生日期（ISO）
    pub birth_year: Option<i32>,         // 出生年份

    // ===== 基础信息 =====
    pub gender: Gender,                  // 性别（无缺失状态,默认 F）
    pub city: Option<String>,
    pub club: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    // ===== 成绩字段 =====
    pub bib_number: Option<i64>,         // 号码布
    pub category: Option<String>,        // 组别
    pub finish_time: Option<String>,     // 完赛成绩（HH:MM:SS）
    pub overall_rank: Option<i64>,
    pub gender_rank: Option<i64>,
    pub category_rank: Option<i64>,

    // ===== 历史报名附加字段 =====
    pub payment_amount: Option<f64>,     // 缴费金额（仅历史报名流程）
    pub notes: Option<String>,           // 备注列原文拼接

    // ===== 元信息 =====
    pub row_number: usize,               // 数据区行号（1 起,用于错误定位）
}

impl RawEntryRecord {
    pub fn empty(row_number: usize) -> Self {
        Self {
            first_name: None,
            last_name: None,
            birth_date: None,
            birth_year: None,
            gender: Gender::F,
            city: None,
            club: None,
            email: None,
            phone: None,
            bib_number: None,
            category: None,
            finish_time: None,
            overall_rank: None,
            gender_rank: None,
            category_rank: None,
            payment_amount: None,
            notes: None,
            row_number,
        }
    }

    /// 行定位标签（错误列表用）
    pub fn row_label(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => {
                format!("第 {} 行（{} {}）", self.row_number, first, last)
            }
            _ => format!("第 {} 行", self.row_number),
        }
    }
}

// ==========================================
// ImportTarget - 导入目标
// ==========================================
// 说明: 赛事/比赛目录由外部系统维护,此处仅携带标识
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTarget {
    pub event_id: String,
    pub race_id: String,
}

// ==========================================
// ImportOptions - 批次运行选项
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// 导入流程种类
    pub kind: Option<ImportKind>,

    /// 批次审计用的来源描述（通常为源文件名）
    pub source_label: Option<String>,

    /// 历史报名: 缴费金额列（按源列名取原始值,数值解析失败 → None）
    pub amount_column: Option<String>,

    /// 历史报名: 备注列列表（原文拼接进 notes,不做任何解析）
    pub note_columns: Vec<String>,

    /// 协作式取消标记（每行之间检查一次;取消后已提交的行保持不变）
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl ImportOptions {
    pub fn kind(&self) -> ImportKind {
        self.kind.unwrap_or(ImportKind::TimingResults)
    }
}

// ==========================================
// ImportRowError - 单行错误条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row_label: String,
    pub message: String,
}

// ==========================================
// ImportOutcome - 批次结果
// ==========================================
// 用途: 批次唯一返回产物,含计数器与有序错误列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub imported: usize,             // 成功导入（新建或复用后关联）
    pub skipped_duplicates: usize,   // 跳过的重复报名（非错误）
    pub errors: Vec<ImportRowError>, // 行级错误（文件顺序）
}

impl ImportOutcome {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn record_error(&mut self, row_label: String, message: String) {
        self.errors.push(ImportRowError { row_label, message });
    }
}

// ==========================================
// ImportBatch - 导入批次审计记录
// ==========================================
// 用途: 每次批次运行落一条,供运营回看;不影响 ImportOutcome
// 对齐: import_batch 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,                // 批次 ID（UUID）
    pub race_id: String,                 // 目标比赛
    pub source_label: Option<String>,    // 源文件名或来源描述
    pub total_rows: i64,                 // 数据区总行数
    pub imported: i64,                   // 成功导入行数
    pub skipped_duplicates: i64,         // 跳过重复行数
    pub error_rows: i64,                 // 错误行数
    pub elapsed_ms: Option<i64>,         // 耗时（毫秒）
    pub imported_at: DateTime<Utc>,      // 批次完成时间
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_label_with_name() {
        let mut record = RawEntryRecord::empty(7);
        record.first_name = Some("Marie".to_string());
        record.last_name = Some("Dupont".to_string());
        assert_eq!(record.row_label(), "第 7 行（Marie Dupont）");
    }

    #[test]
    fn test_row_label_without_name() {
        let record = RawEntryRecord::empty(3);
        assert_eq!(record.row_label(), "第 3 行");
    }

    #[test]
    fn test_outcome_counters() {
        let mut outcome = ImportOutcome::default();
        outcome.imported += 1;
        outcome.record_error("第 2 行".to_string(), "缺少姓名".to_string());
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.error_count(), 1);
    }
}
