// ==========================================
// 赛事报名管理系统 - 导入编排器实现
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.6 批次编排
// ==========================================
// 职责: 整合导入流程,从文本/表格到选手库
// 流程: 探测 → 解析 → 映射 → 归一化 → 身份比对 → 落库 → 收尾重算
// 红线: 行间严格顺序执行(后行的比对依赖前行已建选手);
//       行级失败只进错误列表,不中断批次
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::entry::{
    ImportBatch, ImportOptions, ImportOutcome, ImportTarget, RawEntryRecord,
};
use crate::domain::types::{ImportKind, ReconciliationDecision};
use crate::engine::category_recalc::CategoryRecalculator;
use crate::importer::entry_importer_trait::{EntryImporter, ProgressReporter};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{CanonicalField, FieldMapper, FieldMapping};
use crate::importer::format_detector::FormatDetector;
use crate::importer::reconciliation::ReconciliationEngine;
use crate::importer::table_parser::{RawTable, TableParser};
use crate::importer::value_normalizer::ValueNormalizer;
use crate::repository::athlete_repo::AthleteRepository;
use crate::repository::error::RepositoryError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// EntryImporterImpl - 导入编排器实现
// ==========================================
pub struct EntryImporterImpl<R, C>
where
    R: AthleteRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    athlete_repo: R,

    // 配置读取器
    config: C,

    // 管道组件
    format_detector: FormatDetector,
    table_parser: TableParser,
    field_mapper: FieldMapper,
    normalizer: ValueNormalizer,
    reconciliation: ReconciliationEngine,

    // 收尾钩子与进度上报
    recalc: Box<dyn CategoryRecalculator>,
    progress: Box<dyn ProgressReporter>,
}

impl<R, C> EntryImporterImpl<R, C>
where
    R: AthleteRepository,
    C: ImportConfigReader,
{
    /// 创建新的 EntryImporter 实例
    ///
    /// # 参数
    /// - athlete_repo: 选手库仓储
    /// - config: 配置读取器
    /// - recalc: 批次收尾的组别名次重算钩子
    /// - progress: 进度上报器
    pub fn new(
        athlete_repo: R,
        config: C,
        recalc: Box<dyn CategoryRecalculator>,
        progress: Box<dyn ProgressReporter>,
    ) -> Self {
        Self {
            athlete_repo,
            config,
            format_detector: FormatDetector,
            table_parser: TableParser,
            field_mapper: FieldMapper,
            normalizer: ValueNormalizer,
            reconciliation: ReconciliationEngine,
            recalc,
            progress,
        }
    }
}

#[async_trait::async_trait]
impl<R, C> EntryImporter for EntryImporterImpl<R, C>
where
    R: AthleteRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, table, mapping, options), fields(race_id = %target.race_id))]
    async fn import_table(
        &self,
        table: &RawTable,
        mapping: &FieldMapping,
        target: &ImportTarget,
        options: &ImportOptions,
    ) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        // === 前置校验: 名/姓必须已映射,空表不启动 ===
        mapping.validate()?;
        let total_rows = table.row_count();
        if total_rows == 0 {
            return Err(ImportError::EmptyTable);
        }

        let progress_interval = self.config.get_progress_interval().await?;

        info!(
            batch_id = %batch_id,
            total_rows = total_rows,
            kind = ?options.kind(),
            "开始导入批次"
        );

        let mut outcome = ImportOutcome::default();

        for (idx, row) in table.rows.iter().enumerate() {
            // 协作式取消: 每行之间检查一次,已提交的行保持不变
            if let Some(flag) = &options.cancel_flag {
                if flag.load(Ordering::Relaxed) {
                    info!(processed = idx, total_rows, "批次被取消");
                    break;
                }
            }

            let row_number = idx + 1;
            let record = self.normalize_record(row, mapping, options, row_number);

            self.process_record(&record, target, &mut outcome).await;

            let processed = idx + 1;
            if processed % progress_interval == 0 || processed == total_rows {
                self.progress.report(processed, total_rows);
                // 让出执行权,保持宿主响应;对正确性无影响
                tokio::task::yield_now().await;
            }
        }

        // === 收尾: 整场比赛重算一次组别名次 ===
        if let Err(e) = self.recalc.recalculate_categories(&target.race_id).await {
            // 行数据已提交,重算失败不作废批次
            error!(race_id = %target.race_id, error = %e, "组别名次重算失败");
        }

        // === 批次审计记录 ===
        let batch = ImportBatch {
            batch_id: batch_id.clone(),
            race_id: target.race_id.clone(),
            source_label: options.source_label.clone(),
            total_rows: total_rows as i64,
            imported: outcome.imported as i64,
            skipped_duplicates: outcome.skipped_duplicates as i64,
            error_rows: outcome.error_count() as i64,
            elapsed_ms: Some(start_time.elapsed().as_millis() as i64),
            imported_at: Utc::now(),
        };
        if let Err(e) = self.athlete_repo.insert_import_batch(&batch).await {
            warn!(batch_id = %batch_id, error = %e, "批次审计记录写入失败");
        }

        info!(
            batch_id = %batch_id,
            imported = outcome.imported,
            skipped = outcome.skipped_duplicates,
            errors = outcome.error_count(),
            elapsed_ms = start_time.elapsed().as_millis() as i64,
            "导入批次完成"
        );

        Ok(outcome)
    }

    async fn import_text(
        &self,
        text: &str,
        target: &ImportTarget,
        options: &ImportOptions,
    ) -> ImportResult<ImportOutcome> {
        let detected = self.format_detector.detect(text);
        let table = self.table_parser.parse(text, &detected.layout)?;

        let mapping = match detected.preset_mapping {
            Some(preset) => preset,
            None => self.field_mapper.auto_map(&table.headers),
        };

        self.import_table(&table, &mapping, target, options).await
    }
}

// 辅助方法
impl<R, C> EntryImporterImpl<R, C>
where
    R: AthleteRepository,
    C: ImportConfigReader,
{
    /// 取某规范字段在本行的原始值(未映射或无此列 → 空串)
    fn raw_value<'a>(
        row: &'a HashMap<String, String>,
        mapping: &FieldMapping,
        field: CanonicalField,
    ) -> &'a str {
        mapping
            .source_column(field)
            .and_then(|column| row.get(column))
            .map(|value| value.as_str())
            .unwrap_or("")
    }

    /// 单行归一化: 映射列逐字段做全量转换
    fn normalize_record(
        &self,
        row: &HashMap<String, String>,
        mapping: &FieldMapping,
        options: &ImportOptions,
        row_number: usize,
    ) -> RawEntryRecord {
        let raw = |field| Self::raw_value(row, mapping, field);
        let mut record = RawEntryRecord::empty(row_number);

        // 身份字段
        record.first_name = self.normalizer.blank_to_none(raw(CanonicalField::FirstName));
        record.last_name = self.normalizer.blank_to_none(raw(CanonicalField::LastName));
        record.birth_date = self.normalizer.normalize_date(raw(CanonicalField::BirthDate));
        record.birth_year = self
            .normalizer
            .normalize_int(raw(CanonicalField::BirthYear))
            .map(|year| year as i32);

        // 基础信息
        record.gender = self.normalizer.normalize_gender(raw(CanonicalField::Gender));
        record.city = self.normalizer.blank_to_none(raw(CanonicalField::City));
        record.club = self.normalizer.blank_to_none(raw(CanonicalField::Club));
        record.email = self.normalizer.blank_to_none(raw(CanonicalField::Email));
        record.phone = self.normalizer.blank_to_none(raw(CanonicalField::Phone));

        // 成绩字段
        record.bib_number = self.normalizer.normalize_int(raw(CanonicalField::BibNumber));
        record.category = self.normalizer.blank_to_none(raw(CanonicalField::Category));
        record.finish_time = self
            .normalizer
            .normalize_finish_time(raw(CanonicalField::FinishTime));
        record.overall_rank = self.normalizer.normalize_int(raw(CanonicalField::OverallRank));
        record.gender_rank = self.normalizer.normalize_int(raw(CanonicalField::GenderRank));
        record.category_rank = self
            .normalizer
            .normalize_int(raw(CanonicalField::CategoryRank));

        // 历史报名附加列: 金额列按调用方指定优先,备注列原文拼接
        record.payment_amount = match &options.amount_column {
            Some(column) => row
                .get(column)
                .and_then(|value| self.normalizer.normalize_amount(value)),
            None => self
                .normalizer
                .normalize_amount(raw(CanonicalField::PaymentAmount)),
        };

        if options.kind() == ImportKind::LegacyRegistration && !options.note_columns.is_empty() {
            let notes: Vec<&str> = options
                .note_columns
                .iter()
                .filter_map(|column| row.get(column))
                .map(|value| value.as_str())
                .filter(|value| !value.trim().is_empty())
                .collect();
            if !notes.is_empty() {
                record.notes = Some(notes.join("; "));
            }
        }

        record
    }

    /// 单行处理: 比对 → 落库,结果折叠进 outcome
    async fn process_record(
        &self,
        record: &RawEntryRecord,
        target: &ImportTarget,
        outcome: &mut ImportOutcome,
    ) {
        // 归一化后姓名缺失: 行级错误,不建任何记录
        if record.first_name.is_none() || record.last_name.is_none() {
            debug!(row = record.row_number, "缺少姓名,跳过");
            outcome.record_error(record.row_label(), "缺少姓名".to_string());
            return;
        }

        let decision = self
            .reconciliation
            .reconcile(&self.athlete_repo, record, &target.race_id)
            .await;

        match decision {
            ReconciliationDecision::SkipDuplicate => {
                debug!(row = record.row_number, "重复报名,跳过");
                outcome.skipped_duplicates += 1;
            }
            ReconciliationDecision::CreateNew => {
                match self.create_and_link(record, target).await {
                    Ok(athlete_id) => {
                        debug!(row = record.row_number, athlete_id, "新建选手并关联");
                        outcome.imported += 1;
                    }
                    Err(e) => {
                        warn!(row = record.row_number, error = %e, "新建选手写入失败");
                        outcome.record_error(record.row_label(), Self::write_error_message(&e));
                    }
                }
            }
            ReconciliationDecision::ReuseExisting(athlete_id) => {
                match self
                    .athlete_repo
                    .create_registration(athlete_id, target, record)
                    .await
                {
                    Ok(_) => {
                        debug!(row = record.row_number, athlete_id, "复用选手并关联");
                        outcome.imported += 1;
                    }
                    Err(e) => {
                        warn!(row = record.row_number, athlete_id, error = %e, "报名关联写入失败");
                        outcome.record_error(record.row_label(), Self::write_error_message(&e));
                    }
                }
            }
        }
    }

    /// CREATE_NEW: 先建选手再关联比赛
    async fn create_and_link(
        &self,
        record: &RawEntryRecord,
        target: &ImportTarget,
    ) -> Result<i64, RepositoryError> {
        let athlete_id = self.athlete_repo.create_athlete(record).await?;
        self.athlete_repo
            .create_registration(athlete_id, target, record)
            .await?;
        Ok(athlete_id)
    }

    fn write_error_message(e: &RepositoryError) -> String {
        match e {
            // 唯一约束兜底命中: 可计数的行级错误,不是异常
            RepositoryError::DuplicateRegistration { .. } => {
                "重复报名（唯一约束拦截）".to_string()
            }
            other => format!("写入失败: {}", other),
        }
    }
}
