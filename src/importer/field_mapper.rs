// ==========================================
// 赛事报名管理系统 - 字段映射器实现
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.3 字段映射
// 职责: 规范字段 → 源列 的映射构建与校验
// 说明: 自动映射字典是静态可替换数据表,新增厂商格式
//       只需扩表,不触碰解析逻辑
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CanonicalField - 规范字段(闭集)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    BibNumber,
    FirstName,
    LastName,
    Gender,
    BirthYear,
    BirthDate,
    City,
    Club,
    Category,
    FinishTime,
    OverallRank,
    GenderRank,
    CategoryRank,
    Email,
    Phone,
    PaymentAmount,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 16] = [
        CanonicalField::BibNumber,
        CanonicalField::FirstName,
        CanonicalField::LastName,
        CanonicalField::Gender,
        CanonicalField::BirthYear,
        CanonicalField::BirthDate,
        CanonicalField::City,
        CanonicalField::Club,
        CanonicalField::Category,
        CanonicalField::FinishTime,
        CanonicalField::OverallRank,
        CanonicalField::GenderRank,
        CanonicalField::CategoryRank,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::PaymentAmount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::BibNumber => "bib_number",
            CanonicalField::FirstName => "first_name",
            CanonicalField::LastName => "last_name",
            CanonicalField::Gender => "gender",
            CanonicalField::BirthYear => "birth_year",
            CanonicalField::BirthDate => "birth_date",
            CanonicalField::City => "city",
            CanonicalField::Club => "club",
            CanonicalField::Category => "category",
            CanonicalField::FinishTime => "finish_time",
            CanonicalField::OverallRank => "overall_rank",
            CanonicalField::GenderRank => "gender_rank",
            CanonicalField::CategoryRank => "category_rank",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::PaymentAmount => "payment_amount",
        }
    }

    /// 按规范名查找（CLI 手工覆写入口用）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    /// 身份关键字段: 号码布/名/姓
    ///
    /// 这三个字段决定身份判定与去重,不允许与其他字段共用源列
    pub fn is_identity_critical(&self) -> bool {
        matches!(
            self,
            CanonicalField::BibNumber | CanonicalField::FirstName | CanonicalField::LastName
        )
    }
}

// ==========================================
// 自动映射字典
// ==========================================
// 内容: 已知列头写法 → 规范字段(精确、大小写敏感)
// 覆盖: 计时系统法文导出列头 + 平台通用模板(中/英文)
static HEADER_DICTIONARY: &[(&str, CanonicalField)] = &[
    // ===== 计时系统法文导出 =====
    ("Clt", CanonicalField::OverallRank),
    ("Doss.", CanonicalField::BibNumber),
    ("Dossard", CanonicalField::BibNumber),
    ("Nom", CanonicalField::LastName),
    ("Prénom", CanonicalField::FirstName),
    ("Prenom", CanonicalField::FirstName),
    ("Sexe", CanonicalField::Gender),
    ("Clt sx", CanonicalField::GenderRank),
    ("Cat.", CanonicalField::Category),
    ("Clt cat.", CanonicalField::CategoryRank),
    ("Temps", CanonicalField::FinishTime),
    ("Ville", CanonicalField::City),
    ("Club", CanonicalField::Club),
    ("Né(e)", CanonicalField::BirthDate),
    ("Année", CanonicalField::BirthYear),
    ("Mail", CanonicalField::Email),
    ("Tél.", CanonicalField::Phone),
    // ===== 平台通用模板(英文) =====
    ("Bib", CanonicalField::BibNumber),
    ("First name", CanonicalField::FirstName),
    ("Firstname", CanonicalField::FirstName),
    ("Last name", CanonicalField::LastName),
    ("Lastname", CanonicalField::LastName),
    ("Gender", CanonicalField::Gender),
    ("Sex", CanonicalField::Gender),
    ("Birth date", CanonicalField::BirthDate),
    ("Birthdate", CanonicalField::BirthDate),
    ("Birth year", CanonicalField::BirthYear),
    ("City", CanonicalField::City),
    ("Category", CanonicalField::Category),
    ("Time", CanonicalField::FinishTime),
    ("Finish time", CanonicalField::FinishTime),
    ("Rank", CanonicalField::OverallRank),
    ("Gender rank", CanonicalField::GenderRank),
    ("Category rank", CanonicalField::CategoryRank),
    ("Email", CanonicalField::Email),
    ("Phone", CanonicalField::Phone),
    ("Amount", CanonicalField::PaymentAmount),
    // ===== 平台通用模板(中文) =====
    ("号码布", CanonicalField::BibNumber),
    ("名", CanonicalField::FirstName),
    ("姓", CanonicalField::LastName),
    ("性别", CanonicalField::Gender),
    ("出生日期", CanonicalField::BirthDate),
    ("出生年份", CanonicalField::BirthYear),
    ("城市", CanonicalField::City),
    ("俱乐部", CanonicalField::Club),
    ("组别", CanonicalField::Category),
    ("成绩", CanonicalField::FinishTime),
    ("总名次", CanonicalField::OverallRank),
    ("性别名次", CanonicalField::GenderRank),
    ("组别名次", CanonicalField::CategoryRank),
    ("邮箱", CanonicalField::Email),
    ("电话", CanonicalField::Phone),
    ("金额", CanonicalField::PaymentAmount),
];

fn dictionary_lookup(header: &str) -> Option<CanonicalField> {
    HEADER_DICTIONARY
        .iter()
        .find(|(spelling, _)| *spelling == header)
        .map(|(_, field)| *field)
}

// ==========================================
// FieldMapping - 规范字段 → 源列 映射
// ==========================================
// 生命周期: 每次导入会话构建一次,批次开始前可手工增删
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldMapping {
    map: HashMap<CanonicalField, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置单个字段的源列
    ///
    /// # 错误
    /// - 目标列已被占用,且新旧字段任一属于身份关键字段 → MappingConflict
    pub fn set(&mut self, field: CanonicalField, column: &str) -> ImportResult<()> {
        if let Some(existing) = self.field_for_column(column) {
            if existing != field && (existing.is_identity_critical() || field.is_identity_critical())
            {
                return Err(ImportError::MappingConflict {
                    column: column.to_string(),
                    existing: existing.as_str(),
                    field: field.as_str(),
                });
            }
        }

        self.map.insert(field, column.to_string());
        Ok(())
    }

    /// 清除单个字段的映射
    pub fn clear(&mut self, field: CanonicalField) {
        self.map.remove(&field);
    }

    /// 字段当前映射到的源列
    pub fn source_column(&self, field: CanonicalField) -> Option<&str> {
        self.map.get(&field).map(|s| s.as_str())
    }

    /// 反查: 某源列被哪个字段占用
    fn field_for_column(&self, column: &str) -> Option<CanonicalField> {
        self.map
            .iter()
            .find(|(_, col)| col.as_str() == column)
            .map(|(field, _)| *field)
    }

    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.map.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 批次启动前置校验: 名/姓必须已映射
    pub fn validate(&self) -> ImportResult<()> {
        if !self.is_mapped(CanonicalField::FirstName) {
            return Err(ImportError::MissingRequiredMapping {
                field: CanonicalField::FirstName.as_str(),
            });
        }
        if !self.is_mapped(CanonicalField::LastName) {
            return Err(ImportError::MissingRequiredMapping {
                field: CanonicalField::LastName.as_str(),
            });
        }
        Ok(())
    }
}

// ==========================================
// FieldMapper - 自动映射器
// ==========================================
pub struct FieldMapper;

impl FieldMapper {
    /// 对列头逐个查字典生成映射
    ///
    /// # 规则
    /// - 精确、大小写敏感匹配
    /// - 未识别的列头不映射,也不报错
    /// - 同一字段命中多列时保留先出现的列
    pub fn auto_map(&self, headers: &[String]) -> FieldMapping {
        let mut mapping = FieldMapping::new();

        for header in headers {
            let Some(field) = dictionary_lookup(header.trim()) else {
                continue;
            };
            if mapping.is_mapped(field) {
                continue;
            }
            // 字典中每个列头只指向一个字段,同列不会二次占用,set 不会失败
            let _ = mapping.set(field, header.trim());
        }

        mapping
    }
}
