// ==========================================
// 赛事报名管理系统 - 选手领域模型
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 3. 数据模型
// 红线: 身份仅由 (名, 姓, 出生日期) 三元组判定;
//       邮箱允许多名选手共用(监护人代报名),不得用作去重键
// ==========================================

use crate::domain::types::Gender;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Athlete - 选手主数据
// ==========================================
// 用途: 导入层与报名层共同读写
// 对齐: athlete 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Athlete {
    // ===== 主键 =====
    pub athlete_id: i64, // 选手唯一标识（rowid）

    // ===== 身份三元组 =====
    pub first_name: String,              // 名
    pub last_name: String,               // 姓
    pub birth_date: Option<NaiveDate>,   // 出生日期（缺失时身份无法精确核对）

    // ===== 基础信息 =====
    pub gender: Gender,                  // 性别代码（M/F）
    pub birth_year: Option<i32>,         // 出生年份（历史数据仅有年份时使用）
    pub city: Option<String>,            // 城市
    pub club: Option<String>,            // 俱乐部

    // ===== 联系方式 =====
    pub email: Option<String>,           // 邮箱（可多人共用）
    pub phone: Option<String>,           // 电话

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,       // 记录创建时间
    pub updated_at: DateTime<Utc>,       // 记录更新时间
}

// ==========================================
// IdentityKey - 身份比对键
// ==========================================
// 用途: 仅在单行比对过程中短暂存在,不落库
// 规则: 姓名忽略大小写,出生日期精确相等;出生日期缺失永不匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKey {
    first_name_lower: String,
    last_name_lower: String,
    birth_date: Option<NaiveDate>,
}

impl IdentityKey {
    pub fn new(first_name: &str, last_name: &str, birth_date: Option<NaiveDate>) -> Self {
        Self {
            first_name_lower: first_name.trim().to_lowercase(),
            last_name_lower: last_name.trim().to_lowercase(),
            birth_date,
        }
    }

    /// 判断某选手是否与本键指向同一真实身份
    ///
    /// # 规则
    /// - 姓名忽略大小写比较
    /// - 出生日期必须两侧均存在且精确相等（任一侧缺失 → 不匹配,避免误合并）
    pub fn matches(&self, athlete: &Athlete) -> bool {
        if self.birth_date.is_none() || athlete.birth_date.is_none() {
            return false;
        }

        self.birth_date == athlete.birth_date
            && athlete.first_name.trim().to_lowercase() == self.first_name_lower
            && athlete.last_name.trim().to_lowercase() == self.last_name_lower
    }
}

// ==========================================
// Registration - 赛事报名记录
// ==========================================
// 用途: 选手与单场比赛的关联(含成绩字段)
// 对齐: registration 表, UNIQUE(athlete_id, race_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub registration_id: i64,

    // ===== 关联 =====
    pub athlete_id: i64,                 // 关联 athlete（FK）
    pub event_id: String,                // 赛事标识（目录由外部系统维护）
    pub race_id: String,                 // 比赛项目标识

    // ===== 成绩字段 =====
    pub bib_number: Option<i64>,         // 号码布
    pub category: Option<String>,        // 组别
    pub finish_time: Option<String>,     // 完赛成绩（HH:MM:SS）
    pub overall_rank: Option<i64>,       // 总名次
    pub gender_rank: Option<i64>,        // 性别名次
    pub category_rank: Option<i64>,      // 组别名次

    // ===== 历史报名附加字段 =====
    pub payment_amount: Option<f64>,     // 缴费金额
    pub notes: Option<String>,           // 备注（原文拼接,不解析）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn athlete(first: &str, last: &str, birth: Option<NaiveDate>) -> Athlete {
        Athlete {
            athlete_id: 1,
            first_name: first.to_string(),
            last_name: last.to_string(),
            birth_date: birth,
            gender: Gender::M,
            birth_year: None,
            city: None,
            club: None,
            email: None,
            phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_identity_key_case_insensitive() {
        let birth = NaiveDate::from_ymd_opt(1990, 3, 5);
        let key = IdentityKey::new("marie", "DUPONT", birth);
        assert!(key.matches(&athlete("Marie", "Dupont", birth)));
    }

    #[test]
    fn test_identity_key_birth_date_exact() {
        let key = IdentityKey::new("Marie", "Dupont", NaiveDate::from_ymd_opt(1990, 3, 5));
        assert!(!key.matches(&athlete(
            "Marie",
            "Dupont",
            NaiveDate::from_ymd_opt(1991, 3, 5)
        )));
    }

    #[test]
    fn test_identity_key_absent_birth_date_never_matches() {
        // 任一侧出生日期缺失都不得匹配
        let birth = NaiveDate::from_ymd_opt(1990, 3, 5);
        let key = IdentityKey::new("Marie", "Dupont", None);
        assert!(!key.matches(&athlete("Marie", "Dupont", birth)));

        let key = IdentityKey::new("Marie", "Dupont", birth);
        assert!(!key.matches(&athlete("Marie", "Dupont", None)));
    }
}
