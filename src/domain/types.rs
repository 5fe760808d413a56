// ==========================================
// 赛事报名管理系统 - 领域基础类型
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 2. 术语与取值
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Gender - 性别代码
// ==========================================
// 红线: 该字段无"缺失"状态,未识别值一律归为 F(历史行为,刻意保留)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }

    /// 从数据库存储值还原（非 "M" 一律视为 F）
    pub fn from_db_str(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("M") {
            Gender::M
        } else {
            Gender::F
        }
    }
}

// ==========================================
// ImportKind - 导入流程种类
// ==========================================
// 用途: 区分计时成绩导入与历史报名导入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    /// 外部计时系统成绩导入
    TimingResults,
    /// 历史报名（含缴费金额与备注列）导入
    LegacyRegistration,
}

// ==========================================
// ReconciliationDecision - 身份比对决策
// ==========================================
// 用途: 每行记录与选手库比对后的终态决策
// 红线: 决策逐行即时计算,不得跨行缓存(批次内会持续写库)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationDecision {
    /// 选手库无匹配,新建选手并关联赛事
    CreateNew,
    /// 选手已存在但未关联本场比赛,复用其 athlete_id
    ReuseExisting(i64),
    /// 选手已关联本场比赛,跳过
    SkipDuplicate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_as_str() {
        assert_eq!(Gender::M.as_str(), "M");
        assert_eq!(Gender::F.as_str(), "F");
    }

    #[test]
    fn test_gender_from_db_str() {
        assert_eq!(Gender::from_db_str("M"), Gender::M);
        assert_eq!(Gender::from_db_str("m"), Gender::M);
        assert_eq!(Gender::from_db_str("F"), Gender::F);
        assert_eq!(Gender::from_db_str(""), Gender::F);
        assert_eq!(Gender::from_db_str("X"), Gender::F);
    }
}
