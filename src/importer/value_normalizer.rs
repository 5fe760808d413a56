// ==========================================
// 赛事报名管理系统 - 值归一化器实现
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.4 值归一化
// 职责: 逐字段全量转换(永不报错): 日期/成绩/性别/数值/空白
// 红线: 解析失败一律降级为 None(或性别默认值),不得拒绝整行;
//       紧凑成绩格式的尝试顺序是对外契约,不得调整
// ==========================================

use crate::domain::types::Gender;
use chrono::NaiveDate;

pub struct ValueNormalizer;

impl ValueNormalizer {
    // ==========================================
    // 空白归一化
    // ==========================================

    /// 空串/纯空白 → None,其余去首尾空白
    ///
    /// 持久层收到的是真正的 NULL,而不是空字符串
    pub fn blank_to_none(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    // ==========================================
    // 日期归一化
    // ==========================================

    /// 多种本地写法 → NaiveDate(落库时格式化为 YYYY-MM-DD)
    ///
    /// # 接受
    /// - DD/MM/YYYY, DD-MM-YYYY, DD.MM.YYYY
    /// - YYYY-MM-DD(原样通过)
    ///
    /// # 其余
    /// - None(字段置空;出生日期缺失意味着身份无法精确核对)
    pub fn normalize_date(&self, value: &str) -> Option<NaiveDate> {
        let v = value.trim();
        if v.is_empty() {
            return None;
        }

        const FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(v, fmt).ok())
    }

    // ==========================================
    // 成绩归一化
    // ==========================================

    /// 完赛成绩 → "HH:MM:SS"
    ///
    /// # 尝试顺序（契约,勿调整）
    /// 1. H:MM:SS（按冒号数判定,不看数值大小）
    /// 2. MM:SS
    /// 3. HHhMMmSSs / HHhMM
    /// 4. 无分隔符纯数字 3~6 位的紧凑格式:
    ///    - 3~4 位: 末两位为秒,其余为分,分超过 59 进位为小时
    ///    - 5~6 位: 末两位为秒,再两位为分,其余为小时
    pub fn normalize_finish_time(&self, value: &str) -> Option<String> {
        let v = value.trim();
        if v.is_empty() {
            return None;
        }

        let total_seconds = Self::parse_colon_format(v)
            .or_else(|| Self::parse_letter_format(v))
            .or_else(|| Self::parse_compact_format(v))?;

        Some(Self::format_hms(total_seconds))
    }

    fn parse_colon_format(v: &str) -> Option<u64> {
        let parts: Vec<&str> = v.split(':').collect();
        match parts.len() {
            3 => {
                let h = Self::parse_component(parts[0])?;
                let m = Self::parse_component(parts[1])?;
                let s = Self::parse_component(parts[2])?;
                Some(h * 3600 + m * 60 + s)
            }
            2 => {
                let m = Self::parse_component(parts[0])?;
                let s = Self::parse_component(parts[1])?;
                Some(m * 60 + s)
            }
            _ => None,
        }
    }

    fn parse_letter_format(v: &str) -> Option<u64> {
        let lower = v.to_lowercase();
        if !lower.contains('h') {
            return None;
        }

        let trimmed = lower.strip_suffix('s').unwrap_or(lower.as_str());
        let (hours_part, rest) = trimmed.split_once('h')?;
        let h = Self::parse_component(hours_part)?;

        let (m, s) = match rest.split_once('m') {
            Some((minutes_part, seconds_part)) => {
                let m = Self::parse_component(minutes_part)?;
                let s = if seconds_part.is_empty() {
                    0
                } else {
                    Self::parse_component(seconds_part)?
                };
                (m, s)
            }
            // HHhMM: h 后必须跟分钟数
            None => (Self::parse_component(rest)?, 0),
        };

        Some(h * 3600 + m * 60 + s)
    }

    fn parse_compact_format(v: &str) -> Option<u64> {
        if !v.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        match v.len() {
            3..=4 => {
                let (minutes_part, seconds_part) = v.split_at(v.len() - 2);
                let m: u64 = minutes_part.parse().ok()?;
                let s: u64 = seconds_part.parse().ok()?;
                // 分超过 59 的进位由秒数换算自然完成
                Some(m * 60 + s)
            }
            5..=6 => {
                let (rest, seconds_part) = v.split_at(v.len() - 2);
                let (hours_part, minutes_part) = rest.split_at(rest.len() - 2);
                let h: u64 = hours_part.parse().ok()?;
                let m: u64 = minutes_part.parse().ok()?;
                let s: u64 = seconds_part.parse().ok()?;
                Some(h * 3600 + m * 60 + s)
            }
            _ => None,
        }
    }

    fn parse_component(part: &str) -> Option<u64> {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()
    }

    fn format_hms(total_seconds: u64) -> String {
        format!(
            "{:02}:{:02}:{:02}",
            total_seconds / 3600,
            (total_seconds % 3600) / 60,
            total_seconds % 60
        )
    }

    // ==========================================
    // 性别归一化
    // ==========================================

    /// {M, H, MALE, HOMME}(忽略大小写) → M,其余一律 F
    ///
    /// 该字段无缺失状态,未识别值归 F 是沿用的历史行为
    pub fn normalize_gender(&self, value: &str) -> Gender {
        match value.trim().to_uppercase().as_str() {
            "M" | "H" | "MALE" | "HOMME" => Gender::M,
            _ => Gender::F,
        }
    }

    // ==========================================
    // 数值归一化
    // ==========================================

    /// 整数字段(名次/号码布): 解析失败 → None,不报错
    pub fn normalize_int(&self, value: &str) -> Option<i64> {
        value.trim().parse::<i64>().ok()
    }

    /// 金额字段: 兼容小数逗号(12,50 → 12.50),解析失败 → None
    pub fn normalize_amount(&self, value: &str) -> Option<f64> {
        value.trim().replace(',', ".").parse::<f64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_to_none() {
        let n = ValueNormalizer;
        assert_eq!(n.blank_to_none(""), None);
        assert_eq!(n.blank_to_none("   "), None);
        assert_eq!(n.blank_to_none("  Lyon  "), Some("Lyon".to_string()));
    }

    #[test]
    fn test_normalize_date_local_formats() {
        let n = ValueNormalizer;
        let expected = NaiveDate::from_ymd_opt(1990, 3, 5);
        assert_eq!(n.normalize_date("05/03/1990"), expected);
        assert_eq!(n.normalize_date("05-03-1990"), expected);
        assert_eq!(n.normalize_date("05.03.1990"), expected);
    }

    #[test]
    fn test_normalize_date_iso_passthrough() {
        let n = ValueNormalizer;
        assert_eq!(
            n.normalize_date("1990-03-05"),
            NaiveDate::from_ymd_opt(1990, 3, 5)
        );
    }

    #[test]
    fn test_normalize_date_invalid_is_none() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_date("not a date"), None);
        assert_eq!(n.normalize_date("32/13/1990"), None);
        assert_eq!(n.normalize_date(""), None);
    }

    #[test]
    fn test_finish_time_colon_formats() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_finish_time("1:35:20"), Some("01:35:20".to_string()));
        // 冒号数判定: 31:56 走 MM:SS,而不是按数值猜测
        assert_eq!(n.normalize_finish_time("31:56"), Some("00:31:56".to_string()));
        // 分超过 59 换算进小时
        assert_eq!(n.normalize_finish_time("75:10"), Some("01:15:10".to_string()));
    }

    #[test]
    fn test_finish_time_letter_formats() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_finish_time("1h35m20s"), Some("01:35:20".to_string()));
        assert_eq!(n.normalize_finish_time("1h35"), Some("01:35:00".to_string()));
        assert_eq!(n.normalize_finish_time("2H05M09S"), Some("02:05:09".to_string()));
    }

    #[test]
    fn test_finish_time_compact_formats() {
        let n = ValueNormalizer;
        // 3~4 位: 末两位秒,其余分
        assert_eq!(n.normalize_finish_time("950"), Some("00:09:50".to_string()));
        assert_eq!(n.normalize_finish_time("3520"), Some("00:35:20".to_string()));
        // 分超过 59 进位为小时
        assert_eq!(n.normalize_finish_time("7230"), Some("01:12:30".to_string()));
        // 5~6 位: 秒/分/时
        assert_eq!(n.normalize_finish_time("13520"), Some("01:35:20".to_string()));
        assert_eq!(n.normalize_finish_time("103520"), Some("10:35:20".to_string()));
    }

    #[test]
    fn test_finish_time_unparseable_is_none() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_finish_time("99999999"), None); // 8 位超出紧凑格式
        assert_eq!(n.normalize_finish_time("12"), None);       // 2 位不足
        assert_eq!(n.normalize_finish_time("abandon"), None);
        assert_eq!(n.normalize_finish_time("ab:cd"), None);
        assert_eq!(n.normalize_finish_time("2h"), None); // h 后缺分钟数
        assert_eq!(n.normalize_finish_time(""), None);
    }

    #[test]
    fn test_normalize_gender() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_gender("M"), Gender::M);
        assert_eq!(n.normalize_gender("h"), Gender::M);
        assert_eq!(n.normalize_gender("Male"), Gender::M);
        assert_eq!(n.normalize_gender("HOMME"), Gender::M);
        assert_eq!(n.normalize_gender("F"), Gender::F);
        assert_eq!(n.normalize_gender("femme"), Gender::F);
        // 未识别值归 F,无缺失状态
        assert_eq!(n.normalize_gender(""), Gender::F);
        assert_eq!(n.normalize_gender("X"), Gender::F);
    }

    #[test]
    fn test_normalize_int() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_int("104"), Some(104));
        assert_eq!(n.normalize_int(" 104 "), Some(104));
        assert_eq!(n.normalize_int("DNF"), None);
        assert_eq!(n.normalize_int(""), None);
    }

    #[test]
    fn test_normalize_amount() {
        let n = ValueNormalizer;
        assert_eq!(n.normalize_amount("25.50"), Some(25.5));
        assert_eq!(n.normalize_amount("25,50"), Some(25.5));
        assert_eq!(n.normalize_amount("gratuit"), None);
    }
}
