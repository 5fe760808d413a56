// ==========================================
// 赛事报名管理系统 - 表格解析器实现
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.1 表格解析
// 职责: 分隔文本 → RawTable(列头 + 行记录)
// 说明: 计时导出的引号用法不符合 RFC 4180(不转义、可嵌分隔符),
//       这里按逐字符扫描实现,不复用通用 CSV 库
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

// ==========================================
// RawTable - 解析产物
// ==========================================
// 用途: 一次导入会话解析一次,之后只读
#[derive(Debug, Clone)]
pub struct RawTable {
    /// 列头（保持文件顺序,不要求唯一）
    pub headers: Vec<String>,
    /// 行记录（列头 → 原始字符串值）
    pub rows: Vec<HashMap<String, String>>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ==========================================
// TableLayout - 解析布局
// ==========================================
// 用途: 由格式探测器给出列头行/数据起始行/分隔符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    /// 列头所在行（去除空行后的下标,0 起）
    pub header_row: usize,
    /// 数据起始行
    pub data_start: usize,
    /// 固定分隔符;None 表示按列头行自动判定
    pub delimiter: Option<char>,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_row: 0,
            data_start: 1,
            delimiter: None,
        }
    }
}

// ==========================================
// TableParser - 表格解析器
// ==========================================
pub struct TableParser;

impl TableParser {
    /// 解析分隔文本为 RawTable
    ///
    /// # 规则
    /// - 空行（仅空白）直接丢弃
    /// - 分隔符: 布局指定优先;否则列头行含 ';' 用 ';',不含用 ','
    /// - 每行字段数对齐列头: 多出的丢弃,缺失的补空字符串
    ///
    /// # 错误
    /// - 去除空行后没有任何数据行 → EmptyTable
    pub fn parse(&self, text: &str, layout: &TableLayout) -> ImportResult<RawTable> {
        let lines: Vec<&str> = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.len() <= layout.data_start || lines.len() <= layout.header_row {
            return Err(ImportError::EmptyTable);
        }

        let header_line = lines[layout.header_row];
        let delimiter = layout
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(header_line));

        let headers: Vec<String> = Self::split_line(header_line, delimiter)
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for line in &lines[layout.data_start..] {
            let fields = Self::split_line(line, delimiter);
            let mut row = HashMap::new();

            for (idx, header) in headers.iter().enumerate() {
                // 缺失的尾部字段补空;多出的字段无列头承接,丢弃
                let value = fields.get(idx).cloned().unwrap_or_default();
                row.insert(header.clone(), value);
            }

            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyTable);
        }

        Ok(RawTable { headers, rows })
    }

    /// 判定分隔符: 首行含 ';' 用 ';',否则 ','
    pub fn detect_delimiter(first_line: &str) -> char {
        if first_line.contains(';') {
            ';'
        } else {
            ','
        }
    }

    /// 按分隔符切分一行,引号内的分隔符不视为字段边界
    ///
    /// # 规则
    /// - 每遇到引号切换"引号内"状态
    /// - 引号字符本身不进入输出字段
    fn split_line(line: &str, delimiter: char) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;

        for ch in line.chars() {
            if ch == '"' {
                in_quotes = !in_quotes;
            } else if ch == delimiter && !in_quotes {
                fields.push(std::mem::take(&mut current));
            } else {
                current.push(ch);
            }
        }
        fields.push(current);

        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semicolon_detected() {
        let parser = TableParser;
        let text = "Nom;Prénom;Temps\nDupont;Marie;1:35:20\nMartin;Luc;1:41:02\n";
        let table = parser.parse(text, &TableLayout::default()).unwrap();

        assert_eq!(table.headers, vec!["Nom", "Prénom", "Temps"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].get("Nom"), Some(&"Dupont".to_string()));
        assert_eq!(table.rows[1].get("Temps"), Some(&"1:41:02".to_string()));
    }

    #[test]
    fn test_parse_comma_fallback() {
        let parser = TableParser;
        let text = "Nom,Prénom\nDupont,Marie\n";
        let table = parser.parse(text, &TableLayout::default()).unwrap();

        assert_eq!(table.headers.len(), 2);
        assert_eq!(table.rows[0].get("Prénom"), Some(&"Marie".to_string()));
    }

    #[test]
    fn test_parse_quoted_field_with_delimiter() {
        // 引号内的分隔符不切分;引号本身不保留
        let parser = TableParser;
        let text = "Nom,Ville\n\"Dupont, veuve Martin\",Lyon\n";
        let table = parser.parse(text, &TableLayout::default()).unwrap();

        assert_eq!(
            table.rows[0].get("Nom"),
            Some(&"Dupont, veuve Martin".to_string())
        );
        assert_eq!(table.rows[0].get("Ville"), Some(&"Lyon".to_string()));
    }

    #[test]
    fn test_parse_short_row_pads_empty() {
        let parser = TableParser;
        let text = "Nom;Prénom;Ville\nDupont;Marie\n";
        let table = parser.parse(text, &TableLayout::default()).unwrap();

        assert_eq!(table.rows[0].get("Ville"), Some(&"".to_string()));
    }

    #[test]
    fn test_parse_long_row_drops_extra() {
        let parser = TableParser;
        let text = "Nom;Prénom\nDupont;Marie;surplus;encore\n";
        let table = parser.parse(text, &TableLayout::default()).unwrap();

        assert_eq!(table.rows[0].len(), 2);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let parser = TableParser;
        let text = "Nom;Prénom\n\n   \nDupont;Marie\n\n";
        let table = parser.parse(text, &TableLayout::default()).unwrap();

        assert_eq!(table.row_count(), 1);
    }

    #[test]
    fn test_parse_empty_input_is_error() {
        let parser = TableParser;
        assert!(matches!(
            parser.parse("", &TableLayout::default()),
            Err(ImportError::EmptyTable)
        ));
        // 只有列头也算无数据行
        assert!(matches!(
            parser.parse("Nom;Prénom\n", &TableLayout::default()),
            Err(ImportError::EmptyTable)
        ));
    }

    #[test]
    fn test_parse_fixed_tab_delimiter() {
        let parser = TableParser;
        let layout = TableLayout {
            header_row: 0,
            data_start: 1,
            delimiter: Some('\t'),
        };
        let text = "Nom\tPrénom\nDupont\tMarie\n";
        let table = parser.parse(text, &layout).unwrap();

        assert_eq!(table.rows[0].get("Prénom"), Some(&"Marie".to_string()));
    }
}
