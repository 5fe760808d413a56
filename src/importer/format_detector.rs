// ==========================================
// 赛事报名管理系统 - 格式探测器实现
// ==========================================
// 依据: Import_Pipeline_Spec_v1.0.md - 4.2 格式探测
// 职责: 识别已知计时系统导出布局,给出列头/数据偏移与预置映射
// ==========================================

use crate::importer::field_mapper::{FieldMapper, FieldMapping};
use crate::importer::table_parser::TableLayout;
use tracing::debug;

/// 已知计时系统导出的首行固定标记
///
/// 布局: 行 0 = 标记 + 机读列头(Tab 分隔),行 1 = 英文列头,
///       行 2 = 本地化列头,行 3 起 = 数据
pub const VENDOR_SIGNATURE: &str = "ChronoStart";

/// 已知布局下的本地化列头行下标（0 起）
const VENDOR_HEADER_ROW: usize = 2;
/// 已知布局下的数据起始行下标
const VENDOR_DATA_START: usize = 3;

// ==========================================
// DetectedFormat - 探测结果
// ==========================================
#[derive(Debug, Clone)]
pub struct DetectedFormat {
    pub layout: TableLayout,
    /// 已知厂商布局时预置的字段映射（调用方可在批次前修改）
    pub preset_mapping: Option<FieldMapping>,
}

// ==========================================
// FormatDetector - 格式探测器
// ==========================================
pub struct FormatDetector;

impl FormatDetector {
    /// 探测文本布局
    ///
    /// # 规则
    /// - 首行以厂商标记开头且为 Tab 分隔 → 列头行 2 / 数据行 3 / Tab,
    ///   并用本地化列头预置字段映射
    /// - 其余 → 列头行 0 / 数据行 1,分隔符交由解析器判定
    pub fn detect(&self, text: &str) -> DetectedFormat {
        let mut lines = text.lines();
        let first_line = lines.next().unwrap_or("");

        if first_line.starts_with(VENDOR_SIGNATURE) && first_line.contains('\t') {
            // 本地化列头行在第 3 行(下标 2)
            let localized_header = text.lines().nth(VENDOR_HEADER_ROW).unwrap_or("");
            let headers: Vec<String> = localized_header
                .split('\t')
                .map(|h| h.trim().to_string())
                .collect();

            let preset = FieldMapper.auto_map(&headers);
            debug!(
                mapped = preset.len(),
                columns = headers.len(),
                "识别到 {} 导出布局",
                VENDOR_SIGNATURE
            );

            return DetectedFormat {
                layout: TableLayout {
                    header_row: VENDOR_HEADER_ROW,
                    data_start: VENDOR_DATA_START,
                    delimiter: Some('\t'),
                },
                preset_mapping: Some(preset),
            };
        }

        DetectedFormat {
            layout: TableLayout::default(),
            preset_mapping: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::field_mapper::CanonicalField;

    fn vendor_export() -> String {
        [
            "ChronoStart\tEXPORT\t3.2\tUTF-8",
            "Rank\tBib\tLastname\tFirstname\tTime",
            "Clt\tDoss.\tNom\tPrénom\tTemps",
            "1\t104\tDupont\tMarie\t1:35:20",
        ]
        .join("\n")
    }

    #[test]
    fn test_detect_vendor_layout() {
        let detector = FormatDetector;
        let format = detector.detect(&vendor_export());

        assert_eq!(format.layout.header_row, 2);
        assert_eq!(format.layout.data_start, 3);
        assert_eq!(format.layout.delimiter, Some('\t'));

        let mapping = format.preset_mapping.expect("应预置映射");
        assert_eq!(mapping.source_column(CanonicalField::LastName), Some("Nom"));
        assert_eq!(mapping.source_column(CanonicalField::FinishTime), Some("Temps"));
    }

    #[test]
    fn test_detect_generic_layout() {
        let detector = FormatDetector;
        let format = detector.detect("Nom;Prénom\nDupont;Marie\n");

        assert_eq!(format.layout.header_row, 0);
        assert_eq!(format.layout.data_start, 1);
        assert_eq!(format.layout.delimiter, None);
        assert!(format.preset_mapping.is_none());
    }

    #[test]
    fn test_signature_requires_tab_header() {
        // 碰巧以标记开头的普通 CSV 不触发厂商布局
        let detector = FormatDetector;
        let format = detector.detect("ChronoStart,autre\nx,y\n");
        assert_eq!(format.layout.header_row, 0);
    }
}
