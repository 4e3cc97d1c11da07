// ==========================================
// 料箱仓储仿真系统 - 字段映射器实现
// ==========================================
// 职责: 用户列名 → 标准列名 + 数值转换
// 标准列: SKU, Length, Width, Height, Weight, Min Qty Per Bin, Qty Stored
// ==========================================

use crate::config::{CsvFormat, SkuColumnMapping};
use crate::importer::file_parser::{RawRow, RawTable, SourceKind};

// ==========================================
// 标准列名
// ==========================================
pub mod sku_columns {
    pub const SKU: &str = "SKU";
    pub const LENGTH: &str = "Length";
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const WEIGHT: &str = "Weight";
    pub const MIN_QTY_PER_BIN: &str = "Min Qty Per Bin";
    pub const QTY_STORED: &str = "Qty Stored";

    pub const REQUIRED: [&str; 7] = [
        SKU,
        LENGTH,
        WIDTH,
        HEIGHT,
        WEIGHT,
        MIN_QTY_PER_BIN,
        QTY_STORED,
    ];

    /// 需要数值校验的列
    pub const NUMERIC: [&str; 6] = [LENGTH, WIDTH, HEIGHT, WEIGHT, MIN_QTY_PER_BIN, QTY_STORED];
}

pub struct FieldMapper {
    format: CsvFormat,
}

impl FieldMapper {
    pub fn new(format: CsvFormat) -> Self {
        Self { format }
    }

    /// 应用用户列名映射
    pub fn apply_mapping(&self, table: &mut RawTable, mapping: &SkuColumnMapping) {
        table.rename_columns(|header| mapping.apply(header).to_string());
    }

    /// 缺失的标准列 (按标准顺序)
    pub fn missing_columns(&self, table: &RawTable) -> Vec<&'static str> {
        sku_columns::REQUIRED
            .into_iter()
            .filter(|column| !table.has_column(column))
            .collect()
    }

    /// 读取数值单元格: 空单元格视为 0, 非数值返回 Err(原始文本)
    pub fn numeric_cell(&self, source: SourceKind, row: &RawRow, column: &str) -> Result<f64, String> {
        let raw = row.get(column).unwrap_or("").trim();
        if raw.is_empty() {
            return Ok(0.0);
        }

        let parsed = match source {
            SourceKind::Csv => self.parse_number(raw),
            SourceKind::Excel => raw.parse::<f64>().ok(),
        };
        parsed.filter(|v| v.is_finite()).ok_or_else(|| raw.to_string())
    }

    /// 按 CSV 小数点与千分位设置解析数值
    pub fn parse_number(&self, value: &str) -> Option<f64> {
        let mut normalized = String::with_capacity(value.len());
        for ch in value.trim().chars() {
            if Some(ch) == self.format.thousands {
                continue;
            }
            if ch == self.format.decimal {
                normalized.push('.');
            } else {
                normalized.push(ch);
            }
        }
        normalized.parse::<f64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_default_format() {
        let mapper = FieldMapper::new(CsvFormat::default());
        assert_eq!(mapper.parse_number("12.5"), Some(12.5));
        assert_eq!(mapper.parse_number(" 7 "), Some(7.0));
        assert_eq!(mapper.parse_number("abc"), None);
        // 未配置千分位时逗号不是合法数字
        assert_eq!(mapper.parse_number("1,000"), None);
    }

    #[test]
    fn test_parse_number_european_format() {
        let mapper = FieldMapper::new(CsvFormat {
            delimiter: ';',
            decimal: ',',
            thousands: Some('.'),
        });
        assert_eq!(mapper.parse_number("1.250,5"), Some(1250.5));
        assert_eq!(mapper.parse_number("0,75"), Some(0.75));
    }

    #[test]
    fn test_parse_number_thousands_separator() {
        let mapper = FieldMapper::new(CsvFormat {
            delimiter: ',',
            decimal: '.',
            thousands: Some(','),
        });
        assert_eq!(mapper.parse_number("12,000.25"), Some(12000.25));
    }
}
