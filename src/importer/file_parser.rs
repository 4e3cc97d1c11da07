// ==========================================
// 料箱仓储仿真系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls, 第一个工作表) / CSV (.csv)
// CSV 编码: 先按 UTF-8 解码, 失败后回退一次 Mac Roman
// ==========================================

use crate::config::CsvFormat;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

// ==========================================
// RawTable - 原始表
// ==========================================

/// 数据来源 (决定数值解析是否应用 CSV 小数/千分位设置)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Excel,
}

/// 原始数据行
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_number: usize, // 文件中的行号 (表头为第 1 行)
    pub values: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// 原始表: 表头 + 非空数据行
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source: SourceKind,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// 按映射函数重命名表头与各行的键
    pub fn rename_columns<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        let mapping: Vec<(String, String)> = self
            .headers
            .iter()
            .map(|h| (h.clone(), rename(h)))
            .filter(|(old, new)| old != new)
            .collect();
        if mapping.is_empty() {
            return;
        }

        for header in self.headers.iter_mut() {
            if let Some((_, new)) = mapping.iter().find(|(old, _)| old == header) {
                *header = new.clone();
            }
        }
        for row in self.rows.iter_mut() {
            for (old, new) in &mapping {
                if let Some(value) = row.values.remove(old) {
                    row.values.insert(new.clone(), value);
                }
            }
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// 文件字节解码: UTF-8 (去 BOM), 失败回退 Mac Roman
pub fn decode_bytes(bytes: &[u8]) -> ImportResult<Cow<'_, str>> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text.trim_start_matches('\u{feff}'))),
        Err(err) => {
            warn!(error = %err, "UTF-8 解码失败, 回退为 Mac Roman");
            encoding_rs::MACINTOSH
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or_else(|| ImportError::Encoding(err.to_string()))
        }
    }
}

fn check_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ascii_byte(key: &str, value: char) -> ImportResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|b| b.is_ascii())
        .ok_or_else(|| ImportError::ConfigValueError {
            key: key.to_string(),
            value: value.to_string(),
            message: "分隔符必须是单个 ASCII 字符".to_string(),
        })
}

// ==========================================
// CSV Parser 实现
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvParser {
    pub format: CsvFormat,
}

impl CsvParser {
    pub fn new(format: CsvFormat) -> Self {
        Self { format }
    }

    /// 解析已解码的 CSV 文本
    pub fn parse_text(&self, text: &str) -> ImportResult<RawTable> {
        let delimiter = ascii_byte("csv_delimiter", self.format.delimiter)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(text.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let mut values = HashMap::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    values.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if values.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                row_number: row_idx + 2,
                values,
            });
        }

        Ok(RawTable {
            source: SourceKind::Csv,
            headers,
            rows,
        })
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let bytes = std::fs::read(file_path)?;
        let text = decode_bytes(&bytes)?;
        let table = self.parse_text(&text)?;

        debug!(
            path = %file_path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "CSV 解析完成"
        );
        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        check_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut sheet_rows = range.rows();
        let header_row = sheet_rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 读取数据行
        let mut rows = Vec::new();
        for (row_idx, data_row) in sheet_rows.enumerate() {
            let mut values = HashMap::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    values.insert(header.clone(), cell.to_string().trim().to_string());
                }
            }

            if values.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                row_number: row_idx + 2,
                values,
            });
        }

        debug!(
            path = %file_path.display(),
            sheet = %sheet_name,
            rows = rows.len(),
            "Excel 解析完成"
        );
        Ok(RawTable {
            source: SourceKind::Excel,
            headers,
            rows,
        })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UniversalFileParser {
    pub csv_format: CsvFormat,
}

impl UniversalFileParser {
    pub fn new(csv_format: CsvFormat) -> Self {
        Self { csv_format }
    }

    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<RawTable> {
        let path = file_path.as_ref();
        match extension_of(path).as_str() {
            "csv" => CsvParser::new(self.csv_format).parse_to_raw_table(path),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_table(path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let file = temp_csv(&["SKU,Length,Weight", " a1 ,2.5,1", "B2,3.0,2"]);

        let table = CsvParser::default().parse_to_raw_table(file.path()).unwrap();

        assert_eq!(table.headers, vec!["SKU", "Length", "Weight"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("SKU"), Some("a1"));
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(table.rows[1].get("Length"), Some("3.0"));
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser::default().parse_to_raw_table(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let file = temp_csv(&["SKU,Weight", "A,2.5", ",", "B,3.0"]);

        let table = CsvParser::default().parse_to_raw_table(file.path()).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].row_number, 4);
    }

    #[test]
    fn test_csv_parser_semicolon_delimiter() {
        let parser = CsvParser::new(CsvFormat {
            delimiter: ';',
            decimal: ',',
            thousands: Some('.'),
        });
        let table = parser.parse_text("SKU;Weight\nA;1.250,5\n").unwrap();
        assert_eq!(table.rows[0].get("Weight"), Some("1.250,5"));
    }

    #[test]
    fn test_decode_falls_back_to_mac_roman() {
        // 0x8E 在 Mac Roman 中为 'é', 不是合法 UTF-8
        let bytes = b"SKU\nCAF\x8E\n";
        let text = decode_bytes(bytes).unwrap();
        assert_eq!(text, "SKU\nCAF\u{e9}\n");
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = "\u{feff}SKU\nA\n".as_bytes();
        assert_eq!(decode_bytes(bytes).unwrap(), "SKU\nA\n");
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalFileParser::default().parse("data.json");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_rename_columns() {
        let mut table = CsvParser::default()
            .parse_text("Item,Qty On Hand\nA,3\n")
            .unwrap();
        table.rename_columns(|h| match h {
            "Item" => "SKU".to_string(),
            "Qty On Hand" => "Qty Stored".to_string(),
            other => other.to_string(),
        });

        assert!(table.has_column("SKU"));
        assert!(table.has_column("Qty Stored"));
        assert_eq!(table.rows[0].get("Qty Stored"), Some("3"));
    }
}
