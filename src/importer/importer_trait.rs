// ==========================================
// 料箱仓储仿真系统 - 导入层 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::file_parser::RawTable;
use chrono::NaiveDateTime;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表（表头 + 行）
    ///
    /// # 返回
    /// - Ok(RawTable): 表头已去首尾空格, 全空行已跳过
    /// - Err: 文件不存在、格式不支持、编码或解析失败
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗（TRIM / UPPER / NULL 标准化 / 时间与数量解析）
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 去首尾空格, 可选转大写
    fn clean_text(&self, value: &str, uppercase: bool) -> String;

    /// 空白字符串视为缺失
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 按常见格式解析时间戳, 全部失败返回 None
    fn parse_timestamp(&self, value: &str) -> Option<NaiveDateTime>;

    /// 解析拣选数量 (四舍五入到整数), 非正数或非数值返回 None
    fn parse_qty(&self, value: &str) -> Option<i64>;
}
