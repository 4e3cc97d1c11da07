// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供临时输入文件、默认运行配置等测试公共能力
// ==========================================

#![allow(dead_code)]

use autostore_sim::config::RunConfig;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

/// SKU 主数据表头 (标准列名)
pub const SKU_HEADER: &str = "SKU,Length,Width,Height,Weight,Min Qty Per Bin,Qty Stored";

/// 出库订单表头
pub const OUTBOUND_HEADER: &str = "sku,timestamp,qty";

/// 写入带 .csv 后缀的临时文件
///
/// # 返回
/// - NamedTempFile: 临时文件（需要保持存活）
pub fn write_temp_csv(lines: &[&str]) -> NamedTempFile {
    write_temp_bytes(lines.join("\n").as_bytes())
}

/// 写入原始字节 (编码测试用)
pub fn write_temp_bytes(bytes: &[u8]) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp csv");
    file.write_all(bytes).expect("Failed to write temp csv");
    file.write_all(b"\n").expect("Failed to write temp csv");
    file.flush().expect("Failed to flush temp csv");
    file
}

/// 固定随机种子的默认配置
pub fn seeded_config(seed: u64) -> RunConfig {
    RunConfig {
        shuffle_seed: Some(seed),
        ..RunConfig::default()
    }
}
