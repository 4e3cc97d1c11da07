// ==========================================
// 料箱仓储仿真系统 - 结果导出
// ==========================================
// 输出目录下写入:
// - bincount.csv          容量计算结果
// - pick_orders.csv       成功拣选的订单行
// - sku_live.csv / bin_content_live.csv / bins_capacity.csv / stacks.csv
// - summary.json          汇总计数与一致性结论
// 箱数统计模式只写 bincount.csv 与 summary.json
// ==========================================

use crate::domain::order::PickOrder;
use crate::domain::sku::CapacityRow;
use crate::engine::error::EngineResult;
use crate::engine::orchestrator::RunResult;
use crate::engine::simulator::{LineCounts, SimulationStats, StopReason};
use crate::repository::MasterDataSnapshot;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

pub const BINCOUNT_FILE: &str = "bincount.csv";
pub const PICK_ORDERS_FILE: &str = "pick_orders.csv";
pub const SKU_LIVE_FILE: &str = "sku_live.csv";
pub const BIN_CONTENT_FILE: &str = "bin_content_live.csv";
pub const BINS_CAPACITY_FILE: &str = "bins_capacity.csv";
pub const STACKS_FILE: &str = "stacks.csv";
pub const SUMMARY_FILE: &str = "summary.json";

const BINCOUNT_HEADER: &[&str] = &[
    "SKU",
    "Length (mm)",
    "Width (mm)",
    "Height (mm)",
    "Weight (kg)",
    "Cubic Volume (mm3)",
    "Min Qty Per Bin",
    "Qty Stored",
    "Qty Per Bin",
    "Qty Per 1/2 Bin",
    "Qty Per 1/4 Bin",
    "Qty Per 1/8 Bin",
    "Compartment Size",
    "Bin Count",
    "Capped Bin Count",
    "Fit Status",
    "Volume Fill 1",
    "Volume Fill 1/2",
    "Volume Fill 1/4",
    "Volume Fill 1/8",
    "Weight Fill 1",
    "Weight Fill 1/2",
    "Weight Fill 1/4",
    "Weight Fill 1/8",
    "Actual Volume Fill",
    "Actual Weight Fill",
];

const PICK_ORDERS_HEADER: &[&str] = &[
    "line_no",
    "sku",
    "timestamp",
    "qty",
    "bin_id",
    "stack_id",
    "bins_above",
    "bins_per_line",
    "total_bins_above",
    "qty_in_system_before",
];

// ==========================================
// ExportSummary - summary.json 内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub run_id: String,
    pub capacity_only: bool,
    pub sku_rows: usize,
    pub bins: usize,
    pub stacks: usize,
    pub empty_bins_added: usize,
    pub counts: Option<LineCounts>,
    pub stats: Option<SimulationStats>,
    pub stop_reason: Option<StopReason>,
    pub stop_message: Option<String>,
    pub processed: usize,
    pub consistent: bool,
    pub consistency: Vec<String>,
    pub elapsed_ms: u64,
    pub files: Vec<String>,
}

/// 导出一次运行的全部结果, 返回写入的文件
pub fn export_run(result: &RunResult, out_dir: &Path) -> EngineResult<ExportSummary> {
    fs::create_dir_all(out_dir)?;
    let mut files = Vec::new();

    write_bincount(&result.capacity_rows, &out_dir.join(BINCOUNT_FILE))?;
    files.push(BINCOUNT_FILE.to_string());

    if let Some(sim) = &result.simulation {
        write_pick_orders(sim.resolved_orders(), &out_dir.join(PICK_ORDERS_FILE))?;
        files.push(PICK_ORDERS_FILE.to_string());
    }

    if let Some(state) = &result.final_state {
        write_live_tables(state, out_dir)?;
        files.extend(
            [SKU_LIVE_FILE, BIN_CONTENT_FILE, BINS_CAPACITY_FILE, STACKS_FILE]
                .iter()
                .map(|f| f.to_string()),
        );
    }

    files.push(SUMMARY_FILE.to_string());
    let summary = build_summary(result, files);
    let writer = BufWriter::new(File::create(out_dir.join(SUMMARY_FILE))?);
    serde_json::to_writer_pretty(writer, &summary)?;

    info!(out_dir = %out_dir.display(), files = summary.files.len(), "结果导出完成");
    Ok(summary)
}

fn build_summary(result: &RunResult, files: Vec<String>) -> ExportSummary {
    let sim = result.simulation.as_ref();
    let consistency = [&result.initial_check, &result.final_check]
        .iter()
        .filter_map(|r| r.as_ref().map(|r| r.summary_line()))
        .collect();

    ExportSummary {
        run_id: result.run_id.clone(),
        capacity_only: result.is_capacity_only(),
        sku_rows: result.capacity_rows.len(),
        bins: result.bins.len(),
        stacks: result.stacks.len(),
        empty_bins_added: result.empty_bins_added,
        counts: sim.map(|s| s.counts),
        stats: sim.map(|s| s.stats),
        stop_reason: sim.map(|s| s.stop_reason),
        stop_message: sim.map(|s| s.stop_reason.to_string()),
        processed: sim.map(|s| s.processed).unwrap_or(0),
        consistent: result.is_consistent(),
        consistency,
        elapsed_ms: result.elapsed_ms as u64,
        files,
    }
}

fn create_writer(path: &Path) -> EngineResult<Writer<BufWriter<File>>> {
    Ok(Writer::from_writer(BufWriter::new(File::create(path)?)))
}

fn fmt_ratio(value: f64) -> String {
    format!("{:.4}", value)
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// 容量计算结果 (按箱数降序, 与计算输出顺序一致)
pub fn write_bincount(rows: &[CapacityRow], path: &Path) -> EngineResult<()> {
    let mut wtr = create_writer(path)?;
    wtr.write_record(BINCOUNT_HEADER)?;
    for row in rows {
        let mut record = vec![
            row.sku.clone(),
            format!("{:.2}", row.length_mm),
            format!("{:.2}", row.width_mm),
            format!("{:.2}", row.height_mm),
            format!("{:.4}", row.weight_kg),
            format!("{:.0}", row.volume_mm3),
            row.min_qty_per_bin.to_string(),
            row.qty_stored.to_string(),
            row.qty_per_bin.to_string(),
            row.qty_per_half.to_string(),
            row.qty_per_quarter.to_string(),
            row.qty_per_eighth.to_string(),
            row.compartment_size.map(|s| s.fraction().to_string()).unwrap_or_default(),
            format!("{}", row.bin_count),
            format!("{}", row.capped_bin_count),
            row.fit_status.to_string(),
        ];
        record.extend(row.fill.volume_fill.iter().map(|v| fmt_ratio(*v)));
        record.extend(row.fill.weight_fill.iter().map(|v| fmt_ratio(*v)));
        record.push(fmt_ratio(row.fill.actual_volume_fill));
        record.push(fmt_ratio(row.fill.actual_weight_fill));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// 成功拣选的订单行
pub fn write_pick_orders<'a>(orders: impl Iterator<Item = &'a PickOrder>, path: &Path) -> EngineResult<()> {
    let mut wtr = create_writer(path)?;
    wtr.write_record(PICK_ORDERS_HEADER)?;
    for order in orders {
        let Some(ann) = &order.annotation else { continue };
        wtr.write_record(&[
            order.line_no.to_string(),
            order.sku.clone(),
            order.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            order.qty.to_string(),
            ann.bin_id.to_string(),
            ann.stack_id.to_string(),
            ann.bins_above.to_string(),
            ann.bins_per_line.to_string(),
            ann.total_bins_above.to_string(),
            ann.qty_before.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// 四张实时表的最终状态
pub fn write_live_tables(state: &MasterDataSnapshot, out_dir: &Path) -> EngineResult<Vec<PathBuf>> {
    let sku_path = out_dir.join(SKU_LIVE_FILE);
    let mut wtr = create_writer(&sku_path)?;
    wtr.write_record([
        "sku",
        "qty_in_system",
        "prio_bin",
        "full_bin_qty",
        "full_system_qty",
        "restock_qty",
        "compartment_size",
    ])?;
    for sku in &state.skus {
        wtr.write_record(&[
            sku.sku.clone(),
            sku.qty_in_system.to_string(),
            opt_to_string(sku.prio_bin),
            sku.full_bin_qty.to_string(),
            sku.full_system_qty.to_string(),
            sku.restock_qty.to_string(),
            sku.compartment_size.fraction().to_string(),
        ])?;
    }
    wtr.flush()?;

    let content_path = out_dir.join(BIN_CONTENT_FILE);
    let mut wtr = create_writer(&content_path)?;
    wtr.write_record([
        "bin_id",
        "compartment_id",
        "compartment_size",
        "sku",
        "priority",
        "qty_in_bin",
    ])?;
    for row in &state.compartments {
        wtr.write_record(&[
            row.bin_id.to_string(),
            row.compartment_id.to_string(),
            row.compartment_size.fraction().to_string(),
            row.sku.clone().unwrap_or_default(),
            opt_to_string(row.priority),
            row.qty_in_bin.to_string(),
        ])?;
    }
    wtr.flush()?;

    let capacity_path = out_dir.join(BINS_CAPACITY_FILE);
    let mut wtr = create_writer(&capacity_path)?;
    wtr.write_record(["bin_id", "compartment_size", "num_full_compartments"])?;
    for record in &state.capacity {
        wtr.write_record(&[
            record.bin_id.to_string(),
            record.compartment_size.fraction().to_string(),
            record.num_full_compartments.to_string(),
        ])?;
    }
    wtr.flush()?;

    let stacks_path = out_dir.join(STACKS_FILE);
    let mut wtr = create_writer(&stacks_path)?;
    wtr.write_record(["stack_id", "position", "bin_id"])?;
    for row in &state.stack_lookup {
        wtr.write_record(&[
            row.stack_id.to_string(),
            row.position.to_string(),
            row.bin_id.to_string(),
        ])?;
    }
    wtr.flush()?;

    Ok(vec![sku_path, content_path, capacity_path, stacks_path])
}
