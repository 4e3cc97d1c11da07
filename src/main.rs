// ==========================================
// 料箱仓储仿真系统 - 命令行入口
// ==========================================
// 用法:
//   autostore-sim <sku_master> [outbound] [--config <json>] [--out <dir>]
//
// 无 outbound 时只输出箱数统计 (bincount.csv)
// ==========================================

use anyhow::{bail, Context};
use autostore_sim::engine::SimulationControl;
use autostore_sim::export::export_run;
use autostore_sim::{logging, OutboundImporter, RunConfig, RunOrchestrator, SkuImporter};
use std::path::PathBuf;

const USAGE: &str = "用法: autostore-sim <sku_master> [outbound] [--config <json>] [--out <dir>]";

struct CliArgs {
    sku_master: PathBuf,
    outbound: Option<PathBuf>,
    config: Option<PathBuf>,
    out_dir: PathBuf,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut out_dir = PathBuf::from("output");

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().context("--config 缺少文件路径")?)),
            "--out" => out_dir = PathBuf::from(args.next().context("--out 缺少目录")?),
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("未知参数: {}\n{}", other, USAGE),
            other => positional.push(PathBuf::from(other)),
        }
    }

    let mut positional = positional.into_iter();
    let sku_master = positional.next().context(USAGE)?;
    let outbound = positional.next();
    if positional.next().is_some() {
        bail!("位置参数过多\n{}", USAGE);
    }

    Ok(CliArgs {
        sku_master,
        outbound,
        config,
        out_dir,
    })
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = parse_args()?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", autostore_sim::APP_NAME, autostore_sim::VERSION);
    tracing::info!("==================================================");

    let config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("读取配置失败: {}", path.display()))?,
        None => RunConfig::default(),
    };

    // SKU 主数据
    let report = SkuImporter::new(&config).import_file(&args.sku_master);
    if !report.is_ok() {
        for message in report.error_messages() {
            eprintln!("{}", message);
        }
        bail!("SKU 主数据校验失败, 共 {} 条错误", report.errors.len());
    }
    tracing::info!(rows = report.rows.len(), batch_id = %report.batch_id, "SKU 主数据导入完成");

    // 出库订单
    let outbound = match &args.outbound {
        Some(path) => {
            let outbound = OutboundImporter::new(config.csv_format).import_file(path);
            if !outbound.is_ok() {
                for err in &outbound.errors {
                    eprintln!("Error: {}", err);
                }
                bail!("出库订单校验失败: {}", path.display());
            }
            if outbound.incomplete_rows > 0 {
                tracing::warn!(incomplete_rows = outbound.incomplete_rows, "出库订单中有不完整行, 已剔除");
            }
            Some(outbound.orders)
        }
        None => None,
    };

    let control = SimulationControl::new();
    let result = RunOrchestrator::new()
        .execute(&report.rows, outbound, &config, &control)
        .context("运行失败")?;

    let summary = export_run(&result, &args.out_dir).context("导出失败")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
