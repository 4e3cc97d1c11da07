// ==========================================
// 料箱仓储仿真系统 - 运行配置
// ==========================================
// 职责: 单次仿真的全部参数, 支持 JSON 文件与 key-value 两种加载方式
// 约束: 所有加载路径都经过 validate()
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::{BinType, UnitSystem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

// ==========================================
// CheckCadence - 一致性检查频率
// ==========================================
// 单位: 订单数; 0 表示关闭该层检查
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckCadence {
    pub minimal_every: usize,
    pub quick_every: usize,
    pub full_every: usize,
}

impl Default for CheckCadence {
    fn default() -> Self {
        Self {
            minimal_every: 1_000,
            quick_every: 10_000,
            full_every: 50_000,
        }
    }
}

// ==========================================
// SkuColumnMapping - SKU 主数据列名映射
// ==========================================
// 用户列名 -> 标准列名 (SKU, Length, Width, Height, Weight, Min Qty Per Bin, Qty Stored)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkuColumnMapping {
    pub renames: HashMap<String, String>,
}

impl SkuColumnMapping {
    /// 返回映射后的列名 (未配置的列原样返回)
    pub fn apply<'a>(&'a self, header: &'a str) -> &'a str {
        self.renames
            .get(header.trim())
            .map(String::as_str)
            .unwrap_or_else(|| header.trim())
    }
}

// ==========================================
// CsvFormat - CSV 格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    pub delimiter: char,
    pub decimal: char,
    pub thousands: Option<char>,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal: '.',
            thousands: None,
        }
    }
}

// ==========================================
// RunConfig - 运行配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    // ===== 料箱几何 =====
    pub bin_type: BinType,
    pub bin_weight_limit_kg: f64,
    pub bin_utilization_pct: f64,
    pub max_compartments: u32, // 1 / 2 / 4 / 8
    pub max_bins_per_sku: i64,
    pub unit_system: UnitSystem,

    // ===== 料箱堆 =====
    pub stack_height: u32,
    pub empty_bins_pct: f64,
    pub system_holes_pct: f64,
    pub shuffle_seed: Option<u64>,

    // ===== 仿真 =====
    pub restock_pct: f64,
    pub save_interval: usize,
    pub check_cadence: CheckCadence,
    pub halt_on_inconsistency: bool,

    // ===== 导入 =====
    pub columns: SkuColumnMapping,
    pub csv_format: CsvFormat,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bin_type: BinType::H330,
            bin_weight_limit_kg: 25.0,
            bin_utilization_pct: 70.0,
            max_compartments: 8,
            max_bins_per_sku: 20,
            unit_system: UnitSystem::Metric,
            stack_height: 18,
            empty_bins_pct: 15.0,
            system_holes_pct: 50.0,
            shuffle_seed: None,
            restock_pct: 20.0,
            save_interval: 1_000,
            check_cadence: CheckCadence::default(),
            halt_on_inconsistency: false,
            columns: SkuColumnMapping::default(),
            csv_format: CsvFormat::default(),
        }
    }
}

impl RunConfig {
    /// 从 JSON 文件加载 (缺省字段取默认值)
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&raw)?;
        config.validate()?;

        info!(path = %path.display(), "运行配置加载完成");
        Ok(config)
    }

    /// 从 key-value 表加载 (键见 config_keys)
    pub fn from_kv(values: &HashMap<String, String>) -> ConfigResult<Self> {
        let mut config = RunConfig::default();

        if let Some(v) = values.get(config_keys::BIN_TYPE) {
            let code: u32 = parse_value(config_keys::BIN_TYPE, v)?;
            config.bin_type = BinType::try_from(code).map_err(|message| {
                ConfigError::InvalidValue {
                    key: config_keys::BIN_TYPE.to_string(),
                    value: v.clone(),
                    message,
                }
            })?;
        }
        if let Some(v) = values.get(config_keys::BIN_WEIGHT_LIMIT_KG) {
            config.bin_weight_limit_kg = parse_value(config_keys::BIN_WEIGHT_LIMIT_KG, v)?;
        }
        if let Some(v) = values.get(config_keys::BIN_UTILIZATION_PCT) {
            config.bin_utilization_pct = parse_value(config_keys::BIN_UTILIZATION_PCT, v)?;
        }
        if let Some(v) = values.get(config_keys::MAX_COMPARTMENTS) {
            config.max_compartments = parse_value(config_keys::MAX_COMPARTMENTS, v)?;
        }
        if let Some(v) = values.get(config_keys::MAX_BINS_PER_SKU) {
            config.max_bins_per_sku = parse_value(config_keys::MAX_BINS_PER_SKU, v)?;
        }
        if let Some(v) = values.get(config_keys::UNIT_SYSTEM) {
            config.unit_system =
                UnitSystem::parse(v).ok_or_else(|| ConfigError::InvalidValue {
                    key: config_keys::UNIT_SYSTEM.to_string(),
                    value: v.clone(),
                    message: "仅支持 \"mm / kg\" 或 \"in / lb\"".to_string(),
                })?;
        }
        if let Some(v) = values.get(config_keys::STACK_HEIGHT) {
            config.stack_height = parse_value(config_keys::STACK_HEIGHT, v)?;
        }
        if let Some(v) = values.get(config_keys::EMPTY_BINS_PCT) {
            config.empty_bins_pct = parse_value(config_keys::EMPTY_BINS_PCT, v)?;
        }
        if let Some(v) = values.get(config_keys::SYSTEM_HOLES_PCT) {
            config.system_holes_pct = parse_value(config_keys::SYSTEM_HOLES_PCT, v)?;
        }
        if let Some(v) = values.get(config_keys::SHUFFLE_SEED) {
            config.shuffle_seed = if v.trim().is_empty() {
                None
            } else {
                Some(parse_value(config_keys::SHUFFLE_SEED, v)?)
            };
        }
        if let Some(v) = values.get(config_keys::RESTOCK_PCT) {
            config.restock_pct = parse_value(config_keys::RESTOCK_PCT, v)?;
        }
        if let Some(v) = values.get(config_keys::SAVE_INTERVAL) {
            config.save_interval = parse_value(config_keys::SAVE_INTERVAL, v)?;
        }
        if let Some(v) = values.get(config_keys::CHECK_MINIMAL_EVERY) {
            config.check_cadence.minimal_every = parse_value(config_keys::CHECK_MINIMAL_EVERY, v)?;
        }
        if let Some(v) = values.get(config_keys::CHECK_QUICK_EVERY) {
            config.check_cadence.quick_every = parse_value(config_keys::CHECK_QUICK_EVERY, v)?;
        }
        if let Some(v) = values.get(config_keys::CHECK_FULL_EVERY) {
            config.check_cadence.full_every = parse_value(config_keys::CHECK_FULL_EVERY, v)?;
        }
        if let Some(v) = values.get(config_keys::HALT_ON_INCONSISTENCY) {
            config.halt_on_inconsistency = parse_bool(config_keys::HALT_ON_INCONSISTENCY, v)?;
        }

        config.validate()?;
        debug!(keys = values.len(), "运行配置 (key-value) 加载完成");
        Ok(config)
    }

    /// 校验参数范围
    pub fn validate(&self) -> ConfigResult<()> {
        check_range(
            config_keys::BIN_WEIGHT_LIMIT_KG,
            self.bin_weight_limit_kg,
            f64::MIN_POSITIVE,
            f64::MAX,
        )?;
        check_range(
            config_keys::BIN_UTILIZATION_PCT,
            self.bin_utilization_pct,
            50.0,
            100.0,
        )?;
        if ![1, 2, 4, 8].contains(&self.max_compartments) {
            return Err(ConfigError::InvalidValue {
                key: config_keys::MAX_COMPARTMENTS.to_string(),
                value: self.max_compartments.to_string(),
                message: "仅支持 1 / 2 / 4 / 8".to_string(),
            });
        }
        check_range(
            config_keys::MAX_BINS_PER_SKU,
            self.max_bins_per_sku as f64,
            1.0,
            f64::MAX,
        )?;
        check_range(config_keys::STACK_HEIGHT, self.stack_height as f64, 4.0, 26.0)?;
        check_range(config_keys::EMPTY_BINS_PCT, self.empty_bins_pct, 0.0, f64::MAX)?;
        check_range(
            config_keys::SYSTEM_HOLES_PCT,
            self.system_holes_pct,
            0.0,
            100.0,
        )?;
        check_range(config_keys::RESTOCK_PCT, self.restock_pct, 0.0, 95.0)?;
        if self.save_interval == 0 {
            return Err(ConfigError::InvalidValue {
                key: config_keys::SAVE_INTERVAL.to_string(),
                value: "0".to_string(),
                message: "保存间隔必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 料箱内部可用高度 (mm)
    pub fn bin_height_mm(&self) -> f64 {
        self.bin_type.inner_height_mm()
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: "无法解析为数值".to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            message: "无法解析为布尔值".to_string(),
        }),
    }
}

fn check_range(key: &str, value: f64, min: f64, max: f64) -> ConfigResult<()> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            key: key.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 料箱几何
    pub const BIN_TYPE: &str = "bin_type";
    pub const BIN_WEIGHT_LIMIT_KG: &str = "bin_weight_limit_kg";
    pub const BIN_UTILIZATION_PCT: &str = "bin_utilization_pct";
    pub const MAX_COMPARTMENTS: &str = "max_compartments";
    pub const MAX_BINS_PER_SKU: &str = "max_bins_per_sku";
    pub const UNIT_SYSTEM: &str = "unit_system";

    // 料箱堆
    pub const STACK_HEIGHT: &str = "stack_height";
    pub const EMPTY_BINS_PCT: &str = "empty_bins_pct";
    pub const SYSTEM_HOLES_PCT: &str = "system_holes_pct";
    pub const SHUFFLE_SEED: &str = "shuffle_seed";

    // 仿真
    pub const RESTOCK_PCT: &str = "restock_pct";
    pub const SAVE_INTERVAL: &str = "save_interval";
    pub const CHECK_MINIMAL_EVERY: &str = "check_minimal_every";
    pub const CHECK_QUICK_EVERY: &str = "check_quick_every";
    pub const CHECK_FULL_EVERY: &str = "check_full_every";
    pub const HALT_ON_INCONSISTENCY: &str = "halt_on_inconsistency";
}
