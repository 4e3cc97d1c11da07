// ==========================================
// 料箱仓储仿真系统 - 容量计算引擎
// ==========================================
// 红线: 几何装箱只允许低估 (向下取整), 不得高估容量
// ==========================================
// 职责: 计算每个 SKU 在整箱 / 1/2 / 1/4 / 1/8 格口的可放数量
// 输入: SKU 主数据 + 运行配置 (料箱型号/限重/利用率/格口上限/箱数上限)
// 输出: 容量结果行 (格口规格、箱数、适配状态、填充率), 按箱数降序
// ==========================================

use crate::config::RunConfig;
use crate::domain::sku::{CapacityRow, FillMetrics, SkuMasterRow};
use crate::domain::types::{CompartmentSize, FitStatus};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

// ==========================================
// CompartmentGeometry - 格口几何
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompartmentGeometry {
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub max_weight_kg: f64,
}

impl CompartmentGeometry {
    /// 由料箱高度与限重推导格口几何
    ///
    /// 长宽固定: 整箱 603x403, 1/2 301x403, 1/4 301x201, 1/8 150x201; 限重按格口数均分
    pub fn for_size(size: CompartmentSize, bin_height_mm: f64, bin_weight_limit_kg: f64) -> Self {
        let (length_mm, width_mm) = match size {
            CompartmentSize::Whole => (603.0, 403.0),
            CompartmentSize::Half => (301.0, 403.0),
            CompartmentSize::Quarter => (301.0, 201.0),
            CompartmentSize::Eighth => (150.0, 201.0),
        };
        Self {
            length_mm,
            width_mm,
            height_mm: bin_height_mm,
            max_weight_kg: bin_weight_limit_kg / size.compartments_per_bin() as f64,
        }
    }

    pub fn volume_mm3(&self) -> f64 {
        self.length_mm * self.width_mm * self.height_mm
    }
}

/// 单个格口可放数量
///
/// 尺寸齐全时取 6 种摆放方向中装得最多的一种, 再受重量与体积利用率限制;
/// 缺尺寸时仅按重量估算 (限重同样乘以利用率)
pub fn qty_per_compartment(
    length: f64,
    width: f64,
    height: f64,
    weight: f64,
    geometry: &CompartmentGeometry,
    utilization_pct: f64,
) -> i64 {
    let utilization = utilization_pct / 100.0;

    if length > 0.0 && width > 0.0 && height > 0.0 {
        let orientations = [
            [length, width, height],
            [length, height, width],
            [width, length, height],
            [width, height, length],
            [height, length, width],
            [height, width, length],
        ];
        let mut max_qty = orientations
            .iter()
            .map(|[a, b, c]| {
                (geometry.length_mm / a).floor()
                    * (geometry.width_mm / b).floor()
                    * (geometry.height_mm / c).floor()
            })
            .fold(0.0_f64, f64::max);

        if weight > 0.0 {
            max_qty = max_qty.min((geometry.max_weight_kg / weight).floor());
        }

        let volume_limit = geometry.volume_mm3() * utilization;
        max_qty = max_qty.min((volume_limit / (length * width * height)).floor());
        max_qty as i64
    } else if weight > 0.0 {
        (geometry.max_weight_kg * utilization / weight).floor() as i64
    } else {
        0
    }
}

// ==========================================
// CapacityCalculator - 容量计算引擎
// ==========================================
pub struct CapacityCalculator {
    // 无状态引擎
}

impl Default for CapacityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl CapacityCalculator {
    pub fn new() -> Self {
        Self {}
    }

    /// 计算全部 SKU 的容量结果
    ///
    /// 英制输入先换算为 mm / kg; 结果按箱数降序稳定排序
    #[instrument(skip(self, skus, config), fields(skus_count = skus.len(), bin_type = %config.bin_type))]
    pub fn calculate(&self, skus: &[SkuMasterRow], config: &RunConfig) -> Vec<CapacityRow> {
        let bin_height = config.bin_height_mm();
        let geometries: [CompartmentGeometry; 4] = [
            CompartmentSize::Whole,
            CompartmentSize::Half,
            CompartmentSize::Quarter,
            CompartmentSize::Eighth,
        ]
        .map(|size| CompartmentGeometry::for_size(size, bin_height, config.bin_weight_limit_kg));

        let mut rows: Vec<CapacityRow> = skus
            .iter()
            .map(|sku| self.calculate_row(sku, config, &geometries))
            .collect();

        rows.sort_by(|a, b| b.bin_count.total_cmp(&a.bin_count));

        let fit = rows.iter().filter(|r| r.is_fit()).count();
        info!(total = rows.len(), fit, not_fit = rows.len() - fit, "容量计算完成");
        rows
    }

    fn calculate_row(
        &self,
        sku: &SkuMasterRow,
        config: &RunConfig,
        geometries: &[CompartmentGeometry; 4],
    ) -> CapacityRow {
        let units = config.unit_system;
        let length_mm = units.length_to_mm(sku.length);
        let width_mm = units.length_to_mm(sku.width);
        let height_mm = units.length_to_mm(sku.height);
        let weight_kg = units.weight_to_kg(sku.weight);
        let volume_mm3 = length_mm * width_mm * height_mm;

        // 顺序: 整箱, 1/2, 1/4, 1/8
        let qty = geometries.map(|g| {
            qty_per_compartment(
                length_mm,
                width_mm,
                height_mm,
                weight_kg,
                &g,
                config.bin_utilization_pct,
            )
        });
        let [qty_per_bin, qty_per_half, qty_per_quarter, qty_per_eighth] = qty;

        let compartment_size = select_compartment_size(
            qty,
            sku.min_qty_per_bin,
            sku.qty_stored,
            config.max_compartments,
        );

        let bin_count = match compartment_size {
            Some(CompartmentSize::Whole) => (sku.qty_stored as f64 / qty_per_bin as f64).ceil().max(0.0),
            Some(size) => size.fraction(),
            None => 0.0,
        };
        let capped_bin_count = bin_count.min(config.max_bins_per_sku as f64);

        let fit_status = if length_mm <= 0.0 && width_mm <= 0.0 && height_mm <= 0.0 && weight_kg <= 0.0 {
            FitStatus::NoDims
        } else if qty_per_bin < sku.min_qty_per_bin || qty_per_bin <= 0 {
            FitStatus::NoFit
        } else {
            FitStatus::Fit
        };

        let fill = fill_metrics(qty, volume_mm3, weight_kg, sku.qty_stored, compartment_size, geometries);

        debug!(
            sku = %sku.sku,
            qty_per_bin,
            compartment_size = ?compartment_size,
            bin_count,
            fit_status = %fit_status,
            "SKU 容量计算"
        );

        CapacityRow {
            sku: sku.sku.clone(),
            length_mm,
            width_mm,
            height_mm,
            weight_kg,
            volume_mm3,
            min_qty_per_bin: sku.min_qty_per_bin,
            qty_stored: sku.qty_stored,
            qty_per_bin,
            qty_per_half,
            qty_per_quarter,
            qty_per_eighth,
            compartment_size,
            bin_count,
            capped_bin_count,
            fit_status,
            fill,
        }
    }
}

/// 选择满足最小数量与全部存量的最小格口, 否则退回整箱
///
/// qty 顺序: 整箱, 1/2, 1/4, 1/8; 可放数量为 0 的规格不参与选择
fn select_compartment_size(
    qty: [i64; 4],
    min_qty_per_bin: i64,
    qty_stored: i64,
    max_compartments: u32,
) -> Option<CompartmentSize> {
    let [whole, half, quarter, eighth] = qty;
    let holds_all = |q: i64| q > 0 && q >= min_qty_per_bin && q >= qty_stored;

    if max_compartments == 8 && holds_all(eighth) {
        Some(CompartmentSize::Eighth)
    } else if max_compartments >= 4 && holds_all(quarter) {
        Some(CompartmentSize::Quarter)
    } else if max_compartments >= 2 && holds_all(half) {
        Some(CompartmentSize::Half)
    } else if whole > 0 && whole >= min_qty_per_bin {
        Some(CompartmentSize::Whole)
    } else {
        None
    }
}

fn fill_metrics(
    qty: [i64; 4],
    volume_mm3: f64,
    weight_kg: f64,
    qty_stored: i64,
    compartment_size: Option<CompartmentSize>,
    geometries: &[CompartmentGeometry; 4],
) -> FillMetrics {
    let mut metrics = FillMetrics::default();
    for (idx, geometry) in geometries.iter().enumerate() {
        metrics.volume_fill[idx] = qty[idx] as f64 * volume_mm3 / geometry.volume_mm3();
        metrics.weight_fill[idx] = qty[idx] as f64 * weight_kg / geometry.max_weight_kg;
    }

    match compartment_size {
        Some(CompartmentSize::Whole) => {
            metrics.actual_volume_fill = metrics.volume_fill[0];
            metrics.actual_weight_fill = metrics.weight_fill[0];
        }
        Some(size) => {
            let geometry = geometries[fill_index(size)];
            metrics.actual_volume_fill = qty_stored as f64 * volume_mm3 / geometry.volume_mm3();
            metrics.actual_weight_fill = qty_stored as f64 * weight_kg / geometry.max_weight_kg;
        }
        None => {}
    }
    metrics
}

fn fill_index(size: CompartmentSize) -> usize {
    match size {
        CompartmentSize::Whole => 0,
        CompartmentSize::Half => 1,
        CompartmentSize::Quarter => 2,
        CompartmentSize::Eighth => 3,
    }
}

// ==========================================
// FitLookup - 按 SKU 查询适配状态
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct FitLookup {
    statuses: HashMap<String, FitStatus>,
}

impl FitLookup {
    pub fn from_rows(rows: &[CapacityRow]) -> Self {
        Self {
            statuses: rows
                .iter()
                .map(|row| (row.sku.clone(), row.fit_status))
                .collect(),
        }
    }

    /// 不在容量结果中的 SKU 返回 NotFound
    pub fn status_of(&self, sku: &str) -> FitStatus {
        self.statuses
            .get(sku)
            .copied()
            .unwrap_or(FitStatus::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::UnitSystem;

    fn sku(code: &str, dims: [f64; 4], min: i64, stored: i64) -> SkuMasterRow {
        SkuMasterRow {
            sku: code.to_string(),
            length: dims[0],
            width: dims[1],
            height: dims[2],
            weight: dims[3],
            min_qty_per_bin: min,
            qty_stored: stored,
        }
    }

    fn row_for(rows: &[CapacityRow], code: &str) -> CapacityRow {
        rows.iter().find(|r| r.sku == code).cloned().unwrap()
    }

    #[test]
    fn test_qty_per_compartment_cube() {
        let config = RunConfig::default();
        let calculator = CapacityCalculator::new();
        let rows = calculator.calculate(&[sku("CUBE", [100.0, 100.0, 100.0, 1.0], 1, 1)], &config);
        let row = &rows[0];

        // 整箱: 几何 72, 重量 25, 体积 53 → 25
        assert_eq!(row.qty_per_bin, 25);
        assert_eq!(row.qty_per_half, 12);
        assert_eq!(row.qty_per_quarter, 6);
        assert_eq!(row.qty_per_eighth, 3);
    }

    #[test]
    fn test_compartment_selection() {
        let config = RunConfig::default();
        let calculator = CapacityCalculator::new();
        let cube = [100.0, 100.0, 100.0, 1.0];
        let rows = calculator.calculate(
            &[
                sku("E", cube, 1, 3),
                sku("Q", cube, 1, 5),
                sku("H", cube, 1, 10),
                sku("W", cube, 1, 100),
            ],
            &config,
        );

        assert_eq!(row_for(&rows, "E").compartment_size, Some(CompartmentSize::Eighth));
        assert_eq!(row_for(&rows, "E").bin_count, 0.125);
        assert_eq!(row_for(&rows, "Q").compartment_size, Some(CompartmentSize::Quarter));
        assert_eq!(row_for(&rows, "H").compartment_size, Some(CompartmentSize::Half));

        let whole = row_for(&rows, "W");
        assert_eq!(whole.compartment_size, Some(CompartmentSize::Whole));
        assert_eq!(whole.bin_count, 4.0);

        // 按箱数降序
        assert_eq!(rows[0].sku, "W");
    }

    #[test]
    fn test_max_compartments_limits_selection() {
        let mut config = RunConfig::default();
        config.max_compartments = 2;
        let rows = CapacityCalculator::new()
            .calculate(&[sku("E", [100.0, 100.0, 100.0, 1.0], 1, 3)], &config);
        assert_eq!(rows[0].compartment_size, Some(CompartmentSize::Half));

        config.max_compartments = 1;
        let rows = CapacityCalculator::new()
            .calculate(&[sku("E", [100.0, 100.0, 100.0, 1.0], 1, 3)], &config);
        assert_eq!(rows[0].compartment_size, Some(CompartmentSize::Whole));
    }

    #[test]
    fn test_bin_count_capped() {
        let mut config = RunConfig::default();
        config.max_bins_per_sku = 3;
        let rows = CapacityCalculator::new()
            .calculate(&[sku("W", [100.0, 100.0, 100.0, 1.0], 1, 1_000)], &config);
        assert_eq!(rows[0].bin_count, 40.0);
        assert_eq!(rows[0].capped_bin_count, 3.0);
    }

    #[test]
    fn test_fit_status() {
        let config = RunConfig::default();
        let rows = CapacityCalculator::new().calculate(
            &[
                sku("NODIMS", [0.0, 0.0, 0.0, 0.0], 1, 10),
                sku("BIG", [700.0, 500.0, 400.0, 1.0], 1, 10),
                sku("HEAVY", [100.0, 100.0, 100.0, 1.0], 30, 60),
                sku("WEIGHTONLY", [0.0, 0.0, 0.0, 2.0], 1, 4),
            ],
            &config,
        );

        let nodims = row_for(&rows, "NODIMS");
        assert_eq!(nodims.fit_status, FitStatus::NoDims);
        assert_eq!(nodims.compartment_size, None);
        assert_eq!(row_for(&rows, "BIG").fit_status, FitStatus::NoFit);
        assert_eq!(row_for(&rows, "HEAVY").fit_status, FitStatus::NoFit);

        // 仅重量: floor(25 * 0.7 / 2) = 8
        let weight_only = row_for(&rows, "WEIGHTONLY");
        assert_eq!(weight_only.qty_per_bin, 8);
        assert_eq!(weight_only.fit_status, FitStatus::Fit);
    }

    #[test]
    fn test_imperial_conversion() {
        let mut config = RunConfig::default();
        config.unit_system = UnitSystem::Imperial;
        let rows = CapacityCalculator::new().calculate(&[sku("IMP", [10.0, 5.0, 2.0, 2.0], 1, 1)], &config);
        let row = &rows[0];

        assert!((row.length_mm - 254.0).abs() < 1e-9);
        assert!((row.width_mm - 127.0).abs() < 1e-9);
        assert!((row.height_mm - 50.8).abs() < 1e-9);
        assert!((row.weight_kg - 0.907184).abs() < 1e-9);
    }

    #[test]
    fn test_fill_metrics() {
        let config = RunConfig::default();
        let rows = CapacityCalculator::new()
            .calculate(&[sku("E", [100.0, 100.0, 100.0, 1.0], 1, 2)], &config);
        let row = &rows[0];
        let eighth = CompartmentGeometry::for_size(CompartmentSize::Eighth, 312.0, 25.0);

        assert_eq!(row.compartment_size, Some(CompartmentSize::Eighth));
        assert!((row.fill.weight_fill[0] - 1.0).abs() < 1e-9);
        assert!((row.fill.actual_volume_fill - 2.0 * 1e6 / eighth.volume_mm3()).abs() < 1e-9);
        assert!((row.fill.actual_weight_fill - 2.0 / 3.125).abs() < 1e-9);
    }

    #[test]
    fn test_fit_lookup() {
        let config = RunConfig::default();
        let rows = CapacityCalculator::new()
            .calculate(&[sku("A", [100.0, 100.0, 100.0, 1.0], 1, 2)], &config);
        let lookup = FitLookup::from_rows(&rows);
        assert_eq!(lookup.status_of("A"), FitStatus::Fit);
        assert_eq!(lookup.status_of("ZZZ"), FitStatus::NotFound);
    }
}
