// ==========================================
// 料箱仓储仿真系统 - 引擎编排器
// ==========================================
// 用途: 协调各引擎的执行顺序
// 流程: 容量计算 → 分箱 → 料箱堆分配 → 主数据初始化
//       → 初始完整检查 → 仿真 → 最终完整检查
// 无出库订单时只做容量计算 (箱数统计模式)
// ==========================================

use crate::config::RunConfig;
use crate::domain::bin::{BinEntry, Stack};
use crate::domain::order::PickOrder;
use crate::domain::sku::{CapacityRow, SkuMasterRow};
use crate::engine::bin_assigner::BinAssigner;
use crate::engine::capacity_calculator::{CapacityCalculator, FitLookup};
use crate::engine::consistency::{ConsistencyChecker, ConsistencyReport};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::OptionalEventPublisher;
use crate::engine::simulator::{SimulationControl, SimulationResult, Simulator};
use crate::engine::stack_assigner::StackAssigner;
use crate::perf::PerfGuard;
use crate::repository::{InitSummary, MasterDataSnapshot, MasterDataStore};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RunResult - 单次运行结果
// ==========================================

#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: String,

    // 容量计算输出
    pub capacity_rows: Vec<CapacityRow>,

    // 分箱 / 料箱堆输出 (箱数统计模式下为空)
    pub bins: Vec<BinEntry>,
    pub stacks: Vec<Stack>,
    pub empty_bins_added: usize,
    pub skipped_skus: Vec<String>,

    // 仿真输出
    pub init_summary: Option<InitSummary>,
    pub simulation: Option<SimulationResult>,
    pub initial_check: Option<ConsistencyReport>,
    pub final_check: Option<ConsistencyReport>,
    pub final_state: Option<MasterDataSnapshot>,

    pub elapsed_ms: u128,
}

impl RunResult {
    pub fn is_capacity_only(&self) -> bool {
        self.simulation.is_none()
    }

    /// 初始与最终检查均通过 (未执行的检查视为通过)
    pub fn is_consistent(&self) -> bool {
        [&self.initial_check, &self.final_check]
            .iter()
            .all(|r| r.as_ref().map(|r| r.all_passed).unwrap_or(true))
    }
}

// ==========================================
// RunOrchestrator - 引擎编排器
// ==========================================

pub struct RunOrchestrator {
    calculator: CapacityCalculator,
    bin_assigner: BinAssigner,
    stack_assigner: StackAssigner,
    publisher: OptionalEventPublisher,
}

impl Default for RunOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl RunOrchestrator {
    /// 创建新的编排器实例
    pub fn new() -> Self {
        Self {
            calculator: CapacityCalculator::new(),
            bin_assigner: BinAssigner::new(),
            stack_assigner: StackAssigner::new(),
            publisher: OptionalEventPublisher::none(),
        }
    }

    pub fn with_publisher(mut self, publisher: OptionalEventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    /// 执行完整运行流程
    ///
    /// # 参数
    /// - sku_rows: 已清洗的 SKU 主数据
    /// - outbound: 已排序的出库订单行; None 表示箱数统计模式
    /// - config: 运行配置
    /// - control: 仿真控制句柄
    #[instrument(skip_all, fields(sku_rows = sku_rows.len(), has_outbound = outbound.is_some()))]
    pub fn execute(
        &self,
        sku_rows: &[SkuMasterRow],
        outbound: Option<Vec<PickOrder>>,
        config: &RunConfig,
        control: &SimulationControl,
    ) -> EngineResult<RunResult> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        config.validate()?;

        if sku_rows.is_empty() {
            return Err(EngineError::InputRejected(vec!["SKU 主数据为空".to_string()]));
        }

        info!(run_id = %run_id, "开始执行运行流程");

        // ==========================================
        // 步骤1: 容量计算
        // ==========================================
        debug!("步骤1: 容量计算");
        let capacity_rows = {
            let mut perf = PerfGuard::new("capacity");
            perf.set_items(sku_rows.len());
            self.calculator.calculate(sku_rows, config)
        };

        let Some(orders) = outbound else {
            info!(run_id = %run_id, rows = capacity_rows.len(), "无出库订单, 仅输出箱数统计");
            return Ok(RunResult {
                run_id,
                capacity_rows,
                bins: Vec::new(),
                stacks: Vec::new(),
                empty_bins_added: 0,
                skipped_skus: Vec::new(),
                init_summary: None,
                simulation: None,
                initial_check: None,
                final_check: None,
                final_state: None,
                elapsed_ms: started.elapsed().as_millis(),
            });
        };

        // ==========================================
        // 步骤2: 分箱
        // ==========================================
        debug!("步骤2: 分箱");
        let assignment = self.bin_assigner.assign(&capacity_rows);

        // ==========================================
        // 步骤3: 料箱堆分配
        // ==========================================
        debug!("步骤3: 料箱堆分配");
        let layout = self.stack_assigner.assign(assignment.bins, config)?;

        // ==========================================
        // 步骤4: 主数据初始化
        // ==========================================
        debug!("步骤4: 主数据初始化");
        let store = MasterDataStore::new()?;
        let init_summary = store.initialize(
            &capacity_rows,
            &layout.bins,
            &layout.stacks,
            config.max_bins_per_sku,
            config.restock_pct,
        )?;

        // ==========================================
        // 步骤5: 初始完整检查
        // ==========================================
        let checker = ConsistencyChecker::new(&store, config.check_cadence);
        let initial_check = checker.validate_all("initial")?;
        if !initial_check.all_passed {
            if config.halt_on_inconsistency {
                error!(run_id = %run_id, "初始数据不一致, 中止运行");
                return Err(EngineError::Inconsistent(initial_check.summary_line()));
            }
            warn!(run_id = %run_id, "初始数据存在不一致, 继续仿真");
        }

        // ==========================================
        // 步骤6: 仿真
        // ==========================================
        debug!("步骤6: 仿真");
        let fit = FitLookup::from_rows(&capacity_rows);
        let simulation = Simulator::new(&store, &fit, config)
            .with_publisher(self.publisher.clone())
            .with_run_id(run_id.clone())
            .run(orders, control)?;

        // ==========================================
        // 步骤7: 最终完整检查
        // ==========================================
        let final_check = checker.validate_all("final")?;
        let final_state = store.snapshot()?;

        let elapsed_ms = started.elapsed().as_millis();
        info!(
            run_id = %run_id,
            bins = layout.bins.len(),
            stacks = layout.stacks.len(),
            resolved = simulation.counts.fit,
            stop_reason = %simulation.stop_reason,
            consistent = final_check.all_passed,
            elapsed_ms = elapsed_ms as u64,
            "运行流程完成"
        );

        Ok(RunResult {
            run_id,
            capacity_rows,
            bins: layout.bins,
            stacks: layout.stacks,
            empty_bins_added: layout.empty_bins_added,
            skipped_skus: assignment.skipped,
            init_summary: Some(init_summary),
            simulation: Some(simulation),
            initial_check: Some(initial_check),
            final_check: Some(final_check),
            final_state: Some(final_state),
            elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sku(code: &str, dims: [f64; 4], stored: i64) -> SkuMasterRow {
        SkuMasterRow {
            sku: code.to_string(),
            length: dims[0],
            width: dims[1],
            height: dims[2],
            weight: dims[3],
            min_qty_per_bin: 1,
            qty_stored: stored,
        }
    }

    fn config() -> RunConfig {
        RunConfig {
            shuffle_seed: Some(11),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_capacity_only_mode() {
        let rows = vec![sku("A", [100.0, 100.0, 100.0, 1.0], 10)];
        let result = RunOrchestrator::new()
            .execute(&rows, None, &config(), &SimulationControl::default())
            .unwrap();

        assert!(result.is_capacity_only());
        assert_eq!(result.capacity_rows.len(), 1);
        assert!(result.bins.is_empty());
        assert!(result.final_state.is_none());
    }

    #[test]
    fn test_empty_master_is_rejected() {
        let err = RunOrchestrator::new()
            .execute(&[], Some(Vec::new()), &config(), &SimulationControl::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InputRejected(_)));
    }

    #[test]
    fn test_full_pipeline_is_consistent() {
        let rows = vec![
            sku("A", [100.0, 100.0, 100.0, 1.0], 300),
            sku("B", [50.0, 50.0, 50.0, 0.2], 20),
        ];
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let orders = vec![
            PickOrder::new(1, "A", ts, 5),
            PickOrder::new(2, "B", ts, 3),
            PickOrder::new(3, "MISSING", ts, 1),
        ];

        let result = RunOrchestrator::new()
            .execute(&rows, Some(orders), &config(), &SimulationControl::default())
            .unwrap();

        let sim = result.simulation.as_ref().unwrap();
        assert_eq!(sim.counts.fit, 2);
        assert_eq!(sim.counts.not_found, 1);
        assert!(result.is_consistent());
        assert!(!result.stacks.is_empty());
        assert!(result.empty_bins_added > 0);
    }
}
