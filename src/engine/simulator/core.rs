use super::types::{
    is_checkpoint, LineCounts, SimulationControl, SimulationResult, SimulationStats, StopReason,
};
use crate::config::RunConfig;
use crate::domain::order::{BinVisit, PickAnnotation, PickOrder};
use crate::domain::types::LineOutcome;
use crate::engine::capacity_calculator::FitLookup;
use crate::engine::consistency::ConsistencyChecker;
use crate::engine::error::EngineResult;
use crate::engine::events::{OptionalEventPublisher, SimulationCheckpoint};
use crate::perf::PerfGuard;
use crate::repository::MasterDataStore;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// Simulator - 拣选仿真引擎
// ==========================================
pub struct Simulator<'a> {
    pub(super) store: &'a MasterDataStore,
    fit: &'a FitLookup,
    config: &'a RunConfig,
    publisher: OptionalEventPublisher,
    run_id: String,
}

impl<'a> Simulator<'a> {
    pub fn new(store: &'a MasterDataStore, fit: &'a FitLookup, config: &'a RunConfig) -> Self {
        Self {
            store,
            fit,
            config,
            publisher: OptionalEventPublisher::none(),
            run_id: String::new(),
        }
    }

    pub fn with_publisher(mut self, publisher: OptionalEventPublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    // ==========================================
    // 主循环
    // ==========================================

    /// 逐行回放订单
    ///
    /// 订单须已按时间戳稳定排序; 停止请求在每行开始前检查
    #[instrument(skip(self, orders, control), fields(run_id = %self.run_id, orders = orders.len()))]
    pub fn run(&self, mut orders: Vec<PickOrder>, control: &SimulationControl) -> EngineResult<SimulationResult> {
        let mut perf = PerfGuard::new("simulate");
        perf.set_items(orders.len());

        let checker = ConsistencyChecker::new(self.store, self.config.check_cadence);
        let mut counts = LineCounts {
            total: orders.len(),
            ..LineCounts::default()
        };
        let mut stats = SimulationStats::default();
        let mut check_reports = Vec::new();
        let mut stop_reason = StopReason::Completed;
        let mut processed = 0;

        info!(total = orders.len(), save_interval = self.config.save_interval, "开始仿真");

        for idx in 0..orders.len() {
            if control.is_stop_requested() {
                stop_reason = StopReason::UserRequested;
                warn!(processed, "收到停止请求, 保存当前状态并退出");
                break;
            }

            if is_checkpoint(idx, self.config.save_interval) {
                self.publish_checkpoint(&orders[..idx], counts, false);
            }

            if idx != 0 {
                if let Some(report) = checker.adaptive_check(idx)? {
                    let passed = report.all_passed;
                    check_reports.push(report);
                    if !passed && self.config.halt_on_inconsistency {
                        stop_reason = StopReason::InconsistentData;
                        error!(iteration = idx, "一致性检查失败, 按配置中止仿真");
                        break;
                    }
                }
            }

            let order = &mut orders[idx];
            self.process_line(order, &mut stats)?;
            counts.record(order.outcome);
            processed += 1;
        }

        self.publish_checkpoint(&orders[..processed], counts, true);

        info!(
            processed,
            fit = counts.fit,
            no_fit = counts.no_fit,
            excluded = counts.excluded(),
            insufficient = counts.insufficient,
            unresolved = counts.unresolved,
            restocks = stats.restocks,
            consolidations = stats.consolidations,
            stop_reason = %stop_reason,
            "仿真结束"
        );

        Ok(SimulationResult {
            orders,
            counts,
            stats,
            stop_reason,
            processed,
            check_reports,
        })
    }

    fn publish_checkpoint(&self, done: &[PickOrder], counts: LineCounts, is_final: bool) {
        let resolved_rows = if self.publisher.is_configured() {
            done.iter().filter(|o| o.is_resolved()).cloned().collect()
        } else {
            Vec::new()
        };
        let checkpoint = SimulationCheckpoint {
            run_id: self.run_id.clone(),
            processed: done.len(),
            total: counts.total,
            counts,
            resolved_rows,
            is_final,
        };
        if let Err(e) = self.publisher.publish(checkpoint) {
            warn!(error = %e, "检查点发布失败");
        }
    }

    // ==========================================
    // 单行处理
    // ==========================================

    /// 处理一个订单行, 结果写回 order.outcome / order.annotation
    pub(super) fn process_line(&self, order: &mut PickOrder, stats: &mut SimulationStats) -> EngineResult<()> {
        // 1. 适配状态
        if let Some(excluded) = LineOutcome::excluded_for(self.fit.status_of(&order.sku)) {
            order.outcome = excluded;
            return Ok(());
        }

        // 2. 系统库存
        let Some(sku) = self.store.get_sku(&order.sku)? else {
            error!(line = order.line_no, sku = %order.sku, "适配 SKU 不在 sku_live 中");
            return Ok(());
        };
        if order.qty <= 0 {
            warn!(line = order.line_no, sku = %order.sku, qty = order.qty, "订单数量非正, 跳过");
            return Ok(());
        }
        if order.qty > sku.qty_in_system {
            debug!(
                line = order.line_no,
                sku = %order.sku,
                requested = order.qty,
                available = sku.qty_in_system,
                "系统库存不足"
            );
            order.outcome = LineOutcome::Insufficient;
            return Ok(());
        }

        // 3. 修改前确认库位可用
        let stock = self.store.sku_stock_total(&order.sku)?;
        if stock < order.qty {
            error!(
                line = order.line_no,
                sku = %order.sku,
                qty_in_system = sku.qty_in_system,
                stock,
                "格口库存少于系统库存, 订单行不处理"
            );
            return Ok(());
        }
        let Some(first) = self.store.priority_location(&order.sku, 1)? else {
            error!(line = order.line_no, sku = %order.sku, "SKU 没有优先级 1 库位");
            return Ok(());
        };
        if self.store.resolve_stack(first.bin_id)?.is_none() {
            return Ok(());
        }

        // 4. 拣选
        let qty_before = sku.qty_in_system;
        let visits = self.pick(order, stats)?;
        match PickAnnotation::from_visits(visits, qty_before) {
            Some(annotation) if annotation.visits.iter().map(|v| v.qty_picked).sum::<i64>() == order.qty => {
                order.annotation = Some(annotation);
                order.outcome = LineOutcome::Resolved;
            }
            partial => {
                error!(line = order.line_no, sku = %order.sku, "拣选中途查找失败, 订单行保持未处理");
                order.annotation = partial;
                return Ok(());
            }
        }

        // 5. 补货
        if let Some(after) = self.store.get_sku(&order.sku)? {
            if after.qty_in_system <= after.restock_qty {
                self.restock(&after, stats)?;
            }
        }
        Ok(())
    }

    /// 从优先级 1 库位反复取货直到满足数量
    ///
    /// 每访问一个料箱都把它移到堆顶
    fn pick(&self, order: &PickOrder, stats: &mut SimulationStats) -> EngineResult<Vec<BinVisit>> {
        let mut visits = Vec::new();
        let mut remaining = order.qty;

        while remaining > 0 {
            let Some(location) = self.store.priority_location(&order.sku, 1)? else {
                error!(sku = %order.sku, remaining, "拣选中优先级 1 库位丢失");
                break;
            };

            if location.qty_in_bin <= 0 {
                warn!(sku = %order.sku, bin_id = location.bin_id, "优先级 1 格口数量为 0, 清空后重排");
                self.release_compartment(&order.sku, location.bin_id, location.compartment_id, true)?;
                continue;
            }

            let Some(stack_id) = self.store.resolve_stack(location.bin_id)? else {
                break;
            };

            let take = remaining.min(location.qty_in_bin);
            let left_in_bin = self
                .store
                .adjust_bin_qty(location.bin_id, location.compartment_id, -take)?;
            let left_in_system = self.store.adjust_sku_qty(&order.sku, -take)?;

            let Some(bins_above) = self.store.pop_to_top(location.bin_id)? else {
                break;
            };
            visits.push(BinVisit {
                bin_id: location.bin_id,
                stack_id,
                bins_above,
                qty_picked: take,
            });
            stats.bin_visits += 1;
            remaining -= take;

            if left_in_bin == 0 {
                self.release_compartment(
                    &order.sku,
                    location.bin_id,
                    location.compartment_id,
                    left_in_system > 0,
                )?;
            }
        }
        Ok(visits)
    }

    /// 清空格口; 系统仍有库存时重排剩余库位, 最后刷新优先级 1 料箱
    pub(super) fn release_compartment(
        &self,
        sku: &str,
        bin_id: i64,
        compartment_id: i64,
        rerank: bool,
    ) -> EngineResult<()> {
        self.store.mark_compartment_empty(bin_id, compartment_id)?;
        if rerank {
            self.store.rerank_priorities(sku)?;
        }
        self.store.refresh_priority_bin(sku)?;
        Ok(())
    }
}
