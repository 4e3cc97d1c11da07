use super::report::{CheckKind, ConsistencyIssue, ConsistencyReport};
use crate::config::CheckCadence;
use crate::domain::types::BinId;
use crate::repository::{MasterDataSnapshot, MasterDataStore, RepositoryResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, error, info, instrument, warn};

/// 最小检查抽样的 SKU 数
const PRIORITY_SAMPLE_SIZE: usize = 5;

// ==========================================
// ConsistencyChecker - 一致性检查器
// ==========================================
pub struct ConsistencyChecker<'a> {
    store: &'a MasterDataStore,
    cadence: CheckCadence,
}

impl<'a> ConsistencyChecker<'a> {
    pub fn new(store: &'a MasterDataStore, cadence: CheckCadence) -> Self {
        Self { store, cadence }
    }

    // ==========================================
    // 分级入口
    // ==========================================

    /// 完整检查: 读取快照后执行全部检查项
    #[instrument(skip(self), fields(context = %context))]
    pub fn validate_all(&self, context: &str) -> RepositoryResult<ConsistencyReport> {
        let snapshot = self.store.snapshot()?;
        let report = Self::validate_snapshot(&snapshot, context);
        Self::log_report(&report);
        Ok(report)
    }

    /// 快速检查: 数量 + 优先级
    pub fn quick_check(&self, context: &str) -> RepositoryResult<ConsistencyReport> {
        let snapshot = self.store.snapshot()?;
        let mut report = ConsistencyReport::new(context);
        report.record(CheckKind::Quantity, check_quantity(&snapshot));
        report.record(CheckKind::Priority, check_priority(&snapshot));
        Self::log_report(&report);
        Ok(report)
    }

    /// 最小检查: 健康计数 + 前若干个 SKU 的优先级 1 抽样
    pub fn minimal_check(&self, context: &str) -> RepositoryResult<ConsistencyReport> {
        let mut report = ConsistencyReport::new(context);

        let counts = self.store.health_counts()?;
        let mut health = Vec::new();
        if counts.sku_rows == 0 || counts.content_rows == 0 {
            health.push(ConsistencyIssue::warning(
                CheckKind::Health,
                format!("实时表为空 (sku_live={}, bin_content_live={})", counts.sku_rows, counts.content_rows),
            ));
        }
        if counts.negative_sku_qty > 0 {
            health.push(ConsistencyIssue::error(
                CheckKind::Health,
                format!("{} 个 SKU 系统库存为负", counts.negative_sku_qty),
            ));
        }
        if counts.negative_bin_qty > 0 {
            health.push(ConsistencyIssue::error(
                CheckKind::Health,
                format!("{} 个格口数量为负", counts.negative_bin_qty),
            ));
        }
        report.record(CheckKind::Health, health);

        let mut sample = Vec::new();
        for sku in self
            .store
            .list_skus()?
            .into_iter()
            .filter(|s| s.qty_in_system > 0)
            .take(PRIORITY_SAMPLE_SIZE)
        {
            let firsts = self
                .store
                .sku_locations(&sku.sku)?
                .into_iter()
                .filter(|row| row.priority == Some(1))
                .count();
            if firsts != 1 {
                sample.push(
                    ConsistencyIssue::error(
                        CheckKind::Priority,
                        format!("SKU {} 有 {} 个优先级 1 库位", sku.sku, firsts),
                    )
                    .with_sku(sku.sku.clone()),
                );
            }
        }
        report.record(CheckKind::Priority, sample);

        Self::log_report(&report);
        Ok(report)
    }

    /// 按迭代次数选择检查级别
    ///
    /// 间隔为 0 的级别不启用; 多个级别同时命中时取最完整者
    pub fn adaptive_check(&self, iteration: usize) -> RepositoryResult<Option<ConsistencyReport>> {
        let hits = |every: usize| every > 0 && iteration % every == 0;
        let context = format!("iteration {}", iteration);

        if hits(self.cadence.full_every) {
            self.validate_all(&context).map(Some)
        } else if hits(self.cadence.quick_every) {
            self.quick_check(&context).map(Some)
        } else if hits(self.cadence.minimal_every) {
            self.minimal_check(&context).map(Some)
        } else {
            Ok(None)
        }
    }

    /// 对给定快照执行全部检查项
    pub fn validate_snapshot(snapshot: &MasterDataSnapshot, context: &str) -> ConsistencyReport {
        let mut report = ConsistencyReport::new(context);
        report.record(CheckKind::Quantity, check_quantity(snapshot));
        report.record(CheckKind::Priority, check_priority(snapshot));
        report.record(CheckKind::BinCapacity, check_bin_capacity(snapshot));
        report.record(CheckKind::EmptyCompartment, check_empty_compartments(snapshot));
        report.record(CheckKind::CompartmentCount, check_compartment_count(snapshot));
        report.record(CheckKind::StackLookup, check_stack_lookup(snapshot));
        report.record(CheckKind::DataType, check_data_types(snapshot));
        report.record(CheckKind::Orphaned, check_orphaned(snapshot));
        report
    }

    fn log_report(report: &ConsistencyReport) {
        if report.all_passed {
            debug!(
                context = %report.context,
                checks = report.checks_run.len(),
                warnings = report.warning_count(),
                "一致性检查通过"
            );
            return;
        }
        error!(
            context = %report.context,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "一致性检查失败"
        );
        for issue in &report.issues {
            warn!(
                check = %issue.check,
                severity = ?issue.severity,
                sku = ?issue.sku,
                bin_id = ?issue.bin_id,
                "{}",
                issue.message
            );
        }
        info!("{}", report.summary_line());
    }
}

// ==========================================
// 检查项
// ==========================================

/// 每个 SKU 的格口数量之和等于系统库存
fn check_quantity(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    let mut stocked: HashMap<&str, i64> = HashMap::new();
    for row in &snapshot.compartments {
        if let Some(sku) = row.sku.as_deref() {
            *stocked.entry(sku).or_insert(0) += row.qty_in_bin;
        }
    }

    snapshot
        .skus
        .iter()
        .filter_map(|sku| {
            let in_bins = stocked.get(sku.sku.as_str()).copied().unwrap_or(0);
            (in_bins != sku.qty_in_system).then(|| {
                ConsistencyIssue::error(
                    CheckKind::Quantity,
                    format!(
                        "SKU {} 系统库存 {} 与格口数量之和 {} 不一致",
                        sku.sku, sku.qty_in_system, in_bins
                    ),
                )
                .with_sku(sku.sku.clone())
            })
        })
        .collect()
}

/// 有库存的 SKU: 恰好一个优先级 1, 优先级连续为 1..k, prio_bin 指向优先级 1 料箱
fn check_priority(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();

    let mut by_sku: HashMap<&str, Vec<(i64, BinId)>> = HashMap::new();
    for row in &snapshot.compartments {
        let Some(sku) = row.sku.as_deref() else { continue };
        match row.priority {
            Some(p) if p >= 1 => by_sku.entry(sku).or_default().push((p, row.bin_id)),
            other => issues.push(
                ConsistencyIssue::error(
                    CheckKind::Priority,
                    format!("SKU {} 在料箱 {} 的优先级非法: {:?}", sku, row.bin_id, other),
                )
                .with_sku(sku)
                .with_bin(row.bin_id),
            ),
        }
    }

    for sku in snapshot.skus.iter().filter(|s| s.qty_in_system > 0) {
        let mut entries = by_sku.get(sku.sku.as_str()).cloned().unwrap_or_default();
        entries.sort();

        let firsts: Vec<BinId> = entries.iter().filter(|(p, _)| *p == 1).map(|(_, b)| *b).collect();
        if firsts.len() != 1 {
            issues.push(
                ConsistencyIssue::error(
                    CheckKind::Priority,
                    format!("SKU {} 有 {} 个优先级 1 库位", sku.sku, firsts.len()),
                )
                .with_sku(sku.sku.clone()),
            );
        }

        let gapless = entries
            .iter()
            .enumerate()
            .all(|(idx, (p, _))| *p == idx as i64 + 1);
        if !gapless {
            let priorities: Vec<i64> = entries.iter().map(|(p, _)| *p).collect();
            issues.push(
                ConsistencyIssue::error(
                    CheckKind::Priority,
                    format!("SKU {} 优先级不连续: {:?}", sku.sku, priorities),
                )
                .with_sku(sku.sku.clone()),
            );
        }

        if let [first] = firsts.as_slice() {
            if sku.prio_bin != Some(*first) {
                issues.push(
                    ConsistencyIssue::error(
                        CheckKind::Priority,
                        format!(
                            "SKU {} 的 prio_bin={:?} 与优先级 1 料箱 {} 不一致",
                            sku.sku, sku.prio_bin, first
                        ),
                    )
                    .with_sku(sku.sku.clone())
                    .with_bin(*first),
                );
            }
        }
    }
    issues
}

/// 料箱占用计数等于已占用格口数
fn check_bin_capacity(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    let mut occupied: HashMap<BinId, i64> = HashMap::new();
    for row in &snapshot.compartments {
        let counter = occupied.entry(row.bin_id).or_insert(0);
        if row.is_occupied() {
            *counter += 1;
        }
    }

    let mut issues = Vec::new();
    let known: HashSet<BinId> = snapshot.capacity.iter().map(|c| c.bin_id).collect();
    for record in &snapshot.capacity {
        let actual = occupied.get(&record.bin_id).copied().unwrap_or(0);
        if actual != record.num_full_compartments {
            issues.push(
                ConsistencyIssue::error(
                    CheckKind::BinCapacity,
                    format!(
                        "料箱 {} 占用计数 {} 与实际占用格口数 {} 不一致",
                        record.bin_id, record.num_full_compartments, actual
                    ),
                )
                .with_bin(record.bin_id),
            );
        }
    }
    let mut missing: Vec<BinId> = occupied.keys().filter(|b| !known.contains(b)).copied().collect();
    missing.sort_unstable();
    for bin_id in missing {
        issues.push(
            ConsistencyIssue::error(CheckKind::BinCapacity, format!("料箱 {} 缺少 bins_capacity 记录", bin_id))
                .with_bin(bin_id),
        );
    }
    issues
}

/// 空格口必须是 SKU/优先级为空且数量为 0 的干净状态
fn check_empty_compartments(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    snapshot
        .compartments
        .iter()
        .filter_map(|row| {
            let message = match (&row.sku, row.priority, row.qty_in_bin) {
                (None, None, 0) => return None,
                (None, _, _) => format!(
                    "料箱 {} 格口 {} 无 SKU 但优先级={:?} 数量={}",
                    row.bin_id, row.compartment_id, row.priority, row.qty_in_bin
                ),
                (Some(sku), _, 0) => format!(
                    "料箱 {} 格口 {} 仍登记 SKU {} 但数量为 0",
                    row.bin_id, row.compartment_id, sku
                ),
                _ => return None,
            };
            let issue = ConsistencyIssue::warning(CheckKind::EmptyCompartment, message).with_bin(row.bin_id);
            Some(match &row.sku {
                Some(sku) => issue.with_sku(sku.clone()),
                None => issue,
            })
        })
        .collect()
}

/// 每个料箱的格口行数 = 1 / 格口规格, 且各行规格与料箱一致
fn check_compartment_count(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    let mut rows: BTreeMap<BinId, Vec<_>> = BTreeMap::new();
    for row in &snapshot.compartments {
        rows.entry(row.bin_id).or_default().push(row.compartment_size);
    }

    let mut issues = Vec::new();
    for record in &snapshot.capacity {
        let sizes = rows.get(&record.bin_id).map(Vec::as_slice).unwrap_or(&[]);
        let expected = record.compartment_size.compartments_per_bin() as usize;
        if sizes.len() != expected {
            issues.push(
                ConsistencyIssue::error(
                    CheckKind::CompartmentCount,
                    format!(
                        "料箱 {} ({}) 应有 {} 个格口行, 实际 {}",
                        record.bin_id,
                        record.compartment_size,
                        expected,
                        sizes.len()
                    ),
                )
                .with_bin(record.bin_id),
            );
        }
        if sizes.iter().any(|s| *s != record.compartment_size) {
            issues.push(
                ConsistencyIssue::error(
                    CheckKind::CompartmentCount,
                    format!("料箱 {} 的格口行规格与料箱规格 {} 不一致", record.bin_id, record.compartment_size),
                )
                .with_bin(record.bin_id),
            );
        }
    }
    issues
}

/// 每个料箱都在料箱堆中, 堆内深度为 0..n-1 连续
fn check_stack_lookup(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();
    let located: HashSet<BinId> = snapshot.stack_lookup.iter().map(|r| r.bin_id).collect();
    let known: HashSet<BinId> = snapshot.capacity.iter().map(|c| c.bin_id).collect();

    for record in &snapshot.capacity {
        if !located.contains(&record.bin_id) {
            issues.push(
                ConsistencyIssue::error(CheckKind::StackLookup, format!("料箱 {} 不在任何料箱堆中", record.bin_id))
                    .with_bin(record.bin_id),
            );
        }
    }

    for row in &snapshot.stack_lookup {
        if !known.contains(&row.bin_id) {
            issues.push(
                ConsistencyIssue::warning(
                    CheckKind::StackLookup,
                    format!("stacks_lookup 中的料箱 {} 没有 bins_capacity 记录", row.bin_id),
                )
                .with_bin(row.bin_id),
            );
        }
    }

    let mut positions: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for row in &snapshot.stack_lookup {
        positions.entry(row.stack_id).or_default().push(row.position);
    }
    for (stack_id, mut depths) in positions {
        depths.sort_unstable();
        let contiguous = depths.iter().enumerate().all(|(idx, d)| *d == idx as i64);
        if !contiguous {
            issues.push(ConsistencyIssue::error(
                CheckKind::StackLookup,
                format!("料箱堆 {} 深度不连续: {:?}", stack_id, depths),
            ));
        }
    }
    issues
}

/// 负数量与非法取值
fn check_data_types(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();
    for sku in &snapshot.skus {
        if sku.qty_in_system < 0 {
            issues.push(
                ConsistencyIssue::error(CheckKind::DataType, format!("SKU {} 系统库存为负: {}", sku.sku, sku.qty_in_system))
                    .with_sku(sku.sku.clone()),
            );
        }
        if sku.full_bin_qty <= 0 {
            issues.push(
                ConsistencyIssue::warning(
                    CheckKind::DataType,
                    format!("SKU {} 整箱满载数量非正: {}", sku.sku, sku.full_bin_qty),
                )
                .with_sku(sku.sku.clone()),
            );
        }
    }
    for row in snapshot.compartments.iter().filter(|r| r.qty_in_bin < 0) {
        issues.push(
            ConsistencyIssue::error(
                CheckKind::DataType,
                format!("料箱 {} 格口 {} 数量为负: {}", row.bin_id, row.compartment_id, row.qty_in_bin),
            )
            .with_bin(row.bin_id),
        );
    }
    for record in &snapshot.capacity {
        let limit = record.compartment_size.compartments_per_bin() as i64;
        if record.num_full_compartments < 0 || record.num_full_compartments > limit {
            issues.push(
                ConsistencyIssue::error(
                    CheckKind::DataType,
                    format!(
                        "料箱 {} 占用计数 {} 超出 [0, {}]",
                        record.bin_id, record.num_full_compartments, limit
                    ),
                )
                .with_bin(record.bin_id),
            );
        }
    }
    issues
}

/// 格口引用的 SKU 必须存在于 sku_live
fn check_orphaned(snapshot: &MasterDataSnapshot) -> Vec<ConsistencyIssue> {
    let known: HashSet<&str> = snapshot.skus.iter().map(|s| s.sku.as_str()).collect();
    snapshot
        .compartments
        .iter()
        .filter_map(|row| {
            let sku = row.sku.as_deref()?;
            (!known.contains(sku)).then(|| {
                ConsistencyIssue::error(
                    CheckKind::Orphaned,
                    format!("料箱 {} 格口 {} 引用了不存在的 SKU {}", row.bin_id, row.compartment_id, sku),
                )
                .with_sku(sku)
                .with_bin(row.bin_id)
            })
        })
        .collect()
}
