// ==========================================
// 料箱仓储仿真系统 - 料箱堆分配引擎
// ==========================================
// 职责:
// 1) 按空箱比例补充空料箱, 各规格按已占用料箱占比分摊
// 2) 按平均堆高 (扣除系统空洞) 计算料箱堆数
// 3) 随机打乱后轮询放入各料箱堆
// ==========================================
// 随机性: 唯一的随机来源, shuffle_seed 固定时结果可复现
// 输出: 每个料箱堆自顶向下的 bin_id 序列 (index 0 = 堆顶)
// ==========================================

use crate::config::RunConfig;
use crate::domain::bin::{BinEntry, Stack};
use crate::domain::types::{BinId, CompartmentSize};
use crate::engine::error::{EngineError, EngineResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// 空箱分摊时的规格顺序 (并列最多时取靠前者)
const EMPTY_BIN_ORDER: [CompartmentSize; 4] = [
    CompartmentSize::Whole,
    CompartmentSize::Half,
    CompartmentSize::Quarter,
    CompartmentSize::Eighth,
];

/// 料箱堆分配结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackLayout {
    /// 已占用料箱 + 补充的空料箱
    pub bins: Vec<BinEntry>,
    pub stacks: Vec<Stack>,
    pub empty_bins_added: usize,
}

// ==========================================
// StackAssigner - 料箱堆分配引擎
// ==========================================
pub struct StackAssigner {
    // 无状态引擎
}

impl Default for StackAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl StackAssigner {
    pub fn new() -> Self {
        Self {}
    }

    #[instrument(skip(self, bins, config), fields(
        filled_bins = bins.len(),
        stack_height = config.stack_height,
        seed = ?config.shuffle_seed
    ))]
    pub fn assign(&self, bins: Vec<BinEntry>, config: &RunConfig) -> EngineResult<StackLayout> {
        let (bins, empty_bins_added) = self.add_empty_bins(bins, config.empty_bins_pct);

        let adjusted_height = (config.stack_height as f64 - 1.0) + (1.0 - config.system_holes_pct / 100.0);
        if adjusted_height <= 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "有效堆高必须为正 (stack_height={}, system_holes_pct={})",
                config.stack_height, config.system_holes_pct
            )));
        }

        let stack_count = (bins.len() as f64 / adjusted_height).ceil() as usize;
        let stacks = self.distribute(&bins, stack_count, config.shuffle_seed);

        info!(
            total_bins = bins.len(),
            empty_bins_added,
            stack_count,
            adjusted_height,
            "料箱堆分配完成"
        );
        Ok(StackLayout {
            bins,
            stacks,
            empty_bins_added,
        })
    }

    /// 补充空料箱, 返回 (全部料箱, 新增空箱数)
    ///
    /// 空箱总数 = ceil(比例 * 已占用料箱数); 各规格取 floor(占比 * 总数), 余数归最多的规格
    pub fn add_empty_bins(&self, mut bins: Vec<BinEntry>, empty_bins_pct: f64) -> (Vec<BinEntry>, usize) {
        let filled = bins.len();
        let total_empty = (empty_bins_pct / 100.0 * filled as f64).ceil().max(0.0) as usize;
        if total_empty == 0 {
            return (bins, 0);
        }

        let counts: Vec<(CompartmentSize, usize)> = EMPTY_BIN_ORDER
            .iter()
            .map(|size| (*size, bins.iter().filter(|b| b.compartment_size == *size).count()))
            .collect();

        let mut per_size: Vec<(CompartmentSize, usize)> = counts
            .iter()
            .map(|(size, count)| {
                let share = *count as f64 / filled as f64;
                (*size, (share * total_empty as f64).floor() as usize)
            })
            .collect();

        let allocated: usize = per_size.iter().map(|(_, n)| n).sum();
        if allocated < total_empty {
            // 取最多的规格, 并列时取顺序靠前者
            let mut most_common = 0;
            for (idx, (_, count)) in counts.iter().enumerate() {
                if *count > counts[most_common].1 {
                    most_common = idx;
                }
            }
            per_size[most_common].1 += total_empty - allocated;
        }

        let mut next_id: BinId = bins.iter().map(|b| b.bin_id).max().unwrap_or(0) + 1;
        for (size, count) in per_size {
            for _ in 0..count {
                bins.push(BinEntry::empty(next_id, size));
                next_id += 1;
            }
            if count > 0 {
                debug!(compartment_size = %size, count, "补充空料箱");
            }
        }

        (bins, total_empty)
    }

    /// 打乱料箱顺序后轮询放入料箱堆
    fn distribute(&self, bins: &[BinEntry], stack_count: usize, seed: Option<u64>) -> Vec<Stack> {
        if stack_count == 0 {
            return Vec::new();
        }

        let mut order: Vec<BinId> = bins.iter().map(|b| b.bin_id).collect();
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        order.shuffle(&mut rng);

        let mut stacks: Vec<Stack> = (0..stack_count)
            .map(|idx| Stack {
                stack_id: idx as i64,
                bins: Vec::new(),
            })
            .collect();
        for (idx, bin_id) in order.into_iter().enumerate() {
            stacks[idx % stack_count].bins.push(bin_id);
        }
        stacks
    }
}
