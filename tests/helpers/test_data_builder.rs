// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use autostore_sim::domain::order::PickOrder;
use autostore_sim::domain::sku::SkuMasterRow;
use chrono::{Duration, NaiveDate, NaiveDateTime};

// ==========================================
// SkuMasterRow 构建器
// ==========================================

pub struct SkuBuilder {
    sku: String,
    dims: [f64; 3],
    weight: f64,
    min_qty_per_bin: i64,
    qty_stored: i64,
}

impl SkuBuilder {
    /// 默认: 100mm 立方体, 1kg, 每箱最少 1 件, 存量 10
    pub fn new(sku: &str) -> Self {
        Self {
            sku: sku.to_string(),
            dims: [100.0, 100.0, 100.0],
            weight: 1.0,
            min_qty_per_bin: 1,
            qty_stored: 10,
        }
    }

    pub fn dims(mut self, length: f64, width: f64, height: f64) -> Self {
        self.dims = [length, width, height];
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn min_qty(mut self, qty: i64) -> Self {
        self.min_qty_per_bin = qty;
        self
    }

    pub fn stored(mut self, qty: i64) -> Self {
        self.qty_stored = qty;
        self
    }

    pub fn build(self) -> SkuMasterRow {
        SkuMasterRow {
            sku: self.sku,
            length: self.dims[0],
            width: self.dims[1],
            height: self.dims[2],
            weight: self.weight,
            min_qty_per_bin: self.min_qty_per_bin,
            qty_stored: self.qty_stored,
        }
    }
}

// ==========================================
// 出库订单构建器
// ==========================================
// 每追加一行时间戳前进一分钟
pub struct OrderStreamBuilder {
    next_ts: NaiveDateTime,
    orders: Vec<PickOrder>,
}

impl OrderStreamBuilder {
    pub fn new() -> Self {
        Self {
            next_ts: NaiveDate::from_ymd_opt(2024, 5, 6)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            orders: Vec::new(),
        }
    }

    pub fn line(mut self, sku: &str, qty: i64) -> Self {
        let line_no = self.orders.len() + 2;
        self.orders.push(PickOrder::new(line_no, sku, self.next_ts, qty));
        self.next_ts += Duration::minutes(1);
        self
    }

    pub fn repeat(mut self, sku: &str, qty: i64, times: usize) -> Self {
        for _ in 0..times {
            self = self.line(sku, qty);
        }
        self
    }

    pub fn build(self) -> Vec<PickOrder> {
        self.orders
    }
}
