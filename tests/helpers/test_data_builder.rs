// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use storage_profit_engine::domain::{PaidStorageRecord, RateOverrides, SkuId, WarehouseItem};
use storage_profit_engine::engine::AnalysisInput;
use storage_profit_engine::OverrideKind;

/// 固定分析日期,保证断货日期可断言
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

pub fn target_date() -> NaiveDate {
    today() + Duration::days(30)
}

// ==========================================
// SKU 构建器
// ==========================================

pub struct SkuBuilder {
    sku_id: SkuId,
    stock: u32,
    price: f64,
    daily_sales: Option<f64>,
    overrides: Vec<(OverrideKind, f64)>,
}

impl SkuBuilder {
    pub fn new(sku_id: SkuId) -> Self {
        Self {
            sku_id,
            stock: 100,
            price: 1000.0,
            daily_sales: None,
            overrides: Vec::new(),
        }
    }

    pub fn stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// 销速表中的日销量
    pub fn daily_sales(mut self, daily_sales: f64) -> Self {
        self.daily_sales = Some(daily_sales);
        self
    }

    pub fn cost(self, cost: f64) -> Self {
        self.with_override(OverrideKind::CostPrice, cost)
    }

    pub fn storage_cost(self, cost: f64) -> Self {
        self.with_override(OverrideKind::StorageCost, cost)
    }

    pub fn with_override(mut self, kind: OverrideKind, value: f64) -> Self {
        self.overrides.push((kind, value));
        self
    }
}

// ==========================================
// 分析输入构建器
// ==========================================

pub struct InputBuilder {
    items: Vec<WarehouseItem>,
    storage_records: Vec<PaidStorageRecord>,
    sales_rates: HashMap<SkuId, f64>,
    overrides: RateOverrides,
}

impl InputBuilder {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            storage_records: Vec::new(),
            sales_rates: HashMap::new(),
            overrides: RateOverrides::new(),
        }
    }

    pub fn sku(mut self, sku: SkuBuilder) -> Self {
        if let Some(ds) = sku.daily_sales {
            self.sales_rates.insert(sku.sku_id, ds);
        }
        for (kind, value) in sku.overrides {
            self.overrides.insert(kind, sku.sku_id, value);
        }
        self.items
            .push(WarehouseItem::new(sku.sku_id, sku.stock, sku.price));
        self
    }

    pub fn paid_storage(mut self, sku_id: SkuId, cost: f64) -> Self {
        self.storage_records.push(PaidStorageRecord {
            sku_id,
            cost,
            date: Some(today()),
            warehouse_name: None,
        });
        self
    }

    pub fn build(self) -> AnalysisInput {
        AnalysisInput {
            items: self.items,
            storage_records: self.storage_records,
            sales_rates: self.sales_rates,
            overrides: self.overrides,
            today: today(),
            target_date: target_date(),
        }
    }
}

impl Default for InputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 标准场景
// ==========================================

/// 场景A: 严重滞销 + 高仓储 → 清仓 40%
pub fn scenario_a(sku_id: SkuId) -> SkuBuilder {
    SkuBuilder::new(sku_id)
        .stock(100)
        .price(1000.0)
        .cost(400.0)
        .daily_sales(0.1)
        .storage_cost(5.0)
}

/// 场景B: 低库存快周转 → 保持
pub fn scenario_b(sku_id: SkuId) -> SkuBuilder {
    SkuBuilder::new(sku_id)
        .stock(5)
        .price(1000.0)
        .cost(400.0)
        .daily_sales(1.0)
        .storage_cost(5.0)
}

/// 场景C: 高毛利滞销,广告 ROI 高 → 广告
pub fn scenario_c(sku_id: SkuId) -> SkuBuilder {
    SkuBuilder::new(sku_id)
        .stock(50)
        .price(5000.0)
        .cost(1000.0)
        .daily_sales(0.2)
        .storage_cost(5.0)
}
