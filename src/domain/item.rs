// ==========================================
// 仓储盈利决策引擎 - 库存快照实体
// ==========================================
// 职责: 定义 SKU 库存快照与付费仓储记录
// 红线: 快照不可变,一次分析内不被引擎修改
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// SKU 编号（平台 nmId）
pub type SkuId = i64;

// ==========================================
// WarehouseStock - 单仓库存
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_name: String,
    pub quantity: u32,
}

// ==========================================
// WarehouseItem - SKU 库存快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseItem {
    pub sku_id: SkuId,
    #[serde(default)]
    pub vendor_code: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<String>,

    /// 全部仓库的在库数量合计
    pub quantity: u32,

    /// 分仓明细（可选,合计应等于 quantity）
    #[serde(default)]
    pub warehouses: Vec<WarehouseStock>,

    /// 标价
    pub price: f64,

    /// 体积（升）
    #[serde(default)]
    pub volume: Option<f64>,
}

impl WarehouseItem {
    /// 创建最小快照（其余字段为空）
    pub fn new(sku_id: SkuId, quantity: u32, price: f64) -> Self {
        Self {
            sku_id,
            vendor_code: None,
            brand: None,
            category: None,
            size: None,
            quantity,
            warehouses: Vec::new(),
            price,
            volume: None,
        }
    }

    /// 当前库存（浮点,供计算使用）
    pub fn current_stock(&self) -> f64 {
        self.quantity as f64
    }

    /// 累加一个分仓库存,同名仓库合并
    pub fn add_warehouse_stock(&mut self, warehouse_name: &str, quantity: u32) {
        self.quantity = self.quantity.saturating_add(quantity);
        match self
            .warehouses
            .iter_mut()
            .find(|w| w.warehouse_name == warehouse_name)
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.warehouses.push(WarehouseStock {
                warehouse_name: warehouse_name.to_string(),
                quantity,
            }),
        }
    }
}

// ==========================================
// PaidStorageRecord - 付费仓储观测记录
// ==========================================
// 同一 SKU 可有多条（按日期/仓库）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidStorageRecord {
    pub sku_id: SkuId,
    /// 观测到的单件日仓储费
    pub cost: f64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub warehouse_name: Option<String>,
}
