// ==========================================
// 仓储盈利决策引擎 - 领域类型定义
// ==========================================
// 红线: 动作是"枚举制",每个 SKU 只能有且仅有一个动作
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 建议动作 (Recommended Action)
// ==========================================
// 严重度: Keep < Discount < Liquidate
// Advertise 不降价,不参与严重度排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Keep,      // 保持价格
    Discount,  // 打折促销
    Liquidate, // 清仓
    Advertise, // 投放广告
}

impl Action {
    /// 全部动作（固定顺序,用于汇总计数/展示）
    pub const ALL: [Action; 4] = [
        Action::Keep,
        Action::Discount,
        Action::Liquidate,
        Action::Advertise,
    ];

    /// 价格动作严重度: keep=0, discount=1, liquidate=2
    ///
    /// Advertise 不动价格,严重度按 0 计
    pub fn severity(&self) -> u8 {
        match self {
            Action::Keep | Action::Advertise => 0,
            Action::Discount => 1,
            Action::Liquidate => 2,
        }
    }

    /// 是否为降价类动作
    pub fn is_price_cut(&self) -> bool {
        matches!(self, Action::Discount | Action::Liquidate)
    }

    /// 稳定的小写代码（与序列化一致）
    pub fn code(&self) -> &'static str {
        match self {
            Action::Keep => "keep",
            Action::Discount => "discount",
            Action::Liquidate => "liquidate",
            Action::Advertise => "advertise",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(Action::Keep),
            "discount" => Ok(Action::Discount),
            "liquidate" => Ok(Action::Liquidate),
            "advertise" => Ok(Action::Advertise),
            other => Err(format!("未知动作: {}", other)),
        }
    }
}

// ==========================================
// 库存水位 (Stock Level)
// ==========================================
// low: ≤ 阈值; medium: ≤ 3×阈值; high: 其他
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Low,
    Medium,
    High,
}

impl StockLevel {
    pub fn code(&self) -> &'static str {
        match self {
            StockLevel::Low => "low",
            StockLevel::Medium => "medium",
            StockLevel::High => "high",
        }
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 数据来源 (Data Origin)
// ==========================================
// 引擎本身不区分真实/演示数据,仅在报告信封上标注
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Live,   // 实时数据源
    Cached, // 未过期缓存
    Demo,   // 演示数据（数据源不可用）
}

impl DataOrigin {
    pub fn code(&self) -> &'static str {
        match self {
            DataOrigin::Live => "live",
            DataOrigin::Cached => "cached",
            DataOrigin::Demo => "demo",
        }
    }
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 覆写类型 (Override Kind)
// ==========================================
// 序列化格式: snake_case (与 sku_override.kind 列一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    CostPrice,         // 成本价
    SellingPrice,      // 售价
    DailySales,        // 日销量（件/天）
    StorageCost,       // 日仓储费（每件/天）
    LogisticsCost,     // 物流费（每件）
    Commission,        // 平台佣金（百分比）
    LowStockThreshold, // 低库存阈值（件）
    Discount,          // 折扣（百分比）
}

impl OverrideKind {
    pub const ALL: [OverrideKind; 8] = [
        OverrideKind::CostPrice,
        OverrideKind::SellingPrice,
        OverrideKind::DailySales,
        OverrideKind::StorageCost,
        OverrideKind::LogisticsCost,
        OverrideKind::Commission,
        OverrideKind::LowStockThreshold,
        OverrideKind::Discount,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            OverrideKind::CostPrice => "cost_price",
            OverrideKind::SellingPrice => "selling_price",
            OverrideKind::DailySales => "daily_sales",
            OverrideKind::StorageCost => "storage_cost",
            OverrideKind::LogisticsCost => "logistics_cost",
            OverrideKind::Commission => "commission",
            OverrideKind::LowStockThreshold => "low_stock_threshold",
            OverrideKind::Discount => "discount",
        }
    }
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for OverrideKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        OverrideKind::ALL
            .iter()
            .copied()
            .find(|k| k.code() == normalized)
            .ok_or_else(|| format!("未知覆写类型: {}", s))
    }
}

// ==========================================
// 仓储费来源 (Storage Cost Source)
// ==========================================
// 优先级: 付费仓储记录均值 > 人工覆写 > 默认值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageCostSource {
    PaidStorage,
    Override,
    Default,
}
