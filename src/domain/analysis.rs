// ==========================================
// 仓储盈利决策引擎 - 分析结果实体
// ==========================================
// 职责: 费率解析结果、指标、模拟投影、单品结论、组合汇总
// 红线: 全部为输入的纯函数,不存储、不回写
// ==========================================

use crate::domain::item::SkuId;
use crate::domain::types::{Action, DataOrigin, StockLevel, StorageCostSource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ==========================================
// ResolvedRates - 费率解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRates {
    pub cost_price: f64,
    pub selling_price: f64,
    /// 件/天
    pub daily_sales: f64,
    /// 单件日仓储费
    pub daily_storage_cost: f64,
    pub storage_cost_source: StorageCostSource,
    pub logistics_cost: f64,
    /// 佣金比例（0~1）
    pub commission_rate: f64,
    /// 低库存阈值（件）
    pub low_stock_threshold: u32,
    /// 人工折扣覆写（百分比,0~100）
    pub discount_override: Option<f64>,
}

// ==========================================
// StorageMetrics - 周转与成本指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageMetrics {
    pub current_stock: f64,
    pub daily_storage_cost_total: f64,
    /// 无销量时为哨兵值
    pub days_of_inventory: i64,
    pub has_sales_velocity: bool,
    pub average_stock: f64,
    pub total_storage_cost: f64,
    pub commission_amount: f64,
    pub profit_per_item: f64,
    pub profit_margin_percentage: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub storage_cost_to_revenue_ratio: f64,
}

// ==========================================
// Projection - 折扣模拟投影
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub discount_pct: f64,
    pub discounted_price: f64,
    pub discounted_profit_per_item: f64,
    pub discounted_gross_profit: f64,
    pub acceleration_factor: f64,
    pub new_sales_rate: f64,
    pub new_days_of_inventory: i64,
    pub new_storage_cost: f64,
    pub profit_with_discount: f64,
    pub profit_without_discount: f64,
    pub savings_with_discount: f64,
}

// ==========================================
// AnalysisResult - 单品结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sku_id: SkuId,
    pub vendor_code: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,

    // 费率与指标
    pub rates: ResolvedRates,
    pub metrics: StorageMetrics,

    // 决策
    pub action: Action,
    pub recommended_discount: f64,
    /// 决策原因 JSON（primary_reason + factors）
    pub decision_reason: String,

    // 模拟
    pub projection: Projection,
    pub advertising_roi: Option<f64>,

    // 库存水位
    pub low_stock: bool,
    pub stock_level: StockLevel,
    pub stock_level_percentage: f64,

    /// today + days_of_inventory;无销量时为空
    pub projected_stockout_date: Option<NaiveDate>,
}

impl AnalysisResult {
    pub fn days_of_inventory(&self) -> i64 {
        self.metrics.days_of_inventory
    }

    pub fn savings_with_discount(&self) -> f64 {
        self.projection.savings_with_discount
    }
}

// ==========================================
// AnalysisSummary - 组合汇总（KPI 卡片）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub item_count: usize,
    /// 按动作计数（code → count）,四种动作均出现
    pub action_counts: BTreeMap<String, usize>,
    pub total_storage_cost: f64,
    pub total_net_profit: f64,
    /// 正向节省合计
    pub potential_savings: f64,
    pub target_date: NaiveDate,
    /// 预计在目标日期前断货的 SKU 数
    pub stockout_before_target_count: usize,
}

impl AnalysisSummary {
    pub fn count_for(&self, action: Action) -> usize {
        self.action_counts.get(action.code()).copied().unwrap_or(0)
    }
}

// ==========================================
// AnalysisReport - 报告信封
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub data_origin: DataOrigin,
    pub results: Vec<AnalysisResult>,
    pub summary: AnalysisSummary,
}
