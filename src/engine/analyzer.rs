// ==========================================
// 仓储盈利决策引擎 - 分析编排器
// ==========================================
// 用途: 按固定顺序串联各引擎
// 流程: 费率解析 → 指标计算 → 分类 → 模拟修正 → 低库存保护 → 汇总
// 红线: 纯同步批处理;相同输入必须得到逐字节相同的结果
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::domain::analysis::{AnalysisResult, AnalysisSummary};
use crate::domain::item::{PaidStorageRecord, SkuId, WarehouseItem};
use crate::domain::overrides::RateOverrides;
use crate::domain::types::Action;
use crate::engine::classifier::DecisionClassifier;
use crate::engine::low_stock_guard::LowStockGuard;
use crate::engine::metrics::MetricCalculator;
use crate::engine::rate_resolver::{RateResolver, StorageCostIndex};
use crate::engine::simulator::DiscountSimulator;
use crate::engine::summary::SummaryAggregator;
use chrono::{Duration, NaiveDate};
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

// ==========================================
// AnalysisInput - 一次分析的全部输入
// ==========================================
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub items: Vec<WarehouseItem>,
    pub storage_records: Vec<PaidStorageRecord>,
    /// SKU → 件/天
    pub sales_rates: HashMap<SkuId, f64>,
    pub overrides: RateOverrides,
    /// 断货日期推算基准日
    pub today: NaiveDate,
    /// 断货风险统计截止日
    pub target_date: NaiveDate,
}

impl AnalysisInput {
    pub fn new(items: Vec<WarehouseItem>, today: NaiveDate, target_date: NaiveDate) -> Self {
        Self {
            items,
            storage_records: Vec::new(),
            sales_rates: HashMap::new(),
            overrides: RateOverrides::new(),
            today,
            target_date,
        }
    }
}

// ==========================================
// StorageAnalyzer - 分析编排器
// ==========================================
pub struct StorageAnalyzer {
    resolver: RateResolver,
    calculator: MetricCalculator,
    classifier: DecisionClassifier,
    simulator: DiscountSimulator,
    guard: LowStockGuard,
    aggregator: SummaryAggregator,
}

impl StorageAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        let guard_days = config.thresholds.low_stock_guard_days;
        Self {
            resolver: RateResolver::new(config.defaults),
            calculator: MetricCalculator::new(),
            classifier: DecisionClassifier::new(config.thresholds.clone()),
            simulator: DiscountSimulator::new(config.thresholds, config.simulation),
            guard: LowStockGuard::new(guard_days),
            aggregator: SummaryAggregator::new(),
        }
    }

    /// 批量分析（结果顺序与输入一致）
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub fn analyze(&self, input: &AnalysisInput) -> Vec<AnalysisResult> {
        let storage_index = StorageCostIndex::build(&input.storage_records);
        debug!(
            storage_skus = storage_index.sku_count(),
            overrides = input.overrides.len(),
            "付费仓储索引构建完成"
        );

        input
            .items
            .iter()
            .map(|item| self.analyze_item(item, input, &storage_index))
            .collect()
    }

    /// 分析 + 汇总
    pub fn run(&self, input: &AnalysisInput) -> (Vec<AnalysisResult>, AnalysisSummary) {
        let results = self.analyze(input);
        let summary = self.aggregator.summarize(&results, input.target_date);

        info!(
            items = summary.item_count,
            keep = summary.count_for(Action::Keep),
            discount = summary.count_for(Action::Discount),
            liquidate = summary.count_for(Action::Liquidate),
            advertise = summary.count_for(Action::Advertise),
            potential_savings = summary.potential_savings,
            "仓储盈利分析完成"
        );

        (results, summary)
    }

    /// 汇总已有结果（供按动作过滤后的子集复用）
    pub fn summarize(&self, results: &[AnalysisResult], target_date: NaiveDate) -> AnalysisSummary {
        self.aggregator.summarize(results, target_date)
    }

    /// 单个 SKU 全流程
    fn analyze_item(
        &self,
        item: &WarehouseItem,
        input: &AnalysisInput,
        storage_index: &StorageCostIndex,
    ) -> AnalysisResult {
        // 1. 费率解析
        let rates = self
            .resolver
            .resolve(item, &input.overrides, storage_index, &input.sales_rates);

        // 2. 指标计算
        let metrics = self.calculator.calculate(&rates, item.current_stock());

        // 3. 分类
        let advertising_roi = self.simulator.advertising_roi(&rates, &metrics);
        let classification = self.classifier.classify(&rates, &metrics, advertising_roi);

        // 4. 模拟修正
        let verdict = self
            .simulator
            .apply_feedback(&rates, &metrics, &classification, advertising_roi);

        // 5. 低库存保护
        let guard = self.guard.apply(
            metrics.current_stock,
            rates.low_stock_threshold,
            metrics.days_of_inventory,
            verdict.action,
            verdict.discount_pct,
        );

        let mut factors = verdict.factors;
        let mut primary_reason = verdict.primary_reason;
        let projection = match guard.applied_reason {
            Some(reason) => {
                factors.push(reason);
                primary_reason = "LOW_STOCK_GUARD";
                self.simulator.project(&rates, &metrics, 0.0)
            }
            None => verdict.projection,
        };

        let projected_stockout_date = if metrics.has_sales_velocity {
            // 极小销速下周转天数可超出日期范围,此时不给出断货日
            Duration::try_days(metrics.days_of_inventory)
                .and_then(|days| input.today.checked_add_signed(days))
        } else {
            None
        };

        let decision_reason = json!({
            "action": guard.action.code(),
            "discount_pct": guard.discount_pct,
            "primary_reason": primary_reason,
            "factors": factors,
            "flags": classification.flags,
            "details": {
                "days_of_inventory": metrics.days_of_inventory,
                "profit_margin_pct": metrics.profit_margin_percentage,
                "storage_cost_to_revenue_ratio": metrics.storage_cost_to_revenue_ratio,
                "advertising_roi": advertising_roi,
                "low_stock": guard.low_stock,
            }
        })
        .to_string();

        debug!(
            sku_id = item.sku_id,
            action = %guard.action,
            discount = guard.discount_pct,
            primary_reason,
            "SKU 结论"
        );

        AnalysisResult {
            sku_id: item.sku_id,
            vendor_code: item.vendor_code.clone(),
            brand: item.brand.clone(),
            category: item.category.clone(),
            size: item.size.clone(),
            rates,
            metrics,
            action: guard.action,
            recommended_discount: guard.discount_pct,
            decision_reason,
            projection,
            advertising_roi,
            low_stock: guard.low_stock,
            stock_level: guard.stock_level,
            stock_level_percentage: guard.stock_level_percentage,
            projected_stockout_date,
        }
    }
}

impl Default for StorageAnalyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// 按动作过滤（保持原顺序）
pub fn filter_by_action(results: &[AnalysisResult], action: Action) -> Vec<AnalysisResult> {
    results
        .iter()
        .filter(|r| r.action == action)
        .cloned()
        .collect()
}
