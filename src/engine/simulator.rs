// ==========================================
// 仓储盈利决策引擎 - 折扣/广告模拟器
// ==========================================
// 职责: 投影折扣后的销速/周转/仓储费/净利润,并按投影修正分类结论
// 输入: ResolvedRates + StorageMetrics + Classification + 广告 ROI
// 输出: SimulationVerdict
// 红线: 修正链顺序固定,后一条覆盖前一条;调整顺序属于行为变更
// ==========================================

use crate::config::engine_config::{DecisionThresholds, SimulationParams};
use crate::domain::analysis::{Projection, ResolvedRates, StorageMetrics};
use crate::domain::types::Action;
use crate::engine::classifier::Classification;
use crate::engine::metrics::MetricCalculator;
use tracing::debug;

// ==========================================
// SimulationVerdict - 模拟修正后的结论
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationVerdict {
    pub action: Action,
    pub discount_pct: f64,
    pub primary_reason: &'static str,
    /// 分类器 factors + 修正链 factors
    pub factors: Vec<String>,
    /// 按最终折扣重算的投影
    pub projection: Projection,
}

// ==========================================
// DiscountSimulator - 折扣/广告模拟器
// ==========================================
pub struct DiscountSimulator {
    thresholds: DecisionThresholds,
    params: SimulationParams,
}

impl DiscountSimulator {
    pub fn new(thresholds: DecisionThresholds, params: SimulationParams) -> Self {
        Self { thresholds, params }
    }

    // ==========================================
    // 投影计算
    // ==========================================

    /// 按折扣投影
    ///
    /// - 折后价 = 售价 × (1 - d/100),佣金按折后价重算
    /// - 加速系数 = 1 + d/100（线性假设）
    /// - 新周转天数 = round(days / 系数);无销速时保持哨兵
    /// - 折后利润 = 折后单件利润 × 库存 - 新仓储费
    pub fn project(
        &self,
        rates: &ResolvedRates,
        metrics: &StorageMetrics,
        discount_pct: f64,
    ) -> Projection {
        let discount_pct = discount_pct.clamp(0.0, 100.0);
        let discounted_price = rates.selling_price * (1.0 - discount_pct / 100.0);
        let discounted_profit_per_item = MetricCalculator::profit_per_item_at(discounted_price, rates);
        let discounted_gross_profit = discounted_profit_per_item * metrics.current_stock;

        let acceleration_factor = 1.0 + discount_pct / 100.0;
        let new_sales_rate = rates.daily_sales * acceleration_factor;
        let new_days_of_inventory = if metrics.has_sales_velocity {
            (metrics.days_of_inventory as f64 / acceleration_factor).round() as i64
        } else {
            metrics.days_of_inventory
        };
        let new_storage_cost = MetricCalculator::storage_cost(
            metrics.average_stock,
            new_days_of_inventory,
            rates.daily_storage_cost,
        );

        let profit_with_discount = discounted_gross_profit - new_storage_cost;
        let profit_without_discount = metrics.net_profit;

        Projection {
            discount_pct,
            discounted_price,
            discounted_profit_per_item,
            discounted_gross_profit,
            acceleration_factor,
            new_sales_rate,
            new_days_of_inventory,
            new_storage_cost,
            profit_with_discount,
            profit_without_discount,
            savings_with_discount: profit_with_discount - profit_without_discount,
        }
    }

    /// 广告 ROI（投放窗口内评估）
    ///
    /// - 基线销量 = min(日销 × 窗口, 库存);广告销量 = min(日销 × (1+提升) × 窗口, 库存)
    /// - 广告费 = 广告销量 × 售价 × 广告费率
    /// - 仓储费差额 = 日仓储费 × 增量件数 × 窗口 / 2
    /// - ROI = (增量件数 × 单件利润 + 仓储费差额 - 广告费) / 广告费
    ///
    /// 无销速/无售价/无库存时返回 None
    pub fn advertising_roi(&self, rates: &ResolvedRates, metrics: &StorageMetrics) -> Option<f64> {
        if !metrics.has_sales_velocity || rates.selling_price <= 0.0 || metrics.current_stock <= 0.0 {
            return None;
        }

        let window = self.params.ad_campaign_days.max(0.0);
        let baseline_units = (rates.daily_sales * window).min(metrics.current_stock);
        let boosted_units = (rates.daily_sales * (1.0 + self.params.ad_sales_uplift) * window)
            .min(metrics.current_stock);
        let extra_units = (boosted_units - baseline_units).max(0.0);

        let ad_cost = boosted_units * rates.selling_price * self.params.ad_cost_ratio;
        if ad_cost <= 0.0 {
            return None;
        }

        let storage_delta = rates.daily_storage_cost * extra_units * window / 2.0;
        let incremental_profit = extra_units * metrics.profit_per_item;

        Some((incremental_profit + storage_delta - ad_cost) / ad_cost)
    }

    // ==========================================
    // 修正链
    // ==========================================

    /// 按投影修正分类结论
    ///
    /// 顺序（后者覆盖前者）:
    /// 1) 降价类 且 两个利润均为负 且 折后更差 → keep
    /// 2) 降价类 且 节省 < 0: 滞销且 days > 180 → discount min(d,15);否则 keep
    /// 3) 基线亏损 且 折后盈利 → 强制 discount
    /// 4) discount 且 折后深度亏损 → 清仓 50%（显著改善）或 keep
    /// 5) 分类器选择降价类 且 ROI > 0.30 且 高毛利 → advertise
    /// 6) keep 且 候选节省 > 0 → discount（覆写 或 15%）
    pub fn apply_feedback(
        &self,
        rates: &ResolvedRates,
        metrics: &StorageMetrics,
        classification: &Classification,
        advertising_roi: Option<f64>,
    ) -> SimulationVerdict {
        let t = &self.thresholds;
        let mut factors = classification.factors.clone();
        let mut action = classification.action;
        let mut discount = classification.discount_pct;
        let mut primary_reason = classification.primary_reason;
        let mut candidate = self.project(rates, metrics, discount);

        // 修正1: 折扣加深亏损
        if action.is_price_cut()
            && candidate.profit_with_discount < 0.0
            && candidate.profit_without_discount < 0.0
            && candidate.profit_with_discount < candidate.profit_without_discount
        {
            factors.push(format!(
                "FEEDBACK_DEEPENS_LOSS: with={:.2} < without={:.2} < 0",
                candidate.profit_with_discount, candidate.profit_without_discount
            ));
            action = Action::Keep;
            discount = 0.0;
            primary_reason = "DISCOUNT_DEEPENS_LOSS";
        }

        // 修正2: 负节省
        if action.is_price_cut() && candidate.savings_with_discount < 0.0 {
            if classification.flags.is_slow_moving
                && metrics.days_of_inventory > t.extended_slow_days
            {
                let capped = discount.min(t.fallback_discount_cap_pct);
                factors.push(format!(
                    "FEEDBACK_NEGATIVE_SAVINGS_CAPPED: savings={:.2}, days={} > {}, discount {} → {}",
                    candidate.savings_with_discount,
                    metrics.days_of_inventory,
                    t.extended_slow_days,
                    discount,
                    capped
                ));
                action = Action::Discount;
                discount = capped;
                primary_reason = "NEGATIVE_SAVINGS_EXTENDED_SLOW";
                candidate = self.project(rates, metrics, discount);
            } else {
                factors.push(format!(
                    "FEEDBACK_NEGATIVE_SAVINGS: savings={:.2}",
                    candidate.savings_with_discount
                ));
                action = Action::Keep;
                discount = 0.0;
                primary_reason = "NEGATIVE_SAVINGS";
            }
        }

        // 修正3: 折扣扭亏
        if candidate.profit_without_discount < 0.0 && candidate.profit_with_discount > 0.0 {
            factors.push(format!(
                "FEEDBACK_TURNS_PROFITABLE: without={:.2} < 0 < with={:.2}",
                candidate.profit_without_discount, candidate.profit_with_discount
            ));
            action = Action::Discount;
            discount = candidate.discount_pct;
            primary_reason = "DISCOUNT_TURNS_PROFITABLE";
        }

        // 修正4: 深度亏损
        if action == Action::Discount
            && candidate.profit_with_discount < 0.0
            && candidate.profit_with_discount.abs()
                > t.deep_loss_ratio * candidate.discounted_gross_profit.abs()
        {
            let liquidation = self.project(rates, metrics, t.liquidation_cap_pct);
            let improvement =
                liquidation.profit_with_discount - liquidation.profit_without_discount;
            let material = t.material_improvement_ratio * liquidation.profit_without_discount.abs();

            if improvement > material {
                factors.push(format!(
                    "FEEDBACK_DEEP_LOSS_LIQUIDATE: improvement={:.2} > {:.2}",
                    improvement, material
                ));
                action = Action::Liquidate;
                discount = t.liquidation_cap_pct;
                primary_reason = "DEEP_LOSS_LIQUIDATE";
                candidate = liquidation;
            } else {
                factors.push(format!(
                    "FEEDBACK_DEEP_LOSS_KEEP: improvement={:.2} <= {:.2}",
                    improvement, material
                ));
                action = Action::Keep;
                discount = 0.0;
                primary_reason = "DEEP_LOSS_NO_IMPROVEMENT";
            }
        }

        // 修正5: 分类器选择降价,但广告更优（不看修正1~4 的结果）
        if classification.action.is_price_cut() && classification.flags.is_high_margin {
            if let Some(roi) = advertising_roi.filter(|roi| *roi > t.advertise_switch_roi_threshold) {
                factors.push(format!(
                    "FEEDBACK_ADVERTISE: roi={:.4} > {}",
                    roi, t.advertise_switch_roi_threshold
                ));
                action = Action::Advertise;
                discount = 0.0;
                primary_reason = "ADVERTISING_BEATS_DISCOUNT";
            }
        }

        // 修正6: 正节省但仍为 keep
        if action == Action::Keep && candidate.savings_with_discount > 0.0 {
            let promoted = rates.discount_override.unwrap_or(t.slow_moving_discount_pct);
            factors.push(format!(
                "FEEDBACK_POSITIVE_SAVINGS: savings={:.2}, discount → {}",
                candidate.savings_with_discount, promoted
            ));
            action = Action::Discount;
            discount = promoted;
            primary_reason = "POSITIVE_SAVINGS";
        }

        // 折扣为 0 的降价类动作归一为 keep
        if action.is_price_cut() && discount <= 0.0 {
            action = Action::Keep;
        }
        if !action.is_price_cut() {
            discount = 0.0;
        }

        debug!(
            action = %action,
            discount,
            primary_reason,
            "模拟修正完成"
        );

        SimulationVerdict {
            action,
            discount_pct: discount,
            primary_reason,
            factors,
            projection: self.project(rates, metrics, discount),
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::engine_config::RateDefaults;
    use crate::domain::types::StorageCostSource;
    use crate::engine::classifier::DecisionClassifier;

    fn rates(price: f64, cost: f64, daily_sales: f64, storage: f64) -> ResolvedRates {
        let defaults = RateDefaults::default();
        ResolvedRates {
            cost_price: cost,
            selling_price: price,
            daily_sales,
            daily_storage_cost: storage,
            storage_cost_source: StorageCostSource::Override,
            logistics_cost: defaults.logistics_cost,
            commission_rate: defaults.commission_pct / 100.0,
            low_stock_threshold: (daily_sales * 7.0).ceil() as u32,
            discount_override: None,
        }
    }

    fn simulator() -> DiscountSimulator {
        DiscountSimulator::new(DecisionThresholds::default(), SimulationParams::default())
    }

    fn run(r: &ResolvedRates, stock: f64) -> (Classification, SimulationVerdict) {
        let m = MetricCalculator::new().calculate(r, stock);
        let sim = simulator();
        let roi = sim.advertising_roi(r, &m);
        let c = DecisionClassifier::new(DecisionThresholds::default()).classify(r, &m, roi);
        let v = sim.apply_feedback(r, &m, &c, roi);
        (c, v)
    }

    #[test]
    fn test_zero_discount_projection_equals_baseline() {
        let r = rates(1000.0, 400.0, 1.0, 5.0);
        let m = MetricCalculator::new().calculate(&r, 100.0);
        let p = simulator().project(&r, &m, 0.0);

        assert_eq!(p.new_days_of_inventory, m.days_of_inventory);
        assert_eq!(p.profit_with_discount, p.profit_without_discount);
        assert_eq!(p.savings_with_discount, 0.0);
    }

    #[test]
    fn test_projection_at_forty_percent() {
        let r = rates(1000.0, 400.0, 0.1, 5.0);
        let m = MetricCalculator::new().calculate(&r, 100.0);
        let p = simulator().project(&r, &m, 40.0);

        assert!((p.discounted_price - 600.0).abs() < 1e-9);
        assert!((p.discounted_profit_per_item + 40.0).abs() < 1e-6);
        assert!((p.acceleration_factor - 1.4).abs() < 1e-12);
        assert_eq!(p.new_days_of_inventory, 714);
        assert!((p.new_storage_cost - 178_500.0).abs() < 1e-6);
        assert!((p.savings_with_discount - 37_500.0).abs() < 1e-3);
    }

    #[test]
    fn test_sentinel_is_not_accelerated() {
        let r = rates(1000.0, 400.0, 0.0, 5.0);
        let m = MetricCalculator::new().calculate(&r, 10.0);
        let p = simulator().project(&r, &m, 25.0);
        assert_eq!(p.new_days_of_inventory, m.days_of_inventory);
        assert!(p.savings_with_discount < 0.0);
    }

    #[test]
    fn test_advertising_roi_window_model() {
        let sim = simulator();

        let r = rates(1000.0, 400.0, 0.1, 5.0);
        let m = MetricCalculator::new().calculate(&r, 100.0);
        let roi = sim.advertising_roi(&r, &m).unwrap();
        assert!((roi - 90.0 / 810.0).abs() < 1e-6);

        let r = rates(5000.0, 1000.0, 0.2, 5.0);
        let m = MetricCalculator::new().calculate(&r, 50.0);
        let roi = sim.advertising_roi(&r, &m).unwrap();
        assert!(roi > 0.8 && roi < 0.9);

        let r = rates(1000.0, 400.0, 0.0, 5.0);
        let m = MetricCalculator::new().calculate(&r, 100.0);
        assert_eq!(sim.advertising_roi(&r, &m), None);
    }

    #[test]
    fn test_liquidation_kept_when_savings_positive() {
        let (c, v) = run(&rates(1000.0, 400.0, 0.1, 5.0), 100.0);
        assert_eq!(c.action, Action::Liquidate);
        assert_eq!(v.action, Action::Liquidate);
        assert_eq!(v.discount_pct, 40.0);
        assert!(v.projection.savings_with_discount > 0.0);
    }

    #[test]
    fn test_negative_savings_on_extended_slow_caps_discount() {
        // 200 天周转,折扣 40% 亏损扩大 → 降级为 15%
        let (c, v) = run(&rates(1000.0, 400.0, 0.5, 2.0), 100.0);
        assert_eq!(c.action, Action::Liquidate);
        assert_eq!(v.action, Action::Discount);
        assert_eq!(v.discount_pct, 15.0);
        assert_eq!(v.primary_reason, "NEGATIVE_SAVINGS_EXTENDED_SLOW");
    }

    #[test]
    fn test_negative_savings_reverts_to_keep() {
        // 100 天周转,未超过 180 天 → keep
        let (c, v) = run(&rates(1000.0, 400.0, 1.0, 5.0), 100.0);
        assert_eq!(c.action, Action::Liquidate);
        assert_eq!(v.action, Action::Keep);
        assert_eq!(v.discount_pct, 0.0);
        assert_eq!(v.projection.savings_with_discount, 0.0);
    }

    #[test]
    fn test_discount_deepening_loss_reverts_to_keep() {
        // 低毛利 + 高仓储,25% 折扣后两者皆亏且更差
        let (c, v) = run(&rates(1000.0, 600.0, 2.0, 5.0), 100.0);
        assert_eq!(c.action, Action::Discount);
        assert_eq!(v.action, Action::Keep);
        assert_eq!(v.primary_reason, "DISCOUNT_DEEPENS_LOSS");
    }

    #[test]
    fn test_deep_loss_without_material_gain_promotes_back_to_discount() {
        // 仓储费 5: 25% 有正节省但深度亏损,50% 清仓改善不显著 → keep → 修正6 → discount 15%
        let (c, v) = run(&rates(100.0, 20.0, 2.0, 5.0), 100.0);
        assert_eq!(c.action, Action::Discount);
        assert_eq!(c.discount_pct, 25.0);
        assert_eq!(v.action, Action::Discount);
        assert_eq!(v.discount_pct, 15.0);
        assert_eq!(v.primary_reason, "POSITIVE_SAVINGS");
    }

    /// 跳过分类器,直接给定分类结论
    fn feedback(
        r: &ResolvedRates,
        stock: f64,
        action: Action,
        discount_pct: f64,
        roi: Option<f64>,
    ) -> SimulationVerdict {
        let m = MetricCalculator::new().calculate(r, stock);
        let c = Classification {
            flags: DecisionClassifier::new(DecisionThresholds::default()).flags(&m),
            action,
            discount_pct,
            primary_reason: "SLOW_MOVING",
            factors: Vec::new(),
        };
        simulator().apply_feedback(r, &m, &c, roi)
    }

    #[test]
    fn test_discount_that_turns_profitable_is_forced() {
        // 物流补贴使单件利润对售价不敏感: 基线 -5000,折扣 15% 后 +6950
        let mut r = rates(1000.0, 0.0, 1.0, 38.0);
        r.logistics_cost = -1000.0;
        let v = feedback(&r, 100.0, Action::Discount, 15.0, None);

        assert!(v.projection.profit_without_discount < 0.0);
        assert!(v.projection.profit_with_discount > 0.0);
        assert_eq!(v.action, Action::Discount);
        assert_eq!(v.discount_pct, 15.0);
        assert_eq!(v.primary_reason, "DISCOUNT_TURNS_PROFITABLE");
        assert!(v.factors.iter().any(|f| f.starts_with("FEEDBACK_TURNS_PROFITABLE")));
    }

    #[test]
    fn test_advertising_replaces_discount_after_negative_savings() {
        // 75 天周转、毛利 62%: 分类器给 15% 折扣,节省为负先回退 keep,ROI ≈ 0.88 → advertise
        let r = rates(5000.0, 1000.0, 2.0, 5.0);
        let (c, v) = run(&r, 150.0);

        assert_eq!(c.action, Action::Discount);
        assert_eq!(c.discount_pct, 15.0);
        assert!(c.flags.is_high_margin);
        assert!(v.factors.iter().any(|f| f.starts_with("FEEDBACK_NEGATIVE_SAVINGS")));
        assert_eq!(v.action, Action::Advertise);
        assert_eq!(v.discount_pct, 0.0);
        assert_eq!(v.primary_reason, "ADVERTISING_BEATS_DISCOUNT");
        assert_eq!(v.projection.discount_pct, 0.0);
    }

    #[test]
    fn test_advertising_switch_needs_classifier_price_cut() {
        let r = rates(5000.0, 1000.0, 2.0, 5.0);
        let v = feedback(&r, 150.0, Action::Keep, 0.0, Some(0.88));
        assert_eq!(v.action, Action::Keep);
        assert_eq!(v.primary_reason, "SLOW_MOVING");

        // ROI 未超过 0.30 时保持修正2 的结论
        let v = feedback(&r, 150.0, Action::Discount, 15.0, Some(0.25));
        assert_eq!(v.action, Action::Keep);
        assert_eq!(v.primary_reason, "NEGATIVE_SAVINGS");
    }

    #[test]
    fn test_deep_loss_with_material_gain_liquidates() {
        let (_, v) = run(&rates(100.0, 20.0, 2.0, 20.0), 100.0);
        assert_eq!(v.action, Action::Liquidate);
        assert_eq!(v.discount_pct, 50.0);
        assert_eq!(v.primary_reason, "DEEP_LOSS_LIQUIDATE");
    }
}
