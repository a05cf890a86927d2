// ==========================================
// 仓储盈利决策引擎 - 决策分类器
// ==========================================
// 职责: 指标 → 动作（keep/discount/liquidate/advertise）+ 建议折扣
// 输入: ResolvedRates + StorageMetrics + 广告 ROI
// 输出: Classification（含命中规则列表）
// 红线: 规则顺序执行,基础分类命中即停;广告改判在基础分类之后
// ==========================================

use crate::config::engine_config::DecisionThresholds;
use crate::domain::analysis::{ResolvedRates, StorageMetrics};
use crate::domain::types::Action;
use serde::Serialize;
use tracing::debug;

// ==========================================
// DecisionFlags - 判定标志
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecisionFlags {
    pub is_low_margin: bool,
    pub is_high_storage_cost: bool,
    pub is_slow_moving: bool,
    pub is_very_slow_moving: bool,
    pub is_high_margin: bool,
}

// ==========================================
// Classification - 分类结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub flags: DecisionFlags,
    pub action: Action,
    pub discount_pct: f64,
    /// 主规则代码
    pub primary_reason: &'static str,
    /// 命中规则明细（按执行顺序）
    pub factors: Vec<String>,
}

// ==========================================
// DecisionClassifier - 决策分类器
// ==========================================
pub struct DecisionClassifier {
    thresholds: DecisionThresholds,
}

impl DecisionClassifier {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self { thresholds }
    }

    /// 计算判定标志
    ///
    /// 滞销类标志仅在有销速时成立,哨兵天数不视为滞销
    pub fn flags(&self, metrics: &StorageMetrics) -> DecisionFlags {
        let t = &self.thresholds;
        let margin = metrics.profit_margin_percentage;
        let days = metrics.days_of_inventory;
        let moving = metrics.has_sales_velocity;

        DecisionFlags {
            is_low_margin: margin < t.low_margin_pct,
            is_high_storage_cost: metrics.storage_cost_to_revenue_ratio > t.high_storage_ratio,
            is_slow_moving: moving && days > t.slow_moving_days,
            is_very_slow_moving: moving && days > t.very_slow_moving_days,
            is_high_margin: margin > t.high_margin_pct,
        }
    }

    /// 分类
    ///
    /// 基础规则（顺序执行,命中即停）:
    /// 1) 滞销 且 高仓储 → liquidate, 40%
    /// 2) 低毛利 且 高仓储 → discount, 覆写 或 25%
    /// 3) 滞销 且 非低毛利 → discount, 覆写 或 15%
    /// 4) 其他 → keep, 0%
    ///
    /// 广告改判: 严重滞销 且 高毛利 且 ROI > 0.20 → advertise, 0%
    pub fn classify(
        &self,
        rates: &ResolvedRates,
        metrics: &StorageMetrics,
        advertising_roi: Option<f64>,
    ) -> Classification {
        let t = &self.thresholds;
        let flags = self.flags(metrics);
        let mut factors = Vec::new();

        let (mut action, mut discount_pct, mut primary_reason) =
            if flags.is_slow_moving && flags.is_high_storage_cost {
                factors.push(format!(
                    "RULE_LIQUIDATE: days={} > {}, storage_ratio={:.4} > {}",
                    metrics.days_of_inventory,
                    t.slow_moving_days,
                    metrics.storage_cost_to_revenue_ratio,
                    t.high_storage_ratio
                ));
                (Action::Liquidate, t.liquidate_discount_pct, "SLOW_HIGH_STORAGE")
            } else if flags.is_low_margin && flags.is_high_storage_cost {
                let discount = rates.discount_override.unwrap_or(t.low_margin_discount_pct);
                factors.push(format!(
                    "RULE_DISCOUNT_LOW_MARGIN: margin={:.2}% < {}%, storage_ratio={:.4}",
                    metrics.profit_margin_percentage,
                    t.low_margin_pct,
                    metrics.storage_cost_to_revenue_ratio
                ));
                (Action::Discount, discount, "LOW_MARGIN_HIGH_STORAGE")
            } else if flags.is_slow_moving && !flags.is_low_margin {
                let discount = rates.discount_override.unwrap_or(t.slow_moving_discount_pct);
                factors.push(format!(
                    "RULE_DISCOUNT_SLOW: days={} > {}, margin={:.2}%",
                    metrics.days_of_inventory, t.slow_moving_days, metrics.profit_margin_percentage
                ));
                (Action::Discount, discount, "SLOW_MOVING")
            } else {
                factors.push("RULE_KEEP: no price action conditions met".to_string());
                (Action::Keep, 0.0, "NORMAL")
            };

        if flags.is_very_slow_moving && flags.is_high_margin {
            match advertising_roi {
                Some(roi) if roi > t.advertise_roi_threshold => {
                    factors.push(format!(
                        "RULE_ADVERTISE: days={} > {}, margin={:.2}% > {}%, roi={:.4} > {}",
                        metrics.days_of_inventory,
                        t.very_slow_moving_days,
                        metrics.profit_margin_percentage,
                        t.high_margin_pct,
                        roi,
                        t.advertise_roi_threshold
                    ));
                    action = Action::Advertise;
                    discount_pct = 0.0;
                    primary_reason = "ADVERTISING_ROI";
                }
                roi => {
                    debug!(?roi, "广告 ROI 未达门槛,保持基础分类");
                }
            }
        }

        Classification {
            flags,
            action,
            discount_pct: discount_pct.clamp(0.0, 100.0),
            primary_reason,
            factors,
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::engine_config::DAYS_OF_INVENTORY_SENTINEL;
    use crate::domain::types::StorageCostSource;

    fn rates(discount_override: Option<f64>) -> ResolvedRates {
        ResolvedRates {
            cost_price: 400.0,
            selling_price: 1000.0,
            daily_sales: 1.0,
            daily_storage_cost: 5.0,
            storage_cost_source: StorageCostSource::Default,
            logistics_cost: 150.0,
            commission_rate: 0.15,
            low_stock_threshold: 7,
            discount_override,
        }
    }

    fn metrics(days: i64, margin: f64, ratio: f64) -> StorageMetrics {
        StorageMetrics {
            current_stock: 100.0,
            daily_storage_cost_total: 500.0,
            days_of_inventory: days,
            has_sales_velocity: days != DAYS_OF_INVENTORY_SENTINEL,
            average_stock: 50.0,
            total_storage_cost: 0.0,
            commission_amount: 150.0,
            profit_per_item: margin * 10.0,
            profit_margin_percentage: margin,
            gross_profit: 0.0,
            net_profit: 0.0,
            storage_cost_to_revenue_ratio: ratio,
        }
    }

    fn classifier() -> DecisionClassifier {
        DecisionClassifier::new(DecisionThresholds::default())
    }

    #[test]
    fn test_slow_and_high_storage_liquidates() {
        let c = classifier().classify(&rates(None), &metrics(120, 20.0, 0.3), None);
        assert_eq!(c.action, Action::Liquidate);
        assert_eq!(c.discount_pct, 40.0);
        assert_eq!(c.primary_reason, "SLOW_HIGH_STORAGE");
    }

    #[test]
    fn test_low_margin_high_storage_discount_uses_override() {
        let c = classifier().classify(&rates(None), &metrics(30, 10.0, 0.2), None);
        assert_eq!(c.action, Action::Discount);
        assert_eq!(c.discount_pct, 25.0);

        let c = classifier().classify(&rates(Some(33.0)), &metrics(30, 10.0, 0.2), None);
        assert_eq!(c.discount_pct, 33.0);
    }

    #[test]
    fn test_slow_moving_healthy_margin_discount() {
        let c = classifier().classify(&rates(None), &metrics(75, 20.0, 0.05), None);
        assert_eq!(c.action, Action::Discount);
        assert_eq!(c.discount_pct, 15.0);
    }

    #[test]
    fn test_slow_moving_low_margin_low_storage_keeps() {
        let c = classifier().classify(&rates(None), &metrics(75, 10.0, 0.05), None);
        assert_eq!(c.action, Action::Keep);
        assert_eq!(c.discount_pct, 0.0);
    }

    #[test]
    fn test_advertise_override_requires_roi() {
        let m = metrics(200, 40.0, 0.3);
        let c = classifier().classify(&rates(None), &m, Some(0.5));
        assert_eq!(c.action, Action::Advertise);
        assert_eq!(c.discount_pct, 0.0);

        let c = classifier().classify(&rates(None), &m, Some(0.2));
        assert_eq!(c.action, Action::Liquidate);

        let c = classifier().classify(&rates(None), &m, None);
        assert_eq!(c.action, Action::Liquidate);
    }

    #[test]
    fn test_sentinel_days_are_not_slow() {
        let flags = classifier().flags(&metrics(DAYS_OF_INVENTORY_SENTINEL, 20.0, 0.5));
        assert!(!flags.is_slow_moving);
        assert!(!flags.is_very_slow_moving);
        assert!(flags.is_high_storage_cost);
    }
}
