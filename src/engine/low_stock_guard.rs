// ==========================================
// 仓储盈利决策引擎 - 低库存保护
// ==========================================
// 职责: 库存已紧张时撤销降价/清仓;计算库存水位与百分比
// 红线: 最后一道修正,优先级高于分类器与模拟器
// ==========================================

use crate::domain::types::{Action, StockLevel};
use tracing::debug;

/// 保护结果
#[derive(Debug, Clone, PartialEq)]
pub struct GuardOutcome {
    pub low_stock: bool,
    pub stock_level: StockLevel,
    pub stock_level_percentage: f64,
    pub action: Action,
    pub discount_pct: f64,
    /// 若保护生效,给出原因
    pub applied_reason: Option<String>,
}

// ==========================================
// LowStockGuard - 低库存保护
// ==========================================
pub struct LowStockGuard {
    /// days < 该值时才强制 keep
    guard_days: i64,
}

impl LowStockGuard {
    pub fn new(guard_days: i64) -> Self {
        Self { guard_days }
    }

    /// 应用保护
    ///
    /// - low_stock = stock ≤ threshold
    /// - low_stock 且 days < 90 → keep, 0%
    pub fn apply(
        &self,
        current_stock: f64,
        threshold: u32,
        days_of_inventory: i64,
        action: Action,
        discount_pct: f64,
    ) -> GuardOutcome {
        let threshold_f = threshold as f64;
        let low_stock = current_stock <= threshold_f;
        let (stock_level, stock_level_percentage) = Self::stock_level(current_stock, threshold);

        if low_stock && days_of_inventory < self.guard_days && action != Action::Keep {
            debug!(
                current_stock,
                threshold,
                days_of_inventory,
                from = %action,
                "低库存保护生效,强制 keep"
            );
            return GuardOutcome {
                low_stock,
                stock_level,
                stock_level_percentage,
                action: Action::Keep,
                discount_pct: 0.0,
                applied_reason: Some(format!(
                    "GUARD_LOW_STOCK: stock={} <= threshold={}, days={} < {}, {} → keep",
                    current_stock, threshold, days_of_inventory, self.guard_days, action
                )),
            };
        }

        GuardOutcome {
            low_stock,
            stock_level,
            stock_level_percentage,
            action,
            discount_pct,
            applied_reason: None,
        }
    }

    /// 库存水位与展示百分比
    ///
    /// 百分比以 3×阈值 为满格;阈值为 0 时有货即满格
    pub fn stock_level(current_stock: f64, threshold: u32) -> (StockLevel, f64) {
        let threshold_f = threshold as f64;
        let level = if current_stock <= threshold_f {
            StockLevel::Low
        } else if current_stock <= threshold_f * 3.0 {
            StockLevel::Medium
        } else {
            StockLevel::High
        };

        let percentage = if threshold == 0 {
            if current_stock > 0.0 {
                100.0
            } else {
                0.0
            }
        } else {
            (current_stock / (threshold_f * 3.0) * 100.0).clamp(0.0, 100.0)
        };

        (level, percentage)
    }
}
