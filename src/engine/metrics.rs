// ==========================================
// 仓储盈利决策引擎 - 指标计算器
// ==========================================
// 职责: 周转天数、仓储总成本、单件利润、毛利率、仓储占收比
// 输入: ResolvedRates + 当前库存
// 输出: StorageMetrics
// 红线: 除零一律返回 0 或哨兵值,不报错
// ==========================================

use crate::config::engine_config::DAYS_OF_INVENTORY_SENTINEL;
use crate::domain::analysis::{ResolvedRates, StorageMetrics};

// ==========================================
// MetricCalculator - 指标计算器
// ==========================================
// 无状态,所有方法都是纯函数
pub struct MetricCalculator;

impl MetricCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 计算全部指标
    ///
    /// 公式:
    /// - days = daily_sales > 0 ? round(stock / daily_sales) : 999
    /// - average_stock = stock / 2（线性消耗假设）
    /// - total_storage = average_stock × days × daily_storage_cost
    /// - profit_per_item = price - cost - price × commission - logistics
    /// - ratio = total_storage / (price × stock)
    pub fn calculate(&self, rates: &ResolvedRates, current_stock: f64) -> StorageMetrics {
        let stock = if current_stock.is_finite() {
            current_stock.max(0.0)
        } else {
            0.0
        };

        let daily_storage_cost_total = rates.daily_storage_cost * stock;
        let has_sales_velocity = rates.daily_sales > 0.0;
        let days_of_inventory = Self::days_of_inventory(stock, rates.daily_sales);

        let average_stock = stock / 2.0;
        let total_storage_cost =
            Self::storage_cost(average_stock, days_of_inventory, rates.daily_storage_cost);

        let commission_amount = rates.selling_price * rates.commission_rate;
        let profit_per_item = Self::profit_per_item_at(rates.selling_price, rates);
        let profit_margin_percentage = if rates.selling_price > 0.0 {
            profit_per_item / rates.selling_price * 100.0
        } else {
            0.0
        };

        let gross_profit = profit_per_item * stock;
        let net_profit = gross_profit - total_storage_cost;

        let revenue = rates.selling_price * stock;
        let storage_cost_to_revenue_ratio = if revenue > 0.0 {
            total_storage_cost / revenue
        } else {
            0.0
        };

        StorageMetrics {
            current_stock: stock,
            daily_storage_cost_total,
            days_of_inventory,
            has_sales_velocity,
            average_stock,
            total_storage_cost,
            commission_amount,
            profit_per_item,
            profit_margin_percentage,
            gross_profit,
            net_profit,
            storage_cost_to_revenue_ratio,
        }
    }

    /// 周转天数（无销量 → 哨兵）
    pub fn days_of_inventory(stock: f64, daily_sales: f64) -> i64 {
        if daily_sales > 0.0 {
            (stock / daily_sales).round() as i64
        } else {
            DAYS_OF_INVENTORY_SENTINEL
        }
    }

    /// 线性消耗下的仓储总成本
    pub fn storage_cost(average_stock: f64, days: i64, daily_storage_cost: f64) -> f64 {
        average_stock * days as f64 * daily_storage_cost
    }

    /// 指定售价下的单件利润（佣金按该售价重算）
    pub fn profit_per_item_at(price: f64, rates: &ResolvedRates) -> f64 {
        price - rates.cost_price - price * rates.commission_rate - rates.logistics_cost
    }
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::StorageCostSource;

    fn rates(price: f64, cost: f64, daily_sales: f64, storage: f64) -> ResolvedRates {
        ResolvedRates {
            cost_price: cost,
            selling_price: price,
            daily_sales,
            daily_storage_cost: storage,
            storage_cost_source: StorageCostSource::Default,
            logistics_cost: 150.0,
            commission_rate: 0.15,
            low_stock_threshold: 1,
            discount_override: None,
        }
    }

    #[test]
    fn test_slow_item_metrics() {
        let m = MetricCalculator::new().calculate(&rates(1000.0, 400.0, 0.1, 5.0), 100.0);

        assert_eq!(m.days_of_inventory, 1000);
        assert_eq!(m.daily_storage_cost_total, 500.0);
        assert_eq!(m.average_stock, 50.0);
        assert!((m.total_storage_cost - 250_000.0).abs() < 1e-6);
        assert!((m.commission_amount - 150.0).abs() < 1e-9);
        assert!((m.profit_per_item - 300.0).abs() < 1e-9);
        assert!((m.profit_margin_percentage - 30.0).abs() < 1e-9);
        assert!((m.gross_profit - 30_000.0).abs() < 1e-6);
        assert!((m.net_profit + 220_000.0).abs() < 1e-6);
        assert!((m.storage_cost_to_revenue_ratio - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sales_uses_sentinel() {
        let m = MetricCalculator::new().calculate(&rates(1000.0, 400.0, 0.0, 5.0), 10.0);
        assert_eq!(m.days_of_inventory, DAYS_OF_INVENTORY_SENTINEL);
        assert!(!m.has_sales_velocity);
    }

    #[test]
    fn test_zero_price_guards() {
        let m = MetricCalculator::new().calculate(&rates(0.0, 0.0, 1.0, 5.0), 10.0);
        assert_eq!(m.profit_margin_percentage, 0.0);
        assert_eq!(m.storage_cost_to_revenue_ratio, 0.0);
    }

    #[test]
    fn test_zero_stock() {
        let m = MetricCalculator::new().calculate(&rates(1000.0, 400.0, 2.0, 5.0), 0.0);
        assert_eq!(m.days_of_inventory, 0);
        assert_eq!(m.total_storage_cost, 0.0);
        assert_eq!(m.storage_cost_to_revenue_ratio, 0.0);
    }

    #[test]
    fn test_days_rounding() {
        assert_eq!(MetricCalculator::days_of_inventory(50.0, 0.2), 250);
        assert_eq!(MetricCalculator::days_of_inventory(10.0, 3.0), 3);
        assert_eq!(MetricCalculator::days_of_inventory(10.0, 4.0), 3);
    }
}
