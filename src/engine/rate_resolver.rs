// ==========================================
// 仓储盈利决策引擎 - 费率解析器
// ==========================================
// 职责: 为每个 SKU 解析成本价/售价/日销量/日仓储费/物流费/佣金率
// 输入: WarehouseItem + 覆写快照 + 付费仓储记录 + 销速表
// 输出: ResolvedRates
// 红线: 不报错,缺失数据一律降级为缺省值
// ==========================================

use crate::config::engine_config::RateDefaults;
use crate::domain::analysis::ResolvedRates;
use crate::domain::item::{PaidStorageRecord, SkuId, WarehouseItem};
use crate::domain::overrides::RateOverrides;
use crate::domain::types::{OverrideKind, StorageCostSource};
use std::collections::HashMap;

// ==========================================
// StorageCostIndex - 付费仓储均值索引
// ==========================================
/// 按 SKU 预聚合付费仓储记录,批量分析时只遍历一次
#[derive(Debug, Clone, Default)]
pub struct StorageCostIndex {
    totals: HashMap<SkuId, (f64, usize)>,
}

impl StorageCostIndex {
    /// 构建索引（忽略负数与非有限值）
    pub fn build(records: &[PaidStorageRecord]) -> Self {
        let mut totals: HashMap<SkuId, (f64, usize)> = HashMap::new();
        for record in records {
            if !record.cost.is_finite() || record.cost < 0.0 {
                continue;
            }
            let entry = totals.entry(record.sku_id).or_insert((0.0, 0));
            entry.0 += record.cost;
            entry.1 += 1;
        }
        Self { totals }
    }

    /// SKU 的平均观测日仓储费
    pub fn average(&self, sku_id: SkuId) -> Option<f64> {
        self.totals
            .get(&sku_id)
            .filter(|(_, count)| *count > 0)
            .map(|(sum, count)| sum / *count as f64)
    }

    pub fn sku_count(&self) -> usize {
        self.totals.len()
    }
}

// ==========================================
// RateResolver - 费率解析器
// ==========================================
pub struct RateResolver {
    defaults: RateDefaults,
}

impl RateResolver {
    pub fn new(defaults: RateDefaults) -> Self {
        Self { defaults }
    }

    /// 解析单个 SKU 的费率
    ///
    /// 优先级:
    /// - 日销量: 覆写 > 销速表 > 缺省
    /// - 日仓储费: 付费仓储均值 > 覆写 > 缺省
    /// - 其余: 覆写 > 缺省（成本价缺省 = 售价 × cost_price_ratio）
    pub fn resolve(
        &self,
        item: &WarehouseItem,
        overrides: &RateOverrides,
        storage_index: &StorageCostIndex,
        sales_rates: &HashMap<SkuId, f64>,
    ) -> ResolvedRates {
        let sku = item.sku_id;
        let non_negative = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };

        let selling_price = non_negative(
            overrides
                .get(OverrideKind::SellingPrice, sku)
                .unwrap_or(item.price),
        );

        let cost_price = non_negative(
            overrides
                .get(OverrideKind::CostPrice, sku)
                .unwrap_or(selling_price * self.defaults.cost_price_ratio),
        );

        let daily_sales = non_negative(
            overrides
                .get(OverrideKind::DailySales, sku)
                .or_else(|| sales_rates.get(&sku).copied().filter(|v| v.is_finite()))
                .unwrap_or(self.defaults.daily_sales),
        );

        let (daily_storage_cost, storage_cost_source) = match storage_index.average(sku) {
            Some(avg) => (avg, StorageCostSource::PaidStorage),
            None => match overrides.get(OverrideKind::StorageCost, sku) {
                Some(v) => (non_negative(v), StorageCostSource::Override),
                None => (self.defaults.storage_cost, StorageCostSource::Default),
            },
        };

        let logistics_cost = non_negative(
            overrides
                .get(OverrideKind::LogisticsCost, sku)
                .unwrap_or(self.defaults.logistics_cost),
        );

        let commission_pct = overrides
            .get(OverrideKind::Commission, sku)
            .unwrap_or(self.defaults.commission_pct);
        let commission_rate = (non_negative(commission_pct) / 100.0).min(1.0);

        let low_stock_threshold = match overrides.get(OverrideKind::LowStockThreshold, sku) {
            Some(v) => non_negative(v).ceil() as u32,
            None => (daily_sales * self.defaults.low_stock_coverage_days).ceil() as u32,
        };

        let discount_override = overrides
            .get(OverrideKind::Discount, sku)
            .map(|v| v.clamp(0.0, 100.0));

        ResolvedRates {
            cost_price,
            selling_price,
            daily_sales,
            daily_storage_cost,
            storage_cost_source,
            logistics_cost,
            commission_rate,
            low_stock_threshold,
            discount_override,
        }
    }
}
