// ==========================================
// 仓储盈利决策引擎 - 组合汇总
// ==========================================
// 职责: 单品结论 → KPI 汇总
// 红线: 无状态引擎,纯归约
// ==========================================

use crate::domain::analysis::{AnalysisResult, AnalysisSummary};
use crate::domain::types::Action;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub struct SummaryAggregator;

impl SummaryAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 汇总
    ///
    /// - potential_savings 只累加正向节省
    /// - 断货计数: projected_stockout_date < target_date（无销速的 SKU 不计）
    pub fn summarize(&self, results: &[AnalysisResult], target_date: NaiveDate) -> AnalysisSummary {
        let mut action_counts: BTreeMap<String, usize> = Action::ALL
            .iter()
            .map(|a| (a.code().to_string(), 0))
            .collect();

        let mut total_storage_cost = 0.0;
        let mut total_net_profit = 0.0;
        let mut potential_savings = 0.0;
        let mut stockout_before_target_count = 0;

        for result in results {
            *action_counts.entry(result.action.code().to_string()).or_insert(0) += 1;
            total_storage_cost += result.metrics.total_storage_cost;
            total_net_profit += result.metrics.net_profit;

            let savings = result.savings_with_discount();
            if savings > 0.0 {
                potential_savings += savings;
            }

            if matches!(result.projected_stockout_date, Some(date) if date < target_date) {
                stockout_before_target_count += 1;
            }
        }

        AnalysisSummary {
            item_count: results.len(),
            action_counts,
            total_storage_cost,
            total_net_profit,
            potential_savings,
            target_date,
            stockout_before_target_count,
        }
    }
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new()
    }
}
