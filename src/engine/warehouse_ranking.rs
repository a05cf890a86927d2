// ==========================================
// 仓储盈利决策引擎 - 仓库排名
// ==========================================
// 职责: 按周转/占用/配送速度为仓库打分并排序
// 红线: 确定性排序,同分按仓库名升序
// ==========================================

use crate::config::engine_config::RankingWeights;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 仓库运营指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseMetrics {
    pub warehouse_name: String,
    /// 周转率
    pub turnover_rate: f64,
    /// 占用率（0-100）
    pub utilization_pct: f64,
    /// 配送时长（越小越快）
    pub delivery_speed: f64,
}

/// 排名结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseRanking {
    /// 从 1 开始
    pub rank: usize,
    pub warehouse_name: String,
    pub score: f64,
    pub metrics: WarehouseMetrics,
}

/// 单仓得分
pub fn warehouse_score(metrics: &WarehouseMetrics, weights: &RankingWeights) -> f64 {
    metrics.turnover_rate * weights.turnover_weight
        + (100.0 - metrics.utilization_pct) * weights.utilization_weight
        + (weights.speed_baseline - metrics.delivery_speed) * weights.speed_weight
}

/// 排名（得分降序）
pub fn rank_warehouses(
    warehouses: &[WarehouseMetrics],
    weights: &RankingWeights,
) -> Vec<WarehouseRanking> {
    let mut scored: Vec<(f64, &WarehouseMetrics)> = warehouses
        .iter()
        .map(|w| {
            let score = warehouse_score(w, weights);
            (if score.is_finite() { score } else { f64::MIN }, w)
        })
        .collect();

    scored.sort_by(|(sa, wa), (sb, wb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| wa.warehouse_name.cmp(&wb.warehouse_name))
    });

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (score, w))| WarehouseRanking {
            rank: idx + 1,
            warehouse_name: w.warehouse_name.clone(),
            score,
            metrics: w.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wh(name: &str, turnover: f64, util: f64, speed: f64) -> WarehouseMetrics {
        WarehouseMetrics {
            warehouse_name: name.to_string(),
            turnover_rate: turnover,
            utilization_pct: util,
            delivery_speed: speed,
        }
    }

    #[test]
    fn test_score_formula() {
        let score = warehouse_score(&wh("Коледино", 10.0, 60.0, 200.0), &RankingWeights::default());
        // 10*0.4 + 40*0.3 + 800*0.3
        assert!((score - 256.0).abs() < 1e-9);
    }

    #[test]
    fn test_rank_order_and_tiebreak() {
        let ranked = rank_warehouses(
            &[
                wh("B", 10.0, 50.0, 500.0),
                wh("A", 10.0, 50.0, 500.0),
                wh("C", 50.0, 10.0, 100.0),
            ],
            &RankingWeights::default(),
        );

        let names: Vec<&str> = ranked.iter().map(|r| r.warehouse_name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank_warehouses(&[], &RankingWeights::default()).is_empty());
    }
}
