// ==========================================
// 仓储盈利决策引擎 - 引擎参数
// ==========================================
// 职责: 默认费率、决策阈值、模拟参数、仓库排名权重
// 存储: config_kv 表（见 ConfigManager）,缺省值见各 Default 实现
// ==========================================

use serde::{Deserialize, Serialize};

/// 无销量时的周转天数哨兵值
pub const DAYS_OF_INVENTORY_SENTINEL: i64 = 999;

/// 引擎全量参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub defaults: RateDefaults,
    pub thresholds: DecisionThresholds,
    pub simulation: SimulationParams,
    pub ranking: RankingWeights,
}

// ==========================================
// RateDefaults - 费率缺省值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateDefaults {
    /// 件/天
    pub daily_sales: f64,
    /// 单件日仓储费
    pub storage_cost: f64,
    /// 单件物流费
    pub logistics_cost: f64,
    /// 佣金（百分比）
    pub commission_pct: f64,
    /// 成本价 = 售价 × 该比例
    pub cost_price_ratio: f64,
    /// 低库存阈值 = ceil(日销量 × 该天数)
    pub low_stock_coverage_days: f64,
}

impl Default for RateDefaults {
    fn default() -> Self {
        Self {
            daily_sales: 0.1,
            storage_cost: 5.0,
            logistics_cost: 150.0,
            commission_pct: 15.0,
            cost_price_ratio: 0.4,
            low_stock_coverage_days: 7.0,
        }
    }
}

// ==========================================
// DecisionThresholds - 分类器阈值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// 低毛利: margin% < 该值
    pub low_margin_pct: f64,
    /// 高毛利: margin% > 该值
    pub high_margin_pct: f64,
    /// 高仓储占比: ratio > 该值
    pub high_storage_ratio: f64,
    /// 滞销: days > 该值
    pub slow_moving_days: i64,
    /// 严重滞销: days > 该值
    pub very_slow_moving_days: i64,
    /// 负节省仍坚持小幅打折的周转天数
    pub extended_slow_days: i64,
    /// 低库存保护生效的周转天数上限（days < 该值）
    pub low_stock_guard_days: i64,

    pub liquidate_discount_pct: f64,
    pub low_margin_discount_pct: f64,
    pub slow_moving_discount_pct: f64,
    /// 负节省降级时的折扣上限
    pub fallback_discount_cap_pct: f64,
    /// 深度亏损升级清仓时的折扣上限
    pub liquidation_cap_pct: f64,

    /// 分类器广告 ROI 门槛
    pub advertise_roi_threshold: f64,
    /// 模拟器改判广告的 ROI 门槛
    pub advertise_switch_roi_threshold: f64,
    /// 深度亏损: |折后利润| > 该比例 × |折后毛利|
    pub deep_loss_ratio: f64,
    /// 清仓需较基线改善 > 该比例 × |基线利润|
    pub material_improvement_ratio: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            low_margin_pct: 15.0,
            high_margin_pct: 25.0,
            high_storage_ratio: 0.10,
            slow_moving_days: 60,
            very_slow_moving_days: 90,
            extended_slow_days: 180,
            low_stock_guard_days: 90,
            liquidate_discount_pct: 40.0,
            low_margin_discount_pct: 25.0,
            slow_moving_discount_pct: 15.0,
            fallback_discount_cap_pct: 15.0,
            liquidation_cap_pct: 50.0,
            advertise_roi_threshold: 0.20,
            advertise_switch_roi_threshold: 0.30,
            deep_loss_ratio: 0.5,
            material_improvement_ratio: 0.10,
        }
    }
}

// ==========================================
// SimulationParams - 广告模拟参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// 广告带来的销速提升（0.8 = +80%）
    pub ad_sales_uplift: f64,
    /// 广告成本占售价比例（每售出一件）
    pub ad_cost_ratio: f64,
    /// 广告投放评估窗口（天）
    pub ad_campaign_days: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            ad_sales_uplift: 0.8,
            ad_cost_ratio: 0.15,
            ad_campaign_days: 30.0,
        }
    }
}

// ==========================================
// RankingWeights - 仓库排名权重
// ==========================================
// 权重为展示用途的经验值,并非经过验证的业务公式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub turnover_weight: f64,
    pub utilization_weight: f64,
    pub speed_weight: f64,
    /// 速度项基准: (speed_baseline - speed)
    pub speed_baseline: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            turnover_weight: 0.4,
            utilization_weight: 0.3,
            speed_weight: 0.3,
            speed_baseline: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{"thresholds": {"slow_moving_days": 45}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.thresholds.slow_moving_days, 45);
        assert_eq!(config.thresholds.very_slow_moving_days, 90);
        assert_eq!(config.defaults.storage_cost, 5.0);
        assert_eq!(config.simulation.ad_sales_uplift, 0.8);
    }
}
