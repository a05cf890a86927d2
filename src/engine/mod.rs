// ==========================================
// 仓储盈利决策引擎 - 引擎层
// ==========================================
// 职责: 实现纯计算规则,不访问存储
// 红线: Engine 不拼 SQL, 所有结论必须输出 reason
// ==========================================

pub mod analyzer;
pub mod classifier;
pub mod low_stock_guard;
pub mod metrics;
pub mod rate_resolver;
pub mod simulator;
pub mod summary;
pub mod warehouse_ranking;

// 重导出核心引擎
pub use analyzer::{filter_by_action, AnalysisInput, StorageAnalyzer};
pub use classifier::{Classification, DecisionClassifier, DecisionFlags};
pub use low_stock_guard::{GuardOutcome, LowStockGuard};
pub use metrics::MetricCalculator;
pub use rate_resolver::{RateResolver, StorageCostIndex};
pub use simulator::{DiscountSimulator, SimulationVerdict};
pub use summary::SummaryAggregator;
pub use warehouse_ranking::{rank_warehouses, WarehouseMetrics, WarehouseRanking};
