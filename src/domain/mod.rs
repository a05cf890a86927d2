// ==========================================
// 仓储盈利决策引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod analysis;
pub mod item;
pub mod overrides;
pub mod types;

// 重导出核心类型
pub use analysis::{
    AnalysisReport, AnalysisResult, AnalysisSummary, Projection, ResolvedRates, StorageMetrics,
};
pub use item::{PaidStorageRecord, SkuId, WarehouseItem, WarehouseStock};
pub use overrides::RateOverrides;
pub use types::{Action, DataOrigin, OverrideKind, StockLevel, StorageCostSource};
