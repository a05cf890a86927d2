// ==========================================
// 仓储盈利决策引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持（按 SKU 给出 keep/discount/liquidate/advertise 建议,人工最终决定）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 纯计算规则
pub mod engine;

// 配置层 - 引擎参数
pub mod config;

// 数据仓储层 - 覆写与销速缓存
pub mod repository;

// 导入层 - 外部报表
pub mod importer;

// 数据源层 - 销速
pub mod source;

// API 层 - 业务接口
pub mod api;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Action, DataOrigin, OverrideKind, StockLevel, StorageCostSource};

// 领域实体
pub use domain::{
    AnalysisReport, AnalysisResult, AnalysisSummary, PaidStorageRecord, Projection,
    RateOverrides, ResolvedRates, SkuId, StorageMetrics, WarehouseItem, WarehouseStock,
};

// 引擎
pub use engine::{filter_by_action, AnalysisInput, StorageAnalyzer};

// 配置
pub use config::{ConfigManager, EngineConfig};

// API
pub use api::{AnalysisApi, AnalysisRequest};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "仓储盈利决策引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
