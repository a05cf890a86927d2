// ==========================================
// 仓储盈利决策引擎 - 数据源层
// ==========================================
// 职责: 异步获取销速,带缓存与演示数据回退
// ==========================================

pub mod error;
pub mod provider;
pub mod sales_rate_source;

pub use error::{SourceError, SourceResult};
pub use provider::{demo_sales_rate, SalesRateProvider, SalesRates};
pub use sales_rate_source::{FileSalesRateSource, SalesRateSource};
