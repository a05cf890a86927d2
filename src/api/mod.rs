// ==========================================
// 仓储盈利决策引擎 - API 层
// ==========================================
// 职责: 面向 CLI/宿主的业务接口,组合引擎与仓储
// ==========================================

pub mod analysis_api;
pub mod error;

pub use analysis_api::{AnalysisApi, AnalysisRequest};
pub use error::{ApiError, ApiResult};
