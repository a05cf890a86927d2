// ==========================================
// 仓储盈利决策引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 覆写与销速缓存的持久化,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod override_repo;
pub mod sales_cache_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use override_repo::{
    InMemoryOverrideStore, OverrideEntry, OverrideStore, SqliteOverrideRepository,
};
pub use sales_cache_repo::SalesCacheRepository;
