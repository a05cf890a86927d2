// ==========================================
// 仓储盈利决策引擎 - 数据源错误类型
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("销速数据源不可用 ({source_name}): {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },

    #[error("销速数据源超时 ({source_name}): {timeout_ms}ms")]
    Timeout { source_name: String, timeout_ms: u64 },

    #[error("销速文件读取失败: {0}")]
    Import(#[from] ImportError),

    #[error("销速缓存访问失败: {0}")]
    Cache(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;
