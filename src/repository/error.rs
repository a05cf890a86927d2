// ==========================================
// 仓储盈利决策引擎 - 仓储层错误
// ==========================================
// 覆盖: sku_override / sales_rate_cache / config_kv 的读写
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} 不存在: {id}")]
    NotFound { entity: String, id: String },

    #[error("数据库连接锁不可用: {0}")]
    LockError(String),

    #[error("SQLite 执行失败: {0}")]
    DatabaseQueryError(String),

    #[error("主键冲突: {0}")]
    UniqueConstraintViolation(String),

    /// 未知配置键等请求级错误
    #[error("校验失败: {0}")]
    ValidationError(String),

    /// 值本身不合法（非有限数、类型不符）
    #[error("{field} 取值无效: {message}")]
    FieldValueError { field: String, message: String },

    #[error("配置快照 JSON 无效: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "row".to_string(),
                id: "-".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
