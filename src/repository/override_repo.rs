// ==========================================
// 仓储盈利决策引擎 - SKU 覆写仓储
// ==========================================
// 职责: 人工覆写的持久化与 TTL 管理,对外提供只读快照
// 红线: Repository 不含业务逻辑;过期条目对读取不可见
// ==========================================

use crate::domain::item::SkuId;
use crate::domain::overrides::RateOverrides;
use crate::domain::types::OverrideKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// 覆写条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideEntry {
    pub kind: OverrideKind,
    pub sku_id: SkuId,
    pub value: f64,
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl OverrideEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

// ==========================================
// OverrideStore - 覆写存储接口
// ==========================================
pub trait OverrideStore: Send + Sync {
    /// 读取未过期的覆写值
    fn get(&self, kind: OverrideKind, sku_id: SkuId) -> RepositoryResult<Option<f64>>;

    /// 写入永久覆写（同键覆盖）
    fn set(&self, kind: OverrideKind, sku_id: SkuId, value: f64) -> RepositoryResult<()>;

    /// 写入带有效期的覆写
    fn set_with_ttl(
        &self,
        kind: OverrideKind,
        sku_id: SkuId,
        value: f64,
        ttl: Duration,
    ) -> RepositoryResult<()>;

    /// 删除覆写,返回是否存在
    fn remove(&self, kind: OverrideKind, sku_id: SkuId) -> RepositoryResult<bool>;

    /// 物理删除已过期条目,返回删除数量
    fn purge_expired(&self) -> RepositoryResult<usize>;

    /// 列出未过期条目（按 kind/sku 排序）
    fn list(&self) -> RepositoryResult<Vec<OverrideEntry>>;

    /// 导出一次分析使用的只读快照
    fn snapshot(&self) -> RepositoryResult<RateOverrides> {
        let mut overrides = RateOverrides::new();
        for entry in self.list()? {
            overrides.insert(entry.kind, entry.sku_id, entry.value);
        }
        Ok(overrides)
    }
}

fn validate_value(kind: OverrideKind, value: f64) -> RepositoryResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RepositoryError::FieldValueError {
            field: kind.code().to_string(),
            message: format!("覆写值必须为有限数: {}", value),
        })
    }
}

fn expiry_after(ttl: Duration) -> RepositoryResult<DateTime<Utc>> {
    Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| RepositoryError::FieldValueError {
            field: "ttl".to_string(),
            message: format!("有效期超出日期范围: {}", ttl),
        })
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ==========================================
// InMemoryOverrideStore - 内存实现
// ==========================================
type EntryMap = HashMap<(OverrideKind, SkuId), OverrideEntry>;

#[derive(Default)]
pub struct InMemoryOverrideStore {
    entries: Mutex<EntryMap>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> RepositoryResult<MutexGuard<'_, EntryMap>> {
        self.entries
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn put(
        &self,
        kind: OverrideKind,
        sku_id: SkuId,
        value: f64,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        validate_value(kind, value)?;
        let mut entries = self.lock_entries()?;
        entries.insert(
            (kind, sku_id),
            OverrideEntry {
                kind,
                sku_id,
                value,
                expires_at,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }
}

impl OverrideStore for InMemoryOverrideStore {
    fn get(&self, kind: OverrideKind, sku_id: SkuId) -> RepositoryResult<Option<f64>> {
        let now = Utc::now();
        let entries = self.lock_entries()?;
        Ok(entries
            .get(&(kind, sku_id))
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value))
    }

    fn set(&self, kind: OverrideKind, sku_id: SkuId, value: f64) -> RepositoryResult<()> {
        self.put(kind, sku_id, value, None)
    }

    fn set_with_ttl(
        &self,
        kind: OverrideKind,
        sku_id: SkuId,
        value: f64,
        ttl: Duration,
    ) -> RepositoryResult<()> {
        self.put(kind, sku_id, value, Some(expiry_after(ttl)?))
    }

    fn remove(&self, kind: OverrideKind, sku_id: SkuId) -> RepositoryResult<bool> {
        let mut entries = self.lock_entries()?;
        Ok(entries.remove(&(kind, sku_id)).is_some())
    }

    fn purge_expired(&self) -> RepositoryResult<usize> {
        let now = Utc::now();
        let mut entries = self.lock_entries()?;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        Ok(before - entries.len())
    }

    fn list(&self) -> RepositoryResult<Vec<OverrideEntry>> {
        let now = Utc::now();
        let entries = self.lock_entries()?;
        let mut out: Vec<OverrideEntry> = entries
            .values()
            .filter(|e| !e.is_expired(now))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.sku_id.cmp(&b.sku_id)));
        Ok(out)
    }
}

// ==========================================
// SqliteOverrideRepository - SQLite 实现
// ==========================================
/// 职责: 管理 sku_override 表
pub struct SqliteOverrideRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOverrideRepository {
    /// 打开数据库并确保表存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn upsert(
        &self,
        kind: OverrideKind,
        sku_id: SkuId,
        value: f64,
        expires_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<()> {
        validate_value(kind, value)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO sku_override (kind, sku_id, value, expires_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(kind, sku_id) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
            params![
                kind.code(),
                sku_id,
                value,
                expires_at.map(format_ts),
                format_ts(Utc::now()),
            ],
        )?;
        debug!(kind = kind.code(), sku_id, value, "覆写已写入");
        Ok(())
    }
}

impl OverrideStore for SqliteOverrideRepository {
    fn get(&self, kind: OverrideKind, sku_id: SkuId) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                r#"
                SELECT value FROM sku_override
                WHERE kind = ?1 AND sku_id = ?2
                  AND (expires_at IS NULL OR expires_at > ?3)
                "#,
                params![kind.code(), sku_id, format_ts(Utc::now())],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, kind: OverrideKind, sku_id: SkuId, value: f64) -> RepositoryResult<()> {
        self.upsert(kind, sku_id, value, None)
    }

    fn set_with_ttl(
        &self,
        kind: OverrideKind,
        sku_id: SkuId,
        value: f64,
        ttl: Duration,
    ) -> RepositoryResult<()> {
        self.upsert(kind, sku_id, value, Some(expiry_after(ttl)?))
    }

    fn remove(&self, kind: OverrideKind, sku_id: SkuId) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM sku_override WHERE kind = ?1 AND sku_id = ?2",
            params![kind.code(), sku_id],
        )?;
        Ok(affected > 0)
    }

    fn purge_expired(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM sku_override WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![format_ts(Utc::now())],
        )?;
        debug!(purged = affected, "过期覆写已清理");
        Ok(affected)
    }

    fn list(&self) -> RepositoryResult<Vec<OverrideEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT kind, sku_id, value, expires_at, updated_at
            FROM sku_override
            WHERE expires_at IS NULL OR expires_at > ?1
            ORDER BY kind, sku_id
            "#,
        )?;

        let rows = stmt.query_map(params![format_ts(Utc::now())], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, SkuId>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (kind_raw, sku_id, value, expires_raw, updated_raw) = row?;
            let kind: OverrideKind = kind_raw.parse().map_err(|e: String| {
                RepositoryError::FieldValueError {
                    field: "kind".to_string(),
                    message: e,
                }
            })?;
            out.push(OverrideEntry {
                kind,
                sku_id,
                value,
                expires_at: expires_raw.as_deref().and_then(parse_ts),
                updated_at: parse_ts(&updated_raw).unwrap_or_else(Utc::now),
            });
        }

        // kind 列按字符串排序,这里按枚举顺序重排
        out.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.sku_id.cmp(&b.sku_id)));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poisoned_store_reports_lock_error() {
        let store = Arc::new(InMemoryOverrideStore::new());
        let holder = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = holder.entries.lock().unwrap();
            panic!("writer crashed while holding the lock");
        })
        .join();

        let err = store.get(OverrideKind::Discount, 1).unwrap_err();
        assert!(matches!(err, RepositoryError::LockError(_)));
        assert!(matches!(
            store.set(OverrideKind::Discount, 1, 10.0),
            Err(RepositoryError::LockError(_))
        ));
    }

    #[test]
    fn test_in_memory_set_get_remove() {
        let store = InMemoryOverrideStore::new();
        store.set(OverrideKind::CostPrice, 7, 320.0).unwrap();
        assert_eq!(store.get(OverrideKind::CostPrice, 7).unwrap(), Some(320.0));

        store.set(OverrideKind::CostPrice, 7, 330.0).unwrap();
        assert_eq!(store.get(OverrideKind::CostPrice, 7).unwrap(), Some(330.0));

        assert!(store.remove(OverrideKind::CostPrice, 7).unwrap());
        assert!(!store.remove(OverrideKind::CostPrice, 7).unwrap());
        assert_eq!(store.get(OverrideKind::CostPrice, 7).unwrap(), None);
    }

    #[test]
    fn test_in_memory_expired_entries_hidden_and_purged() {
        let store = InMemoryOverrideStore::new();
        store
            .set_with_ttl(OverrideKind::Discount, 1, 20.0, Duration::seconds(-1))
            .unwrap();
        store
            .set_with_ttl(OverrideKind::Discount, 2, 30.0, Duration::hours(1))
            .unwrap();

        assert_eq!(store.get(OverrideKind::Discount, 1).unwrap(), None);
        assert_eq!(store.get(OverrideKind::Discount, 2).unwrap(), Some(30.0));

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.purge_expired().unwrap(), 0);
    }

    #[test]
    fn test_rejects_non_finite_value() {
        let store = InMemoryOverrideStore::new();
        let err = store.set(OverrideKind::SellingPrice, 1, f64::NAN).unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
    }
}
