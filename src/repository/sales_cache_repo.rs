// ==========================================
// 仓储盈利决策引擎 - 销速缓存仓储
// ==========================================
// 职责: 管理 sales_rate_cache 表（SKU 日销量 + 过期时间）
// 红线: 过期条目对读取不可见;不含回退逻辑
// ==========================================

use crate::domain::item::SkuId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SalesCacheRepository {
    conn: Arc<Mutex<Connection>>,
    ttl: Duration,
}

impl SalesCacheRepository {
    /// 默认缓存有效期（小时）
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl: Duration::hours(Self::DEFAULT_TTL_HOURS),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            ttl: Duration::hours(Self::DEFAULT_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量写入（同 SKU 覆盖）,返回写入条数
    pub fn put_many(&self, rates: &HashMap<SkuId, f64>) -> RepositoryResult<usize> {
        let now = Utc::now();
        let fetched_at = ts(now);
        let expires_at = ts(now + self.ttl);

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO sales_rate_cache (sku_id, daily_sales, fetched_at, expires_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(sku_id) DO UPDATE SET
                    daily_sales = excluded.daily_sales,
                    fetched_at = excluded.fetched_at,
                    expires_at = excluded.expires_at
                "#,
            )?;
            for (sku_id, daily_sales) in rates {
                if !daily_sales.is_finite() {
                    continue;
                }
                count += stmt.execute(params![sku_id, daily_sales, fetched_at, expires_at])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    /// 读取未过期的缓存（缺失的 SKU 不出现在结果中）
    pub fn get_many(&self, sku_ids: &[SkuId]) -> RepositoryResult<HashMap<SkuId, f64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT daily_sales FROM sales_rate_cache WHERE sku_id = ?1 AND expires_at > ?2",
        )?;
        let now = ts(Utc::now());

        let mut out = HashMap::new();
        for sku_id in sku_ids {
            let mut rows = stmt.query(params![sku_id, now])?;
            if let Some(row) = rows.next()? {
                out.insert(*sku_id, row.get::<_, f64>(0)?);
            }
        }
        Ok(out)
    }

    /// 删除过期缓存
    pub fn purge_expired(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM sales_rate_cache WHERE expires_at <= ?1",
            params![ts(Utc::now())],
        )?;
        Ok(affected)
    }
}

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
