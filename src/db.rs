// ==========================================
// 仓储盈利决策引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 集中建表（config_kv / sku_override / sales_rate_cache）
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "STORAGE_PROFIT_DB_PATH";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// foreign_keys 与 busy_timeout 都需要"每个连接"单独设置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建本库用到的全部表（幂等）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS sku_override (
            kind TEXT NOT NULL,
            sku_id INTEGER NOT NULL,
            value REAL NOT NULL,
            expires_at TEXT,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (kind, sku_id)
        );
        CREATE INDEX IF NOT EXISTS idx_sku_override_expires ON sku_override(expires_at);

        CREATE TABLE IF NOT EXISTS sales_rate_cache (
            sku_id INTEGER PRIMARY KEY,
            daily_sales REAL NOT NULL,
            fetched_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );
        "#,
    )
}

/// 获取默认数据库路径
///
/// - 优先读取环境变量 STORAGE_PROFIT_DB_PATH
/// - 否则: 用户数据目录/storage-profit/storage_profit.db
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./storage_profit.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("storage-profit");
        // 建目录失败时退回 data_dir 下,由 open 报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("storage_profit.db");
    }

    path.to_string_lossy().to_string()
}
