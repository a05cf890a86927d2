// ==========================================
// 仓储盈利决策引擎 - 配置管理器
// ==========================================
// 职责: 引擎参数的加载、覆写、快照与恢复
// 存储: config_kv 表 (scope_id='global', key='<分组>.<字段>')
// 红线: 未知键拒绝写入;无法解析的存量值回退默认并告警
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use serde_json::{json, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（自动建表）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的原始配置值
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值
    ///
    /// 键必须属于 config_keys::all(),值必须能解析为对应字段的数值类型
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let defaults = default_tree()?;
        let slot = lookup(&defaults, key).ok_or_else(|| {
            RepositoryError::ValidationError(format!("未知配置键: {}", key))
        })?;

        if parse_like(value, slot).is_none() {
            return Err(RepositoryError::FieldValueError {
                field: key.to_string(),
                message: format!("无法解析为数值: {}", value),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value.trim()],
        )?;

        info!(key, value, "配置已更新");
        Ok(())
    }

    /// 删除配置覆写（恢复默认）
    pub fn reset_config_value(&self, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// 组装引擎参数: 默认值 + config_kv 覆写
    pub fn get_engine_config(&self) -> RepositoryResult<EngineConfig> {
        let stored = self.load_global()?;
        let mut tree = default_tree()?;

        if let Value::Object(sections) = &mut tree {
            for (section, fields) in sections.iter_mut() {
                let Value::Object(fields) = fields else {
                    continue;
                };
                for (field, slot) in fields.iter_mut() {
                    let key = format!("{}.{}", section, field);
                    let Some(raw) = stored.get(&key) else {
                        continue;
                    };
                    match parse_like(raw, slot) {
                        Some(v) => *slot = v,
                        None => warn!(key = %key, raw = %raw, "配置值无法解析,使用默认值"),
                    }
                }
            }
        }

        Ok(serde_json::from_value(tree)?)
    }

    /// 获取所有配置的快照（JSON 格式,键有序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let config_map: BTreeMap<String, String> = self.load_global()?.into_iter().collect();
        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// 覆盖现有的 global 配置,返回恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    fn load_global(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }
}

fn default_tree() -> RepositoryResult<Value> {
    Ok(serde_json::to_value(EngineConfig::default())?)
}

fn lookup<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    let (section, field) = key.split_once('.')?;
    tree.get(section)?.get(field)
}

/// 按默认值的数值类型解析
fn parse_like(raw: &str, template: &Value) -> Option<Value> {
    let raw = raw.trim();
    if template.is_i64() {
        raw.parse::<i64>().ok().map(Value::from)
    } else {
        raw.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 费率缺省值
    pub const DEFAULT_DAILY_SALES: &str = "defaults.daily_sales";
    pub const DEFAULT_STORAGE_COST: &str = "defaults.storage_cost";
    pub const DEFAULT_LOGISTICS_COST: &str = "defaults.logistics_cost";
    pub const DEFAULT_COMMISSION_PCT: &str = "defaults.commission_pct";

    // 分类阈值
    pub const LOW_MARGIN_PCT: &str = "thresholds.low_margin_pct";
    pub const HIGH_MARGIN_PCT: &str = "thresholds.high_margin_pct";
    pub const HIGH_STORAGE_RATIO: &str = "thresholds.high_storage_ratio";
    pub const SLOW_MOVING_DAYS: &str = "thresholds.slow_moving_days";
    pub const VERY_SLOW_MOVING_DAYS: &str = "thresholds.very_slow_moving_days";
    pub const LOW_STOCK_GUARD_DAYS: &str = "thresholds.low_stock_guard_days";

    // 广告模拟
    pub const AD_SALES_UPLIFT: &str = "simulation.ad_sales_uplift";
    pub const AD_COST_RATIO: &str = "simulation.ad_cost_ratio";

    /// 全部可配置键（由 EngineConfig 默认值展开,有序）
    pub fn all() -> Vec<String> {
        let mut keys = Vec::new();
        if let Ok(serde_json::Value::Object(sections)) =
            serde_json::to_value(crate::config::engine_config::EngineConfig::default())
        {
            for (section, fields) in sections {
                if let serde_json::Value::Object(fields) = fields {
                    keys.extend(fields.keys().map(|f| format!("{}.{}", section, f)));
                }
            }
        }
        keys.sort();
        keys
    }
}
