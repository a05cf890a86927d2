// ==========================================
// 数据仓储集成测试
// ==========================================
// 测试目标: 文件数据库上的覆写/销速缓存/引擎参数
// ==========================================

use chrono::Duration;
use std::collections::HashMap;
use storage_profit_engine::config::{config_keys, ConfigManager};
use storage_profit_engine::repository::{
    OverrideStore, RepositoryError, SalesCacheRepository, SqliteOverrideRepository,
};
use storage_profit_engine::OverrideKind;
use tempfile::TempDir;

fn temp_db() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage_profit.db");
    (dir, path.to_string_lossy().to_string())
}

// ==========================================
// 覆写
// ==========================================

#[test]
fn test_overrides_persist_across_connections() {
    let (_dir, db_path) = temp_db();

    {
        let repo = SqliteOverrideRepository::new(&db_path).unwrap();
        repo.set(OverrideKind::CostPrice, 1001, 420.0).unwrap();
        repo.set(OverrideKind::Discount, 1001, 20.0).unwrap();
        repo.set(OverrideKind::CostPrice, 1001, 380.0).unwrap();
    }

    let repo = SqliteOverrideRepository::new(&db_path).unwrap();
    assert_eq!(repo.get(OverrideKind::CostPrice, 1001).unwrap(), Some(380.0));
    assert_eq!(repo.get(OverrideKind::Discount, 1001).unwrap(), Some(20.0));
    assert_eq!(repo.get(OverrideKind::Discount, 1002).unwrap(), None);
    assert_eq!(repo.list().unwrap().len(), 2);
}

#[test]
fn test_expired_overrides_hidden_then_purged() {
    let (_dir, db_path) = temp_db();
    let repo = SqliteOverrideRepository::new(&db_path).unwrap();

    repo.set_with_ttl(OverrideKind::DailySales, 1, 3.0, Duration::seconds(-1))
        .unwrap();
    repo.set_with_ttl(OverrideKind::DailySales, 2, 4.0, Duration::hours(1))
        .unwrap();
    repo.set(OverrideKind::DailySales, 3, 5.0).unwrap();

    assert_eq!(repo.get(OverrideKind::DailySales, 1).unwrap(), None);
    assert_eq!(repo.get(OverrideKind::DailySales, 2).unwrap(), Some(4.0));

    let listed: Vec<i64> = repo.list().unwrap().iter().map(|e| e.sku_id).collect();
    assert_eq!(listed, vec![2, 3]);

    assert_eq!(repo.purge_expired().unwrap(), 1);
    assert_eq!(repo.purge_expired().unwrap(), 0);
}

#[test]
fn test_snapshot_contains_live_entries_only() {
    let (_dir, db_path) = temp_db();
    let repo = SqliteOverrideRepository::new(&db_path).unwrap();

    repo.set(OverrideKind::StorageCost, 7, 2.5).unwrap();
    repo.set_with_ttl(OverrideKind::SellingPrice, 7, 999.0, Duration::seconds(-5))
        .unwrap();

    let snapshot = repo.snapshot().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get(OverrideKind::StorageCost, 7), Some(2.5));
    assert_eq!(snapshot.get(OverrideKind::SellingPrice, 7), None);
}

#[test]
fn test_remove_and_reject_non_finite() {
    let (_dir, db_path) = temp_db();
    let repo = SqliteOverrideRepository::new(&db_path).unwrap();

    repo.set(OverrideKind::Commission, 9, 12.0).unwrap();
    assert!(repo.remove(OverrideKind::Commission, 9).unwrap());
    assert!(!repo.remove(OverrideKind::Commission, 9).unwrap());

    let err = repo
        .set(OverrideKind::Commission, 9, f64::INFINITY)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));
}

// ==========================================
// 销速缓存
// ==========================================

#[test]
fn test_sales_cache_round_trip_and_expiry() {
    let (_dir, db_path) = temp_db();
    let cache = SalesCacheRepository::new(&db_path).unwrap();

    let rates: HashMap<i64, f64> = [(1, 0.5), (2, 1.25), (3, f64::NAN)].into_iter().collect();
    assert_eq!(cache.put_many(&rates).unwrap(), 2);

    let cached = cache.get_many(&[1, 2, 3, 4]).unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[&2], 1.25);

    let expired = SalesCacheRepository::new(&db_path)
        .unwrap()
        .with_ttl(Duration::seconds(-1));
    expired.put_many(&[(1, 9.0)].into_iter().collect()).unwrap();

    assert!(!cache.get_many(&[1]).unwrap().contains_key(&1));
    assert_eq!(cache.purge_expired().unwrap(), 1);
    assert_eq!(cache.get_many(&[2]).unwrap()[&2], 1.25);
}

// ==========================================
// 引擎参数
// ==========================================

#[test]
fn test_config_values_survive_reopen() {
    let (_dir, db_path) = temp_db();

    {
        let manager = ConfigManager::new(&db_path).unwrap();
        manager
            .set_config_value(config_keys::SLOW_MOVING_DAYS, "45")
            .unwrap();
        manager
            .set_config_value(config_keys::AD_COST_RATIO, "0.2")
            .unwrap();
    }

    let manager = ConfigManager::new(&db_path).unwrap();
    let config = manager.get_engine_config().unwrap();
    assert_eq!(config.thresholds.slow_moving_days, 45);
    assert!((config.simulation.ad_cost_ratio - 0.2).abs() < 1e-12);

    assert!(manager.reset_config_value(config_keys::SLOW_MOVING_DAYS).unwrap());
    let config = manager.get_engine_config().unwrap();
    assert_eq!(config.thresholds.slow_moving_days, 60);
}

#[test]
fn test_config_and_overrides_share_database() {
    let (_dir, db_path) = temp_db();

    let manager = ConfigManager::new(&db_path).unwrap();
    let repo = SqliteOverrideRepository::new(&db_path).unwrap();
    let cache = SalesCacheRepository::new(&db_path).unwrap();

    manager
        .set_config_value(config_keys::LOW_STOCK_GUARD_DAYS, "30")
        .unwrap();
    repo.set(OverrideKind::LowStockThreshold, 1, 10.0).unwrap();
    cache.put_many(&[(1, 0.3)].into_iter().collect()).unwrap();

    assert_eq!(
        manager.get_engine_config().unwrap().thresholds.low_stock_guard_days,
        30
    );
    assert_eq!(repo.get(OverrideKind::LowStockThreshold, 1).unwrap(), Some(10.0));
    assert_eq!(cache.get_many(&[1]).unwrap()[&1], 0.3);
}
