// ==========================================
// 仓储盈利决策引擎 - 销速数据源
// ==========================================
// 职责: 按 SKU 批量获取日销量（件/天）
// 红线: 数据源只返回它知道的 SKU,不补默认值
// ==========================================

use crate::domain::item::SkuId;
use crate::importer::snapshot_loader::SnapshotLoader;
use crate::source::error::{SourceError, SourceResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// 销速数据源接口
#[async_trait]
pub trait SalesRateSource: Send + Sync {
    /// 数据源名称（日志用）
    fn name(&self) -> &str;

    /// 批量获取日销量
    async fn fetch_batch(&self, sku_ids: &[SkuId]) -> SourceResult<HashMap<SkuId, f64>>;
}

// ==========================================
// FileSalesRateSource - 销速报表文件
// ==========================================
pub struct FileSalesRateSource {
    path: PathBuf,
}

impl FileSalesRateSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SalesRateSource for FileSalesRateSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_batch(&self, sku_ids: &[SkuId]) -> SourceResult<HashMap<SkuId, f64>> {
        let path = self.path.clone();
        let all = tokio::task::spawn_blocking(move || SnapshotLoader::new().load_sales_rates(path))
            .await
            .map_err(|e| SourceError::Unavailable {
                source_name: "file".to_string(),
                message: e.to_string(),
            })??;

        Ok(sku_ids
            .iter()
            .filter_map(|sku| all.get(sku).map(|v| (*sku, *v)))
            .collect())
    }
}
