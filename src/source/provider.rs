// ==========================================
// 仓储盈利决策引擎 - 销速提供器
// ==========================================
// 职责: 实时数据源 → 未过期缓存 → 演示数据 的回退链
// 输出: SalesRates（销速 + 数据来源标记）
// 红线: 从不失败;回退必须 warn 并在 origin 上体现
// ==========================================

use crate::domain::item::SkuId;
use crate::domain::types::DataOrigin;
use crate::repository::sales_cache_repo::SalesCacheRepository;
use crate::source::error::{SourceError, SourceResult};
use crate::source::sales_rate_source::SalesRateSource;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// 每批 SKU 数量
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// 实时数据源整体超时
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// 销速及其来源
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRates {
    pub rates: HashMap<SkuId, f64>,
    pub origin: DataOrigin,
}

/// 演示销速（确定性,0.1 ~ 2.0 件/天）
pub fn demo_sales_rate(sku_id: SkuId) -> f64 {
    (sku_id.rem_euclid(20) as f64 + 1.0) / 10.0
}

pub struct SalesRateProvider {
    source: Option<Arc<dyn SalesRateSource>>,
    cache: Option<Arc<SalesCacheRepository>>,
    batch_size: usize,
    timeout: Duration,
}

impl SalesRateProvider {
    pub fn new(
        source: Option<Arc<dyn SalesRateSource>>,
        cache: Option<Arc<SalesCacheRepository>>,
    ) -> Self {
        Self {
            source,
            cache,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 加载销速（从不失败）
    #[instrument(skip(self, sku_ids), fields(skus = sku_ids.len()))]
    pub async fn load(&self, sku_ids: &[SkuId]) -> SalesRates {
        // 1. 实时数据源
        if let Some(source) = &self.source {
            match self.fetch_live(source.as_ref(), sku_ids).await {
                Ok(rates) => {
                    self.store_in_cache(&rates).await;
                    info!(source = source.name(), found = rates.len(), "实时销速获取成功");
                    return SalesRates {
                        rates,
                        origin: DataOrigin::Live,
                    };
                }
                Err(e) => warn!(source = source.name(), error = %e, "实时销速不可用,尝试缓存"),
            }
        }

        // 2. 未过期缓存
        if let Some(cache) = &self.cache {
            match Self::read_cache(Arc::clone(cache), sku_ids.to_vec()).await {
                Ok(cached) if !cached.is_empty() => {
                    let mut rates = cached;
                    let missing = sku_ids.iter().filter(|s| !rates.contains_key(*s)).count();
                    if missing > 0 {
                        warn!(missing, "缓存未覆盖全部 SKU,缺失部分使用演示销速");
                    }
                    for sku_id in sku_ids {
                        rates.entry(*sku_id).or_insert_with(|| demo_sales_rate(*sku_id));
                    }
                    return SalesRates {
                        rates,
                        origin: DataOrigin::Cached,
                    };
                }
                Ok(_) => debug!("销速缓存为空"),
                Err(e) => warn!(error = %e, "销速缓存读取失败"),
            }
        }

        // 3. 演示数据
        warn!("使用演示销速");
        SalesRates {
            rates: sku_ids.iter().map(|s| (*s, demo_sales_rate(*s))).collect(),
            origin: DataOrigin::Demo,
        }
    }

    /// 分批并发获取,任一批失败即整体失败
    async fn fetch_live(
        &self,
        source: &dyn SalesRateSource,
        sku_ids: &[SkuId],
    ) -> SourceResult<HashMap<SkuId, f64>> {
        let batches = sku_ids.chunks(self.batch_size).map(|chunk| source.fetch_batch(chunk));

        let results = tokio::time::timeout(self.timeout, join_all(batches))
            .await
            .map_err(|_| SourceError::Timeout {
                source_name: source.name().to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })?;

        let mut rates = HashMap::new();
        for result in results {
            for (sku_id, rate) in result? {
                if rate.is_finite() && rate >= 0.0 {
                    rates.insert(sku_id, rate);
                }
            }
        }
        Ok(rates)
    }

    // SQLite 读写是阻塞调用,放到 blocking 线程池

    async fn read_cache(
        cache: Arc<SalesCacheRepository>,
        sku_ids: Vec<SkuId>,
    ) -> SourceResult<HashMap<SkuId, f64>> {
        let cached = tokio::task::spawn_blocking(move || cache.get_many(&sku_ids))
            .await
            .map_err(|e| SourceError::Unavailable {
                source_name: "cache".to_string(),
                message: e.to_string(),
            })??;
        Ok(cached)
    }

    async fn store_in_cache(&self, rates: &HashMap<SkuId, f64>) {
        let Some(cache) = self.cache.clone() else {
            return;
        };
        let rates = rates.clone();

        match tokio::task::spawn_blocking(move || cache.put_many(&rates)).await {
            Ok(Ok(written)) => debug!(written, "销速缓存已更新"),
            Ok(Err(e)) => warn!(error = %e, "销速缓存写入失败"),
            Err(e) => warn!(error = %e, "销速缓存写入任务异常"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_rate_is_deterministic_and_bounded() {
        assert_eq!(demo_sales_rate(40), 0.1);
        assert_eq!(demo_sales_rate(19), 2.0);
        assert_eq!(demo_sales_rate(-1), demo_sales_rate(-1));
        assert!((0.1..=2.0).contains(&demo_sales_rate(-7)));
    }

    #[tokio::test]
    async fn test_no_source_no_cache_falls_back_to_demo() {
        let provider = SalesRateProvider::new(None, None);
        let rates = provider.load(&[1, 2]).await;
        assert_eq!(rates.origin, DataOrigin::Demo);
        assert_eq!(rates.rates[&1], demo_sales_rate(1));
    }
}
