// ==========================================
// 仓储盈利决策引擎 - 分析 API
// ==========================================
// 职责: 装配输入（销速 + 覆写快照 + 参数）→ 调用分析编排器 → 报告信封
// 附带: 覆写管理、按动作过滤、仓库排名
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::engine_config::EngineConfig;
use crate::domain::analysis::{AnalysisReport, AnalysisResult};
use crate::domain::item::{PaidStorageRecord, SkuId, WarehouseItem};
use crate::domain::types::{Action, DataOrigin, OverrideKind};
use crate::engine::analyzer::{filter_by_action, AnalysisInput, StorageAnalyzer};
use crate::engine::warehouse_ranking::{rank_warehouses, WarehouseMetrics, WarehouseRanking};
use crate::repository::override_repo::{OverrideEntry, OverrideStore};
use crate::source::provider::SalesRateProvider;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// 一次分析请求
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub items: Vec<WarehouseItem>,
    pub storage_records: Vec<PaidStorageRecord>,
    /// 已知销速（提供时不再访问销速数据源）
    pub sales_rates: Option<HashMap<SkuId, f64>>,
    pub today: NaiveDate,
    pub target_date: NaiveDate,
}

pub struct AnalysisApi {
    config: EngineConfig,
    overrides: Arc<dyn OverrideStore>,
    provider: Arc<SalesRateProvider>,
}

impl AnalysisApi {
    pub fn new(
        config: EngineConfig,
        overrides: Arc<dyn OverrideStore>,
        provider: Arc<SalesRateProvider>,
    ) -> Self {
        Self {
            config,
            overrides,
            provider,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==========================================
    // 分析
    // ==========================================

    /// 运行分析并生成报告
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn run_analysis(&self, request: AnalysisRequest) -> ApiResult<AnalysisReport> {
        self.run_analysis_at(request, Utc::now()).await
    }

    /// 运行分析（指定生成时间,便于比对两次运行）
    pub async fn run_analysis_at(
        &self,
        request: AnalysisRequest,
        generated_at: DateTime<Utc>,
    ) -> ApiResult<AnalysisReport> {
        if request.target_date < request.today {
            return Err(ApiError::InvalidInput(format!(
                "目标日期 {} 早于分析日期 {}",
                request.target_date, request.today
            )));
        }

        let (sales_rates, data_origin) = match request.sales_rates {
            Some(rates) => (rates, DataOrigin::Live),
            None => {
                let sku_ids: Vec<SkuId> = request.items.iter().map(|i| i.sku_id).collect();
                let loaded = self.provider.load(&sku_ids).await;
                (loaded.rates, loaded.origin)
            }
        };

        let input = AnalysisInput {
            items: request.items,
            storage_records: request.storage_records,
            sales_rates,
            overrides: self.overrides.snapshot()?,
            today: request.today,
            target_date: request.target_date,
        };

        let analyzer = StorageAnalyzer::new(self.config.clone());
        let (results, summary) = analyzer.run(&input);

        let report = AnalysisReport {
            run_id: Uuid::new_v4(),
            generated_at,
            today: input.today,
            data_origin,
            results,
            summary,
        };

        info!(run_id = %report.run_id, origin = %report.data_origin, "分析报告已生成");
        Ok(report)
    }

    /// 按动作过滤报告明细
    pub fn filter_results(&self, report: &AnalysisReport, action: Action) -> Vec<AnalysisResult> {
        filter_by_action(&report.results, action)
    }

    /// 仓库排名
    pub fn rank_warehouses(&self, warehouses: &[WarehouseMetrics]) -> Vec<WarehouseRanking> {
        rank_warehouses(warehouses, &self.config.ranking)
    }

    // ==========================================
    // 覆写管理
    // ==========================================

    /// 设置覆写;ttl_hours 为空表示永久
    pub fn set_override(
        &self,
        kind: OverrideKind,
        sku_id: SkuId,
        value: f64,
        ttl_hours: Option<i64>,
    ) -> ApiResult<()> {
        match ttl_hours {
            Some(hours) if hours <= 0 => Err(ApiError::InvalidInput(format!(
                "有效期必须为正数小时: {}",
                hours
            ))),
            Some(hours) => {
                let ttl = Duration::try_hours(hours).ok_or_else(|| {
                    ApiError::InvalidInput(format!("有效期超出范围: {} 小时", hours))
                })?;
                Ok(self.overrides.set_with_ttl(kind, sku_id, value, ttl)?)
            }
            None => Ok(self.overrides.set(kind, sku_id, value)?),
        }
    }

    pub fn remove_override(&self, kind: OverrideKind, sku_id: SkuId) -> ApiResult<()> {
        if self.overrides.remove(kind, sku_id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("覆写 {}/{}", kind, sku_id)))
        }
    }

    pub fn list_overrides(&self) -> ApiResult<Vec<OverrideEntry>> {
        Ok(self.overrides.list()?)
    }

    pub fn purge_expired_overrides(&self) -> ApiResult<usize> {
        Ok(self.overrides.purge_expired()?)
    }
}
