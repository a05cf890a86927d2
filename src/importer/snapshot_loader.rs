// ==========================================
// 仓储盈利决策引擎 - 快照加载器
// ==========================================
// 流程: 文件解析 → 字段映射
// ==========================================

use crate::domain::item::{PaidStorageRecord, SkuId, WarehouseItem};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

pub struct SnapshotLoader {
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl SnapshotLoader {
    pub fn new() -> Self {
        Self {
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    /// 加载库存快照
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_items<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<WarehouseItem>> {
        let rows = self.parser.parse(path.as_ref())?;
        let items = self.mapper.map_items(&rows)?;
        info!(rows = rows.len(), items = items.len(), "库存快照加载完成");
        Ok(items)
    }

    /// 加载付费仓储记录
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_storage_records<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> ImportResult<Vec<PaidStorageRecord>> {
        let rows = self.parser.parse(path.as_ref())?;
        let records = self.mapper.map_storage_records(&rows)?;
        info!(records = records.len(), "付费仓储记录加载完成");
        Ok(records)
    }

    /// 加载销速表
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_sales_rates<P: AsRef<Path>>(&self, path: P) -> ImportResult<HashMap<SkuId, f64>> {
        let rows = self.parser.parse(path.as_ref())?;
        let rates = self.mapper.map_sales_rates(&rows)?;
        info!(skus = rates.len(), "销速表加载完成");
        Ok(rates)
    }
}

impl Default for SnapshotLoader {
    fn default() -> Self {
        Self::new()
    }
}
