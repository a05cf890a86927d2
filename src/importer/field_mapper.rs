// ==========================================
// 仓储盈利决策引擎 - 字段映射器
// ==========================================
// 职责: 原始行 → 库存快照 / 付费仓储记录 / 销速
// 列名: 英文接口字段、俄文报表列、中文列三套别名
// 红线: SKU 缺失即报错;同一 SKU 多行按仓库合并
// ==========================================

use crate::domain::item::{PaidStorageRecord, SkuId, WarehouseItem};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawRow;
use chrono::{DateTime, NaiveDate};
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// 标准字段 → 列名别名
// ==========================================
pub mod fields {
    pub const SKU_ID: &[&str] = &["nmId", "nm_id", "sku_id", "sku", "Артикул WB", "SKU", "商品编号"];
    pub const VENDOR_CODE: &[&str] = &[
        "vendorCode",
        "supplierArticle",
        "vendor_code",
        "Артикул продавца",
        "商家货号",
    ];
    pub const BRAND: &[&str] = &["brand", "Бренд", "品牌"];
    pub const CATEGORY: &[&str] = &["subjectName", "subject", "category", "Предмет", "类目"];
    pub const SIZE: &[&str] = &["techSize", "size", "Размер", "尺码"];
    pub const QUANTITY: &[&str] = &["quantity", "quantityFull", "Количество", "Остаток", "库存", "数量"];
    pub const WAREHOUSE: &[&str] = &["warehouseName", "warehouse", "Склад", "仓库"];
    pub const PRICE: &[&str] = &["price", "Price", "Цена", "售价", "价格"];
    pub const VOLUME: &[&str] = &["volume", "Объем", "体积"];
    pub const STORAGE_COST: &[&str] = &[
        "warehousePrice",
        "storage_cost",
        "Сумма хранения",
        "仓储费",
    ];
    pub const DATE: &[&str] = &["date", "Дата", "日期"];
    pub const DAILY_SALES: &[&str] = &["daily_sales", "dailySales", "Продаж в день", "日销量"];
}

pub struct FieldMapper;

impl FieldMapper {
    /// 库存行 → 库存快照
    ///
    /// 同一 SKU 的多行合并: 有仓库名时按仓库累加,否则直接累加数量;
    /// 描述字段取首个非空值;输出顺序为 SKU 首次出现的顺序
    pub fn map_items(&self, rows: &[RawRow]) -> ImportResult<Vec<WarehouseItem>> {
        let mut order: Vec<SkuId> = Vec::new();
        let mut items: HashMap<SkuId, WarehouseItem> = HashMap::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let sku_id = self.parse_sku(row, row_number)?;
            let quantity = self.parse_quantity(row, row_number)?;
            let price = self.parse_non_negative(row, fields::PRICE, row_number)?;

            let item = items.entry(sku_id).or_insert_with(|| {
                order.push(sku_id);
                WarehouseItem::new(sku_id, 0, 0.0)
            });

            fill(&mut item.vendor_code, self.get_string(row, fields::VENDOR_CODE));
            fill(&mut item.brand, self.get_string(row, fields::BRAND));
            fill(&mut item.category, self.get_string(row, fields::CATEGORY));
            fill(&mut item.size, self.get_string(row, fields::SIZE));
            if item.volume.is_none() {
                item.volume = self.parse_non_negative(row, fields::VOLUME, row_number)?;
            }
            if let Some(p) = price {
                if item.price <= 0.0 {
                    item.price = p;
                }
            }

            match self.get_string(row, fields::WAREHOUSE) {
                Some(warehouse) => item.add_warehouse_stock(&warehouse, quantity),
                None => item.quantity = item.quantity.saturating_add(quantity),
            }
        }

        debug!(rows = rows.len(), skus = order.len(), "库存行映射完成");
        Ok(order
            .into_iter()
            .filter_map(|sku| items.remove(&sku))
            .collect())
    }

    /// 付费仓储行 → 记录
    pub fn map_storage_records(&self, rows: &[RawRow]) -> ImportResult<Vec<PaidStorageRecord>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                let row_number = idx + 1;
                let sku_id = self.parse_sku(row, row_number)?;
                let cost = self
                    .parse_f64(row, fields::STORAGE_COST, row_number)?
                    .ok_or_else(|| ImportError::TypeConversionError {
                        row: row_number,
                        field: fields::STORAGE_COST[0].to_string(),
                        message: "仓储费为空".to_string(),
                    })?;

                Ok(PaidStorageRecord {
                    sku_id,
                    cost,
                    date: self.parse_date(row, fields::DATE, row_number)?,
                    warehouse_name: self.get_string(row, fields::WAREHOUSE),
                })
            })
            .collect()
    }

    /// 销速行 → SKU 日销量（同 SKU 多行累加）
    pub fn map_sales_rates(&self, rows: &[RawRow]) -> ImportResult<HashMap<SkuId, f64>> {
        let mut rates: HashMap<SkuId, f64> = HashMap::new();
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let sku_id = self.parse_sku(row, row_number)?;
            if let Some(v) = self.parse_non_negative(row, fields::DAILY_SALES, row_number)? {
                *rates.entry(sku_id).or_insert(0.0) += v;
            }
        }
        Ok(rates)
    }

    /// 提取字符串字段,按别名顺序取首个非空值
    fn get_string(&self, row: &RawRow, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            row.get(*alias)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string())
        })
    }

    fn parse_sku(&self, row: &RawRow, row_number: usize) -> ImportResult<SkuId> {
        let raw = self
            .get_string(row, fields::SKU_ID)
            .ok_or(ImportError::PrimaryKeyMissing(row_number))?;

        if let Ok(v) = raw.parse::<SkuId>() {
            return Ok(v);
        }

        // Excel 数字单元格可能带小数部分
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as SkuId),
            _ => Err(ImportError::TypeConversionError {
                row: row_number,
                field: fields::SKU_ID[0].to_string(),
                message: format!("无法解析为 SKU 编号: {}", raw),
            }),
        }
    }

    fn parse_f64(&self, row: &RawRow, aliases: &[&str], row_number: usize) -> ImportResult<Option<f64>> {
        match self.get_string(row, aliases) {
            None => Ok(None),
            Some(value) => value
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| ImportError::TypeConversionError {
                    row: row_number,
                    field: aliases[0].to_string(),
                    message: format!("无法解析为浮点数: {}", value),
                }),
        }
    }

    fn parse_non_negative(
        &self,
        row: &RawRow,
        aliases: &[&str],
        row_number: usize,
    ) -> ImportResult<Option<f64>> {
        match self.parse_f64(row, aliases, row_number)? {
            Some(v) if v < 0.0 => Err(ImportError::ValueRangeError {
                row: row_number,
                field: aliases[0].to_string(),
                value: v,
                min: 0.0,
                max: f64::MAX,
            }),
            other => Ok(other),
        }
    }

    fn parse_quantity(&self, row: &RawRow, row_number: usize) -> ImportResult<u32> {
        let value = self
            .parse_non_negative(row, fields::QUANTITY, row_number)?
            .unwrap_or(0.0);
        if value > u32::MAX as f64 {
            return Err(ImportError::ValueRangeError {
                row: row_number,
                field: fields::QUANTITY[0].to_string(),
                value,
                min: 0.0,
                max: u32::MAX as f64,
            });
        }
        Ok(value.round() as u32)
    }

    /// 解析日期（YYYY-MM-DD / YYYYMMDD / RFC 3339）
    fn parse_date(
        &self,
        row: &RawRow,
        aliases: &[&str],
        row_number: usize,
    ) -> ImportResult<Option<NaiveDate>> {
        match self.get_string(row, aliases) {
            None => Ok(None),
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(&value, "%Y%m%d"))
                .ok()
                .or_else(|| {
                    DateTime::parse_from_rfc3339(&value)
                        .ok()
                        .map(|dt| dt.date_naive())
                })
                .map(Some)
                .ok_or_else(|| ImportError::DateFormatError {
                    row: row_number,
                    field: aliases[0].to_string(),
                    value: value.clone(),
                }),
        }
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}
