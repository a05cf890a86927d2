// ==========================================
// 仓储盈利决策引擎 - SKU 覆写快照
// ==========================================
// 职责: 一次分析使用的覆写只读快照
// 红线: 引擎只读,宿主在调用前完成 copy-on-read
// ==========================================

use crate::domain::item::SkuId;
use crate::domain::types::OverrideKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 覆写快照
///
/// 内部按 (kind → sku → value) 组织;非有限值（NaN/∞）视为缺失
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateOverrides {
    values: BTreeMap<OverrideKind, HashMap<SkuId, f64>>,
}

impl RateOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置（测试/构建快照用）
    pub fn with(mut self, kind: OverrideKind, sku_id: SkuId, value: f64) -> Self {
        self.insert(kind, sku_id, value);
        self
    }

    pub fn insert(&mut self, kind: OverrideKind, sku_id: SkuId, value: f64) {
        self.values.entry(kind).or_default().insert(sku_id, value);
    }

    /// 读取覆写值（仅返回有限值）
    pub fn get(&self, kind: OverrideKind, sku_id: SkuId) -> Option<f64> {
        self.values
            .get(&kind)
            .and_then(|m| m.get(&sku_id))
            .copied()
            .filter(|v| v.is_finite())
    }

    /// 覆写条目总数
    pub fn len(&self) -> usize {
        self.values.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 展开为 (kind, sku, value) 列表,按 kind/sku 排序
    pub fn entries(&self) -> Vec<(OverrideKind, SkuId, f64)> {
        let mut out: Vec<(OverrideKind, SkuId, f64)> = self
            .values
            .iter()
            .flat_map(|(kind, m)| m.iter().map(move |(sku, v)| (*kind, *sku, *v)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        out
    }
}
