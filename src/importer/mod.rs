// ==========================================
// 仓储盈利决策引擎 - 导入层
// ==========================================
// 职责: 外部报表 → 库存快照 / 付费仓储 / 销速
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod snapshot_loader;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
pub use snapshot_loader::SnapshotLoader;
