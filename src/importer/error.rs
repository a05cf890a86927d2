// ==========================================
// 仓储盈利决策引擎 - 报表导入错误
// ==========================================
// 行号从 1 开始,按数据行计（不含表头）
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件 =====
    #[error("报表文件不存在: {0}")]
    FileNotFound(String),

    #[error("不支持的报表格式 '{0}'（支持 .csv / .xlsx）")]
    UnsupportedFormat(String),

    #[error("报表读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 报表解析失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel 报表解析失败: {0}")]
    ExcelParseError(String),

    // ===== 行级 =====
    #[error("第 {0} 行缺少 SKU 编号")]
    PrimaryKeyMissing(usize),

    #[error("第 {row} 行字段 {field} 无法解析: {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("第 {row} 行字段 {field} 日期无法识别（YYYY-MM-DD / YYYYMMDD / RFC 3339）: {value}")]
    DateFormatError {
        row: usize,
        field: String,
        value: String,
    },

    #[error("第 {row} 行字段 {field} = {value} 超出范围 [{min}, {max}]")]
    ValueRangeError {
        row: usize,
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_context_in_message() {
        let err = ImportError::ValueRangeError {
            row: 3,
            field: "quantity".to_string(),
            value: -2.0,
            min: 0.0,
            max: 10.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("第 3 行"));
        assert!(msg.contains("quantity"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ImportError = io.into();
        assert!(matches!(err, ImportError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
