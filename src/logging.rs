// ==========================================
// 仓储盈利决策引擎 - 日志初始化
// ==========================================
// 日志一律写 stderr,stdout 只留给报告输出（JSON / 表格）
// 级别: RUST_LOG,缺省 info
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 人读格式
///
/// ```no_run
/// // RUST_LOG=storage_profit_engine::engine=debug storage-profit analyze ...
/// storage_profit_engine::logging::init();
/// ```
pub fn init() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 每行一个 JSON 事件,带当前 span 字段
pub fn init_json() {
    let _ = fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 测试用: debug 级别,输出交给 libtest 捕获,可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
