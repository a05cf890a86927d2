// ==========================================
// 仓储盈利决策引擎 - 界面文案
// ==========================================
// 文案表: locales/zh-CN.yml（缺省）, locales/en.yml
// 红线: 引擎输出的 reason JSON 只含稳定代码,不经过本模块翻译
// ==========================================

use crate::domain::types::{Action, DataOrigin, StockLevel};

/// 按全局语言取文案
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 按指定语言取文案,不改变全局语言; 未知语言回退中文
pub fn t_locale(key: &str, locale: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 带占位符的文案,占位符写作 `%{name}`
///
/// ```no_run
/// use storage_profit_engine::i18n::t_args;
/// let msg = t_args("cli.report_saved", "en", &[("path", "/tmp/report.json")]);
/// ```
pub fn t_args(key: &str, locale: &str, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(t_locale(key, locale), |text, (name, value)| {
            text.replace(&format!("%{{{}}}", name), value)
        })
}

pub fn action_label(action: Action, locale: &str) -> String {
    t_locale(&format!("action.{}", action.code()), locale)
}

pub fn stock_level_label(level: StockLevel, locale: &str) -> String {
    t_locale(&format!("stock_level.{}", level.code()), locale)
}

pub fn origin_label(origin: DataOrigin, locale: &str) -> String {
    t_locale(&format!("origin.{}", origin.code()), locale)
}
