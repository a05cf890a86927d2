// ==========================================
// 仓储盈利决策引擎 - 命令行入口
// ==========================================
// 用法:
//   storage-profit analyze --stock stock.csv --sales sales.csv --target-date 2024-07-01
//   storage-profit analyze --stock stock.xlsx --action liquidate --format json
//   storage-profit override set --kind discount --sku 1001 --value 20 --ttl-hours 72
//   storage-profit override list
//   storage-profit config set thresholds.slow_moving_days 45
// ==========================================

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use storage_profit_engine::api::{AnalysisApi, AnalysisRequest};
use storage_profit_engine::config::{config_keys, ConfigManager};
use storage_profit_engine::db::get_default_db_path;
use storage_profit_engine::domain::{AnalysisReport, AnalysisResult, AnalysisSummary};
use storage_profit_engine::i18n::{
    action_label, origin_label, stock_level_label, t, t_args, t_locale,
};
use storage_profit_engine::importer::SnapshotLoader;
use storage_profit_engine::repository::{OverrideStore, SalesCacheRepository, SqliteOverrideRepository};
use storage_profit_engine::source::{FileSalesRateSource, SalesRateProvider, SalesRateSource};
use storage_profit_engine::{logging, Action, OverrideKind};
use tracing::info;

#[derive(Parser)]
#[command(name = "storage-profit")]
#[command(about = "仓储盈利决策引擎 - 按 SKU 给出保持/打折/清仓/广告建议", long_about = None)]
#[command(version)]
struct Cli {
    /// 数据库路径（默认: STORAGE_PROFIT_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 输出 JSON 格式日志
    #[arg(long, global = true, default_value = "false")]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行仓储盈利分析
    Analyze {
        /// 库存快照文件（CSV/XLSX）
        #[arg(short, long)]
        stock: String,

        /// 付费仓储报表（CSV/XLSX）
        #[arg(long)]
        storage: Option<String>,

        /// 销速报表（CSV/XLSX）,不可用时回退到缓存/演示数据
        #[arg(long)]
        sales: Option<String>,

        /// 分析日期 (YYYY-MM-DD,默认今天)
        #[arg(long)]
        today: Option<String>,

        /// 断货统计截止日 (YYYY-MM-DD,默认 today + 30 天)
        #[arg(long)]
        target_date: Option<String>,

        /// 只输出指定动作 (keep/discount/liquidate/advertise)
        #[arg(short, long)]
        action: Option<String>,

        /// 输出格式
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// 报告输出文件（JSON）
        #[arg(short, long)]
        output: Option<String>,

        /// 表格语言 (zh-CN / en)
        #[arg(long, default_value = "zh-CN")]
        locale: String,
    },

    /// 管理 SKU 覆写
    Override {
        #[command(subcommand)]
        command: OverrideCommands,
    },

    /// 查看/修改引擎参数
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum OverrideCommands {
    /// 设置覆写
    Set {
        /// 覆写类型 (cost-price, selling-price, daily-sales, storage-cost,
        /// logistics-cost, commission, low-stock-threshold, discount)
        #[arg(short, long)]
        kind: String,

        #[arg(short, long)]
        sku: i64,

        #[arg(short, long, allow_negative_numbers = true)]
        value: f64,

        /// 有效期（小时）,不填为永久
        #[arg(long)]
        ttl_hours: Option<i64>,
    },
    /// 删除覆写
    Remove {
        #[arg(short, long)]
        kind: String,

        #[arg(short, long)]
        sku: i64,
    },
    /// 列出有效覆写
    List,
    /// 清理过期覆写
    Purge,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// 打印生效参数（JSON）
    Show,
    /// 列出全部可配置键
    Keys,
    /// 设置参数
    Set { key: String, value: String },
    /// 恢复参数默认值
    Reset { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    info!(db_path = %db_path, version = storage_profit_engine::VERSION, "启动");

    match cli.command {
        Commands::Analyze {
            stock,
            storage,
            sales,
            today,
            target_date,
            action,
            format,
            output,
            locale,
        } => {
            let today = match today {
                Some(s) => parse_date(&s)?,
                None => Local::now().date_naive(),
            };
            let target_date = match target_date {
                Some(s) => parse_date(&s)?,
                None => today + Duration::days(30),
            };
            let action_filter = action
                .map(|a| a.parse::<Action>().map_err(anyhow::Error::msg))
                .transpose()?;

            let loader = SnapshotLoader::new();
            let items = loader
                .load_items(&stock)
                .with_context(|| format!("读取库存快照失败: {}", stock))?;
            let storage_records = match storage {
                Some(path) => loader
                    .load_storage_records(&path)
                    .with_context(|| format!("读取付费仓储报表失败: {}", path))?,
                None => Vec::new(),
            };

            let api = build_api(&db_path, sales)?;
            let mut report = api
                .run_analysis(AnalysisRequest {
                    items,
                    storage_records,
                    sales_rates: None,
                    today,
                    target_date,
                })
                .await?;

            if let Some(action) = action_filter {
                report.results = api.filter_results(&report, action);
            }

            if let Some(path) = output {
                std::fs::write(&path, serde_json::to_string_pretty(&report)?)
                    .with_context(|| format!("写入报告失败: {}", path))?;
                eprintln!(
                    "{}",
                    t_args("cli.report_saved", &locale, &[("path", path.as_str())])
                );
            }

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Table => print_report(&report, &locale),
            }
        }

        Commands::Override { command } => {
            let api = build_api(&db_path, None)?;
            match command {
                OverrideCommands::Set {
                    kind,
                    sku,
                    value,
                    ttl_hours,
                } => {
                    api.set_override(parse_kind(&kind)?, sku, value, ttl_hours)?;
                    println!("{}", t("cli.override_saved"));
                }
                OverrideCommands::Remove { kind, sku } => {
                    api.remove_override(parse_kind(&kind)?, sku)?;
                    println!("{}", t("cli.override_removed"));
                }
                OverrideCommands::List => {
                    println!("{}", serde_json::to_string_pretty(&api.list_overrides()?)?);
                }
                OverrideCommands::Purge => {
                    let count = api.purge_expired_overrides()?;
                    println!(
                        "{}",
                        t_args(
                            "cli.overrides_purged",
                            &rust_i18n::locale(),
                            &[("count", &count.to_string())]
                        )
                    );
                }
            }
        }

        Commands::Config { command } => {
            let manager = ConfigManager::new(&db_path)?;
            match command {
                ConfigCommands::Show => {
                    println!("{}", serde_json::to_string_pretty(&manager.get_engine_config()?)?);
                }
                ConfigCommands::Keys => {
                    for key in config_keys::all() {
                        println!("{}", key);
                    }
                }
                ConfigCommands::Set { key, value } => {
                    manager.set_config_value(&key, &value)?;
                    println!("{}", t("cli.config_saved"));
                }
                ConfigCommands::Reset { key } => {
                    manager.reset_config_value(&key)?;
                    println!("{}", t("cli.config_saved"));
                }
            }
        }
    }

    Ok(())
}

/// 装配 API: 参数取自 config_kv,覆写与销速缓存共用同一数据库
fn build_api(db_path: &str, sales: Option<String>) -> Result<AnalysisApi> {
    let config = ConfigManager::new(db_path)?.get_engine_config()?;
    let overrides: Arc<dyn OverrideStore> = Arc::new(SqliteOverrideRepository::new(db_path)?);
    let source = sales.map(|path| Arc::new(FileSalesRateSource::new(path)) as Arc<dyn SalesRateSource>);
    let cache = Arc::new(SalesCacheRepository::new(db_path)?);
    let provider = Arc::new(SalesRateProvider::new(source, Some(cache)));
    Ok(AnalysisApi::new(config, overrides, provider))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("日期格式错误 (期望 YYYY-MM-DD): {}", s))
}

fn parse_kind(s: &str) -> Result<OverrideKind> {
    s.parse::<OverrideKind>().map_err(anyhow::Error::msg)
}

// ==========================================
// 表格输出
// ==========================================

fn print_report(report: &AnalysisReport, locale: &str) {
    println!(
        "{}",
        t_args(
            "cli.data_origin",
            locale,
            &[("origin", &origin_label(report.data_origin, locale))]
        )
    );

    if report.results.is_empty() {
        println!("{}", t_locale("cli.no_results", locale));
    } else {
        print_results(&report.results, locale);
    }
    print_summary(&report.summary, locale);
}

fn print_results(results: &[AnalysisResult], locale: &str) {
    let headers: Vec<String> = [
        "sku", "stock", "days", "margin", "net_profit", "action", "discount", "stock_level", "savings",
    ]
    .iter()
    .map(|k| t_locale(&format!("table.{}", k), locale))
    .collect();

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.sku_id.to_string(),
                format!("{:.0}", r.metrics.current_stock),
                r.days_of_inventory().to_string(),
                format!("{:.1}", r.metrics.profit_margin_percentage),
                format!("{:.2}", r.metrics.net_profit),
                action_label(r.action, locale),
                format!("{:.0}", r.recommended_discount),
                stock_level_label(r.stock_level, locale),
                format!("{:.2}", r.savings_with_discount()),
            ]
        })
        .collect();

    let widths: Vec<usize> = (0..headers.len())
        .map(|col| {
            rows.iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(&headers));
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    for row in &rows {
        println!("{}", line(row));
    }
}

fn print_summary(summary: &AnalysisSummary, locale: &str) {
    println!();
    println!("{}: {}", t_locale("summary.items", locale), summary.item_count);
    for action in Action::ALL {
        println!("  {}: {}", action_label(action, locale), summary.count_for(action));
    }
    println!("{}: {:.2}", t_locale("summary.storage_cost", locale), summary.total_storage_cost);
    println!("{}: {:.2}", t_locale("summary.net_profit", locale), summary.total_net_profit);
    println!("{}: {:.2}", t_locale("summary.potential_savings", locale), summary.potential_savings);
    println!(
        "{}: {}",
        t_args(
            "summary.stockout",
            locale,
            &[("date", &summary.target_date.to_string())]
        ),
        summary.stockout_before_target_count
    );
}
