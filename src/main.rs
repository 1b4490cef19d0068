// ==========================================
// 窗帘软装报价系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 用途: 运维入口(价目表导入 / 网格查询 / 定价)
// ==========================================

use anyhow::{bail, Context, Result};
use curtain_quote::api::{GridApi, QuoteApi};
use curtain_quote::config::ConfigManager;
use curtain_quote::domain::types::MeasurementUnit;
use curtain_quote::repository::{PricingGridRepository, WindowSummaryRepository};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 默认数据库路径(用户数据目录下)
fn get_default_db_path() -> Result<String> {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join("curtain-quote");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("无法创建数据目录: {}", dir.display()))?;
    Ok(dir.join("quote.db").display().to_string())
}

fn open_database(db_path: &str) -> Result<Arc<Mutex<Connection>>> {
    let conn = curtain_quote::db::open_sqlite_connection(db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    curtain_quote::db::init_schema(&conn).context("schema 初始化失败")?;
    curtain_quote::db::warn_on_schema_mismatch(&conn);
    Ok(Arc::new(Mutex::new(conn)))
}

fn print_usage() {
    eprintln!("用法:");
    eprintln!("  curtain-quote import <文件.csv|.xlsx> <网格名称> [mm|cm]");
    eprintln!("  curtain-quote list");
    eprintln!("  curtain-quote price <网格名称> <宽度cm> <帘高cm>");
    eprintln!("  curtain-quote show <window_id>");
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    curtain_quote::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 报价计算核心", curtain_quote::APP_NAME);
    tracing::info!("系统版本: {}", curtain_quote::VERSION);
    tracing::info!("==================================================");

    // 数据库
    let db_path = std::env::var("CURTAIN_QUOTE_DB").map_or_else(|_| get_default_db_path(), Ok)?;
    tracing::info!("使用数据库: {}", db_path);
    let conn = open_database(&db_path)?;

    // 装配仓储与 API
    let grid_repo = Arc::new(PricingGridRepository::from_connection(conn.clone()));
    let summary_repo = Arc::new(WindowSummaryRepository::from_connection(conn.clone()));
    let config = ConfigManager::from_connection(conn.clone())
        .map_err(|e| anyhow::anyhow!("配置管理器初始化失败: {}", e))?;
    let grid_api = GridApi::new(grid_repo, &config);
    let quote_api = QuoteApi::new(summary_repo);

    // 命令分发
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("import") => {
            let [_, file, name, rest @ ..] = args.as_slice() else {
                print_usage();
                bail!("import 需要 <文件> <网格名称>");
            };
            let unit = match rest.first() {
                Some(raw) => Some(
                    MeasurementUnit::from_str(raw)
                        .with_context(|| format!("无效单位: {}（期望 mm/cm）", raw))?,
                ),
                None => None,
            };
            let outcome = grid_api.import_grid(file, name, unit).await?;
            println!(
                "导入完成: {} (grid_id={}, 单位={}{}, {}列×{}行)",
                outcome.name,
                outcome.grid_id,
                outcome.unit,
                if outcome.unit_inferred { ", 推断" } else { "" },
                outcome.width_count,
                outcome.drop_count
            );
        }
        Some("list") => {
            let grids = grid_api.list_grids(false)?;
            if grids.is_empty() {
                println!("(无网格)");
            }
            for grid in grids {
                println!(
                    "{}  {}  unit={}",
                    grid.grid_id,
                    grid.name,
                    grid.unit.map(|u| u.to_db_str()).unwrap_or("?")
                );
            }
        }
        Some("price") => {
            let [_, name, width, drop] = args.as_slice() else {
                print_usage();
                bail!("price 需要 <网格名称> <宽度cm> <帘高cm>");
            };
            let width_cm: f64 = width.parse().context("宽度必须是数值(cm)")?;
            let drop_cm: f64 = drop.parse().context("帘高必须是数值(cm)")?;
            let price = grid_api.price_window(name, width_cm, drop_cm)?;
            println!("{:.2}", price);
        }
        Some("show") => {
            let [_, window_id] = args.as_slice() else {
                print_usage();
                bail!("show 需要 <window_id>");
            };
            let summary = quote_api.get_window_summary(window_id)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            print_usage();
        }
    }

    Ok(())
}
