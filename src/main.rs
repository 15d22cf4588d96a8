//! stock-ranking: A股实时排行看板。
//!
//! Usage:
//!   stock-ranking [--data-dir DIR] <COMMAND>
//!
//! Commands:
//!   serve     启动本地排行代理（/api/real-time, /api/range-data）
//!   watch     终端看板，交易时段自动刷新
//!   export    按保存的列/排序/过滤配置导出 CSV
//!   columns   列显示与顺序
//!   sort      多列排序
//!   filters   数值范围与多选过滤

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use ranking_lib::commands::columns_cmd::{self, ColumnsAction};
use ranking_lib::commands::export_cmd::{self, ExportArgs};
use ranking_lib::commands::filters_cmd::{self, FiltersAction};
use ranking_lib::commands::serve_cmd;
use ranking_lib::commands::sort_cmd::{self, SortAction};
use ranking_lib::commands::watch_cmd::{self, WatchArgs};
use ranking_lib::AppState;

#[derive(Parser, Debug)]
#[command(name = "stock-ranking")]
#[command(about = "A股实时排行看板：多列排序、过滤、导出与交易时段自动刷新")]
#[command(version)]
struct Cli {
    /// 数据目录（SQLite 配置与缓存）
    #[arg(long, global = true, env = "STOCK_RANKING_DATA_DIR", default_value = ".stock-ranking")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动本地排行代理
    Serve {
        /// 监听地址，默认取设置中的 proxy_bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// 终端看板
    Watch(WatchArgs),
    /// 导出 CSV
    Export(ExportArgs),
    /// 列配置
    Columns {
        #[command(subcommand)]
        action: ColumnsAction,
    },
    /// 排序配置
    Sort {
        #[command(subcommand)]
        action: SortAction,
    },
    /// 过滤配置
    Filters {
        #[command(subcommand)]
        action: FiltersAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let state = AppState::open(cli.data_dir)?;

    match cli.command {
        Command::Serve { bind } => serve_cmd::serve(&state, bind).await,
        Command::Watch(args) => watch_cmd::watch(&state, args).await,
        Command::Export(args) => export_cmd::export(&state, args).await,
        Command::Columns { action } => columns_cmd::run(&state, action),
        Command::Sort { action } => sort_cmd::run(&state, action),
        Command::Filters { action } => filters_cmd::run(&state, action),
    }
}
