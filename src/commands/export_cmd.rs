use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use crate::db::state::DatasetKind;
use crate::models::settings::is_time_option;
use crate::models::stock::FieldKey;
use crate::services::stock_data::RankingQuery;
use crate::services::table::{default_export_filename, TableController};
use crate::AppState;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// 输出文件，默认 stock_data_YYYY-MM-DD.csv
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// 导出的列（逗号分隔），默认导出全部可见列
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<FieldKey>>,
    /// 导出区间数据：起止时刻（HHMM）
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub range: Option<Vec<String>>,
    /// 经由代理拉取，例如 http://127.0.0.1:3000
    #[arg(long)]
    pub proxy: Option<String>,
    /// 使用上次缓存的数据，不重新拉取
    #[arg(long)]
    pub cached: bool,
}

/// 按保存的列/排序/过滤配置导出完整的过滤结果
pub async fn export(state: &AppState, args: ExportArgs) -> Result<()> {
    let (query, kind) = match args.range.as_deref() {
        Some([start, end]) => {
            for t in [start, end] {
                if !is_time_option(t) {
                    log::warn!("{} 不在可选时刻列表中，仍按原值请求", t);
                }
            }
            (
                RankingQuery::Range {
                    start: start.clone(),
                    end: end.clone(),
                },
                DatasetKind::Range,
            )
        }
        Some(_) => bail!("--range 需要起止两个时刻"),
        None => (RankingQuery::RealTime, DatasetKind::RealTime),
    };

    let records = if args.cached {
        let records = state.persisted.load_dataset(kind);
        if records.is_empty() {
            log::warn!("没有缓存的{}数据", query.label());
        }
        records
    } else {
        let fetcher = state.fetcher(args.proxy.as_deref())?;
        let records = fetcher.fetch_all(&query).await?;
        state.persisted.save_dataset(kind, &records);
        records
    };

    let mut table = TableController::new(Arc::new(records));
    table.restore(&state.persisted);

    let path = args.out.unwrap_or_else(|| PathBuf::from(default_export_filename()));
    let file = File::create(&path).with_context(|| format!("无法创建文件 {}", path.display()))?;
    table.write_csv(BufWriter::new(file), args.columns.as_deref())?;

    log::info!("已导出 {} 条{}数据到 {}", table.filtered_len(), query.label(), path.display());
    println!("{}", path.display());
    Ok(())
}
