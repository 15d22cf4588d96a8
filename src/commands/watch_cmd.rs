//! 终端看板：首次加载实时与区间数据，交易时段内自动刷新实时数据，
//! 并通过逐行命令操作表格（搜索、排序、过滤 ST、加载更多、导出）。

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::sort_cmd::header_marker;
use crate::db::state::DatasetKind;
use crate::models::settings::is_time_option;
use crate::models::stock::FieldKey;
use crate::models::table::MouseAction;
use crate::services::dataset::{refresh, DatasetStore};
use crate::services::formatter::{cell_color, format_cell};
use crate::services::scheduler::{LocalClock, RefreshScheduler, TradingScheduler};
use crate::services::stock_data::{RankingFetcher, RankingQuery, RankingSource};
use crate::services::table::{default_export_filename, TableController};
use crate::AppState;

const CELL_WIDTH: usize = 12;
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// 经由代理拉取，例如 http://127.0.0.1:3000
    #[arg(long)]
    pub proxy: Option<String>,
    /// 区间数据的起止时刻（HHMM），默认 0925 0930
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub range: Option<Vec<String>>,
    /// 自动刷新间隔（秒）
    #[arg(long)]
    pub interval: Option<u64>,
    /// 关闭交易时段自动刷新
    #[arg(long)]
    pub no_auto: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    RealTime,
    Range,
}

impl View {
    fn kind(self) -> DatasetKind {
        match self {
            View::RealTime => DatasetKind::RealTime,
            View::Range => DatasetKind::Range,
        }
    }

    fn index(self) -> usize {
        match self {
            View::RealTime => 0,
            View::Range => 1,
        }
    }
}

type SharedFetcher = Arc<RankingFetcher<Arc<dyn RankingSource>>>;

struct Session<'a> {
    state: &'a AppState,
    fetcher: SharedFetcher,
    realtime: Arc<DatasetStore>,
    range: Arc<DatasetStore>,
    window: (String, String),
    view: View,
    table: TableController,
    saved_generation: [u64; 2],
    shown_error: [Option<String>; 2],
}

pub async fn watch(state: &AppState, args: WatchArgs) -> Result<()> {
    let fetcher: SharedFetcher = Arc::new(state.fetcher(args.proxy.as_deref())?);
    let realtime = Arc::new(DatasetStore::with_records(
        state.persisted.load_dataset(DatasetKind::RealTime),
    ));
    let range = Arc::new(DatasetStore::with_records(
        state.persisted.load_dataset(DatasetKind::Range),
    ));

    let window = match args.range.as_deref() {
        Some([start, end]) => (start.clone(), end.clone()),
        _ => state.settings.range_window(),
    };

    let mut table = TableController::new(realtime.snapshot().records);
    table.restore(&state.persisted);

    let mut session = Session {
        state,
        fetcher,
        realtime,
        range,
        window,
        view: View::RealTime,
        table,
        saved_generation: [0, 0],
        shown_error: [None, None],
    };

    session.initial_load();

    let interval = args.interval.unwrap_or(state.settings.refresh_interval_secs).max(1);
    let scheduler = RefreshScheduler::new(Arc::new(LocalClock), Duration::from_secs(interval));
    let auto = if state.settings.auto_refresh && !args.no_auto {
        let fetcher = session.fetcher.clone();
        let store = session.realtime.clone();
        Some(scheduler.start(move || {
            let fetcher = fetcher.clone();
            let store = store.clone();
            async move {
                refresh(&fetcher, &store, &RankingQuery::RealTime).await;
            }
        }))
    } else {
        None
    };

    println!("市场状态: {}  输入 help 查看命令", TradingScheduler::market_status());
    session.render(0);

    let mut realtime_rx = session.realtime.subscribe();
    let mut range_rx = session.range.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match session.handle(line.trim()) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("错误: {}", e),
                }
            }
            changed = realtime_rx.changed() => {
                if changed.is_err() { break; }
                session.on_dataset_changed(View::RealTime);
            }
            changed = range_rx.changed() => {
                if changed.is_err() { break; }
                session.on_dataset_changed(View::Range);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    scheduler.stop();
    if let Some(handle) = auto {
        let _ = handle.await;
    }
    session.table.persist(&state.persisted);
    Ok(())
}

impl<'a> Session<'a> {
    fn store(&self, view: View) -> &Arc<DatasetStore> {
        match view {
            View::RealTime => &self.realtime,
            View::Range => &self.range,
        }
    }

    fn query(&self, view: View) -> RankingQuery {
        match view {
            View::RealTime => RankingQuery::RealTime,
            View::Range => RankingQuery::Range {
                start: self.window.0.clone(),
                end: self.window.1.clone(),
            },
        }
    }

    /// 先实时后区间，顺序加载
    fn initial_load(&self) {
        let fetcher = self.fetcher.clone();
        let realtime = self.realtime.clone();
        let range = self.range.clone();
        let range_query = self.query(View::Range);
        tokio::spawn(async move {
            refresh(&fetcher, &realtime, &RankingQuery::RealTime).await;
            refresh(&fetcher, &range, &range_query).await;
        });
    }

    fn spawn_refresh(&self, view: View) {
        let fetcher = self.fetcher.clone();
        let store = self.store(view).clone();
        let query = self.query(view);
        tokio::spawn(async move {
            refresh(&fetcher, &store, &query).await;
        });
    }

    fn on_dataset_changed(&mut self, view: View) {
        let data = self.store(view).snapshot();

        if data.generation > self.saved_generation[view.index()] {
            self.saved_generation[view.index()] = data.generation;
            self.state.persisted.save_dataset(view.kind(), &data.records);
            if view == self.view {
                self.table.set_records(data.records.clone());
                self.render(0);
            }
        }

        // 同一条错误只提示一次
        if data.error != self.shown_error[view.index()] {
            if let (Some(error), true) = (&data.error, view == self.view) {
                println!("⚠ {}", error);
            }
            self.shown_error[view.index()] = data.error.clone();
        }
    }

    /// 返回 false 表示退出
    fn handle(&mut self, line: &str) -> Result<bool> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Ok(true);
        };
        let rest: Vec<&str> = parts.collect();

        match cmd {
            "quit" | "exit" | "q" => return Ok(false),
            "help" => print_help(),
            "more" => {
                let before = self.table.reveal_count().min(self.table.filtered_len());
                if self.table.reveal_more() {
                    self.render(before);
                } else {
                    println!("已显示全部 {} 条", self.table.filtered_len());
                }
            }
            "search" => {
                self.table.set_search(&rest.join(" "));
                self.render(0);
            }
            "st" => {
                let enabled = !self.table.filter_st();
                self.table.set_filter_st(enabled);
                self.table.persist(&self.state.persisted);
                println!("过滤 ST: {}", if enabled { "开" } else { "关" });
                self.render(0);
            }
            "sort" | "rsort" => {
                let key: FieldKey = rest.first().context("用法: sort <字段>")?.parse()?;
                let action = if cmd == "sort" {
                    MouseAction::Primary
                } else {
                    MouseAction::Secondary
                };
                self.table.on_header_click(key, action);
                self.table.persist(&self.state.persisted);
                self.render(0);
            }
            "view" => {
                self.view = match rest.first().copied() {
                    Some("realtime") => View::RealTime,
                    Some("range") => View::Range,
                    _ => anyhow::bail!("用法: view realtime|range"),
                };
                let records = self.store(self.view).snapshot().records;
                self.table.set_records(records);
                self.render(0);
            }
            "range" => {
                let &[start, end] = rest.as_slice() else {
                    anyhow::bail!("用法: range <开始HHMM> <结束HHMM>");
                };
                for t in [start, end] {
                    if !is_time_option(t) {
                        println!("提示: {} 不在可选时刻列表中", t);
                    }
                }
                self.window = (start.to_string(), end.to_string());
                self.save_window();
                self.spawn_refresh(View::Range);
                println!("正在加载区间数据 {}-{}", start, end);
            }
            "refresh" => {
                self.spawn_refresh(self.view);
                println!("正在刷新...");
            }
            "export" => {
                let path = rest
                    .first()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(default_export_filename()));
                let file = File::create(&path)
                    .with_context(|| format!("无法创建文件 {}", path.display()))?;
                self.table.write_csv(BufWriter::new(file), None)?;
                println!("已导出 {} 条到 {}", self.table.filtered_len(), path.display());
            }
            "status" => self.print_status(),
            "quote" => {
                let code = rest.first().context("用法: quote <代码>")?;
                match self.table.records().iter().find(|r| r.code == *code) {
                    Some(record) => println!("{} {}  {}", record.code, record.name, record.quote_url()),
                    None => println!("当前数据中没有 {}", code),
                }
            }
            other => println!("未知命令: {}（输入 help 查看命令）", other),
        }
        Ok(true)
    }

    fn save_window(&self) {
        let mut settings = self.state.settings.clone();
        settings.range_start = Some(self.window.0.clone());
        settings.range_end = Some(self.window.1.clone());
        if let Err(e) = self.state.db.save_settings(&settings) {
            log::warn!("保存区间设置失败: {}", e);
        }
    }

    fn print_status(&self) {
        println!("市场状态: {}", TradingScheduler::market_status());
        for (name, view) in [("实时", View::RealTime), ("区间", View::Range)] {
            let data = self.store(view).snapshot();
            let fetched = data
                .fetched_at
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{}数据: {} 条  更新时间 {}  进行中 {}  {}",
                name,
                data.records.len(),
                fetched,
                data.in_flight,
                data.error.as_deref().unwrap_or("")
            );
        }
        println!("区间: {}-{}", self.window.0, self.window.1);
        println!(
            "搜索: {}  过滤条件: {}  {}",
            self.table.search(),
            self.table.filters().active_count(),
            self.table.summary()
        );
    }

    /// 输出已展开的行，from 之前的行视为已输出
    fn render(&self, from: usize) {
        let keys = self.table.columns().visible_keys();
        if from == 0 {
            let header: Vec<String> = keys
                .iter()
                .map(|k| {
                    let label = format!("{}{}", self.table.columns().label(*k), header_marker(self.table.sort(), *k));
                    format!("{:>width$}", label, width = CELL_WIDTH)
                })
                .collect();
            println!("{}", header.join(" "));
        }

        for record in self.table.rows().into_iter().skip(from) {
            let cells: Vec<String> = keys
                .iter()
                .map(|k| {
                    format!(
                        "{}{:>width$}{}",
                        cell_color(record, *k).ansi(),
                        format_cell(record, *k),
                        ANSI_RESET,
                        width = CELL_WIDTH
                    )
                })
                .collect();
            println!("{}", cells.join(" "));
        }
        println!("{}", self.table.summary());
    }
}

fn print_help() {
    println!(
        "命令:
  more                 加载更多 50 行
  search <关键词>      按名称/代码/板块/涨停标签/连板搜索，留空清除
  st                   切换过滤 ST 股票
  sort <字段>          左键点击表头（降序 → 移除）
  rsort <字段>         右键点击表头（切换升降序）
  view realtime|range  切换实时/区间数据
  range <开始> <结束>  重新加载区间数据，例如 range 0930 1000
  refresh              手动刷新当前数据
  export [路径]        导出当前过滤结果为 CSV
  status               查看数据与刷新状态
  quote <代码>         显示该股票的行情页链接
  quit                 退出"
    );
}
