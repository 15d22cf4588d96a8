//! 表格控制器：ST 排除 → 搜索 → 过滤 → 排序 → 逐步展开。
//!
//! 任何输入变化都会重新计算派生的行下标列表；原始数据集只读共享。

use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

use crate::db::state::PersistedState;
use crate::models::stock::{FieldKey, StockRecord};
use crate::models::table::{FilterKey, MouseAction, SortSpec, TableFilters};
use crate::services::columns::ColumnSet;
use crate::services::filter::FilterEngine;
use crate::services::formatter::format_cell;
use crate::services::sort::sort_indices;

pub const INITIAL_REVEAL: usize = 100;
pub const REVEAL_STEP: usize = 50;
/// 距离底部多少像素内触发加载更多
pub const SCROLL_THRESHOLD: f64 = 50.0;

/// 滚动容器的位置信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn near_bottom(&self) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - SCROLL_THRESHOLD
    }
}

pub struct TableController {
    records: Arc<Vec<StockRecord>>,
    columns: ColumnSet,
    sort: SortSpec,
    filters: TableFilters,
    search: String,
    filter_st: bool,
    reveal: usize,
    /// 过滤排序后的下标（指向 records）
    view: Vec<usize>,
}

impl Default for TableController {
    fn default() -> Self {
        Self::new(Arc::new(Vec::new()))
    }
}

impl TableController {
    pub fn new(records: Arc<Vec<StockRecord>>) -> Self {
        let mut table = Self {
            records,
            columns: ColumnSet::defaults(),
            sort: SortSpec::default(),
            filters: TableFilters::default(),
            search: String::new(),
            filter_st: false,
            reveal: INITIAL_REVEAL,
            view: Vec::new(),
        };
        table.recompute();
        table
    }

    /// 从本地存储恢复列、排序、ST 开关和过滤条件
    pub fn restore(&mut self, state: &PersistedState) {
        self.columns = state.load_columns();
        self.sort = state.load_sort();
        self.filter_st = state.load_filter_st();
        self.filters = state.load_filters();
        self.recompute();
    }

    pub fn persist(&self, state: &PersistedState) {
        state.save_columns(&self.columns);
        state.save_sort(&self.sort);
        state.save_filter_st(self.filter_st);
        state.save_filters(&self.filters);
    }

    fn recompute(&mut self) {
        let term = self.search.trim().to_lowercase();
        let records = &self.records;
        let mut view: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| !(self.filter_st && r.is_st()))
            .filter(|(_, r)| term.is_empty() || matches_search(r, &term))
            .filter(|(_, r)| FilterEngine::matches(r, &self.filters))
            .map(|(i, _)| i)
            .collect();
        sort_indices(records, &mut view, &self.sort);
        self.view = view;
    }

    pub fn set_records(&mut self, records: Arc<Vec<StockRecord>>) {
        self.records = records;
        self.recompute();
    }

    pub fn records(&self) -> &Arc<Vec<StockRecord>> {
        &self.records
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut ColumnSet {
        &mut self.columns
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn on_header_click(&mut self, key: FieldKey, action: MouseAction) {
        self.sort.on_header_click(key, action);
        self.recompute();
    }

    pub fn filters(&self) -> &TableFilters {
        &self.filters
    }

    /// 修改过滤条件后自动重新计算
    pub fn update_filters<F: FnOnce(&mut TableFilters)>(&mut self, f: F) {
        f(&mut self.filters);
        self.recompute();
    }

    pub fn set_range_filter(&mut self, key: FilterKey, min: Option<f64>, max: Option<f64>) {
        self.update_filters(|filters| {
            filters.set_range(key, min, max);
        });
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.recompute();
    }

    pub fn filter_st(&self) -> bool {
        self.filter_st
    }

    pub fn set_filter_st(&mut self, enabled: bool) {
        self.filter_st = enabled;
        self.recompute();
    }

    pub fn reveal_count(&self) -> usize {
        self.reveal
    }

    pub fn filtered_len(&self) -> usize {
        self.view.len()
    }

    /// 当前展开的行（过滤排序结果的前缀）
    pub fn rows(&self) -> Vec<&StockRecord> {
        self.view
            .iter()
            .take(self.reveal)
            .map(|&i| &self.records[i])
            .collect()
    }

    /// 完整的过滤排序结果
    pub fn filtered(&self) -> Vec<&StockRecord> {
        self.view.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn has_more(&self) -> bool {
        self.reveal < self.view.len()
    }

    /// 再展开一批；已全部展开时不变
    pub fn reveal_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.reveal = (self.reveal + REVEAL_STEP).min(self.view.len());
        true
    }

    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        if metrics.near_bottom() {
            self.reveal_more()
        } else {
            false
        }
    }

    pub fn summary(&self) -> String {
        format!("显示 {} / {} 条数据", self.reveal.min(self.view.len()), self.view.len())
    }

    pub fn export_csv(&self, columns: Option<&[FieldKey]>) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf, columns)?;
        Ok(String::from_utf8(buf)?)
    }

    /// 导出全部过滤结果（不只是已展开部分）；未指定列时导出可见列
    pub fn write_csv<W: Write>(&self, writer: W, columns: Option<&[FieldKey]>) -> Result<()> {
        let keys: Vec<FieldKey> = match columns {
            Some(keys) if !keys.is_empty() => keys.to_vec(),
            _ => self.columns.visible_keys(),
        };

        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        wtr.write_record(keys.iter().map(|k| self.columns.label(*k)))?;
        for &i in &self.view {
            let record = &self.records[i];
            wtr.write_record(keys.iter().map(|k| format_cell(record, *k)))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// 名称、代码、板块、涨停标签、连板说明任一包含搜索词（不区分大小写）
fn matches_search(record: &StockRecord, term: &str) -> bool {
    [
        &record.name,
        &record.code,
        &record.sector,
        &record.limit_up_label,
        &record.consecutive_board,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}

pub fn default_export_filename() -> String {
    format!("stock_data_{}.csv", chrono::Local::now().format("%Y-%m-%d"))
}
