use anyhow::{bail, Result};
use clap::Subcommand;

use crate::db::state::DatasetKind;
use crate::models::stock::FieldValue;
use crate::models::table::{FilterKey, TableFilters};
use crate::services::filter::FilterEngine;
use crate::services::formatter::format_value;
use crate::AppState;

#[derive(Debug, Subcommand)]
pub enum FiltersAction {
    /// 列出所有过滤条件
    List,
    /// 设置数值范围并启用
    Range {
        key: FilterKey,
        #[arg(long, allow_negative_numbers = true)]
        min: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f64>,
    },
    /// 以给定的值替换多选过滤的选中项
    Select {
        key: FilterKey,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// 启用/停用某个过滤条件
    Toggle { key: FilterKey },
    /// 清除某个过滤条件
    Clear { key: FilterKey },
    /// 清除全部过滤条件
    Reset,
    /// 查看缓存数据中可选的值或数值范围
    Options { key: FilterKey },
}

pub fn run(state: &AppState, action: FiltersAction) -> Result<()> {
    let mut filters = state.persisted.load_filters();

    match action {
        FiltersAction::List => {}
        FiltersAction::Range { key, min, max } => {
            if !filters.set_range(key, min, max) {
                bail!("{} 不是数值范围过滤", key);
            }
        }
        FiltersAction::Select { key, values } => {
            let Some(multi) = filters.multi_mut(key) else {
                bail!("{} 不是多选过滤", key);
            };
            multi.selected.clear();
            for value in &values {
                filters.toggle_option(key, value, true);
            }
        }
        FiltersAction::Toggle { key } => {
            filters.toggle_enabled(key);
        }
        FiltersAction::Clear { key } => filters.clear(key),
        FiltersAction::Reset => filters.reset(),
        FiltersAction::Options { key } => {
            print_options(state, key);
            return Ok(());
        }
    }

    state.persisted.save_filters(&filters);
    print_filters(&filters);
    Ok(())
}

fn print_options(state: &AppState, key: FilterKey) {
    let records = state.persisted.load_dataset(DatasetKind::RealTime);
    if records.is_empty() {
        println!("没有缓存的实时数据，请先运行 watch 或 export");
        return;
    }
    if key.is_range() {
        let (min, max) = FilterEngine::data_range(&records, key.field());
        println!(
            "{} 数据范围: {} ~ {}",
            key.field().default_label(),
            format_value(key.field(), FieldValue::Number(min)),
            format_value(key.field(), FieldValue::Number(max))
        );
    } else {
        let options = FilterEngine::available_options(&records, key.field());
        println!("{} 共 {} 个可选值:", key.field().default_label(), options.len());
        for option in options {
            println!("  {}", option);
        }
    }
}

pub fn print_filters(filters: &TableFilters) {
    for key in FilterKey::RANGE {
        if let Some(f) = filters.range(key) {
            let bound = |v: Option<f64>| v.map_or("-".to_string(), |v| v.to_string());
            println!(
                "[{}] {:<10} {} ~ {}",
                if f.enabled { "on" } else { "  " },
                key.field().default_label(),
                bound(f.min),
                bound(f.max)
            );
        }
    }
    for key in FilterKey::MULTI_SELECT {
        if let Some(f) = filters.multi(key) {
            println!(
                "[{}] {:<10} {}",
                if f.enabled { "on" } else { "  " },
                key.field().default_label(),
                f.selected.join("、")
            );
        }
    }
    println!("已启用 {} 个过滤条件", filters.active_count());
}
