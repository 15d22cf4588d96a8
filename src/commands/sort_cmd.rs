use anyhow::Result;
use clap::Subcommand;

use crate::models::stock::FieldKey;
use crate::models::table::{MouseAction, SortDirection, SortSpec};
use crate::AppState;

#[derive(Debug, Subcommand)]
pub enum SortAction {
    /// 列出当前排序
    List,
    /// 模拟点击表头：默认左键（降序 → 移除），--secondary 为右键（切换方向）
    Click {
        key: FieldKey,
        #[arg(long)]
        secondary: bool,
    },
    /// 恢复默认排序（涨幅降序）
    Reset,
}

pub fn run(state: &AppState, action: SortAction) -> Result<()> {
    let mut sort = state.persisted.load_sort();

    match action {
        SortAction::List => {}
        SortAction::Click { key, secondary } => {
            let mouse = if secondary {
                MouseAction::Secondary
            } else {
                MouseAction::Primary
            };
            sort.on_header_click(key, mouse);
        }
        SortAction::Reset => sort = SortSpec::default(),
    }

    state.persisted.save_sort(&sort);
    print_sort(&sort);
    Ok(())
}

pub fn print_sort(sort: &SortSpec) {
    if sort.is_empty() {
        println!("未设置排序");
        return;
    }
    for entry in sort.by_priority() {
        let rank = sort.rank(entry.key).unwrap_or(0);
        println!("{}. {} {}", rank, entry.key.default_label(), direction_arrow(entry.direction));
    }
}

pub fn direction_arrow(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    }
}

/// 表头上的排序标记，例如 "↓1"
pub fn header_marker(sort: &SortSpec, key: FieldKey) -> String {
    match (sort.get(key), sort.rank(key)) {
        (Some(entry), Some(rank)) => format!("{}{}", direction_arrow(entry.direction), rank),
        _ => String::new(),
    }
}
