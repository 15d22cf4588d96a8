use anyhow::{bail, Result};
use clap::Subcommand;

use crate::models::stock::FieldKey;
use crate::services::columns::ColumnSet;
use crate::AppState;

#[derive(Debug, Subcommand)]
pub enum ColumnsAction {
    /// 列出所有列（按显示顺序）
    List,
    /// 显示某列
    Show { key: FieldKey },
    /// 隐藏某列
    Hide { key: FieldKey },
    /// 把第 FROM 位的列移动到第 TO 位（从 0 开始）
    Move { from: usize, to: usize },
    /// 恢复默认列配置
    Reset,
}

pub fn run(state: &AppState, action: ColumnsAction) -> Result<()> {
    let mut columns = state.persisted.load_columns();

    match action {
        ColumnsAction::List => {}
        ColumnsAction::Show { key } => set_visible(&mut columns, key, true)?,
        ColumnsAction::Hide { key } => set_visible(&mut columns, key, false)?,
        ColumnsAction::Move { from, to } => {
            if !columns.reorder(from, to) {
                bail!("列位置超出范围: {} -> {}（共 {} 列）", from, to, columns.all().len());
            }
        }
        ColumnsAction::Reset => columns.reset(),
    }

    state.persisted.save_columns(&columns);
    print_columns(&columns);
    Ok(())
}

fn set_visible(columns: &mut ColumnSet, key: FieldKey, visible: bool) -> Result<()> {
    if !columns.toggle(key, visible) {
        bail!("未知列: {}", key);
    }
    Ok(())
}

pub fn print_columns(columns: &ColumnSet) {
    for (i, column) in columns.all().iter().enumerate() {
        let mark = if column.visible { "✓" } else { " " };
        println!("{:>2} [{}] {:<28} {}", i, mark, column.key.as_str(), column.label);
    }
    println!("可见 {} / {} 列", columns.visible().len(), columns.all().len());
}
