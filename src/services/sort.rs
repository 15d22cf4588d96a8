use std::cmp::Ordering;

use crate::models::stock::{FieldKey, FieldValue, StockRecord};
use crate::models::table::{MouseAction, SortDirection, SortEntry, SortSpec};

/// 多列比较：按 priority 升序依次比较，第一个不相等的字段决定结果
pub fn compare(a: &StockRecord, b: &StockRecord, spec: &SortSpec) -> Ordering {
    compare_by(a, b, &spec.by_priority())
}

/// 稳定排序；全部字段相等时保持原有顺序
pub fn sort_records(records: &mut [&StockRecord], spec: &SortSpec) {
    if spec.is_empty() {
        return;
    }
    let ordered = spec.by_priority();
    records.sort_by(|a, b| compare_by(a, b, &ordered));
}

/// 按下标排序，records 本身不动
pub fn sort_indices(records: &[StockRecord], indices: &mut [usize], spec: &SortSpec) {
    if spec.is_empty() {
        return;
    }
    let ordered = spec.by_priority();
    indices.sort_by(|&a, &b| compare_by(&records[a], &records[b], &ordered));
}

fn compare_by(a: &StockRecord, b: &StockRecord, ordered: &[&SortEntry]) -> Ordering {
    for entry in ordered {
        let ord = compare_field(a.field(entry.key), b.field(entry.key));
        if ord != Ordering::Equal {
            return match entry.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
        }
    }
    Ordering::Equal
}

/// 数值按大小，文本按字典序；缺失的数值小于任何存在的数值
fn compare_field(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Number(x), FieldValue::Number(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (FieldValue::Missing, FieldValue::Missing) => Ordering::Equal,
        (FieldValue::Missing, _) => Ordering::Less,
        (_, FieldValue::Missing) => Ordering::Greater,
        // 同一字段不会出现文本与数值混合
        (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
        (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
    }
}

impl SortSpec {
    /// 按 priority 升序排列的排序项（priority 相同保持原顺序）
    pub fn by_priority(&self) -> Vec<&SortEntry> {
        let mut entries: Vec<&SortEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.priority);
        entries
    }

    /// 表头点击：
    /// - 未排序列：左键加入降序，右键加入升序，priority 取当前最大值 + 1
    /// - 已排序列右键：切换方向，priority 不变
    /// - 已排序列左键：升序变降序，降序则移除
    pub fn on_header_click(&mut self, key: FieldKey, action: MouseAction) {
        let Some(idx) = self.entries.iter().position(|e| e.key == key) else {
            let priority = self
                .entries
                .iter()
                .map(|e| e.priority)
                .max()
                .map_or(0, |p| p + 1);
            let direction = match action {
                MouseAction::Primary => SortDirection::Desc,
                MouseAction::Secondary => SortDirection::Asc,
            };
            self.entries.push(SortEntry { key, direction, priority });
            return;
        };

        match (action, self.entries[idx].direction) {
            (MouseAction::Secondary, dir) => self.entries[idx].direction = dir.toggled(),
            (MouseAction::Primary, SortDirection::Asc) => {
                self.entries[idx].direction = SortDirection::Desc
            }
            (MouseAction::Primary, SortDirection::Desc) => {
                self.entries.remove(idx);
            }
        }
    }

    /// 该列在多列排序中的序号（从 1 开始）
    pub fn rank(&self, key: FieldKey) -> Option<usize> {
        self.by_priority()
            .iter()
            .position(|e| e.key == key)
            .map(|i| i + 1)
    }
}
