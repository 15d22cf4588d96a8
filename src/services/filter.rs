use std::collections::HashSet;

use crate::models::stock::{split_sectors, FieldKey, FieldValue, StockRecord};
use crate::models::table::{FilterKey, MultiSelectFilter, RangeFilter, TableFilters};

pub struct FilterEngine;

impl FilterEngine {
    /// 按所有启用的过滤条件（与关系）筛选记录，未启用的条件不生效
    pub fn apply<'a, I>(records: I, filters: &TableFilters) -> Vec<&'a StockRecord>
    where
        I: IntoIterator<Item = &'a StockRecord>,
    {
        records
            .into_iter()
            .filter(|r| Self::matches(r, filters))
            .collect()
    }

    pub fn matches(record: &StockRecord, filters: &TableFilters) -> bool {
        for key in FilterKey::RANGE {
            if let Some(filter) = filters.range(key) {
                if !range_matches(record.number(key.field()), filter) {
                    return false;
                }
            }
        }

        for key in FilterKey::MULTI_SELECT {
            if let Some(filter) = filters.multi(key) {
                if !multi_matches(record, key, filter) {
                    return false;
                }
            }
        }

        true
    }

    /// 多选过滤的可选项：去重后的非空值，按首次出现顺序；板块先按顿号拆分
    pub fn available_options(records: &[StockRecord], field: FieldKey) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut options = Vec::new();

        for record in records {
            if field == FieldKey::Sector {
                for sector in record.sectors() {
                    if seen.insert(sector.to_string()) {
                        options.push(sector.to_string());
                    }
                }
                continue;
            }

            let value = match record.field(field) {
                FieldValue::Text(s) if !s.is_empty() => s.to_string(),
                FieldValue::Number(v) => v.to_string(),
                _ => continue,
            };
            if seen.insert(value.clone()) {
                options.push(value);
            }
        }

        options
    }

    /// 数值字段的取值范围（用于范围滑块），无数据时为 0..100
    pub fn data_range(records: &[StockRecord], field: FieldKey) -> (f64, f64) {
        let mut iter = records.iter().filter_map(|r| r.number(field));
        let first = match iter.next() {
            Some(v) => v,
            None => return (0.0, 100.0),
        };
        iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }
}

fn range_matches(value: Option<f64>, filter: &RangeFilter) -> bool {
    if !filter.enabled {
        return true;
    }
    if filter.min.is_none() && filter.max.is_none() {
        return true;
    }
    // 缺失值不满足任何已设置的边界
    let Some(v) = value else {
        return false;
    };
    if let Some(min) = filter.min {
        if v < min {
            return false;
        }
    }
    if let Some(max) = filter.max {
        if v > max {
            return false;
        }
    }
    true
}

fn multi_matches(record: &StockRecord, key: FilterKey, filter: &MultiSelectFilter) -> bool {
    if !filter.enabled || filter.selected.is_empty() {
        return true;
    }

    if key == FilterKey::Sector {
        // 板块按子串包含匹配：选中“芯片”可命中“芯片概念”
        let sectors: Vec<&str> = split_sectors(&record.sector).collect();
        return filter
            .selected
            .iter()
            .any(|selected| sectors.iter().any(|s| s.contains(selected.as_str())));
    }

    match record.field(key.field()) {
        FieldValue::Text(s) => filter.selected.iter().any(|v| v == s),
        _ => false,
    }
}

impl TableFilters {
    /// 设置数值范围并启用
    pub fn set_range(&mut self, key: FilterKey, min: Option<f64>, max: Option<f64>) -> bool {
        match self.range_mut(key) {
            Some(filter) => {
                filter.min = min;
                filter.max = max;
                filter.enabled = true;
                true
            }
            None => false,
        }
    }

    /// 勾选/取消多选项；有选中项时自动启用，清空时自动停用
    pub fn toggle_option(&mut self, key: FilterKey, value: &str, checked: bool) -> bool {
        let Some(filter) = self.multi_mut(key) else {
            return false;
        };
        if checked {
            if !filter.selected.iter().any(|v| v == value) {
                filter.selected.push(value.to_string());
            }
        } else {
            filter.selected.retain(|v| v != value);
        }
        filter.enabled = !filter.selected.is_empty();
        true
    }

    pub fn toggle_enabled(&mut self, key: FilterKey) -> bool {
        if let Some(filter) = self.range_mut(key) {
            filter.enabled = !filter.enabled;
            return filter.enabled;
        }
        if let Some(filter) = self.multi_mut(key) {
            filter.enabled = !filter.enabled;
            return filter.enabled;
        }
        false
    }

    pub fn clear(&mut self, key: FilterKey) {
        if let Some(filter) = self.range_mut(key) {
            *filter = RangeFilter::default();
        }
        if let Some(filter) = self.multi_mut(key) {
            *filter = MultiSelectFilter::default();
        }
    }

    pub fn reset(&mut self) {
        *self = TableFilters::default();
    }

    pub fn active_count(&self) -> usize {
        let ranges = FilterKey::RANGE
            .iter()
            .filter(|k| self.range(**k).is_some_and(|f| f.enabled))
            .count();
        let multis = FilterKey::MULTI_SELECT
            .iter()
            .filter(|k| self.multi(**k).is_some_and(|f| f.enabled))
            .count();
        ranges + multis
    }
}
