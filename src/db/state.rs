use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::storage::Storage;
use crate::models::stock::StockRecord;
use crate::models::table::{SavedColumn, SortSpec, TableFilters};
use crate::services::columns::ColumnSet;

pub const COLUMN_CONFIG_KEY: &str = "stock-table-column-config";
pub const SORT_CONFIG_KEY: &str = "stock-table-sort-config";
pub const FILTER_ST_KEY: &str = "stock-table-filter-st";
pub const FILTERS_KEY: &str = "stock-table-filters";
pub const REAL_TIME_DATA_KEY: &str = "stock-table-real-time-data";
pub const RANGE_DATA_KEY: &str = "stock-table-range-data";

/// 缓存的两份数据集
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    RealTime,
    Range,
}

impl DatasetKind {
    fn key(&self) -> &'static str {
        match self {
            DatasetKind::RealTime => REAL_TIME_DATA_KEY,
            DatasetKind::Range => RANGE_DATA_KEY,
        }
    }
}

/// 界面状态的读写。读取或解析失败只记录警告并回退到默认值，写入失败同样不向上抛出
#[derive(Clone)]
pub struct PersistedState {
    storage: Arc<dyn Storage>,
}

impl PersistedState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("读取本地配置 {} 失败: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("本地配置 {} 解析失败，使用默认值: {}", key, e);
                None
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.storage.set(key, &json));
        if let Err(e) = result {
            log::warn!("保存本地配置 {} 失败: {}", key, e);
        }
    }

    /// 逐条解析保存的列配置，无法识别的条目（如已下线的列）单独跳过
    pub fn load_columns(&self) -> ColumnSet {
        let Some(entries) = self.load::<Vec<serde_json::Value>>(COLUMN_CONFIG_KEY) else {
            return ColumnSet::defaults();
        };
        let saved: Vec<SavedColumn> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(column) => Some(column),
                Err(e) => {
                    log::warn!("忽略无法识别的列配置: {}", e);
                    None
                }
            })
            .collect();
        ColumnSet::merge_saved(&saved)
    }

    pub fn save_columns(&self, columns: &ColumnSet) {
        self.save(COLUMN_CONFIG_KEY, columns.all());
    }

    /// 保存的排序为空列表时按默认排序处理
    pub fn load_sort(&self) -> SortSpec {
        match self.load::<SortSpec>(SORT_CONFIG_KEY) {
            Some(spec) if !spec.is_empty() => spec,
            _ => SortSpec::default(),
        }
    }

    pub fn save_sort(&self, sort: &SortSpec) {
        self.save(SORT_CONFIG_KEY, sort);
    }

    pub fn load_filter_st(&self) -> bool {
        self.load(FILTER_ST_KEY).unwrap_or(false)
    }

    pub fn save_filter_st(&self, filter_st: bool) {
        self.save(FILTER_ST_KEY, &filter_st);
    }

    pub fn load_filters(&self) -> TableFilters {
        self.load(FILTERS_KEY).unwrap_or_default()
    }

    pub fn save_filters(&self, filters: &TableFilters) {
        self.save(FILTERS_KEY, filters);
    }

    pub fn load_dataset(&self, kind: DatasetKind) -> Vec<StockRecord> {
        self.load(kind.key()).unwrap_or_default()
    }

    pub fn save_dataset(&self, kind: DatasetKind, records: &[StockRecord]) {
        self.save(kind.key(), records);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::storage::{MemoryStorage, NoopStorage};
    use crate::models::stock::FieldKey;

    #[test]
    fn test_noop_storage_yields_defaults() {
        let state = PersistedState::new(Arc::new(NoopStorage));
        state.save_filter_st(true);
        assert!(!state.load_filter_st(), "不可用存储不保留任何值");
        assert_eq!(state.load_columns().all().len(), 28);
    }

    #[test]
    fn test_empty_sort_list_loads_default() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(SORT_CONFIG_KEY, "[]").unwrap();
        let state = PersistedState::new(storage);
        assert_eq!(state.load_sort(), SortSpec::default());
    }

    #[test]
    fn test_partial_filters_merge_with_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(FILTERS_KEY, r#"{"turnover":{"min":1000,"enabled":true}}"#)
            .unwrap();
        let state = PersistedState::new(storage);
        let filters = state.load_filters();
        assert!(filters.turnover.enabled);
        assert_eq!(filters.turnover.min, Some(1000.0));
        assert!(!filters.sector.enabled);
        assert!(filters.sector.selected.is_empty());
    }

    #[test]
    fn test_column_merge_keeps_new_defaults() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                COLUMN_CONFIG_KEY,
                r#"[{"key":"popularity","label":"人气","visible":false,"order":0}]"#,
            )
            .unwrap();
        let state = PersistedState::new(storage);
        let columns = state.load_columns();
        assert_eq!(columns.all().len(), 28);
        let popularity = columns.get(FieldKey::Popularity).unwrap();
        assert!(!popularity.visible);
        assert_eq!(popularity.label, "人气");
        // order 相同按 key 名排序：code < popularity
        assert_eq!(columns.all()[0].key, FieldKey::Code);
        assert_eq!(columns.all()[1].key, FieldKey::Popularity);
    }

    #[test]
    fn test_unknown_column_entry_does_not_discard_others() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(
                COLUMN_CONFIG_KEY,
                r#"[{"key":"popularity","label":"人气","visible":false,"order":3},
                    {"key":"retiredColumn","label":"旧列","visible":true,"order":1}]"#,
            )
            .unwrap();
        let columns = PersistedState::new(storage).load_columns();
        assert_eq!(columns.all().len(), 28);
        let popularity = columns.get(FieldKey::Popularity).unwrap();
        assert!(!popularity.visible, "已下线的列不应让其他列配置失效");
        assert_eq!(popularity.label, "人气");
        assert_eq!(popularity.order, 3);
    }

    #[test]
    fn test_column_entry_without_label_keeps_saved_visibility() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(COLUMN_CONFIG_KEY, r#"[{"key":"popularity","visible":false,"order":0}]"#)
            .unwrap();
        let columns = PersistedState::new(storage).load_columns();
        let popularity = columns.get(FieldKey::Popularity).unwrap();
        assert!(!popularity.visible);
        assert_eq!(popularity.label, "人气值");
    }
}
