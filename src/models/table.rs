use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::stock::FieldKey;

/// 列配置：可见性与顺序，按 (order, key) 全序排列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: FieldKey,
    pub label: String,
    pub visible: bool,
    pub order: u32,
}

/// 本地保存的单列配置，缺失的成员沿用默认列
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedColumn {
    pub key: FieldKey,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// 单列排序项，priority 越小越先比较
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortEntry {
    pub key: FieldKey,
    pub direction: SortDirection,
    pub priority: u32,
}

/// 表头点击：主键（左键）或次键（右键）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Primary,
    Secondary,
}

/// 多列排序配置，每个字段至多一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    pub entries: Vec<SortEntry>,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            entries: vec![SortEntry {
                key: FieldKey::ChangePercent,
                direction: SortDirection::Desc,
                priority: 0,
            }],
        }
    }
}

impl SortSpec {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn get(&self, key: FieldKey) -> Option<&SortEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiSelectFilter {
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// 可过滤字段（固定集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    ChangePercent,
    Turnover,
    TwoMinuteTurnover,
    ActualCirculation,
    MainNetAmount,
    ConsecutiveBoard,
    LimitUpLabel,
    Sector,
}

impl FilterKey {
    pub const RANGE: [FilterKey; 5] = [
        FilterKey::ChangePercent,
        FilterKey::Turnover,
        FilterKey::TwoMinuteTurnover,
        FilterKey::ActualCirculation,
        FilterKey::MainNetAmount,
    ];

    pub const MULTI_SELECT: [FilterKey; 3] = [
        FilterKey::ConsecutiveBoard,
        FilterKey::LimitUpLabel,
        FilterKey::Sector,
    ];

    pub fn field(&self) -> FieldKey {
        match self {
            FilterKey::ChangePercent => FieldKey::ChangePercent,
            FilterKey::Turnover => FieldKey::Turnover,
            FilterKey::TwoMinuteTurnover => FieldKey::TwoMinuteTurnover,
            FilterKey::ActualCirculation => FieldKey::ActualCirculation,
            FilterKey::MainNetAmount => FieldKey::MainNetAmount,
            FilterKey::ConsecutiveBoard => FieldKey::ConsecutiveBoard,
            FilterKey::LimitUpLabel => FieldKey::LimitUpLabel,
            FilterKey::Sector => FieldKey::Sector,
        }
    }

    pub fn is_range(&self) -> bool {
        Self::RANGE.contains(self)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field().as_str())
    }
}

impl FromStr for FilterKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field: FieldKey = s.parse()?;
        Self::RANGE
            .iter()
            .chain(Self::MULTI_SELECT.iter())
            .copied()
            .find(|k| k.field() == field)
            .ok_or_else(|| anyhow::anyhow!("字段 {} 不支持过滤", field))
    }
}

/// 表格过滤配置；反序列化时缺失的成员取默认值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableFilters {
    pub change_percent: RangeFilter,
    pub turnover: RangeFilter,
    pub two_minute_turnover: RangeFilter,
    pub actual_circulation: RangeFilter,
    pub main_net_amount: RangeFilter,

    pub consecutive_board: MultiSelectFilter,
    pub limit_up_label: MultiSelectFilter,
    pub sector: MultiSelectFilter,
}

impl TableFilters {
    /// 数值范围过滤；多选字段返回 None
    pub fn range(&self, key: FilterKey) -> Option<&RangeFilter> {
        match key {
            FilterKey::ChangePercent => Some(&self.change_percent),
            FilterKey::Turnover => Some(&self.turnover),
            FilterKey::TwoMinuteTurnover => Some(&self.two_minute_turnover),
            FilterKey::ActualCirculation => Some(&self.actual_circulation),
            FilterKey::MainNetAmount => Some(&self.main_net_amount),
            _ => None,
        }
    }

    pub fn range_mut(&mut self, key: FilterKey) -> Option<&mut RangeFilter> {
        match key {
            FilterKey::ChangePercent => Some(&mut self.change_percent),
            FilterKey::Turnover => Some(&mut self.turnover),
            FilterKey::TwoMinuteTurnover => Some(&mut self.two_minute_turnover),
            FilterKey::ActualCirculation => Some(&mut self.actual_circulation),
            FilterKey::MainNetAmount => Some(&mut self.main_net_amount),
            _ => None,
        }
    }

    pub fn multi(&self, key: FilterKey) -> Option<&MultiSelectFilter> {
        match key {
            FilterKey::ConsecutiveBoard => Some(&self.consecutive_board),
            FilterKey::LimitUpLabel => Some(&self.limit_up_label),
            FilterKey::Sector => Some(&self.sector),
            _ => None,
        }
    }

    pub fn multi_mut(&mut self, key: FilterKey) -> Option<&mut MultiSelectFilter> {
        match key {
            FilterKey::ConsecutiveBoard => Some(&mut self.consecutive_board),
            FilterKey::LimitUpLabel => Some(&mut self.limit_up_label),
            FilterKey::Sector => Some(&mut self.sector),
            _ => None,
        }
    }
}
