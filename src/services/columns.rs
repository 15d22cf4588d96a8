use crate::models::stock::FieldKey;
use crate::models::table::{ColumnSpec, SavedColumn};

/// 默认列顺序
const DEFAULT_ORDER: [FieldKey; 28] = [
    FieldKey::Code,
    FieldKey::Name,
    FieldKey::Sector,
    FieldKey::CurrentPrice,
    FieldKey::ChangePercent,
    FieldKey::Turnover,
    FieldKey::ActualTurnoverRate,
    FieldKey::ChangeSpeed,
    FieldKey::TwoMinuteTurnover,
    FieldKey::ActualCirculation,
    FieldKey::MainBuy,
    FieldKey::MainSell,
    FieldKey::MainNetAmount,
    FieldKey::MainBuyRatio,
    FieldKey::MainSellRatio,
    FieldKey::NetTurnoverRatio,
    FieldKey::BuyFlowRatio,
    FieldKey::SellFlowRatio,
    FieldKey::NetFlowRatio,
    FieldKey::RangeChangePercent,
    FieldKey::VolumeRatio,
    FieldKey::ConsecutiveBoard,
    FieldKey::Amplitude,
    FieldKey::TotalMarketValue,
    FieldKey::CirculatingMarketValue,
    FieldKey::LimitUpLabel,
    FieldKey::InstitutionIncreaseAmount,
    FieldKey::Popularity,
];

/// 表格列配置集合，始终按 (order, key) 排序
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    columns: Vec<ColumnSpec>,
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::defaults()
    }
}

impl ColumnSet {
    pub fn defaults() -> Self {
        let columns = DEFAULT_ORDER
            .iter()
            .enumerate()
            .map(|(i, key)| ColumnSpec {
                key: *key,
                label: key.default_label().to_string(),
                visible: true,
                order: i as u32,
            })
            .collect();
        Self { columns }
    }

    /// 以保存的配置覆盖默认值；保存中缺失的列沿用默认，未知列丢弃
    pub fn merge_saved(saved: &[SavedColumn]) -> Self {
        let mut set = Self::defaults();
        for column in set.columns.iter_mut() {
            let Some(s) = saved.iter().find(|s| s.key == column.key) else {
                continue;
            };
            if let Some(visible) = s.visible {
                column.visible = visible;
            }
            if let Some(order) = s.order {
                column.order = order;
            }
            if let Some(label) = s.label.as_ref().filter(|l| !l.is_empty()) {
                column.label = label.clone();
            }
        }
        set.sort();
        set
    }

    fn sort(&mut self) {
        self.columns
            .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.key.as_str().cmp(b.key.as_str())));
    }

    pub fn all(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn get(&self, key: FieldKey) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn label(&self, key: FieldKey) -> String {
        self.get(key)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| key.default_label().to_string())
    }

    pub fn visible(&self) -> Vec<&ColumnSpec> {
        self.columns.iter().filter(|c| c.visible).collect()
    }

    pub fn visible_keys(&self) -> Vec<FieldKey> {
        self.visible().into_iter().map(|c| c.key).collect()
    }

    pub fn toggle(&mut self, key: FieldKey, visible: bool) -> bool {
        match self.columns.iter_mut().find(|c| c.key == key) {
            Some(column) => {
                column.visible = visible;
                true
            }
            None => false,
        }
    }

    /// 把 from 位置的列移到 to 位置，并把 order 重新编号为 0..n
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.columns.len() || to >= self.columns.len() {
            return false;
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.order = i as u32;
        }
        true
    }

    pub fn reset(&mut self) {
        *self = Self::defaults();
    }
}
