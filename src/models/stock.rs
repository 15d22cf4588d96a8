use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// 板块字段中多个板块名之间的分隔符
pub const SECTOR_DELIMITER: char = '、';

/// 厂商分页接口每页行数（page × 60 = index）
pub const PAGE_SIZE: u32 = 60;

/// 排行榜字段标识，序列化为前端一致的 camelCase 名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Code,
    Name,
    Sector,
    CurrentPrice,
    ChangePercent,
    Turnover,
    ActualTurnoverRate,
    ChangeSpeed,
    ActualCirculation,
    MainBuy,
    MainSell,
    MainNetAmount,
    MainBuyRatio,
    MainSellRatio,
    NetTurnoverRatio,
    BuyFlowRatio,
    SellFlowRatio,
    NetFlowRatio,
    RangeChangePercent,
    VolumeRatio,
    ConsecutiveBoard,
    Amplitude,
    TotalMarketValue,
    CirculatingMarketValue,
    LimitUpLabel,
    InstitutionIncreaseAmount,
    TwoMinuteTurnover,
    Popularity,
}

impl FieldKey {
    pub const ALL: [FieldKey; 28] = [
        FieldKey::Code,
        FieldKey::Name,
        FieldKey::Sector,
        FieldKey::CurrentPrice,
        FieldKey::ChangePercent,
        FieldKey::Turnover,
        FieldKey::ActualTurnoverRate,
        FieldKey::ChangeSpeed,
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
        FieldKey::TwoMinuteTurnover,
        FieldKey::Popularity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Code => "code",
            FieldKey::Name => "name",
            FieldKey::Sector => "sector",
            FieldKey::CurrentPrice => "currentPrice",
            FieldKey::ChangePercent => "changePercent",
            FieldKey::Turnover => "turnover",
            FieldKey::ActualTurnoverRate => "actualTurnoverRate",
            FieldKey::ChangeSpeed => "changeSpeed",
            FieldKey::ActualCirculation => "actualCirculation",
            FieldKey::MainBuy => "mainBuy",
            FieldKey::MainSell => "mainSell",
            FieldKey::MainNetAmount => "mainNetAmount",
            FieldKey::MainBuyRatio => "mainBuyRatio",
            FieldKey::MainSellRatio => "mainSellRatio",
            FieldKey::NetTurnoverRatio => "netTurnoverRatio",
            FieldKey::BuyFlowRatio => "buyFlowRatio",
            FieldKey::SellFlowRatio => "sellFlowRatio",
            FieldKey::NetFlowRatio => "netFlowRatio",
            FieldKey::RangeChangePercent => "rangeChangePercent",
            FieldKey::VolumeRatio => "volumeRatio",
            FieldKey::ConsecutiveBoard => "consecutiveBoard",
            FieldKey::Amplitude => "amplitude",
            FieldKey::TotalMarketValue => "totalMarketValue",
            FieldKey::CirculatingMarketValue => "circulatingMarketValue",
            FieldKey::LimitUpLabel => "limitUpLabel",
            FieldKey::InstitutionIncreaseAmount => "institutionIncreaseAmount",
            FieldKey::TwoMinuteTurnover => "twoMinuteTurnover",
            FieldKey::Popularity => "popularity",
        }
    }

    /// 厂商返回的位置数组中该字段所在下标
    pub fn vendor_index(&self) -> usize {
        match self {
            FieldKey::Code => 0,
            FieldKey::Name => 1,
            FieldKey::Sector => 4,
            FieldKey::CurrentPrice => 5,
            FieldKey::ChangePercent => 6,
            FieldKey::Turnover => 7,
            FieldKey::ActualTurnoverRate => 8,
            FieldKey::ChangeSpeed => 9,
            FieldKey::ActualCirculation => 10,
            FieldKey::MainBuy => 11,
            FieldKey::MainSell => 12,
            FieldKey::MainNetAmount => 13,
            FieldKey::MainBuyRatio => 14,
            FieldKey::MainSellRatio => 15,
            FieldKey::NetTurnoverRatio => 16,
            FieldKey::BuyFlowRatio => 17,
            FieldKey::SellFlowRatio => 18,
            FieldKey::NetFlowRatio => 19,
            FieldKey::RangeChangePercent => 20,
            FieldKey::VolumeRatio => 21,
            FieldKey::ConsecutiveBoard => 23,
            FieldKey::Amplitude => 33,
            FieldKey::TotalMarketValue => 37,
            FieldKey::CirculatingMarketValue => 38,
            FieldKey::LimitUpLabel => 39,
            FieldKey::InstitutionIncreaseAmount => 42,
            FieldKey::TwoMinuteTurnover => 55,
            FieldKey::Popularity => 58,
        }
    }

    /// 默认列标题
    pub fn default_label(&self) -> &'static str {
        match self {
            FieldKey::Code => "代码",
            FieldKey::Name => "名称",
            FieldKey::Sector => "板块",
            FieldKey::CurrentPrice => "现价",
            FieldKey::ChangePercent => "涨幅(%)",
            FieldKey::Turnover => "成交额",
            FieldKey::ActualTurnoverRate => "实换手(%)",
            FieldKey::ChangeSpeed => "涨速",
            FieldKey::ActualCirculation => "实流通",
            FieldKey::MainBuy => "主买",
            FieldKey::MainSell => "主卖",
            FieldKey::MainNetAmount => "净额",
            FieldKey::MainBuyRatio => "主买(%)",
            FieldKey::MainSellRatio => "主卖(%)",
            FieldKey::NetTurnoverRatio => "净成(%)",
            FieldKey::BuyFlowRatio => "买流(%)",
            FieldKey::SellFlowRatio => "卖流(%)",
            FieldKey::NetFlowRatio => "净流(%)",
            FieldKey::RangeChangePercent => "区间涨幅(%)",
            FieldKey::VolumeRatio => "量比",
            FieldKey::ConsecutiveBoard => "连板",
            FieldKey::Amplitude => "振幅(%)",
            FieldKey::TotalMarketValue => "总市值",
            FieldKey::CirculatingMarketValue => "流通值",
            FieldKey::LimitUpLabel => "涨停标签",
            FieldKey::InstitutionIncreaseAmount => "最近季度机构增仓",
            FieldKey::TwoMinuteTurnover => "2分钟成交额",
            FieldKey::Popularity => "人气值",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FieldKey::Code
                | FieldKey::Name
                | FieldKey::Sector
                | FieldKey::ConsecutiveBoard
                | FieldKey::LimitUpLabel
        )
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FieldKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("未知字段: {}", s))
    }
}

/// 单元格取值：文本、数值或缺失
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

impl<'a> FieldValue<'a> {
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Missing => None,
        }
    }
}

/// 排行榜单只股票快照（一次拉取后不可变，刷新时整体替换）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StockRecord {
    pub code: String,
    pub name: String,
    pub sector: String,                             // 板块，多个用顿号分隔
    pub current_price: Option<f64>,                 // 现价
    pub change_percent: Option<f64>,                // 涨幅 %
    pub turnover: Option<f64>,                      // 成交额（元）
    pub actual_turnover_rate: Option<f64>,          // 实际换手 %
    pub change_speed: Option<f64>,                  // 涨速
    pub actual_circulation: Option<f64>,            // 实际流通
    pub main_buy: Option<f64>,                      // 主力买
    pub main_sell: Option<f64>,                     // 主力卖
    pub main_net_amount: Option<f64>,               // 主力净额
    pub main_buy_ratio: Option<f64>,                // 主买占比
    pub main_sell_ratio: Option<f64>,               // 主卖占比
    pub net_turnover_ratio: Option<f64>,            // 净成占比
    pub buy_flow_ratio: Option<f64>,                // 买流占比
    pub sell_flow_ratio: Option<f64>,               // 卖流占比
    pub net_flow_ratio: Option<f64>,                // 净流占比
    pub range_change_percent: Option<f64>,          // 区间涨幅
    pub volume_ratio: Option<f64>,                  // 量比
    pub consecutive_board: String,                  // 连板说明
    pub amplitude: Option<f64>,                     // 振幅
    pub total_market_value: Option<f64>,            // 总市值
    pub circulating_market_value: Option<f64>,      // 流通值
    pub limit_up_label: String,                     // 涨停标签
    pub institution_increase_amount: Option<f64>,   // 机构增仓金额
    pub two_minute_turnover: Option<f64>,           // 2分钟成交额
    pub popularity: Option<f64>,                    // 人气值
}

impl StockRecord {
    /// 按固定下标表把厂商位置数组映射为记录，表外下标忽略
    pub fn from_row(row: &[Value]) -> Self {
        let mut record = StockRecord::default();
        for key in FieldKey::ALL {
            let cell = row.get(key.vendor_index()).unwrap_or(&Value::Null);
            if key.is_text() {
                *record.text_mut(key) = cell_text(cell);
            } else {
                *record.number_mut(key) = cell_number(cell);
            }
        }
        record
    }

    pub fn field(&self, key: FieldKey) -> FieldValue<'_> {
        match key {
            FieldKey::Code => FieldValue::Text(&self.code),
            FieldKey::Name => FieldValue::Text(&self.name),
            FieldKey::Sector => FieldValue::Text(&self.sector),
            FieldKey::ConsecutiveBoard => FieldValue::Text(&self.consecutive_board),
            FieldKey::LimitUpLabel => FieldValue::Text(&self.limit_up_label),
            _ => match self.number(key) {
                Some(v) => FieldValue::Number(v),
                None => FieldValue::Missing,
            },
        }
    }

    /// 数值字段；文本字段返回 None
    pub fn number(&self, key: FieldKey) -> Option<f64> {
        match key {
            FieldKey::CurrentPrice => self.current_price,
            FieldKey::ChangePercent => self.change_percent,
            FieldKey::Turnover => self.turnover,
            FieldKey::ActualTurnoverRate => self.actual_turnover_rate,
            FieldKey::ChangeSpeed => self.change_speed,
            FieldKey::ActualCirculation => self.actual_circulation,
            FieldKey::MainBuy => self.main_buy,
            FieldKey::MainSell => self.main_sell,
            FieldKey::MainNetAmount => self.main_net_amount,
            FieldKey::MainBuyRatio => self.main_buy_ratio,
            FieldKey::MainSellRatio => self.main_sell_ratio,
            FieldKey::NetTurnoverRatio => self.net_turnover_ratio,
            FieldKey::BuyFlowRatio => self.buy_flow_ratio,
            FieldKey::SellFlowRatio => self.sell_flow_ratio,
            FieldKey::NetFlowRatio => self.net_flow_ratio,
            FieldKey::RangeChangePercent => self.range_change_percent,
            FieldKey::VolumeRatio => self.volume_ratio,
            FieldKey::Amplitude => self.amplitude,
            FieldKey::TotalMarketValue => self.total_market_value,
            FieldKey::CirculatingMarketValue => self.circulating_market_value,
            FieldKey::InstitutionIncreaseAmount => self.institution_increase_amount,
            FieldKey::TwoMinuteTurnover => self.two_minute_turnover,
            FieldKey::Popularity => self.popularity,
            FieldKey::Code
            | FieldKey::Name
            | FieldKey::Sector
            | FieldKey::ConsecutiveBoard
            | FieldKey::LimitUpLabel => None,
        }
    }

    fn text_mut(&mut self, key: FieldKey) -> &mut String {
        match key {
            FieldKey::Code => &mut self.code,
            FieldKey::Name => &mut self.name,
            FieldKey::ConsecutiveBoard => &mut self.consecutive_board,
            FieldKey::LimitUpLabel => &mut self.limit_up_label,
            _ => &mut self.sector,
        }
    }

    fn number_mut(&mut self, key: FieldKey) -> &mut Option<f64> {
        match key {
            FieldKey::CurrentPrice => &mut self.current_price,
            FieldKey::ChangePercent => &mut self.change_percent,
            FieldKey::Turnover => &mut self.turnover,
            FieldKey::ActualTurnoverRate => &mut self.actual_turnover_rate,
            FieldKey::ChangeSpeed => &mut self.change_speed,
            FieldKey::ActualCirculation => &mut self.actual_circulation,
            FieldKey::MainBuy => &mut self.main_buy,
            FieldKey::MainSell => &mut self.main_sell,
            FieldKey::MainNetAmount => &mut self.main_net_amount,
            FieldKey::MainBuyRatio => &mut self.main_buy_ratio,
            FieldKey::MainSellRatio => &mut self.main_sell_ratio,
            FieldKey::NetTurnoverRatio => &mut self.net_turnover_ratio,
            FieldKey::BuyFlowRatio => &mut self.buy_flow_ratio,
            FieldKey::SellFlowRatio => &mut self.sell_flow_ratio,
            FieldKey::NetFlowRatio => &mut self.net_flow_ratio,
            FieldKey::RangeChangePercent => &mut self.range_change_percent,
            FieldKey::VolumeRatio => &mut self.volume_ratio,
            FieldKey::Amplitude => &mut self.amplitude,
            FieldKey::TotalMarketValue => &mut self.total_market_value,
            FieldKey::CirculatingMarketValue => &mut self.circulating_market_value,
            FieldKey::InstitutionIncreaseAmount => &mut self.institution_increase_amount,
            FieldKey::TwoMinuteTurnover => &mut self.two_minute_turnover,
            _ => &mut self.popularity,
        }
    }

    /// 拆分后的板块名（去空白、去空项）
    pub fn sectors(&self) -> impl Iterator<Item = &str> {
        split_sectors(&self.sector)
    }

    /// ST 风险警示股
    pub fn is_st(&self) -> bool {
        self.name.contains("ST")
    }

    /// 东方财富个股行情页
    pub fn quote_url(&self) -> String {
        format!(
            "https://quote.eastmoney.com/{}.html#fullScreenChart",
            format_stock_code(&self.code)
        )
    }
}

pub fn split_sectors(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(SECTOR_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn cell_number(cell: &Value) -> Option<f64> {
    match cell {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn format_stock_code(code: &str) -> String {
    let code = code.trim().to_lowercase();
    if code.starts_with("sh") || code.starts_with("sz") || code.starts_with("bj") {
        return code;
    }
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return code;
    }
    match digits.chars().next() {
        Some('6') => format!("sh{}", digits),
        Some('8') | Some('9') | Some('4') => format!("bj{}", digits),
        _ => format!("sz{}", digits),
    }
}

/// 厂商排行接口返回结构（未列出的成员原样保留，供代理透传）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorResponse {
    #[serde(default, deserialize_with = "string_or_number")]
    pub errcode: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub list: Vec<Vec<Value>>,
    #[serde(rename = "Count", default, deserialize_with = "lenient_count")]
    pub count: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl VendorResponse {
    pub fn records(&self) -> Vec<StockRecord> {
        self.list.iter().map(|row| StockRecord::from_row(row)).collect()
    }
}

/// 读取 errcode，兼容字符串与数字两种写法
pub fn errcode_of(value: &Value) -> String {
    match value.get("errcode") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Vec<Value>>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Count 为 null、字符串或小数时按数值读取，无法识别记为 0
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
