//! 单元格格式化与涨跌配色。
//!
//! 每个字段在 [`field_rule`] 中恰好对应一条格式规则和一条配色规则。
//! 配色遵循 A 股习惯：红涨（买）绿跌（卖）。

use crate::models::stock::{FieldKey, FieldValue, StockRecord};

pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRule {
    Text,
    /// 两位小数
    Price,
    /// 正数带 `+`，两位小数加 `%`
    SignedPercent,
    /// 取绝对值，两位小数加 `%`
    UnsignedPercent,
    /// 始终显示为负：`-` + 绝对值 + `%`
    NegatedPercent,
    Decimal2,
    /// 千/万/亿单位换算
    Currency,
    /// 千位分隔，最多两位小数
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRule {
    /// 正红负绿，零为常规色
    Signed,
    /// 固定绿色
    PinnedFall,
    /// 负数标红，其余常规色
    NegativeRise,
    Neutral,
    Pinned(ColorClass),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    Rise,
    Fall,
    Primary,
    Secondary,
    Info,
    Highlight,
}

impl ColorClass {
    /// 终端 ANSI 前景色
    pub fn ansi(&self) -> &'static str {
        match self {
            ColorClass::Rise => "\x1b[31m",
            ColorClass::Fall => "\x1b[32m",
            ColorClass::Primary => "\x1b[0m",
            ColorClass::Secondary => "\x1b[90m",
            ColorClass::Info => "\x1b[34m",
            ColorClass::Highlight => "\x1b[33m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub format: FormatRule,
    pub color: ColorRule,
}

const fn rule(format: FormatRule, color: ColorRule) -> FieldRule {
    FieldRule { format, color }
}

pub fn field_rule(key: FieldKey) -> FieldRule {
    use ColorRule::*;
    use FormatRule::*;

    match key {
        FieldKey::Code | FieldKey::Name | FieldKey::ConsecutiveBoard => rule(Text, Neutral),
        FieldKey::Sector => rule(Text, Pinned(ColorClass::Info)),
        FieldKey::LimitUpLabel => rule(Text, Pinned(ColorClass::Highlight)),

        FieldKey::CurrentPrice => rule(Price, Neutral),
        FieldKey::ChangePercent | FieldKey::RangeChangePercent | FieldKey::ChangeSpeed => {
            rule(SignedPercent, Signed)
        }

        FieldKey::MainNetAmount | FieldKey::MainBuy | FieldKey::MainSell => rule(Currency, Signed),
        FieldKey::InstitutionIncreaseAmount => rule(Currency, Signed),
        FieldKey::Turnover
        | FieldKey::ActualCirculation
        | FieldKey::TotalMarketValue
        | FieldKey::CirculatingMarketValue => rule(Currency, NegativeRise),
        FieldKey::TwoMinuteTurnover => rule(Currency, Neutral),

        FieldKey::MainBuyRatio | FieldKey::BuyFlowRatio | FieldKey::NetFlowRatio => {
            rule(UnsignedPercent, Signed)
        }
        // 卖出占比按约定始终以负数展示并固定绿色
        FieldKey::MainSellRatio | FieldKey::SellFlowRatio => rule(NegatedPercent, PinnedFall),

        FieldKey::VolumeRatio => rule(Decimal2, Neutral),
        FieldKey::Amplitude => rule(UnsignedPercent, Neutral),
        FieldKey::ActualTurnoverRate | FieldKey::NetTurnoverRatio | FieldKey::Popularity => {
            rule(Number, Neutral)
        }
    }
}

/// 单元格展示文本，缺失值为 `-`
pub fn format_value(key: FieldKey, value: FieldValue<'_>) -> String {
    if value.is_missing() {
        return PLACEHOLDER.to_string();
    }

    let rule = field_rule(key).format;
    let v = match (rule, value) {
        (FormatRule::Text, FieldValue::Number(v)) => return format_number(v),
        (FormatRule::Text, FieldValue::Text(s)) => return s.to_string(),
        (_, other) => match other.as_f64() {
            Some(v) => v,
            // 非数字文本原样输出
            None => return text_or_placeholder(other),
        },
    };

    match rule {
        FormatRule::Text => format_number(v),
        FormatRule::Price | FormatRule::Decimal2 => format!("{:.2}", v),
        FormatRule::SignedPercent => format_percent(v),
        FormatRule::UnsignedPercent => format!("{:.2}%", v.abs()),
        FormatRule::NegatedPercent => format!("-{:.2}%", v.abs()),
        FormatRule::Currency => format_chinese_currency(v),
        FormatRule::Number => format_number(v),
    }
}

fn text_or_placeholder(value: FieldValue<'_>) -> String {
    match value {
        FieldValue::Text(s) => s.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn format_cell(record: &StockRecord, key: FieldKey) -> String {
    format_value(key, record.field(key))
}

pub fn value_color(key: FieldKey, value: FieldValue<'_>) -> ColorClass {
    if value.is_missing() {
        return ColorClass::Secondary;
    }
    let n = value.as_f64().unwrap_or(0.0);

    match field_rule(key).color {
        ColorRule::Signed => {
            if n > 0.0 {
                ColorClass::Rise
            } else if n < 0.0 {
                ColorClass::Fall
            } else {
                ColorClass::Primary
            }
        }
        ColorRule::PinnedFall => ColorClass::Fall,
        ColorRule::NegativeRise => {
            if n < 0.0 {
                ColorClass::Rise
            } else {
                ColorClass::Primary
            }
        }
        ColorRule::Neutral => ColorClass::Primary,
        ColorRule::Pinned(class) => class,
    }
}

pub fn cell_color(record: &StockRecord, key: FieldKey) -> ColorClass {
    value_color(key, record.field(key))
}

/// 格式化为亿/万/千单位
pub fn format_chinese_currency(value: f64) -> String {
    let abs = value.abs();
    if abs >= 100_000_000.0 {
        format!("{:.2}亿", value / 100_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.2}万", value / 10_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.2}千", value / 1_000.0)
    } else {
        format!("{:.2}", value)
    }
}

pub fn format_percent(value: f64) -> String {
    let sign = if value > 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, value)
}

/// 千位分隔，去掉多余的小数零（1234.5 -> "1,234.5"）
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && (int_part != "0" || !frac.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}
