use serde::{Deserialize, Serialize};

pub const DEFAULT_VENDOR_URL: &str = "https://apphq.longhuvip.com/w1/api/index.php";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    /// 分页请求之间的固定间隔
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
    #[serde(default = "default_vendor_url")]
    pub vendor_url: String,
    /// 为空时直接请求厂商接口，否则经由本地代理
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default = "default_bind")]
    pub proxy_bind: String,
    #[serde(default)]
    pub range_start: Option<String>,
    #[serde(default)]
    pub range_end: Option<String>,
}

fn default_refresh_interval() -> u64 { 30 }
fn default_true() -> bool { true }
fn default_page_delay() -> u64 { 100 }
fn default_vendor_url() -> String { DEFAULT_VENDOR_URL.to_string() }
fn default_bind() -> String { "127.0.0.1:3000".to_string() }

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            auto_refresh: true,
            page_delay_ms: default_page_delay(),
            vendor_url: default_vendor_url(),
            proxy_url: None,
            proxy_bind: default_bind(),
            range_start: None,
            range_end: None,
        }
    }
}

impl DashboardSettings {
    /// 区间数据的起止时刻，未配置时取前两个可选时刻（0925-0930）
    pub fn range_window(&self) -> (String, String) {
        let options = time_options();
        let start = self.range_start.clone().unwrap_or_else(|| options[0].clone());
        let end = self.range_end.clone().unwrap_or_else(|| options[1].clone());
        (start, end)
    }
}

/// 区间选择可用时刻：0925 加上盘中每 5 分钟一个刻度（HHMM）
pub fn time_options() -> Vec<String> {
    let mut options = vec!["0925".to_string()];
    let sessions = [(9 * 60 + 30, 11 * 60 + 30), (13 * 60, 15 * 60)];
    for (start, end) in sessions {
        let mut minute = start;
        while minute <= end {
            options.push(format!("{:02}{:02}", minute / 60, minute % 60));
            minute += 5;
        }
    }
    options
}

pub fn is_time_option(value: &str) -> bool {
    time_options().iter().any(|o| o == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_take_defaults() {
        let settings: DashboardSettings = serde_json::from_str(r#"{"auto_refresh":false}"#).unwrap();
        assert!(!settings.auto_refresh);
        assert_eq!(settings.refresh_interval_secs, 30);
        assert_eq!(settings.page_delay_ms, 100);
        assert_eq!(settings.vendor_url, DEFAULT_VENDOR_URL);
    }

    #[test]
    fn test_time_options_bounds() {
        let options = time_options();
        assert_eq!(options[0], "0925");
        assert_eq!(options[1], "0930");
        assert_eq!(options.last().map(String::as_str), Some("1500"));
        assert!(is_time_option("1130"));
        assert!(!is_time_option("1200"));
        assert_eq!(DashboardSettings::default().range_window(), ("0925".to_string(), "0930".to_string()));
    }
}
