use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

const ANDROID_UA: &str = "Dalvik/2.1.0 (Linux; U; Android 14; V2178A Build/UP1A.231005.007)";
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 排行榜厂商实时接口 HTTP client（模拟 App 端请求头）
/// 不设置超时，沿用传输层默认行为
pub fn build_vendor_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(ANDROID_UA));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .gzip(true)
        .build()?;
    Ok(client)
}

/// 区间接口使用桌面浏览器 UA
pub fn build_range_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DESKTOP_UA));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .gzip(true)
        .build()?;
    Ok(client)
}

/// 访问本地代理 /api/* 的 client
pub fn build_proxy_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;
    Ok(client)
}
