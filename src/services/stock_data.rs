use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::FetchError;
use crate::models::stock::{errcode_of, StockRecord, VendorResponse, PAGE_SIZE};
use crate::utils::http::{build_proxy_client, build_range_client, build_vendor_client};

const DEVICE_ID: &str = "20ad85ca-becb-3bed-b3d4-30032a0f5923";
const REALTIME_VERSION: &str = "5.22.0.2";
const RANGE_VERSION: &str = "5.8.0.2";

/// 要拉取的数据集：实时排行或某个时间区间的排行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingQuery {
    RealTime,
    Range { start: String, end: String },
}

impl RankingQuery {
    pub fn label(&self) -> &'static str {
        match self {
            RankingQuery::RealTime => "实时",
            RankingQuery::Range { .. } => "区间",
        }
    }
}

/// 单页数据源。page 为页序号，对应厂商 index = page × 60
#[async_trait]
pub trait RankingSource: Send + Sync {
    async fn fetch_page(&self, query: &RankingQuery, page: u32) -> Result<VendorResponse, FetchError>;
}

#[async_trait]
impl<T: RankingSource + ?Sized> RankingSource for Arc<T> {
    async fn fetch_page(&self, query: &RankingQuery, page: u32) -> Result<VendorResponse, FetchError> {
        (**self).fetch_page(query, page).await
    }
}

/// 直连厂商排行接口
pub struct VendorClient {
    realtime: reqwest::Client,
    range: reqwest::Client,
    base_url: String,
}

impl VendorClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            realtime: build_vendor_client()?,
            range: build_range_client()?,
            base_url: base_url.to_string(),
        })
    }

    fn params(version: &str, page: u32) -> Vec<(&'static str, String)> {
        let index = page as u64 * PAGE_SIZE as u64;
        vec![
            ("Order", "1".to_string()),
            ("a", "RealRankingInfo_W8".to_string()),
            ("st", PAGE_SIZE.to_string()),
            ("c", "NewStockRanking".to_string()),
            ("PhoneOSNew", "1".to_string()),
            ("DeviceID", DEVICE_ID.to_string()),
            ("VerSion", version.to_string()),
            ("index", index.to_string()),
            ("apiv", "w29".to_string()),
            ("Type", "1".to_string()),
            ("FilterMotherboard", "0".to_string()),
            ("Filter", "0".to_string()),
            ("Ratio", "6".to_string()),
            ("FilterTIB", "0".to_string()),
            ("FilterGem", "0".to_string()),
        ]
    }
}

#[async_trait]
impl RankingSource for VendorClient {
    async fn fetch_page(&self, query: &RankingQuery, page: u32) -> Result<VendorResponse, FetchError> {
        let resp = match query {
            RankingQuery::RealTime => {
                // 实时接口以表单 POST 提交参数
                let params = Self::params(REALTIME_VERSION, page);
                self.realtime
                    .post(&self.base_url)
                    .header(
                        reqwest::header::CONTENT_TYPE,
                        "application/x-www-form-urlencoded; charset=UTF-8",
                    )
                    .form(&params)
                    .send()
                    .await?
            }
            RankingQuery::Range { start, end } => {
                let mut params = Self::params(RANGE_VERSION, page);
                params.push(("RStart", start.clone()));
                params.push(("REnd", end.clone()));
                self.range.get(&self.base_url).query(&params).send().await?
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let text = resp.text().await?;
        parse_vendor_body(&text)
    }
}

/// 经由本地代理 /api/real-time 与 /api/range-data 拉取
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_proxy_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, query: &RankingQuery, page: u32) -> String {
        match query {
            RankingQuery::RealTime => format!("{}/api/real-time?page={}", self.base_url, page),
            RankingQuery::Range { start, end } => format!(
                "{}/api/range-data?page={}&startTime={}&endTime={}",
                self.base_url,
                page,
                urlencoding::encode(start),
                urlencoding::encode(end)
            ),
        }
    }
}

#[async_trait]
impl RankingSource for ProxyClient {
    async fn fetch_page(&self, query: &RankingQuery, page: u32) -> Result<VendorResponse, FetchError> {
        let resp = self.client.get(self.page_url(query, page)).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            // 代理错误体为 {"error": "..."}，取不到时退回状态描述
            let reason = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason,
            });
        }

        parse_vendor_body(&text)
    }
}

/// 先在原始 JSON 上检查 errcode，再解析列表结构；错误响应的 list/Count 可能为 null 或缺失
fn parse_vendor_body(text: &str) -> Result<VendorResponse, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| FetchError::Format(e.to_string()))?;
    let errcode = errcode_of(&value);
    if errcode != "0" {
        return Err(FetchError::Vendor(errcode));
    }
    serde_json::from_value(value).map_err(|e| FetchError::Format(e.to_string()))
}

/// 分页拉取器：顺序请求直到累计偏移量达到总数或某页为空
pub struct RankingFetcher<S> {
    source: S,
    page_delay: Duration,
}

impl<S: RankingSource> RankingFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            page_delay: Duration::from_millis(100),
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// 拉取单页，返回 (记录, 厂商报告的总数)
    pub async fn fetch_one(&self, query: &RankingQuery, page: u32) -> Result<(Vec<StockRecord>, u64), FetchError> {
        let resp = self.source.fetch_page(query, page).await?;
        Ok((resp.records(), resp.count))
    }

    /// 一次性拉取全部分页。任何一页失败都会丢弃已拉取的数据并返回错误，不做重试
    pub async fn fetch_all(&self, query: &RankingQuery) -> Result<Vec<StockRecord>, FetchError> {
        let mut all = Vec::new();
        let mut page: u32 = 0;
        let mut total: u64 = 0;

        loop {
            let resp = match self.source.fetch_page(query, page).await {
                Ok(resp) => resp,
                Err(e) => {
                    log::warn!("获取{}数据失败（第 {} 页）: {}", query.label(), page, e);
                    return Err(e);
                }
            };

            // 总数只在第一页确定
            if page == 0 {
                total = resp.count;
            }

            let rows = resp.list.len();
            all.extend(resp.records());

            page += 1;
            let next_index = page as u64 * PAGE_SIZE as u64;
            if next_index >= total || rows == 0 {
                break;
            }

            sleep(self.page_delay).await;
        }

        log::info!("成功获取 {} 条{}数据，总数据量: {}", all.len(), query.label(), total);
        Ok(all)
    }
}
