//! 本地代理集成测试：随机端口启动 axum 服务，用 reqwest 与 ProxyClient 访问

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use ranking_lib::error::FetchError;
use ranking_lib::models::stock::VendorResponse;
use ranking_lib::services::proxy::build_router;
use ranking_lib::services::stock_data::{ProxyClient, RankingFetcher, RankingQuery, RankingSource, VendorClient};

#[derive(Clone, Copy)]
enum Mode {
    Ok,
    UpstreamStatus,
    VendorError,
    BadFormat,
}

struct StubSource {
    mode: Mode,
    seen: Mutex<Vec<(RankingQuery, u32)>>,
}

#[async_trait]
impl RankingSource for StubSource {
    async fn fetch_page(&self, query: &RankingQuery, page: u32) -> Result<VendorResponse, FetchError> {
        self.seen.lock().unwrap().push((query.clone(), page));
        match self.mode {
            Mode::Ok => {
                let body = json!({
                    "errcode": "0",
                    "Count": 2,
                    "list": [["600519", "贵州茅台"], ["000001", "平安银行"]],
                    "ttag": 0.02
                });
                Ok(serde_json::from_value(body).unwrap())
            }
            Mode::UpstreamStatus => Err(FetchError::Http {
                status: 503,
                reason: "Service Unavailable".to_string(),
            }),
            Mode::VendorError => Err(FetchError::Vendor("1001".to_string())),
            Mode::BadFormat => Err(FetchError::Format("list 不是数组".to_string())),
        }
    }
}

async fn spawn_proxy(mode: Mode) -> (String, Arc<StubSource>) {
    let source = Arc::new(StubSource {
        mode,
        seen: Mutex::new(Vec::new()),
    });
    let app = build_router(source.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), source)
}

async fn get_json(url: &str) -> (u16, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ==================== 路由与参数 ====================

#[tokio::test]
async fn test_real_time_passes_vendor_body_through() {
    let (base, source) = spawn_proxy(Mode::Ok).await;
    let (status, body) = get_json(&format!("{}/api/real-time?page=3", base)).await;

    assert_eq!(status, 200);
    assert_eq!(body["Count"], json!(2));
    assert_eq!(body["list"][0][0], json!("600519"));
    assert_eq!(body["ttag"], json!(0.02), "未知成员应原样透传");
    assert_eq!(source.seen.lock().unwrap()[0], (RankingQuery::RealTime, 3));
}

#[tokio::test]
async fn test_page_defaults_to_zero() {
    let (base, source) = spawn_proxy(Mode::Ok).await;
    get_json(&format!("{}/api/real-time", base)).await;
    get_json(&format!("{}/api/real-time?page=abc", base)).await;
    let pages: Vec<u32> = source.seen.lock().unwrap().iter().map(|(_, p)| *p).collect();
    assert_eq!(pages, vec![0, 0]);
}

#[tokio::test]
async fn test_range_requires_both_times() {
    let (base, source) = spawn_proxy(Mode::Ok).await;
    let (status, body) = get_json(&format!("{}/api/range-data?page=0&startTime=0925", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("缺少 startTime 或 endTime 参数"));
    assert!(source.seen.lock().unwrap().is_empty(), "参数缺失时不应请求上游");

    let (status, _) = get_json(&format!("{}/api/range-data?startTime=0930&endTime=1000", base)).await;
    assert_eq!(status, 200);
    assert_eq!(
        source.seen.lock().unwrap()[0],
        (
            RankingQuery::Range {
                start: "0930".to_string(),
                end: "1000".to_string()
            },
            0
        )
    );
}

// ==================== 错误映射 ====================

#[tokio::test]
async fn test_upstream_status_is_propagated() {
    let (base, _) = spawn_proxy(Mode::UpstreamStatus).await;
    let (status, body) = get_json(&format!("{}/api/real-time", base)).await;
    assert_eq!(status, 503);
    assert_eq!(body["error"], json!("HTTP 503: Service Unavailable"));
}

#[tokio::test]
async fn test_vendor_errcode_maps_to_400() {
    let (base, _) = spawn_proxy(Mode::VendorError).await;
    let (status, body) = get_json(&format!("{}/api/real-time", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], json!("API 错误: 1001"));
}

#[tokio::test]
async fn test_other_failures_map_to_500() {
    let (base, _) = spawn_proxy(Mode::BadFormat).await;
    let (status, body) = get_json(&format!("{}/api/range-data?startTime=0925&endTime=0930", base)).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], json!("服务器内部错误"));
}

// ==================== 经由代理拉取 ====================

#[tokio::test]
async fn test_proxy_client_fetches_through_proxy() {
    let (base, _) = spawn_proxy(Mode::Ok).await;
    let fetcher = RankingFetcher::new(ProxyClient::new(&base).unwrap());
    let (records, total) = fetcher.fetch_one(&RankingQuery::RealTime, 0).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(records[1].name, "平安银行");

    let all = fetcher.fetch_all(&RankingQuery::RealTime).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_proxy_client_reports_proxy_error_body() {
    let (base, _) = spawn_proxy(Mode::VendorError).await;
    let client = ProxyClient::new(&base).unwrap();
    let err = client.fetch_page(&RankingQuery::RealTime, 0).await.unwrap_err();
    match err {
        FetchError::Http { status, reason } => {
            assert_eq!(status, 400);
            assert_eq!(reason, "API 错误: 1001");
        }
        other => panic!("意外的错误类型: {:?}", other),
    }
}

// ==================== 厂商原始响应 ====================

/// 以固定响应体模拟厂商接口，再在其前面挂上代理
async fn spawn_vendor_proxy(body: &'static str) -> String {
    let vendor = axum::Router::new().route("/", axum::routing::post(move || async move { body }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let vendor_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, vendor).await.unwrap();
    });

    let source = Arc::new(VendorClient::new(&format!("http://{}/", vendor_addr)).unwrap());
    let app = build_router(source);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_vendor_error_with_null_list_maps_to_400() {
    let base = spawn_vendor_proxy(r#"{"errcode":"1001","list":null,"Count":null}"#).await;
    let (status, body) = get_json(&format!("{}/api/real-time", base)).await;
    assert_eq!(status, 400, "errcode 非 0 时不应因 list 为 null 变成 500");
    assert_eq!(body["error"], json!("API 错误: 1001"));
}

#[tokio::test]
async fn test_vendor_null_count_is_accepted() {
    let base = spawn_vendor_proxy(r#"{"errcode":"0","list":[["600519","贵州茅台"]],"Count":null}"#).await;
    let fetcher = RankingFetcher::new(ProxyClient::new(&base).unwrap());
    let (records, total) = fetcher.fetch_one(&RankingQuery::RealTime, 0).await.unwrap();
    assert_eq!(total, 0);
    assert_eq!(records[0].code, "600519");
}
