//! 分页拉取测试：使用内存数据源模拟厂商接口

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ranking_lib::error::FetchError;
use ranking_lib::models::stock::VendorResponse;
use ranking_lib::services::dataset::{refresh, DatasetStore};
use ranking_lib::services::stock_data::{RankingFetcher, RankingQuery, RankingSource};

/// 按 Count 返回分页数据；可指定某页失败或返回空页
struct FakeSource {
    count: u64,
    fail_on: Option<u32>,
    empty_from: Option<u32>,
    calls: Mutex<Vec<u32>>,
}

impl FakeSource {
    fn new(count: u64) -> Self {
        Self {
            count,
            fail_on: None,
            empty_from: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

fn row(index: u64) -> Vec<Value> {
    let mut row = vec![Value::Null; 60];
    row[0] = json!(format!("{:06}", index));
    row[1] = json!(format!("股票{}", index));
    row[6] = json!(index as f64);
    row
}

#[async_trait]
impl RankingSource for FakeSource {
    async fn fetch_page(&self, _query: &RankingQuery, page: u32) -> Result<VendorResponse, FetchError> {
        self.calls.lock().unwrap().push(page);

        if self.fail_on == Some(page) {
            return Err(FetchError::Http {
                status: 502,
                reason: "Bad Gateway".to_string(),
            });
        }

        let offset = page as u64 * 60;
        let list = if self.empty_from.is_some_and(|p| page >= p) {
            Vec::new()
        } else {
            (offset..(offset + 60).min(self.count)).map(row).collect()
        };

        Ok(VendorResponse {
            errcode: "0".to_string(),
            list,
            count: self.count,
            ..Default::default()
        })
    }
}

// ==================== 分页终止条件 ====================

#[tokio::test(start_paused = true)]
async fn test_count_130_requests_three_pages() {
    let source = Arc::new(FakeSource::new(130));
    let fetcher = RankingFetcher::new(source.clone());

    let records = fetcher.fetch_all(&RankingQuery::RealTime).await.unwrap();
    assert_eq!(records.len(), 130);
    assert_eq!(source.calls(), vec![0, 1, 2], "应依次请求偏移 0/60/120");
    assert_eq!(records[0].code, "000000");
    assert_eq!(records[129].code, "000129");
}

#[tokio::test(start_paused = true)]
async fn test_exact_multiple_stops_without_extra_request() {
    let source = Arc::new(FakeSource::new(120));
    let fetcher = RankingFetcher::new(source.clone());
    let records = fetcher.fetch_all(&RankingQuery::RealTime).await.unwrap();
    assert_eq!(records.len(), 120);
    assert_eq!(source.calls(), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_page_stops_pagination() {
    let mut fake = FakeSource::new(1_000);
    fake.empty_from = Some(2);
    let source = Arc::new(fake);
    let fetcher = RankingFetcher::new(source.clone());

    let records = fetcher.fetch_all(&RankingQuery::RealTime).await.unwrap();
    assert_eq!(records.len(), 120);
    assert_eq!(source.calls(), vec![0, 1, 2], "空页之后不应继续请求");
}

#[tokio::test(start_paused = true)]
async fn test_zero_count_single_request() {
    let source = Arc::new(FakeSource::new(0));
    let fetcher = RankingFetcher::new(source.clone());
    let records = fetcher.fetch_all(&RankingQuery::RealTime).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(source.calls(), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn test_page_error_aborts_whole_sequence() {
    let mut fake = FakeSource::new(300);
    fake.fail_on = Some(2);
    let source = Arc::new(fake);
    let fetcher = RankingFetcher::new(source.clone());

    let err = fetcher
        .fetch_all(&RankingQuery::Range {
            start: "0925".to_string(),
            end: "0930".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");
    assert_eq!(source.calls(), vec![0, 1, 2], "失败后不重试也不继续");
}

#[tokio::test(start_paused = true)]
async fn test_pages_are_spaced_by_delay() {
    let source = Arc::new(FakeSource::new(180));
    let fetcher = RankingFetcher::new(source.clone()).with_page_delay(Duration::from_secs(1));

    let started = tokio::time::Instant::now();
    fetcher.fetch_all(&RankingQuery::RealTime).await.unwrap();
    // 3 页之间两次间隔
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3), "实际耗时 {:?}", elapsed);
}

// ==================== 数据集刷新 ====================

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_keeps_previous_records() {
    let good = RankingFetcher::new(Arc::new(FakeSource::new(70)));
    let store = DatasetStore::new();
    assert!(refresh(&good, &store, &RankingQuery::RealTime).await);
    assert_eq!(store.snapshot().records.len(), 70);

    let mut broken = FakeSource::new(70);
    broken.fail_on = Some(0);
    let bad = RankingFetcher::new(Arc::new(broken));
    assert!(refresh(&bad, &store, &RankingQuery::RealTime).await, "最新一次失败应显示错误");

    let data = store.snapshot();
    assert_eq!(data.records.len(), 70, "失败时保留上一次数据");
    assert_eq!(data.error.as_deref(), Some("HTTP 502: Bad Gateway"));
    assert_eq!(data.in_flight, 0);
}
