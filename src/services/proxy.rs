//! 本地 HTTP 代理，把浏览器端不便直接发起的厂商请求转为同源接口：
//! - `GET /api/real-time?page=N`
//! - `GET /api/range-data?page=N&startTime=S&endTime=E`

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::error::ProxyError;
use crate::models::stock::VendorResponse;
use crate::services::stock_data::{RankingQuery, RankingSource};

#[derive(Clone)]
pub struct ProxyState {
    source: Arc<dyn RankingSource>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn build_router(source: Arc<dyn RankingSource>) -> Router {
    Router::new()
        .route("/api/real-time", get(real_time))
        .route("/api/range-data", get(range_data))
        .with_state(ProxyState { source })
}

/// 缺省或无法解析时为第 0 页
fn page_param(params: &HashMap<String, String>) -> u32 {
    params
        .get("page")
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0)
}

async fn real_time(
    State(state): State<ProxyState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<VendorResponse>, ProxyError> {
    let page = page_param(&params);
    forward(&state, &RankingQuery::RealTime, page).await
}

async fn range_data(
    State(state): State<ProxyState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<VendorResponse>, ProxyError> {
    let start = params.get("startTime").filter(|s| !s.is_empty());
    let end = params.get("endTime").filter(|s| !s.is_empty());
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ProxyError::MissingRange);
    };

    let query = RankingQuery::Range {
        start: start.clone(),
        end: end.clone(),
    };
    forward(&state, &query, page_param(&params)).await
}

async fn forward(
    state: &ProxyState,
    query: &RankingQuery,
    page: u32,
) -> Result<Json<VendorResponse>, ProxyError> {
    match state.source.fetch_page(query, page).await {
        Ok(data) => Ok(Json(data)),
        Err(e) => {
            log::error!("API 代理错误（{}，第 {} 页）: {}", query.label(), page, e);
            Err(e.into())
        }
    }
}

/// 监听 bind 地址并提供代理服务，直到进程退出
pub async fn serve(bind: &str, source: Arc<dyn RankingSource>) -> anyhow::Result<()> {
    let app = build_router(source);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("排行代理已启动: http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
