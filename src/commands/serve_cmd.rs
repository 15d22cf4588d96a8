use anyhow::Result;
use std::sync::Arc;

use crate::services::proxy;
use crate::services::stock_data::VendorClient;
use crate::AppState;

/// 启动本地排行代理，上游固定为厂商接口
pub async fn serve(state: &AppState, bind: Option<String>) -> Result<()> {
    let bind = bind.unwrap_or_else(|| state.settings.proxy_bind.clone());
    let upstream = VendorClient::new(&state.settings.vendor_url)?;
    proxy::serve(&bind, Arc::new(upstream)).await
}
