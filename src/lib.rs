pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use db::database::Database;
use db::state::PersistedState;
use models::settings::DashboardSettings;
use services::stock_data::{ProxyClient, RankingFetcher, RankingSource, VendorClient};

pub struct AppState {
    pub db: Arc<Database>,
    pub persisted: PersistedState,
    pub settings: DashboardSettings,
}

impl AppState {
    pub fn open(data_dir: PathBuf) -> Result<Self> {
        let db = Arc::new(Database::new(data_dir)?);
        let settings = match db.load_settings() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("加载看板设置失败，使用默认值: {}", e);
                DashboardSettings::default()
            }
        };
        Ok(Self {
            persisted: PersistedState::new(db.clone()),
            db,
            settings,
        })
    }

    /// 按设置选择数据源：配置了代理地址时经由代理，否则直连厂商
    pub fn ranking_source(&self, proxy_override: Option<&str>) -> Result<Arc<dyn RankingSource>> {
        let proxy = proxy_override.or(self.settings.proxy_url.as_deref());
        let source: Arc<dyn RankingSource> = match proxy {
            Some(url) => {
                log::info!("通过代理拉取排行数据: {}", url);
                Arc::new(ProxyClient::new(url)?)
            }
            None => Arc::new(VendorClient::new(&self.settings.vendor_url)?),
        };
        Ok(source)
    }

    pub fn fetcher(&self, proxy_override: Option<&str>) -> Result<RankingFetcher<Arc<dyn RankingSource>>> {
        let source = self.ranking_source(proxy_override)?;
        Ok(RankingFetcher::new(source)
            .with_page_delay(Duration::from_millis(self.settings.page_delay_ms)))
    }
}
