use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::stock::StockRecord;
use crate::services::stock_data::{RankingFetcher, RankingQuery, RankingSource};

/// 当前数据集快照；刷新时整体替换，不做增量合并
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Arc<Vec<StockRecord>>,
    /// 已提交结果对应的刷新序号，0 表示尚未成功刷新过
    pub generation: u64,
    pub fetched_at: Option<DateTime<Local>>,
    /// 唯一的错误提示，成功提交后清空
    pub error: Option<String>,
    pub in_flight: usize,
}

/// 数据集发布点。每次刷新开始时领取序号，只有序号比已提交结果更新的刷新才能覆盖数据，
/// 因此较慢的旧刷新不会覆盖较新的结果。
pub struct DatasetStore {
    tx: watch::Sender<Dataset>,
    next_ticket: AtomicU64,
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Dataset::default());
        Self {
            tx,
            next_ticket: AtomicU64::new(0),
        }
    }

    /// 以缓存数据初始化（generation 仍为 0，任何刷新都能覆盖）
    pub fn with_records(records: Vec<StockRecord>) -> Self {
        let store = Self::new();
        store.tx.send_modify(|d| d.records = Arc::new(records));
        store
    }

    pub fn subscribe(&self) -> watch::Receiver<Dataset> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Dataset {
        self.tx.borrow().clone()
    }

    /// 开始一次刷新，返回递增序号
    pub fn begin(&self) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_modify(|d| d.in_flight += 1);
        ticket
    }

    /// 提交刷新结果；序号不比已提交结果新时丢弃并返回 false
    pub fn commit(&self, ticket: u64, records: Vec<StockRecord>) -> bool {
        let mut applied = false;
        self.tx.send_modify(|d| {
            d.in_flight = d.in_flight.saturating_sub(1);
            if ticket > d.generation {
                d.records = Arc::new(records);
                d.generation = ticket;
                d.fetched_at = Some(Local::now());
                d.error = None;
                applied = true;
            }
        });
        if !applied {
            log::info!("丢弃过期的刷新结果（序号 {}）", ticket);
        }
        applied
    }

    /// 记录失败；保留原有数据，仅当没有更新的成功结果时才显示错误
    pub fn fail(&self, ticket: u64, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut applied = false;
        self.tx.send_modify(|d| {
            d.in_flight = d.in_flight.saturating_sub(1);
            if ticket > d.generation {
                d.error = Some(message);
                applied = true;
            }
        });
        applied
    }
}

/// 拉取全部分页并提交到数据集，返回本次结果是否生效
pub async fn refresh<S: RankingSource>(
    fetcher: &RankingFetcher<S>,
    store: &DatasetStore,
    query: &RankingQuery,
) -> bool {
    let ticket = store.begin();
    match fetcher.fetch_all(query).await {
        Ok(records) => store.commit(ticket, records),
        Err(e) => {
            log::error!("刷新{}数据失败: {}", query.label(), e);
            store.fail(ticket, e.to_string())
        }
    }
}
