use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 交易时段判断的检查间隔
pub const TRADING_CHECK_INTERVAL: Duration = Duration::from_secs(60);

pub struct TradingScheduler;

impl TradingScheduler {
    /// 周一至周五 9:15-11:30、13:05-15:00（含端点）视为交易时段
    pub fn is_trading_time_at(now: NaiveDateTime) -> bool {
        if is_weekend(now.weekday()) {
            return false;
        }
        let time_val = now.hour() * 100 + now.minute();
        (915..=1130).contains(&time_val) || (1305..=1500).contains(&time_val)
    }

    pub fn is_trading_time() -> bool {
        Self::is_trading_time_at(Local::now().naive_local())
    }

    /// 状态文字与 is_trading_time_at 的时段边界一致：13:05 前仍为午间休市
    pub fn market_status_at(now: NaiveDateTime) -> String {
        if is_weekend(now.weekday()) {
            return "休市(周末)".to_string();
        }
        let time_val = now.hour() * 100 + now.minute();

        if time_val < 915 {
            "盘前".to_string()
        } else if time_val <= 925 {
            "竞价中".to_string()
        } else if time_val < 930 {
            "集合竞价结束".to_string()
        } else if time_val <= 1130 {
            "交易中(上午)".to_string()
        } else if time_val < 1305 {
            "午间休市".to_string()
        } else if time_val <= 1500 {
            "交易中(下午)".to_string()
        } else {
            "已收盘".to_string()
        }
    }

    pub fn market_status() -> String {
        Self::market_status_at(Local::now().naive_local())
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    weekday == Weekday::Sat || weekday == Weekday::Sun
}

/// 当前时间来源，测试中可替换
pub trait TradingClock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn is_trading_time(&self) -> bool {
        TradingScheduler::is_trading_time_at(self.now())
    }
}

pub struct LocalClock;

impl TradingClock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
}

/// 交易时段内的自动刷新。每 60 秒检查一次是否处于交易时段，
/// 进入交易时段后每隔 refresh_interval 调用一次刷新回调（首次在一个间隔之后），
/// 离开交易时段即停止计时。
pub struct RefreshScheduler {
    clock: Arc<dyn TradingClock>,
    refresh_interval: Duration,
    check_interval: Duration,
    cancel: CancellationToken,
    state: Arc<Mutex<SchedulerState>>,
}

impl RefreshScheduler {
    pub fn new(clock: Arc<dyn TradingClock>, refresh_interval: Duration) -> Self {
        Self {
            clock,
            refresh_interval,
            check_interval: TRADING_CHECK_INTERVAL,
            cancel: CancellationToken::new(),
            state: Arc::new(Mutex::new(SchedulerState::Idle)),
        }
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SchedulerState::Idle)
    }

    /// 启动后台任务；tick 每次返回的 future 执行完才会等待下一次触发
    pub fn start<F, Fut>(&self, mut tick: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let clock = self.clock.clone();
        let cancel = self.cancel.clone();
        let state = self.state.clone();
        let refresh_every = self.refresh_interval;
        let check_every = self.check_interval;

        tokio::spawn(async move {
            let mut check = tokio::time::interval(check_every);
            check.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut poll: Option<tokio::time::Interval> = None;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = check.tick() => {
                        let trading = clock.is_trading_time();
                        match (trading, poll.is_some()) {
                            (true, false) => {
                                let mut timer = interval_at(Instant::now() + refresh_every, refresh_every);
                                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                                poll = Some(timer);
                                set_state(&state, SchedulerState::Polling);
                                log::info!("进入交易时段，开始每 {} 秒自动刷新", refresh_every.as_secs());
                            }
                            (false, true) => {
                                poll = None;
                                set_state(&state, SchedulerState::Idle);
                                log::info!("非交易时段，停止自动刷新");
                            }
                            _ => {}
                        }
                    }
                    _ = next_poll(&mut poll) => {
                        tick().await;
                    }
                }
            }

            set_state(&state, SchedulerState::Idle);
        })
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

async fn next_poll(poll: &mut Option<tokio::time::Interval>) {
    match poll {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn set_state(state: &Mutex<SchedulerState>, value: SchedulerState) {
    if let Ok(mut s) = state.lock() {
        *s = value;
    }
}
