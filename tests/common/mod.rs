// Common test utilities and mock collaborators

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tempfile::TempDir;

use swing_trading_bot::providers::{
    ExecutionGateway, MarketDataProvider, NotificationSink, RecommendationService,
    SentimentService, TradeStore,
};
use swing_trading_bot::{
    AlertKind, Bar, Config, ExitReason, ExitRecommendation, InstrumentKind, MarketSnapshot,
    OptionContract, Position, Quote, Recommendation, Sizing, TradeAction, TradeDecision,
    TradingError, TradingResult,
};

/// Test configuration with the market window held open and fast ticks
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.trading.watchlist = vec!["AAPL".to_string()];
    config.trading.buying_power = 25_000.0;
    config.trading.dry_run = false;
    config.schedule.market_open_utc = "00:00".to_string();
    config.schedule.market_close_utc = "23:59".to_string();
    config.schedule.scan_interval_secs = 1;
    config.schedule.monitor_interval_secs = 1;
    config
}

/// Create a temporary directory for test databases
pub fn create_temp_db_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    (temp_dir, db_path)
}

/// Steady uptrend with rising volume, scores well above threshold
pub fn uptrend_bars(count: usize) -> Vec<Bar> {
    trend_bars(count, 100.0, 0.004)
}

/// Steady downtrend, scores below threshold
pub fn downtrend_bars(count: usize) -> Vec<Bar> {
    trend_bars(count, 100.0, -0.004)
}

/// Uptrend with pullbacks: keeps RSI in the healthy band so the
/// composite score clears the options threshold
pub fn zigzag_up_bars(count: usize) -> Vec<Bar> {
    let end = Utc::now();
    let mut close = 100.0;
    (0..count)
        .map(|i| {
            let drift = if i % 2 == 0 { 0.006 } else { -0.0035 };
            let open = close;
            close *= 1.0 + drift;
            Bar {
                open,
                high: close.max(open) * 1.001,
                low: close.min(open) * 0.999,
                close,
                volume: 1_000_000.0 + 20_000.0 * i as f64,
                timestamp: end - Duration::hours((count - i) as i64),
            }
        })
        .collect()
}

fn trend_bars(count: usize, start: f64, drift: f64) -> Vec<Bar> {
    let end = Utc::now();
    (0..count)
        .map(|i| {
            let close = start * (1.0 + drift).powi(i as i32);
            let open = if i == 0 {
                close
            } else {
                start * (1.0 + drift).powi(i as i32 - 1)
            };
            Bar {
                open,
                high: close.max(open) * 1.001,
                low: close.min(open) * 0.999,
                close,
                volume: 1_000_000.0 + 20_000.0 * i as f64,
                timestamp: end - Duration::hours((count - i) as i64),
            }
        })
        .collect()
}

pub fn test_contract(dte: i64) -> OptionContract {
    OptionContract {
        strike: 130.0,
        expiration: Utc::now().date_naive() + Duration::days(dte),
        premium: 3.50,
        dte,
    }
}

pub fn stock_position(id: &str, symbol: &str, entry: f64) -> Position {
    Position {
        id: id.to_string(),
        symbol: symbol.to_string(),
        instrument: InstrumentKind::Stock,
        action: TradeAction::Buy,
        entry_price: entry,
        quantity: 10.0,
        opened_at: Utc::now(),
        option: None,
    }
}

pub fn call_position(id: &str, symbol: &str, dte: i64) -> Position {
    let contract = test_contract(dte);
    Position {
        id: id.to_string(),
        symbol: symbol.to_string(),
        instrument: InstrumentKind::Call,
        action: TradeAction::Buy,
        entry_price: contract.premium,
        quantity: 1.0,
        opened_at: Utc::now(),
        option: Some(contract),
    }
}

/// Programmable market data: per-symbol bars and quote prices
#[derive(Default)]
pub struct MockMarketData {
    pub bars: Mutex<HashMap<String, Vec<Bar>>>,
    pub quotes: Mutex<HashMap<String, f64>>,
    pub contract: Mutex<Option<OptionContract>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(self, symbol: &str, bars: Vec<Bar>) -> Self {
        let quote = bars.last().map(|b| b.close).unwrap_or(100.0);
        self.bars.lock().unwrap().insert(symbol.to_string(), bars);
        self.quotes.lock().unwrap().insert(symbol.to_string(), quote);
        self
    }

    pub fn with_quote(self, symbol: &str, price: f64) -> Self {
        self.quotes.lock().unwrap().insert(symbol.to_string(), price);
        self
    }

    pub fn with_contract(self, contract: OptionContract) -> Self {
        *self.contract.lock().unwrap() = Some(contract);
        self
    }

    pub fn set_quote(&self, symbol: &str, price: f64) {
        self.quotes.lock().unwrap().insert(symbol.to_string(), price);
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn bars(&self, symbol: &str, count: usize) -> TradingResult<Vec<Bar>> {
        let bars = self.bars.lock().unwrap();
        match bars.get(symbol) {
            Some(b) => {
                let start = b.len().saturating_sub(count);
                Ok(b[start..].to_vec())
            }
            None => Err(TradingError::MarketData {
                symbol: symbol.to_string(),
                reason: "no bars configured".to_string(),
            }),
        }
    }

    async fn latest_quote(&self, symbol: &str) -> TradingResult<Quote> {
        let quotes = self.quotes.lock().unwrap();
        let price = quotes.get(symbol).copied().ok_or_else(|| {
            TradingError::MarketData {
                symbol: symbol.to_string(),
                reason: "no quote configured".to_string(),
            }
        })?;
        Ok(Quote {
            bid: price * 0.999,
            ask: price * 1.001,
            price,
            timestamp: Utc::now(),
        })
    }

    async fn option_contract(
        &self,
        symbol: &str,
        _right: InstrumentKind,
        dte_window: (i64, i64),
        _otm_steps: u32,
    ) -> TradingResult<OptionContract> {
        self.contract
            .lock()
            .unwrap()
            .ok_or_else(|| TradingError::NoContractAvailable {
                symbol: symbol.to_string(),
                min_dte: dte_window.0,
                max_dte: dte_window.1,
            })
    }
}

/// Scripted AI: fixed entry recommendation and exit verdict
pub struct MockAi {
    pub action: TradeAction,
    pub confidence: f64,
    pub should_exit: bool,
    pub fail: bool,
}

impl MockAi {
    pub fn recommending(action: TradeAction, confidence: f64) -> Self {
        Self {
            action,
            confidence,
            should_exit: true,
            fail: false,
        }
    }

    pub fn holding_exits(mut self) -> Self {
        self.should_exit = false;
        self
    }

    pub fn failing() -> Self {
        Self {
            action: TradeAction::Hold,
            confidence: 0.0,
            should_exit: false,
            fail: true,
        }
    }
}

#[async_trait]
impl RecommendationService for MockAi {
    async fn analyze(&self, _snapshot: &MarketSnapshot) -> TradingResult<Recommendation> {
        if self.fail {
            return Err(TradingError::ApiTimeout("ai endpoint".to_string()));
        }
        Ok(Recommendation {
            action: self.action,
            confidence: self.confidence,
            reasoning: "scripted".to_string(),
        })
    }

    async fn exit_recommendation(
        &self,
        _position: &Position,
        _snapshot: &MarketSnapshot,
    ) -> TradingResult<ExitRecommendation> {
        if self.fail {
            return Err(TradingError::ApiTimeout("ai endpoint".to_string()));
        }
        Ok(ExitRecommendation {
            should_exit: self.should_exit,
            confidence: 0.8,
        })
    }
}

pub struct FixedSentiment(pub f64);

#[async_trait]
impl SentimentService for FixedSentiment {
    async fn sentiment_delta(&self, _symbol: &str) -> TradingResult<f64> {
        Ok(self.0)
    }
}

/// Recording gateway: fills from decisions, scripted close results
pub struct MockGateway {
    pub seeded: Mutex<Vec<Position>>,
    pub opened: Mutex<Vec<TradeDecision>>,
    pub closed: Mutex<Vec<(String, ExitReason)>>,
    pub realized_on_close: Mutex<f64>,
    pub close_failures_remaining: AtomicUsize,
    pub fail_opens: bool,
    counter: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            seeded: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            realized_on_close: Mutex::new(0.0),
            close_failures_remaining: AtomicUsize::new(0),
            fail_opens: false,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn failing_opens() -> Self {
        let mut gw = Self::new();
        gw.fail_opens = true;
        gw
    }

    pub fn with_seeded(self, position: Position) -> Self {
        self.seeded.lock().unwrap().push(position);
        self
    }

    pub fn set_realized(&self, pnl: f64) {
        *self.realized_on_close.lock().unwrap() = pnl;
    }

    pub fn fail_next_closes(&self, n: usize) {
        self.close_failures_remaining.store(n, Ordering::SeqCst);
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionGateway for MockGateway {
    async fn open_positions(&self) -> TradingResult<Vec<Position>> {
        Ok(self.seeded.lock().unwrap().clone())
    }

    async fn open_position(
        &self,
        decision: &TradeDecision,
        _idempotency_key: &str,
    ) -> TradingResult<Position> {
        if self.fail_opens {
            return Err(TradingError::OrderFailed {
                symbol: decision.symbol.clone(),
                reason: "rejected by test".to_string(),
            });
        }
        self.opened.lock().unwrap().push(decision.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let (entry_price, quantity) = match decision.sizing {
            Sizing::Notional(notional) => (100.0, notional / 100.0),
            Sizing::Contracts(c) => (
                decision.option.map(|o| o.premium).unwrap_or(1.0),
                c as f64,
            ),
        };
        Ok(Position {
            id: format!("pos-{n}"),
            symbol: decision.symbol.clone(),
            instrument: decision.instrument,
            action: decision.action,
            entry_price,
            quantity,
            opened_at: Utc::now(),
            option: decision.option,
        })
    }

    async fn close_position(&self, position_id: &str, reason: ExitReason) -> TradingResult<f64> {
        let remaining = self.close_failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.close_failures_remaining
                .store(remaining - 1, Ordering::SeqCst);
            return Err(TradingError::OrderFailed {
                symbol: position_id.to_string(),
                reason: "close rejected by test".to_string(),
            });
        }
        self.closed
            .lock()
            .unwrap()
            .push((position_id.to_string(), reason));
        Ok(*self.realized_on_close.lock().unwrap())
    }
}

/// Captures every notification for assertions
#[derive(Default)]
pub struct CaptureNotifier {
    pub sent: Mutex<Vec<(String, Option<AlertKind>, String)>>,
}

impl CaptureNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts_of(&self, kind: AlertKind) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k, _)| *k == Some(kind))
            .count()
    }
}

#[async_trait]
impl NotificationSink for CaptureNotifier {
    async fn notify(
        &self,
        position_id: &str,
        kind: Option<AlertKind>,
        message: &str,
    ) -> TradingResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((position_id.to_string(), kind, message.to_string()));
        Ok(())
    }
}

/// Captures trade and alert records for assertions
#[derive(Default)]
pub struct CaptureStore {
    pub trades: Mutex<Vec<(String, Option<f64>, String)>>,
    pub alerts: Mutex<Vec<(String, AlertKind, f64)>>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TradeStore for CaptureStore {
    async fn record_trade(
        &self,
        position: &Position,
        realized_pnl: Option<f64>,
        note: &str,
    ) -> TradingResult<()> {
        self.trades
            .lock()
            .unwrap()
            .push((position.id.clone(), realized_pnl, note.to_string()));
        Ok(())
    }

    async fn record_alert(
        &self,
        position_id: &str,
        kind: AlertKind,
        pnl_pct: f64,
    ) -> TradingResult<()> {
        self.alerts
            .lock()
            .unwrap()
            .push((position_id.to_string(), kind, pnl_pct));
        Ok(())
    }
}
