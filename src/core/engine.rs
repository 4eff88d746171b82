// Lifecycle orchestration: the scan and monitor loops

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveTime, Utc};
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{parse_hhmm, Config};
use crate::core::monitor::{PositionMonitor, SharedPositions};
use crate::core::risk::{validate_trade, CircuitBreaker, RiskLimits, RiskLimitsHandle, Verdict};
use crate::core::router::{InstrumentRouter, RouteResult};
use crate::core::scanner::OpportunityScanner;
use crate::error::TradingResult;
use crate::providers::{
    ExecutionGateway, MarketDataProvider, NotificationSink, RecommendationService,
    SentimentService, TradeStore,
};
use crate::types::{MarketSnapshot, Position, Signal, TradeDecision};

/// Owns the shared state and the two periodic loops. Scanning opens
/// positions; monitoring maintains and closes them. The loops share
/// the position map, the risk limits, and the circuit breaker.
pub struct LifecycleOrchestrator {
    config: Config,
    sentiment: Arc<dyn SentimentService>,
    recommender: Arc<dyn RecommendationService>,
    gateway: Arc<dyn ExecutionGateway>,
    notifier: Arc<dyn NotificationSink>,
    store: Arc<dyn TradeStore>,
    scanner: OpportunityScanner<Arc<dyn MarketDataProvider>>,
    router: InstrumentRouter<Arc<dyn MarketDataProvider>>,
    monitor: PositionMonitor,
    positions: SharedPositions,
    limits: RiskLimitsHandle,
    breaker: CircuitBreaker,
    market_open: NaiveTime,
    market_close: NaiveTime,
}

impl LifecycleOrchestrator {
    pub fn new(
        config: Config,
        market_data: Arc<dyn MarketDataProvider>,
        recommender: Arc<dyn RecommendationService>,
        sentiment: Arc<dyn SentimentService>,
        gateway: Arc<dyn ExecutionGateway>,
        notifier: Arc<dyn NotificationSink>,
        store: Arc<dyn TradeStore>,
    ) -> Self {
        let positions: SharedPositions = Arc::new(Mutex::new(HashMap::new()));
        let limits = RiskLimitsHandle::new(RiskLimits::from(&config.risk));
        let breaker = CircuitBreaker::new();

        let scanner = OpportunityScanner::new(Arc::clone(&market_data), config.scanner.clone());
        let router = InstrumentRouter::new(
            Arc::clone(&market_data),
            config.router.clone(),
            config.risk.max_position_size,
        );
        let monitor = PositionMonitor::new(
            Arc::clone(&market_data),
            Arc::clone(&recommender),
            Arc::clone(&gateway),
            Arc::clone(&notifier),
            Arc::clone(&store),
            Arc::clone(&positions),
            config.alerts.clone(),
            breaker.clone(),
            limits.clone(),
            config.monitor.clone(),
            config.scanner.clone(),
        );

        // Validated at load time; defaults are well-formed.
        let market_open =
            parse_hhmm(&config.schedule.market_open_utc).unwrap_or(default_open());
        let market_close =
            parse_hhmm(&config.schedule.market_close_utc).unwrap_or(default_close());

        Self {
            config,
            sentiment,
            recommender,
            gateway,
            notifier,
            store,
            scanner,
            router,
            monitor,
            positions,
            limits,
            breaker,
            market_open,
            market_close,
        }
    }

    /// Adopt positions already open at the broker so a restart resumes
    /// monitoring them.
    pub async fn seed_positions(&self) -> TradingResult<()> {
        let open = self.gateway.open_positions().await?;
        if open.is_empty() {
            return Ok(());
        }
        info!(count = open.len(), "📥 Adopting existing broker positions");
        let mut positions = self.positions.lock().expect("positions lock poisoned");
        for position in open {
            positions.insert(position.id.clone(), position);
        }
        Ok(())
    }

    /// Run both loops until `shutdown` flips. A slow tick is skipped,
    /// never queued: the next run waits for the next full interval.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> TradingResult<()> {
        self.seed_positions().await?;

        info!(
            scan_interval = self.config.schedule.scan_interval_secs,
            monitor_interval = self.config.schedule.monitor_interval_secs,
            watchlist = self.config.trading.watchlist.len(),
            dry_run = self.config.trading.dry_run,
            "🚀 Trading engine started"
        );

        let scan_loop = self.scan_loop(shutdown.clone());
        let monitor_loop = self.monitor_loop(shutdown);
        tokio::join!(scan_loop, monitor_loop);

        info!("🛑 Trading engine stopped");
        Ok(())
    }

    async fn scan_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(
            self.config.schedule.scan_interval_secs,
        ));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.scan_tick().await,
                _ = shutdown.changed() => {
                    debug!("Scan loop shutting down");
                    break;
                }
            }
        }
    }

    async fn monitor_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(Duration::from_secs(
            self.config.schedule.monitor_interval_secs,
        ));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.monitor_tick().await,
                _ = shutdown.changed() => {
                    debug!("Monitor loop shutting down");
                    break;
                }
            }
        }
    }

    /// One scan pass: score the watchlist, then push each candidate
    /// through AI, routing, risk, and execution. Candidates are
    /// processed sequentially so open-position counts and buying power
    /// are consistent between entries.
    pub async fn scan_tick(&self) {
        let now = Utc::now();
        if !self.market_is_open(now.time()) {
            debug!("Market closed, skipping scan");
            return;
        }

        if self.breaker.is_tripped() {
            debug!("Circuit breaker tripped, no new entries today");
            return;
        }

        let candidates = self
            .scanner
            .scan(&self.config.trading.watchlist)
            .await;

        if candidates.is_empty() {
            debug!("No candidates above score threshold");
            return;
        }

        info!(count = candidates.len(), "🔍 Scan found candidates");

        for (signal, snapshot) in &candidates {
            if self.has_open_position(&signal.symbol) {
                debug!(symbol = %signal.symbol, "Position already open, skipping");
                continue;
            }
            self.try_enter(signal, snapshot).await;
        }
    }

    async fn try_enter(&self, signal: &Signal, snapshot: &MarketSnapshot) {
        let recommendation = match self.recommender.analyze(snapshot).await {
            Ok(r) => r,
            Err(e) => {
                debug!(symbol = %signal.symbol, error = %e, "AI unavailable, skipping candidate");
                return;
            }
        };

        // Sentiment is an optional nudge; failure means no adjustment.
        let sentiment_delta = self
            .sentiment
            .sentiment_delta(&signal.symbol)
            .await
            .unwrap_or(0.0);

        let dte_window = (self.config.risk.min_dte, self.config.risk.max_dte);
        let decision = match self
            .router
            .route(signal, &recommendation, sentiment_delta, dte_window)
            .await
        {
            Ok(RouteResult::Trade(d)) => d,
            Ok(RouteResult::Skip(reason)) => {
                debug!(symbol = %signal.symbol, reason, "Candidate skipped");
                return;
            }
            Err(e) => {
                debug!(symbol = %signal.symbol, error = %e, "Routing failed, skipping candidate");
                return;
            }
        };

        let limits = self.limits.snapshot();
        let open_count = self.open_position_count();
        let available = self.config.trading.buying_power - self.committed_capital();

        match validate_trade(
            &decision,
            &limits,
            self.breaker.is_tripped(),
            open_count,
            available,
        ) {
            Verdict::Approve => {}
            Verdict::Reject(reason) => {
                info!(symbol = %decision.symbol, %reason, "🚫 Trade rejected");
                return;
            }
        }

        if self.config.trading.dry_run {
            info!(
                symbol = %decision.symbol,
                instrument = %decision.instrument,
                action = ?decision.action,
                confidence = format!("{:.2}", decision.confidence),
                "📝 Dry run, would open position"
            );
            return;
        }

        self.execute_entry(&decision).await;
    }

    async fn execute_entry(&self, decision: &TradeDecision) {
        let idempotency_key = Uuid::new_v4().to_string();
        match self.gateway.open_position(decision, &idempotency_key).await {
            Ok(position) => {
                info!(
                    position = %position.id,
                    symbol = %position.symbol,
                    instrument = %position.instrument,
                    entry = format!("{:.2}", position.entry_price),
                    qty = position.quantity,
                    "💰 Position opened"
                );
                self.adopt_position(position).await;
            }
            Err(e) => {
                // No automatic retry; the next scan re-evaluates from
                // scratch if the opportunity still holds.
                warn!(symbol = %decision.symbol, error = %e, "❌ Order failed");
                if let Err(ne) = self
                    .notifier
                    .notify(
                        &decision.symbol,
                        None,
                        &format!("Order failed for {}: {}", decision.symbol, e),
                    )
                    .await
                {
                    warn!(error = %ne, "Notification delivery failed");
                }
            }
        }
    }

    async fn adopt_position(&self, position: Position) {
        {
            let mut positions = self.positions.lock().expect("positions lock poisoned");
            positions.insert(position.id.clone(), position.clone());
        }
        if let Err(e) = self.store.record_trade(&position, None, "entry").await {
            warn!(position = %position.id, error = %e, "Trade record failed");
        }
        if let Err(e) = self
            .notifier
            .notify(
                &position.id,
                None,
                &format!(
                    "Opened {} {} @ {:.2}",
                    position.symbol, position.instrument, position.entry_price
                ),
            )
            .await
        {
            warn!(position = %position.id, error = %e, "Notification delivery failed");
        }
    }

    fn market_is_open(&self, now: NaiveTime) -> bool {
        if self.market_open <= self.market_close {
            now >= self.market_open && now < self.market_close
        } else {
            // Window wraps midnight.
            now >= self.market_open || now < self.market_close
        }
    }

    fn has_open_position(&self, symbol: &str) -> bool {
        self.positions
            .lock()
            .expect("positions lock poisoned")
            .values()
            .any(|p| p.symbol == symbol)
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.lock().expect("positions lock poisoned").len()
    }

    pub fn open_positions(&self) -> Vec<Position> {
        self.positions
            .lock()
            .expect("positions lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Capital tied up by open positions, in dollars.
    fn committed_capital(&self) -> f64 {
        self.positions
            .lock()
            .expect("positions lock poisoned")
            .values()
            .map(|p| match p.option {
                Some(o) => o.premium * 100.0 * p.quantity,
                None => p.entry_price * p.quantity,
            })
            .sum()
    }

    /// Replace the risk limits. Takes effect at the next validation;
    /// in-flight checks keep the snapshot they started with.
    pub fn update_limits(&self, limits: RiskLimits) {
        self.limits.update(limits);
    }

    /// Manual breaker reset for a new trading day.
    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
        info!("🔄 Circuit breaker reset");
    }

    pub fn daily_realized_pnl(&self) -> f64 {
        self.breaker.daily_realized_pnl()
    }

    pub fn circuit_breaker_tripped(&self) -> bool {
        self.breaker.is_tripped()
    }

    /// One monitoring pass. The loop calls this on its own cadence;
    /// like scanning, monitoring only runs inside the market window.
    pub async fn monitor_tick(&self) {
        if !self.market_is_open(Utc::now().time()) {
            debug!("Market closed, skipping monitor pass");
            return;
        }
        self.monitor.tick().await;
    }
}

fn default_open() -> NaiveTime {
    NaiveTime::from_hms_opt(14, 30, 0).expect("static time")
}

fn default_close() -> NaiveTime {
    NaiveTime::from_hms_opt(21, 0, 0).expect("static time")
}
