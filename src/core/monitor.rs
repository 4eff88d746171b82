// Position monitoring: P/L tracking, alert dispatch, and exits

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{AlertConfig, MonitorConfig, ScannerConfig};
use crate::core::alerts::AlertStateTracker;
use crate::core::risk::{CircuitBreaker, RiskLimitsHandle};
use crate::core::scanner::{compute_readings, score_readings};
use crate::providers::{
    ExecutionGateway, MarketDataProvider, NotificationSink, RecommendationService, TradeStore,
};
use crate::types::{AlertKind, ExitReason, MarketSnapshot, Position};

/// Shared open-position map, keyed by position id.
pub type SharedPositions = Arc<Mutex<HashMap<String, Position>>>;

/// Polls open positions, computes P/L, feeds the alert tracker, and
/// drives exits. At most one exit attempt is in flight per position;
/// overlapping supervisory calls cannot double-close.
pub struct PositionMonitor {
    market_data: Arc<dyn MarketDataProvider>,
    recommender: Arc<dyn RecommendationService>,
    gateway: Arc<dyn ExecutionGateway>,
    notifier: Arc<dyn NotificationSink>,
    store: Arc<dyn TradeStore>,
    positions: SharedPositions,
    pending_exits: Mutex<HashSet<String>>,
    alert_tracker: Arc<AlertStateTracker>,
    breaker: CircuitBreaker,
    limits: RiskLimitsHandle,
    monitor_config: MonitorConfig,
    scanner_config: ScannerConfig,
}

impl PositionMonitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        recommender: Arc<dyn RecommendationService>,
        gateway: Arc<dyn ExecutionGateway>,
        notifier: Arc<dyn NotificationSink>,
        store: Arc<dyn TradeStore>,
        positions: SharedPositions,
        alert_config: AlertConfig,
        breaker: CircuitBreaker,
        limits: RiskLimitsHandle,
        monitor_config: MonitorConfig,
        scanner_config: ScannerConfig,
    ) -> Self {
        Self {
            market_data,
            recommender,
            gateway,
            notifier,
            store,
            positions,
            pending_exits: Mutex::new(HashSet::new()),
            alert_tracker: Arc::new(AlertStateTracker::new(alert_config)),
            breaker,
            limits,
            monitor_config,
            scanner_config,
        }
    }

    pub fn alert_tracker(&self) -> Arc<AlertStateTracker> {
        Arc::clone(&self.alert_tracker)
    }

    /// One monitoring pass over every open position. Per-position
    /// failures are logged and skipped; the tick itself never errors.
    pub async fn tick(&self) {
        let open: Vec<Position> = {
            let positions = self.positions.lock().expect("positions lock poisoned");
            positions.values().cloned().collect()
        };

        if open.is_empty() {
            return;
        }

        debug!(count = open.len(), "👁  Monitoring open positions");

        for position in open {
            self.process_position(&position).await;
        }
    }

    async fn process_position(&self, position: &Position) {
        // One exit attempt in flight per position.
        if !self.try_claim_exit(&position.id) {
            debug!(position = %position.id, "Exit already in flight, skipping tick");
            return;
        }
        // Claim is released in every path below; a helper guard would
        // hide the retry semantics of the forced-exit branch.

        let quote = match self.market_data.latest_quote(&position.symbol).await {
            Ok(q) => q,
            Err(e) => {
                warn!(symbol = %position.symbol, error = %e, "⚠️  Quote fetch failed, skipping position this tick");
                self.release_exit(&position.id);
                return;
            }
        };

        let mark = position.mark_price(quote.price, Utc::now().date_naive());
        let pnl_pct = position.unrealized_pnl_pct(mark);

        // Expiring options are force-closed regardless of P/L. This is
        // a mandatory action, not a notification; the alert tracker is
        // bypassed entirely.
        if let Some(dte) = position.days_to_expiration(Utc::now()) {
            if dte <= self.monitor_config.close_dte {
                info!(
                    position = %position.id,
                    symbol = %position.symbol,
                    dte,
                    pnl = format!("{:+.1}%", pnl_pct * 100.0),
                    "⏰ Forced exit, contract near expiration"
                );
                // A failed forced exit keeps the position; the claim is
                // released so the next tick retries.
                self.close(position, ExitReason::Expiry, pnl_pct).await;
                self.release_exit(&position.id);
                return;
            }
        }

        let Some(kind) = self.alert_tracker.evaluate(&position.id, pnl_pct) else {
            self.release_exit(&position.id);
            return;
        };

        if let Err(e) = self.store.record_alert(&position.id, kind, pnl_pct).await {
            warn!(position = %position.id, error = %e, "Alert record failed");
        }
        self.notify(
            &position.id,
            Some(kind),
            &format!(
                "{} {} at {:+.1}%",
                position.symbol,
                kind,
                pnl_pct * 100.0
            ),
        )
        .await;

        match kind {
            AlertKind::SignificantMove => {
                // Notify only, no action.
                self.release_exit(&position.id);
            }
            AlertKind::ProfitTarget | AlertKind::StopLoss => {
                let reason = match kind {
                    AlertKind::ProfitTarget => ExitReason::ProfitTarget,
                    _ => ExitReason::StopLoss,
                };
                if self.confirm_exit(position).await {
                    self.close(position, reason, pnl_pct).await;
                } else {
                    debug!(position = %position.id, "Exit not confirmed, holding");
                }
                self.release_exit(&position.id);
            }
        }
    }

    /// Ask the AI for exit confirmation. Any failure is fail-safe: the
    /// position is held and re-evaluated on a later tick.
    async fn confirm_exit(&self, position: &Position) -> bool {
        let snapshot = match self.build_snapshot(&position.symbol).await {
            Some(s) => s,
            None => {
                warn!(symbol = %position.symbol, "Snapshot unavailable for exit check, holding");
                return false;
            }
        };

        match self
            .recommender
            .exit_recommendation(position, &snapshot)
            .await
        {
            Ok(rec) => rec.should_exit,
            Err(e) => {
                warn!(position = %position.id, error = %e, "Exit recommendation failed, holding");
                false
            }
        }
    }

    /// Recompute a market snapshot from fresh bars, the same readings
    /// the scanner uses.
    async fn build_snapshot(&self, symbol: &str) -> Option<MarketSnapshot> {
        let bars = self
            .market_data
            .bars(symbol, self.scanner_config.lookback_bars)
            .await
            .ok()?;
        if bars.len() < self.scanner_config.lookback_bars {
            return None;
        }
        let readings = compute_readings(&bars, self.scanner_config.short_term_bars);
        let score = score_readings(&readings, &self.scanner_config);
        let last = bars[bars.len() - 1];
        Some(MarketSnapshot {
            symbol: symbol.to_string(),
            price: last.close,
            score,
            sma_20: readings.sma_20,
            sma_50: readings.sma_50,
            rsi_14: readings.rsi_14,
            volume_ratio: readings.volume_ratio,
            timestamp: last.timestamp,
        })
    }

    /// Close through the gateway, then tear down engine state: remove
    /// the position, drop its alert entry, feed the breaker, record
    /// and notify. Exits are never blocked by the circuit breaker.
    async fn close(&self, position: &Position, reason: ExitReason, pnl_pct: f64) {
        match self.gateway.close_position(&position.id, reason).await {
            Ok(realized) => {
                {
                    let mut positions =
                        self.positions.lock().expect("positions lock poisoned");
                    positions.remove(&position.id);
                }
                // No alert may be emitted for a closed position.
                self.alert_tracker.clear(&position.id);

                let max_daily_loss = self.limits.snapshot().max_daily_loss;
                self.breaker.record_realized_pnl(realized, max_daily_loss);

                if let Err(e) = self
                    .store
                    .record_trade(position, Some(realized), &reason.to_string())
                    .await
                {
                    warn!(position = %position.id, error = %e, "Trade record failed");
                }

                info!(
                    position = %position.id,
                    symbol = %position.symbol,
                    reason = %reason,
                    realized = format!("{:+.2}", realized),
                    "✅ Position closed"
                );
                self.notify(
                    &position.id,
                    None,
                    &format!(
                        "Closed {} ({}) realized {:+.2} ({:+.1}%)",
                        position.symbol,
                        reason,
                        realized,
                        pnl_pct * 100.0
                    ),
                )
                .await;
            }
            Err(e) => {
                warn!(
                    position = %position.id,
                    reason = %reason,
                    error = %e,
                    "❌ Close failed, position retained"
                );
                self.notify(
                    &position.id,
                    None,
                    &format!("Close failed for {}: {}", position.symbol, e),
                )
                .await;
            }
        }
    }

    /// Fire-and-forget notification; delivery failure never blocks
    /// the loop.
    async fn notify(&self, position_id: &str, kind: Option<AlertKind>, message: &str) {
        if let Err(e) = self.notifier.notify(position_id, kind, message).await {
            warn!(position = %position_id, error = %e, "Notification delivery failed");
        }
    }

    fn try_claim_exit(&self, position_id: &str) -> bool {
        self.pending_exits
            .lock()
            .expect("pending exits lock poisoned")
            .insert(position_id.to_string())
    }

    fn release_exit(&self, position_id: &str) {
        self.pending_exits
            .lock()
            .expect("pending exits lock poisoned")
            .remove(position_id);
    }
}
