//! Collaborator contracts.
//!
//! The engine is indifferent to whether an implementation is backed by
//! a real broker, a paper simulator, or a test double. Every call may
//! cross an I/O boundary; retry policy belongs to the implementation,
//! never to the engine.

use async_trait::async_trait;

use crate::error::TradingResult;
use crate::types::{
    AlertKind, Bar, ExitReason, ExitRecommendation, InstrumentKind, MarketSnapshot,
    OptionContract, Position, Quote, Recommendation, TradeDecision,
};

/// Historical bars and live quotes.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Most recent `count` bars for `symbol`, oldest -> newest. A
    /// provider that cannot supply the full window returns what it has;
    /// the scanner excludes under-filled symbols itself.
    async fn bars(&self, symbol: &str, count: usize) -> TradingResult<Vec<Bar>>;

    async fn latest_quote(&self, symbol: &str) -> TradingResult<Quote>;

    /// Quoted contract with DTE closest to, but within, the window and
    /// the strike `otm_steps` out-of-the-money steps from the current
    /// price in the direction implied by `right`.
    async fn option_contract(
        &self,
        symbol: &str,
        right: InstrumentKind,
        dte_window: (i64, i64),
        otm_steps: u32,
    ) -> TradingResult<OptionContract>;
}

// Lets the scanner and router stay generic while the engine hands
// them shared trait objects.
#[async_trait]
impl<T: MarketDataProvider + ?Sized> MarketDataProvider for std::sync::Arc<T> {
    async fn bars(&self, symbol: &str, count: usize) -> TradingResult<Vec<Bar>> {
        (**self).bars(symbol, count).await
    }

    async fn latest_quote(&self, symbol: &str) -> TradingResult<Quote> {
        (**self).latest_quote(symbol).await
    }

    async fn option_contract(
        &self,
        symbol: &str,
        right: InstrumentKind,
        dte_window: (i64, i64),
        otm_steps: u32,
    ) -> TradingResult<OptionContract> {
        (**self)
            .option_contract(symbol, right, dte_window, otm_steps)
            .await
    }
}

/// AI entry and exit recommendations. Engine treats any error as
/// "skip this decision", never fail-open into a trade.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn analyze(&self, snapshot: &MarketSnapshot) -> TradingResult<Recommendation>;

    async fn exit_recommendation(
        &self,
        position: &Position,
        snapshot: &MarketSnapshot,
    ) -> TradingResult<ExitRecommendation>;
}

/// Bounded sentiment adjustment applied to entry confidence.
#[async_trait]
pub trait SentimentService: Send + Sync {
    /// Delta in [-0.1, 0.1]. Callers substitute 0.0 on error.
    async fn sentiment_delta(&self, symbol: &str) -> TradingResult<f64>;
}

/// Broker execution. Implementations must be idempotent under retry by
/// the caller-supplied key.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Positions currently open at the broker, used to seed the engine
    /// at startup.
    async fn open_positions(&self) -> TradingResult<Vec<Position>>;

    async fn open_position(
        &self,
        decision: &TradeDecision,
        idempotency_key: &str,
    ) -> TradingResult<Position>;

    /// Closes the position and returns realized P/L in dollars.
    async fn close_position(&self, position_id: &str, reason: ExitReason) -> TradingResult<f64>;
}

/// Outbound notifications. Fire-and-forget: the monitor loop logs
/// delivery failures and moves on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        position_id: &str,
        kind: Option<AlertKind>,
        message: &str,
    ) -> TradingResult<()>;
}

/// Write-only trade/alert history.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn record_trade(
        &self,
        position: &Position,
        realized_pnl: Option<f64>,
        note: &str,
    ) -> TradingResult<()>;

    async fn record_alert(
        &self,
        position_id: &str,
        kind: AlertKind,
        pnl_pct: f64,
    ) -> TradingResult<()>;
}
