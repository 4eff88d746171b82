// Common types used across the application

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar. Sequences are always ordered oldest -> newest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quote {
    pub bid: f64,
    pub ask: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Scanner output: a scored entry candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub score: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentKind {
    Stock,
    Call,
    Put,
}

impl std::fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstrumentKind::Stock => write!(f, "STOCK"),
            InstrumentKind::Call => write!(f, "CALL"),
            InstrumentKind::Put => write!(f, "PUT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

/// Sizing for a proposed trade: dollar notional for stock, contract
/// count for options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sizing {
    Notional(f64),
    Contracts(u32),
}

/// Option contract metadata carried by decisions and positions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptionContract {
    pub strike: f64,
    pub expiration: NaiveDate,
    pub premium: f64,
    pub dte: i64,
}

impl OptionContract {
    /// Paper mark given the underlying spot: intrinsic value plus the
    /// entry premium's time value decayed linearly toward expiration.
    /// At entry (OTM, full time left) this equals the entry premium.
    pub fn mark(&self, right: InstrumentKind, spot: f64, today: NaiveDate) -> f64 {
        let intrinsic = match right {
            InstrumentKind::Call => (spot - self.strike).max(0.0),
            InstrumentKind::Put => (self.strike - spot).max(0.0),
            InstrumentKind::Stock => return spot,
        };
        let time_value = if self.dte > 0 {
            let remaining = (self.expiration - today).num_days().max(0) as f64;
            self.premium * (remaining / self.dte as f64).min(1.0)
        } else {
            0.0
        };
        intrinsic + time_value
    }
}

/// A fully specified trade proposal, ready for risk validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDecision {
    pub symbol: String,
    pub instrument: InstrumentKind,
    pub action: TradeAction,
    pub confidence: f64,
    pub score: f64,
    pub sizing: Sizing,
    pub option: Option<OptionContract>,
}

impl TradeDecision {
    /// Capital the trade ties up: notional for stock, premium x 100 x
    /// contracts for options.
    pub fn required_capital(&self) -> f64 {
        match self.sizing {
            Sizing::Notional(n) => n,
            Sizing::Contracts(c) => self
                .option
                .map(|o| o.premium * 100.0 * c as f64)
                .unwrap_or(0.0),
        }
    }
}

/// An open position. Owned by the execution gateway once opened; the
/// engine only reads it plus live quotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub symbol: String,
    pub instrument: InstrumentKind,
    pub action: TradeAction,
    pub entry_price: f64,
    pub quantity: f64,
    pub opened_at: DateTime<Utc>,
    pub option: Option<OptionContract>,
}

impl Position {
    /// Unrealized P/L as a fraction of entry price, signed in the
    /// trade's direction. Option positions are quoted by premium and
    /// always held long, so the raw change applies as-is.
    pub fn unrealized_pnl_pct(&self, current_price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        let raw = (current_price - self.entry_price) / self.entry_price;
        match (self.instrument, self.action) {
            (InstrumentKind::Stock, TradeAction::Sell) => -raw,
            _ => raw,
        }
    }

    /// The price this position is marked at given the underlying
    /// spot: the spot itself for stock, the modeled contract mark for
    /// options.
    pub fn mark_price(&self, spot: f64, today: NaiveDate) -> f64 {
        match self.option {
            Some(o) => o.mark(self.instrument, spot, today),
            None => spot,
        }
    }

    /// Days to expiration from `now`; None for stock positions.
    pub fn days_to_expiration(&self, now: DateTime<Utc>) -> Option<i64> {
        self.option
            .map(|o| (o.expiration - now.date_naive()).num_days())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    ProfitTarget,
    StopLoss,
    SignificantMove,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::ProfitTarget => write!(f, "PROFIT_TARGET"),
            AlertKind::StopLoss => write!(f, "STOP_LOSS"),
            AlertKind::SignificantMove => write!(f, "SIGNIFICANT_MOVE"),
        }
    }
}

/// Why a position was (or was asked to be) closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    ProfitTarget,
    StopLoss,
    Expiry,
    Manual,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::ProfitTarget => write!(f, "profit_target"),
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::Expiry => write!(f, "expiry"),
            ExitReason::Manual => write!(f, "manual"),
        }
    }
}

/// Market context handed to the AI recommendation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub price: f64,
    pub score: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub rsi_14: f64,
    pub volume_ratio: f64,
    pub timestamp: DateTime<Utc>,
}

/// AI recommendation for a candidate entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: TradeAction,
    pub confidence: f64,
    pub reasoning: String,
}

/// AI confirmation for a proposed exit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitRecommendation {
    pub should_exit: bool,
    pub confidence: f64,
}
