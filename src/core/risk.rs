// Risk limits, trade validation, and the daily-loss circuit breaker

use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RiskConfig;
use crate::types::{InstrumentKind, Sizing, TradeDecision};

/// Process-wide risk limits. Mutable at runtime through
/// [`RiskLimitsHandle`]; evaluation code only ever sees a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_position_count: usize,
    pub max_daily_loss: f64,
    pub max_position_size: f64,
    pub max_option_premium: f64,
    pub min_dte: i64,
    pub max_dte: i64,
    pub max_contracts: u32,
}

impl From<&RiskConfig> for RiskLimits {
    fn from(config: &RiskConfig) -> Self {
        Self {
            max_position_count: config.max_position_count,
            max_daily_loss: config.max_daily_loss,
            max_position_size: config.max_position_size,
            max_option_premium: config.max_option_premium,
            min_dte: config.min_dte,
            max_dte: config.max_dte,
            max_contracts: config.max_contracts,
        }
    }
}

/// Single-writer, read-many holder for [`RiskLimits`]. An update is
/// atomic and becomes visible to the next snapshot, never mid-read.
#[derive(Debug, Clone)]
pub struct RiskLimitsHandle {
    inner: Arc<RwLock<RiskLimits>>,
}

impl RiskLimitsHandle {
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            inner: Arc::new(RwLock::new(limits)),
        }
    }

    /// Consistent copy of the current limits.
    pub fn snapshot(&self) -> RiskLimits {
        self.inner.read().expect("risk limits lock poisoned").clone()
    }

    /// Replace the limits wholesale (authorized runtime command).
    pub fn update(&self, limits: RiskLimits) {
        let mut guard = self.inner.write().expect("risk limits lock poisoned");
        info!(
            max_positions = limits.max_position_count,
            max_daily_loss = limits.max_daily_loss,
            "⚙️  Risk limits updated"
        );
        *guard = limits;
    }
}

/// Daily-loss kill switch. Once tripped, all new entries are rejected
/// until an explicit reset (the day-rollover hook); exits are never
/// blocked.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: Arc<Mutex<BreakerState>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct BreakerState {
    daily_realized_pnl: f64,
    tripped: bool,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BreakerState::default())),
        }
    }

    /// Accumulate realized P/L from a closed trade and trip if the
    /// cumulative loss breaches the limit.
    pub fn record_realized_pnl(&self, pnl: f64, max_daily_loss: f64) {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        state.daily_realized_pnl += pnl;

        if !state.tripped && state.daily_realized_pnl < -max_daily_loss {
            state.tripped = true;
            warn!(
                daily_pnl = format!("{:.2}", state.daily_realized_pnl),
                limit = max_daily_loss,
                "🚨 Circuit breaker tripped, new entries halted"
            );
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.state.lock().expect("breaker lock poisoned").tripped
    }

    pub fn daily_realized_pnl(&self) -> f64 {
        self.state
            .lock()
            .expect("breaker lock poisoned")
            .daily_realized_pnl
    }

    /// Day-rollover (or manual) reset: clears the accumulator and the
    /// tripped flag.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        if state.tripped {
            info!("🔄 Circuit breaker reset");
        }
        *state = BreakerState::default();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of validating a proposed trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    CircuitBreakerTripped,
    MaxPositionsReached,
    PositionTooLarge,
    PremiumTooLarge,
    DteOutOfWindow,
    TooManyContracts,
    InsufficientBuyingPower,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectReason::CircuitBreakerTripped => "circuit breaker tripped",
            RejectReason::MaxPositionsReached => "max open positions reached",
            RejectReason::PositionTooLarge => "stock notional exceeds max position size",
            RejectReason::PremiumTooLarge => "option premium exceeds max",
            RejectReason::DteOutOfWindow => "expiration outside DTE window",
            RejectReason::TooManyContracts => "contract count exceeds max",
            RejectReason::InsufficientBuyingPower => "insufficient buying power",
        };
        write!(f, "{}", s)
    }
}

/// Validate a proposed trade against the limits snapshot. Pure: checks
/// run in order and the first failure short-circuits; nothing here
/// mutates state, so a caller may re-evaluate freely.
pub fn validate_trade(
    decision: &TradeDecision,
    limits: &RiskLimits,
    breaker_tripped: bool,
    open_position_count: usize,
    buying_power: f64,
) -> Verdict {
    if breaker_tripped {
        return Verdict::Reject(RejectReason::CircuitBreakerTripped);
    }

    if open_position_count >= limits.max_position_count {
        return Verdict::Reject(RejectReason::MaxPositionsReached);
    }

    match decision.instrument {
        InstrumentKind::Stock => {
            if let Sizing::Notional(n) = decision.sizing {
                if n > limits.max_position_size {
                    return Verdict::Reject(RejectReason::PositionTooLarge);
                }
            }
        }
        InstrumentKind::Call | InstrumentKind::Put => {
            let Some(option) = decision.option else {
                return Verdict::Reject(RejectReason::DteOutOfWindow);
            };
            let contracts = match decision.sizing {
                Sizing::Contracts(c) => c,
                Sizing::Notional(_) => 0,
            };
            if option.premium * contracts as f64 * 100.0 > limits.max_option_premium {
                return Verdict::Reject(RejectReason::PremiumTooLarge);
            }
            if option.dte < limits.min_dte || option.dte > limits.max_dte {
                return Verdict::Reject(RejectReason::DteOutOfWindow);
            }
            if contracts > limits.max_contracts {
                return Verdict::Reject(RejectReason::TooManyContracts);
            }
        }
    }

    if decision.required_capital() > buying_power {
        return Verdict::Reject(RejectReason::InsufficientBuyingPower);
    }

    Verdict::Approve
}
