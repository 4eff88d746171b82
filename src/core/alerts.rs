// Per-position alert dedup state machine
//
// One-shot guards key off alert kind and the last fired percentage,
// never instantaneous threshold membership: a position oscillating
// around a boundary does not reset or re-fire until the recorded
// delta rule is met.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::config::AlertConfig;
use crate::types::AlertKind;

/// Recorded state for a position that has fired at least once.
#[derive(Debug, Clone, Copy)]
pub struct AlertState {
    pub last_kind: AlertKind,
    pub last_pct: f64,
    pub last_fired_at: DateTime<Utc>,
}

/// Deduplicating alert tracker, keyed by position id. All mutation
/// happens under one lock so a monitor tick's read-check-fire sequence
/// for a position is atomic against concurrent evaluation.
pub struct AlertStateTracker {
    config: AlertConfig,
    states: Mutex<HashMap<String, AlertState>>,
}

impl AlertStateTracker {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate a position's unrealized P/L percentage against the
    /// thresholds. Returns the alert to fire, if any, and records it
    /// atomically.
    pub fn evaluate(&self, position_id: &str, pnl_pct: f64) -> Option<AlertKind> {
        let mut states = self.states.lock().expect("alert state lock poisoned");
        let current = states.get(position_id).copied();

        let fired = decide(&self.config, current, pnl_pct);

        if let Some(kind) = fired {
            states.insert(
                position_id.to_string(),
                AlertState {
                    last_kind: kind,
                    last_pct: pnl_pct,
                    last_fired_at: Utc::now(),
                },
            );
        }

        fired
    }

    /// Drop a position's entry unconditionally. Called on close; a
    /// reopened symbol starts from scratch.
    pub fn clear(&self, position_id: &str) {
        self.states
            .lock()
            .expect("alert state lock poisoned")
            .remove(position_id);
    }

    pub fn state_of(&self, position_id: &str) -> Option<AlertState> {
        self.states
            .lock()
            .expect("alert state lock poisoned")
            .get(position_id)
            .copied()
    }

    pub fn tracked_count(&self) -> usize {
        self.states.lock().expect("alert state lock poisoned").len()
    }
}

/// Pure transition function: current state + P/L pct -> alert to fire.
fn decide(config: &AlertConfig, current: Option<AlertState>, pnl_pct: f64) -> Option<AlertKind> {
    let last_kind = current.map(|s| s.last_kind);

    if pnl_pct >= config.profit_target_pct {
        if last_kind != Some(AlertKind::ProfitTarget) {
            return Some(AlertKind::ProfitTarget);
        }
        return None;
    }

    if pnl_pct <= -config.stop_loss_pct {
        if last_kind != Some(AlertKind::StopLoss) {
            return Some(AlertKind::StopLoss);
        }
        return None;
    }

    if pnl_pct.abs() > config.significant_move_pct {
        return match current {
            Some(state) if state.last_kind == AlertKind::SignificantMove => {
                if (pnl_pct - state.last_pct).abs() >= config.update_increment_pct {
                    Some(AlertKind::SignificantMove)
                } else {
                    None
                }
            }
            _ => Some(AlertKind::SignificantMove),
        };
    }

    None
}
