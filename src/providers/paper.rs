// Paper execution: simulated fills against live quotes

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{TradingError, TradingResult};
use crate::providers::{ExecutionGateway, MarketDataProvider, NotificationSink};
use crate::types::{
    AlertKind, ExitReason, InstrumentKind, Position, Sizing, TradeAction, TradeDecision,
};

/// In-memory broker. Fills at the touch plus a small random slippage,
/// tracks positions, and replays the same position for a repeated
/// idempotency key instead of double-filling.
pub struct PaperGateway {
    market_data: Arc<dyn MarketDataProvider>,
    positions: Mutex<HashMap<String, Position>>,
    fills_by_key: Mutex<HashMap<String, String>>,
}

impl PaperGateway {
    pub fn new(market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            market_data,
            positions: Mutex::new(HashMap::new()),
            fills_by_key: Mutex::new(HashMap::new()),
        }
    }

    fn slippage() -> f64 {
        rand::thread_rng().gen_range(0.0..0.001)
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    async fn open_positions(&self) -> TradingResult<Vec<Position>> {
        let positions = self.positions.lock().expect("positions lock poisoned");
        Ok(positions.values().cloned().collect())
    }

    async fn open_position(
        &self,
        decision: &TradeDecision,
        idempotency_key: &str,
    ) -> TradingResult<Position> {
        // Repeated key returns the original fill.
        {
            let fills = self.fills_by_key.lock().expect("fills lock poisoned");
            if let Some(position_id) = fills.get(idempotency_key) {
                let positions = self.positions.lock().expect("positions lock poisoned");
                if let Some(existing) = positions.get(position_id) {
                    debug!(key = idempotency_key, "Replaying idempotent fill");
                    return Ok(existing.clone());
                }
            }
        }

        if decision.instrument == InstrumentKind::Stock && decision.action == TradeAction::Sell {
            return Err(TradingError::OrderFailed {
                symbol: decision.symbol.clone(),
                reason: "short stock not supported in a paper account".to_string(),
            });
        }

        let (entry_price, quantity) = match decision.sizing {
            Sizing::Notional(notional) => {
                let quote = self.market_data.latest_quote(&decision.symbol).await?;
                let fill = quote.ask * (1.0 + Self::slippage());
                (fill, notional / fill)
            }
            Sizing::Contracts(contracts) => {
                let option = decision.option.ok_or_else(|| TradingError::OrderFailed {
                    symbol: decision.symbol.clone(),
                    reason: "contract sizing without a contract".to_string(),
                })?;
                let fill = option.premium * (1.0 + Self::slippage());
                (fill, contracts as f64)
            }
        };

        let position = Position {
            id: Uuid::new_v4().to_string(),
            symbol: decision.symbol.clone(),
            instrument: decision.instrument,
            action: decision.action,
            entry_price,
            quantity,
            opened_at: Utc::now(),
            option: decision.option,
        };

        {
            let mut positions = self.positions.lock().expect("positions lock poisoned");
            positions.insert(position.id.clone(), position.clone());
        }
        {
            let mut fills = self.fills_by_key.lock().expect("fills lock poisoned");
            fills.insert(idempotency_key.to_string(), position.id.clone());
        }

        info!(
            position = %position.id,
            symbol = %position.symbol,
            fill = format!("{:.2}", entry_price),
            "🧾 Paper fill"
        );
        Ok(position)
    }

    async fn close_position(&self, position_id: &str, reason: ExitReason) -> TradingResult<f64> {
        let position = {
            let positions = self.positions.lock().expect("positions lock poisoned");
            positions
                .get(position_id)
                .cloned()
                .ok_or_else(|| TradingError::PositionNotFound(position_id.to_string()))?
        };

        let quote = self.market_data.latest_quote(&position.symbol).await?;
        let mark = position.mark_price(quote.price, Utc::now().date_naive());
        let exit = mark * (1.0 - Self::slippage());

        let multiplier = match position.instrument {
            InstrumentKind::Stock => 1.0,
            InstrumentKind::Call | InstrumentKind::Put => 100.0,
        };
        let direction = match (position.instrument, position.action) {
            (InstrumentKind::Stock, TradeAction::Sell) => -1.0,
            _ => 1.0,
        };
        let realized = (exit - position.entry_price) * position.quantity * multiplier * direction;

        let mut positions = self.positions.lock().expect("positions lock poisoned");
        positions.remove(position_id);

        info!(
            position = %position_id,
            symbol = %position.symbol,
            reason = %reason,
            realized = format!("{:+.2}", realized),
            "🧾 Paper close"
        );
        Ok(realized)
    }
}

/// Notification sink that writes to the log. Stands in for a chat or
/// email channel during paper trading.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(
        &self,
        position_id: &str,
        kind: Option<AlertKind>,
        message: &str,
    ) -> TradingResult<()> {
        match kind {
            Some(kind) => info!(position = %position_id, alert = %kind, "📣 {message}"),
            None => info!(position = %position_id, "📣 {message}"),
        }
        Ok(())
    }
}
