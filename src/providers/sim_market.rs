// Simulated market data: deterministic random walks for paper trading

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{TradingError, TradingResult};
use crate::providers::MarketDataProvider;
use crate::types::{Bar, InstrumentKind, OptionContract, Quote};

/// Price history generator backed by a per-symbol seeded random walk.
/// The same symbol always replays the same walk, so repeated scans and
/// monitor ticks see consistent prices within a session.
pub struct SimulatedMarketData {
    base_price: f64,
    drift: f64,
    volatility: f64,
}

impl SimulatedMarketData {
    pub fn new(base_price: f64, drift: f64, volatility: f64) -> Self {
        Self {
            base_price,
            drift,
            volatility,
        }
    }

    /// Mild upward drift, enough for some symbols to clear the scan
    /// threshold without all of them doing so.
    pub fn default_walk() -> Self {
        Self::new(100.0, 0.0006, 0.012)
    }

    fn walk(&self, symbol: &str, count: usize) -> Vec<f64> {
        let mut hasher = DefaultHasher::new();
        symbol.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        // Symbol hash also spreads base prices so watchlists are not
        // all trading at the same level.
        let start = self.base_price * rng.gen_range(0.5..2.5);
        let mut price = start;
        let mut closes = Vec::with_capacity(count);
        for _ in 0..count {
            let shock = rng.gen_range(-self.volatility..self.volatility);
            price *= 1.0 + self.drift + shock;
            closes.push(price.max(0.01));
        }
        closes
    }
}

#[async_trait]
impl MarketDataProvider for SimulatedMarketData {
    async fn bars(&self, symbol: &str, count: usize) -> TradingResult<Vec<Bar>> {
        let closes = self.walk(symbol, count);
        let end = Utc::now();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Bar {
                    open,
                    high: close.max(open) * 1.002,
                    low: close.min(open) * 0.998,
                    close,
                    volume: 1_000_000.0 * (1.0 + (i as f64 / count as f64)),
                    timestamp: end - Duration::hours((count - i) as i64),
                }
            })
            .collect();
        Ok(bars)
    }

    async fn latest_quote(&self, symbol: &str) -> TradingResult<Quote> {
        let closes = self.walk(symbol, 64);
        let price = *closes.last().ok_or_else(|| TradingError::MarketData {
            symbol: symbol.to_string(),
            reason: "empty walk".to_string(),
        })?;
        let spread = price * 0.0005;
        Ok(Quote {
            bid: price - spread,
            ask: price + spread,
            price,
            timestamp: Utc::now(),
        })
    }

    async fn option_contract(
        &self,
        symbol: &str,
        right: InstrumentKind,
        dte_window: (i64, i64),
        otm_steps: u32,
    ) -> TradingResult<OptionContract> {
        let quote = self.latest_quote(symbol).await?;
        let step = strike_step(quote.price);

        let at_money = (quote.price / step).round() * step;
        let strike = match right {
            InstrumentKind::Call => at_money + step * otm_steps as f64,
            InstrumentKind::Put => at_money - step * otm_steps as f64,
            InstrumentKind::Stock => {
                return Err(TradingError::NoContractAvailable {
                    symbol: symbol.to_string(),
                    min_dte: dte_window.0,
                    max_dte: dte_window.1,
                })
            }
        };

        // Simulated chains always have the far end of the window listed.
        let dte = dte_window.1;
        let expiration = Utc::now().date_naive() + Duration::days(dte);

        // Rough premium: a few percent of spot, wider for longer dated.
        let premium = quote.price * (0.02 + 0.0005 * dte as f64);

        Ok(OptionContract {
            strike,
            expiration,
            premium: (premium * 100.0).round() / 100.0,
            dte,
        })
    }
}

/// Listed strike spacing by price level.
fn strike_step(price: f64) -> f64 {
    if price < 25.0 {
        0.5
    } else if price < 100.0 {
        1.0
    } else if price < 250.0 {
        2.5
    } else {
        5.0
    }
}
