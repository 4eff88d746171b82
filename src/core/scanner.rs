// Watchlist scanner: technical scoring of entry candidates

use tracing::{debug, warn};

use crate::config::ScannerConfig;
use crate::providers::MarketDataProvider;
use crate::types::{Bar, MarketSnapshot, Signal};

/// Indicator readings for one symbol's bar window.
#[derive(Debug, Clone, Copy)]
pub struct TechnicalReadings {
    pub latest_close: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub rsi_14: f64,
    pub volume_ratio: f64,
    pub momentum: f64,
    pub short_term_change: f64,
}

/// Scores watchlist symbols from market bars. Scoring itself is a pure
/// function of the bar window; only the fetch is async.
pub struct OpportunityScanner<M> {
    market_data: M,
    config: ScannerConfig,
}

impl<M: MarketDataProvider> OpportunityScanner<M> {
    pub fn new(market_data: M, config: ScannerConfig) -> Self {
        Self {
            market_data,
            config,
        }
    }

    /// Scan the watchlist and return candidates sorted by descending
    /// score. Symbols with missing or short bar history are skipped,
    /// never fatal for the scan.
    pub async fn scan(&self, watchlist: &[String]) -> Vec<(Signal, MarketSnapshot)> {
        let mut candidates = Vec::new();

        for symbol in watchlist {
            let bars = match self
                .market_data
                .bars(symbol, self.config.lookback_bars)
                .await
            {
                Ok(bars) => bars,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "⚠️  Bar fetch failed, skipping symbol");
                    continue;
                }
            };

            if bars.len() < self.config.lookback_bars {
                debug!(
                    symbol = %symbol,
                    have = bars.len(),
                    need = self.config.lookback_bars,
                    "Insufficient bar history, excluded from scoring"
                );
                continue;
            }

            let readings = compute_readings(&bars, self.config.short_term_bars);
            let score = score_readings(&readings, &self.config);
            let last = bars[bars.len() - 1];

            debug!(symbol = %symbol, score = format!("{:.1}", score), "Scored symbol");

            if score >= self.config.min_score {
                candidates.push((
                    Signal {
                        symbol: symbol.clone(),
                        score,
                        price: last.close,
                        timestamp: last.timestamp,
                    },
                    MarketSnapshot {
                        symbol: symbol.clone(),
                        price: last.close,
                        score,
                        sma_20: readings.sma_20,
                        sma_50: readings.sma_50,
                        rsi_14: readings.rsi_14,
                        volume_ratio: readings.volume_ratio,
                        timestamp: last.timestamp,
                    },
                ));
            }
        }

        candidates.sort_by(|a, b| {
            b.0.score
                .partial_cmp(&a.0.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
    }
}

/// Compute indicator readings over a bar window, oldest -> newest.
/// Callers guarantee the window covers SMA(50).
pub fn compute_readings(bars: &[Bar], short_term_bars: usize) -> TechnicalReadings {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let latest_close = closes[closes.len() - 1];

    let sma_20 = sma(&closes, 20);
    let sma_50 = sma(&closes, 50);
    let rsi_14 = rsi(&closes, 14);

    let mean_volume = bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64;
    let volume_ratio = if mean_volume > 0.0 {
        bars[bars.len() - 1].volume / mean_volume
    } else {
        0.0
    };

    // Latest close against the start of the window.
    let momentum = latest_close - closes[0];

    let short_idx = closes.len().saturating_sub(short_term_bars + 1);
    let short_base = closes[short_idx];
    let short_term_change = if short_base != 0.0 {
        (latest_close - short_base) / short_base
    } else {
        0.0
    };

    TechnicalReadings {
        latest_close,
        sma_20,
        sma_50,
        rsi_14,
        volume_ratio,
        momentum,
        short_term_change,
    }
}

/// Additive score out of 100 from six weighted sub-checks.
pub fn score_readings(r: &TechnicalReadings, config: &ScannerConfig) -> f64 {
    let mut score = 0.0;

    if r.latest_close > r.sma_20 {
        score += 20.0;
    }

    if r.sma_20 > r.sma_50 {
        score += 15.0;
    }

    score += rsi_points(r.rsi_14);

    if r.volume_ratio > config.volume_ratio_threshold {
        score += 15.0;
    }

    if r.momentum > 0.0 {
        score += 15.0;
    }

    score += short_term_points(r.short_term_change);

    score.clamp(0.0, 100.0)
}

/// RSI sub-score: full 20 points in the healthy (30, 70) band, linearly
/// graded to 0 across [20, 30] and [70, 80], nothing outside [20, 80].
pub fn rsi_points(rsi: f64) -> f64 {
    if rsi > 30.0 && rsi < 70.0 {
        20.0
    } else if (20.0..=30.0).contains(&rsi) {
        20.0 * (rsi - 20.0) / 10.0
    } else if (70.0..=80.0).contains(&rsi) {
        20.0 * (80.0 - rsi) / 10.0
    } else {
        0.0
    }
}

/// Short-term change sub-score: proportional within (0, 5%), zero for
/// flat, negative, or over-extended moves.
pub fn short_term_points(change: f64) -> f64 {
    if change > 0.0 && change < 0.05 {
        15.0 * (change / 0.05)
    } else {
        0.0
    }
}

fn sma(values: &[f64], period: usize) -> f64 {
    if values.len() < period || period == 0 {
        return 0.0;
    }
    values[values.len() - period..].iter().sum::<f64>() / period as f64
}

/// RSI over the final `period` deltas of the close series.
fn rsi(closes: &[f64], period: usize) -> f64 {
    if closes.len() <= period {
        return 50.0;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    let start = closes.len() - period - 1;
    for pair in closes[start..].windows(2) {
        let delta = pair[1] - pair[0];
        if delta >= 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }

    if losses == 0.0 {
        return 100.0;
    }
    let rs = gains / losses;
    100.0 - 100.0 / (1.0 + rs)
}
