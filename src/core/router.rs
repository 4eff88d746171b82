// Instrument routing: signal + AI recommendation -> trade decision

use tracing::debug;

use crate::config::RouterConfig;
use crate::error::TradingResult;
use crate::providers::MarketDataProvider;
use crate::types::{
    InstrumentKind, Recommendation, Signal, Sizing, TradeAction, TradeDecision,
};

/// Router outcome. Skip carries the reason for the log line; it is
/// expected control flow, not an error.
#[derive(Debug, Clone)]
pub enum RouteResult {
    Trade(TradeDecision),
    Skip(&'static str),
}

pub struct InstrumentRouter<M> {
    market_data: M,
    config: RouterConfig,
    max_position_size: f64,
}

impl<M: MarketDataProvider> InstrumentRouter<M> {
    pub fn new(market_data: M, config: RouterConfig, max_position_size: f64) -> Self {
        Self {
            market_data,
            config,
            max_position_size,
        }
    }

    /// Route a scored signal plus AI recommendation and sentiment delta
    /// into an instrument decision. The thresholds run on adjusted
    /// confidence: clamp(confidence + sentiment_delta, 0, 1).
    pub async fn route(
        &self,
        signal: &Signal,
        recommendation: &Recommendation,
        sentiment_delta: f64,
        dte_window: (i64, i64),
    ) -> TradingResult<RouteResult> {
        let adjusted = (recommendation.confidence + sentiment_delta).clamp(0.0, 1.0);

        debug!(
            symbol = %signal.symbol,
            action = ?recommendation.action,
            confidence = format!("{:.2}", recommendation.confidence),
            adjusted = format!("{:.2}", adjusted),
            score = format!("{:.1}", signal.score),
            "Routing candidate"
        );

        if recommendation.action == TradeAction::Hold {
            return Ok(RouteResult::Skip("AI recommends HOLD"));
        }

        let wants_options = adjusted >= self.config.options_confidence_threshold
            && signal.score >= self.config.options_score_threshold;

        if wants_options {
            let right = match recommendation.action {
                TradeAction::Buy => InstrumentKind::Call,
                TradeAction::Sell => InstrumentKind::Put,
                TradeAction::Hold => unreachable!(),
            };

            let Some(contracts) = self.option_contract_count(adjusted) else {
                return Ok(RouteResult::Skip("confidence below option sizing floor"));
            };

            let contract = self
                .market_data
                .option_contract(&signal.symbol, right, dte_window, self.config.otm_steps)
                .await?;

            return Ok(RouteResult::Trade(TradeDecision {
                symbol: signal.symbol.clone(),
                instrument: right,
                action: recommendation.action,
                confidence: adjusted,
                score: signal.score,
                sizing: Sizing::Contracts(contracts),
                option: Some(contract),
            }));
        }

        if adjusted >= self.config.stock_confidence_threshold {
            let notional = self.stock_notional(adjusted);
            return Ok(RouteResult::Trade(TradeDecision {
                symbol: signal.symbol.clone(),
                instrument: InstrumentKind::Stock,
                action: recommendation.action,
                confidence: adjusted,
                score: signal.score,
                sizing: Sizing::Notional(notional),
                option: None,
            }));
        }

        Ok(RouteResult::Skip("adjusted confidence below stock threshold"))
    }

    /// Option sizing: 2 contracts at high conviction, 1 in the middle
    /// band, none below.
    fn option_contract_count(&self, adjusted_confidence: f64) -> Option<u32> {
        if adjusted_confidence >= self.config.double_contract_confidence {
            Some(2)
        } else if adjusted_confidence >= self.config.single_contract_confidence {
            Some(1)
        } else {
            None
        }
    }

    /// Stock sizing: monotonic non-decreasing map from confidence to a
    /// dollar notional between the floor and the configured maximum.
    fn stock_notional(&self, adjusted_confidence: f64) -> f64 {
        let floor = self.config.stock_notional_floor.min(self.max_position_size);
        let span = (self.max_position_size - floor).max(0.0);
        let t = ((adjusted_confidence - self.config.stock_confidence_threshold)
            / (1.0 - self.config.stock_confidence_threshold))
            .clamp(0.0, 1.0);
        floor + span * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TradingResult;
    use crate::providers::MarketDataProvider;
    use crate::types::{Bar, OptionContract, Quote};
    use async_trait::async_trait;
    use chrono::Utc;

    /// Market data stub quoting a fixed option contract.
    struct FixedChain {
        premium: f64,
        dte: i64,
    }

    #[async_trait]
    impl MarketDataProvider for FixedChain {
        async fn bars(&self, _symbol: &str, _count: usize) -> TradingResult<Vec<Bar>> {
            Ok(Vec::new())
        }

        async fn latest_quote(&self, _symbol: &str) -> TradingResult<Quote> {
            Ok(Quote {
                bid: 99.9,
                ask: 100.1,
                price: 100.0,
                timestamp: Utc::now(),
            })
        }

        async fn option_contract(
            &self,
            _symbol: &str,
            right: InstrumentKind,
            _dte_window: (i64, i64),
            otm_steps: u32,
        ) -> TradingResult<OptionContract> {
            let offset = 5.0 * otm_steps as f64;
            let strike = match right {
                InstrumentKind::Call => 100.0 + offset,
                InstrumentKind::Put => 100.0 - offset,
                InstrumentKind::Stock => 100.0,
            };
            Ok(OptionContract {
                strike,
                expiration: Utc::now().date_naive() + chrono::Duration::days(self.dte),
                premium: self.premium,
                dte: self.dte,
            })
        }
    }

    fn router() -> InstrumentRouter<FixedChain> {
        InstrumentRouter::new(
            FixedChain {
                premium: 3.00,
                dte: 35,
            },
            RouterConfig {
                options_confidence_threshold: 0.75,
                options_score_threshold: 75.0,
                stock_confidence_threshold: 0.60,
                single_contract_confidence: 0.70,
                double_contract_confidence: 0.80,
                otm_steps: 1,
                stock_notional_floor: 1_000.0,
            },
            10_000.0,
        )
    }

    fn signal(score: f64) -> Signal {
        Signal {
            symbol: "NVDA".to_string(),
            score,
            price: 100.0,
            timestamp: Utc::now(),
        }
    }

    fn rec(action: TradeAction, confidence: f64) -> Recommendation {
        Recommendation {
            action,
            confidence,
            reasoning: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_high_conviction_buy_routes_to_call_x2() {
        let r = router();
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Buy, 0.80), 0.0, (30, 45))
            .await
            .unwrap();
        match result {
            RouteResult::Trade(d) => {
                assert_eq!(d.instrument, InstrumentKind::Call);
                assert_eq!(d.sizing, Sizing::Contracts(2));
                assert!(d.option.unwrap().strike > 100.0);
            }
            RouteResult::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_sell_routes_to_put() {
        let r = router();
        let result = r
            .route(&signal(90.0), &rec(TradeAction::Sell, 0.76), 0.0, (30, 45))
            .await
            .unwrap();
        match result {
            RouteResult::Trade(d) => {
                assert_eq!(d.instrument, InstrumentKind::Put);
                assert_eq!(d.sizing, Sizing::Contracts(1));
                assert!(d.option.unwrap().strike < 100.0);
            }
            RouteResult::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_mid_confidence_falls_back_to_stock() {
        let r = router();
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Buy, 0.65), 0.0, (30, 45))
            .await
            .unwrap();
        match result {
            RouteResult::Trade(d) => {
                assert_eq!(d.instrument, InstrumentKind::Stock);
                assert!(matches!(d.sizing, Sizing::Notional(n) if n >= 1_000.0));
            }
            RouteResult::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_low_score_blocks_options_even_at_high_confidence() {
        let r = router();
        let result = r
            .route(&signal(70.0), &rec(TradeAction::Buy, 0.85), 0.0, (30, 45))
            .await
            .unwrap();
        match result {
            RouteResult::Trade(d) => assert_eq!(d.instrument, InstrumentKind::Stock),
            RouteResult::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_hold_skips() {
        let r = router();
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Hold, 0.95), 0.0, (30, 45))
            .await
            .unwrap();
        assert!(matches!(result, RouteResult::Skip(_)));
    }

    #[tokio::test]
    async fn test_low_confidence_skips() {
        let r = router();
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Buy, 0.50), 0.0, (30, 45))
            .await
            .unwrap();
        assert!(matches!(result, RouteResult::Skip(_)));
    }

    #[tokio::test]
    async fn test_sentiment_delta_shifts_threshold() {
        let r = router();
        // 0.72 alone is below the options bar; +0.05 sentiment crosses it.
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Buy, 0.72), 0.05, (30, 45))
            .await
            .unwrap();
        match result {
            RouteResult::Trade(d) => assert_eq!(d.instrument, InstrumentKind::Call),
            RouteResult::Skip(reason) => panic!("unexpected skip: {}", reason),
        }

        // Negative sentiment pulls the same signal down to stock.
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Buy, 0.78), -0.05, (30, 45))
            .await
            .unwrap();
        match result {
            RouteResult::Trade(d) => assert_eq!(d.instrument, InstrumentKind::Stock),
            RouteResult::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_sizing_floor_skips_when_options_gate_is_lower() {
        // An options gate below the single-contract floor leaves a band
        // where options are wanted but no contract count qualifies.
        let r = InstrumentRouter::new(
            FixedChain {
                premium: 3.00,
                dte: 35,
            },
            RouterConfig {
                options_confidence_threshold: 0.65,
                options_score_threshold: 75.0,
                stock_confidence_threshold: 0.60,
                single_contract_confidence: 0.70,
                double_contract_confidence: 0.80,
                otm_steps: 1,
                stock_notional_floor: 1_000.0,
            },
            10_000.0,
        );
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Buy, 0.66), 0.0, (30, 45))
            .await
            .unwrap();
        assert!(matches!(result, RouteResult::Skip(_)));

        // At the floor itself, one contract is sized.
        let result = r
            .route(&signal(95.0), &rec(TradeAction::Buy, 0.71), 0.0, (30, 45))
            .await
            .unwrap();
        match result {
            RouteResult::Trade(d) => assert_eq!(d.sizing, Sizing::Contracts(1)),
            RouteResult::Skip(reason) => panic!("unexpected skip: {}", reason),
        }
    }

    #[tokio::test]
    async fn test_stock_sizing_is_monotonic() {
        let r = router();
        let mut last = 0.0;
        for confidence in [0.60, 0.65, 0.70, 0.74] {
            let result = r
                .route(&signal(70.0), &rec(TradeAction::Buy, confidence), 0.0, (30, 45))
                .await
                .unwrap();
            let RouteResult::Trade(d) = result else {
                panic!("expected trade at confidence {}", confidence)
            };
            let Sizing::Notional(n) = d.sizing else {
                panic!("expected notional sizing")
            };
            assert!(n >= last, "sizing not monotonic: {} < {}", n, last);
            assert!(n <= 10_000.0);
            last = n;
        }
    }
}
