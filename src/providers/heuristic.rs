// Rule-based recommendation and sentiment stand-ins for paper trading

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use crate::error::TradingResult;
use crate::providers::{RecommendationService, SentimentService};
use crate::types::{
    ExitRecommendation, MarketSnapshot, Position, Recommendation, TradeAction,
};

/// Deterministic advisor driven by the snapshot's own indicators. Fills
/// the recommendation seat when no external AI endpoint is configured.
pub struct HeuristicAdvisor;

impl HeuristicAdvisor {
    fn trend_favors_entry(snapshot: &MarketSnapshot) -> Option<TradeAction> {
        if snapshot.price > snapshot.sma_20 && snapshot.rsi_14 < 70.0 {
            Some(TradeAction::Buy)
        } else if snapshot.price < snapshot.sma_20 && snapshot.rsi_14 > 30.0 {
            Some(TradeAction::Sell)
        } else {
            None
        }
    }
}

#[async_trait]
impl RecommendationService for HeuristicAdvisor {
    async fn analyze(&self, snapshot: &MarketSnapshot) -> TradingResult<Recommendation> {
        let Some(action) = Self::trend_favors_entry(snapshot) else {
            return Ok(Recommendation {
                action: TradeAction::Hold,
                confidence: 0.0,
                reasoning: "indicators disagree".to_string(),
            });
        };

        let volume_boost = (snapshot.volume_ratio - 1.0).clamp(-0.05, 0.05);
        let confidence =
            (0.35 + snapshot.score / 160.0 + volume_boost).clamp(0.0, 0.95);

        Ok(Recommendation {
            action,
            confidence,
            reasoning: format!(
                "score {:.0}, rsi {:.0}, volume x{:.2}",
                snapshot.score, snapshot.rsi_14, snapshot.volume_ratio
            ),
        })
    }

    async fn exit_recommendation(
        &self,
        position: &Position,
        snapshot: &MarketSnapshot,
    ) -> TradingResult<ExitRecommendation> {
        // Exit when the trend that justified the entry is gone.
        let still_favored = match position.action {
            TradeAction::Buy => snapshot.price > snapshot.sma_20 && snapshot.rsi_14 < 75.0,
            TradeAction::Sell => snapshot.price < snapshot.sma_20 && snapshot.rsi_14 > 25.0,
            TradeAction::Hold => false,
        };
        Ok(ExitRecommendation {
            should_exit: !still_favored,
            confidence: if still_favored { 0.6 } else { 0.8 },
        })
    }
}

/// Per-symbol sentiment nudge, stable within a session. Real feeds
/// plug in behind the same trait.
pub struct SimulatedSentiment;

#[async_trait]
impl SentimentService for SimulatedSentiment {
    async fn sentiment_delta(&self, symbol: &str) -> TradingResult<f64> {
        let mut hasher = DefaultHasher::new();
        symbol.hash(&mut hasher);
        // Map the hash into [-0.05, 0.05].
        let unit = (hasher.finish() % 1_000) as f64 / 1_000.0;
        Ok((unit - 0.5) * 0.1)
    }
}
