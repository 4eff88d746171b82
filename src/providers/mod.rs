// External collaborator contracts and built-in implementations

pub mod heuristic;
pub mod paper;
pub mod sim_market;
pub mod traits;

pub use heuristic::{HeuristicAdvisor, SimulatedSentiment};
pub use paper::{LogNotifier, PaperGateway};
pub use sim_market::SimulatedMarketData;
pub use traits::{
    ExecutionGateway, MarketDataProvider, NotificationSink, RecommendationService,
    SentimentService, TradeStore,
};
