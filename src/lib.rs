// Swing Trading Bot Library
//
// An automated trade-lifecycle engine: opportunity scanning, AI-assisted
// instrument routing, risk gating, and position monitoring with
// deduplicated alerts.

pub mod config;
pub mod core;
pub mod db; // SQLite database layer
pub mod error; // Unified error handling
pub mod providers; // Collaborator traits and built-in implementations
pub mod types;
pub mod validation; // Pre-flight validation

// Re-export core engine types
pub use core::{
    AlertStateTracker, CircuitBreaker, InstrumentRouter, LifecycleOrchestrator,
    OpportunityScanner, PositionMonitor, RiskLimits, RiskLimitsHandle, RouteResult, Verdict,
};

// Re-export error types
pub use error::{TradingError, TradingResult};

// Re-export validation types
pub use validation::{validate_config, ValidationCheck, ValidationLevel, ValidationResult};

// Re-export configuration
pub use config::{Config, ConfigError};

// Re-export database types
pub use db::{AlertRecord, Database, TradeLog, TradeRecord};

// Re-export collaborator contracts
pub use providers::{
    ExecutionGateway, MarketDataProvider, NotificationSink, RecommendationService,
    SentimentService, TradeStore,
};

// Re-export common domain types
pub use types::{
    AlertKind, Bar, ExitReason, ExitRecommendation, InstrumentKind, MarketSnapshot,
    OptionContract, Position, Quote, Recommendation, Signal, Sizing, TradeAction, TradeDecision,
};
