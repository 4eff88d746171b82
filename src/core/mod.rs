// Core trading logic modules

pub mod alerts;
pub mod engine;
pub mod monitor;
pub mod risk;
pub mod router;
pub mod scanner;

// Re-export commonly used types
pub use alerts::AlertStateTracker;
pub use engine::LifecycleOrchestrator;
pub use monitor::PositionMonitor;
pub use risk::{validate_trade, CircuitBreaker, RiskLimits, RiskLimitsHandle, Verdict};
pub use router::{InstrumentRouter, RouteResult};
pub use scanner::OpportunityScanner;
