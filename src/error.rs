//! Unified error handling for the swing trading bot.
//!
//! One error type across the engine so loop code can decide whether a
//! failure skips a symbol, skips a decision, or surfaces to the
//! operator.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradingError {
    // Configuration
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidation(String),

    // Market data
    #[error("Market data error for {symbol}: {reason}")]
    MarketData { symbol: String, reason: String },

    #[error("Insufficient bar history for {symbol}: have {have}, need {need}")]
    InsufficientBars {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error("No option contract available for {symbol} within DTE window [{min_dte}, {max_dte}]")]
    NoContractAvailable {
        symbol: String,
        min_dte: i64,
        max_dte: i64,
    },

    // AI decision services
    #[error("Recommendation service error: {0}")]
    Recommendation(String),

    // Risk
    #[error("Trade rejected: {0}")]
    RiskRejected(String),

    #[error("Circuit breaker tripped: daily loss ${0:.2}")]
    CircuitBreakerTripped(f64),

    // Execution
    #[error("Order failed for {symbol}: {reason}")]
    OrderFailed { symbol: String, reason: String },

    #[error("Position not found: {0}")]
    PositionNotFound(String),

    #[error("Exit already in flight for position {0}")]
    ExitInFlight(String),

    // Persistence
    #[error("Database error: {0}")]
    Database(String),

    // Connectivity
    #[error("API timeout: {0}")]
    ApiTimeout(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TradingError {
    /// Whether the failure is transient and worth retrying on a later
    /// tick. Only connectivity-shaped failures qualify; decision and
    /// validation failures are final for their tick.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TradingError::ApiTimeout(_)
                | TradingError::NetworkUnavailable(_)
                | TradingError::MarketData { .. }
        )
    }

    /// Error category for logging and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            TradingError::ConfigNotFound(_)
            | TradingError::ConfigParse(_)
            | TradingError::ConfigValidation(_) => "config",

            TradingError::MarketData { .. }
            | TradingError::InsufficientBars { .. }
            | TradingError::NoContractAvailable { .. } => "market_data",

            TradingError::Recommendation(_) => "recommendation",

            TradingError::RiskRejected(_) | TradingError::CircuitBreakerTripped(_) => "risk",

            TradingError::OrderFailed { .. }
            | TradingError::PositionNotFound(_)
            | TradingError::ExitInFlight(_) => "execution",

            TradingError::Database(_) => "database",

            TradingError::ApiTimeout(_) | TradingError::NetworkUnavailable(_) => "network",

            TradingError::ValidationFailed(_) | TradingError::Internal(_) => "internal",
        }
    }
}

impl From<rusqlite::Error> for TradingError {
    fn from(err: rusqlite::Error) -> Self {
        TradingError::Database(err.to_string())
    }
}

impl From<std::io::Error> for TradingError {
    fn from(err: std::io::Error) -> Self {
        TradingError::Internal(format!("IO error: {}", err))
    }
}

impl From<toml::de::Error> for TradingError {
    fn from(err: toml::de::Error) -> Self {
        TradingError::ConfigParse(err.to_string())
    }
}

impl From<serde_json::Error> for TradingError {
    fn from(err: serde_json::Error) -> Self {
        TradingError::Internal(format!("JSON error: {}", err))
    }
}

impl From<String> for TradingError {
    fn from(msg: String) -> Self {
        TradingError::Internal(msg)
    }
}

impl From<&str> for TradingError {
    fn from(msg: &str) -> Self {
        TradingError::Internal(msg.to_string())
    }
}

/// Result type alias using TradingError
pub type TradingResult<T> = Result<T, TradingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TradingError::InsufficientBars {
            symbol: "AAPL".to_string(),
            have: 12,
            need: 60,
        };
        assert!(err.to_string().contains("AAPL"));
        assert!(err.to_string().contains("12"));
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            TradingError::ConfigParse("x".to_string()).category(),
            "config"
        );
        assert_eq!(
            TradingError::CircuitBreakerTripped(500.0).category(),
            "risk"
        );
        assert_eq!(
            TradingError::OrderFailed {
                symbol: "TSLA".to_string(),
                reason: "rejected".to_string()
            }
            .category(),
            "execution"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(TradingError::ApiTimeout("t".to_string()).is_retryable());
        assert!(!TradingError::RiskRejected("max positions".to_string()).is_retryable());
    }
}
