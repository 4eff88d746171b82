// Configuration management for the swing trading bot

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading: TradingConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Symbols scanned for entries each cycle.
    pub watchlist: Vec<String>,
    #[serde(default = "default_buying_power")]
    pub buying_power: f64,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Bars fetched per symbol. Must cover SMA(50).
    #[serde(default = "default_lookback_bars")]
    pub lookback_bars: usize,
    /// Bars back for the short-term percent change check.
    #[serde(default = "default_short_term_bars")]
    pub short_term_bars: usize,
    /// Minimum score for a symbol to become a candidate.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Volume ratio above which the volume check scores.
    #[serde(default = "default_volume_ratio")]
    pub volume_ratio_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Adjusted confidence floor for any options trade.
    #[serde(default = "default_options_confidence")]
    pub options_confidence_threshold: f64,
    /// Technical score floor for any options trade.
    #[serde(default = "default_options_score")]
    pub options_score_threshold: f64,
    /// Adjusted confidence floor for a stock trade.
    #[serde(default = "default_stock_confidence")]
    pub stock_confidence_threshold: f64,
    /// Adjusted confidence floor for a single contract.
    #[serde(default = "default_single_contract")]
    pub single_contract_confidence: f64,
    /// Adjusted confidence at which option sizing doubles to 2 contracts.
    #[serde(default = "default_double_contracts")]
    pub double_contract_confidence: f64,
    /// Strike offset in out-of-the-money steps from the current price.
    #[serde(default = "default_otm_steps")]
    pub otm_steps: u32,
    /// Smallest stock notional the sizer will propose.
    #[serde(default = "default_notional_floor")]
    pub stock_notional_floor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_max_positions")]
    pub max_position_count: usize,
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: f64,
    #[serde(default = "default_max_position_size")]
    pub max_position_size: f64,
    #[serde(default = "default_max_option_premium")]
    pub max_option_premium: f64,
    #[serde(default = "default_min_dte")]
    pub min_dte: i64,
    #[serde(default = "default_max_dte")]
    pub max_dte: i64,
    #[serde(default = "default_max_contracts")]
    pub max_contracts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Options at or under this many days to expiration are force-closed.
    #[serde(default = "default_close_dte")]
    pub close_dte: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_profit_target")]
    pub profit_target_pct: f64,
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pct: f64,
    #[serde(default = "default_significant_move")]
    pub significant_move_pct: f64,
    #[serde(default = "default_update_increment")]
    pub update_increment_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_secs: u64,
    /// Market open/close, UTC "HH:MM". Ticks outside the window are idle.
    #[serde(default = "default_market_open")]
    pub market_open_utc: String,
    #[serde(default = "default_market_close")]
    pub market_close_utc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_buying_power() -> f64 {
    25_000.0
}
fn default_lookback_bars() -> usize {
    60
}
fn default_short_term_bars() -> usize {
    5
}
fn default_min_score() -> f64 {
    60.0
}
fn default_volume_ratio() -> f64 {
    1.2
}
fn default_options_confidence() -> f64 {
    0.75
}
fn default_options_score() -> f64 {
    75.0
}
fn default_stock_confidence() -> f64 {
    0.60
}
fn default_single_contract() -> f64 {
    0.70
}
fn default_double_contracts() -> f64 {
    0.80
}
fn default_otm_steps() -> u32 {
    1
}
fn default_notional_floor() -> f64 {
    1_000.0
}
fn default_max_positions() -> usize {
    5
}
fn default_max_daily_loss() -> f64 {
    1_000.0
}
fn default_max_position_size() -> f64 {
    10_000.0
}
fn default_max_option_premium() -> f64 {
    1_500.0
}
fn default_min_dte() -> i64 {
    30
}
fn default_max_dte() -> i64 {
    45
}
fn default_max_contracts() -> u32 {
    3
}
fn default_close_dte() -> i64 {
    7
}
fn default_profit_target() -> f64 {
    0.50
}
fn default_stop_loss() -> f64 {
    0.30
}
fn default_significant_move() -> f64 {
    0.10
}
fn default_update_increment() -> f64 {
    0.05
}
fn default_scan_interval() -> u64 {
    300
}
fn default_monitor_interval() -> u64 {
    120
}
fn default_market_open() -> String {
    "14:30".to_string()
}
fn default_market_close() -> String {
    "21:00".to_string()
}
fn default_db_path() -> String {
    "data/swing-bot.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trading: TradingConfig::default(),
            scanner: ScannerConfig::default(),
            router: RouterConfig::default(),
            risk: RiskConfig::default(),
            monitor: MonitorConfig::default(),
            alerts: AlertConfig::default(),
            schedule: ScheduleConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            watchlist: vec![
                "AAPL".to_string(),
                "MSFT".to_string(),
                "NVDA".to_string(),
                "TSLA".to_string(),
            ],
            buying_power: default_buying_power(),
            dry_run: true,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            lookback_bars: default_lookback_bars(),
            short_term_bars: default_short_term_bars(),
            min_score: default_min_score(),
            volume_ratio_threshold: default_volume_ratio(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            options_confidence_threshold: default_options_confidence(),
            options_score_threshold: default_options_score(),
            stock_confidence_threshold: default_stock_confidence(),
            single_contract_confidence: default_single_contract(),
            double_contract_confidence: default_double_contracts(),
            otm_steps: default_otm_steps(),
            stock_notional_floor: default_notional_floor(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_count: default_max_positions(),
            max_daily_loss: default_max_daily_loss(),
            max_position_size: default_max_position_size(),
            max_option_premium: default_max_option_premium(),
            min_dte: default_min_dte(),
            max_dte: default_max_dte(),
            max_contracts: default_max_contracts(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            close_dte: default_close_dte(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            profit_target_pct: default_profit_target(),
            stop_loss_pct: default_stop_loss(),
            significant_move_pct: default_significant_move(),
            update_increment_pct: default_update_increment(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            monitor_interval_secs: default_monitor_interval(),
            market_open_utc: default_market_open(),
            market_close_utc: default_market_close(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.as_ref().display().to_string())
            } else {
                ConfigError::FileRead(e.to_string())
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content).map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            tracing::info!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading.watchlist.is_empty() {
            return Err(ConfigError::Validation(
                "watchlist must not be empty".to_string(),
            ));
        }

        if self.scanner.lookback_bars < 50 {
            return Err(ConfigError::Validation(
                "lookback_bars must be at least 50 to cover SMA(50)".to_string(),
            ));
        }

        if self.scanner.short_term_bars == 0
            || self.scanner.short_term_bars >= self.scanner.lookback_bars
        {
            return Err(ConfigError::Validation(
                "short_term_bars must be positive and smaller than lookback_bars".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.scanner.min_score) {
            return Err(ConfigError::Validation(
                "min_score must be within [0, 100]".to_string(),
            ));
        }

        for (name, v) in [
            (
                "options_confidence_threshold",
                self.router.options_confidence_threshold,
            ),
            (
                "stock_confidence_threshold",
                self.router.stock_confidence_threshold,
            ),
            (
                "single_contract_confidence",
                self.router.single_contract_confidence,
            ),
            (
                "double_contract_confidence",
                self.router.double_contract_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Validation(format!(
                    "{} must be within [0, 1]",
                    name
                )));
            }
        }

        if self.router.single_contract_confidence > self.router.double_contract_confidence {
            return Err(ConfigError::Validation(
                "single_contract_confidence must not exceed double_contract_confidence"
                    .to_string(),
            ));
        }

        if self.router.stock_confidence_threshold > self.router.options_confidence_threshold {
            return Err(ConfigError::Validation(
                "stock_confidence_threshold must not exceed options_confidence_threshold"
                    .to_string(),
            ));
        }

        if self.risk.min_dte >= self.risk.max_dte {
            return Err(ConfigError::Validation(
                "min_dte must be less than max_dte".to_string(),
            ));
        }

        if self.risk.max_daily_loss <= 0.0 || self.risk.max_position_size <= 0.0 {
            return Err(ConfigError::Validation(
                "risk limits must be positive".to_string(),
            ));
        }

        if self.monitor.close_dte < 0 || self.monitor.close_dte >= self.risk.min_dte {
            return Err(ConfigError::Validation(
                "close_dte must be non-negative and below min_dte".to_string(),
            ));
        }

        if self.alerts.profit_target_pct <= 0.0
            || self.alerts.stop_loss_pct <= 0.0
            || self.alerts.significant_move_pct <= 0.0
            || self.alerts.update_increment_pct <= 0.0
        {
            return Err(ConfigError::Validation(
                "alert thresholds must be positive".to_string(),
            ));
        }

        if self.schedule.scan_interval_secs == 0 || self.schedule.monitor_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule intervals must be positive".to_string(),
            ));
        }

        parse_hhmm(&self.schedule.market_open_utc)
            .ok_or_else(|| ConfigError::Validation("market_open_utc must be HH:MM".to_string()))?;
        parse_hhmm(&self.schedule.market_close_utc)
            .ok_or_else(|| ConfigError::Validation("market_close_utc must be HH:MM".to_string()))?;

        Ok(())
    }
}

/// Parse a "HH:MM" string into a NaiveTime.
pub fn parse_hhmm(s: &str) -> Option<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M").ok()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for crate::error::TradingError {
    fn from(err: ConfigError) -> Self {
        use crate::error::TradingError;
        match err {
            ConfigError::FileNotFound(path) => TradingError::ConfigNotFound(path),
            ConfigError::Parse(msg) => TradingError::ConfigParse(msg),
            ConfigError::Validation(msg) => TradingError::ConfigValidation(msg),
            ConfigError::FileRead(msg)
            | ConfigError::FileWrite(msg)
            | ConfigError::Serialize(msg) => TradingError::ConfigParse(msg),
        }
    }
}
