//! Pre-flight validation
//!
//! Runs a set of readiness checks over the loaded configuration before
//! the engine starts, so misconfiguration surfaces up front instead of
//! mid-session.

use tracing::info;

use crate::config::Config;

/// Validation result with detailed findings
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub passed: bool,
    pub checks: Vec<ValidationCheck>,
}

#[derive(Debug, Clone)]
pub struct ValidationCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub level: ValidationLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Critical, // Must pass for operation to proceed
    Warning,  // Should pass, but operation can continue
}

impl ValidationResult {
    pub fn new() -> Self {
        ValidationResult {
            passed: true,
            checks: Vec::new(),
        }
    }

    pub fn add_check(&mut self, check: ValidationCheck) {
        if !check.passed && check.level == ValidationLevel::Critical {
            self.passed = false;
        }
        self.checks.push(check);
    }

    pub fn warnings(&self) -> Vec<&ValidationCheck> {
        self.checks
            .iter()
            .filter(|c| !c.passed && c.level == ValidationLevel::Warning)
            .collect()
    }

    pub fn display(&self) {
        info!("🔍 Pre-flight Validation");
        for check in &self.checks {
            let icon = if check.passed {
                "✅"
            } else {
                match check.level {
                    ValidationLevel::Critical => "❌",
                    ValidationLevel::Warning => "⚠️",
                }
            };
            info!("{} {} - {}", icon, check.name, check.message);
        }
        if self.passed {
            info!("✅ Validation passed");
        } else {
            info!("❌ Validation failed");
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

fn check(name: &str, passed: bool, message: String, level: ValidationLevel) -> ValidationCheck {
    ValidationCheck {
        name: name.to_string(),
        passed,
        message,
        level,
    }
}

/// Run every readiness check against the configuration.
pub fn validate_config(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.add_check(check(
        "Watchlist",
        !config.trading.watchlist.is_empty(),
        format!("{} symbols configured", config.trading.watchlist.len()),
        ValidationLevel::Critical,
    ));

    result.add_check(check(
        "Buying power",
        config.trading.buying_power > 0.0,
        format!("${:.2} available", config.trading.buying_power),
        ValidationLevel::Critical,
    ));

    result.add_check(check(
        "Lookback window",
        config.scanner.lookback_bars >= 50,
        format!(
            "{} bars (SMA-50 needs at least 50)",
            config.scanner.lookback_bars
        ),
        ValidationLevel::Critical,
    ));

    result.add_check(check(
        "DTE window",
        config.risk.min_dte > 0 && config.risk.min_dte <= config.risk.max_dte,
        format!("[{}, {}] days", config.risk.min_dte, config.risk.max_dte),
        ValidationLevel::Critical,
    ));

    result.add_check(check(
        "Expiry close-out",
        config.monitor.close_dte < config.risk.min_dte,
        format!(
            "close at {} DTE, entries start at {} DTE",
            config.monitor.close_dte, config.risk.min_dte
        ),
        ValidationLevel::Critical,
    ));

    result.add_check(check(
        "Alert thresholds",
        config.alerts.significant_move_pct < config.alerts.profit_target_pct
            && config.alerts.significant_move_pct < config.alerts.stop_loss_pct
            && config.alerts.update_increment_pct > 0.0,
        format!(
            "move {:.0}%, target {:.0}%, stop {:.0}%",
            config.alerts.significant_move_pct * 100.0,
            config.alerts.profit_target_pct * 100.0,
            config.alerts.stop_loss_pct * 100.0
        ),
        ValidationLevel::Critical,
    ));

    result.add_check(check(
        "Monitor cadence",
        config.schedule.monitor_interval_secs <= config.schedule.scan_interval_secs,
        format!(
            "monitor every {}s, scan every {}s",
            config.schedule.monitor_interval_secs, config.schedule.scan_interval_secs
        ),
        ValidationLevel::Warning,
    ));

    result.add_check(check(
        "Position size vs buying power",
        config.risk.max_position_size <= config.trading.buying_power,
        format!(
            "max ${:.0} per position, ${:.0} total",
            config.risk.max_position_size, config.trading.buying_power
        ),
        ValidationLevel::Warning,
    ));

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        let mut config = Config::default();
        config.trading.watchlist = vec!["AAPL".to_string()];
        let result = validate_config(&config);
        assert!(result.passed, "failures: {:?}", result.checks);
    }

    #[test]
    fn empty_watchlist_is_critical() {
        let mut config = Config::default();
        config.trading.watchlist.clear();
        let result = validate_config(&config);
        assert!(!result.passed);
    }

    #[test]
    fn inverted_dte_window_is_critical() {
        let mut config = Config::default();
        config.trading.watchlist = vec!["AAPL".to_string()];
        config.risk.min_dte = 50;
        config.risk.max_dte = 45;
        assert!(!validate_config(&config).passed);
    }

    #[test]
    fn slow_monitor_is_only_a_warning() {
        let mut config = Config::default();
        config.trading.watchlist = vec!["AAPL".to_string()];
        config.schedule.monitor_interval_secs = 600;
        let result = validate_config(&config);
        assert!(result.passed);
        assert_eq!(result.warnings().len(), 1);
    }
}
