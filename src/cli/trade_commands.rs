// Trade command implementations
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use swing_trading_bot::core::{LifecycleOrchestrator, OpportunityScanner};
use swing_trading_bot::db::{Database, TradeLog};
use swing_trading_bot::providers::{
    HeuristicAdvisor, LogNotifier, MarketDataProvider, PaperGateway, SimulatedMarketData,
    SimulatedSentiment,
};
use swing_trading_bot::{validate_config, Config, TradingError, TradingResult};

pub async fn start_trading(
    mut config: Config,
    dry_run: bool,
    hours: Option<f64>,
) -> TradingResult<()> {
    if dry_run {
        config.trading.dry_run = true;
    }
    if config.trading.dry_run {
        info!("🧪 DRY RUN mode (no orders placed)");
    } else {
        info!("🚀 PAPER TRADING");
        warn!("⚠️  Orders will be simulated against live data");
    }

    let validation = validate_config(&config);
    validation.display();
    if !validation.passed {
        error!("❌ Pre-flight validation failed. Cannot proceed.");
        return Err(TradingError::ValidationFailed(
            "Critical validation checks did not pass".to_string(),
        ));
    }

    let db = Database::new(&config.database.path)?;
    db.run_migrations()?;
    let store = Arc::new(TradeLog::new(db.get_connection()));

    let market_data: Arc<dyn MarketDataProvider> =
        Arc::new(SimulatedMarketData::default_walk());
    let gateway = Arc::new(PaperGateway::new(Arc::clone(&market_data)));

    let engine = LifecycleOrchestrator::new(
        config,
        market_data,
        Arc::new(HeuristicAdvisor),
        Arc::new(SimulatedSentiment),
        gateway,
        Arc::new(LogNotifier),
        store,
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    // Ctrl-C or the optional duration flips the shutdown signal.
    tokio::spawn(async move {
        match hours {
            Some(h) => {
                let deadline = tokio::time::sleep(Duration::from_secs_f64(h * 3600.0));
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("🛑 Ctrl-C received"),
                    _ = deadline => info!("⏱  Session duration reached"),
                }
            }
            None => {
                let _ = tokio::signal::ctrl_c().await;
                info!("🛑 Ctrl-C received");
            }
        }
        let _ = shutdown_tx.send(true);
    });

    engine.run(shutdown_rx).await
}

pub async fn scan_once(config: Config, limit: Option<usize>) -> TradingResult<()> {
    let market_data = Arc::new(SimulatedMarketData::default_walk());
    let scanner = OpportunityScanner::new(market_data, config.scanner.clone());

    info!(
        symbols = config.trading.watchlist.len(),
        "🔍 Scanning watchlist"
    );
    let candidates = scanner.scan(&config.trading.watchlist).await;

    if candidates.is_empty() {
        info!("No symbols above the score threshold");
        return Ok(());
    }

    let shown = limit.unwrap_or(candidates.len());
    for (signal, snapshot) in candidates.iter().take(shown) {
        info!(
            "  {} score {:>5.1}  price {:>8.2}  rsi {:>5.1}  vol x{:.2}",
            signal.symbol, signal.score, signal.price, snapshot.rsi_14, snapshot.volume_ratio
        );
    }
    Ok(())
}

pub async fn show_status(config: Config, detailed: bool) -> TradingResult<()> {
    info!("📊 System Status");

    if !std::path::Path::new(&config.database.path).exists() {
        info!("💾 Database: not found at {}", config.database.path);
        info!("💡 Run `swing-bot trade start` to create it");
        return Ok(());
    }
    let db = Database::new(&config.database.path)?;
    db.run_migrations()?;
    let log = TradeLog::new(db.get_connection());

    let today = log.realized_pnl_today()?;
    info!("💰 Realized P/L today: {:+.2}", today);
    info!(
        "🛑 Daily loss limit: {:.2}{}",
        config.risk.max_daily_loss,
        if today < -config.risk.max_daily_loss {
            "  (BREAKER WOULD BE TRIPPED)"
        } else {
            ""
        }
    );

    let trades = log.recent_trades(if detailed { 50 } else { 10 })?;
    info!("📜 Recent trades: {}", trades.len());
    for trade in &trades {
        match trade.realized_pnl {
            Some(pnl) => info!(
                "  {} {} {} closed {:+.2} ({})",
                trade.recorded_at.as_deref().unwrap_or("-"),
                trade.symbol,
                trade.instrument,
                pnl,
                trade.note.as_deref().unwrap_or("-"),
            ),
            None => info!(
                "  {} {} {} opened @ {:.2}",
                trade.recorded_at.as_deref().unwrap_or("-"),
                trade.symbol,
                trade.instrument,
                trade.entry_price,
            ),
        }
        if detailed {
            for alert in log.alerts_for(&trade.position_id)? {
                info!(
                    "      ↳ {} at {:+.1}%",
                    alert.kind,
                    alert.pnl_pct * 100.0
                );
            }
        }
    }
    Ok(())
}
