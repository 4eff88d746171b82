// Swing Trading Bot - unified CLI
// Single entry point for scanning, trading, and status operations

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use swing_trading_bot::{Config, ConfigError};

// Load command modules from cli directory
#[path = "../cli/trade_commands.rs"]
mod trade_commands;

#[derive(Parser)]
#[command(name = "swing-bot")]
#[command(version = "0.1.0")]
#[command(about = "Automated swing trading engine", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and workspace
    Init,

    /// Score the watchlist once and print candidates
    Scan {
        /// Show at most this many candidates
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Run the trading engine
    #[command(subcommand)]
    Trade(TradeCommands),

    /// Show trade history and daily P/L
    Status {
        /// Include per-trade alert history
        #[arg(short, long)]
        detailed: bool,
    },

    /// Inspect or edit risk limits
    #[command(subcommand)]
    Limits(LimitsCommands),
}

#[derive(Subcommand)]
enum TradeCommands {
    /// Start the scan and monitor loops
    Start {
        /// Dry run mode (no orders placed)
        #[arg(short, long)]
        dry_run: bool,

        /// Session duration in hours (runs until Ctrl-C if omitted)
        #[arg(long)]
        hours: Option<f64>,
    },
}

#[derive(Subcommand)]
enum LimitsCommands {
    /// Print the configured risk limits
    Show,

    /// Update limits in the configuration file
    Set {
        #[arg(long)]
        max_positions: Option<usize>,

        #[arg(long)]
        max_daily_loss: Option<f64>,

        #[arg(long)]
        max_position_size: Option<f64>,

        #[arg(long)]
        max_option_premium: Option<f64>,

        #[arg(long)]
        max_contracts: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging first (before config load so we can see config errors)
    let log_level = if cli.verbose { "debug" } else { "info" };
    std::env::set_var("RUST_LOG", log_level);
    tracing_subscriber::fmt::init();

    info!("📈 Swing Trading Bot v0.1.0");
    info!("📁 Config: {}", cli.config);

    match cli.command {
        // Init doesn't require config (it creates it)
        Commands::Init => init_workspace(&cli.config)?,

        Commands::Scan { limit } => {
            let config = load_config_or_exit(&cli.config);
            trade_commands::scan_once(config, limit).await?;
        }

        Commands::Trade(TradeCommands::Start { dry_run, hours }) => {
            let config = load_config_or_exit(&cli.config);
            trade_commands::start_trading(config, dry_run, hours).await?;
        }

        Commands::Status { detailed } => {
            let config = load_config_or_exit(&cli.config);
            trade_commands::show_status(config, detailed).await?;
        }

        Commands::Limits(cmd) => {
            let config = load_config_or_exit(&cli.config);
            handle_limits_command(cmd, config, &cli.config)?;
        }
    }

    Ok(())
}

/// Load config or exit with a helpful error message
fn load_config_or_exit(path: &str) -> Config {
    match Config::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration Error");
            error!("{}", e);

            if matches!(e, ConfigError::FileNotFound(_)) {
                error!("");
                error!("💡 Quick fix:");
                error!("   1. Run: swing-bot init");
                error!("   2. Edit config.toml (watchlist, buying power)");
                error!("   3. Try again");
            }

            std::process::exit(1);
        }
    }
}

fn init_workspace(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    use std::fs;

    info!("🔧 Initializing workspace...");

    fs::create_dir_all("data")?;
    fs::create_dir_all("logs")?;

    if !std::path::Path::new(config_path).exists() {
        let default_config = include_str!("../../config.toml.example");
        fs::write(config_path, default_config)?;
        info!("📝 Created {}", config_path);
    } else {
        warn!("⚠️  {} already exists, skipping", config_path);
    }

    info!("✅ Workspace initialized");
    info!("💡 Next steps:");
    info!("   1. Edit config.toml with your watchlist");
    info!("   2. Run: swing-bot scan");
    info!("   3. Run: swing-bot trade start --dry-run");

    Ok(())
}

fn handle_limits_command(
    cmd: LimitsCommands,
    mut config: Config,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        LimitsCommands::Show => {
            info!("⚙️  Risk limits");
            info!("   Max open positions:  {}", config.risk.max_position_count);
            info!("   Max daily loss:      ${:.2}", config.risk.max_daily_loss);
            info!("   Max position size:   ${:.2}", config.risk.max_position_size);
            info!("   Max option premium:  ${:.2}", config.risk.max_option_premium);
            info!("   Max contracts:       {}", config.risk.max_contracts);
            info!("   DTE window:          [{}, {}]", config.risk.min_dte, config.risk.max_dte);
        }
        LimitsCommands::Set {
            max_positions,
            max_daily_loss,
            max_position_size,
            max_option_premium,
            max_contracts,
        } => {
            if let Some(v) = max_positions {
                config.risk.max_position_count = v;
            }
            if let Some(v) = max_daily_loss {
                config.risk.max_daily_loss = v;
            }
            if let Some(v) = max_position_size {
                config.risk.max_position_size = v;
            }
            if let Some(v) = max_option_premium {
                config.risk.max_option_premium = v;
            }
            if let Some(v) = max_contracts {
                config.risk.max_contracts = v;
            }
            config.validate()?;
            config.to_file(path)?;
            info!("✅ Limits updated in {}", path);
            info!("💡 A running engine picks these up on restart");
        }
    }
    Ok(())
}
