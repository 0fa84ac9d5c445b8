//! Campus Transport - CLI Server
//!
//! Headless REST backend suitable for a systemd service, a container or a
//! standalone process. Also runs one-off backups for cron.
//!
//! ```sh
//! # Run with default config (~/.config/campus-transport/config.toml)
//! campus-transport-cli
//!
//! # Custom config path and port
//! campus-transport-cli --config /etc/campus-transport/config.toml --port 9090
//!
//! # Validate config without starting
//! campus-transport-cli --check
//!
//! # Write a backup now, or only when the stored schedule says one is due
//! campus-transport-cli --backup
//! campus-transport-cli --backup --scheduled
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use campus_transport::application::data_management::{human_size, ScheduleOutcome};
use campus_transport::config::{default_config_path, AppConfig};
use campus_transport::server::{init_tracing, run_backup, ServerHandle, ServerOptions};

/// Campus Transport - users, drivers, ride billing and backups over REST.
#[derive(Parser, Debug)]
#[command(
    name = "campus-transport-cli",
    version,
    about = "REST backend for campus transport management",
    long_about = "Campus Transport - REST API server for user administration, driver \
                  verification, ride routes, ride bills and data backups.\n\n\
                  Default config: ~/.config/campus-transport/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "CAMPUS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Write one backup and exit.
    #[arg(long)]
    backup: bool,

    /// With --backup: only back up when the stored schedule says one is due.
    #[arg(long, requires = "backup")]
    scheduled: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Skip creating the default admin user.
    #[arg(long)]
    no_admin: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            if cli.check {
                eprintln!("Configuration is invalid: {e}");
                std::process::exit(1);
            }
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            eprintln!("Using default configuration.");
            AppConfig::default()
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Database    : {}", config.database.connection_url());
        println!("   Backups     : {}", config.data_management.backup_dir.display());
        println!(
            "   SMTP        : {}",
            config.smtp.as_ref().map(|s| s.host.as_str()).unwrap_or("not configured")
        );
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    init_tracing(&config);
    info!("Configuration: {}", config_path.display());

    // ── One-off backup ─────────────────────────────────────────
    if cli.backup {
        match run_backup(&config, cli.scheduled).await {
            Ok(ScheduleOutcome::Created(backup)) => {
                println!(
                    "Backup written: {} ({})",
                    backup.filename,
                    human_size(backup.size_bytes)
                );
            }
            Ok(ScheduleOutcome::NotDue { next_backup }) => {
                let next = next_backup
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("No backup due. Next backup: {next}");
            }
            Ok(ScheduleOutcome::Disabled) => println!("Scheduled backups are disabled"),
            Err(e) => {
                error!(error = %e, "Backup failed");
                return Err(e);
            }
        }
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        create_default_admin: !cli.no_admin,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
