//! sessionkit - command-line client for a token-authenticated account API.
//!
//! Registers and signs in users, keeps the issued tokens in local storage,
//! and reads or updates the signed-in user's profile.

mod commands;
mod navigator;

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sessionkit_core::Config;

/// Log file name in the cache directory
const LOG_FILE: &str = "sessionkit.log";

#[derive(Parser, Debug)]
#[command(name = "sessionkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new account
    Register {
        email: String,
        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in and store the issued tokens
    Login {
        /// Email (defaults to the last one used)
        email: Option<String>,
        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the signed-in user's profile
    Profile,

    /// Change the signed-in user's email
    UpdateProfile { email: String },

    /// Search users by email
    Search { query: String },

    /// Forget the stored tokens
    Logout,

    /// Show session state
    Status,
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and, when a cache directory exists, to a log file.
/// `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8, config: &Config) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sessionkit_core={level},sessionkit={level}")));

    let (file_layer, guard) = match config.cache_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;
    let _log_guard = init_tracing(cli.verbose, &config);
    info!(base_url = %config.base_url(), "sessionkit starting");

    let app = commands::App::new(config)?;

    match cli.command {
        Commands::Register { email, password } => app.register(&email, password).await,
        Commands::Login { email, password } => app.login(email, password).await,
        Commands::Profile => app.profile().await,
        Commands::UpdateProfile { email } => app.update_profile(&email).await,
        Commands::Search { query } => app.search(&query).await,
        Commands::Logout => {
            app.logout();
            Ok(())
        }
        Commands::Status => app.status(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_with_default_email() {
        let cli = Cli::try_parse_from(["sessionkit", "login"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login {
                email: None,
                password: None
            }
        ));
    }

    #[test]
    fn test_parse_update_profile() {
        let cli = Cli::try_parse_from(["sessionkit", "-vv", "update-profile", "new@b.com"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::UpdateProfile { email } => assert_eq!(email, "new@b.com"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_register_requires_email() {
        assert!(Cli::try_parse_from(["sessionkit", "register"]).is_err());
    }
}
