//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jigsaw_domain::AccountType;
use jigsaw_infra::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "jigsaw", version, about = "Jigsaw session client")]
pub struct Cli {
    /// Config file (JSON or TOML); probed in standard locations when omitted
    #[arg(long, global = true, env = "JIGSAW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format (text or json)
    #[arg(long, global = true, env = "JIGSAW_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "JIGSAW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and store the session
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "JIGSAW_PASSWORD", hide_env_values = true)]
        password: String,
        /// Repeat of the password; defaults to `--password`
        #[arg(long)]
        confirm_password: Option<String>,
        /// influencer or brand
        #[arg(long)]
        account_type: AccountType,
    },
    /// End the session locally and on the server
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Authenticated GET, printing the JSON response
    Get {
        /// API path, e.g. /api/campaigns
        path: String,
    },
    /// Print session events (including changes made by other processes)
    /// until interrupted
    Watch {
        /// Session file polling interval in milliseconds
        #[arg(long, default_value_t = 500)]
        poll_ms: u64,
    },
}
