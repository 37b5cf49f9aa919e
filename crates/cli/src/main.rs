//! `jigsaw` - command-line front end for the Jigsaw session client

mod cli;
mod commands;
mod context;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use jigsaw_infra::{config, init_tracing};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::context::AppContext;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so env-backed arguments see it
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_format);
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!(error = %e, "no .env loaded"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::load_with(cli.config)?;
    let ctx = AppContext::new(config).await?;
    debug!(base_url = %ctx.config.api.base_url, "client ready");

    match cli.command {
        Command::Login { email, password } => commands::login(&ctx, &email, &password).await,
        Command::Signup { username, email, password, confirm_password, account_type } => {
            let form =
                commands::signup_form(username, email, password, confirm_password, account_type);
            commands::signup(&ctx, form).await
        }
        Command::Logout => commands::logout(&ctx).await,
        Command::Whoami => commands::whoami(&ctx),
        Command::Get { path } => commands::get(&ctx, &path).await,
        Command::Watch { poll_ms } => commands::watch(&ctx, Duration::from_millis(poll_ms)).await,
    }
}
