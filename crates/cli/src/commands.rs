//! Subcommand handlers

use std::time::Duration;

use anyhow::bail;
use jigsaw_domain::{AccountType, SignupRequest, User};
use jigsaw_infra::ApiError;
use serde_json::Value;
use tracing::{debug, info};

use crate::context::AppContext;

pub async fn login(ctx: &AppContext, email: &str, password: &str) -> anyhow::Result<()> {
    let session = ctx.client.login(email, password).await.map_err(describe)?;
    ctx.save_cookies().await?;
    println!("Signed in as {}", display_name(&session.user));
    Ok(())
}

pub async fn signup(ctx: &AppContext, form: SignupRequest) -> anyhow::Result<()> {
    let session = ctx.client.signup(&form).await.map_err(describe)?;
    ctx.save_cookies().await?;
    println!("Welcome, {}", display_name(&session.user));
    Ok(())
}

pub fn signup_form(
    username: String,
    email: String,
    password: String,
    confirm_password: Option<String>,
    account_type: AccountType,
) -> SignupRequest {
    SignupRequest {
        username,
        email,
        confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
        password,
        account_type: Some(account_type),
    }
}

pub async fn logout(ctx: &AppContext) -> anyhow::Result<()> {
    ctx.client.logout().await;
    ctx.save_cookies().await?;
    println!("Signed out");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> anyhow::Result<()> {
    let Some(user) = ctx.session.user() else {
        if ctx.session.is_authenticated() {
            println!("Signed in (identity unknown)");
            return Ok(());
        }
        bail!("not signed in");
    };

    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

pub async fn get(ctx: &AppContext, path: &str) -> anyhow::Result<()> {
    let result = ctx.client.get::<Value>(path).await;
    // A renewal may have rotated the refresh cookie, or ended the session
    ctx.save_cookies().await?;

    let body = result.map_err(describe)?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub async fn watch(ctx: &AppContext, poll_interval: Duration) -> anyhow::Result<()> {
    let mut events = ctx.session.events().subscribe();
    let _watch = ctx.storage.watch(poll_interval);
    let sync = ctx.session.spawn_sync();
    info!(path = %ctx.storage.path().display(), "watching session");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    info!(skipped, "missed session events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    sync.abort();
    Ok(())
}

fn display_name(user: &User) -> &str {
    user.display_name().unwrap_or("unknown user")
}

/// Human-readable form of an API failure, with field messages
fn describe(err: ApiError) -> anyhow::Error {
    let mut message = err.user_message();
    if let Some(fields) = err.field_errors() {
        for (field, detail) in fields {
            message.push_str(&format!("\n  {field}: {detail}"));
        }
    }
    debug!(error = %err, "request failed");
    anyhow::anyhow!(message)
}
