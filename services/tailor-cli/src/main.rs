//! Tailor shop API client
//!
//! Issues one authenticated call against the tailor shop API:
//! 1. Loads config (TOML file + API_BASE_URL overlay)
//! 2. Opens the file-backed session store
//! 3. Sends the request through the gateway, refreshing the session on 401
//! 4. Prints the parsed body to stdout

mod args;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tailor_auth::{FileStore, TokenPair, credentials};
use tailor_gateway::{Body, Gateway, Hooks, LogNavigator, RequestOptions};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Args, Command};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr so stdout carries only the response body
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse(std::env::args().skip(1))?;

    let config_path = Config::resolve_path(args.config.as_deref());
    debug!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let store = FileStore::load(config.storage.path.clone())
        .await
        .with_context(|| {
            format!(
                "failed to open session store {}",
                config.storage.path.display()
            )
        })?;

    match args.command {
        Command::Login {
            access,
            refresh,
            user,
        } => {
            let pair = TokenPair {
                access_token: access,
                refresh_token: refresh,
            };
            credentials::save_pair(&store, &pair).await?;
            if let Some(user) = user {
                credentials::save_user(&store, &user).await?;
            }
            info!(path = %store.path().display(), "session stored");
            Ok(())
        }
        Command::Request {
            method,
            endpoint,
            data,
        } => {
            info!(
                base_url = config.gateway.base_url().unwrap_or("<unset>"),
                "configuration loaded"
            );
            let gateway = Gateway::new(
                &config.gateway,
                reqwest::Client::new(),
                Arc::new(store),
                Arc::new(LogNavigator),
            )?;

            let mut options = RequestOptions::new()
                .method(method)
                .hooks(Hooks::new().on_error(|message| warn!(error = message, "request failed")));
            if let Some(data) = data {
                options = options.json(data);
            }

            let body = gateway.request(&endpoint, options).await?;
            print_body(&body)
        }
    }
}

fn print_body(body: &Body) -> Result<()> {
    match body {
        Body::Json(value) => println!("{}", serde_json::to_string_pretty(value)?),
        Body::Text(text) => println!("{text}"),
    }
    Ok(())
}
