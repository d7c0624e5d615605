//! Command-line parsing
//!
//! ```text
//! tailor-api [--config PATH] <METHOD> <ENDPOINT> [--data JSON]
//! tailor-api [--config PATH] login --access TOKEN --refresh TOKEN [--user JSON]
//! ```

use anyhow::{Context, Result, bail};
use reqwest::Method;

pub const USAGE: &str = "usage:
  tailor-api [--config PATH] <METHOD> <ENDPOINT> [--data JSON]
  tailor-api [--config PATH] login --access TOKEN --refresh TOKEN [--user JSON]";

#[derive(Debug, PartialEq)]
pub enum Command {
    /// Issue one request through the gateway.
    Request {
        method: Method,
        endpoint: String,
        data: Option<serde_json::Value>,
    },
    /// Seed the session store with a token pair.
    Login {
        access: String,
        refresh: String,
        user: Option<serde_json::Value>,
    },
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub config: Option<String>,
    pub command: Command,
}

impl Args {
    /// Parse arguments (without the program name).
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = None;
        let mut flags: Vec<(String, String)> = Vec::new();
        let mut positional = Vec::new();

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            if let Some(flag) = arg.strip_prefix("--") {
                let value = iter
                    .next()
                    .with_context(|| format!("--{flag} requires a value"))?;
                if flag == "config" {
                    config = Some(value);
                } else {
                    flags.push((flag.to_string(), value));
                }
            } else {
                positional.push(arg);
            }
        }

        let take = |name: &str| -> Option<String> {
            flags
                .iter()
                .find(|(flag, _)| flag == name)
                .map(|(_, value)| value.clone())
        };
        let parse_json = |name: &str| -> Result<Option<serde_json::Value>> {
            take(name)
                .map(|raw| {
                    serde_json::from_str(&raw).with_context(|| format!("--{name} is not valid JSON"))
                })
                .transpose()
        };

        let known: &[&str] = match positional.first().map(String::as_str) {
            Some("login") => &["access", "refresh", "user"],
            _ => &["data"],
        };
        if let Some((flag, _)) = flags.iter().find(|(f, _)| !known.contains(&f.as_str())) {
            bail!("unknown option --{flag}\n{USAGE}");
        }

        let command = match positional.as_slice() {
            [login] if login == "login" => Command::Login {
                access: take("access").context("login requires --access")?,
                refresh: take("refresh").context("login requires --refresh")?,
                user: parse_json("user")?,
            },
            [method, endpoint] => Command::Request {
                method: Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .with_context(|| format!("invalid HTTP method: {method}"))?,
                endpoint: endpoint.clone(),
                data: parse_json("data")?,
            },
            _ => bail!("{USAGE}"),
        };

        Ok(Self { config, command })
    }
}
