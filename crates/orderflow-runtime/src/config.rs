//! Runtime configuration from the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ORDERFLOW_AUTH_SECRET` | (required) | HS256 secret for bearer tokens |
//! | `ORDERFLOW_PAYMENT_WINDOW_SECS` | `900` | Payment window TTL |
//! | `ORDERFLOW_RPC_TIMEOUT_MS` | `5000` | Default request-reply deadline |

use anyhow::{bail, Context, Result};
use std::time::Duration;

const AUTH_SECRET_VAR: &str = "ORDERFLOW_AUTH_SECRET";
const PAYMENT_WINDOW_VAR: &str = "ORDERFLOW_PAYMENT_WINDOW_SECS";
const RPC_TIMEOUT_VAR: &str = "ORDERFLOW_RPC_TIMEOUT_MS";

const DEFAULT_PAYMENT_WINDOW_SECS: u64 = 900;
const DEFAULT_RPC_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub auth_secret: String,
    pub payment_window: Duration,
    pub rpc_timeout: Duration,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self> {
        let auth_secret = std::env::var(AUTH_SECRET_VAR)
            .with_context(|| format!("{AUTH_SECRET_VAR} must be set"))?;
        if auth_secret.len() < 16 {
            bail!("{AUTH_SECRET_VAR} must be at least 16 bytes");
        }

        Ok(Self {
            auth_secret,
            payment_window: Duration::from_secs(parse_var(
                PAYMENT_WINDOW_VAR,
                DEFAULT_PAYMENT_WINDOW_SECS,
            )?),
            rpc_timeout: Duration::from_millis(parse_var(RPC_TIMEOUT_VAR, DEFAULT_RPC_TIMEOUT_MS)?),
        })
    }
}

fn parse_var(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{name} must be a positive integer, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
