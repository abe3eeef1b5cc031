use std::env::var;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use url::Url;

use crate::brevo::DEFAULT_URL;

#[derive(Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub request_limit: usize,
    /// Missing keys only disable contact submission, not the whole server.
    pub brevo_api_key: Option<String>,
    pub brevo_url: Url,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| var(name).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .context("Environment variable BIND_ADDR not set")?
            .parse::<SocketAddr>()
            .context("Environment variable BIND_ADDR invalid")?;

        let request_limit = lookup("REQUEST_LIMIT")
            .context("Environment variable REQUEST_LIMIT not set")?
            .parse::<usize>()
            .context("Environment variable REQUEST_LIMIT invalid")?;

        let brevo_api_key = lookup("BREVO_API_KEY").filter(|key| !key.trim().is_empty());

        let brevo_url = lookup("BREVO_API_URL")
            .as_deref()
            .unwrap_or(DEFAULT_URL)
            .parse::<Url>()
            .context("Environment variable BREVO_API_URL invalid")?;

        Ok(Self {
            bind_addr,
            request_limit,
            brevo_api_key,
            brevo_url,
        })
    }
}
