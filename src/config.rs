//! Desk configuration
//!
//! Loaded from the environment (after `.env`, if present):
//!
//! | Variable                 | Default | Meaning                              |
//! |--------------------------|---------|--------------------------------------|
//! | `OPS_DESK_API_URL`       | required | Base URL of the interpretation API   |
//! | `OPS_DESK_TIMEOUT_SECS`  | 30      | Per-request timeout                  |
//! | `OPS_DESK_HISTORY_LIMIT` | 20      | History page size                    |
//! | `OPS_DESK_TOKEN`         | none    | Bearer token for the session         |
//! | `OPS_DESK_STAFF_ID`      | none    | Staff identifier sent with requests  |

use anyhow::{anyhow, Context, Result};
use ops_desk_types::DEFAULT_HISTORY_LIMIT;
use std::time::Duration;
use url::Url;

use crate::session::SessionContext;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct DeskConfig {
    /// Always ends with `/` so endpoint paths join beneath it
    pub api_base_url: Url,
    pub request_timeout: Duration,
    pub history_limit: usize,
    pub session: SessionContext,
}

impl DeskConfig {
    pub fn new(api_base_url: &str) -> Result<Self> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            history_limit: DEFAULT_HISTORY_LIMIT,
            session: SessionContext::anonymous(),
        })
    }

    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = lookup("OPS_DESK_API_URL")
            .context("OPS_DESK_API_URL environment variable not set")?;
        let mut config = Self::new(&base)?;

        if let Some(raw) = lookup("OPS_DESK_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("OPS_DESK_TIMEOUT_SECS is not a number: {}", raw))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        if let Some(raw) = lookup("OPS_DESK_HISTORY_LIMIT") {
            let limit: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("OPS_DESK_HISTORY_LIMIT is not a number: {}", raw))?;
            config = config.with_history_limit(limit)?;
        }

        let mut session = SessionContext::anonymous();
        if let Some(token) = lookup("OPS_DESK_TOKEN").filter(|t| !t.trim().is_empty()) {
            session = session.with_token(token.trim());
        }
        if let Some(staff_id) = lookup("OPS_DESK_STAFF_ID").filter(|s| !s.trim().is_empty()) {
            session = session.with_staff_id(staff_id.trim());
        }

        Ok(config.with_session(session))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(anyhow!("history limit must be greater than zero"));
        }
        self.history_limit = limit;
        Ok(self)
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&normalized).with_context(|| format!("invalid API base URL: {}", raw))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("API base URL cannot be used as a base: {}", raw));
    }
    Ok(url)
}
