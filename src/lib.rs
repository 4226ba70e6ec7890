//! Converts the nginx upstream check module's JSON status page into a
//! Zabbix low-level discovery document, one entry per upstream server.

pub mod config;
pub mod core;

use crate::config::Config;
use crate::core::{transform, Fetcher, Result};

/// Fetches the configured status page and returns the discovery JSON.
pub async fn run(config: &Config) -> Result<String> {
    let fetcher = Fetcher::new(&config.transport)?;
    let body = fetcher.fetch(&config.nginx_status_url).await?;
    transform(&body)
}
