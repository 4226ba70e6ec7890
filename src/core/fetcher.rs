use std::time::Duration;

use tokio::time;

use crate::config::TransportConfig;
use crate::core::error::{Error, Result};

/// One-shot HTTP GET against the nginx status page.
pub struct Fetcher {
    client: reqwest::Client,
    deadline: Duration,
}

impl Fetcher {
    pub fn new(transport: &TransportConfig) -> Result<Fetcher> {
        let client = reqwest::Client::builder()
            .connect_timeout(transport.connect_timeout)
            .tcp_keepalive(transport.tcp_keepalive)
            .pool_idle_timeout(transport.pool_idle_timeout)
            .pool_max_idle_per_host(transport.pool_max_idle_per_host)
            .build()?;
        Ok(Fetcher {
            client,
            deadline: transport.header_deadline(),
        })
    }

    /// Returns the response body. Transport failures, non-2xx statuses and
    /// body read errors all come back as errors, nothing is retried.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", url);
        let response = time::timeout(self.deadline, self.client.get(url).send())
            .await
            .map_err(|_| self.timed_out(url))??
            .error_for_status()?;
        let status = response.status();
        let body = time::timeout(self.deadline, response.text())
            .await
            .map_err(|_| self.timed_out(url))??;
        tracing::debug!("{} answered {} with {} bytes", url, status, body.len());
        Ok(body)
    }

    fn timed_out(&self, url: &str) -> Error {
        Error::Timeout {
            url: url.to_string(),
            elapsed: self.deadline,
        }
    }
}
