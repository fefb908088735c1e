// src/site_parser/fetcher.rs
use crate::config::ParserConfig;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Status codes worth retrying with backoff; everything else is final.
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// HTTP fetcher shared by one parser instance. Stateless apart from the
/// connection pool inside the reqwest client.
pub struct Fetcher {
    client: Client,
    user_agents: Vec<String>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    pub fn new(config: &ParserConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            user_agents: config.user_agents.clone(),
            max_retries: config.max_retries.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Fetch with the default timeout pair.
    ///
    /// With `ignore_errors` the response is handed back whatever its status
    /// (callers check for 200 themselves) and transport failures simply yield
    /// `None`. Without it, a non-2xx or failed request is logged and yields
    /// `None` as well.
    pub async fn fetch(&self, url: &str, ignore_errors: bool) -> Option<Response> {
        self.fetch_with_timeout(url, ignore_errors, None).await
    }

    pub async fn fetch_with_timeout(
        &self,
        url: &str,
        ignore_errors: bool,
        read_timeout: Option<Duration>,
    ) -> Option<Response> {
        let mut backoff = self.retry_backoff;

        for attempt in 1..=self.max_retries {
            let mut request = self
                .client
                .get(url)
                .header(USER_AGENT, self.pick_user_agent());
            if let Some(timeout) = read_timeout {
                request = request.timeout(timeout);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if RETRY_STATUSES.contains(&status.as_u16()) && attempt < self.max_retries {
                        debug!(
                            "got {} from {}, retrying (attempt {}/{})",
                            status, url, attempt, self.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }

                    if !status.is_success() && !ignore_errors {
                        warn!("request to {} failed with status {}", url, status);
                        return None;
                    }

                    return Some(response);
                }
                Err(e) => {
                    let transient = e.is_connect() || e.is_timeout();
                    if transient && attempt < self.max_retries {
                        debug!(
                            "request to {} failed ({}), retrying (attempt {}/{})",
                            url, e, attempt, self.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                        continue;
                    }
                    if !ignore_errors {
                        warn!("request to {} failed: {}", url, e);
                    }
                    return None;
                }
            }
        }

        None
    }

    fn pick_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return "contact-scout/0.1";
        }
        &self.user_agents[fastrand::usize(..self.user_agents.len())]
    }
}
