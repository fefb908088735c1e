// src/search.rs
use crate::models::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};
use url::Url;

const GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
/// The API serves at most this many results per request.
const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
    /// Scheme + host of the link, e.g. "https://example.org".
    pub domain: String,
}

/// Seeds batch mode with domains to parse. Only the batch driver knows about
/// this; the extraction core never does.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, total_results: usize) -> Result<Vec<SearchHit>>;
}

pub struct GoogleSearch {
    client: reqwest::Client,
    api_key: String,
    cx: String,
    endpoint: String,
    min_page_delay_ms: u64,
    max_page_delay_ms: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchItem {
    title: String,
    link: String,
    snippet: String,
}

impl GoogleSearch {
    pub fn new(
        api_key: String,
        cx: String,
        min_page_delay_ms: u64,
        max_page_delay_ms: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key,
            cx,
            endpoint: GOOGLE_SEARCH_URL.to_string(),
            min_page_delay_ms,
            max_page_delay_ms,
        })
    }

    /// Point the client at a different endpoint; used by tests.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn search_page(&self, query: &str, num: usize, start: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query),
                ("num", &num.min(PAGE_SIZE).to_string()),
                ("start", &start.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let page: SearchResponse = response.json().await?;
        Ok(page
            .items
            .into_iter()
            .map(|item| {
                let domain = extract_domain(&item.link);
                SearchHit {
                    title: item.title,
                    link: item.link,
                    snippet: item.snippet,
                    domain,
                }
            })
            .collect())
    }

    async fn page_delay(&self) {
        if self.max_page_delay_ms == 0 {
            return;
        }
        let millis = if self.max_page_delay_ms > self.min_page_delay_ms {
            fastrand::u64(self.min_page_delay_ms..=self.max_page_delay_ms)
        } else {
            self.max_page_delay_ms
        };
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str, total_results: usize) -> Result<Vec<SearchHit>> {
        info!("searching: '{}' ({} results)", query, total_results);

        let mut all_hits: Vec<SearchHit> = Vec::new();
        let mut start = 1;

        while all_hits.len() < total_results {
            let remaining = total_results - all_hits.len();
            let hits = match self.search_page(query, remaining, start).await {
                Ok(hits) => hits,
                Err(e) => {
                    error!("search request failed: {}", e);
                    break;
                }
            };
            if hits.is_empty() {
                break;
            }

            start += hits.len();
            all_hits.extend(hits);

            if all_hits.len() < total_results {
                self.page_delay().await;
            }
        }

        all_hits.truncate(total_results);
        info!("found {} search results", all_hits.len());
        Ok(all_hits)
    }
}

/// Reduce a result link to scheme + host; falls back to the raw link when it
/// does not parse.
fn extract_domain(link: &str) -> String {
    match Url::parse(link) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}://{}", url.scheme(), host),
            None => link.to_string(),
        },
        Err(_) => link.to_string(),
    }
}
