// src/batch.rs
use crate::config::Config;
use crate::models::{ParseOutcome, ParseResult, Result};
use crate::scorer::FormScorer;
use crate::search::{SearchHit, SearchProvider};
use crate::sink::ResultSink;
use crate::site_parser::SiteParser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Drives one site parse per unique domain coming out of a search query,
/// with politeness delays between domains.
pub struct BatchParser {
    config: Config,
    provider: Arc<dyn SearchProvider>,
    sink: Arc<dyn ResultSink>,
    scorer: Option<Arc<dyn FormScorer>>,
    skip_sitemap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainOutcome {
    pub domain: String,
    pub title: String,
    pub snippet: String,
    pub original_url: String,
    pub status: DomainStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ParseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub generated_at: String,
    pub query: String,
    pub total_domains: usize,
    pub successful_domains: usize,
    pub total_emails: usize,
    pub total_forms: usize,
    pub sites: Vec<DomainOutcome>,
}

impl BatchParser {
    pub fn new(
        config: Config,
        provider: Arc<dyn SearchProvider>,
        sink: Arc<dyn ResultSink>,
        scorer: Option<Arc<dyn FormScorer>>,
        skip_sitemap: bool,
    ) -> Self {
        Self {
            config,
            provider,
            sink,
            scorer,
            skip_sitemap,
        }
    }

    pub async fn parse_from_search(&self, query: &str, num_results: usize) -> Result<BatchReport> {
        info!("batch parsing for query: '{}'", query);

        let hits = self.provider.search(query, num_results).await?;
        if hits.is_empty() {
            warn!("no search results");
            return Ok(build_report(query, Vec::new()));
        }

        let domains = unique_domains(&hits);
        info!("found {} unique domains", domains.len());

        let total = domains.len();
        let mut sites = Vec::with_capacity(total);

        for (index, hit) in domains.into_iter().enumerate() {
            info!("[{}/{}] parsing: {}", index + 1, total, hit.domain);

            let fast_mode = self.skip_sitemap || self.is_large_site(&hit.domain);
            if fast_mode {
                let reason = if self.skip_sitemap {
                    "enabled by user"
                } else {
                    "large site detected"
                };
                info!("🚀 using fast mode for {} ({})", hit.domain, reason);
            }

            self.sink.begin(&hit.domain).await;
            sites.push(self.parse_domain(&hit, fast_mode).await);

            if index + 1 < total {
                info!("pause between domains...");
                self.domain_delay().await;
            }
        }

        Ok(build_report(query, sites))
    }

    async fn parse_domain(&self, hit: &SearchHit, fast_mode: bool) -> DomainOutcome {
        let outcome = match SiteParser::new(
            &hit.domain,
            self.config.clone(),
            self.scorer.clone(),
            fast_mode,
        ) {
            Ok(parser) => parser.parse().await,
            Err(e) => ParseOutcome::Failed {
                reason: e.to_string(),
            },
        };

        match outcome {
            ParseOutcome::Completed(result) => {
                info!(
                    "✅ {}: {} email(s), {} form page(s)",
                    hit.domain,
                    result.emails.len(),
                    result.contact_form_pages.len()
                );
                self.sink.emails(&hit.domain, &result.emails).await;
                self.sink
                    .form_pages(&hit.domain, &result.contact_form_pages)
                    .await;
                self.sink.completed(&hit.domain).await;

                DomainOutcome {
                    domain: hit.domain.clone(),
                    title: hit.title.clone(),
                    snippet: hit.snippet.clone(),
                    original_url: hit.link.clone(),
                    status: DomainStatus::Success,
                    result: Some(result),
                    error: None,
                }
            }
            ParseOutcome::Failed { reason } => {
                error!("❌ parsing {} failed: {}", hit.domain, reason);
                self.sink.failed(&hit.domain, &reason).await;

                DomainOutcome {
                    domain: hit.domain.clone(),
                    title: hit.title.clone(),
                    snippet: hit.snippet.clone(),
                    original_url: hit.link.clone(),
                    status: DomainStatus::Failed,
                    result: None,
                    error: Some(reason),
                }
            }
        }
    }

    fn is_large_site(&self, domain: &str) -> bool {
        let lower = domain.to_lowercase();
        self.config
            .batch
            .large_sites
            .iter()
            .any(|site| lower.contains(site))
    }

    async fn domain_delay(&self) {
        let min = self.config.batch.min_domain_delay_ms;
        let max = self.config.batch.max_domain_delay_ms;
        if max == 0 {
            return;
        }
        let millis = if max > min { fastrand::u64(min..=max) } else { max };
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// First hit per domain wins; later hits for the same domain are dropped.
fn unique_domains(hits: &[SearchHit]) -> Vec<SearchHit> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter(|hit| seen.insert(hit.domain.clone()))
        .cloned()
        .collect()
}

fn build_report(query: &str, sites: Vec<DomainOutcome>) -> BatchReport {
    let successful_domains = sites
        .iter()
        .filter(|s| s.status == DomainStatus::Success)
        .count();
    let total_emails = sites
        .iter()
        .filter_map(|s| s.result.as_ref())
        .map(|r| r.emails.len())
        .sum();
    let total_forms = sites
        .iter()
        .filter_map(|s| s.result.as_ref())
        .map(|r| r.contact_form_pages.len())
        .sum();

    BatchReport {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        query: query.to_string(),
        total_domains: sites.len(),
        successful_domains,
        total_emails,
        total_forms,
        sites,
    }
}

impl BatchReport {
    pub fn print_summary(&self) {
        if self.sites.is_empty() {
            println!("No results");
            return;
        }

        println!("\n{}", "=".repeat(60));
        println!("FINAL REPORT");
        println!("{}", "=".repeat(60));
        println!("Total domains: {}", self.total_domains);
        println!("Successful: {}", self.successful_domains);
        println!("Total emails: {}", self.total_emails);
        println!("Total forms: {}", self.total_forms);

        for site in &self.sites {
            println!("\n🌐 {}", site.domain);
            match (&site.status, &site.result) {
                (DomainStatus::Success, Some(result)) => {
                    println!("   📧 Emails: {}", result.emails.len());
                    for email in &result.emails {
                        println!("      - {}", email);
                    }
                    println!("   📝 Form pages: {}", result.contact_form_pages.len());
                    for page in &result.contact_form_pages {
                        println!("      - {}", page);
                    }
                }
                _ => {
                    println!(
                        "   ❌ Failed: {}",
                        site.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(domain: &str) -> SearchHit {
        SearchHit {
            title: format!("{domain} title"),
            link: format!("{domain}/page"),
            snippet: "snippet".to_string(),
            domain: domain.to_string(),
        }
    }

    #[test]
    fn duplicate_domains_collapse_in_order() {
        let hits = vec![
            hit("https://a.org"),
            hit("https://b.org"),
            hit("https://a.org"),
        ];
        let unique = unique_domains(&hits);
        let domains: Vec<&str> = unique.iter().map(|h| h.domain.as_str()).collect();
        assert_eq!(domains, vec!["https://a.org", "https://b.org"]);
    }

    #[test]
    fn report_totals_only_count_successes() {
        let sites = vec![
            DomainOutcome {
                domain: "https://a.org".to_string(),
                title: String::new(),
                snippet: String::new(),
                original_url: String::new(),
                status: DomainStatus::Success,
                result: Some(ParseResult {
                    emails: vec!["x@a.org".to_string(), "y@a.org".to_string()],
                    contact_form_pages: vec!["https://a.org/contact".to_string()],
                }),
                error: None,
            },
            DomainOutcome {
                domain: "https://b.org".to_string(),
                title: String::new(),
                snippet: String::new(),
                original_url: String::new(),
                status: DomainStatus::Failed,
                result: None,
                error: Some("cannot load main page".to_string()),
            },
        ];

        let report = build_report("agency berlin", sites);
        assert_eq!(report.total_domains, 2);
        assert_eq!(report.successful_domains, 1);
        assert_eq!(report.total_emails, 2);
        assert_eq!(report.total_forms, 1);
    }
}
