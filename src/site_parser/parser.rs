// src/site_parser/parser.rs
use crate::config::Config;
use crate::models::{ParseOutcome, ParseResult, Result};
use crate::scorer::FormScorer;
use crate::site_parser::email_extractor::EmailExtractor;
use crate::site_parser::fetcher::Fetcher;
use crate::site_parser::form_classifier::{collect_form_signals, FormClassifier, FormSignals};
use crate::site_parser::sitemap::SitemapResolver;
use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

/// File extensions that never contain contact information worth fetching.
const EXCLUDED_EXTENSIONS: [&str; 8] = [
    ".png", ".jpg", ".jpeg", ".gif", ".pdf", ".zip", ".doc", ".docx",
];

/// One bounded contact-extraction run against a single site.
///
/// Each instance owns its fetcher, result sets and group-tracking state, so
/// independent parses can run concurrently without any shared state. An
/// instance is consumed by [`SiteParser::parse`]; one run per instance.
pub struct SiteParser {
    base_url: Url,
    domain: String,
    config: Config,
    skip_sitemap: bool,
    scorer: Option<Arc<dyn FormScorer>>,
    fetcher: Fetcher,
    classifier: FormClassifier,
    email_extractor: EmailExtractor,
    emails: BTreeSet<String>,
    contact_form_pages: BTreeSet<String>,
    successful_groups: HashSet<String>,
}

impl SiteParser {
    pub fn new(
        url: &str,
        config: Config,
        scorer: Option<Arc<dyn FormScorer>>,
        skip_sitemap: bool,
    ) -> Result<Self> {
        let base_url = normalize_url(Url::parse(url)?);
        let domain = base_url
            .host_str()
            .ok_or_else(|| format!("URL has no host: {url}"))?
            .to_string();
        let fetcher = Fetcher::new(&config.parser)?;
        let classifier =
            FormClassifier::new(config.forms.clone(), config.parser.form_score_threshold);

        Ok(Self {
            base_url,
            domain,
            skip_sitemap,
            scorer,
            fetcher,
            classifier,
            email_extractor: EmailExtractor::new(),
            config,
            emails: BTreeSet::new(),
            contact_form_pages: BTreeSet::new(),
            successful_groups: HashSet::new(),
        })
    }

    /// Run the full parse: seed candidates, visit them in sorted order,
    /// return the accumulated findings. An unreachable main page is the only
    /// fatal condition; every per-URL problem just means no contribution.
    pub async fn parse(mut self) -> ParseOutcome {
        let candidates = match self.collect_priority_urls().await {
            Ok(candidates) => candidates,
            Err(reason) => {
                error!("parse of {} failed: {}", self.base_url, reason);
                return ParseOutcome::Failed { reason };
            }
        };

        info!(
            "found {} URLs to check for contact information",
            candidates.len()
        );

        let total = candidates.len();
        for (index, url) in candidates.iter().enumerate() {
            self.process_url(url, index + 1, total).await;
        }

        ParseOutcome::Completed(ParseResult {
            emails: self.emails.into_iter().collect(),
            contact_form_pages: self.contact_form_pages.into_iter().collect(),
        })
    }

    /// Candidate set: the base URL, keyword-matching homepage links, sitemap
    /// links (unless skipped) and the fixed common paths.
    async fn collect_priority_urls(
        &self,
    ) -> std::result::Result<BTreeSet<String>, String> {
        info!("parsing: {}", self.base_url);

        let mut candidates = BTreeSet::new();
        candidates.insert(self.base_url.to_string());

        let Some(response) = self.fetcher.fetch(self.base_url.as_str(), false).await else {
            return Err("cannot load main page".to_string());
        };
        let body = response
            .text()
            .await
            .map_err(|e| format!("cannot read main page: {e}"))?;

        candidates.extend(self.keyword_links(&body));

        if !self.skip_sitemap {
            let resolver = SitemapResolver::new(
                &self.base_url,
                &self.fetcher,
                &self.config.parser,
                &self.config.keywords,
            );
            candidates.extend(resolver.collect_links().await);
        } else {
            info!("skipping sitemap (fast mode)");
        }

        for path in &self.config.keywords.common_paths {
            if let Ok(joined) = self.base_url.join(path) {
                candidates.insert(normalize_url(joined).to_string());
            }
        }

        Ok(candidates)
    }

    /// Same-domain homepage links whose URL or visible text carries one of
    /// the configured keyword tokens.
    fn keyword_links(&self, homepage: &str) -> BTreeSet<String> {
        let tokens = self.config.keywords.all_tokens();
        let document = Html::parse_document(homepage);
        let selector = Selector::parse("a[href]").unwrap();
        let mut links = BTreeSet::new();

        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(absolute) = self.base_url.join(href) else {
                continue;
            };
            if !self.is_candidate_url(&absolute) {
                continue;
            }

            let link_text = anchor.text().collect::<String>().trim().to_lowercase();
            let link_url = absolute.as_str().to_lowercase();

            if tokens
                .iter()
                .any(|token| link_url.contains(token) || link_text.contains(token))
            {
                links.insert(normalize_url(absolute).to_string());
            }
        }

        links
    }

    /// Visit one candidate. Skips the fetch entirely when the URL's keyword
    /// group already produced a finding earlier in this run.
    async fn process_url(&mut self, url: &str, index: usize, total: usize) {
        let group = self.url_keyword_group(url);

        if let Some(group) = &group {
            if self.successful_groups.contains(group) {
                info!(
                    "({}/{}) skipping: {} (group '{}' already successful)",
                    index, total, url, group
                );
                return;
            }
        }

        info!("({}/{}) checking: {}", index, total, url);
        self.politeness_delay().await;

        let Some(response) = self.fetcher.fetch(url, true).await else {
            return;
        };
        if response.status().as_u16() != 200 {
            return;
        }
        let Ok(body) = response.text().await else {
            return;
        };

        // Parsed DOM stays inside this synchronous scope; only owned signal
        // data crosses the await below.
        let (page_emails, forms): (BTreeSet<String>, Vec<FormSignals>) = {
            let document = Html::parse_document(&body);
            (
                self.email_extractor.extract(&document),
                collect_form_signals(&document),
            )
        };

        let before = self.emails.len();
        self.emails.extend(page_emails);
        let found_emails = self.emails.len() > before;

        let found_form = self
            .classifier
            .page_has_contact_form(&forms, self.scorer.as_deref())
            .await;
        if found_form {
            self.contact_form_pages.insert(url.to_string());
        }

        if found_emails || found_form {
            if let Some(group) = group {
                info!("group '{}' marked as successful", group);
                self.successful_groups.insert(group);
            }
        }
    }

    /// Map a URL to its keyword group by final path segment, with two common
    /// multi-word slugs special-cased.
    fn url_keyword_group(&self, url: &str) -> Option<String> {
        let segment = Url::parse(url)
            .ok()
            .map(|u| u.path().to_lowercase())
            .and_then(|path| path.rsplit('/').next().map(str::to_string))?;

        for (group, tokens) in &self.config.keywords.groups {
            if tokens.iter().any(|token| *token == segment) {
                return Some(group.clone());
            }
        }

        if url.contains("contact-us") {
            return Some("contact".to_string());
        }
        if url.contains("about-us") {
            return Some("about".to_string());
        }

        None
    }

    fn is_candidate_url(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }

        let Some(host) = url.host_str() else {
            return false;
        };
        if host != self.domain && !host.ends_with(&format!(".{}", self.domain)) {
            return false;
        }

        let lower = url.as_str().to_lowercase();
        !EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
    }

    /// Randomized pause between page fetches so a run doesn't hammer the
    /// target. Disabled when the configured maximum is zero.
    async fn politeness_delay(&self) {
        let min = self.config.parser.min_request_delay_ms;
        let max = self.config.parser.max_request_delay_ms;
        if max == 0 {
            return;
        }
        let millis = if max > min {
            fastrand::u64(min..=max)
        } else {
            max
        };
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Strip the trailing slash from the path; the root path stays "/".
/// Query and fragment are preserved.
pub fn normalize_url(mut url: Url) -> Url {
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }
    url
}
