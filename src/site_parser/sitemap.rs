// src/site_parser/sitemap.rs
use crate::config::{KeywordConfig, ParserConfig};
use crate::site_parser::fetcher::Fetcher;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Conventional locations probed for a sitemap.
const SITEMAP_PROBES: [&str; 4] = [
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemaps.xml",
    "/sitemap/sitemap.xml",
];

/// Discovers and traverses sitemaps for one site, within hard bounds on
/// sitemap count, per-traversal URL count and document size. Never fails the
/// surrounding parse; the worst case is an empty set.
pub struct SitemapResolver<'a> {
    base_url: &'a url::Url,
    fetcher: &'a Fetcher,
    parser: &'a ParserConfig,
    keywords: &'a KeywordConfig,
}

/// Outcome of one structured sitemap parse: page URLs plus nested sitemap
/// locations when the document is an index.
#[derive(Debug, Default, PartialEq)]
struct SitemapXml {
    urls: Vec<String>,
    nested: Vec<String>,
}

impl<'a> SitemapResolver<'a> {
    pub fn new(
        base_url: &'a url::Url,
        fetcher: &'a Fetcher,
        parser: &'a ParserConfig,
        keywords: &'a KeywordConfig,
    ) -> Self {
        Self {
            base_url,
            fetcher,
            parser,
            keywords,
        }
    }

    /// Extract and prioritize same-host links from the site's sitemaps.
    pub async fn collect_links(&self) -> BTreeSet<String> {
        info!("searching for sitemap...");

        let sitemap_urls = self.find_sitemap_urls().await;
        if sitemap_urls.is_empty() {
            info!("no sitemaps found");
            return BTreeSet::new();
        }
        info!("found {} sitemap(s)", sitemap_urls.len());

        let links = self.gather_urls(sitemap_urls).await;
        let prioritized = self.prioritize(links);

        info!("sitemap traversal yielded {} priority URLs", prioritized.len());
        prioritized
    }

    async fn find_sitemap_urls(&self) -> Vec<String> {
        let mut valid = Vec::new();
        for path in SITEMAP_PROBES {
            let Ok(probe) = self.base_url.join(path) else {
                continue;
            };
            if let Some(response) = self.fetcher.fetch(probe.as_str(), true).await {
                if response.status().as_u16() == 200 {
                    valid.push(probe.to_string());
                }
            }
        }
        valid
    }

    /// Walk up to `max_sitemaps` top-level sitemaps, expanding index files
    /// through a worklist, until the URL ceiling is reached.
    async fn gather_urls(&self, sitemap_urls: Vec<String>) -> BTreeSet<String> {
        let max_urls = self.parser.max_urls_per_sitemap;
        let mut links = BTreeSet::new();
        let mut seen: HashSet<String> = sitemap_urls.iter().cloned().collect();
        let mut worklist: VecDeque<String> = sitemap_urls
            .into_iter()
            .take(self.parser.max_sitemaps)
            .collect();

        while let Some(sitemap_url) = worklist.pop_front() {
            if links.len() >= max_urls {
                break;
            }

            let Some(body) = self.fetch_sitemap_body(&sitemap_url).await else {
                continue;
            };

            let parsed = match parse_sitemap_xml(&body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!("structured parse of {} failed ({}), salvaging", sitemap_url, e);
                    SitemapXml {
                        urls: salvage_locs(&body),
                        nested: Vec::new(),
                    }
                }
            };

            for loc in parsed.urls {
                if links.len() >= max_urls {
                    break;
                }
                if let Some(normalized) = self.normalize_same_host(&loc) {
                    links.insert(normalized);
                }
            }

            for nested in parsed.nested {
                if links.len() >= max_urls {
                    break;
                }
                if seen.insert(nested.clone()) {
                    worklist.push_back(nested);
                }
            }
        }

        links
    }

    async fn fetch_sitemap_body(&self, sitemap_url: &str) -> Option<String> {
        let timeout = Duration::from_secs(self.parser.sitemap_read_timeout_secs);
        let response = self
            .fetcher
            .fetch_with_timeout(sitemap_url, true, Some(timeout))
            .await?;
        if response.status().as_u16() != 200 {
            return None;
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("failed to read sitemap {}: {}", sitemap_url, e);
                return None;
            }
        };

        let size_limit = self.parser.max_sitemap_size_mb * 1024 * 1024;
        if bytes.len() as u64 > size_limit {
            warn!(
                "sitemap {} too large ({:.1}MB), skipping",
                sitemap_url,
                bytes.len() as f64 / (1024.0 * 1024.0)
            );
            return None;
        }

        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Keep only URLs on the same host, normalized to scheme + host + path
    /// with the trailing slash stripped.
    fn normalize_same_host(&self, loc: &str) -> Option<String> {
        let parsed = url::Url::parse(loc.trim()).ok()?;
        if parsed.host_str() != self.base_url.host_str() {
            return None;
        }

        let mut normalized = parsed;
        let trimmed = normalized.path().trim_end_matches('/').to_string();
        normalized.set_path(&trimmed);
        normalized.set_query(None);
        normalized.set_fragment(None);
        Some(normalized.to_string())
    }

    /// Keyword-bearing URLs come first; when those are scarce, shorter paths
    /// backfill up to the cap.
    fn prioritize(&self, links: BTreeSet<String>) -> BTreeSet<String> {
        if links.is_empty() {
            return links;
        }

        let tokens = self.keywords.all_tokens();
        let mut prioritized: BTreeSet<String> = links
            .iter()
            .filter(|link| {
                let lower = link.to_lowercase();
                tokens.iter().any(|token| lower.contains(token))
            })
            .cloned()
            .collect();

        if prioritized.len() >= self.parser.priority_url_floor {
            return prioritized;
        }

        let mut remaining: Vec<&String> =
            links.iter().filter(|l| !prioritized.contains(*l)).collect();
        remaining.sort_by_key(|link| {
            url::Url::parse(link)
                .map(|u| u.path().len())
                .unwrap_or(usize::MAX)
        });

        for link in remaining {
            if prioritized.len() >= self.parser.priority_url_cap {
                break;
            }
            prioritized.insert(link.clone());
        }

        prioritized
    }
}

/// Structured sitemap decode. Elements are matched by local name so
/// namespaced and namespace-free documents parse the same way. Errors
/// propagate so the caller can fall back to the salvage extractor.
fn parse_sitemap_xml(xml: &str) -> Result<SitemapXml, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut result = SitemapXml::default();
    let mut in_url = false;
    let mut in_sitemap = false;
    let mut in_loc = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"sitemap" => in_sitemap = true,
                b"loc" => in_loc = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"url" => in_url = false,
                b"sitemap" => in_sitemap = false,
                b"loc" => in_loc = false,
                _ => {}
            },
            Event::Text(t) if in_loc => {
                let loc = t.unescape().unwrap_or_default().trim().to_string();
                if loc.is_empty() {
                    continue;
                }
                if in_sitemap {
                    result.nested.push(loc);
                } else if in_url {
                    result.urls.push(loc);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(result)
}

/// Best-effort recovery when the XML is malformed: scrape anything that looks
/// like a `<loc>` entry out of the raw text.
fn salvage_locs(content: &str) -> Vec<String> {
    let pattern = Regex::new(r"<loc[^>]*>(.*?)</loc>").unwrap();
    pattern
        .captures_iter(content)
        .map(|c| c[1].trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}
