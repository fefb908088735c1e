// src/site_parser/email_extractor.rs
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

/// Substrings that mark an address as a false positive. These are checked
/// against the whole lowercased address, not just the domain, which is the
/// intended (if blunt) behavior.
const FALSE_POSITIVES: [&str; 10] = [
    ".png",
    ".jpg",
    ".jpeg",
    ".gif",
    ".css",
    ".js",
    "example.com",
    "test@",
    "@example",
    "noreply@",
];

pub struct EmailExtractor {
    pattern: Regex,
    anchor_selector: Selector,
}

impl EmailExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap(),
            anchor_selector: Selector::parse("a[href]").unwrap(),
        }
    }

    /// Pull addresses from mailto links and visible text. Everything returned
    /// is lowercased, validated and deduplicated.
    pub fn extract(&self, document: &Html) -> BTreeSet<String> {
        let mut found = BTreeSet::new();

        for anchor in document.select(&self.anchor_selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if let Some(rest) = href.strip_prefix("mailto:") {
                // Drop any ?subject=... query suffix
                let address = rest.split('?').next().unwrap_or("");
                if !address.is_empty() && is_valid_email(address) {
                    found.insert(address.to_lowercase());
                }
            }
        }

        let text = document.root_element().text().collect::<Vec<_>>().join(" ");
        for m in self.pattern.find_iter(&text) {
            if is_valid_email(m.as_str()) {
                found.insert(m.as_str().to_lowercase());
            }
        }

        found
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((_, domain)) = email.split_once('@') else {
        return false;
    };
    if !domain.contains('.') {
        return false;
    }

    let lower = email.to_lowercase();
    !FALSE_POSITIVES.iter().any(|fp| lower.contains(fp))
}
