use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub parser: ParserConfig,
    pub keywords: KeywordConfig,
    pub forms: FormKeywords,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub sitemap_read_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_sitemaps: usize,
    pub max_urls_per_sitemap: usize,
    pub max_sitemap_size_mb: u64,
    pub form_score_threshold: i32,
    pub priority_url_floor: usize,
    pub priority_url_cap: usize,
    pub min_request_delay_ms: u64,
    pub max_request_delay_ms: u64,
    pub user_agents: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 3,
            read_timeout_secs: 10,
            sitemap_read_timeout_secs: 15,
            max_retries: 3,
            retry_backoff_ms: 1000,
            max_sitemaps: 5,
            max_urls_per_sitemap: 1000,
            max_sitemap_size_mb: 10,
            form_score_threshold: 5,
            priority_url_floor: 20,
            priority_url_cap: 50,
            min_request_delay_ms: 500,
            max_request_delay_ms: 1500,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
            ],
        }
    }
}

/// Keyword groups classify candidate URLs and drive redundancy avoidance:
/// once any URL of a group yields a finding, the rest of the group is
/// skipped for the remainder of the run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub groups: BTreeMap<String, Vec<String>>,
    pub common_paths: Vec<String>,
}

impl KeywordConfig {
    /// All keyword tokens across every group, used for link and sitemap
    /// prioritization.
    pub fn all_tokens(&self) -> Vec<&str> {
        self.groups
            .values()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect()
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        let groups = BTreeMap::from([
            (
                "contact".to_string(),
                to_strings(&[
                    "contact",
                    "contacts",
                    "kontakt",
                    "kontakty",
                    "связаться",
                    "контакты",
                    "feedback",
                ]),
            ),
            (
                "about".to_string(),
                to_strings(&["about", "o-nas", "о-нас"]),
            ),
            (
                "support".to_string(),
                to_strings(&["support", "help", "podderzhka", "поддержка"]),
            ),
            (
                "mail".to_string(),
                to_strings(&["mail", "email", "pochta", "почта"]),
            ),
            (
                "ads".to_string(),
                to_strings(&[
                    "ads",
                    "advertisements",
                    "advertise",
                    "advertising",
                    "реклама",
                    "рекламодателям",
                    "partner",
                    "partners",
                    "partnership",
                    "partnerstvo",
                    "партнерство",
                    "collaborate",
                    "cooperation",
                ]),
            ),
        ]);

        Self {
            groups,
            common_paths: to_strings(&[
                "/contact",
                "/contacts",
                "/about",
                "/feedback",
                "/support",
                "/help",
                "/ads",
                "/advertisements",
                "/advertise",
                "/advertising",
                "/partners",
                "/partnership",
                "/collaborate",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormKeywords {
    pub attributes: Vec<String>,
    pub name_fields: Vec<String>,
    pub email_fields: Vec<String>,
    pub message_fields: Vec<String>,
    pub surrounding_text: Vec<String>,
}

impl Default for FormKeywords {
    fn default() -> Self {
        Self {
            attributes: to_strings(&[
                "contact",
                "feedback",
                "message",
                "msg",
                "mail",
                "form",
                "partner",
                "advertise",
                "collaboration",
            ]),
            name_fields: to_strings(&[
                "name",
                "имя",
                "fname",
                "lname",
                "company",
                "компания",
                "organization",
            ]),
            email_fields: to_strings(&["email", "e-mail", "mail", "почта"]),
            message_fields: to_strings(&[
                "message",
                "msg",
                "сообщение",
                "text",
                "body",
                "comment",
                "proposal",
                "предложение",
                "description",
                "описание",
            ]),
            surrounding_text: to_strings(&[
                "contact us",
                "send a message",
                "get in touch",
                "свяжитесь с нами",
                "advertise with us",
                "become a partner",
                "partnership inquiry",
                "collaboration",
                "сотрудничество",
                "стать партнером",
                "рекламодателям",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    pub min_domain_delay_ms: u64,
    pub max_domain_delay_ms: u64,
    pub min_search_delay_ms: u64,
    pub max_search_delay_ms: u64,
    /// Domains matching any of these substrings get the sitemap skipped
    /// automatically (fast mode) because a full traversal is pointless there.
    pub large_sites: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_domain_delay_ms: 2000,
            max_domain_delay_ms: 4000,
            min_search_delay_ms: 1000,
            max_search_delay_ms: 2000,
            large_sites: to_strings(&[
                "netflix",
                "youtube",
                "amazon",
                "wikipedia",
                "google",
                "facebook",
                "twitter",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub pretty_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "out".to_string(),
            pretty_json: true,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
