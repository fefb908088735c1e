use serde::{Deserialize, Serialize};

use crate::config::Config;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Everything a finished site parse produced. Both lists are sorted and
/// deduplicated before they leave the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub emails: Vec<String>,
    pub contact_form_pages: Vec<String>,
}

/// Terminal state of a single site parse. The only fatal condition is an
/// unreachable main page; everything else degrades to a possibly-empty
/// Completed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParseOutcome {
    Completed(ParseResult),
    Failed { reason: String },
}

impl ParseOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ParseOutcome::Completed(_))
    }
}

pub struct CliApp {
    pub config: Config,
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_cx: Option<String>,
}
