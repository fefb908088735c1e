use tracing::info;

use crate::config::Config;
use crate::models::{CliApp, Result};

#[derive(Debug, Clone)]
pub enum MenuAction {
    ParseSite,
    BatchSearch,
    Exit,
}

impl std::fmt::Display for MenuAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuAction::ParseSite => {
                write!(f, "🕷️  Parse a single site for contact information")
            }
            MenuAction::BatchSearch => {
                write!(f, "🔍 Batch parse: seed domains from a search query")
            }
            MenuAction::Exit => write!(f, "🚪 Exit"),
        }
    }
}

impl CliApp {
    pub fn new(config: Config) -> Result<Self> {
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let google_api_key = std::env::var("GOOGLE_API_KEY").ok();
        let google_cx = std::env::var("GOOGLE_CX").ok();

        if openai_api_key.is_some() {
            info!("form scoring enabled (OPENAI_API_KEY set)");
        } else {
            info!("form scoring disabled (no OPENAI_API_KEY)");
        }

        Ok(Self {
            config,
            openai_api_key,
            google_api_key,
            google_cx,
        })
    }
}
