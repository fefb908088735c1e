// src/cli/run_parse_site.rs
use crate::models::{CliApp, ParseOutcome, Result};
use crate::scorer::{FormScorer, OpenAiScorer};
use crate::site_parser::SiteParser;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::sync::Arc;

impl CliApp {
    pub(crate) fn build_scorer(&self) -> Result<Option<Arc<dyn FormScorer>>> {
        match &self.openai_api_key {
            Some(key) => Ok(Some(Arc::new(OpenAiScorer::new(key.clone())?))),
            None => Ok(None),
        }
    }

    pub async fn run_parse_site(&self) -> Result<()> {
        println!("\n🕷️  Single Site Contact Discovery");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let url: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Site URL")
            .with_initial_text("https://")
            .interact_text()?;

        let skip_sitemap = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Skip sitemap discovery (fast mode)?")
            .default(false)
            .interact()?;

        let scorer = self.build_scorer()?;
        let parser = SiteParser::new(&url, self.config.clone(), scorer, skip_sitemap)?;

        match parser.parse().await {
            ParseOutcome::Completed(result) => {
                println!("\n✅ Parse complete");
                println!("📧 Emails: {}", result.emails.len());
                for email in &result.emails {
                    println!("   - {}", email);
                }
                println!("📝 Contact form pages: {}", result.contact_form_pages.len());
                for page in &result.contact_form_pages {
                    println!("   - {}", page);
                }
            }
            ParseOutcome::Failed { reason } => {
                println!("\n❌ Parse failed: {}", reason);
            }
        }

        Ok(())
    }
}
