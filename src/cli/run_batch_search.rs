// src/cli/run_batch_search.rs
use crate::batch::BatchParser;
use crate::models::{CliApp, Result};
use crate::report::write_report;
use crate::search::GoogleSearch;
use crate::sink::LogSink;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::sync::Arc;

impl CliApp {
    pub async fn run_batch_search(&self) -> Result<()> {
        println!("\n🔍 Batch Contact Discovery from Search");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        let (Some(api_key), Some(cx)) = (&self.google_api_key, &self.google_cx) else {
            println!("❌ GOOGLE_API_KEY and GOOGLE_CX must be set for batch mode");
            return Ok(());
        };

        let query: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Search query")
            .interact_text()?;

        let num_results: usize = Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Number of search results")
            .default(10)
            .interact_text()?;

        let skip_sitemap = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Skip sitemaps everywhere (fast mode)?")
            .default(false)
            .interact()?;

        let provider = Arc::new(
            GoogleSearch::new(
                api_key.clone(),
                cx.clone(),
                self.config.batch.min_search_delay_ms,
                self.config.batch.max_search_delay_ms,
            )?,
        );

        let batch = BatchParser::new(
            self.config.clone(),
            provider,
            Arc::new(LogSink),
            self.build_scorer()?,
            skip_sitemap,
        );

        let report = batch.parse_from_search(&query, num_results).await?;
        report.print_summary();

        let path = write_report(&report, &self.config.output).await?;
        println!("\n📤 Report written to {}", path.display());

        Ok(())
    }
}
