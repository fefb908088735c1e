use dialoguer::{theme::ColorfulTheme, Select};

use crate::cli::cli::MenuAction;
use crate::models::{CliApp, Result};
use tracing::error;

impl CliApp {
    pub async fn run(&self) -> Result<()> {
        println!("\n🚀 Welcome to Contact Scout!");
        println!("═══════════════════════════════════════");

        loop {
            let actions = vec![
                MenuAction::ParseSite,
                MenuAction::BatchSearch,
                MenuAction::Exit,
            ];

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("\nSelect an action")
                .default(0)
                .items(&actions)
                .interact()?;

            match &actions[selection] {
                MenuAction::ParseSite => {
                    if let Err(e) = self.run_parse_site().await {
                        error!("Site parse failed: {}", e);
                    }
                }
                MenuAction::BatchSearch => {
                    if let Err(e) = self.run_batch_search().await {
                        error!("Batch parse failed: {}", e);
                    }
                }
                MenuAction::Exit => {
                    println!("👋 Goodbye!");
                    break;
                }
            }
        }

        Ok(())
    }
}
