// src/sink.rs
use async_trait::async_trait;
use tracing::{error, info};

/// Where parse findings get reported. The core hands over site identity,
/// emails and form pages as they are finalized; persistence, task IDs and
/// timestamps are entirely the implementer's business.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn begin(&self, site: &str);
    async fn emails(&self, site: &str, emails: &[String]);
    async fn form_pages(&self, site: &str, pages: &[String]);
    async fn completed(&self, site: &str);
    async fn failed(&self, site: &str, reason: &str);
}

/// Default sink that just narrates findings through tracing.
pub struct LogSink;

#[async_trait]
impl ResultSink for LogSink {
    async fn begin(&self, site: &str) {
        info!("begin parse: {}", site);
    }

    async fn emails(&self, site: &str, emails: &[String]) {
        for email in emails {
            info!("{}: email {}", site, email);
        }
    }

    async fn form_pages(&self, site: &str, pages: &[String]) {
        for page in pages {
            info!("{}: contact form page {}", site, page);
        }
    }

    async fn completed(&self, site: &str) {
        info!("completed parse: {}", site);
    }

    async fn failed(&self, site: &str, reason: &str) {
        error!("failed parse of {}: {}", site, reason);
    }
}
