// src/report.rs
use crate::batch::BatchReport;
use crate::config::OutputConfig;
use crate::models::Result;
use std::path::PathBuf;
use tracing::info;

/// Write a batch report into the configured output directory and return the
/// file path.
pub async fn write_report(report: &BatchReport, output: &OutputConfig) -> Result<PathBuf> {
    tokio::fs::create_dir_all(&output.directory).await?;

    let path = PathBuf::from(&output.directory).join(format!("contact-report-{}.json", report.run_id));

    let json = if output.pretty_json {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    tokio::fs::write(&path, json).await?;

    info!("report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn report_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputConfig {
            directory: dir.path().to_string_lossy().into_owned(),
            pretty_json: true,
        };

        let report = BatchReport {
            run_id: "test-run".to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            query: "agency".to_string(),
            total_domains: 0,
            successful_domains: 0,
            total_emails: 0,
            total_forms: 0,
            sites: Vec::new(),
        };

        let path = write_report(&report, &output).await.unwrap();
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: BatchReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.query, "agency");
        assert_eq!(parsed.run_id, "test-run");
    }
}
