use anyhow::Result;
use serde::Serialize;
use tracing::{error, info};

use crate::pipeline::{RunSummary, SourceStatus};

const USERNAME: &str = "Airspace Ingest";

/// Failed sources listed in a notification before the rest is elided
const MAX_LISTED_FAILURES: usize = 10;

#[derive(Serialize, Debug)]
struct DiscordEmbed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
}

#[derive(Serialize, Debug)]
struct DiscordPayload {
    username: String,
    embeds: Vec<DiscordEmbed>,
}

pub struct DiscordWebhook {
    url: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    /// Post the outcome of a run; red when any source failed
    pub async fn notify_run(&self, summary: &RunSummary) -> Result<()> {
        let success = summary.failed() == 0;
        let title = if success {
            "Airspace Import Complete"
        } else {
            "Airspace Import Finished With Failures"
        };
        self.send(title, &describe_run(summary), success).await
    }

    async fn send(&self, title: &str, description: &str, success: bool) -> Result<()> {
        let color = if success { 0x00FF00 } else { 0xFF0000 };

        let payload = DiscordPayload {
            username: USERNAME.to_string(),
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: description.to_string(),
                color,
                timestamp: chrono::Utc::now().to_rfc3339(),
            }],
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            error!("Failed to send Discord notification: {}", error_text);
            anyhow::bail!("Discord notification failed: {}", error_text);
        }

        info!("Sent Discord notification: {}", title);
        Ok(())
    }
}

fn describe_run(summary: &RunSummary) -> String {
    let mut description = format!(
        "Wrote **{}** artifacts with **{}** areas. Failed: **{}**, skipped: **{}**.",
        summary.succeeded(),
        summary.areas(),
        summary.failed(),
        summary.skipped()
    );

    let failures: Vec<_> = summary
        .outcomes
        .iter()
        .filter_map(|o| match &o.status {
            SourceStatus::Failed { error } => Some((o.locator.as_str(), error.as_str())),
            _ => None,
        })
        .collect();

    for (locator, error) in failures.iter().take(MAX_LISTED_FAILURES) {
        description.push_str(&format!("\n- `{}`: {}", locator, error));
    }
    if failures.len() > MAX_LISTED_FAILURES {
        description.push_str(&format!(
            "\n- ... and {} more",
            failures.len() - MAX_LISTED_FAILURES
        ));
    }

    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SourceOutcome;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn outcome(locator: &str, status: SourceStatus) -> SourceOutcome {
        SourceOutcome {
            locator: locator.to_string(),
            import_id: Uuid::nil(),
            status,
        }
    }

    #[test]
    fn test_describe_run_lists_failures() {
        let summary = RunSummary {
            outcomes: vec![
                outcome(
                    "http://a/a.kmz",
                    SourceStatus::Written {
                        artifact: PathBuf::from("data/a.sql"),
                        areas: 12,
                        degenerate: 0,
                    },
                ),
                outcome(
                    "http://a/b.kmz",
                    SourceStatus::Failed {
                        error: "archive has no entry named doc.kml".to_string(),
                    },
                ),
            ],
        };

        let text = describe_run(&summary);
        assert!(text.starts_with("Wrote **1** artifacts with **12** areas. Failed: **1**"));
        assert!(text.contains("`http://a/b.kmz`: archive has no entry named doc.kml"));
    }

    #[test]
    fn test_describe_run_elides_long_failure_lists() {
        let outcomes = (0..15)
            .map(|i| {
                outcome(
                    &format!("http://a/{}.kmz", i),
                    SourceStatus::Failed {
                        error: "HTTP status 404".to_string(),
                    },
                )
            })
            .collect();
        let text = describe_run(&RunSummary { outcomes });
        assert_eq!(text.matches("HTTP status 404").count(), MAX_LISTED_FAILURES);
        assert!(text.ends_with("... and 5 more"));
    }
}
