//! Markdown summary generation
//!
//! Renders a human-readable report of one run: per-site counters, where
//! the aggregates landed, and which seeds were still unresolved after the
//! retry waves.

use crate::output::stats::StatsSnapshot;
use crate::waves::WaveReport;
use crate::ScoutError;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Unresolved URLs listed before the report truncates
const MAX_LISTED_UNRESOLVED: usize = 50;

/// Everything the report needs about one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config_hash: String,
    pub cancelled: bool,
    pub sites: Vec<SiteSummary>,
}

/// Per-site section of a [`RunSummary`]
#[derive(Debug, Clone)]
pub struct SiteSummary {
    pub name: String,
    pub stats: StatsSnapshot,
    pub records: usize,
    pub aggregate_path: Option<String>,
    pub waves: Option<WaveReport>,
}

impl RunSummary {
    pub fn new(mode: impl Into<String>, config_hash: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            started_at: Utc::now(),
            finished_at: None,
            config_hash: config_hash.into(),
            cancelled: false,
            sites: Vec::new(),
        }
    }

    pub fn finish(&mut self, cancelled: bool) {
        self.finished_at = Some(Utc::now());
        self.cancelled = cancelled;
    }

    pub fn total_records(&self) -> usize {
        self.sites.iter().map(|s| s.records).sum()
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> Result<(), ScoutError> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# Pantry-Scout Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Mode**: {}\n", summary.mode));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    let status = if summary.cancelled { "cancelled" } else { "completed" };
    md.push_str(&format!("- **Status**: {}\n", status));
    md.push_str(&format!("- **Config Hash**: {}\n", summary.config_hash));
    md.push_str(&format!("- **Total Records**: {}\n\n", summary.total_records()));

    for site in &summary.sites {
        md.push_str(&format!("## Site: {}\n\n", site.name));

        md.push_str("| Counter | Value |\n");
        md.push_str("|---------|-------|\n");
        md.push_str(&format!("| Listing pages | {} |\n", site.stats.listing_pages));
        md.push_str(&format!(
            "| Listing failures | {} |\n",
            site.stats.listing_failures
        ));
        md.push_str(&format!("| Records saved | {} |\n", site.stats.records_saved));
        md.push_str(&format!("| Empty records | {} |\n", site.stats.empty_records));
        md.push_str(&format!("| Fetch failures | {} |\n", site.stats.fetch_failures));
        md.push_str(&format!("| Write failures | {} |\n", site.stats.write_failures));
        md.push_str(&format!("| Skipped | {} |\n", site.stats.skipped));
        md.push_str(&format!(
            "| Success rate | {:.2}% |\n\n",
            site.stats.success_rate()
        ));

        if let Some(path) = &site.aggregate_path {
            md.push_str(&format!(
                "{} records written to `{}`\n\n",
                site.records, path
            ));
        }

        if let Some(waves) = &site.waves {
            md.push_str("### Retry Waves\n\n");
            md.push_str(&format!("- **Cycles run**: {}\n", waves.cycles_run));
            md.push_str(&format!("- **Processed**: {}\n", waves.processed.len()));
            md.push_str(&format!("- **Unresolved**: {}\n\n", waves.unresolved.len()));

            if !waves.unresolved.is_empty() {
                for url in waves.unresolved.iter().take(MAX_LISTED_UNRESOLVED) {
                    md.push_str(&format!("- {}\n", url));
                }
                if waves.unresolved.len() > MAX_LISTED_UNRESOLVED {
                    md.push_str(&format!(
                        "\n... and {} more\n",
                        waves.unresolved.len() - MAX_LISTED_UNRESOLVED
                    ));
                }
                md.push('\n');
            }
        }
    }

    md
}
