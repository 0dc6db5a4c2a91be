//! Trial report and export functionality

use crate::correlate::{ButtonRecord, KeyRecord, MotionSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Records collected over one run, ready for export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialReport {
    pub metadata: ReportMetadata,
    pub summary: TrialSummary,
    pub keys: Vec<KeyRecord>,
    pub buttons: Vec<ButtonRecord>,
    pub motion: Vec<MotionSample>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Report generation timestamp (RFC 3339)
    pub generated_at: String,
    /// Application version
    pub version: String,
    /// Free-form run label
    pub label: String,
}

/// Summary statistics over the key and button records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    /// Records with both a press and a release
    pub responses: usize,
    /// Presses never released plus retained orphan releases
    pub unmatched: usize,
    /// Mean press duration over complete records
    pub mean_duration: Option<f64>,
}

impl TrialSummary {
    fn from_records(keys: &[KeyRecord], buttons: &[ButtonRecord]) -> Self {
        let durations: Vec<f64> = keys
            .iter()
            .filter(|r| r.is_complete())
            .filter_map(|r| r.duration)
            .chain(
                buttons
                    .iter()
                    .filter(|r| r.is_complete())
                    .filter_map(|r| r.duration),
            )
            .collect();

        let unmatched = keys.iter().filter(|r| !r.is_complete()).count()
            + buttons.iter().filter(|r| !r.is_complete()).count();

        let mean_duration = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<f64>() / durations.len() as f64)
        };

        Self {
            responses: durations.len(),
            unmatched,
            mean_duration,
        }
    }
}

impl TrialReport {
    /// Create a report stamped with the current time
    pub fn new(
        label: impl Into<String>,
        keys: Vec<KeyRecord>,
        buttons: Vec<ButtonRecord>,
        motion: Vec<MotionSample>,
    ) -> Self {
        let now: DateTime<Utc> = Utc::now();
        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                label: label.into(),
            },
            summary: TrialSummary::from_records(&keys, &buttons),
            keys,
            buttons,
            motion,
        }
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
