//! Types for the job module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle status of the current job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No job has been submitted since startup.
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Point-in-time view of the job slot, as returned to polling clients.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Identifier of the current or most recent job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub status: JobStatus,
    /// 0-100, never decreases within a job.
    pub percent_complete: u8,
    /// Base name of the input being (or last) processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    /// Mean annotation latency in seconds, rounded to 3 decimals.
    /// Only set once the job has completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_inference_seconds: Option<f64>,
    /// Failure reason, only set when the job failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Per-frame annotation latencies collected over one job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyLog {
    samples: Vec<Duration>,
}

impl LatencyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one frame's latency.
    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// Mean latency in seconds rounded to 3 decimal places; 0 when empty.
    pub fn average_seconds(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: f64 = self.samples.iter().map(Duration::as_secs_f64).sum();
        round_millis(total / self.samples.len() as f64)
    }
}

impl From<Vec<Duration>> for LatencyLog {
    fn from(samples: Vec<Duration>) -> Self {
        Self { samples }
    }
}

fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
