//! Wire types for the domain-intelligence service and the engine's
//! event/error vocabulary.
//!
//! Field names mirror the service's JSON; anything the service may omit
//! carries a serde default so older payloads still decode.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any network traffic.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Transport failure: DNS, connect, TLS, timeout, aborted body.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with a failure status or an error body.
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },
    /// A frame arrived on the push channel that is not a chat envelope.
    #[error("malformed envelope: {0}")]
    Protocol(String),
}

/// Three-state sector classification as the service reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorLabel {
    Yes,
    No,
    #[default]
    #[serde(rename = "Can't Say")]
    #[serde(other)]
    CantSay,
}

impl fmt::Display for SectorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SectorLabel::Yes => "Yes",
            SectorLabel::No => "No",
            SectorLabel::CantSay => "Can't Say",
        };
        f.write_str(text)
    }
}

/// One analyzed email, whether it came from a direct request, a batch
/// results page or an envelope's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub original_email: String,
    pub extracted_domain: String,
    #[serde(default)]
    pub selected_url: Option<String>,
    #[serde(default)]
    pub scraping_status: Option<String>,
    #[serde(default)]
    pub website_summary: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub selection_reasoning: Option<String>,
    #[serde(default)]
    pub completed_timestamp: Option<String>,
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub real_estate: SectorLabel,
    #[serde(default)]
    pub infrastructure: SectorLabel,
    #[serde(default)]
    pub industrial: SectorLabel,
}

/// Preview of a CSV upload: a capped sample plus dedup accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailPreview {
    /// Up to the first ten valid addresses found in the file.
    #[serde(rename = "valid_emails", default)]
    pub sample: Vec<String>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_more: bool,
    pub stats: PreviewStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewStats {
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub email_column: Option<String>,
    #[serde(rename = "valid_emails", default)]
    pub valid: u64,
    #[serde(rename = "invalid_emails", default)]
    pub invalid: u64,
    /// Duplicates within the file itself.
    #[serde(rename = "duplicates_removed", default)]
    pub csv_duplicates: u64,
    /// Addresses the service has already analyzed.
    #[serde(rename = "bigquery_duplicates", default)]
    pub already_known: u64,
    #[serde(default)]
    pub new_emails: u64,
    #[serde(default)]
    pub empty_rows: u64,
}

/// Acknowledgement for a small upload processed without a batch job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_emails: u64,
}

/// Lifecycle of a queued batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl BatchStatus {
    /// Terminal states end polling.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::CompletedWithErrors | BatchStatus::Failed
        )
    }

    /// Only completed batches (with or without errors) have a results page.
    pub fn has_results(self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::CompletedWithErrors)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::CompletedWithErrors => "completed_with_errors",
            BatchStatus::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// One observation of a batch job, as returned by submit and status calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub batch_id: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub duplicate: u64,
    pub status: BatchStatus,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl BatchJob {
    /// Progress bounded to [0, 100] whatever the service sent.
    pub fn clamped_progress(&self) -> f64 {
        if self.progress_percentage.is_nan() {
            return 0.0;
        }
        self.progress_percentage.clamp(0.0, 100.0)
    }
}

/// Role of a chat envelope's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeRole {
    User,
    System,
}

/// Chat envelope shared by the message endpoint and the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub message_id: String,
    pub session_id: String,
    #[serde(rename = "message_type")]
    pub role: EnvelopeRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ChatEnvelope {
    /// Pulls a structured analysis out of the metadata, when present.
    pub fn analysis_result(&self) -> Option<AnalysisResult> {
        let value = self.metadata.as_ref()?.get("analysis_result")?;
        serde_json::from_value(value.clone()).ok()
    }
}

/// Outcome of a confirmed upload: either processed inline or queued.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAck {
    /// Small uploads are accepted for immediate processing.
    Accepted { message: String, total: u64 },
    /// Larger uploads become a batch job worth polling.
    Queued(BatchJob),
}

/// Everything the engine reports back to the synchronous side.
#[derive(Debug)]
pub enum EngineEvent {
    HealthChecked {
        healthy: bool,
    },
    AnalysisCompleted {
        email: String,
        result: Result<AnalysisResult, ClientError>,
    },
    ChatDelivered {
        result: Result<(), ClientError>,
    },
    PreviewReady {
        path: String,
        result: Result<EmailPreview, ClientError>,
    },
    ConfirmCompleted {
        result: Result<ConfirmAck, ClientError>,
    },
    BatchStatus(BatchJob),
    BatchResults {
        batch_id: String,
        result: Result<Vec<AnalysisResult>, ClientError>,
    },
    EnvelopeReceived(ChatEnvelope),
    ChannelUp,
    ChannelDown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sector_labels_decode_the_service_strings() {
        assert_eq!(
            serde_json::from_str::<SectorLabel>("\"Yes\"").unwrap(),
            SectorLabel::Yes
        );
        assert_eq!(
            serde_json::from_str::<SectorLabel>("\"Can't Say\"").unwrap(),
            SectorLabel::CantSay
        );
        // Unknown labels collapse to the undecided state.
        assert_eq!(
            serde_json::from_str::<SectorLabel>("\"Maybe\"").unwrap(),
            SectorLabel::CantSay
        );
    }

    #[test]
    fn analysis_result_decodes_with_sparse_fields() {
        let json = r#"{
            "original_email": "person@example.com",
            "extracted_domain": "example.com",
            "real_estate": "No"
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.extracted_domain, "example.com");
        assert_eq!(result.real_estate, SectorLabel::No);
        assert_eq!(result.infrastructure, SectorLabel::CantSay);
        assert!(!result.from_cache);
        assert!(result.confidence_score.is_none());
    }

    #[test]
    fn batch_status_terminality() {
        assert!(!BatchStatus::Pending.is_terminal());
        assert!(!BatchStatus::Processing.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::CompletedWithErrors.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
        assert!(BatchStatus::CompletedWithErrors.has_results());
        assert!(!BatchStatus::Failed.has_results());
    }

    #[test]
    fn batch_progress_is_clamped() {
        let mut job: BatchJob = serde_json::from_str(
            r#"{"batch_id":"b1","status":"processing","progress_percentage":104.2}"#,
        )
        .unwrap();
        assert_eq!(job.clamped_progress(), 100.0);
        job.progress_percentage = -3.0;
        assert_eq!(job.clamped_progress(), 0.0);
    }

    #[test]
    fn envelope_metadata_yields_an_analysis() {
        let json = r#"{
            "message_id": "msg_1",
            "session_id": "sess_x",
            "message_type": "system",
            "content": "Analysis complete",
            "timestamp": "2026-08-23T10:00:00Z",
            "metadata": {
                "analysis_result": {
                    "original_email": "a@b.co",
                    "extracted_domain": "b.co"
                }
            }
        }"#;
        let envelope: ChatEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.role, EnvelopeRole::System);
        let analysis = envelope.analysis_result().expect("analysis in metadata");
        assert_eq!(analysis.extracted_domain, "b.co");
    }

    #[test]
    fn envelope_without_metadata_has_no_analysis() {
        let json = r#"{
            "message_id": "msg_2",
            "session_id": "sess_x",
            "message_type": "user",
            "content": "hello",
            "timestamp": "2026-08-23T10:00:00Z"
        }"#;
        let envelope: ChatEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.analysis_result().is_none());
    }
}
