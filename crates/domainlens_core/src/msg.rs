use crate::state::{
    AnalysisReport, BatchSummary, ChannelHealth, ConfirmOutcome, EnvelopeRole, PreviewSummary,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a line expected to contain an email address.
    EmailSubmitted(String),
    /// User asked to send plain chat text via the one-shot message endpoint.
    ChatSubmitted(String),
    /// One-shot chat send resolved; only failures are surfaced (replies
    /// arrive over the push channel).
    ChatDelivered { result: Result<(), String> },
    /// Startup liveness probe resolved.
    HealthChecked { healthy: bool },
    /// User chose a file for bulk upload; the platform stats it first.
    FileSubmitted { path: String, size_bytes: u64 },
    /// Preview response for the submitted file.
    PreviewLoaded {
        path: String,
        preview: PreviewSummary,
    },
    /// Preview request failed.
    PreviewFailed { path: String, error: String },
    /// User confirmed the previewed upload.
    ConfirmSubmitted,
    /// User asked to stop watching the active batch.
    BatchCancelRequested,
    /// Single-email analysis resolved, either way.
    AnalysisCompleted {
        email: String,
        result: Result<AnalysisReport, String>,
    },
    /// Batch confirm resolved, either way.
    ConfirmCompleted {
        result: Result<ConfirmOutcome, String>,
    },
    /// One poll observation for a batch job (already clamped for display).
    BatchStatusObserved(BatchSummary),
    /// Final results page for a completed batch.
    BatchResultsReady {
        batch_id: String,
        result: Result<Vec<AnalysisReport>, String>,
    },
    /// Envelope pushed over the duplex channel, in arrival order.
    EnvelopeArrived {
        role: EnvelopeRole,
        content: String,
        analysis: Option<AnalysisReport>,
    },
    /// Duplex channel connectivity changed.
    ChannelStatusChanged(ChannelHealth),
    /// User asked to quit.
    QuitRequested,
}
