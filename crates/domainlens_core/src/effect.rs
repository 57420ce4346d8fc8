#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run a single-email analysis.
    AnalyzeEmail { email: String },
    /// Send chat text via the one-shot message endpoint.
    SendChat { text: String },
    /// Preview a file for bulk upload (phase 1, no server-side side effect).
    PreviewFile { path: String },
    /// Submit the previewed file for processing (phase 2).
    ConfirmUpload { path: String, new_emails: u64 },
    /// Start polling status for a queued batch job.
    StartPolling { batch_id: String },
    /// Stop polling (manual cancel); safe when no poller is active.
    StopPolling,
    /// Show a notice inline, without touching the timeline.
    InlineNotice { text: String },
    /// Tear down timers and the duplex channel.
    Shutdown,
}
