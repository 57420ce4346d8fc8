use crate::timeline::{MessageBody, MessageId, Timeline};
use crate::view_model::{AppViewModel, EntryView, PendingUploadView};

/// Upload ceiling enforced before any file read or network call.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
/// The only tabular format the preview endpoint accepts.
pub const UPLOAD_EXTENSION: &str = "csv";
/// Largest confirm that goes through the inline upload endpoint; bigger
/// submissions are queued as tracked batch jobs.
pub const SMALL_BATCH_LIMIT: u64 = 50;

/// Completed single-email analysis, as rendered in the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub original_email: String,
    pub extracted_domain: String,
    pub website_summary: Option<String>,
    pub confidence_score: Option<f64>,
    pub sectors: SectorLabels,
    pub from_cache: bool,
    pub processing_time_seconds: Option<f64>,
}

/// Per-sector classification labels, each drawn from a fixed label set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectorLabels {
    pub real_estate: String,
    pub infrastructure: String,
    pub industrial: String,
}

/// Snapshot of a server-tracked batch job, clamped for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch_id: String,
    pub total: u64,
    pub processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub duplicate: u64,
    pub phase: BatchPhase,
    /// Already clamped to [0, 100] by the caller.
    pub progress_percent: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl BatchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BatchPhase::Completed | BatchPhase::CompletedWithErrors | BatchPhase::Failed
        )
    }

    /// Terminal states that still yield a results page.
    pub fn has_results(self) -> bool {
        matches!(self, BatchPhase::Completed | BatchPhase::CompletedWithErrors)
    }
}

/// Outcome of the preview phase of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewSummary {
    /// Bounded sample of new valid emails.
    pub sample: Vec<String>,
    /// True when the sample was truncated.
    pub truncated: bool,
    pub total_rows: u64,
    pub valid: u64,
    pub invalid: u64,
    pub csv_duplicates: u64,
    pub already_known: u64,
    pub new_emails: u64,
    pub empty_rows: u64,
}

/// Outcome of the confirm phase of a bulk upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Small upload accepted inline; progress arrives over the push channel.
    Accepted { message: String, total: u64 },
    /// Large upload queued as a tracked batch job.
    Queued { batch_id: String, total: u64 },
}

/// Role carried by an inbound push-channel envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeRole {
    User,
    System,
}

/// Observed health of the duplex channel, for the status line only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelHealth {
    #[default]
    Connecting,
    Connected,
    Reconnecting,
}

/// Advisory busy guard spanning both primary actions. The transition table
/// lives in `update`; a second submission while `Submitting` is rejected
/// inline before any effect is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitGuard {
    #[default]
    Idle,
    Submitting {
        placeholder: MessageId,
        action: PrimaryAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Analysis,
    BatchConfirm,
}

/// A previewed file awaiting confirmation. Discarding it needs no cleanup:
/// the preview phase has no server-side side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub path: String,
    pub new_emails: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BatchTracking {
    batch_id: String,
    progress_entry: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    timeline: Timeline,
    guard: SubmitGuard,
    pending_upload: Option<PendingUpload>,
    batch: Option<BatchTracking>,
    channel: ChannelHealth,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            entries: self
                .timeline
                .entries()
                .iter()
                .map(|entry| EntryView {
                    id: entry.id,
                    timestamp: entry.timestamp,
                    body: entry.body.clone(),
                })
                .collect(),
            busy: self.is_busy(),
            channel: self.channel,
            pending_upload: self.pending_upload.as_ref().map(|pending| PendingUploadView {
                path: pending.path.clone(),
                new_emails: pending.new_emails,
                confirmable: pending.new_emails > 0,
            }),
            watching_batch: self.batch.as_ref().map(|batch| batch.batch_id.clone()),
            dirty: self.dirty,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.guard, SubmitGuard::Submitting { .. })
    }

    pub fn guard(&self) -> SubmitGuard {
        self.guard
    }

    pub fn pending_upload(&self) -> Option<&PendingUpload> {
        self.pending_upload.as_ref()
    }

    pub fn tracked_batch(&self) -> Option<&str> {
        self.batch.as_ref().map(|batch| batch.batch_id.as_str())
    }

    pub fn channel(&self) -> ChannelHealth {
        self.channel
    }

    /// Returns the dirty flag and clears it, for render coalescing.
    pub fn consume_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }

    pub(crate) fn append(&mut self, body: MessageBody) -> MessageId {
        self.dirty = true;
        self.timeline.append(body)
    }

    pub(crate) fn remove_entry(&mut self, id: MessageId) {
        self.timeline.remove(id);
        self.dirty = true;
    }

    pub(crate) fn set_guard(&mut self, guard: SubmitGuard) {
        self.guard = guard;
        self.dirty = true;
    }

    /// Releases the guard if the given action is the one in flight, returning
    /// its placeholder id. Completions for actions that are not in flight are
    /// ignored by the caller.
    pub(crate) fn release_guard(&mut self, action: PrimaryAction) -> Option<MessageId> {
        match self.guard {
            SubmitGuard::Submitting {
                placeholder,
                action: in_flight,
            } if in_flight == action => {
                self.guard = SubmitGuard::Idle;
                self.dirty = true;
                Some(placeholder)
            }
            _ => None,
        }
    }

    pub(crate) fn set_pending_upload(&mut self, pending: PendingUpload) {
        self.pending_upload = Some(pending);
        self.dirty = true;
    }

    pub(crate) fn clear_pending_upload(&mut self) {
        if self.pending_upload.take().is_some() {
            self.dirty = true;
        }
    }

    pub(crate) fn track_batch(&mut self, batch_id: String) {
        self.batch = Some(BatchTracking {
            batch_id,
            progress_entry: None,
        });
        self.dirty = true;
    }

    pub(crate) fn is_tracking(&self, batch_id: &str) -> bool {
        self.batch
            .as_ref()
            .is_some_and(|batch| batch.batch_id == batch_id)
    }

    /// Appends the progress entry on first observation, updates it in place
    /// afterwards. The entry keeps its id and position for the whole batch.
    pub(crate) fn record_batch_progress(&mut self, summary: BatchSummary) {
        let Some(progress_entry) = self.batch.as_ref().map(|batch| batch.progress_entry) else {
            return;
        };
        self.dirty = true;
        match progress_entry {
            Some(id) => {
                self.timeline.update(id, MessageBody::SystemBatchSummary(summary));
            }
            None => {
                let id = self.timeline.append(MessageBody::SystemBatchSummary(summary));
                if let Some(batch) = self.batch.as_mut() {
                    batch.progress_entry = Some(id);
                }
            }
        }
    }

    pub(crate) fn clear_batch(&mut self) {
        if self.batch.take().is_some() {
            self.dirty = true;
        }
    }

    pub(crate) fn set_channel(&mut self, health: ChannelHealth) {
        if self.channel != health {
            self.channel = health;
            self.dirty = true;
        }
    }
}
