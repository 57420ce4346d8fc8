//! Domainlens core: pure state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod timeline;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AnalysisReport, AppState, BatchPhase, BatchSummary, ChannelHealth, ConfirmOutcome,
    EnvelopeRole, PendingUpload, PreviewSummary, PrimaryAction, SectorLabels, SubmitGuard,
    MAX_UPLOAD_BYTES, SMALL_BATCH_LIMIT, UPLOAD_EXTENSION,
};
pub use timeline::{Entry, MessageBody, MessageId, Timeline};
pub use update::{has_supported_extension, is_valid_email, update};
pub use view_model::{AppViewModel, EntryView, PendingUploadView};
