//! Async engine for the domainlens client.
//!
//! Everything that touches the network lives here: the HTTP client for
//! the domain-intelligence service, single-email analysis, the two-phase
//! CSV upload, batch progress polling and the websocket push channel.
//! The engine runs on its own thread with its own tokio runtime and
//! talks to the synchronous side through plain channels.

pub mod analyze;
pub mod api;
pub mod channel;
pub mod engine;
pub mod poller;
pub mod session;
pub mod types;
pub mod upload;

pub use analyze::{is_valid_email, SingleAnalysisClient};
pub use api::{ApiClient, ApiConfig};
pub use channel::{ChannelConfig, DuplexChannel};
pub use engine::{EngineCommand, EngineConfig, EngineHandle};
pub use poller::{BatchProgressPoller, PollerConfig};
pub use session::SessionIdentity;
pub use types::{
    AnalysisResult, BatchJob, BatchStatus, ChatEnvelope, ClientError, ConfirmAck, EmailPreview,
    EngineEvent, EnvelopeRole, PreviewStats, SectorLabel, UploadAck,
};
pub use upload::{
    validate_upload_file, BatchUploadController, DEFAULT_BATCH_CONCURRENCY, MAX_UPLOAD_BYTES,
    SMALL_BATCH_LIMIT, UPLOAD_EXTENSION,
};
