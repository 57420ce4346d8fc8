use chrono::{DateTime, Utc};

use crate::state::ChannelHealth;
use crate::timeline::{MessageBody, MessageId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub entries: Vec<EntryView>,
    pub busy: bool,
    pub channel: ChannelHealth,
    pub pending_upload: Option<PendingUploadView>,
    pub watching_batch: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryView {
    pub id: MessageId,
    pub timestamp: DateTime<Utc>,
    pub body: MessageBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUploadView {
    pub path: String,
    pub new_emails: u64,
    /// False when the preview found no new emails; confirm is unavailable.
    pub confirmable: bool,
}
