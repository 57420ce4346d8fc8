use uuid::Uuid;

/// Opaque token scoping one conversation and its push channel.
///
/// Generated once per process; every request and the websocket subscription
/// carry the same identity so server pushes land in the right session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    id: String,
}

impl SessionIdentity {
    /// Mints a fresh, time-ordered session id.
    pub fn generate() -> Self {
        Self {
            id: format!("sess_{}", Uuid::now_v7().simple()),
        }
    }

    /// Wraps an externally supplied id (tests, resumed sessions).
    pub fn from_id(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Short suffix for log lines; the full id stays out of routine logs.
    pub fn short_label(&self) -> &str {
        let len = self.id.len();
        &self.id[len.saturating_sub(8)..]
    }
}
