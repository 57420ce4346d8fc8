use chrono::{DateTime, Utc};

use crate::state::{AnalysisReport, BatchSummary};

pub type MessageId = u64;

/// One conversation entry. Closed over every shape a consumer can meet,
/// so rendering and tests pattern-match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Text the local user submitted.
    UserText(String),
    /// Plain text from the service or the orchestrator.
    SystemText(String),
    /// A completed single-email analysis.
    SystemAnalysis(AnalysisReport),
    /// Progress or final snapshot of a batch job.
    SystemBatchSummary(BatchSummary),
    /// Transient placeholder for an in-flight submission.
    Loading(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: MessageId,
    pub timestamp: DateTime<Utc>,
    pub body: MessageBody,
}

/// Ordered, mutable log of conversation entries.
///
/// Ids are assigned monotonically and are unique for the lifetime of the
/// timeline. Append order is the only ordering signal; entries never move
/// after insertion, they can only be removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    next_id: MessageId,
    entries: Vec<Entry>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new entry and returns its id.
    pub fn append(&mut self, body: MessageBody) -> MessageId {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Entry {
            id,
            timestamp: Utc::now(),
            body,
        });
        id
    }

    /// Replaces the body of an existing entry, preserving its id and its
    /// position in iteration order. Returns false when the id is unknown.
    pub fn update(&mut self, id: MessageId, body: MessageBody) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.body = body;
                true
            }
            None => false,
        }
    }

    /// Removes an entry. Removing a nonexistent id is a no-op.
    pub fn remove(&mut self, id: MessageId) {
        self.entries.retain(|entry| entry.id != id);
    }

    pub fn get(&self, id: MessageId) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of `Loading` placeholders currently present.
    pub fn loading_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.body, MessageBody::Loading(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageBody, Timeline};

    #[test]
    fn append_assigns_monotonic_unique_ids() {
        let mut timeline = Timeline::new();
        let a = timeline.append(MessageBody::UserText("one".into()));
        let b = timeline.append(MessageBody::UserText("two".into()));
        assert!(b > a);
        let ids: Vec<_> = timeline.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn update_preserves_id_and_position() {
        let mut timeline = Timeline::new();
        let first = timeline.append(MessageBody::SystemText("first".into()));
        let middle = timeline.append(MessageBody::SystemText("progress 1".into()));
        let last = timeline.append(MessageBody::SystemText("last".into()));

        assert!(timeline.update(middle, MessageBody::SystemText("progress 2".into())));

        let ids: Vec<_> = timeline.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, middle, last]);
        assert_eq!(
            timeline.get(middle).map(|e| &e.body),
            Some(&MessageBody::SystemText("progress 2".into()))
        );
    }

    #[test]
    fn update_unknown_id_reports_false() {
        let mut timeline = Timeline::new();
        assert!(!timeline.update(99, MessageBody::SystemText("ghost".into())));
    }

    #[test]
    fn remove_missing_id_is_a_noop() {
        let mut timeline = Timeline::new();
        let id = timeline.append(MessageBody::Loading("working".into()));
        timeline.remove(id + 1);
        assert_eq!(timeline.len(), 1);
        timeline.remove(id);
        assert!(timeline.is_empty());
        timeline.remove(id);
        assert!(timeline.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut timeline = Timeline::new();
        let first = timeline.append(MessageBody::Loading("working".into()));
        timeline.remove(first);
        let second = timeline.append(MessageBody::SystemText("done".into()));
        assert!(second > first);
    }
}
