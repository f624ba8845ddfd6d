use std::collections::HashMap;

use insight_core::Statement;
use tracing::warn;

/// Handle for an extraction that has been started but not yet finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

/// The statements a user is currently looking at.
///
/// Only the action that started an extraction applies its result. A result
/// whose pending entry was discarded (statement removed or session reset
/// while in flight) is dropped instead of applied.
#[derive(Debug, Default)]
pub struct Session {
    statements: Vec<Statement>,
    pending: HashMap<PendingId, String>,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn begin(&mut self, file_name: impl Into<String>) -> PendingId {
        let id = PendingId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, file_name.into());
        id
    }

    /// Applies a finished extraction. Returns `false` when the pending entry
    /// no longer exists and the statement was dropped.
    pub fn complete(&mut self, id: PendingId, statement: Statement) -> bool {
        if self.pending.remove(&id).is_none() {
            warn!(file = %statement.file_name, "ignoring result for a discarded statement");
            return false;
        }
        self.statements.push(statement);
        true
    }

    /// Forgets a pending extraction, on failure or on user removal.
    pub fn discard(&mut self, id: PendingId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Appends a whole batch at once, preserving its order.
    pub fn commit_batch(&mut self, statements: Vec<Statement>) {
        self.statements.extend(statements);
    }

    pub fn remove(&mut self, index: usize) -> Option<Statement> {
        (index < self.statements.len()).then(|| self.statements.remove(index))
    }

    /// Drops every statement and every in-flight extraction.
    pub fn reset(&mut self) {
        self.statements.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stmt(name: &str) -> Statement {
        Statement::new(name, "digest", vec![])
    }

    #[test]
    fn complete_applies_pending_result() {
        let mut s = Session::new();
        let id = s.begin("jan.pdf");
        assert_eq!(s.pending_count(), 1);
        assert!(s.complete(id, stmt("jan.pdf")));
        assert_eq!(s.len(), 1);
        assert_eq!(s.pending_count(), 0);
    }

    #[test]
    fn discarded_result_is_ignored() {
        let mut s = Session::new();
        let id = s.begin("jan.pdf");
        assert!(s.discard(id));
        assert!(!s.complete(id, stmt("jan.pdf")));
        assert!(s.is_empty());
    }

    #[test]
    fn reset_drops_in_flight_results() {
        let mut s = Session::new();
        s.commit_batch(vec![stmt("a.pdf")]);
        let id = s.begin("b.pdf");
        s.reset();
        assert!(!s.complete(id, stmt("b.pdf")));
        assert!(s.is_empty());
    }

    #[test]
    fn ids_are_not_reused_after_reset() {
        let mut s = Session::new();
        let old = s.begin("a.pdf");
        s.reset();
        let new = s.begin("b.pdf");
        assert_ne!(old, new);
        assert!(!s.complete(old, stmt("a.pdf")));
        assert!(s.complete(new, stmt("b.pdf")));
    }

    #[test]
    fn commit_batch_keeps_order_and_remove_by_index() {
        let mut s = Session::new();
        s.commit_batch(vec![stmt("a.pdf"), stmt("b.pdf"), stmt("c.pdf")]);
        assert_eq!(s.remove(1).map(|st| st.file_name), Some("b.pdf".to_string()));
        assert!(s.remove(5).is_none());
        let names: Vec<&str> = s.statements().iter().map(|st| st.file_name.as_str()).collect();
        assert_eq!(names, ["a.pdf", "c.pdf"]);
    }
}
