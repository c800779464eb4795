//! One-entry cache of parsed ticket information.
//!
//! Workflows read the same ticket several times in a row (owner check, then
//! field lookups), so the last ticket shown is kept. A lookup of any other
//! ticket replaces the entry.

/// Holds the extracted `Key: Value` text of at most one ticket.
#[derive(Debug, Clone, Default)]
pub struct TicketCache {
    entry: Option<(String, String)>,
}

impl TicketCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached text for `ticket_id`, if it is the cached ticket.
    pub fn get(&self, ticket_id: &str) -> Option<&str> {
        self.entry
            .as_ref()
            .filter(|(id, _)| id == ticket_id)
            .map(|(_, info)| info.as_str())
    }

    /// Replaces the cached entry.
    pub fn replace(&mut self, ticket_id: impl Into<String>, info: impl Into<String>) {
        self.entry = Some((ticket_id.into(), info.into()));
    }

    /// Drops the entry if it belongs to `ticket_id`.
    pub fn invalidate(&mut self, ticket_id: &str) {
        if self.get(ticket_id).is_some() {
            tracing::trace!(ticket_id = %ticket_id, "Invalidating cached ticket");
            self.entry = None;
        }
    }

    /// Empties the cache.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// Number of cached entries (zero or one).
    pub fn len(&self) -> usize {
        usize::from(self.entry.is_some())
    }

    /// Returns true when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
