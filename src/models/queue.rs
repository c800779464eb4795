//! Queue models.

use std::fmt;

use serde::Serialize;

/// Default upper bound (exclusive) for queue id enumeration.
pub const DEFAULT_MAX_QUEUE_ID: u32 = 16;

/// A queue found while enumerating queue ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSummary {
    /// Numeric queue id.
    pub id: u32,
    /// Queue name (`Incident Reports`, `Incidents`, ...).
    pub name: String,
}

impl fmt::Display for QueueSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.id, self.name)
    }
}
