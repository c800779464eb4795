//! Ticket models: the known field list, new-ticket input and ownership
//! decisions.

use serde::Serialize;

/// Queue that receives newly created incident reports.
pub const INCIDENT_REPORTS_QUEUE: &str = "Incident Reports";

/// Queue that classified incidents are moved to.
pub const INCIDENTS_QUEUE: &str = "Incidents";

/// Owner name RT shows for unowned tickets.
pub const NOBODY: &str = "Nobody";

/// Ticket fields that can be looked up with `get_ticket_item`.
pub const TICKET_FIELDS: &[&str] = &[
    "id",
    "Queue",
    "Owner",
    "Creator",
    "Subject",
    "Status",
    "Priority",
    "InitialPriority",
    "FinalPriority",
    "Requestors",
    "Cc",
    "AdminCc",
    "Created",
    "Starts",
    "Started",
    "Due",
    "Resolved",
    "Told",
    "LastUpdated",
    "TimeEstimated",
    "TimeWorked",
    "TimeLeft",
    "CF.{Constituency}",
    "CF.{How Reported}",
    "CF.{Reporter Type}",
    "CF.{IP}",
    "CF.{Customer}",
    "CF.{Classification}",
    "CF.{Description}",
    "CF.{Resolution}",
    "CF.{Function}",
];

/// Returns the canonical spelling of a known ticket field, matching
/// case-insensitively and ignoring surrounding whitespace.
pub fn known_field(name: &str) -> Option<&'static str> {
    let name = name.trim();
    TICKET_FIELDS
        .iter()
        .copied()
        .find(|field| field.eq_ignore_ascii_case(name))
}

/// Input for creating a ticket.
///
/// The requestor is also recorded as the `Customer` custom field and the
/// reporter type is always `External`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTicket {
    /// Requestor (correspondent) email address.
    pub requestor: String,
    /// Ticket subject.
    pub subject: String,
    /// Initial message body. May be empty.
    pub text: String,
    /// Target queue.
    pub queue: String,
    /// `CF-Constituency` value, if any.
    pub constituency: Option<String>,
    /// Cc addresses, if any.
    pub cc: Option<String>,
    /// AdminCc addresses, if any.
    pub admin_cc: Option<String>,
}

impl NewTicket {
    /// Creates a ticket for the incident reports queue.
    pub fn new(
        requestor: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            requestor: requestor.into().trim().to_string(),
            subject: subject.into().trim().to_string(),
            text: text.into(),
            queue: INCIDENT_REPORTS_QUEUE.to_string(),
            constituency: None,
            cc: None,
            admin_cc: None,
        }
    }

    /// Sets the target queue.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Sets the constituency custom field.
    pub fn with_constituency(mut self, constituency: impl Into<String>) -> Self {
        self.constituency = non_empty(constituency.into());
        self
    }

    /// Sets the Cc addresses.
    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc = non_empty(cc.into());
        self
    }

    /// Sets the AdminCc addresses.
    pub fn with_admin_cc(mut self, admin_cc: impl Into<String>) -> Self {
        self.admin_cc = non_empty(admin_cc.into());
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// What take-or-steal decided to do for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OwnershipAction {
    /// The ticket was unowned and was taken.
    Take,
    /// Another user owned the ticket and it was stolen.
    Steal,
    /// The current user already owns the ticket; nothing was sent.
    Keep,
}

impl OwnershipAction {
    /// Decides how to claim a ticket given its current owner and the
    /// logged-in user. Names compare whole and case-insensitively.
    pub fn decide(owner: &str, user: &str) -> Self {
        let owner = owner.trim();
        let user = user.trim();

        if owner.eq_ignore_ascii_case(NOBODY) {
            OwnershipAction::Take
        } else if !owner.eq_ignore_ascii_case(user) {
            OwnershipAction::Steal
        } else {
            OwnershipAction::Keep
        }
    }
}
