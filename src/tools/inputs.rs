//! Tool input parameter structs for MCP tools.
//!
//! This module defines the input types for each MCP tool, with
//! JSON Schema derivation for MCP tool discovery.
//!
//! # Input Sanitization
//!
//! All input structs implement `sanitize()` which trims whitespace
//! from string fields and turns blank optional strings into `None`.
//! Message bodies keep their inner line breaks.

use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

/// Helper function to trim an optional string.
fn trim_option(s: &Option<String>) -> Option<String> {
    s.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Input parameters for the search_tickets tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchTicketsInput {
    /// RT query, e.g. `(Created > "2016-01-01") AND (CF.{Classification} = "Spam")`.
    pub query: String,
}

impl SearchTicketsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            query: self.query.trim().to_string(),
        }
    }
}

/// Input parameters for the list_open_tickets tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListOpenTicketsInput {
    /// If true, only return tickets owned by Nobody.
    #[serde(default)]
    pub unowned_only: Option<bool>,
}

/// Input parameters for tools that act on a single ticket.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TicketIdInput {
    /// The numeric ticket ID.
    pub ticket_id: String,
}

impl TicketIdInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
        }
    }
}

/// Input parameters for the get_ticket_message tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTicketMessageInput {
    /// The numeric ticket ID.
    pub ticket_id: String,

    /// Attachment content type to read (default: "text/plain").
    #[serde(default)]
    pub content_type: Option<String>,
}

impl GetTicketMessageInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            content_type: trim_option(&self.content_type),
        }
    }
}

/// Input parameters for the list_queues tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListQueuesInput {
    /// Highest queue id to probe, exclusive (default: 16, max: 256).
    #[serde(default)]
    pub max_queue_id: Option<u32>,
}

/// Input parameters for the get_user_info tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetUserInfoInput {
    /// User name or id. Defaults to the logged-in user.
    #[serde(default)]
    pub user: Option<String>,
}

impl GetUserInfoInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            user: trim_option(&self.user),
        }
    }
}

/// Input parameters for the comment_ticket tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CommentTicketInput {
    /// The numeric ticket ID.
    pub ticket_id: String,

    /// Comment text (internal, not sent to requestors).
    pub text: String,
}

impl CommentTicketInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            text: self.text.trim().to_string(),
        }
    }
}

/// Input parameters for the reply_ticket tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReplyTicketInput {
    /// The numeric ticket ID.
    pub ticket_id: String,

    /// Reply text, sent to the requestors.
    pub text: String,

    /// Additional Cc recipients.
    #[serde(default)]
    pub cc: Option<String>,

    /// Additional Bcc recipients.
    #[serde(default)]
    pub bcc: Option<String>,
}

impl ReplyTicketInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            text: self.text.trim().to_string(),
            cc: trim_option(&self.cc),
            bcc: trim_option(&self.bcc),
        }
    }
}

/// Input parameters for the create_ticket tool.
///
/// Requestor and subject are required. All other fields are optional.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTicketInput {
    /// Email address of the reporter; also stored as the Customer field.
    pub requestor: String,

    /// Ticket subject (required, max 250 characters).
    pub subject: String,

    /// Initial message body.
    #[serde(default)]
    pub text: Option<String>,

    /// Target queue (default: "Incident Reports").
    #[serde(default)]
    pub queue: Option<String>,

    /// Constituency custom field.
    #[serde(default)]
    pub constituency: Option<String>,

    /// Cc recipients.
    #[serde(default)]
    pub cc: Option<String>,

    /// AdminCc recipients.
    #[serde(default)]
    pub admin_cc: Option<String>,
}

impl CreateTicketInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            requestor: self.requestor.trim().to_string(),
            subject: self.subject.trim().to_string(),
            text: trim_option(&self.text),
            queue: trim_option(&self.queue),
            constituency: trim_option(&self.constituency),
            cc: trim_option(&self.cc),
            admin_cc: trim_option(&self.admin_cc),
        }
    }
}

/// Input parameters for the update_ticket tool.
///
/// Ticket ID is required. At least one other field must be provided.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateTicketInput {
    /// The numeric ticket ID.
    pub ticket_id: String,

    /// New owner (RT user name).
    #[serde(default)]
    pub owner: Option<String>,

    /// New queue.
    #[serde(default)]
    pub queue: Option<String>,

    /// Classification (moves the ticket to the Incidents queue).
    #[serde(default)]
    pub classification: Option<String>,

    /// IP address (moves the ticket to the Incidents queue).
    #[serde(default)]
    pub ip_address: Option<String>,

    /// Resolution custom field.
    #[serde(default)]
    pub resolution: Option<String>,
}

impl UpdateTicketInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            owner: trim_option(&self.owner),
            queue: trim_option(&self.queue),
            classification: trim_option(&self.classification),
            ip_address: trim_option(&self.ip_address),
            resolution: trim_option(&self.resolution),
        }
    }

    /// Returns true if at least one field is set for update.
    pub fn has_updates(&self) -> bool {
        self.owner.is_some()
            || self.queue.is_some()
            || self.classification.is_some()
            || self.ip_address.is_some()
            || self.resolution.is_some()
    }
}

/// Input parameters for the close_ticket tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CloseTicketInput {
    /// The numeric ticket ID.
    pub ticket_id: String,

    /// Internal comment to add before closing.
    #[serde(default)]
    pub comment: Option<String>,

    /// Classification to set before closing (requires a comment).
    #[serde(default)]
    pub classification: Option<String>,
}

impl CloseTicketInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            ticket_id: self.ticket_id.trim().to_string(),
            comment: trim_option(&self.comment),
            classification: trim_option(&self.classification),
        }
    }
}
