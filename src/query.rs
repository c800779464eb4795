//! Form payloads for RT ticket mutations.
//!
//! RT reads mutations from a single `content` form field holding
//! newline-separated `Key: Value` lines. Multi-line values continue on lines
//! that start with a space.

use std::fmt;

use crate::models::{NewTicket, INCIDENTS_QUEUE};

/// Name of the form field that carries the payload.
pub const CONTENT_FIELD: &str = "content";

/// A `Key: Value` payload under construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    lines: Vec<String>,
}

impl Content {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single-line field. Surrounding whitespace is trimmed and
    /// line breaks are folded into spaces, since RT reads every line of
    /// the payload as a field of its own.
    pub fn field(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.lines.push(format!("{}: {}", key, single_line(value.as_ref())));
        self
    }

    /// Appends a field only when the value is present and not blank.
    pub fn optional(self, key: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// Appends a multi-line text field using RT's continuation rule.
    pub fn text(mut self, key: &str, body: &str) -> Self {
        self.lines.push(format!("{}: {}", key, format_text(body)));
        self
    }

    /// Returns true when no field was added.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Renders the payload, one field per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Returns the `(content, payload)` pair to send as a form body.
    pub fn to_form(&self) -> [(&'static str, String); 1] {
        [(CONTENT_FIELD, self.render())]
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Formats a message body: trimmed, continuation lines indented by one
/// space. The trailing newline is added by [`Content::render`].
pub fn format_text(body: &str) -> String {
    body.trim()
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\n ")
}

fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Action: take` for an unowned ticket.
pub fn take() -> Content {
    Content::new().field("Action", "take")
}

/// `Action: steal` for a ticket owned by someone else.
pub fn steal() -> Content {
    Content::new().field("Action", "steal")
}

/// Internal comment, not sent to requestors.
pub fn comment(ticket_id: &str, text: &str) -> Content {
    Content::new()
        .field("id", ticket_id)
        .field("Action", "comment")
        .text("Text", text)
}

/// Reply sent to requestors, with optional extra recipients.
pub fn correspond(ticket_id: &str, text: &str, cc: Option<&str>, bcc: Option<&str>) -> Content {
    Content::new()
        .field("id", ticket_id)
        .field("Action", "correspond")
        .text("Text", text)
        .optional("Cc", cc)
        .optional("Bcc", bcc)
}

/// Payload for `ticket/new`. The owner is the logged-in user.
pub fn create(ticket: &NewTicket, owner: &str) -> Content {
    Content::new()
        .field("id", "ticket/new")
        .field("Queue", &ticket.queue)
        .field("Requestor", &ticket.requestor)
        .field("Owner", owner)
        .optional("Cc", ticket.cc.as_deref())
        .optional("AdminCc", ticket.admin_cc.as_deref())
        .field("Subject", &ticket.subject)
        .text("Text", &ticket.text)
        .field("CF-Customer", &ticket.requestor)
        .field("CF-Reporter Type", "External")
        .optional("CF-Constituency", ticket.constituency.as_deref())
}

/// Assigns the ticket to `owner`.
pub fn set_owner(ticket_id: &str, owner: &str) -> Content {
    Content::new().field("id", ticket_id).field("Owner", owner)
}

/// Sets the resolution custom field.
pub fn set_resolution(resolution: &str) -> Content {
    Content::new().field("CF-Resolution", resolution)
}

/// Moves the ticket to another queue.
pub fn set_queue(queue: &str) -> Content {
    Content::new().field("Queue", queue)
}

/// Classification lives on incidents, so the ticket moves there too.
pub fn set_classification(classification: &str) -> Content {
    Content::new()
        .field("Queue", INCIDENTS_QUEUE)
        .field("CF-Classification", classification)
}

/// The IP custom field lives on incidents, so the ticket moves there too.
pub fn set_ip(ip_address: &str) -> Content {
    Content::new()
        .field("Queue", INCIDENTS_QUEUE)
        .field("CF-IP", ip_address)
}

/// `Status: open`.
pub fn reopen() -> Content {
    Content::new().field("Status", "open")
}

/// `Status: resolved`.
pub fn close() -> Content {
    Content::new().field("Status", "resolved")
}
