//! Parsing of RT REST 1.0 response text.
//!
//! Every REST response looks like this:
//!
//! ```text
//! RT/4.2.9 200 Ok
//!
//! id: ticket/123
//! Owner: Nobody
//! ```
//!
//! The free functions here handle the stable parts of that format. The
//! brittle parts (HTML markers on the login page, the position of the new
//! ticket id in a create response) sit behind [`ResponseFormat`] so they can
//! be replaced for a different RT version without touching the client.

use crate::models::RtStatus;

/// Removes the status line and the blank line after it.
///
/// Text of two lines or fewer is only trimmed.
pub fn clean_response(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() > 2 {
        lines[2..].join("\n").trim().to_string()
    } else {
        text.trim().to_string()
    }
}

/// Keeps the `Key: Value` lines of a response and joins them with newlines.
///
/// The status line has no `": "` separator, so it is dropped along with
/// blank lines and comments.
pub fn extract_fields(text: &str) -> String {
    text.trim()
        .lines()
        .filter(|line| line.contains(": "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Parses the status line at the top of a response.
pub fn response_status(text: &str) -> Option<RtStatus> {
    text.trim_start().lines().next().and_then(RtStatus::parse)
}

/// Looks up a field in extracted ticket text and returns its value.
///
/// Keys compare case-insensitively. An exact key wins; otherwise the first
/// key containing `field` is used. Missing fields yield an empty string.
pub fn field_value(info: &str, field: &str) -> String {
    let wanted = field.trim().to_lowercase();
    if wanted.is_empty() {
        return String::new();
    }

    let pairs: Vec<(String, &str)> = info
        .lines()
        .filter(|line| line.contains(": "))
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_lowercase(), value.trim()))
        .collect();

    pairs
        .iter()
        .find(|(key, _)| *key == wanted)
        .or_else(|| pairs.iter().find(|(key, _)| key.contains(&wanted)))
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

/// Returns the ticket ids of a search result (`123: Subject` lines).
pub fn ticket_ids(search_result: &str) -> Vec<String> {
    search_result
        .lines()
        .filter(|line| line.contains(": "))
        .filter_map(|line| line.split(':').next())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Returns the value of the first `Name:` line of a queue response.
pub fn queue_name(text: &str) -> Option<String> {
    text.lines()
        .filter(|line| line.contains("Name:"))
        .find_map(|line| line.trim().split(": ").nth(1))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Returns the ids of attachments whose description mentions `content_type`.
///
/// The listing starts with `Attachments: 45: (Unnamed) (text/plain / 1k),`
/// and continues with indented `46: ...` lines.
pub fn attachment_ids(text: &str, content_type: &str) -> Vec<String> {
    text.trim()
        .lines()
        .filter(|line| line.contains(content_type))
        .filter_map(|line| {
            let index = if line.to_lowercase().contains("attachments:") {
                1
            } else {
                0
            };
            line.trim().split(':').nth(index)
        })
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Drops lines that carry the `RT/` status marker, keeping everything else
/// line by line.
pub fn strip_status_lines(text: &str) -> String {
    text.trim()
        .lines()
        .filter(|line| !line.contains("RT/"))
        .fold(String::new(), |mut acc, line| {
            acc.push_str(line);
            acc.push('\n');
            acc
        })
}

/// Result of inspecting the page returned by a login POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The RT start page was returned.
    Authenticated,
    /// RT reported wrong user name or password.
    BadCredentials,
    /// The login form was returned again.
    LoginPage,
    /// None of the known markers were present.
    Unrecognized,
}

impl LoginOutcome {
    /// Returns true only for [`LoginOutcome::Authenticated`].
    pub fn is_authenticated(self) -> bool {
        self == LoginOutcome::Authenticated
    }
}

/// Detection of the version-specific markers in RT responses.
pub trait ResponseFormat: Send + Sync {
    /// Classifies the body of a login POST.
    fn login_outcome(&self, body: &str) -> LoginOutcome;

    /// Extracts the id of a newly created ticket.
    fn created_ticket_id(&self, body: &str) -> Option<String>;

    /// Returns true if the response says the object does not exist.
    fn is_missing(&self, body: &str) -> bool;
}

/// Markers used by RT 4.x.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rt4Format;

const START_PAGE_MARKER: &str = "<title>RT at a glance</title>";
const LOGIN_PAGE_MARKER: &str = "<title>Login</title>";
const BAD_CREDENTIALS_MARKER: &str = "incorrect";
const MISSING_MARKER: &str = "does not exist";

impl ResponseFormat for Rt4Format {
    fn login_outcome(&self, body: &str) -> LoginOutcome {
        if body.contains(START_PAGE_MARKER) {
            LoginOutcome::Authenticated
        } else if body.contains(BAD_CREDENTIALS_MARKER) {
            LoginOutcome::BadCredentials
        } else if body.contains(LOGIN_PAGE_MARKER) {
            LoginOutcome::LoginPage
        } else {
            LoginOutcome::Unrecognized
        }
    }

    // Third line of the body is `# Ticket <id> created.`
    fn created_ticket_id(&self, body: &str) -> Option<String> {
        body.trim()
            .lines()
            .nth(2)?
            .split(' ')
            .nth(2)
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
            .map(str::to_string)
    }

    // RT reports missing objects as a `# ... does not exist.` comment line.
    fn is_missing(&self, body: &str) -> bool {
        body.lines()
            .any(|line| line.trim_start().starts_with('#') && line.contains(MISSING_MARKER))
    }
}
