//! MCP server implementation for the RTIR client.
//!
//! This module defines the `RtirServer` struct that implements the MCP
//! `ServerHandler` trait, exposing RT / RTIR ticket operations as tools.
//! All tools share one [`RtirClient`]; calls are serialized by a mutex and
//! the session is established lazily on the first tool call.

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::RtirError;
use crate::models::{NewTicket, OwnershipAction, QueueSummary, DEFAULT_MAX_QUEUE_ID};
use crate::rt_client::{RtirClient, DEFAULT_MESSAGE_CONTENT_TYPE};
use crate::tools::{
    CloseTicketInput, CommentTicketInput, CreateTicketInput, GetTicketMessageInput,
    GetUserInfoInput, ListOpenTicketsInput, ListQueuesInput, ReplyTicketInput,
    SearchTicketsInput, TicketIdInput, UpdateTicketInput,
};

/// Upper bound for queue enumeration requested through the tool.
const MAX_QUEUE_PROBE: u32 = 256;

/// Maximum subject length accepted by create_ticket.
const MAX_SUBJECT_LENGTH: usize = 250;

/// The RTIR MCP server.
#[derive(Clone)]
pub struct RtirServer {
    /// Shared RT client; one session for all tools.
    client: Arc<Mutex<RtirClient>>,
    /// Tool router for MCP tool dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RtirServer {
    /// Creates a new server around a (possibly logged-out) client.
    pub fn new(client: RtirClient) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
            tool_router: Self::tool_router(),
        }
    }

    /// Returns "pong"; verifies the server is running.
    #[tool(description = "Test connectivity to the RTIR MCP server. Returns 'pong' if the server is running correctly.")]
    fn ping(&self) -> String {
        tracing::debug!("ping tool called");
        "pong".to_string()
    }

    /// Searches tickets with an RT query.
    #[tool(description = "Search RT tickets with an RT query such as (Status='open' AND Queue='Incidents'). Returns ticket IDs and subjects.")]
    async fn search_tickets(
        &self,
        Parameters(input): Parameters<SearchTicketsInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(query = %input.query, "search_tickets tool called");

        if input.query.is_empty() {
            return Err("Query is required and cannot be empty.".to_string());
        }

        let client = self.client().await?;
        let result = client
            .search_tickets(&input.query)
            .await
            .map_err(|e| tool_error(&client, "search tickets", &e))?;

        Ok(format_search_result(&result))
    }

    /// Lists new and open tickets, optionally only unowned ones.
    #[tool(description = "List tickets with status new or open. Set unowned_only to list only tickets owned by Nobody.")]
    async fn list_open_tickets(
        &self,
        Parameters(input): Parameters<ListOpenTicketsInput>,
    ) -> Result<String, String> {
        tracing::debug!(?input, "list_open_tickets tool called");

        let client = self.client().await?;
        let result = if input.unowned_only.unwrap_or(false) {
            client.get_all_nobody_tickets().await
        } else {
            client.get_all_new_open_tickets().await
        }
        .map_err(|e| tool_error(&client, "list open tickets", &e))?;

        Ok(format_search_result(&result))
    }

    /// Shows all fields of a ticket.
    #[tool(description = "Get all fields of a single ticket: queue, owner, status, subject, requestors, dates and custom fields.")]
    async fn get_ticket(
        &self,
        Parameters(input): Parameters<TicketIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "get_ticket tool called");

        let mut client = self.client().await?;
        let info = client
            .get_ticket_info(&input.ticket_id)
            .await
            .map_err(|e| tool_error(&client, &format!("get ticket {}", input.ticket_id), &e))?;

        Ok(format_ticket_details(&input.ticket_id, &info))
    }

    /// Returns the fields of a ticket as a JSON object.
    #[tool(description = "Get the fields of a single ticket as a JSON object keyed by field name.")]
    async fn get_ticket_fields(
        &self,
        Parameters(input): Parameters<TicketIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "get_ticket_fields tool called");

        let mut client = self.client().await?;
        let info = client
            .get_ticket_info(&input.ticket_id)
            .await
            .map_err(|e| tool_error(&client, &format!("get ticket {}", input.ticket_id), &e))?;

        fields_to_json(&info).map_err(|e| tool_error(&client, "encode ticket fields", &e))
    }

    /// Reads the primary message of a ticket.
    #[tool(description = "Get the message body of a ticket (the last attachment of the given content type, default text/plain).")]
    async fn get_ticket_message(
        &self,
        Parameters(input): Parameters<GetTicketMessageInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "get_ticket_message tool called");

        let content_type = input
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_MESSAGE_CONTENT_TYPE);

        let client = self.client().await?;
        let message = client
            .get_ticket_message(&input.ticket_id, content_type)
            .await
            .map_err(|e| {
                tool_error(&client, &format!("get message of ticket {}", input.ticket_id), &e)
            })?;

        if message.is_empty() {
            return Ok(format!(
                "Ticket #{} has no {} message.",
                input.ticket_id, content_type
            ));
        }

        Ok(truncate_text(&message, MAX_MESSAGE_LENGTH))
    }

    /// Lists queues by probing queue ids.
    #[tool(description = "List RT queues with their IDs. Probes queue IDs from 0 up to max_queue_id (default 16).")]
    async fn list_queues(
        &self,
        Parameters(input): Parameters<ListQueuesInput>,
    ) -> Result<String, String> {
        tracing::debug!(?input, "list_queues tool called");

        let max = input
            .max_queue_id
            .unwrap_or(DEFAULT_MAX_QUEUE_ID)
            .min(MAX_QUEUE_PROBE);

        let client = self.client().await?;
        let queues = client
            .get_all_queues(max)
            .await
            .map_err(|e| tool_error(&client, "list queues", &e))?;

        Ok(format_queue_list(&queues))
    }

    /// Shows an RT user.
    #[tool(description = "Get information about an RT user. Defaults to the logged-in user.")]
    async fn get_user_info(
        &self,
        Parameters(input): Parameters<GetUserInfoInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(?input, "get_user_info tool called");

        let client = self.client().await?;
        let info = client
            .get_user_info(input.user.as_deref().unwrap_or(""))
            .await
            .map_err(|e| tool_error(&client, "get user info", &e))?;

        if info.is_empty() {
            return Ok("No user information returned.".to_string());
        }
        Ok(info)
    }

    // ========================================================================
    // Write tools
    // ========================================================================

    /// Takes or steals a ticket for the logged-in user.
    #[tool(description = "Claim a ticket for the logged-in user: takes it if unowned, steals it if owned by someone else.")]
    async fn take_ticket(
        &self,
        Parameters(input): Parameters<TicketIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "take_ticket tool called");

        let mut client = self.client().await?;
        let action = client
            .take_or_steal_ticket(&input.ticket_id)
            .await
            .map_err(|e| tool_error(&client, &format!("take ticket {}", input.ticket_id), &e))?;

        Ok(format_ownership_result(&input.ticket_id, action))
    }

    /// Adds an internal comment.
    #[tool(description = "Add an internal comment to a ticket. Comments are not sent to the requestors.")]
    async fn comment_ticket(
        &self,
        Parameters(input): Parameters<CommentTicketInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "comment_ticket tool called");

        if input.text.is_empty() {
            return Err("Comment text is required and cannot be empty.".to_string());
        }

        let mut client = self.client().await?;
        let result = client
            .comment_ticket(&input.ticket_id, &input.text)
            .await
            .map_err(|e| {
                tool_error(&client, &format!("comment on ticket {}", input.ticket_id), &e)
            })?;

        Ok(format_mutation_result(&input.ticket_id, "Comment added", &result))
    }

    /// Sends a reply to the requestors.
    #[tool(description = "Reply to the requestors of a ticket by email through RT. Optional cc and bcc add recipients.")]
    async fn reply_ticket(
        &self,
        Parameters(input): Parameters<ReplyTicketInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "reply_ticket tool called");

        if input.text.is_empty() {
            return Err("Reply text is required and cannot be empty.".to_string());
        }

        let mut client = self.client().await?;
        let result = client
            .reply_ticket(
                &input.ticket_id,
                &input.text,
                input.cc.as_deref(),
                input.bcc.as_deref(),
            )
            .await
            .map_err(|e| tool_error(&client, &format!("reply to ticket {}", input.ticket_id), &e))?;

        Ok(format_mutation_result(&input.ticket_id, "Reply sent", &result))
    }

    /// Creates an incident report.
    #[tool(description = "Create a ticket (default queue: Incident Reports) owned by the logged-in user. Requestor and subject are required.")]
    async fn create_ticket(
        &self,
        Parameters(input): Parameters<CreateTicketInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(subject = %input.subject, "create_ticket tool called");

        if input.requestor.is_empty() {
            return Err("Requestor is required and cannot be empty.".to_string());
        }
        if input.subject.is_empty() {
            return Err("Subject is required and cannot be empty.".to_string());
        }
        if input.subject.chars().count() > MAX_SUBJECT_LENGTH {
            return Err(format!(
                "Subject exceeds maximum length of {} characters (got {} characters).",
                MAX_SUBJECT_LENGTH,
                input.subject.chars().count()
            ));
        }

        let mut ticket = NewTicket::new(
            input.requestor.as_str(),
            input.subject.as_str(),
            input.text.clone().unwrap_or_default(),
        );
        if let Some(queue) = &input.queue {
            ticket = ticket.with_queue(queue.as_str());
        }
        if let Some(constituency) = &input.constituency {
            ticket = ticket.with_constituency(constituency.as_str());
        }
        if let Some(cc) = &input.cc {
            ticket = ticket.with_cc(cc.as_str());
        }
        if let Some(admin_cc) = &input.admin_cc {
            ticket = ticket.with_admin_cc(admin_cc.as_str());
        }

        let mut client = self.client().await?;
        let ticket_id = client
            .create_ticket(&ticket)
            .await
            .map_err(|e| tool_error(&client, "create ticket", &e))?;

        Ok(format_create_result(&ticket_id, &ticket))
    }

    /// Updates owner, queue and incident fields.
    #[tool(description = "Update a ticket's owner, queue, classification, IP address or resolution. Ticket ID and at least one field are required.")]
    async fn update_ticket(
        &self,
        Parameters(input): Parameters<UpdateTicketInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "update_ticket tool called");

        if !input.has_updates() {
            return Err(
                "At least one field must be provided for update (owner, queue, classification, ip_address, or resolution).".to_string()
            );
        }

        let id = input.ticket_id.as_str();
        let mut client = self.client().await?;
        let mut outcomes = Vec::new();

        // Each field is a separate RT edit; later ones still run after a failure.
        if let Some(owner) = &input.owner {
            let result = client.set_ticket_owner(id, owner).await;
            outcomes.push(update_outcome(&client, "Owner", result));
        }
        if let Some(queue) = &input.queue {
            let result = client.set_ticket_queue(id, queue).await;
            outcomes.push(update_outcome(&client, "Queue", result));
        }
        if let Some(classification) = &input.classification {
            let result = client.set_ticket_classification(id, classification).await;
            outcomes.push(update_outcome(&client, "Classification", result));
        }
        if let Some(ip_address) = &input.ip_address {
            let result = client.set_ticket_ip(id, ip_address).await;
            outcomes.push(update_outcome(&client, "IP", result));
        }
        if let Some(resolution) = &input.resolution {
            let result = client.set_ticket_resolution(id, resolution).await;
            outcomes.push(update_outcome(&client, "Resolution", result));
        }

        format_update_report(id, &outcomes)
    }

    /// Closes (resolves) a ticket.
    #[tool(description = "Close (resolve) a ticket. With a comment, the ticket is claimed and commented first; with a comment and classification it is also classified in the Incidents queue.")]
    async fn close_ticket(
        &self,
        Parameters(input): Parameters<CloseTicketInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "close_ticket tool called");

        let id = input.ticket_id.as_str();
        let mut client = self.client().await?;

        let result = match (&input.comment, &input.classification) {
            (Some(comment), Some(classification)) => {
                client
                    .take_comment_classify_close_ticket(id, comment, classification)
                    .await
            }
            (Some(comment), None) => client.take_comment_close_ticket(id, comment).await,
            (None, Some(_)) => {
                return Err("A classification can only be set together with a comment.".to_string())
            }
            (None, None) => client.close_ticket(id).await,
        }
        .map_err(|e| tool_error(&client, &format!("close ticket {}", id), &e))?;

        Ok(format_mutation_result(id, "Ticket resolved", &result))
    }

    /// Reopens a ticket.
    #[tool(description = "Reopen a resolved ticket (status open). The ticket is claimed for the logged-in user first.")]
    async fn reopen_ticket(
        &self,
        Parameters(input): Parameters<TicketIdInput>,
    ) -> Result<String, String> {
        let input = input.sanitize();
        tracing::debug!(ticket_id = %input.ticket_id, "reopen_ticket tool called");

        let mut client = self.client().await?;
        let result = client
            .reopen_ticket(&input.ticket_id)
            .await
            .map_err(|e| tool_error(&client, &format!("reopen ticket {}", input.ticket_id), &e))?;

        Ok(format_mutation_result(&input.ticket_id, "Ticket reopened", &result))
    }

    /// Locks the shared client, logging in first if needed.
    async fn client(&self) -> Result<MutexGuard<'_, RtirClient>, String> {
        let mut client = self.client.lock().await;

        if !client.is_logged_in() {
            match client.login().await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(
                        "Login to RT was rejected - check RTIR_USER and RTIR_PASSWORD.".to_string(),
                    )
                }
                Err(e) => return Err(tool_error(&client, "log in to RT", &e)),
            }
        }

        Ok(client)
    }
}

#[tool_handler]
impl ServerHandler for RtirServer {
    /// Returns server information for the MCP initialize handshake.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "This server gives access to RT / RTIR incident tickets. \
                 Use list_open_tickets or search_tickets to find tickets, get_ticket \
                 and get_ticket_message for details, list_queues and get_user_info \
                 for context. Claim tickets with take_ticket, answer with reply_ticket \
                 or comment_ticket, change fields with update_ticket, and finish with \
                 close_ticket. Create incident reports with create_ticket. \
                 Start with 'ping' to verify connectivity."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Logs a failed tool call and returns the sanitized message for the caller.
fn tool_error(client: &RtirClient, action: &str, error: &RtirError) -> String {
    let sanitized = error.sanitized_display(client.secret_for_sanitization());
    tracing::error!(error = %sanitized, action = %action, "Tool call failed");
    format!("Failed to {}: {}", action, sanitized)
}

/// Result of one field edit within update_ticket.
struct UpdateOutcome {
    field: &'static str,
    result: Result<String, String>,
}

fn update_outcome(
    client: &RtirClient,
    field: &'static str,
    result: Result<String, RtirError>,
) -> UpdateOutcome {
    UpdateOutcome {
        field,
        result: result
            .map(|response| first_line(&response).to_string())
            .map_err(|e| tool_error(client, &format!("update {}", field.to_lowercase()), &e)),
    }
}

// ============================================================================
// Response formatting helpers
// ============================================================================

/// Maximum length for message bodies before truncation.
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Truncates a string if it exceeds the maximum length.
///
/// If truncated, appends "... [truncated]" to indicate the content was cut.
fn truncate_text(text: &str, max_length: usize) -> String {
    if text.len() <= max_length {
        return text.to_string();
    }

    let mut end = max_length.saturating_sub(15);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    if let Some(space_pos) = text[..end].rfind(char::is_whitespace) {
        end = space_pos;
    }
    format!("{}... [truncated]", &text[..end])
}

fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

/// Formats `id: Subject` search lines.
fn format_search_result(result: &str) -> String {
    let lines: Vec<&str> = result.lines().filter(|l| l.contains(": ")).collect();
    if lines.is_empty() {
        return "No tickets found matching the query.".to_string();
    }

    let mut output = format!("Found {} ticket(s):\n\n", lines.len());
    for line in lines {
        if let Some((id, subject)) = line.split_once(':') {
            output.push_str(&format!("#{} - {}\n", id.trim(), subject.trim()));
        }
    }
    output
}

/// Formats the extracted fields of a ticket.
fn format_ticket_details(ticket_id: &str, info: &str) -> String {
    let subject = crate::parser::field_value(info, "Subject");

    let mut output = format!("Ticket #{}: {}\n", ticket_id, subject);
    output.push_str(&"=".repeat(60));
    output.push('\n');
    for line in info.lines() {
        output.push_str(line);
        output.push('\n');
    }
    output
}

/// Converts extracted `Key: Value` lines into a JSON object.
fn fields_to_json(info: &str) -> Result<String, RtirError> {
    let map: serde_json::Map<String, serde_json::Value> = info
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| {
            (
                key.trim().to_string(),
                serde_json::Value::String(value.trim().to_string()),
            )
        })
        .collect();
    Ok(serde_json::to_string_pretty(&map)?)
}

fn format_queue_list(queues: &[QueueSummary]) -> String {
    if queues.is_empty() {
        return "No queues found.".to_string();
    }

    let mut output = format!("Found {} queue(s):\n\n", queues.len());
    for queue in queues {
        output.push_str(&format!("ID: {} | Name: {}\n", queue.id, queue.name));
    }
    output
}

/// Lists applied and failed fields together. Fails only when nothing was
/// applied.
fn format_update_report(ticket_id: &str, outcomes: &[UpdateOutcome]) -> Result<String, String> {
    let applied = outcomes.iter().filter(|o| o.result.is_ok()).count();

    let mut output = format!(
        "Updated ticket #{} ({} of {} field(s) applied):\n",
        ticket_id,
        applied,
        outcomes.len()
    );
    for outcome in outcomes {
        match &outcome.result {
            Ok(detail) if detail.is_empty() => {
                output.push_str(&format!("  {}: applied\n", outcome.field));
            }
            Ok(detail) => {
                output.push_str(&format!("  {}: applied ({})\n", outcome.field, detail));
            }
            Err(error) => {
                output.push_str(&format!("  {}: FAILED - {}\n", outcome.field, error));
            }
        }
    }

    if applied == 0 {
        Err(output)
    } else {
        Ok(output)
    }
}

fn format_ownership_result(ticket_id: &str, action: OwnershipAction) -> String {
    match action {
        OwnershipAction::Take => format!("Took unowned ticket #{}.", ticket_id),
        OwnershipAction::Steal => format!("Stole ticket #{} from its previous owner.", ticket_id),
        OwnershipAction::Keep => format!("Ticket #{} is already yours; nothing to do.", ticket_id),
    }
}

fn format_mutation_result(ticket_id: &str, summary: &str, response: &str) -> String {
    // Edits come back already cleaned; take/comment still carry the status line.
    let detail = if crate::parser::response_status(response).is_some() {
        crate::parser::clean_response(response)
    } else {
        response.trim().to_string()
    };
    if detail.is_empty() {
        format!("{} on ticket #{}.", summary, ticket_id)
    } else {
        format!("{} on ticket #{}.\n\nRT: {}", summary, ticket_id, detail)
    }
}

fn format_create_result(ticket_id: &str, ticket: &NewTicket) -> String {
    let mut output = format!(
        "Successfully created ticket #{}: {}\n\n",
        ticket_id, ticket.subject
    );
    output.push_str(&format!("Queue: {}\n", ticket.queue));
    output.push_str(&format!("Requestor: {}\n", ticket.requestor));
    output.push_str("\nNext steps:\n");
    output.push_str(&format!(
        "  - View details: use get_ticket with ticket_id=\"{}\"\n",
        ticket_id
    ));
    output.push_str(&format!(
        "  - Answer the reporter: use reply_ticket with ticket_id=\"{}\"\n",
        ticket_id
    ));
    output
}
