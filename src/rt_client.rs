//! HTTP client for the RT / RTIR REST 1.0 interface.
//!
//! This module provides the `RtirClient` struct: it owns the session
//! (credentials, cookie jar, login flag), the one-entry ticket cache, and
//! every single-request operation on tickets, queues, users and searches.
//! Multi-step workflows live in [`crate::workflow`].
//!
//! # Authentication
//!
//! RT hands out a session cookie when the login form is posted to the base
//! URL. The cookie is kept in the HTTP client's cookie jar; basic
//! credentials are sent as well for installations that use external auth.
//! Every operation except `login` requires an established session and
//! returns `RtirError::NotLoggedIn` otherwise, without touching the network.
//!
//! # Security
//!
//! The password is never logged. HTTP error bodies are sanitized and
//! truncated before they are wrapped in an error.

use reqwest::{header, Client, Method, StatusCode};

use crate::cache::TicketCache;
use crate::config::Config;
use crate::error::RtirError;
use crate::models::{known_field, NewTicket, QueueSummary};
use crate::parser::{self, LoginOutcome, ResponseFormat, Rt4Format};
use crate::query::{self, Content};
use crate::session::{Credentials, Session};

/// Path prefix of the REST 1.0 interface.
const REST_PREFIX: &str = "/REST/1.0";

/// Content type of the primary message of a ticket.
pub const DEFAULT_MESSAGE_CONTENT_TYPE: &str = "text/plain";

/// Search for unowned tickets that still need work.
pub const NOBODY_TICKETS_QUERY: &str = "(Owner='Nobody' AND (Status='new' OR Status='open'))";

/// Search for all tickets that still need work.
pub const NEW_OPEN_TICKETS_QUERY: &str = "(Status='new' OR Status='open')";

/// Maximum length for HTTP error response bodies kept in errors.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Client for one RT session.
///
/// Operations that change session or cache state take `&mut self`; the
/// client is meant for sequential use by a single caller.
///
/// # Example
///
/// ```ignore
/// let config = Config::new("analyst", "secret", "https://rtir.example.com")?;
/// let mut client = RtirClient::new(config)?;
///
/// if client.login().await? {
///     let owner = client.get_ticket_owner("123").await?;
///     println!("owner: {}", owner);
///     client.logout().await?;
/// }
/// ```
pub struct RtirClient {
    /// The underlying HTTP client; holds the session cookie jar.
    http: Client,

    /// Connection settings used to rebuild `http` after logout.
    config: Config,

    /// Credentials and login state.
    session: Session,

    /// Last ticket shown.
    cache: TicketCache,

    /// Version-specific response markers.
    format: Box<dyn ResponseFormat>,
}

impl RtirClient {
    /// Creates a logged-out client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `RtirError::HttpClient` if the HTTP client fails to initialize
    /// (for example an invalid proxy).
    pub fn new(config: Config) -> Result<Self, RtirError> {
        if config.accept_invalid_certs {
            tracing::warn!(
                base_url = %config.base_url,
                "TLS certificate verification is disabled"
            );
        }

        let http = Self::build_http(&config)?;
        let credentials = Credentials::new(config.user.clone(), config.password());
        let session = Session::new(credentials, config.base_url.clone());

        Ok(Self {
            http,
            config,
            session,
            cache: TicketCache::new(),
            format: Box::new(Rt4Format),
        })
    }

    /// Replaces the response marker detection.
    #[must_use]
    pub fn with_format(mut self, format: Box<dyn ResponseFormat>) -> Self {
        self.format = format;
        self
    }

    fn build_http(config: &Config) -> Result<Client, RtirError> {
        let mut headers = header::HeaderMap::new();
        let referer = header::HeaderValue::from_str(&config.base_url)
            .map_err(|_| RtirError::invalid_config("base URL is not a valid header value"))?;
        headers.insert(header::REFERER, referer);

        let mut builder = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        for (scheme, proxy_url) in &config.proxies {
            let proxy = match scheme.as_str() {
                "http" => reqwest::Proxy::http(proxy_url.as_str()),
                "https" => reqwest::Proxy::https(proxy_url.as_str()),
                _ => reqwest::Proxy::all(proxy_url.as_str()),
            }
            .map_err(RtirError::HttpClient)?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(RtirError::HttpClient)
    }

    /// Returns the session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns true once RT accepted the credentials.
    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Returns the ticket cache.
    pub fn cache(&self) -> &TicketCache {
        &self.cache
    }

    /// Returns the configuration the client was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the secret to strip from error messages.
    ///
    /// This should ONLY be used for sanitizing error messages, never for logging.
    pub(crate) fn secret_for_sanitization(&self) -> &str {
        self.session
            .credentials()
            .map(Credentials::password)
            .unwrap_or_else(|| self.config.password())
    }

    /// Validates that an ID is a numeric string, as RT expects for tickets
    /// and attachments.
    ///
    /// # Errors
    ///
    /// Returns `RtirError::Validation` if the ID is empty or contains non-digit characters.
    pub(crate) fn validate_id(id: &str, field_name: &str) -> Result<(), RtirError> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RtirError::validation(format!(
                "{} must be a numeric string, got: {:?}",
                field_name,
                id.chars().take(50).collect::<String>()
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Logs in by posting the credentials to the RT login page.
    ///
    /// Returns `Ok(true)` when RT answered with its start page and
    /// `Ok(false)` when it answered with the login form or an unknown page.
    /// Already logged in: returns `Ok(true)` without a request.
    ///
    /// # Errors
    ///
    /// Transport failures mark the session as logged out and are returned.
    /// `RtirError::MissingCredentials` after `logout`.
    pub async fn login(&mut self) -> Result<bool, RtirError> {
        if self.session.is_logged_in() {
            return Ok(true);
        }

        let credentials = self.session.require_credentials()?.clone();
        tracing::debug!(user = %credentials.user(), "Logging in to RT");

        let result = self
            .http
            .post(self.session.base_url())
            .basic_auth(credentials.user(), Some(credentials.password()))
            .form(&credentials.login_form())
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.session.mark_logged_out();
                return Err(self.transport_error(e, "POST login"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.session.mark_logged_out();
            return Err(self.handle_http_error(status, response).await);
        }

        let cookie = response
            .cookies()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ");

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.session.mark_logged_out();
                return Err(RtirError::Http(e));
            }
        };

        match self.format.login_outcome(&body) {
            LoginOutcome::Authenticated => {
                self.session.mark_logged_in(Some(cookie));
                tracing::info!(user = %credentials.user(), "Logged in to RT");
            }
            LoginOutcome::BadCredentials => {
                self.session.mark_logged_out();
                tracing::warn!(user = %credentials.user(), "Username or password is incorrect");
            }
            LoginOutcome::LoginPage => {
                self.session.mark_logged_out();
                tracing::warn!(user = %credentials.user(), "Failed to log in: login page returned");
            }
            LoginOutcome::Unrecognized => {
                self.session.mark_logged_out();
                tracing::warn!(user = %credentials.user(), "Failed to log in: unrecognized response");
            }
        }

        Ok(self.session.is_logged_in())
    }

    /// Logs out, drops the cookie jar and forgets the credentials.
    ///
    /// Returns `Ok(false)` without a request when not logged in.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the logout request fails; the session
    /// is left as it was.
    pub async fn logout(&mut self) -> Result<bool, RtirError> {
        if !self.session.is_logged_in() {
            return Ok(false);
        }

        self.request_inner(Method::POST, "logout", &[], Some(&Content::new()))
            .await?;

        self.session.close();
        self.cache.clear();
        self.http = Self::build_http(&self.config)?;

        tracing::info!("Logged out of RT");
        Ok(true)
    }

    /// Switches to another user: logs out, then logs in with the new
    /// credentials.
    ///
    /// # Errors
    ///
    /// Same as [`RtirClient::login`]. A failed logout is logged and the old
    /// session is discarded anyway.
    pub async fn new_login(
        &mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<bool, RtirError> {
        if let Err(e) = self.logout().await {
            tracing::warn!(
                error = %e.sanitized_display(self.secret_for_sanitization()),
                "Logout before switching user failed"
            );
            self.session.mark_logged_out();
            self.cache.clear();
            self.http = Self::build_http(&self.config)?;
        }

        self.session.replace_credentials(Credentials::new(user, password));
        self.login().await
    }

    // ========================================================================
    // Low-level requests
    // ========================================================================

    /// Sends a request below `/REST/1.0/` and returns the body.
    ///
    /// Checks the HTTP status only; see [`RtirClient::rest`] for the RT
    /// status line check.
    async fn request_inner(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        content: Option<&Content>,
    ) -> Result<String, RtirError> {
        let url = format!("{}{}/{}", self.session.base_url(), REST_PREFIX, path);
        let operation = format!("{} {}", method, path);

        tracing::debug!(
            method = %method,
            path = %path,
            "Making RT REST request"
        );

        let mut req = self.http.request(method, &url);

        if let Some(credentials) = self.session.credentials() {
            req = req.basic_auth(credentials.user(), Some(credentials.password()));
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(content) = content {
            req = req.form(&content.to_form());
        }

        let response = req
            .send()
            .await
            .map_err(|e| self.transport_error(e, &operation))?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.handle_http_error(status, response).await);
        }

        let body = response.text().await.map_err(RtirError::Http)?;

        tracing::trace!(body = %body, "RT REST response");

        Ok(body)
    }

    /// Sends a REST request and fails on an RT status line other than 200.
    async fn rest(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        content: Option<&Content>,
    ) -> Result<String, RtirError> {
        let body = self.request_inner(method, path, query, content).await?;

        if let Some(status) = parser::response_status(&body) {
            status.into_result()?;
        }

        Ok(body)
    }

    async fn post(&self, path: &str, content: Option<&Content>) -> Result<String, RtirError> {
        self.rest(Method::POST, path, &[], content).await
    }

    /// Drops the login flag when RT no longer accepts the session, so the
    /// next `login` posts the credentials again.
    fn expire_on_session_error(&mut self, e: &RtirError) {
        if e.is_session_error() && self.session.is_logged_in() {
            tracing::info!("RT session expired");
            self.session.mark_logged_out();
        }
    }

    fn transport_error(&self, e: reqwest::Error, operation: &str) -> RtirError {
        if e.is_timeout() {
            return RtirError::timeout(self.config.timeout, operation);
        }
        RtirError::Http(e)
    }

    /// Handles HTTP-level errors and converts to RtirError.
    async fn handle_http_error(&self, status: StatusCode, response: reqwest::Response) -> RtirError {
        let body = response.text().await.unwrap_or_default();
        let body = RtirError::sanitize_message(&body, self.secret_for_sanitization());
        let body = truncate_body(body);

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RtirError::Authentication,
            StatusCode::NOT_FOUND => RtirError::not_found("resource", "REST endpoint"),
            _ => RtirError::HttpStatus { status, body },
        }
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Searches tickets with RT's query language and returns the
    /// `id: Subject` lines.
    ///
    /// Example query: `(Created > "2016-01-01") AND (CF.{Classification} = "Spam")`.
    pub async fn search_tickets(&self, query: &str) -> Result<String, RtirError> {
        let body = self.search(query).await?;
        Ok(parser::extract_fields(&body))
    }

    /// Searches tickets and returns the untouched response text.
    pub async fn search_tickets_raw(&self, query: &str) -> Result<String, RtirError> {
        let body = self.search(query).await?;
        Ok(body.trim().to_string())
    }

    async fn search(&self, query: &str) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        if query.trim().is_empty() {
            return Err(RtirError::validation("search query must not be empty"));
        }
        self.rest(Method::POST, "search/ticket", &[("query", query)], None)
            .await
    }

    /// Unowned tickets with status new or open.
    pub async fn get_all_nobody_tickets(&self) -> Result<String, RtirError> {
        self.search_tickets(NOBODY_TICKETS_QUERY).await
    }

    /// All tickets with status new or open.
    pub async fn get_all_new_open_tickets(&self) -> Result<String, RtirError> {
        self.search_tickets(NEW_OPEN_TICKETS_QUERY).await
    }

    /// Ids of all new and open tickets, in ascending numeric order.
    pub async fn get_all_new_open_ticket_ids(&self) -> Result<Vec<String>, RtirError> {
        let result = self.get_all_new_open_tickets().await?;
        let mut ids = parser::ticket_ids(&result);
        ids.sort_by_key(|id| (id.parse::<u64>().unwrap_or(u64::MAX), id.clone()));
        Ok(ids)
    }

    // ========================================================================
    // Queues and users
    // ========================================================================

    /// Returns the `Key: Value` lines describing a queue (id or name).
    ///
    /// # Errors
    ///
    /// Returns `RtirError::NotFound` if RT reports that the queue does not exist.
    pub async fn get_queue_info(&self, queue: &str) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        let queue = queue.trim();
        if queue.is_empty() {
            return Err(RtirError::validation("queue must not be empty"));
        }

        let path = format!("queue/{}", urlencoding::encode(queue));
        let body = self.post(&path, None).await?;

        if self.format.is_missing(&body) {
            return Err(RtirError::not_found("queue", queue));
        }

        Ok(parser::extract_fields(&body))
    }

    /// Enumerates queue ids `0..max_queue_id` and returns the named ones.
    pub async fn get_all_queues(&self, max_queue_id: u32) -> Result<Vec<QueueSummary>, RtirError> {
        self.session.ensure_logged_in()?;

        let mut queues = Vec::new();
        for id in 0..max_queue_id {
            let path = format!("queue/{}", id);
            let body = self.rest(Method::GET, &path, &[], None).await?;
            if let Some(name) = parser::queue_name(&body) {
                queues.push(QueueSummary { id, name });
            }
        }

        tracing::debug!(count = queues.len(), "Queues enumerated");
        Ok(queues)
    }

    /// Returns the `Key: Value` lines describing a user. An empty name
    /// means the logged-in user.
    pub async fn get_user_info(&self, user: &str) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        let user = match user.trim() {
            "" => self.session.user(),
            name => name,
        };

        let path = format!("user/{}", urlencoding::encode(user));
        let body = self.post(&path, None).await?;
        Ok(parser::extract_fields(&body))
    }

    // ========================================================================
    // Ticket reads
    // ========================================================================

    /// Returns the `Key: Value` lines of a ticket.
    ///
    /// The result is cached until another ticket is shown or this ticket
    /// is changed through the client.
    ///
    /// # Errors
    ///
    /// Returns `RtirError::NotFound` if the ticket does not exist. Any
    /// failure empties the cache.
    pub async fn get_ticket_info(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        Self::validate_id(ticket_id, "ticket_id")?;

        if let Some(info) = self.cache.get(ticket_id) {
            tracing::trace!(ticket_id = %ticket_id, "Ticket info served from cache");
            return Ok(info.to_string());
        }

        let path = format!("ticket/{}/show", ticket_id);
        let result = self.post(&path, None).await.and_then(|body| {
            if self.format.is_missing(&body) {
                Err(RtirError::not_found("ticket", ticket_id))
            } else {
                Ok(parser::extract_fields(&body))
            }
        });

        match result {
            Ok(info) => {
                self.cache.replace(ticket_id, info.clone());
                Ok(info)
            }
            Err(e) => {
                self.cache.clear();
                self.expire_on_session_error(&e);
                Err(e)
            }
        }
    }

    /// Returns the untouched `show` response of a ticket, bypassing the cache.
    pub async fn get_ticket_info_raw(&self, ticket_id: &str) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        Self::validate_id(ticket_id, "ticket_id")?;

        let path = format!("ticket/{}/show", ticket_id);
        let body = self.post(&path, None).await?;
        Ok(body.trim().to_string())
    }

    /// Returns one field of a ticket, or an empty string if the ticket has
    /// no such line.
    ///
    /// # Errors
    ///
    /// Returns `RtirError::UnknownField` for names outside
    /// [`TICKET_FIELDS`](crate::models::TICKET_FIELDS); no request is made.
    pub async fn get_ticket_item(&mut self, ticket_id: &str, item: &str) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        let field =
            known_field(item).ok_or_else(|| RtirError::UnknownField(item.trim().to_string()))?;

        let info = self.get_ticket_info(ticket_id).await?;
        Ok(parser::field_value(&info, field))
    }

    /// Ticket queue.
    pub async fn get_ticket_queue(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "Queue").await
    }

    /// Ticket status.
    pub async fn get_ticket_status(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "Status").await
    }

    /// Ticket owner (`Nobody` when unowned).
    pub async fn get_ticket_owner(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "Owner").await
    }

    /// Ticket creator.
    pub async fn get_ticket_creator(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "Creator").await
    }

    /// Creation date as RT prints it.
    pub async fn get_ticket_create_date(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "Created").await
    }

    /// Last update date as RT prints it.
    pub async fn get_ticket_last_update(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "LastUpdated").await
    }

    /// Requestor addresses.
    pub async fn get_ticket_requestors(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "Requestors").await
    }

    /// Ticket subject.
    pub async fn get_ticket_subject(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "Subject").await
    }

    /// The `IP` custom field.
    pub async fn get_ticket_ip(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "CF.{IP}").await
    }

    /// The `Classification` custom field.
    pub async fn get_ticket_classification(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "CF.{Classification}").await
    }

    /// The `Constituency` custom field.
    pub async fn get_ticket_constituency(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.get_ticket_item(ticket_id, "CF.{Constituency}").await
    }

    /// Returns the body of the last attachment of `content_type`, without
    /// the status line. Empty when the ticket has no such attachment.
    pub async fn get_ticket_message(
        &self,
        ticket_id: &str,
        content_type: &str,
    ) -> Result<String, RtirError> {
        let ids = self.get_ticket_message_ids(ticket_id, content_type).await?;
        let Some(attachment_id) = ids.last() else {
            tracing::debug!(ticket_id = %ticket_id, content_type = %content_type, "No matching attachment");
            return Ok(String::new());
        };

        let path = format!("ticket/{}/attachments/{}", ticket_id, attachment_id);
        let body = self.post(&path, None).await?;

        Ok(body.lines().skip(2).collect::<Vec<_>>().join("\n").trim().to_string())
    }

    /// Returns the ids of all attachments of `content_type`, in listing order.
    pub async fn get_ticket_message_ids(
        &self,
        ticket_id: &str,
        content_type: &str,
    ) -> Result<Vec<String>, RtirError> {
        self.session.ensure_logged_in()?;
        Self::validate_id(ticket_id, "ticket_id")?;

        let path = format!("ticket/{}/attachments", ticket_id);
        let body = self.post(&path, None).await?;
        Ok(parser::attachment_ids(&body, content_type))
    }

    /// Returns one attachment with the status line removed.
    pub async fn get_ticket_message_by_id(
        &self,
        ticket_id: &str,
        message_id: &str,
    ) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        Self::validate_id(ticket_id, "ticket_id")?;
        Self::validate_id(message_id, "message_id")?;

        let path = format!("ticket/{}/attachments/{}", ticket_id, message_id);
        let body = self.post(&path, None).await?;
        Ok(parser::strip_status_lines(&body))
    }

    // ========================================================================
    // Ticket mutations
    // ========================================================================

    /// Posts a mutation for one ticket and drops it from the cache.
    async fn mutate(
        &mut self,
        ticket_id: &str,
        action: &str,
        content: &Content,
    ) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        Self::validate_id(ticket_id, "ticket_id")?;

        tracing::debug!(ticket_id = %ticket_id, action = %action, "Updating ticket");

        let path = format!("ticket/{}/{}", ticket_id, action);
        let result = self.post(&path, Some(content)).await;
        self.cache.invalidate(ticket_id);
        if let Err(e) = &result {
            self.expire_on_session_error(e);
        }
        result
    }

    /// Takes an unowned ticket.
    pub async fn take_ticket(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        let body = self.mutate(ticket_id, "take", &query::take()).await?;
        Ok(body.trim().to_string())
    }

    /// Steals a ticket owned by someone else.
    pub async fn steal_ticket(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        let body = self.mutate(ticket_id, "take", &query::steal()).await?;
        Ok(body.trim().to_string())
    }

    /// Adds an internal comment.
    pub async fn comment_ticket(&mut self, ticket_id: &str, text: &str) -> Result<String, RtirError> {
        let content = query::comment(ticket_id, text);
        let body = self.mutate(ticket_id, "comment", &content).await?;
        Ok(body.trim().to_string())
    }

    /// Sends a reply to the requestors, optionally with extra Cc/Bcc.
    pub async fn reply_ticket(
        &mut self,
        ticket_id: &str,
        text: &str,
        cc: Option<&str>,
        bcc: Option<&str>,
    ) -> Result<String, RtirError> {
        let content = query::correspond(ticket_id, text, cc, bcc);
        let body = self.mutate(ticket_id, "comment", &content).await?;
        Ok(body.trim().to_string())
    }

    /// Creates a ticket owned by the logged-in user and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `RtirError::UnexpectedResponse` if the response does not
    /// carry `# Ticket <id> created.` on its third line.
    pub async fn create_ticket(&mut self, ticket: &NewTicket) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        if ticket.requestor.is_empty() {
            return Err(RtirError::validation("requestor must not be empty"));
        }

        let content = query::create(ticket, self.session.user());
        let body = self.post("ticket/new", Some(&content)).await?;

        let ticket_id = self.format.created_ticket_id(&body).ok_or_else(|| {
            RtirError::unexpected(format!(
                "no ticket id in create response: {}",
                truncate_body(parser::clean_response(&body))
            ))
        })?;

        tracing::info!(ticket_id = %ticket_id, queue = %ticket.queue, "Ticket created");
        Ok(ticket_id)
    }

    /// Edits fields of a ticket, optionally claiming it first.
    ///
    /// A failed claim is logged and the edit is sent anyway.
    async fn edit_ticket(
        &mut self,
        ticket_id: &str,
        content: Content,
        claim: bool,
    ) -> Result<String, RtirError> {
        self.session.ensure_logged_in()?;
        Self::validate_id(ticket_id, "ticket_id")?;

        if claim {
            if let Err(e) = self.take_or_steal_ticket(ticket_id).await {
                tracing::warn!(
                    ticket_id = %ticket_id,
                    error = %e.sanitized_display(self.secret_for_sanitization()),
                    "Could not claim ticket before editing"
                );
            }
        }

        let body = self.mutate(ticket_id, "edit", &content).await?;
        Ok(parser::clean_response(&body))
    }

    /// Assigns the ticket to another (valid) user.
    pub async fn set_ticket_owner(&mut self, ticket_id: &str, owner: &str) -> Result<String, RtirError> {
        self.edit_ticket(ticket_id, query::set_owner(ticket_id, owner), true)
            .await
    }

    /// Sets the `Resolution` custom field.
    pub async fn set_ticket_resolution(
        &mut self,
        ticket_id: &str,
        resolution: &str,
    ) -> Result<String, RtirError> {
        self.edit_ticket(ticket_id, query::set_resolution(resolution), true)
            .await
    }

    /// Moves the ticket to another queue.
    pub async fn set_ticket_queue(&mut self, ticket_id: &str, queue: &str) -> Result<String, RtirError> {
        self.edit_ticket(ticket_id, query::set_queue(queue), true)
            .await
    }

    /// Sets the classification; the ticket moves to the incidents queue.
    pub async fn set_ticket_classification(
        &mut self,
        ticket_id: &str,
        classification: &str,
    ) -> Result<String, RtirError> {
        self.edit_ticket(ticket_id, query::set_classification(classification), true)
            .await
    }

    /// Sets the IP custom field; the ticket moves to the incidents queue.
    pub async fn set_ticket_ip(&mut self, ticket_id: &str, ip_address: &str) -> Result<String, RtirError> {
        self.edit_ticket(ticket_id, query::set_ip(ip_address), true)
            .await
    }

    /// Sets the status back to open.
    pub async fn reopen_ticket(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.edit_ticket(ticket_id, query::reopen(), true).await
    }

    /// Sets the status to resolved.
    pub async fn close_ticket(&mut self, ticket_id: &str) -> Result<String, RtirError> {
        self.edit_ticket(ticket_id, query::close(), false).await
    }
}

fn truncate_body(body: String) -> String {
    if body.len() > MAX_ERROR_BODY_LEN {
        let mut end = MAX_ERROR_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    } else {
        body
    }
}
