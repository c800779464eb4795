//! # rtir-rest
//!
//! A client for the REST 1.0 interface of Request Tracker (RT) and its
//! incident response extension RTIR, plus an MCP server exposing the client
//! as tools.
//!
//! ## Features
//!
//! - **Session**: form login with a cookie jar, logout, switching users
//! - **Read operations**: search, ticket fields, messages, queues, users
//! - **Write operations**: take, steal, comment, reply, create, edit, close
//! - **Workflows**: claim, comment, classify and close in one call
//! - **Security**: the password is never logged or exposed in error messages
//!
//! ## Architecture
//!
//! - [`config`] - Configuration loading from environment variables
//! - [`error`] - Error types with message sanitization
//! - [`session`] - Credentials and login state
//! - [`parser`] - Parsing of RT's plain-text responses
//! - [`query`] - The `content` form payload RT expects on writes
//! - [`cache`] - One-entry cache of the last ticket shown
//! - [`rt_client`] - HTTP client for single RT operations
//! - [`workflow`] - Multi-step analyst workflows
//! - [`compat`] - Best-effort results that fall back to empty values
//! - [`server`] - MCP server implementation with tool routing
//! - [`models`] - Domain types and field names
//! - [`tools`] - Tool input parameter structs
//!
//! ## Configuration
//!
//! Required:
//! - `RTIR_BASE_URL`: Base URL of the RT installation, e.g. `https://rtir.example.com`
//! - `RTIR_USER`: RT user name
//! - `RTIR_PASSWORD`: RT password
//!
//! Optional:
//! - `RTIR_USER_AGENT`: User-Agent header
//! - `RTIR_HTTP_PROXY` / `RTIR_HTTPS_PROXY`: proxies per scheme
//! - `RTIR_ACCEPT_INVALID_CERTS`: set to `true` to skip TLS verification
//! - `RTIR_TIMEOUT_SECS`: request timeout (default 30)
//! - `RUST_LOG`: Log level (e.g., `rtir_rest=debug`)
//!
//! ## Example
//!
//! ```ignore
//! use rtir_rest::config::Config;
//! use rtir_rest::rt_client::RtirClient;
//!
//! async fn example() -> Result<(), rtir_rest::error::RtirError> {
//!     let mut client = RtirClient::new(Config::from_env()?)?;
//!     if !client.login().await? {
//!         return Ok(());
//!     }
//!
//!     for id in client.get_all_new_open_ticket_ids().await? {
//!         let subject = client.get_ticket_subject(&id).await?;
//!         println!("#{}: {}", id, subject);
//!     }
//!
//!     client.take_comment_close_ticket("123", "Handled.").await?;
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cache;
pub mod compat;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod query;
pub mod rt_client;
pub mod server;
pub mod session;
pub mod tools;
pub mod workflow;
