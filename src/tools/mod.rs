//! MCP tool inputs for the RTIR server.
//!
//! This module contains the parameter types of the tools exposed by
//! [`RtirServer`](crate::server::RtirServer).

mod inputs;

pub use inputs::*;
