//! Data models for the RT REST 1.0 interface.
//!
//! RT answers in plain `Key: Value` text rather than JSON, so these types
//! are small: the parsed status line, the known ticket fields, queue
//! summaries and the input for new tickets.

mod common;
mod queue;
mod ticket;

pub use common::*;
pub use queue::*;
pub use ticket::*;
