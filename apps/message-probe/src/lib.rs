//! Smoke-test client for the local message API.
//!
//! Posts a fixed info / warning / error trio to `/api/message`, one at a time,
//! and prints every exchange so the receiving side can be checked by eye.

pub mod config;
pub mod message;
pub mod sender;

pub use config::{Cli, ProbeConfig};
pub use message::{sample_messages, Message, MessageKind};
pub use sender::{run, Delivery, MessageSender, Outcome, ResponseBody, RunSummary, SendError};
