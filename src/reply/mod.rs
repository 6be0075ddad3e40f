//! Remote reply client
//!
//! Sends the recognized transcript to the reasoning endpoint and resolves with
//! the reply text (and optional reply audio). No retries: a failed call ends
//! the exchange and the user starts a new one.

pub mod client;
pub mod messages;

pub use client::{HttpReplyClient, RemoteReply, ReplyClient};
pub use messages::{ReplyRequest, ReplyResponse};
