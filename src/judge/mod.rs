//! Judge model integration.
//!
//! Provides the transport to an OpenAI-compatible judge endpoint, the
//! fallback-walking client, and the prompts used for scoring.

mod client;
mod prompts;
mod transport;

pub use client::{JudgeClient, JudgeOutcome, JudgeReply, extract_error_code};
pub use prompts::Prompts;
pub use transport::{HttpTransport, JUDGE_TEMPERATURE, JudgeTransport, TransportError};

#[cfg(test)]
pub(crate) use transport::scripted::ScriptedTransport;
