//! Judge client with model fallback.
//!
//! Every call walks the fallback chain from the primary model. A 404
//! (model not found or retired) moves on to the next model; any other
//! failure ends the walk. The outcome of the walk, including which model
//! answered, is returned by value so calls can be issued concurrently.

use super::transport::{JudgeTransport, TransportError};
use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Status code that marks a model as unavailable and triggers fallback.
const MODEL_NOT_FOUND: u16 = 404;

/// What the judge returned.
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeReply {
    /// Raw reply text.
    Text(String),
    /// The call failed for the model in `model_used`.
    Failed {
        message: String,
        code: Option<u16>,
    },
}

/// Result of one [`JudgeClient::call`].
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOutcome {
    pub reply: JudgeReply,
    /// Model that answered, or the last one attempted on failure.
    pub model_used: String,
    /// Whether `model_used` is not the primary model.
    pub used_fallback: bool,
}

impl JudgeOutcome {
    pub fn text(&self) -> Option<&str> {
        match &self.reply {
            JudgeReply::Text(text) => Some(text),
            JudgeReply::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.reply, JudgeReply::Text(_))
    }
}

/// Client for the remote judge model.
#[derive(Clone)]
pub struct JudgeClient {
    transport: Arc<dyn JudgeTransport>,
    chain: Arc<[String]>,
}

impl JudgeClient {
    /// Create a client over `transport` trying `models` in order.
    ///
    /// Blank and repeated model names are dropped.
    pub fn new(transport: Arc<dyn JudgeTransport>, models: Vec<String>) -> Self {
        let mut chain: Vec<String> = Vec::with_capacity(models.len());
        for model in models {
            let model = model.trim();
            if !model.is_empty() && !chain.iter().any(|m| m == model) {
                chain.push(model.to_string());
            }
        }
        Self {
            transport,
            chain: chain.into(),
        }
    }

    /// Models tried by [`call`](Self::call), primary first.
    pub fn fallback_chain(&self) -> &[String] {
        &self.chain
    }

    /// Submit a prompt and return the reply or the failure detail.
    pub async fn call(&self, prompt: &str) -> JudgeOutcome {
        let Some(primary) = self.chain.first() else {
            return JudgeOutcome {
                reply: JudgeReply::Failed {
                    message: "No judge model configured".to_string(),
                    code: None,
                },
                model_used: String::new(),
                used_fallback: false,
            };
        };

        let last = self.chain.len() - 1;
        let mut outcome = JudgeOutcome {
            reply: JudgeReply::Failed {
                message: String::new(),
                code: None,
            },
            model_used: primary.clone(),
            used_fallback: false,
        };

        for (idx, model) in self.chain.iter().enumerate() {
            outcome.model_used = model.clone();
            outcome.used_fallback = idx > 0;

            match self.transport.generate(model, prompt).await {
                Ok(text) => {
                    if idx > 0 {
                        tracing::info!(model = %model, "judge answered from fallback model");
                    }
                    outcome.reply = JudgeReply::Text(text);
                    return outcome;
                }
                Err(err) => {
                    let code = extract_error_code(&err);
                    if code == Some(MODEL_NOT_FOUND) && idx < last {
                        tracing::warn!(
                            model = %model,
                            next = %self.chain[idx + 1],
                            "judge model not found, trying next model"
                        );
                        continue;
                    }

                    tracing::warn!(model = %model, code = ?code, error = %err, "judge call failed");
                    outcome.reply = JudgeReply::Failed {
                        message: err.message,
                        code,
                    };
                    return outcome;
                }
            }
        }

        outcome
    }
}

/// Status code of a failed call: the reported status if any, otherwise the
/// first standalone 3-digit number in the message.
pub fn extract_error_code(err: &TransportError) -> Option<u16> {
    static CODE: OnceLock<Regex> = OnceLock::new();

    if err.status.is_some() {
        return err.status;
    }

    let re = CODE.get_or_init(|| Regex::new(r"\b([1-5]\d{2})\b").expect("valid regex"));
    re.captures(&err.message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
