//! Scored output of an evaluation layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata key holding the [`ErrorKind`] of a failed evaluation.
pub const ERROR_KIND_KEY: &str = "error_kind";

/// Open-ended diagnostic bag attached to a result.
pub type Metadata = BTreeMap<String, Value>;

/// Why a score could not be trusted.
///
/// Every variant is counted separately across a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The judge could not be reached for any model in the chain,
    /// or failed with a non-retryable code.
    JudgeError,
    /// The judge replied but no score could be extracted.
    JudgeParse,
    /// A structurally valid batch reply lacked a valid entry for this case.
    JudgeMissingScore,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::JudgeError => "judge_error",
            ErrorKind::JudgeParse => "judge_parse",
            ErrorKind::JudgeMissingScore => "judge_missing_score",
        }
    }
}

/// Score for one case from one evaluation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    /// Score in [0.0, 1.0].
    pub score: f64,
    /// Human-readable justification or error description.
    pub reasoning: String,
    /// Diagnostic details.
    #[serde(default)]
    pub metadata: Metadata,
}

impl EvalResult {
    /// Create a result; the score is clamped into [0.0, 1.0].
    pub fn new(score: f64, reasoning: impl Into<String>) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        };
        Self {
            score,
            reasoning: reasoning.into(),
            metadata: Metadata::new(),
        }
    }

    /// A zero-scored result tagged with the reason it failed.
    pub fn failed(kind: ErrorKind, reasoning: impl Into<String>) -> Self {
        Self::new(0.0, reasoning).with_meta(ERROR_KIND_KEY, kind.as_str())
    }

    /// Attach a metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Error kind recorded on this result, if it is a failure.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.metadata
            .get(ERROR_KIND_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Whether the score is a failure placeholder rather than a judgment.
    pub fn is_error(&self) -> bool {
        self.error_kind().is_some()
    }
}
