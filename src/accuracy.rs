//! Accuracy layer: semantic correctness scored by the judge model.

use crate::dataset::EvalCase;
use crate::judge::{JudgeClient, JudgeOutcome, JudgeReply, Prompts};
use crate::result::{ErrorKind, EvalResult};
use crate::score::{parse_batch_scores, parse_single_score};

/// Reasoning attached to every score the judge actually produced.
pub const JUDGED_REASONING: &str = "LLM judge evaluated";

/// Metadata key on `judge_parse` failures: `"single"` for one unreadable
/// reply, `"batch"` when a whole batch reply could not be decoded.
pub const PARSE_SCOPE_KEY: &str = "parse_scope";

/// Scores candidate answers through the judge model.
#[derive(Clone)]
pub struct AccuracyEvaluator {
    client: JudgeClient,
}

impl AccuracyEvaluator {
    pub fn new(client: JudgeClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &JudgeClient {
        &self.client
    }

    /// Score one answer with its own judge call.
    pub async fn evaluate(&self, question: &str, candidate: &str, ground_truth: &str) -> EvalResult {
        let prompt = Prompts::single(question, candidate, ground_truth);
        let outcome = self.client.call(&prompt).await;

        let text = match &outcome.reply {
            JudgeReply::Text(text) => text,
            JudgeReply::Failed { message, code } => {
                return judge_failure(message, *code, &outcome);
            }
        };

        match parse_single_score(text) {
            Some(score) => with_provenance(EvalResult::new(score, JUDGED_REASONING), &outcome),
            None => {
                tracing::debug!(reply = %text, "no score in judge reply");
                with_provenance(
                    EvalResult::failed(
                        ErrorKind::JudgeParse,
                        "Judge reply contained no score between 0.0 and 1.0",
                    ),
                    &outcome,
                )
                .with_meta(PARSE_SCOPE_KEY, "single")
                .with_meta("raw_response", text.as_str())
            }
        }
    }

    /// Score all `cases` with a single judge call.
    ///
    /// Returns one result per case, in the order of `cases`.
    pub async fn evaluate_batch(&self, cases: &[EvalCase]) -> Vec<EvalResult> {
        if cases.is_empty() {
            return Vec::new();
        }

        let prompt = Prompts::batch(cases);
        let outcome = self.client.call(&prompt).await;

        let text = match &outcome.reply {
            JudgeReply::Text(text) => text,
            JudgeReply::Failed { message, code } => {
                let failure = judge_failure(message, *code, &outcome);
                return vec![failure; cases.len()];
            }
        };

        let scores = match parse_batch_scores(text) {
            Ok(scores) => scores,
            Err(err) => {
                tracing::warn!(cases = cases.len(), error = %err, "judge batch reply unparseable");
                let failure = with_provenance(
                    EvalResult::failed(
                        ErrorKind::JudgeParse,
                        format!("Judge batch reply could not be parsed: {}", err),
                    ),
                    &outcome,
                )
                .with_meta(PARSE_SCOPE_KEY, "batch");
                return vec![failure; cases.len()];
            }
        };

        cases
            .iter()
            .map(|case| match scores.get(&case.id) {
                Some(&score) => with_provenance(EvalResult::new(score, JUDGED_REASONING), &outcome),
                None => with_provenance(
                    EvalResult::failed(
                        ErrorKind::JudgeMissingScore,
                        format!("Judge reply had no valid score for case {}", case.id),
                    ),
                    &outcome,
                ),
            })
            .collect()
    }
}

/// Zero-scored result for a failed judge call.
fn judge_failure(message: &str, code: Option<u16>, outcome: &JudgeOutcome) -> EvalResult {
    let mut result = EvalResult::failed(ErrorKind::JudgeError, format!("Judge error: {}", message))
        .with_meta("error_message", message);
    if let Some(code) = code {
        result = result.with_meta("error_code", code);
    }
    with_provenance(result, outcome)
}

fn with_provenance(result: EvalResult, outcome: &JudgeOutcome) -> EvalResult {
    result
        .with_meta("model_used", outcome.model_used.as_str())
        .with_meta("used_fallback", outcome.used_fallback)
}
