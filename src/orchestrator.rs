//! Batch orchestration of accuracy scoring across a whole run.
//!
//! Cases are split into order-preserving batches of a fixed size and each
//! batch is scored with one judge call. A failing batch only degrades its
//! own cases; the run always yields one result per case.

use crate::accuracy::AccuracyEvaluator;
use crate::dataset::EvalCase;
use crate::result::{ErrorKind, EvalResult};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

/// How cases are submitted to the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    /// One judge call per batch of cases.
    #[default]
    Batch,
    /// One judge call per case.
    Single,
}

/// Failure counts accumulated over a run, one per affected case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    /// Judge call failed (transport or model error).
    pub judge_accuracy: usize,
    /// Judge replied but the reply could not be parsed.
    pub judge_parse: usize,
    /// Batch reply lacked a valid score for the case.
    pub judge_missing_score: usize,
}

impl ErrorCounts {
    /// Count `result` if it is a failure.
    pub fn record(&mut self, result: &EvalResult) {
        match result.error_kind() {
            Some(ErrorKind::JudgeError) => self.judge_accuracy += 1,
            Some(ErrorKind::JudgeParse) => self.judge_parse += 1,
            Some(ErrorKind::JudgeMissingScore) => self.judge_missing_score += 1,
            None => {}
        }
    }

    pub fn total(&self) -> usize {
        self.judge_accuracy + self.judge_parse + self.judge_missing_score
    }
}

/// A case together with its accuracy result.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCase {
    pub case: EvalCase,
    pub accuracy: EvalResult,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// One entry per input case, in input order.
    pub scored: Vec<ScoredCase>,
    pub error_counts: ErrorCounts,
}

impl RunOutcome {
    /// Mean accuracy over all cases; 0.0 for an empty run.
    pub fn average_accuracy(&self) -> f64 {
        if self.scored.is_empty() {
            return 0.0;
        }
        self.scored.iter().map(|s| s.accuracy.score).sum::<f64>() / self.scored.len() as f64
    }
}

/// Drives the accuracy evaluator over a case set.
pub struct BatchOrchestrator {
    evaluator: AccuracyEvaluator,
    batch_size: usize,
    max_concurrent_batches: usize,
    mode: EvalMode,
    source_tag: String,
}

impl BatchOrchestrator {
    /// Batch mode, batches of 10, one batch at a time.
    pub fn new(evaluator: AccuracyEvaluator) -> Self {
        Self {
            evaluator,
            batch_size: 10,
            max_concurrent_batches: 1,
            mode: EvalMode::Batch,
            source_tag: "llm_judge".to_string(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Number of judge calls allowed in flight; 1 keeps the run sequential.
    pub fn with_max_concurrent_batches(mut self, n: usize) -> Self {
        self.max_concurrent_batches = n.max(1);
        self
    }

    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = tag.into();
        self
    }

    /// Score every case.
    pub async fn run(&self, cases: Vec<EvalCase>) -> RunOutcome {
        let results = match self.mode {
            EvalMode::Batch => self.run_batches(&cases).await,
            EvalMode::Single => self.run_single(&cases).await,
        };

        let mut error_counts = ErrorCounts::default();
        let scored: Vec<ScoredCase> = cases
            .into_iter()
            .zip(results)
            .map(|(case, result)| {
                let accuracy = result.with_meta("source", self.source_tag.as_str());
                error_counts.record(&accuracy);
                ScoredCase { case, accuracy }
            })
            .collect();

        tracing::info!(
            cases = scored.len(),
            judge_errors = error_counts.judge_accuracy,
            parse_errors = error_counts.judge_parse,
            missing_scores = error_counts.judge_missing_score,
            "evaluation run finished"
        );

        RunOutcome {
            scored,
            error_counts,
        }
    }

    async fn run_batches(&self, cases: &[EvalCase]) -> Vec<EvalResult> {
        let batches: Vec<&[EvalCase]> = cases.chunks(self.batch_size).collect();
        let total = batches.len();

        let per_batch: Vec<Vec<EvalResult>> = stream::iter(batches.into_iter().enumerate())
            .map(|(idx, batch)| async move {
                tracing::info!(batch = idx + 1, of = total, cases = batch.len(), "scoring batch");
                let results = self.evaluator.evaluate_batch(batch).await;
                let failed = results.iter().filter(|r| r.is_error()).count();
                if failed > 0 {
                    tracing::warn!(batch = idx + 1, failed, "batch has unscored cases");
                }
                results
            })
            .buffered(self.max_concurrent_batches)
            .collect()
            .await;

        per_batch.into_iter().flatten().collect()
    }

    async fn run_single(&self, cases: &[EvalCase]) -> Vec<EvalResult> {
        stream::iter(cases)
            .map(|case| {
                self.evaluator
                    .evaluate(&case.question, &case.candidate_answer, &case.ground_truth)
            })
            .buffered(self.max_concurrent_batches)
            .collect::<Vec<_>>()
            .await
    }
}
