//! Evaluation cases and loading them from disk.
//!
//! Supports:
//! - A JSON array of records
//! - JSONL (one record per line), e.g. the responses log of a candidate system
//!
//! Field names follow the common dataset conventions; see [`RawRecord`].

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One (question, candidate answer, reference answer) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    /// Unique identifier within a run.
    pub id: i64,
    /// Dataset the case came from.
    pub dataset_id: String,
    /// The question posed to the candidate system.
    pub question: String,
    /// Reference answer; empty when none is available.
    pub ground_truth: String,
    /// The candidate system's answer.
    pub candidate_answer: String,
}

impl EvalCase {
    pub fn new(
        id: i64,
        dataset_id: impl Into<String>,
        question: impl Into<String>,
        ground_truth: impl Into<String>,
        candidate_answer: impl Into<String>,
    ) -> Self {
        Self {
            id,
            dataset_id: dataset_id.into(),
            question: question.into(),
            ground_truth: ground_truth.into(),
            candidate_answer: candidate_answer.into(),
        }
    }

    /// Whether a reference answer was supplied.
    pub fn has_ground_truth(&self) -> bool {
        !self.ground_truth.trim().is_empty()
    }
}

/// Record as found on disk.
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(default, alias = "prompt", alias = "query")]
    question: String,
    #[serde(default, alias = "answer")]
    ground_truth: Option<String>,
    #[serde(
        default,
        alias = "response",
        alias = "system_answer",
        alias = "student_answer"
    )]
    candidate_answer: Option<String>,
    #[serde(default)]
    dataset_id: Option<String>,
}

/// Load evaluation cases from a JSON array or JSONL file.
///
/// Records with an empty question are skipped. Case ids are the record's
/// position in the file. `dataset_id` applies to records that do not carry
/// their own; when absent the file stem is used.
pub fn load_cases(path: &Path, dataset_id: Option<&str>) -> Result<Vec<EvalCase>> {
    if !path.is_file() {
        return Err(EvalError::InputNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    let records = parse_records(path, &content)?;

    let default_dataset = dataset_id
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_default();

    let cases: Vec<EvalCase> = records
        .into_iter()
        .enumerate()
        .filter(|(_, r)| !r.question.trim().is_empty())
        .map(|(idx, r)| EvalCase {
            id: idx as i64,
            dataset_id: r.dataset_id.unwrap_or_else(|| default_dataset.clone()),
            question: r.question,
            ground_truth: r.ground_truth.unwrap_or_default(),
            candidate_answer: r.candidate_answer.unwrap_or_default(),
        })
        .collect();

    if cases.is_empty() {
        return Err(EvalError::EmptyCaseSet(path.to_path_buf()));
    }

    tracing::debug!(path = %path.display(), cases = cases.len(), "loaded evaluation cases");
    Ok(cases)
}

/// Decode the file as a JSON array first, then fall back to JSONL.
fn parse_records(path: &Path, content: &str) -> Result<Vec<RawRecord>> {
    if let Ok(records) = serde_json::from_str::<Vec<RawRecord>>(content) {
        return Ok(records);
    }

    let mut records = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: RawRecord =
            serde_json::from_str(line).map_err(|e| EvalError::MalformedRecord {
                path: path.to_path_buf(),
                line: line_num + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    Ok(records)
}
