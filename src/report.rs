//! Run summary assembly and persistence.

use crate::error::{EvalError, Result};
use crate::orchestrator::{ErrorCounts, RunOutcome, ScoredCase};
use crate::result::Metadata;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-layer scores of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub accuracy: f64,
}

/// Per-layer reasoning of a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reasoning {
    pub accuracy: String,
}

/// One case in the persisted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: i64,
    pub dataset_id: String,
    pub query: String,
    pub system_answer: String,
    pub ground_truth: String,
    pub scores: Scores,
    pub reasoning: Reasoning,
    pub metadata: Metadata,
}

impl From<ScoredCase> for ResultRecord {
    fn from(scored: ScoredCase) -> Self {
        let ScoredCase { case, accuracy } = scored;
        Self {
            id: case.id,
            dataset_id: case.dataset_id,
            query: case.question,
            system_answer: case.candidate_answer,
            ground_truth: case.ground_truth,
            scores: Scores {
                accuracy: accuracy.score,
            },
            reasoning: Reasoning {
                accuracy: accuracy.reasoning,
            },
            metadata: accuracy.metadata,
        }
    }
}

/// Persisted summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub total_cases: usize,
    pub average_accuracy: f64,
    pub error_counts: ErrorCounts,
    pub details: Vec<ResultRecord>,
}

impl RunSummary {
    /// Build the summary of `outcome`, stamped with the current local time.
    pub fn from_outcome(outcome: RunOutcome) -> Self {
        Self::from_outcome_at(outcome, Local::now())
    }

    pub fn from_outcome_at(outcome: RunOutcome, at: DateTime<Local>) -> Self {
        let average_accuracy = outcome.average_accuracy();
        let details: Vec<ResultRecord> =
            outcome.scored.into_iter().map(ResultRecord::from).collect();
        Self {
            timestamp: at.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            total_cases: details.len(),
            average_accuracy,
            error_counts: outcome.error_counts,
            details,
        }
    }

    /// Print summary to stdout.
    pub fn print_summary(&self) {
        println!("\n========== Evaluation Summary ==========");
        println!("Total cases:        {}", self.total_cases);
        println!("Average accuracy:   {:.2}", self.average_accuracy);
        println!("----------------------------------------");
        println!("Judge errors:       {}", self.error_counts.judge_accuracy);
        println!("Parse errors:       {}", self.error_counts.judge_parse);
        println!("Missing scores:     {}", self.error_counts.judge_missing_score);
        println!("========================================\n");
    }
}

/// Default report location for a run started at `at`.
pub fn default_output_path(at: DateTime<Local>) -> PathBuf {
    PathBuf::from("results").join(format!(
        "eval_report_responses_{}.json",
        at.format("%Y%m%d_%H%M%S")
    ))
}

/// Make sure the report can be written to `path`, creating its directory.
pub fn ensure_output_writable(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir).map_err(|e| EvalError::io(dir, e))?;

    let metadata = fs::metadata(dir).map_err(|e| EvalError::io(dir, e))?;
    if !metadata.is_dir() || metadata.permissions().readonly() {
        return Err(EvalError::OutputNotWritable(dir.to_path_buf()));
    }

    Ok(())
}

/// Write the summary as pretty-printed JSON.
pub fn save_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    ensure_output_writable(path)?;
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json).map_err(|e| EvalError::io(path, e))?;
    Ok(())
}

/// Read a previously saved summary.
pub fn load_summary(path: &Path) -> Result<RunSummary> {
    let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::EvalCase;
    use crate::result::{ErrorKind, EvalResult};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn outcome() -> RunOutcome {
        let ok = ScoredCase {
            case: EvalCase::new(0, "gsm8k", "Q0", "A0", "S0"),
            accuracy: EvalResult::new(0.8, "LLM judge evaluated").with_meta("source", "test"),
        };
        let failed = ScoredCase {
            case: EvalCase::new(1, "gsm8k", "Q1", "", "S1"),
            accuracy: EvalResult::failed(ErrorKind::JudgeMissingScore, "missing"),
        };
        RunOutcome {
            scored: vec![ok, failed],
            error_counts: ErrorCounts {
                judge_missing_score: 1,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_summary_shape() {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        let summary = RunSummary::from_outcome_at(outcome(), at);

        assert_eq!(summary.total_cases, 2);
        assert!((summary.average_accuracy - 0.4).abs() < 1e-9);
        assert_eq!(summary.timestamp, "2026-03-01 12:30:05.000000");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["error_counts"]["judge_missing_score"], 1);
        assert_eq!(json["error_counts"]["judge_accuracy"], 0);
        assert_eq!(json["details"][0]["query"], "Q0");
        assert_eq!(json["details"][0]["system_answer"], "S0");
        assert_eq!(json["details"][0]["scores"]["accuracy"], 0.8);
        assert_eq!(json["details"][0]["reasoning"]["accuracy"], "LLM judge evaluated");
        assert_eq!(json["details"][1]["metadata"]["error_kind"], "judge_missing_score");
    }

    #[test]
    fn test_default_output_path() {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(
            default_output_path(at),
            PathBuf::from("results/eval_report_responses_20260301_123005.json")
        );
    }

    #[test]
    fn test_save_creates_directory_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("report.json");

        let summary = RunSummary::from_outcome(outcome());
        save_summary(&summary, &path).unwrap();

        let loaded = load_summary(&path).unwrap();
        assert_eq!(loaded, summary);
    }

    #[test]
    fn test_output_under_a_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        assert!(ensure_output_writable(&blocker.join("report.json")).is_err());
    }
}
