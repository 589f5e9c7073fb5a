//! Rule-based scoring layers that need no judge model.
//!
//! - Format: is the output valid JSON
//! - Instruction following: simple answer constraints
//! - Retrieval: keyword overlap of retrieved documents
//! - Efficiency: latency and throughput thresholds

use crate::result::EvalResult;

/// Score 1.0 when `text` is valid JSON, 0.0 otherwise.
pub fn evaluate_json_format(text: &str) -> EvalResult {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(_) => EvalResult::new(1.0, "Valid JSON"),
        Err(_) => EvalResult::new(0.0, "Invalid JSON format"),
    }
}

/// A constraint the answer must respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// The answer must not apologize.
    NoApology,
    /// The answer must not exceed this many words.
    MaxWords(usize),
}

/// Penalty subtracted per violated constraint.
const CONSTRAINT_PENALTY: f64 = 0.5;

/// Check `answer` against each constraint, 0.5 off per violation.
pub fn evaluate_instruction_following(answer: &str, constraints: &[Constraint]) -> EvalResult {
    let lowered = answer.to_lowercase();
    let mut score = 1.0;
    let mut failed = Vec::new();

    for constraint in constraints {
        let violated = match constraint {
            Constraint::NoApology => lowered.contains("sorry") || lowered.contains("apologize"),
            Constraint::MaxWords(limit) => answer.split_whitespace().count() > *limit,
        };
        if violated {
            score -= CONSTRAINT_PENALTY;
            failed.push(match constraint {
                Constraint::NoApology => "Failed constraint: no_apology".to_string(),
                Constraint::MaxWords(limit) => format!("Failed constraint: under_{}_words", limit),
            });
        }
    }

    EvalResult::new(f64::max(0.0, score), failed.join("; "))
}

/// Fraction of `keywords` found (case-insensitively) in the retrieved documents.
pub fn evaluate_rag_context(retrieved_docs: &[String], keywords: &[String]) -> EvalResult {
    if retrieved_docs.is_empty() {
        return EvalResult::new(0.0, "No docs retrieved");
    }

    let full_text = retrieved_docs.join(" ").to_lowercase();
    let hits = keywords
        .iter()
        .filter(|kw| full_text.contains(&kw.to_lowercase()))
        .count();

    let score = if keywords.is_empty() {
        1.0
    } else {
        hits as f64 / keywords.len() as f64
    };

    EvalResult::new(score, format!("Found {} keywords", hits)).with_meta("hits", hits)
}

/// Pass/fail limits for the efficiency layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyThresholds {
    /// Slowest acceptable response, in seconds.
    pub max_latency_secs: f64,
    /// Lowest acceptable throughput, in words per second.
    pub min_words_per_sec: f64,
}

impl Default for EfficiencyThresholds {
    fn default() -> Self {
        Self {
            max_latency_secs: 2.0,
            min_words_per_sec: 5.0,
        }
    }
}

/// Score latency and throughput of one answer.
pub fn evaluate_efficiency(
    latency_secs: f64,
    word_count: usize,
    thresholds: &EfficiencyThresholds,
) -> EvalResult {
    let wps = if latency_secs > 0.0 {
        word_count as f64 / latency_secs
    } else {
        0.0
    };

    let mut score = 1.0;
    let mut reasons = Vec::new();

    if latency_secs > thresholds.max_latency_secs {
        score -= 0.5;
        reasons.push(format!(
            "High latency ({:.2}s > {}s)",
            latency_secs, thresholds.max_latency_secs
        ));
    }

    if wps < thresholds.min_words_per_sec {
        score -= 0.5;
        reasons.push(format!(
            "Low speed ({:.1} wps < {})",
            wps, thresholds.min_words_per_sec
        ));
    }

    let reasoning = if reasons.is_empty() {
        "Efficiency checks passed".to_string()
    } else {
        reasons.join("; ")
    };

    EvalResult::new(f64::max(0.0, score), reasoning)
        .with_meta("latency", latency_secs)
        .with_meta("wps", wps)
}
