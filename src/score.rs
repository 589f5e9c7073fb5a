//! Score extraction from judge replies.
//!
//! Judges are asked for bare numbers or a bare JSON array but often wrap
//! them in prose. Both parsers accept that and reject anything they cannot
//! confidently read rather than guessing a value.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

/// The batch reply held no decodable JSON array.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("no JSON array of scores found in judge reply")]
pub struct BatchParseError;

fn number_pattern() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)").expect("valid regex"))
}

/// Extract a single score from free text.
///
/// Takes the last number in the text that lies within [0.0, 1.0]; returns
/// `None` when no number qualifies.
pub fn parse_single_score(text: &str) -> Option<f64> {
    number_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| (0.0..=1.0).contains(v))
        .last()
}

/// Extract per-id scores from a batch reply.
///
/// The full text is decoded first; failing that, the first JSON array that
/// starts at a `[` in the text, ignoring whatever follows it. Entries
/// without an integer `id` or with a `score` that is missing, non-numeric
/// or outside [0.0, 1.0] are dropped. When an id appears more than once the
/// first valid entry wins.
pub fn parse_batch_scores(text: &str) -> Result<HashMap<i64, f64>, BatchParseError> {
    let entries = decode_array(text.trim())
        .or_else(|| first_embedded_array(text))
        .ok_or(BatchParseError)?;

    let mut scores = HashMap::with_capacity(entries.len());
    for entry in &entries {
        let Some(id) = entry.get("id").and_then(Value::as_i64) else {
            continue;
        };
        let Some(score) = entry.get("score").and_then(Value::as_f64) else {
            continue;
        };
        if !(0.0..=1.0).contains(&score) {
            continue;
        }
        scores.entry(id).or_insert(score);
    }

    Ok(scores)
}

/// First `[` offset at which a complete JSON array can be read.
fn first_embedded_array(text: &str) -> Option<Vec<Value>> {
    text.match_indices('[').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Array(items))) => Some(items),
            _ => None,
        }
    })
}

fn decode_array(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_bare_number() {
        assert_eq!(parse_single_score("0.75"), Some(0.75));
        assert_eq!(parse_single_score("  1.0\n"), Some(1.0));
        assert_eq!(parse_single_score("0"), Some(0.0));
        assert_eq!(parse_single_score(".5"), Some(0.5));
    }

    #[test]
    fn test_single_prefers_last_number() {
        assert_eq!(
            parse_single_score("The intermediate value 5 is wrong, final score 0.8"),
            Some(0.8)
        );
        assert_eq!(parse_single_score("Score: 0.2. On reflection: 0.6"), Some(0.6));
    }

    #[test]
    fn test_single_skips_out_of_range_numbers() {
        assert_eq!(parse_single_score("0.9 out of 10"), Some(0.9));
        assert_eq!(
            parse_single_score("Final score: 0.7 (on a scale where 5 is unused)"),
            Some(0.7)
        );
        assert_eq!(parse_single_score("-0.5"), None);
        assert_eq!(parse_single_score("score 8/10"), None);
    }

    #[test]
    fn test_single_no_number() {
        assert_eq!(parse_single_score("The answer is correct."), None);
        assert_eq!(parse_single_score(""), None);
    }

    #[test]
    fn test_batch_bare_array() {
        let scores =
            parse_batch_scores(r#"[{"id": 0, "score": 0.9}, {"id": 1, "score": 0}]"#).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&0], 0.9);
        assert_eq!(scores[&1], 0.0);
    }

    #[test]
    fn test_batch_array_wrapped_in_prose() {
        let text = "Here are the scores:\n```json\n[{\"id\": 4, \"score\": 0.5}]\n```\nHope that helps!";
        let scores = parse_batch_scores(text).unwrap();
        assert_eq!(scores[&4], 0.5);
    }

    #[test]
    fn test_batch_array_followed_by_bracketed_prose() {
        let text = "[{\"id\": 0, \"score\": 0.9}, {\"id\": 1, \"score\": 0.4}]\nNote: all scores are in [0, 1].";
        let scores = parse_batch_scores(text).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&0], 0.9);
        assert_eq!(scores[&1], 0.4);

        let text = "Scores [see below]:\n[{\"id\": 2, \"score\": 0.1}] (range [0, 1])";
        assert_eq!(parse_batch_scores(text).unwrap()[&2], 0.1);
    }

    #[test]
    fn test_batch_discards_invalid_entries() {
        let text = r#"[
            {"id": 1, "score": 0.3},
            {"id": 2, "score": 1.5},
            {"id": "three", "score": 0.4},
            {"id": 4},
            {"score": 0.9},
            {"id": 5, "score": "high"},
            7,
            {"id": 1, "score": 0.8}
        ]"#;
        let scores = parse_batch_scores(text).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[&1], 0.3);
    }

    #[test]
    fn test_batch_unparseable() {
        assert_eq!(parse_batch_scores("I cannot grade these."), Err(BatchParseError));
        assert_eq!(parse_batch_scores(r#"{"id": 1, "score": 0.5}"#), Err(BatchParseError));
        assert_eq!(parse_batch_scores("] nothing ["), Err(BatchParseError));
        assert_eq!(parse_batch_scores("[1, 2"), Err(BatchParseError));
    }

    #[test]
    fn test_batch_empty_array_is_valid() {
        assert!(parse_batch_scores("[]").unwrap().is_empty());
    }
}
