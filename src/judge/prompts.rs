//! Prompts sent to the judge model.

use crate::dataset::EvalCase;
use serde::Serialize;

/// Item of the batch prompt payload.
#[derive(Debug, Serialize)]
struct BatchItem<'a> {
    id: i64,
    question: &'a str,
    ground_truth: &'a str,
    student_answer: &'a str,
}

/// Collection of judge prompts.
pub struct Prompts;

impl Prompts {
    /// Prompt scoring a single answer.
    ///
    /// With a reference answer the judge rates semantic equivalence,
    /// otherwise free-standing correctness and completeness.
    pub fn single(question: &str, candidate: &str, ground_truth: &str) -> String {
        if ground_truth.trim().is_empty() {
            format!(
                r#"You are an impartial judge.
Question: {question}
Student Answer: {candidate}

Rate how correct and complete the Student Answer is for the Question.
Return ONLY a score between 0.0 and 1.0."#
            )
        } else {
            format!(
                r#"You are an impartial judge.
Question: {question}
Ground Truth: {ground_truth}
Student Answer: {candidate}

Does the Student Answer convey the same meaning as the Ground Truth?
Return ONLY a score between 0.0 and 1.0."#
            )
        }
    }

    /// Prompt scoring a batch of cases in one call.
    pub fn batch(cases: &[EvalCase]) -> String {
        let items: Vec<BatchItem<'_>> = cases
            .iter()
            .map(|c| BatchItem {
                id: c.id,
                question: &c.question,
                ground_truth: &c.ground_truth,
                student_answer: &c.candidate_answer,
            })
            .collect();
        // Serializing borrowed strings and integers cannot fail.
        let payload = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string());

        format!(
            r#"You are an impartial judge grading student answers.

For each item below, score the student_answer between 0.0 and 1.0:
- If ground_truth is not empty, score how well the student_answer conveys the same meaning as the ground_truth.
- If ground_truth is empty, score how correct and complete the student_answer is for the question.

Items:
{payload}

Respond with a JSON array containing one object per item, in this format:
[
    {{"id": <item id>, "score": <number between 0.0 and 1.0>}},
    ...
]

Directly return the JSON array. Do not output anything else."#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_prompt_switches_on_ground_truth() {
        let with_ref = Prompts::single("Q?", "cand", "ref");
        assert!(with_ref.contains("Ground Truth: ref"));
        assert!(with_ref.contains("same meaning"));

        let without_ref = Prompts::single("Q?", "cand", "  ");
        assert!(!without_ref.contains("Ground Truth"));
        assert!(without_ref.contains("correct and complete"));
        assert!(without_ref.contains("Student Answer: cand"));
    }

    #[test]
    fn test_batch_prompt_carries_items() {
        let cases = vec![
            EvalCase::new(3, "ds", "What is 2+2?", "4", "four"),
            EvalCase::new(7, "ds", "Say \"hi\"", "", "hi"),
        ];
        let prompt = Prompts::batch(&cases);

        let start = prompt.find("Items:\n").unwrap() + "Items:\n".len();
        let end = prompt.find("\n\nRespond with").unwrap();
        let items: serde_json::Value = serde_json::from_str(&prompt[start..end]).unwrap();

        assert_eq!(items[0]["id"], 3);
        assert_eq!(items[0]["student_answer"], "four");
        assert_eq!(items[1]["question"], "Say \"hi\"");
        assert_eq!(items[1]["ground_truth"], "");
        assert!(prompt.contains(r#"{"id": <item id>, "score""#));
    }
}
