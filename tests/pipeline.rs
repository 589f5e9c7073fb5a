//! End-to-end runs over the public API with an in-process judge.

use answer_judge::judge::{JudgeClient, JudgeTransport, TransportError};
use answer_judge::report::{RunSummary, load_summary, save_summary};
use answer_judge::{AccuracyEvaluator, BatchOrchestrator, ErrorCounts, EvalCase, load_cases};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Fails the first `failures` calls, then scores every id in the prompt.
struct FlakyJudge {
    failures: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl JudgeTransport for FlakyJudge {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<String, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(TransportError::new(None, "Error code: 503 - upstream unavailable"));
        }

        let ids: Vec<String> = prompt
            .lines()
            .filter_map(|line| line.trim().strip_prefix("\"id\": "))
            .map(|id| id.trim_end_matches(',').to_string())
            .collect();
        let entries: Vec<String> = ids
            .iter()
            .map(|id| format!(r#"{{"id": {id}, "score": 0.6}}"#))
            .collect();
        Ok(format!("Scores follow.\n[{}]", entries.join(",")))
    }
}

fn orchestrator(failures: usize) -> BatchOrchestrator {
    let transport = Arc::new(FlakyJudge {
        failures,
        calls: AtomicUsize::new(0),
    });
    let client = JudgeClient::new(transport, vec!["judge-primary".to_string()]);
    BatchOrchestrator::new(AccuracyEvaluator::new(client)).with_batch_size(10)
}

fn cases(n: i64) -> Vec<EvalCase> {
    (0..n)
        .map(|i| EvalCase::new(i, "gsm8k_main", format!("Question {i}"), "", format!("Answer {i}")))
        .collect()
}

#[tokio::test]
async fn failed_first_batch_is_reported_and_second_batch_scored() {
    let outcome = orchestrator(1).run(cases(12)).await;
    let summary = RunSummary::from_outcome(outcome);

    assert_eq!(summary.total_cases, 12);
    assert_eq!(
        summary.error_counts,
        ErrorCounts {
            judge_accuracy: 10,
            judge_parse: 0,
            judge_missing_score: 0,
        }
    );

    for record in &summary.details[..10] {
        assert_eq!(record.scores.accuracy, 0.0);
        assert_eq!(record.metadata["error_kind"], "judge_error");
        assert_eq!(record.metadata["error_code"], 503);
        assert_eq!(record.metadata["model_used"], "judge-primary");
        assert!(record.reasoning.accuracy.contains("upstream unavailable"));
    }
    for record in &summary.details[10..] {
        assert_eq!(record.scores.accuracy, 0.6);
        assert!(!record.metadata.contains_key("error_kind"));
    }
    assert!((summary.average_accuracy - 1.2 / 12.0).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_runs_produce_identical_summaries() {
    let first = RunSummary::from_outcome(orchestrator(0).run(cases(23)).await);
    let mut second = RunSummary::from_outcome(orchestrator(0).run(cases(23)).await);

    second.timestamp = first.timestamp.clone();
    assert_eq!(first, second);
    assert_eq!(first.error_counts.total(), 0);
}

#[tokio::test]
async fn loads_scores_and_persists_a_responses_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("responses.jsonl");
    std::fs::write(
        &input,
        "{\"prompt\": \"What is 2+2?\", \"response\": \"4\"}\n{\"prompt\": \"Largest planet?\", \"response\": \"Jupiter\"}\n",
    )
    .unwrap();

    let cases = load_cases(&input, None).unwrap();
    let summary = RunSummary::from_outcome(orchestrator(0).run(cases).await);

    let output = dir.path().join("results").join("report.json");
    save_summary(&summary, &output).unwrap();

    let saved = load_summary(&output).unwrap();
    assert_eq!(saved.total_cases, 2);
    assert_eq!(saved.details[1].query, "Largest planet?");
    assert_eq!(saved.details[1].system_answer, "Jupiter");
    assert_eq!(saved.details[1].dataset_id, "responses");
    assert_eq!(saved.details[1].scores.accuracy, 0.6);
}

#[tokio::test]
async fn rule_layers_score_alongside_accuracy() {
    use answer_judge::rules::{
        Constraint, EfficiencyThresholds, evaluate_efficiency, evaluate_instruction_following,
        evaluate_json_format, evaluate_rag_context,
    };

    let case = EvalCase::new(
        0,
        "rag_demo",
        "Capital of France?",
        "Paris",
        "Sorry, it is Paris.",
    );
    let outcome = orchestrator(0).run(vec![case.clone()]).await;
    assert_eq!(outcome.scored[0].accuracy.score, 0.6);

    let answer = &case.candidate_answer;
    let format = evaluate_json_format(answer);
    let instructions =
        evaluate_instruction_following(answer, &[Constraint::NoApology, Constraint::MaxWords(10)]);
    let docs = vec!["Paris is the capital and largest city of France.".to_string()];
    let retrieval = evaluate_rag_context(&docs, &["paris".to_string(), "lyon".to_string()]);
    let words = answer.split_whitespace().count();
    let efficiency = evaluate_efficiency(0.5, words, &EfficiencyThresholds::default());

    assert_eq!(format.score, 0.0);
    assert_eq!(instructions.score, 0.5);
    assert_eq!(retrieval.score, 0.5);
    assert_eq!(retrieval.metadata["hits"], 1);
    assert_eq!(efficiency.score, 1.0);
    for result in [&format, &instructions, &retrieval, &efficiency] {
        assert!(!result.is_error());
    }
}
