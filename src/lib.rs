//! Answer Judge - LLM-as-judge scoring of question-answering output.
//!
//! Scores candidate answers against reference answers by asking a remote
//! judge model, and keeps the report computable when the judge is
//! unreachable, retired, or replies with something that is not a score.
//!
//! # Quick Start
//!
//! ```no_run
//! use answer_judge::{
//!     config::Config,
//!     dataset::load_cases,
//!     judge::{HttpTransport, JudgeClient},
//!     report::{save_summary, RunSummary},
//!     AccuracyEvaluator, BatchOrchestrator,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let transport = Arc::new(HttpTransport::new(&config.judge)?);
//!     let client = JudgeClient::new(transport, config.judge.fallback_chain());
//!
//!     let cases = load_cases(Path::new("responses.jsonl"), None)?;
//!     let outcome = BatchOrchestrator::new(AccuracyEvaluator::new(client))
//!         .with_batch_size(config.run.batch_size)
//!         .run(cases)
//!         .await;
//!
//!     let summary = RunSummary::from_outcome(outcome);
//!     save_summary(&summary, Path::new("results/report.json"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **JudgeClient**: calls the judge, walking the model fallback chain on 404
//! - **score**: extracts scores from free-text and JSON-array judge replies
//! - **AccuracyEvaluator**: builds prompts and maps replies to `EvalResult`s
//! - **BatchOrchestrator**: splits cases into batches and counts failures
//! - **report**: assembles and persists the run summary
//! - **rules**: judge-free format, retrieval and efficiency checks

pub mod accuracy;
pub mod config;
pub mod dataset;
pub mod error;
pub mod judge;
pub mod orchestrator;
pub mod report;
pub mod result;
pub mod rules;
pub mod score;

// Re-export commonly used types
pub use accuracy::AccuracyEvaluator;
pub use config::Config;
pub use dataset::{EvalCase, load_cases};
pub use error::{EvalError, Result};
pub use judge::{JudgeClient, JudgeOutcome};
pub use orchestrator::{BatchOrchestrator, ErrorCounts, EvalMode, RunOutcome};
pub use report::{RunSummary, save_summary};
pub use result::{ErrorKind, EvalResult};
