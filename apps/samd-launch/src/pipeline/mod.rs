//! # Pipeline Runner
//!
//! Drives each `MarketRecord` through Risk, Opportunity, Readiness and
//! Decision against a `GenerationProvider`.
//!
//! ## Guarantees
//!
//! - Stages of one record run strictly in order; each stage sees only the
//!   narratives committed before it.
//! - Records are independent: a failing record never halts or alters
//!   another one.
//! - A record's narratives are published only once all four are present.
//! - Every generation call passes through one `CallGate`, which bounds
//!   in-flight calls and, optionally, the call rate.

mod gate;
mod progress;
mod retry;
mod runner;

pub use gate::CallGate;
pub use progress::ProgressEvent;
pub use retry::{RetryOutcome, RetryPolicy};
pub use runner::{BatchReport, CompletedAssessment, RecordFailure, RecordOutcome, Runner};
