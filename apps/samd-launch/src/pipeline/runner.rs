use std::io::Write;
use std::sync::Arc;

use samd_launch_core::{
    AssessmentState, DecisionOutcome, MarketRecord, SamdError, StageKind, StageLevels,
    parse_decision, report_to_string, write_report,
};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::Instrument;

use crate::config::{DecisionPolicy, RunnerSettings};
use crate::generation::{GenerationError, GenerationProvider, GenerationRequest};
use crate::pipeline::gate::CallGate;
use crate::pipeline::progress::ProgressEvent;
use crate::pipeline::retry::RetryPolicy;

// =============================================================================
// OUTCOMES
// =============================================================================

/// A record that went through all four stages.
#[derive(Debug, Clone)]
pub struct CompletedAssessment {
    pub index: usize,
    pub state: AssessmentState,
    pub decision: DecisionOutcome,
    pub levels: StageLevels,
}

impl CompletedAssessment {
    #[must_use]
    pub fn country(&self) -> &str {
        self.state.country()
    }
}

/// A record that stopped before its decision.
///
/// `stage` is the stage that failed; `None` when the failure happened
/// outside any stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub index: usize,
    pub country: String,
    pub stage: Option<StageKind>,
    pub attempts: u32,
    pub error: String,
}

#[derive(Debug, Clone)]
pub enum RecordOutcome {
    Completed(CompletedAssessment),
    Failed(RecordFailure),
}

impl RecordOutcome {
    #[must_use]
    pub fn country(&self) -> &str {
        match self {
            RecordOutcome::Completed(c) => c.country(),
            RecordOutcome::Failed(f) => &f.country,
        }
    }

    #[must_use]
    pub fn completed(&self) -> Option<&CompletedAssessment> {
        match self {
            RecordOutcome::Completed(c) => Some(c),
            RecordOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&RecordFailure> {
        match self {
            RecordOutcome::Completed(_) => None,
            RecordOutcome::Failed(f) => Some(f),
        }
    }
}

/// Per-record outcomes of a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    #[must_use]
    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    pub fn completed(&self) -> impl Iterator<Item = &CompletedAssessment> {
        self.outcomes.iter().filter_map(RecordOutcome::completed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RecordFailure> {
        self.outcomes.iter().filter_map(RecordOutcome::failure)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed().count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Completed records whose decision narrative had no readable token.
    #[must_use]
    pub fn malformed_count(&self) -> usize {
        self.completed().filter(|c| c.decision.is_malformed()).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_count() == 0
    }

    /// Write the launch report for the completed records.
    pub fn write_report<W: Write>(&self, out: W) -> Result<(), SamdError> {
        write_report(out, self.completed().map(|c| &c.state))
    }

    /// The launch report for the completed records as CSV text.
    pub fn report_csv(&self) -> Result<String, SamdError> {
        report_to_string(self.completed().map(|c| &c.state))
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// Runs records through the four stages against one provider.
///
/// Cheap to clone; clones share the provider and the call gate.
#[derive(Clone)]
pub struct Runner {
    provider: Arc<dyn GenerationProvider>,
    gate: CallGate,
    retry: RetryPolicy,
    policy: DecisionPolicy,
}

impl Runner {
    #[must_use]
    pub fn new(provider: Arc<dyn GenerationProvider>, settings: &RunnerSettings) -> Self {
        Self {
            provider,
            gate: CallGate::new(settings.max_concurrent_calls, settings.calls_per_second),
            retry: RetryPolicy::from(settings),
            policy: settings.decision_policy,
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    #[must_use]
    pub fn gate(&self) -> &CallGate {
        &self.gate
    }

    /// Run one record through all four stages.
    pub async fn assess_record(&self, record: MarketRecord) -> RecordOutcome {
        self.assess(0, record, None).await
    }

    /// Run every record, concurrently, and collect outcomes in input order.
    ///
    /// A failing record is reported in place and never stops the others.
    pub async fn run_batch(
        &self,
        records: Vec<MarketRecord>,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> BatchReport {
        let countries: Vec<String> = records.iter().map(|r| r.country().to_string()).collect();
        tracing::info!(
            records = records.len(),
            provider = self.provider.name(),
            model = self.provider.model(),
            max_concurrent = self.gate.max_concurrent(),
            "batch started"
        );

        let mut tasks = JoinSet::new();
        for (index, record) in records.into_iter().enumerate() {
            let runner = self.clone();
            let progress = progress.clone();
            tasks.spawn(async move {
                let outcome = runner.assess(index, record, progress.as_ref()).await;
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<RecordOutcome>> = countries.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => tracing::error!(error = %e, "assessment task aborted"),
            }
        }

        let outcomes: Vec<RecordOutcome> = slots
            .into_iter()
            .zip(countries)
            .enumerate()
            .map(|(index, (slot, country))| {
                slot.unwrap_or_else(|| {
                    RecordOutcome::Failed(RecordFailure {
                        index,
                        country,
                        stage: None,
                        attempts: 0,
                        error: "assessment task aborted".to_string(),
                    })
                })
            })
            .collect();

        let report = BatchReport { outcomes };
        tracing::info!(
            total = report.total(),
            completed = report.completed_count(),
            failed = report.failed_count(),
            malformed = report.malformed_count(),
            "batch finished"
        );
        report
    }

    async fn assess(
        &self,
        index: usize,
        record: MarketRecord,
        progress: Option<&UnboundedSender<ProgressEvent>>,
    ) -> RecordOutcome {
        let span = tracing::info_span!("assess", index, country = %record.country());
        self.assess_in_span(index, record, progress)
            .instrument(span)
            .await
    }

    async fn assess_in_span(
        &self,
        index: usize,
        record: MarketRecord,
        progress: Option<&UnboundedSender<ProgressEvent>>,
    ) -> RecordOutcome {
        let country = record.country().to_string();
        emit(
            progress,
            ProgressEvent::RecordStarted {
                index,
                country: country.clone(),
            },
        );

        let mut state = AssessmentState::new(record);
        for stage in StageKind::ALL {
            let (text, attempts) = match self.run_stage(&state, stage).await {
                Ok(done) => done,
                Err((error, attempts)) => {
                    return fail(progress, index, country, Some(stage), attempts, error);
                }
            };
            state = match state.with_narrative(stage, text) {
                Ok(next) => next,
                Err(e) => {
                    return fail(progress, index, country, Some(stage), attempts, e.to_string());
                }
            };
            tracing::info!(stage = %stage, attempts, "stage completed");
            emit(
                progress,
                ProgressEvent::StageCompleted {
                    index,
                    country: country.clone(),
                    stage,
                    attempts,
                },
            );
        }

        let decision = parse_decision(state.final_decision().unwrap_or_default());
        if let Some(warning) = decision.warning() {
            tracing::warn!(%warning, "decision narrative has no readable token, stored as is");
        }
        let levels = StageLevels::from_state(&state);

        emit(
            progress,
            ProgressEvent::RecordCompleted {
                index,
                country,
                decision: decision.decision(),
            },
        );
        RecordOutcome::Completed(CompletedAssessment {
            index,
            state,
            decision,
            levels,
        })
    }

    /// Prepare and run one stage, with retries. Returns the narrative and the
    /// number of generation calls made.
    async fn run_stage(
        &self,
        state: &AssessmentState,
        stage: StageKind,
    ) -> Result<(String, u32), (String, u32)> {
        let prompt = stage.prepare(state).map_err(|e| (e.to_string(), 0))?;
        let outcome = self
            .retry
            .execute(|attempt| {
                let request = GenerationRequest::from(prompt.clone());
                async move { self.call(request, attempt).await }
            })
            .await;
        match outcome.result {
            Ok(text) => Ok((text, outcome.attempts)),
            Err(e) => Err((e.to_string(), outcome.attempts)),
        }
    }

    /// One gated generation call plus the checks that make its text usable.
    async fn call(&self, request: GenerationRequest, attempt: u32) -> Result<String, GenerationError> {
        let stage = request.stage;
        let response = {
            let _permit = self.gate.acquire().await?;
            self.provider.generate(request).await?
        };

        if response.text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        tracing::debug!(
            stage = %stage,
            attempt,
            provider = %response.provider,
            model = %response.model,
            usage_tokens = ?response.usage_tokens,
            "generation call completed"
        );

        if stage == StageKind::Decision && self.policy == DecisionPolicy::Strict {
            if let DecisionOutcome::Malformed { warning } = parse_decision(&response.text) {
                return Err(GenerationError::MalformedDecision(warning));
            }
        }
        Ok(response.text)
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("gate", &self.gate)
            .field("retry", &self.retry)
            .field("policy", &self.policy)
            .finish()
    }
}

fn emit(progress: Option<&UnboundedSender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        // A closed receiver only means nobody is watching.
        let _ = tx.send(event);
    }
}

fn fail(
    progress: Option<&UnboundedSender<ProgressEvent>>,
    index: usize,
    country: String,
    stage: Option<StageKind>,
    attempts: u32,
    error: String,
) -> RecordOutcome {
    tracing::error!(stage = ?stage, attempts, error = %error, "record failed");
    emit(
        progress,
        ProgressEvent::RecordFailed {
            index,
            country: country.clone(),
            stage,
            error: error.clone(),
        },
    );
    RecordOutcome::Failed(RecordFailure {
        index,
        country,
        stage,
        attempts,
        error,
    })
}
