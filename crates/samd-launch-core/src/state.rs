//! # Assessment State
//!
//! The per-record accumulator threaded through the four stages.
//!
//! An `AssessmentState` owns its `MarketRecord` and gains one narrative per
//! stage. Narratives can only be added in pipeline order and are never
//! overwritten: [`AssessmentState::with_narrative`] consumes the state and
//! returns the next snapshot, or an error if the stage is out of turn.

use crate::stages::StageKind;
use crate::{MarketRecord, SamdError};
use serde::Serialize;

/// Accumulated assessment of one market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentState {
    record: MarketRecord,
    risk_summary: Option<String>,
    opportunity_summary: Option<String>,
    readiness_summary: Option<String>,
    final_decision: Option<String>,
}

impl AssessmentState {
    /// Fresh state with no narratives.
    #[must_use]
    pub fn new(record: MarketRecord) -> Self {
        Self {
            record,
            risk_summary: None,
            opportunity_summary: None,
            readiness_summary: None,
            final_decision: None,
        }
    }

    #[must_use]
    pub fn record(&self) -> &MarketRecord {
        &self.record
    }

    #[must_use]
    pub fn country(&self) -> &str {
        self.record.country()
    }

    #[must_use]
    pub fn risk_summary(&self) -> Option<&str> {
        self.risk_summary.as_deref()
    }

    #[must_use]
    pub fn opportunity_summary(&self) -> Option<&str> {
        self.opportunity_summary.as_deref()
    }

    #[must_use]
    pub fn readiness_summary(&self) -> Option<&str> {
        self.readiness_summary.as_deref()
    }

    #[must_use]
    pub fn final_decision(&self) -> Option<&str> {
        self.final_decision.as_deref()
    }

    /// Narrative produced by `stage`, if it has run.
    #[must_use]
    pub fn narrative(&self, stage: StageKind) -> Option<&str> {
        match stage {
            StageKind::Risk => self.risk_summary(),
            StageKind::Opportunity => self.opportunity_summary(),
            StageKind::Readiness => self.readiness_summary(),
            StageKind::Decision => self.final_decision(),
        }
    }

    /// The first stage whose narrative is still absent.
    #[must_use]
    pub fn next_stage(&self) -> Option<StageKind> {
        StageKind::ALL
            .into_iter()
            .find(|stage| self.narrative(*stage).is_none())
    }

    /// Stages that have completed, in order.
    #[must_use]
    pub fn completed_stages(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .take_while(|stage| self.narrative(*stage).is_some())
            .collect()
    }

    /// True once the decision narrative is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.next_stage().is_none()
    }

    /// Record the narrative for `stage` and return the advanced snapshot.
    ///
    /// # Errors
    /// - `SamdError::StageOrder` if `stage` is not the next stage
    /// - `SamdError::EmptyNarrative` if `text` is blank
    pub fn with_narrative(
        mut self,
        stage: StageKind,
        text: impl Into<String>,
    ) -> Result<Self, SamdError> {
        let expected = self.next_stage();
        if expected != Some(stage) {
            return Err(SamdError::StageOrder {
                expected,
                got: stage,
            });
        }

        let text = text.into();
        if text.trim().is_empty() {
            return Err(SamdError::EmptyNarrative(stage));
        }

        let slot = match stage {
            StageKind::Risk => &mut self.risk_summary,
            StageKind::Opportunity => &mut self.opportunity_summary,
            StageKind::Readiness => &mut self.readiness_summary,
            StageKind::Decision => &mut self.final_decision,
        };
        *slot = Some(text);
        Ok(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
