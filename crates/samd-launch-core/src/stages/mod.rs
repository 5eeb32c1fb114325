//! # Assessment Stages
//!
//! The four fixed stages of a launch assessment and the prompts they send to
//! the text-generation capability.
//!
//! | Order | Stage | Reads | Writes |
//! |-------|-------|-------|--------|
//! | 1 | Risk | record risk fields | `risk_summary` |
//! | 2 | Opportunity | `risk_score`, wealth, population, risk narrative | `opportunity_summary` |
//! | 3 | Readiness | record readiness fields only | `readiness_summary` |
//! | 4 | Decision | the three narratives verbatim | `final_decision` |
//!
//! Readiness runs third but deliberately ignores the risk and opportunity
//! narratives; it is assessed on its own evidence.
//!
//! This module only builds prompts and interprets narratives. Calling the
//! generation capability is the app crate's job.

pub mod decision;
pub mod opportunity;
pub mod readiness;
pub mod risk;

pub use decision::{Decision, DecisionOutcome, MalformedOutputWarning, parse_decision};
pub use opportunity::RoiLevel;
pub use readiness::ReadinessVerdict;
pub use risk::RiskLevel;

use crate::{AssessmentState, SamdError};
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE KIND
// =============================================================================

/// One of the four assessment stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Risk,
    Opportunity,
    Readiness,
    Decision,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [StageKind; 4] = [
        StageKind::Risk,
        StageKind::Opportunity,
        StageKind::Readiness,
        StageKind::Decision,
    ];

    /// Human-readable stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Risk => "Risk & Impact",
            StageKind::Opportunity => "Opportunity & ROI",
            StageKind::Readiness => "Readiness & Capability",
            StageKind::Decision => "Final Decision",
        }
    }

    /// Short machine key, used in logs and JSON.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            StageKind::Risk => "risk",
            StageKind::Opportunity => "opportunity",
            StageKind::Readiness => "readiness",
            StageKind::Decision => "decision",
        }
    }

    /// Column header of this stage's narrative in the launch report.
    #[must_use]
    pub fn report_column(&self) -> &'static str {
        match self {
            StageKind::Risk => "Risk Summary",
            StageKind::Opportunity => "Opportunity Summary",
            StageKind::Readiness => "Readiness Summary",
            StageKind::Decision => "Final Decision",
        }
    }

    /// Zero-based position in the pipeline.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            StageKind::Risk => 0,
            StageKind::Opportunity => 1,
            StageKind::Readiness => 2,
            StageKind::Decision => 3,
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<StageKind> {
        match self {
            StageKind::Risk => Some(StageKind::Opportunity),
            StageKind::Opportunity => Some(StageKind::Readiness),
            StageKind::Readiness => Some(StageKind::Decision),
            StageKind::Decision => None,
        }
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(&self) -> Option<StageKind> {
        match self {
            StageKind::Risk => None,
            StageKind::Opportunity => Some(StageKind::Risk),
            StageKind::Readiness => Some(StageKind::Opportunity),
            StageKind::Decision => Some(StageKind::Readiness),
        }
    }

    /// Check if this stage is terminal (Decision).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageKind::Decision)
    }

    /// Narratives this stage's prompt reads.
    #[must_use]
    pub fn inputs(&self) -> &'static [StageKind] {
        match self {
            StageKind::Risk | StageKind::Readiness => &[],
            StageKind::Opportunity => &[StageKind::Risk],
            StageKind::Decision => &[
                StageKind::Risk,
                StageKind::Opportunity,
                StageKind::Readiness,
            ],
        }
    }

    /// The role instruction sent as the system message.
    #[must_use]
    pub fn role_instruction(&self) -> &'static str {
        match self {
            StageKind::Risk => risk::ROLE_INSTRUCTION,
            StageKind::Opportunity => opportunity::ROLE_INSTRUCTION,
            StageKind::Readiness => readiness::ROLE_INSTRUCTION,
            StageKind::Decision => decision::ROLE_INSTRUCTION,
        }
    }

    /// Build the role instruction and task prompt for this stage.
    ///
    /// # Errors
    /// Returns `SamdError::MissingNarrative` if a narrative this stage reads
    /// has not been produced yet.
    pub fn prepare(&self, state: &AssessmentState) -> Result<StagePrompt, SamdError> {
        let narrative = |needs: StageKind| {
            state
                .narrative(needs)
                .ok_or(SamdError::MissingNarrative {
                    stage: *self,
                    needs,
                })
        };

        let record = state.record();
        let prompt = match self {
            StageKind::Risk => risk::prompt(record),
            StageKind::Opportunity => opportunity::prompt(record, narrative(StageKind::Risk)?),
            StageKind::Readiness => readiness::prompt(record),
            StageKind::Decision => decision::prompt(
                narrative(StageKind::Risk)?,
                narrative(StageKind::Opportunity)?,
                narrative(StageKind::Readiness)?,
            ),
        };

        Ok(StagePrompt {
            stage: *self,
            role_instruction: self.role_instruction().to_string(),
            prompt,
        })
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// STAGE PROMPT
// =============================================================================

/// A ready-to-send generation request for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePrompt {
    pub stage: StageKind,
    pub role_instruction: String,
    pub prompt: String,
}

// =============================================================================
// LEVEL EXTRACTION
// =============================================================================

/// Qualitative levels the stage narratives are asked to end with.
///
/// Extraction is best effort; the narratives themselves are authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLevels {
    pub risk: Option<RiskLevel>,
    pub roi: Option<RoiLevel>,
    pub readiness: Option<ReadinessVerdict>,
}

impl StageLevels {
    /// Extract whatever levels the narratives of `state` state.
    #[must_use]
    pub fn from_state(state: &AssessmentState) -> Self {
        Self {
            risk: state.risk_summary().and_then(RiskLevel::extract),
            roi: state.opportunity_summary().and_then(RoiLevel::extract),
            readiness: state.readiness_summary().and_then(ReadinessVerdict::extract),
        }
    }
}

/// Find the labelled level in `text`.
///
/// Scans lines from the end for one mentioning any of `hints`; within that
/// line, looks after the last `:` if there is one, and returns the option
/// whose keyword appears first as a whole word. Multi-word keywords must be
/// listed before their suffixes (`"not ready"` before `"ready"`).
pub(crate) fn extract_labelled<T: Copy>(
    text: &str,
    hints: &[&str],
    options: &[(&str, T)],
) -> Option<T> {
    for line in text.lines().rev() {
        let lower = line.to_ascii_lowercase();
        if !hints.iter().any(|h| lower.contains(h)) {
            continue;
        }

        let tail = lower.rsplit_once(':').map_or(lower.as_str(), |(_, t)| t);
        let mut best: Option<(usize, T)> = None;
        for (keyword, value) in options {
            if let Some(pos) = find_word(tail, keyword) {
                if best.is_none_or(|(p, _)| pos < p) {
                    best = Some((pos, *value));
                }
            }
        }
        if let Some((_, value)) = best {
            return Some(value);
        }
    }
    None
}

/// Position of `word` in `haystack` bounded by non-alphanumeric characters.
fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = haystack.get(from..).and_then(|s| s.find(word)) {
        let start = from + rel;
        let end = start + word.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(start);
        }
        from = end;
    }
    None
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::brazil_record;

    #[test]
    fn stage_ordering() {
        assert!(StageKind::Risk < StageKind::Opportunity);
        assert!(StageKind::Opportunity < StageKind::Readiness);
        assert!(StageKind::Readiness < StageKind::Decision);
        for (i, stage) in StageKind::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn next_and_previous_are_inverse() {
        for stage in StageKind::ALL {
            if let Some(next) = stage.next() {
                assert_eq!(next.previous(), Some(stage));
            }
        }
        assert!(StageKind::Decision.is_terminal());
        assert_eq!(StageKind::Risk.previous(), None);
    }

    #[test]
    fn readiness_reads_no_narratives() {
        assert!(StageKind::Readiness.inputs().is_empty());
        assert_eq!(StageKind::Decision.inputs().len(), 3);
    }

    #[test]
    fn opportunity_prompt_requires_risk_narrative() {
        let state = AssessmentState::new(brazil_record());
        let err = StageKind::Opportunity
            .prepare(&state)
            .expect_err("no risk yet");
        assert!(matches!(
            err,
            SamdError::MissingNarrative {
                stage: StageKind::Opportunity,
                needs: StageKind::Risk
            }
        ));
    }

    #[test]
    fn readiness_prompt_ignores_prior_narratives() {
        let bare = AssessmentState::new(brazil_record());
        let advanced = bare
            .clone()
            .with_narrative(StageKind::Risk, "RISK-NARRATIVE-MARKER")
            .and_then(|s| s.with_narrative(StageKind::Opportunity, "ROI-NARRATIVE-MARKER"))
            .expect("advance");

        let a = StageKind::Readiness.prepare(&bare).expect("prompt");
        let b = StageKind::Readiness.prepare(&advanced).expect("prompt");
        assert_eq!(a, b);
        assert!(!b.prompt.contains("NARRATIVE-MARKER"));
    }

    #[test]
    fn decision_prompt_embeds_narratives_verbatim() {
        let state = AssessmentState::new(brazil_record())
            .with_narrative(StageKind::Risk, "risk body\nlevel: Medium")
            .and_then(|s| s.with_narrative(StageKind::Opportunity, "roi body"))
            .and_then(|s| s.with_narrative(StageKind::Readiness, "ready body"))
            .expect("advance");
        let prompt = StageKind::Decision.prepare(&state).expect("prompt");
        assert!(prompt.prompt.contains("risk body\nlevel: Medium"));
        assert!(prompt.prompt.contains("roi body"));
        assert!(prompt.prompt.contains("ready body"));
        assert_eq!(prompt.role_instruction, decision::ROLE_INSTRUCTION);
    }

    #[test]
    fn find_word_respects_boundaries() {
        assert_eq!(find_word("highly likely, high", "high"), Some(15));
        assert_eq!(find_word("not ready", "ready"), Some(4));
        assert_eq!(find_word("readiness", "ready"), None);
    }

    #[test]
    fn levels_from_state() {
        let state = AssessmentState::new(brazil_record())
            .with_narrative(StageKind::Risk, "...\nFinal Risk Impact Level: Medium")
            .and_then(|s| s.with_narrative(StageKind::Opportunity, "ROI Summary: **High**"))
            .and_then(|s| {
                s.with_narrative(StageKind::Readiness, "Final Readiness Verdict: Not Ready")
            })
            .expect("advance");
        let levels = StageLevels::from_state(&state);
        assert_eq!(levels.risk, Some(RiskLevel::Medium));
        assert_eq!(levels.roi, Some(RoiLevel::High));
        assert_eq!(levels.readiness, Some(ReadinessVerdict::NotReady));
    }
}
