//! # samd-launch-core
//!
//! The deterministic assessment core for samd-launch.
//!
//! This crate turns a tabular survey of candidate markets into validated,
//! scored `MarketRecord`s and defines the four-stage assessment contract a
//! text-generation capability is driven through:
//!
//! ```text
//! Risk -> Opportunity -> Readiness -> Decision
//! ```
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Has NO async and NO network dependencies (pure Rust)
//! - Never calls a text-generation capability; it only builds prompts and
//!   interprets the narratives handed back
//! - Rejects an invalid batch as a whole, before any stage can run
//! - Advances an `AssessmentState` one stage at a time, in order, without
//!   ever overwriting a narrative

// =============================================================================
// MODULES
// =============================================================================

pub mod export;
pub mod formats;
pub mod ingestor;
pub mod primitives;
pub mod scoring;
pub mod stages;
pub mod state;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{MarketInput, MarketRecord, Population, SamdError, ValidationError};

// =============================================================================
// RE-EXPORTS: Assessment
// =============================================================================

pub use export::{
    REPORT_COLUMNS, ReportRow, SCORED_COLUMNS, ScoredRow, report_to_string, scored_to_string,
    write_report, write_scored,
};
pub use ingestor::{ColumnMap, Ingestor};
pub use stages::{
    Decision, DecisionOutcome, MalformedOutputWarning, ReadinessVerdict, RiskLevel, RoiLevel,
    StageKind, StageLevels, StagePrompt, parse_decision,
};
pub use state::AssessmentState;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    RawBatch, SurveyFormat, read_batch, read_batch_from_str, read_batch_xlsx, read_raw,
    read_raw_xlsx,
};

// =============================================================================
// TEST FIXTURES
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{AssessmentState, MarketInput, MarketRecord, Population, StageKind};

    pub(crate) const HEADER_CSV: &str = "Country,Risk_Class,Medical_Incidence,Tech_Limitations,Predicate_US,Population,Country_Wealth,Market_Maturity,Affiliate_Readiness,Digital_Readiness\n";

    pub(crate) const BRAZIL_CSV: &str = "Country,Risk_Class,Medical_Incidence,Tech_Limitations,Predicate_US,Population,Country_Wealth,Market_Maturity,Affiliate_Readiness,Digital_Readiness\nBrazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2\n";

    pub(crate) fn brazil() -> MarketInput {
        MarketInput {
            country: "Brazil".to_string(),
            risk_class: 3,
            medical_incidence: 2,
            tech_limitations: 1,
            predicate_device_us: true,
            population: Population::Count(210_000_000),
            country_wealth: "Upper-Middle".to_string(),
            market_maturity: 4,
            affiliate_readiness: 3,
            digital_readiness: 2,
        }
    }

    pub(crate) fn brazil_record() -> MarketRecord {
        MarketRecord::new(brazil()).expect("brazil is valid")
    }

    pub(crate) fn complete_state(decision: &str) -> AssessmentState {
        AssessmentState::new(brazil_record())
            .with_narrative(StageKind::Risk, "Final Risk Impact Level: Medium")
            .and_then(|s| s.with_narrative(StageKind::Opportunity, "ROI Summary: High"))
            .and_then(|s| s.with_narrative(StageKind::Readiness, "Final Readiness Verdict: Ready"))
            .and_then(|s| s.with_narrative(StageKind::Decision, decision))
            .expect("complete state")
    }
}
