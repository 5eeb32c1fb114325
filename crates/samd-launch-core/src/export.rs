//! # Report Export Module
//!
//! Delimited-text output for finished assessments and scored batches.
//!
//! The launch report has exactly five columns, in this order, and no index
//! column:
//!
//! `Country, Risk Summary, Opportunity Summary, Readiness Summary, Final Decision`
//!
//! Narratives are written verbatim; the CSV writer quotes embedded newlines
//! and commas. The header is written even when there are no rows.

use crate::primitives::{
    COL_AFFILIATE_READINESS, COL_COUNTRY, COL_COUNTRY_WEALTH, COL_DIGITAL_READINESS,
    COL_MARKET_MATURITY, COL_MEDICAL_INCIDENCE, COL_POPULATION, COL_PREDICATE_US,
    COL_READINESS_SCORE, COL_RISK_CLASS, COL_RISK_SCORE, COL_TECH_LIMITATIONS,
};
use crate::stages::StageKind;
use crate::{AssessmentState, MarketRecord, SamdError};
use serde::Serialize;
use std::io::Write;

// =============================================================================
// LAUNCH REPORT
// =============================================================================

/// Header of the launch report.
pub const REPORT_COLUMNS: [&str; 5] = [
    "Country",
    "Risk Summary",
    "Opportunity Summary",
    "Readiness Summary",
    "Final Decision",
];

/// One row of the launch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Risk Summary")]
    pub risk_summary: String,
    #[serde(rename = "Opportunity Summary")]
    pub opportunity_summary: String,
    #[serde(rename = "Readiness Summary")]
    pub readiness_summary: String,
    #[serde(rename = "Final Decision")]
    pub final_decision: String,
}

impl ReportRow {
    /// Build a row from a completed assessment.
    ///
    /// # Errors
    /// Returns `SamdError::IncompleteAssessment` naming the first missing
    /// stage if the assessment has not reached the decision.
    pub fn from_state(state: &AssessmentState) -> Result<Self, SamdError> {
        let take = |stage: StageKind| {
            state
                .narrative(stage)
                .map(str::to_string)
                .ok_or_else(|| SamdError::IncompleteAssessment {
                    country: state.country().to_string(),
                    missing: stage,
                })
        };

        Ok(Self {
            country: state.country().to_string(),
            risk_summary: take(StageKind::Risk)?,
            opportunity_summary: take(StageKind::Opportunity)?,
            readiness_summary: take(StageKind::Readiness)?,
            final_decision: take(StageKind::Decision)?,
        })
    }
}

/// Write the launch report for `states` to `out`.
///
/// Every state must be complete; nothing is written past the first
/// incomplete one.
pub fn write_report<'a, W, I>(out: W, states: I) -> Result<(), SamdError>
where
    W: Write,
    I: IntoIterator<Item = &'a AssessmentState>,
{
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(REPORT_COLUMNS)?;
    for state in states {
        wtr.serialize(ReportRow::from_state(state)?)?;
    }
    wtr.flush().map_err(|e| SamdError::IoError(e.to_string()))?;
    Ok(())
}

/// Render the launch report as a string.
pub fn report_to_string<'a, I>(states: I) -> Result<String, SamdError>
where
    I: IntoIterator<Item = &'a AssessmentState>,
{
    let mut buf = Vec::new();
    write_report(&mut buf, states)?;
    String::from_utf8(buf).map_err(|e| SamdError::SerializationError(e.to_string()))
}

// =============================================================================
// SCORED TABLE
// =============================================================================

/// Header of the scored table: the input columns plus both derived scores.
pub const SCORED_COLUMNS: [&str; 12] = [
    COL_COUNTRY,
    COL_RISK_CLASS,
    COL_MEDICAL_INCIDENCE,
    COL_TECH_LIMITATIONS,
    COL_PREDICATE_US,
    COL_POPULATION,
    COL_COUNTRY_WEALTH,
    COL_MARKET_MATURITY,
    COL_AFFILIATE_READINESS,
    COL_DIGITAL_READINESS,
    COL_RISK_SCORE,
    COL_READINESS_SCORE,
];

/// One validated record with its derived scores, as written to the scored
/// table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Risk_Class")]
    pub risk_class: u8,
    #[serde(rename = "Medical_Incidence")]
    pub medical_incidence: u8,
    #[serde(rename = "Tech_Limitations")]
    pub tech_limitations: u8,
    #[serde(rename = "Predicate_US")]
    pub predicate_us: &'static str,
    #[serde(rename = "Population")]
    pub population: String,
    #[serde(rename = "Country_Wealth")]
    pub country_wealth: String,
    #[serde(rename = "Market_Maturity")]
    pub market_maturity: u32,
    #[serde(rename = "Affiliate_Readiness")]
    pub affiliate_readiness: u32,
    #[serde(rename = "Digital_Readiness")]
    pub digital_readiness: u32,
    #[serde(rename = "Risk_Score")]
    pub risk_score: i32,
    #[serde(rename = "Readiness_Score")]
    pub readiness_score: i64,
}

impl From<&MarketRecord> for ScoredRow {
    fn from(record: &MarketRecord) -> Self {
        Self {
            country: record.country().to_string(),
            risk_class: record.risk_class(),
            medical_incidence: record.medical_incidence(),
            tech_limitations: record.tech_limitations(),
            predicate_us: if record.predicate_device_us() {
                "Yes"
            } else {
                "No"
            },
            population: record.population().to_string(),
            country_wealth: record.country_wealth().to_string(),
            market_maturity: record.market_maturity(),
            affiliate_readiness: record.affiliate_readiness(),
            digital_readiness: record.digital_readiness(),
            risk_score: record.risk_score(),
            readiness_score: record.readiness_score(),
        }
    }
}

/// Write validated records with their derived score columns appended.
pub fn write_scored<W: Write>(out: W, records: &[MarketRecord]) -> Result<(), SamdError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(SCORED_COLUMNS)?;
    for record in records {
        wtr.serialize(ScoredRow::from(record))?;
    }
    wtr.flush().map_err(|e| SamdError::IoError(e.to_string()))?;
    Ok(())
}

/// Render the scored table as a string.
pub fn scored_to_string(records: &[MarketRecord]) -> Result<String, SamdError> {
    let mut buf = Vec::new();
    write_scored(&mut buf, records)?;
    String::from_utf8(buf).map_err(|e| SamdError::SerializationError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
