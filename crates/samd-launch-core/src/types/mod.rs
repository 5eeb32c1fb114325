//! # Core Type Definitions
//!
//! This module contains the core types of the assessment substrate:
//! - The validated survey row (`MarketInput`) and its scored form (`MarketRecord`)
//! - Population indicator (`Population`)
//! - Error types (`SamdError`, `ValidationError`)
//!
//! ## Determinism Guarantees
//!
//! - Scores use integer arithmetic only (no floating-point)
//! - A `MarketRecord` can only be obtained through [`MarketRecord::new`], which
//!   recomputes both derived scores; scores are never user-supplied

use crate::primitives::{
    COL_MEDICAL_INCIDENCE, COL_RISK_CLASS, COL_TECH_LIMITATIONS, MEDICAL_INCIDENCE_RANGE,
    RISK_CLASS_RANGE, TECH_LIMITATIONS_RANGE,
};
use crate::scoring::{readiness_score, risk_score};
use crate::stages::StageKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// POPULATION
// =============================================================================

/// Population indicator of a market.
///
/// Surveys carry either a head count (`210000000`, `210,000,000`) or a
/// descriptive band (`"Large"`, `"50-100M"`). Both are passed to the stages
/// as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Population {
    /// Numeric head count.
    Count(u64),
    /// Free-form description.
    Descriptive(String),
}

impl Population {
    /// Parse a raw cell. Thousands separators (`,`, `_`, spaces) are ignored
    /// for numeric values; anything else is kept verbatim as a description.
    ///
    /// Returns `None` for an empty cell.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let digits: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ',' | '_' | ' '))
            .collect();
        let digits = strip_zero_fraction(&digits);

        match digits.parse::<u64>() {
            Ok(count) => Some(Population::Count(count)),
            Err(_) => Some(Population::Descriptive(trimmed.to_string())),
        }
    }
}

impl std::fmt::Display for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Population::Count(n) => write!(f, "{}", n),
            Population::Descriptive(s) => f.write_str(s),
        }
    }
}

/// Drop an all-zero fractional part (`"4.0"` -> `"4"`), as produced by
/// spreadsheet exports of integer cells.
pub(crate) fn strip_zero_fraction(raw: &str) -> &str {
    match raw.split_once('.') {
        Some((whole, frac)) if !whole.is_empty() && frac.chars().all(|c| c == '0') => whole,
        _ => raw,
    }
}

// =============================================================================
// MARKET INPUT
// =============================================================================

/// The typed survey answers for one market, before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInput {
    /// Country or market identifier.
    pub country: String,
    /// Regulatory risk class (1-5).
    pub risk_class: u8,
    /// Medical incidence (1-3).
    pub medical_incidence: u8,
    /// Technical limitations (1-3).
    pub tech_limitations: u8,
    /// Whether a predicate device already exists in the US.
    pub predicate_device_us: bool,
    /// Population indicator.
    pub population: Population,
    /// Wealth category or index, kept as written.
    pub country_wealth: String,
    /// Market maturity, any non-negative integer.
    pub market_maturity: u32,
    /// Affiliate readiness, any non-negative integer.
    pub affiliate_readiness: u32,
    /// Digital readiness, any non-negative integer.
    pub digital_readiness: u32,
}

impl MarketInput {
    /// Check the risk fields against their ranges.
    ///
    /// The readiness dimensions carry no bound.
    pub fn check_ranges(&self) -> Result<(), ValidationError> {
        let checks = [
            (COL_RISK_CLASS, self.risk_class, RISK_CLASS_RANGE),
            (
                COL_MEDICAL_INCIDENCE,
                self.medical_incidence,
                MEDICAL_INCIDENCE_RANGE,
            ),
            (
                COL_TECH_LIMITATIONS,
                self.tech_limitations,
                TECH_LIMITATIONS_RANGE,
            ),
        ];

        for (column, value, (min, max)) in checks {
            if value < min || value > max {
                return Err(ValidationError::OutOfRange {
                    country: self.country.clone(),
                    column: column.to_string(),
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// MARKET RECORD
// =============================================================================

/// A validated, scored market.
///
/// Immutable once constructed. `risk_score` and `readiness_score` are
/// always the values [`crate::scoring`] computes from the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketRecord {
    #[serde(flatten)]
    input: MarketInput,
    risk_score: i32,
    readiness_score: i64,
}

impl MarketRecord {
    /// Validate ranges and compute the derived scores.
    pub fn new(input: MarketInput) -> Result<Self, ValidationError> {
        input.check_ranges()?;
        let risk_score = risk_score(
            input.risk_class,
            input.medical_incidence,
            input.tech_limitations,
        );
        let readiness_score = readiness_score(
            input.market_maturity,
            input.affiliate_readiness,
            input.digital_readiness,
        );
        Ok(Self {
            input,
            risk_score,
            readiness_score,
        })
    }

    #[must_use]
    pub fn input(&self) -> &MarketInput {
        &self.input
    }

    #[must_use]
    pub fn country(&self) -> &str {
        &self.input.country
    }

    #[must_use]
    pub fn risk_class(&self) -> u8 {
        self.input.risk_class
    }

    #[must_use]
    pub fn medical_incidence(&self) -> u8 {
        self.input.medical_incidence
    }

    #[must_use]
    pub fn tech_limitations(&self) -> u8 {
        self.input.tech_limitations
    }

    #[must_use]
    pub fn predicate_device_us(&self) -> bool {
        self.input.predicate_device_us
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.input.population
    }

    #[must_use]
    pub fn country_wealth(&self) -> &str {
        &self.input.country_wealth
    }

    #[must_use]
    pub fn market_maturity(&self) -> u32 {
        self.input.market_maturity
    }

    #[must_use]
    pub fn affiliate_readiness(&self) -> u32 {
        self.input.affiliate_readiness
    }

    #[must_use]
    pub fn digital_readiness(&self) -> u32 {
        self.input.digital_readiness
    }

    /// `(5 - risk_class) + medical_incidence + (3 - tech_limitations)`.
    #[must_use]
    pub fn risk_score(&self) -> i32 {
        self.risk_score
    }

    /// `market_maturity + affiliate_readiness + digital_readiness`.
    #[must_use]
    pub fn readiness_score(&self) -> i64 {
        self.readiness_score
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Batch-level input errors.
///
/// Any of these rejects the whole batch before a single stage runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more required columns are absent from the header.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A required column appears more than once in the header.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// A cell could not be parsed into its column's type.
    #[error("row {row}, column {column}: invalid value '{value}' ({reason})")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// A risk field lies outside its scale.
    #[error("{country}: {column} = {value} is outside {min}-{max}")]
    OutOfRange {
        country: String,
        column: String,
        value: u8,
        min: u8,
        max: u8,
    },

    /// The batch exceeds the row limit.
    #[error("batch has {count} rows, maximum is {max}")]
    TooManyRows { count: usize, max: usize },
}

impl ValidationError {
    /// Names of the missing columns, if this is a missing-column error.
    #[must_use]
    pub fn missing_columns(&self) -> &[String] {
        match self {
            ValidationError::MissingColumns(cols) => cols,
            _ => &[],
        }
    }
}

/// Errors that can occur in the assessment core.
///
/// - No silent failures
/// - Use `Result<T, SamdError>` for fallible operations
/// - The core never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum SamdError {
    /// Input batch failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A narrative was recorded out of pipeline order.
    #[error("stage {got} cannot run now (next expected: {})", .expected.as_ref().map_or("none".to_string(), |s| s.to_string()))]
    StageOrder {
        expected: Option<StageKind>,
        got: StageKind,
    },

    /// A stage prompt needs a narrative that has not been produced yet.
    #[error("stage {stage} requires the {needs} narrative")]
    MissingNarrative { stage: StageKind, needs: StageKind },

    /// A stage produced an empty narrative.
    #[error("stage {0} produced an empty narrative")]
    EmptyNarrative(StageKind),

    /// A report row was requested for an assessment that has not finished.
    #[error("assessment for {country} is incomplete (missing {missing})")]
    IncompleteAssessment { country: String, missing: StageKind },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<csv::Error> for SamdError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            SamdError::IoError(e.to_string())
        } else {
            SamdError::SerializationError(e.to_string())
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::brazil;

    #[test]
    fn record_computes_scores() {
        let record = MarketRecord::new(brazil()).expect("valid");
        assert_eq!(record.risk_score(), 6);
        assert_eq!(record.readiness_score(), 9);
        assert_eq!(record.country(), "Brazil");
    }

    #[test]
    fn record_rejects_out_of_range_risk_class() {
        let mut input = brazil();
        input.risk_class = 6;
        let err = MarketRecord::new(input).expect_err("out of range");
        assert!(matches!(
            err,
            ValidationError::OutOfRange { ref column, value: 6, .. } if column == "Risk_Class"
        ));
    }

    #[test]
    fn readiness_dimensions_are_unbounded() {
        let mut input = brazil();
        input.market_maturity = 0;
        input.affiliate_readiness = 7;
        input.digital_readiness = 2;
        let record = MarketRecord::new(input).expect("any non-negative readiness");
        assert_eq!(record.readiness_score(), 9);

        let mut input = brazil();
        input.market_maturity = u32::MAX;
        input.affiliate_readiness = u32::MAX;
        input.digital_readiness = u32::MAX;
        let record = MarketRecord::new(input).expect("large readiness");
        assert_eq!(record.readiness_score(), 3 * i64::from(u32::MAX));
    }

    #[test]
    fn population_parses_counts_and_descriptions() {
        assert_eq!(
            Population::parse("210,000,000"),
            Some(Population::Count(210_000_000))
        );
        assert_eq!(Population::parse("5000.0"), Some(Population::Count(5000)));
        assert_eq!(
            Population::parse(" Large "),
            Some(Population::Descriptive("Large".to_string()))
        );
        assert_eq!(Population::parse("   "), None);
    }

    #[test]
    fn population_display_is_verbatim() {
        assert_eq!(Population::Count(42).to_string(), "42");
        assert_eq!(
            Population::Descriptive("50-100M".to_string()).to_string(),
            "50-100M"
        );
    }

    #[test]
    fn missing_columns_error_names_columns() {
        let err = ValidationError::MissingColumns(vec![
            "Population".to_string(),
            "Country".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "missing required columns: Population, Country"
        );
        assert_eq!(err.missing_columns().len(), 2);
    }

    #[test]
    fn strip_zero_fraction_only_strips_zeros() {
        assert_eq!(strip_zero_fraction("4.0"), "4");
        assert_eq!(strip_zero_fraction("4.5"), "4.5");
        assert_eq!(strip_zero_fraction(".0"), ".0");
        assert_eq!(strip_zero_fraction("4"), "4");
    }
}
