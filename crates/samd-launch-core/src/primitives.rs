//! # Input Primitives
//!
//! Fixed column names, value ranges, and size limits for survey batches.
//!
//! These are compiled into the binary and are immutable at runtime.

// =============================================================================
// INPUT COLUMNS
// =============================================================================

pub const COL_COUNTRY: &str = "Country";
pub const COL_RISK_CLASS: &str = "Risk_Class";
pub const COL_MEDICAL_INCIDENCE: &str = "Medical_Incidence";
pub const COL_TECH_LIMITATIONS: &str = "Tech_Limitations";
pub const COL_PREDICATE_US: &str = "Predicate_US";
pub const COL_POPULATION: &str = "Population";
pub const COL_COUNTRY_WEALTH: &str = "Country_Wealth";
pub const COL_MARKET_MATURITY: &str = "Market_Maturity";
pub const COL_AFFILIATE_READINESS: &str = "Affiliate_Readiness";
pub const COL_DIGITAL_READINESS: &str = "Digital_Readiness";

/// Columns every survey batch must carry, in canonical order.
///
/// A batch missing any of these is rejected before a single record is built.
pub const REQUIRED_COLUMNS: [&str; 10] = [
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
];

// =============================================================================
// DERIVED COLUMNS
// =============================================================================

pub const COL_RISK_SCORE: &str = "Risk_Score";
pub const COL_READINESS_SCORE: &str = "Readiness_Score";

// =============================================================================
// VALUE RANGES (inclusive)
// =============================================================================

/// Regulatory risk class. Lower classes get more scrutiny, so the class
/// enters the risk score inverted.
pub const RISK_CLASS_RANGE: (u8, u8) = (1, 5);

/// Medical incidence of the target condition.
pub const MEDICAL_INCIDENCE_RANGE: (u8, u8) = (1, 3);

/// Technical limitations of the deployment environment.
pub const TECH_LIMITATIONS_RANGE: (u8, u8) = (1, 3);

// Market maturity, affiliate readiness and digital readiness are unbounded
// non-negative counts; surveys use whatever scale their authors chose.

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of market rows in a single batch.
pub const MAX_BATCH_ROWS: usize = 1000;

/// Maximum length of any single cell value.
pub const MAX_FIELD_LENGTH: usize = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_columns_are_unique() {
        let mut sorted = REQUIRED_COLUMNS.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), REQUIRED_COLUMNS.len());
    }

    #[test]
    fn derived_columns_are_not_inputs() {
        assert!(!REQUIRED_COLUMNS.contains(&COL_RISK_SCORE));
        assert!(!REQUIRED_COLUMNS.contains(&COL_READINESS_SCORE));
    }
}
