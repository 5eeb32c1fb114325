//! # Scoring
//!
//! Pure score functions for market records. Integer arithmetic only; the same
//! inputs always produce the same scores.

/// Risk score: `(5 - risk_class) + medical_incidence + (3 - tech_limitations)`.
///
/// Risk class enters inverted: lower classes carry more regulatory scrutiny.
/// Computed in `i32` so out-of-range inputs cannot underflow.
#[must_use]
pub fn risk_score(risk_class: u8, medical_incidence: u8, tech_limitations: u8) -> i32 {
    (5 - i32::from(risk_class)) + i32::from(medical_incidence) + (3 - i32::from(tech_limitations))
}

/// Readiness score: `market_maturity + affiliate_readiness + digital_readiness`.
///
/// Computed in `i64` so three `u32` dimensions cannot overflow.
#[must_use]
pub fn readiness_score(
    market_maturity: u32,
    affiliate_readiness: u32,
    digital_readiness: u32,
) -> i64 {
    i64::from(market_maturity) + i64::from(affiliate_readiness) + i64::from(digital_readiness)
}
