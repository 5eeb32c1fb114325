//! Opportunity stage: market potential and ROI, built on the risk narrative.

use super::extract_labelled;
use crate::MarketRecord;
use serde::{Deserialize, Serialize};

pub const ROLE_INSTRUCTION: &str =
    "You are a financial and opportunity analyst for healthcare markets.";

/// Build the opportunity prompt from the record and the risk narrative.
#[must_use]
pub fn prompt(record: &MarketRecord, risk_summary: &str) -> String {
    format!(
        "You are a Market Opportunity and ROI Analyst for global med-tech products.

Based on the below, assess the **market potential** and **economic viability** for launching a SaMD in {country}.

Input:
- Risk Score: {risk_score}
- Country Wealth: {wealth}
- Population: {population}
- Risk Summary:
{risk_summary}

Provide:
- Market Opportunity Overview
- Country Wealth and ROI Alignment
- ROI Summary (High / Medium / Low)
",
        country = record.country(),
        risk_score = record.risk_score(),
        wealth = record.country_wealth(),
        population = record.population(),
    )
}

/// ROI level the opportunity narrative ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoiLevel {
    High,
    Medium,
    Low,
}

impl RoiLevel {
    /// Best-effort extraction from an opportunity narrative.
    #[must_use]
    pub fn extract(text: &str) -> Option<Self> {
        extract_labelled(
            text,
            &["roi"],
            &[
                ("high", RoiLevel::High),
                ("medium", RoiLevel::Medium),
                ("moderate", RoiLevel::Medium),
                ("low", RoiLevel::Low),
            ],
        )
    }
}
