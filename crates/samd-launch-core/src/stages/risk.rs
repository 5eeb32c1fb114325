//! Risk Evaluator stage: clinical and technical risk from the record alone.

use super::extract_labelled;
use crate::MarketRecord;
use serde::{Deserialize, Serialize};

pub const ROLE_INSTRUCTION: &str = "You are a Regulatory and Clinical Risk Expert.";

/// Build the risk prompt for `record`.
#[must_use]
pub fn prompt(record: &MarketRecord) -> String {
    format!(
        "You are a Regulatory and Clinical Risk Expert for Software as a Medical Device (SaMD).

Assess the **clinical and technical risk** for launching a SaMD in {country}.

Input:
- Risk Class (1-5): {risk_class}
- Medical Incidence (1-3): {incidence}
- Technical Limitations (1-3): {limitations}
- Predicate Device in US: {predicate}
- Population: {population}

Provide:
- Structured Risk Summary
- Clinical & Technical Risk Factors
- Final Risk Impact Level (Low / Medium / High)
",
        country = record.country(),
        risk_class = record.risk_class(),
        incidence = record.medical_incidence(),
        limitations = record.tech_limitations(),
        predicate = if record.predicate_device_us() {
            "Yes"
        } else {
            "No"
        },
        population = record.population(),
    )
}

/// Final risk impact level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Best-effort extraction from a risk narrative.
    #[must_use]
    pub fn extract(text: &str) -> Option<Self> {
        extract_labelled(
            text,
            &["level", "risk"],
            &[
                ("low", RiskLevel::Low),
                ("medium", RiskLevel::Medium),
                ("moderate", RiskLevel::Medium),
                ("high", RiskLevel::High),
            ],
        )
    }
}
