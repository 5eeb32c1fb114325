//! Readiness stage: digital and organizational readiness.
//!
//! Reads the record's readiness fields only.

use super::extract_labelled;
use crate::MarketRecord;
use serde::{Deserialize, Serialize};

pub const ROLE_INSTRUCTION: &str = "You are a digital infrastructure and readiness analyst.";

/// Build the readiness prompt for `record`.
#[must_use]
pub fn prompt(record: &MarketRecord) -> String {
    format!(
        "You are a Market Readiness & Infrastructure Specialist.

Analyze the digital and organizational readiness to support a SaMD launch in {country}.

Inputs:
- Market Maturity: {maturity}
- Affiliate Readiness: {affiliate}
- Digital Readiness: {digital}
- Readiness Score: {score}

Provide:
- Readiness Overview
- Infrastructure Strengths & Gaps
- Final Readiness Verdict (Ready / Needs Improvement / Not Ready)
",
        country = record.country(),
        maturity = record.market_maturity(),
        affiliate = record.affiliate_readiness(),
        digital = record.digital_readiness(),
        score = record.readiness_score(),
    )
}

/// Final readiness verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessVerdict {
    Ready,
    NeedsImprovement,
    NotReady,
}

impl ReadinessVerdict {
    /// Best-effort extraction from a readiness narrative.
    #[must_use]
    pub fn extract(text: &str) -> Option<Self> {
        extract_labelled(
            text,
            &["verdict", "readiness"],
            &[
                ("not ready", ReadinessVerdict::NotReady),
                ("needs improvement", ReadinessVerdict::NeedsImprovement),
                ("ready", ReadinessVerdict::Ready),
            ],
        )
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ReadinessVerdict::Ready => "Ready",
            ReadinessVerdict::NeedsImprovement => "Needs Improvement",
            ReadinessVerdict::NotReady => "Not Ready",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::brazil_record;

    #[test]
    fn prompt_lists_readiness_inputs() {
        let p = prompt(&brazil_record());
        assert!(p.contains("Market Maturity: 4"));
        assert!(p.contains("Affiliate Readiness: 3"));
        assert!(p.contains("Digital Readiness: 2"));
        assert!(p.contains("Readiness Score: 9"));
        assert!(!p.contains("Risk"));
    }

    #[test]
    fn extract_distinguishes_not_ready() {
        assert_eq!(
            ReadinessVerdict::extract("Final Readiness Verdict: Not Ready"),
            Some(ReadinessVerdict::NotReady)
        );
        assert_eq!(
            ReadinessVerdict::extract("Verdict: Needs Improvement"),
            Some(ReadinessVerdict::NeedsImprovement)
        );
        assert_eq!(
            ReadinessVerdict::extract("Final Readiness Verdict - Ready"),
            Some(ReadinessVerdict::Ready)
        );
    }
}
