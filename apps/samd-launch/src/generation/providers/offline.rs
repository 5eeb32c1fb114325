//! Deterministic provider for dry runs and tests.
//!
//! Reads the numeric inputs back out of each stage prompt and answers with a
//! short narrative in the shape the prompt asks for. The same prompt always
//! yields the same text.

use samd_launch_core::{ReadinessVerdict, RiskLevel, RoiLevel, StageKind};

use crate::generation::error::GenerationError;
use crate::generation::traits::GenerationProvider;
use crate::generation::types::{GenerationRequest, GenerationResponse};

const MODEL: &str = "offline-rules";

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl OfflineProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl GenerationProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn model(&self) -> &str {
        MODEL
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let text = match request.stage {
            StageKind::Risk => risk_narrative(&request.prompt),
            StageKind::Opportunity => opportunity_narrative(&request.prompt),
            StageKind::Readiness => readiness_narrative(&request.prompt),
            StageKind::Decision => decision_narrative(&request.prompt),
        }?;

        Ok(GenerationResponse {
            provider: self.name().to_string(),
            model: MODEL.to_string(),
            text,
            usage_tokens: None,
        })
    }
}

// =============================================================================
// STAGE RULES
// =============================================================================

fn risk_narrative(prompt: &str) -> Result<String, GenerationError> {
    let country = country_in(prompt)?;
    let class = number_after(prompt, "Risk Class (1-5)")?;
    let incidence = number_after(prompt, "Medical Incidence (1-3)")?;
    let limitations = number_after(prompt, "Technical Limitations (1-3)")?;
    let score = samd_launch_core::scoring::risk_score(class, incidence, limitations);

    // Lower classes get more scrutiny and score higher: a high score is high risk.
    let level = match score {
        7.. => "High",
        4..=6 => "Medium",
        _ => "Low",
    };

    Ok(format!(
        "Structured Risk Summary: {country} shows a combined risk score of {score}.\n\
         Clinical & Technical Risk Factors:\n\
         - Risk class {class} with medical incidence {incidence}\n\
         - Technical limitations rated {limitations}\n\
         Final Risk Impact Level: {level}"
    ))
}

fn opportunity_narrative(prompt: &str) -> Result<String, GenerationError> {
    let country = country_in(prompt)?;
    let score: i32 = number_after(prompt, "Risk Score")?;
    let wealth = text_after(prompt, "Country Wealth")?;

    let wealth_lower = wealth.to_ascii_lowercase();
    let roi = if wealth_lower.starts_with("high") && score <= 6 {
        "High"
    } else if wealth_lower.starts_with("low") || score >= 8 {
        "Low"
    } else {
        "Medium"
    };

    Ok(format!(
        "Market Opportunity Overview: {country} has {wealth} income levels.\n\
         Country Wealth and ROI Alignment: risk score {score} against {wealth} purchasing power.\n\
         ROI Summary: {roi}"
    ))
}

fn readiness_narrative(prompt: &str) -> Result<String, GenerationError> {
    let country = country_in(prompt)?;
    let score: i64 = number_after(prompt, "Readiness Score")?;

    let verdict = match score {
        12.. => ReadinessVerdict::Ready,
        8..=11 => ReadinessVerdict::NeedsImprovement,
        _ => ReadinessVerdict::NotReady,
    };

    Ok(format!(
        "Readiness Overview: {country} reaches a readiness score of {score}.\n\
         Infrastructure Strengths & Gaps: see maturity, affiliate and digital inputs.\n\
         Final Readiness Verdict: {}",
        verdict.label()
    ))
}

fn decision_narrative(prompt: &str) -> Result<String, GenerationError> {
    let risk = section(prompt, "1. Risk Summary:", "2. Market Opportunity:")
        .and_then(RiskLevel::extract);
    let roi = section(prompt, "2. Market Opportunity:", "3. Readiness Overview:")
        .and_then(RoiLevel::extract);
    let readiness = section(prompt, "3. Readiness Overview:", "Use all dimensions")
        .and_then(ReadinessVerdict::extract);

    let decision = match (risk, roi, readiness) {
        (Some(RiskLevel::High), _, Some(ReadinessVerdict::NotReady))
        | (Some(RiskLevel::High), Some(RoiLevel::Low), _) => "Reject",
        (
            Some(RiskLevel::Low | RiskLevel::Medium),
            Some(RoiLevel::High | RoiLevel::Medium),
            Some(ReadinessVerdict::Ready),
        ) => "Launch",
        _ => "Hold",
    };

    Ok(format!(
        "Decision: {decision}\n\
         Explanation:\n\
         - Risk-Based Justification: {}\n\
         - ROI Justification: {}\n\
         - Readiness Justification: {}\n\
         - Final Synthesis: {decision} follows from the three dimensions above.",
        describe(risk.map(|r| format!("{r:?}"))),
        describe(roi.map(|r| format!("{r:?}"))),
        describe(readiness.map(|r| r.label().to_string())),
    ))
}

// =============================================================================
// PROMPT READING
// =============================================================================

fn describe(level: Option<String>) -> String {
    level.unwrap_or_else(|| "not stated".to_string())
}

/// The country named on the "... a SaMD in <country>." task line.
fn country_in(prompt: &str) -> Result<&str, GenerationError> {
    prompt
        .lines()
        .filter_map(|line| line.trim().strip_suffix('.'))
        .filter_map(|line| line.rsplit_once(" in "))
        .find(|(head, _)| head.contains("SaMD"))
        .map(|(_, country)| country.trim())
        .ok_or_else(|| unreadable("country"))
}

fn text_after<'a>(prompt: &'a str, label: &str) -> Result<&'a str, GenerationError> {
    let prefix = format!("- {label}:");
    prompt
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix.as_str()))
        .map(str::trim)
        .ok_or_else(|| unreadable(label))
}

fn number_after<T: std::str::FromStr>(prompt: &str, label: &str) -> Result<T, GenerationError> {
    text_after(prompt, label)?
        .parse()
        .map_err(|_| unreadable(label))
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let (_, rest) = prompt.split_once(start)?;
    Some(rest.split_once(end).map_or(rest, |(body, _)| body))
}

fn unreadable(what: &str) -> GenerationError {
    GenerationError::InvalidResponse(format!("offline provider cannot read {what} from prompt"))
}
