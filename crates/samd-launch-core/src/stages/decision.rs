//! Decision stage: go / hold / reject synthesis over the three narratives.
//!
//! The prompt asks for a leading `Decision: <token>` line. [`parse_decision`]
//! reads that line back; it never alters the stored narrative.

use serde::{Deserialize, Serialize};

pub const ROLE_INSTRUCTION: &str = "You are responsible for SaMD global strategy.";

/// Longest excerpt of the offending line kept in a warning.
const EXCERPT_CHARS: usize = 80;

/// Build the decision prompt from the three prior narratives.
#[must_use]
pub fn prompt(risk_summary: &str, opportunity_summary: &str, readiness_summary: &str) -> String {
    format!(
        "You are a senior strategic executive in a global med-tech company.

Make a **go-to-market** decision for the SaMD launch using the following insights:

1. Risk Summary:
{risk_summary}

2. Market Opportunity:
{opportunity_summary}

3. Readiness Overview:
{readiness_summary}

Use all dimensions to decide.

Respond in this strict format:
Decision: [Launch / Hold / Reject]
Explanation:
- Risk-Based Justification
- ROI Justification
- Readiness Justification
- Final Synthesis
"
    )
}

// =============================================================================
// DECISION TOKEN
// =============================================================================

/// The launch decision token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Launch,
    Hold,
    Reject,
}

impl Decision {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Launch => "Launch",
            Decision::Hold => "Hold",
            Decision::Reject => "Reject",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "launch" => Some(Decision::Launch),
            "hold" => Some(Decision::Hold),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal notice that a decision narrative lacks a readable token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedOutputWarning {
    pub reason: String,
    pub excerpt: String,
}

impl std::fmt::Display for MalformedOutputWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (got {:?})", self.reason, self.excerpt)
    }
}

/// Result of reading the decision token back from a narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecisionOutcome {
    Parsed { decision: Decision },
    Malformed { warning: MalformedOutputWarning },
}

impl DecisionOutcome {
    #[must_use]
    pub fn decision(&self) -> Option<Decision> {
        match self {
            DecisionOutcome::Parsed { decision } => Some(*decision),
            DecisionOutcome::Malformed { .. } => None,
        }
    }

    #[must_use]
    pub fn warning(&self) -> Option<&MalformedOutputWarning> {
        match self {
            DecisionOutcome::Parsed { .. } => None,
            DecisionOutcome::Malformed { warning } => Some(warning),
        }
    }

    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, DecisionOutcome::Malformed { .. })
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Read the leading `Decision: <token>` line of a decision narrative.
///
/// Only the first non-empty line is examined. Markdown emphasis, heading and
/// list markers around the label and token are ignored, as is case. The token
/// must be exactly one of `Launch`, `Hold` or `Reject`; anything else,
/// including the echoed template `[Launch / Hold / Reject]`, is malformed.
#[must_use]
pub fn parse_decision(text: &str) -> DecisionOutcome {
    let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return malformed("decision narrative is empty", "");
    };

    let stripped = strip_markup(line);
    let Some((label, rest)) = stripped.split_once(':') else {
        return malformed("missing leading \"Decision:\" label", line);
    };
    if !strip_markup(label).eq_ignore_ascii_case("decision") {
        return malformed("missing leading \"Decision:\" label", line);
    }

    let token =
        rest.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '`' | '.' | '!'));
    match Decision::from_token(token) {
        Some(decision) => DecisionOutcome::Parsed { decision },
        None => malformed("decision token is not one of Launch, Hold, Reject", line),
    }
}

fn strip_markup(s: &str) -> &str {
    s.trim()
        .trim_start_matches(['#', '>', '-'])
        .trim_matches(['*', '_', '`'])
        .trim()
}

fn malformed(reason: &str, line: &str) -> DecisionOutcome {
    DecisionOutcome::Malformed {
        warning: MalformedOutputWarning {
            reason: reason.to_string(),
            excerpt: line.chars().take(EXCERPT_CHARS).collect(),
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_decision_token_is_extracted() {
        let outcome = parse_decision("Decision: Launch\nExplanation: strong ROI");
        assert_eq!(outcome.decision(), Some(Decision::Launch));
        assert!(outcome.warning().is_none());
    }

    #[test]
    fn markdown_and_case_are_tolerated() {
        assert_eq!(
            parse_decision("\n\n**Decision:** hold\n").decision(),
            Some(Decision::Hold)
        );
        assert_eq!(
            parse_decision("## Decision: **Reject**.").decision(),
            Some(Decision::Reject)
        );
    }

    #[test]
    fn missing_prefix_is_malformed() {
        let outcome = parse_decision("We recommend launching in Brazil.\nDecision: Launch");
        assert!(outcome.is_malformed());
        let warning = outcome.warning().expect("warning");
        assert!(warning.reason.contains("Decision:"));
        assert_eq!(warning.excerpt, "We recommend launching in Brazil.");
    }

    #[test]
    fn echoed_template_is_malformed() {
        let outcome = parse_decision("Decision: [Launch / Hold / Reject]");
        assert!(outcome.is_malformed());
    }

    #[test]
    fn empty_text_is_malformed() {
        assert!(parse_decision("   \n").is_malformed());
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = "x".repeat(500);
        let outcome = parse_decision(&long);
        let warning = outcome.warning().expect("warning");
        assert_eq!(warning.excerpt.chars().count(), EXCERPT_CHARS);
    }

    #[test]
    fn prompt_demands_strict_format() {
        let p = prompt("R", "O", "D");
        assert!(p.contains("Decision: [Launch / Hold / Reject]"));
        assert!(p.contains("1. Risk Summary:\nR"));
        assert!(p.contains("3. Readiness Overview:\nD"));
    }
}
