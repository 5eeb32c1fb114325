//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the batch contract is broken.
//!
//! ## Tiers
//! - T0: Header Gate
//! - T1: Row Integrity
//! - T2: Scoring
//! - T3: Assessment State and Report

use samd_launch_core::{
    AssessmentState, MarketRecord, SamdError, StageKind, ValidationError, read_batch,
    read_batch_from_str, report_to_string,
};

const HEADER: &str = "Country,Risk_Class,Medical_Incidence,Tech_Limitations,Predicate_US,Population,Country_Wealth,Market_Maturity,Affiliate_Readiness,Digital_Readiness";

fn batch(rows: &[&str]) -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

fn brazil() -> MarketRecord {
    let records = read_batch_from_str(&batch(&["Brazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2"]))
        .expect("batch");
    records.into_iter().next().expect("one record")
}

// =============================================================================
// TIER T0: HEADER GATE
// =============================================================================

mod t0_header_gate {
    use super::*;

    /// T0.1: A batch without Population is rejected and the column is named.
    #[test]
    fn missing_population_is_named() {
        let header = HEADER.replace(",Population", "");
        let text = format!("{header}\nBrazil,3,2,1,Yes,Upper-Middle,4,3,2\n");

        let err = read_batch_from_str(&text).expect_err("missing column");
        assert!(err.to_string().contains("Population"));
        assert!(matches!(
            err,
            SamdError::Validation(ValidationError::MissingColumns(ref cols)) if cols == &["Population"]
        ));
    }

    /// T0.2: Every missing column is reported, not only the first.
    #[test]
    fn all_missing_columns_are_named() {
        let err = read_batch_from_str("Country,Population\nBrazil,1\n").expect_err("missing");
        let SamdError::Validation(ValidationError::MissingColumns(cols)) = &err else {
            unreachable!("expected missing columns, got {err}");
        };
        assert_eq!(cols.len(), 8);
        assert!(!cols.iter().any(|c| c == "Country" || c == "Population"));
    }

    /// T0.3: Column order and extra columns do not matter.
    #[test]
    fn reordered_header_with_extra_column() {
        let text = "Notes,Digital_Readiness,Affiliate_Readiness,Market_Maturity,Country_Wealth,Population,Predicate_US,Tech_Limitations,Medical_Incidence,Risk_Class,Country\nfirst pass,2,3,4,Upper-Middle,210000000,Yes,1,2,3,Brazil\n";
        let records = read_batch_from_str(text).expect("batch");
        assert_eq!(records[0], brazil());
    }

    /// T0.4: Header case matters.
    #[test]
    fn header_is_case_sensitive() {
        let text = batch(&[]).replace("Country_Wealth", "country_wealth");
        assert!(read_batch_from_str(&text).is_err());
    }
}

// =============================================================================
// TIER T1: ROW INTEGRITY
// =============================================================================

mod t1_row_integrity {
    use super::*;

    /// T1.1: A single bad row rejects the whole batch.
    #[test]
    fn one_bad_row_rejects_batch() {
        let text = batch(&[
            "Brazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2",
            "Chile,3,4,1,Yes,19000000,High,4,3,2",
        ]);
        let err = read_batch_from_str(&text).expect_err("out of range");
        assert!(matches!(
            err,
            SamdError::Validation(ValidationError::OutOfRange { ref country, value: 4, .. })
                if country == "Chile"
        ));
    }

    /// T1.1b: Readiness values outside 1-5 are accepted with the rest of the batch.
    #[test]
    fn readiness_values_are_unbounded() {
        let text = batch(&[
            "Brazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2",
            "Kenya,3,2,1,No,54000000,Lower-Middle,0,7,2",
        ]);
        let records = read_batch_from_str(&text).expect("whole batch");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].readiness_score(), 9);
        assert_eq!(records[1].country(), "Kenya");
        assert_eq!(records[1].readiness_score(), 9);
    }

    /// T1.2: Empty country is rejected with its row number.
    #[test]
    fn empty_country_rejected() {
        let text = batch(&[
            "Brazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2",
            ",3,2,1,Yes,210000000,Upper-Middle,4,3,2",
        ]);
        let err = read_batch_from_str(&text).expect_err("empty country");
        assert!(matches!(
            err,
            SamdError::Validation(ValidationError::InvalidValue { row: 2, .. })
        ));
    }

    /// T1.3: Descriptive population is kept verbatim.
    #[test]
    fn descriptive_population_kept() {
        let text = batch(&["Kenya,2,3,2,no,50-60M,Lower-Middle,2,2,1"]);
        let records = read_batch_from_str(&text).expect("batch");
        assert_eq!(records[0].population().to_string(), "50-60M");
    }

    /// T1.4: Reading from a file gives the same records as from memory.
    #[test]
    fn reads_from_file() {
        use std::io::Write;

        let text = batch(&["Brazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2"]);
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(text.as_bytes()).expect("write");

        let reopened = std::fs::File::open(file.path()).expect("open");
        let records = read_batch(reopened).expect("batch");
        assert_eq!(records, vec![brazil()]);
    }
}

// =============================================================================
// TIER T2: SCORING
// =============================================================================

mod t2_scoring {
    use super::*;

    /// T2.1: Brazil scores 6 on risk and 9 on readiness.
    #[test]
    fn brazil_scores() {
        let record = brazil();
        assert_eq!(record.risk_score(), 6);
        assert_eq!(record.readiness_score(), 9);
    }

    /// T2.2: Scores are not read from the input even when present.
    #[test]
    fn supplied_scores_are_ignored() {
        let header = format!("{HEADER},Risk_Score,Readiness_Score");
        let text = format!("{header}\nBrazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2,99,99\n");
        let records = read_batch_from_str(&text).expect("batch");
        assert_eq!(records[0].risk_score(), 6);
        assert_eq!(records[0].readiness_score(), 9);
    }
}

// =============================================================================
// TIER T3: ASSESSMENT STATE AND REPORT
// =============================================================================

mod t3_state_and_report {
    use super::*;

    fn complete() -> AssessmentState {
        AssessmentState::new(brazil())
            .with_narrative(StageKind::Risk, "Risk narrative")
            .and_then(|s| s.with_narrative(StageKind::Opportunity, "ROI narrative"))
            .and_then(|s| s.with_narrative(StageKind::Readiness, "Readiness narrative"))
            .and_then(|s| s.with_narrative(StageKind::Decision, "Decision: Launch"))
            .expect("complete")
    }

    /// T3.1: The report has five columns and no index.
    #[test]
    fn report_has_five_columns() {
        let text = report_to_string([&complete()]).expect("report");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Country,Risk Summary,Opportunity Summary,Readiness Summary,Final Decision")
        );
        assert_eq!(
            lines.next(),
            Some("Brazil,Risk narrative,ROI narrative,Readiness narrative,Decision: Launch")
        );
        assert_eq!(lines.next(), None);
    }

    /// T3.2: An unfinished assessment cannot be reported.
    #[test]
    fn unfinished_assessment_not_reported() {
        let state = AssessmentState::new(brazil());
        assert!(report_to_string([&state]).is_err());
    }
}
