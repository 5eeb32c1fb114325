//! # Table Format
//!
//! CSV survey batches: one header row naming the columns, one data row per
//! market. Cells are trimmed and short rows are tolerated; the header gate
//! runs before any data row is read.

use crate::ingestor::{ColumnMap, Ingestor};
use crate::primitives::MAX_BATCH_ROWS;
use crate::{MarketRecord, SamdError, ValidationError};
use std::io::Read;

/// A header-validated batch whose rows have not been parsed yet.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub columns: ColumnMap,
    pub rows: Vec<Vec<String>>,
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input)
}

/// Read the header and rows of a batch without building records.
///
/// # Errors
/// - `SamdError::Validation` if required columns are missing, or the batch
///   has more than `MAX_BATCH_ROWS` rows
/// - `SamdError::SerializationError` / `IoError` for unreadable input
pub fn read_raw<R: Read>(input: R) -> Result<RawBatch, SamdError> {
    let mut rdr = reader(input);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let columns = Ingestor::validate_columns(&headers)?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if rows.len() == MAX_BATCH_ROWS {
            return Err(ValidationError::TooManyRows {
                count: rows.len() + 1,
                max: MAX_BATCH_ROWS,
            }
            .into());
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawBatch { columns, rows })
}

/// Read and validate a whole batch into scored records.
///
/// Either every row becomes a `MarketRecord` or the batch is rejected.
pub fn read_batch<R: Read>(input: R) -> Result<Vec<MarketRecord>, SamdError> {
    let raw = read_raw(input)?;
    Ok(Ingestor::build_batch(&raw.columns, &raw.rows)?)
}

/// Convenience wrapper over [`read_batch`] for in-memory text.
pub fn read_batch_from_str(text: &str) -> Result<Vec<MarketRecord>, SamdError> {
    read_batch(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BRAZIL_CSV, HEADER_CSV};

    #[test]
    fn reads_brazil() {
        let records = read_batch_from_str(BRAZIL_CSV).expect("batch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].risk_score(), 6);
        assert_eq!(records[0].readiness_score(), 9);
    }

    #[test]
    fn header_only_is_an_empty_batch() {
        let records = read_batch_from_str(HEADER_CSV).expect("empty");
        assert!(records.is_empty());
    }

    #[test]
    fn missing_population_is_named() {
        let csv = "Country,Risk_Class,Medical_Incidence,Tech_Limitations,Predicate_US,Country_Wealth,Market_Maturity,Affiliate_Readiness,Digital_Readiness\nBrazil,3,2,1,Yes,Upper-Middle,4,3,2\n";
        let err = read_batch_from_str(csv).expect_err("missing");
        assert!(matches!(
            &err,
            SamdError::Validation(v) if v.missing_columns() == ["Population"]
        ));
    }

    #[test]
    fn quoted_population_with_separators() {
        let csv = format!(
            "{}Chile,2,2,2,no,\"19,600,000\",High,3,3,3\n",
            HEADER_CSV
        );
        let records = read_batch_from_str(&csv).expect("batch");
        assert_eq!(records[0].population().to_string(), "19600000");
        assert!(!records[0].predicate_device_us());
    }

    #[test]
    fn raw_batch_keeps_rows_unparsed() {
        let csv = format!("{}Nowhere,x,,,,,,,,\n", HEADER_CSV);
        let raw = read_raw(csv.as_bytes()).expect("header is fine");
        assert_eq!(raw.rows.len(), 1);
        assert!(Ingestor::build_batch(&raw.columns, &raw.rows).is_err());
    }
}
