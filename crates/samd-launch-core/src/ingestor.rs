//! # Ingestor Module
//!
//! Row validation and record construction for survey batches.
//!
//! - Check the header for every required column before looking at any row
//! - Parse each cell into its column's type
//! - Reject the whole batch on the first bad row
//! - No enrichment beyond the two derived scores

use crate::primitives::{
    COL_AFFILIATE_READINESS, COL_COUNTRY, COL_COUNTRY_WEALTH, COL_DIGITAL_READINESS,
    COL_MARKET_MATURITY, COL_MEDICAL_INCIDENCE, COL_POPULATION, COL_PREDICATE_US, COL_RISK_CLASS,
    COL_TECH_LIMITATIONS, MAX_BATCH_ROWS, MAX_FIELD_LENGTH, REQUIRED_COLUMNS,
};
use crate::types::strip_zero_fraction;
use crate::{MarketInput, MarketRecord, Population, ValidationError};

const BOM: char = '\u{feff}';

/// Position of every required column within a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnMap {
    /// Index of `column` in the source header, if it is a required column.
    #[must_use]
    pub fn index_of(&self, column: &str) -> Option<usize> {
        REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|slot| self.indices[slot])
    }

    fn cell<'a, S: AsRef<str>>(&self, cells: &'a [S], column: &str) -> &'a str {
        self.index_of(column)
            .and_then(|index| cells.get(index))
            .map_or("", |s| s.as_ref().trim())
    }
}

/// The Ingestor turns raw tabular rows into `MarketRecord`s.
///
/// The Ingestor:
/// - Gates the batch on its header
/// - Parses and range-checks every cell
/// - Computes derived scores through `MarketRecord::new`
pub struct Ingestor;

impl Ingestor {
    /// Validate a header row.
    ///
    /// Header names are trimmed and a leading byte-order mark is dropped.
    /// Matching is case-sensitive; unknown extra columns are ignored.
    ///
    /// # Errors
    /// - `ValidationError::MissingColumns` naming every absent column, in
    ///   canonical order
    /// - `ValidationError::DuplicateColumn` if a required column repeats
    pub fn validate_columns<S: AsRef<str>>(headers: &[S]) -> Result<ColumnMap, ValidationError> {
        let mut found: [Option<usize>; REQUIRED_COLUMNS.len()] = [None; REQUIRED_COLUMNS.len()];

        for (index, header) in headers.iter().enumerate() {
            let name = header.as_ref().trim().trim_start_matches(BOM).trim();
            if let Some(slot) = REQUIRED_COLUMNS.iter().position(|c| *c == name) {
                if found[slot].is_some() {
                    return Err(ValidationError::DuplicateColumn(name.to_string()));
                }
                found[slot] = Some(index);
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .zip(found.iter())
            .filter(|(_, index)| index.is_none())
            .map(|(column, _)| (*column).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns(missing));
        }

        let mut indices = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, index) in found.iter().enumerate() {
            indices[slot] = index.unwrap_or_default();
        }
        Ok(ColumnMap { indices })
    }

    /// Build one record from a data row.
    ///
    /// `row` is the 1-based data row number used in error messages. Short
    /// rows are treated as having empty trailing cells.
    pub fn build_record<S: AsRef<str>>(
        columns: &ColumnMap,
        row: usize,
        cells: &[S],
    ) -> Result<MarketRecord, ValidationError> {
        let cell = |column: &'static str| -> Result<&str, ValidationError> {
            let value = columns.cell(cells, column);
            if value.chars().count() > MAX_FIELD_LENGTH {
                return Err(invalid(
                    row,
                    column,
                    value,
                    &format!("longer than {} characters", MAX_FIELD_LENGTH),
                ));
            }
            Ok(value)
        };

        let input = MarketInput {
            country: parse_text(row, COL_COUNTRY, cell(COL_COUNTRY)?)?,
            risk_class: parse_scale(row, COL_RISK_CLASS, cell(COL_RISK_CLASS)?)?,
            medical_incidence: parse_scale(
                row,
                COL_MEDICAL_INCIDENCE,
                cell(COL_MEDICAL_INCIDENCE)?,
            )?,
            tech_limitations: parse_scale(row, COL_TECH_LIMITATIONS, cell(COL_TECH_LIMITATIONS)?)?,
            predicate_device_us: parse_flag(row, COL_PREDICATE_US, cell(COL_PREDICATE_US)?)?,
            population: parse_population(row, cell(COL_POPULATION)?)?,
            country_wealth: parse_text(row, COL_COUNTRY_WEALTH, cell(COL_COUNTRY_WEALTH)?)?,
            market_maturity: parse_count(row, COL_MARKET_MATURITY, cell(COL_MARKET_MATURITY)?)?,
            affiliate_readiness: parse_count(
                row,
                COL_AFFILIATE_READINESS,
                cell(COL_AFFILIATE_READINESS)?,
            )?,
            digital_readiness: parse_count(
                row,
                COL_DIGITAL_READINESS,
                cell(COL_DIGITAL_READINESS)?,
            )?,
        };

        MarketRecord::new(input)
    }

    /// Build every record of a batch whose header has already been validated.
    ///
    /// # Errors
    /// Returns the first row error, or `ValidationError::TooManyRows` if the
    /// batch exceeds `MAX_BATCH_ROWS`. Nothing is returned for a partially
    /// valid batch.
    pub fn build_batch<S: AsRef<str>>(
        columns: &ColumnMap,
        rows: &[Vec<S>],
    ) -> Result<Vec<MarketRecord>, ValidationError> {
        if rows.len() > MAX_BATCH_ROWS {
            return Err(ValidationError::TooManyRows {
                count: rows.len(),
                max: MAX_BATCH_ROWS,
            });
        }

        rows.iter()
            .enumerate()
            .map(|(i, cells)| Self::build_record(columns, i + 1, cells))
            .collect()
    }

    /// Validate the header, then build every row.
    pub fn ingest_batch<H: AsRef<str>, S: AsRef<str>>(
        headers: &[H],
        rows: &[Vec<S>],
    ) -> Result<Vec<MarketRecord>, ValidationError> {
        let columns = Self::validate_columns(headers)?;
        Self::build_batch(&columns, rows)
    }
}

// =============================================================================
// CELL PARSERS
// =============================================================================

fn invalid(row: usize, column: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_text(row: usize, column: &str, raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Err(invalid(row, column, raw, "empty"));
    }
    Ok(raw.to_string())
}

/// Integer scale value. Accepts spreadsheet-style `"3.0"`.
fn parse_scale(row: usize, column: &str, raw: &str) -> Result<u8, ValidationError> {
    if raw.is_empty() {
        return Err(invalid(row, column, raw, "empty"));
    }
    strip_zero_fraction(raw)
        .parse::<u8>()
        .map_err(|_| invalid(row, column, raw, "expected a whole number"))
}

/// Unbounded non-negative readiness value. Accepts `"3.0"` as well.
fn parse_count(row: usize, column: &str, raw: &str) -> Result<u32, ValidationError> {
    if raw.is_empty() {
        return Err(invalid(row, column, raw, "empty"));
    }
    strip_zero_fraction(raw)
        .parse::<u32>()
        .map_err(|_| invalid(row, column, raw, "expected a non-negative whole number"))
}

fn parse_flag(row: usize, column: &str, raw: &str) -> Result<bool, ValidationError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "t" => Ok(true),
        "false" | "no" | "n" | "0" | "f" => Ok(false),
        "" => Err(invalid(row, column, raw, "empty")),
        _ => Err(invalid(row, column, raw, "expected yes/no")),
    }
}

fn parse_population(row: usize, raw: &str) -> Result<Population, ValidationError> {
    Population::parse(raw).ok_or_else(|| invalid(row, COL_POPULATION, raw, "empty"))
}

// =============================================================================
// TESTS
// =============================================================================
