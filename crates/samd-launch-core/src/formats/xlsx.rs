//! # Workbook Format
//!
//! Excel survey workbooks. The first worksheet is read: its first row names
//! the columns, every later non-blank row is one market. Cells are rendered
//! to text and fed through the same header gate and [`Ingestor`] as CSV.

use crate::ingestor::{ColumnMap, Ingestor};
use crate::primitives::MAX_BATCH_ROWS;
use crate::{MarketRecord, SamdError, ValidationError};
use calamine::{Data, Reader, Xlsx, XlsxError, open_workbook_from_rs};
use std::io::{Read, Seek};

use super::table::RawBatch;

impl From<XlsxError> for SamdError {
    fn from(e: XlsxError) -> Self {
        match e {
            XlsxError::Io(io) => SamdError::IoError(io.to_string()),
            other => SamdError::SerializationError(format!("invalid workbook: {other}")),
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Read the header and rows of the first worksheet without building records.
///
/// # Errors
/// - `SamdError::Validation` if required columns are missing, or the sheet
///   has more than `MAX_BATCH_ROWS` market rows
/// - `SamdError::SerializationError` if the input is not a workbook or has
///   no worksheet
pub fn read_raw_xlsx<R: Read + Seek>(input: R) -> Result<RawBatch, SamdError> {
    let mut workbook: Xlsx<R> = open_workbook_from_rs(input)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SamdError::SerializationError("workbook has no worksheets".to_string()))??;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .unwrap_or_default();
    let columns: ColumnMap = Ingestor::validate_columns(&headers)?;

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let row: Vec<String> = cells.iter().map(cell_text).collect();
        if row.iter().all(String::is_empty) {
            continue;
        }
        if rows.len() == MAX_BATCH_ROWS {
            return Err(ValidationError::TooManyRows {
                count: rows.len() + 1,
                max: MAX_BATCH_ROWS,
            }
            .into());
        }
        rows.push(row);
    }

    Ok(RawBatch { columns, rows })
}

/// Read and validate the first worksheet of a workbook into scored records.
///
/// Either every row becomes a `MarketRecord` or the workbook is rejected.
pub fn read_batch_xlsx<R: Read + Seek>(input: R) -> Result<Vec<MarketRecord>, SamdError> {
    let raw = read_raw_xlsx(input)?;
    Ok(Ingestor::build_batch(&raw.columns, &raw.rows)?)
}
