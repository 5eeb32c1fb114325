//! # Formats
//!
//! Readers for survey batches: delimited text and Excel workbooks. Both
//! produce a [`RawBatch`] that goes through the same header gate.
//!
//! File I/O lives in the app layer; everything here works on `std::io::Read`.

pub mod table;
pub mod xlsx;

pub use table::{RawBatch, read_batch, read_batch_from_str, read_raw};
pub use xlsx::{read_batch_xlsx, read_raw_xlsx};

use std::path::Path;

/// On-disk layout of a survey file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyFormat {
    Csv,
    Xlsx,
}

impl SurveyFormat {
    /// Pick the format from the file extension. Anything that is not an
    /// Excel workbook is read as CSV.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("xlsx" | "xlsm") => SurveyFormat::Xlsx,
            _ => SurveyFormat::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(SurveyFormat::from_path(Path::new("survey.xlsx")), SurveyFormat::Xlsx);
        assert_eq!(SurveyFormat::from_path(Path::new("SURVEY.XLSX")), SurveyFormat::Xlsx);
        assert_eq!(SurveyFormat::from_path(Path::new("survey.csv")), SurveyFormat::Csv);
        assert_eq!(SurveyFormat::from_path(Path::new("survey")), SurveyFormat::Csv);
    }
}
