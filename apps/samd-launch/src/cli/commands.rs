//! # CLI Command Implementations

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use samd_launch_core::{
    MarketRecord, ScoredRow, SurveyFormat, read_batch, read_batch_xlsx, write_scored,
};

use crate::api::{self, AppState, AssessResponse, ServerSettings};
use crate::config::{AssessorConfig, ProviderKind};
use crate::error::AppError;
use crate::generation::build_generation_provider;
use crate::pipeline::{BatchReport, ProgressEvent, Runner};

// =============================================================================
// INPUT CHECKS
// =============================================================================

/// Maximum survey file size (10 MB).
const MAX_SURVEY_FILE_SIZE: u64 = 10 * 1024 * 1024;

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {e}")))?;

    if metadata.len() > max_size {
        return Err(AppError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve `path` to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| AppError::Io(format!("Invalid file path '{}': {e}", path.display())))?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    Ok(canonical)
}

/// Resolve the parent of `path`, which must be an existing directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, AppError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        AppError::Io(format!(
            "Invalid output directory '{}': {e}",
            parent.display()
        ))
    })?;
    if !canonical_parent.is_dir() {
        return Err(AppError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| AppError::Io("Output path has no filename".to_string()))?;
    Ok(canonical_parent.join(filename))
}

/// Read and validate a survey file. Any invalid row rejects the whole file.
///
/// `.xlsx` / `.xlsm` files are read as workbooks, everything else as CSV.
pub fn read_survey(path: &Path) -> Result<Vec<MarketRecord>, AppError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_SURVEY_FILE_SIZE)?;
    let file = File::open(&path)
        .map_err(|e| AppError::Io(format!("Cannot open '{}': {e}", path.display())))?;
    let format = SurveyFormat::from_path(&path);
    let records = match format {
        SurveyFormat::Xlsx => read_batch_xlsx(BufReader::new(file))?,
        SurveyFormat::Csv => read_batch(BufReader::new(file))?,
    };
    tracing::info!(
        path = %path.display(),
        format = ?format,
        records = records.len(),
        "survey loaded"
    );
    Ok(records)
}

fn create_output(path: &Path) -> Result<BufWriter<File>, AppError> {
    let path = validate_output_path(path)?;
    let file = File::create(&path)
        .map_err(|e| AppError::Io(format!("Cannot create '{}': {e}", path.display())))?;
    Ok(BufWriter::new(file))
}

// =============================================================================
// RUNNER SETUP
// =============================================================================

/// Load configuration: file, then environment, then the `--offline` flag.
pub fn load_config(path: Option<&Path>, offline: bool) -> Result<AssessorConfig, AppError> {
    let mut config = AssessorConfig::load(path)?.with_env()?;
    if offline {
        config.generation.provider = ProviderKind::Offline;
    }
    config.validate()?;
    Ok(config)
}

fn build_runner(config: &AssessorConfig) -> Result<Runner, AppError> {
    let provider = build_generation_provider(&config.generation)?;
    tracing::info!(
        provider = provider.name(),
        model = provider.model(),
        "generation provider ready"
    );
    Ok(Runner::new(provider, &config.runner))
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

pub fn cmd_validate(input: &Path, json_mode: bool) -> Result<(), AppError> {
    let records = read_survey(input)?;

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "records": records.len(),
            "countries": records.iter().map(MarketRecord::country).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Survey is valid: {} record(s)", records.len());
    for record in &records {
        println!(
            "  {:<24} Risk_Score {:>2}  Readiness_Score {:>2}",
            record.country(),
            record.risk_score(),
            record.readiness_score()
        );
    }
    Ok(())
}

// =============================================================================
// SCORE COMMAND
// =============================================================================

pub fn cmd_score(input: &Path, output: Option<&Path>, json_mode: bool) -> Result<(), AppError> {
    let records = read_survey(input)?;

    if json_mode {
        let rows: Vec<ScoredRow> = records.iter().map(ScoredRow::from).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).unwrap_or_default()
        );
        return Ok(());
    }

    match output {
        Some(path) => {
            let out = create_output(path)?;
            write_scored(out, &records)?;
            println!("Scored {} record(s) to {}", records.len(), path.display());
        }
        None => write_scored(std::io::stdout().lock(), &records)?,
    }
    Ok(())
}

// =============================================================================
// ASSESS COMMAND
// =============================================================================

/// Arguments of `assess`.
#[derive(Debug, Clone, Copy)]
pub struct AssessOptions<'a> {
    pub input: &'a Path,
    pub output: &'a Path,
    pub offline: bool,
    pub json_mode: bool,
    pub quiet: bool,
}

/// Assess every record and write the launch report.
///
/// The survey and the output location are checked before any generation
/// call. The report is written even when some records fail; the command
/// then returns `AppError::IncompleteBatch`.
pub async fn cmd_assess(
    config_path: Option<&Path>,
    options: &AssessOptions<'_>,
) -> Result<(), AppError> {
    let records = read_survey(options.input)?;
    let output = validate_output_path(options.output)?;
    let config = load_config(config_path, options.offline)?;
    let runner = build_runner(&config)?;

    let total = records.len();
    let show_progress = !options.json_mode && !options.quiet;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if show_progress {
                print_progress(&event, total);
            }
        }
    });

    let report = runner.run_batch(records, Some(tx)).await;
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "progress printer stopped");
    }

    let mut out = create_output(&output)?;
    report.write_report(&mut out)?;
    out.flush()
        .map_err(|e| AppError::Io(format!("Cannot write '{}': {e}", output.display())))?;

    if options.json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&AssessResponse::from(&report)).unwrap_or_default()
        );
    } else {
        print_summary(&report, &output);
    }

    if report.is_complete() {
        Ok(())
    } else {
        Err(AppError::IncompleteBatch {
            failed: report.failed_count(),
            total: report.total(),
        })
    }
}

fn print_progress(event: &ProgressEvent, total: usize) {
    match event {
        ProgressEvent::RecordStarted { index, country } => {
            println!("[{}/{}] {}: started", index + 1, total, country);
        }
        ProgressEvent::StageCompleted {
            index,
            country,
            stage,
            attempts,
        } => {
            let retries = if *attempts > 1 {
                format!(" after {attempts} attempts")
            } else {
                String::new()
            };
            println!(
                "[{}/{}] {}: {} done{}",
                index + 1,
                total,
                country,
                stage.name(),
                retries
            );
        }
        ProgressEvent::RecordCompleted {
            index,
            country,
            decision,
        } => {
            let decision = decision.map_or("unreadable", |d| d.as_str());
            println!("[{}/{}] {}: decision {}", index + 1, total, country, decision);
        }
        ProgressEvent::RecordFailed {
            index,
            country,
            stage,
            error,
        } => {
            let stage = stage.map_or("setup", |s| s.name());
            println!("[{}/{}] {}: FAILED at {}: {}", index + 1, total, country, stage, error);
        }
    }
}

fn print_summary(report: &BatchReport, output: &Path) {
    println!();
    println!("Launch Assessment");
    println!("=================");
    for done in report.completed() {
        let decision = done
            .decision
            .decision()
            .map_or("(unreadable)", |d| d.as_str());
        let level = |l: Option<String>| l.unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:<12} risk {:<8} roi {:<8} readiness {}",
            done.country(),
            decision,
            level(done.levels.risk.map(|r| format!("{r:?}"))),
            level(done.levels.roi.map(|r| format!("{r:?}"))),
            level(done.levels.readiness.map(|r| r.label().to_string())),
        );
        if let Some(warning) = done.decision.warning() {
            println!("    warning: {warning}");
        }
    }
    for failure in report.failures() {
        let stage = failure.stage.map_or("setup", |s| s.name());
        println!(
            "  {:<24} FAILED at {} after {} attempt(s): {}",
            failure.country, stage, failure.attempts, failure.error
        );
    }
    println!();
    println!(
        "{} of {} record(s) assessed; report written to {}",
        report.completed_count(),
        report.total(),
        output.display()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

pub async fn cmd_server(
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    offline: bool,
) -> Result<(), AppError> {
    let config = load_config(config_path, offline)?;
    let runner = build_runner(&config)?;
    let settings = ServerSettings::from_env();

    println!("samd-launch HTTP server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {host}");
    println!("  Port:     {port}");
    println!("  Provider: {} ({})", runner.provider_name(), runner.model());
    println!();
    println!("Endpoints:");
    println!("  GET  /health        - Health check");
    println!("  POST /score         - Score a CSV or xlsx survey");
    println!("  POST /assess        - Assess a survey (JSON)");
    println!("  POST /assess/report - Assess a survey (CSV report)");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{host}:{port}");
    api::run_server(&addr, AppState::new(runner), &settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRAZIL: &str = "Country,Risk_Class,Medical_Incidence,Tech_Limitations,Predicate_US,Population,Country_Wealth,Market_Maturity,Affiliate_Readiness,Digital_Readiness\nBrazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2\n";

    fn survey(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("survey.csv");
        let mut f = File::create(&path).expect("create");
        f.write_all(text.as_bytes()).expect("write");
        path
    }

    #[test]
    fn read_survey_rejects_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_survey(dir.path()).expect_err("directory");
        assert!(err.to_string().contains("not a regular file"));
    }

    #[test]
    fn read_survey_reports_missing_population() {
        let dir = tempfile::tempdir().expect("tempdir");
        let text = BRAZIL.replace(",Population", "").replace(",210000000", "");
        let err = read_survey(&survey(&dir, &text)).expect_err("missing column");
        assert!(err.to_string().contains("Population"));
    }

    fn workbook(dir: &tempfile::TempDir, with_population: bool) -> PathBuf {
        let path = dir.path().join("survey.xlsx");
        let mut lines = BRAZIL.lines();
        let header: Vec<&str> = lines.next().expect("header").split(',').collect();
        let row: Vec<&str> = lines.next().expect("row").split(',').collect();

        let mut book = rust_xlsxwriter::Workbook::new();
        let sheet = book.add_worksheet();
        let mut col = 0u16;
        for (name, value) in header.iter().zip(&row) {
            if !with_population && *name == "Population" {
                continue;
            }
            sheet.write_string(0, col, *name).expect("header");
            match value.parse::<u32>() {
                Ok(n) => sheet.write_number(1, col, n).expect("number"),
                Err(_) => sheet.write_string(1, col, *value).expect("text"),
            };
            col += 1;
        }
        book.save(&path).expect("save");
        path
    }

    #[test]
    fn read_survey_reads_xlsx_workbook() {
        let dir = tempfile::tempdir().expect("tempdir");
        let records = read_survey(&workbook(&dir, true)).expect("workbook");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country(), "Brazil");
        assert_eq!(records[0].risk_score(), 6);
        assert_eq!(records[0].readiness_score(), 9);
    }

    #[test]
    fn read_survey_rejects_xlsx_without_population() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_survey(&workbook(&dir, false)).expect_err("missing column");
        assert!(err.to_string().contains("Population"));
    }

    #[tokio::test]
    async fn offline_assess_accepts_xlsx_survey() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = workbook(&dir, true);
        let output = dir.path().join("report.csv");
        let options = AssessOptions {
            input: &input,
            output: &output,
            offline: true,
            json_mode: false,
            quiet: true,
        };
        let empty_config = dir.path().join("samd-launch.toml");
        std::fs::write(&empty_config, "").expect("config");

        cmd_assess(Some(&empty_config), &options)
            .await
            .expect("assess");
        let text = std::fs::read_to_string(&output).expect("report");
        assert!(text.starts_with("Country,Risk Summary,"));
        assert!(text.contains("Brazil"));
    }

    #[test]
    fn output_in_missing_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("report.csv");
        assert!(validate_output_path(&path).is_err());
    }

    #[test]
    fn score_writes_scored_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = survey(&dir, BRAZIL);
        let output = dir.path().join("scored.csv");
        cmd_score(&input, Some(&output), false).expect("score");

        let text = std::fs::read_to_string(&output).expect("read");
        assert!(text.contains("Brazil,3,2,1,Yes,210000000,Upper-Middle,4,3,2,6,9"));
    }

    #[tokio::test]
    async fn offline_assess_writes_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = survey(&dir, BRAZIL);
        let output = dir.path().join("report.csv");
        let options = AssessOptions {
            input: &input,
            output: &output,
            offline: true,
            json_mode: false,
            quiet: true,
        };
        let empty_config = dir.path().join("samd-launch.toml");
        std::fs::write(&empty_config, "").expect("config");

        cmd_assess(Some(&empty_config), &options)
            .await
            .expect("assess");

        let text = std::fs::read_to_string(&output).expect("report");
        assert!(text.starts_with(
            "Country,Risk Summary,Opportunity Summary,Readiness Summary,Final Decision\n"
        ));
        assert!(text.contains("Decision: Hold"));
    }
}
