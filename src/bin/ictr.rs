//! ICTR CLI - Command-line interface for the composite economic index
//!
//! Commands:
//! - build: Compute the index from an input document (batch mode)
//! - normalize: Write the monthly growth series of each indicator
//! - validate: Validate an input document
//! - schema: Print input/output schema documentation

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ictr::encoder::{IctrEncoder, SNAPSHOT_VERSION};
use ictr::pipeline::{IctrProcessor, IctrReport, PipelineConfig};
use ictr::schema::{CleaningOptions, RawSeriesAdapter, RawSeriesDocument, SCHEMA_VERSION};
use ictr::summary::rebase_to_100;
use ictr::{BuildError, ComputeError, GrowthSeries, NoIndexReason, ICTR_VERSION};

/// Exit code of a run that completed without producing an index
const EXIT_NO_INDEX: u8 = 3;

/// ICTR - Composite real-time economic index
#[derive(Parser)]
#[command(name = "ictr")]
#[command(version = ICTR_VERSION)]
#[command(about = "Fuse macroeconomic indicator series into a composite index", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the composite index (batch mode)
    Build {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Discard observations before this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Leave an indicator out (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Add a column rebased to 100 at the first month (csv only)
        #[arg(long)]
        rebase: bool,
    },

    /// Write the monthly growth series of each indicator
    Normalize {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Discard observations before this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
    },

    /// Validate an input document
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// A single ictr.raw_series.v1 document
    Json,
    /// Newline-delimited JSON (one indicator record per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON snapshot
    Json,
    /// Pretty-printed JSON snapshot
    JsonPretty,
    /// `date,value,score` rows
    Csv,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (ictr.raw_series.v1)
    Input,
    /// Output schema (ictr.snapshot.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let exit = match e {
                IctrCliError::NoIndex(_) => ExitCode::from(EXIT_NO_INDEX),
                _ => ExitCode::FAILURE,
            };
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            exit
        }
    }
}

fn init_tracing(verbose: u8, log_json: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<(), IctrCliError> {
    match cli.command {
        Commands::Build {
            input,
            output,
            input_format,
            format,
            config,
            since,
            exclude,
            rebase,
        } => cmd_build(
            &input,
            &output,
            input_format,
            format,
            config.as_deref(),
            since,
            &exclude,
            rebase,
        ),

        Commands::Normalize {
            input,
            output,
            input_format,
            config,
            since,
        } => cmd_normalize(&input, &output, input_format, config.as_deref(), since),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_build(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    format: OutputFormat,
    config: Option<&Path>,
    since: Option<NaiveDate>,
    exclude: &[String],
    rebase: bool,
) -> Result<(), IctrCliError> {
    let mut document = read_document(input, &input_format)?;
    if !exclude.is_empty() {
        document
            .indicators
            .retain(|record| !exclude.contains(&record.name));
        info!(excluded = ?exclude, "excluding indicators");
    }
    if document.indicators.is_empty() {
        return Err(IctrCliError::NoIndicators);
    }

    let processor = IctrProcessor::new(load_config(config)?);
    let report = processor.process_document(&document, &CleaningOptions { since })?;

    let output_data = match format {
        OutputFormat::Json => IctrEncoder::new()
            .encode(&report)
            .and_then(|payload| serde_json::to_string(&payload).map_err(ComputeError::from))?,
        OutputFormat::JsonPretty => IctrEncoder::new().encode_to_json(&report)?,
        OutputFormat::Csv => format_csv(&report, rebase)?,
    };

    // A run without an index still writes its (number-free) snapshot.
    write_output(output, &output_data)?;

    match report.outcome {
        ictr::BuildOutcome::NoIndex(reason) => Err(IctrCliError::NoIndex(reason)),
        ictr::BuildOutcome::Index(_) => Ok(()),
    }
}

fn cmd_normalize(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    config: Option<&Path>,
    since: Option<NaiveDate>,
) -> Result<(), IctrCliError> {
    let document = read_document(input, &input_format)?;
    let config = load_config(config)?;
    let processor = IctrProcessor::new(config);

    let fetches = RawSeriesAdapter::to_raw_series(&document, &CleaningOptions { since })?;

    let mut series: BTreeMap<String, GrowthSeries> = BTreeMap::new();
    let mut dropped: Vec<DroppedDetail> = Vec::new();

    for (name, outcome) in &fetches {
        let normalized = match outcome {
            Ok(raw) => processor.normalizer().normalize(raw),
            Err(failure) => Err(failure.clone().into()),
        };
        match normalized {
            Ok(mut growth) => {
                growth.name = name.clone();
                series.insert(name.clone(), growth);
            }
            Err(reason) => dropped.push(DroppedDetail {
                indicator: name.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    debug!(series = series.len(), dropped = dropped.len(), "normalized document");

    let report = NormalizeReport { series, dropped };
    write_output(output, &serde_json::to_string_pretty(&report)?)
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), IctrCliError> {
    let document = read_document(input, &input_format)?;
    let results = RawSeriesAdapter::validate_records(&document);

    let report = ValidationReport {
        schema_version: document.schema_version.clone(),
        total_indicators: document.indicators.len(),
        invalid: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                indicator: r.indicator.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema version:   {}", report.schema_version);
        println!("Total indicators: {}", report.total_indicators);
        println!("Problems:         {}", report.invalid);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                match err.index {
                    Some(index) => println!(
                        "  - Indicator {} (index {}): {}",
                        err.indicator.as_deref().unwrap_or("unknown"),
                        index,
                        err.error
                    ),
                    None => println!("  - Document: {}", err.error),
                }
            }
        }
    }

    if report.invalid > 0 {
        Err(IctrCliError::ValidationFailed(report.invalid))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), IctrCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("A document holds a schema_version and a list of indicators:");
                println!();
                println!("- name: unique indicator name (column name in the index)");
                println!("- source: optional descriptor");
                println!("    {{ indicator_id, source: {{ system: ine|eurostat|esios, ... }} }}");
                println!("- unit: optional unit label");
                println!("- fetch_error: set when the fetch failed; the indicator is dropped");
                println!("- observations: [{{ period, value }}]");
                println!();
                println!("Accepted periods: 2024-Q1, 2024Q1, 2024-M01, 2024M01, 2024,");
                println!("2024-03, 2024-03-31, ISO datetimes, epoch milliseconds.");
                println!("Null values are ignored; duplicate periods are averaged.");
                println!();
                println!("With --input-format ndjson each line is one indicator record.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", SNAPSHOT_VERSION);
                println!();
                println!("- schema_version, producer {{ name, version, instance_id }}");
                println!("- provenance: {{ computed_at_utc, indicators_supplied, indicators_used }}");
                println!("- status: ok | no_index");
                println!("- when ok:");
                println!("  - base, scale, explained_variance_ratio, strategy (strict|filled)");
                println!("  - joined_rows, retained_rows, sign_flipped");
                println!("  - summary: {{ latest, previous, delta, trend, min, max, mean, reliability_pct }}");
                println!("  - columns: [{{ indicator, mean, std_dev, loading }}]");
                println!("  - points: [{{ date, value }}]");
                println!("- when no_index: reason (no_indicators|insufficient_overlap), rows, required");
                println!("- indicators: per-indicator status (included|dropped) and details");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, IctrCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(IctrCliError::InteractiveStdin);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_document(input: &Path, format: &InputFormat) -> Result<RawSeriesDocument, IctrCliError> {
    let input_data = read_input(input)?;
    let document = match format {
        InputFormat::Json => RawSeriesAdapter::parse_document(&input_data)?,
        InputFormat::Ndjson => RawSeriesAdapter::parse_ndjson(&input_data)?,
    };
    Ok(document)
}

fn write_output(output: &Path, data: &str) -> Result<(), IctrCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, IctrCliError> {
    match path {
        Some(path) => Ok(PipelineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn format_csv(report: &IctrReport, rebase: bool) -> Result<String, IctrCliError> {
    let Some(index) = report.index() else {
        return Ok(String::new());
    };

    let rebased = if rebase {
        let pairs: Vec<(NaiveDate, f64)> = index.points.iter().map(|p| (p.date, p.value)).collect();
        Some(rebase_to_100(&pairs).ok_or(IctrCliError::RebaseFailed)?)
    } else {
        None
    };

    let mut wtr = csv::Writer::from_writer(vec![]);
    if rebase {
        wtr.write_record(["date", "value", "score", "rebased"])?;
    } else {
        wtr.write_record(["date", "value", "score"])?;
    }

    for (i, point) in index.points.iter().enumerate() {
        let mut record = vec![
            point.date.to_string(),
            point.value.to_string(),
            point.score.to_string(),
        ];
        if let Some(rebased) = &rebased {
            record.push(rebased[i].1.to_string());
        }
        wtr.write_record(&record)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| IctrCliError::Io(e.into_error()))?;
    String::from_utf8(data).map_err(|e| IctrCliError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ictr.raw_series.v1",
        "description": "Raw macroeconomic indicator series",
        "type": "object",
        "required": ["schema_version", "indicators"],
        "properties": {
            "schema_version": {
                "type": "string",
                "const": "ictr.raw_series.v1"
            },
            "indicators": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "source": {
                            "type": "object",
                            "required": ["indicator_id", "source"],
                            "properties": {
                                "indicator_id": { "type": "string" },
                                "source": {
                                    "type": "object",
                                    "required": ["system"],
                                    "properties": {
                                        "system": { "type": "string", "enum": ["ine", "eurostat", "esios"] },
                                        "series_code": { "type": "string" },
                                        "dataset": { "type": "string" },
                                        "filters": { "type": "object", "additionalProperties": { "type": "string" } },
                                        "indicator": { "type": "integer" }
                                    }
                                }
                            }
                        },
                        "unit": { "type": "string" },
                        "fetch_error": { "type": "string" },
                        "observations": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["period"],
                                "properties": {
                                    "period": { "type": "string" },
                                    "value": { "type": ["number", "null"] }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ictr.snapshot.v1",
        "description": "Composite economic index snapshot",
        "type": "object",
        "required": ["schema_version", "producer", "provenance", "status", "indicators"],
        "properties": {
            "schema_version": { "type": "string", "const": "ictr.snapshot.v1" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "provenance": {
                "type": "object",
                "properties": {
                    "computed_at_utc": { "type": "string", "format": "date-time" },
                    "indicators_supplied": { "type": "integer" },
                    "indicators_used": { "type": "integer" }
                }
            },
            "status": { "type": "string", "enum": ["ok", "no_index"] },
            "reason": { "type": "string", "enum": ["no_indicators", "insufficient_overlap"] },
            "explained_variance_ratio": { "type": "number", "minimum": 0, "maximum": 1 },
            "strategy": { "type": "string", "enum": ["strict", "filled"] },
            "summary": { "type": "object" },
            "columns": { "type": "array", "items": { "type": "object" } },
            "points": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "date": { "type": "string", "format": "date" },
                        "value": { "type": "number" }
                    }
                }
            },
            "indicators": { "type": "array", "items": { "type": "object" } }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum IctrCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoIndicators,
    NoIndex(NoIndexReason),
    ValidationFailed(usize),
    Csv(csv::Error),
    InteractiveStdin,
    RebaseFailed,
}

impl From<io::Error> for IctrCliError {
    fn from(e: io::Error) -> Self {
        IctrCliError::Io(e)
    }
}

impl From<ComputeError> for IctrCliError {
    fn from(e: ComputeError) -> Self {
        IctrCliError::Compute(e)
    }
}

impl From<csv::Error> for IctrCliError {
    fn from(e: csv::Error) -> Self {
        IctrCliError::Csv(e)
    }
}

impl From<serde_json::Error> for IctrCliError {
    fn from(e: serde_json::Error) -> Self {
        IctrCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<IctrCliError> for CliError {
    fn from(e: IctrCliError) -> Self {
        match e {
            IctrCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            IctrCliError::Compute(ComputeError::Build(BuildError::DegenerateInput {
                indicator,
                std_dev,
            })) => CliError {
                code: "DEGENERATE_INPUT".to_string(),
                message: format!(
                    "Indicator '{}' has no variation after alignment (std dev {:e})",
                    indicator, std_dev
                ),
                hint: Some(format!("Retry with --exclude {}", indicator)),
            },
            IctrCliError::Compute(ComputeError::Build(e)) => CliError {
                code: "BUILD_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            IctrCliError::Compute(ComputeError::Validation(e)) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'ictr validate' for details".to_string()),
            },
            IctrCliError::Compute(ComputeError::EncodingError(message)) => CliError {
                code: "ENCODING_ERROR".to_string(),
                message: format!("Cannot encode the snapshot: {}", message),
                hint: None,
            },
            IctrCliError::Compute(ComputeError::JsonError(e)) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            IctrCliError::Compute(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches the {} schema", SCHEMA_VERSION)),
            },
            IctrCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            IctrCliError::NoIndicators => CliError {
                code: "NO_INDICATORS".to_string(),
                message: "No indicators found in input".to_string(),
                hint: Some("Ensure the document lists at least one indicator".to_string()),
            },
            IctrCliError::NoIndex(reason) => CliError {
                code: "NO_INDEX".to_string(),
                message: format!("No index computed: {}", reason),
                hint: Some(
                    "Supply longer or more overlapping series, or lower index.min_rows".to_string(),
                ),
            },
            IctrCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} validation problems found", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            IctrCliError::Csv(e) => CliError {
                code: "CSV_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            IctrCliError::InteractiveStdin => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal; nothing to read".to_string(),
                hint: Some("Pipe a document into the command or pass -i <file>".to_string()),
            },
            IctrCliError::RebaseFailed => CliError {
                code: "REBASE_FAILED".to_string(),
                message: "Index cannot be rebased: first value is zero".to_string(),
                hint: Some("Drop --rebase or use a non-zero base".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct NormalizeReport {
    series: BTreeMap<String, GrowthSeries>,
    dropped: Vec<DroppedDetail>,
}

#[derive(serde::Serialize)]
struct DroppedDetail {
    indicator: String,
    reason: String,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    schema_version: String,
    total_indicators: usize,
    invalid: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: Option<usize>,
    indicator: Option<String>,
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ictr::align::CompletenessStrategy;
    use ictr::builder::{BuildDiagnostics, BuiltIndex};
    use ictr::types::{CompositeIndex, IndexPoint};
    use ictr::BuildOutcome;
    use pretty_assertions::assert_eq;

    fn report(values: &[f64]) -> IctrReport {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| IndexPoint {
                date: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 28).unwrap(),
                value: *v,
                score: (v - 100.0) / 10.0,
            })
            .collect();

        IctrReport {
            outcome: BuildOutcome::Index(BuiltIndex {
                index: CompositeIndex {
                    points,
                    explained_variance_ratio: 0.7,
                    indicators: vec!["GDP".to_string(), "IPI".to_string()],
                    base: 100.0,
                    scale: 10.0,
                },
                diagnostics: BuildDiagnostics {
                    strategy: CompletenessStrategy::Strict,
                    joined_rows: values.len(),
                    retained_rows: values.len(),
                    sign_flipped: false,
                    columns: Vec::new(),
                },
            }),
            indicators: Vec::new(),
            dropped: Vec::new(),
        }
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_month() {
        let out = format_csv(&report(&[95.0, 105.0]), false).unwrap();
        assert_eq!(
            out,
            "date,value,score\n2024-01-28,95,-0.5\n2024-02-28,105,0.5\n"
        );
    }

    #[test]
    fn test_csv_rebased_column() {
        let out = format_csv(&report(&[80.0, 100.0]), true).unwrap();
        assert_eq!(
            out,
            "date,value,score,rebased\n2024-01-28,80,-2,100\n2024-02-28,100,0,125\n"
        );
    }

    #[test]
    fn test_csv_rebase_of_zero_first_value_fails() {
        assert!(matches!(
            format_csv(&report(&[0.0, 100.0]), true),
            Err(IctrCliError::RebaseFailed)
        ));
    }

    #[test]
    fn test_csv_of_no_index_is_empty() {
        let report = IctrReport {
            outcome: BuildOutcome::NoIndex(NoIndexReason::NoIndicators),
            indicators: Vec::new(),
            dropped: Vec::new(),
        };
        assert_eq!(format_csv(&report, true).unwrap(), "");
    }

    #[test]
    fn test_encoding_failure_has_its_own_code() {
        let err = CliError::from(IctrCliError::Compute(ComputeError::EncodingError(
            "non-finite index value at 2024-01-31".to_string(),
        )));
        assert_eq!(err.code, "ENCODING_ERROR");
        assert!(err.message.contains("non-finite"));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CliError::from(IctrCliError::Compute(ComputeError::JsonError(json_err)));
        assert_eq!(err.code, "JSON_ERROR");

        let err = CliError::from(IctrCliError::Compute(ComputeError::ParseError(
            "line 3".to_string(),
        )));
        assert_eq!(err.code, "PARSE_ERROR");
    }
}
