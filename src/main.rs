//! csvtok CLI - validate and normalize CSV files

use clap::Parser;
use csvtok::encoding::decode_to_utf8;
use csvtok::escape::write_row;
use csvtok::{
    CsvError, Delimiter, ErrorIgnore, ErrorLog, ErrorPolicy, ErrorRaise, ErrorTrace, ReaderBuilder,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Streaming CSV validator.
///
/// Reads each file row by row, enforcing the column count of the first row,
/// and reports malformed rows according to the chosen policy.
#[derive(Parser, Debug)]
#[command(name = "csvtok")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file(s)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Delimiter characters; any of them separates cells
    #[arg(short = 'd', long, default_value = ",")]
    delimiter: String,

    /// Treat the first row as a header
    #[arg(long)]
    header: bool,

    /// What to do with malformed rows
    #[arg(short = 'p', long, default_value = "log")]
    policy: PolicyArg,

    /// Output format: text (default), json, or csv (normalized rows)
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum PolicyArg {
    /// Skip malformed rows silently
    Ignore,
    /// Stop at the first malformed row
    Raise,
    /// Print malformed rows to stderr and continue
    Log,
    /// Emit a tracing warning per malformed row and continue
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// What a pass over one file found.
#[derive(Debug, Default)]
struct Summary {
    rows: usize,
    good_rows: usize,
    failed_rows: usize,
    columns: usize,
    header: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut exit_code = ExitCode::SUCCESS;

    for file in &args.files {
        match process_file(file, &args) {
            Ok(summary) => {
                if summary.failed_rows > 0 {
                    exit_code = ExitCode::FAILURE;
                }
                match args.format {
                    OutputFormat::Text => print_text_output(file, &summary),
                    OutputFormat::Json => print_json_output(file, &summary),
                    OutputFormat::Csv => {}
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", file.display(), e);
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    exit_code
}

fn process_file(path: &Path, args: &Args) -> Result<Summary, Box<dyn std::error::Error>> {
    if !args.delimiter.is_ascii() {
        return Err(format!("delimiter must be ASCII: {:?}", args.delimiter).into());
    }
    let delimiter = Delimiter::new(args.delimiter.as_bytes())?;

    let raw = std::fs::read(path)?;
    let decoded = decode_to_utf8(&raw);
    tracing::debug!(
        file = %path.display(),
        encoding = decoded.encoding.name(),
        "decoded input"
    );
    if decoded.had_errors {
        tracing::warn!(file = %path.display(), "input contained malformed byte sequences");
    }

    let builder = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_header(args.header);
    let summary = match args.policy {
        PolicyArg::Ignore => scan(builder.error_policy(ErrorIgnore), &decoded.data, args.format),
        PolicyArg::Raise => scan(builder.error_policy(ErrorRaise), &decoded.data, args.format),
        PolicyArg::Log => scan(
            builder.error_policy(ErrorLog::stderr()),
            &decoded.data,
            args.format,
        ),
        PolicyArg::Trace => scan(builder.error_policy(ErrorTrace), &decoded.data, args.format),
    }?;
    Ok(summary)
}

fn scan<P: ErrorPolicy>(
    builder: ReaderBuilder<P>,
    data: &[u8],
    format: OutputFormat,
) -> Result<Summary, CsvError> {
    let mut reader = builder.from_slice(data)?;
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if format == OutputFormat::Csv && reader.has_header() {
        let names = reader.header_row().names().iter().map(|s| s.as_bytes());
        write_row(&mut out, names, b',')?;
    }

    let mut summary = Summary::default();
    while !reader.done() {
        match reader.fetch()? {
            Some(row) => {
                summary.good_rows += 1;
                if format == OutputFormat::Csv {
                    write_row(&mut out, row.iter(), b',')?;
                }
            }
            None => summary.failed_rows += 1,
        }
    }
    out.flush()?;

    summary.rows = reader.rows();
    summary.columns = reader.columns();
    summary.header = reader.header_row().names().to_vec();
    Ok(summary)
}

fn print_text_output(path: &Path, summary: &Summary) {
    println!("File: {}", path.display());
    println!("  Rows read: {}", summary.rows);
    println!("  Good rows: {}", summary.good_rows);
    println!("  Failed rows: {}", summary.failed_rows);
    println!("  Columns: {}", summary.columns);
    if !summary.header.is_empty() {
        println!("  Header: {}", summary.header.join(", "));
    }
    println!();
}

fn print_json_output(path: &Path, summary: &Summary) {
    let header = summary
        .header
        .iter()
        .map(|name| format!("\"{}\"", json_escape(name)))
        .collect::<Vec<_>>()
        .join(",");
    println!(
        r#"{{"file":"{}","rows":{},"good_rows":{},"failed_rows":{},"columns":{},"header":[{}]}}"#,
        json_escape(&path.display().to_string()),
        summary.rows,
        summary.good_rows,
        summary.failed_rows,
        summary.columns,
        header
    );
}

fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
