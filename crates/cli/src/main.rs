//! # xlrows-cli
//!
//! Command-line interface for extracting spreadsheet rows as CSV.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xlrows_sheet::{quote, Book, ColumnFilter, ReadOptions, Sheet};

/// xlrows - spreadsheet rows as CSV with typed headers
#[derive(Parser, Debug)]
#[command(name = "xlrows")]
#[command(author, version, about = "Extract spreadsheet rows as CSV", long_about = None)]
struct Cli {
    /// Workbook to read (xlsx, xlsm, xls, xlsb, ods)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Only read the sheet at this index
    #[arg(short = 's', long = "sheet", value_name = "N")]
    sheet: Option<usize>,

    /// Stop each sheet after N data rows (0 = no limit)
    #[arg(short = 'n', long = "max-rows", value_name = "N", default_value_t = 0)]
    max_rows: usize,

    /// Pad every row to at least N fields
    #[arg(long = "min-columns", value_name = "N", default_value_t = 0)]
    min_columns: usize,

    /// Keep only these columns (comma-separated header names)
    #[arg(short = 'c', long = "columns", value_name = "NAMES")]
    columns: Option<String>,

    /// Keep rows whose cells are all empty
    #[arg(long = "keep-blank-rows")]
    keep_blank_rows: bool,

    /// Print numbers as stored instead of through their cell format
    #[arg(long = "raw-numbers")]
    raw_numbers: bool,

    /// Output format (summary, csv, json)
    #[arg(short = 'f', long = "format", default_value = "summary")]
    format: OutputFormat,

    /// Write rows to stdout while reading instead of loading the workbook (xlsx only)
    #[arg(long = "stream")]
    stream: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format for results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    /// Sheet names, headers and column types (default)
    #[default]
    Summary,
    /// Banner line per sheet followed by its CSV rows
    Csv,
    /// Sheets as JSON
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(io::stderr)
            .init();
    }

    let options = read_options(&cli);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if cli.stream {
        if !is_xlsx(&cli.file) {
            bail!(
                "Streaming needs an xlsx workbook: {}",
                cli.file.display()
            );
        }
        let sheets = Book::stream_xlsx_csv(&cli.file, &options, &mut out)
            .with_context(|| format!("Failed to stream workbook: {}", cli.file.display()))?;
        out.flush()?;
        info!("Streamed {} sheets", sheets.len());
        return Ok(());
    }

    let book = Book::open(&cli.file, &options)
        .with_context(|| format!("Failed to read workbook: {}", cli.file.display()))?;

    match cli.format {
        OutputFormat::Summary => print_summary(&book, &mut out)?,
        OutputFormat::Csv => print_csv(&book, &mut out)?,
        OutputFormat::Json => print_json(&book, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn read_options(cli: &Cli) -> ReadOptions {
    let mut options = ReadOptions::default()
        .with_max_rows(cli.max_rows)
        .with_min_columns(cli.min_columns)
        .with_ignore_blank_rows(!cli.keep_blank_rows)
        .with_cell_formatting(!cli.raw_numbers);
    if let Some(index) = cli.sheet {
        options = options.with_sheet_index(index);
    }
    if let Some(columns) = &cli.columns {
        options = options.with_column_filter(ColumnFilter::parse(columns));
    }
    options
}

fn is_xlsx(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx") || e.eq_ignore_ascii_case("xlsm"))
}

/// Print sheet names, headers with their types, and row counts.
fn print_summary(book: &Book, out: &mut dyn Write) -> Result<()> {
    if book.is_empty() {
        writeln!(out, "{}", "No sheets with data".yellow())?;
        return Ok(());
    }

    for sheet in book.sheets() {
        writeln!(
            out,
            "{} [index={}]: {} rows",
            sheet.name().cyan().bold(),
            sheet.index(),
            sheet.row_count()
        )?;
        for (header, column_type) in sheet.headers().iter().zip(sheet.column_types()) {
            writeln!(out, "  {} {}", header.green(), column_type.to_string().dimmed())?;
        }
    }
    Ok(())
}

fn header_line(sheet: &Sheet) -> String {
    sheet
        .headers()
        .iter()
        .map(|h| quote(h.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Same layout as streaming: a banner per sheet, the header line, then rows.
fn print_csv(book: &Book, out: &mut dyn Write) -> Result<()> {
    for sheet in book.sheets() {
        writeln!(out)?;
        writeln!(out, "{} [index={}]:", sheet.name(), sheet.index())?;
        writeln!(out, "{}", header_line(sheet))?;
        for row in sheet.rows() {
            writeln!(out, "{row}")?;
        }
    }
    Ok(())
}

fn print_json(book: &Book, out: &mut dyn Write) -> Result<()> {
    let sheets: Vec<&Sheet> = book.sheets().collect();
    serde_json::to_writer_pretty(&mut *out, &sheets)?;
    writeln!(out)?;
    Ok(())
}
