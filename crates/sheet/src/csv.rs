use crate::error::Result;
use crate::sheet::Sheet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Wrap a decoded value in double quotes.
///
/// Embedded quotes are dropped rather than escaped, so a quoted field never
/// contains a `"` of its own.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    out.extend(value.chars().filter(|c| *c != '"'));
    out.push('"');
    out
}

/// Remove every double quote from a field.
pub fn strip_quotes(field: &str) -> String {
    field.replace('"', "")
}

/// Split a row line into its fields.
///
/// A comma separates fields only when an even number of quotes follows it.
/// Trailing empty fields are kept and the empty line has one empty field.
pub fn split_fields(line: &str) -> Vec<&str> {
    let total_quotes = line.bytes().filter(|b| *b == b'"').count();
    let mut seen_quotes = 0;
    let mut start = 0;
    let mut fields = Vec::new();

    for (idx, b) in line.bytes().enumerate() {
        match b {
            b'"' => seen_quotes += 1,
            b',' if (total_quotes - seen_quotes) % 2 == 0 => {
                fields.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    fields.push(&line[start..]);
    fields
}

/// Number of fields in a row line.
pub fn field_count(line: &str) -> usize {
    split_fields(line).len()
}

/// True when every field of the line is empty once quotes are stripped.
pub fn is_blank_row(line: &str) -> bool {
    split_fields(line)
        .iter()
        .all(|field| field.bytes().all(|b| b == b'"'))
}

/// Options for re-encoding a sheet through the csv writer
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter (default: ',')
    pub delimiter: u8,
    /// Whether to write the header row first (default: true)
    pub include_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            include_headers: true,
        }
    }
}

impl CsvOptions {
    /// Create options for TSV (tab-separated values)
    #[must_use]
    pub fn tsv() -> Self {
        CsvOptions {
            delimiter: b'\t',
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_headers(mut self, include_headers: bool) -> Self {
        self.include_headers = include_headers;
        self
    }
}

impl Sheet {
    /// Save the sheet to a CSV file
    pub fn save_as_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_as_csv_with_options(path, &CsvOptions::default())
    }

    /// Save the sheet to a CSV file with custom options
    pub fn save_as_csv_with_options<P: AsRef<Path>>(
        &self,
        path: P,
        options: &CsvOptions,
    ) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        self.write_csv(writer, options)
    }

    /// Write headers and rows through the csv writer, unquoting each field
    /// and letting the writer apply its own quoting rules.
    pub fn write_csv<W: Write>(&self, writer: W, options: &CsvOptions) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .flexible(true)
            .from_writer(writer);

        if options.include_headers {
            csv_writer.write_record(self.headers())?;
        }

        for row in self.rows() {
            let record: Vec<String> = split_fields(row).into_iter().map(strip_quotes).collect();
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Convert the sheet to a CSV string
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer, &CsvOptions::default())?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
