use crate::cell::{CellEvent, CellKind, ColumnType, DecodedCell, NumberFormat};
use crate::csv::quote;
use crate::source::{SharedStrings, NO_SHARED_STRINGS};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;
use xlrows_formatting::is_date_format;

/// Renders a numeric value through a number format
pub trait NumberFormatter {
    fn format(&self, value: f64, format: &NumberFormat) -> String;
}

/// Formatter backed by the built-in number format engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SsfFormatter;

impl NumberFormatter for SsfFormatter {
    fn format(&self, value: f64, format: &NumberFormat) -> String {
        xlrows_formatting::format_raw_cell_contents(
            value,
            format.index,
            format.code.as_deref().unwrap_or(""),
        )
    }
}

pub(crate) static DEFAULT_FORMATTER: SsfFormatter = SsfFormatter;

fn spacing_artifact_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^-/.,\d]\s").expect("valid regex"))
}

/// Strip padding the formatter leaves behind (a non-numeric character
/// followed by whitespace) and trim the result.
pub fn strip_spacing_artifacts(formatted: &str) -> String {
    spacing_artifact_regex()
        .replace_all(formatted, "")
        .trim()
        .to_string()
}

/// Date heuristic: the unquoted text splits on `-`, `/` or `.` into exactly
/// three integer parts.
pub fn looks_like_date(text: &str) -> bool {
    let unquoted = text.replace('"', "");
    ['-', '/', '.'].iter().any(|sep| {
        let parts: Vec<&str> = unquoted.split(*sep).collect();
        parts.len() == 3 && parts.iter().all(|part| part.parse::<i32>().is_ok())
    })
}

fn date_or(text: &str, fallback: ColumnType) -> ColumnType {
    if looks_like_date(text) {
        ColumnType::Date
    } else {
        fallback
    }
}

/// Turns a cell event into quoted display text plus a column type
pub struct CellValueDecoder<'a> {
    shared_strings: &'a dyn SharedStrings,
    formatter: &'a dyn NumberFormatter,
    use_cell_formatting: bool,
}

impl Default for CellValueDecoder<'_> {
    fn default() -> Self {
        CellValueDecoder::new(&NO_SHARED_STRINGS)
    }
}

impl<'a> CellValueDecoder<'a> {
    pub fn new(shared_strings: &'a dyn SharedStrings) -> Self {
        CellValueDecoder {
            shared_strings,
            formatter: &DEFAULT_FORMATTER,
            use_cell_formatting: true,
        }
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: &'a dyn NumberFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn with_cell_formatting(mut self, enabled: bool) -> Self {
        self.use_cell_formatting = enabled;
        self
    }

    /// Decode one cell. Returns `None` when the cell has to be skipped.
    pub fn decode(&self, cell: &CellEvent) -> Option<DecodedCell> {
        let decoded = match cell.kind {
            CellKind::Bool => {
                let value = if cell.text.starts_with('0') {
                    "FALSE"
                } else {
                    "TRUE"
                };
                DecodedCell::new(quote(value), ColumnType::Boolean)
            }
            CellKind::Error => {
                DecodedCell::new(quote(&format!("ERROR:{}", cell.text)), ColumnType::Error)
            }
            CellKind::Formula => DecodedCell::new(quote(&cell.text), ColumnType::String),
            CellKind::InlineString => {
                let text = quote(&cell.text);
                let column_type = date_or(&text, ColumnType::String);
                DecodedCell::new(text, column_type)
            }
            CellKind::SharedStringIndex => {
                let index = match cell.text.trim().parse::<usize>() {
                    Ok(index) => index,
                    Err(e) => {
                        warn!(
                            "Failed to parse shared string index '{}' in column {}: {}",
                            cell.text, cell.column, e
                        );
                        return None;
                    }
                };
                let Some(value) = self.shared_strings.shared_string(index) else {
                    warn!(
                        "Shared string index {} out of range in column {}",
                        index, cell.column
                    );
                    return None;
                };
                let text = quote(value);
                let column_type = date_or(&text, ColumnType::String);
                DecodedCell::new(text, column_type)
            }
            CellKind::Number => {
                let rendered = match (&cell.number_format, self.use_cell_formatting) {
                    (Some(format), true) => self.render_number(&cell.text, format),
                    _ => cell.text.clone(),
                };
                let text = quote(&rendered);
                let column_type = if self.has_date_format(cell) {
                    ColumnType::Date
                } else {
                    date_or(&text, ColumnType::Number)
                };
                DecodedCell::new(text, column_type)
            }
        };
        Some(decoded)
    }

    /// A numeric cell rendered through a date or time format, such as
    /// `d-mmm-yy`, whose text the date heuristic would not recognise.
    fn has_date_format(&self, cell: &CellEvent) -> bool {
        self.use_cell_formatting
            && cell.text.trim().parse::<f64>().is_ok()
            && cell
                .number_format
                .as_ref()
                .and_then(|format| format.code.as_deref())
                .is_some_and(is_date_format)
    }

    fn render_number(&self, raw: &str, format: &NumberFormat) -> String {
        match raw.trim().parse::<f64>() {
            Ok(value) => strip_spacing_artifacts(&self.formatter.format(value, format)),
            Err(e) => {
                warn!("Failed to parse numeric value '{}': {}", raw, e);
                raw.to_string()
            }
        }
    }
}
