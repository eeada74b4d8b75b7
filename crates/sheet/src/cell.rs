use serde::Serialize;
use std::fmt;

/// Declared type tag carried by a raw worksheet cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellKind {
    Bool,
    Error,
    Formula,
    InlineString,
    SharedStringIndex,
    #[default]
    Number,
}

impl CellKind {
    /// Map the `t` attribute of a `<c>` element to a declared kind.
    ///
    /// A missing or unrecognised tag means a number. ISO-8601 date cells
    /// (`t="d"`) carry literal text and are treated as inline strings.
    pub fn from_type_attr(attr: Option<&str>) -> Self {
        match attr {
            Some("b") => CellKind::Bool,
            Some("e") => CellKind::Error,
            Some("str") => CellKind::Formula,
            Some("inlineStr" | "d") => CellKind::InlineString,
            Some("s") => CellKind::SharedStringIndex,
            _ => CellKind::Number,
        }
    }
}

/// Semantic type inferred for a column from its first data row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    String,
    Number,
    Date,
    Boolean,
    Error,
}

impl ColumnType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Number => "Number",
            ColumnType::Date => "Date",
            ColumnType::Boolean => "Boolean",
            ColumnType::Error => "Error",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved number format: the format id plus its code when one is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pub index: u16,
    pub code: Option<String>,
}

impl NumberFormat {
    #[must_use]
    pub fn new(index: u16, code: Option<String>) -> Self {
        NumberFormat { index, code }
    }

    /// A custom format with an explicit code.
    #[must_use]
    pub fn custom(index: u16, code: &str) -> Self {
        NumberFormat {
            index,
            code: Some(code.to_string()),
        }
    }
}

/// One cell ready for decoding: column resolved, number format looked up
#[derive(Debug, Clone, PartialEq)]
pub struct CellEvent {
    pub column: usize,
    pub kind: CellKind,
    pub text: String,
    pub number_format: Option<NumberFormat>,
}

impl CellEvent {
    #[must_use]
    pub fn new(column: usize, kind: CellKind, text: impl Into<String>) -> Self {
        CellEvent {
            column,
            kind,
            text: text.into(),
            number_format: None,
        }
    }

    #[must_use]
    pub fn with_number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = Some(format);
        self
    }
}

/// Output of the decoder: the CSV-quoted text and the type it suggests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCell {
    pub text: String,
    pub column_type: ColumnType,
}

impl DecodedCell {
    #[must_use]
    pub fn new(text: impl Into<String>, column_type: ColumnType) -> Self {
        DecodedCell {
            text: text.into(),
            column_type,
        }
    }
}
