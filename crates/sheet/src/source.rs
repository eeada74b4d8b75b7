//! Interfaces between the row engine and the containers that feed it.
//!
//! A streaming source yields [`SheetEvent`]s per row; a tabular source hands
//! out whole rows of optional cell strings. Shared strings and number formats
//! are looked up through [`SharedStrings`] and [`StyleResolver`].

use crate::cell::{CellKind, NumberFormat};

/// One event of a worksheet's cell stream. The stream ends with the sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetEvent {
    RowStart,
    Cell(RawCell),
    RowEnd,
}

/// A cell as found in the container, before any lookup
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawCell {
    /// A1-style reference (`"C7"`); `None` when the container omits it.
    pub reference: Option<String>,
    pub kind: CellKind,
    pub style: Option<u32>,
    /// Concatenated raw text fragments of the value.
    pub text: String,
}

impl RawCell {
    #[must_use]
    pub fn new(reference: &str, kind: CellKind, text: impl Into<String>) -> Self {
        RawCell {
            reference: Some(reference.to_string()),
            kind,
            style: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: u32) -> Self {
        self.style = Some(style);
        self
    }
}

/// Lookup from shared-string index to literal text
pub trait SharedStrings {
    fn shared_string(&self, index: usize) -> Option<&str>;
}

impl SharedStrings for Vec<String> {
    fn shared_string(&self, index: usize) -> Option<&str> {
        self.get(index).map(String::as_str)
    }
}

/// Lookup from a cell style index to the number format it applies
pub trait StyleResolver {
    fn number_format(&self, style_index: u32) -> Option<NumberFormat>;
}

impl StyleResolver for Vec<NumberFormat> {
    fn number_format(&self, style_index: u32) -> Option<NumberFormat> {
        self.get(style_index as usize).cloned()
    }
}

/// Row-addressable grid of already-stringified cells
pub trait TabularSource {
    /// Number of row slots, i.e. the last row index plus one.
    fn row_count(&self) -> usize;

    /// Cells of row `index`; `None` when the row does not exist.
    fn row(&self, index: usize) -> Option<Vec<Option<String>>>;

    /// Index of the last cell present in row `index`.
    fn last_cell_index(&self, index: usize) -> Option<usize> {
        self.row(index).and_then(|cells| cells.len().checked_sub(1))
    }
}

impl TabularSource for Vec<Option<Vec<Option<String>>>> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row(&self, index: usize) -> Option<Vec<Option<String>>> {
        self.get(index).cloned().flatten()
    }
}

pub(crate) static NO_SHARED_STRINGS: Vec<String> = Vec::new();
pub(crate) static NO_STYLES: Vec<NumberFormat> = Vec::new();
