use crate::cell::ColumnType;
use crate::csv::{split_fields, strip_quotes};
use crate::error::{Result, SheetError};
use serde::Serialize;

/// One worksheet's extracted content.
///
/// Rows are kept as CSV-encoded lines; use [`Sheet::cell_values`] to split
/// one back into fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    name: String,
    index: usize,
    headers: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<String>,
    /// A header row was found, even if the column filter kept none of it.
    #[serde(skip)]
    header_detected: bool,
}

impl Sheet {
    pub fn new(
        name: impl Into<String>,
        index: usize,
        headers: Vec<String>,
        column_types: Vec<ColumnType>,
        rows: Vec<String>,
    ) -> Self {
        Sheet {
            name: name.into(),
            index,
            header_detected: !headers.is_empty(),
            headers,
            column_types,
            rows,
        }
    }

    #[must_use]
    pub(crate) fn with_header_detected(mut self, detected: bool) -> Self {
        self.header_detected = detected;
        self
    }

    /// Whether the source sheet had a header row. A sheet without one is blank.
    pub fn has_header(&self) -> bool {
        self.header_detected
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the sheet in its workbook
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Get the number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    pub fn col_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split row `row` into its fields, keeping or stripping the quotes.
    pub fn cell_values(&self, row: usize, with_quotes: bool) -> Result<Vec<String>> {
        let line = self.rows.get(row).ok_or(SheetError::RowIndexOutOfBounds {
            index: row,
            count: self.rows.len(),
        })?;

        Ok(split_fields(line)
            .into_iter()
            .map(|field| {
                if with_quotes {
                    field.to_string()
                } else {
                    strip_quotes(field)
                }
            })
            .collect())
    }

    /// Case-insensitive header lookup.
    pub fn find_column(&self, header: &str) -> Option<usize> {
        let wanted = header.to_lowercase();
        self.headers.iter().position(|h| h.to_lowercase() == wanted)
    }

    /// Like [`Sheet::find_column`], but a missing header is an error unless
    /// `fail_silently` is set, in which case it yields `Ok(None)`.
    pub fn column_index(&self, header: &str, fail_silently: bool) -> Result<Option<usize>> {
        match self.find_column(header) {
            Some(index) => Ok(Some(index)),
            None if fail_silently => Ok(None),
            None => Err(SheetError::ColumnNotFound {
                name: header.to_string(),
                sheet: self.name.clone(),
                index: self.index,
            }),
        }
    }

    /// Type of the column with this header, if any.
    pub fn column_type(&self, header: &str) -> Option<ColumnType> {
        self.find_column(header)
            .and_then(|index| self.column_types.get(index).copied())
    }
}
