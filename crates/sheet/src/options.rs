use crate::filter::ColumnFilter;

/// Options controlling how worksheets are read
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Only process the sheet at this index (default: all sheets)
    pub sheet_index: Option<usize>,
    /// Stop a sheet after this many data rows (default: unbounded)
    pub max_rows: Option<usize>,
    /// Pad every row to at least this many fields
    pub min_columns: Option<usize>,
    /// Keep only these columns (default: all)
    pub column_filter: Option<ColumnFilter>,
    /// Drop rows whose fields are all empty (default: true)
    pub ignore_blank_rows: bool,
    /// Render numbers through their cell format (default: true)
    pub use_cell_formatting: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            sheet_index: None,
            max_rows: None,
            min_columns: None,
            column_filter: None,
            ignore_blank_rows: true,
            use_cell_formatting: true,
        }
    }
}

impl ReadOptions {
    #[must_use]
    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet_index = Some(index);
        self
    }

    /// Set the row limit; zero means unbounded.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = (max_rows > 0).then_some(max_rows);
        self
    }

    /// Set the minimum field count; zero disables padding.
    #[must_use]
    pub fn with_min_columns(mut self, min_columns: usize) -> Self {
        self.min_columns = (min_columns > 0).then_some(min_columns);
        self
    }

    #[must_use]
    pub fn with_column_filter(mut self, filter: ColumnFilter) -> Self {
        self.column_filter = (!filter.is_empty()).then_some(filter);
        self
    }

    #[must_use]
    pub fn with_ignore_blank_rows(mut self, ignore: bool) -> Self {
        self.ignore_blank_rows = ignore;
        self
    }

    #[must_use]
    pub fn with_cell_formatting(mut self, enabled: bool) -> Self {
        self.use_cell_formatting = enabled;
        self
    }

    /// Whether the sheet at `index` should be processed.
    pub fn selects(&self, index: usize) -> bool {
        self.sheet_index.map_or(true, |wanted| wanted == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReadOptions::default();
        assert!(options.ignore_blank_rows);
        assert!(options.use_cell_formatting);
        assert!(options.selects(0));
        assert!(options.selects(7));
    }

    #[test]
    fn test_zero_limits_are_unbounded() {
        let options = ReadOptions::default().with_max_rows(0).with_min_columns(0);
        assert_eq!(options.max_rows, None);
        assert_eq!(options.min_columns, None);
    }

    #[test]
    fn test_sheet_selection() {
        let options = ReadOptions::default().with_sheet_index(1);
        assert!(!options.selects(0));
        assert!(options.selects(1));
    }

    #[test]
    fn test_empty_filter_is_dropped() {
        let options = ReadOptions::default().with_column_filter(ColumnFilter::default());
        assert!(options.column_filter.is_none());
    }
}
