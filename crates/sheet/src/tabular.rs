use crate::source::TabularSource;
use calamine::{Data, Range};
use xlrows_formatting::{format_general, format_raw_cell_contents};

/// Render a calamine cell as text; empty cells have no value.
fn data_to_string(data: &Data) -> Option<String> {
    match data {
        Data::Empty => None,
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_general(*f)),
        Data::String(s) => Some(s.clone()),
        Data::DateTime(dt) => Some(format_raw_cell_contents(dt.as_f64(), 0, "dd-mmm-yyyy")),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(e) => Some(e.to_string()),
    }
}

/// A worksheet loaded by calamine, addressed in absolute coordinates
pub struct CalamineSheet {
    range: Range<Data>,
}

impl CalamineSheet {
    pub fn new(range: Range<Data>) -> Self {
        CalamineSheet { range }
    }
}

impl TabularSource for CalamineSheet {
    fn row_count(&self) -> usize {
        self.range.end().map_or(0, |(row, _)| row as usize + 1)
    }

    /// Rows outside the used range, or with no non-empty cell, do not exist.
    fn row(&self, index: usize) -> Option<Vec<Option<String>>> {
        let (start_row, start_col) = self.range.start()?;
        let (end_row, end_col) = self.range.end()?;
        let row = u32::try_from(index).ok()?;
        if row < start_row || row > end_row {
            return None;
        }

        let mut cells: Vec<Option<String>> = vec![None; start_col as usize];
        for col in start_col..=end_col {
            cells.push(self.range.get_value((row, col)).and_then(data_to_string));
        }
        while cells.last().is_some_and(Option::is_none) {
            cells.pop();
        }

        if cells.is_empty() {
            None
        } else {
            Some(cells)
        }
    }
}
