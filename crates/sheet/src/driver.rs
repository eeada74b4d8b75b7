use crate::a1_notation::split_cell_reference;
use crate::assembler::{RowAssembler, RowOutcome, Termination};
use crate::cell::{CellEvent, CellKind, ColumnType, DecodedCell};
use crate::csv::quote;
use crate::decode::{CellValueDecoder, NumberFormatter, DEFAULT_FORMATTER};
use crate::error::Result;
use crate::options::ReadOptions;
use crate::sheet::Sheet;
use crate::source::{
    RawCell, SharedStrings, SheetEvent, StyleResolver, TabularSource, NO_SHARED_STRINGS,
    NO_STYLES,
};
use std::io::Write;
use tracing::{debug, info, warn};

/// Rows scanned for a header on tabular sources.
pub const HEADER_SEARCH_ROWS: usize = 5;

/// Runs one worksheet through decoding and row assembly
pub struct SheetStreamDriver<'a> {
    options: &'a ReadOptions,
    shared_strings: &'a dyn SharedStrings,
    styles: &'a dyn StyleResolver,
    formatter: &'a dyn NumberFormatter,
}

impl<'a> SheetStreamDriver<'a> {
    pub fn new(options: &'a ReadOptions) -> Self {
        SheetStreamDriver {
            options,
            shared_strings: &NO_SHARED_STRINGS,
            styles: &NO_STYLES,
            formatter: &DEFAULT_FORMATTER,
        }
    }

    #[must_use]
    pub fn with_shared_strings(mut self, shared_strings: &'a dyn SharedStrings) -> Self {
        self.shared_strings = shared_strings;
        self
    }

    #[must_use]
    pub fn with_styles(mut self, styles: &'a dyn StyleResolver) -> Self {
        self.styles = styles;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: &'a dyn NumberFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Consume a sheet's event stream and collect its rows.
    pub fn drive<I>(&self, name: &str, index: usize, events: I) -> Result<Sheet>
    where
        I: IntoIterator<Item = Result<SheetEvent>>,
    {
        self.run(name, index, events, RowAssembler::new(self.options))
    }

    /// Consume a sheet's event stream, writing each retained line to `sink`.
    /// The returned sheet carries headers and types but no rows.
    pub fn drive_into_sink<I>(
        &self,
        name: &str,
        index: usize,
        events: I,
        sink: &mut dyn Write,
    ) -> Result<Sheet>
    where
        I: IntoIterator<Item = Result<SheetEvent>>,
    {
        self.run(
            name,
            index,
            events,
            RowAssembler::with_sink(self.options, sink),
        )
    }

    fn run<I>(
        &self,
        name: &str,
        index: usize,
        events: I,
        mut assembler: RowAssembler<'_>,
    ) -> Result<Sheet>
    where
        I: IntoIterator<Item = Result<SheetEvent>>,
    {
        info!("Processing sheet {} - {}", index, name);
        let decoder = CellValueDecoder::new(self.shared_strings)
            .with_formatter(self.formatter)
            .with_cell_formatting(self.options.use_cell_formatting);

        let mut next_column = 0;
        for event in events {
            match event? {
                SheetEvent::RowStart => {
                    assembler.begin_row();
                    next_column = 0;
                }
                SheetEvent::Cell(raw) => {
                    let Some(cell) = self.resolve_cell(raw, next_column) else {
                        continue;
                    };
                    next_column = cell.column + 1;
                    if let Some(decoded) = decoder.decode(&cell) {
                        assembler.emit_cell(cell.column, decoded);
                    }
                }
                SheetEvent::RowEnd => {
                    if let RowOutcome::Terminated(reason) = assembler.end_row()? {
                        log_termination(reason, name, index, assembler.data_row_count());
                        break;
                    }
                }
            }
        }

        debug!(
            "Sheet {} - {} done: {} data rows",
            index,
            name,
            assembler.data_row_count()
        );
        Ok(assembler.finish(name, index))
    }

    /// Drive a tabular source: the first existing row among the first
    /// [`HEADER_SEARCH_ROWS`] is the header, every later row is data.
    pub fn drive_tabular<T>(&self, name: &str, index: usize, source: &T) -> Result<Sheet>
    where
        T: TabularSource + ?Sized,
    {
        info!("Processing sheet {} - {}", index, name);
        let mut assembler = RowAssembler::new(self.options);

        let row_count = source.row_count();
        let header = (0..HEADER_SEARCH_ROWS.min(row_count))
            .find_map(|row| source.row(row).map(|cells| (row, cells)));
        let Some((header_row, header_cells)) = header else {
            debug!("No header row found on sheet {} - {}", index, name);
            return Ok(assembler.finish(name, index));
        };

        let headers = header_cells
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        assembler.accept_headers(headers)?;

        for row in header_row + 1..row_count {
            let Some(cells) = source.row(row) else {
                continue;
            };
            let width = source.last_cell_index(row).map_or(0, |last| last + 1);

            assembler.begin_row();
            for column in 0..width {
                let value = cells.get(column).cloned().flatten().unwrap_or_default();
                assembler.emit_cell(column, DecodedCell::new(quote(&value), ColumnType::String));
            }
            if let RowOutcome::Terminated(reason) = assembler.end_row()? {
                log_termination(reason, name, index, assembler.data_row_count());
                break;
            }
        }

        Ok(assembler.finish(name, index))
    }

    fn resolve_cell(&self, raw: RawCell, next_column: usize) -> Option<CellEvent> {
        let column = match raw.reference.as_deref() {
            Some(reference) => match split_cell_reference(reference) {
                Ok((column, _)) => column,
                Err(e) => {
                    warn!("Skipping cell: {}", e);
                    return None;
                }
            },
            None => next_column,
        };

        let mut cell = CellEvent::new(column, raw.kind, raw.text);
        if raw.kind == CellKind::Number {
            if let Some(style) = raw.style {
                match self.styles.number_format(style) {
                    Some(format) => cell = cell.with_number_format(format),
                    None => debug!("No cell format for style index {}", style),
                }
            }
        }
        Some(cell)
    }
}

fn log_termination(reason: Termination, name: &str, index: usize, rows: usize) {
    match reason {
        Termination::RowLimitReached => info!(
            "Reached maximum allowed row count {} on sheet {} - {}",
            rows, index, name
        ),
        Termination::MemoryExhausted => warn!(
            "Reached maximum allowed memory usage at {} rows on sheet {} - {}",
            rows, index, name
        ),
    }
}
