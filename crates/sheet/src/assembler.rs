//! Builds CSV row lines from decoded cells.
//!
//! The assembler fills column gaps, pads short rows, drops blank rows,
//! detects the header row, applies the column filter and enforces the row
//! limit. Lines are either collected for a [`Sheet`] or written straight to
//! a sink.

use crate::cell::DecodedCell;
use crate::csv::{field_count, is_blank_row, quote, split_fields, strip_quotes};
use crate::error::Result;
use crate::infer::ColumnTypeInferencer;
use crate::options::ReadOptions;
use crate::sheet::Sheet;
use std::io::Write;

/// Why a sheet stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    RowLimitReached,
    MemoryExhausted,
}

/// Result of finishing a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Continue,
    Terminated(Termination),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    AwaitingHeader,
    AwaitingFirstDataRow,
    SteadyState,
    Terminated(Termination),
}

#[derive(Debug, Default)]
struct RowBuffer {
    text: String,
    last_position: Option<usize>,
}

impl RowBuffer {
    fn reset(&mut self) {
        self.text.clear();
        self.last_position = None;
    }
}

pub struct RowAssembler<'a> {
    options: &'a ReadOptions,
    sink: Option<&'a mut dyn Write>,
    state: AssemblerState,
    headers: Vec<String>,
    /// Column index to output position; set once headers are known and a
    /// filter is active.
    positions: Option<Vec<Option<usize>>>,
    width: usize,
    types: ColumnTypeInferencer,
    rows: Vec<String>,
    buffer: RowBuffer,
    data_rows: usize,
}

impl<'a> RowAssembler<'a> {
    pub fn new(options: &'a ReadOptions) -> Self {
        RowAssembler {
            options,
            sink: None,
            state: AssemblerState::AwaitingHeader,
            headers: Vec::new(),
            positions: None,
            width: 0,
            types: ColumnTypeInferencer::new(),
            rows: Vec::new(),
            buffer: RowBuffer::default(),
            data_rows: 0,
        }
    }

    /// Write every retained line to `sink` instead of collecting rows.
    pub fn with_sink(options: &'a ReadOptions, sink: &'a mut dyn Write) -> Self {
        let mut assembler = Self::new(options);
        assembler.sink = Some(sink);
        assembler
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, AssemblerState::Terminated(_))
    }

    /// Number of data rows retained so far.
    pub fn data_row_count(&self) -> usize {
        self.data_rows
    }

    /// Install headers known up front, skipping header detection.
    pub fn accept_headers(&mut self, headers: Vec<String>) -> Result<()> {
        if self.state != AssemblerState::AwaitingHeader {
            return Ok(());
        }
        self.install_headers(headers);
        self.write_header_line()
    }

    pub fn begin_row(&mut self) {
        self.buffer.reset();
        self.types.discard_pending();
    }

    /// Append a decoded cell at its column, inserting separators for gaps.
    pub fn emit_cell(&mut self, column: usize, cell: DecodedCell) {
        if self.is_terminated() {
            return;
        }
        let Some(position) = self.output_position(column) else {
            return;
        };

        let separators = match self.buffer.last_position {
            None => position,
            Some(last) if position > last => position - last,
            Some(_) => 1,
        };
        for _ in 0..separators {
            self.buffer.text.push(',');
        }
        self.buffer.text.push_str(&cell.text);
        self.buffer.last_position = Some(position);

        if self.state == AssemblerState::AwaitingFirstDataRow {
            self.types.observe(position, cell.column_type);
        }
    }

    /// Finish the current row: pad it, then keep it as headers or data.
    pub fn end_row(&mut self) -> Result<RowOutcome> {
        if let AssemblerState::Terminated(reason) = self.state {
            return Ok(RowOutcome::Terminated(reason));
        }

        let mut line = std::mem::take(&mut self.buffer.text);
        self.buffer.reset();

        let mut fields = field_count(&line);
        if let Some(min) = self.options.min_columns {
            while fields < min {
                line.push(',');
                fields += 1;
            }
        }
        if self.width > fields {
            if line.is_empty() {
                line.push_str("\"\"");
            }
            for _ in fields..self.width {
                line.push_str(",\"\"");
            }
        }

        if self.options.ignore_blank_rows && is_blank_row(&line) {
            self.types.discard_pending();
            return Ok(RowOutcome::Continue);
        }

        if self.state == AssemblerState::AwaitingHeader {
            let headers = split_fields(&line).into_iter().map(strip_quotes).collect();
            self.install_headers(headers);
            self.write_header_line()?;
            return Ok(RowOutcome::Continue);
        }

        if self.state == AssemblerState::AwaitingFirstDataRow {
            self.types.commit();
            self.state = AssemblerState::SteadyState;
        }

        if self.sink.is_some() {
            self.write_line(&line)?;
        } else {
            if self.rows.try_reserve(1).is_err() {
                return Ok(self.terminate(Termination::MemoryExhausted));
            }
            self.rows.push(line);
        }
        self.data_rows += 1;

        if let Some(max) = self.options.max_rows.filter(|max| *max > 0) {
            if self.data_rows >= max {
                return Ok(self.terminate(Termination::RowLimitReached));
            }
        }
        Ok(RowOutcome::Continue)
    }

    /// Headers after filtering, in column order.
    pub fn retained_headers(&self) -> Vec<String> {
        match &self.positions {
            Some(positions) => self
                .headers
                .iter()
                .zip(positions)
                .filter(|(_, position)| position.is_some())
                .map(|(header, _)| header.clone())
                .collect(),
            None => self.headers.clone(),
        }
    }

    pub fn finish(self, name: impl Into<String>, index: usize) -> Sheet {
        let header_detected = !self.headers.is_empty();
        let headers = self.retained_headers();
        let column_types = self.types.finish(headers.len());
        Sheet::new(name, index, headers, column_types, self.rows)
            .with_header_detected(header_detected)
    }

    fn install_headers(&mut self, headers: Vec<String>) {
        match self.options.column_filter.as_ref().filter(|f| !f.is_empty()) {
            Some(filter) => {
                let positions = filter.positions(&headers);
                self.width = positions.iter().flatten().count();
                self.positions = Some(positions);
            }
            None => self.width = headers.len(),
        }
        self.headers = headers;
        self.state = AssemblerState::AwaitingFirstDataRow;
    }

    /// Cells past the last header have no name to filter on and keep their
    /// offset after the retained columns.
    fn output_position(&self, column: usize) -> Option<usize> {
        match &self.positions {
            Some(positions) if column >= positions.len() => {
                Some(self.width + column - positions.len())
            }
            Some(positions) => positions[column],
            None => Some(column),
        }
    }

    fn terminate(&mut self, reason: Termination) -> RowOutcome {
        self.state = AssemblerState::Terminated(reason);
        RowOutcome::Terminated(reason)
    }

    fn write_header_line(&mut self) -> Result<()> {
        if self.sink.is_none() {
            return Ok(());
        }
        let line = self
            .retained_headers()
            .iter()
            .map(|header| quote(header))
            .collect::<Vec<_>>()
            .join(",");
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            writeln!(sink, "{line}")?;
        }
        Ok(())
    }
}
