//! Spreadsheet-to-CSV extraction for xlrows
//!
//! Reads worksheets row by row and turns each into a [`Sheet`]: a header
//! row, one inferred [`ColumnType`] per column, and data rows encoded as
//! CSV lines with every value double-quoted. Cell values are rendered the
//! way a spreadsheet would display them, using the cell's number format.
//!
//! XLSX files are streamed straight from the zip archive. Legacy and other
//! containers (xls, xlsb, ods) go through calamine.
//!
//! # Examples
//!
//! ## Driving the row engine with cell events
//!
//! ```
//! use xlrows_sheet::{CellKind, ColumnType, RawCell, ReadOptions, SheetEvent, SheetStreamDriver};
//!
//! let events = vec![
//!     SheetEvent::RowStart,
//!     SheetEvent::Cell(RawCell::new("A1", CellKind::InlineString, "Name")),
//!     SheetEvent::Cell(RawCell::new("B1", CellKind::InlineString, "Age")),
//!     SheetEvent::RowEnd,
//!     SheetEvent::RowStart,
//!     SheetEvent::Cell(RawCell::new("A2", CellKind::InlineString, "Alice")),
//!     SheetEvent::Cell(RawCell::new("B2", CellKind::Number, "30")),
//!     SheetEvent::RowEnd,
//! ];
//!
//! let options = ReadOptions::default();
//! let sheet = SheetStreamDriver::new(&options)
//!     .drive("People", 0, events.into_iter().map(Ok))
//!     .unwrap();
//!
//! assert_eq!(sheet.headers().to_vec(), vec!["Name", "Age"]);
//! assert_eq!(sheet.column_types().to_vec(), vec![ColumnType::String, ColumnType::Number]);
//! assert_eq!(sheet.rows().to_vec(), vec!["\"Alice\",\"30\""]);
//! assert_eq!(sheet.cell_values(0, false).unwrap(), vec!["Alice", "30"]);
//! ```
//!
//! ## Reading a workbook
//!
//! ```no_run
//! use xlrows_sheet::{Book, ColumnFilter, ReadOptions};
//!
//! let options = ReadOptions::default()
//!     .with_max_rows(100)
//!     .with_column_filter(ColumnFilter::new(["Name", "Birthdate"]));
//! let book = Book::open("people.xlsx", &options).unwrap();
//!
//! for sheet in book.sheets() {
//!     println!("{} [index={}]: {:?}", sheet.name(), sheet.index(), sheet.headers());
//! }
//! ```
//!
//! ## Streaming to a writer
//!
//! ```no_run
//! use xlrows_sheet::{Book, ReadOptions};
//!
//! let mut out = std::io::stdout();
//! let sheets = Book::stream_xlsx_csv("people.xlsx", &ReadOptions::default(), &mut out).unwrap();
//! assert!(sheets.iter().all(|s| s.rows().is_empty()));
//! ```

pub mod a1_notation;
mod assembler;
mod book;
mod cell;
mod csv;
mod decode;
mod driver;
mod error;
mod filter;
mod infer;
mod options;
mod sheet;
mod source;
mod tabular;
mod xlsx;

pub use assembler::{AssemblerState, RowAssembler, RowOutcome, Termination};
pub use book::Book;
pub use cell::{CellEvent, CellKind, ColumnType, DecodedCell, NumberFormat};
pub use self::csv::{is_blank_row, quote, split_fields, strip_quotes, CsvOptions};
pub use decode::{
    looks_like_date, strip_spacing_artifacts, CellValueDecoder, NumberFormatter, SsfFormatter,
};
pub use driver::{SheetStreamDriver, HEADER_SEARCH_ROWS};
pub use error::{Result, SheetError};
pub use filter::ColumnFilter;
pub use infer::ColumnTypeInferencer;
pub use options::ReadOptions;
pub use sheet::Sheet;
pub use source::{RawCell, SharedStrings, SheetEvent, StyleResolver, TabularSource};
pub use tabular::CalamineSheet;
pub use xlsx::{SharedStringTable, SheetEntry, StyleTable, XlsxPackage, XmlCellEvents};
