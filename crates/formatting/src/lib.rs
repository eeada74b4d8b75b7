//! Number-format rendering for xlrows
//!
//! Renders raw numeric cell contents through spreadsheet number-format codes
//! (`General`, `#,##0.00`, `yyyy-mm-dd`, `h:mm AM/PM`, ...). Only the subset of
//! the format language that matters for textual extraction is supported:
//! there is no locale-aware grouping and no fill/alignment behaviour.
//!
//! ```
//! use xlrows_formatting::format_raw_cell_contents;
//!
//! assert_eq!(format_raw_cell_contents(1234.5, 4, "#,##0.00"), "1,234.50");
//! assert_eq!(format_raw_cell_contents(32994.0, 164, "yyyy-mm-dd"), "1990-05-01");
//! assert_eq!(format_raw_cell_contents(30.0, 0, "General"), "30");
//! ```

mod builtin;
mod ssf;

pub use builtin::{builtin_format, BUILTIN_FORMAT_COUNT};
pub use ssf::{format_general, format_raw_cell_contents, is_date_format};
