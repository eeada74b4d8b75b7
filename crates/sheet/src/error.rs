use thiserror::Error;

/// Errors that can occur while reading workbooks or querying sheets
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Row index out of bounds: {index} (sheet has {count} rows)")]
    RowIndexOutOfBounds { index: usize, count: usize },

    #[error("Column header '{name}' not found on sheet {sheet} - index: {index}")]
    ColumnNotFound {
        name: String,
        sheet: String,
        index: usize,
    },

    #[error("Sheet not found: index {index}")]
    SheetNotFound { index: usize },

    #[error("Invalid cell reference: {0}")]
    InvalidCellReference(String),

    #[error("Missing workbook part: {0}")]
    MissingPart(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SheetError>;
