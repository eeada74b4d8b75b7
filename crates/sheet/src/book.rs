use crate::driver::SheetStreamDriver;
use crate::error::{Result, SheetError};
use crate::options::ReadOptions;
use crate::sheet::Sheet;
use crate::tabular::CalamineSheet;
use crate::xlsx::XlsxPackage;
use calamine::{open_workbook_auto, Reader};
use indexmap::IndexMap;
use std::io::{Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info};

/// The sheets extracted from one workbook, in workbook order.
///
/// Sheets that produced no header row are not kept.
#[derive(Debug, Clone, Default)]
pub struct Book {
    sheets: IndexMap<String, Sheet>,
}

impl Book {
    /// Create a new empty book
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Get sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    pub fn get_sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    /// Get a sheet by its index in the source workbook
    pub fn get_sheet_by_index(&self, index: usize) -> Option<&Sheet> {
        self.sheets.values().find(|sheet| sheet.index() == index)
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.values()
    }

    pub fn into_sheets(self) -> Vec<Sheet> {
        self.sheets.into_values().collect()
    }

    /// Add a processed sheet unless it came out blank.
    pub fn push(&mut self, sheet: Sheet) {
        if !sheet.has_header() {
            debug!(
                "Omitting blank sheet {} - {}",
                sheet.index(),
                sheet.name()
            );
            return;
        }
        self.sheets.insert(sheet.name().to_string(), sheet);
    }

    /// Open a workbook, choosing the reader from the file extension.
    pub fn open<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xlsm" => Self::from_xlsx_with_options(path, options),
            "xls" | "xlsb" | "ods" => Self::from_tabular_with_options(path, options),
            _ => Err(SheetError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Load every sheet of an XLSX file with default options
    pub fn from_xlsx<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_xlsx_with_options(path, &ReadOptions::default())
    }

    pub fn from_xlsx_with_options<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let mut package = XlsxPackage::open(path)?;
        read_package(&mut package, options, None)
    }

    pub fn from_xlsx_reader<R: Read + Seek>(reader: R, options: &ReadOptions) -> Result<Self> {
        let mut package = XlsxPackage::from_reader(reader)?;
        read_package(&mut package, options, None)
    }

    /// Stream an XLSX file to `sink`: a banner line per sheet followed by
    /// its rows. The returned sheets carry headers and types only.
    pub fn stream_xlsx_csv<P: AsRef<Path>>(
        path: P,
        options: &ReadOptions,
        sink: &mut dyn Write,
    ) -> Result<Vec<Sheet>> {
        let mut package = XlsxPackage::open(path)?;
        read_package(&mut package, options, Some(sink)).map(Book::into_sheets)
    }

    /// Load every sheet through calamine (xls, xlsb, ods or xlsx) with
    /// default options
    pub fn from_tabular<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_tabular_with_options(path, &ReadOptions::default())
    }

    pub fn from_tabular_with_options<P: AsRef<Path>>(
        path: P,
        options: &ReadOptions,
    ) -> Result<Self> {
        let mut workbook =
            open_workbook_auto(path.as_ref()).map_err(|e| SheetError::Workbook(e.to_string()))?;
        let names = workbook.sheet_names().to_vec();
        check_sheet_index(options, names.len())?;
        log_column_filter(options);

        let driver = SheetStreamDriver::new(options);
        let mut book = Book::new();
        for (index, name) in names.iter().enumerate() {
            if !options.selects(index) {
                continue;
            }
            let range = workbook
                .worksheet_range(name)
                .map_err(|e| SheetError::Workbook(e.to_string()))?;
            book.push(driver.drive_tabular(name, index, &CalamineSheet::new(range))?);
        }
        Ok(book)
    }
}

fn check_sheet_index(options: &ReadOptions, sheet_count: usize) -> Result<()> {
    match options.sheet_index {
        Some(index) if index >= sheet_count => Err(SheetError::SheetNotFound { index }),
        _ => Ok(()),
    }
}

fn log_column_filter(options: &ReadOptions) {
    if let Some(filter) = &options.column_filter {
        info!("Filtering columns: {}", filter);
    }
}

fn read_package<R: Read + Seek>(
    package: &mut XlsxPackage<R>,
    options: &ReadOptions,
    mut sink: Option<&mut dyn Write>,
) -> Result<Book> {
    let sheet_count = package.sheets().len();
    check_sheet_index(options, sheet_count)?;
    log_column_filter(options);

    let mut book = Book::new();
    for index in 0..sheet_count {
        if !options.selects(index) {
            continue;
        }
        if let Some(sink) = sink.as_mut() {
            writeln!(sink)?;
            writeln!(sink, "{} [index={}]:", package.sheets()[index].name, index)?;
        }
        let sheet_sink = sink.as_mut().map(|s| &mut **s as &mut dyn Write);
        let sheet = package.read_sheet(index, options, sheet_sink)?;
        book.push(sheet);
    }
    Ok(book)
}
