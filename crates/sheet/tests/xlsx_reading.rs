use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;
use xlrows_sheet::{Book, ColumnFilter, ColumnType, ReadOptions, SheetError};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_people(workbook: &mut Workbook) -> Result<(), XlsxError> {
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("People")?;
    worksheet.write_string(0, 0, "Name")?;
    worksheet.write_string(0, 1, "Age")?;
    worksheet.write_string(0, 2, "Birthdate")?;
    worksheet.write_string(1, 0, "Alice")?;
    worksheet.write_number(1, 1, 30)?;
    worksheet.write_number_with_format(1, 2, 32994, &date)?;
    worksheet.write_string(2, 0, "Bob")?;
    worksheet.write_number(2, 1, 25)?;
    worksheet.write_number_with_format(2, 2, 36525, &date)?;
    Ok(())
}

fn people_file(path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    write_people(&mut workbook)?;
    workbook.save(path)
}

#[test]
fn test_people_sheet() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let book = Book::from_xlsx(&path)?;
    assert_eq!(book.sheet_names(), vec!["People"]);

    let sheet = book.get_sheet("People").unwrap();
    assert_eq!(sheet.index(), 0);
    assert_eq!(sheet.headers().to_vec(), vec!["Name", "Age", "Birthdate"]);
    assert_eq!(
        sheet.column_types().to_vec(),
        vec![ColumnType::String, ColumnType::Number, ColumnType::Date]
    );
    assert_eq!(
        sheet.rows().to_vec(),
        vec![
            "\"Alice\",\"30\",\"1990-05-01\"",
            "\"Bob\",\"25\",\"1999-12-31\""
        ]
    );
    Ok(())
}

#[test]
fn test_column_filter() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let options =
        ReadOptions::default().with_column_filter(ColumnFilter::new(["Name", "Birthdate"]));
    let book = Book::from_xlsx_with_options(&path, &options)?;
    let sheet = book.get_sheet_by_index(0).unwrap();

    assert_eq!(sheet.headers().to_vec(), vec!["Name", "Birthdate"]);
    assert_eq!(
        sheet.column_types().to_vec(),
        vec![ColumnType::String, ColumnType::Date]
    );
    assert_eq!(sheet.rows()[0], "\"Alice\",\"1990-05-01\"");
    Ok(())
}

#[test]
fn test_full_header_filter_is_a_fixed_point() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("ragged.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "a")?;
    worksheet.write_string(0, 1, "b")?;
    worksheet.write_number(1, 0, 1)?;
    worksheet.write_number(1, 1, 2)?;
    worksheet.write_number(1, 2, 3)?;
    workbook.save(&path)?;

    let unfiltered = Book::from_xlsx(&path)?.into_sheets();
    assert_eq!(unfiltered[0].rows().to_vec(), vec!["\"1\",\"2\",\"3\""]);

    let headers = unfiltered[0].headers().to_vec();
    let filtered = Book::from_xlsx_with_options(
        &path,
        &ReadOptions::default().with_column_filter(ColumnFilter::new(headers)),
    )?
    .into_sheets();
    assert_eq!(filtered, unfiltered);
    Ok(())
}

#[test]
fn test_filter_matching_no_header_keeps_sheet() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let options = ReadOptions::default().with_column_filter(ColumnFilter::new(["zzz"]));
    let book = Book::from_xlsx_with_options(&path, &options)?;
    assert_eq!(book.sheet_names(), vec!["People"]);

    let sheet = book.get_sheet("People").unwrap();
    assert!(sheet.headers().is_empty());
    assert!(sheet.column_types().is_empty());
    Ok(())
}

#[test]
fn test_textual_date_format() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("dates.xlsx");

    let mut workbook = Workbook::new();
    let short_date = Format::new().set_num_format("d-mmm-yy");
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Joined")?;
    worksheet.write_number_with_format(1, 0, 32994, &short_date)?;
    workbook.save(&path)?;

    let book = Book::from_xlsx(&path)?;
    let sheet = book.get_sheet_by_index(0).unwrap();
    assert_eq!(sheet.rows()[0], "\"1-May-90\"");
    assert_eq!(sheet.column_types().to_vec(), vec![ColumnType::Date]);
    Ok(())
}

#[test]
fn test_reading_is_idempotent() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let first = Book::from_xlsx(&path)?.into_sheets();
    let second = Book::from_xlsx(&path)?.into_sheets();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_raw_numbers() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let options = ReadOptions::default().with_cell_formatting(false);
    let book = Book::from_xlsx_with_options(&path, &options)?;
    let sheet = book.get_sheet("People").unwrap();

    assert_eq!(sheet.rows()[0], "\"Alice\",\"30\",\"32994\"");
    assert_eq!(sheet.column_types()[2], ColumnType::Number);
    Ok(())
}

#[test]
fn test_row_limit() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let book = Book::from_xlsx_with_options(&path, &ReadOptions::default().with_max_rows(1))?;
    let sheet = book.get_sheet("People").unwrap();
    assert_eq!(sheet.row_count(), 1);
    assert_eq!(sheet.cell_values(0, false)?, vec!["Alice", "30", "1990-05-01"]);
    Ok(())
}

#[test]
fn test_from_reader() -> TestResult {
    let mut workbook = Workbook::new();
    write_people(&mut workbook)?;
    let bytes = workbook.save_to_buffer()?;

    let book = Book::from_xlsx_reader(Cursor::new(bytes), &ReadOptions::default())?;
    assert_eq!(book.get_sheet("People").unwrap().row_count(), 2);
    Ok(())
}

#[test]
fn test_header_only_and_blank_sheets() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("shapes.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("HeaderOnly")?;
    worksheet.write_string(0, 0, "a")?;
    worksheet.write_string(0, 1, "b")?;
    workbook.add_worksheet().set_name("Blank")?;
    workbook.save(&path)?;

    let book = Book::from_xlsx(&path)?;
    assert_eq!(book.sheet_names(), vec!["HeaderOnly"]);

    let sheet = book.get_sheet("HeaderOnly").unwrap();
    assert!(sheet.rows().is_empty());
    assert_eq!(sheet.column_types().to_vec(), vec![ColumnType::String; 2]);

    let blank_only = Book::from_xlsx_with_options(&path, &ReadOptions::default().with_sheet_index(1))?;
    assert!(blank_only.is_empty());
    Ok(())
}

#[test]
fn test_missing_sheet_index() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let result = Book::from_xlsx_with_options(&path, &ReadOptions::default().with_sheet_index(4));
    assert!(matches!(result, Err(SheetError::SheetNotFound { index: 4 })));
    Ok(())
}

#[test]
fn test_blank_rows_gaps_and_kinds() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("mixed.xlsx");

    let mut workbook = Workbook::new();
    let plain = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "Label")?;
    worksheet.write_string(0, 1, "Flag")?;
    worksheet.write_string(0, 2, "Amount")?;
    worksheet.write_blank(1, 0, &plain)?;
    worksheet.write_string(2, 0, "first")?;
    worksheet.write_boolean(2, 1, true)?;
    worksheet.write_number_with_format(2, 2, 1234.5, &money)?;
    worksheet.write_number(3, 2, 7)?;
    worksheet.write_boolean(4, 1, false)?;
    workbook.save(&path)?;

    let book = Book::from_xlsx(&path)?;
    let sheet = book.get_sheet_by_index(0).unwrap();

    assert_eq!(
        sheet.column_types().to_vec(),
        vec![ColumnType::String, ColumnType::Boolean, ColumnType::Number]
    );
    assert_eq!(
        sheet.rows().to_vec(),
        vec![
            "\"first\",\"TRUE\",\"1,234.50\"",
            ",,\"7\"",
            ",\"FALSE\",\"\""
        ]
    );
    assert_eq!(sheet.cell_values(0, false)?, vec!["first", "TRUE", "1,234.50"]);

    let keep = Book::from_xlsx_with_options(
        &path,
        &ReadOptions::default().with_ignore_blank_rows(false),
    )?;
    let sheet = keep.get_sheet_by_index(0).unwrap();
    assert_eq!(sheet.rows()[0], "\"\",\"\",\"\"");
    assert_eq!(sheet.row_count(), 4);
    Ok(())
}

#[test]
fn test_min_columns() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let book = Book::from_xlsx_with_options(&path, &ReadOptions::default().with_min_columns(5))?;
    let sheet = book.get_sheet("People").unwrap();
    assert_eq!(sheet.headers().to_vec(), vec!["Name", "Age", "Birthdate", "", ""]);
    assert_eq!(sheet.rows()[0], "\"Alice\",\"30\",\"1990-05-01\",,");
    Ok(())
}

#[test]
fn test_stream_to_sink() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let mut out = Vec::new();
    let sheets = Book::stream_xlsx_csv(&path, &ReadOptions::default(), &mut out)?;

    assert_eq!(sheets.len(), 1);
    assert!(sheets[0].rows().is_empty());
    assert_eq!(sheets[0].headers().len(), 3);
    assert_eq!(
        String::from_utf8(out)?,
        "\nPeople [index=0]:\n\
         \"Name\",\"Age\",\"Birthdate\"\n\
         \"Alice\",\"30\",\"1990-05-01\"\n\
         \"Bob\",\"25\",\"1999-12-31\"\n"
    );
    Ok(())
}

#[test]
fn test_tabular_path() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let book = Book::from_tabular(&path)?;
    let sheet = book.get_sheet("People").unwrap();

    assert_eq!(sheet.headers().to_vec(), vec!["Name", "Age", "Birthdate"]);
    assert_eq!(sheet.column_types().to_vec(), vec![ColumnType::String; 3]);
    assert_eq!(sheet.row_count(), 2);
    let bob = sheet.cell_values(1, false)?;
    assert_eq!(bob[0], "Bob");
    assert_eq!(bob[1], "25");

    let limited = Book::from_tabular_with_options(&path, &ReadOptions::default().with_max_rows(1))?;
    assert_eq!(limited.get_sheet("People").unwrap().row_count(), 1);
    Ok(())
}

#[test]
fn test_open_dispatches_on_extension() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let book = Book::open(&path, &ReadOptions::default())?;
    assert_eq!(book.sheet_count(), 1);
    Ok(())
}

#[test]
fn test_save_as_csv() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("people.xlsx");
    people_file(&path)?;

    let book = Book::from_xlsx(&path)?;
    let out = dir.path().join("people.csv");
    book.get_sheet("People").unwrap().save_as_csv(&out)?;

    assert_eq!(
        std::fs::read_to_string(&out)?,
        "Name,Age,Birthdate\nAlice,30,1990-05-01\nBob,25,1999-12-31\n"
    );
    Ok(())
}
