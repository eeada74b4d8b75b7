//! Streaming access to the parts of an XLSX package.
//!
//! Worksheets are never loaded as a whole: [`XmlCellEvents`] pulls
//! [`SheetEvent`]s straight from the zip entry. The shared string table and
//! the cell formats are read up front.

use crate::cell::{CellKind, NumberFormat};
use crate::driver::SheetStreamDriver;
use crate::error::{Result, SheetError};
use crate::options::ReadOptions;
use crate::sheet::Sheet;
use crate::source::{RawCell, SharedStrings, SheetEvent, StyleResolver};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const STYLES_PART: &str = "xl/styles.xml";

/// A worksheet declared by the workbook part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    /// Path of the worksheet part inside the archive
    pub path: String,
}

/// An opened XLSX archive with its workbook-level tables loaded
pub struct XlsxPackage<R> {
    archive: ZipArchive<R>,
    sheets: Vec<SheetEntry>,
    shared_strings: SharedStringTable,
    styles: StyleTable,
}

impl XlsxPackage<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> XlsxPackage<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let relationships =
            with_part(&mut archive, WORKBOOK_RELS_PART, parse_relationships)?.unwrap_or_default();
        let declared = with_part(&mut archive, WORKBOOK_PART, parse_workbook_sheets)?
            .ok_or_else(|| SheetError::MissingPart(WORKBOOK_PART.to_string()))?;

        let sheets = declared
            .into_iter()
            .filter_map(|(name, rel_id)| match relationships.get(&rel_id) {
                Some(target) => Some(SheetEntry {
                    name,
                    path: resolve_target(target),
                }),
                None => {
                    warn!("Sheet '{}' has no relationship '{}'", name, rel_id);
                    None
                }
            })
            .collect::<Vec<_>>();

        let shared_strings =
            with_part(&mut archive, SHARED_STRINGS_PART, SharedStringTable::from_reader)?
                .unwrap_or_default();
        let styles =
            with_part(&mut archive, STYLES_PART, StyleTable::from_reader)?.unwrap_or_default();

        debug!(
            "Opened workbook: {} sheets, {} shared strings, {} cell formats",
            sheets.len(),
            shared_strings.len(),
            styles.len()
        );

        Ok(XlsxPackage {
            archive,
            sheets,
            shared_strings,
            styles,
        })
    }

    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn shared_strings(&self) -> &SharedStringTable {
        &self.shared_strings
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Stream the worksheet at `index` through the row engine. With a sink,
    /// lines are written as they are assembled and the sheet holds no rows.
    pub fn read_sheet(
        &mut self,
        index: usize,
        options: &ReadOptions,
        sink: Option<&mut dyn Write>,
    ) -> Result<Sheet> {
        let entry = self
            .sheets
            .get(index)
            .ok_or(SheetError::SheetNotFound { index })?;

        let part = match self.archive.by_name(&entry.path) {
            Ok(part) => part,
            Err(ZipError::FileNotFound) => {
                return Err(SheetError::MissingPart(entry.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let events = XmlCellEvents::new(BufReader::new(part));

        let driver = SheetStreamDriver::new(options)
            .with_shared_strings(&self.shared_strings)
            .with_styles(&self.styles);
        match sink {
            Some(sink) => driver.drive_into_sink(&entry.name, index, events, sink),
            None => driver.drive(&entry.name, index, events),
        }
    }
}

fn with_part<R, T, F>(archive: &mut ZipArchive<R>, name: &str, parse: F) -> Result<Option<T>>
where
    R: Read + Seek,
    F: FnOnce(&mut dyn BufRead) -> Result<T>,
{
    let part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => {
            debug!("Workbook part {} not present", name);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let mut reader = BufReader::new(part);
    parse(&mut reader).map(Some)
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_relationships(reader: &mut dyn BufRead) -> Result<HashMap<String, String>> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut relationships = HashMap::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                {
                    relationships.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

/// Declared sheets in workbook order, as (name, relationship id).
fn parse_workbook_sheets(reader: &mut dyn BufRead) -> Result<Vec<(String, String)>> {
    let mut xml = Reader::from_reader(reader);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attribute(&e, b"name")?, attribute(&e, b"id")?) {
                    sheets.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// The workbook's shared string table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStringTable {
    strings: Vec<String>,
}

impl SharedStringTable {
    /// Parse `sharedStrings.xml`. Rich-text runs are concatenated and
    /// phonetic runs are dropped.
    pub fn from_reader(reader: &mut dyn BufRead) -> Result<Self> {
        let mut xml = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut strings = Vec::new();
        let mut current = String::new();
        let mut in_item = false;
        let mut in_text = false;
        let mut phonetic_depth = 0usize;

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"si" => {
                        current.clear();
                        in_item = true;
                    }
                    b"rPh" => phonetic_depth += 1,
                    b"t" if in_item && phonetic_depth == 0 => in_text = true,
                    _ => {}
                },
                Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
                Event::Text(t) if in_text => current.push_str(&t.unescape()?),
                Event::CData(t) if in_text => current.push_str(&String::from_utf8_lossy(&t)),
                Event::End(e) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(std::mem::take(&mut current));
                        in_item = false;
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(SharedStringTable { strings })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }
}

impl SharedStrings for SharedStringTable {
    fn shared_string(&self, index: usize) -> Option<&str> {
        self.get(index)
    }
}

/// Cell formats (`cellXfs`) and custom number formats from `styles.xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTable {
    cell_formats: Vec<u16>,
    custom_formats: HashMap<u16, String>,
}

impl StyleTable {
    pub fn from_reader(reader: &mut dyn BufRead) -> Result<Self> {
        let mut xml = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut table = StyleTable::default();
        let mut in_cell_xfs = false;

        loop {
            match xml.read_event_into(&mut buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"numFmt" => {
                        let id = attribute(&e, b"numFmtId")?.and_then(|id| id.parse().ok());
                        if let (Some(id), Some(code)) = (id, attribute(&e, b"formatCode")?) {
                            table.custom_formats.insert(id, code);
                        }
                    }
                    b"xf" if in_cell_xfs => {
                        let id = attribute(&e, b"numFmtId")?
                            .and_then(|id| id.parse().ok())
                            .unwrap_or(0);
                        table.cell_formats.push(id);
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
        Ok(table)
    }

    /// Number of cell formats
    pub fn len(&self) -> usize {
        self.cell_formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_formats.is_empty()
    }

    /// Format code for a number format id: custom codes first, then built-ins.
    pub fn format_code(&self, id: u16) -> Option<String> {
        self.custom_formats
            .get(&id)
            .cloned()
            .or_else(|| xlrows_formatting::builtin_format(id).map(String::from))
    }
}

impl StyleResolver for StyleTable {
    fn number_format(&self, style_index: u32) -> Option<NumberFormat> {
        let id = *self.cell_formats.get(style_index as usize)?;
        Some(NumberFormat::new(id, self.format_code(id)))
    }
}

#[derive(Debug)]
struct PendingCell {
    raw: RawCell,
    has_value: bool,
}

impl PendingCell {
    fn from_element(element: &BytesStart<'_>) -> Result<Self> {
        let mut raw = RawCell::default();
        for attr in element.attributes() {
            let attr = attr?;
            match attr.key.local_name().as_ref() {
                b"r" => raw.reference = Some(attr.unescape_value()?.into_owned()),
                b"t" => {
                    let value = attr.unescape_value()?;
                    raw.kind = CellKind::from_type_attr(Some(&*value));
                }
                b"s" => raw.style = attr.unescape_value()?.parse().ok(),
                _ => {}
            }
        }
        Ok(PendingCell {
            raw,
            has_value: false,
        })
    }
}

#[derive(Debug, Default)]
struct ScanState {
    cell: Option<PendingCell>,
    capturing: bool,
    in_inline: bool,
    phonetic_depth: usize,
    queued: Option<SheetEvent>,
    finished: bool,
}

impl ScanState {
    fn mark_value(&mut self) {
        if let Some(cell) = self.cell.as_mut() {
            cell.has_value = true;
        }
    }

    fn handle(&mut self, event: Event<'_>) -> Result<Option<SheetEvent>> {
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => return Ok(Some(SheetEvent::RowStart)),
                b"c" => self.cell = Some(PendingCell::from_element(&e)?),
                b"v" if self.cell.is_some() => self.capturing = true,
                b"is" if self.cell.is_some() => self.in_inline = true,
                b"rPh" if self.in_inline => self.phonetic_depth += 1,
                b"t" if self.in_inline && self.phonetic_depth == 0 => self.capturing = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    self.queued = Some(SheetEvent::RowEnd);
                    return Ok(Some(SheetEvent::RowStart));
                }
                b"v" => self.mark_value(),
                b"t" if self.in_inline && self.phonetic_depth == 0 => self.mark_value(),
                _ => {}
            },
            Event::Text(t) if self.capturing => {
                let text = t.unescape()?;
                if let Some(cell) = self.cell.as_mut() {
                    cell.raw.text.push_str(&text);
                    cell.has_value = true;
                }
            }
            Event::CData(t) if self.capturing => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.raw.text.push_str(&String::from_utf8_lossy(&t));
                    cell.has_value = true;
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => {
                    self.capturing = false;
                    self.mark_value();
                }
                b"t" if self.in_inline && self.phonetic_depth == 0 => {
                    self.capturing = false;
                    self.mark_value();
                }
                b"rPh" => self.phonetic_depth = self.phonetic_depth.saturating_sub(1),
                b"is" => self.in_inline = false,
                b"c" => {
                    self.capturing = false;
                    self.in_inline = false;
                    if let Some(cell) = self.cell.take().filter(|c| c.has_value) {
                        return Ok(Some(SheetEvent::Cell(cell.raw)));
                    }
                }
                b"row" => return Ok(Some(SheetEvent::RowEnd)),
                _ => {}
            },
            Event::Eof => self.finished = true,
            _ => {}
        }
        Ok(None)
    }
}

/// Pull-based cell event stream over a worksheet part.
///
/// Cells without a value produce no event. A self-closing `<row/>` yields
/// a `RowStart` immediately followed by a `RowEnd`.
pub struct XmlCellEvents<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    state: ScanState,
}

impl<R: BufRead> XmlCellEvents<R> {
    pub fn new(reader: R) -> Self {
        XmlCellEvents {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            state: ScanState::default(),
        }
    }
}

impl<R: BufRead> Iterator for XmlCellEvents<R> {
    type Item = Result<SheetEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.state.queued.take() {
            return Some(Ok(event));
        }

        while !self.state.finished {
            self.buf.clear();
            let step = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => self.state.handle(event),
                Err(e) => Err(e.into()),
            };
            match step {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(e) => {
                    self.state.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(xml: &str) -> Vec<SheetEvent> {
        XmlCellEvents::new(xml.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_cell_events() {
        let xml = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
            <sheetData>
                <row r="1">
                    <c r="A1" t="s"><v>0</v></c>
                    <c r="B1" s="2"><v>30</v></c>
                    <c r="C1" t="inlineStr"><is><t>Tom &amp; Jerry</t></is></c>
                </row>
            </sheetData>
        </worksheet>"#;

        assert_eq!(
            events(xml),
            vec![
                SheetEvent::RowStart,
                SheetEvent::Cell(RawCell::new("A1", CellKind::SharedStringIndex, "0")),
                SheetEvent::Cell(RawCell::new("B1", CellKind::Number, "30").with_style(2)),
                SheetEvent::Cell(RawCell::new("C1", CellKind::InlineString, "Tom & Jerry")),
                SheetEvent::RowEnd,
            ]
        );
    }

    #[test]
    fn test_cells_without_value_are_dropped() {
        let xml = r#"<sheetData><row r="1"><c r="A1" s="1"/><c r="B1" t="b"><v>1</v></c></row></sheetData>"#;
        assert_eq!(
            events(xml),
            vec![
                SheetEvent::RowStart,
                SheetEvent::Cell(RawCell::new("B1", CellKind::Bool, "1")),
                SheetEvent::RowEnd,
            ]
        );
    }

    #[test]
    fn test_empty_row_element() {
        let xml = r#"<sheetData><row r="1"/><row r="2"><c r="A2"><v>5</v></c></row></sheetData>"#;
        assert_eq!(
            events(xml),
            vec![
                SheetEvent::RowStart,
                SheetEvent::RowEnd,
                SheetEvent::RowStart,
                SheetEvent::Cell(RawCell::new("A2", CellKind::Number, "5")),
                SheetEvent::RowEnd,
            ]
        );
    }

    #[test]
    fn test_formula_text_is_ignored() {
        let xml = r#"<row><c r="A1" t="str"><f>CONCAT("a","b")</f><v>ab</v></c></row>"#;
        assert_eq!(
            events(xml),
            vec![
                SheetEvent::RowStart,
                SheetEvent::Cell(RawCell::new("A1", CellKind::Formula, "ab")),
                SheetEvent::RowEnd,
            ]
        );
    }

    #[test]
    fn test_prefixed_elements() {
        let xml = r#"<x:sheetData xmlns:x="urn:x"><x:row><x:c r="A1"><x:v>1</x:v></x:c></x:row></x:sheetData>"#;
        assert_eq!(events(xml).len(), 3);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let xml = r#"<row><c r="A1"><v>1</v></x></row>"#;
        let result: Result<Vec<_>> = XmlCellEvents::new(xml.as_bytes()).collect();
        assert!(result.is_err());
    }

    #[test]
    fn test_shared_string_table() {
        let xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4">
            <si><t>Name</t></si>
            <si><r><t>Bold</t></r><r><t xml:space="preserve"> text</t></r></si>
            <si><t>漢字</t><rPh sb="0" eb="2"><t>かんじ</t></rPh></si>
            <si/>
        </sst>"#;
        let table = SharedStringTable::from_reader(&mut xml.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0), Some("Name"));
        assert_eq!(table.get(1), Some("Bold text"));
        assert_eq!(table.get(2), Some("漢字"));
        assert_eq!(table.get(3), Some(""));
        assert_eq!(table.get(4), None);
    }

    #[test]
    fn test_style_table() {
        let xml = r#"<styleSheet>
            <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts>
            <cellStyleXfs count="1"><xf numFmtId="49"/></cellStyleXfs>
            <cellXfs count="3">
                <xf numFmtId="0" fontId="0"/>
                <xf numFmtId="164" applyNumberFormat="1"/>
                <xf numFmtId="14"><alignment/></xf>
            </cellXfs>
        </styleSheet>"#;
        let styles = StyleTable::from_reader(&mut xml.as_bytes()).unwrap();
        assert_eq!(styles.len(), 3);
        assert_eq!(
            styles.number_format(1),
            Some(NumberFormat::custom(164, "yyyy-mm-dd"))
        );
        assert_eq!(
            styles.number_format(2),
            Some(NumberFormat::custom(14, "m/d/yy"))
        );
        assert_eq!(styles.number_format(9), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(
            resolve_target("/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
    }

    #[test]
    fn test_workbook_parts() {
        let workbook = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="People" sheetId="1" r:id="rId1"/>
                <sheet name="Empty" sheetId="2" r:id="rId2"/>
            </sheets>
        </workbook>"#;
        let sheets = parse_workbook_sheets(&mut workbook.as_bytes()).unwrap();
        assert_eq!(
            sheets,
            vec![
                ("People".to_string(), "rId1".to_string()),
                ("Empty".to_string(), "rId2".to_string())
            ]
        );

        let rels = r#"<Relationships>
            <Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet1.xml"/>
        </Relationships>"#;
        let relationships = parse_relationships(&mut rels.as_bytes()).unwrap();
        assert_eq!(
            relationships.get("rId1").map(String::as_str),
            Some("worksheets/sheet1.xml")
        );
    }
}
