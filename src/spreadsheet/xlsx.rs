use crate::error::SheetPagerError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::cell::DateSystem;
use crate::spreadsheet::cell::NumberFormat;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::SheetSource;
use crate::spreadsheet::SpreadsheetError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::BufReader;
use tracing::debug;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_SHEET_DATA: QName = QName(b"sheetData");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_FORMULA: QName = QName(b"f");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

type SheetXmlReader<'a> = XmlReader<BufReader<ZipFile<'a, UnifiedReader>>>;

/// An opened `.xlsx` / `.xlsm` / `.xlam` workbook
pub(crate) struct XlsxWorkbook {
    /// Locator the workbook was opened from
    pub(crate) name: String,
    zip: ZipArchive<UnifiedReader>,
    /// Number format of every cell style, indexed by style id
    number_formats: Vec<NumberFormat>,
    /// Loaded on the first sheet access
    shared_strings: Option<Vec<String>>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook {
    /// Opens a workbook from a local path or a remote URL
    pub(crate) fn open(locator: &str) -> Result<XlsxWorkbook, SheetPagerError> {
        let reader = UnifiedReader::new(locator)?;
        Self::from_reader(locator, reader)
    }

    /// Opens a workbook held in memory
    pub(crate) fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<XlsxWorkbook, SheetPagerError> {
        Self::from_reader(name, UnifiedReader::from_bytes(bytes))
    }

    fn from_reader(name: &str, mut reader: UnifiedReader) -> Result<XlsxWorkbook, SheetPagerError> {
        // Legacy binary workbooks and encrypted packages share the compound file container
        if reader.is_compound_file()? {
            Err(SpreadsheetError::CompoundFileError(name.to_owned()))?;
        }

        let mut zip = ZipArchive::new(reader)?;
        let (sheets, system) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(name.to_owned()))?;
        }
        let number_formats = load_number_formats(&mut zip, system)?;
        Ok(XlsxWorkbook {
            name: name.to_owned(),
            zip,
            number_formats,
            shared_strings: None,
            sheets,
        })
    }

    /// Names of all worksheets in workbook order
    pub(crate) fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Opens a worksheet by exact name, or the first one when no name is given
    pub(crate) fn open_sheet(&mut self, sheet_name: Option<&str>) -> Result<XlsxSheet<'_>, SheetPagerError> {
        let (name, path) = match sheet_name {
            Some(sheet_name) => self.sheets.iter().find(|(name, _)| name == sheet_name),
            None => self.sheets.first(),
        }
        .cloned()
        .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet_name.unwrap_or_default().to_owned()))?;

        if self.shared_strings.is_none() {
            self.shared_strings = Some(load_shared_strings(&mut self.zip)?);
        }

        let XlsxWorkbook { zip, number_formats, shared_strings, .. } = self;
        let bounds = {
            let reader = zip.xml_reader(&path)?
                .ok_or_else(|| SpreadsheetError::FileError(path.to_owned()))?;
            scan_row_bounds(reader)?
        };
        let reader = zip.xml_reader(&path)?
            .ok_or_else(|| SpreadsheetError::FileError(path.to_owned()))?;
        XlsxSheet::new(name, reader, bounds, shared_strings.as_deref().unwrap_or_default(), number_formats)
    }
}

/// A worksheet decoded row by row while it is read.
///
/// Only rows at or after the discard watermark are kept, so memory is bounded
/// by the distance between the watermark and the furthest requested row.
pub(crate) struct XlsxSheet<'a> {
    name: String,
    reader: SheetXmlReader<'a>,
    shared_strings: &'a [String],
    number_formats: &'a [NumberFormat],
    first_row: Option<usize>,
    last_row: Option<usize>,
    rows: BTreeMap<usize, Row>,
    watermark: usize,
    /// Index of the most recently decoded row
    last_decoded: Option<usize>,
    finished: bool,
}

/// Cell under construction between `<c>` and `</c>`
#[derive(Default)]
struct PendingCell {
    row: usize,
    col: usize,
    kind: Option<String>,
    style: Option<usize>,
    has_formula: bool,
    value: String,
}

impl<'a> XlsxSheet<'a> {
    fn new(
        name: String,
        mut reader: SheetXmlReader<'a>,
        bounds: Option<(usize, usize)>,
        shared_strings: &'a [String],
        number_formats: &'a [NumberFormat],
    ) -> Result<XlsxSheet<'a>, SheetPagerError> {
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHEET_DATA => break,
        });

        Ok(XlsxSheet {
            name,
            reader,
            shared_strings,
            number_formats,
            first_row: bounds.map(|(first, _)| first),
            last_row: bounds.map(|(_, last)| last),
            rows: BTreeMap::new(),
            watermark: 0,
            last_decoded: None,
            finished: false,
        })
    }

    /// Decodes the next `<row>` element. Returns false at the end of the sheet.
    fn advance(&mut self) -> Result<bool, SheetPagerError> {
        if self.finished {
            return Ok(false);
        }

        let mut row: Option<Row> = None;
        let mut cell: Option<PendingCell> = None;
        let mut completed = false;
        let mut col_count = 0usize;
        match_xml_events!(self.reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                let index = row_index(&event, self.last_decoded)?;
                row = Some(Row::new(index));
            }
            Event::End(event) if event.name() == TAG_ROW => {
                completed = true;
                break;
            }
            Event::End(event) if event.name() == TAG_SHEET_DATA => break,
            Event::Start(event) if event.name() == TAG_CELL => {
                let row_index = row.as_ref().map(|row| row.index).unwrap_or(0);
                let (row_index, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row_index, col_count));
                col_count = col + 1;
                let style = match event.get_attribute_value("s")? {
                    Some(style) if !style.is_empty() => Some(style.parse::<usize>()?),
                    _ => None,
                };
                cell = Some(PendingCell {
                    row: row_index,
                    col,
                    kind: event.get_attribute_value("t")?.map(|kind| kind.to_string()),
                    style,
                    ..PendingCell::default()
                });
            }
            Event::Start(event) if event.name() == TAG_FORMULA => {
                if let Some(cell) = cell.as_mut() {
                    cell.has_formula = true;
                }
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                let value = read_string_value(&mut self.reader, TAG_VALUE, true)?;
                if let Some(cell) = cell.as_mut() {
                    cell.value = value;
                }
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                let value = read_string_value(&mut self.reader, TAG_INLINE_STRING, false)?;
                if let Some(cell) = cell.as_mut() {
                    cell.value = value;
                }
            }
            Event::End(event) if event.name() == TAG_CELL => {
                if let Some(pending) = cell.take() {
                    let value = self.resolve(&pending)?;
                    if let Some(row) = row.as_mut() {
                        row.put(Cell::new(row.index, pending.col, value));
                    }
                }
            }
        });

        match row {
            Some(row) if completed => {
                self.last_decoded = Some(row.index);
                if row.index >= self.watermark {
                    self.rows.insert(row.index, row);
                }
                Ok(true)
            }
            _ => {
                self.finished = true;
                Ok(false)
            }
        }
    }

    /// Turns the raw attributes and text of a cell into its value
    fn resolve(&self, cell: &PendingCell) -> Result<CellValue, SheetPagerError> {
        let value = cell.value.as_str();
        let invalid = || SpreadsheetError::CellValueError(
            self.name.to_owned(),
            index_to_reference(cell.row, cell.col),
            value.to_owned(),
        );

        if cell.has_formula {
            let cached = match cell.kind.as_deref() {
                None | Some("n") => value.parse::<f64>().ok(),
                _ => None,
            };
            return Ok(CellValue::Formula { cached });
        }

        let resolved = match cell.kind.as_deref() {
            _ if value.is_empty() && cell.kind.as_deref() != Some("str") => CellValue::Blank,
            Some("s") => {
                let index = value.parse::<usize>().map_err(|_| invalid())?;
                let text = self.shared_strings.get(index).ok_or_else(invalid)?;
                CellValue::Text(text.to_owned())
            }
            Some("inlineStr") | Some("str") => CellValue::Text(value.to_owned()),
            Some("b") => CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true")),
            Some("e") => CellValue::Error(value.to_owned()),
            Some("d") => CellValue::DateTime(parse_iso_datetime(value).ok_or_else(invalid)?),
            None | Some("n") => {
                let number = value.trim().parse::<f64>().map_err(|_| invalid())?;
                let format = cell.style
                    .and_then(|style| self.number_formats.get(style))
                    .copied()
                    .unwrap_or_default();
                CellValue::Number { value: number, format }
            }
            Some(_) => CellValue::Blank,
        };
        Ok(resolved)
    }
}

impl SheetSource for XlsxSheet<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_row_index(&self) -> Option<usize> {
        self.first_row
    }

    fn last_row_index(&self) -> Option<usize> {
        self.last_row
    }

    fn row(&mut self, index: usize) -> Result<Option<Row>, SheetPagerError> {
        while self.last_decoded.map(|last| last < index).unwrap_or(true) {
            if !self.advance()? {
                break;
            }
        }
        Ok(self.rows.get(&index).cloned())
    }

    fn discard_before(&mut self, index: usize) {
        if index > self.watermark {
            self.watermark = index;
            self.rows = self.rows.split_off(&index);
        }
    }
}

/// Zero-based index of a `<row>` element. A missing or invalid `r`
/// attribute means the row right after the previous one.
fn row_index(event: &BytesStart, previous: Option<usize>) -> Result<usize, SheetPagerError> {
    let index = event.get_attribute_value("r")?
        .and_then(|number| number.parse::<usize>().ok())
        .filter(|number| *number > 0)
        .map(|number| number - 1)
        .unwrap_or_else(|| previous.map(|last| last + 1).unwrap_or(0));
    Ok(index)
}

/// Finds the first and last row index of a worksheet from its `<row>` tags.
///
/// `<dimension>` is not trusted. Cells are skipped without being decoded.
fn scan_row_bounds(mut reader: SheetXmlReader<'_>) -> Result<Option<(usize, usize)>, SheetPagerError> {
    let mut bounds = None::<(usize, usize)>;
    let mut previous = None::<usize>;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            let index = row_index(&event, previous)?;
            previous = Some(index);
            bounds = Some(match bounds {
                Some((first, last)) => (first.min(index), last.max(index)),
                None => (index, index),
            });
        }
        Event::End(event) if event.name() == TAG_SHEET_DATA => break,
    });
    debug!("row bounds {:?}", bounds);
    Ok(bounds)
}

/// Parses the ISO 8601 value of a `t="d"` cell
fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))
}

/// Loads worksheet names with their archive paths, and the date system in use
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<(Vec<(String, String)>, DateSystem), SheetPagerError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut system = DateSystem::Epoch1900;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<String>;
            let mut id = None::<String>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?.to_string());
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?.to_string());
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id) {
                    sheets.push((name, path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            let is_1904 = event.get_attribute_value("date1904")?
                .map(|value| matches!(value.as_ref(), "1" | "true"))
                .unwrap_or(false);
            if is_1904 {
                system = DateSystem::Epoch1904;
            }
        }
    });
    Ok((sheets, system))
}

/// Loads the number format applied by every cell style from `styles.xml`
fn load_number_formats(zip: &mut ZipArchive<UnifiedReader>, system: DateSystem) -> Result<Vec<NumberFormat>, SheetPagerError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, NumberFormat>::new();

    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), NumberFormat::parse_custom(&format, system));
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_else(|| "0".to_string()));
        }
    });

    Ok(excel::resolve_number_formats(format_indexes, custom_formats, system))
}

/// Loads the whole shared string table, an absent table is empty
fn load_shared_strings(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<String>, SheetPagerError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Reads string content up to `end_tag`, skipping phonetic annotations.
/// With `is_text_content` the element holds text directly, otherwise only
/// `<t>` children count.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SheetPagerError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::spreadsheet::cell::serial_to_datetime;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;

    const STYLES: &str = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/></numFmts>
<cellXfs count="3"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="164"/></cellXfs>
</styleSheet>"#;

    /// Builds an in-memory workbook. Each sheet is `(name, sheet xml body)`,
    /// where the body is the content placed inside `<worksheet>`. Shared
    /// strings are the raw content of each `<si>` item.
    pub(crate) fn workbook_bytes(sheets: &[(&str, &str)], shared_strings: &[&str], date1904: bool) -> Vec<u8> {
        let options = SimpleFileOptions::default();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();

        let mut workbook = String::from(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
        workbook.push_str(&format!(r#"<workbookPr date1904="{}"/><sheets>"#, if date1904 { "1" } else { "0" }));
        let mut relationships = String::from(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        for (index, (name, _)) in sheets.iter().enumerate() {
            workbook.push_str(&format!(r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#, name, index + 1, index + 1));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                index + 1,
                index + 1
            ));
        }
        workbook.push_str("</sheets></workbook>");
        relationships.push_str("</Relationships>");

        writer.start_file("xl/workbook.xml", options).unwrap();
        writer.write_all(workbook.as_bytes()).unwrap();
        writer.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        writer.write_all(relationships.as_bytes()).unwrap();
        writer.start_file("xl/styles.xml", options).unwrap();
        writer.write_all(STYLES.as_bytes()).unwrap();

        if !shared_strings.is_empty() {
            let mut table = String::from(r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
            for string in shared_strings {
                table.push_str(&format!("<si>{string}</si>"));
            }
            table.push_str("</sst>");
            writer.start_file("xl/sharedStrings.xml", options).unwrap();
            writer.write_all(table.as_bytes()).unwrap();
        }

        for (index, (_, body)) in sheets.iter().enumerate() {
            writer.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options).unwrap();
            writer.write_all(br#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
            writer.write_all(b"</worksheet>").unwrap();
        }

        writer.finish().unwrap().into_inner()
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_owned())
    }

    const MIXED_SHEET: &str = r#"<dimension ref="A1:F3"/><sheetData>
<row r="1"><c r="B1" t="s"><v>0</v></c><c r="C1" t="inlineStr"><is><t>Inline</t></is></c><c r="D1" t="b"><v>1</v></c></row>
<row r="3"><c r="A3" s="1"><v>45292</v></c><c r="B3" s="2"><v>45292.5</v></c><c r="C3"><v>3.14</v></c><c r="D3"><f>C3*2</f><v>6.28</v></c><c r="E3" t="e"><v>#DIV/0!</v></c><c r="F3" t="str"><f>"x"</f><v>x</v></c></row>
</sheetData>"#;

    #[test]
    fn opens_sheets_by_name_and_position() {
        let bytes = workbook_bytes(&[("First", "<sheetData/>"), ("Second", "<sheetData/>")], &[], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["First".to_string(), "Second".to_string()]);
        assert_eq!(workbook.open_sheet(None).unwrap().name(), "First");
        assert_eq!(workbook.open_sheet(Some("Second")).unwrap().name(), "Second");
        assert!(matches!(
            workbook.open_sheet(Some("Third")),
            Err(SheetPagerError::SpreadsheetError(SpreadsheetError::SheetNotFound(name))) if name == "Third"
        ));
    }

    #[test]
    fn rejects_non_workbooks() {
        assert!(matches!(
            XlsxWorkbook::from_bytes("notes.txt", b"just text".to_vec()),
            Err(SheetPagerError::ZipError(_))
        ));
        let mut compound = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
        compound.extend_from_slice(&[0u8; 504]);
        assert!(matches!(
            XlsxWorkbook::from_bytes("legacy.xls", compound),
            Err(SheetPagerError::SpreadsheetError(SpreadsheetError::CompoundFileError(_)))
        ));
    }

    #[test]
    fn decodes_cell_kinds() {
        let bytes = workbook_bytes(&[("Data", MIXED_SHEET)], &["<t>Shared</t>"], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        assert_eq!(sheet.first_row_index(), Some(0));
        assert_eq!(sheet.last_row_index(), Some(2));

        let header = sheet.row(0).unwrap().unwrap();
        let values: Vec<CellValue> = header.cells.into_iter().map(|cell| cell.value).collect();
        assert_eq!(values, vec![CellValue::Blank, text("Shared"), text("Inline"), CellValue::Boolean(true)]);

        assert_eq!(sheet.row(1).unwrap(), None);

        let data = sheet.row(2).unwrap().unwrap();
        let values: Vec<CellValue> = data.cells.into_iter().map(|cell| cell.value).collect();
        let date = NumberFormat::Date(DateSystem::Epoch1900);
        assert_eq!(values, vec![
            CellValue::Number { value: 45292.0, format: date },
            CellValue::Number { value: 45292.5, format: date },
            CellValue::Number { value: 3.14, format: NumberFormat::Plain },
            CellValue::Formula { cached: Some(6.28) },
            CellValue::Error("#DIV/0!".to_owned()),
            CellValue::Formula { cached: None },
        ]);
        assert_eq!(sheet.row(3).unwrap(), None);
    }

    #[test]
    fn honours_1904_date_system() {
        let body = r#"<dimension ref="A1"/><sheetData><row r="1"><c r="A1" s="1"><v>43830</v></c></row></sheetData>"#;
        let bytes = workbook_bytes(&[("Data", body)], &[], true);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        let cell = sheet.row(0).unwrap().unwrap().cells.remove(0);
        let system = DateSystem::Epoch1904;
        assert_eq!(cell.value, CellValue::Number { value: 43830.0, format: NumberFormat::Date(system) });
        assert_eq!(serial_to_datetime(43830.0, system).unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn bounds_without_dimension() {
        let body = r#"<sheetData><row r="4"><c r="A4" t="inlineStr"><is><t>a</t></is></c></row><row r="9"><c r="A9"><v>1</v></c></row></sheetData>"#;
        let bytes = workbook_bytes(&[("Data", body)], &[], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        assert_eq!(sheet.first_row_index(), Some(3));
        assert_eq!(sheet.last_row_index(), Some(8));
        assert!(sheet.row(3).unwrap().is_some());
        assert!(sheet.row(8).unwrap().is_some());
    }

    #[test]
    fn bounds_ignore_stale_dimension() {
        let body = r#"<dimension ref="A1"/><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row><c><v>2</v></c></row><row r="6"><c r="A6"><v>6</v></c></row></sheetData>"#;
        let bytes = workbook_bytes(&[("Data", body)], &[], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        assert_eq!(sheet.first_row_index(), Some(0));
        assert_eq!(sheet.last_row_index(), Some(5));
        assert_eq!(sheet.row(1).unwrap().unwrap().cells[0].value, CellValue::Number { value: 2.0, format: NumberFormat::Plain });
        assert!(sheet.row(5).unwrap().is_some());
    }

    #[test]
    fn bounds_scan_skips_bad_cells() {
        let body = r#"<sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2"><v>abc</v></c></row></sheetData>"#;
        let bytes = workbook_bytes(&[("Data", body)], &[], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        assert_eq!(sheet.last_row_index(), Some(1));
        assert!(sheet.row(0).unwrap().is_some());
        assert!(sheet.row(1).is_err());
    }

    #[test]
    fn discarded_rows_are_not_kept() {
        let body = r#"<dimension ref="A1:A3"/><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2"><v>2</v></c></row><row r="3"><c r="A3"><v>3</v></c></row></sheetData>"#;
        let bytes = workbook_bytes(&[("Data", body)], &[], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        sheet.discard_before(1);
        assert!(sheet.row(2).unwrap().is_some());
        assert!(sheet.row(0).unwrap().is_none());
        assert!(sheet.row(1).unwrap().is_some());
        sheet.discard_before(2);
        assert!(sheet.row(1).unwrap().is_none());
    }

    #[test]
    fn bad_number_is_a_cell_error() {
        let body = r#"<dimension ref="A1:A2"/><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2"><v>abc</v></c></row></sheetData>"#;
        let bytes = workbook_bytes(&[("Data", body)], &[], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        assert!(sheet.row(0).unwrap().is_some());
        let error = sheet.row(1).unwrap_err().to_string();
        assert_eq!(error, "Invalid cell value 'abc' at 'Data'!A2");
    }

    #[test]
    fn shared_strings_skip_phonetic_runs() {
        let rich = r#"<r><t>Hello</t></r><r><t xml:space="preserve"> world</t></r><rPh><t>hidden</t></rPh>"#;
        let body = r#"<dimension ref="A1"/><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData>"#;
        let bytes = workbook_bytes(&[("Data", body)], &[rich], false);
        let mut workbook = XlsxWorkbook::from_bytes("book.xlsx", bytes).unwrap();
        let mut sheet = workbook.open_sheet(None).unwrap();
        let cell = sheet.row(0).unwrap().unwrap().cells.remove(0);
        assert_eq!(cell.value, text("Hello world"));
    }

    #[test]
    fn iso_dates() {
        assert_eq!(
            parse_iso_datetime("2024-01-01T10:30:00Z"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 30, 0)
        );
        assert_eq!(
            parse_iso_datetime("2024-01-01"),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_iso_datetime("soon"), None);
    }
}
