//! Minimal `.xlsx` reader: the first worksheet of an OOXML workbook.
//!
//! Only cell values are read. Styles, formulas and merged ranges are
//! ignored; formula cells contribute their cached result.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::ReadError;
use crate::reader::{CellValue, SheetParser, Table};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Last 0-based column of a worksheet (`XFD`).
const MAX_COLUMN: usize = 16_383;
/// Last 1-based row of a worksheet.
const MAX_ROW: u32 = 1_048_576;

pub struct XlsxParser;

impl XlsxParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XlsxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetParser for XlsxParser {
    fn parse(&self, path: &Path) -> Result<Table, ReadError> {
        let file = File::open(path).map_err(|e| ReadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive = ZipArchive::new(file).map_err(|e| ReadError::Zip {
            path: path.to_path_buf(),
            source: e,
        })?;

        let shared_strings = match read_part(&mut archive, path, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let sheet_part = first_sheet_part(&mut archive, path)?;
        let sheet_xml = read_part(&mut archive, path, &sheet_part)?
            .ok_or_else(|| ReadError::MissingSheet(path.to_path_buf()))?;

        let rows = parse_sheet_xml(&sheet_xml, &sheet_part, &shared_strings)?;
        Ok(build_table(rows))
    }
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
    name: &str,
) -> Result<Option<String>, ReadError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(ReadError::Zip {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| ReadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(Some(content))
}

/// Resolves the archive path of the first sheet listed in the workbook,
/// falling back to the conventional `sheet1.xml` location.
fn first_sheet_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
) -> Result<String, ReadError> {
    let Some(workbook) = read_part(archive, path, WORKBOOK_PART)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };
    let Some(rel_id) = first_sheet_rel_id(&workbook)? else {
        return Err(ReadError::MissingSheet(path.to_path_buf()));
    };
    let Some(rels) = read_part(archive, path, WORKBOOK_RELS_PART)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };

    Ok(relationship_target(&rels, &rel_id)?
        .map(|target| resolve_target(&target))
        .unwrap_or_else(|| DEFAULT_SHEET_PART.to_string()))
}

fn first_sheet_rel_id(workbook_xml: &str) -> Result<Option<String>, ReadError> {
    let mut reader = Reader::from_str(workbook_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    return Ok(attribute(e, b"id"));
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error(WORKBOOK_PART, e)),
            _ => {}
        }
    }
}

fn relationship_target(rels_xml: &str, rel_id: &str) -> Result<Option<String>, ReadError> {
    let mut reader = Reader::from_str(rels_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"Relationship"
                    && attribute(e, b"Id").as_deref() == Some(rel_id)
                {
                    return Ok(attribute(e, b"Target"));
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error(WORKBOOK_RELS_PART, e)),
            _ => {}
        }
    }
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, ReadError> {
    let mut reader = Reader::from_str(xml);

    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_text = !in_phonetic,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"si" {
                    strings.push(String::new());
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    if let Some(s) = current.as_mut() {
                        s.push_str(&e.decode().unwrap_or_default());
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    if let Some(s) = current.as_mut() {
                        s.push_str(&resolve_reference(&e));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(SHARED_STRINGS_PART, e)),
            _ => {}
        }
    }

    Ok(strings)
}

/// A sheet row as read from XML: its 1-based index and `(column, value)` pairs.
#[derive(Debug)]
struct SheetRow {
    index: u32,
    cells: Vec<(usize, CellValue)>,
}

#[derive(Debug)]
struct PendingCell {
    column: usize,
    kind: Option<String>,
    raw: String,
}

impl PendingCell {
    fn from_start(e: &BytesStart<'_>, next_column: usize, part: &str) -> Result<Self, ReadError> {
        let column = match attribute(e, b"r") {
            Some(reference) => column_index(&reference)
                .map_err(|reason| ReadError::Xml {
                    part: part.to_string(),
                    reason,
                })?
                .unwrap_or(next_column),
            None => next_column,
        };
        if column > MAX_COLUMN {
            return Err(ReadError::Xml {
                part: part.to_string(),
                reason: format!("cell column {} is past the last column", column + 1),
            });
        }
        Ok(Self {
            column,
            kind: attribute(e, b"t"),
            raw: String::new(),
        })
    }

    fn resolve(self, part: &str, shared_strings: &[String]) -> Result<CellValue, ReadError> {
        let raw = self.raw;
        let value = match self.kind.as_deref() {
            Some("s") => {
                let index: usize = raw.trim().parse().map_err(|_| ReadError::Xml {
                    part: part.to_string(),
                    reason: format!("invalid shared string index '{}'", raw),
                })?;
                let text = shared_strings.get(index).ok_or_else(|| ReadError::Xml {
                    part: part.to_string(),
                    reason: format!("shared string index {} out of range", index),
                })?;
                text_value(text.clone())
            }
            Some("inlineStr") | Some("str") | Some("d") => text_value(raw),
            Some("b") => CellValue::Bool(raw.trim() == "1"),
            Some("e") => CellValue::Empty,
            _ => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    CellValue::Empty
                } else {
                    trimmed
                        .parse::<f64>()
                        .map(CellValue::Number)
                        .unwrap_or_else(|_| CellValue::Text(raw.clone()))
                }
            }
        };
        Ok(value)
    }
}

fn text_value(s: String) -> CellValue {
    if s.is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(s)
    }
}

fn parse_sheet_xml(
    xml: &str,
    part: &str,
    shared_strings: &[String],
) -> Result<Vec<SheetRow>, ReadError> {
    let mut reader = Reader::from_str(xml);

    let mut rows = Vec::new();
    let mut row: Option<SheetRow> = None;
    let mut cell: Option<PendingCell> = None;
    let mut next_row = 1u32;
    let mut next_column = 0usize;
    let mut capture = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    let index = row_index(e, next_row, part)?;
                    next_row = index + 1;
                    next_column = 0;
                    row = Some(SheetRow {
                        index,
                        cells: Vec::new(),
                    });
                }
                b"c" => cell = Some(PendingCell::from_start(e, next_column, part)?),
                b"v" | b"t" => capture = cell.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    next_row = row_index(e, next_row, part)? + 1;
                }
                b"c" => {
                    next_column = PendingCell::from_start(e, next_column, part)?.column + 1;
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if capture {
                    if let Some(c) = cell.as_mut() {
                        c.raw.push_str(&e.decode().unwrap_or_default());
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if capture {
                    if let Some(c) = cell.as_mut() {
                        c.raw.push_str(&resolve_reference(&e));
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if capture {
                    if let Some(c) = cell.as_mut() {
                        c.raw.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        next_column = pending.column + 1;
                        let column = pending.column;
                        let value = pending.resolve(part, shared_strings)?;
                        if let Some(r) = row.as_mut() {
                            r.cells.push((column, value));
                        }
                    }
                }
                b"row" => {
                    if let Some(r) = row.take() {
                        rows.push(r);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
    }

    rows.sort_by_key(|r| r.index);
    Ok(rows)
}

/// The first row with any content is the header; rows after it are data.
fn build_table(rows: Vec<SheetRow>) -> Table {
    let mut rows = rows
        .into_iter()
        .skip_while(|r| r.cells.iter().all(|(_, v)| v.is_empty()));

    let Some(header) = rows.next() else {
        return Table::default();
    };

    let width = header.cells.iter().map(|(c, _)| c + 1).max().unwrap_or(0);
    let mut columns = vec![String::new(); width];
    for (column, value) in header.cells {
        columns[column] = value.to_header().unwrap_or_default();
    }

    let data = rows
        .map(|r| {
            let mut cells = vec![CellValue::Empty; width];
            for (column, value) in r.cells {
                if column < width {
                    cells[column] = value;
                }
            }
            (r.index as usize, cells)
        })
        .collect();

    Table::with_row_numbers(columns, data)
}

/// Converts the letters of an `A1`-style reference to a 0-based column.
/// `Ok(None)` when the reference has no letters.
fn column_index(reference: &str) -> Result<Option<usize>, String> {
    let mut index = 0usize;
    let mut seen = false;
    for c in reference.chars().take_while(|c| c.is_ascii_alphabetic()) {
        seen = true;
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        index = index
            .checked_mul(26)
            .and_then(|i| i.checked_add(digit))
            .filter(|i| *i <= MAX_COLUMN + 1)
            .ok_or_else(|| format!("cell reference '{}' is past the last column", reference))?;
    }
    Ok(seen.then(|| index - 1))
}

/// The 1-based index of a `<row>`, defaulting to the one after the previous row.
fn row_index(e: &BytesStart<'_>, next_row: u32, part: &str) -> Result<u32, ReadError> {
    let index = match attribute(e, b"r") {
        Some(r) => r.trim().parse::<u32>().map_err(|_| ReadError::Xml {
            part: part.to_string(),
            reason: format!("invalid row index '{}'", r),
        })?,
        None => next_row,
    };
    if index == 0 || index > MAX_ROW {
        return Err(ReadError::Xml {
            part: part.to_string(),
            reason: format!("row index {} is out of range", index),
        });
    }
    Ok(index)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Expands `&#38;`-style character references and the predefined XML
/// entities. Anything else is kept verbatim.
fn resolve_reference(e: &BytesRef<'_>) -> String {
    if let Ok(Some(ch)) = e.resolve_char_ref() {
        return ch.to_string();
    }
    let name = String::from_utf8_lossy(e.as_ref()).into_owned();
    match resolve_predefined_entity(&name) {
        Some(value) => value.to_string(),
        None => format!("&{};", name),
    }
}

fn xml_error(part: &str, e: quick_xml::Error) -> ReadError {
    ReadError::Xml {
        part: part.to_string(),
        reason: e.to_string(),
    }
}
