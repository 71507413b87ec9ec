//! Reads the populated extent of every worksheet straight from the XLSX
//! package, without materialising any cell values.

use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use thiserror::Error;
use zip::ZipArchive;
use zip::read::ZipFile;
use zip::result::ZipError;

use crate::error::Result;
use crate::excel::address::CellRef;
use crate::excel::workbook::parse_error;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

#[derive(Debug, Error)]
enum ScanError {
    #[error(transparent)]
    Zip(#[from] ZipError),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error("invalid cell position '{0}'")]
    Position(String),
}

type ScanResult<T> = std::result::Result<T, ScanError>;

/// Bounding box of the cells that hold a value or a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub top_left: CellRef,
    pub bottom_right: CellRef,
}

impl Extent {
    const fn single(cell: CellRef) -> Self {
        Self {
            top_left: cell,
            bottom_right: cell,
        }
    }

    fn including(self, cell: CellRef) -> Self {
        Self {
            top_left: CellRef::new(
                self.top_left.column.min(cell.column),
                self.top_left.row.min(cell.row),
            ),
            bottom_right: CellRef::new(
                self.bottom_right.column.max(cell.column),
                self.bottom_right.row.max(cell.row),
            ),
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.bottom_right.row - self.top_left.row + 1
    }

    #[must_use]
    pub const fn columns(&self) -> usize {
        self.bottom_right.column - self.top_left.column + 1
    }

    /// Cells a dense reader allocates for this extent.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.rows().saturating_mul(self.columns())
    }
}

/// Extents keyed by sheet name, in workbook order. Sheets without populated
/// cells map to `None`.
pub fn sheet_extents(path: &Path) -> Result<IndexMap<String, Option<Extent>>> {
    let file = File::open(path)?;
    read_extents(BufReader::new(file)).map_err(|e| parse_error(path, &e))
}

fn read_extents<R: Read + Seek>(reader: R) -> ScanResult<IndexMap<String, Option<Extent>>> {
    let mut archive = ZipArchive::new(reader)?;
    let targets = relationship_targets(&mut archive)?;
    let sheets = sheet_parts(&mut archive, &targets)?;

    let mut extents = IndexMap::with_capacity(sheets.len());
    for (name, part) in sheets {
        let extent = match part {
            Some(part) => worksheet_extent(&mut archive, &part)?,
            None => None,
        };
        extents.insert(name, extent);
    }
    Ok(extents)
}

fn part_reader<'a, R: Read + Seek>(
    archive: &'a mut ZipArchive<R>,
    part: &str,
) -> ScanResult<Option<Reader<BufReader<ZipFile<'a>>>>> {
    match archive.by_name(part) {
        Ok(file) => Ok(Some(Reader::from_reader(BufReader::new(file)))),
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Attribute value matched on its local name, so `r:id` is found as `id`.
fn attribute(element: &BytesStart<'_>, local_name: &[u8]) -> ScanResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == local_name {
            // quick-xml's `encoding` feature (enabled via calamine) hides
            // `unescape_value`; decode as UTF-8 then unescape, as it does.
            let raw = std::str::from_utf8(&attr.value).map_err(quick_xml::Error::from)?;
            let value = quick_xml::escape::unescape(raw).map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship targets may be relative to `xl/` or absolute.
fn part_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{target}")
    }
}

fn relationship_targets<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> ScanResult<HashMap<String, String>> {
    let mut targets = HashMap::new();
    let Some(mut xml) = part_reader(archive, WORKBOOK_RELS_PART)? else {
        return Ok(targets);
    };

    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attribute(e, b"Id")?, attribute(e, b"Target")?) {
                    targets.insert(id, part_path(&target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

fn sheet_parts<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    targets: &HashMap<String, String>,
) -> ScanResult<Vec<(String, Option<String>)>> {
    let mut sheets = Vec::new();
    let Some(mut xml) = part_reader(archive, WORKBOOK_PART)? else {
        return Ok(sheets);
    };

    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                let name = attribute(e, b"name")?.unwrap_or_default();
                let part = attribute(e, b"id")?.and_then(|id| targets.get(&id).cloned());
                sheets.push((name, part));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Position of a `<c>` element. Cells without an `r` attribute follow the
/// previous cell in the same row.
fn cell_position(element: &BytesStart<'_>, column: usize, row: usize) -> ScanResult<CellRef> {
    match attribute(element, b"r")? {
        Some(name) => match CellRef::parse(&name) {
            Ok(cell) => Ok(cell),
            Err(_) => Err(ScanError::Position(name)),
        },
        None => Ok(CellRef::new(column + 1, row)),
    }
}

fn worksheet_extent<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> ScanResult<Option<Extent>> {
    let Some(mut xml) = part_reader(archive, part)? else {
        return Ok(None);
    };

    let mut extent: Option<Extent> = None;
    let mut current = CellRef::new(0, 0);
    let mut in_cell = false;
    let mut populated = false;
    let mut buf = Vec::new();
    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"row" => {
                let row = match attribute(e, b"r")? {
                    Some(r) => match r.parse::<usize>() {
                        Ok(row) => row,
                        Err(_) => return Err(ScanError::Position(r)),
                    },
                    None => current.row + 1,
                };
                current = CellRef::new(0, row);
            }
            Event::Start(ref e) if e.local_name().as_ref() == b"c" => {
                current = cell_position(e, current.column, current.row)?;
                in_cell = true;
                populated = false;
            }
            Event::Empty(ref e) if e.local_name().as_ref() == b"c" => {
                current = cell_position(e, current.column, current.row)?;
            }
            Event::Start(ref e) | Event::Empty(ref e)
                if in_cell && matches!(e.local_name().as_ref(), b"v" | b"f" | b"is") =>
            {
                populated = true;
            }
            Event::End(ref e) if e.local_name().as_ref() == b"c" => {
                if populated && current.is_within_limits() {
                    extent = Some(extent.map_or(Extent::single(current), |x| x.including(current)));
                }
                in_cell = false;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(extent)
}
