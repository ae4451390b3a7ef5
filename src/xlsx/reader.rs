//! Workbook reading from the OOXML package.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::container::WorkbookPackage;
use crate::error::{Error, Result};
use crate::model::workbook::{CellRow, PrintArea};
use crate::table::grid::{col_to_letters, parse_cell_ref, BorderMap, Rect};

use super::shared_strings::SharedStrings;
use super::styles::CellStyles;

/// One cell as read from a worksheet part.
#[derive(Debug, Clone, Default)]
pub struct CellContent {
    /// Stringified, NFC-normalized cell value ("" for style-only cells)
    pub value: String,
    /// Any of the six border edges is visible on this cell
    pub border_any: bool,
    /// An inside-vertical edge (between columns) is visible
    pub border_inside_v: bool,
    /// An inside-horizontal edge (between rows) is visible
    pub border_inside_h: bool,
    /// Background fill color as "#RRGGBB", when the cell style has a solid
    /// fill
    pub fill: Option<String>,
}

/// Parsed content of one worksheet.
#[derive(Debug, Clone)]
pub struct SheetContent {
    /// Sheet tab name
    pub name: String,
    /// Package part path (e.g. "xl/worksheets/sheet1.xml")
    pub part: String,
    /// Used-range row extent, 1-based
    pub max_row: u32,
    /// Used-range column extent, 1-based
    pub max_col: u32,
    cells: HashMap<(u32, u32), CellContent>,
    table_part_ids: Vec<String>,
}

impl SheetContent {
    /// Value at a 1-based (row, col), if the cell was present in the part.
    pub fn cell_value(&self, row: u32, col: u32) -> Option<&str> {
        self.cells.get(&(row, col)).map(|c| c.value.as_str())
    }

    /// Build the border presence maps for this sheet.
    pub fn border_map(&self) -> BorderMap {
        let mut map = BorderMap::new(self.max_row, self.max_col);
        for ((row, col), cell) in &self.cells {
            if cell.border_any {
                map.any.mark(*row, *col);
            }
            if cell.border_inside_v {
                map.inside_vertical.mark(*row, *col);
            }
            if cell.border_inside_h {
                map.inside_horizontal.mark(*row, *col);
            }
        }
        map
    }

    /// Background colors of the sheet's filled cells, keyed by "#RRGGBB".
    /// Cell references are listed in row-major order.
    pub fn colors_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut keys: Vec<&(u32, u32)> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.fill.is_some())
            .map(|(pos, _)| pos)
            .collect();
        keys.sort();

        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (row, col) in keys {
            if let Some(color) = self.cells[&(*row, *col)].fill.as_ref() {
                map.entry(color.clone())
                    .or_default()
                    .push(format!("{}{}", col_to_letters(*col), row));
            }
        }
        map
    }

    /// Materialize a rectangle's values as a dense row-major 2D array.
    /// Missing cells become empty strings.
    pub fn region_values(&self, rect: &Rect) -> Vec<Vec<String>> {
        (rect.top..=rect.bottom)
            .map(|row| {
                (rect.left..=rect.right)
                    .map(|col| {
                        self.cells
                            .get(&(row, col))
                            .map(|c| c.value.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }

    /// Sparse row representation of the sheet's cells. Whitespace-only values
    /// are dropped; rows left empty after that are omitted.
    pub fn cell_rows(&self) -> Vec<CellRow> {
        let mut rows: BTreeMap<u32, BTreeMap<u32, String>> = BTreeMap::new();
        for ((row, col), cell) in &self.cells {
            if cell.value.trim().is_empty() {
                continue;
            }
            rows.entry(*row)
                .or_default()
                .insert(col - 1, cell.value.clone());
        }
        rows.into_iter()
            .map(|(r, c)| CellRow { r, c })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    part: String,
}

/// Structured-file workbook reader.
///
/// Parses the package eagerly for workbook-level metadata (sheet list, shared
/// strings, border styles, defined names); worksheet parts are parsed on
/// demand through [`XlsxReader::read_sheet`].
#[derive(Debug)]
pub struct XlsxReader {
    package: WorkbookPackage,
    shared: SharedStrings,
    styles: CellStyles,
    sheets: Vec<SheetEntry>,
    /// (localSheetId, raw defined-name text) for _xlnm.Print_Area entries
    print_area_defs: Vec<(Option<u32>, String)>,
}

impl XlsxReader {
    /// Open a workbook from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(WorkbookPackage::open(path)?)
    }

    /// Open a workbook from in-memory package bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::load(WorkbookPackage::from_bytes(data)?)
    }

    fn load(package: WorkbookPackage) -> Result<Self> {
        let workbook_xml = package.read_xml("xl/workbook.xml")?;
        let rels = package.part_relationships("xl/workbook.xml")?;

        let mut sheets = Vec::new();
        let mut print_area_defs = Vec::new();
        parse_workbook_xml(&workbook_xml, &mut |name, rel_id| {
            let part = rels
                .get(rel_id)
                .map(|r| WorkbookPackage::resolve_path("xl/workbook.xml", &r.target))
                .unwrap_or_else(|| format!("xl/worksheets/{}.xml", name));
            sheets.push(SheetEntry {
                name: name.to_string(),
                part,
            });
        }, &mut |local_sheet_id, text| {
            print_area_defs.push((local_sheet_id, text.to_string()));
        })?;

        let shared = match package.read_xml("xl/sharedStrings.xml") {
            Ok(xml) => SharedStrings::parse(&xml)?,
            Err(_) => SharedStrings::default(),
        };
        let styles = match package.read_xml("xl/styles.xml") {
            Ok(xml) => CellStyles::parse(&xml),
            Err(_) => CellStyles::default(),
        };

        Ok(Self {
            package,
            shared,
            styles,
            sheets,
            print_area_defs,
        })
    }

    /// Sheet tab names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Parse one worksheet by tab name.
    pub fn read_sheet(&self, name: &str) -> Result<SheetContent> {
        let entry = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;
        let xml = self.package.read_xml(&entry.part)?;
        parse_worksheet_xml(&xml, entry, &self.shared, &self.styles)
    }

    /// Range strings of the sheet's declared tables, in relationship-ID
    /// order. A table part that cannot be read or lacks a range is skipped.
    pub fn declared_tables(&self, sheet: &SheetContent) -> Result<Vec<String>> {
        if sheet.table_part_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rels = self.package.part_relationships(&sheet.part)?;

        let mut ranges = Vec::new();
        for rel_id in &sheet.table_part_ids {
            let Some(rel) = rels.get(rel_id) else { continue };
            let part = WorkbookPackage::resolve_path(&sheet.part, &rel.target);
            let Ok(xml) = self.package.read_xml(&part) else {
                continue;
            };
            if let Some(range) = table_ref_attr(&xml) {
                ranges.push(range);
            }
        }
        Ok(ranges)
    }

    /// Print areas defined for a sheet, from the workbook's
    /// `_xlnm.Print_Area` defined names. Unparseable parts are skipped.
    pub fn print_areas(&self, sheet_name: &str) -> Vec<PrintArea> {
        let Some(index) = self.sheets.iter().position(|s| s.name == sheet_name) else {
            return Vec::new();
        };

        let mut areas = Vec::new();
        for (local, raw) in &self.print_area_defs {
            if let Some(local) = local {
                if *local != index as u32 {
                    continue;
                }
            }
            for part in split_csv_respecting_quotes(raw) {
                let Some(range) = normalize_area_for_sheet(&part, sheet_name) else {
                    continue;
                };
                if let Ok(rect) = Rect::parse_a1(&range) {
                    areas.push(PrintArea {
                        r1: rect.top,
                        c1: rect.left - 1,
                        r2: rect.bottom,
                        c2: rect.right - 1,
                    });
                }
            }
        }
        areas
    }
}

fn attr_string(attr: &quick_xml::events::attributes::Attribute<'_>) -> String {
    String::from_utf8_lossy(&attr.value).to_string()
}

/// Walk xl/workbook.xml, reporting `<sheet>` entries and Print_Area defined
/// names through the callbacks.
fn parse_workbook_xml(
    xml: &str,
    on_sheet: &mut dyn FnMut(&str, &str),
    on_print_area: &mut dyn FnMut(Option<u32>, &str),
) -> Result<()> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    // (localSheetId, accumulated text) while inside a Print_Area definedName
    let mut pending_area: Option<(Option<u32>, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e))
            | Ok(quick_xml::events::Event::Empty(ref e)) => match e.name().as_ref() {
                b"sheet" => {
                    let mut name = String::new();
                    let mut rel_id = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => name = attr_string(&attr),
                            b"r:id" | b"id" => rel_id = attr_string(&attr),
                            _ => {}
                        }
                    }
                    if !name.is_empty() {
                        on_sheet(&name, &rel_id);
                    }
                }
                b"definedName" => {
                    let mut def_name = String::new();
                    let mut local_sheet_id = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => def_name = attr_string(&attr),
                            b"localSheetId" => {
                                local_sheet_id = attr_string(&attr).parse().ok();
                            }
                            _ => {}
                        }
                    }
                    if def_name == "_xlnm.Print_Area" {
                        pending_area = Some((local_sheet_id, String::new()));
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(e)) => {
                if let Some((_, text)) = pending_area.as_mut() {
                    text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(quick_xml::events::Event::End(ref e)) => {
                if e.name().as_ref() == b"definedName" {
                    if let Some((local, text)) = pending_area.take() {
                        if !text.is_empty() {
                            on_print_area(local, &text);
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// Parse one worksheet part into cell values, border flags, extents, and
/// tablePart relationship IDs.
fn parse_worksheet_xml(
    xml: &str,
    entry: &SheetEntry,
    shared: &SharedStrings,
    styles: &CellStyles,
) -> Result<SheetContent> {
    let mut reader = quick_xml::Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut content = SheetContent {
        name: entry.name.clone(),
        part: entry.part.clone(),
        max_row: 0,
        max_col: 0,
        cells: HashMap::new(),
        table_part_ids: Vec::new(),
    };

    let mut current_row: u32 = 0;
    let mut next_col: u32 = 1;
    // (row, col, cell type, style index) of the cell being read
    let mut current_cell: Option<(u32, u32, CellType, Option<usize>)> = None;
    let mut in_v = false;
    let mut in_is_t = false;
    let mut current_text = String::new();

    macro_rules! flush_cell {
        () => {
            if let Some((row, col, cell_type, style)) = current_cell.take() {
                let value = resolve_value(&current_text, cell_type, shared);
                let (border_any, border_inside_v, border_inside_h) = style
                    .and_then(|s| styles.border_for_style_index(s))
                    .map(|def| (def.any_edge(), def.vertical, def.horizontal))
                    .unwrap_or((false, false, false));
                let fill = style.and_then(|s| styles.fill_for_style_index(s));
                content.max_row = content.max_row.max(row);
                content.max_col = content.max_col.max(col);
                content.cells.insert(
                    (row, col),
                    CellContent {
                        value,
                        border_any,
                        border_inside_v,
                        border_inside_h,
                        fill,
                    },
                );
                current_text.clear();
            }
        };
    }

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_empty_elem = matches!(&event, Ok(quick_xml::events::Event::Empty(_)));
        match event {
            Ok(quick_xml::events::Event::Start(ref e))
            | Ok(quick_xml::events::Event::Empty(ref e)) => {
                match e.name().as_ref() {
                    b"dimension" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"ref" {
                                if let Ok(rect) = Rect::parse_a1(&attr_string(&attr)) {
                                    content.max_row = content.max_row.max(rect.bottom);
                                    content.max_col = content.max_col.max(rect.right);
                                }
                            }
                        }
                    }
                    b"row" => {
                        current_row = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"r")
                            .and_then(|a| attr_string(&a).parse().ok())
                            .unwrap_or(current_row + 1);
                        next_col = 1;
                    }
                    b"c" => {
                        let mut row = current_row;
                        let mut col = next_col;
                        let mut cell_type = CellType::Number;
                        let mut style = None;
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"r" => {
                                    if let Ok((c, r)) = parse_cell_ref(&attr_string(&attr)) {
                                        col = c;
                                        row = r;
                                    }
                                }
                                b"t" => cell_type = CellType::from_attr(&attr.value),
                                b"s" => style = attr_string(&attr).parse().ok(),
                                _ => {}
                            }
                        }
                        next_col = col + 1;
                        current_cell = Some((row, col, cell_type, style));
                        current_text.clear();
                        if is_empty_elem {
                            flush_cell!();
                        }
                    }
                    b"v" if current_cell.is_some() && !is_empty_elem => in_v = true,
                    b"t" if current_cell.is_some() && !is_empty_elem => in_is_t = true,
                    b"tablePart" => {
                        for attr in e.attributes().flatten() {
                            if matches!(attr.key.as_ref(), b"r:id" | b"id") {
                                content.table_part_ids.push(attr_string(&attr));
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_v || in_is_t {
                    current_text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(quick_xml::events::Event::End(ref e)) => match e.name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_is_t = false,
                b"c" => flush_cell!(),
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(content)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Number,
    SharedString,
    Boolean,
    Error,
    Text,
}

impl CellType {
    fn from_attr(value: &[u8]) -> Self {
        match value {
            b"s" => Self::SharedString,
            b"b" => Self::Boolean,
            b"e" => Self::Error,
            b"str" | b"inlineStr" => Self::Text,
            _ => Self::Number,
        }
    }
}

/// Resolve raw cell text to its display string, NFC-normalized.
fn resolve_value(raw: &str, cell_type: CellType, shared: &SharedStrings) -> String {
    let resolved = match cell_type {
        CellType::SharedString => shared.resolve(raw),
        CellType::Boolean => {
            if raw == "1" {
                "TRUE"
            } else {
                "FALSE"
            }
        }
        _ => raw,
    };
    resolved.nfc().collect()
}

/// Extract the `ref` attribute of a table part's root `<table>` element.
fn table_ref_attr(xml: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e))
            | Ok(quick_xml::events::Event::Empty(ref e)) => {
                if e.name().as_ref() == b"table" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            return Some(attr_string(&attr));
                        }
                    }
                    return None;
                }
            }
            Ok(quick_xml::events::Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// Split a comma-separated list of range parts, keeping commas inside quoted
/// sheet names intact. Doubled single quotes escape a quote inside a name.
pub(crate) fn split_csv_respecting_quotes(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' if in_quotes && chars.peek() == Some(&'\'') => {
                current.push('\'');
                current.push('\'');
                chars.next();
            }
            '\'' => {
                in_quotes = !in_quotes;
                current.push('\'');
            }
            ',' if !in_quotes => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Strip the sheet prefix from a range part when it names the given sheet.
/// Returns None when the part belongs to a different sheet; a bare range
/// passes through unchanged.
pub(crate) fn normalize_area_for_sheet(part: &str, sheet_name: &str) -> Option<String> {
    let Some(bang) = split_point(part) else {
        return Some(part.to_string());
    };
    let (prefix, range) = part.split_at(bang);
    let range = &range[1..];

    let unquoted = if prefix.starts_with('\'') && prefix.ends_with('\'') && prefix.len() >= 2 {
        prefix[1..prefix.len() - 1].replace("''", "'")
    } else {
        prefix.to_string()
    };

    if unquoted == sheet_name {
        Some(range.to_string())
    } else {
        None
    }
}

/// Position of the `!` separating sheet name from range, ignoring any `!`
/// inside a quoted sheet name.
fn split_point(part: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (i, ch) in part.char_indices() {
        match ch {
            '\'' => in_quotes = !in_quotes,
            '!' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}
