//! End-to-end extraction tests on synthetic workbooks.

use std::io::Write;
use std::path::{Path, PathBuf};

use exstruct::automation::{AutomationDriver, AutomationSession, CellBorders};
use exstruct::model::{Chart, PrintArea, Shape};
use exstruct::{Engine, ExtractMode, ExtractOptions, Result};

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Data" sheetId="1" r:id="rId1"/>
  </sheets>
  <definedNames>
    <definedName name="_xlnm.Print_Area" localSheetId="0">Data!$A$1:$B$2</definedName>
  </definedNames>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<styleSheet>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/></border>
    <border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/></border>
  </borders>
  <cellXfs count="3">
    <xf borderId="0" fillId="0"/>
    <xf borderId="1" fillId="0"/>
    <xf borderId="0" fillId="2"/>
  </cellXfs>
</styleSheet>"#;

// A declared table over A1:B2 and a bordered block D5:F8 whose last column
// has borders but no values, so trimming shrinks it to D5:E8.
const SHEET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <dimension ref="A1:F8"/>
  <sheetData>
    <row r="1"><c r="A1" t="inlineStr"><is><t>id</t></is></c><c r="B1" t="inlineStr"><is><t>name</t></is></c><c r="H1" s="2"/></row>
    <row r="2"><c r="A2"><v>1</v></c><c r="B2" t="inlineStr"><is><t>widget</t></is></c></row>
    <row r="5"><c r="D5" s="1"><v>10</v></c><c r="E5" s="1"><v>11</v></c><c r="F5" s="1"/></row>
    <row r="6"><c r="D6" s="1"><v>20</v></c><c r="E6" s="1"><v>21</v></c><c r="F6" s="1"/></row>
    <row r="7"><c r="D7" s="1"><v>30</v></c><c r="E7" s="1"><v>31</v></c><c r="F7" s="1"/></row>
    <row r="8"><c r="D8" s="1"><v>40</v></c><c r="E8" s="1"><v>41</v></c><c r="F8" s="1"/></row>
  </sheetData>
  <tableParts count="1"><tablePart r:id="rId2"/></tableParts>
</worksheet>"#;

const SHEET_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/table" Target="../tables/table1.xml"/>
</Relationships>"#;

const TABLE_XML: &str =
    r#"<table id="1" name="Table1" displayName="Table1" ref="A1:B2"></table>"#;

fn write_workbook(dir: &Path) -> PathBuf {
    use zip::write::SimpleFileOptions;

    let path = dir.join("book.xlsx");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let parts = [
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", STYLES_XML),
        ("xl/worksheets/sheet1.xml", SHEET_XML),
        ("xl/worksheets/_rels/sheet1.xml.rels", SHEET_RELS),
        ("xl/tables/table1.xml", TABLE_XML),
    ];
    for (name, content) in parts {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    path
}

#[test]
fn light_mode_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let workbook = exstruct::extract(&path).unwrap();
    assert_eq!(workbook.book_name, "book.xlsx");

    let sheet = workbook.sheets.get("Data").unwrap();

    // Declared table first, then the trimmed detected candidate.
    assert_eq!(sheet.table_candidates, vec!["A1:B2", "D5:E8"]);

    // Print area with 1-based rows and 0-based columns.
    assert_eq!(
        sheet.print_areas,
        vec![PrintArea {
            r1: 1,
            c1: 0,
            r2: 2,
            c2: 1
        }]
    );

    // Sparse rows: the style-only F cells carry no values.
    assert_eq!(sheet.rows.len(), 6);
    assert_eq!(sheet.rows[0].r, 1);
    assert_eq!(sheet.rows[0].c.get(&0), Some(&"id".to_string()));
    let row5 = sheet.rows.iter().find(|r| r.r == 5).unwrap();
    assert_eq!(row5.c.len(), 2);
    assert_eq!(row5.c.get(&3), Some(&"10".to_string()));

    // Background fills grouped by color.
    assert_eq!(sheet.colors_map["#FFFF00"], vec!["H1".to_string()]);

    // Light mode runs without automation: no shapes or charts.
    assert!(sheet.shapes.is_empty());
    assert!(sheet.charts.is_empty());
}

#[test]
fn json_output_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let json = exstruct::extract_json(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["book_name"], "book.xlsx");
    let sheet = &value["sheets"]["Data"];
    assert_eq!(sheet["table_candidates"][0], "A1:B2");
    // Empty collections are pruned from the output.
    assert!(sheet.get("shapes").is_none());
    // Sparse cell maps use string column keys.
    assert_eq!(sheet["rows"][0]["c"]["0"], "id");
    assert_eq!(sheet["colors_map"]["#FFFF00"][0], "H1");
}

struct MockSession;

impl AutomationSession for MockSession {
    fn sheet_names(&self) -> Result<Vec<String>> {
        Ok(vec!["Data".to_string()])
    }
    fn used_range_extents(&self, _sheet: &str) -> Result<(u32, u32)> {
        Ok((8, 6))
    }
    fn cell_value(&self, _sheet: &str, _row: u32, _col: u32) -> Result<String> {
        Ok(String::new())
    }
    fn cell_borders(&self, _sheet: &str, _row: u32, _col: u32) -> Result<CellBorders> {
        Ok(CellBorders::default())
    }
    fn cell_fill_color(&self, _sheet: &str, _row: u32, _col: u32) -> Result<Option<String>> {
        Ok(None)
    }
    fn declared_tables(&self, _sheet: &str) -> Result<Vec<String>> {
        Ok(vec![])
    }
    fn shapes(&self, _sheet: &str) -> Result<Vec<Shape>> {
        let mut shape = Shape::new("approved", 100, 40);
        shape.w = Some(80);
        shape.h = Some(30);
        Ok(vec![shape])
    }
    fn charts(&self, _sheet: &str) -> Result<Vec<Chart>> {
        Ok(vec![])
    }
    fn print_areas(&self, _sheet: &str) -> Result<Vec<PrintArea>> {
        Ok(vec![])
    }
    fn horizontal_page_breaks(&self, _sheet: &str) -> Result<Vec<u32>> {
        Ok(vec![5])
    }
    fn vertical_page_breaks(&self, _sheet: &str) -> Result<Vec<u32>> {
        Ok(vec![])
    }
    fn reused_existing(&self) -> bool {
        false
    }
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

struct MockDriver;

impl AutomationDriver for MockDriver {
    fn open(&self, _path: &Path) -> Result<Box<dyn AutomationSession>> {
        Ok(Box::new(MockSession))
    }
}

#[test]
fn standard_mode_includes_shapes_without_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let mut engine = Engine::new(ExtractOptions {
        mode: ExtractMode::Standard,
        ..ExtractOptions::default()
    })
    .with_driver(Box::new(MockDriver));

    let workbook = engine.extract(&path).unwrap();
    let sheet = workbook.sheets.get("Data").unwrap();

    assert_eq!(sheet.shapes.len(), 1);
    assert_eq!(sheet.shapes[0].text, "approved");
    // Sizes are hidden outside verbose mode.
    assert_eq!(sheet.shapes[0].w, None);

    // Cell and table extraction still comes from the structured reader.
    assert_eq!(sheet.table_candidates, vec!["A1:B2", "D5:E8"]);
}

#[test]
fn sheet_parse_failure_falls_back_per_sheet() {
    use zip::write::SimpleFileOptions;

    // Two sheets; the second's worksheet part is missing from the package.
    let workbook_xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Good" sheetId="1" r:id="rId1"/>
    <sheet name="Bad" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;
    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;
    let sheet_xml = r#"<worksheet>
  <sheetData>
    <row r="1"><c r="A1" s="1"><v>1</v></c><c r="B1" s="1"><v>2</v></c></row>
    <row r="2"><c r="A2" s="1"><v>3</v></c><c r="B2" s="1"><v>4</v></c></row>
  </sheetData>
</worksheet>"#;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.xlsx");
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("xl/workbook.xml", workbook_xml),
        ("xl/_rels/workbook.xml.rels", workbook_rels),
        ("xl/styles.xml", STYLES_XML),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ] {
        zip.start_file(name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();

    let mut warnings = exstruct::WarnRegistry::new();
    let workbook = exstruct::pipeline::extract_workbook(
        &path,
        &ExtractOptions::default(),
        None,
        &mut warnings,
    )
    .unwrap();

    // The good sheet extracts normally.
    let good = workbook.sheets.get("Good").unwrap();
    assert_eq!(good.table_candidates, vec!["A1:B2"]);
    assert_eq!(good.rows.len(), 2);

    // The bad sheet degrades to empty instead of failing the workbook.
    let bad = workbook.sheets.get("Bad").unwrap();
    assert!(bad.rows.is_empty());
    assert!(bad.table_candidates.is_empty());
    assert!(warnings.has_warned(&format!(
        "reader-parse-fallback::{}::Bad",
        path.display()
    )));
}

#[test]
fn light_engine_omits_print_areas_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let mut engine = Engine::new(ExtractOptions::default());
    let workbook = engine.extract(&path).unwrap();
    let sheet = workbook.sheets.get("Data").unwrap();
    assert!(sheet.print_areas.is_empty());

    // An explicit setting overrides the mode default.
    let mut engine = Engine::new(ExtractOptions::default()).with_output(
        exstruct::OutputOptions {
            include_print_areas: Some(true),
            ..exstruct::OutputOptions::default()
        },
    );
    let workbook = engine.extract(&path).unwrap();
    let sheet = workbook.sheets.get("Data").unwrap();
    assert_eq!(sheet.print_areas.len(), 1);
}

#[test]
fn auto_page_breaks_split_used_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let mut engine = Engine::new(ExtractOptions {
        mode: ExtractMode::Standard,
        include_auto_page_breaks: true,
        ..ExtractOptions::default()
    })
    .with_driver(Box::new(MockDriver));

    let workbook = engine.extract(&path).unwrap();
    let sheet = workbook.sheets.get("Data").unwrap();

    // No print area on the session: the 8x6 used range bounds the pages, and
    // the horizontal break at row 5 splits it in two.
    assert_eq!(
        sheet.auto_print_areas,
        vec![
            PrintArea { r1: 1, c1: 0, r2: 4, c2: 5 },
            PrintArea { r1: 5, c1: 0, r2: 8, c2: 5 },
        ]
    );
}

#[test]
fn standard_mode_without_driver_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_workbook(dir.path());

    let mut engine = Engine::new(ExtractOptions {
        mode: ExtractMode::Standard,
        ..ExtractOptions::default()
    });

    let workbook = engine.extract(&path).unwrap();
    let sheet = workbook.sheets.get("Data").unwrap();
    assert!(sheet.shapes.is_empty());
    assert!(!sheet.table_candidates.is_empty());
    assert!(engine
        .warnings()
        .has_warned(&format!("automation-unavailable::{}", path.display())));
}
