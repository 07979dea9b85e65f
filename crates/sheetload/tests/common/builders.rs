//! Builders for spreadsheet fixtures.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Feuil1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// A fixture cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

/// Builds a single-sheet workbook: one header row, then data rows.
#[derive(Debug, Clone, Default)]
pub struct WorkbookBuilder {
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl WorkbookBuilder {
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(cells);
        self
    }

    pub fn write(&self, path: &Path) {
        let file = File::create(path).expect("Failed to create workbook");
        let mut zip = zip::ZipWriter::new(file);
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", ROOT_RELS.to_string()),
            ("xl/workbook.xml", WORKBOOK.to_string()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
            ("xl/worksheets/sheet1.xml", self.sheet_xml()),
        ];
        for (name, content) in parts {
            zip.start_file(name, SimpleFileOptions::default())
                .expect("Failed to start zip entry");
            zip.write_all(content.as_bytes())
                .expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish workbook");
    }

    fn sheet_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        let header: Vec<Cell> = self.header.iter().map(|h| Cell::Text(h.clone())).collect();
        for (i, cells) in std::iter::once(&header).chain(self.rows.iter()).enumerate() {
            let row_number = i + 1;
            xml.push_str(&format!(r#"<row r="{}">"#, row_number));
            for (col, cell) in cells.iter().enumerate() {
                let reference = format!("{}{}", column_letters(col), row_number);
                match cell {
                    Cell::Text(s) => xml.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        reference,
                        escape(s)
                    )),
                    Cell::Number(n) => {
                        xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, n))
                    }
                    Cell::Blank => {}
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// Writes a package holding nothing but `xl/worksheets/sheet1.xml`.
pub fn write_bare_sheet(path: &Path, sheet_xml: &str) {
    let file = File::create(path).expect("Failed to create workbook");
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
        .expect("Failed to start zip entry");
    zip.write_all(sheet_xml.as_bytes())
        .expect("Failed to write zip entry");
    zip.finish().expect("Failed to finish workbook");
}

/// `0` -> `A`, `25` -> `Z`, `26` -> `AA`.
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub const CLIENT_COLUMNS: &[&str] = &[
    "client_id",
    "nom",
    "prenom",
    "email",
    "telephone",
    "adresse",
];

pub const PRODUCT_COLUMNS: &[&str] = &[
    "produit_id",
    "nom",
    "categorie",
    "prix_unitaire",
    "stock_disponible",
    "description",
];

pub const SALE_COLUMNS: &[&str] = &[
    "sale_id",
    "client_id",
    "product_id",
    "quantity",
    "total_price",
    "sale_date",
];

pub fn clients_workbook() -> WorkbookBuilder {
    WorkbookBuilder::new(CLIENT_COLUMNS)
        .row(vec![
            "C1".into(),
            "Dupont".into(),
            "Marie".into(),
            "marie.dupont@example.fr".into(),
            "0612345678".into(),
            "1 rue de la Paix, Paris".into(),
        ])
        .row(vec![
            "C2".into(),
            "Martin".into(),
            "Luc".into(),
            Cell::Blank,
            Cell::Blank,
            "8 quai des Chartrons, Bordeaux".into(),
        ])
}

pub fn products_workbook() -> WorkbookBuilder {
    WorkbookBuilder::new(PRODUCT_COLUMNS).row(vec![
        "P1".into(),
        "Clavier".into(),
        "Informatique".into(),
        9.99.into(),
        12i64.into(),
        "Clavier AZERTY".into(),
    ])
}

pub fn sales_workbook() -> WorkbookBuilder {
    WorkbookBuilder::new(SALE_COLUMNS).row(vec![
        "S1".into(),
        "C1".into(),
        "P1".into(),
        2i64.into(),
        19.98.into(),
        "2024-01-05".into(),
    ])
}
