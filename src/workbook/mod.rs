// src/workbook/mod.rs
//! Workbook codec: renders inventory records into the sectioned report layout
//! and parses uploaded workbooks of the same layout back into records.

pub mod export;
pub mod grid;
pub mod import;
pub mod parse;
pub mod schema;

pub use export::{
    load_lab_tests, load_sections, render_monthly_report, render_template, report_filename, ReportInput,
    TEMPLATE_FILENAME,
};
pub use import::{import_workbook, ImportReport};

use thiserror::Error;

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("could not read workbook: {0}")]
    Unreadable(String),

    #[error("the uploaded file contains no worksheet")]
    NoWorksheet,

    #[error("could not read worksheet {0}")]
    Sheet(String),

    #[error("could not write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
}

/// An xlsx package whose workbook part lists no sheets.
#[cfg(test)]
pub(crate) fn workbook_without_sheets() -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#;
    const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;
    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets></sheets></workbook>"#;

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, xml) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/_rels/workbook.xml.rels", RELATIONSHIPS),
        ("xl/workbook.xml", WORKBOOK),
    ] {
        zip.start_file(name, options).expect("zip entry");
        zip.write_all(xml.as_bytes()).expect("zip write");
    }
    zip.finish().expect("zip finish").into_inner()
}
