// src/workbook/export.rs - Monthly report and import template rendering

use chrono::{Datelike, Months, NaiveDate};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};

use super::grid::DEFAULT_SHEET;
use super::schema::{SectionSchema, LETTER_COLUMN, MARKER_COLUMN, SECTIONS, SERIAL_COLUMN, SERIAL_HEADER};
use super::CodecError;
use crate::models::{
    Category, CellValue, EquipmentCategory, Field, InventoryRecord, InventorySections, LabTestRow,
    PersonnelLine, ReportHeader,
};
use crate::store::{RecordStore, StoreError};

pub const TEMPLATE_FILENAME: &str = "Lab_Inventory_Template.xlsx";
pub const REPORT_SHEET: &str = "Monthly Lab Report";
pub const REPORT_TITLE: &str = "MONTHLY LABORATORY REPORT";

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September", "October",
    "November", "December",
];

const LAB_TEST_HEADERS: [&str; 5] = [SERIAL_HEADER, "CHEMICAL TESTED", "VENDOR", "STATUS", "REMARK"];

// Free-text lines span columns B to D.
const MERGE_FIRST_COL: ColNum = 1;
const MERGE_LAST_COL: ColNum = 3;
const PERSONNEL_COUNT_COL: ColNum = 3;

const DEFAULT_COLUMN_WIDTH: f64 = 15.0;
const TEMPLATE_MAX_WIDTH: usize = 50;

/// Everything the monthly report prints besides the date.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub header: &'a ReportHeader,
    pub personnel: &'a [PersonnelLine],
    pub lab_tests: &'a [LabTestRow],
    pub inventory: &'a InventorySections,
}

// ==================== SHEET WRITER ====================

/// Row cursor over a worksheet. Tracks the widest text per column for autofit.
struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    row: RowNum,
    widths: Vec<usize>,
}

impl<'a> SheetWriter<'a> {
    fn new(sheet: &'a mut Worksheet, first_row: RowNum) -> Self {
        Self { sheet, row: first_row, widths: Vec::new() }
    }

    fn track(&mut self, col: usize, len: usize) {
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        self.widths[col] = self.widths[col].max(len);
    }

    fn text(&mut self, col: usize, text: &str, format: Option<&Format>) -> Result<(), XlsxError> {
        if text.is_empty() {
            return Ok(());
        }
        self.track(col, text.chars().count());
        match format {
            Some(format) => self.sheet.write_string_with_format(self.row, col as ColNum, text, format)?,
            None => self.sheet.write_string(self.row, col as ColNum, text)?,
        };
        Ok(())
    }

    fn number(&mut self, col: usize, value: i64) -> Result<(), XlsxError> {
        self.track(col, value.to_string().len());
        self.sheet.write_number(self.row, col as ColNum, value as f64)?;
        Ok(())
    }

    /// Text merged across columns B to D of the current row.
    fn merged(&mut self, text: &str, format: &Format) -> Result<(), XlsxError> {
        self.sheet
            .merge_range(self.row, MERGE_FIRST_COL, self.row, MERGE_LAST_COL, text, format)?;
        Ok(())
    }

    fn next_row(&mut self) {
        self.row += 1;
    }

    fn skip(&mut self, rows: RowNum) {
        self.row += rows;
    }

    fn header_row(&mut self, labels: &[&str], format: &Format) -> Result<(), XlsxError> {
        for (col, label) in labels.iter().enumerate() {
            self.text(col, label, Some(format))?;
        }
        self.next_row();
        Ok(())
    }

    fn record_row(&mut self, serial: usize, schema: &SectionSchema, record: &InventoryRecord) -> Result<(), XlsxError> {
        self.number(SERIAL_COLUMN, serial as i64)?;
        for (index, &field) in schema.fields.iter().enumerate() {
            let col = SectionSchema::column_of(index);
            match record.cell(field) {
                Some(CellValue::Integer(n)) => self.number(col, n)?,
                Some(CellValue::Text(text)) if field == Field::Category => {
                    let label = EquipmentCategory::from_cell(&text)
                        .map(EquipmentCategory::display_label)
                        .unwrap_or_default();
                    self.text(col, label, None)?;
                }
                Some(CellValue::Text(text)) => self.text(col, &text, None)?,
                None => {}
            }
        }
        self.next_row();
        Ok(())
    }

    fn records(&mut self, schema: &SectionSchema, records: &[InventoryRecord]) -> Result<(), XlsxError> {
        for (index, record) in records.iter().enumerate() {
            self.record_row(index + 1, schema, record)?;
        }
        Ok(())
    }

    fn autofit(&mut self, max: usize) -> Result<(), XlsxError> {
        for (col, width) in self.widths.iter().enumerate() {
            let width = (width + 2).min(max);
            self.sheet.set_column_width(col as ColNum, width as f64)?;
        }
        Ok(())
    }
}

// ==================== DATE HELPERS ====================

/// English ordinal in upper case: 1ST, 2ND, 3RD, 11TH, 22ND, 31ST.
pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "TH",
        (1, _) => "ST",
        (2, _) => "ND",
        (3, _) => "RD",
        _ => "TH",
    };
    format!("{}{}", day, suffix)
}

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

pub fn last_day_of_month(date: NaiveDate) -> u32 {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Three months after `date`, clamped to the end of a shorter month.
pub fn calibration_due(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(3)).unwrap_or(date)
}

/// `LAB_REPORT_FOR_<MONTH>_<YEAR>.xlsx`
pub fn report_filename(date: NaiveDate) -> String {
    format!("LAB_REPORT_FOR_{}_{}.xlsx", month_name(date).to_uppercase(), date.year())
}

pub fn period_line(date: NaiveDate) -> String {
    format!(
        "PERIOD COVERED: 1ST TO {} {} {}",
        ordinal(last_day_of_month(date)),
        month_name(date).to_uppercase(),
        date.year()
    )
}

pub fn calibration_line(date: NaiveDate) -> String {
    let due = calibration_due(date);
    format!(
        "EQUIPMENT CALIBRATION STATUS: Due on {} {} {}",
        ordinal(due.day()),
        month_name(due).to_uppercase(),
        due.year()
    )
}

// ==================== MONTHLY REPORT ====================

/// Renders the monthly report: header block, personnel and lab test sections,
/// the four inventory sections, then the sign-off lines.
#[tracing::instrument(skip_all, fields(records = input.inventory.total(), date = %now))]
pub fn render_monthly_report(input: &ReportInput<'_>, now: NaiveDate) -> Result<Vec<u8>, CodecError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let plain = Format::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(REPORT_SHEET)?;

    let mut writer = SheetWriter::new(sheet, 1);
    writer.merged(&input.header.organisation, &bold)?;
    writer.next_row();
    writer.merged(REPORT_TITLE, &bold)?;
    writer.next_row();
    writer.merged(&period_line(now), &plain)?;
    writer.skip(2);

    // A: personnel
    writer.text(LETTER_COLUMN, "A", None)?;
    writer.merged("PERSONNEL/LAB", &plain)?;
    writer.next_row();
    for line in input.personnel {
        writer.text(MARKER_COLUMN, &line.label, None)?;
        writer.number(PERSONNEL_COUNT_COL as usize, i64::from(line.headcount))?;
        writer.next_row();
    }
    writer.next_row();

    // B: lab tests
    writer.text(LETTER_COLUMN, "B", None)?;
    writer.merged("LAB TEST REPORT", &plain)?;
    writer.next_row();
    writer.header_row(&LAB_TEST_HEADERS, &plain)?;
    for (index, test) in input.lab_tests.iter().enumerate() {
        writer.number(SERIAL_COLUMN, index as i64 + 1)?;
        writer.text(1, &test.chemical_tested, None)?;
        writer.text(2, &test.vendor, None)?;
        writer.text(3, &test.status, None)?;
        writer.text(4, &test.remark, None)?;
        writer.next_row();
    }
    writer.next_row();

    // C to F: inventory
    for schema in &SECTIONS {
        writer.text(LETTER_COLUMN, schema.letter, None)?;
        writer.merged(schema.title, &plain)?;
        writer.next_row();
        writer.header_row(&section_headers(schema), &plain)?;
        writer.records(schema, input.inventory.records(schema.category))?;
        writer.next_row();
    }

    writer.next_row();
    writer.merged(&input.header.remarks, &plain)?;
    writer.skip(2);
    writer.merged(&calibration_line(now), &plain)?;
    writer.skip(3);
    writer.merged(&format!("REPORT PREPARED BY : {}", input.header.prepared_by), &plain)?;
    writer.skip(2);
    writer.merged("APPROVED BY:", &plain)?;

    let column_count = writer.widths.len().max(SECTIONS[1].fields.len() + 1);
    for col in 0..column_count {
        writer.sheet.set_column_width(col as ColNum, DEFAULT_COLUMN_WIDTH)?;
    }
    writer.sheet.set_column_width(1, 30)?;
    writer.sheet.set_column_width(2, 20)?;
    writer.sheet.set_column_width(8, 25)?;

    let bytes = workbook.save_to_buffer()?;
    log::info!("Rendered monthly report for {} {} ({} bytes)", month_name(now), now.year(), bytes.len());
    Ok(bytes)
}

// ==================== IMPORT TEMPLATE ====================

/// Renders the downloadable import template: the four inventory sections on
/// `Sheet1`, two blank rows apart.
pub fn render_template(sections: &InventorySections) -> Result<Vec<u8>, CodecError> {
    let mut workbook = Workbook::new();
    let title = Format::new().set_bold().set_font_size(14);
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(DEFAULT_SHEET)?;

    let mut writer = SheetWriter::new(sheet, 0);
    for (position, schema) in SECTIONS.iter().enumerate() {
        if position > 0 {
            writer.skip(2);
        }
        writer.text(MARKER_COLUMN, schema.title, Some(&title))?;
        writer.next_row();
        writer.header_row(&section_headers(schema), &bold)?;
        writer.records(schema, sections.records(schema.category))?;
    }
    writer.autofit(TEMPLATE_MAX_WIDTH)?;

    Ok(workbook.save_to_buffer()?)
}

/// Current records of every category, each ordered by its identity field.
pub async fn load_sections(store: &dyn RecordStore) -> Result<InventorySections, (Category, StoreError)> {
    let mut sections = InventorySections::default();
    for category in Category::all() {
        let stored = store.list(category).await.map_err(|e| (category, e))?;
        *sections.records_mut(category) = stored.into_iter().map(|s| s.record).collect();
    }
    Ok(sections)
}

/// Stored lab tests, or `fallback` when the collection is empty or cannot be read.
pub async fn load_lab_tests(store: &dyn RecordStore, fallback: &[LabTestRow]) -> Vec<LabTestRow> {
    match store.list_lab_tests().await {
        Ok(stored) if !stored.is_empty() => stored.into_iter().map(|s| s.test).collect(),
        Ok(_) => fallback.to_vec(),
        Err(e) => {
            log::warn!("Error loading lab tests, using the configured rows: {}", e);
            fallback.to_vec()
        }
    }
}

fn section_headers(schema: &SectionSchema) -> Vec<&'static str> {
    std::iter::once(SERIAL_HEADER).chain(schema.headers.iter().copied()).collect()
}
