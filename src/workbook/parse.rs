// src/workbook/parse.rs - Section scan and row mapping for uploaded workbooks

use super::grid::SheetGrid;
use super::schema::{SectionSchema, MARKER_COLUMN, SECTIONS, SERIAL_COLUMN};
use crate::models::{parse_int_lenient, Category, EquipmentCategory, Field, InventoryRecord};

/// Records read from one section of a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSection {
    pub category: Category,
    /// Whether the section title was present at all.
    pub found: bool,
    pub records: Vec<InventoryRecord>,
    /// 1-based worksheet rows that had a serial number but no identity.
    pub missing_identity_rows: Vec<usize>,
}

impl ParsedSection {
    fn absent(category: Category) -> Self {
        Self { category, found: false, records: Vec::new(), missing_identity_rows: Vec::new() }
    }
}

/// Row index of the first marker cell equal to the section title.
/// Matching is exact and case-sensitive.
pub fn find_section(grid: &SheetGrid, schema: &SectionSchema) -> Option<usize> {
    (0..grid.row_count()).find(|&row| grid.cell(row, MARKER_COLUMN) == schema.title)
}

pub fn parse_section(grid: &SheetGrid, schema: &SectionSchema) -> ParsedSection {
    let Some(title_row) = find_section(grid, schema) else {
        return ParsedSection::absent(schema.category);
    };

    let mut section = ParsedSection::absent(schema.category);
    section.found = true;

    for row in (title_row + 1)..grid.row_count() {
        if schema.is_terminator(grid.cell(row, MARKER_COLUMN)) {
            break;
        }
        // Header, spacer and free-text rows carry no integer serial.
        if parse_int_lenient(grid.cell(row, SERIAL_COLUMN)).is_none() {
            continue;
        }

        let record = parse_row(grid, row, schema);
        if record.has_identity() {
            section.records.push(record);
        } else {
            section.missing_identity_rows.push(row + 1);
        }
    }

    log::debug!(
        "Parsed {} {} rows from '{}' ({} without identity)",
        section.records.len(),
        schema.category.label(),
        grid.name(),
        section.missing_identity_rows.len()
    );
    section
}

fn parse_row(grid: &SheetGrid, row: usize, schema: &SectionSchema) -> InventoryRecord {
    let mut record = InventoryRecord::blank(schema.category);
    let mut category_cell = None;

    for (index, &field) in schema.fields.iter().enumerate() {
        let raw = grid.cell(row, SectionSchema::column_of(index));
        if field == Field::Category {
            category_cell = Some(raw);
        } else {
            record.assign(field, raw);
        }
    }

    if schema.category == Category::Equipment {
        let calibration_status = record
            .cell(Field::CalibrationStatus)
            .map(|v| v.as_text())
            .unwrap_or_default();
        let category = category_cell
            .and_then(EquipmentCategory::from_cell)
            .unwrap_or_else(|| EquipmentCategory::infer(record.identity(), &calibration_status));
        record.set_equipment_category(category);
    }

    record.normalize()
}

/// Parses every inventory section in canonical order.
pub fn parse_sections(grid: &SheetGrid) -> Vec<ParsedSection> {
    SECTIONS.iter().map(|schema| parse_section(grid, schema)).collect()
}
