// src/workbook/schema.rs - Fixed section layout shared by export and import

use crate::models::{Category, Field};

/// Column holding the row serial number (column A).
pub const SERIAL_COLUMN: usize = 0;
/// Column compared against section titles (column B).
pub const MARKER_COLUMN: usize = 1;
/// Column of a section's first field; field `i` sits at `FIRST_FIELD_COLUMN + i`.
pub const FIRST_FIELD_COLUMN: usize = 1;
/// Column holding the section letter.
pub const LETTER_COLUMN: usize = 0;

pub const SERIAL_HEADER: &str = "S/N";

/// Layout of one inventory section: where it sits in the report and which
/// field each column after the serial number carries.
#[derive(Debug)]
pub struct SectionSchema {
    pub category: Category,
    pub letter: &'static str,
    pub title: &'static str,
    /// Header labels for the field columns, serial column excluded.
    pub headers: &'static [&'static str],
    pub fields: &'static [Field],
}

impl SectionSchema {
    /// Worksheet column of `fields[index]`.
    pub const fn column_of(index: usize) -> usize {
        FIRST_FIELD_COLUMN + index
    }

    /// Titles that end this section's data rows: every section after it.
    pub fn terminators(&self) -> impl Iterator<Item = &'static str> + '_ {
        SECTIONS
            .iter()
            .skip_while(move |s| s.category != self.category)
            .skip(1)
            .map(|s| s.title)
    }

    pub fn is_terminator(&self, marker: &str) -> bool {
        self.terminators().any(|title| title == marker)
    }
}

/// Inventory sections in canonical order.
pub static SECTIONS: [SectionSchema; 4] = [
    SectionSchema {
        category: Category::Reagent,
        letter: "C",
        title: "REAGENT INVENTORY",
        headers: &[
            "REAGENT",
            "SIZE",
            "OPENING STOCK",
            "QUANTITY USED(LAB)",
            "LOAD OUT (LOCATION)",
            "CLOSING BALANCE",
            "STATUS",
            "REMARKS",
        ],
        fields: &[
            Field::Name,
            Field::Size,
            Field::Stock,
            Field::LabStock,
            Field::LoadOutLocation,
            Field::ClosingBalance,
            Field::Status,
            Field::Remarks,
        ],
    },
    SectionSchema {
        category: Category::Equipment,
        letter: "D",
        title: "EQUIPMENT INVENTORY",
        headers: &[
            "DESCRIPTION",
            "OPENING STOCK",
            "QUANTITY IN STORE",
            "LAB STOCK",
            "LOAD OUT (LOCATION)",
            "CLOSING BALANCE",
            "CALIBRATION STATUS",
            "EQUIPMENT STATUS",
            "REMARKS",
            "CATEGORY",
        ],
        fields: &[
            Field::Description,
            Field::Stock,
            Field::QuantityInStore,
            Field::LabStock,
            Field::LoadOutLocation,
            Field::ClosingBalance,
            Field::CalibrationStatus,
            Field::EquipmentStatus,
            Field::Remarks,
            Field::Category,
        ],
    },
    SectionSchema {
        category: Category::Consumable,
        letter: "E",
        title: "CONSUMABLES",
        headers: &[
            "DESCRIPTION",
            "OPENING STOCK",
            "QUANTITY IN STORE",
            "LAB STOCK",
            "LOAD OUT (LOCATION)",
            "CLOSING BALANCE",
            "EQUIPMENT STATUS",
            "REMARKS",
        ],
        fields: &[
            Field::Description,
            Field::Stock,
            Field::QuantityInStore,
            Field::LabStock,
            Field::LoadOutLocation,
            Field::ClosingBalance,
            Field::Status,
            Field::Remarks,
        ],
    },
    SectionSchema {
        category: Category::Glassware,
        letter: "F",
        title: "GLASSWARES",
        headers: &[
            "DESCRIPTION",
            "OPENING STOCK",
            "QUANTITY IN STORE",
            "LAB STOCK",
            "LOAD OUT (LOCATION)",
            "CLOSING BALANCE",
            "EQUIPMENT STATUS",
            "REMARKS",
        ],
        fields: &[
            Field::Description,
            Field::Stock,
            Field::QuantityInStore,
            Field::LabStock,
            Field::LoadOutLocation,
            Field::ClosingBalance,
            Field::Status,
            Field::Remarks,
        ],
    },
];

#[cfg(test)]
pub fn schema_for(category: Category) -> &'static SectionSchema {
    match category {
        Category::Reagent => &SECTIONS[0],
        Category::Equipment => &SECTIONS[1],
        Category::Consumable => &SECTIONS[2],
        Category::Glassware => &SECTIONS[3],
    }
}
