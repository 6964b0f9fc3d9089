// src/models/report.rs
//! Static report content and the per-category record lists a workbook carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Category, EquipmentCategory, Field, InventoryRecord};

/// One line of the PERSONNEL/LAB section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelLine {
    pub label: String,
    pub headcount: u32,
}

impl PersonnelLine {
    pub fn new(label: &str, headcount: u32) -> Self {
        Self { label: label.to_string(), headcount }
    }
}

/// One row of the LAB TEST REPORT section. Serial numbers are assigned on render.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestRow {
    #[serde(alias = "chemical_tested")]
    pub chemical_tested: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub remark: String,
}

impl LabTestRow {
    /// Trimmed copy; `None` when no chemical is named.
    pub fn normalized(&self) -> Option<Self> {
        let chemical_tested = self.chemical_tested.trim();
        if chemical_tested.is_empty() {
            return None;
        }
        Some(Self {
            chemical_tested: chemical_tested.to_string(),
            vendor: self.vendor.trim().to_string(),
            status: self.status.trim().to_string(),
            remark: self.remark.trim().to_string(),
        })
    }
}

/// A lab test row as kept in the `lab_tests` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLabTest {
    pub id: String,
    #[serde(flatten)]
    pub test: LabTestRow,
    pub created_at: DateTime<Utc>,
}

/// Free text printed around the inventory sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub organisation: String,
    pub remarks: String,
    pub prepared_by: String,
}

/// Records of all four categories, each list in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySections {
    pub reagents: Vec<InventoryRecord>,
    pub equipment: Vec<InventoryRecord>,
    pub consumables: Vec<InventoryRecord>,
    pub glassware: Vec<InventoryRecord>,
}

impl InventorySections {
    pub fn records(&self, category: Category) -> &[InventoryRecord] {
        match category {
            Category::Reagent => &self.reagents,
            Category::Equipment => &self.equipment,
            Category::Consumable => &self.consumables,
            Category::Glassware => &self.glassware,
        }
    }

    pub fn records_mut(&mut self, category: Category) -> &mut Vec<InventoryRecord> {
        match category {
            Category::Reagent => &mut self.reagents,
            Category::Equipment => &mut self.equipment,
            Category::Consumable => &mut self.consumables,
            Category::Glassware => &mut self.glassware,
        }
    }

    pub fn total(&self) -> usize {
        Category::all().map(|c| self.records(c).len()).sum()
    }
}

/// Example rows shipped in the downloadable import template.
pub fn sample_sections() -> InventorySections {
    let reagent = |name: &str, size: &str, stock: i64, used: i64, location: &str, closing: i64, status: &str, remarks: &str| {
        InventoryRecord::named(Category::Reagent, name)
            .with(Field::Size, size)
            .with(Field::Stock, stock)
            .with(Field::LabStock, used)
            .with(Field::LoadOutLocation, location)
            .with(Field::ClosingBalance, closing)
            .with(Field::Status, status)
            .with(Field::Remarks, remarks)
    };
    let stocked = |category: Category, description: &str, counts: [i64; 4], location: &str, status: &str, remarks: &str| {
        let [stock, in_store, lab, closing] = counts;
        let status_field = if category == Category::Equipment { Field::EquipmentStatus } else { Field::Status };
        InventoryRecord::named(category, description)
            .with(Field::Stock, stock)
            .with(Field::QuantityInStore, in_store)
            .with(Field::LabStock, lab)
            .with(Field::LoadOutLocation, location)
            .with(Field::ClosingBalance, closing)
            .with(status_field, status)
            .with(Field::Remarks, remarks)
    };
    let calibrated = |record: InventoryRecord, calibration_status: &str| {
        let mut record = record.with(Field::CalibrationStatus, calibration_status);
        record.set_equipment_category(EquipmentCategory::Calibration);
        record
    };

    InventorySections {
        reagents: vec![
            reagent("Hydrochloric Acid", "1L", 10, 2, "Lab A", 8, "OK", "Good condition"),
            reagent("Sodium Hydroxide", "500ml", 5, 1, "Lab B", 4, "Low Stock", "Need reorder"),
        ],
        equipment: vec![
            calibrated(
                stocked(Category::Equipment, "Calibration Weight Set", [2, 1, 1, 2], "Lab C", "OK", "Working fine"),
                "UP TO DATE",
            ),
            calibrated(
                stocked(Category::Equipment, "Digital Balance", [3, 2, 1, 3], "Lab A", "OK", "Regular maintenance needed"),
                "Due Soon",
            ),
        ],
        consumables: vec![
            stocked(Category::Consumable, "Test Tubes", [100, 50, 30, 80], "Storage A", "OK", "Good supply"),
            stocked(Category::Consumable, "Pipette Tips", [200, 100, 50, 150], "Storage B", "OK", "Regular stock"),
        ],
        glassware: vec![
            stocked(Category::Glassware, "Beakers 250ml", [20, 10, 5, 15], "Lab A", "OK", "Clean condition"),
            stocked(Category::Glassware, "Measuring Cylinders 100ml", [15, 8, 4, 12], "Lab B", "OK", "Good condition"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sections_cover_every_category() {
        let samples = sample_sections();
        for category in Category::all() {
            let records = samples.records(category);
            assert_eq!(records.len(), 2, "{} samples", category);
            assert!(records.iter().all(|r| r.category() == category && r.has_identity()));
        }
        assert_eq!(samples.total(), 8);
        assert_eq!(
            samples.equipment[1].equipment_category(),
            Some(EquipmentCategory::Calibration)
        );
    }
}
