// src/models/form.rs
use serde::Deserialize;
use validator::Validate;

use super::record::{deserialize_lenient_int, Category, EquipmentCategory, Field, InventoryRecord};
use crate::error::{ApiError, ApiResult};

// ==================== ADD / UPDATE FORM ====================

/// Body of the add request. Every category submits the same shape; fields
/// that do not belong to the target category are ignored. Counters may arrive
/// as numbers or as form text and fall back to 0 when unparseable.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordForm {
    #[validate(length(max = 255, message = "Name cannot exceed 255 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "Description cannot exceed 255 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 50, message = "Size cannot exceed 50 characters"))]
    pub size: Option<String>,

    #[validate(range(min = 0, message = "Opening stock cannot be negative"))]
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub stock: Option<i64>,

    #[validate(range(min = 0, message = "Quantity in store cannot be negative"))]
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub quantity_in_store: Option<i64>,

    #[validate(range(min = 0, message = "Lab stock cannot be negative"))]
    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub lab_stock: Option<i64>,

    #[validate(length(max = 255, message = "Load out location cannot exceed 255 characters"))]
    pub load_out_location: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_int")]
    pub closing_balance: Option<i64>,

    #[validate(length(max = 100, message = "Status cannot exceed 100 characters"))]
    pub status: Option<String>,

    #[validate(length(max = 100, message = "Calibration status cannot exceed 100 characters"))]
    pub calibration_status: Option<String>,

    #[validate(length(max = 100, message = "Equipment status cannot exceed 100 characters"))]
    pub equipment_status: Option<String>,

    pub category: Option<String>,

    #[validate(length(max = 1000, message = "Remarks cannot exceed 1000 characters"))]
    pub remarks: Option<String>,
}

impl RecordForm {
    fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Name => &self.name,
            Field::Description => &self.description,
            Field::Size => &self.size,
            Field::LoadOutLocation => &self.load_out_location,
            Field::Status => &self.status,
            Field::CalibrationStatus => &self.calibration_status,
            Field::EquipmentStatus => &self.equipment_status,
            Field::Category => &self.category,
            Field::Remarks => &self.remarks,
            _ => return None,
        };
        value.as_deref()
    }

    fn integer(&self, field: Field) -> Option<i64> {
        match field {
            Field::Stock => self.stock,
            Field::QuantityInStore => self.quantity_in_store,
            Field::LabStock => self.lab_stock,
            Field::ClosingBalance => self.closing_balance,
            _ => None,
        }
    }

    /// Builds the record for `category`. The identity check runs first so a
    /// blank name is reported before anything else and nothing is written.
    pub fn into_record(self, category: Category) -> ApiResult<InventoryRecord> {
        let identity = self.text(category.identity_field()).unwrap_or_default();
        if identity.trim().is_empty() {
            return Err(ApiError::ValidationError(
                category.identity_required_message().to_string(),
            ));
        }

        self.validate()?;

        let mut record = InventoryRecord::blank(category);
        for field in Field::for_category(category) {
            if field.is_numeric() {
                record.set_integer(field, self.integer(field).unwrap_or(0));
            } else if field == Field::Category {
                let chosen = self
                    .text(field)
                    .and_then(EquipmentCategory::from_cell)
                    .unwrap_or_default();
                record.set_equipment_category(chosen);
            } else {
                record.assign(field, self.text(field).unwrap_or_default());
            }
        }

        Ok(record.normalize())
    }
}
