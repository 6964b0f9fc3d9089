// src/models/record.rs
//! Inventory records: one tagged variant per category over a shared set of
//! stock counters, plus the `Field` table the workbook codec maps columns to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

// ==================== CATEGORY ====================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Reagent,
    Equipment,
    Consumable,
    Glassware,
}

impl Category {
    /// Categories in canonical order (reagent, equipment, consumable, glassware).
    pub fn all() -> impl Iterator<Item = Category> {
        Category::iter()
    }

    /// Name of the collection the records of this category live in.
    pub const fn collection(self) -> &'static str {
        match self {
            Category::Reagent => "reagents",
            Category::Equipment => "equipment",
            Category::Consumable => "consumables",
            Category::Glassware => "glasswares",
        }
    }

    pub const fn identity_field(self) -> Field {
        match self {
            Category::Reagent => Field::Name,
            _ => Field::Description,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Category::Reagent => "Reagent",
            Category::Equipment => "Equipment",
            Category::Consumable => "Consumable",
            Category::Glassware => "Glassware",
        }
    }

    /// Accepts either the singular category name or its collection name.
    pub fn from_path(segment: &str) -> Option<Self> {
        let segment = segment.trim().to_lowercase();
        Category::all().find(|c| c.as_ref() == segment || c.collection() == segment)
    }

    /// Message surfaced when the identity field of a submitted record is blank.
    pub const fn identity_required_message(self) -> &'static str {
        match self {
            Category::Reagent => "Reagent name is required!",
            _ => "Description is required!",
        }
    }
}

// ==================== EQUIPMENT CATEGORY ====================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Calibration,
    #[default]
    General,
}

impl EquipmentCategory {
    /// Reads a category cell or form value. Accepts the display labels
    /// ("Calibration Equipment") as well as the stored keys.
    pub fn from_cell(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            None
        } else if lowered.contains("calibration") {
            Some(EquipmentCategory::Calibration)
        } else if lowered.contains("general") {
            Some(EquipmentCategory::General)
        } else {
            None
        }
    }

    /// Category for rows that carry no usable category value: calibration
    /// when the description mentions it or a calibration status is present.
    pub fn infer(description: &str, calibration_status: &str) -> Self {
        if description.to_lowercase().contains("calibration") || !calibration_status.trim().is_empty() {
            EquipmentCategory::Calibration
        } else {
            EquipmentCategory::General
        }
    }

    pub const fn display_label(self) -> &'static str {
        match self {
            EquipmentCategory::Calibration => "Calibration Equipment",
            EquipmentCategory::General => "General Equipment",
        }
    }
}

// ==================== FIELDS ====================

/// Every named field a record can carry. The string form is the document key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Field {
    Name,
    Description,
    Size,
    Stock,
    QuantityInStore,
    LabStock,
    LoadOutLocation,
    ClosingBalance,
    Status,
    CalibrationStatus,
    EquipmentStatus,
    Category,
    Remarks,
}

impl Field {
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::Stock | Field::QuantityInStore | Field::LabStock | Field::ClosingBalance
        )
    }

    /// Counters that may never drop below zero. Closing balance may go
    /// negative to flag a shortage.
    pub const fn is_non_negative(self) -> bool {
        matches!(self, Field::Stock | Field::QuantityInStore | Field::LabStock)
    }

    pub fn applies_to(self, category: Category) -> bool {
        match self {
            Field::Stock | Field::LabStock | Field::LoadOutLocation | Field::ClosingBalance | Field::Remarks => true,
            Field::Name | Field::Size => category == Category::Reagent,
            Field::Description | Field::QuantityInStore => category != Category::Reagent,
            Field::Status => category != Category::Equipment,
            Field::CalibrationStatus | Field::EquipmentStatus | Field::Category => {
                category == Category::Equipment
            }
        }
    }

    /// Fields whose free text feeds the status severity classifier.
    pub const fn is_status(self) -> bool {
        matches!(self, Field::Status | Field::CalibrationStatus | Field::EquipmentStatus)
    }

    pub fn for_category(category: Category) -> impl Iterator<Item = Field> {
        Field::iter().filter(move |f| f.applies_to(category))
    }

    /// Resolves a document key that a listing of `category` may be ordered by.
    pub fn sortable(category: Category, key: &str) -> Option<Field> {
        key.parse::<Field>().ok().filter(|f| f.applies_to(category))
    }
}

/// Scalar value of a single record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
}

impl CellValue {
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(n) => n.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(i64::from(value))
    }
}

/// Integer parsing with the leniency of a form field: leading whitespace and
/// an optional sign, then as many digits as are present ("12 units" -> 12,
/// "3.7" -> 3). Returns `None` when no digit leads the text.
pub fn parse_int_lenient(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Counter value of a submitted JSON value. Numbers are truncated, text is
/// parsed with `parse_int_lenient`, anything unparseable is 0.
pub fn int_from_json(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => parse_int_lenient(s).unwrap_or(0),
        _ => 0,
    }
}

/// `deserialize_with` for optional counters in request bodies: accepts a
/// number or text, `null` stays absent.
pub fn deserialize_lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| int_from_json(&v)))
}

// ==================== RECORDS ====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetails {
    #[serde(rename_all = "camelCase")]
    Reagent {
        name: String,
        #[serde(default)]
        size: String,
        #[serde(default)]
        status: String,
    },
    #[serde(rename_all = "camelCase")]
    Equipment {
        description: String,
        #[serde(default)]
        quantity_in_store: i64,
        #[serde(default)]
        category: EquipmentCategory,
        #[serde(default)]
        calibration_status: String,
        #[serde(default)]
        equipment_status: String,
    },
    #[serde(rename_all = "camelCase")]
    Consumable {
        description: String,
        #[serde(default)]
        quantity_in_store: i64,
        #[serde(default)]
        status: String,
    },
    #[serde(rename_all = "camelCase")]
    Glassware {
        description: String,
        #[serde(default)]
        quantity_in_store: i64,
        #[serde(default)]
        status: String,
    },
}

impl RecordDetails {
    pub fn blank(category: Category) -> Self {
        match category {
            Category::Reagent => RecordDetails::Reagent {
                name: String::new(),
                size: String::new(),
                status: String::new(),
            },
            Category::Equipment => RecordDetails::Equipment {
                description: String::new(),
                quantity_in_store: 0,
                category: EquipmentCategory::General,
                calibration_status: String::new(),
                equipment_status: String::new(),
            },
            Category::Consumable => RecordDetails::Consumable {
                description: String::new(),
                quantity_in_store: 0,
                status: String::new(),
            },
            Category::Glassware => RecordDetails::Glassware {
                description: String::new(),
                quantity_in_store: 0,
                status: String::new(),
            },
        }
    }

    pub fn category(&self) -> Category {
        match self {
            RecordDetails::Reagent { .. } => Category::Reagent,
            RecordDetails::Equipment { .. } => Category::Equipment,
            RecordDetails::Consumable { .. } => Category::Consumable,
            RecordDetails::Glassware { .. } => Category::Glassware,
        }
    }
}

/// A single inventory item as stored in its category's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    #[serde(flatten)]
    pub details: RecordDetails,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub lab_stock: i64,
    #[serde(default)]
    pub load_out_location: String,
    #[serde(default)]
    pub closing_balance: i64,
    #[serde(default)]
    pub remarks: String,
}

impl InventoryRecord {
    pub fn blank(category: Category) -> Self {
        Self {
            details: RecordDetails::blank(category),
            stock: 0,
            lab_stock: 0,
            load_out_location: String::new(),
            closing_balance: 0,
            remarks: String::new(),
        }
    }

    /// Blank record of `category` with its identity field set.
    pub fn named(category: Category, identity: &str) -> Self {
        Self::blank(category).with(category.identity_field(), identity)
    }

    pub fn category(&self) -> Category {
        self.details.category()
    }

    pub fn identity(&self) -> &str {
        match &self.details {
            RecordDetails::Reagent { name, .. } => name,
            RecordDetails::Equipment { description, .. }
            | RecordDetails::Consumable { description, .. }
            | RecordDetails::Glassware { description, .. } => description,
        }
    }

    pub fn has_identity(&self) -> bool {
        !self.identity().trim().is_empty()
    }

    pub fn equipment_category(&self) -> Option<EquipmentCategory> {
        match &self.details {
            RecordDetails::Equipment { category, .. } => Some(*category),
            _ => None,
        }
    }

    pub fn set_equipment_category(&mut self, value: EquipmentCategory) {
        if let RecordDetails::Equipment { category, .. } = &mut self.details {
            *category = value;
        }
    }

    /// Current value of `field`, or `None` when the field does not belong to
    /// this record's category.
    pub fn cell(&self, field: Field) -> Option<CellValue> {
        if field.is_numeric() {
            return self.integer_slot(field).map(CellValue::Integer);
        }
        if field == Field::Category {
            return self.equipment_category().map(|c| CellValue::Text(c.as_ref().to_string()));
        }
        self.text_slot(field).map(|s| CellValue::Text(s.to_string()))
    }

    /// Writes raw cell/form text into `field`: numbers are parsed leniently and
    /// fall back to 0, text is trimmed. Returns false for foreign fields.
    pub fn assign(&mut self, field: Field, raw: &str) -> bool {
        if field.is_numeric() {
            return self.set_integer(field, parse_int_lenient(raw).unwrap_or(0));
        }
        if field == Field::Category {
            return match (EquipmentCategory::from_cell(raw), &mut self.details) {
                (Some(value), RecordDetails::Equipment { category, .. }) => {
                    *category = value;
                    true
                }
                _ => false,
            };
        }
        match self.text_slot_mut(field) {
            Some(slot) => {
                *slot = raw.trim().to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_integer(&mut self, field: Field, value: i64) -> bool {
        match self.integer_slot_mut(field) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Builder form of `assign` / `set_integer`.
    pub fn with(mut self, field: Field, value: impl Into<CellValue>) -> Self {
        match value.into() {
            CellValue::Integer(n) => {
                self.set_integer(field, n);
            }
            CellValue::Text(s) => {
                self.assign(field, &s);
            }
        }
        self
    }

    /// Status-like fields that carry text, in column order.
    pub fn statuses(&self) -> Vec<(Field, &str)> {
        Field::for_category(self.category())
            .filter(|f| f.is_status())
            .filter_map(|f| self.text_slot(f).map(|s| (f, s)))
            .collect()
    }

    /// Applies the record invariants: trimmed text, non-negative counters and
    /// no calibration status outside the calibration category.
    pub fn normalize(mut self) -> Self {
        for field in Field::for_category(self.category()) {
            if field.is_non_negative() {
                if let Some(slot) = self.integer_slot_mut(field) {
                    *slot = (*slot).max(0);
                }
            } else if let Some(slot) = self.text_slot_mut(field) {
                let trimmed = slot.trim();
                if trimmed.len() != slot.len() {
                    *slot = trimmed.to_string();
                }
            }
        }
        if let RecordDetails::Equipment { category: EquipmentCategory::General, calibration_status, .. } =
            &mut self.details
        {
            calibration_status.clear();
        }
        self
    }

    pub fn to_document(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!("record serialized to {}", other))),
        }
    }

    fn text_slot(&self, field: Field) -> Option<&str> {
        let slot = match (&self.details, field) {
            (RecordDetails::Reagent { name, .. }, Field::Name) => name,
            (RecordDetails::Reagent { size, .. }, Field::Size) => size,
            (RecordDetails::Reagent { status, .. }, Field::Status)
            | (RecordDetails::Consumable { status, .. }, Field::Status)
            | (RecordDetails::Glassware { status, .. }, Field::Status) => status,
            (RecordDetails::Equipment { description, .. }, Field::Description)
            | (RecordDetails::Consumable { description, .. }, Field::Description)
            | (RecordDetails::Glassware { description, .. }, Field::Description) => description,
            (RecordDetails::Equipment { calibration_status, .. }, Field::CalibrationStatus) => calibration_status,
            (RecordDetails::Equipment { equipment_status, .. }, Field::EquipmentStatus) => equipment_status,
            (_, Field::LoadOutLocation) => &self.load_out_location,
            (_, Field::Remarks) => &self.remarks,
            _ => return None,
        };
        Some(slot.as_str())
    }

    fn text_slot_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::LoadOutLocation => return Some(&mut self.load_out_location),
            Field::Remarks => return Some(&mut self.remarks),
            _ => {}
        }
        match (&mut self.details, field) {
            (RecordDetails::Reagent { name, .. }, Field::Name) => Some(name),
            (RecordDetails::Reagent { size, .. }, Field::Size) => Some(size),
            (RecordDetails::Reagent { status, .. }, Field::Status)
            | (RecordDetails::Consumable { status, .. }, Field::Status)
            | (RecordDetails::Glassware { status, .. }, Field::Status) => Some(status),
            (RecordDetails::Equipment { description, .. }, Field::Description)
            | (RecordDetails::Consumable { description, .. }, Field::Description)
            | (RecordDetails::Glassware { description, .. }, Field::Description) => Some(description),
            (RecordDetails::Equipment { calibration_status, .. }, Field::CalibrationStatus) => {
                Some(calibration_status)
            }
            (RecordDetails::Equipment { equipment_status, .. }, Field::EquipmentStatus) => {
                Some(equipment_status)
            }
            _ => None,
        }
    }

    fn integer_slot(&self, field: Field) -> Option<i64> {
        match field {
            Field::Stock => Some(self.stock),
            Field::LabStock => Some(self.lab_stock),
            Field::ClosingBalance => Some(self.closing_balance),
            Field::QuantityInStore => match &self.details {
                RecordDetails::Equipment { quantity_in_store, .. }
                | RecordDetails::Consumable { quantity_in_store, .. }
                | RecordDetails::Glassware { quantity_in_store, .. } => Some(*quantity_in_store),
                RecordDetails::Reagent { .. } => None,
            },
            _ => None,
        }
    }

    fn integer_slot_mut(&mut self, field: Field) -> Option<&mut i64> {
        match field {
            Field::Stock => Some(&mut self.stock),
            Field::LabStock => Some(&mut self.lab_stock),
            Field::ClosingBalance => Some(&mut self.closing_balance),
            Field::QuantityInStore => match &mut self.details {
                RecordDetails::Equipment { quantity_in_store, .. }
                | RecordDetails::Consumable { quantity_in_store, .. }
                | RecordDetails::Glassware { quantity_in_store, .. } => Some(quantity_in_store),
                RecordDetails::Reagent { .. } => None,
            },
            _ => None,
        }
    }
}

// ==================== STORED RECORDS & PATCHES ====================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: InventoryRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update merged key by key into a stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPatch(pub Map<String, Value>);

impl RecordPatch {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn set(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.0.insert(field.as_ref().to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges the patch over `base`. The category tag is never taken from the
    /// patch and the merged record must keep a non-empty identity.
    pub fn apply(&self, base: &InventoryRecord) -> Result<InventoryRecord, String> {
        let mut document = base.to_document().map_err(|e| e.to_string())?;
        for (key, value) in &self.0 {
            if key == "kind" {
                continue;
            }
            let value = match key.parse::<Field>() {
                Ok(field) if field.is_numeric() => Value::from(int_from_json(value)),
                _ => value.clone(),
            };
            document.insert(key.clone(), value);
        }
        let merged: InventoryRecord =
            serde_json::from_value(Value::Object(document)).map_err(|e| e.to_string())?;
        if !merged.has_identity() {
            return Err(merged.category().identity_required_message().to_string());
        }
        Ok(merged.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_paths_and_order() {
        let order: Vec<Category> = Category::all().collect();
        assert_eq!(
            order,
            vec![Category::Reagent, Category::Equipment, Category::Consumable, Category::Glassware]
        );
        assert_eq!(Category::from_path("glasswares"), Some(Category::Glassware));
        assert_eq!(Category::from_path("Reagent"), Some(Category::Reagent));
        assert_eq!(Category::from_path("chemicals"), None);
        assert_eq!(Category::Equipment.identity_field(), Field::Description);
    }

    #[test]
    fn test_lenient_integer_parsing() {
        assert_eq!(parse_int_lenient("42"), Some(42));
        assert_eq!(parse_int_lenient("  -7"), Some(-7));
        assert_eq!(parse_int_lenient("3.9"), Some(3));
        assert_eq!(parse_int_lenient("12 bottles"), Some(12));
        assert_eq!(parse_int_lenient("N/A"), None);
        assert_eq!(parse_int_lenient(""), None);
        assert_eq!(parse_int_lenient("-"), None);
    }

    #[test]
    fn test_assign_degrades_bad_numbers_to_zero() {
        let mut record = InventoryRecord::named(Category::Consumable, "Test Tubes");
        assert!(record.assign(Field::Stock, "lots"));
        assert!(record.assign(Field::QuantityInStore, "15"));
        assert_eq!(record.stock, 0);
        assert_eq!(record.cell(Field::QuantityInStore), Some(CellValue::Integer(15)));
    }

    #[test]
    fn test_foreign_fields_are_rejected() {
        let mut reagent = InventoryRecord::named(Category::Reagent, "Ethanol");
        assert!(!reagent.assign(Field::QuantityInStore, "3"));
        assert!(!reagent.assign(Field::Description, "x"));
        assert_eq!(reagent.cell(Field::CalibrationStatus), None);
        assert_eq!(reagent.identity(), "Ethanol");
    }

    #[test]
    fn test_normalize_gates_calibration_status() {
        let general = InventoryRecord::named(Category::Equipment, "Hot Plate")
            .with(Field::Category, "general")
            .with(Field::CalibrationStatus, "UP TO DATE")
            .with(Field::Stock, -4)
            .with(Field::ClosingBalance, -2)
            .normalize();
        assert_eq!(general.cell(Field::CalibrationStatus), Some(CellValue::Text(String::new())));
        assert_eq!(general.stock, 0);
        assert_eq!(general.closing_balance, -2);

        let calibration = InventoryRecord::named(Category::Equipment, "Weight Set")
            .with(Field::Category, "calibration")
            .with(Field::CalibrationStatus, "Due Soon")
            .normalize();
        assert_eq!(calibration.cell(Field::CalibrationStatus), Some(CellValue::Text("Due Soon".into())));
    }

    #[test]
    fn test_document_keys_are_camel_case() {
        let record = InventoryRecord::named(Category::Glassware, "Beakers 250ml")
            .with(Field::QuantityInStore, 10)
            .with(Field::LoadOutLocation, "Lab A");
        let document = record.to_document().unwrap();
        assert_eq!(document["kind"], "glassware");
        assert_eq!(document["description"], "Beakers 250ml");
        assert_eq!(document["quantityInStore"], 10);
        assert_eq!(document["loadOutLocation"], "Lab A");

        let back: InventoryRecord = serde_json::from_value(Value::Object(document)).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_missing_numbers_default_to_zero() {
        let record: InventoryRecord =
            serde_json::from_str(r#"{"kind":"reagent","name":"Acetone"}"#).unwrap();
        assert_eq!(record.stock, 0);
        assert_eq!(record.closing_balance, 0);
        assert_eq!(record.cell(Field::Size), Some(CellValue::Text(String::new())));
    }

    #[test]
    fn test_patch_keeps_kind_and_identity() {
        let base = InventoryRecord::named(Category::Reagent, "Acetone").with(Field::Stock, 4);
        let patch = RecordPatch::new()
            .set(Field::Stock, 9)
            .set(Field::Status, "Low Stock");
        let mut raw = patch.clone();
        raw.0.insert("kind".into(), Value::from("glassware"));

        let merged = raw.apply(&base).unwrap();
        assert_eq!(merged.category(), Category::Reagent);
        assert_eq!(merged.stock, 9);
        assert_eq!(merged.statuses(), vec![(Field::Status, "Low Stock")]);

        let blanking = RecordPatch::new().set(Field::Name, "  ");
        assert_eq!(blanking.apply(&base).unwrap_err(), "Reagent name is required!");
    }

    #[test]
    fn test_patch_coerces_text_counters() {
        let base = InventoryRecord::named(Category::Glassware, "Beakers 250ml").with(Field::Stock, 4);
        let mut patch = RecordPatch::new();
        patch.0.insert("stock".into(), Value::from("12 boxes"));
        patch.0.insert("labStock".into(), Value::from("abc"));
        patch.0.insert("closingBalance".into(), Value::from(-3.8));
        patch.0.insert("remarks".into(), Value::from("7"));

        let merged = patch.apply(&base).unwrap();
        assert_eq!(merged.stock, 12);
        assert_eq!(merged.lab_stock, 0);
        assert_eq!(merged.closing_balance, -3);
        assert_eq!(merged.remarks, "7");
    }

    #[test]
    fn test_int_from_json() {
        assert_eq!(int_from_json(&Value::from(5)), 5);
        assert_eq!(int_from_json(&Value::from("")), 0);
        assert_eq!(int_from_json(&Value::from(" 9 kg")), 9);
        assert_eq!(int_from_json(&Value::Bool(true)), 0);
        assert_eq!(int_from_json(&Value::Null), 0);
    }

    #[test]
    fn test_equipment_category_inference() {
        assert_eq!(EquipmentCategory::from_cell("Calibration Equipment"), Some(EquipmentCategory::Calibration));
        assert_eq!(EquipmentCategory::from_cell("GENERAL"), Some(EquipmentCategory::General));
        assert_eq!(EquipmentCategory::from_cell("misc"), None);
        assert_eq!(EquipmentCategory::infer("Calibration Weight Set", ""), EquipmentCategory::Calibration);
        assert_eq!(EquipmentCategory::infer("Digital Balance", "Due Soon"), EquipmentCategory::Calibration);
        assert_eq!(EquipmentCategory::infer("Fume Hood", ""), EquipmentCategory::General);
    }
}
