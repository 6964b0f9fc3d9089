// src/workbook/import.rs - Persisting parsed workbook sections

use serde::Serialize;

use super::grid::SheetGrid;
use super::parse::{parse_sections, ParsedSection};
use super::CodecError;
use crate::models::Category;
use crate::store::RecordStore;

/// What happened to one category during an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryOutcome {
    pub category: Category,
    pub found: bool,
    pub parsed: usize,
    pub skipped_without_identity: usize,
    pub inserted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoryOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub sheet: String,
    pub categories: Vec<CategoryOutcome>,
}

impl ImportReport {
    pub fn total_inserted(&self) -> usize {
        self.categories.iter().map(|c| c.inserted).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CategoryOutcome> {
        self.categories.iter().filter(|c| !c.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    #[cfg(test)]
    pub fn outcome(&self, category: Category) -> Option<&CategoryOutcome> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Writes every parsed section as one batch of new records, in category order.
/// A failed batch is recorded in its outcome and does not stop the others.
pub async fn import_grid(store: &dyn RecordStore, grid: &SheetGrid) -> ImportReport {
    let mut categories = Vec::new();

    for section in parse_sections(grid) {
        let ParsedSection { category, found, records, missing_identity_rows } = section;
        let mut outcome = CategoryOutcome {
            category,
            found,
            parsed: records.len(),
            skipped_without_identity: missing_identity_rows.len(),
            inserted: 0,
            error: None,
        };

        if !missing_identity_rows.is_empty() {
            log::warn!(
                "Skipped {} {} rows without {} (rows {:?})",
                missing_identity_rows.len(),
                category.label(),
                category.identity_field(),
                missing_identity_rows
            );
        }

        if !records.is_empty() {
            match store.batch_insert(category, records).await {
                Ok(ids) => outcome.inserted = ids.len(),
                Err(e) => {
                    log::error!("Error importing {}: {}", category.collection(), e);
                    outcome.error = Some(format!("Error importing {}. Please try again.", category.collection()));
                }
            }
        }

        categories.push(outcome);
    }

    ImportReport { sheet: grid.name().to_string(), categories }
}

/// Reads `Sheet1` (or the first sheet) of an uploaded workbook and imports it.
/// An unreadable file or one without worksheets fails before any write.
#[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
pub async fn import_workbook(store: &dyn RecordStore, bytes: &[u8]) -> Result<ImportReport, CodecError> {
    let grid = SheetGrid::open(bytes)?;
    let report = import_grid(store, &grid).await;
    log::info!(
        "Imported {} records from sheet '{}' ({} categories failed)",
        report.total_inserted(),
        report.sheet,
        report.failures().count()
    );
    Ok(report)
}
