// src/store/live.rs - Live ordered listing of one category

use std::sync::Arc;

use super::{ChangeFeed, RecordStore, StoreError, StoreResult};
use crate::models::{Category, Field, StoredRecord};

/// Subscription handle owned by the presentation layer. The first `next()`
/// yields the current listing; every later call waits for a mutation of the
/// category and yields the listing again. `cancel()` ends the stream.
pub struct LiveListing {
    store: Arc<dyn RecordStore>,
    category: Category,
    order_by: Field,
    feed: Option<ChangeFeed>,
    primed: bool,
}

impl LiveListing {
    pub fn start(store: Arc<dyn RecordStore>, category: Category, order_by: &str) -> StoreResult<Self> {
        let order_by = Field::sortable(category, order_by).ok_or_else(|| StoreError::UnknownField {
            category,
            field: order_by.to_string(),
        })?;
        // Subscribe before the first read so no mutation falls in between.
        let feed = store.subscribe(category);
        log::debug!("Live listing of {} started, ordered by {}", category.collection(), order_by);
        Ok(Self { store, category, order_by, feed: Some(feed), primed: false })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.feed.is_some()
    }

    pub fn cancel(&mut self) {
        if self.feed.take().is_some() {
            log::debug!("Live listing of {} cancelled", self.category.collection());
        }
    }

    /// Next listing snapshot, or `None` once cancelled or the store is gone.
    pub async fn next(&mut self) -> Option<StoreResult<Vec<StoredRecord>>> {
        let feed = self.feed.as_mut()?;
        if self.primed {
            if !feed.changed().await {
                self.feed = None;
                return None;
            }
        } else {
            self.primed = true;
        }
        Some(self.store.list_ordered_by(self.category, self.order_by.as_ref()).await)
    }
}
