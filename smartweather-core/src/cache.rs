use std::collections::{HashMap, HashSet};

use crate::display::DisplayState;
use crate::model::CityKey;

/// Most recent successfully-loaded display state per favorite city, so
/// paging back to an already-seen city renders without a refetch.
///
/// Callers store loaded states only; loading and error states stay out so
/// a transient failure never shadows good data.
#[derive(Debug, Default)]
pub struct FavoriteStateCache {
    entries: HashMap<CityKey, DisplayState>,
}

impl FavoriteStateCache {
    pub fn put(&mut self, key: CityKey, state: DisplayState) {
        self.entries.insert(key, state);
    }

    pub fn get(&self, key: &CityKey) -> Option<&DisplayState> {
        self.entries.get(key)
    }

    /// Drop every entry whose key is no longer in the favorites set.
    pub fn prune(&mut self, valid_keys: &HashSet<CityKey>) {
        self.entries.retain(|key, _| valid_keys.contains(key));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
