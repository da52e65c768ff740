//! Bounded cache of resolved translation strings.

use std::collections::{
    HashMap,
    VecDeque,
};

use crate::interpolate::Params;

/// Hit / miss counters and occupancy of a [`ResultCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub max_size: usize,
}

/// Size-bounded map from `(locale, key, params)` to the resolved string.
///
/// Eviction is first-in first-out: when full, the oldest inserted entry is
/// dropped. Reads do not promote entries. There is no TTL; callers clear the
/// cache whenever the data behind it changes.
#[derive(Debug)]
pub struct ResultCache {
    entries: HashMap<String, String>,
    /// Keys in insertion order, oldest first.
    order: VecDeque<String>,
    max_size: usize,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    /// Creates a cache holding at most `max_size` entries.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_size,
            hits: 0,
            misses: 0,
        }
    }

    /// Builds the composite key for a lookup.
    ///
    /// Parameters are encoded key-ordered; `None` and an empty map are kept
    /// distinct.
    #[must_use]
    pub fn compose_key(locale: &str, key: &str, params: Option<&Params>) -> String {
        let params = params.map_or_else(|| "-".to_string(), encode_params);
        format!("{locale}\u{1f}{key}\u{1f}{params}")
    }

    pub fn get(&mut self, cache_key: &str) -> Option<String> {
        if let Some(value) = self.entries.get(cache_key) {
            self.hits += 1;
            Some(value.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    /// Inserts `value` unless the key is already present.
    pub fn insert(&mut self, cache_key: String, value: String) {
        if self.max_size == 0 || self.entries.contains_key(&cache_key) {
            return;
        }

        while self.entries.len() >= self.max_size {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }

        self.order.push_back(cache_key.clone());
        self.entries.insert(cache_key, value);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, cache_key: &str) -> bool {
        self.entries.contains_key(cache_key)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
            max_size: self.max_size,
        }
    }
}

/// Writes each value as `(name, tag, display)`. Plain JSON would print NaN
/// and both infinities as `null`.
fn encode_params(params: &Params) -> String {
    let entries: Vec<(&str, char, String)> = params
        .iter()
        .map(|(name, value)| (name.as_str(), value.type_tag(), value.to_string()))
        .collect();
    serde_json::to_string(&entries).unwrap_or_default()
}
