//! Ordered set of supported locales.

use std::collections::HashSet;

/// Registered locales in insertion order, with O(1) membership.
#[derive(Debug, Clone, Default)]
pub struct LocaleRegistry {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl LocaleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `locale`, returning `false` if it was already registered.
    pub fn insert(&mut self, locale: &str) -> bool {
        if !self.members.insert(locale.to_string()) {
            return false;
        }
        self.ordered.push(locale.to_string());
        true
    }

    #[must_use]
    pub fn contains(&self, locale: &str) -> bool {
        self.members.contains(locale)
    }

    /// Locales in registration order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for LocaleRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut registry = Self::new();
        for locale in iter {
            registry.insert(locale.as_ref());
        }
        registry
    }
}
