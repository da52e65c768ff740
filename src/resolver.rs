//! Dotted key parsing and nested lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::tree::{
    TranslationTree,
    TreeNode,
};

/// Separator between key segments. There is no escape for literal dots.
pub const KEY_SEPARATOR: char = '.';

/// Maximum number of distinct keys whose segment lists are memoized.
pub const MAX_PATH_CACHE_SIZE: usize = 1000;

/// Resolves dotted keys against translation trees.
///
/// Parsed segment lists are memoized until [`MAX_PATH_CACHE_SIZE`] distinct
/// keys have been seen; later keys are split on every call instead.
#[derive(Debug, Default)]
pub struct KeyResolver {
    /// Full key -> segments.
    path_cache: HashMap<String, Arc<[String]>>,
}

impl KeyResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the segments of `key`, memoizing while under capacity.
    pub fn segments(&mut self, key: &str) -> Arc<[String]> {
        if let Some(segments) = self.path_cache.get(key) {
            return Arc::clone(segments);
        }

        let segments: Arc<[String]> = key.split(KEY_SEPARATOR).map(str::to_string).collect();
        if self.path_cache.len() < MAX_PATH_CACHE_SIZE {
            self.path_cache.insert(key.to_string(), Arc::clone(&segments));
        }
        segments
    }

    /// Looks up the leaf string at `key`.
    ///
    /// Returns `None` when any segment is missing or when the path ends on a
    /// nested node rather than a string.
    pub fn resolve<'t>(&mut self, key: &str, tree: &'t TranslationTree) -> Option<&'t str> {
        let segments = self.segments(key);
        walk(tree, &segments)
    }

    /// Number of memoized keys.
    #[must_use]
    pub fn cached_paths(&self) -> usize {
        self.path_cache.len()
    }
}

/// Walks `segments` from the root of `tree`.
fn walk<'t>(tree: &'t TranslationTree, segments: &[String]) -> Option<&'t str> {
    let (last, parents) = segments.split_last()?;

    let mut current = tree;
    for segment in parents {
        match current.get(segment)? {
            TreeNode::Node(next) => current = next,
            TreeNode::Leaf(_) => return None,
        }
    }

    current.get(last).and_then(TreeNode::as_leaf)
}
