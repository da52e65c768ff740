//! Nested translation trees and the safe merge used to load them.

use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
    Serializer,
};
use serde_json::Value;

use crate::error::I18nError;

/// Key names that are never stored in a tree.
///
/// Payloads written for JavaScript runtimes may carry these to corrupt shared
/// object structure; they are dropped on merge.
pub const DANGEROUS_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Returns true if `key` is one of [`DANGEROUS_KEYS`].
#[must_use]
pub fn is_dangerous_key(key: &str) -> bool {
    DANGEROUS_KEYS.contains(&key)
}

/// A single node of a translation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// A translatable string.
    Leaf(String),
    /// A nested group of keys.
    Node(TranslationTree),
}

impl TreeNode {
    /// Returns the leaf string, or `None` for a nested node.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Node(_) => None,
        }
    }
}

impl From<&str> for TreeNode {
    fn from(value: &str) -> Self {
        Self::Leaf(value.to_string())
    }
}

impl From<String> for TreeNode {
    fn from(value: String) -> Self {
        Self::Leaf(value)
    }
}

impl From<TranslationTree> for TreeNode {
    fn from(value: TranslationTree) -> Self {
        Self::Node(value)
    }
}

/// Recursively nested mapping from key segment to string or subtree.
///
/// Deserialization goes through [`serde_json::Value`]: numbers and booleans
/// become their string form, arrays become nodes keyed by index, and `null`
/// is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Value")]
pub struct TranslationTree {
    entries: BTreeMap<String, TreeNode>,
}

impl Serialize for TranslationTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl TryFrom<Value> for TranslationTree {
    type Error = I18nError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => {
                let mut tree = Self::new();
                for (key, value) in map {
                    if let Some(node) = node_from_value(value) {
                        tree.entries.insert(key, node);
                    }
                }
                Ok(tree)
            }
            Value::Array(_) => Err(I18nError::InvalidBundle("an array")),
            Value::String(_) => Err(I18nError::InvalidBundle("a string")),
            Value::Number(_) => Err(I18nError::InvalidBundle("a number")),
            Value::Bool(_) => Err(I18nError::InvalidBundle("a boolean")),
            Value::Null => Err(I18nError::InvalidBundle("null")),
        }
    }
}

/// Converts a JSON value below the top level into a tree node.
fn node_from_value(value: Value) -> Option<TreeNode> {
    match value {
        Value::String(s) => Some(TreeNode::Leaf(s)),
        Value::Number(n) => Some(TreeNode::Leaf(n.to_string())),
        Value::Bool(b) => Some(TreeNode::Leaf(b.to_string())),
        Value::Null => None,
        Value::Array(items) => {
            let mut tree = TranslationTree::new();
            for (index, item) in items.into_iter().enumerate() {
                if let Some(node) = node_from_value(item) {
                    tree.entries.insert(index.to_string(), node);
                }
            }
            Some(TreeNode::Node(tree))
        }
        Value::Object(_) => TranslationTree::try_from(value).ok().map(TreeNode::Node),
    }
}

impl<K, V> FromIterator<(K, V)> for TranslationTree
where
    K: Into<String>,
    V: Into<TreeNode>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl TranslationTree {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Parses a JSON document into a tree.
    ///
    /// # Errors
    /// Fails on malformed JSON or when the document is not an object.
    pub fn from_json_str(text: &str) -> Result<Self, I18nError> {
        let value: Value = serde_json::from_str(text)?;
        Self::try_from(value)
    }

    /// Returns the child node stored under a single segment.
    #[must_use]
    pub fn get(&self, segment: &str) -> Option<&TreeNode> {
        self.entries.get(segment)
    }

    /// Inserts a node directly, bypassing the dangerous-key filter.
    ///
    /// Use [`merge`](Self::merge) for untrusted data.
    pub fn insert(&mut self, segment: impl Into<String>, node: impl Into<TreeNode>) {
        self.entries.insert(segment.into(), node.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the direct children of this node.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deep-merges `source` into `self`.
    ///
    /// Keys in [`DANGEROUS_KEYS`] are skipped without descending into them.
    /// Two nested nodes are merged recursively; every other combination
    /// overwrites the target value.
    pub fn merge(&mut self, source: Self) {
        for (key, value) in source.entries {
            if is_dangerous_key(&key) {
                tracing::warn!(key = %key, "Dropping dangerous key during merge");
                continue;
            }

            match value {
                TreeNode::Node(nested) => match self.entries.get_mut(&key) {
                    Some(TreeNode::Node(target)) => target.merge(nested),
                    _ => {
                        // Rebuild through merge so nested dangerous keys are filtered too.
                        let mut fresh = Self::new();
                        fresh.merge(nested);
                        self.entries.insert(key, TreeNode::Node(fresh));
                    }
                },
                leaf @ TreeNode::Leaf(_) => {
                    self.entries.insert(key, leaf);
                }
            }
        }
    }

    /// Flattens the tree into `(dotted key, value)` pairs in key order.
    ///
    /// # Examples
    /// ```
    /// use i18n_engine::tree::TranslationTree;
    ///
    /// let tree = TranslationTree::from_json_str(
    ///     r#"{"common": {"hello": "Hello", "bye": "Bye"}, "title": "Home"}"#,
    /// )
    /// .unwrap();
    ///
    /// let flat = tree.flatten();
    /// assert_eq!(flat[0], ("common.bye".to_string(), "Bye".to_string()));
    /// assert_eq!(flat[2], ("title".to_string(), "Home".to_string()));
    /// ```
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut result = Vec::new();
        self.flatten_into(None, &mut result);
        result
    }

    fn flatten_into(&self, prefix: Option<&str>, result: &mut Vec<(String, String)>) {
        for (key, node) in &self.entries {
            let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}.{key}"));
            match node {
                TreeNode::Leaf(value) => result.push((full_key, value.clone())),
                TreeNode::Node(tree) => tree.flatten_into(Some(&full_key), result),
            }
        }
    }
}
