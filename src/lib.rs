//! i18n-engine
//!
//! Translation lookup with locale fallback, `{name}` interpolation, a bounded
//! result cache and a persistent cache for fetched translation bundles.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod format;
pub mod global;
pub mod interpolate;
pub mod resolver;
pub mod tree;

pub use engine::Engine;
pub use error::I18nError;
pub use interpolate::{
    ParamValue,
    Params,
};
pub use tree::TranslationTree;
