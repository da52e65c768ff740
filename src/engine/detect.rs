//! Initial locale detection.

use super::locale::LocaleRegistry;

/// Environment variables consulted, most specific first.
const LOCALE_ENV_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

/// Where the engine looks for the user's preferred locale when `autoDetect`
/// is on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LocaleSource {
    /// Explicit preference list, most preferred first.
    Preferred(Vec<String>),
    /// `LC_ALL`, `LC_MESSAGES`, then `LANG`.
    #[default]
    Environment,
    /// Detection always fails.
    None,
}

impl LocaleSource {
    /// Returns the first candidate that maps onto a registered locale.
    #[must_use]
    pub fn detect(&self, registry: &LocaleRegistry) -> Option<String> {
        match self {
            Self::Preferred(candidates) => {
                candidates.iter().find_map(|candidate| match_registered(candidate, registry))
            }
            Self::Environment => detect_with(registry, |name| std::env::var(name).ok()),
            Self::None => None,
        }
    }
}

/// Environment detection over an injectable variable lookup.
fn detect_with(
    registry: &LocaleRegistry,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    LOCALE_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .filter_map(|value| normalize_posix_locale(&value))
        .find_map(|candidate| match_registered(&candidate, registry))
}

/// `zh_CN.UTF-8@pinyin` -> `zh-CN`. `C` and `POSIX` carry no preference.
fn normalize_posix_locale(value: &str) -> Option<String> {
    let base = value.split(['.', '@']).next().unwrap_or_default().trim();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return None;
    }
    Some(base.replace('_', "-"))
}

/// Exact match, then case-insensitive, then same primary language subtag.
fn match_registered(candidate: &str, registry: &LocaleRegistry) -> Option<String> {
    if registry.contains(candidate) {
        return Some(candidate.to_string());
    }

    let locales = registry.as_slice();
    if let Some(found) = locales.iter().find(|l| l.eq_ignore_ascii_case(candidate)) {
        return Some(found.clone());
    }

    let language = primary_subtag(candidate);
    locales.iter().find(|l| primary_subtag(l).eq_ignore_ascii_case(language)).cloned()
}

fn primary_subtag(locale: &str) -> &str {
    locale.split(['-', '_']).next().unwrap_or(locale)
}
