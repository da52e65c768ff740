//! The translation engine.
//!
//! # Lookup order
//!
//! `translate` consults, in order:
//! 1. the result cache (when enabled)
//! 2. the current locale's tree
//! 3. the default locale's tree, when it differs from the current one
//! 4. the configured [`FallbackBehavior`]
//!
//! # Locking
//!
//! All mutable state sits behind one mutex. It is never held across an
//! `.await` or while listeners run.

/// Initial locale detection
pub mod detect;
/// Locale-change callbacks
pub mod listeners;
/// Ordered locale set
pub mod locale;

use std::collections::HashMap;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

use chrono::{
    DateTime,
    Datelike,
    Timelike,
    Utc,
};
use futures::future::join_all;
use tokio::sync::broadcast;

pub use self::detect::LocaleSource;
pub use self::listeners::{
    ListenerSet,
    Subscription,
};
pub use self::locale::LocaleRegistry;
use crate::cache::{
    CacheStats,
    KeyValueStorage,
    PersistentBundleCache,
    ResultCache,
    open_storage,
};
use crate::config::{
    DateFormat,
    FallbackBehavior,
    I18nSettings,
    NumberFormat,
};
use crate::error::I18nError;
use crate::fetch::{
    BundleFetcher,
    HttpFetcher,
};
use crate::format::{
    self,
    DateStyle,
};
use crate::interpolate::{
    Params,
    interpolate,
};
use crate::resolver::KeyResolver;
use crate::tree::TranslationTree;

/// Capacity of the locale-change broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Broadcast after every successful locale switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleChangeEvent {
    pub locale: String,
    pub old_locale: String,
    /// The new locale's tree at the time of the switch.
    pub translations: TranslationTree,
}

#[derive(Debug)]
struct EngineState {
    registry: LocaleRegistry,
    current: String,
    table: HashMap<String, TranslationTree>,
    resolver: KeyResolver,
    results: ResultCache,
}

impl EngineState {
    fn lookup(&mut self, locale: &str, key: &str) -> Option<String> {
        let tree = self.table.get(locale)?;
        self.resolver.resolve(key, tree).map(str::to_string)
    }
}

/// Resolves keys against per-locale translation trees.
///
/// `Engine` is `Send + Sync`; share it behind an [`Arc`].
#[derive(Debug)]
pub struct Engine {
    state: Mutex<EngineState>,
    default_locale: String,
    fallback_behavior: FallbackBehavior,
    escape_html: bool,
    enable_cache: bool,
    number_format: NumberFormat,
    date_format: DateFormat,
    listeners: ListenerSet,
    events: broadcast::Sender<LocaleChangeEvent>,
    bundles: PersistentBundleCache,
    fetcher: Arc<dyn BundleFetcher>,
}

/// Builds an [`Engine`] with injected collaborators.
#[derive(Debug)]
pub struct EngineBuilder {
    settings: I18nSettings,
    storage: Option<Arc<dyn KeyValueStorage>>,
    fetcher: Option<Arc<dyn BundleFetcher>>,
    locale_source: LocaleSource,
}

impl EngineBuilder {
    /// Durable backend for the bundle cache, replacing the one named by
    /// `persistentCache.storage`. Ignored while the persistent cache is off.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Transport for [`Engine::load_translations_async`]. Defaults to
    /// [`HttpFetcher`].
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn BundleFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Where `autoDetect` looks. Defaults to the process environment.
    #[must_use]
    pub fn locale_source(mut self, source: LocaleSource) -> Self {
        self.locale_source = source;
        self
    }

    #[must_use]
    pub fn build(self) -> Engine {
        let Self { settings, storage, fetcher, locale_source } = self;

        let registry: LocaleRegistry = settings.locales.iter().collect();

        let mut table: HashMap<String, TranslationTree> = HashMap::new();
        for (locale, tree) in settings.translations {
            table.entry(locale).or_default().merge(tree);
        }

        let detected = if settings.auto_detect { locale_source.detect(&registry) } else { None };
        let current = match detected {
            Some(locale) => {
                tracing::debug!(locale = %locale, "Detected initial locale");
                locale
            }
            None => settings.default_locale.clone(),
        };

        let persistent = &settings.persistent_cache;
        let storage = if persistent.enabled {
            storage.or_else(|| open_storage(persistent.storage, persistent.directory.as_deref()))
        } else {
            None
        };
        let bundles = PersistentBundleCache::new(persistent, storage);

        let fetcher = fetcher.unwrap_or_else(|| Arc::new(HttpFetcher::new()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Engine {
            state: Mutex::new(EngineState {
                registry,
                current,
                table,
                resolver: KeyResolver::new(),
                results: ResultCache::new(settings.cache_max_size),
            }),
            default_locale: settings.default_locale,
            fallback_behavior: settings.fallback_behavior,
            escape_html: settings.escape_html,
            enable_cache: settings.enable_cache,
            number_format: settings.number_format,
            date_format: settings.date_format,
            listeners: ListenerSet::new(),
            events,
            bundles,
            fetcher,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(I18nSettings::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(settings: I18nSettings) -> Self {
        Self::builder(settings).build()
    }

    #[must_use]
    pub fn builder(settings: I18nSettings) -> EngineBuilder {
        EngineBuilder {
            settings,
            storage: None,
            fetcher: None,
            locale_source: LocaleSource::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Translates `key` in the current locale.
    ///
    /// Never fails: a key found nowhere yields the configured fallback.
    #[must_use]
    pub fn translate(&self, key: &str, params: Option<&Params>) -> String {
        let mut state = self.state();
        let current = state.current.clone();

        let cache_key = self.enable_cache.then(|| ResultCache::compose_key(&current, key, params));
        if let Some(cache_key) = &cache_key
            && let Some(hit) = state.results.get(cache_key)
        {
            return hit;
        }

        let mut resolved = state.lookup(&current, key);
        if resolved.is_none() && current != self.default_locale {
            resolved = state.lookup(&self.default_locale, key);
        }

        let Some(template) = resolved else {
            return self.missing(&mut state, key, params);
        };

        let value = interpolate(&template, params, self.escape_html);
        if let Some(cache_key) = cache_key {
            state.results.insert(cache_key, value.clone());
        }
        value
    }

    /// Alias for [`translate`](Self::translate).
    #[must_use]
    pub fn t(&self, key: &str, params: Option<&Params>) -> String {
        self.translate(key, params)
    }

    fn missing(&self, state: &mut EngineState, key: &str, params: Option<&Params>) -> String {
        tracing::debug!(key, locale = %state.current, "Translation key not found");
        match self.fallback_behavior {
            FallbackBehavior::Key => key.to_string(),
            FallbackBehavior::Empty => String::new(),
            FallbackBehavior::Default => state
                .lookup(&self.default_locale, key)
                .map_or_else(|| key.to_string(), |t| interpolate(&t, params, self.escape_html)),
        }
    }

    /// Whether `key` resolves in the current locale, without fallback.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        let mut state = self.state();
        let current = state.current.clone();
        state.lookup(&current, key).is_some()
    }

    /// Switches the current locale.
    ///
    /// Returns `true` if `locale` is now current (including when it already
    /// was) and `false` for an unregistered locale, which changes nothing.
    pub fn set_locale(&self, locale: &str) -> bool {
        let old_locale = {
            let mut state = self.state();
            if state.current == locale {
                return true;
            }
            if !state.registry.contains(locale) {
                tracing::warn!(locale, "Locale is not registered");
                return false;
            }
            if self.enable_cache {
                state.results.clear();
            }
            std::mem::replace(&mut state.current, locale.to_string())
        };

        tracing::debug!(from = %old_locale, to = locale, "Locale changed");
        self.listeners.notify(locale);

        if self.events.receiver_count() > 0 {
            let translations = self.state().table.get(locale).cloned().unwrap_or_default();
            let event = LocaleChangeEvent { locale: locale.to_string(), old_locale, translations };
            if self.events.send(event).is_err() {
                tracing::debug!("Locale change event had no receivers");
            }
        }
        true
    }

    /// Merges `data` into `locale`'s tree, creating it if needed.
    ///
    /// The locale is not added to the registry; see
    /// [`add_locale`](Self::add_locale).
    pub fn load_translations(&self, locale: &str, data: TranslationTree) {
        let mut state = self.state();
        state.table.entry(locale.to_string()).or_default().merge(data);
        if self.enable_cache {
            state.results.clear();
        }
    }

    /// Loads a bundle for `locale` from `url`.
    ///
    /// The bundle cache is consulted first; a fetched bundle is cached under
    /// the exact URL string, so changing the URL (e.g. a version query) forces
    /// a refetch.
    ///
    /// # Errors
    /// - [`I18nError::Network`] on a non-success status
    /// - [`I18nError::Http`] when the request fails
    /// - [`I18nError::Parse`] / [`I18nError::InvalidBundle`] on a body that
    ///   is not a JSON object
    pub async fn load_translations_async(&self, locale: &str, url: &str) -> Result<(), I18nError> {
        if let Some(cached) = self.bundles.get(url) {
            tracing::debug!(locale, url, "Translation bundle served from cache");
            self.load_translations(locale, cached);
            return Ok(());
        }

        let tree = self.fetcher.fetch(url).await?.into_tree()?;
        self.bundles.set(url, &tree);
        self.load_translations(locale, tree);
        tracing::debug!(locale, url, "Translation bundle loaded");
        Ok(())
    }

    /// Loads several `(locale, url)` bundles concurrently.
    ///
    /// Results are returned in input order; one failure does not cancel the
    /// others.
    pub async fn load_translations_many(
        &self,
        bundles: &[(String, String)],
    ) -> Vec<Result<(), I18nError>> {
        join_all(bundles.iter().map(|(locale, url)| self.load_translations_async(locale, url)))
            .await
    }

    /// Empties the result cache.
    pub fn clear_cache(&self) {
        self.state().results.clear();
    }

    /// Drops every cached bundle, in memory and in durable storage.
    pub fn clear_persistent_cache(&self) {
        self.bundles.clear();
    }

    /// Registers `callback` for locale switches.
    pub fn on_locale_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.add(callback)
    }

    /// Receives a [`LocaleChangeEvent`] for every switch made after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LocaleChangeEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn current_locale(&self) -> String {
        self.state().current.clone()
    }

    #[must_use]
    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Registered locales in registration order.
    #[must_use]
    pub fn available_locales(&self) -> Vec<String> {
        self.state().registry.as_slice().to_vec()
    }

    /// Registers `locale`, returning `false` if it already was.
    pub fn add_locale(&self, locale: &str) -> bool {
        self.state().registry.insert(locale)
    }

    /// Dotted keys of every leaf in `locale`'s tree, sorted.
    #[must_use]
    pub fn keys(&self, locale: &str) -> Vec<String> {
        self.state()
            .table
            .get(locale)
            .map(|tree| tree.flatten().into_iter().map(|(key, _)| key).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.state().results.stats()
    }

    /// [`format::format_number`] with the configured number format.
    #[must_use]
    pub fn format_number(&self, value: f64) -> String {
        format::format_number(value, &self.number_format)
    }

    /// [`format::format_currency`] with the configured number format.
    #[must_use]
    pub fn format_currency(&self, value: f64, currency: &str) -> String {
        format::format_currency(value, currency, &self.number_format)
    }

    /// [`format::format_date`] with the configured date patterns.
    #[must_use]
    pub fn format_date<T>(&self, datetime: &T, style: DateStyle) -> String
    where
        T: Datelike + Timelike,
    {
        format::format_date(datetime, style, &self.date_format)
    }

    /// [`format::format_relative_time`] against the current time and locale.
    #[must_use]
    pub fn format_relative_time(&self, then: &DateTime<Utc>) -> String {
        let locale = self.current_locale();
        format::format_relative_time(then, &Utc::now(), &locale, &self.date_format)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use async_trait::async_trait;
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::cache::MemoryStorage;
    use crate::config::PersistentCacheConfig;
    use crate::fetch::FetchResponse;
    use crate::params;

    fn tree(json: &str) -> TranslationTree {
        TranslationTree::from_json_str(json).unwrap()
    }

    #[fixture]
    fn settings() -> I18nSettings {
        I18nSettings {
            default_locale: "zh-CN".to_string(),
            locales: vec!["zh-CN".to_string(), "en-US".to_string()],
            translations: HashMap::from([
                (
                    "zh-CN".to_string(),
                    tree(r#"{"greeting": "你好", "welcome": "欢迎, {name}", "nav": {"home": "首页"}}"#),
                ),
                ("en-US".to_string(), tree(r#"{"nav": {"home": "Home"}}"#)),
            ]),
            ..I18nSettings::default()
        }
    }

    #[fixture]
    fn engine(settings: I18nSettings) -> Engine {
        Engine::builder(settings).locale_source(LocaleSource::None).build()
    }

    /// Serves fixed bodies and counts requests.
    #[derive(Debug, Default)]
    struct StubFetcher {
        responses: HashMap<String, FetchResponse>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                FetchResponse {
                    status,
                    status_text: if status == 200 { "OK" } else { "Not Found" }.to_string(),
                    body: body.to_string(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl BundleFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<FetchResponse, I18nError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.get(url).cloned().unwrap_or_else(|| FetchResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: String::new(),
            }))
        }
    }

    #[rstest]
    fn translates_and_falls_back_to_default_locale(engine: Engine) {
        assert_that!(engine.t("greeting", None), eq("你好"));
        assert_that!(engine.set_locale("en-US"), eq(true));
        assert_that!(engine.t("greeting", None), eq("你好"));
        assert_that!(engine.t("nav.home", None), eq("Home"));
    }

    #[rstest]
    fn interpolates_params(engine: Engine) {
        let params = params! { "name" => "Alice" };

        assert_that!(engine.t("welcome", Some(&params)), eq("欢迎, Alice"));
    }

    #[rstest]
    fn nested_node_is_not_a_translation(engine: Engine) {
        assert_that!(engine.t("nav", None), eq("nav"));
        assert_that!(engine.has("nav"), eq(false));
    }

    #[rstest]
    #[case::key(FallbackBehavior::Key, "missing.key")]
    #[case::empty(FallbackBehavior::Empty, "")]
    #[case::default(FallbackBehavior::Default, "missing.key")]
    fn applies_fallback_behavior(
        settings: I18nSettings,
        #[case] fallback_behavior: FallbackBehavior,
        #[case] expected: &str,
    ) {
        let engine = Engine::new(I18nSettings { fallback_behavior, ..settings });

        assert_that!(engine.t("missing.key", None), eq(expected));
    }

    #[rstest]
    fn default_locale_may_be_unregistered(settings: I18nSettings) {
        let engine = Engine::new(I18nSettings {
            default_locale: "fr".to_string(),
            translations: HashMap::from([("fr".to_string(), tree(r#"{"only": "seulement"}"#))]),
            fallback_behavior: FallbackBehavior::Default,
            ..settings
        });

        assert_that!(engine.current_locale(), eq("fr"));
        assert_that!(engine.t("only", None), eq("seulement"));
        assert_that!(engine.set_locale("fr"), eq(true));
    }

    #[rstest]
    fn set_locale_rejects_unregistered(engine: Engine) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _ = engine.on_locale_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_that!(engine.set_locale("fr-FR"), eq(false));
        assert_that!(engine.current_locale(), eq("zh-CN"));
        assert_that!(calls.load(Ordering::SeqCst), eq(0));
    }

    #[rstest]
    fn set_locale_to_current_is_silent(engine: Engine) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _ = engine.on_locale_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_that!(engine.set_locale("zh-CN"), eq(true));
        assert_that!(calls.load(Ordering::SeqCst), eq(0));
    }

    #[rstest]
    fn set_locale_notifies_listeners_despite_panics(engine: Engine) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _ = engine.on_locale_change(|_| panic!("listener failure"));
        let sink = Arc::clone(&seen);
        let _ = engine.on_locale_change(move |locale| {
            sink.lock().unwrap().push(locale.to_string());
        });

        assert_that!(engine.set_locale("en-US"), eq(true));
        assert_eq!(*seen.lock().unwrap(), ["en-US"]);
    }

    #[rstest]
    fn unsubscribed_listener_is_not_called(engine: Engine) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = engine.on_locale_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        engine.set_locale("en-US");

        assert_that!(calls.load(Ordering::SeqCst), eq(0));
    }

    #[rstest]
    fn broadcasts_locale_change_event(engine: Engine) {
        let mut receiver = engine.subscribe();

        engine.set_locale("en-US");

        let event = receiver.try_recv().unwrap();
        assert_that!(event.locale, eq("en-US"));
        assert_that!(event.old_locale, eq("zh-CN"));
        assert_that!(event.translations, eq(&tree(r#"{"nav": {"home": "Home"}}"#)));
    }

    #[rstest]
    fn caches_results_until_invalidated(engine: Engine) {
        let _ = engine.t("greeting", None);
        let _ = engine.t("greeting", None);

        assert_that!(
            engine.cache_stats(),
            eq(CacheStats { hits: 1, misses: 1, size: 1, max_size: 1000 })
        );

        engine.load_translations("zh-CN", tree(r#"{"greeting": "您好"}"#));

        assert_that!(engine.cache_stats().size, eq(0));
        assert_that!(engine.t("greeting", None), eq("您好"));
    }

    #[rstest]
    fn fallback_results_are_not_cached(engine: Engine) {
        let _ = engine.t("missing", None);

        assert_that!(engine.cache_stats().size, eq(0));
    }

    #[rstest]
    fn disabled_cache_records_nothing(settings: I18nSettings) {
        let engine = Engine::new(I18nSettings { enable_cache: false, ..settings });

        let _ = engine.t("greeting", None);
        let _ = engine.t("greeting", None);

        assert_that!(engine.cache_stats(), eq(CacheStats { max_size: 1000, ..CacheStats::default() }));
    }

    #[rstest]
    fn escapes_interpolated_values_when_configured(settings: I18nSettings) {
        let engine = Engine::new(I18nSettings { escape_html: true, ..settings });
        let params = params! { "name" => "<script>" };

        assert_that!(engine.t("welcome", Some(&params)), eq("欢迎, &lt;script&gt;"));
    }

    #[rstest]
    fn load_translations_drops_dangerous_keys(engine: Engine) {
        engine.load_translations("en-US", tree(r#"{"__proto__": {"x": "y"}, "ok": "fine"}"#));

        assert_that!(engine.keys("en-US"), elements_are![eq("nav.home"), eq("ok")]);
    }

    #[rstest]
    fn add_locale_enables_switching(engine: Engine) {
        assert_that!(engine.add_locale("ja"), eq(true));
        assert_that!(engine.add_locale("ja"), eq(false));
        assert_that!(engine.available_locales(), elements_are![eq("zh-CN"), eq("en-US"), eq("ja")]);
        assert_that!(engine.set_locale("ja"), eq(true));
    }

    #[rstest]
    fn auto_detect_uses_registered_match(settings: I18nSettings) {
        let engine = Engine::builder(I18nSettings { auto_detect: true, ..settings })
            .locale_source(LocaleSource::Preferred(vec!["en".to_string()]))
            .build();

        assert_that!(engine.current_locale(), eq("en-US"));
    }

    #[rstest]
    fn auto_detect_ignores_unregistered_match(settings: I18nSettings) {
        let engine = Engine::builder(I18nSettings { auto_detect: true, ..settings })
            .locale_source(LocaleSource::Preferred(vec!["de-DE".to_string()]))
            .build();

        assert_that!(engine.current_locale(), eq("zh-CN"));
    }

    #[rstest]
    fn formatter_conveniences_use_configured_formats(settings: I18nSettings) {
        let engine = Engine::new(I18nSettings {
            number_format: NumberFormat { decimals: 0, ..NumberFormat::default() },
            ..settings
        });

        assert_that!(engine.format_number(1234.5), eq("1,235"));
        assert_that!(engine.format_currency(10.0, "USD"), eq("$10"));
        assert_that!(engine.format_relative_time(&Utc::now()), eq("刚刚"));
    }

    #[rstest]
    #[tokio::test]
    async fn load_translations_async_fetches_once_per_url(settings: I18nSettings) {
        let fetcher = Arc::new(StubFetcher::default().with(
            "https://cdn.test/en.json?v=1",
            200,
            r#"{"greeting": "Hello"}"#,
        ));
        let engine = Engine::builder(settings).fetcher(fetcher.clone()).build();

        engine.load_translations_async("en-US", "https://cdn.test/en.json?v=1").await.unwrap();
        engine.load_translations_async("en-US", "https://cdn.test/en.json?v=1").await.unwrap();
        engine.set_locale("en-US");

        assert_that!(engine.t("greeting", None), eq("Hello"));
        assert_that!(fetcher.calls.load(Ordering::SeqCst), eq(1));
    }

    #[rstest]
    fn load_translations_async_reports_status(settings: I18nSettings) {
        let engine = Engine::builder(settings).fetcher(Arc::new(StubFetcher::default())).build();

        let result = tokio_test::block_on(
            engine.load_translations_async("en-US", "https://cdn.test/missing.json"),
        );

        assert!(matches!(result, Err(I18nError::Network { status: 404, .. })));
        assert_that!(engine.keys("en-US"), elements_are![eq("nav.home")]);
    }

    #[rstest]
    #[tokio::test]
    async fn persistent_cache_is_shared_between_engines(settings: I18nSettings) {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let persistent = I18nSettings {
            persistent_cache: PersistentCacheConfig { enabled: true, ..PersistentCacheConfig::default() },
            ..settings
        };
        let url = "https://cdn.test/ja.json";

        let first_fetcher = Arc::new(StubFetcher::default().with(url, 200, r#"{"greeting": "こんにちは"}"#));
        let first = Engine::builder(persistent.clone())
            .storage(Arc::clone(&storage))
            .fetcher(first_fetcher)
            .build();
        first.load_translations_async("ja", url).await.unwrap();

        let second_fetcher = Arc::new(StubFetcher::default());
        let second = Engine::builder(persistent)
            .storage(Arc::clone(&storage))
            .fetcher(second_fetcher.clone())
            .build();
        second.load_translations_async("ja", url).await.unwrap();

        assert_that!(second.keys("ja"), elements_are![eq("greeting")]);
        assert_that!(second_fetcher.calls.load(Ordering::SeqCst), eq(0));

        second.clear_persistent_cache();
        assert_that!(storage.is_empty(), eq(true));
    }

    #[rstest]
    #[tokio::test]
    async fn load_translations_many_keeps_input_order(settings: I18nSettings) {
        let fetcher = Arc::new(
            StubFetcher::default()
                .with("https://cdn.test/en.json", 200, r#"{"a": "A"}"#)
                .with("https://cdn.test/bad.json", 200, "[1]"),
        );
        let engine = Engine::builder(settings).fetcher(fetcher).build();

        let results = engine
            .load_translations_many(&[
                ("en-US".to_string(), "https://cdn.test/en.json".to_string()),
                ("en-US".to_string(), "https://cdn.test/bad.json".to_string()),
            ])
            .await;

        assert_that!(results.len(), eq(2));
        assert!(matches!(results.first(), Some(Ok(()))));
        assert!(matches!(results.get(1), Some(Err(I18nError::InvalidBundle(_)))));
    }

    #[rstest]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
