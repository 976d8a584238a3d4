//! Client-side translation of page text.
//!
//! # Architecture
//!
//! - `language`: validated language codes used as cache keys and URL segments
//! - `dictionary`: flat key → string dictionaries parsed from JSON
//! - `loader`: cached, retrying dictionary fetches
//! - `apply`: one-scan collection of translation markers and the rewrite pass
//! - `metrics`: per-loader cache and fetch counters
//!
//! # Example
//!
//! ```rust,ignore
//! use speaknow_site::i18n::{apply_translations, TranslationLoader};
//!
//! let loader = TranslationLoader::http(client, "https://example.com/js/translations", &config);
//! let report = apply_translations(&mut doc, &loader, "es").await;
//! ```

mod apply;
mod dictionary;
mod language;
mod loader;
mod metrics;

pub use apply::{
    apply_bindings, apply_dictionary, apply_translations, collect_bindings, ApplyReport,
    TranslationBinding, TranslationTarget, CONTENT_KEY_ATTR, PLACEHOLDER_KEY_ATTR,
};
pub use dictionary::{DictionaryError, TranslationDictionary};
pub use language::{InvalidLanguageCode, LanguageCode};
pub use loader::{HttpTranslationSource, LoadError, TranslationLoader, TranslationSource};
pub use metrics::{LoaderMetrics, MetricsReport};

#[cfg(test)]
pub(crate) use loader::fake;
