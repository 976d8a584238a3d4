//! Translation dictionary loading with a per-session cache.
//!
//! Dictionaries are fetched once per language and kept for the lifetime of
//! the loader. Failed loads are retried a fixed number of times and then
//! degrade to an empty dictionary without caching anything, so the next
//! request for the same language starts over.

use super::dictionary::{DictionaryError, TranslationDictionary};
use super::language::{InvalidLanguageCode, LanguageCode};
use super::metrics::LoaderMetrics;
use crate::config::{join_url, ControllerConfig};
use crate::retry::{with_retry, RetryConfig};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    InvalidLanguage(#[from] InvalidLanguageCode),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not a translation dictionary: {source}")]
    Malformed {
        url: String,
        #[source]
        source: DictionaryError,
    },
}

/// Where dictionaries come from.
pub trait TranslationSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        language: &'a LanguageCode,
    ) -> BoxFuture<'a, Result<TranslationDictionary, LoadError>>;
}

/// Fetches `<base>/<code>.json` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTranslationSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTranslationSource {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, language: &LanguageCode) -> String {
        join_url(&self.base_url, &format!("{}.json", language))
    }

    async fn fetch_dictionary(&self, language: &LanguageCode) -> Result<TranslationDictionary, LoadError> {
        let url = self.url_for(language);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| LoadError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| LoadError::Transport {
            url: url.clone(),
            source,
        })?;

        TranslationDictionary::from_json(&body).map_err(|source| LoadError::Malformed { url, source })
    }
}

impl TranslationSource for HttpTranslationSource {
    fn fetch<'a>(
        &'a self,
        language: &'a LanguageCode,
    ) -> BoxFuture<'a, Result<TranslationDictionary, LoadError>> {
        Box::pin(self.fetch_dictionary(language))
    }
}

/// Cached, retrying dictionary loader.
pub struct TranslationLoader {
    source: Box<dyn TranslationSource>,
    retry: RetryConfig,
    cache: Mutex<HashMap<LanguageCode, Arc<TranslationDictionary>>>,
    metrics: LoaderMetrics,
}

impl TranslationLoader {
    pub fn new(source: impl TranslationSource + 'static, retry: RetryConfig) -> Self {
        Self {
            source: Box::new(source),
            retry,
            cache: Mutex::new(HashMap::new()),
            metrics: LoaderMetrics::new(),
        }
    }

    /// HTTP loader using the controller's attempt count and spacing.
    pub fn http(client: reqwest::Client, base_url: &str, config: &ControllerConfig) -> Self {
        Self::new(
            HttpTranslationSource::new(client, base_url),
            RetryConfig::fixed(
                config.max_translation_attempts,
                config.translation_retry_delay,
            ),
        )
    }

    /// Dictionary for `language`. Never fails: any error is logged and an
    /// empty dictionary returned.
    pub async fn load(&self, language: &str) -> Arc<TranslationDictionary> {
        match self.try_load(language).await {
            Ok(dictionary) => dictionary,
            Err(e) => {
                error!("Error loading translations for {}: {}", language, e);
                Arc::new(TranslationDictionary::default())
            }
        }
    }

    /// Like [`load`](Self::load) but reports the final error.
    pub async fn try_load(&self, language: &str) -> Result<Arc<TranslationDictionary>, LoadError> {
        let code = LanguageCode::parse(language)?;

        if let Some(cached) = self.cached(&code) {
            debug!("Translations for {} served from cache", code);
            self.metrics.record_cache_hit();
            return Ok(cached);
        }
        self.metrics.record_cache_miss();

        let operation = format!("Translations {}", code);
        let result = with_retry(&self.retry, &operation, || {
            self.metrics.record_fetch_attempt();
            let fetch = self.source.fetch(&code);
            async move {
                let result = fetch.await;
                if result.is_err() {
                    self.metrics.record_fetch_failure();
                }
                result
            }
        })
        .await;

        match result {
            Ok(dictionary) => {
                info!("Loaded {} translations for {}", dictionary.len(), code);
                let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                // A concurrent load may have won the race; keep its copy.
                let entry = cache.entry(code).or_insert_with(|| Arc::new(dictionary));
                Ok(Arc::clone(entry))
            }
            Err(e) => {
                self.metrics.record_exhausted();
                Err(e)
            }
        }
    }

    pub fn is_cached(&self, language: &str) -> bool {
        LanguageCode::parse(language)
            .map(|code| self.cached(&code).is_some())
            .unwrap_or(false)
    }

    pub fn metrics(&self) -> &LoaderMetrics {
        &self.metrics
    }

    fn cached(&self, code: &LanguageCode) -> Option<Arc<TranslationDictionary>> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .cloned()
    }
}

impl std::fmt::Debug for TranslationLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationLoader")
            .field("retry", &self.retry)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}
