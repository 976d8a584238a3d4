//! Shared header/footer markup injection and the readiness signal the
//! navigation controller waits on.

use crate::config::Config;
use crate::dom::Document;
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    #[error("failed to load {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to load {url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

/// A markup resource and the element it is injected into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub placeholder_id: String,
    pub url: String,
}

impl Fragment {
    pub fn new(placeholder_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            placeholder_id: placeholder_id.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug)]
pub struct FetchedFragment {
    pub fragment: Fragment,
    pub markup: Result<String, FragmentError>,
}

/// Outcome of one injection pass, by placeholder id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentReport {
    pub injected: Vec<String>,
    pub failed: Vec<String>,
    pub missing_placeholders: Vec<String>,
}

/// Fires once the fragment pass has finished.
#[derive(Debug)]
pub struct ReadyNotifier(watch::Sender<bool>);

/// Resolves when the page's shared markup is in place.
#[derive(Debug, Clone)]
pub struct ReadySignal(watch::Receiver<bool>);

/// Create a linked notifier and signal.
pub fn ready_channel() -> (ReadyNotifier, ReadySignal) {
    let (tx, rx) = watch::channel(false);
    (ReadyNotifier(tx), ReadySignal(rx))
}

impl ReadyNotifier {
    pub fn notify(&self) {
        self.0.send_replace(true);
    }
}

impl ReadySignal {
    /// A signal that has already fired, for pages whose markup is static.
    pub fn ready() -> Self {
        let (notifier, signal) = ready_channel();
        notifier.notify();
        signal
    }

    pub fn is_ready(&self) -> bool {
        *self.0.borrow()
    }

    /// Wait for the notifier. Returns `false` if it was dropped without
    /// firing.
    pub async fn wait(&mut self) -> bool {
        self.0.wait_for(|ready| *ready).await.is_ok()
    }
}

/// Fetches fragments concurrently and injects them.
#[derive(Debug, Clone)]
pub struct FragmentLoader {
    client: reqwest::Client,
    fragments: Vec<Fragment>,
}

impl FragmentLoader {
    pub fn new(client: reqwest::Client, fragments: Vec<Fragment>) -> Self {
        Self { client, fragments }
    }

    /// The site header and footer.
    pub fn site(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            client,
            vec![
                Fragment::new("header-placeholder", config.site_url(&config.header_fragment)),
                Fragment::new("footer-placeholder", config.site_url(&config.footer_fragment)),
            ],
        )
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub async fn fetch_all(&self) -> Vec<FetchedFragment> {
        join_all(self.fragments.iter().map(|fragment| async move {
            FetchedFragment {
                fragment: fragment.clone(),
                markup: self.fetch(&fragment.url).await,
            }
        }))
        .await
    }

    async fn fetch(&self, url: &str) -> Result<String, FragmentError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FragmentError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FragmentError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FragmentError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch, inject, then fire `notifier` whatever the outcome.
    pub async fn load_into(&self, doc: &mut Document, notifier: &ReadyNotifier) -> FragmentReport {
        let fetched = self.fetch_all().await;
        let report = inject(doc, fetched);
        notifier.notify();
        report
    }
}

/// Replace each placeholder's content with its fetched markup. Failures are
/// logged and leave the placeholder untouched.
pub fn inject(doc: &mut Document, fetched: Vec<FetchedFragment>) -> FragmentReport {
    let mut report = FragmentReport::default();

    for FetchedFragment { fragment, markup } in fetched {
        let id = fragment.placeholder_id;
        let markup = match markup {
            Ok(markup) => markup,
            Err(e) => {
                error!("{}", e);
                report.failed.push(id);
                continue;
            }
        };

        match doc.get_element_by_id(&id) {
            Some(placeholder) => {
                doc.set_inner_html(placeholder, &markup);
                report.injected.push(id);
            }
            None => {
                error!("Placeholder #{} not found for {}", id, fragment.url);
                report.missing_placeholders.push(id);
            }
        }
    }

    info!(
        "Fragments injected: {}, failed: {}",
        report.injected.len(),
        report.failed.len() + report.missing_placeholders.len()
    );
    report
}
