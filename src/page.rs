//! Page runtime: owns the document and every component acting on it.

use crate::config::Config;
use crate::config::ControllerConfig;
use crate::contact::{ContactForm, ContactOutcome, EmailJsClient, EmailRelay};
use crate::dom::{Document, DomEvent};
use crate::fragments::{ready_channel, FragmentLoader, FragmentReport};
use crate::i18n::{apply_dictionary, ApplyReport, TranslationDictionary, TranslationLoader};
use crate::nav::{NavError, NavigationController};
use crate::prefs::{FileStorage, PreferenceStore};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Something that happened to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Dom(DomEvent),
    VisibilityChanged { hidden: bool },
    Unload,
}

#[derive(Debug)]
pub struct BootReport {
    pub fragments: Option<FragmentReport>,
    pub navigation: Result<(), NavError>,
    pub contact_form: bool,
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Listener invocations that ran
    pub invoked: usize,
    /// Language whose dictionary started loading
    pub translation: Option<String>,
    /// Whether a contact submission was accepted, if one was made
    pub sent: Option<bool>,
}

/// A dictionary load started by a language change, applied when it resolves.
struct PendingTranslation {
    language: String,
    load: BoxFuture<'static, Arc<TranslationDictionary>>,
}

pub struct Page {
    doc: Document,
    prefs: PreferenceStore,
    loader: Arc<TranslationLoader>,
    nav: NavigationController,
    contact: ContactForm,
    fragments: Option<FragmentLoader>,
    relay: Option<Box<dyn EmailRelay>>,
    pending: Option<PendingTranslation>,
}

impl Page {
    pub fn new(
        doc: Document,
        prefs: PreferenceStore,
        loader: TranslationLoader,
        config: ControllerConfig,
    ) -> Self {
        let contact = ContactForm::new(String::new(), config.error_banner_timeout);
        Self {
            doc,
            prefs,
            loader: Arc::new(loader),
            nav: NavigationController::new(config),
            contact,
            fragments: None,
            relay: None,
            pending: None,
        }
    }

    /// Wire every component from environment configuration.
    pub fn from_config(config: &Config, doc: Document) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("speaknow-site/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        let prefs = PreferenceStore::new(FileStorage::new(&config.preferences_file));
        let loader = TranslationLoader::http(
            client.clone(),
            &config.site_url(&config.translations_path),
            &config.controller,
        );

        let mut page = Self::new(doc, prefs, loader, config.controller.clone())
            .with_fragments(FragmentLoader::site(client.clone(), config));

        match &config.contact {
            Some(contact) => {
                page = page.with_contact(&contact.to_email, EmailJsClient::new(client, contact));
            }
            None => debug!("EmailJS not configured, contact submissions disabled"),
        }
        Ok(page)
    }

    pub fn with_fragments(mut self, fragments: FragmentLoader) -> Self {
        self.fragments = Some(fragments);
        self
    }

    pub fn with_contact(mut self, to_email: &str, relay: impl EmailRelay + 'static) -> Self {
        let banner_timeout = self.nav.config().error_banner_timeout;
        self.contact = ContactForm::new(to_email, banner_timeout);
        self.relay = Some(Box::new(relay));
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn loader(&self) -> &TranslationLoader {
        &self.loader
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn contact(&self) -> &ContactForm {
        &self.contact
    }

    /// Inject shared markup and initialize the controllers. The navigation
    /// controller applies saved appearance first, then waits for the
    /// fragment pass before binding.
    pub async fn boot(&mut self) -> BootReport {
        let Page {
            doc,
            prefs,
            nav,
            fragments,
            ..
        } = self;

        let (notifier, mut ready) = ready_channel();
        nav.begin(doc, prefs);

        let inject = async {
            match fragments {
                Some(loader) => Some(loader.load_into(doc, &notifier).await),
                None => {
                    notifier.notify();
                    None
                }
            }
        };
        let (fragments, waited) = tokio::join!(inject, nav.wait_ready(&mut ready));

        let navigation = match waited {
            Ok(()) => nav.complete(doc, prefs),
            Err(e) => Err(e),
        };
        let contact_form = self.contact.attach(&mut self.doc);

        info!(
            "Page booted (navigation ready: {}, contact form: {})",
            self.nav.is_ready(),
            contact_form
        );
        BootReport {
            fragments,
            navigation,
            contact_form,
        }
    }

    /// Deliver one DOM event to every listener on its path, honoring stop
    /// propagation, then run the async follow-ups. A language change only
    /// starts its dictionary load; see [`Page::finish_translation`].
    pub async fn dispatch(&mut self, event: DomEvent) -> DispatchReport {
        if let Some(value) = event.value() {
            self.doc.set_value(event.target, value);
        }

        let mut report = DispatchReport::default();
        let mut stopped_at = None;
        let mut translate = None;
        let mut submission = None;

        for invocation in self.doc.dispatch_plan(&event) {
            if stopped_at.is_some_and(|target| target != invocation.current_target) {
                break;
            }
            if let Some(handled) =
                self.nav
                    .handle(&mut self.doc, &mut self.prefs, &invocation, &event)
            {
                report.invoked += 1;
                if handled.stop_propagation {
                    stopped_at = Some(invocation.current_target);
                }
                if handled.translate.is_some() {
                    translate = handled.translate;
                }
            } else if let Some(outcome) = self.contact.handle(&mut self.doc, &invocation, &event) {
                report.invoked += 1;
                if let ContactOutcome::Submit(params) = outcome {
                    submission = Some(params);
                }
            }
        }

        if let Some(language) = translate {
            self.start_translation(&language);
            report.translation = Some(language);
        }
        if let Some(params) = submission {
            let result = self
                .contact
                .submit(&mut self.doc, self.relay.as_deref(), params)
                .await;
            report.sent = Some(result.is_ok());
        }
        report
    }

    /// Tag the page with `language` and start loading its dictionary. A load
    /// already in flight is dropped so it cannot overwrite the newer choice.
    pub fn start_translation(&mut self, language: &str) {
        let root = self.doc.root();
        self.doc.set_attribute(root, "lang", language);

        let loader = Arc::clone(&self.loader);
        let code = language.to_string();
        let previous = self.pending.replace(PendingTranslation {
            language: language.to_string(),
            load: Box::pin(async move { loader.load(&code).await }),
        });
        if let Some(previous) = previous {
            debug!(
                "Dropping translation to {} in favor of {}",
                previous.language, language
            );
        }
    }

    /// Language whose dictionary is still loading, if any.
    pub fn pending_translation(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.language.as_str())
    }

    /// Wait for the load started by [`Page::start_translation`] and apply it.
    pub async fn finish_translation(&mut self) -> Option<ApplyReport> {
        let PendingTranslation { language, load } = self.pending.take()?;
        let dictionary = load.await;
        Some(self.apply_loaded(&language, &dictionary))
    }

    /// Apply `language` to the page now.
    pub async fn translate(&mut self, language: &str) -> ApplyReport {
        self.start_translation(language);
        self.finish_translation().await.unwrap_or_default()
    }

    fn apply_loaded(&mut self, language: &str, dictionary: &TranslationDictionary) -> ApplyReport {
        let report = apply_dictionary(&mut self.doc, language, dictionary);
        if !report.missing.is_empty() {
            warn!("{} translation keys missing for {}", report.missing.len(), language);
        }
        report
    }

    /// Choose a language the way the language selector does.
    pub async fn change_language(&mut self, language: &str) -> ApplyReport {
        self.nav.change_language(&mut self.prefs, language);
        if let Some(select) = self.nav.elements().and_then(|el| el.lang_select) {
            self.doc.set_value(select, language);
        }
        self.translate(language).await
    }

    /// Wait for and apply the translation scheduled by init, if any.
    pub async fn run_scheduled(&mut self) -> Option<ApplyReport> {
        self.nav.run_scheduled(&mut self.doc, &self.loader).await
    }

    pub fn handle_visibility_change(&mut self, hidden: bool) {
        self.nav.handle_visibility_change(&mut self.doc, hidden);
    }

    /// Detach every listener and drop pending timers and loads.
    pub fn cleanup(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Dropping translation to {} still loading", pending.language);
        }
        let detached = self.nav.cleanup(&mut self.doc) + self.contact.detach(&mut self.doc);
        debug!("Page cleanup detached {} listeners", detached);
    }

    /// Process events until `Unload` or the channel closes. Scheduled work
    /// (the settle-delay translation and the error banner dismissal) runs
    /// when due. Dictionary loads are polled alongside events and applied
    /// when they resolve.
    pub async fn run(&mut self, mut events: mpsc::Receiver<PageEvent>) {
        loop {
            let translation_due = self.nav.scheduled_deadline();
            let banner_due = self.contact.banner_deadline();

            tokio::select! {
                event = events.recv() => match event {
                    Some(PageEvent::Dom(event)) => {
                        self.dispatch(event).await;
                    }
                    Some(PageEvent::VisibilityChanged { hidden }) => {
                        self.handle_visibility_change(hidden);
                    }
                    Some(PageEvent::Unload) | None => {
                        self.cleanup();
                        break;
                    }
                },
                dictionary = next_dictionary(&mut self.pending), if self.pending.is_some() => {
                    if let Some(pending) = self.pending.take() {
                        self.apply_loaded(&pending.language, &dictionary);
                    }
                }
                _ = sleep_until(translation_due.unwrap_or_else(Instant::now)), if translation_due.is_some() => {
                    if let Some(language) = self.nav.take_due(Instant::now()) {
                        self.start_translation(&language);
                    }
                }
                _ = sleep_until(banner_due.unwrap_or_else(Instant::now)), if banner_due.is_some() => {
                    self.contact.expire_banner(&mut self.doc, Instant::now());
                }
            }
        }
        info!("Page unloaded");
    }
}

/// Resolves with the in-flight dictionary. Never resolves when nothing is
/// loading.
async fn next_dictionary(pending: &mut Option<PendingTranslation>) -> Arc<TranslationDictionary> {
    match pending {
        Some(pending) => (&mut pending.load).await,
        None => std::future::pending().await,
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("navigation", &self.nav.state())
            .field("pending_translation", &self.pending_translation())
            .field("relay", &self.relay.is_some())
            .finish_non_exhaustive()
    }
}
