use super::appearance::{set_font_size, set_theme};
use super::elements::{BoundElements, ANCHOR_SELECTOR};
use super::links::mark_active_links;
use super::listeners::ListenerRegistry;
use super::NavError;
use crate::config::ControllerConfig;
use crate::dom::{Document, DomEvent, ElementId, EventTarget, EventType, Invocation, ListenerOptions};
use crate::fragments::ReadySignal;
use crate::i18n::{apply_translations, ApplyReport, TranslationLoader};
use crate::prefs::{Preference, PreferenceStore};
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, error, info};

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Uninitialized,
    Initializing,
    Ready,
}

/// What a registered listener does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    OpenMenu,
    CloseMenu,
    ToggleDropdown,
    /// Document click: closes the dropdown unless the click was inside it.
    OutsideClick,
    /// Document keydown: Escape closes the menu and the dropdown.
    KeyDown,
    ThemeChanged,
    FontSizeChanged,
    LanguageChanged,
}

/// Result of one listener invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handled {
    pub stop_propagation: bool,
    /// Language to translate the page into.
    pub translate: Option<String>,
}

/// Translation deferred until layout has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTranslation {
    pub language: String,
    pub deadline: Instant,
}

/// Menu-related state captured when the menu opens.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MenuSnapshot {
    hamburger_expanded: Option<String>,
    nav_hidden: Option<String>,
    body_overflow: Option<String>,
}

impl MenuSnapshot {
    fn capture(doc: &Document, elements: &BoundElements) -> Self {
        let owned = |value: Option<&str>| value.map(str::to_string);
        Self {
            hamburger_expanded: elements
                .hamburger
                .and_then(|h| owned(doc.attribute(h, "aria-expanded"))),
            nav_hidden: elements
                .nav_center
                .and_then(|n| owned(doc.attribute(n, "aria-hidden"))),
            body_overflow: owned(doc.style(doc.body(), "overflow")),
        }
    }

    fn restore(self, doc: &mut Document, elements: &BoundElements) {
        if let Some(hamburger) = elements.hamburger {
            restore_attribute(doc, hamburger, "aria-expanded", self.hamburger_expanded);
        }
        if let Some(nav) = elements.nav_center {
            restore_attribute(doc, nav, "aria-hidden", self.nav_hidden);
        }
        let body = doc.body();
        doc.set_style(body, "overflow", self.body_overflow.as_deref().unwrap_or(""));
    }
}

fn restore_attribute(doc: &mut Document, element: ElementId, name: &str, value: Option<String>) {
    match value {
        Some(value) => doc.set_attribute(element, name, &value),
        None => doc.remove_attribute(element, name),
    }
}

/// Mobile navigation, the preferences dropdown and page-wide preferences.
///
/// The controller does not own the document, the preference store or the
/// translation loader; the page passes them in so that the fragment loader
/// can write to the document while the controller waits for readiness.
#[derive(Debug)]
pub struct NavigationController {
    config: ControllerConfig,
    state: NavState,
    elements: Option<BoundElements>,
    listeners: ListenerRegistry<NavAction>,
    menu_snapshot: Option<MenuSnapshot>,
    scheduled: Option<ScheduledTranslation>,
}

impl NavigationController {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            state: NavState::Uninitialized,
            elements: None,
            listeners: ListenerRegistry::new(),
            menu_snapshot: None,
            scheduled: None,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == NavState::Ready
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn elements(&self) -> Option<&BoundElements> {
        self.elements.as_ref()
    }

    pub fn listeners(&self) -> &ListenerRegistry<NavAction> {
        &self.listeners
    }

    pub fn scheduled(&self) -> Option<&ScheduledTranslation> {
        self.scheduled.as_ref()
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_snapshot.is_some()
    }

    // ==================== Initialization ====================

    /// Run the full initialization sequence.
    pub async fn init(
        &mut self,
        doc: &mut Document,
        prefs: &PreferenceStore,
        mut ready: ReadySignal,
    ) -> Result<(), NavError> {
        if !self.begin(doc, prefs) {
            return Ok(());
        }
        self.wait_ready(&mut ready).await?;
        self.complete(doc, prefs)
    }

    /// Enter `Initializing` and apply the saved theme and font size. Returns
    /// `false` when init already started or finished.
    pub fn begin(&mut self, doc: &mut Document, prefs: &PreferenceStore) -> bool {
        if self.state != NavState::Uninitialized {
            debug!("Navigation controller already {:?}", self.state);
            return false;
        }
        self.state = NavState::Initializing;
        self.apply_saved_preferences(doc, prefs);
        true
    }

    /// Wait for the shared markup, bounded by the readiness timeout.
    pub async fn wait_ready(&mut self, ready: &mut ReadySignal) -> Result<(), NavError> {
        if self.state != NavState::Initializing {
            return Ok(());
        }
        match timeout(self.config.ready_timeout, ready.wait()).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!("Ready notifier dropped, checking {} directly", ANCHOR_SELECTOR);
                Ok(())
            }
            Err(_) => Err(self.fail(NavError::AnchorTimeout {
                selector: ANCHOR_SELECTOR,
                timeout: self.config.ready_timeout,
            })),
        }
    }

    /// Bind elements, wire handlers, mark the active link and schedule the
    /// saved language.
    pub fn complete(&mut self, doc: &mut Document, prefs: &PreferenceStore) -> Result<(), NavError> {
        if self.state != NavState::Initializing {
            return Ok(());
        }
        if doc.query_selector(ANCHOR_SELECTOR).is_none() {
            return Err(self.fail(NavError::AnchorMissing {
                selector: ANCHOR_SELECTOR,
            }));
        }

        let elements = BoundElements::bind(doc);
        self.wire(doc, prefs, &elements);

        let path = doc.location_path().to_string();
        mark_active_links(doc, &elements.nav_links, &path);

        let language = prefs.get_or(Preference::Language, &self.config.default_language);
        if let Some(select) = elements.lang_select {
            doc.set_value(select, &language);
        }
        self.elements = Some(elements);
        self.scheduled = Some(ScheduledTranslation {
            language,
            deadline: Instant::now() + self.config.translation_settle_delay,
        });

        self.state = NavState::Ready;
        info!(
            "Navigation controller initialized successfully ({} listeners)",
            self.listeners.len()
        );
        Ok(())
    }

    fn fail(&mut self, err: NavError) -> NavError {
        error!("Failed to initialize navigation controller: {}", err);
        self.state = NavState::Uninitialized;
        err
    }

    fn apply_saved_preferences(&self, doc: &mut Document, prefs: &PreferenceStore) {
        if let Some(theme) = prefs.get(Preference::Theme) {
            set_theme(doc, &theme);
        }
        if let Some(size) = prefs.get(Preference::FontSize) {
            set_font_size(doc, &self.config.font_sizes, &size);
        }
    }

    fn wire(&mut self, doc: &mut Document, prefs: &PreferenceStore, el: &BoundElements) {
        use NavAction::*;
        let registry = &mut self.listeners;

        if let (Some(hamburger), Some(_)) = (el.hamburger, el.nav_center) {
            registry.add_to(doc, Some(hamburger), EventType::Click, OpenMenu);
            registry.add_to(doc, el.close_btn, EventType::Click, CloseMenu);
            registry.add_to(doc, Some(el.overlay), EventType::Click, CloseMenu);
            for &link in &el.nav_links {
                registry.add_to(doc, Some(link), EventType::Click, CloseMenu);
            }
        }

        if let (Some(dropbtn), Some(_)) = (el.dropbtn, el.dropdown) {
            registry.add_to(doc, Some(dropbtn), EventType::Click, ToggleDropdown);
        }

        if let Some(select) = el.theme_select {
            registry.add_to(doc, Some(select), EventType::Change, ThemeChanged);
            let theme = prefs.get_or(Preference::Theme, &self.config.default_theme);
            doc.set_value(select, &theme);
        }
        if let Some(select) = el.font_select {
            registry.add_to(doc, Some(select), EventType::Change, FontSizeChanged);
            let size = prefs.get_or(Preference::FontSize, &self.config.default_font_size);
            doc.set_value(select, &size);
        }
        registry.add_to(doc, el.lang_select, EventType::Change, LanguageChanged);

        let options = ListenerOptions::default();
        registry.add(doc, EventTarget::Document, EventType::Click, options, OutsideClick);
        registry.add(doc, EventTarget::Document, EventType::KeyDown, options, KeyDown);
    }

    // ==================== Events ====================

    /// Run the action behind `invocation`, or `None` when the listener is
    /// not one of ours.
    pub fn handle(
        &mut self,
        doc: &mut Document,
        prefs: &mut PreferenceStore,
        invocation: &Invocation,
        event: &DomEvent,
    ) -> Option<Handled> {
        let action = *self.listeners.action(invocation.listener)?;
        let mut handled = Handled::default();

        match action {
            NavAction::OpenMenu => self.open_menu(doc),
            NavAction::CloseMenu => self.close_menu(doc),
            NavAction::ToggleDropdown => {
                handled.stop_propagation = true;
                self.toggle_dropdown(doc);
            }
            NavAction::OutsideClick => {
                if doc.closest(event.target, ".dropdown").is_none() {
                    self.close_dropdown(doc);
                }
            }
            NavAction::KeyDown => {
                if event.key() == Some("Escape") {
                    self.close_menu(doc);
                    self.close_dropdown(doc);
                }
            }
            NavAction::ThemeChanged => {
                let theme = changed_value(doc, event);
                set_theme(doc, &theme);
                prefs.set(Preference::Theme, &theme);
            }
            NavAction::FontSizeChanged => {
                let size = changed_value(doc, event);
                set_font_size(doc, &self.config.font_sizes, &size);
                prefs.set(Preference::FontSize, &size);
            }
            NavAction::LanguageChanged => {
                let language = changed_value(doc, event);
                self.change_language(prefs, &language);
                handled.translate = Some(language);
            }
        }
        Some(handled)
    }

    /// Persist a language choice. Any pending settle-delay translation is
    /// dropped so it cannot overwrite the newer choice.
    pub fn change_language(&mut self, prefs: &mut PreferenceStore, language: &str) {
        prefs.set(Preference::Language, language);
        if let Some(pending) = self.scheduled.take() {
            debug!("Dropping scheduled translation to {}", pending.language);
        }
    }

    pub fn handle_visibility_change(&mut self, doc: &mut Document, hidden: bool) {
        if hidden {
            self.close_menu(doc);
        }
    }

    // ==================== Menu & dropdown ====================

    pub fn open_menu(&mut self, doc: &mut Document) {
        let Some(el) = &self.elements else {
            return;
        };
        if self.menu_snapshot.is_none() {
            self.menu_snapshot = Some(MenuSnapshot::capture(doc, el));
        }

        if let Some(nav) = el.nav_center {
            doc.add_class(nav, "show");
            doc.set_attribute(nav, "aria-hidden", "false");
        }
        doc.add_class(el.overlay, "show");
        if let Some(hamburger) = el.hamburger {
            doc.set_attribute(hamburger, "aria-expanded", "true");
        }
        let body = doc.body();
        doc.set_style(body, "overflow", "hidden");
    }

    /// Close the menu, restoring whatever the open captured.
    pub fn close_menu(&mut self, doc: &mut Document) {
        let Some(el) = &self.elements else {
            return;
        };

        if let Some(nav) = el.nav_center {
            doc.remove_class(nav, "show");
        }
        doc.remove_class(el.overlay, "show");

        match self.menu_snapshot.take() {
            Some(snapshot) => snapshot.restore(doc, el),
            None => {
                if let Some(hamburger) = el.hamburger {
                    doc.set_attribute(hamburger, "aria-expanded", "false");
                }
                if let Some(nav) = el.nav_center {
                    doc.set_attribute(nav, "aria-hidden", "true");
                }
                let body = doc.body();
                doc.set_style(body, "overflow", "");
            }
        }
    }

    pub fn toggle_dropdown(&mut self, doc: &mut Document) {
        let Some(el) = &self.elements else {
            return;
        };
        if let (Some(dropdown), Some(dropbtn)) = (el.dropdown, el.dropbtn) {
            let open = doc.toggle_class(dropdown, "show");
            doc.set_attribute(dropbtn, "aria-expanded", if open { "true" } else { "false" });
        }
    }

    pub fn close_dropdown(&mut self, doc: &mut Document) {
        let Some(el) = &self.elements else {
            return;
        };
        if let Some(dropdown) = el.dropdown {
            doc.remove_class(dropdown, "show");
        }
        if let Some(dropbtn) = el.dropbtn {
            doc.set_attribute(dropbtn, "aria-expanded", "false");
        }
    }

    // ==================== Scheduled translation ====================

    pub fn scheduled_deadline(&self) -> Option<Instant> {
        self.scheduled.as_ref().map(|s| s.deadline)
    }

    /// Take the scheduled translation if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        if self.scheduled.as_ref()?.deadline > now {
            return None;
        }
        self.scheduled.take().map(|s| s.language)
    }

    /// Wait for the scheduled translation, if any, and apply it.
    pub async fn run_scheduled(
        &mut self,
        doc: &mut Document,
        loader: &TranslationLoader,
    ) -> Option<ApplyReport> {
        let deadline = self.scheduled_deadline()?;
        sleep_until(deadline).await;
        let language = self.take_due(deadline)?;
        Some(apply_translations(doc, loader, &language).await)
    }

    // ==================== Teardown ====================

    /// Detach every listener, drop pending work and return to
    /// `Uninitialized`. Safe to call repeatedly.
    pub fn cleanup(&mut self, doc: &mut Document) -> usize {
        if self.state == NavState::Uninitialized && self.listeners.is_empty() {
            return 0;
        }
        let detached = self.listeners.detach_all(doc);
        self.scheduled = None;
        self.menu_snapshot = None;
        self.elements = None;
        self.state = NavState::Uninitialized;
        info!("Navigation controller cleaned up ({} listeners detached)", detached);
        detached
    }
}

/// New value of the control that fired `event`.
fn changed_value(doc: &Document, event: &DomEvent) -> String {
    event
        .value()
        .map(str::to_string)
        .unwrap_or_else(|| doc.value(event.target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::ready_channel;
    use crate::i18n::fake::{loader, StaticSource};
    use crate::nav::appearance::DARK_THEME_CLASS;
    use crate::prefs::MemoryStorage;
    use std::time::Duration;

    const PAGE: &str = r#"
        <html><body>
          <header>
            <button class="hamburger" aria-expanded="false">Menu</button>
            <nav class="nav-center" aria-hidden="true">
              <button class="close-btn">Close</button>
              <a href="index.html">Home</a>
              <a href="courses.html">Courses</a>
            </nav>
            <div class="dropdown">
              <button class="dropbtn" aria-expanded="false">Settings</button>
              <div class="dropdown-content">
                <select id="theme-select"><option value="light">Light</option><option value="dark">Dark</option></select>
                <select id="font-select"><option value="small">S</option><option value="medium">M</option><option value="large">L</option></select>
                <select id="lang-select"><option value="en">EN</option><option value="es">ES</option></select>
              </div>
            </div>
          </header>
          <main><h1 data-i18n="hero.title">Welcome</h1><p id="outside">Text</p></main>
        </body></html>
    "#;

    fn test_config() -> ControllerConfig {
        ControllerConfig {
            translation_settle_delay: Duration::from_millis(5),
            ready_timeout: Duration::from_millis(50),
            ..ControllerConfig::default()
        }
    }

    async fn ready_page(path: &str, prefs: &PreferenceStore) -> (NavigationController, Document) {
        let mut doc = Document::parse(PAGE).with_location(path);
        let mut nav = NavigationController::new(test_config());
        nav.init(&mut doc, prefs, ReadySignal::ready()).await.unwrap();
        (nav, doc)
    }

    /// Walk the dispatch plan the way the page does.
    fn dispatch(
        nav: &mut NavigationController,
        doc: &mut Document,
        prefs: &mut PreferenceStore,
        event: DomEvent,
    ) -> Vec<Handled> {
        let mut stopped_at = None;
        let mut results = Vec::new();
        for invocation in doc.dispatch_plan(&event) {
            if stopped_at.is_some_and(|t| t != invocation.current_target) {
                break;
            }
            if let Some(handled) = nav.handle(doc, prefs, &invocation, &event) {
                if handled.stop_propagation {
                    stopped_at = Some(invocation.current_target);
                }
                results.push(handled);
            }
        }
        results
    }

    fn el(doc: &Document, selector: &str) -> ElementId {
        doc.query_selector(selector).unwrap()
    }

    /// One listener per nav link, hamburger, close, overlay, dropbtn and the
    /// three selects, plus document click and keydown.
    fn expected_listeners(doc: &Document) -> usize {
        doc.query_selector_all(".nav-center a").len() + 7 + 2
    }

    #[tokio::test]
    async fn test_init_reaches_ready() {
        let prefs = PreferenceStore::in_memory();
        let (nav, doc) = ready_page("/index.html", &prefs).await;

        assert_eq!(nav.state(), NavState::Ready);
        assert_eq!(expected_listeners(&doc), 11);
        assert_eq!(nav.listeners().len(), expected_listeners(&doc));
        assert_eq!(doc.listener_count(), expected_listeners(&doc));

        let home = el(&doc, ".nav-center a");
        assert!(doc.has_class(home, "active"));
        assert_eq!(doc.value(el(&doc, "#theme-select")), "light");
        assert_eq!(doc.value(el(&doc, "#font-select")), "medium");
        assert_eq!(doc.value(el(&doc, "#lang-select")), "en");
        assert_eq!(nav.scheduled().map(|s| s.language.as_str()), Some("en"));
    }

    #[tokio::test]
    async fn test_init_twice_is_noop() {
        let prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;

        nav.init(&mut doc, &prefs, ReadySignal::ready()).await.unwrap();
        assert_eq!(nav.listeners().len(), expected_listeners(&doc));
        assert_eq!(doc.listener_count(), expected_listeners(&doc));
    }

    #[tokio::test]
    async fn test_saved_preferences_restored() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set(Preference::Theme, "dark");
        prefs.set(Preference::FontSize, "large");
        prefs.set(Preference::Language, "es");

        let (nav, doc) = ready_page("/", &prefs).await;

        assert!(doc.has_class(doc.body(), DARK_THEME_CLASS));
        assert_eq!(doc.style(doc.root(), "font-size"), Some("18px"));
        assert_eq!(doc.value(el(&doc, "#theme-select")), "dark");
        assert_eq!(doc.value(el(&doc, "#font-select")), "large");
        assert_eq!(doc.value(el(&doc, "#lang-select")), "es");
        assert_eq!(nav.scheduled().map(|s| s.language.as_str()), Some("es"));
    }

    #[tokio::test]
    async fn test_timeout_resets_to_uninitialized_after_applying_theme() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set(Preference::Theme, "dark");

        let mut doc = Document::parse("<main>Header never arrives</main>");
        let mut nav = NavigationController::new(test_config());
        let (_notifier, signal) = ready_channel();

        let err = nav.init(&mut doc, &prefs, signal).await.unwrap_err();

        assert!(matches!(err, NavError::AnchorTimeout { .. }));
        assert_eq!(nav.state(), NavState::Uninitialized);
        assert!(doc.has_class(doc.body(), DARK_THEME_CLASS));
        assert_eq!(doc.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_anchor_fails_and_can_retry() {
        let prefs = PreferenceStore::in_memory();
        let mut doc = Document::parse(r#"<div id="header-placeholder"></div>"#);
        let mut nav = NavigationController::new(test_config());

        let err = nav.init(&mut doc, &prefs, ReadySignal::ready()).await.unwrap_err();
        assert!(matches!(err, NavError::AnchorMissing { .. }));
        assert_eq!(nav.state(), NavState::Uninitialized);

        let placeholder = doc.get_element_by_id("header-placeholder").unwrap();
        doc.set_inner_html(placeholder, r#"<button class="hamburger">Menu</button>"#);
        nav.init(&mut doc, &prefs, ReadySignal::ready()).await.unwrap();
        assert!(nav.is_ready());
    }

    #[tokio::test]
    async fn test_menu_round_trip_restores_state() {
        let mut prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;
        let hamburger = el(&doc, ".hamburger");
        let nav_center = el(&doc, ".nav-center");
        let body = doc.body();

        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(hamburger));
        assert!(nav.is_menu_open());
        assert!(doc.has_class(nav_center, "show"));
        assert_eq!(doc.attribute(hamburger, "aria-expanded"), Some("true"));
        assert_eq!(doc.attribute(nav_center, "aria-hidden"), Some("false"));
        assert_eq!(doc.style(body, "overflow"), Some("hidden"));

        let close = el(&doc, ".close-btn");
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(close));
        assert!(!nav.is_menu_open());
        assert!(!doc.has_class(nav_center, "show"));
        assert_eq!(doc.attribute(hamburger, "aria-expanded"), Some("false"));
        assert_eq!(doc.attribute(nav_center, "aria-hidden"), Some("true"));
        assert_eq!(doc.style(body, "overflow"), None);
    }

    #[tokio::test]
    async fn test_menu_round_trip_restores_custom_values() {
        let prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;
        let hamburger = el(&doc, ".hamburger");
        let nav_center = el(&doc, ".nav-center");
        let body = doc.body();
        doc.remove_attribute(hamburger, "aria-expanded");
        doc.set_style(body, "overflow", "scroll");

        nav.open_menu(&mut doc);
        nav.open_menu(&mut doc);
        nav.close_menu(&mut doc);

        assert_eq!(doc.attribute(hamburger, "aria-expanded"), None);
        assert_eq!(doc.attribute(nav_center, "aria-hidden"), Some("true"));
        assert_eq!(doc.style(body, "overflow"), Some("scroll"));
    }

    #[tokio::test]
    async fn test_overlay_and_link_close_menu() {
        let mut prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;
        let hamburger = el(&doc, ".hamburger");
        let overlay = el(&doc, ".overlay");

        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(hamburger));
        assert!(doc.has_class(overlay, "show"));
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(overlay));
        assert!(!doc.has_class(overlay, "show"));

        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(hamburger));
        let link = doc.query_selector_all(".nav-center a")[1];
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(link));
        assert!(!nav.is_menu_open());
    }

    #[tokio::test]
    async fn test_dropdown_toggle_stops_outside_click() {
        let mut prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;
        let dropdown = el(&doc, ".dropdown");
        let dropbtn = el(&doc, ".dropbtn");

        let handled = dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(dropbtn));
        assert_eq!(handled.len(), 1);
        assert!(handled[0].stop_propagation);
        assert!(doc.has_class(dropdown, "show"));
        assert_eq!(doc.attribute(dropbtn, "aria-expanded"), Some("true"));

        // Click inside the panel keeps it open
        let theme = el(&doc, "#theme-select");
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(theme));
        assert!(doc.has_class(dropdown, "show"));

        let outside = el(&doc, "#outside");
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(outside));
        assert!(!doc.has_class(dropdown, "show"));
        assert_eq!(doc.attribute(dropbtn, "aria-expanded"), Some("false"));

        // Already closed: idempotent
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(outside));
        assert!(!doc.has_class(dropdown, "show"));
    }

    #[tokio::test]
    async fn test_escape_closes_menu_and_dropdown() {
        let mut prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;
        let dropdown = el(&doc, ".dropdown");

        nav.open_menu(&mut doc);
        nav.toggle_dropdown(&mut doc);

        let outside = el(&doc, "#outside");
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::key_down(outside, "Enter"));
        assert!(nav.is_menu_open());

        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::key_down(outside, "Escape"));
        assert!(!nav.is_menu_open());
        assert!(!doc.has_class(dropdown, "show"));
    }

    #[tokio::test]
    async fn test_theme_and_font_apply_then_persist() {
        let mut prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;

        let theme = el(&doc, "#theme-select");
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::change(theme, "dark"));
        assert!(doc.has_class(doc.body(), DARK_THEME_CLASS));
        assert_eq!(prefs.get(Preference::Theme).as_deref(), Some("dark"));

        let font = el(&doc, "#font-select");
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::change(font, "huge"));
        assert_eq!(doc.style(doc.root(), "font-size"), Some("16px"));
        assert_eq!(prefs.get(Preference::FontSize).as_deref(), Some("huge"));
    }

    #[tokio::test]
    async fn test_visual_change_survives_broken_storage() {
        let mut prefs = PreferenceStore::new(MemoryStorage::disabled());
        let (mut nav, mut doc) = ready_page("/", &prefs).await;

        let theme = el(&doc, "#theme-select");
        dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::change(theme, "dark"));

        assert!(doc.has_class(doc.body(), DARK_THEME_CLASS));
        assert_eq!(prefs.get(Preference::Theme), None);
    }

    #[tokio::test]
    async fn test_language_change_persists_and_cancels_schedule() {
        let mut prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;
        assert!(nav.scheduled().is_some());

        let lang = el(&doc, "#lang-select");
        let handled = dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::change(lang, "es"));

        assert_eq!(handled[0].translate.as_deref(), Some("es"));
        assert_eq!(prefs.get(Preference::Language).as_deref(), Some("es"));
        assert!(nav.scheduled().is_none());
    }

    #[tokio::test]
    async fn test_visibility_hidden_closes_menu() {
        let prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;

        nav.open_menu(&mut doc);
        nav.handle_visibility_change(&mut doc, false);
        assert!(nav.is_menu_open());
        nav.handle_visibility_change(&mut doc, true);
        assert!(!nav.is_menu_open());
    }

    #[tokio::test]
    async fn test_run_scheduled_translates_saved_language() {
        let mut prefs = PreferenceStore::in_memory();
        prefs.set(Preference::Language, "es");
        let (mut nav, mut doc) = ready_page("/", &prefs).await;
        let loader = loader(StaticSource::default().with("es", &[("hero.title", "Bienvenido")]));

        let report = nav.run_scheduled(&mut doc, &loader).await.unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(doc.text_content(el(&doc, "h1")), "Bienvenido");
        assert_eq!(doc.attribute(doc.root(), "lang"), Some("es"));
        assert!(nav.run_scheduled(&mut doc, &loader).await.is_none());
    }

    #[tokio::test]
    async fn test_take_due_respects_deadline() {
        let prefs = PreferenceStore::in_memory();
        let (mut nav, _doc) = ready_page("/", &prefs).await;
        let deadline = nav.scheduled_deadline().unwrap();

        assert_eq!(nav.take_due(deadline - Duration::from_millis(1)), None);
        assert_eq!(nav.take_due(deadline).as_deref(), Some("en"));
        assert_eq!(nav.take_due(deadline), None);
    }

    #[tokio::test]
    async fn test_cleanup_detaches_everything_once() {
        let mut prefs = PreferenceStore::in_memory();
        let (mut nav, mut doc) = ready_page("/", &prefs).await;

        let attached = expected_listeners(&doc);
        assert_eq!(nav.cleanup(&mut doc), attached);
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(nav.state(), NavState::Uninitialized);
        assert!(nav.scheduled().is_none());

        assert_eq!(nav.cleanup(&mut doc), 0);

        // Nothing reacts after teardown
        let hamburger = el(&doc, ".hamburger");
        assert!(dispatch(&mut nav, &mut doc, &mut prefs, DomEvent::click(hamburger)).is_empty());
        assert!(!doc.has_class(el(&doc, ".nav-center"), "show"));
    }
}
