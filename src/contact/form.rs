use super::relay::{EmailRelay, RelayError, TemplateParams};
use super::validate::{validate_value, FieldKind};
use crate::dom::{Document, DomEvent, ElementId, EventTarget, EventType, Invocation, ListenerOptions};
use crate::nav::ListenerRegistry;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

const REQUIRED_FIELDS: &str = "input[required], select[required], textarea[required]";

pub const SEND_FAILED_MESSAGE: &str =
    "Failed to send message. Please try again or contact us directly.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAction {
    Submit,
    ValidateOnBlur,
    ClearOnInput,
    CloseSuccess,
    /// Click on the success panel; only the backdrop itself closes it.
    SuccessBackdrop,
    /// Document keydown: Escape closes a visible success panel.
    KeyDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactElements {
    pub form: ElementId,
    pub success_message: Option<ElementId>,
    pub close_success: Option<ElementId>,
    pub required_fields: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactOutcome {
    Handled,
    /// The form validated; send these params.
    Submit(TemplateParams),
}

#[derive(Debug, Clone, Copy)]
struct ErrorBanner {
    element: ElementId,
    deadline: Instant,
}

/// Contact form behavior: inline validation, submission through an
/// [`EmailRelay`], the success panel and the auto-dismissed error banner.
#[derive(Debug)]
pub struct ContactForm {
    to_email: String,
    banner_timeout: Duration,
    elements: Option<ContactElements>,
    listeners: ListenerRegistry<ContactAction>,
    banner: Option<ErrorBanner>,
}

impl ContactForm {
    pub fn new(to_email: impl Into<String>, banner_timeout: Duration) -> Self {
        Self {
            to_email: to_email.into(),
            banner_timeout,
            elements: None,
            listeners: ListenerRegistry::new(),
            banner: None,
        }
    }

    pub fn elements(&self) -> Option<&ContactElements> {
        self.elements.as_ref()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Bind to `#contact-form` and wire its listeners. Returns `false` on
    /// pages without the form.
    pub fn attach(&mut self, doc: &mut Document) -> bool {
        if self.elements.is_some() {
            return true;
        }
        let Some(form) = doc.get_element_by_id("contact-form") else {
            debug!("No contact form on this page");
            return false;
        };

        let elements = ContactElements {
            form,
            success_message: doc.get_element_by_id("success-message"),
            close_success: doc.get_element_by_id("close-success"),
            required_fields: doc.query_within(form, REQUIRED_FIELDS),
        };

        let registry = &mut self.listeners;
        registry.add_to(doc, Some(form), EventType::Submit, ContactAction::Submit);
        registry.add_to(doc, elements.close_success, EventType::Click, ContactAction::CloseSuccess);
        registry.add_to(doc, elements.success_message, EventType::Click, ContactAction::SuccessBackdrop);
        registry.add(
            doc,
            EventTarget::Document,
            EventType::KeyDown,
            ListenerOptions::default(),
            ContactAction::KeyDown,
        );
        for &field in &elements.required_fields {
            registry.add_to(doc, Some(field), EventType::Blur, ContactAction::ValidateOnBlur);
            registry.add_to(doc, Some(field), EventType::Input, ContactAction::ClearOnInput);
        }

        info!(
            "Contact form attached ({} required fields)",
            elements.required_fields.len()
        );
        self.elements = Some(elements);
        true
    }

    /// Run the action behind `invocation`, or `None` when the listener is
    /// not one of ours.
    pub fn handle(
        &mut self,
        doc: &mut Document,
        invocation: &Invocation,
        event: &DomEvent,
    ) -> Option<ContactOutcome> {
        let action = *self.listeners.action(invocation.listener)?;
        let current = match invocation.current_target {
            EventTarget::Element(element) => Some(element),
            EventTarget::Document => None,
        };

        match action {
            ContactAction::Submit => {
                if self.validate_form(doc) {
                    return Some(ContactOutcome::Submit(self.collect_params(doc)));
                }
            }
            ContactAction::ValidateOnBlur => {
                if let Some(field) = current {
                    self.validate_field(doc, field);
                }
            }
            ContactAction::ClearOnInput => {
                if let Some(field) = current.filter(|&f| doc.has_class(f, "error")) {
                    doc.remove_class(field, "error");
                    remove_field_error(doc, field);
                }
            }
            ContactAction::CloseSuccess => self.hide_success(doc),
            ContactAction::SuccessBackdrop => {
                if current == Some(event.target) {
                    self.hide_success(doc);
                }
            }
            ContactAction::KeyDown => {
                if event.key() == Some("Escape") && self.is_success_visible(doc) {
                    self.hide_success(doc);
                }
            }
        }
        Some(ContactOutcome::Handled)
    }

    // ==================== Validation ====================

    /// Validate one field, showing or clearing its inline error.
    pub fn validate_field(&self, doc: &mut Document, field: ElementId) -> bool {
        doc.remove_class(field, "error");
        remove_field_error(doc, field);

        let kind = FieldKind::from_input_type(doc.attribute(field, "type"));
        let required = doc.has_attribute(field, "required");
        match validate_value(kind, required, &doc.value(field)) {
            Ok(()) => true,
            Err(e) => {
                doc.add_class(field, "error");
                show_field_error(doc, field, &e.to_string());
                false
            }
        }
    }

    /// Validate every required field, reporting all failures at once.
    pub fn validate_form(&self, doc: &mut Document) -> bool {
        let Some(elements) = &self.elements else {
            return false;
        };
        let mut valid = true;
        for &field in &elements.required_fields {
            if !self.validate_field(doc, field) {
                valid = false;
            }
        }
        valid
    }

    /// Package the form into the template's fixed fields.
    pub fn collect_params(&self, doc: &Document) -> TemplateParams {
        let data = self
            .elements
            .as_ref()
            .map(|el| form_data(doc, el.form))
            .unwrap_or_default();
        let field = |name: &str, fallback: &str| {
            data.get(name)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };
        let newsletter = doc
            .get_element_by_id("newsletter")
            .is_some_and(|n| doc.is_checked(n));

        TemplateParams {
            to_email: self.to_email.clone(),
            from_name: field("name", ""),
            from_email: field("email", ""),
            phone: field("phone", "Not provided"),
            level: field("level", "Not specified"),
            interest: field("interest", "Not specified"),
            message: field("message", ""),
            newsletter: if newsletter { "Yes" } else { "No" }.to_string(),
        }
    }

    // ==================== Submission ====================

    /// Send through `relay`, showing progress on the submit button and the
    /// outcome on the page. No retry.
    pub async fn submit(
        &mut self,
        doc: &mut Document,
        relay: Option<&dyn EmailRelay>,
        params: TemplateParams,
    ) -> Result<(), RelayError> {
        let button = self.begin_sending(doc);
        let result = match relay {
            Some(relay) => relay.send(&params).await,
            None => Err(RelayError::NotConfigured),
        };
        self.finish_sending(doc, button, &result);
        result
    }

    fn begin_sending(&self, doc: &mut Document) -> Option<(ElementId, String)> {
        let form = self.elements.as_ref()?.form;
        let button = doc.query_within(form, ".submit-btn").into_iter().next()?;
        let original = doc.text_content(button);
        doc.set_text_content(button, "Sending...");
        doc.set_attribute(button, "disabled", "");
        Some((button, original))
    }

    fn finish_sending(
        &mut self,
        doc: &mut Document,
        button: Option<(ElementId, String)>,
        result: &Result<(), RelayError>,
    ) {
        if let Some((button, original)) = button {
            doc.set_text_content(button, &original);
            doc.remove_attribute(button, "disabled");
        }

        match result {
            Ok(()) => {
                self.show_success(doc);
                if let Some(elements) = &self.elements {
                    reset_form(doc, elements.form);
                }
            }
            Err(e) => {
                error!("Email sending failed: {}", e);
                self.show_error(doc, SEND_FAILED_MESSAGE);
            }
        }
    }

    // ==================== Feedback ====================

    pub fn show_success(&self, doc: &mut Document) {
        if let Some(panel) = self.elements.as_ref().and_then(|el| el.success_message) {
            doc.set_style(panel, "display", "flex");
            doc.add_class(panel, "show");
        }
    }

    pub fn hide_success(&self, doc: &mut Document) {
        if let Some(panel) = self.elements.as_ref().and_then(|el| el.success_message) {
            doc.remove_class(panel, "show");
            doc.set_style(panel, "display", "none");
        }
    }

    pub fn is_success_visible(&self, doc: &Document) -> bool {
        self.elements
            .as_ref()
            .and_then(|el| el.success_message)
            .is_some_and(|panel| doc.style(panel, "display") == Some("flex"))
    }

    /// Show `message` in the banner at the top of the form, replacing any
    /// current message and restarting its dismissal timer.
    pub fn show_error(&mut self, doc: &mut Document, message: &str) {
        let Some(form) = self.elements.as_ref().map(|el| el.form) else {
            return;
        };
        let banner = match doc.query_selector(".form-error-message") {
            Some(existing) => existing,
            None => {
                let banner = doc.create_element("div");
                doc.add_class(banner, "form-error-message");
                doc.set_attribute(
                    banner,
                    "style",
                    "background-color: #f8d7da; color: #721c24; padding: 1rem; \
                     border-radius: 4px; margin-bottom: 1rem; border: 1px solid #f5c6cb",
                );
                doc.prepend_child(form, banner);
                banner
            }
        };
        doc.set_text_content(banner, message);
        self.banner = Some(ErrorBanner {
            element: banner,
            deadline: Instant::now() + self.banner_timeout,
        });
    }

    pub fn banner_deadline(&self) -> Option<Instant> {
        self.banner.map(|b| b.deadline)
    }

    /// Remove the error banner once its deadline has passed.
    pub fn expire_banner(&mut self, doc: &mut Document, now: Instant) -> bool {
        match self.banner {
            Some(banner) if banner.deadline <= now => {
                doc.remove(banner.element);
                self.banner = None;
                true
            }
            _ => false,
        }
    }

    /// Detach listeners and drop the pending banner dismissal.
    pub fn detach(&mut self, doc: &mut Document) -> usize {
        self.banner = None;
        self.elements = None;
        self.listeners.detach_all(doc)
    }
}

/// Field values by `name`, skipping unchecked checkboxes and radios.
fn form_data(doc: &Document, form: ElementId) -> HashMap<String, String> {
    let mut data = HashMap::new();
    for control in doc.query_within(form, "input, select, textarea") {
        let Some(name) = doc.attribute(control, "name") else {
            continue;
        };
        let checkable = matches!(doc.attribute(control, "type"), Some("checkbox" | "radio"));
        if checkable && !doc.is_checked(control) {
            continue;
        }
        data.insert(name.to_string(), doc.value(control));
    }
    data
}

fn reset_form(doc: &mut Document, form: ElementId) {
    for control in doc.query_within(form, "input, select, textarea") {
        let tag = doc.tag(control).to_string();
        let input_type = doc.attribute(control, "type").map(str::to_ascii_lowercase);
        match (tag.as_str(), input_type.as_deref()) {
            ("input", Some("checkbox" | "radio")) => doc.set_checked(control, false),
            ("input", Some("submit" | "button" | "hidden")) => {}
            ("textarea", _) => doc.set_text_content(control, ""),
            _ => doc.remove_attribute(control, "value"),
        }
    }
}

fn error_message_for(doc: &Document, field: ElementId) -> Option<ElementId> {
    let parent = doc.parent(field)?;
    doc.query_within(parent, ".error-message").into_iter().next()
}

fn remove_field_error(doc: &mut Document, field: ElementId) {
    if let Some(existing) = error_message_for(doc, field) {
        doc.remove(existing);
    }
}

fn show_field_error(doc: &mut Document, field: ElementId, message: &str) {
    remove_field_error(doc, field);
    let Some(parent) = doc.parent(field) else {
        return;
    };
    let note = doc.create_element("div");
    doc.add_class(note, "error-message");
    doc.set_text_content(note, message);
    doc.set_style(note, "color", "#dc3545");
    doc.set_style(note, "font-size", "0.85rem");
    doc.set_style(note, "margin-top", "0.25rem");
    doc.append_child(parent, note);
}
