//! DOM events delivered to the page.

use super::ElementId;

/// Event names listeners can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    KeyDown,
    Change,
    Input,
    Blur,
    Submit,
}

/// Event payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Click,
    KeyDown { key: String },
    /// The control's new value (select or input).
    Change { value: String },
    /// The field's value after the keystroke.
    Input { value: String },
    Blur,
    Submit,
}

/// An event dispatched at an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub target: ElementId,
    pub kind: EventKind,
}

impl DomEvent {
    pub fn click(target: ElementId) -> Self {
        Self {
            target,
            kind: EventKind::Click,
        }
    }

    pub fn key_down(target: ElementId, key: &str) -> Self {
        Self {
            target,
            kind: EventKind::KeyDown {
                key: key.to_string(),
            },
        }
    }

    pub fn change(target: ElementId, value: &str) -> Self {
        Self {
            target,
            kind: EventKind::Change {
                value: value.to_string(),
            },
        }
    }

    pub fn input(target: ElementId, value: &str) -> Self {
        Self {
            target,
            kind: EventKind::Input {
                value: value.to_string(),
            },
        }
    }

    pub fn blur(target: ElementId) -> Self {
        Self {
            target,
            kind: EventKind::Blur,
        }
    }

    pub fn submit(target: ElementId) -> Self {
        Self {
            target,
            kind: EventKind::Submit,
        }
    }

    pub fn event_type(&self) -> EventType {
        match self.kind {
            EventKind::Click => EventType::Click,
            EventKind::KeyDown { .. } => EventType::KeyDown,
            EventKind::Change { .. } => EventType::Change,
            EventKind::Input { .. } => EventType::Input,
            EventKind::Blur => EventType::Blur,
            EventKind::Submit => EventType::Submit,
        }
    }

    /// The pressed key, for keyboard events.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            EventKind::KeyDown { key } => Some(key),
            _ => None,
        }
    }

    /// The carried value, for change and input events.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Change { value } | EventKind::Input { value } => Some(value),
            _ => None,
        }
    }
}
