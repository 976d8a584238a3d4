//! In-process document model the site controllers run against.
//!
//! Mirrors the slice of the browser DOM the site needs: an element tree with
//! classes, attributes and inline styles, a selector subset, HTML parsing for
//! injected markup, and listener bookkeeping with capture/bubble ordering.

mod document;
mod event;
mod selector;

pub use document::{Document, ElementId, EventTarget, Invocation, ListenerId, ListenerOptions};
pub use event::{DomEvent, EventKind, EventType};
pub use selector::Selector;

/// Errors raised by the document model.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}
