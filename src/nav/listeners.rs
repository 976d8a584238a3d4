//! Listener registry: every listener a component attaches, kept so teardown
//! can detach them symmetrically.

use crate::dom::{Document, ElementId, EventTarget, EventType, ListenerId, ListenerOptions};

#[derive(Debug, Clone)]
pub struct Registration<A> {
    pub id: ListenerId,
    pub target: EventTarget,
    pub event: EventType,
    pub options: ListenerOptions,
    pub action: A,
}

/// Attached listeners and the typed action each one performs.
#[derive(Debug, Clone)]
pub struct ListenerRegistry<A> {
    entries: Vec<Registration<A>>,
}

impl<A> Default for ListenerRegistry<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A> ListenerRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener and record it.
    pub fn add(
        &mut self,
        doc: &mut Document,
        target: EventTarget,
        event: EventType,
        options: ListenerOptions,
        action: A,
    ) -> ListenerId {
        let id = doc.add_event_listener(target, event, options);
        self.entries.push(Registration {
            id,
            target,
            event,
            options,
            action,
        });
        id
    }

    /// Attach to an optional element. Absent elements are skipped.
    pub fn add_to(
        &mut self,
        doc: &mut Document,
        element: Option<ElementId>,
        event: EventType,
        action: A,
    ) -> Option<ListenerId> {
        let element = element?;
        Some(self.add(
            doc,
            EventTarget::Element(element),
            event,
            ListenerOptions::default(),
            action,
        ))
    }

    pub fn action(&self, id: ListenerId) -> Option<&A> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.action)
    }

    pub fn registrations(&self) -> &[Registration<A>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Detach everything and clear the registry. Returns how many listeners
    /// were detached.
    pub fn detach_all(&mut self, doc: &mut Document) -> usize {
        self.entries
            .drain(..)
            .filter(|entry| doc.remove_event_listener(entry.id))
            .count()
    }
}
