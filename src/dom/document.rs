//! Arena-backed element tree standing in for the browser document.

use super::event::{DomEvent, EventType};
use super::selector::{Compound, Selector};
use scraper::{ElementRef, Html, Node};
use std::collections::BTreeMap;
use tracing::debug;

/// Handle to an element owned by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Handle to an attached event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Document,
    Element(ElementId),
}

/// Options passed when attaching a listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase.
    pub capture: bool,
}

/// One listener call produced by [`Document::dispatch_plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub listener: ListenerId,
    pub current_target: EventTarget,
}

#[derive(Debug, Clone)]
enum Child {
    Element(ElementId),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct ElementNode {
    tag: String,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
    style: Vec<(String, String)>,
    parent: Option<ElementId>,
    children: Vec<Child>,
}

impl ElementNode {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            classes: Vec::new(),
            style: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct ListenerRecord {
    target: EventTarget,
    event: EventType,
    options: ListenerOptions,
}

/// Elements whose text children are serialized verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// An HTML document: element tree, location and attached listeners.
#[derive(Debug, Clone)]
pub struct Document {
    elements: Vec<ElementNode>,
    root: ElementId,
    body: ElementId,
    location_path: String,
    /// Doctype name from the parsed source, e.g. `html`
    doctype: Option<String>,
    listeners: BTreeMap<ListenerId, ListenerRecord>,
    next_listener: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `<html><head></head><body></body></html>` document.
    pub fn new() -> Self {
        let mut doc = Self {
            elements: vec![ElementNode::new("html")],
            root: ElementId(0),
            body: ElementId(0),
            location_path: String::new(),
            doctype: None,
            listeners: BTreeMap::new(),
            next_listener: 0,
        };
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        doc.append_child(doc.root, head);
        doc.append_child(doc.root, body);
        doc.body = body;
        doc
    }

    /// Parse a complete HTML page.
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let source_root = html.root_element();

        let mut doc = Self {
            elements: vec![ElementNode::new(source_root.value().name())],
            root: ElementId(0),
            body: ElementId(0),
            location_path: String::new(),
            doctype: None,
            listeners: BTreeMap::new(),
            next_listener: 0,
        };
        doc.doctype = html.tree.root().children().find_map(|node| match node.value() {
            Node::Doctype(doctype) => Some(doctype.name().to_string()),
            _ => None,
        });
        for (name, value) in source_root.value().attrs() {
            doc.set_attribute(doc.root, name, value);
        }
        doc.import_children(doc.root, source_root);

        let existing_body = doc
            .child_elements(doc.root)
            .find(|&id| doc.tag(id) == "body");
        doc.body = match existing_body {
            Some(body) => body,
            None => {
                let body = doc.create_element("body");
                doc.append_child(doc.root, body);
                body
            }
        };
        doc
    }

    /// Set the page's location path (e.g. `/courses/index.html`).
    pub fn with_location(mut self, path: &str) -> Self {
        self.location_path = path.to_string();
        self
    }

    pub fn location_path(&self) -> &str {
        &self.location_path
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    // ==================== Tree ====================

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.elements.push(ElementNode::new(tag));
        ElementId(self.elements.len() - 1)
    }

    pub fn tag(&self, id: ElementId) -> &str {
        &self.elements[id.0].tag
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements[id.0].parent
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        self.detach(child);
        self.elements[parent.0].children.push(Child::Element(child));
        self.elements[child.0].parent = Some(parent);
    }

    /// Insert `child` as the first child of `parent`, detaching it first.
    pub fn prepend_child(&mut self, parent: ElementId, child: ElementId) {
        self.detach(child);
        self.elements[parent.0]
            .children
            .insert(0, Child::Element(child));
        self.elements[child.0].parent = Some(parent);
    }

    /// Remove an element from the tree. Its listeners stay attached.
    pub fn remove(&mut self, id: ElementId) {
        self.detach(id);
    }

    /// Whether the element is reachable from the root.
    pub fn is_connected(&self, id: ElementId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub fn child_elements(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.elements[id.0].children.iter().filter_map(|child| match child {
            Child::Element(el) => Some(*el),
            Child::Text(_) | Child::Comment(_) => None,
        })
    }

    fn detach(&mut self, id: ElementId) {
        if let Some(parent) = self.elements[id.0].parent.take() {
            self.elements[parent.0]
                .children
                .retain(|child| !matches!(child, Child::Element(el) if *el == id));
        }
    }

    fn clear_children(&mut self, id: ElementId) {
        let children = std::mem::take(&mut self.elements[id.0].children);
        for child in children {
            if let Child::Element(el) = child {
                self.elements[el.0].parent = None;
            }
        }
    }

    fn push_text(&mut self, parent: ElementId, text: &str) {
        if !text.is_empty() {
            self.elements[parent.0]
                .children
                .push(Child::Text(text.to_string()));
        }
    }

    fn import_children(&mut self, parent: ElementId, source: ElementRef<'_>) {
        for child in source.children() {
            match child.value() {
                Node::Text(text) => self.push_text(parent, text),
                Node::Comment(comment) => {
                    let comment: &str = comment;
                    self.elements[parent.0]
                        .children
                        .push(Child::Comment(comment.to_string()));
                }
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        let id = self.import_element(element);
                        self.append_child(parent, id);
                    }
                }
                _ => {}
            }
        }
    }

    fn import_element(&mut self, source: ElementRef<'_>) -> ElementId {
        let id = self.create_element(source.value().name());
        for (name, value) in source.value().attrs() {
            self.set_attribute(id, name, value);
        }
        self.import_children(id, source);
        id
    }

    // ==================== Content ====================

    /// Replace the element's children with parsed markup.
    pub fn set_inner_html(&mut self, id: ElementId, markup: &str) {
        self.clear_children(id);
        let fragment = Html::parse_fragment(markup);
        self.import_children(id, fragment.root_element());
    }

    pub fn set_text_content(&mut self, id: ElementId, text: &str) {
        self.clear_children(id);
        self.push_text(id, text);
    }

    pub fn text_content(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ElementId, out: &mut String) {
        for child in &self.elements[id.0].children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(el) => self.collect_text(*el, out),
                Child::Comment(_) => {}
            }
        }
    }

    pub fn inner_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_children(id, &mut out);
        out
    }

    pub fn outer_html(&self, id: ElementId) -> String {
        let mut out = String::new();
        self.write_element(id, &mut out);
        out
    }

    /// The whole page, doctype included when the source had one.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str(&format!("<!DOCTYPE {}>\n", doctype));
        }
        self.write_element(self.root, &mut out);
        out
    }

    fn write_children(&self, id: ElementId, out: &mut String) {
        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag(id));
        for child in &self.elements[id.0].children {
            match child {
                Child::Text(text) if raw => out.push_str(text),
                Child::Text(text) => out.push_str(&escape_text(text)),
                Child::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
                Child::Element(el) => self.write_element(*el, out),
            }
        }
    }

    fn write_element(&self, id: ElementId, out: &mut String) {
        let node = &self.elements[id.0];
        out.push('<');
        out.push_str(&node.tag);
        if !node.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", escape_attr(&node.classes.join(" "))));
        }
        for (name, value) in &node.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
        }
        if let Some(style) = self.attribute_style(id) {
            out.push_str(&format!(" style=\"{}\"", escape_attr(&style)));
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&node.tag.as_str()) {
            return;
        }
        self.write_children(id, out);
        out.push_str(&format!("</{}>", node.tag));
    }

    // ==================== Classes ====================

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.elements[id.0].classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if !self.has_class(id, class) {
            self.elements[id.0].classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        self.elements[id.0].classes.retain(|c| c != class);
    }

    /// Flip a class and return whether it is now present.
    pub fn toggle_class(&mut self, id: ElementId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            true
        }
    }

    // ==================== Attributes ====================

    /// Read an attribute. `class` is reported but `style` is only reachable
    /// through [`Document::style`].
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        let node = &self.elements[id.0];
        node.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        match name {
            "class" => !self.elements[id.0].classes.is_empty(),
            "style" => !self.elements[id.0].style.is_empty(),
            _ => self.attribute(id, name).is_some(),
        }
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let node = &mut self.elements[id.0];
        match name.as_str() {
            "class" => {
                node.classes = value.split_whitespace().map(str::to_string).collect();
            }
            "style" => {
                node.style = parse_style(value);
            }
            _ => match node.attributes.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => node.attributes.push((name, value.to_string())),
            },
        }
    }

    pub fn remove_attribute(&mut self, id: ElementId, name: &str) {
        let node = &mut self.elements[id.0];
        match name {
            "class" => node.classes.clear(),
            "style" => node.style.clear(),
            _ => node.attributes.retain(|(n, _)| n != name),
        }
    }

    // ==================== Inline style ====================

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.elements[id.0]
            .style
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set an inline style property. An empty value removes it.
    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) {
        let style = &mut self.elements[id.0].style;
        if value.is_empty() {
            style.retain(|(p, _)| p != property);
            return;
        }
        match style.iter_mut().find(|(p, _)| p == property) {
            Some((_, existing)) => *existing = value.to_string(),
            None => style.push((property.to_string(), value.to_string())),
        }
    }

    fn attribute_style(&self, id: ElementId) -> Option<String> {
        let style = &self.elements[id.0].style;
        if style.is_empty() {
            return None;
        }
        Some(
            style
                .iter()
                .map(|(p, v)| format!("{}: {};", p, v))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    // ==================== Form controls ====================

    /// Current value of a form control.
    pub fn value(&self, id: ElementId) -> String {
        match self.tag(id) {
            "textarea" => self.text_content(id),
            "select" => {
                if let Some(value) = self.attribute(id, "value") {
                    return value.to_string();
                }
                let options: Vec<_> = self
                    .query_within(id, "option")
                    .into_iter()
                    .collect();
                let chosen = options
                    .iter()
                    .find(|&&opt| self.has_attribute(opt, "selected"))
                    .or_else(|| options.first());
                chosen
                    .map(|&opt| {
                        self.attribute(opt, "value")
                            .map(str::to_string)
                            .unwrap_or_else(|| self.text_content(opt))
                    })
                    .unwrap_or_default()
            }
            _ => self.attribute(id, "value").unwrap_or_default().to_string(),
        }
    }

    pub fn set_value(&mut self, id: ElementId, value: &str) {
        if self.tag(id) == "textarea" {
            self.set_text_content(id, value);
        } else {
            self.set_attribute(id, "value", value);
        }
    }

    pub fn is_checked(&self, id: ElementId) -> bool {
        self.has_attribute(id, "checked")
    }

    pub fn set_checked(&mut self, id: ElementId, checked: bool) {
        if checked {
            self.set_attribute(id, "checked", "");
        } else {
            self.remove_attribute(id, "checked");
        }
    }

    // ==================== Queries ====================

    /// Connected elements in document order, root first.
    fn walk(&self, scope: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children: Vec<_> = self.child_elements(id).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    pub fn matches(&self, id: ElementId, selector: &Selector) -> bool {
        selector
            .alternatives
            .iter()
            .any(|chain| self.matches_chain(id, chain))
    }

    fn matches_chain(&self, id: ElementId, chain: &[Compound]) -> bool {
        let Some((last, mut remaining)) = chain.split_last() else {
            return false;
        };
        if !self.matches_compound(id, last) {
            return false;
        }

        let mut cursor = self.parent(id);
        while let Some((next, before)) = remaining.split_last() {
            loop {
                match cursor {
                    None => return false,
                    Some(ancestor) => {
                        cursor = self.parent(ancestor);
                        if self.matches_compound(ancestor, next) {
                            break;
                        }
                    }
                }
            }
            remaining = before;
        }
        true
    }

    fn matches_compound(&self, id: ElementId, compound: &Compound) -> bool {
        if let Some(tag) = &compound.tag {
            if self.tag(id) != tag {
                return false;
            }
        }
        if let Some(wanted) = &compound.id {
            if self.attribute(id, "id") != Some(wanted.as_str()) {
                return false;
            }
        }
        compound.classes.iter().all(|c| self.has_class(id, c))
            && compound
                .attributes
                .iter()
                .all(|a| self.has_attribute(id, a))
    }

    fn parse_selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Ignoring query: {}", e);
                None
            }
        }
    }

    /// First connected element matching `selector`, in document order.
    pub fn query_selector(&self, selector: &str) -> Option<ElementId> {
        let parsed = Self::parse_selector(selector)?;
        self.walk(self.root)
            .into_iter()
            .find(|&id| self.matches(id, &parsed))
    }

    /// All connected elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Vec<ElementId> {
        self.query_within(self.root, selector)
    }

    /// Descendants of `scope` (excluding `scope` itself) matching `selector`.
    pub fn query_within(&self, scope: ElementId, selector: &str) -> Vec<ElementId> {
        let Some(parsed) = Self::parse_selector(selector) else {
            return Vec::new();
        };
        self.walk(scope)
            .into_iter()
            .filter(|&id| id != scope || scope == self.root)
            .filter(|&id| self.matches(id, &parsed))
            .collect()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<ElementId> {
        self.walk(self.root)
            .into_iter()
            .find(|&el| self.attribute(el, "id") == Some(id))
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest(&self, id: ElementId, selector: &str) -> Option<ElementId> {
        let parsed = Self::parse_selector(selector)?;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.matches(current, &parsed) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    // ==================== Listeners ====================

    pub fn add_event_listener(
        &mut self,
        target: EventTarget,
        event: EventType,
        options: ListenerOptions,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(
            id,
            ListenerRecord {
                target,
                event,
                options,
            },
        );
        id
    }

    /// Detach a listener. Returns `false` if it was not attached.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners attached to `target` for `event`, in attachment order.
    pub fn listeners_on(&self, target: EventTarget, event: EventType) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, rec)| rec.target == target && rec.event == event)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Target, then ancestors, then the document when the target is connected.
    pub fn propagation_path(&self, target: ElementId) -> Vec<EventTarget> {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            path.push(EventTarget::Element(current));
            cursor = self.parent(current);
        }
        if self.is_connected(target) {
            path.push(EventTarget::Document);
        }
        path
    }

    /// Listener calls for `event` in DOM order: capture phase from the
    /// outermost ancestor down, all listeners on the target, then the bubble
    /// phase back out.
    pub fn dispatch_plan(&self, event: &DomEvent) -> Vec<Invocation> {
        let event_type = event.event_type();
        let path = self.propagation_path(event.target);
        let mut plan = Vec::new();

        let phase = |target: EventTarget, capture: bool, plan: &mut Vec<Invocation>| {
            for (id, rec) in &self.listeners {
                if rec.target == target && rec.event == event_type && rec.options.capture == capture
                {
                    plan.push(Invocation {
                        listener: *id,
                        current_target: target,
                    });
                }
            }
        };

        for &target in path.iter().skip(1).rev() {
            phase(target, true, &mut plan);
        }
        if let Some(&target) = path.first() {
            for id in self.listeners_on(target, event_type) {
                plan.push(Invocation {
                    listener: id,
                    current_target: target,
                });
            }
        }
        for &target in path.iter().skip(1) {
            phase(target, false, &mut plan);
        }
        plan
    }
}

fn parse_style(source: &str) -> Vec<(String, String)> {
    source
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let (prop, value) = (prop.trim(), value.trim());
            (!prop.is_empty() && !value.is_empty()).then(|| (prop.to_string(), value.to_string()))
        })
        .collect()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><title>Test</title></head>
<body>
  <nav>
    <button class="hamburger" aria-expanded="false">Menu</button>
    <ul class="nav-center" aria-hidden="true">
      <li><a href="index.html">Home</a></li>
      <li><a href="courses.html" class="link">Courses</a></li>
    </ul>
    <div class="dropdown"><button class="dropbtn">Prefs</button></div>
  </nav>
  <p data-i18n="hero.title">Learn Spanish</p>
  <input id="email" type="email" data-i18n-placeholder="form.email" required>
</body>
</html>"#;

    #[test]
    fn test_parse_builds_queryable_tree() {
        let doc = Document::parse(PAGE);
        assert_eq!(doc.tag(doc.root()), "html");
        assert_eq!(doc.attribute(doc.root(), "lang"), Some("en"));
        assert_eq!(doc.tag(doc.body()), "body");
        assert!(doc.query_selector(".hamburger").is_some());
        assert_eq!(doc.query_selector_all(".nav-center a").len(), 2);
        assert_eq!(doc.query_selector_all("[data-i18n]").len(), 1);
    }

    #[test]
    fn test_query_selector_returns_first_in_document_order() {
        let doc = Document::parse(PAGE);
        let first = doc.query_selector("a").unwrap();
        assert_eq!(doc.attribute(first, "href"), Some("index.html"));
    }

    #[test]
    fn test_query_selector_missing_and_invalid() {
        let doc = Document::parse(PAGE);
        assert!(doc.query_selector(".does-not-exist").is_none());
        assert!(doc.query_selector("a > b").is_none());
        assert!(doc.query_selector_all("a > b").is_empty());
    }

    #[test]
    fn test_compound_attribute_selector() {
        let doc = Document::parse(PAGE);
        let required = doc.query_selector_all("input[required], textarea[required]");
        assert_eq!(required.len(), 1);
        assert_eq!(doc.attribute(required[0], "id"), Some("email"));
    }

    #[test]
    fn test_get_element_by_id() {
        let doc = Document::parse(PAGE);
        let email = doc.get_element_by_id("email").unwrap();
        assert_eq!(doc.attribute(email, "type"), Some("email"));
        assert!(doc.get_element_by_id("nope").is_none());
    }

    #[test]
    fn test_class_operations() {
        let mut doc = Document::parse(PAGE);
        let nav = doc.query_selector(".nav-center").unwrap();

        doc.add_class(nav, "show");
        doc.add_class(nav, "show");
        assert!(doc.has_class(nav, "show"));
        assert!(doc.outer_html(nav).starts_with("<ul class=\"nav-center show\""));

        assert!(!doc.toggle_class(nav, "show"));
        assert!(!doc.has_class(nav, "show"));
        assert!(doc.toggle_class(nav, "show"));

        doc.remove_class(nav, "show");
        assert!(!doc.has_class(nav, "show"));
    }

    #[test]
    fn test_style_set_and_clear() {
        let mut doc = Document::new();
        let body = doc.body();

        doc.set_style(body, "overflow", "hidden");
        assert_eq!(doc.style(body, "overflow"), Some("hidden"));
        assert_eq!(doc.outer_html(body), "<body style=\"overflow: hidden;\"></body>");

        doc.set_style(body, "overflow", "");
        assert_eq!(doc.style(body, "overflow"), None);
        assert!(!doc.has_attribute(body, "style"));
    }

    #[test]
    fn test_style_attribute_is_parsed() {
        let doc = Document::parse(r#"<div id="x" style="display: none; color:red"></div>"#);
        let x = doc.get_element_by_id("x").unwrap();
        assert_eq!(doc.style(x, "display"), Some("none"));
        assert_eq!(doc.style(x, "color"), Some("red"));
    }

    #[test]
    fn test_set_inner_html_creates_queryable_elements() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_inner_html(body, r#"<header><button class="hamburger">=</button></header>"#);

        let hamburger = doc.query_selector(".hamburger").unwrap();
        assert_eq!(doc.text_content(hamburger), "=");
        assert!(doc.is_connected(hamburger));
    }

    #[test]
    fn test_set_inner_html_replaces_previous_children() {
        let mut doc = Document::parse(PAGE);
        let p = doc.query_selector("[data-i18n]").unwrap();
        doc.set_inner_html(p, "Aprende <strong>español</strong>");

        assert_eq!(doc.inner_html(p), "Aprende <strong>español</strong>");
        assert_eq!(doc.text_content(p), "Aprende español");
    }

    #[test]
    fn test_text_is_escaped_on_serialization() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_text_content(body, "a < b & c");
        assert_eq!(doc.inner_html(body), "a &lt; b &amp; c");
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let mut doc = Document::parse(PAGE);
        let nav = doc.query_selector("nav").unwrap();
        let link = doc.query_selector("a").unwrap();

        doc.remove(nav);
        assert!(!doc.is_connected(link));
        assert!(doc.query_selector(".hamburger").is_none());
    }

    #[test]
    fn test_prepend_child_goes_first() {
        let mut doc = Document::parse(r#"<form id="f"><input name="a"></form>"#);
        let form = doc.get_element_by_id("f").unwrap();
        let banner = doc.create_element("div");
        doc.prepend_child(form, banner);
        assert_eq!(doc.child_elements(form).next(), Some(banner));
    }

    #[test]
    fn test_closest_includes_self_and_ancestors() {
        let doc = Document::parse(PAGE);
        let dropbtn = doc.query_selector(".dropbtn").unwrap();
        let dropdown = doc.query_selector(".dropdown").unwrap();
        let hamburger = doc.query_selector(".hamburger").unwrap();

        assert_eq!(doc.closest(dropbtn, ".dropdown"), Some(dropdown));
        assert_eq!(doc.closest(dropdown, ".dropdown"), Some(dropdown));
        assert_eq!(doc.closest(hamburger, ".dropdown"), None);
    }

    #[test]
    fn test_form_values() {
        let mut doc = Document::parse(
            r#"<select id="s"><option value="a">A</option><option value="b" selected>B</option></select>
               <textarea id="t">hello</textarea>
               <input id="c" type="checkbox" checked>"#,
        );
        let select = doc.get_element_by_id("s").unwrap();
        let textarea = doc.get_element_by_id("t").unwrap();
        let checkbox = doc.get_element_by_id("c").unwrap();

        assert_eq!(doc.value(select), "b");
        doc.set_value(select, "a");
        assert_eq!(doc.value(select), "a");

        assert_eq!(doc.value(textarea), "hello");
        doc.set_value(textarea, "bye");
        assert_eq!(doc.value(textarea), "bye");

        assert!(doc.is_checked(checkbox));
        doc.set_checked(checkbox, false);
        assert!(!doc.is_checked(checkbox));
    }

    #[test]
    fn test_listener_add_and_remove() {
        let mut doc = Document::parse(PAGE);
        let hamburger = doc.query_selector(".hamburger").unwrap();

        let id = doc.add_event_listener(
            EventTarget::Element(hamburger),
            EventType::Click,
            ListenerOptions::default(),
        );
        assert_eq!(doc.listener_count(), 1);
        assert_eq!(
            doc.listeners_on(EventTarget::Element(hamburger), EventType::Click),
            vec![id]
        );

        assert!(doc.remove_event_listener(id));
        assert!(!doc.remove_event_listener(id));
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn test_dispatch_plan_bubbles_to_document() {
        let mut doc = Document::parse(PAGE);
        let dropbtn = doc.query_selector(".dropbtn").unwrap();
        let dropdown = doc.query_selector(".dropdown").unwrap();

        let on_doc = doc.add_event_listener(
            EventTarget::Document,
            EventType::Click,
            ListenerOptions::default(),
        );
        let on_btn = doc.add_event_listener(
            EventTarget::Element(dropbtn),
            EventType::Click,
            ListenerOptions::default(),
        );
        let on_dropdown = doc.add_event_listener(
            EventTarget::Element(dropdown),
            EventType::Click,
            ListenerOptions::default(),
        );

        let plan: Vec<_> = doc
            .dispatch_plan(&DomEvent::click(dropbtn))
            .into_iter()
            .map(|inv| inv.listener)
            .collect();
        assert_eq!(plan, vec![on_btn, on_dropdown, on_doc]);
    }

    #[test]
    fn test_dispatch_plan_capture_runs_first() {
        let mut doc = Document::parse(PAGE);
        let dropbtn = doc.query_selector(".dropbtn").unwrap();

        let bubble = doc.add_event_listener(
            EventTarget::Document,
            EventType::Click,
            ListenerOptions::default(),
        );
        let capture = doc.add_event_listener(
            EventTarget::Document,
            EventType::Click,
            ListenerOptions { capture: true },
        );
        let target = doc.add_event_listener(
            EventTarget::Element(dropbtn),
            EventType::Click,
            ListenerOptions::default(),
        );

        let plan: Vec<_> = doc
            .dispatch_plan(&DomEvent::click(dropbtn))
            .into_iter()
            .map(|inv| inv.listener)
            .collect();
        assert_eq!(plan, vec![capture, target, bubble]);
    }

    #[test]
    fn test_dispatch_plan_ignores_other_event_types() {
        let mut doc = Document::parse(PAGE);
        let hamburger = doc.query_selector(".hamburger").unwrap();
        doc.add_event_listener(
            EventTarget::Document,
            EventType::KeyDown,
            ListenerOptions::default(),
        );
        assert!(doc.dispatch_plan(&DomEvent::click(hamburger)).is_empty());
    }

    #[test]
    fn test_detached_target_does_not_reach_document() {
        let mut doc = Document::new();
        let orphan = doc.create_element("div");
        assert_eq!(
            doc.propagation_path(orphan),
            vec![EventTarget::Element(orphan)]
        );
    }

    #[test]
    fn test_to_html_keeps_doctype_comments_and_script_text() {
        let doc = Document::parse(
            "<!DOCTYPE html><html><head><script>if (a < b && c) { go(); }</script>\
             <style>p > a { color: red; }</style></head>\
             <body><!-- analytics --><p>Fish &amp; chips</p></body></html>",
        );

        let html = doc.to_html();

        assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
        assert!(html.contains("<script>if (a < b && c) { go(); }</script>"));
        assert!(html.contains("<style>p > a { color: red; }</style>"));
        assert!(html.contains("<!-- analytics -->"));
        assert!(html.contains("<p>Fish &amp; chips</p>"));

        let body = doc.body();
        assert_eq!(doc.text_content(body), "Fish & chips");
    }

    #[test]
    fn test_to_html_without_doctype() {
        let doc = Document::new();
        assert_eq!(doc.to_html(), "<html><head></head><body></body></html>");
    }
}
