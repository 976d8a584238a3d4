//! One-time lookup of the elements the navigation controller drives.

use crate::dom::{Document, ElementId};

/// Selector of the element init waits for.
pub const ANCHOR_SELECTOR: &str = ".hamburger";

/// References captured after the header markup is in place. Any of them may
/// be absent on a given page; consumers treat absence as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundElements {
    pub hamburger: Option<ElementId>,
    pub nav_center: Option<ElementId>,
    pub close_btn: Option<ElementId>,
    pub overlay: ElementId,
    pub dropdown: Option<ElementId>,
    pub dropbtn: Option<ElementId>,
    pub theme_select: Option<ElementId>,
    pub font_select: Option<ElementId>,
    pub lang_select: Option<ElementId>,
    pub nav_links: Vec<ElementId>,
}

impl BoundElements {
    pub fn bind(doc: &mut Document) -> Self {
        Self {
            hamburger: doc.query_selector(ANCHOR_SELECTOR),
            nav_center: doc.query_selector(".nav-center"),
            close_btn: doc.query_selector(".close-btn"),
            overlay: get_or_create_overlay(doc),
            dropdown: doc.query_selector(".dropdown"),
            dropbtn: doc.query_selector(".dropbtn"),
            theme_select: doc.get_element_by_id("theme-select"),
            font_select: doc.get_element_by_id("font-select"),
            lang_select: doc.get_element_by_id("lang-select"),
            nav_links: doc.query_selector_all(".nav-center a"),
        }
    }
}

/// Reuse the page's `.overlay`, or append a hidden one to the body.
fn get_or_create_overlay(doc: &mut Document) -> ElementId {
    if let Some(existing) = doc.query_selector(".overlay") {
        return existing;
    }
    let overlay = doc.create_element("div");
    doc.add_class(overlay, "overlay");
    doc.set_attribute(overlay, "aria-hidden", "true");
    let body = doc.body();
    doc.append_child(body, overlay);
    overlay
}
