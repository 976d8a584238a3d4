//! Active navigation link detection.

use crate::dom::{Document, ElementId};

/// Last path segment, `index.html` when the path ends in a slash.
pub fn current_page(path: &str) -> &str {
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => "index.html",
    }
}

/// An empty page and `index.html` are the same page.
pub fn is_current_page(link_href: &str, current_page: &str) -> bool {
    link_href == current_page || (current_page.is_empty() && link_href == "index.html")
}

/// Mark the links pointing at the page at `path` with the `active` class and
/// `aria-current="page"`, clearing both from every other link.
pub fn mark_active_links(doc: &mut Document, links: &[ElementId], path: &str) -> Vec<ElementId> {
    let page = current_page(path).to_string();
    let mut active = Vec::new();

    for &link in links {
        doc.remove_class(link, "active");
    }

    for &link in links {
        let matches = doc
            .attribute(link, "href")
            .is_some_and(|href| is_current_page(href, &page));
        if matches {
            doc.add_class(link, "active");
            doc.set_attribute(link, "aria-current", "page");
            active.push(link);
        } else {
            doc.remove_attribute(link, "aria-current");
        }
    }
    active
}
