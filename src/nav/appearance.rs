//! Theme and font-size application.

use crate::config::FontSizes;
use crate::dom::Document;

/// Body class marking dark mode.
pub const DARK_THEME_CLASS: &str = "dark-theme";

/// `dark` enables dark mode, anything else disables it.
pub fn set_theme(doc: &mut Document, theme: &str) {
    let body = doc.body();
    if theme == "dark" {
        doc.add_class(body, DARK_THEME_CLASS);
    } else {
        doc.remove_class(body, DARK_THEME_CLASS);
    }
}

/// Set the root font size from a size name, returning the pixel value used.
pub fn set_font_size<'a>(doc: &mut Document, sizes: &'a FontSizes, name: &str) -> &'a str {
    let pixels = sizes.resolve(name);
    let root = doc.root();
    doc.set_style(root, "font-size", pixels);
    pixels
}
