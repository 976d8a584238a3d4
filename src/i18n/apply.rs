//! Rewriting page text from a translation dictionary.

use super::dictionary::TranslationDictionary;
use super::loader::TranslationLoader;
use crate::dom::{Document, ElementId};
use tracing::{debug, warn};

/// Marks an element whose content is replaced by the translation.
pub const CONTENT_KEY_ATTR: &str = "data-i18n";
/// Marks an element whose `placeholder` attribute is replaced.
pub const PLACEHOLDER_KEY_ATTR: &str = "data-i18n-placeholder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationTarget {
    Content,
    Placeholder,
}

/// One translatable slot found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationBinding {
    pub element: ElementId,
    pub target: TranslationTarget,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Slots rewritten from the dictionary
    pub applied: usize,
    /// Keys with no entry, in document order
    pub missing: Vec<String>,
}

/// Scan the document once for both kinds of translation markers.
pub fn collect_bindings(doc: &Document) -> Vec<TranslationBinding> {
    let selector = format!("[{}], [{}]", CONTENT_KEY_ATTR, PLACEHOLDER_KEY_ATTR);
    let mut bindings = Vec::new();

    for element in doc.query_selector_all(&selector) {
        for (attr, target) in [
            (CONTENT_KEY_ATTR, TranslationTarget::Content),
            (PLACEHOLDER_KEY_ATTR, TranslationTarget::Placeholder),
        ] {
            if let Some(key) = doc.attribute(element, attr) {
                bindings.push(TranslationBinding {
                    element,
                    target,
                    key: key.to_string(),
                });
            }
        }
    }
    bindings
}

/// Apply `language`'s dictionary to the given bindings. Elements whose key
/// is missing keep their current content.
pub fn apply_bindings(
    doc: &mut Document,
    bindings: &[TranslationBinding],
    language: &str,
    dictionary: &TranslationDictionary,
) -> ApplyReport {
    let mut report = ApplyReport::default();

    for binding in bindings {
        let Some(text) = dictionary.get(&binding.key) else {
            warn!(language = %language, "Translation key not found: {}", binding.key);
            report.missing.push(binding.key.clone());
            continue;
        };

        match binding.target {
            TranslationTarget::Content => doc.set_inner_html(binding.element, text),
            TranslationTarget::Placeholder => {
                doc.set_attribute(binding.element, "placeholder", text)
            }
        }
        report.applied += 1;
    }
    report
}

/// Set the document language, load its dictionary and rewrite every marked
/// element.
pub async fn apply_translations(
    doc: &mut Document,
    loader: &TranslationLoader,
    language: &str,
) -> ApplyReport {
    let root = doc.root();
    doc.set_attribute(root, "lang", language);

    let dictionary = loader.load(language).await;
    apply_dictionary(doc, language, &dictionary)
}

/// Rewrite every marked element from an already loaded dictionary and tag
/// the document with its language.
pub fn apply_dictionary(
    doc: &mut Document,
    language: &str,
    dictionary: &TranslationDictionary,
) -> ApplyReport {
    let root = doc.root();
    doc.set_attribute(root, "lang", language);

    let bindings = collect_bindings(doc);
    let report = apply_bindings(doc, &bindings, language, dictionary);

    debug!(
        "Applied {} translations for {} ({} missing)",
        report.applied,
        language,
        report.missing.len()
    );
    report
}
