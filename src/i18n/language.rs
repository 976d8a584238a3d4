//! Language code: validated identifier used as cache key and URL segment.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid language code {code:?}: expected language[-region], e.g. \"es\" or \"pt-BR\"")]
pub struct InvalidLanguageCode {
    pub code: String,
}

/// A language code safe to embed in a resource path.
///
/// Accepts ASCII letters and digits separated by single hyphens, at most 20
/// characters. Rejects anything that could escape the translations directory
/// (`..`, `/`, `%2e`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Validate a language code.
    ///
    /// # Example
    /// ```
    /// use speaknow_site::i18n::LanguageCode;
    ///
    /// let spanish = LanguageCode::parse("es").unwrap();
    /// assert_eq!(spanish.as_str(), "es");
    /// assert!(LanguageCode::parse("../secrets").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Self, InvalidLanguageCode> {
        let valid = !code.is_empty()
            && code.len() <= 20
            && code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !code.starts_with('-')
            && !code.ends_with('-')
            && !code.contains("--");

        if valid {
            Ok(Self(code.to_string()))
        } else {
            Err(InvalidLanguageCode {
                code: code.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
