//! A deliberately small CSS selector subset.
//!
//! Supported: type selectors (`a`, `*`), `.class`, `#id`, `[attr]`, compound
//! forms like `input[required]`, descendant combination with whitespace
//! (`.nav-center a`) and comma-separated lists.

use super::DomError;

/// One compound selector, e.g. `input.error[required]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attributes: Vec<String>,
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Each alternative is a descendant chain, outermost compound first.
    pub(crate) alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    /// Parse a selector string.
    ///
    /// # Errors
    /// Returns `DomError::InvalidSelector` for empty input, empty list entries
    /// and any syntax outside the supported subset.
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let invalid = |reason: &str| DomError::InvalidSelector {
            selector: source.to_string(),
            reason: reason.to_string(),
        };

        if source.trim().is_empty() {
            return Err(invalid("selector is empty"));
        }

        let mut alternatives = Vec::new();
        for alternative in source.split(',') {
            let chain = alternative
                .split_whitespace()
                .map(parse_compound)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| invalid(&reason))?;

            if chain.is_empty() {
                return Err(invalid("empty entry in selector list"));
            }
            alternatives.push(chain);
        }

        Ok(Self { alternatives })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn parse_compound(source: &str) -> Result<Compound, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut compound = Compound::default();
    let mut pos = 0;

    if chars.first() == Some(&'*') {
        pos = 1;
    } else {
        let (tag, end) = take_ident(&chars, 0);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
            pos = end;
        }
    }

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                let (class, end) = take_ident(&chars, pos + 1);
                if class.is_empty() {
                    return Err(format!("missing class name at offset {}", pos));
                }
                compound.classes.push(class);
                pos = end;
            }
            '#' => {
                let (id, end) = take_ident(&chars, pos + 1);
                if id.is_empty() {
                    return Err(format!("missing id at offset {}", pos));
                }
                compound.id = Some(id);
                pos = end;
            }
            '[' => {
                let (attr, end) = take_ident(&chars, pos + 1);
                if attr.is_empty() || chars.get(end) != Some(&']') {
                    return Err(format!("malformed attribute selector at offset {}", pos));
                }
                compound.attributes.push(attr.to_ascii_lowercase());
                pos = end + 1;
            }
            other => return Err(format!("unsupported character '{}' at offset {}", other, pos)),
        }
    }

    Ok(compound)
}
