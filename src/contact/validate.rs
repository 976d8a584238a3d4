//! Client-side field validation for the contact form.

use regex::Regex;
use std::sync::OnceLock;

/// How a field's value is checked, from its `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
}

impl FieldKind {
    pub fn from_input_type(input_type: Option<&str>) -> Self {
        match input_type.map(str::to_ascii_lowercase).as_deref() {
            Some("email") => FieldKind::Email,
            Some("tel") => FieldKind::Tel,
            _ => FieldKind::Text,
        }
    }
}

/// Why a field was rejected. The message is shown next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("This field is required")]
    Required,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please enter a valid phone number")]
    InvalidPhone,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| {
        Regex::new(r"^[\+]?[\s\-\(\)]*([0-9][\s\-\(\)]*){10,}$").expect("phone pattern compiles")
    })
}

pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// At least ten digits, optionally led by `+`, with spaces, dashes and
/// parentheses allowed anywhere.
pub fn is_valid_phone(value: &str) -> bool {
    phone_regex().is_match(value)
}

/// Check a raw field value. Leading and trailing whitespace is ignored.
/// Shape checks only apply to non-empty values.
pub fn validate_value(kind: FieldKind, required: bool, value: &str) -> Result<(), FieldError> {
    let value = value.trim();

    if value.is_empty() {
        return if required {
            Err(FieldError::Required)
        } else {
            Ok(())
        };
    }

    match kind {
        FieldKind::Email if !is_valid_email(value) => Err(FieldError::InvalidEmail),
        FieldKind::Tel if !is_valid_phone(value) => Err(FieldError::InvalidPhone),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_required() {
        assert_eq!(validate_value(FieldKind::Text, true, ""), Err(FieldError::Required));
        assert_eq!(validate_value(FieldKind::Text, true, "   "), Err(FieldError::Required));
        assert_eq!(validate_value(FieldKind::Text, false, ""), Ok(()));
        assert_eq!(validate_value(FieldKind::Text, true, "Ana"), Ok(()));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana example@x.com"));
        assert!(!is_valid_email("@example.com"));
        assert_eq!(
            validate_value(FieldKind::Email, true, " ana@ "),
            Err(FieldError::InvalidEmail)
        );
        assert_eq!(
            validate_value(FieldKind::Email, true, "  ana@example.com  "),
            Ok(())
        );
    }

    #[test]
    fn test_phone_shape() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("0123456789"));
        assert!(!is_valid_phone("555-1234"));
        assert!(!is_valid_phone("call me maybe"));
        assert_eq!(validate_value(FieldKind::Tel, false, ""), Ok(()));
        assert_eq!(
            validate_value(FieldKind::Tel, false, "12345"),
            Err(FieldError::InvalidPhone)
        );
    }

    #[test]
    fn test_field_kind_from_type() {
        assert_eq!(FieldKind::from_input_type(Some("email")), FieldKind::Email);
        assert_eq!(FieldKind::from_input_type(Some("TEL")), FieldKind::Tel);
        assert_eq!(FieldKind::from_input_type(Some("text")), FieldKind::Text);
        assert_eq!(FieldKind::from_input_type(None), FieldKind::Text);
    }

    #[test]
    fn test_messages() {
        assert_eq!(FieldError::Required.to_string(), "This field is required");
        assert_eq!(
            FieldError::InvalidEmail.to_string(),
            "Please enter a valid email address"
        );
        assert_eq!(
            FieldError::InvalidPhone.to_string(),
            "Please enter a valid phone number"
        );
    }

    proptest! {
        #[test]
        fn prop_ten_digits_with_separators_is_valid(
            digits in proptest::collection::vec(0u8..10, 10..15),
            sep in prop::sample::select(vec!["", " ", "-"]),
        ) {
            let phone = digits
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(sep);
            prop_assert!(is_valid_phone(&phone));
            let plus_prefixed = format!("+{}", phone);
            prop_assert!(is_valid_phone(&plus_prefixed));
        }
    }
}
