//! Contact form: validation, submission through an email relay, and the
//! success and error feedback shown on the page.

mod form;
mod relay;
mod validate;

pub use form::{ContactAction, ContactElements, ContactForm, ContactOutcome, SEND_FAILED_MESSAGE};
pub use relay::{EmailJsClient, EmailRelay, RelayError, TemplateParams};
pub use validate::{is_valid_email, is_valid_phone, validate_value, FieldError, FieldKind};
