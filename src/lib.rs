//! Client-side behavior of the SpeakNow institute site: shared markup
//! injection, mobile navigation and preferences, page translation and the
//! contact form, running against an in-process document model.

pub mod config;
pub mod contact;
pub mod dom;
pub mod fragments;
pub mod i18n;
pub mod nav;
pub mod page;
pub mod prefs;
pub mod retry;

pub use config::Config;
pub use page::{Page, PageEvent};
