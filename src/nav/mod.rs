//! Navigation controller: mobile menu, preferences dropdown, theme, font
//! size and language.
//!
//! Lifecycle is `Uninitialized → Initializing → Ready`; `cleanup` returns the
//! controller to `Uninitialized`. Init failures are reported as [`NavError`]
//! and also leave it `Uninitialized`, so a later init can try again.

mod appearance;
mod controller;
mod elements;
mod links;
mod listeners;

use std::time::Duration;

pub use appearance::{set_font_size, set_theme, DARK_THEME_CLASS};
pub use controller::{Handled, NavAction, NavState, NavigationController, ScheduledTranslation};
pub use elements::{BoundElements, ANCHOR_SELECTOR};
pub use links::{current_page, is_current_page, mark_active_links};
pub use listeners::{ListenerRegistry, Registration};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("element {selector} not ready within {timeout:?}")]
    AnchorTimeout {
        selector: &'static str,
        timeout: Duration,
    },

    #[error("element {selector} not found after the page became ready")]
    AnchorMissing { selector: &'static str },
}
