use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Site
    pub site_base_url: String,
    pub translations_path: String,
    pub header_fragment: String,
    pub footer_fragment: String,

    // Preferences
    pub preferences_file: PathBuf,

    // Contact form relay (disabled unless fully configured)
    pub contact: Option<ContactConfig>,

    pub controller: ControllerConfig,
}

/// EmailJS settings for the contact form.
#[derive(Debug, Clone)]
pub struct ContactConfig {
    pub api_url: String,
    pub public_key: String,
    pub service_id: String,
    pub template_id: String,
    pub to_email: String,
}

/// Pixel values for the font-size preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSizes {
    pub small: String,
    pub medium: String,
    pub large: String,
}

impl FontSizes {
    /// Pixel value for a size name. Unknown names get the medium value.
    pub fn resolve(&self, name: &str) -> &str {
        match name {
            "small" => &self.small,
            "large" => &self.large,
            _ => &self.medium,
        }
    }
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            small: "14px".to_string(),
            medium: "16px".to_string(),
            large: "18px".to_string(),
        }
    }
}

/// Behavioral constants for the navigation controller and its collaborators.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub default_language: String,
    pub default_theme: String,
    pub default_font_size: String,
    pub font_sizes: FontSizes,

    /// Translation fetch attempts per load (including the first)
    pub max_translation_attempts: u32,
    /// Fixed wait between translation fetch attempts
    pub translation_retry_delay: Duration,
    /// Wait between init finishing and the saved language being applied
    pub translation_settle_delay: Duration,
    /// How long init waits for the header markup to be ready
    pub ready_timeout: Duration,
    /// Lifetime of the contact form's error banner
    pub error_banner_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            default_theme: "light".to_string(),
            default_font_size: "medium".to_string(),
            font_sizes: FontSizes::default(),
            max_translation_attempts: 3,
            translation_retry_delay: Duration::from_millis(1000),
            translation_settle_delay: Duration::from_millis(100),
            ready_timeout: Duration::from_millis(5000),
            error_banner_timeout: Duration::from_millis(5000),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = ControllerConfig::default();

        Ok(Self {
            // Site
            site_base_url: std::env::var("SITE_BASE_URL").context("SITE_BASE_URL not set")?,
            translations_path: std::env::var("TRANSLATIONS_PATH")
                .unwrap_or_else(|_| "js/translations".to_string()),
            header_fragment: std::env::var("HEADER_FRAGMENT")
                .unwrap_or_else(|_| "html/header.html".to_string()),
            footer_fragment: std::env::var("FOOTER_FRAGMENT")
                .unwrap_or_else(|_| "html/footer.html".to_string()),

            // Preferences
            preferences_file: std::env::var("PREFERENCES_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".speaknow/preferences.json")),

            contact: ContactConfig::from_env()?,

            controller: ControllerConfig {
                default_language: std::env::var("DEFAULT_LANGUAGE")
                    .unwrap_or(defaults.default_language),
                default_theme: std::env::var("DEFAULT_THEME").unwrap_or(defaults.default_theme),
                default_font_size: std::env::var("DEFAULT_FONT_SIZE")
                    .unwrap_or(defaults.default_font_size),
                ..ControllerConfig::default()
            },
        })
    }

    /// Absolute URL for a site-relative path.
    pub fn site_url(&self, path: &str) -> String {
        join_url(&self.site_base_url, path)
    }
}

impl ContactConfig {
    /// Reads the EmailJS group. Returns `None` when none of the keys are set
    /// and an error when only some of them are.
    fn from_env() -> Result<Option<Self>> {
        let public_key = std::env::var("EMAILJS_PUBLIC_KEY").ok();
        let service_id = std::env::var("EMAILJS_SERVICE_ID").ok();
        let template_id = std::env::var("EMAILJS_TEMPLATE_ID").ok();
        let to_email = std::env::var("CONTACT_TO_EMAIL").ok();

        if public_key.is_none()
            && service_id.is_none()
            && template_id.is_none()
            && to_email.is_none()
        {
            return Ok(None);
        }

        Ok(Some(Self {
            api_url: std::env::var("EMAILJS_API_URL")
                .unwrap_or_else(|_| "https://api.emailjs.com".to_string()),
            public_key: public_key.context("EMAILJS_PUBLIC_KEY not set")?,
            service_id: service_id.context("EMAILJS_SERVICE_ID not set")?,
            template_id: template_id.context("EMAILJS_TEMPLATE_ID not set")?,
            to_email: to_email.context("CONTACT_TO_EMAIL not set")?,
        }))
    }
}

/// Join a base URL and a relative path with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
