//! Site-wide feature settings for proposal handling.
//!
//! # Invariants
//! - Settings are read-only once handed to a service.
//! - `base_url`, when set, is an absolute `http`/`https` URL without a
//!   trailing slash.

use crate::model::event::is_valid_slug;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;

/// Feature switches that shape proposal submission and export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProposalSettings {
    /// Speakers must complete their profile before submitting.
    pub have_user_profiles: bool,
    /// Visitors may submit without signing in.
    pub have_anonymous_proposals: bool,
    /// Proposals may list more than one speaker.
    pub have_multiple_presenters: bool,
    /// Proposals carry a short excerpt.
    pub have_proposal_excerpts: bool,
    /// Public site root used for feed and calendar links.
    pub base_url: Option<String>,
    /// Slug of the event that event-less routes (`/sessions`, `/schedule`)
    /// and orphaned proposals fall back to.
    pub current_event: Option<String>,
}

impl Default for ProposalSettings {
    fn default() -> Self {
        Self {
            have_user_profiles: false,
            have_anonymous_proposals: false,
            have_multiple_presenters: false,
            have_proposal_excerpts: true,
            base_url: None,
            current_event: None,
        }
    }
}

impl ProposalSettings {
    /// Parses and validates settings from a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        let mut settings: Self = serde_json::from_str(raw).map_err(SettingsError::Parse)?;
        settings.base_url = settings
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_string());
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(raw) = self.base_url.as_deref() {
            if !is_site_url(raw) {
                return Err(SettingsError::InvalidBaseUrl(raw.to_string()));
            }
        }
        if let Some(slug) = self.current_event.as_deref() {
            if !is_valid_slug(slug) {
                return Err(SettingsError::InvalidCurrentEvent(slug.to_string()));
            }
        }
        Ok(())
    }
}

fn is_site_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https")
            && url.host_str().is_some_and(|host| !host.is_empty())
    })
}

#[derive(Debug)]
pub enum SettingsError {
    Parse(serde_json::Error),
    InvalidBaseUrl(String),
    InvalidCurrentEvent(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid settings document: {err}"),
            Self::InvalidBaseUrl(url) => {
                write!(f, "base_url must be an absolute http(s) URL, got `{url}`")
            }
            Self::InvalidCurrentEvent(slug) => write!(f, "current_event is not a slug: `{slug}`"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidBaseUrl(_) | Self::InvalidCurrentEvent(_) => None,
        }
    }
}
