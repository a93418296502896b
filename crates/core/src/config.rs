use crate::error::{Error, Result};
use crate::types::{RefetchFailurePolicy, Theme};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Raw TOML configuration structure
/// This matches the stacksite.toml file structure exactly
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    site: RawSite,
    #[serde(default)]
    preview: RawPreview,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSite {
    title: Option<String>,
    default_theme: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPreview {
    refetch_failure: Option<String>,
}

/// Site-level options that are not CMS credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub title: String,
    pub default_theme: Theme,
    pub refetch_failure: RefetchFailurePolicy,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Stacksite".to_string(),
            default_theme: Theme::Light,
            refetch_failure: RefetchFailurePolicy::KeepStale,
        }
    }
}

/// Parse stacksite.toml from a file path
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let content = fs::read_to_string(path)?;
    parse_site_toml_str(&content)
}

/// Parse stacksite.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;
    let defaults = SiteConfig::default();

    let default_theme = match raw.site.default_theme {
        Some(value) => Theme::parse(&value).ok_or_else(|| {
            Error::ConfigParse(format!(
                "Invalid site.default_theme '{}', expected 'light' or 'dark'",
                value
            ))
        })?,
        None => defaults.default_theme,
    };

    let refetch_failure = match raw.preview.refetch_failure {
        Some(value) => RefetchFailurePolicy::parse(&value).ok_or_else(|| {
            Error::ConfigParse(format!(
                "Invalid preview.refetch_failure '{}', expected 'keep-stale' or 'show-error'",
                value
            ))
        })?,
        None => defaults.refetch_failure,
    };

    let title = match raw.site.title {
        Some(title) if title.trim().is_empty() => {
            return Err(Error::ConfigParse("Empty site.title".to_string()));
        }
        Some(title) => title,
        None => defaults.title,
    };

    Ok(SiteConfig {
        title,
        default_theme,
        refetch_failure,
    })
}

/// Load the site config if the file exists, otherwise fall back to defaults.
pub fn load_site_config<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No site config found, using defaults");
        return Ok(SiteConfig::default());
    }
    parse_site_toml(path)
}
