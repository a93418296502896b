//! CMS connection settings sourced from the process environment.
//!
//! Every value arrives as a string. The two mode flags
//! (`CONTENTSTACK_LIVE_PREVIEW`, `CONTENTSTACK_LIVE_EDIT_TAGS`) are parsed
//! once here: only the exact string `"true"` enables them.

use crate::error::{Error, Result};
use std::collections::HashMap;

pub const API_KEY: &str = "CONTENTSTACK_API_KEY";
pub const DELIVERY_TOKEN: &str = "CONTENTSTACK_DELIVERY_TOKEN";
pub const ENVIRONMENT: &str = "CONTENTSTACK_ENVIRONMENT";
pub const REGION: &str = "CONTENTSTACK_REGION";
pub const BRANCH: &str = "CONTENTSTACK_BRANCH";
pub const API_HOST: &str = "CONTENTSTACK_API_HOST";
pub const PREVIEW_TOKEN: &str = "CONTENTSTACK_PREVIEW_TOKEN";
pub const PREVIEW_HOST: &str = "CONTENTSTACK_PREVIEW_HOST";
pub const APP_HOST: &str = "CONTENTSTACK_APP_HOST";
pub const LIVE_PREVIEW: &str = "CONTENTSTACK_LIVE_PREVIEW";
pub const LIVE_EDIT_TAGS: &str = "CONTENTSTACK_LIVE_EDIT_TAGS";
pub const LOCALE: &str = "CONTENTSTACK_LOCALE";
pub const MAX_RETRIES: &str = "CONTENTSTACK_MAX_RETRIES";

const DEFAULT_LOCALE: &str = "en-us";
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Data-center region of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Us,
    Eu,
    AzureNa,
    AzureEu,
    GcpNa,
}

impl Region {
    /// Parse a region name. Accepts `us`, `EU`, `azure-na`, `AZURE_NA`, ...
    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "" | "us" | "na" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            "azure-na" => Ok(Region::AzureNa),
            "azure-eu" => Ok(Region::AzureEu),
            "gcp-na" => Ok(Region::GcpNa),
            _ => Err(Error::InvalidSetting {
                name: REGION,
                value: value.to_string(),
            }),
        }
    }

    pub fn delivery_host(self) -> &'static str {
        match self {
            Region::Us => "cdn.contentstack.io",
            Region::Eu => "eu-cdn.contentstack.com",
            Region::AzureNa => "azure-na-cdn.contentstack.com",
            Region::AzureEu => "azure-eu-cdn.contentstack.com",
            Region::GcpNa => "gcp-na-cdn.contentstack.com",
        }
    }

    pub fn preview_host(self) -> &'static str {
        match self {
            Region::Us => "rest-preview.contentstack.com",
            Region::Eu => "eu-rest-preview.contentstack.com",
            Region::AzureNa => "azure-na-rest-preview.contentstack.com",
            Region::AzureEu => "azure-eu-rest-preview.contentstack.com",
            Region::GcpNa => "gcp-na-rest-preview.contentstack.com",
        }
    }
}

/// Connection settings for one stack, built once at startup and shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmsSettings {
    pub api_key: String,
    pub delivery_token: String,
    pub environment: String,
    pub region: Region,
    pub branch: Option<String>,
    /// Overrides the region's delivery host. May carry a scheme.
    pub api_host: Option<String>,
    pub preview_token: Option<String>,
    pub preview_host: String,
    /// Host of the CMS editor app, allowed to frame preview pages.
    pub app_host: Option<String>,
    pub live_preview: bool,
    pub live_edit_tags: bool,
    pub locale: String,
    pub max_retries: u32,
}

impl CmsSettings {
    /// Load settings from the process environment.
    ///
    /// | Env Var                        | Default                     |
    /// |--------------------------------|-----------------------------|
    /// | `CONTENTSTACK_API_KEY`         | required                    |
    /// | `CONTENTSTACK_DELIVERY_TOKEN`  | required                    |
    /// | `CONTENTSTACK_ENVIRONMENT`     | required                    |
    /// | `CONTENTSTACK_REGION`          | `us`                        |
    /// | `CONTENTSTACK_PREVIEW_HOST`    | region preview host         |
    /// | `CONTENTSTACK_LOCALE`          | `en-us`                     |
    /// | `CONTENTSTACK_MAX_RETRIES`     | `3`                         |
    /// | `CONTENTSTACK_LIVE_PREVIEW`    | disabled unless `"true"`    |
    /// | `CONTENTSTACK_LIVE_EDIT_TAGS`  | disabled unless `"true"`    |
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build settings from an explicit variable map (useful for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let optional = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| optional(name).ok_or(Error::MissingSetting(name));

        let region = match optional(REGION) {
            Some(value) => Region::parse(&value)?,
            None => Region::default(),
        };

        let max_retries = match optional(MAX_RETRIES) {
            Some(value) => value.parse().map_err(|_| Error::InvalidSetting {
                name: MAX_RETRIES,
                value,
            })?,
            None => DEFAULT_MAX_RETRIES,
        };

        Ok(Self {
            api_key: required(API_KEY)?,
            delivery_token: required(DELIVERY_TOKEN)?,
            environment: required(ENVIRONMENT)?,
            region,
            branch: optional(BRANCH),
            api_host: optional(API_HOST),
            preview_token: optional(PREVIEW_TOKEN),
            preview_host: optional(PREVIEW_HOST)
                .unwrap_or_else(|| region.preview_host().to_string()),
            app_host: optional(APP_HOST),
            live_preview: parse_flag(vars.get(LIVE_PREVIEW).map(String::as_str)),
            live_edit_tags: parse_flag(vars.get(LIVE_EDIT_TAGS).map(String::as_str)),
            locale: optional(LOCALE).unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            max_retries,
        })
    }

    /// Base URL for delivery requests, e.g. `https://cdn.contentstack.io`.
    pub fn delivery_base_url(&self) -> String {
        match &self.api_host {
            Some(host) => with_scheme(host),
            None => with_scheme(self.region.delivery_host()),
        }
    }

    /// Base URL for live-preview requests.
    pub fn preview_base_url(&self) -> String {
        with_scheme(&self.preview_host)
    }
}

/// Mode flags are enabled by the exact string `"true"` and nothing else.
pub fn parse_flag(value: Option<&str>) -> bool {
    value == Some("true")
}

fn with_scheme(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn base_vars() -> HashMap<String, String> {
        [
            (API_KEY, "X"),
            (DELIVERY_TOKEN, "token"),
            (ENVIRONMENT, "production"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_minimal_settings_use_defaults() {
        let settings = CmsSettings::from_vars(&base_vars()).unwrap();
        assert_eq!(settings.api_key, "X");
        assert_eq!(settings.region, Region::Us);
        assert_eq!(settings.locale, "en-us");
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.preview_host, "rest-preview.contentstack.com");
        assert!(!settings.live_preview);
        assert!(!settings.live_edit_tags);
        assert_eq!(settings.delivery_base_url(), "https://cdn.contentstack.io");
    }

    #[test]
    fn test_missing_required_setting() {
        let mut vars = base_vars();
        vars.remove(DELIVERY_TOKEN);
        let result = CmsSettings::from_vars(&vars);
        assert_matches!(result, Err(Error::MissingSetting(DELIVERY_TOKEN)));
    }

    #[test]
    fn test_blank_required_setting_is_missing() {
        let mut vars = base_vars();
        vars.insert(ENVIRONMENT.to_string(), "   ".to_string());
        assert_matches!(
            CmsSettings::from_vars(&vars),
            Err(Error::MissingSetting(ENVIRONMENT))
        );
    }

    #[test]
    fn test_flags_require_exact_true() {
        assert!(parse_flag(Some("true")));
        assert!(!parse_flag(Some("TRUE")));
        assert!(!parse_flag(Some("True")));
        assert!(!parse_flag(Some("1")));
        assert!(!parse_flag(Some(" true")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(None));

        let mut vars = base_vars();
        vars.insert(LIVE_PREVIEW.to_string(), "true".to_string());
        vars.insert(LIVE_EDIT_TAGS.to_string(), "yes".to_string());
        let settings = CmsSettings::from_vars(&vars).unwrap();
        assert!(settings.live_preview);
        assert!(!settings.live_edit_tags);
    }

    #[test]
    fn test_region_hosts() {
        let mut vars = base_vars();
        vars.insert(REGION.to_string(), "AZURE_EU".to_string());
        let settings = CmsSettings::from_vars(&vars).unwrap();
        assert_eq!(settings.region, Region::AzureEu);
        assert_eq!(
            settings.delivery_base_url(),
            "https://azure-eu-cdn.contentstack.com"
        );
        assert_eq!(
            settings.preview_base_url(),
            "https://azure-eu-rest-preview.contentstack.com"
        );
    }

    #[test]
    fn test_unknown_region_rejected() {
        let mut vars = base_vars();
        vars.insert(REGION.to_string(), "mars".to_string());
        let err = CmsSettings::from_vars(&vars).unwrap_err();
        assert!(err.to_string().contains("mars"));
    }

    #[test]
    fn test_api_host_override_keeps_scheme() {
        let mut vars = base_vars();
        vars.insert(API_HOST.to_string(), "http://127.0.0.1:9000/".to_string());
        let settings = CmsSettings::from_vars(&vars).unwrap();
        assert_eq!(settings.delivery_base_url(), "http://127.0.0.1:9000");

        vars.insert(API_HOST.to_string(), "custom-cdn.example.com".to_string());
        let settings = CmsSettings::from_vars(&vars).unwrap();
        assert_eq!(settings.delivery_base_url(), "https://custom-cdn.example.com");
    }

    #[test]
    fn test_invalid_max_retries() {
        let mut vars = base_vars();
        vars.insert(MAX_RETRIES.to_string(), "many".to_string());
        assert_matches!(
            CmsSettings::from_vars(&vars),
            Err(Error::InvalidSetting { name: MAX_RETRIES, .. })
        );
    }
}
