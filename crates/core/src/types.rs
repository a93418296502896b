use crate::error::Result;
use crate::json_path::prune_nulls;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One CMS record as delivered by the API.
///
/// `uid` and `locale` are always present; every other field lives in
/// `fields` untouched so that typed views can be decoded on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub uid: String,
    #[serde(default)]
    pub locale: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entry {
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("uid".to_string(), Value::String(self.uid.clone()));
        object.insert("locale".to_string(), Value::String(self.locale.clone()));
        Value::Object(object)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").and_then(Value::as_str)
    }

    /// Routing key of page-like entries.
    pub fn url(&self) -> Option<&str> {
        self.get("url").and_then(Value::as_str)
    }

    /// Decode a typed view of this entry.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut value = self.to_value();
        prune_nulls(&mut value);
        Ok(serde_json::from_value(value)?)
    }
}

/// Color scheme of the rendered shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// What a page container shows when a live-preview refetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchFailurePolicy {
    /// Keep displaying the last good entry.
    #[default]
    KeepStale,
    /// Replace the entry with an error state.
    ShowError,
}

impl RefetchFailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "keep-stale" => Some(RefetchFailurePolicy::KeepStale),
            "show-error" => Some(RefetchFailurePolicy::ShowError),
            _ => None,
        }
    }
}

/// Per-field live-edit annotations carried under the `$` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditMarkers(pub BTreeMap<String, Value>);

impl EditMarkers {
    /// The `data-cslp` tag for a field, when edit tags were applied.
    pub fn tag(&self, field: &str) -> Option<&str> {
        self.0.get(field)?.get("data-cslp")?.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A rich-text field value.
///
/// Declared rich-text paths are converted to HTML before decoding; anything
/// else that still holds a JSON document is kept as `Raw`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Markup {
    Html(String),
    Raw(Value),
}

impl Markup {
    pub fn is_converted(&self) -> bool {
        matches!(self, Markup::Html(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Markup::Html(html) => html.trim().is_empty(),
            Markup::Raw(value) => value.is_null(),
        }
    }
}

impl Default for Markup {
    fn default() -> Self {
        Markup::Html(String::new())
    }
}

impl<'de> Deserialize<'de> for Markup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(html) => Markup::Html(html),
            Value::Null => Markup::default(),
            other => Markup::Raw(other),
        })
    }
}

/// Asset reference (image file).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub url: String,
    pub title: String,
    pub filename: String,
}

impl Image {
    pub fn alt(&self) -> &str {
        if self.title.is_empty() {
            &self.filename
        } else {
            &self.title
        }
    }
}

/// Plain link field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub title: String,
    pub href: String,
}

impl Link {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() || self.href.is_empty()
    }
}

/// `page` content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub uid: String,
    pub title: String,
    pub url: String,
    pub locale: String,
    /// Ordered modular blocks, decoded lazily by the block renderer.
    pub page_components: Vec<Value>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

/// Reference from a navigation item to a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRef {
    pub uid: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavMenuItem {
    pub label: String,
    pub page_reference: Vec<PageRef>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

impl NavMenuItem {
    /// Link target: the first referenced page, or the site root.
    pub fn href(&self) -> &str {
        self.page_reference
            .first()
            .map(|page| page.url.as_str())
            .filter(|url| !url.is_empty())
            .unwrap_or("/")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationBar {
    pub show_announcement: bool,
    pub announcement_text: Markup,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

/// `header` content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub uid: String,
    pub title: String,
    pub locale: String,
    pub logo: Option<Image>,
    pub navigation_menu: Vec<NavMenuItem>,
    pub notification_bar: NotificationBar,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterNavigation {
    pub link: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialShare {
    pub link: Link,
    pub icon: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Social {
    pub social_share: Vec<SocialShare>,
}

/// `footer` content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Footer {
    pub uid: String,
    pub title: String,
    pub locale: String,
    pub logo: Option<Image>,
    pub navigation: FooterNavigation,
    pub social: Social,
    pub copyright: Markup,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub uid: String,
    pub title: String,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

/// `blog_post` content type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    pub uid: String,
    pub title: String,
    pub url: String,
    pub locale: String,
    pub date: String,
    pub body: Markup,
    pub author: Vec<Author>,
    pub related_post: Vec<BlogPost>,
    pub featured_image: Option<Image>,
    pub is_archived: bool,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

impl BlogPost {
    /// Human-readable publication date, e.g. "April 7, 2021".
    ///
    /// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates; anything
    /// else is returned unchanged.
    pub fn display_date(&self) -> String {
        let date = chrono::DateTime::parse_from_rfc3339(&self.date)
            .map(|dt| dt.date_naive())
            .or_else(|_| chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d"));
        match date {
            Ok(date) => date.format("%B %-d, %Y").to_string(),
            Err(_) => self.date.clone(),
        }
    }

    pub fn author_names(&self) -> Vec<&str> {
        self.author
            .iter()
            .map(|a| a.title.as_str())
            .filter(|t| !t.is_empty())
            .collect()
    }
}
