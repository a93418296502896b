pub mod blocks;
pub mod config;
pub mod conformance;
pub mod edit_tags;
pub mod error;
pub mod html;
pub mod json_path;
pub mod rich_text;
pub mod settings;
pub mod types;

pub use config::{SiteConfig, load_site_config, parse_site_toml};
pub use error::{Error, Result};
pub use settings::{CmsSettings, Region};
pub use types::*;
