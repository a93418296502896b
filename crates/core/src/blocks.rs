//! Modular page blocks.
//!
//! Each element of a page's `page_components` list is an object with exactly
//! one recognized key naming its variant. [`REGISTRY`] fixes the closed set
//! of variants and the order in which keys are looked up: when malformed
//! content carries several recognized keys the first one in registry order
//! wins. Unrecognized keys are ignored.

use crate::json_path::prune_nulls;
use crate::types::{BlogPost, EditMarkers, Image, Markup};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    HeroBanner,
    Section,
    SectionWithButtons,
    SectionWithCards,
    SectionWithHtmlCode,
    FromBlog,
    OurTeam,
}

/// Recognized block variants in lookup order.
pub const REGISTRY: [BlockKind; 7] = [
    BlockKind::HeroBanner,
    BlockKind::Section,
    BlockKind::SectionWithButtons,
    BlockKind::SectionWithCards,
    BlockKind::SectionWithHtmlCode,
    BlockKind::FromBlog,
    BlockKind::OurTeam,
];

impl BlockKind {
    pub fn tag(self) -> &'static str {
        match self {
            BlockKind::HeroBanner => "hero_banner",
            BlockKind::Section => "section",
            BlockKind::SectionWithButtons => "section_with_buttons",
            BlockKind::SectionWithCards => "section_with_cards",
            BlockKind::SectionWithHtmlCode => "section_with_html_code",
            BlockKind::FromBlog => "from_blog",
            BlockKind::OurTeam => "our_team",
        }
    }

    /// Find the block variant of one list element and its payload.
    ///
    /// Returns `None` when no recognized key is present (or the element is
    /// not an object).
    pub fn detect(block: &Value) -> Option<(BlockKind, &Value)> {
        let object = block.as_object()?;
        let mut present = REGISTRY.iter().filter_map(|kind| {
            object
                .get(kind.tag())
                .filter(|payload| !payload.is_null())
                .map(|payload| (*kind, payload))
        });

        let first = present.next()?;
        let extra: Vec<&str> = present.map(|(kind, _)| kind.tag()).collect();
        if !extra.is_empty() {
            tracing::debug!(
                chosen = first.0.tag(),
                ignored = ?extra,
                "Block carries several recognized keys, using the first"
            );
        }
        Some(first)
    }
}

/// Call-to-action link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub title: String,
    pub href: String,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

impl Action {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() || self.href.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroBanner {
    pub banner_title: String,
    pub banner_description: String,
    pub bg_color: String,
    pub text_color: String,
    pub call_to_action: Action,
    pub banner_image: Option<Image>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub title_h2: String,
    pub description: String,
    pub call_to_action: Action,
    pub image: Option<Image>,
    /// `"Left"` or `"Right"`.
    pub image_alignment: String,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

impl Section {
    pub fn image_on_left(&self) -> bool {
        self.image_alignment.eq_ignore_ascii_case("left")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketItem {
    pub title_h3: String,
    pub description: Markup,
    pub icon: Option<Image>,
    pub call_to_action: Action,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionWithButtons {
    pub title_h2: String,
    pub description: String,
    pub buttons: Vec<BucketItem>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub title_h3: String,
    pub description: String,
    pub call_to_action: Action,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionWithCards {
    pub cards: Vec<Card>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionWithHtmlCode {
    pub title: String,
    /// Author-supplied HTML, emitted verbatim.
    pub html_code: String,
    pub description: Markup,
    /// `"Left"` or `"Right"`: side of the embedded HTML.
    pub html_code_alignment: String,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FromBlog {
    pub title_h2: String,
    pub view_articles: Action,
    pub featured_blogs: Vec<BlogPost>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Employee {
    pub name: String,
    pub designation: String,
    pub image: Option<Image>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OurTeam {
    pub title_h2: String,
    pub description: String,
    pub employees: Vec<Employee>,
    #[serde(rename = "$", skip_serializing_if = "EditMarkers::is_empty")]
    pub edit: EditMarkers,
}

/// A decoded modular block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    HeroBanner(HeroBanner),
    Section(Section),
    SectionWithButtons(SectionWithButtons),
    SectionWithCards(SectionWithCards),
    SectionWithHtmlCode(SectionWithHtmlCode),
    FromBlog(FromBlog),
    OurTeam(OurTeam),
}

impl Block {
    /// Decode the payload of a detected block.
    pub fn decode(kind: BlockKind, payload: &Value) -> Result<Block, serde_json::Error> {
        let mut payload = payload.clone();
        prune_nulls(&mut payload);
        Ok(match kind {
            BlockKind::HeroBanner => Block::HeroBanner(serde_json::from_value(payload)?),
            BlockKind::Section => Block::Section(serde_json::from_value(payload)?),
            BlockKind::SectionWithButtons => {
                Block::SectionWithButtons(serde_json::from_value(payload)?)
            }
            BlockKind::SectionWithCards => {
                Block::SectionWithCards(serde_json::from_value(payload)?)
            }
            BlockKind::SectionWithHtmlCode => {
                Block::SectionWithHtmlCode(serde_json::from_value(payload)?)
            }
            BlockKind::FromBlog => Block::FromBlog(serde_json::from_value(payload)?),
            BlockKind::OurTeam => Block::OurTeam(serde_json::from_value(payload)?),
        })
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::HeroBanner(_) => BlockKind::HeroBanner,
            Block::Section(_) => BlockKind::Section,
            Block::SectionWithButtons(_) => BlockKind::SectionWithButtons,
            Block::SectionWithCards(_) => BlockKind::SectionWithCards,
            Block::SectionWithHtmlCode(_) => BlockKind::SectionWithHtmlCode,
            Block::FromBlog(_) => BlockKind::FromBlog,
            Block::OurTeam(_) => BlockKind::OurTeam,
        }
    }
}
