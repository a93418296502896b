//! Block renderer: turns a page's modular blocks into HTML fragments.

use serde_json::Value;
use stacksite_core::blocks::{
    Action, Block, BlockKind, FromBlog, HeroBanner, OurTeam, Section, SectionWithButtons,
    SectionWithCards, SectionWithHtmlCode,
};
use stacksite_core::html::{attr, escape};
use stacksite_core::{EditMarkers, Image, Markup};

/// Per-page inputs to block rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    pub page_uid: &'a str,
    pub locale: &'a str,
    /// Emit `data-cslp` attributes for the editing overlay.
    pub edit_mode: bool,
    /// Hero banners render as the slimmer blog banner.
    pub blog_page: bool,
}

impl RenderContext<'_> {
    /// ` data-cslp="..."` for a field, when edit mode is on and the field
    /// carries a marker.
    pub fn edit(&self, markers: &EditMarkers, field: &str) -> String {
        if !self.edit_mode {
            return String::new();
        }
        markers
            .tag(field)
            .map(|tag| attr(stacksite_core::edit_tags::CSLP_ATTR, tag))
            .unwrap_or_default()
    }
}

/// Render every recognized block in order.
///
/// Elements without a recognized key produce nothing. A recognized block
/// whose payload cannot be decoded is skipped with a warning; its siblings
/// still render.
pub fn render(blocks: &[Value], ctx: &RenderContext) -> Vec<String> {
    blocks
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let (kind, payload) = BlockKind::detect(raw)?;
            match Block::decode(kind, payload) {
                Ok(block) => Some(render_block(&block, ctx)),
                Err(err) => {
                    tracing::warn!(
                        page_uid = ctx.page_uid,
                        index,
                        block = kind.tag(),
                        error = %err,
                        "Skipping undecodable block"
                    );
                    None
                }
            }
        })
        .collect()
}

pub fn render_block(block: &Block, ctx: &RenderContext) -> String {
    match block {
        Block::HeroBanner(banner) if ctx.blog_page => blog_banner(banner, ctx),
        Block::HeroBanner(banner) => hero_banner(banner, ctx),
        Block::Section(section) => section_block(section, ctx),
        Block::SectionWithButtons(section) => section_with_buttons(section, ctx),
        Block::SectionWithCards(section) => section_with_cards(section, ctx),
        Block::SectionWithHtmlCode(section) => section_with_html_code(section, ctx),
        Block::FromBlog(section) => from_blog(section, ctx),
        Block::OurTeam(team) => our_team(team, ctx),
    }
}

/// Rich-text HTML, verbatim when converted. An unconverted document is shown
/// escaped rather than dropped so the gap is visible on the page.
pub fn markup(value: &Markup) -> String {
    match value {
        Markup::Html(html) => html.clone(),
        Markup::Raw(raw) => {
            tracing::warn!("Rendering unconverted rich-text document as text");
            format!(r#"<pre class="unconverted">{}</pre>"#, escape(&raw.to_string()))
        }
    }
}

pub fn image(image: Option<&Image>, class: &str, extra: &str) -> String {
    match image {
        Some(img) if !img.url.is_empty() => format!(
            r#"<img{}{}{}{} />"#,
            attr("class", class),
            attr("src", &img.url),
            attr("alt", img.alt()),
            extra
        ),
        _ => String::new(),
    }
}

fn action(action: &Action, class: &str, ctx: &RenderContext) -> String {
    if action.is_empty() {
        return String::new();
    }
    format!(
        r#"<a{}{}{}>{}</a>"#,
        attr("class", class),
        attr("href", &action.href),
        ctx.edit(&action.edit, "title"),
        escape(&action.title)
    )
}

fn color_style(background: &str, text: &str) -> String {
    let mut style = String::new();
    if !background.is_empty() {
        style.push_str(&format!("background: {};", background));
    }
    if !text.is_empty() {
        style.push_str(&format!("color: {};", text));
    }
    attr("style", &style)
}

fn hero_banner(banner: &HeroBanner, ctx: &RenderContext) -> String {
    format!(
        r#"<div class="hero-banner"{}>
    <div class="home-content">
        <h1 class="hero-title"{}>{}</h1>
        <p class="hero-description"{}>{}</p>
        {}
    </div>
    {}
</div>"#,
        color_style(&banner.bg_color, &banner.text_color),
        ctx.edit(&banner.edit, "banner_title"),
        escape(&banner.banner_title),
        ctx.edit(&banner.edit, "banner_description"),
        escape(&banner.banner_description),
        action(&banner.call_to_action, "btn tertiary-btn", ctx),
        image(
            banner.banner_image.as_ref(),
            "hero-image",
            &ctx.edit(&banner.edit, "banner_image")
        ),
    )
}

fn blog_banner(banner: &HeroBanner, ctx: &RenderContext) -> String {
    format!(
        r#"<div class="blog-page-banner"{}>
    <div class="blog-page-content">
        <h1 class="hero-title"{}>{}</h1>
        <p class="hero-description"{}>{}</p>
    </div>
</div>"#,
        color_style(&banner.bg_color, &banner.text_color),
        ctx.edit(&banner.edit, "banner_title"),
        escape(&banner.banner_title),
        ctx.edit(&banner.edit, "banner_description"),
        escape(&banner.banner_description),
    )
}

fn section_block(section: &Section, ctx: &RenderContext) -> String {
    let content = format!(
        r#"<div class="home-content">
        <h2{}>{}</h2>
        <p{}>{}</p>
        {}
    </div>"#,
        ctx.edit(&section.edit, "title_h2"),
        escape(&section.title_h2),
        ctx.edit(&section.edit, "description"),
        escape(&section.description),
        action(&section.call_to_action, "btn secondary-btn", ctx),
    );
    let picture = format!(
        r#"<div class="home-image">{}</div>"#,
        image(section.image.as_ref(), "image", &ctx.edit(&section.edit, "image"))
    );

    let (first, second) = if section.image_on_left() {
        (picture, content)
    } else {
        (content, picture)
    };
    format!(r#"<div class="home-advisor-section">{}{}</div>"#, first, second)
}

fn section_with_buttons(section: &SectionWithButtons, ctx: &RenderContext) -> String {
    let buttons: String = section
        .buttons
        .iter()
        .map(|item| {
            format!(
                r#"<div class="content-section">
            {}
            <h3{}>{}</h3>
            <div class="bucket-description"{}>{}</div>
            {}
        </div>"#,
                image(item.icon.as_ref(), "bucket-icon", ""),
                ctx.edit(&item.edit, "title_h3"),
                escape(&item.title_h3),
                ctx.edit(&item.edit, "description"),
                markup(&item.description),
                action(&item.call_to_action, "btn secondary-btn", ctx),
            )
        })
        .collect();

    format!(
        r#"<div class="member-main">
    <div class="member-head">
        <h2{}>{}</h2>
        <p{}>{}</p>
    </div>
    <div class="member-section">{}</div>
</div>"#,
        ctx.edit(&section.edit, "title_h2"),
        escape(&section.title_h2),
        ctx.edit(&section.edit, "description"),
        escape(&section.description),
        buttons
    )
}

fn section_with_cards(section: &SectionWithCards, ctx: &RenderContext) -> String {
    let cards: String = section
        .cards
        .iter()
        .map(|card| {
            format!(
                r#"<div class="cards">
        <h3{}>{}</h3>
        <p{}>{}</p>
        <div class="card-cta">{}</div>
    </div>"#,
                ctx.edit(&card.edit, "title_h3"),
                escape(&card.title_h3),
                ctx.edit(&card.edit, "description"),
                escape(&card.description),
                action(&card.call_to_action, "btn primary-btn", ctx),
            )
        })
        .collect();
    format!(r#"<div class="demo-section">{}</div>"#, cards)
}

fn section_with_html_code(section: &SectionWithHtmlCode, ctx: &RenderContext) -> String {
    let text = format!(
        r#"<div class="contact-page-content">
        <h2{}>{}</h2>
        <div{}>{}</div>
    </div>"#,
        ctx.edit(&section.edit, "title"),
        escape(&section.title),
        ctx.edit(&section.edit, "description"),
        markup(&section.description),
    );
    let code = format!(
        r#"<div class="contact-page-form"{}>{}</div>"#,
        ctx.edit(&section.edit, "html_code"),
        section.html_code
    );

    let (first, second) = if section.html_code_alignment.eq_ignore_ascii_case("left") {
        (code, text)
    } else {
        (text, code)
    };
    format!(r#"<div class="contact-page-section">{}{}</div>"#, first, second)
}

fn from_blog(section: &FromBlog, ctx: &RenderContext) -> String {
    let posts: String = section
        .featured_blogs
        .iter()
        .map(|post| {
            format!(
                r#"<div class="featured-blog">
            {}
            <div class="featured-content">
                <h3{}>{}</h3>
                <div{}>{}</div>
                <a class="blogpost-readmore" href="{}">Read More</a>
            </div>
        </div>"#,
                image(post.featured_image.as_ref(), "blog-post-img", ""),
                ctx.edit(&post.edit, "title"),
                escape(&post.title),
                ctx.edit(&post.edit, "body"),
                markup(&post.body),
                escape(&post.url),
            )
        })
        .collect();

    format!(
        r#"<div class="community-section">
    <div class="community-head">
        <h2{}>{}</h2>
        {}
    </div>
    <div class="home-featured-blogs">{}</div>
</div>"#,
        ctx.edit(&section.edit, "title_h2"),
        escape(&section.title_h2),
        action(&section.view_articles, "btn secondary-btn article-btn", ctx),
        posts
    )
}

fn our_team(team: &OurTeam, ctx: &RenderContext) -> String {
    let employees: String = team
        .employees
        .iter()
        .map(|employee| {
            format!(
                r#"<div class="team-details">
            {}
            <div class="team-details-content">
                <h3{}>{}</h3>
                <p{}>{}</p>
            </div>
        </div>"#,
                image(employee.image.as_ref(), "", &ctx.edit(&employee.edit, "image")),
                ctx.edit(&employee.edit, "name"),
                escape(&employee.name),
                ctx.edit(&employee.edit, "designation"),
                escape(&employee.designation),
            )
        })
        .collect();

    format!(
        r#"<div class="about-team-section">
    <div class="team-head-section">
        <h2{}>{}</h2>
        <p{}>{}</p>
    </div>
    <div class="team-content">{}</div>
</div>"#,
        ctx.edit(&team.edit, "title_h2"),
        escape(&team.title_h2),
        ctx.edit(&team.edit, "description"),
        escape(&team.description),
        employees
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ctx() -> RenderContext<'static> {
        RenderContext {
            page_uid: "home",
            locale: "en-us",
            edit_mode: false,
            blog_page: false,
        }
    }

    #[test]
    fn renders_blocks_in_order() {
        let blocks = vec![
            json!({"section": {"title_h2": "First"}}),
            json!({"our_team": {"title_h2": "Second", "employees": []}}),
            json!({"section_with_cards": {"cards": [{"title_h3": "Third"}]}}),
        ];
        let html = render(&blocks, &ctx());

        assert_eq!(html.len(), 3);
        assert!(html[0].contains("First"));
        assert!(html[1].contains("Second"));
        assert!(html[2].contains("Third"));
    }

    #[test]
    fn unknown_blocks_yield_nothing() {
        let blocks = vec![
            json!({"carousel": {"slides": []}}),
            json!("not an object"),
            json!({"section": {"title_h2": "Kept"}}),
        ];
        let html = render(&blocks, &ctx());
        assert_eq!(html.len(), 1);
        assert!(html[0].contains("Kept"));
    }

    #[test]
    fn undecodable_block_does_not_stop_siblings() {
        let blocks = vec![
            json!({"section": {"title_h2": ["not", "a", "string"]}}),
            json!({"section": {"title_h2": "After"}}),
        ];
        let html = render(&blocks, &ctx());
        assert_eq!(html.len(), 1);
        assert!(html[0].contains("After"));
    }

    #[test]
    fn first_registered_key_wins() {
        let blocks = vec![json!({
            "our_team": {"title_h2": "Team"},
            "hero_banner": {"banner_title": "Hero"}
        })];
        let html = render(&blocks, &ctx());
        assert!(html[0].contains("hero-banner"));
        assert!(!html[0].contains("Team"));
    }

    #[test]
    fn hero_banner_on_blog_page_uses_blog_banner() {
        let blocks = vec![json!({"hero_banner": {"banner_title": "Blog"}})];
        let blog = RenderContext {
            blog_page: true,
            ..ctx()
        };
        let html = render(&blocks, &blog);
        assert!(html[0].contains("blog-page-banner"));
    }

    #[test]
    fn section_image_alignment() {
        let left = json!({"section": {
            "title_h2": "T",
            "image": {"url": "https://img/x.png"},
            "image_alignment": "Left"
        }});
        let html = render(&[left], &ctx()).remove(0);
        let image_at = html.find("home-image").unwrap();
        let content_at = html.find("home-content").unwrap();
        assert!(image_at < content_at);
    }

    #[test]
    fn edit_attributes_only_in_edit_mode() {
        let blocks = vec![json!({"section": {
            "title_h2": "Edit me",
            "$": {"title_h2": {"data-cslp": "page.home.en-us.page_components.0.section.title_h2"}}
        }})];

        let plain = render(&blocks, &ctx()).remove(0);
        assert!(!plain.contains("data-cslp"));

        let editing = RenderContext {
            edit_mode: true,
            ..ctx()
        };
        let tagged = render(&blocks, &editing).remove(0);
        assert!(
            tagged.contains(r#"data-cslp="page.home.en-us.page_components.0.section.title_h2""#)
        );
    }

    #[test]
    fn text_is_escaped_but_html_code_is_not() {
        let blocks = vec![json!({"section_with_html_code": {
            "title": "<b>Contact</b>",
            "html_code": "<form id=\"contact\"></form>",
            "description": "<p>Write to us</p>"
        }})];
        let html = render(&blocks, &ctx()).remove(0);
        assert!(html.contains("&lt;b&gt;Contact&lt;/b&gt;"));
        assert!(html.contains(r#"<form id="contact"></form>"#));
        assert!(html.contains("<p>Write to us</p>"));
    }

    #[test]
    fn unconverted_markup_is_escaped() {
        let raw = Markup::Raw(json!({"type": "doc", "children": []}));
        let html = markup(&raw);
        assert!(html.starts_with(r#"<pre class="unconverted">"#));
        assert!(html.contains("&quot;type&quot;"));
    }

    #[test]
    fn empty_action_renders_nothing() {
        let blocks = vec![json!({"section": {"title_h2": "T", "call_to_action": {"title": "Go"}}})];
        let html = render(&blocks, &ctx()).remove(0);
        assert!(!html.contains("<a"));
    }
}
