//! Page shell: document head, header, footer and theme.

use crate::blocks::{RenderContext, image, markup};
use stacksite_core::html::{attr, escape};
use stacksite_core::{Footer, Header, Theme};

/// Everything the shell needs besides the page body.
#[derive(Debug, Clone, Copy)]
pub struct Shell<'a> {
    pub site_title: &'a str,
    /// Title of the current page, shown before the site title.
    pub page_title: Option<&'a str>,
    pub theme: Theme,
    /// Path of the current page, used for the theme toggle link.
    pub path: &'a str,
    pub header: Option<&'a Header>,
    pub footer: Option<&'a Footer>,
    /// Include the live-reload client.
    pub live_reload: bool,
    pub edit_mode: bool,
}

/// Wrap a rendered body in the full HTML document.
pub fn render_document(shell: &Shell, body: &str) -> String {
    let ctx = RenderContext {
        edit_mode: shell.edit_mode,
        ..Default::default()
    };
    let title = match shell.page_title {
        Some(page) if !page.is_empty() => format!("{} | {}", page, shell.site_title),
        _ => shell.site_title.to_string(),
    };
    let header = shell.header.map(|h| header(h, shell, &ctx)).unwrap_or_default();
    let footer = shell.footer.map(|f| footer(f, &ctx)).unwrap_or_default();
    let reload_script = if shell.live_reload { RELOAD_SCRIPT } else { "" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-theme="{theme}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{style}</style>
</head>
<body class="theme-{theme}">
{header}
<main class="page">
{body}
</main>
{footer}
{reload_script}
</body>
</html>
"#,
        theme = shell.theme.as_str(),
        title = escape(&title),
        style = STYLE,
        header = header,
        body = body,
        footer = footer,
        reload_script = reload_script,
    )
}

/// Body shown while a page's first fetch is still in flight.
pub fn loading_placeholder() -> String {
    r#"<div class="loading" aria-busy="true"><div class="spinner"></div><p>Loading…</p></div>"#
        .to_string()
}

pub fn not_found_body(path: &str) -> String {
    format!(
        r#"<div class="not-found">
    <h1>404</h1>
    <p>Nothing is published at <code>{}</code>.</p>
    <a class="btn primary-btn" href="/">Back to home</a>
</div>"#,
        escape(path)
    )
}

pub fn error_body(message: &str) -> String {
    format!(
        r#"<div class="fetch-error">
    <h1>Content unavailable</h1>
    <p>The content service could not be reached. Try again shortly.</p>
    <pre>{}</pre>
</div>"#,
        escape(message)
    )
}

fn header(header: &Header, shell: &Shell, ctx: &RenderContext) -> String {
    let announcement = if header.notification_bar.show_announcement
        && !header.notification_bar.announcement_text.is_empty()
    {
        format!(
            r#"<div class="notification-bar"{}>{}</div>"#,
            ctx.edit(&header.notification_bar.edit, "announcement_text"),
            markup(&header.notification_bar.announcement_text)
        )
    } else {
        String::new()
    };

    let menu: String = header
        .navigation_menu
        .iter()
        .map(|item| {
            let href = item.href();
            let active = if href == shell.path { " active" } else { "" };
            format!(
                r#"<li class="nav-item"><a class="nav-link{}"{}{}>{}</a></li>"#,
                active,
                attr("href", href),
                ctx.edit(&item.edit, "label"),
                escape(&item.label)
            )
        })
        .collect();

    let toggled = shell.theme.toggled();
    format!(
        r#"<header class="header">
{announcement}
    <div class="max-width header-div">
        <div class="wrapper-logo">
            <a href="/" class="logo-tag" title="{title}">{logo}</a>
        </div>
        <nav class="header-menu"><ul class="nav-ul">{menu}</ul></nav>
        <a class="theme-toggle"{toggle_href} title="Switch to {toggled} theme">{toggled}</a>
    </div>
</header>"#,
        announcement = announcement,
        title = escape(&header.title),
        logo = image(header.logo.as_ref(), "logo", &ctx.edit(&header.edit, "logo")),
        menu = menu,
        toggle_href = attr("href", &format!("{}?theme={}", shell.path, toggled.as_str())),
        toggled = toggled.as_str(),
    )
}

fn footer(footer: &Footer, ctx: &RenderContext) -> String {
    let links: String = footer
        .navigation
        .link
        .iter()
        .filter(|link| !link.is_empty())
        .map(|link| {
            format!(
                r#"<li class="footer-nav-li"><a{}>{}</a></li>"#,
                attr("href", &link.href),
                escape(&link.title)
            )
        })
        .collect();

    let social: String = footer
        .social
        .social_share
        .iter()
        .filter(|share| !share.link.href.is_empty())
        .map(|share| {
            format!(
                r#"<a class="social-link"{}{}>{}</a>"#,
                attr("href", &share.link.href),
                attr("title", &share.link.title),
                image(share.icon.as_ref(), "social-icon", "")
            )
        })
        .collect();

    format!(
        r#"<footer>
    <div class="max-width footer-div">
        <div class="col-quarter">
            <a href="/" class="logo-tag">{logo}</a>
        </div>
        <nav class="col-half"><ul class="nav-ul">{links}</ul></nav>
        <div class="col-quarter social-nav">{social}</div>
    </div>
    <div class="copyright"{copyright_edit}>{copyright}</div>
</footer>"#,
        logo = image(footer.logo.as_ref(), "logo footer-logo", &ctx.edit(&footer.edit, "logo")),
        links = links,
        social = social,
        copyright_edit = ctx.edit(&footer.edit, "copyright"),
        copyright = markup(&footer.copyright),
    )
}

const RELOAD_SCRIPT: &str = r#"<script>
    // Live preview: reload when the CMS reports a change
    const source = new EventSource('/_live/events');
    source.onmessage = () => location.reload();
    source.onerror = () => {
        console.log('Preview server disconnected');
        source.close();
    };
</script>"#;

const STYLE: &str = r#"
:root {
    --bg: #ffffff;
    --fg: #222222;
    --muted: #6b6b6b;
    --accent: #6c5ce7;
    --surface: #f5f5f7;
}
[data-theme="dark"] {
    --bg: #16161a;
    --fg: #e6e6e6;
    --muted: #9a9aa5;
    --accent: #a29bfe;
    --surface: #222228;
}
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: var(--fg); }
a { color: var(--accent); }
.max-width { max-width: 1200px; margin: 0 auto; padding: 0 1rem; }
.header-div, .footer-div { display: flex; align-items: center; justify-content: space-between; gap: 1rem; }
.nav-ul { display: flex; gap: 1.5rem; list-style: none; padding: 0; }
.nav-link.active { font-weight: 700; }
.notification-bar { background: var(--accent); color: #fff; text-align: center; padding: 0.5rem; }
.logo { max-height: 48px; }
.page { min-height: 60vh; }
.hero-banner, .blog-page-banner { padding: 4rem 1rem; background: var(--surface); }
.home-advisor-section, .contact-page-section { display: flex; gap: 2rem; padding: 3rem 1rem; }
.home-advisor-section > div, .contact-page-section > div { flex: 1; }
.member-section, .demo-section, .home-featured-blogs, .team-content { display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 1.5rem; padding: 1rem; }
.cards, .content-section, .featured-blog, .team-details, .blog-list-item { background: var(--surface); padding: 1rem; border-radius: 8px; }
img { max-width: 100%; }
.btn { display: inline-block; padding: 0.6rem 1.2rem; border-radius: 4px; border: 1px solid var(--accent); text-decoration: none; }
.unconverted { white-space: pre-wrap; color: var(--muted); }
.loading { display: flex; flex-direction: column; align-items: center; padding: 6rem 0; color: var(--muted); }
.spinner { width: 32px; height: 32px; border: 3px solid var(--surface); border-top-color: var(--accent); border-radius: 50%; animation: spin 1s linear infinite; }
@keyframes spin { to { transform: rotate(360deg); } }
.not-found, .fetch-error { text-align: center; padding: 6rem 1rem; }
.copyright { text-align: center; padding: 1rem; color: var(--muted); }
.blog-container { display: flex; gap: 2rem; padding: 2rem 1rem; }
.blog-column-left { flex: 3; }
.blog-column-right { flex: 1; }
.blog-meta { color: var(--muted); }
"#;
