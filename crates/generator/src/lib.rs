//! HTML generation for pages, blog views and the static export.

pub mod blocks;
pub mod blog;
pub mod layout;
pub mod navigation;

use blocks::RenderContext;
use layout::Shell;
use serde::de::DeserializeOwned;
use stacksite_core::{BlogPost, Entry, Footer, Header, Page, SiteConfig, Theme};

/// Path prefix of blog routes.
pub const BLOG_PREFIX: &str = "/blog";

/// Header (with merged navigation) and footer shared by every page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chrome {
    pub header: Option<Header>,
    pub footer: Option<Footer>,
}

impl Chrome {
    pub fn assemble(header: Option<&Entry>, footer: Option<&Entry>, all_pages: &[Page]) -> Self {
        let header = header
            .and_then(decode_entry::<Header>)
            .map(|h| navigation::build(&h, all_pages));
        Self {
            header,
            footer: footer.and_then(decode_entry),
        }
    }
}

/// Decode a typed view, logging and dropping entries that do not fit.
pub fn decode_entry<T: DeserializeOwned>(entry: &Entry) -> Option<T> {
    match entry.decode() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(entry_uid = %entry.uid, error = %err, "Skipping undecodable entry");
            None
        }
    }
}

pub fn decode_entries<T: DeserializeOwned>(entries: &[Entry]) -> Vec<T> {
    entries.iter().filter_map(decode_entry).collect()
}

pub fn is_blog_path(path: &str) -> bool {
    path == BLOG_PREFIX || path.starts_with("/blog/")
}

/// Renders complete documents for each kind of route.
#[derive(Debug, Clone)]
pub struct SiteRenderer {
    site_title: String,
    live_reload: bool,
    edit_mode: bool,
}

impl SiteRenderer {
    pub fn new(config: &SiteConfig, live_reload: bool, edit_mode: bool) -> Self {
        Self {
            site_title: config.title.clone(),
            live_reload,
            edit_mode,
        }
    }

    fn shell<'a>(
        &'a self,
        chrome: &'a Chrome,
        page_title: Option<&'a str>,
        path: &'a str,
        theme: Theme,
    ) -> Shell<'a> {
        Shell {
            site_title: &self.site_title,
            page_title,
            theme,
            path,
            header: chrome.header.as_ref(),
            footer: chrome.footer.as_ref(),
            live_reload: self.live_reload,
            edit_mode: self.edit_mode,
        }
    }

    fn context<'a>(&self, uid: &'a str, locale: &'a str, blog_page: bool) -> RenderContext<'a> {
        RenderContext {
            page_uid: uid,
            locale,
            edit_mode: self.edit_mode,
            blog_page,
        }
    }

    pub fn page(&self, chrome: &Chrome, page: &Page, theme: Theme) -> String {
        let ctx = self.context(&page.uid, &page.locale, is_blog_path(&page.url));
        let body = blocks::render(&page.page_components, &ctx).join("\n");
        let shell = self.shell(chrome, Some(&page.title), &page.url, theme);
        layout::render_document(&shell, &body)
    }

    /// The blog index. `landing` is the `/blog` page entry, whose blocks
    /// (typically a banner) render above the list.
    pub fn blog_list(
        &self,
        chrome: &Chrome,
        landing: Option<&Page>,
        recent: &[BlogPost],
        archived: &[BlogPost],
        theme: Theme,
    ) -> String {
        let banner = landing
            .map(|page| {
                let ctx = self.context(&page.uid, &page.locale, true);
                blocks::render(&page.page_components, &ctx).join("\n")
            })
            .unwrap_or_default();
        let list = blog::render_list(recent, archived, &self.context("", "", true));
        let title = landing.map(|page| page.title.as_str()).unwrap_or("Blog");
        let shell = self.shell(chrome, Some(title), BLOG_PREFIX, theme);
        layout::render_document(&shell, &format!("{}\n{}", banner, list))
    }

    pub fn blog_post(&self, chrome: &Chrome, post: &BlogPost, theme: Theme) -> String {
        let ctx = self.context(&post.uid, &post.locale, true);
        let shell = self.shell(chrome, Some(&post.title), &post.url, theme);
        layout::render_document(&shell, &blog::render_post(post, &ctx))
    }

    pub fn not_found(&self, chrome: &Chrome, path: &str, theme: Theme) -> String {
        let shell = self.shell(chrome, Some("Not found"), path, theme);
        layout::render_document(&shell, &layout::not_found_body(path))
    }

    pub fn failed(&self, chrome: &Chrome, path: &str, message: &str, theme: Theme) -> String {
        let shell = self.shell(chrome, Some("Unavailable"), path, theme);
        layout::render_document(&shell, &layout::error_body(message))
    }

    pub fn loading(&self, chrome: &Chrome, path: &str, theme: Theme) -> String {
        let shell = self.shell(chrome, None, path, theme);
        layout::render_document(&shell, &layout::loading_placeholder())
    }
}

/// Everything a static export renders.
#[derive(Debug, Clone, Default)]
pub struct SiteContent {
    pub chrome: Chrome,
    pub pages: Vec<Page>,
    pub recent_posts: Vec<BlogPost>,
    pub archived_posts: Vec<BlogPost>,
    /// Fully resolved posts, one file each.
    pub posts: Vec<BlogPost>,
}

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>, // (relative output path, html)
}

/// Output file for a route: `/` is `index.html`, `/about` is
/// `about/index.html`. `.` and `..` segments are dropped.
pub fn output_path(url: &str) -> String {
    let segments: Vec<&str> = url
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    if segments.is_empty() {
        "index.html".to_string()
    } else {
        format!("{}/index.html", segments.join("/"))
    }
}

pub fn generate_site(
    content: &SiteContent,
    renderer: &SiteRenderer,
    theme: Theme,
) -> GeneratedSite {
    let mut pages = Vec::new();
    let landing = content.pages.iter().find(|page| page.url == BLOG_PREFIX);

    for page in &content.pages {
        if page.url.is_empty() || page.url == BLOG_PREFIX {
            continue;
        }
        pages.push((output_path(&page.url), renderer.page(&content.chrome, page, theme)));
    }

    pages.push((
        output_path(BLOG_PREFIX),
        renderer.blog_list(
            &content.chrome,
            landing,
            &content.recent_posts,
            &content.archived_posts,
            theme,
        ),
    ));

    for post in &content.posts {
        if post.url.is_empty() {
            continue;
        }
        pages.push((output_path(&post.url), renderer.blog_post(&content.chrome, post, theme)));
    }

    pages.push((
        "404.html".to_string(),
        renderer.not_found(&content.chrome, "/404", theme),
    ));

    GeneratedSite { pages }
}
