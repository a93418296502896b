use stacksite_core::{BlogPost, CmsSettings, Page, SiteConfig};
use stacksite_delivery::{Resolver, Result};
use stacksite_generator::{Chrome, SiteContent, SiteRenderer, decode_entries, decode_entry};
use std::sync::Arc;

/// Resolver and renderer for one stack, shared by every command.
#[derive(Clone)]
pub struct Site {
    pub resolver: Resolver,
    pub renderer: SiteRenderer,
    pub config: SiteConfig,
}

impl Site {
    pub fn new(resolver: Resolver, config: SiteConfig, live_reload: bool) -> Self {
        let renderer = SiteRenderer::new(&config, live_reload, resolver.live_edit_tags());
        Self {
            resolver,
            renderer,
            config,
        }
    }

    pub fn from_settings(settings: Arc<CmsSettings>, config: SiteConfig) -> Result<Self> {
        let live_reload = settings.live_preview;
        let resolver = Resolver::from_settings(settings)?;
        Ok(Self::new(resolver, config, live_reload))
    }

    /// Header, footer and the page list used to complete the menu.
    pub async fn chrome(&self, resolver: &Resolver) -> Result<(Chrome, Vec<Page>)> {
        let (header, footer, pages) =
            tokio::try_join!(resolver.header(), resolver.footer(), resolver.all_pages())?;
        let pages: Vec<Page> = decode_entries(&pages);
        let chrome = Chrome::assemble(header.as_ref(), footer.as_ref(), &pages);
        Ok((chrome, pages))
    }

    /// Everything the static export writes, resolved from published content.
    pub async fn content(&self) -> Result<SiteContent> {
        let (chrome, pages) = self.chrome(&self.resolver).await?;
        let listing = self.resolver.blog_list().await?;
        let recent_posts: Vec<BlogPost> = decode_entries(&listing.recent);
        let archived_posts: Vec<BlogPost> = decode_entries(&listing.archived);

        let urls: Vec<&str> = recent_posts
            .iter()
            .chain(archived_posts.iter())
            .map(|post| post.url.as_str())
            .filter(|url| !url.is_empty())
            .collect();
        let resolved =
            futures::future::try_join_all(urls.iter().map(|url| self.resolver.blog_post(url)))
                .await?;
        let posts = resolved
            .iter()
            .flatten()
            .filter_map(decode_entry::<BlogPost>)
            .collect();

        Ok(SiteContent {
            chrome,
            pages,
            recent_posts,
            archived_posts,
            posts,
        })
    }
}
