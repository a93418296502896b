use crate::site::Site;
use anyhow::{Context, Result};
use stacksite_generator::generate_site;
use std::fs;
use std::path::Path;

/// Export every published route as static HTML.
pub async fn run(site: Site, output: &Path) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Site: {}", site.config.title);
    println!("   Output: {}", output.display());
    println!();

    println!("📥 Fetching content...");
    let content = site
        .content()
        .await
        .context("Failed to fetch content from the CMS")?;
    println!("   ✓ Pages: {}", content.pages.len());
    println!(
        "   ✓ Blog posts: {} ({} archived)",
        content.posts.len(),
        content.archived_posts.len()
    );

    let generated = generate_site(&content, &site.renderer, site.config.default_theme);
    let written = write_site(output, &generated.pages)?;

    println!("\n✅ Wrote {} files to {}", written, output.display());
    Ok(())
}

fn write_site(output: &Path, pages: &[(String, String)]) -> Result<usize> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    for (relative, html) in pages {
        let dst = output.join(relative);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&dst, html).with_context(|| format!("Failed to write {}", dst.display()))?;
        tracing::debug!(path = %dst.display(), "Wrote page");
    }
    Ok(pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stacksite_core::SiteConfig;
    use stacksite_delivery::{ContentClient, MemoryTransport, Resolver};
    use std::sync::Arc;

    #[tokio::test]
    async fn exports_pages_posts_and_not_found() {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert("page", json!({"uid": "p1", "title": "Home", "url": "/"}));
        transport.insert("page", json!({"uid": "p2", "title": "About", "url": "/about"}));
        transport.insert(
            "blog_post",
            json!({
                "uid": "b1",
                "title": "Launch",
                "url": "/blog/launch",
                "body": "<p>Out now</p>"
            }),
        );
        let resolver = Resolver::new(ContentClient::new(transport), "en-us", false);
        let site = Site::new(resolver, SiteConfig::default(), false);

        let dir = tempfile::tempdir().unwrap();
        run(site, dir.path()).await.unwrap();

        for file in [
            "index.html",
            "about/index.html",
            "blog/index.html",
            "blog/launch/index.html",
            "404.html",
        ] {
            assert!(dir.path().join(file).exists(), "missing {}", file);
        }
        let post = fs::read_to_string(dir.path().join("blog/launch/index.html")).unwrap();
        assert!(post.contains("<p>Out now</p>"));
        assert!(!post.contains("EventSource"));
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let transport = Arc::new(MemoryTransport::new());
        transport.fail_next(100);
        let client = ContentClient::new(transport).with_retry(stacksite_delivery::RetryConfig {
            max_retries: 0,
            ..Default::default()
        });
        let site = Site::new(Resolver::new(client, "en-us", false), SiteConfig::default(), false);

        let dir = tempfile::tempdir().unwrap();
        let err = run(site, dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch content"));
    }
}
