//! Blog list and post views.

use crate::blocks::{RenderContext, image, markup};
use stacksite_core::BlogPost;
use stacksite_core::html::{attr, escape};

fn byline(post: &BlogPost, ctx: &RenderContext) -> String {
    let authors = post.author_names();
    let by = if authors.is_empty() {
        String::new()
    } else {
        format!(
            r#", <strong{}>{}</strong>"#,
            post.author
                .first()
                .map(|a| ctx.edit(&a.edit, "title"))
                .unwrap_or_default(),
            escape(&authors.join(", "))
        )
    };
    format!(
        r#"<p class="blog-meta"><span{}>{}</span>{}</p>"#,
        ctx.edit(&post.edit, "date"),
        escape(&post.display_date()),
        by
    )
}

fn list_item(post: &BlogPost, ctx: &RenderContext) -> String {
    format!(
        r#"<div class="blog-list-item">
    <a{}>{}</a>
    <div class="blog-content">
        <a{}><h3{}>{}</h3></a>
        {}
        <div{}>{}</div>
        <a class="blogpost-readmore"{}>Read More</a>
    </div>
</div>"#,
        attr("href", &post.url),
        image(post.featured_image.as_ref(), "blog-list-img", ""),
        attr("href", &post.url),
        ctx.edit(&post.edit, "title"),
        escape(&post.title),
        byline(post, ctx),
        ctx.edit(&post.edit, "body"),
        markup(&post.body),
        attr("href", &post.url),
    )
}

/// `/blog`: current posts in the main column, archived posts beside them.
pub fn render_list(recent: &[BlogPost], archived: &[BlogPost], ctx: &RenderContext) -> String {
    let recent_html: String = recent.iter().map(|post| list_item(post, ctx)).collect();
    let archived_html: String = archived
        .iter()
        .map(|post| {
            format!(
                r#"<a class="archived-link"{}><h4{}>{}</h4></a>"#,
                attr("href", &post.url),
                ctx.edit(&post.edit, "title"),
                escape(&post.title)
            )
        })
        .collect();

    let recent_html = if recent.is_empty() {
        r#"<p class="blog-empty">No posts yet.</p>"#.to_string()
    } else {
        recent_html
    };

    format!(
        r#"<div class="blog-container">
    <div class="blog-column-left">{}</div>
    <div class="blog-column-right">
        <h2>Archived Blogs</h2>
        {}
    </div>
</div>"#,
        recent_html, archived_html
    )
}

/// `/blog/<slug>`: one post with its related posts.
pub fn render_post(post: &BlogPost, ctx: &RenderContext) -> String {
    let related: String = post
        .related_post
        .iter()
        .map(|related| {
            format!(
                r#"<a class="related-post"{}>
            <h4{}>{}</h4>
            <div>{}</div>
        </a>"#,
                attr("href", &related.url),
                ctx.edit(&related.edit, "title"),
                escape(&related.title),
                markup(&related.body)
            )
        })
        .collect();

    let related_section = if related.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="related-posts"{}><h2>Related Post</h2>{}</div>"#,
            ctx.edit(&post.edit, "related_post"),
            related
        )
    };

    format!(
        r#"<div class="blog-container">
    <article class="blog-detail blog-column-left">
        <h1{}>{}</h1>
        {}
        {}
        <div class="blog-body"{}>{}</div>
    </article>
    <div class="blog-column-right">{}</div>
</div>"#,
        ctx.edit(&post.edit, "title"),
        escape(&post.title),
        byline(post, ctx),
        image(post.featured_image.as_ref(), "blog-detail-img", ""),
        ctx.edit(&post.edit, "body"),
        markup(&post.body),
        related_section
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stacksite_core::{Author, Markup};

    fn post(title: &str, url: &str) -> BlogPost {
        BlogPost {
            uid: title.to_lowercase(),
            title: title.to_string(),
            url: url.to_string(),
            date: "2021-04-07".to_string(),
            body: Markup::Html(format!("<p>{} body</p>", title)),
            author: vec![Author {
                uid: "a1".to_string(),
                title: "Ada".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn list_separates_archived_posts() {
        let html = render_list(
            &[post("Fresh", "/blog/fresh")],
            &[post("Old", "/blog/old")],
            &RenderContext::default(),
        );
        let archive_at = html.find("Archived Blogs").unwrap();
        assert!(html.find("Fresh").unwrap() < archive_at);
        assert!(html.find(r#"href="/blog/old""#).unwrap() > archive_at);
    }

    #[test]
    fn empty_list_says_so() {
        let html = render_list(&[], &[], &RenderContext::default());
        assert!(html.contains("No posts yet."));
    }

    #[test]
    fn post_shows_date_author_body_and_related() {
        let mut main = post("Main", "/blog/main");
        main.related_post = vec![post("Other", "/blog/other")];
        let html = render_post(&main, &RenderContext::default());

        assert!(html.contains("April 7, 2021"));
        assert!(html.contains("<strong>Ada</strong>"));
        assert!(html.contains("<p>Main body</p>"));
        assert!(html.contains(r#"href="/blog/other""#));
        assert!(html.contains("Related Post"));
    }

    #[test]
    fn post_without_related_omits_section() {
        let html = render_post(&post("Solo", "/blog/solo"), &RenderContext::default());
        assert!(!html.contains("Related Post"));
    }
}
