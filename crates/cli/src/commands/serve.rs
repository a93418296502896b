use crate::site::Site;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{
        Html, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::Deserialize;
use stacksite_core::{BlogPost, Entry, Page, Theme};
use stacksite_delivery::{
    EntryChange, LiveUpdates, PageContainer, PageState, PreviewSession, Subscription,
};
use stacksite_generator::{Chrome, decode_entries, decode_entry};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

const THEME_COOKIE: &str = "theme";

/// Live-preview containers kept at once; each one holds a live subscription.
const MAX_LIVE_PAGES: usize = 64;

/// A live-preview page kept warm between requests.
struct LivePage {
    container: Arc<PageContainer<Entry>>,
    last_used: Instant,
    _subscription: Subscription,
}

#[derive(Clone)]
pub struct AppState {
    site: Arc<Site>,
    live: Arc<LiveUpdates>,
    reload_tx: broadcast::Sender<()>,
    pages: Arc<Mutex<HashMap<String, LivePage>>>,
    /// `Content-Security-Policy` allowing the CMS editor to frame pages.
    frame_policy: Option<HeaderValue>,
    _reload_subscription: Arc<Subscription>,
}

impl AppState {
    pub fn new(site: Site, live: Arc<LiveUpdates>, app_host: Option<&str>) -> Self {
        let (reload_tx, _) = broadcast::channel::<()>(100);

        // Page changes reload browsers once their container has refetched;
        // everything else is fetched per request and can reload right away.
        let tx = reload_tx.clone();
        let reload_subscription = live.subscribe(move |change| {
            if change.content_type_uid != "page" {
                let _ = tx.send(());
            }
        });

        let frame_policy = app_host.and_then(|host| {
            let host = if host.starts_with("http://") || host.starts_with("https://") {
                host.to_string()
            } else {
                format!("https://{}", host)
            };
            HeaderValue::from_str(&format!("frame-ancestors 'self' {}", host)).ok()
        });

        Self {
            site: Arc::new(site),
            live,
            reload_tx,
            pages: Arc::new(Mutex::new(HashMap::new())),
            frame_policy,
            _reload_subscription: Arc::new(reload_subscription),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    theme: Option<String>,
    live_preview: Option<String>,
}

impl PageQuery {
    fn preview(&self) -> Option<PreviewSession> {
        self.live_preview
            .as_deref()
            .filter(|hash| !hash.is_empty())
            .map(PreviewSession::new)
    }
}

/// Serve the site, rendering each request from the CMS.
pub async fn run(
    site: Site,
    live: Arc<LiveUpdates>,
    app_host: Option<String>,
    port: u16,
) -> Result<()> {
    println!("🌐 Starting site server...");
    println!("   Site: {}", site.config.title);
    if live.is_enabled() {
        println!("   ✓ Live preview enabled");
    }

    let state = AppState::new(site, live, app_host.as_deref());
    let app = router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Site ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/blog", get(blog_list_handler))
        .route("/blog/{*slug}", get(blog_post_handler))
        .route("/_live/change", post(change_handler))
        .route("/_live/events", get(sse_handler))
        .route("/{*path}", get(page_handler))
        .with_state(state)
}

async fn home_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    render_page(&state, "/".to_string(), &query, &headers).await
}

async fn page_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    render_page(&state, normalize(&path), &query, &headers).await
}

async fn blog_list_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let theme = pick_theme(&state, &query, &headers);
    let resolver = state.site.resolver.with_preview(query.preview());
    let renderer = &state.site.renderer;

    let (chrome, pages) = match state.site.chrome(&resolver).await {
        Ok(loaded) => loaded,
        Err(err) => {
            return unavailable(&state, &Chrome::default(), "/blog", &err, theme, &query);
        }
    };
    let listing = match resolver.blog_list().await {
        Ok(listing) => listing,
        Err(err) => return unavailable(&state, &chrome, "/blog", &err, theme, &query),
    };

    let landing = pages.iter().find(|page| page.url == stacksite_generator::BLOG_PREFIX);
    let recent: Vec<BlogPost> = decode_entries(&listing.recent);
    let archived: Vec<BlogPost> = decode_entries(&listing.archived);
    let html = renderer.blog_list(&chrome, landing, &recent, &archived, theme);
    respond(&state, StatusCode::OK, html, theme, &query)
}

async fn blog_post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Response {
    let url = normalize(&format!("blog/{}", slug));
    let theme = pick_theme(&state, &query, &headers);
    let resolver = state.site.resolver.with_preview(query.preview());
    let renderer = &state.site.renderer;

    let chrome = match state.site.chrome(&resolver).await {
        Ok((chrome, _)) => chrome,
        Err(err) => {
            return unavailable(&state, &Chrome::default(), &url, &err, theme, &query);
        }
    };

    match resolver.blog_post(&url).await {
        Ok(Some(entry)) => match decode_entry::<BlogPost>(&entry) {
            Some(post) => {
                let html = renderer.blog_post(&chrome, &post, theme);
                respond(&state, StatusCode::OK, html, theme, &query)
            }
            None => not_found(&state, &chrome, &url, theme, &query),
        },
        Ok(None) => not_found(&state, &chrome, &url, theme, &query),
        Err(err) => unavailable(&state, &chrome, &url, &err, theme, &query),
    }
}

async fn render_page(
    state: &AppState,
    url: String,
    query: &PageQuery,
    headers: &HeaderMap,
) -> Response {
    let theme = pick_theme(state, query, headers);
    let preview = query.preview();
    let resolver = state.site.resolver.with_preview(preview.clone());

    let chrome = match state.site.chrome(&resolver).await {
        Ok((chrome, _)) => chrome,
        Err(err) => return unavailable(state, &Chrome::default(), &url, &err, theme, query),
    };

    let page_state = if state.live.is_enabled() {
        live_page(state, &url, preview).await
    } else {
        match resolver.page(&url).await {
            Ok(Some(entry)) => PageState::Ready(entry),
            Ok(None) => PageState::NotFound,
            Err(err) => PageState::Failed(err.to_string()),
        }
    };

    let renderer = &state.site.renderer;
    match page_state {
        PageState::Loading => {
            let html = renderer.loading(&chrome, &url, theme);
            respond(state, StatusCode::OK, html, theme, query)
        }
        PageState::Ready(entry) | PageState::Refetching(entry) => {
            match decode_entry::<Page>(&entry) {
                Some(page) => {
                    let html = renderer.page(&chrome, &page, theme);
                    respond(state, StatusCode::OK, html, theme, query)
                }
                None => not_found(state, &chrome, &url, theme, query),
            }
        }
        PageState::NotFound => not_found(state, &chrome, &url, theme, query),
        PageState::Failed(message) => {
            tracing::error!(%url, error = %message, "Page fetch failed");
            let html = renderer.failed(&chrome, &url, &message, theme);
            respond(state, StatusCode::BAD_GATEWAY, html, theme, query)
        }
    }
}

/// State of the live-preview container for `url`, creating and loading it
/// on first request.
///
/// Only containers holding an entry stay cached; a missing page or a failed
/// load is retried from scratch on the next request.
async fn live_page(
    state: &AppState,
    url: &str,
    preview: Option<PreviewSession>,
) -> PageState<Entry> {
    let existing = lock(&state.pages).get_mut(url).map(|page| {
        page.last_used = Instant::now();
        page.container.clone()
    });
    if let Some(container) = existing {
        let current = container.state();
        if preview.is_none() && !is_settled_without_entry(&current) {
            return current;
        }
        let loaded = container.refetch(preview).await;
        if is_settled_without_entry(&loaded) {
            forget_page(state, url, &container);
        }
        return loaded;
    }

    let resolver = state.site.resolver.clone();
    let page_url = url.to_string();
    let container = Arc::new(PageContainer::new(
        state.site.config.refetch_failure,
        move |preview: Option<PreviewSession>| {
            let resolver = resolver.with_preview(preview);
            let url = page_url.clone();
            async move { resolver.page(&url).await }
        },
    ));
    let subscription = container.watch_live(&state.live);
    remember_page(state, url, container.clone(), subscription);

    let loaded = container.refetch(preview).await;
    if is_settled_without_entry(&loaded) {
        forget_page(state, url, &container);
    } else {
        spawn_reload_on_change(&container, state.reload_tx.clone());
    }
    loaded
}

fn is_settled_without_entry(page: &PageState<Entry>) -> bool {
    matches!(page, PageState::NotFound | PageState::Failed(_))
}

/// Cache a container, evicting the least recently requested page when full.
fn remember_page(
    state: &AppState,
    url: &str,
    container: Arc<PageContainer<Entry>>,
    subscription: Subscription,
) {
    let mut pages = lock(&state.pages);
    if !pages.contains_key(url) && pages.len() >= MAX_LIVE_PAGES {
        let oldest = pages
            .iter()
            .min_by_key(|(_, page)| page.last_used)
            .map(|(path, _)| path.clone());
        if let Some(path) = oldest {
            pages.remove(&path);
            tracing::debug!(%path, "Evicted live page container");
        }
    }
    pages.insert(
        url.to_string(),
        LivePage {
            container,
            last_used: Instant::now(),
            _subscription: subscription,
        },
    );
    tracing::debug!(%url, cached = pages.len(), "Live page container created");
}

/// Drop the cached container for `url` if it is still `container`.
fn forget_page(state: &AppState, url: &str, container: &Arc<PageContainer<Entry>>) {
    let mut pages = lock(&state.pages);
    if pages
        .get(url)
        .is_some_and(|page| Arc::ptr_eq(&page.container, container))
    {
        pages.remove(url);
        tracing::debug!(%url, "Dropped live page container");
    }
}

/// Tell browsers to reload whenever a container settles after its first
/// load.
fn spawn_reload_on_change(
    container: &Arc<PageContainer<Entry>>,
    reload_tx: broadcast::Sender<()>,
) {
    let mut rx = container.watch();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let settled = !matches!(
                *rx.borrow_and_update(),
                PageState::Refetching(_) | PageState::Loading
            );
            if settled {
                let _ = reload_tx.send(());
            }
        }
    });
}

/// Entry changes from the preview bridge or a CMS webhook.
async fn change_handler(
    State(state): State<AppState>,
    Json(change): Json<EntryChange>,
) -> Response {
    if !state.live.is_enabled() {
        return (StatusCode::NOT_FOUND, "live preview is disabled").into_response();
    }
    tracing::info!(
        content_type = %change.content_type_uid,
        entry_uid = %change.entry_uid,
        "Entry changed"
    );
    let notified = state.live.publish(&change);
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "subscribers": notified })),
    )
        .into_response()
}

/// SSE endpoint that tells preview browsers to reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(()) => yield Ok(Event::default().data("reload")),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn not_found(
    state: &AppState,
    chrome: &Chrome,
    url: &str,
    theme: Theme,
    query: &PageQuery,
) -> Response {
    tracing::debug!(%url, "No entry for path");
    let html = state.site.renderer.not_found(chrome, url, theme);
    respond(state, StatusCode::NOT_FOUND, html, theme, query)
}

fn unavailable(
    state: &AppState,
    chrome: &Chrome,
    url: &str,
    err: &stacksite_delivery::DeliveryError,
    theme: Theme,
    query: &PageQuery,
) -> Response {
    tracing::error!(%url, error = %err, "Content fetch failed");
    let html = state.site.renderer.failed(chrome, url, &err.to_string(), theme);
    respond(state, StatusCode::BAD_GATEWAY, html, theme, query)
}

fn respond(
    state: &AppState,
    status: StatusCode,
    html: String,
    theme: Theme,
    query: &PageQuery,
) -> Response {
    let mut response = (status, Html(html)).into_response();
    let headers = response.headers_mut();

    if query.theme.as_deref().and_then(Theme::parse).is_some()
        && let Ok(cookie) = HeaderValue::from_str(&format!(
            "{}={}; Path=/; SameSite=Lax",
            THEME_COOKIE,
            theme.as_str()
        ))
    {
        headers.insert(header::SET_COOKIE, cookie);
    }
    if let Some(policy) = &state.frame_policy {
        headers.insert(header::CONTENT_SECURITY_POLICY, policy.clone());
    }
    response
}

/// `?theme=` wins over the `theme` cookie, which wins over the site default.
fn pick_theme(state: &AppState, query: &PageQuery, headers: &HeaderMap) -> Theme {
    query
        .theme
        .as_deref()
        .and_then(Theme::parse)
        .or_else(|| cookie(headers, THEME_COOKIE).and_then(|value| Theme::parse(&value)))
        .unwrap_or(state.site.config.default_theme)
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `about/` and `/about` both route to `/about`.
fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
