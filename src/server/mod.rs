//! Web server: public pages plus staff draft preview

use anyhow::Result;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::store::ContentStore;
use crate::templates::Pages;
use crate::visibility::{self, Requester};
use crate::Site;

/// Header carrying a staff token
pub const STAFF_TOKEN_HEADER: &str = "x-staff-token";

/// Shared per-process server state
pub struct AppState {
    store: Arc<ContentStore>,
    pages: Pages,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(store: Arc<ContentStore>, pages: Pages, static_dir: PathBuf) -> Self {
        Self {
            store,
            pages,
            static_dir,
        }
    }

    /// Staff when a configured token is presented, otherwise a visitor
    fn requester_for(&self, headers: &HeaderMap) -> Requester {
        let config = self.pages.config();
        let from_header = headers
            .get(STAFF_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        let from_bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if [from_header, from_bearer]
            .into_iter()
            .flatten()
            .any(|token| config.is_staff_token(token.trim()))
        {
            Requester::Staff
        } else {
            Requester::Visitor
        }
    }

    /// Turn a page result into a response, rendering the 404 page for misses
    fn respond(&self, page: Result<String, PageError>) -> Response {
        match page {
            Ok(html) => Html(html).into_response(),
            Err(PageError::NotFound) => match self.pages.not_found() {
                Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
                Err(e) => internal_error(e),
            },
            Err(PageError::Internal(e)) => internal_error(e),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Requester {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(state.requester_for(&parts.headers))
    }
}

/// Why a page could not be produced
#[derive(Debug)]
enum PageError {
    NotFound,
    Internal(anyhow::Error),
}

impl From<Error> for PageError {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound => PageError::NotFound,
            other => PageError::Internal(other.into()),
        }
    }
}

impl From<anyhow::Error> for PageError {
    fn from(e: anyhow::Error) -> Self {
        PageError::Internal(e)
    }
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("Failed to render page: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/articles", get(article_list_handler))
        .route("/articles/", get(article_list_handler))
        .route("/articles/:id", get(article_detail_handler))
        .route("/bureaus", get(bureau_list_handler))
        .route("/bureaus/", get(bureau_list_handler))
        .route("/bureaus/:slug", get(bureau_detail_handler))
        .nest_service("/static", static_files)
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let store = Arc::new(site.open_store()?);
    let pages = Pages::new(site.config.clone())?;
    let state = Arc::new(AppState::new(store, pages, site.static_dir.clone()));

    if site.config.staff_tokens.is_empty() {
        tracing::warn!("No staff_tokens configured, draft preview is disabled");
    }

    let app = router(state);

    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let limit = state.pages.config().latest_articles;
    let latest = visibility::latest_articles(&state.store, limit);
    let bureaus = state.store.bureaus();
    let page = state.pages.index(&latest, &bureaus).map_err(PageError::from);
    state.respond(page)
}

async fn article_list_handler(State(state): State<Arc<AppState>>) -> Response {
    let articles = visibility::published_articles(&state.store);
    let bureaus = state.store.bureaus();
    let page = state
        .pages
        .article_list(&articles, &bureaus)
        .map_err(PageError::from);
    state.respond(page)
}

async fn article_detail_handler(
    State(state): State<Arc<AppState>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Response {
    let page = article_page(&state, &id, requester);
    state.respond(page)
}

fn article_page(state: &AppState, id: &str, requester: Requester) -> Result<String, PageError> {
    let id: u64 = id.parse().map_err(|_| PageError::NotFound)?;
    let article = visibility::find_article(&state.store, id, requester)?;
    let bureau = article.bureau.and_then(|b| state.store.get_bureau(b));
    Ok(state.pages.article_detail(&article, bureau.as_ref())?)
}

async fn bureau_list_handler(State(state): State<Arc<AppState>>) -> Response {
    let bureaus = state.store.bureaus();
    let page = state.pages.bureau_list(&bureaus).map_err(PageError::from);
    state.respond(page)
}

async fn bureau_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Response {
    let page = bureau_page(&state, &slug);
    state.respond(page)
}

fn bureau_page(state: &AppState, slug: &str) -> Result<String, PageError> {
    let bureau = state
        .store
        .get_bureau_by_slug(slug)
        .ok_or(PageError::NotFound)?;
    let articles = visibility::bureau_articles(&state.store, bureau.id);
    Ok(state.pages.bureau_detail(&bureau, &articles)?)
}

async fn not_found_handler(State(state): State<Arc<AppState>>) -> Response {
    state.respond(Err(PageError::NotFound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::content::{ArticleDraft, BureauDraft, RenderContent};
    use crate::store::ManualClock;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    const STAFF_TOKEN: &str = "staff-secret";

    struct Fixture {
        store: Arc<ContentStore>,
        app: Router,
        draft_id: u64,
        _static_dir: tempfile::TempDir,
    }

    /// 7 published and 3 draft articles, the first published one also
    /// attached to a bureau and re-saved later; 5 bureaus
    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2023, 2, 1, 1, 23, 45).unwrap(),
        ));
        let store = Arc::new(ContentStore::in_memory(clock.clone()));
        for n in 0..5 {
            store
                .create_bureau(BureauDraft::new(
                    format!("テスト局{}", n),
                    format!("test{}", n),
                    "テスト用の局です。",
                ))
                .unwrap();
        }
        for n in 0..7 {
            store
                .create_article(
                    ArticleDraft::new(format!("公開記事{}", n), "## 見出し2\n\n本文")
                        .published(true),
                )
                .unwrap();
        }
        let mut draft_id = 0;
        for n in 0..3 {
            draft_id = store
                .create_article(ArticleDraft::new(format!("非公開記事{}", n), "準備中"))
                .unwrap()
                .id;
        }

        clock.set(Utc.with_ymd_and_hms(2023, 2, 1, 12, 34, 56).unwrap());
        let first = store.get_article(1).unwrap();
        let mut draft = ArticleDraft::from(&first).in_bureau(Some(1));
        draft.content_with_markdown = "NEW".to_string();
        store.update_article(1, draft).unwrap();

        let static_dir = tempfile::tempdir().unwrap();
        std::fs::write(static_dir.path().join("style.css"), "body {}").unwrap();

        let config = SiteConfig {
            staff_tokens: vec![STAFF_TOKEN.to_string()],
            ..SiteConfig::default()
        };
        let pages = Pages::new(config).unwrap();
        let state = Arc::new(AppState::new(
            store.clone(),
            pages,
            static_dir.path().to_path_buf(),
        ));

        Fixture {
            store,
            app: router(state),
            draft_id,
            _static_dir: static_dir,
        }
    }

    async fn get(app: &Router, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, String) {
        let mut request = Request::builder().uri(uri);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_page() {
        let fx = fixture();
        let (status, body) = get(&fx.app, "/", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("<title>ほしのなか政府</title>").count(), 1);

        // five latest published, newest first
        let latest = visibility::latest_articles(&fx.store, 5);
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].id, 1);
        for article in &latest {
            assert!(body.contains(&format!(
                r#"<a href="/articles/{}">{}</a>"#,
                article.id, article.title
            )));
        }
        assert!(!body.contains("公開記事1<"));
        assert!(!body.contains("非公開記事"));

        for bureau in fx.store.bureaus() {
            assert!(body.contains(&format!(
                r#"<a href="/bureaus/{}">{}</a>"#,
                bureau.slug, bureau.name
            )));
        }
    }

    #[tokio::test]
    async fn test_article_list_page() {
        let fx = fixture();
        let (status, body) = get(&fx.app, "/articles/", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("記事一覧 | ほしのなか政府"));
        assert!(!body.contains("非公開記事"));

        let positions: Vec<usize> = visibility::published_articles(&fx.store)
            .iter()
            .map(|a| body.find(&format!(r#"href="/articles/{}""#, a.id)).unwrap())
            .collect();
        assert_eq!(positions.len(), 7);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let (status, _) = get(&fx.app, "/articles", &[]).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_published_article_detail() {
        let fx = fixture();
        let article = fx.store.get_article(1).unwrap();
        let (status, body) = get(&fx.app, "/articles/1", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>公開記事0 | ほしのなか政府</title>"));
        assert!(body.contains(&format!(
            r#"<div id="content">{}</div>"#,
            article.render_content()
        )));
        assert!(body.contains(r#"<div id="updated_at">更新日時: 2023/02/01 21:34</div>"#));
        assert!(body.contains(r#"<a href="/bureaus/test0">テスト局0"#));
    }

    #[tokio::test]
    async fn test_missing_and_draft_articles_look_the_same() {
        let fx = fixture();
        let (missing_status, missing_body) = get(&fx.app, "/articles/99", &[]).await;
        let (draft_status, draft_body) =
            get(&fx.app, &format!("/articles/{}", fx.draft_id), &[]).await;
        assert_eq!(missing_status, StatusCode::NOT_FOUND);
        assert_eq!(draft_status, StatusCode::NOT_FOUND);
        assert_eq!(missing_body, draft_body);

        let (status, _) = get(&fx.app, "/articles/abc", &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_staff_can_preview_drafts() {
        let fx = fixture();
        let uri = format!("/articles/{}", fx.draft_id);

        let (status, body) = get(&fx.app, &uri, &[(STAFF_TOKEN_HEADER, STAFF_TOKEN)]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches("下書き").count(), 2);
        assert!(body.contains("<title>（下書き）非公開記事2 | ほしのなか政府</title>"));

        let bearer = format!("Bearer {}", STAFF_TOKEN);
        let (status, _) = get(&fx.app, &uri, &[("authorization", bearer.as_str())]).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(&fx.app, &uri, &[(STAFF_TOKEN_HEADER, "guess")]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        for article in fx.store.articles() {
            let (status, _) = get(
                &fx.app,
                &format!("/articles/{}", article.id),
                &[(STAFF_TOKEN_HEADER, STAFF_TOKEN)],
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_bureau_pages() {
        let fx = fixture();
        fx.store
            .create_article(ArticleDraft::new("局の下書き", "本文").in_bureau(Some(1)))
            .unwrap();

        let (status, body) = get(&fx.app, "/bureaus/test0", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>テスト局0 | ほしのなか政府</title>"));
        assert!(body.contains(r#"<div id="name">テスト局0</div>"#));
        assert!(body.contains(r#"<a href="/articles/1">公開記事0</a>"#));
        assert!(!body.contains("局の下書き"));

        let (status, _) = get(&fx.app, "/bureaus/99", &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get(&fx.app, "/bureaus/", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.matches(r#"<a href="/bureaus/test"#).count(), 5);
    }

    #[tokio::test]
    async fn test_static_files_and_fallback() {
        let fx = fixture();
        let (status, body) = get(&fx.app, "/static/style.css", &[]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");

        let (status, body) = get(&fx.app, "/no/such/page", &[]).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("ページが見つかりません"));
    }
}
