//! api-server: HTTP API for the portfolio site.
//!
//! Serves the static portfolio configuration and the testimonial store:
//! - Testimonials: merged remote + static list, random display sample, "show
//!   all" toggle, visitor submissions.
//! - Storage: In-memory or SQLite (file) when the `sqlite` feature is enabled.
//! - Contact form: validated and acknowledged; nothing is actually sent.
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string) for the site frontend.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # throwaway storage, JSON logs
//! STORAGE_PROVIDER=memory LOG_FORMAT=json cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use domain::adapters::memory_repo::InMemoryTestimonialRepo;
use domain::contact::ContactMessage;
use domain::portfolio::PortfolioConfig;
use domain::service::{LoadNotice, StoreError, TestimonialStore};
use domain::{
    CoreError, ListOrder, NewTestimonial, Rating, Testimonial, TestimonialRepository,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Local repo abstraction supporting memory or sqlite (feature-gated).
enum RepoKind {
    Memory(InMemoryTestimonialRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteTestimonialRepo),
    #[cfg(test)]
    Unavailable,
}

#[derive(Clone)]
struct AnyRepo {
    kind: Arc<RepoKind>,
}

impl AnyRepo {
    fn memory() -> Self {
        Self {
            kind: Arc::new(RepoKind::Memory(InMemoryTestimonialRepo::new())),
        }
    }

    #[cfg(feature = "sqlite")]
    fn sqlite(path: &std::path::Path) -> Result<Self, CoreError> {
        Ok(Self {
            kind: Arc::new(RepoKind::Sqlite(
                sqlite_adapter::SqliteTestimonialRepo::open_creating_dirs(path)?,
            )),
        })
    }

    #[cfg(test)]
    fn unavailable() -> Self {
        Self {
            kind: Arc::new(RepoKind::Unavailable),
        }
    }
}

impl TestimonialRepository for AnyRepo {
    fn list(&self, order: ListOrder) -> Result<Vec<Testimonial>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.list(order),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.list(order),
            #[cfg(test)]
            RepoKind::Unavailable => Err(CoreError::Repository("connection refused".into())),
        }
    }

    fn insert(&self, candidate: NewTestimonial) -> Result<Testimonial, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.insert(candidate),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.insert(candidate),
            #[cfg(test)]
            RepoKind::Unavailable => Err(CoreError::Repository("connection refused".into())),
        }
    }
}

type Store = TestimonialStore<AnyRepo, Arc<PortfolioConfig>>;

#[derive(Clone)]
struct AppState {
    store: Arc<Store>,
    portfolio: Arc<PortfolioConfig>,
}

impl AppState {
    /// Build the store over `repo` and run the initial load.
    fn new(repo: AnyRepo, portfolio: Arc<PortfolioConfig>) -> Self {
        let store = TestimonialStore::new(repo, Arc::clone(&portfolio));
        let outcome = store.load();
        if let Some(LoadNotice::RemoteUnavailable(msg)) = &outcome.notice {
            warn!(%msg, "starting with static testimonials only");
        }
        info!(merged = outcome.merged, "testimonials loaded");
        Self {
            store: Arc::new(store),
            portfolio,
        }
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_insecure();

    let portfolio = match json_config::load_portfolio_config(&cfg.portfolio_config_path) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!(err = %e, "failed to load portfolio config");
            std::process::exit(1);
        }
    };

    let repo = match build_repo(&cfg) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, path = %cfg.db_path.display(), "failed to open testimonial storage");
            std::process::exit(1);
        }
    };
    let state = AppState::new(repo, portfolio);

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = app(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, "api-server listening");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "bind failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/testimonials",
            get(list_testimonials).post(create_testimonial),
        )
        .route("/api/testimonials/reload", post(reload_testimonials))
        .route("/api/testimonials/show-all", put(set_show_all))
        .route("/api/portfolio", get(get_portfolio))
        .route("/api/projects", get(list_projects))
        .route("/api/projects/featured", get(featured_projects))
        .route("/api/skills/technologies", get(list_technologies))
        .route("/api/contact", post(submit_contact))
        .with_state(state)
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct a repository instance based on config and feature flags.
fn build_repo(cfg: &config::Config) -> Result<AnyRepo, CoreError> {
    match cfg.storage_provider {
        config::StorageProvider::Memory => Ok(AnyRepo::memory()),
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => AnyRepo::sqlite(&cfg.db_path),
        #[cfg(not(feature = "sqlite"))]
        config::StorageProvider::Sqlite => Err(CoreError::Repository(
            "STORAGE_PROVIDER=sqlite but api-server was built without the sqlite feature".into(),
        )),
    }
}

#[derive(Deserialize)]
struct CreateTestimonialReq {
    #[serde(default)]
    name: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    rating: Option<u8>,
}

#[derive(Deserialize)]
struct ShowAllReq {
    show_all: bool,
}

#[derive(Deserialize)]
struct ProjectQuery {
    category: Option<String>,
}

#[derive(Serialize)]
struct TestimonialOut {
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    content: String,
    rating: u8,
    created_at: String,
    source: &'static str,
}

// Static testimonial as it appears in the portfolio document.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioTestimonialOut {
    id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    content: String,
    rating: u8,
    created_at: String,
}

impl From<&Testimonial> for PortfolioTestimonialOut {
    fn from(t: &Testimonial) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            role: t.role.clone(),
            company: t.company.clone(),
            content: t.content.clone(),
            rating: t.rating.get(),
            created_at: http_common::system_time_to_rfc3339(t.created_at),
        }
    }
}

#[derive(Serialize)]
struct TestimonialListOut {
    testimonials: Vec<TestimonialOut>,
    total: usize,
    show_all: bool,
    can_show_all: bool,
}

#[derive(Serialize)]
struct SubmitOut {
    testimonial: TestimonialOut,
    total: usize,
    clear_input: bool,
    close_dialog: bool,
}

#[derive(Serialize)]
struct ReloadOut {
    total: usize,
    applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

fn testimonial_to_out(t: Testimonial) -> TestimonialOut {
    TestimonialOut {
        id: t.id,
        name: t.name,
        role: t.role,
        company: t.company,
        content: t.content,
        rating: t.rating.get(),
        created_at: http_common::system_time_to_rfc3339(t.created_at),
        source: t.source.as_str(),
    }
}

fn display_out(store: &Store) -> TestimonialListOut {
    TestimonialListOut {
        testimonials: store
            .display()
            .into_iter()
            .map(testimonial_to_out)
            .collect(),
        total: store.merged_len(),
        show_all: store.show_all(),
        can_show_all: store.can_show_all(),
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn list_testimonials(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(display_out(&state.store)))
}

async fn create_testimonial(
    State(state): State<AppState>,
    Json(body): Json<CreateTestimonialReq>,
) -> impl IntoResponse {
    let rating = match body.rating.map(Rating::new).transpose() {
        Ok(r) => r.unwrap_or_default(),
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(http_common::json_field_errors(
                    "invalid_request",
                    "invalid testimonial",
                    [(e.field, e.message.as_str())],
                )),
            )
                .into_response()
        }
    };
    let candidate = NewTestimonial {
        name: body.name,
        content: body.content,
        role: non_blank(body.role),
        company: non_blank(body.company),
        rating,
    };

    match state.store.submit(candidate) {
        Ok(outcome) => {
            info!(id = %outcome.testimonial.id, total = outcome.merged, "testimonial submitted");
            (
                StatusCode::CREATED,
                Json(SubmitOut {
                    testimonial: testimonial_to_out(outcome.testimonial),
                    total: outcome.merged,
                    clear_input: outcome.clear_input,
                    close_dialog: outcome.close_dialog,
                }),
            )
                .into_response()
        }
        Err(StoreError::Validation(e)) => (
            StatusCode::BAD_REQUEST,
            Json(http_common::json_field_errors(
                "invalid_request",
                "please fill in all required fields",
                [(e.field, e.message.as_str())],
            )),
        )
            .into_response(),
        Err(e) => {
            error!(err = %e, "submit error");
            (
                StatusCode::BAD_GATEWAY,
                Json(http_common::json_error_with_message(
                    "upstream_unavailable",
                    &e.to_string(),
                )),
            )
                .into_response()
        }
    }
}

async fn reload_testimonials(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.store.load();
    let notice = outcome.notice.map(|n| match n {
        LoadNotice::RemoteUnavailable(msg) => {
            format!("showing static testimonials only: {msg}")
        }
    });
    (
        StatusCode::OK,
        Json(ReloadOut {
            total: outcome.merged,
            applied: outcome.applied,
            notice,
        }),
    )
}

async fn set_show_all(
    State(state): State<AppState>,
    Json(body): Json<ShowAllReq>,
) -> impl IntoResponse {
    state.store.set_show_all(body.show_all);
    (StatusCode::OK, Json(display_out(&state.store)))
}

async fn get_portfolio(State(state): State<AppState>) -> impl IntoResponse {
    let p = &state.portfolio;
    let testimonials: Vec<PortfolioTestimonialOut> =
        p.testimonials.iter().map(PortfolioTestimonialOut::from).collect();
    Json(serde_json::json!({
        "personal": p.personal,
        "skills": p.skills,
        "projects": p.projects,
        "testimonials": testimonials,
        "contact": p.contact,
        "seo": p.seo,
        "navigation": p.navigation,
    }))
}

async fn list_projects(
    State(state): State<AppState>,
    Query(q): Query<ProjectQuery>,
) -> impl IntoResponse {
    let category = q.category.unwrap_or_else(|| domain::portfolio::ALL_CATEGORIES.to_string());
    let projects = state.portfolio.projects_by_category(&category);
    Json(serde_json::json!({
        "category": category,
        "categories": state.portfolio.project_categories(),
        "projects": projects,
    }))
}

async fn featured_projects(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "projects": state.portfolio.featured_projects() }))
}

async fn list_technologies(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "technologies": state.portfolio.all_technologies() }))
}

async fn submit_contact(Json(msg): Json<ContactMessage>) -> impl IntoResponse {
    match msg.validate() {
        Ok(()) => {
            // Delivery is simulated: record it and acknowledge.
            info!(
                name = %msg.name,
                email = %msg.email,
                subject = %msg.subject,
                message_chars = msg.message.chars().count(),
                "contact message received"
            );
            (
                StatusCode::ACCEPTED,
                Json(serde_json::json!({
                    "status": "received",
                    "message": "Thanks for reaching out! I'll get back to you soon."
                })),
            )
                .into_response()
        }
        Err(errors) => (
            StatusCode::BAD_REQUEST,
            Json(http_common::json_field_errors(
                "invalid_request",
                "please correct the highlighted fields",
                errors.iter().map(|e| (e.field, e.message.as_str())),
            )),
        )
            .into_response(),
    }
}
