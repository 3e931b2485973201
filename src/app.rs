use axum::{
    Router,
    extract::{FromRef, Query, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::Key;
use handlebars::RenderError;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::login::{self, PasswordGate, SessionStore};
use crate::orders::{DateFilter, aggregate};
use crate::pages::{OrdersView, Pages};
use crate::source::{SheetSource, fetch_records};

/// Shared, read-mostly state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub source: Arc<dyn SheetSource>,
    pub sessions: Arc<SessionStore>,
    pub gate: Arc<PasswordGate>,
    pub pages: Arc<Pages>,
    key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, source: Arc<dyn SheetSource>) -> Result<Self, ConfigError> {
        let key = Key::derive_from(config.session_secret.as_bytes());
        Ok(AppState {
            gate: Arc::new(PasswordGate::new(config.password_hash.clone())),
            config: Arc::new(config),
            source,
            sessions: Arc::new(SessionStore::default()),
            pages: Arc::new(Pages::new()?),
            key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

#[derive(Deserialize)]
struct OrdersQuery {
    delivery_date: Option<String>,
}

/// Build the router with all pages. `/orders` sits behind the login check.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/orders", get(serve_orders))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login::require_auth,
        ));

    Router::new()
        .route("/", get(serve_landing))
        .route(
            "/login",
            get(login::serve_login_page).post(login::handle_login),
        )
        .route("/logout", get(login::handle_logout))
        .merge(protected)
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let source = config.sheet_source();
    let addr = config.bind_addr;
    log::info!("reading orders from {}", source.describe());

    let app = router(AppState::new(config, source)?);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Turn a rendered page into a response.
pub(crate) fn render(page: Result<String, RenderError>) -> Response {
    match page {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            log::error!("failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

async fn serve_landing() -> Redirect {
    Redirect::to("/login")
}

async fn serve_orders(
    State(state): State<AppState>,
    Query(params): Query<OrdersQuery>,
) -> Response {
    let filter = DateFilter::parse(params.delivery_date.as_deref());

    let view = match fetch_records(state.source.as_ref()).await {
        Ok(records) => {
            let board = aggregate(&records, &filter, &state.config.columns);
            log::debug!(
                "{} records -> {} products, {} orders",
                records.len(),
                board.products.len(),
                board.order_count()
            );
            OrdersView::new(board, &filter)
        }
        Err(err) => OrdersView::failed(err.to_string(), &filter),
    };

    render(state.pages.orders(&view))
}
