mod api;

use crate::app_state::GenerateError;
use crate::AppState;
use crate::Config;
use anyhow::Context;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::DefaultMakeSpan;
use tower_http::trace::DefaultOnFailure;
use tower_http::trace::DefaultOnRequest;
use tower_http::trace::DefaultOnResponse;
use tower_http::trace::TraceLayer;
use tracing::error;

pub fn routes(config: &Config, app_state: Arc<AppState>) -> anyhow::Result<Router> {
    let public_directory = std::fs::canonicalize(&config.public_directory).with_context(|| {
        format!(
            "failed to canonicalize public directory \"{}\"",
            config.public_directory.display()
        )
    })?;

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
        .on_response(DefaultOnResponse::new().level(tracing::Level::INFO))
        .on_failure(DefaultOnFailure::new().level(tracing::Level::ERROR));

    Ok(pages(app_state)
        .fallback_service(ServeDir::new(public_directory))
        .layer(trace_layer))
}

/// The page and api routes, without static files.
fn pages(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/episode/:id", get(episode))
        .nest("/api", self::api::routes())
        .with_state(app_state)
}

async fn home(State(app_state): State<Arc<AppState>>) -> Response {
    let result = app_state
        .get_home_page()
        .await
        .map_err(anyhow::Error::from)
        .and_then(|page| app_state.renderer().home(&page));

    match result {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            error!("{error:?}");
            server_error(&app_state)
        }
    }
}

async fn episode(State(app_state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let page = match app_state.get_episode_page(&id).await {
        Ok(page) => page,
        Err(GenerateError::NotFound { .. }) => {
            return not_found(&app_state);
        }
        Err(error) => {
            error!("{:?}", anyhow::Error::from(error));
            return server_error(&app_state);
        }
    };

    match app_state.renderer().episode(&page) {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            error!("{error:?}");
            server_error(&app_state)
        }
    }
}

fn not_found(app_state: &AppState) -> Response {
    match app_state.renderer().not_found() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(error) => {
            error!("{error:?}");
            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    }
}

fn server_error(app_state: &AppState) -> Response {
    match app_state.renderer().error() {
        Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
        Err(error) => {
            error!("{error:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
        }
    }
}
