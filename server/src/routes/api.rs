use crate::app_state::GenerateError;
use crate::AppState;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, serde::Serialize)]
struct ApiError {
    messages: Vec<String>,
}

impl<E> From<&E> for ApiError
where
    E: std::error::Error + 'static,
{
    fn from(error: &E) -> Self {
        Self {
            messages: anyhow::Chain::new(error).map(|e| e.to_string()).collect(),
        }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> axum::response::Response {
        let api_error = ApiError::from(&self);
        let status = match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => {
                error!("{:?}", anyhow::Error::from(self));
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(api_error)).into_response()
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/home", get(api_home))
        .route("/episode/:id", get(api_episode))
}

async fn api_home(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    app_state.get_home_page().await.map(Json)
}

async fn api_episode(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    app_state.get_episode_page(&id).await.map(Json)
}
