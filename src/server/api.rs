use crate::agent::ChatAgent;
use crate::errors::ChatError;
use crate::models::chat::{ ChatRequest, ChatResponse };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::post,
    Router,
    Json,
    extract::State,
    extract::rejection::JsonRejection,
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Newtype so `ChatError` can carry an `IntoResponse` impl. Every error is
/// logged here, right before it is mapped to the wire.
struct ApiError(ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ChatError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        let status = self.0.status_code();
        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            match self.0 {
                ChatError::Internal(_) => "Server error".to_string(),
                other => other.to_string(),
            }
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse { error: body })).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    agent: Arc<ChatAgent>,
}

pub fn create_router(agent: Arc<ChatAgent>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/search", post(search_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

pub async fn start_http_server(
    addr: &str,
    agent: Arc<ChatAgent>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = create_router(agent);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API server listening on: http://{}", addr);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body?;
    let response = state.agent.handle_chat(request).await?;
    Ok(Json(response))
}

async fn search_handler(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = body?;
    let query = request.query.unwrap_or_default();
    let result = state.agent.direct_search(&query).await?;
    Ok(Json(SearchResponse { result }))
}
