pub mod auth;
pub mod chat;
pub mod error;
pub mod ingest;
pub mod usage;

use axum::routing::{get, post};
use axum::Router;
use usage_db::UsageQueries;

pub use auth::SessionUser;
pub use error::{ApiError, ErrorBody};

#[derive(Clone)]
pub struct AppState {
    pub queries: UsageQueries,
    pub auth_bearer_token: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/usage/hourly-today", get(usage::hourly_today))
        .route("/api/usage/daily-range", get(usage::daily_range))
        .route("/api/usage/today-total", get(usage::today_total))
        .route("/api/usage/overview", get(usage::overview))
        .route("/api/usage", post(ingest::add_usage))
        .route("/api/chat-data", post(chat::chat_data))
        .with_state(state)
}
