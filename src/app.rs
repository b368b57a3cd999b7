use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/collect", get(handlers::collect_page))
        .route("/dashboard", get(handlers::dashboard_page))
        .route("/dashboard/export", get(handlers::export_today))
        .route("/api/form", get(handlers::get_form).patch(handlers::update_form))
        .route("/api/form/reset", post(handlers::reset_form))
        .route("/api/form/review", get(handlers::review_form))
        .route("/api/form/submit", post(handlers::submit_form))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/dashboard/refresh", post(handlers::refresh_dashboard))
        .route("/api/dashboard/rows", get(handlers::get_rows))
        .route("/api/dashboard/rows/:id", get(handlers::get_record))
        .fallback(handlers::fallback)
        .with_state(state)
}
