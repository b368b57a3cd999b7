use crate::dashboard::{DashboardView, ExportError, RecordDetail, RowView};
use crate::errors::AppError;
use crate::form::{FormReview, FormView, SubmitOutcome, CLEARED};
use crate::models::FieldUpdate;
use crate::state::AppState;
use crate::ui::{render_collect, render_dashboard};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: &'static str,
    pub view: FormView,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(flatten)]
    pub outcome: SubmitOutcome,
    pub view: FormView,
}

pub async fn index() -> Redirect {
    Redirect::to("/dashboard")
}

pub async fn fallback() -> Redirect {
    Redirect::to("/collect")
}

pub async fn collect_page(State(state): State<AppState>) -> Html<String> {
    Html(render_collect(&state.form.view().await))
}

pub async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    Html(render_dashboard(&state.dashboard))
}

pub async fn get_form(State(state): State<AppState>) -> Json<FormView> {
    Json(state.form.view().await)
}

pub async fn update_form(
    State(state): State<AppState>,
    Json(update): Json<FieldUpdate>,
) -> Json<FormView> {
    Json(state.form.set_field(update).await)
}

pub async fn reset_form(State(state): State<AppState>) -> Json<ResetResponse> {
    Json(ResetResponse {
        message: CLEARED,
        view: state.form.reset().await,
    })
}

pub async fn review_form(State(state): State<AppState>) -> Json<FormReview> {
    Json(state.form.review().await)
}

pub async fn submit_form(State(state): State<AppState>) -> Json<SubmitResponse> {
    let outcome = state.form.submit(state.api.as_ref()).await;
    Json(SubmitResponse {
        outcome,
        view: state.form.view().await,
    })
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> Json<DashboardView> {
    Json(state.dashboard.view(&search.q).await)
}

pub async fn refresh_dashboard(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> Json<DashboardView> {
    state.dashboard.refresh(state.api.as_ref()).await;
    Json(state.dashboard.view(&search.q).await)
}

pub async fn get_rows(
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> Json<Vec<RowView>> {
    Json(state.dashboard.rows(&search.q).await)
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordDetail>, AppError> {
    state
        .dashboard
        .record(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no assessment '{id}' in today's entries")))
}

pub async fn export_today(State(state): State<AppState>) -> Result<Response, AppError> {
    let file = state
        .dashboard
        .export(state.api.as_ref())
        .await
        .map_err(|err| match err {
            ExportError::Busy => AppError::conflict("An export is already being prepared."),
            ExportError::Failed(message) => AppError::bad_gateway(message),
        })?;

    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    let headers = [
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, file.bytes).into_response())
}
