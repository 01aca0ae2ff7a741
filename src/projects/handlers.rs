use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    extract::{AppJson, AppPath},
    projects::{
        dto::{CreateProjectRequest, MessageResponse, ProjectPatch},
        repo_types::Project,
        services,
    },
    state::AppState,
};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

#[instrument(skip(state))]
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, AppError> {
    let projects = services::list_projects(state.projects.as_ref()).await?;
    Ok(Json(projects))
}

#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<Project>, AppError> {
    let project = services::get_project(state.projects.as_ref(), &id).await?;
    Ok(Json(project))
}

// AuthUser comes before the body so a missing token wins over a bad body.
#[instrument(skip(state, user, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let project = services::create_project(state.projects.as_ref(), &user, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[instrument(skip(state, user, patch))]
pub async fn update_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(patch): AppJson<ProjectPatch>,
) -> Result<Json<Project>, AppError> {
    let project = services::update_project(state.projects.as_ref(), &id, &user, patch).await?;
    Ok(Json(project))
}

#[instrument(skip(state, user))]
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_project(state.projects.as_ref(), &id, &user).await?;
    Ok(Json(MessageResponse {
        message: "Dự án đã được xóa thành công.".into(),
    }))
}
