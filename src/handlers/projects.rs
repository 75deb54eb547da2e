use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::format::{
    detail_response, project_response, project_response_with, ProjectDetailResponse,
    ProjectResponse,
};
use crate::app::AppState;
use crate::auth::MaybeIdentity;
use crate::error::ApiError;
use crate::handlers::{double_option, read_rejection};
use crate::models::{Identity, NewProject, ProjectPatch};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub titulo: String,
    pub descricao: Option<String>,
    pub responsavel: Option<String>,
    pub colaboradores: Option<String>,
    #[serde(default)]
    pub publico: bool,
    pub data_inicio: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub titulo: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub descricao: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub responsavel: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub colaboradores: Option<Option<String>>,
    pub publico: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub data_inicio: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub data_conclusao: Option<Option<NaiveDate>>,
}

/// GET /gerenciamento - projects visible to the caller, with derived status
pub async fn list_projects(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let details = state.service.list_projects(identity).await?;
    Ok(Json(details.iter().map(project_response).collect()))
}

/// GET /gerenciamento/:id - full matrix snapshot
pub async fn get_project(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(project_id): Path<i64>,
) -> Result<Json<ProjectDetailResponse>, ApiError> {
    let detail = state
        .service
        .get_project(identity, project_id)
        .await
        .map_err(|e| read_rejection(e, identity))?;
    Ok(Json(detail_response(&detail)))
}

/// POST /gerenciamento - create a project owned by the caller
pub async fn create_project(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let new = NewProject {
        title: body.titulo,
        description: body.descricao,
        responsible: body.responsavel,
        collaborators: body.colaboradores,
        public: body.publico,
        start_date: body.data_inicio,
        end_date: body.data_conclusao,
        ..Default::default()
    };
    let project = state.service.create_project(identity, new).await?;
    // a fresh project has no items, so its derived status is 0
    Ok((StatusCode::CREATED, Json(project_response_with(&project, 0.0))))
}

/// PUT /gerenciamento/:id - patch project fields
pub async fn update_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(project_id): Path<i64>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let patch = ProjectPatch {
        title: body.titulo,
        description: body.descricao,
        responsible: body.responsavel,
        collaborators: body.colaboradores,
        public: body.publico,
        start_date: body.data_inicio,
        end_date: body.data_conclusao,
    };
    state.service.update_project(identity, project_id, patch).await?;
    let detail = state.service.get_project(Some(identity), project_id).await?;
    Ok(Json(project_response(&detail)))
}

/// DELETE /gerenciamento/:id - creator or admin only
pub async fn delete_project(
    State(state): State<AppState>,
    identity: Identity,
    Path(project_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_project(identity, project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
