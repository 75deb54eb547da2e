use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::format::ActionResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::models::{ActionPatch, Identity, NewAction};

#[derive(Debug, Deserialize)]
pub struct CreateActionRequest {
    pub nome: String,
    #[serde(default)]
    pub ordem: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateActionRequest {
    pub nome: Option<String>,
    pub ordem: Option<i32>,
}

/// POST /gerenciamento/:id/acoes - add a matrix column, no cells created
pub async fn create_action(
    State(state): State<AppState>,
    identity: Identity,
    Path(project_id): Path<i64>,
    Json(body): Json<CreateActionRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    let new = NewAction { name: body.nome, position: body.ordem };
    let action = state.service.add_action(identity, project_id, new).await?;
    Ok((StatusCode::CREATED, Json(ActionResponse::from(&action))))
}

/// PUT /gerenciamento/:id/acoes/:action_id - rename/reorder
pub async fn update_action(
    State(state): State<AppState>,
    identity: Identity,
    Path((project_id, action_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let patch = ActionPatch { name: body.nome, position: body.ordem };
    let action = state.service.update_action(identity, project_id, action_id, patch).await?;
    Ok(Json(ActionResponse::from(&action)))
}

/// DELETE /gerenciamento/:id/acoes/:action_id - cascades the column's cells
pub async fn delete_action(
    State(state): State<AppState>,
    identity: Identity,
    Path((project_id, action_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.service.remove_action(identity, project_id, action_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
