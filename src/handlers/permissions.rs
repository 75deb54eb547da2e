use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::format::PermissionResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::models::Identity;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreatePermissionRequest {
    pub usuario_id: i64,
    #[serde(default = "default_true")]
    pub pode_editar: bool,
}

/// POST /gerenciamento/:id/permissoes - grant or overwrite a user's
/// access row (201 on a new row, 200 on overwrite)
pub async fn grant_permission(
    State(state): State<AppState>,
    identity: Identity,
    Path(project_id): Path<i64>,
    Json(body): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<PermissionResponse>), ApiError> {
    let (permission, created) = state
        .service
        .grant_permission(identity, project_id, body.usuario_id, body.pode_editar)
        .await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(PermissionResponse::from(&permission))))
}

/// DELETE /gerenciamento/:id/permissoes/:usuario_id - drop an explicit
/// grant; implicit creator/admin rights are not rows and stay in force
pub async fn revoke_permission(
    State(state): State<AppState>,
    identity: Identity,
    Path((project_id, usuario_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.service.revoke_permission(identity, project_id, usuario_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
