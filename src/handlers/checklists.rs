use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::format::{cell_change_response, CellChangeResponse};
use crate::app::AppState;
use crate::error::ApiError;
use crate::models::Identity;

#[derive(Debug, Deserialize)]
pub struct CreateChecklistRequest {
    pub item_id: i64,
    pub acao_id: i64,
}

/// Both fields are absolute values, not flips; either may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateChecklistRequest {
    pub concluido: Option<bool>,
    pub ativo: Option<bool>,
}

/// POST /gerenciamento/:id/checklists - toggle a cell's inclusion by
/// coordinates: creates it on first use (201), flips `ativo` afterwards
/// (200)
pub async fn toggle_checklist(
    State(state): State<AppState>,
    identity: Identity,
    Path(project_id): Path<i64>,
    Json(body): Json<CreateChecklistRequest>,
) -> Result<(StatusCode, Json<CellChangeResponse>), ApiError> {
    let change = state
        .service
        .toggle_cell_active(identity, project_id, body.item_id, body.acao_id)
        .await?;
    let status = if change.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(cell_change_response(&change))))
}

/// PUT /gerenciamento/:id/checklists/:checklist_id - set `ativo` and/or
/// `concluido` on an existing cell, atomically together
pub async fn update_checklist(
    State(state): State<AppState>,
    identity: Identity,
    Path((project_id, checklist_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateChecklistRequest>,
) -> Result<Json<CellChangeResponse>, ApiError> {
    let change = state
        .service
        .set_cell(identity, project_id, checklist_id, body.ativo, body.concluido)
        .await?;
    Ok(Json(cell_change_response(&change)))
}
