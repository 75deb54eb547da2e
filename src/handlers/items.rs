use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::format::ItemResponse;
use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::double_option;
use crate::models::{Identity, ItemPatch, NewItem};

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub nome: String,
    #[serde(default)]
    pub ordem: i32,
    pub data_inicio: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub nome: Option<String>,
    pub ordem: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub data_inicio: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub data_conclusao: Option<Option<NaiveDate>>,
}

/// POST /gerenciamento/:id/itens - add a matrix row, no cells created
pub async fn create_item(
    State(state): State<AppState>,
    identity: Identity,
    Path(project_id): Path<i64>,
    Json(body): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let new = NewItem {
        name: body.nome,
        position: body.ordem,
        start_date: body.data_inicio,
        end_date: body.data_conclusao,
    };
    let item = state.service.add_item(identity, project_id, new).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(&item))))
}

/// PUT /gerenciamento/:id/itens/:item_id - rename/reschedule/reorder
pub async fn update_item(
    State(state): State<AppState>,
    identity: Identity,
    Path((project_id, item_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let patch = ItemPatch {
        name: body.nome,
        position: body.ordem,
        start_date: body.data_inicio,
        end_date: body.data_conclusao,
    };
    let item = state.service.update_item(identity, project_id, item_id, patch).await?;
    Ok(Json(ItemResponse::from(&item)))
}

/// DELETE /gerenciamento/:id/itens/:item_id - cascades the row's cells
pub async fn delete_item(
    State(state): State<AppState>,
    identity: Identity,
    Path((project_id, item_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.service.remove_item(identity, project_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
