//! Wire formatting: the JSON contract keeps the Portuguese field names of
//! the consuming dashboard (`titulo`, `nome`, `ativo`, ...), while the
//! internal model stays English. Derived `status` fields are recomputed
//! here from the snapshot on every response.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Action, ChecklistCell, Item, Permission, Project, ProjectDetail};
use crate::progress::{item_progress, project_progress};
use crate::services::CellChange;

/// Project as returned by list/create/update: flat fields plus derived
/// completion.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub responsavel: Option<String>,
    pub colaboradores: Option<String>,
    pub publico: bool,
    pub data_inicio: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
    pub criado_por: i64,
    pub data_criacao: DateTime<Utc>,
    pub status: f64,
}

/// Full composite: project, ordered axes, nested cells, grants.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetailResponse {
    pub id: i64,
    pub titulo: String,
    pub descricao: Option<String>,
    pub responsavel: Option<String>,
    pub colaboradores: Option<String>,
    pub publico: bool,
    pub data_inicio: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
    pub criado_por: i64,
    pub data_criacao: DateTime<Utc>,
    pub status: f64,
    pub itens: Vec<ItemDetailResponse>,
    pub acoes: Vec<ActionResponse>,
    pub permissoes: Vec<PermissionResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub id: i64,
    pub gerenciamento_id: i64,
    pub nome: String,
    pub ordem: i32,
    pub data_inicio: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDetailResponse {
    pub id: i64,
    pub gerenciamento_id: i64,
    pub nome: String,
    pub ordem: i32,
    pub data_inicio: Option<NaiveDate>,
    pub data_conclusao: Option<NaiveDate>,
    pub status: f64,
    pub checklists: Vec<ChecklistResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    pub id: i64,
    pub gerenciamento_id: i64,
    pub nome: String,
    pub ordem: i32,
}

/// `data_conclusao` here is the completion timestamp of the cell, not a
/// schedule date.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistResponse {
    pub id: i64,
    pub item_id: i64,
    pub acao_id: i64,
    pub ativo: bool,
    pub concluido: bool,
    pub data_conclusao: Option<DateTime<Utc>>,
    pub concluido_por: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionResponse {
    pub id: i64,
    pub gerenciamento_id: i64,
    pub usuario_id: i64,
    pub pode_editar: bool,
}

/// Cell mutation result: the cell plus both derived ratios, so the caller
/// can refresh its view without refetching the whole project.
#[derive(Debug, Clone, Serialize)]
pub struct CellChangeResponse {
    pub id: i64,
    pub item_id: i64,
    pub acao_id: i64,
    pub ativo: bool,
    pub concluido: bool,
    pub data_conclusao: Option<DateTime<Utc>>,
    pub concluido_por: Option<i64>,
    pub status_item: f64,
    pub status_projeto: f64,
}

pub fn project_response(detail: &ProjectDetail) -> ProjectResponse {
    project_response_with(&detail.project, project_progress(&detail.items, &detail.cells))
}

pub fn project_response_with(project: &Project, status: f64) -> ProjectResponse {
    ProjectResponse {
        id: project.id,
        titulo: project.title.clone(),
        descricao: project.description.clone(),
        responsavel: project.responsible.clone(),
        colaboradores: project.collaborators.clone(),
        publico: project.public,
        data_inicio: project.start_date,
        data_conclusao: project.end_date,
        criado_por: project.created_by,
        data_criacao: project.created_at,
        status,
    }
}

pub fn detail_response(detail: &ProjectDetail) -> ProjectDetailResponse {
    let itens = detail.items.iter().map(|item| item_detail_response(item, detail)).collect();
    let acoes = detail.actions.iter().map(ActionResponse::from).collect();
    let permissoes = detail.permissions.iter().map(PermissionResponse::from).collect();
    ProjectDetailResponse {
        id: detail.project.id,
        titulo: detail.project.title.clone(),
        descricao: detail.project.description.clone(),
        responsavel: detail.project.responsible.clone(),
        colaboradores: detail.project.collaborators.clone(),
        publico: detail.project.public,
        data_inicio: detail.project.start_date,
        data_conclusao: detail.project.end_date,
        criado_por: detail.project.created_by,
        data_criacao: detail.project.created_at,
        status: project_progress(&detail.items, &detail.cells),
        itens,
        acoes,
        permissoes,
    }
}

fn item_detail_response(item: &Item, detail: &ProjectDetail) -> ItemDetailResponse {
    let checklists = detail
        .cells_for_item(item.id)
        .into_iter()
        .map(ChecklistResponse::from)
        .collect();
    ItemDetailResponse {
        id: item.id,
        gerenciamento_id: item.project_id,
        nome: item.name.clone(),
        ordem: item.position,
        data_inicio: item.start_date,
        data_conclusao: item.end_date,
        status: item_progress(item.id, &detail.cells),
        checklists,
    }
}

pub fn cell_change_response(change: &CellChange) -> CellChangeResponse {
    CellChangeResponse {
        id: change.cell.id,
        item_id: change.cell.item_id,
        acao_id: change.cell.action_id,
        ativo: change.cell.active,
        concluido: change.cell.completed,
        data_conclusao: change.cell.completed_at,
        concluido_por: change.cell.completed_by,
        status_item: change.item_progress,
        status_projeto: change.project_progress,
    }
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        ItemResponse {
            id: item.id,
            gerenciamento_id: item.project_id,
            nome: item.name.clone(),
            ordem: item.position,
            data_inicio: item.start_date,
            data_conclusao: item.end_date,
        }
    }
}

impl From<&Action> for ActionResponse {
    fn from(action: &Action) -> Self {
        ActionResponse {
            id: action.id,
            gerenciamento_id: action.project_id,
            nome: action.name.clone(),
            ordem: action.position,
        }
    }
}

impl From<&ChecklistCell> for ChecklistResponse {
    fn from(cell: &ChecklistCell) -> Self {
        ChecklistResponse {
            id: cell.id,
            item_id: cell.item_id,
            acao_id: cell.action_id,
            ativo: cell.active,
            concluido: cell.completed,
            data_conclusao: cell.completed_at,
            concluido_por: cell.completed_by,
        }
    }
}

impl From<&Permission> for PermissionResponse {
    fn from(permission: &Permission) -> Self {
        PermissionResponse {
            id: permission.id,
            gerenciamento_id: permission.project_id,
            usuario_id: permission.user_id,
            pode_editar: permission.can_edit,
        }
    }
}
