//! Persistence boundary for the project matrix.
//!
//! The core only sees the [`ProjectStore`] trait; [`memory::MemoryStore`]
//! is the in-process reference implementation. All composite reads return
//! a [`ProjectDetail`] snapshot taken atomically, so progress and
//! permission checks never observe a half-applied mutation.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Action, ActionPatch, CellPatch, ChecklistCell, Item, ItemPatch, NewAction, NewItem,
    NewProject, Permission, Project, ProjectDetail, ProjectPatch,
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate: {0}")]
    Duplicate(String),
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    // Projects
    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError>;
    async fn update_project(
        &self,
        project_id: i64,
        patch: ProjectPatch,
    ) -> Result<Project, StoreError>;
    /// Removes the project and cascades to its items, actions, cells and
    /// permissions.
    async fn delete_project(&self, project_id: i64) -> Result<(), StoreError>;
    async fn load_detail(&self, project_id: i64) -> Result<ProjectDetail, StoreError>;
    async fn list_details(&self) -> Result<Vec<ProjectDetail>, StoreError>;

    // Items
    async fn insert_item(&self, project_id: i64, new: NewItem) -> Result<Item, StoreError>;
    async fn update_item(
        &self,
        project_id: i64,
        item_id: i64,
        patch: ItemPatch,
    ) -> Result<Item, StoreError>;
    /// Removes the item and every cell referencing it.
    async fn delete_item(&self, project_id: i64, item_id: i64) -> Result<(), StoreError>;

    // Actions
    async fn insert_action(&self, project_id: i64, new: NewAction) -> Result<Action, StoreError>;
    async fn update_action(
        &self,
        project_id: i64,
        action_id: i64,
        patch: ActionPatch,
    ) -> Result<Action, StoreError>;
    /// Removes the action and every cell referencing it.
    async fn delete_action(&self, project_id: i64, action_id: i64) -> Result<(), StoreError>;

    // Cells
    /// Creates the cell for (item_id, action_id) as active and incomplete.
    /// Fails with [`StoreError::Duplicate`] when the pair already has one.
    async fn insert_cell(
        &self,
        project_id: i64,
        item_id: i64,
        action_id: i64,
    ) -> Result<ChecklistCell, StoreError>;
    async fn cell_at(
        &self,
        project_id: i64,
        item_id: i64,
        action_id: i64,
    ) -> Result<Option<ChecklistCell>, StoreError>;
    async fn get_cell(&self, project_id: i64, cell_id: i64) -> Result<ChecklistCell, StoreError>;
    async fn update_cell(
        &self,
        project_id: i64,
        cell_id: i64,
        patch: CellPatch,
    ) -> Result<ChecklistCell, StoreError>;

    // Permissions
    /// Inserts or overwrites the grant for (project_id, user_id). The
    /// returned flag is true when a new row was created.
    async fn upsert_permission(
        &self,
        project_id: i64,
        user_id: i64,
        can_edit: bool,
    ) -> Result<(Permission, bool), StoreError>;
    async fn delete_permission(&self, project_id: i64, user_id: i64) -> Result<(), StoreError>;
}
