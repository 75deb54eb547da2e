use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::models::{
    Action, ActionPatch, CellPatch, ChecklistCell, Identity, Item, ItemPatch, NewAction, NewItem,
    NewProject, Permission, Project, ProjectDetail, ProjectPatch,
};
use crate::permission::{can_edit, can_view};
use crate::progress::{item_progress, project_progress};
use crate::store::{ProjectStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Result of a cell mutation: the cell after the change plus the derived
/// ratios recomputed from the post-mutation snapshot.
#[derive(Debug, Clone)]
pub struct CellChange {
    pub cell: ChecklistCell,
    pub created: bool,
    pub item_progress: f64,
    pub project_progress: f64,
}

/// Owns the Item/Action/cell lifecycle: every mutation runs behind the
/// project's mutex, behind the permission gate, and leaves the matrix
/// either fully updated or untouched.
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
    locks: RwLock<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            store,
            locks: RwLock::new(HashMap::new()),
        }
    }

    // Reads: no project lock, one consistent snapshot each.

    /// Projects visible to the caller: everything for admins, public ones
    /// for anonymous callers, created/granted/public ones otherwise.
    pub async fn list_projects(
        &self,
        identity: Option<Identity>,
    ) -> Result<Vec<ProjectDetail>, ServiceError> {
        let details = self.store.list_details().await?;
        Ok(details
            .into_iter()
            .filter(|d| can_view(&d.project, &d.permissions, identity))
            .collect())
    }

    /// Full snapshot of one project, gated by view access.
    pub async fn get_project(
        &self,
        identity: Option<Identity>,
        project_id: i64,
    ) -> Result<ProjectDetail, ServiceError> {
        let detail = self.store.load_detail(project_id).await?;
        if !can_view(&detail.project, &detail.permissions, identity) {
            return Err(ServiceError::PermissionDenied(format!(
                "no view access to project {project_id}"
            )));
        }
        Ok(detail)
    }

    // Project lifecycle

    pub async fn create_project(
        &self,
        identity: Identity,
        mut new: NewProject,
    ) -> Result<Project, ServiceError> {
        if new.title.trim().is_empty() {
            return Err(ServiceError::Validation("title must not be empty".into()));
        }
        new.created_by = identity.user_id;
        let project = self.store.insert_project(new).await?;
        info!(project_id = project.id, created_by = project.created_by, "created project");
        Ok(project)
    }

    pub async fn update_project(
        &self,
        identity: Identity,
        project_id: i64,
        patch: ProjectPatch,
    ) -> Result<Project, ServiceError> {
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(ServiceError::Validation("title must not be empty".into()));
            }
        }
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        let project = self.store.update_project(project_id, patch).await?;
        info!(project_id, user_id = identity.user_id, "updated project");
        Ok(project)
    }

    /// Deletion is stricter than editing: explicit grants do not count,
    /// only the creator or an admin may remove a project.
    pub async fn delete_project(
        &self,
        identity: Identity,
        project_id: i64,
    ) -> Result<(), ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        if !identity.is_admin && detail.project.created_by != identity.user_id {
            warn!(project_id, user_id = identity.user_id, "delete refused");
            return Err(ServiceError::PermissionDenied(format!(
                "only the creator or an admin can delete project {project_id}"
            )));
        }
        self.store.delete_project(project_id).await?;
        self.locks.write().await.remove(&project_id);
        info!(project_id, user_id = identity.user_id, "deleted project");
        Ok(())
    }

    // Matrix axes

    pub async fn add_item(
        &self,
        identity: Identity,
        project_id: i64,
        new: NewItem,
    ) -> Result<Item, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        // no cells are created here; they appear on first toggle
        let item = self.store.insert_item(project_id, new).await?;
        info!(project_id, item_id = item.id, "added item");
        Ok(item)
    }

    pub async fn update_item(
        &self,
        identity: Identity,
        project_id: i64,
        item_id: i64,
        patch: ItemPatch,
    ) -> Result<Item, ServiceError> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ServiceError::Validation("name must not be empty".into()));
            }
        }
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        Ok(self.store.update_item(project_id, item_id, patch).await?)
    }

    pub async fn remove_item(
        &self,
        identity: Identity,
        project_id: i64,
        item_id: i64,
    ) -> Result<(), ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        self.store.delete_item(project_id, item_id).await?;
        info!(project_id, item_id, "removed item and its cells");
        Ok(())
    }

    pub async fn add_action(
        &self,
        identity: Identity,
        project_id: i64,
        new: NewAction,
    ) -> Result<Action, ServiceError> {
        if new.name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        let action = self.store.insert_action(project_id, new).await?;
        info!(project_id, action_id = action.id, "added action");
        Ok(action)
    }

    pub async fn update_action(
        &self,
        identity: Identity,
        project_id: i64,
        action_id: i64,
        patch: ActionPatch,
    ) -> Result<Action, ServiceError> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ServiceError::Validation("name must not be empty".into()));
            }
        }
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        Ok(self.store.update_action(project_id, action_id, patch).await?)
    }

    pub async fn remove_action(
        &self,
        identity: Identity,
        project_id: i64,
        action_id: i64,
    ) -> Result<(), ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        self.store.delete_action(project_id, action_id).await?;
        info!(project_id, action_id, "removed action and its cells");
        Ok(())
    }

    // Cells

    /// Creates the cell on first toggle (active, incomplete); afterwards
    /// flips `active`. Disabling never resets `completed`, so re-enabling
    /// restores prior history.
    pub async fn toggle_cell_active(
        &self,
        identity: Identity,
        project_id: i64,
        item_id: i64,
        action_id: i64,
    ) -> Result<CellChange, ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        ensure_item_member(&detail, item_id)?;
        ensure_action_member(&detail, action_id)?;

        let existing = self.store.cell_at(project_id, item_id, action_id).await?;
        let (cell, created) = match existing {
            None => {
                let cell = self.store.insert_cell(project_id, item_id, action_id).await?;
                (cell, true)
            }
            Some(cell) => {
                let patch = CellPatch {
                    active: Some(!cell.active),
                    ..Default::default()
                };
                let cell = self.store.update_cell(project_id, cell.id, patch).await?;
                (cell, false)
            }
        };
        info!(project_id, cell_id = cell.id, active = cell.active, "toggled cell inclusion");
        self.cell_change(project_id, cell, created).await
    }

    /// Flips `completed` on an active cell; stamps or clears the audit
    /// fields. Absent and inactive cells are not completable.
    pub async fn toggle_cell_completed(
        &self,
        identity: Identity,
        project_id: i64,
        item_id: i64,
        action_id: i64,
    ) -> Result<CellChange, ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        ensure_item_member(&detail, item_id)?;
        ensure_action_member(&detail, action_id)?;

        let cell = match self.store.cell_at(project_id, item_id, action_id).await? {
            None => {
                return Err(ServiceError::InvalidState(format!(
                    "no cell exists for item {item_id} / action {action_id}"
                )))
            }
            Some(cell) if !cell.active => {
                return Err(ServiceError::InvalidState(format!(
                    "cell {} is inactive and cannot change completion",
                    cell.id
                )))
            }
            Some(cell) => cell,
        };
        let patch = completion_patch(&cell, !cell.completed, identity);
        let cell = self.store.update_cell(project_id, cell.id, patch).await?;
        info!(project_id, cell_id = cell.id, completed = cell.completed, "toggled cell completion");
        self.cell_change(project_id, cell, false).await
    }

    /// Sets absolute `active`/`completed` values on an existing cell, both
    /// applied atomically together. A completion change is only legal
    /// while the effective active state (the incoming value if present,
    /// else the current one) is true.
    pub async fn set_cell(
        &self,
        identity: Identity,
        project_id: i64,
        cell_id: i64,
        active: Option<bool>,
        completed: Option<bool>,
    ) -> Result<CellChange, ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;

        let cell = self.store.get_cell(project_id, cell_id).await?;
        let effective_active = active.unwrap_or(cell.active);
        if completed.is_some() && !effective_active {
            return Err(ServiceError::InvalidState(format!(
                "cell {cell_id} is inactive and cannot change completion"
            )));
        }
        let mut patch = CellPatch {
            active,
            ..Default::default()
        };
        if let Some(completed) = completed {
            let completion = completion_patch(&cell, completed, identity);
            patch.completed = completion.completed;
            patch.completed_at = completion.completed_at;
            patch.completed_by = completion.completed_by;
        }
        let cell = self.store.update_cell(project_id, cell_id, patch).await?;
        info!(
            project_id,
            cell_id,
            active = cell.active,
            completed = cell.completed,
            "updated cell"
        );
        self.cell_change(project_id, cell, false).await
    }

    // Permissions

    /// Upserts the grant for (project, user). The returned flag is true
    /// when a new row was created.
    pub async fn grant_permission(
        &self,
        identity: Identity,
        project_id: i64,
        user_id: i64,
        grant_edit: bool,
    ) -> Result<(Permission, bool), ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        let (permission, created) =
            self.store.upsert_permission(project_id, user_id, grant_edit).await?;
        info!(project_id, user_id, can_edit = grant_edit, "granted permission");
        Ok((permission, created))
    }

    /// Removes an explicit grant. The creator's and admins' implicit
    /// rights are not rows and therefore cannot be revoked here.
    pub async fn revoke_permission(
        &self,
        identity: Identity,
        project_id: i64,
        user_id: i64,
    ) -> Result<(), ServiceError> {
        let lock = self.project_lock(project_id).await;
        let _guard = lock.lock().await;
        let detail = self.store.load_detail(project_id).await?;
        self.ensure_edit(&detail, identity)?;
        self.store.delete_permission(project_id, user_id).await?;
        info!(project_id, user_id, "revoked permission");
        Ok(())
    }

    // Private helper methods

    /// Per-project mutation mutex, created on first use. Fast path is a
    /// read lock on the registry.
    async fn project_lock(&self, project_id: i64) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(&project_id) {
                return lock.clone();
            }
        }
        let mut locks = self.locks.write().await;
        locks
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn ensure_edit(&self, detail: &ProjectDetail, identity: Identity) -> Result<(), ServiceError> {
        if can_edit(&detail.project, &detail.permissions, identity.user_id, identity.is_admin) {
            return Ok(());
        }
        warn!(
            project_id = detail.project.id,
            user_id = identity.user_id,
            "mutation refused, no edit rights"
        );
        Err(ServiceError::PermissionDenied(format!(
            "user {} has no edit rights on project {}",
            identity.user_id, detail.project.id
        )))
    }

    async fn cell_change(
        &self,
        project_id: i64,
        cell: ChecklistCell,
        created: bool,
    ) -> Result<CellChange, ServiceError> {
        // fresh snapshot after the mutation, still under the project lock
        let detail = self.store.load_detail(project_id).await?;
        Ok(CellChange {
            item_progress: item_progress(cell.item_id, &detail.cells),
            project_progress: project_progress(&detail.items, &detail.cells),
            cell,
            created,
        })
    }
}

fn ensure_item_member(detail: &ProjectDetail, item_id: i64) -> Result<(), ServiceError> {
    if detail.items.iter().any(|i| i.id == item_id) {
        return Ok(());
    }
    Err(ServiceError::Validation(format!(
        "item {item_id} does not belong to project {}",
        detail.project.id
    )))
}

fn ensure_action_member(detail: &ProjectDetail, action_id: i64) -> Result<(), ServiceError> {
    if detail.actions.iter().any(|a| a.id == action_id) {
        return Ok(());
    }
    Err(ServiceError::Validation(format!(
        "action {action_id} does not belong to project {}",
        detail.project.id
    )))
}

/// Patch for a completion change, keeping the audit fields in lockstep:
/// stamped when completion is set, cleared when it is unset, untouched
/// when the value does not change.
fn completion_patch(cell: &ChecklistCell, completed: bool, identity: Identity) -> CellPatch {
    let mut patch = CellPatch {
        completed: Some(completed),
        ..Default::default()
    };
    if completed && !cell.completed {
        patch.completed_at = Some(Some(Utc::now()));
        patch.completed_by = Some(Some(identity.user_id));
    } else if !completed && cell.completed {
        patch.completed_at = Some(None);
        patch.completed_by = Some(None);
    }
    patch
}
