use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{
    Action, ActionPatch, CellPatch, ChecklistCell, Item, ItemPatch, NewAction, NewItem,
    NewProject, Permission, Project, ProjectDetail, ProjectPatch,
};
use crate::store::{ProjectStore, StoreError};

/// In-process store. Each project lives behind its own `RwLock`, so a
/// composite read is one read-guard snapshot and operations on different
/// projects never contend. Cells are keyed by `(item_id, action_id)` with
/// a secondary id index, keeping both lookup paths constant-time.
pub struct MemoryStore {
    projects: RwLock<HashMap<i64, Arc<RwLock<ProjectRecord>>>>,
    next_id: AtomicI64,
}

struct ProjectRecord {
    project: Project,
    items: BTreeMap<i64, Item>,
    actions: BTreeMap<i64, Action>,
    cells: HashMap<(i64, i64), ChecklistCell>,
    cell_coords: HashMap<i64, (i64, i64)>,
    // keyed by user_id: at most one grant per (project, user)
    permissions: BTreeMap<i64, Permission>,
}

impl ProjectRecord {
    fn detail(&self) -> ProjectDetail {
        let mut items: Vec<Item> = self.items.values().cloned().collect();
        items.sort_by_key(|i| (i.position, i.id));
        let mut actions: Vec<Action> = self.actions.values().cloned().collect();
        actions.sort_by_key(|a| (a.position, a.id));
        let mut cells: Vec<ChecklistCell> = self.cells.values().cloned().collect();
        cells.sort_by_key(|c| c.id);
        let permissions: Vec<Permission> = self.permissions.values().cloned().collect();
        ProjectDetail {
            project: self.project.clone(),
            items,
            actions,
            cells,
            permissions,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn record(&self, project_id: i64) -> Result<Arc<RwLock<ProjectRecord>>, StoreError> {
        let projects = self.projects.read().await;
        projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, new: NewProject) -> Result<Project, StoreError> {
        let project = Project {
            id: self.next_id(),
            title: new.title,
            description: new.description,
            responsible: new.responsible,
            collaborators: new.collaborators,
            public: new.public,
            start_date: new.start_date,
            end_date: new.end_date,
            created_by: new.created_by,
            created_at: Utc::now(),
        };
        let record = ProjectRecord {
            project: project.clone(),
            items: BTreeMap::new(),
            actions: BTreeMap::new(),
            cells: HashMap::new(),
            cell_coords: HashMap::new(),
            permissions: BTreeMap::new(),
        };
        let mut projects = self.projects.write().await;
        projects.insert(project.id, Arc::new(RwLock::new(record)));
        debug!(project_id = project.id, "inserted project");
        Ok(project)
    }

    async fn update_project(
        &self,
        project_id: i64,
        patch: ProjectPatch,
    ) -> Result<Project, StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        let project = &mut record.project;
        if let Some(title) = patch.title {
            project.title = title;
        }
        if let Some(description) = patch.description {
            project.description = description;
        }
        if let Some(responsible) = patch.responsible {
            project.responsible = responsible;
        }
        if let Some(collaborators) = patch.collaborators {
            project.collaborators = collaborators;
        }
        if let Some(public) = patch.public {
            project.public = public;
        }
        if let Some(start_date) = patch.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            project.end_date = end_date;
        }
        Ok(project.clone())
    }

    async fn delete_project(&self, project_id: i64) -> Result<(), StoreError> {
        let mut projects = self.projects.write().await;
        projects
            .remove(&project_id)
            .ok_or_else(|| StoreError::NotFound(format!("project {project_id}")))?;
        debug!(project_id, "deleted project");
        Ok(())
    }

    async fn load_detail(&self, project_id: i64) -> Result<ProjectDetail, StoreError> {
        let record = self.record(project_id).await?;
        let record = record.read().await;
        Ok(record.detail())
    }

    async fn list_details(&self) -> Result<Vec<ProjectDetail>, StoreError> {
        let records: Vec<Arc<RwLock<ProjectRecord>>> = {
            let projects = self.projects.read().await;
            projects.values().cloned().collect()
        };
        let mut details = Vec::with_capacity(records.len());
        for record in records {
            let record = record.read().await;
            details.push(record.detail());
        }
        details.sort_by_key(|d| d.project.id);
        Ok(details)
    }

    async fn insert_item(&self, project_id: i64, new: NewItem) -> Result<Item, StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        let item = Item {
            id: self.next_id(),
            project_id,
            name: new.name,
            position: new.position,
            start_date: new.start_date,
            end_date: new.end_date,
        };
        record.items.insert(item.id, item.clone());
        debug!(project_id, item_id = item.id, "inserted item");
        Ok(item)
    }

    async fn update_item(
        &self,
        project_id: i64,
        item_id: i64,
        patch: ItemPatch,
    ) -> Result<Item, StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        let item = record
            .items
            .get_mut(&item_id)
            .ok_or_else(|| StoreError::NotFound(format!("item {item_id}")))?;
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(position) = patch.position {
            item.position = position;
        }
        if let Some(start_date) = patch.start_date {
            item.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            item.end_date = end_date;
        }
        Ok(item.clone())
    }

    async fn delete_item(&self, project_id: i64, item_id: i64) -> Result<(), StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        record
            .items
            .remove(&item_id)
            .ok_or_else(|| StoreError::NotFound(format!("item {item_id}")))?;
        record.cells.retain(|(i, _), _| *i != item_id);
        record.cell_coords.retain(|_, (i, _)| *i != item_id);
        debug!(project_id, item_id, "deleted item and its cells");
        Ok(())
    }

    async fn insert_action(&self, project_id: i64, new: NewAction) -> Result<Action, StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        let action = Action {
            id: self.next_id(),
            project_id,
            name: new.name,
            position: new.position,
        };
        record.actions.insert(action.id, action.clone());
        debug!(project_id, action_id = action.id, "inserted action");
        Ok(action)
    }

    async fn update_action(
        &self,
        project_id: i64,
        action_id: i64,
        patch: ActionPatch,
    ) -> Result<Action, StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        let action = record
            .actions
            .get_mut(&action_id)
            .ok_or_else(|| StoreError::NotFound(format!("action {action_id}")))?;
        if let Some(name) = patch.name {
            action.name = name;
        }
        if let Some(position) = patch.position {
            action.position = position;
        }
        Ok(action.clone())
    }

    async fn delete_action(&self, project_id: i64, action_id: i64) -> Result<(), StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        record
            .actions
            .remove(&action_id)
            .ok_or_else(|| StoreError::NotFound(format!("action {action_id}")))?;
        record.cells.retain(|(_, a), _| *a != action_id);
        record.cell_coords.retain(|_, (_, a)| *a != action_id);
        debug!(project_id, action_id, "deleted action and its cells");
        Ok(())
    }

    async fn insert_cell(
        &self,
        project_id: i64,
        item_id: i64,
        action_id: i64,
    ) -> Result<ChecklistCell, StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        if !record.items.contains_key(&item_id) {
            return Err(StoreError::NotFound(format!("item {item_id}")));
        }
        if !record.actions.contains_key(&action_id) {
            return Err(StoreError::NotFound(format!("action {action_id}")));
        }
        if record.cells.contains_key(&(item_id, action_id)) {
            return Err(StoreError::Duplicate(format!(
                "cell for item {item_id} / action {action_id}"
            )));
        }
        let cell = ChecklistCell {
            id: self.next_id(),
            project_id,
            item_id,
            action_id,
            active: true,
            completed: false,
            completed_at: None,
            completed_by: None,
        };
        record.cells.insert((item_id, action_id), cell.clone());
        record.cell_coords.insert(cell.id, (item_id, action_id));
        debug!(project_id, cell_id = cell.id, item_id, action_id, "inserted cell");
        Ok(cell)
    }

    async fn cell_at(
        &self,
        project_id: i64,
        item_id: i64,
        action_id: i64,
    ) -> Result<Option<ChecklistCell>, StoreError> {
        let record = self.record(project_id).await?;
        let record = record.read().await;
        Ok(record.cells.get(&(item_id, action_id)).cloned())
    }

    async fn get_cell(&self, project_id: i64, cell_id: i64) -> Result<ChecklistCell, StoreError> {
        let record = self.record(project_id).await?;
        let record = record.read().await;
        let coords = record
            .cell_coords
            .get(&cell_id)
            .ok_or_else(|| StoreError::NotFound(format!("checklist cell {cell_id}")))?;
        record
            .cells
            .get(coords)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("checklist cell {cell_id}")))
    }

    async fn update_cell(
        &self,
        project_id: i64,
        cell_id: i64,
        patch: CellPatch,
    ) -> Result<ChecklistCell, StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        let coords = *record
            .cell_coords
            .get(&cell_id)
            .ok_or_else(|| StoreError::NotFound(format!("checklist cell {cell_id}")))?;
        let cell = record
            .cells
            .get_mut(&coords)
            .ok_or_else(|| StoreError::NotFound(format!("checklist cell {cell_id}")))?;
        if let Some(active) = patch.active {
            cell.active = active;
        }
        if let Some(completed) = patch.completed {
            cell.completed = completed;
        }
        if let Some(completed_at) = patch.completed_at {
            cell.completed_at = completed_at;
        }
        if let Some(completed_by) = patch.completed_by {
            cell.completed_by = completed_by;
        }
        Ok(cell.clone())
    }

    async fn upsert_permission(
        &self,
        project_id: i64,
        user_id: i64,
        can_edit: bool,
    ) -> Result<(Permission, bool), StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        if let Some(existing) = record.permissions.get_mut(&user_id) {
            existing.can_edit = can_edit;
            return Ok((existing.clone(), false));
        }
        let permission = Permission {
            id: self.next_id(),
            project_id,
            user_id,
            can_edit,
        };
        record.permissions.insert(user_id, permission.clone());
        debug!(project_id, user_id, can_edit, "inserted permission");
        Ok((permission, true))
    }

    async fn delete_permission(&self, project_id: i64, user_id: i64) -> Result<(), StoreError> {
        let record = self.record(project_id).await?;
        let mut record = record.write().await;
        record
            .permissions
            .remove(&user_id)
            .ok_or_else(|| StoreError::NotFound(format!("permission for user {user_id}")))?;
        debug!(project_id, user_id, "deleted permission");
        Ok(())
    }
}
