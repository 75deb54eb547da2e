use chrono::{DateTime, NaiveDate, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub responsible: Option<String>,
    pub collaborators: Option<String>,
    pub public: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// A row of the project's matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub position: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A column of the project's matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub position: i32,
}

/// State at one Item x Action intersection. At most one cell exists per
/// (item_id, action_id) pair; a missing cell is distinct from an inactive
/// one. `completed_at`/`completed_by` are Some exactly while `completed`
/// is true and survive soft-disable.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistCell {
    pub id: i64,
    pub project_id: i64,
    pub item_id: i64,
    pub action_id: i64,
    pub active: bool,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<i64>,
}

/// Explicit per-user edit grant. The creator and admins hold implicit
/// rights that never materialize as rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub can_edit: bool,
}

/// Caller identity as resolved by the external auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Identity {
    pub user_id: i64,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub responsible: Option<String>,
    pub collaborators: Option<String>,
    pub public: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub position: i32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAction {
    pub name: String,
    pub position: i32,
}

/// Patch inputs: `None` leaves a field unchanged; for nullable fields the
/// inner Option carries the new value (`Some(None)` clears it).
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub responsible: Option<Option<String>>,
    pub collaborators: Option<Option<String>>,
    pub public: Option<bool>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub position: Option<i32>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Default)]
pub struct ActionPatch {
    pub name: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct CellPatch {
    pub active: Option<bool>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub completed_by: Option<Option<i64>>,
}

/// Consistent snapshot of one project and its matrix, as read atomically
/// from the store.
#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub project: Project,
    pub items: Vec<Item>,
    pub actions: Vec<Action>,
    pub cells: Vec<ChecklistCell>,
    pub permissions: Vec<Permission>,
}

impl ProjectDetail {
    /// Cells belonging to one item, ordered by id.
    pub fn cells_for_item(&self, item_id: i64) -> Vec<&ChecklistCell> {
        let mut cells: Vec<&ChecklistCell> =
            self.cells.iter().filter(|c| c.item_id == item_id).collect();
        cells.sort_by_key(|c| c.id);
        cells
    }
}
