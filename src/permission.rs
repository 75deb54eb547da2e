//! Authorization predicates over (project, caller).
//!
//! Pure lookups, no I/O: callers pass the permission rows they already
//! hold from a store snapshot.

use crate::models::{Identity, Permission, Project};

/// True iff the caller is an admin, the project's creator, or holds an
/// explicit `can_edit` grant. Checked before every mutation.
pub fn can_edit(
    project: &Project,
    permissions: &[Permission],
    user_id: i64,
    is_admin: bool,
) -> bool {
    if is_admin || project.created_by == user_id {
        return true;
    }
    permissions
        .iter()
        .any(|p| p.project_id == project.id && p.user_id == user_id && p.can_edit)
}

/// True iff the caller may read the project: public projects are open to
/// everyone, otherwise the caller must be an admin, the creator, or hold
/// any permission row (edit or view).
pub fn can_view(project: &Project, permissions: &[Permission], identity: Option<Identity>) -> bool {
    if project.public {
        return true;
    }
    match identity {
        None => false,
        Some(id) => {
            id.is_admin
                || project.created_by == id.user_id
                || permissions
                    .iter()
                    .any(|p| p.project_id == project.id && p.user_id == id.user_id)
        }
    }
}
