// Route handlers for the /gerenciamento surface, one module per entity.
// Handlers stay thin: extract identity, call the service, format the
// response; error mapping lives in `crate::error`.

pub mod actions;
pub mod checklists;
pub mod items;
pub mod permissions;
pub mod projects;

use serde::{Deserialize, Deserializer};

use crate::error::ApiError;
use crate::models::Identity;
use crate::services::ServiceError;

/// Distinguishes an absent field from an explicit `null`: absent stays
/// `None` (via `#[serde(default)]`), `null` becomes `Some(None)` and
/// clears the value.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// On read routes a denied anonymous caller gets 401, an identified one
/// gets the usual 403.
pub(crate) fn read_rejection(err: ServiceError, identity: Option<Identity>) -> ApiError {
    match (&err, identity) {
        (ServiceError::PermissionDenied(_), None) => {
            ApiError::unauthorized("authentication required")
        }
        _ => err.into(),
    }
}
