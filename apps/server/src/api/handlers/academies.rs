//! Single-record lookup.
//!
//! `GET /api/academies/{id}` — the id may be either the externally-assigned
//! id or the store's own identity; both resolve to the same record.

use axum::extract::{Path, State};
use axum::Json;

use crate::db::AcademyStore;
use crate::models::AcademyRecord;
use crate::state::AppState;
use crate::{Error, Result};

pub async fn get_academy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AcademyRecord>> {
    let record = state
        .store
        .get(&id)
        .await
        .map_err(Error::Store)?
        .ok_or_else(|| Error::NotFound(format!("academy {id}")))?;
    Ok(Json(record))
}
