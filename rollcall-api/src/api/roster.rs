//! Roster listing

use axum::{extract::State, Json};
use rollcall_common::Roster;

use crate::AppState;

/// GET /api/roster
///
/// Returns `[{roll_no, name}, ...]` in display order
pub async fn get_roster(State(state): State<AppState>) -> Json<Roster> {
    Json(state.roster.as_ref().clone())
}
