// Public display surface - what the screens themselves talk to. No
// authentication: a display device only ever reads.
//
// The poll protocol: `show` seeds the per-screen digest, then the page
// polls `check-updates`; when the digest over the currently active
// picture set differs from the stored one the endpoint answers
// `hasUpdates: true` (and re-arms) so the client re-fetches `slides`.

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::core::{active::active_pictures, fingerprint::fingerprint};
use crate::error::{AppError, AppResult};
use crate::models::Picture;

async fn current_active_set(state: &AppState, screen_id: i64) -> AppResult<Vec<Picture>> {
    // Repository order is position order, which the filter preserves.
    let pictures = state.db.pictures_for_screen(screen_id).await?;
    Ok(active_pictures(pictures, Utc::now()))
}

pub async fn show_screen_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let screen = state
        .db
        .get_screen(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Screen {} not found", id)))?;

    let pictures = current_active_set(&state, id).await?;

    // Seed the poll digest so the first check-updates after page load
    // reports no change.
    state.digests.put(id, fingerprint(&pictures)).await;

    Ok(Json(json!({ "screen": screen, "pictures": pictures })))
}

pub async fn check_updates_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    if state.db.get_screen(id).await?.is_none() {
        // A vanished screen is not an error to a polling display; it
        // just never updates again.
        return Ok(Json(json!({ "hasUpdates": false })));
    }

    let pictures = current_active_set(&state, id).await?;
    let current = fingerprint(&pictures);
    let has_updates = state.digests.has_changed(id, &current).await;

    tracing::debug!(
        "Screen {} poll: digest {}, updates: {}",
        id,
        &current[..12.min(current.len())],
        has_updates
    );

    Ok(Json(json!({ "hasUpdates": has_updates })))
}

pub async fn slides_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    if state.db.get_screen(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Screen {} not found", id)));
    }

    let pictures = current_active_set(&state, id).await?;
    Ok(Json(json!({ "pictures": pictures })))
}
