// Screen administration handlers. Every mutation is gated on the
// screen's owning group; re-parenting a screen checks both the old and
// the new group.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::core::access;
use crate::error::{AppError, AppResult};
use crate::models::{CreateScreenRequest, Group, Identity, Screen, UpdateScreenRequest};

use super::identity::require_admin_surface;

fn gate(identity: &Identity, group: &Group) -> AppResult<()> {
    if access::can_act(Some(identity), Some(group)) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "You do not have permission to manage screens of group \"{}\". Required role: {}",
        group.name, group.role
    )))
}

async fn load_screen(state: &AppState, id: i64) -> AppResult<Screen> {
    state
        .db
        .get_screen(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Screen {} not found", id)))
}

async fn load_group(state: &AppState, id: i64) -> AppResult<Group> {
    state
        .db
        .get_group(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))
}

/// Owning group of a screen. A screen always has one; a miss here means
/// the store lost referential integrity.
async fn owning_group(state: &AppState, screen: &Screen) -> AppResult<Group> {
    state.db.get_group(screen.group_id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "Screen {} references missing group {}",
            screen.id, screen.group_id
        ))
    })
}

pub async fn list_screens_handler(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let screens = state.db.list_screens().await?;
    Ok(Json(json!({ "screens": screens })))
}

pub async fn create_screen_handler(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateScreenRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Screen name must not be empty".to_string()));
    }

    let group = load_group(&state, req.group_id).await?;
    gate(&identity, &group)?;

    let screen = state.db.create_screen(req.name.trim(), req.group_id).await?;
    tracing::info!(
        "Created screen {} ({}) in group {}",
        screen.id,
        screen.name,
        group.name
    );
    Ok(Json(json!({ "screen": screen })))
}

pub async fn get_screen_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let screen = load_screen(&state, id).await?;
    Ok(Json(json!({ "screen": screen })))
}

pub async fn update_screen_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(req): Json<UpdateScreenRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("Screen name must not be empty".to_string()));
    }

    let screen = load_screen(&state, id).await?;
    let current_group = owning_group(&state, &screen).await?;
    gate(&identity, &current_group)?;

    if req.group_id != screen.group_id {
        let new_group = load_group(&state, req.group_id).await?;
        gate(&identity, &new_group)?;
    }

    let screen = state
        .db
        .update_screen(id, req.name.trim(), req.group_id)
        .await?;
    tracing::info!("Updated screen {} ({})", screen.id, screen.name);
    Ok(Json(json!({ "screen": screen })))
}

pub async fn delete_screen_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;

    let screen = load_screen(&state, id).await?;
    let group = owning_group(&state, &screen).await?;
    gate(&identity, &group)?;

    state.db.delete_screen(id).await?;
    state.digests.forget(id).await;

    tracing::info!("Deleted screen {} ({}) of group {}", id, screen.name, group.name);
    Ok(Json(json!({ "id": id, "deleted": true })))
}

/// A screen's pictures in display order.
pub async fn screen_pictures_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    load_screen(&state, id).await?;
    let pictures = state.db.pictures_for_screen(id).await?;
    Ok(Json(json!({ "pictures": pictures })))
}

/// Unused positions below the current maximum. A healthy screen reports
/// none; anything else calls for compact-positions.
pub async fn position_gaps_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    load_screen(&state, id).await?;
    let gaps = state.db.find_position_gaps(id).await?;
    Ok(Json(json!({ "gaps": gaps })))
}

pub async fn compact_positions_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;

    let screen = load_screen(&state, id).await?;
    let group = owning_group(&state, &screen).await?;
    gate(&identity, &group)?;

    state.db.compact_positions(id).await?;
    tracing::info!("Compacted picture positions on screen {}", id);

    let pictures = state.db.pictures_for_screen(id).await?;
    Ok(Json(json!({ "pictures": pictures })))
}
