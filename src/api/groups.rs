// Group administration handlers. A group's role is derived from its
// name on create and rename; the API never accepts a role directly.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::core::{access, role::derive_role};
use crate::error::{AppError, AppResult};
use crate::models::{CreateGroupRequest, Group, Identity, RenameGroupRequest};

use super::identity::require_admin_surface;

fn validated_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Group name must not be empty".to_string()));
    }
    Ok(name)
}

fn gate(identity: &Identity, group: &Group) -> AppResult<()> {
    if access::can_act(Some(identity), Some(group)) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "You do not have permission to manage group \"{}\". Required role: {}",
        group.name, group.role
    )))
}

pub async fn list_groups_handler(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let groups = state.db.list_groups().await?;
    Ok(Json(json!({ "groups": groups })))
}

pub async fn create_group_handler(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateGroupRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let name = validated_name(&req.name)?;

    // The group does not exist yet, so gate against what it will be.
    let prospective = Group {
        id: 0,
        name: name.to_string(),
        role: derive_role(name),
    };
    gate(&identity, &prospective)?;

    let group = state.db.create_group(name).await?;
    tracing::info!("Created group {} ({})", group.id, group.name);
    Ok(Json(json!({ "group": group })))
}

pub async fn get_group_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let group = state
        .db
        .get_group(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))?;
    Ok(Json(json!({ "group": group })))
}

pub async fn rename_group_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(req): Json<RenameGroupRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let name = validated_name(&req.name)?;

    let group = state
        .db
        .get_group(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))?;
    gate(&identity, &group)?;

    let group = state.db.rename_group(id, name).await?;
    tracing::info!("Renamed group {} to {} (role {})", id, group.name, group.role);
    Ok(Json(json!({ "group": group })))
}

pub async fn delete_group_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;

    let group = state
        .db
        .get_group(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))?;
    gate(&identity, &group)?;

    let deleted_screens = state.db.delete_group(id).await?;
    for screen_id in &deleted_screens {
        state.digests.forget(*screen_id).await;
    }

    tracing::info!(
        "Deleted group {} ({}) with {} screens",
        id,
        group.name,
        deleted_screens.len()
    );
    Ok(Json(json!({ "id": id, "deleted": true })))
}
