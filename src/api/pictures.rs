// Picture administration handlers: CRUD, reordering within a screen and
// image-asset attachment. Every mutation is gated on the owning
// screen's group.

use axum::{
    extract::{Path, State},
    response::Json,
};
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::core::access;
use crate::error::{AppError, AppResult};
use crate::models::{
    AttachImageRequest, CreatePictureRequest, Group, Identity, MovePictureRequest, Picture,
    UpdatePictureRequest,
};

use super::identity::require_admin_surface;

fn gate(identity: &Identity, group: &Group) -> AppResult<()> {
    if access::can_act(Some(identity), Some(group)) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "You do not have permission to manage pictures of group \"{}\". Required role: {}",
        group.name, group.role
    )))
}

fn validate_slide_fields(
    delay: i64,
    start_date: Option<chrono::DateTime<Utc>>,
    end_date: Option<chrono::DateTime<Utc>>,
) -> AppResult<()> {
    if delay <= 0 {
        return Err(AppError::Validation(
            "Display delay must be a positive number of seconds".to_string(),
        ));
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(AppError::Validation(
                "Start date must not be after end date".to_string(),
            ));
        }
    }
    Ok(())
}

/// Load a picture together with its owning group for permission checks.
async fn load_picture_with_group(state: &AppState, id: i64) -> AppResult<(Picture, Group)> {
    let picture = state
        .db
        .get_picture(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Picture {} not found", id)))?;

    let screen = state.db.get_screen(picture.screen_id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "Picture {} references missing screen {}",
            id, picture.screen_id
        ))
    })?;

    let group = state.db.get_group(screen.group_id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "Screen {} references missing group {}",
            screen.id, screen.group_id
        ))
    })?;

    Ok((picture, group))
}

pub async fn list_pictures_handler(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let pictures = state.db.list_pictures().await?;
    Ok(Json(json!({ "pictures": pictures })))
}

pub async fn create_picture_handler(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreatePictureRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    validate_slide_fields(req.delay, req.start_date, req.end_date)?;

    let screen = state
        .db
        .get_screen(req.screen_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Screen {} not found", req.screen_id)))?;
    let group = state.db.get_group(screen.group_id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "Screen {} references missing group {}",
            screen.id, screen.group_id
        ))
    })?;
    gate(&identity, &group)?;

    let picture = state.db.create_picture(&req).await?;
    tracing::info!(
        "Created picture {} at position {} on screen {}",
        picture.id,
        picture.position,
        screen.id
    );
    Ok(Json(json!({ "picture": picture })))
}

pub async fn get_picture_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    let picture = state
        .db
        .get_picture(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Picture {} not found", id)))?;
    Ok(Json(json!({ "picture": picture })))
}

pub async fn update_picture_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePictureRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;
    validate_slide_fields(req.delay, req.start_date, req.end_date)?;

    let (_, group) = load_picture_with_group(&state, id).await?;
    gate(&identity, &group)?;

    let picture = state.db.update_picture(id, &req).await?;
    Ok(Json(json!({ "picture": picture })))
}

pub async fn delete_picture_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;

    let (_, group) = load_picture_with_group(&state, id).await?;
    gate(&identity, &group)?;

    let picture = state.db.delete_picture(id).await?;
    tracing::info!(
        "Deleted picture {} from screen {}, positions above {} closed up",
        id,
        picture.screen_id,
        picture.position
    );
    Ok(Json(json!({ "id": id, "deleted": true })))
}

pub async fn move_picture_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(req): Json<MovePictureRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;

    let (_, group) = load_picture_with_group(&state, id).await?;
    gate(&identity, &group)?;

    let picture = state.db.move_picture(id, req.position).await?;
    tracing::info!(
        "Moved picture {} to position {} on screen {}",
        id,
        picture.position,
        picture.screen_id
    );
    Ok(Json(json!({ "picture": picture })))
}

fn stored_image_name(original: &str) -> String {
    let extension = match original.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            ext.to_ascii_lowercase()
        }
        _ => "bin".to_string(),
    };
    format!("{}.{}", Uuid::new_v4(), extension)
}

/// Attach an image asset: store the decoded payload under a generated
/// file name and bump the picture's `updated_at` so pollers pick up the
/// change.
pub async fn attach_image_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(req): Json<AttachImageRequest>,
) -> AppResult<Json<Value>> {
    require_admin_surface(&identity)?;

    let (_, group) = load_picture_with_group(&state, id).await?;
    gate(&identity, &group)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.data.as_bytes())
        .map_err(|_| AppError::Validation("Image data is not valid base64".to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Image data must not be empty".to_string()));
    }

    let image_name = stored_image_name(&req.filename);
    let media_dir = std::path::Path::new(&state.config.media.dir);
    tokio::fs::create_dir_all(media_dir).await?;
    tokio::fs::write(media_dir.join(&image_name), &bytes).await?;

    let picture = state.db.set_picture_image(id, &image_name, Utc::now()).await?;
    tracing::info!("Stored image {} for picture {}", image_name, id);
    Ok(Json(json!({ "picture": picture })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_name_keeps_a_sane_extension() {
        let name = stored_image_name("photo.PNG");
        assert!(name.ends_with(".png"));

        let name = stored_image_name("archive.tar.gz");
        assert!(name.ends_with(".gz"));
    }

    #[test]
    fn stored_name_defaults_odd_input_to_bin() {
        assert!(stored_image_name("no-extension").ends_with(".bin"));
        assert!(stored_image_name("trailing-dot.").ends_with(".bin"));
        assert!(stored_image_name("weird.p/n\\g").ends_with(".bin"));
    }

    #[test]
    fn delay_must_be_positive() {
        assert!(validate_slide_fields(0, None, None).is_err());
        assert!(validate_slide_fields(-5, None, None).is_err());
        assert!(validate_slide_fields(10, None, None).is_ok());
    }

    #[test]
    fn date_range_must_not_be_inverted() {
        let start = Utc::now();
        let end = start - chrono::Duration::days(1);
        assert!(validate_slide_fields(10, Some(start), Some(end)).is_err());
        assert!(validate_slide_fields(10, Some(end), Some(start)).is_ok());
    }
}
