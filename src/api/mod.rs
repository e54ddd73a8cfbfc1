// HTTP surface - admin JSON API under /api/v1, public display routes at
// the root, uploaded assets served from /media.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::app_state::AppState;

pub mod display;
pub mod groups;
pub mod identity;
pub mod pictures;
pub mod screens;

pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        // Groups
        .route(
            "/groups",
            get(groups::list_groups_handler).post(groups::create_group_handler),
        )
        .route(
            "/groups/{id}",
            get(groups::get_group_handler)
                .put(groups::rename_group_handler)
                .delete(groups::delete_group_handler),
        )
        // Screens
        .route(
            "/screens",
            get(screens::list_screens_handler).post(screens::create_screen_handler),
        )
        .route(
            "/screens/{id}",
            get(screens::get_screen_handler)
                .put(screens::update_screen_handler)
                .delete(screens::delete_screen_handler),
        )
        .route("/screens/{id}/pictures", get(screens::screen_pictures_handler))
        .route("/screens/{id}/position-gaps", get(screens::position_gaps_handler))
        .route(
            "/screens/{id}/compact-positions",
            post(screens::compact_positions_handler),
        )
        // Pictures
        .route(
            "/pictures",
            get(pictures::list_pictures_handler).post(pictures::create_picture_handler),
        )
        .route(
            "/pictures/{id}",
            get(pictures::get_picture_handler)
                .put(pictures::update_picture_handler)
                .delete(pictures::delete_picture_handler),
        )
        .route("/pictures/{id}/position", put(pictures::move_picture_handler))
        .route("/pictures/{id}/image", put(pictures::attach_image_handler));

    let public = Router::new()
        .route("/screens/{id}/show", get(display::show_screen_handler))
        .route("/screens/{id}/check-updates", get(display::check_updates_handler))
        .route("/screens/{id}/slides", get(display::slides_handler));

    Router::new()
        .nest("/api/v1", admin)
        .merge(public)
        .nest_service("/media", ServeDir::new(&state.config.media.dir))
        .with_state(state)
}
