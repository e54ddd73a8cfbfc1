// Domain models - groups, screens, pictures and the request/response types
// exchanged over the HTTP API.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An access-control bucket owning screens. The `role` field is derived
/// from `name` and is never accepted from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub role: String,
}

/// A named display endpoint belonging to exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub id: i64,
    pub name: String,
    pub group_id: i64,
}

/// A timed image slide belonging to exactly one screen.
///
/// `position` is the 1-based rank of the picture within its screen's
/// display order; the set of positions on a screen is always dense
/// (`1..=N` with no gaps or duplicates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    pub id: i64,
    pub screen_id: i64,
    /// Seconds the slide stays on screen before advancing.
    pub delay: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub background_color: Option<String>,
    pub position: i64,
    /// Stored file name of the uploaded asset, assigned on upload.
    pub image_name: Option<String>,
    /// Set whenever the image asset changes.
    pub updated_at: Option<DateTime<Utc>>,
}

/// The caller's identity as supplied by the fronting authentication
/// layer: a user id plus the set of role strings it holds. Role
/// membership is a set-containment check, never pattern matching.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i64,
    pub roles: HashSet<String>,
}

impl Identity {
    pub fn new(user_id: i64, roles: impl IntoIterator<Item = String>) -> Self {
        Self {
            user_id,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// HTTP request payloads

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameGroupRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateScreenRequest {
    pub name: String,
    pub group_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScreenRequest {
    pub name: String,
    pub group_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreatePictureRequest {
    pub screen_id: i64,
    pub delay: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub background_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePictureRequest {
    pub delay: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub background_color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovePictureRequest {
    pub position: i64,
}

/// Image payload for a picture: original file name plus base64 content.
#[derive(Debug, Deserialize)]
pub struct AttachImageRequest {
    pub filename: String,
    pub data: String,
}
