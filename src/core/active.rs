// Active-picture filter - date-window eligibility for display.

use chrono::{DateTime, Utc};

use crate::models::Picture;

/// Whether a picture is eligible for display at `now`.
///
/// A picture with both dates set is active iff `start <= now <= end`.
/// A picture with no dates is always active. A picture with exactly one
/// date set is treated as active (fail open).
pub fn is_active(picture: &Picture, now: DateTime<Utc>) -> bool {
    match (picture.start_date, picture.end_date) {
        (Some(start), Some(end)) => start <= now && now <= end,
        _ => true,
    }
}

/// Keep only the pictures eligible for display at `now`.
///
/// Input order is preserved; this filter does not sort. Display callers
/// are expected to pass pictures already ordered by position.
pub fn active_pictures(mut pictures: Vec<Picture>, now: DateTime<Utc>) -> Vec<Picture> {
    pictures.retain(|p| is_active(p, now));
    pictures
}
