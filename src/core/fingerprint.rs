// Change fingerprint - deterministic digest over an ordered picture set,
// used by the display poll endpoint to detect content changes.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::models::Picture;

/// Fixed date formatting inside the digest; dates must serialize the same
/// way on every call for the digest to be stable.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_date(date: Option<DateTime<Utc>>) -> Value {
    match date {
        Some(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        None => Value::Null,
    }
}

/// Compute the change digest over an ordered picture sequence.
///
/// Each picture contributes the tuple of fields that matter for display:
/// id, delay, image name, position, background color and the three
/// timestamps. The ordered tuple sequence is serialized to canonical
/// JSON (object keys sort alphabetically) and hashed with SHA-256.
///
/// Two calls with the same values in the same order yield the same
/// digest; any tracked-field change, or a reordering of the input,
/// changes it.
pub fn fingerprint(pictures: &[Picture]) -> String {
    let entries: Vec<Value> = pictures
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "delay": p.delay,
                "image_name": p.image_name,
                "position": p.position,
                "background_color": p.background_color,
                "start_date": format_date(p.start_date),
                "end_date": format_date(p.end_date),
                "updated_at": format_date(p.updated_at),
            })
        })
        .collect();

    let canonical = Value::Array(entries).to_string();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
