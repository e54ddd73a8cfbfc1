// Async signage database over an SQLx SQLite connection pool.
//
// All position bookkeeping lives here: every multi-row shift runs inside
// one transaction so readers never observe a torn ordering and a failure
// mid-shift rolls back completely. For a fixed screen the set of picture
// positions is always exactly {1..N}.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::core::role::derive_role;
use crate::error::{AppError, AppResult};
use crate::models::{CreatePictureRequest, Group, Picture, Screen, UpdatePictureRequest};

pub struct SignageDatabase {
    pub pool: SqlitePool, // Public for integration tests and media tooling
}

fn group_from_row(row: &SqliteRow) -> Group {
    Group {
        id: row.get("id"),
        name: row.get("name"),
        role: row.get("role"),
    }
}

fn screen_from_row(row: &SqliteRow) -> Screen {
    Screen {
        id: row.get("id"),
        name: row.get("name"),
        group_id: row.get("group_id"),
    }
}

fn picture_from_row(row: &SqliteRow) -> Picture {
    Picture {
        id: row.get("id"),
        screen_id: row.get("screen_id"),
        delay: row.get("delay"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        background_color: row.get("background_color"),
        position: row.get("position"),
        image_name: row.get("image_name"),
        updated_at: row.get("updated_at"),
    }
}

const PICTURE_COLUMNS: &str =
    "id, screen_id, delay, start_date, end_date, background_color, position, image_name, updated_at";

impl SignageDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(SignageDatabase { pool })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS groups (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                role TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS screens (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                group_id INTEGER NOT NULL REFERENCES groups(id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pictures (
                id INTEGER PRIMARY KEY,
                screen_id INTEGER NOT NULL REFERENCES screens(id),
                delay INTEGER NOT NULL,
                start_date TEXT,
                end_date TEXT,
                background_color TEXT,
                position INTEGER NOT NULL,
                image_name TEXT,
                updated_at TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_screens_group ON screens(group_id)")
            .execute(&self.pool)
            .await?;

        // Non-unique: bulk shifts update rows in arbitrary order, so a
        // unique constraint would trip on transient duplicates mid-shift.
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pictures_screen_position ON pictures(screen_id, position)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Groups

    pub async fn create_group(&self, name: &str) -> AppResult<Group> {
        let role = derive_role(name);
        let result = sqlx::query("INSERT INTO groups (name, role) VALUES (?, ?)")
            .bind(name)
            .bind(&role)
            .execute(&self.pool)
            .await?;

        Ok(Group {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            role,
        })
    }

    pub async fn get_group(&self, id: i64) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, name, role FROM groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(group_from_row))
    }

    pub async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, name, role FROM groups ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(group_from_row).collect())
    }

    /// Rename a group. The role is always re-derived from the new name;
    /// there is deliberately no way to set it directly.
    pub async fn rename_group(&self, id: i64, name: &str) -> AppResult<Group> {
        let role = derive_role(name);
        let result = sqlx::query("UPDATE groups SET name = ?, role = ? WHERE id = ?")
            .bind(name)
            .bind(&role)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Group {} not found", id)));
        }

        Ok(Group {
            id,
            name: name.to_string(),
            role,
        })
    }

    /// Delete a group with its screens and their pictures. Returns the
    /// ids of the deleted screens so callers can drop poll state.
    pub async fn delete_group(&self, id: i64) -> AppResult<Vec<i64>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Err(AppError::NotFound(format!("Group {} not found", id)));
        }

        let screen_ids: Vec<i64> = sqlx::query("SELECT id FROM screens WHERE group_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| row.get::<i64, _>(0))
            .collect();

        sqlx::query(
            "DELETE FROM pictures WHERE screen_id IN (SELECT id FROM screens WHERE group_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM screens WHERE group_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(screen_ids)
    }

    // Screens

    pub async fn create_screen(&self, name: &str, group_id: i64) -> AppResult<Screen> {
        if self.get_group(group_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Group {} not found", group_id)));
        }

        let result = sqlx::query("INSERT INTO screens (name, group_id) VALUES (?, ?)")
            .bind(name)
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(Screen {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            group_id,
        })
    }

    pub async fn get_screen(&self, id: i64) -> AppResult<Option<Screen>> {
        let row = sqlx::query("SELECT id, name, group_id FROM screens WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(screen_from_row))
    }

    pub async fn list_screens(&self) -> AppResult<Vec<Screen>> {
        let rows = sqlx::query("SELECT id, name, group_id FROM screens ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(screen_from_row).collect())
    }

    pub async fn update_screen(&self, id: i64, name: &str, group_id: i64) -> AppResult<Screen> {
        if self.get_group(group_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Group {} not found", group_id)));
        }

        let result = sqlx::query("UPDATE screens SET name = ?, group_id = ? WHERE id = ?")
            .bind(name)
            .bind(group_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Screen {} not found", id)));
        }

        Ok(Screen {
            id,
            name: name.to_string(),
            group_id,
        })
    }

    pub async fn delete_screen(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM screens WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Err(AppError::NotFound(format!("Screen {} not found", id)));
        }

        sqlx::query("DELETE FROM pictures WHERE screen_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM screens WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // Pictures

    /// All pictures of a screen in display order.
    pub async fn pictures_for_screen(&self, screen_id: i64) -> AppResult<Vec<Picture>> {
        let query = format!(
            "SELECT {} FROM pictures WHERE screen_id = ? ORDER BY position ASC",
            PICTURE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(screen_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(picture_from_row).collect())
    }

    pub async fn get_picture(&self, id: i64) -> AppResult<Option<Picture>> {
        let query = format!("SELECT {} FROM pictures WHERE id = ?", PICTURE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(picture_from_row))
    }

    pub async fn list_pictures(&self) -> AppResult<Vec<Picture>> {
        let query = format!(
            "SELECT {} FROM pictures ORDER BY screen_id, position",
            PICTURE_COLUMNS
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(picture_from_row).collect())
    }

    /// Next free position on a screen: max + 1, or 1 when empty.
    pub async fn next_position(&self, screen_id: i64) -> AppResult<i64> {
        let row = sqlx::query("SELECT MAX(position) FROM pictures WHERE screen_id = ?")
            .bind(screen_id)
            .fetch_one(&self.pool)
            .await?;
        let max: Option<i64> = row.get(0);
        Ok(max.unwrap_or(0) + 1)
    }

    /// Whether a position is taken on a screen, optionally ignoring one
    /// picture (edit-in-place checks).
    pub async fn is_position_used(
        &self,
        screen_id: i64,
        position: i64,
        exclude_picture_id: Option<i64>,
    ) -> AppResult<bool> {
        let count: i64 = match exclude_picture_id {
            Some(exclude) => {
                sqlx::query(
                    "SELECT COUNT(id) FROM pictures WHERE screen_id = ? AND position = ? AND id != ?",
                )
                .bind(screen_id)
                .bind(position)
                .bind(exclude)
                .fetch_one(&self.pool)
                .await?
                .get(0)
            }
            None => {
                sqlx::query("SELECT COUNT(id) FROM pictures WHERE screen_id = ? AND position = ?")
                    .bind(screen_id)
                    .bind(position)
                    .fetch_one(&self.pool)
                    .await?
                    .get(0)
            }
        };
        Ok(count > 0)
    }

    /// Create a picture appended at the end of its screen's order. The
    /// position is computed inside the insert transaction so two racing
    /// creates cannot claim the same slot.
    pub async fn create_picture(&self, req: &CreatePictureRequest) -> AppResult<Picture> {
        let mut tx = self.pool.begin().await?;

        let screen = sqlx::query("SELECT id FROM screens WHERE id = ?")
            .bind(req.screen_id)
            .fetch_optional(&mut *tx)
            .await?;
        if screen.is_none() {
            return Err(AppError::NotFound(format!(
                "Screen {} not found",
                req.screen_id
            )));
        }

        let row = sqlx::query("SELECT MAX(position) FROM pictures WHERE screen_id = ?")
            .bind(req.screen_id)
            .fetch_one(&mut *tx)
            .await?;
        let max: Option<i64> = row.get(0);
        let position = max.unwrap_or(0) + 1;

        let result = sqlx::query(
            "INSERT INTO pictures (screen_id, delay, start_date, end_date, background_color, position)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(req.screen_id)
        .bind(req.delay)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(&req.background_color)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Picture {
            id: result.last_insert_rowid(),
            screen_id: req.screen_id,
            delay: req.delay,
            start_date: req.start_date,
            end_date: req.end_date,
            background_color: req.background_color.clone(),
            position,
            image_name: None,
            updated_at: None,
        })
    }

    pub async fn update_picture(&self, id: i64, req: &UpdatePictureRequest) -> AppResult<Picture> {
        let mut picture = self
            .get_picture(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Picture {} not found", id)))?;

        sqlx::query(
            "UPDATE pictures SET delay = ?, start_date = ?, end_date = ?, background_color = ?
             WHERE id = ?",
        )
        .bind(req.delay)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(&req.background_color)
        .bind(id)
        .execute(&self.pool)
        .await?;

        picture.delay = req.delay;
        picture.start_date = req.start_date;
        picture.end_date = req.end_date;
        picture.background_color = req.background_color.clone();
        Ok(picture)
    }

    /// Delete a picture and close the gap: every picture on the same
    /// screen with a higher position slides down by one, atomically with
    /// the delete.
    pub async fn delete_picture(&self, id: i64) -> AppResult<Picture> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM pictures WHERE id = ?", PICTURE_COLUMNS);
        let row = sqlx::query(&query).bind(id).fetch_optional(&mut *tx).await?;
        let picture = match row.as_ref() {
            Some(row) => picture_from_row(row),
            None => return Err(AppError::NotFound(format!("Picture {} not found", id))),
        };

        sqlx::query("DELETE FROM pictures WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE pictures SET position = position - 1 WHERE screen_id = ? AND position > ?",
        )
        .bind(picture.screen_id)
        .bind(picture.position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(picture)
    }

    /// Move a picture to a new position within its screen.
    ///
    /// Shift the range between old and new by one away from the origin,
    /// then place the picture. A target outside 1..=N is rejected rather
    /// than clamped, since clamping would hide caller bugs behind a
    /// silently different ordering.
    pub async fn move_picture(&self, picture_id: i64, new_position: i64) -> AppResult<Picture> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM pictures WHERE id = ?", PICTURE_COLUMNS);
        let row = sqlx::query(&query)
            .bind(picture_id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut picture = match row.as_ref() {
            Some(row) => picture_from_row(row),
            None => {
                return Err(AppError::NotFound(format!(
                    "Picture {} not found",
                    picture_id
                )))
            }
        };

        let old_position = picture.position;
        if new_position == old_position {
            return Ok(picture);
        }

        let count: i64 = sqlx::query("SELECT COUNT(id) FROM pictures WHERE screen_id = ?")
            .bind(picture.screen_id)
            .fetch_one(&mut *tx)
            .await?
            .get(0);

        if new_position < 1 || new_position > count {
            return Err(AppError::Integrity(format!(
                "Position {} is out of range 1..={} for screen {}",
                new_position, count, picture.screen_id
            )));
        }

        if new_position > old_position {
            sqlx::query(
                "UPDATE pictures SET position = position - 1
                 WHERE screen_id = ? AND position > ? AND position <= ?",
            )
            .bind(picture.screen_id)
            .bind(old_position)
            .bind(new_position)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                "UPDATE pictures SET position = position + 1
                 WHERE screen_id = ? AND position >= ? AND position < ?",
            )
            .bind(picture.screen_id)
            .bind(new_position)
            .bind(old_position)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE pictures SET position = ? WHERE id = ?")
            .bind(new_position)
            .bind(picture_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        picture.position = new_position;
        Ok(picture)
    }

    /// Reassign positions 1..N in ascending existing order, closing any
    /// accumulated gaps. Repair operation; a healthy screen is a no-op.
    pub async fn compact_positions(&self, screen_id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "SELECT id, position FROM pictures WHERE screen_id = ? ORDER BY position ASC",
        )
        .bind(screen_id)
        .fetch_all(&mut *tx)
        .await?;

        for (index, row) in rows.iter().enumerate() {
            let expected = index as i64 + 1;
            let current: i64 = row.get("position");
            if current != expected {
                sqlx::query("UPDATE pictures SET position = ? WHERE id = ?")
                    .bind(expected)
                    .bind(row.get::<i64, _>("id"))
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Every integer in `[1, max_position)` not currently used on the
    /// screen. Diagnostic only; a dense screen returns an empty list.
    pub async fn find_position_gaps(&self, screen_id: i64) -> AppResult<Vec<i64>> {
        let used: Vec<i64> = sqlx::query(
            "SELECT position FROM pictures WHERE screen_id = ? ORDER BY position ASC",
        )
        .bind(screen_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get::<i64, _>(0))
        .collect();

        let max = match used.last() {
            Some(max) => *max,
            None => return Ok(Vec::new()),
        };

        let mut gaps = Vec::new();
        for candidate in 1..max {
            if !used.contains(&candidate) {
                gaps.push(candidate);
            }
        }
        Ok(gaps)
    }

    /// Record a freshly stored image asset on a picture and bump its
    /// `updated_at`, which feeds the change fingerprint.
    pub async fn set_picture_image(
        &self,
        id: i64,
        image_name: &str,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Picture> {
        let mut picture = self
            .get_picture(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Picture {} not found", id)))?;

        sqlx::query("UPDATE pictures SET image_name = ?, updated_at = ? WHERE id = ?")
            .bind(image_name)
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        picture.image_name = Some(image_name.to_string());
        picture.updated_at = Some(updated_at);
        Ok(picture)
    }
}
