// Ordering invariant tests: for any screen, the set of picture positions
// is exactly {1..N} after every insert, move and delete.

use signage_server::database::SignageDatabase;
use signage_server::error::AppError;
use signage_server::models::{CreatePictureRequest, Picture};
use tempfile::TempDir;

async fn setup() -> (TempDir, SignageDatabase) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/signage.db?mode=rwc", dir.path().display());
    let db = SignageDatabase::new(&url).await.unwrap();
    db.init().await.unwrap();
    (dir, db)
}

async fn setup_screen(db: &SignageDatabase) -> i64 {
    let group = db.create_group("Lobby Displays").await.unwrap();
    let screen = db.create_screen("Entrance", group.id).await.unwrap();
    screen.id
}

async fn add_picture(db: &SignageDatabase, screen_id: i64) -> Picture {
    db.create_picture(&CreatePictureRequest {
        screen_id,
        delay: 10,
        start_date: None,
        end_date: None,
        background_color: None,
    })
    .await
    .unwrap()
}

async fn assert_dense(db: &SignageDatabase, screen_id: i64) {
    let mut positions: Vec<i64> = db
        .pictures_for_screen(screen_id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.position)
        .collect();
    positions.sort_unstable();
    let expected: Vec<i64> = (1..=positions.len() as i64).collect();
    assert_eq!(positions, expected);
}

async fn ids_in_order(db: &SignageDatabase, screen_id: i64) -> Vec<i64> {
    db.pictures_for_screen(screen_id)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect()
}

#[tokio::test]
async fn creates_append_at_the_end() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    assert_eq!(db.next_position(screen_id).await.unwrap(), 1);

    for expected in 1..=4 {
        let picture = add_picture(&db, screen_id).await;
        assert_eq!(picture.position, expected);
    }
    assert_dense(&db, screen_id).await;
    assert_eq!(db.next_position(screen_id).await.unwrap(), 5);
}

#[tokio::test]
async fn delete_closes_the_gap() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let p1 = add_picture(&db, screen_id).await;
    let p2 = add_picture(&db, screen_id).await;
    let p3 = add_picture(&db, screen_id).await;
    let p4 = add_picture(&db, screen_id).await;

    db.delete_picture(p2.id).await.unwrap();

    assert_dense(&db, screen_id).await;
    assert_eq!(ids_in_order(&db, screen_id).await, vec![p1.id, p3.id, p4.id]);

    // Old position 3 slid to 2, old 4 to 3.
    let p3_now = db.get_picture(p3.id).await.unwrap().unwrap();
    let p4_now = db.get_picture(p4.id).await.unwrap().unwrap();
    assert_eq!(p3_now.position, 2);
    assert_eq!(p4_now.position, 3);
}

#[tokio::test]
async fn move_forward_shifts_the_range_down() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(add_picture(&db, screen_id).await.id);
    }

    // Move the picture at position 2 to position 4.
    db.move_picture(ids[1], 4).await.unwrap();

    assert_dense(&db, screen_id).await;
    assert_eq!(
        ids_in_order(&db, screen_id).await,
        vec![ids[0], ids[2], ids[3], ids[1], ids[4]]
    );
}

#[tokio::test]
async fn move_backward_shifts_the_range_up() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(add_picture(&db, screen_id).await.id);
    }

    db.move_picture(ids[3], 2).await.unwrap();

    assert_dense(&db, screen_id).await;
    assert_eq!(
        ids_in_order(&db, screen_id).await,
        vec![ids[0], ids[3], ids[1], ids[2], ids[4]]
    );
}

#[tokio::test]
async fn move_to_current_position_is_a_no_op() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let p1 = add_picture(&db, screen_id).await;
    let p2 = add_picture(&db, screen_id).await;

    let moved = db.move_picture(p2.id, 2).await.unwrap();
    assert_eq!(moved.position, 2);
    assert_eq!(ids_in_order(&db, screen_id).await, vec![p1.id, p2.id]);
}

#[tokio::test]
async fn move_and_move_back_restores_the_original_assignment() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    for _ in 0..5 {
        add_picture(&db, screen_id).await;
    }
    let before: Vec<(i64, i64)> = db
        .pictures_for_screen(screen_id)
        .await
        .unwrap()
        .iter()
        .map(|p| (p.id, p.position))
        .collect();

    let moved = db.move_picture(before[1].0, 4).await.unwrap();
    db.move_picture(moved.id, before[1].1).await.unwrap();

    let after: Vec<(i64, i64)> = db
        .pictures_for_screen(screen_id)
        .await
        .unwrap()
        .iter()
        .map(|p| (p.id, p.position))
        .collect();
    assert_eq!(after, before);
}

#[tokio::test]
async fn out_of_range_targets_are_rejected_not_clamped() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let picture = add_picture(&db, screen_id).await;
    add_picture(&db, screen_id).await;

    for bad in [0, -3, 3, 100] {
        let err = db.move_picture(picture.id, bad).await.unwrap_err();
        assert!(matches!(err, AppError::Integrity(_)), "target {}", bad);
    }

    // Nothing moved.
    assert_dense(&db, screen_id).await;
    let unchanged = db.get_picture(picture.id).await.unwrap().unwrap();
    assert_eq!(unchanged.position, 1);
}

#[tokio::test]
async fn missing_picture_is_not_found() {
    let (_dir, db) = setup().await;
    setup_screen(&db).await;

    assert!(matches!(
        db.move_picture(9999, 1).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        db.delete_picture(9999).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn ordering_survives_a_mixed_operation_sequence() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let mut ids = Vec::new();
    for _ in 0..6 {
        ids.push(add_picture(&db, screen_id).await.id);
        assert_dense(&db, screen_id).await;
    }

    db.delete_picture(ids[2]).await.unwrap();
    assert_dense(&db, screen_id).await;

    db.move_picture(ids[5], 1).await.unwrap();
    assert_dense(&db, screen_id).await;

    db.delete_picture(ids[0]).await.unwrap();
    assert_dense(&db, screen_id).await;

    let newcomer = add_picture(&db, screen_id).await;
    assert_eq!(newcomer.position, 5);
    assert_dense(&db, screen_id).await;

    db.move_picture(newcomer.id, 3).await.unwrap();
    assert_dense(&db, screen_id).await;
}

#[tokio::test]
async fn screens_order_independently() {
    let (_dir, db) = setup().await;
    let group = db.create_group("Both Floors").await.unwrap();
    let first = db.create_screen("First", group.id).await.unwrap();
    let second = db.create_screen("Second", group.id).await.unwrap();

    let a1 = add_picture(&db, first.id).await;
    let b1 = add_picture(&db, second.id).await;
    let a2 = add_picture(&db, first.id).await;
    let b2 = add_picture(&db, second.id).await;

    // Positions count per screen, not globally.
    assert_eq!((a1.position, a2.position), (1, 2));
    assert_eq!((b1.position, b2.position), (1, 2));

    // A move on one screen leaves the other untouched.
    db.move_picture(a2.id, 1).await.unwrap();
    assert_eq!(ids_in_order(&db, first.id).await, vec![a2.id, a1.id]);
    assert_eq!(ids_in_order(&db, second.id).await, vec![b1.id, b2.id]);
}

#[tokio::test]
async fn position_used_check_can_exclude_a_picture() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let picture = add_picture(&db, screen_id).await;

    assert!(db.is_position_used(screen_id, 1, None).await.unwrap());
    assert!(!db.is_position_used(screen_id, 2, None).await.unwrap());
    // The picture itself does not count when editing in place.
    assert!(!db
        .is_position_used(screen_id, 1, Some(picture.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn gaps_are_reported_and_compacted() {
    let (_dir, db) = setup().await;
    let screen_id = setup_screen(&db).await;

    let p1 = add_picture(&db, screen_id).await;
    let p2 = add_picture(&db, screen_id).await;
    let p3 = add_picture(&db, screen_id).await;

    // A healthy screen has no gaps.
    assert!(db.find_position_gaps(screen_id).await.unwrap().is_empty());

    // Corrupt the ordering behind the repository's back: [1, 3, 7].
    sqlx::query("UPDATE pictures SET position = 3 WHERE id = ?")
        .bind(p2.id)
        .execute(&db.pool)
        .await
        .unwrap();
    sqlx::query("UPDATE pictures SET position = 7 WHERE id = ?")
        .bind(p3.id)
        .execute(&db.pool)
        .await
        .unwrap();

    assert_eq!(
        db.find_position_gaps(screen_id).await.unwrap(),
        vec![2, 4, 5, 6]
    );

    db.compact_positions(screen_id).await.unwrap();
    assert_dense(&db, screen_id).await;
    // Ascending order is preserved through the repair.
    assert_eq!(ids_in_order(&db, screen_id).await, vec![p1.id, p2.id, p3.id]);
    assert!(db.find_position_gaps(screen_id).await.unwrap().is_empty());
}
