use rusqlite::{params, Connection};

/// Subscribe `user_id` to `author_id`. Returns whether a row was created;
/// following twice is a no-op.
pub fn follow(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (user_id, author_id) VALUES (?1, ?2)",
        params![user_id, author_id],
    )?;
    Ok(inserted > 0)
}

/// Remove the subscription if present. Returns whether a row was deleted.
pub fn unfollow(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
    )?;
    Ok(deleted > 0)
}

pub fn is_following(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
        |row| row.get(0),
    )
}

pub fn follower_count(conn: &Connection, author_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE author_id = ?1",
        params![author_id],
        |row| row.get(0),
    )
}
