use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::User;

const USER_COLUMNS: &str = "id, username, is_admin, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        is_admin: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Insert a user and return its id. Fails with a constraint error when the
/// username is taken.
pub fn create_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    is_admin: bool,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (username, password_hash, is_admin) VALUES (?1, ?2, ?3)",
        params![username, password_hash, is_admin],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        params![username],
        user_from_row,
    )
    .optional()
}

pub fn username_taken(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
}

/// Look up a user together with the stored password hash.
pub fn find_credentials(
    conn: &Connection,
    username: &str,
) -> rusqlite::Result<Option<(User, String)>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
        params![username],
        |row| Ok((user_from_row(row)?, row.get(4)?)),
    )
    .optional()
}
