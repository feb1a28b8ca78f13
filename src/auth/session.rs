use axum::http::{header, HeaderMap};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: i64, hours: u64) -> rusqlite::Result<String> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// The user behind an unexpired session token.
pub fn find_user_by_token(conn: &Connection, token: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT u.id, u.username, u.is_admin, u.created_at FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token = ?1 AND s.expires_at > datetime('now')",
        params![token],
        |row| {
            Ok(User {
                id: row.get(0)?,
                username: row.get(1)?,
                is_admin: row.get(2)?,
                created_at: row.get(3)?,
            })
        },
    )
    .optional()
}

/// Generate a cryptographically random 32-byte hex token.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            (key.trim() == name).then(|| val.trim())
        })
}
