use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::Group;

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Slugs are URL path segments: ASCII letters, digits, `-` and `_`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn create_group(
    conn: &Connection,
    title: &str,
    slug: &str,
    description: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
        params![title, slug, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
        params![slug],
        group_from_row,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        "SELECT id, title, slug, description FROM post_groups WHERE id = ?1",
        params![id],
        group_from_row,
    )
    .optional()
}

/// All groups, for the group picker on the post form.
pub fn list_groups(conn: &Connection) -> rusqlite::Result<Vec<Group>> {
    let mut stmt =
        conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")?;
    let groups = stmt
        .query_map([], group_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(groups)
}
