use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use crate::db::models::{AuthorRef, GroupRef, Post};
use crate::pagination::{Page, PageWindow};

/// Which posts a listing shows. Every listing is newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl PostFilter {
    fn where_clause(&self) -> (&'static str, Option<i64>) {
        match self {
            PostFilter::All => ("", None),
            PostFilter::Group(id) => ("WHERE p.group_id = ?1", Some(*id)),
            PostFilter::Author(id) => ("WHERE p.author_id = ?1", Some(*id)),
            PostFilter::FollowedBy(id) => (
                "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?1)",
                Some(*id),
            ),
        }
    }
}

const POST_SELECT: &str = "SELECT p.id, p.text, p.created_at, p.image,
            u.id, u.username,
            g.id, g.title, g.slug
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN post_groups g ON g.id = p.group_id";

const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    let group_id: Option<i64> = row.get(6)?;
    let group = match group_id {
        Some(id) => Some(GroupRef {
            id,
            title: row.get(7)?,
            slug: row.get(8)?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        created_at: row.get(2)?,
        image: row.get(3)?,
        author: AuthorRef {
            id: row.get(4)?,
            username: row.get(5)?,
        },
        group,
    })
}

pub fn count_posts(conn: &Connection, filter: PostFilter) -> rusqlite::Result<u64> {
    let (clause, param) = filter.where_clause();
    let sql = format!("SELECT COUNT(*) FROM posts p {clause}");
    let count: i64 = match param {
        Some(id) => conn.query_row(&sql, params![id], |row| row.get(0))?,
        None => conn.query_row(&sql, [], |row| row.get(0))?,
    };
    Ok(count as u64)
}

pub fn list_posts(
    conn: &Connection,
    filter: PostFilter,
    limit: u64,
    offset: u64,
) -> rusqlite::Result<Vec<Post>> {
    let (clause, param) = filter.where_clause();
    let (limit, offset) = (limit as i64, offset as i64);

    let mut args: Vec<&dyn ToSql> = Vec::with_capacity(3);
    let sql = match &param {
        Some(id) => {
            args.push(id);
            format!("{POST_SELECT} {clause} {NEWEST_FIRST} LIMIT ?2 OFFSET ?3")
        }
        None => format!("{POST_SELECT} {NEWEST_FIRST} LIMIT ?1 OFFSET ?2"),
    };
    args.push(&limit);
    args.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(args.as_slice(), post_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(posts)
}

/// Count, clamp the requested page, then fetch only that page's rows.
pub fn page_of_posts(
    conn: &Connection,
    filter: PostFilter,
    per_page: u64,
    requested: Option<&str>,
) -> rusqlite::Result<Page<Post>> {
    let total = count_posts(conn, filter)?;
    let window = PageWindow::resolve(total, per_page, requested);
    let items = list_posts(conn, filter, window.limit(), window.offset())?;
    Ok(Page::new(window, items))
}

pub fn find_post(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("{POST_SELECT} WHERE p.id = ?1"),
        params![id],
        post_from_row,
    )
    .optional()
}

pub fn create_post(
    conn: &Connection,
    author_id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (text, author_id, group_id, image) VALUES (?1, ?2, ?3, ?4)",
        params![text, author_id, group_id, image],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Update the editable fields of a post. The author is never touched.
pub fn update_post(
    conn: &Connection,
    id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
        params![text, group_id, image, id],
    )?;
    Ok(())
}
