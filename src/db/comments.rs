use rusqlite::{params, Connection};

use crate::db::models::{AuthorRef, Comment};

pub fn create_comment(
    conn: &Connection,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO comments (post_id, author_id, text) VALUES (?1, ?2, ?3)",
        params![post_id, author_id, text],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Comments on a post, newest first.
pub fn list_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.post_id, c.text, c.created_at, u.id, u.username
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at DESC, c.id DESC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                text: row.get(2)?,
                created_at: row.get(3)?,
                author: AuthorRef {
                    id: row.get(4)?,
                    username: row.get(5)?,
                },
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{posts, test_pool, users};

    #[test]
    fn comments_listed_newest_first_per_post() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let author = users::create_user(&conn, "auth", "x", false).unwrap();
        let reader = users::create_user(&conn, "reader", "x", false).unwrap();
        let post = posts::create_post(&conn, author, "post", None, None).unwrap();
        let other = posts::create_post(&conn, author, "other", None, None).unwrap();

        create_comment(&conn, post, reader, "first").unwrap();
        create_comment(&conn, post, author, "second").unwrap();
        create_comment(&conn, other, reader, "elsewhere").unwrap();

        let comments = list_for_post(&conn, post).unwrap();
        let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
        assert_eq!(comments[1].author.username, "reader");
        assert!(comments.iter().all(|c| c.post_id == post));
    }

    #[test]
    fn comment_requires_existing_post() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let author = users::create_user(&conn, "auth", "x", false).unwrap();
        assert!(create_comment(&conn, 999, author, "orphan").is_err());
    }
}
