use std::fmt;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::TIMESTAMP_FORMAT;

/// Number of characters a post shows when displayed in a list or admin line.
pub const POST_DISPLAY_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// A post joined with its author and (optional) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: String,
    /// Path relative to the media root, e.g. `posts/cat.jpg`
    pub image: Option<String>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
}

impl Post {
    /// Creation date as shown on post cards, e.g. `5 Jan 2026`.
    pub fn display_date(&self) -> String {
        NaiveDateTime::parse_from_str(&self.created_at, TIMESTAMP_FORMAT)
            .map(|dt| dt.format("%-d %b %Y").to_string())
            .unwrap_or_else(|_| self.created_at.clone())
    }

    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|path| format!("/media/{}", path))
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.text.chars().take(POST_DISPLAY_CHARS).collect();
        f.write_str(&short)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: String,
    pub author: AuthorRef,
}

impl Comment {
    pub fn relative_time(&self) -> String {
        NaiveDateTime::parse_from_str(&self.created_at, TIMESTAMP_FORMAT)
            .map(|dt| format_relative_time(&dt))
            .unwrap_or_else(|_| self.created_at.clone())
    }
}

/// "just now", "5m ago", "3h ago", "2d ago", then a plain date.
pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let diff = Utc::now().naive_utc().signed_duration_since(*dt);

    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }
    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%-d %b %Y").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}
