use std::path::{Component, Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::io::AsyncWriteExt;

use crate::forms::UploadedImage;

/// Subdirectory of the media root post images are stored in.
pub const POST_IMAGE_DIR: &str = "posts";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid media path: {0}")]
    InvalidPath(String),
}

/// Reduce a client-supplied file name to a safe basename.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

fn with_suffix(file_name: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{file_name}_{suffix}"),
    }
}

/// Write an uploaded post image under the media root and return its path
/// relative to that root (`posts/<name>`). Existing files are never
/// overwritten; a random suffix is added instead.
pub async fn save_post_image(media_root: &Path, image: &UploadedImage) -> Result<String, MediaError> {
    let dir = media_root.join(POST_IMAGE_DIR);
    tokio::fs::create_dir_all(&dir).await?;

    let mut file_name = sanitize_file_name(&image.file_name);
    loop {
        let path = dir.join(&file_name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(&image.data).await?;
                file.flush().await?;
                tracing::debug!("Stored image {}", path.display());
                return Ok(format!("{POST_IMAGE_DIR}/{file_name}"));
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                file_name = with_suffix(&sanitize_file_name(&image.file_name));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Map a relative media path from a URL onto the media root, refusing
/// anything that could escape it.
pub fn resolve(media_root: &Path, relative: &str) -> Result<PathBuf, MediaError> {
    let relative_path = Path::new(relative);
    let safe = !relative.is_empty()
        && relative_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(MediaError::InvalidPath(relative.to_string()));
    }
    Ok(media_root.join(relative_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(name: &str) -> UploadedImage {
        UploadedImage {
            file_name: name.to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_file_name("small.jpeg"), "small.jpeg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\my cat.png"), "my_cat.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[test]
    fn resolve_rejects_traversal() {
        let root = Path::new("/srv/media");
        assert_eq!(
            resolve(root, "posts/a.jpg").unwrap(),
            PathBuf::from("/srv/media/posts/a.jpg")
        );
        assert!(resolve(root, "../secret").is_err());
        assert!(resolve(root, "/etc/passwd").is_err());
        assert!(resolve(root, "").is_err());
    }

    #[tokio::test]
    async fn save_writes_file_under_posts() {
        let tmp = tempfile::tempdir().unwrap();
        let stored = save_post_image(tmp.path(), &image("test_image_1.jpeg")).await.unwrap();
        assert_eq!(stored, "posts/test_image_1.jpeg");
        let bytes = std::fs::read(tmp.path().join(&stored)).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn save_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let first = save_post_image(tmp.path(), &image("cat.jpg")).await.unwrap();
        let second = save_post_image(tmp.path(), &image("cat.jpg")).await.unwrap();
        assert_ne!(first, second);
        assert!(second.starts_with("posts/cat_"));
        assert!(second.ends_with(".jpg"));
        assert!(tmp.path().join(&first).exists());
        assert!(tmp.path().join(&second).exists());
    }
}
