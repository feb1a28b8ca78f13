//! Validation of user-submitted forms.
//!
//! Forms only check and normalize what the client sent. They never carry an
//! author: handlers stamp the author (and the target post for comments) from
//! the authenticated session before anything is persisted.

use std::collections::BTreeMap;

use axum::extract::multipart::{Multipart, MultipartError};
use serde::Deserialize;

use crate::db::models::Group;

pub const REQUIRED_TEXT: &str = "Please fill in this field.";
pub const INVALID_GROUP: &str = "Select a valid group.";
pub const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_IMAGE: &str = "The submitted file is empty.";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const MAX_USERNAME_CHARS: usize = 150;
const MIN_PASSWORD_CHARS: usize = 8;

/// Field-level validation messages, keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedImage {
    fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    fn check(&self) -> Result<(), &'static str> {
        if self.data.is_empty() {
            return Err(EMPTY_IMAGE);
        }
        let known_extension = self
            .extension()
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
        let guessed_image = mime_guess::from_path(&self.file_name)
            .first()
            .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE);
        let declared_ok = self
            .content_type
            .as_deref()
            .map_or(true, |ct| ct.starts_with("image/"));
        if known_extension && guessed_image && declared_ok {
            Ok(())
        } else {
            Err(INVALID_IMAGE)
        }
    }
}

/// What an accepted post submission does to the stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Replace(UploadedImage),
    Clear,
}

/// Raw post form as submitted (multipart: text, group, image, clear_image).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<UploadedImage>,
    pub clear_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = PostForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => form.text = field.text().await?,
                "group" => {
                    let value = field.text().await?;
                    let value = value.trim();
                    form.group = (!value.is_empty()).then(|| value.to_string());
                }
                "image" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await?;
                    // Browsers send an empty, unnamed part when no file was picked
                    if !file_name.is_empty() || !data.is_empty() {
                        form.image = Some(UploadedImage {
                            file_name,
                            content_type,
                            data: data.to_vec(),
                        });
                    }
                }
                "clear_image" => {
                    field.text().await?;
                    form.clear_image = true;
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Validate against the groups that currently exist. On failure the form
    /// is handed back so it can be re-rendered with the user's input.
    pub fn validate(self, groups: &[Group]) -> Result<ValidPost, (PostForm, FormErrors)> {
        let mut errors = FormErrors::default();

        let text = self.text.trim().to_string();
        if text.is_empty() {
            errors.add("text", REQUIRED_TEXT);
        }

        let group_id = match self.group.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_GROUP);
                    None
                }
            },
        };

        if let Some(image) = &self.image {
            if let Err(message) = image.check() {
                errors.add("image", message);
            }
        }

        if !errors.is_empty() {
            return Err((self, errors));
        }

        let image = match (self.image, self.clear_image) {
            (Some(upload), _) => ImageChange::Replace(upload),
            (None, true) => ImageChange::Clear,
            (None, false) => ImageChange::Keep,
        };

        Ok(ValidPost {
            text,
            group_id,
            image,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidComment {
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<ValidComment, FormErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FormErrors::default();
            errors.add("text", REQUIRED_TEXT);
            return Err(errors);
        }
        Ok(ValidComment {
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl SignupForm {
    /// Shape checks only; whether the username is taken is up to the caller.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", REQUIRED_TEXT);
        } else if username.chars().count() > MAX_USERNAME_CHARS
            || !username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. It may contain letters, digits and @/./+/-/_ only.",
            );
        }

        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            errors.add(
                "password",
                format!("The password must contain at least {MIN_PASSWORD_CHARS} characters."),
            );
        } else if self.password != self.password_confirm {
            errors.add("password_confirm", "The two password fields didn't match.");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}
