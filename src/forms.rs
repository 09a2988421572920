// Form cleaning for post, comment and group submissions
//
// Each form deserializes from an urlencoded body, then `clean` either yields
// normalized values ready for the store or a set of per-field messages the
// handler hands back with the re-rendered form.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AppResult;
use crate::infrastructure::database::ContentStore;
use crate::models::{GroupId, Lookup, NewGroup};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const INVALID_SLUG: &str =
    "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.";

pub const GROUP_TITLE_MAX: usize = 200;
pub const GROUP_SLUG_MAX: usize = 255;
pub const IMAGE_UPLOAD_DIR: &str = "posts/";

const IMAGE_EXTENSIONS: &[&str] = &["bmp", "gif", "jpeg", "jpg", "png", "webp"];

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

/// Field name → messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

/// What a submitted post form wants done with the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Clear,
    Set(String),
}

impl ImageChange {
    pub fn apply(self, current: Option<String>) -> Option<String> {
        match self {
            ImageChange::Keep => current,
            ImageChange::Clear => None,
            ImageChange::Set(path) => Some(path),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, rename = "image-clear")]
    pub image_clear: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: ImageChange,
}

impl PostForm {
    pub async fn clean(&self, store: &dyn ContentStore) -> AppResult<Result<CleanPost, FormErrors>> {
        let mut errors = FormErrors::default();

        let text = clean_required_text(self.text.as_deref(), "text", &mut errors);

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<GroupId>() {
                Ok(id) => match store.get_group(id).await? {
                    Lookup::Found(group) => Some(group.id),
                    Lookup::NotFound => {
                        errors.add("group", INVALID_CHOICE);
                        None
                    }
                },
                Err(_) => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            },
        };

        let image = match self.image.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => match clean_image_path(path) {
                Some(path) => ImageChange::Set(path),
                None => {
                    errors.add("image", INVALID_IMAGE);
                    ImageChange::Keep
                }
            },
            _ if is_checked(self.image_clear.as_deref()) => ImageChange::Clear,
            _ => ImageChange::Keep,
        };

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        Ok(Ok(CleanPost {
            text,
            group_id,
            image,
        }))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: Option<String>,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let text = clean_required_text(self.text.as_deref(), "text", &mut errors);
        if errors.is_empty() {
            Ok(text)
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupForm {
    pub title: String,
    pub description: String,
    pub slug: String,
}

impl GroupForm {
    pub fn clean(&self) -> Result<NewGroup, FormErrors> {
        let mut errors = FormErrors::default();

        let title = clean_required_text(Some(&self.title), "title", &mut errors);
        if title.chars().count() > GROUP_TITLE_MAX {
            errors.add(
                "title",
                format!("Ensure this value has at most {} characters.", GROUP_TITLE_MAX),
            );
        }

        let description = clean_required_text(Some(&self.description), "description", &mut errors);

        let slug = self.slug.trim().to_string();
        if slug.is_empty() {
            errors.add("slug", REQUIRED);
        } else if !is_valid_slug(&slug) {
            errors.add("slug", INVALID_SLUG);
        } else if slug.len() > GROUP_SLUG_MAX {
            errors.add(
                "slug",
                format!("Ensure this value has at most {} characters.", GROUP_SLUG_MAX),
            );
        }

        if errors.is_empty() {
            Ok(NewGroup {
                title,
                description,
                slug,
            })
        } else {
            Err(errors)
        }
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

fn clean_required_text(raw: Option<&str>, field: &str, errors: &mut FormErrors) -> String {
    let text = raw.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        errors.add(field, REQUIRED);
    }
    text.to_string()
}

/// Relative path under the upload directory with an image extension.
fn clean_image_path(path: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    let name = path.strip_prefix(IMAGE_UPLOAD_DIR)?;
    if name.is_empty() || name.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return None;
    }

    let extension = name.rsplit_once('.')?.1.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    Some(path)
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("on" | "true" | "1"))
}
