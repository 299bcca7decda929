//! Input forms and their field-level validation.
//!
//! Every form deserializes with missing fields defaulted to empty strings so a
//! missing field is reported as a field error rather than a decoding failure.
//! Rules are declared with `validator` and run on a trimmed copy of the form;
//! the resulting `ValidationErrors` are rendered into [`FormErrors`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

use crate::domain::{PostStatus, slugify};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Field name to error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let messages = self.0.entry(field.into()).or_default();
        let message = message.into();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors.iter().map(message_for).collect();
            // A missing value reports only that it is missing.
            let missing = messages.iter().any(|m| m == REQUIRED);
            for message in messages {
                if !missing || message == REQUIRED {
                    form_errors.add(field.to_string(), message);
                }
            }
        }
        form_errors
    }
}

fn max_length_message(max: u64, len: usize) -> String {
    format!("Ensure this value has at most {} characters (it has {}).", max, len)
}

fn message_for(error: &ValidationError) -> String {
    match error.code.as_ref() {
        "length" => {
            let value = error
                .params
                .get("value")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            match error.params.get("max").and_then(|m| m.as_u64()) {
                Some(max) if !value.is_empty() => max_length_message(max, value.chars().count()),
                _ => REQUIRED.to_string(),
            }
        }
        "email" => INVALID_EMAIL.to_string(),
        code => error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Invalid value ({}).", code)),
    }
}

/// Mail domains must end in an alphabetic top-level label of two or more
/// letters (or a punycode label), so `a@b.c` and `a@1.2` are rejected.
fn public_domain(value: &str) -> Result<(), ValidationError> {
    let tld = value
        .rsplit_once('@')
        .and_then(|(_, domain)| domain.rsplit_once('.'))
        .map(|(_, tld)| tld);

    match tld {
        Some(tld) if tld.starts_with("xn--") && tld.len() > 4 => Ok(()),
        Some(tld) if tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()) => Ok(()),
        _ => Err(ValidationError::new("email")),
    }
}

/// Maximum length of a single tag name.
pub const TAG_MAX: usize = 100;

fn tag_names(tags: &[String]) -> Result<(), ValidationError> {
    if tags
        .iter()
        .all(|tag| tag.validate_length(None, Some(TAG_MAX as u64), None))
    {
        return Ok(());
    }

    Err(ValidationError::new("tag_length").with_message(
        format!("Ensure each tag has at most {} characters.", TAG_MAX).into(),
    ))
}

/// Reader's comment on a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(length(min = 1), email, custom(function = "public_domain"))]
    pub email: String,
    #[validate(length(min = 1))]
    pub body: String,
}

/// A comment form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidComment {
    pub name: String,
    pub email: String,
    pub body: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<ValidComment, FormErrors> {
        let cleaned = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            body: self.body.trim().to_string(),
        };
        Validate::validate(&cleaned)?;

        Ok(ValidComment {
            name: cleaned.name,
            email: cleaned.email,
            body: cleaned.body,
        })
    }
}

/// Recommend a post to someone by email.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EmailPostForm {
    #[validate(length(min = 1, max = 25))]
    pub name: String,
    #[validate(length(min = 1), email, custom(function = "public_domain"))]
    pub email: String,
    #[validate(length(min = 1), email, custom(function = "public_domain"))]
    pub to: String,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidShare {
    pub name: String,
    pub email: String,
    pub to: String,
    pub comments: String,
}

impl EmailPostForm {
    pub fn clean(&self) -> Result<ValidShare, FormErrors> {
        let cleaned = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            to: self.to.trim().to_string(),
            comments: self.comments.trim().to_string(),
        };
        Validate::validate(&cleaned)?;

        Ok(ValidShare {
            name: cleaned.name,
            email: cleaned.email,
            to: cleaned.to,
            comments: cleaned.comments,
        })
    }
}

/// Author's post editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    /// Derived from the title when left blank.
    pub slug: String,
    pub body: String,
    pub status: Option<PostStatus>,
    pub publish: Option<DateTime<Utc>>,
    #[validate(custom(function = "tag_names"))]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub status: PostStatus,
    pub publish: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl PostForm {
    pub const SLUG_MAX: usize = 250;

    pub fn clean(&self) -> Result<ValidPost, FormErrors> {
        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
                tags.push(tag.to_string());
            }
        }

        let cleaned = Self {
            title: self.title.trim().to_string(),
            slug: self.slug.trim().to_string(),
            tags,
            ..self.clone()
        };
        let mut errors = match Validate::validate(&cleaned) {
            Ok(()) => FormErrors::new(),
            Err(e) => e.into(),
        };

        let slug = if cleaned.slug.is_empty() {
            slugify(&cleaned.title)
        } else {
            slugify(&cleaned.slug)
        };
        if slug.is_empty() {
            if !cleaned.title.is_empty() {
                errors.add(
                    "slug",
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
                );
            }
        } else if !slug.validate_length(None, Some(Self::SLUG_MAX as u64), None) {
            errors.add(
                "slug",
                max_length_message(Self::SLUG_MAX as u64, slug.chars().count()),
            );
        }

        errors.into_result(ValidPost {
            title: cleaned.title,
            slug,
            body: cleaned.body,
            status: cleaned.status.unwrap_or_default(),
            publish: cleaned.publish,
            tags: cleaned.tags,
        })
    }
}
