//! Payload validation helpers and slug handling.

use regex::Regex;

use crate::error::{AppError, FieldError};

lazy_static::lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

pub const MAX_SLUG_LEN: usize = 120;

/// All-digit slugs are rejected: detail routes read a numeric key as an id.
pub fn is_valid_slug(slug: &str) -> bool {
    slug.len() <= MAX_SLUG_LEN
        && SLUG_REGEX.is_match(slug)
        && !slug.bytes().all(|b| b.is_ascii_digit())
}

/// Derive a slug from free text: lowercase ASCII alphanumerics joined by single hyphens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Fill an empty slug from the title; trims whatever was supplied.
pub fn ensure_slug(slug: &mut String, title: &str) {
    let trimmed = slug.trim();
    if trimmed.is_empty() {
        *slug = slugify(title);
    } else if trimmed.len() != slug.len() {
        *slug = trimmed.to_string();
    }
}

pub fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Empty optional strings are stored as NULL.
pub fn trim_optional(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        trim_in_place(v);
        if v.is_empty() {
            *value = None;
        }
    }
}

/// Implemented by every write payload. Runs before anything touches the store.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Collects every offending field so a rejection names all of them at once.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.0.push(FieldError::new(field, message));
        self
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.add(field, message);
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "is required")
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.add(field, format!("must be at most {} characters", max));
        }
        self
    }

    pub fn slug(&mut self, field: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.add(field, "is required")
        } else {
            self.check(
                is_valid_slug(value),
                field,
                "must contain only lowercase letters, numbers, and hyphens and not be all digits",
            )
        }
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        let value = value.trim();
        let ok = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            None => false,
        };
        self.check(ok && !value.contains(char::is_whitespace), field, "must be a valid email")
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(v) => self.email(field, v),
            None => self,
        }
    }

    pub fn phone(&mut self, field: &str, value: &str) -> &mut Self {
        let digits = value.chars().filter(|c| c.is_ascii_digit()).count();
        let allowed = value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
        self.check(
            allowed && (7..=15).contains(&digits),
            field,
            "must be a phone number with 7 to 15 digits",
        )
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min || value > max {
            self.add(field, format!("must be between {} and {}", min, max));
        }
        self
    }

    pub fn string_list(&mut self, field: &str, values: &[String], max_items: usize) -> &mut Self {
        if values.len() > max_items {
            self.add(field, format!("must have at most {} entries", max_items));
        }
        if values.iter().any(|v| v.trim().is_empty()) {
            self.add(field, "must not contain empty entries");
        }
        self
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}
