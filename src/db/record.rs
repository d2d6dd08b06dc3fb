//! Traits tying each table's row type to its write payload.
//!
//! A `Record` is what a table returns; a `Draft` is the validated body of a
//! create or full-replace update. Both store backends are written once against
//! these traits, so per-table code is limited to column lists and metadata.

use std::cmp::Ordering;

use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgRow, query_builder::Separated, FromRow, Postgres};

use crate::error::AppError;
use crate::validation::{is_valid_slug, Validate};

pub trait Record:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    const TABLE: &'static str;
    /// SQL ordering; `display_cmp` must agree with it.
    const ORDER_BY: &'static str = "id ASC";
    /// Column (and JSON key) holding a per-table unique natural key.
    const UNIQUE: Option<&'static str> = None;
    /// At most one row may exist.
    const SINGLETON: bool = false;
    const HAS_ACTIVE: bool = false;
    const HAS_CATEGORY: bool = false;
    /// `(json key, referenced table)` pairs that must point at an existing row.
    const REFERENCES: &'static [(&'static str, &'static str)] = &[];
    /// `(table, json key)` pairs cleared to null when a row of this table is deleted.
    const DETACH_ON_DELETE: &'static [(&'static str, &'static str)] = &[];

    fn id(&self) -> i64;

    fn active(&self) -> bool {
        true
    }

    fn category(&self) -> Option<&str> {
        None
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }

    /// Put nested collections into display order after loading.
    fn normalize(&mut self) {}
}

pub trait Draft: Serialize + DeserializeOwned + Validate + Send + Sync + 'static {
    type Record: Record;

    /// Columns written by `push_values`, in the same order.
    const COLUMNS: &'static [&'static str];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>);

    /// Normalise the payload (trim, derive slugs, fill defaults) before validation.
    fn prepare(&mut self) {}
}

/// Sort by `order` ascending, then insertion id.
pub fn by_order_then_id(a: (i32, i64), b: (i32, i64)) -> Ordering {
    a.0.cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Filter and window applied to list reads.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub active_only: bool,
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ListFilter {
    pub fn public() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    pub fn admin() -> Self {
        Self::default()
    }
}

/// How a detail route addresses a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Id(i64),
    Unique(String),
}

impl Lookup {
    /// Purely numeric keys are ids; anything else must be a valid slug of a
    /// table that has one.
    pub fn parse<R: Record>(raw: &str) -> Result<Self, AppError> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw
                .parse::<i64>()
                .map(Lookup::Id)
                .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", raw)));
        }
        if R::UNIQUE.is_none() {
            return Err(AppError::BadRequest(format!("invalid id '{}'", raw)));
        }
        if !is_valid_slug(raw) {
            return Err(AppError::BadRequest(
                "slug must contain only lowercase letters, numbers, and hyphens".to_string(),
            ));
        }
        Ok(Lookup::Unique(raw.to_string()))
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lookup::Id(id) => write!(f, "id {}", id),
            Lookup::Unique(key) => write!(f, "'{}'", key),
        }
    }
}
