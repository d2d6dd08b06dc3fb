//! Content rows and their write payloads. Rows serialise camelCase for the API;
//! drafts are the validated bodies of POST and PUT.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, types::Json, FromRow, Postgres};
use thiserror::Error;

use super::record::{by_order_then_id, Draft, Record};
use crate::error::AppError;
use crate::validation::{ensure_slug, trim_in_place, trim_optional, Validate, Violations};

const MAX_TITLE: usize = 200;
const MAX_TEXT: usize = 20_000;
const MAX_LIST: usize = 50;

fn default_true() -> bool {
    true
}

fn is_link(value: &str) -> bool {
    ["/", "#", "http://", "https://", "mailto:", "tel:"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

// ============================================================================
// Status enumerations
// ============================================================================

#[derive(Debug, Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

/// Lifecycle of an inbound inquiry. Stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContactStatus {
    #[default]
    #[serde(rename = "New", alias = "new")]
    New,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "New",
            ContactStatus::Pending => "pending",
            ContactStatus::InProgress => "in-progress",
            ContactStatus::Completed => "completed",
        }
    }
}

impl TryFrom<String> for ContactStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "New" | "new" => Ok(ContactStatus::New),
            "pending" => Ok(ContactStatus::Pending),
            "in-progress" => Ok(ContactStatus::InProgress),
            "completed" => Ok(ContactStatus::Completed),
            _ => Err(UnknownStatus(value)),
        }
    }
}

/// Lifecycle of a tracked engagement. Stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventStatus {
    #[default]
    #[serde(rename = "Upcoming", alias = "upcoming")]
    Upcoming,
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "Upcoming",
            EventStatus::Pending => "pending",
            EventStatus::InProgress => "in-progress",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<String> for EventStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Upcoming" | "upcoming" => Ok(EventStatus::Upcoming),
            "pending" => Ok(EventStatus::Pending),
            "in-progress" => Ok(EventStatus::InProgress),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            _ => Err(UnknownStatus(value)),
        }
    }
}

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFeature {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStep {
    #[serde(rename = "order", default)]
    pub step_order: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Service model. Features and process steps live in child tables and are
/// attached after the row is loaded.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub banner_url: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub features: Vec<ServiceFeature>,
    #[sqlx(skip)]
    #[serde(default)]
    pub process_steps: Vec<ProcessStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Service {
    const TABLE: &'static str = "services";
    const UNIQUE: Option<&'static str> = Some("slug");
    const DETACH_ON_DELETE: &'static [(&'static str, &'static str)] =
        &[("gallery_items", "serviceId")];

    fn id(&self) -> i64 {
        self.id
    }

    fn normalize(&mut self) {
        // Stable: equal orders keep insertion sequence.
        self.process_steps.sort_by_key(|s| s.step_order);
    }
}

/// Create/replace payload for a service, including its child lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default, alias = "banner")]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub features: Vec<ServiceFeature>,
    #[serde(default)]
    pub process_steps: Vec<ProcessStep>,
}

impl Validate for ServiceDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.slug("slug", &self.slug)
            .required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE)
            .max_len("description", &self.description, MAX_TEXT);
        v.check(
            self.features.len() <= MAX_LIST,
            "features",
            "has too many entries",
        );
        v.check(
            self.process_steps.len() <= MAX_LIST,
            "processSteps",
            "has too many entries",
        );
        for (i, f) in self.features.iter().enumerate() {
            v.required(&format!("features[{}].title", i), &f.title);
        }
        for (i, s) in self.process_steps.iter().enumerate() {
            v.required(&format!("processSteps[{}].title", i), &s.title);
            v.check(
                s.step_order >= 0,
                &format!("processSteps[{}].order", i),
                "must not be negative",
            );
        }
        v.finish()
    }
}

impl Draft for ServiceDraft {
    type Record = Service;
    const COLUMNS: &'static [&'static str] =
        &["slug", "title", "description", "image_url", "banner_url"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.slug.clone())
            .push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(self.image_url.clone())
            .push_bind(self.banner_url.clone());
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.title);
        ensure_slug(&mut self.slug, &self.title);
        trim_optional(&mut self.image_url);
        trim_optional(&mut self.banner_url);
        for f in &mut self.features {
            trim_in_place(&mut f.title);
            trim_optional(&mut f.description);
        }
        for s in &mut self.process_steps {
            trim_in_place(&mut s.title);
            trim_optional(&mut s.description);
        }
    }
}

// ============================================================================
// Gallery
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    #[serde(rename = "event")]
    pub event_name: Option<String>,
    #[serde(rename = "date")]
    pub taken_on: Option<NaiveDate>,
    pub image_url: String,
    pub service_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for GalleryItem {
    const TABLE: &'static str = "gallery_items";
    const ORDER_BY: &'static str = "id DESC";
    const HAS_CATEGORY: bool = true;
    const REFERENCES: &'static [(&'static str, &'static str)] = &[("serviceId", "services")];

    fn id(&self) -> i64 {
        self.id
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        other.id.cmp(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "event", default)]
    pub event_name: Option<String>,
    #[serde(rename = "date", default)]
    pub taken_on: Option<NaiveDate>,
    #[serde(default, alias = "image")]
    pub image_url: String,
    #[serde(default)]
    pub service_id: Option<i64>,
}

impl Validate for GalleryDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE)
            .required("category", &self.category)
            .max_len("category", &self.category, 80)
            .required("imageUrl", &self.image_url);
        v.finish()
    }
}

impl Draft for GalleryDraft {
    type Record = GalleryItem;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "category",
        "description",
        "event_name",
        "taken_on",
        "image_url",
        "service_id",
    ];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.title.clone())
            .push_bind(self.category.clone())
            .push_bind(self.description.clone())
            .push_bind(self.event_name.clone())
            .push_bind(self.taken_on)
            .push_bind(self.image_url.clone())
            .push_bind(self.service_id);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.category);
        trim_in_place(&mut self.image_url);
        trim_optional(&mut self.description);
        trim_optional(&mut self.event_name);
    }
}

// ============================================================================
// Slides
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    pub primary_cta_text: Option<String>,
    pub primary_cta_link: Option<String>,
    pub secondary_cta_text: Option<String>,
    pub secondary_cta_link: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Slide {
    const TABLE: &'static str = "slides";
    const ORDER_BY: &'static str = "display_order ASC, id ASC";
    const HAS_ACTIVE: bool = true;

    fn id(&self) -> i64 {
        self.id
    }

    fn active(&self) -> bool {
        self.active
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        by_order_then_id((self.display_order, self.id), (other.display_order, other.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: String,
    #[serde(default)]
    pub primary_cta_text: Option<String>,
    #[serde(default)]
    pub primary_cta_link: Option<String>,
    #[serde(default)]
    pub secondary_cta_text: Option<String>,
    #[serde(default)]
    pub secondary_cta_link: Option<String>,
    #[serde(rename = "order", default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn check_cta(v: &mut Violations, prefix: &str, text: &Option<String>, link: &Option<String>) {
    match (text, link) {
        (Some(_), None) => {
            v.add(&format!("{}CtaLink", prefix), "is required when the CTA has text");
        }
        (None, Some(_)) => {
            v.add(&format!("{}CtaText", prefix), "is required when the CTA has a link");
        }
        (Some(_), Some(link)) => {
            v.check(
                is_link(link),
                &format!("{}CtaLink", prefix),
                "must be a path or an http(s) URL",
            );
        }
        (None, None) => {}
    }
}

impl Validate for SlideDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE)
            .required("imageUrl", &self.image_url);
        check_cta(&mut v, "primary", &self.primary_cta_text, &self.primary_cta_link);
        check_cta(&mut v, "secondary", &self.secondary_cta_text, &self.secondary_cta_link);
        v.finish()
    }
}

impl Draft for SlideDraft {
    type Record = Slide;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "subtitle",
        "description",
        "image_url",
        "primary_cta_text",
        "primary_cta_link",
        "secondary_cta_text",
        "secondary_cta_link",
        "display_order",
        "active",
    ];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.title.clone())
            .push_bind(self.subtitle.clone())
            .push_bind(self.description.clone())
            .push_bind(self.image_url.clone())
            .push_bind(self.primary_cta_text.clone())
            .push_bind(self.primary_cta_link.clone())
            .push_bind(self.secondary_cta_text.clone())
            .push_bind(self.secondary_cta_link.clone())
            .push_bind(self.display_order)
            .push_bind(self.active);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.image_url);
        trim_optional(&mut self.subtitle);
        trim_optional(&mut self.description);
        trim_optional(&mut self.primary_cta_text);
        trim_optional(&mut self.primary_cta_link);
        trim_optional(&mut self.secondary_cta_text);
        trim_optional(&mut self.secondary_cta_link);
    }
}

// ============================================================================
// Technologies
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technology {
    pub id: i64,
    pub icon: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Technology {
    const TABLE: &'static str = "technologies";
    const ORDER_BY: &'static str = "display_order ASC, id ASC";
    const HAS_ACTIVE: bool = true;

    fn id(&self) -> i64 {
        self.id
    }

    fn active(&self) -> bool {
        self.active
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        by_order_then_id((self.display_order, self.id), (other.display_order, other.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyDraft {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "order", default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Validate for TechnologyDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("icon", &self.icon)
            .required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE)
            .max_len("description", &self.description, 2_000);
        v.finish()
    }
}

impl Draft for TechnologyDraft {
    type Record = Technology;
    const COLUMNS: &'static [&'static str] =
        &["icon", "title", "description", "display_order", "active"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.icon.clone())
            .push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(self.display_order)
            .push_bind(self.active);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.icon);
        trim_in_place(&mut self.title);
    }
}

// ============================================================================
// Testimonials
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: i64,
    pub content: String,
    pub author_name: String,
    pub author_title: Option<String>,
    pub author_avatar: Option<String>,
    pub rating: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Testimonial {
    const TABLE: &'static str = "testimonials";
    const ORDER_BY: &'static str = "id DESC";
    const HAS_ACTIVE: bool = true;

    fn id(&self) -> i64 {
        self.id
    }

    fn active(&self) -> bool {
        self.active
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        other.id.cmp(&self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialDraft {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_title: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub rating: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Validate for TestimonialDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("content", &self.content)
            .max_len("content", &self.content, 5_000)
            .required("authorName", &self.author_name)
            .range("rating", self.rating as i64, 1, 5);
        v.finish()
    }
}

impl Draft for TestimonialDraft {
    type Record = Testimonial;
    const COLUMNS: &'static [&'static str] = &[
        "content",
        "author_name",
        "author_title",
        "author_avatar",
        "rating",
        "active",
    ];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.content.clone())
            .push_bind(self.author_name.clone())
            .push_bind(self.author_title.clone())
            .push_bind(self.author_avatar.clone())
            .push_bind(self.rating)
            .push_bind(self.active);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.content);
        trim_in_place(&mut self.author_name);
        trim_optional(&mut self.author_title);
        trim_optional(&mut self.author_avatar);
    }
}

// ============================================================================
// About (singleton) and its ordered lists
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub id: i64,
    pub mission: String,
    pub vision: String,
    pub history: String,
    pub team_description: String,
    pub quality_description: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for About {
    const TABLE: &'static str = "about";
    const SINGLETON: bool = true;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutDraft {
    #[serde(default)]
    pub mission: String,
    #[serde(default)]
    pub vision: String,
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub team_description: String,
    #[serde(default)]
    pub quality_description: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Validate for AboutDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("mission", &self.mission)
            .required("vision", &self.vision)
            .max_len("mission", &self.mission, MAX_TEXT)
            .max_len("vision", &self.vision, MAX_TEXT)
            .max_len("history", &self.history, MAX_TEXT)
            .max_len("teamDescription", &self.team_description, MAX_TEXT)
            .max_len("qualityDescription", &self.quality_description, MAX_TEXT)
            .string_list("images", &self.images, MAX_LIST);
        v.finish()
    }
}

impl Draft for AboutDraft {
    type Record = About;
    const COLUMNS: &'static [&'static str] = &[
        "mission",
        "vision",
        "history",
        "team_description",
        "quality_description",
        "images",
    ];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.mission.clone())
            .push_bind(self.vision.clone())
            .push_bind(self.history.clone())
            .push_bind(self.team_description.clone())
            .push_bind(self.quality_description.clone())
            .push_bind(self.images.clone());
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.mission);
        trim_in_place(&mut self.vision);
        trim_in_place(&mut self.history);
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for TeamMember {
    const TABLE: &'static str = "about_team";
    const ORDER_BY: &'static str = "display_order ASC, id ASC";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        by_order_then_id((self.display_order, self.id), (other.display_order, other.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(rename = "order", default)]
    pub display_order: i32,
}

impl Validate for TeamMemberDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("name", &self.name)
            .max_len("name", &self.name, MAX_TITLE)
            .required("role", &self.role)
            .max_len("role", &self.role, MAX_TITLE);
        v.finish()
    }
}

impl Draft for TeamMemberDraft {
    type Record = TeamMember;
    const COLUMNS: &'static [&'static str] = &["name", "role", "bio", "image_url", "display_order"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.name.clone())
            .push_bind(self.role.clone())
            .push_bind(self.bio.clone())
            .push_bind(self.image_url.clone())
            .push_bind(self.display_order);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.role);
        trim_optional(&mut self.bio);
        trim_optional(&mut self.image_url);
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutValue {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for AboutValue {
    const TABLE: &'static str = "about_values";
    const ORDER_BY: &'static str = "display_order ASC, id ASC";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        by_order_then_id((self.display_order, self.id), (other.display_order, other.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutValueDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(rename = "order", default)]
    pub display_order: i32,
}

impl Validate for AboutValueDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE)
            .required("description", &self.description);
        v.finish()
    }
}

impl Draft for AboutValueDraft {
    type Record = AboutValue;
    const COLUMNS: &'static [&'static str] = &["title", "description", "icon", "display_order"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.title.clone())
            .push_bind(self.description.clone())
            .push_bind(self.icon.clone())
            .push_bind(self.display_order);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
        trim_optional(&mut self.icon);
    }
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub id: i64,
    pub label: String,
    pub value: i32,
    pub suffix: Option<String>,
    #[serde(rename = "order")]
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Stat {
    const TABLE: &'static str = "stats";
    const ORDER_BY: &'static str = "display_order ASC, id ASC";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        by_order_then_id((self.display_order, self.id), (other.display_order, other.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatDraft {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(rename = "order", default)]
    pub display_order: i32,
}

impl Validate for StatDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("label", &self.label)
            .max_len("label", &self.label, 80)
            .check(self.value >= 0, "value", "must not be negative");
        if let Some(suffix) = &self.suffix {
            v.max_len("suffix", suffix, 8);
        }
        v.finish()
    }
}

impl Draft for StatDraft {
    type Record = Stat;
    const COLUMNS: &'static [&'static str] = &["label", "value", "suffix", "display_order"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.label.clone())
            .push_bind(self.value)
            .push_bind(self.suffix.clone())
            .push_bind(self.display_order);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.label);
        trim_optional(&mut self.suffix);
    }
}

// ============================================================================
// Blog
// ============================================================================

/// Blog post model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub author_bio: Option<String>,
    pub publish_date: NaiveDate,
    pub category: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for BlogPost {
    const TABLE: &'static str = "blog_posts";
    const ORDER_BY: &'static str = "publish_date DESC, id DESC";
    const UNIQUE: Option<&'static str> = Some("slug");
    const HAS_ACTIVE: bool = true;
    const HAS_CATEGORY: bool = true;

    fn id(&self) -> i64 {
        self.id
    }

    fn active(&self) -> bool {
        self.active
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .publish_date
            .cmp(&self.publish_date)
            .then(other.id.cmp(&self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub author_bio: Option<String>,
    #[serde(default)]
    pub publish_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Validate for BlogDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.slug("slug", &self.slug)
            .required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE)
            .max_len("excerpt", &self.excerpt, 1_000)
            .required("content", &self.content)
            .max_len("content", &self.content, 200_000)
            .required("authorName", &self.author_name)
            .max_len("category", &self.category, 80)
            .string_list("tags", &self.tags, 20);
        v.finish()
    }
}

impl Draft for BlogDraft {
    type Record = BlogPost;
    const COLUMNS: &'static [&'static str] = &[
        "slug",
        "title",
        "excerpt",
        "content",
        "author_name",
        "author_avatar",
        "author_bio",
        "publish_date",
        "category",
        "image_url",
        "tags",
        "active",
    ];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.slug.clone())
            .push_bind(self.title.clone())
            .push_bind(self.excerpt.clone())
            .push_bind(self.content.clone())
            .push_bind(self.author_name.clone())
            .push_bind(self.author_avatar.clone())
            .push_bind(self.author_bio.clone())
            .push_bind(self.publish_date)
            .push_bind(self.category.clone())
            .push_bind(self.image_url.clone())
            .push_bind(self.tags.clone())
            .push_bind(self.active);
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.title);
        ensure_slug(&mut self.slug, &self.title);
        trim_in_place(&mut self.excerpt);
        trim_in_place(&mut self.author_name);
        trim_in_place(&mut self.category);
        if self.category.is_empty() {
            self.category = "General".to_string();
        }
        trim_optional(&mut self.author_avatar);
        trim_optional(&mut self.author_bio);
        trim_optional(&mut self.image_url);
        // Tag order is display-significant; trim in place without reordering.
        for tag in &mut self.tags {
            trim_in_place(tag);
        }
        self.content = ammonia::clean(&self.content);
        if self.publish_date.is_none() {
            self.publish_date = Some(Utc::now().date_naive());
        }
    }
}

// ============================================================================
// Contact submissions
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub event_type: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    #[serde(default)]
    pub status: ContactStatus,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for ContactSubmission {
    const TABLE: &'static str = "contact_submissions";
    const ORDER_BY: &'static str = "id DESC";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        other.id.cmp(&self.id)
    }
}

/// Public contact form body. Status is never accepted from visitors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub message: String,
}

impl Validate for ContactForm {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("name", &self.name)
            .max_len("name", &self.name, 120)
            .email("email", &self.email)
            .phone("phone", &self.phone)
            .required("eventType", &self.event_type)
            .max_len("eventType", &self.event_type, 80)
            .required("message", &self.message)
            .max_len("message", &self.message, 5_000);
        v.finish()
    }
}

impl Draft for ContactForm {
    type Record = ContactSubmission;
    const COLUMNS: &'static [&'static str] = &["name", "email", "phone", "event_type", "message"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.name.clone())
            .push_bind(self.email.clone())
            .push_bind(self.phone.clone())
            .push_bind(self.event_type.clone())
            .push_bind(self.message.clone());
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.email);
        self.email = self.email.to_lowercase();
        trim_in_place(&mut self.phone);
        trim_in_place(&mut self.event_type);
        trim_in_place(&mut self.message);
    }
}

/// Admin update of a submission: status transition plus recorded response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdate {
    pub status: ContactStatus,
    #[serde(default)]
    pub response: Option<String>,
}

impl Validate for ContactUpdate {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        if let Some(response) = &self.response {
            v.max_len("response", response, 5_000);
        }
        v.finish()
    }
}

impl Draft for ContactUpdate {
    type Record = ContactSubmission;
    const COLUMNS: &'static [&'static str] = &["status", "response"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.status.as_str())
            .push_bind(self.response.clone());
    }

    fn prepare(&mut self) {
        trim_optional(&mut self.response);
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub location: String,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub budget: Option<String>,
    pub cover_image: Option<String>,
    pub images: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Event {
    const TABLE: &'static str = "events";
    const ORDER_BY: &'static str = "event_date DESC, id DESC";
    const UNIQUE: Option<&'static str> = Some("slug");

    fn id(&self) -> i64 {
        self.id
    }

    fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .event_date
            .cmp(&self.event_date)
            .then(other.id.cmp(&self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Validate for EventDraft {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        v.required("title", &self.title)
            .max_len("title", &self.title, MAX_TITLE)
            .slug("slug", &self.slug)
            .max_len("description", &self.description, MAX_TEXT)
            .required("eventType", &self.event_type)
            .check(self.event_date.is_some(), "eventDate", "is required")
            .required("location", &self.location)
            .optional_email("clientEmail", self.client_email.as_deref())
            .string_list("images", &self.images, MAX_LIST);
        if let Some(phone) = &self.client_phone {
            v.phone("clientPhone", phone);
        }
        v.finish()
    }
}

impl Draft for EventDraft {
    type Record = Event;
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "slug",
        "description",
        "event_type",
        "event_date",
        "location",
        "status",
        "client_name",
        "client_email",
        "client_phone",
        "budget",
        "cover_image",
        "images",
        "notes",
    ];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.title.clone())
            .push_bind(self.slug.clone())
            .push_bind(self.description.clone())
            .push_bind(self.event_type.clone())
            .push_bind(self.event_date)
            .push_bind(self.location.clone())
            .push_bind(self.status.as_str())
            .push_bind(self.client_name.clone())
            .push_bind(self.client_email.clone())
            .push_bind(self.client_phone.clone())
            .push_bind(self.budget.clone())
            .push_bind(self.cover_image.clone())
            .push_bind(self.images.clone())
            .push_bind(self.notes.clone());
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.title);
        ensure_slug(&mut self.slug, &self.title);
        trim_in_place(&mut self.event_type);
        trim_in_place(&mut self.location);
        trim_optional(&mut self.client_name);
        trim_optional(&mut self.client_email);
        trim_optional(&mut self.client_phone);
        trim_optional(&mut self.budget);
        trim_optional(&mut self.cover_image);
        trim_optional(&mut self.notes);
    }
}

// ============================================================================
// Users and sessions
// ============================================================================

/// Admin credential. Never serialised into API responses; see `UserInfo`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const UNIQUE: Option<&'static str> = Some("username");

    fn id(&self) -> i64 {
        self.id
    }
}

/// New user for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Violations::new();
        let username_ok = (3..=64).contains(&self.username.len())
            && self
                .username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'));
        v.check(
            username_ok,
            "username",
            "must be 3-64 characters of letters, digits, '.', '_', '-' or '@'",
        )
        .required("passwordHash", &self.password_hash)
        .required("role", &self.role);
        v.finish()
    }
}

impl Draft for NewUser {
    type Record = User;
    const COLUMNS: &'static [&'static str] = &["username", "password_hash", "name", "role"];

    fn push_values(&self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.username.clone())
            .push_bind(self.password_hash.clone())
            .push_bind(self.name.clone())
            .push_bind(self.role.clone());
    }

    fn prepare(&mut self) {
        trim_in_place(&mut self.username);
        trim_in_place(&mut self.name);
    }
}

/// The JSON blob stored with each session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub role: String,
}

/// Session row: `sid` is the SHA-256 digest of the bearer token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub sid: String,
    pub sess: Json<SessionData>,
    pub expire: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_draft(tags: &[&str]) -> BlogDraft {
        serde_json::from_value(serde_json::json!({
            "title": "  Planning a Destination Wedding ",
            "content": "<p>Start early.</p><script>alert(1)</script>",
            "authorName": "Meera",
            "tags": tags,
        }))
        .unwrap()
    }

    #[test]
    fn test_contact_status_wire_values() {
        assert_eq!(serde_json::to_string(&ContactStatus::New).unwrap(), "\"New\"");
        assert_eq!(
            serde_json::to_string(&ContactStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        let parsed: ContactStatus = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(parsed, ContactStatus::New);
        assert!(serde_json::from_str::<ContactStatus>("\"archived\"").is_err());
    }

    #[test]
    fn test_status_try_from_matches_as_str() {
        for status in [
            ContactStatus::New,
            ContactStatus::Pending,
            ContactStatus::InProgress,
            ContactStatus::Completed,
        ] {
            assert_eq!(ContactStatus::try_from(status.as_str().to_string()).unwrap(), status);
        }
        for status in [
            EventStatus::Upcoming,
            EventStatus::Pending,
            EventStatus::InProgress,
            EventStatus::Completed,
            EventStatus::Cancelled,
        ] {
            assert_eq!(EventStatus::try_from(status.as_str().to_string()).unwrap(), status);
        }
        assert!(EventStatus::try_from("done".to_string()).is_err());
    }

    #[test]
    fn test_blog_prepare_derives_slug_and_sanitizes() {
        let mut draft = blog_draft(&["weddings", " travel "]);
        draft.prepare();
        assert_eq!(draft.slug, "planning-a-destination-wedding");
        assert!(!draft.content.contains("<script>"));
        assert_eq!(draft.category, "General");
        assert!(draft.publish_date.is_some());
        assert_eq!(draft.tags, vec!["weddings", "travel"]);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_blog_without_publish_date_defaults_to_today() {
        let mut draft = blog_draft(&[]);
        assert!(draft.publish_date.is_none());
        draft.prepare();
        assert_eq!(draft.publish_date, Some(Utc::now().date_naive()));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_blog_rejects_bad_slug() {
        let mut draft = blog_draft(&[]);
        draft.slug = "Not A Slug".to_string();
        draft.prepare();
        match draft.validate() {
            Err(AppError::Validation(fields)) => assert_eq!(fields[0].field, "slug"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_testimonial_rating_bounds() {
        let mut draft: TestimonialDraft = serde_json::from_value(serde_json::json!({
            "content": "Flawless evening",
            "authorName": "Ravi",
            "rating": 6
        }))
        .unwrap();
        draft.prepare();
        assert!(draft.validate().is_err());
        draft.rating = 5;
        assert!(draft.validate().is_ok());
        assert!(draft.active);
    }

    #[test]
    fn test_slide_cta_pairs_must_be_complete() {
        let draft: SlideDraft = serde_json::from_value(serde_json::json!({
            "title": "Celebrate",
            "imageUrl": "https://img.example/hero.jpg",
            "primaryCtaText": "Plan your event",
            "secondaryCtaLink": "javascript:void(0)"
        }))
        .unwrap();
        match draft.validate() {
            Err(AppError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["primaryCtaLink", "secondaryCtaText"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_service_steps_sort_stably_by_order() {
        let mut service: Service = serde_json::from_value(serde_json::json!({
            "id": 1,
            "slug": "weddings",
            "title": "Weddings",
            "description": "",
            "processSteps": [
                { "order": 2, "title": "b" },
                { "order": 1, "title": "a" },
                { "order": 2, "title": "c" }
            ],
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        service.normalize();
        let titles: Vec<_> = service.process_steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_event_draft_requires_date_and_valid_client_email() {
        let mut draft: EventDraft = serde_json::from_value(serde_json::json!({
            "title": "Sharma Sangeet",
            "eventType": "wedding",
            "location": "Jaipur",
            "clientEmail": "nope"
        }))
        .unwrap();
        draft.prepare();
        assert_eq!(draft.slug, "sharma-sangeet");
        assert_eq!(draft.status, EventStatus::Upcoming);
        match draft.validate() {
            Err(AppError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["eventDate", "clientEmail"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
