//! Static content shown when a public section has no live rows or cannot be read.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Slides,
    Stats,
    Services,
    Technologies,
    Testimonials,
    Gallery,
    Blog,
    Team,
    Values,
    About,
}

impl Section {
    pub fn key(&self) -> &'static str {
        match self {
            Section::Slides => "slides",
            Section::Stats => "stats",
            Section::Services => "services",
            Section::Technologies => "technologies",
            Section::Testimonials => "testimonials",
            Section::Gallery => "gallery",
            Section::Blog => "blog",
            Section::Team => "team",
            Section::Values => "values",
            Section::About => "about",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Live,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionPayload {
    pub source: Source,
    pub items: Value,
}

impl SectionPayload {
    fn fallback(section: Section) -> Self {
        Self {
            source: Source::Fallback,
            items: defaults(section),
        }
    }
}

/// Live rows when the read succeeded with at least one row, defaults otherwise.
pub fn resolve<T: Serialize>(section: Section, read: Result<Vec<T>, AppError>) -> SectionPayload {
    match read {
        Ok(rows) if !rows.is_empty() => match serde_json::to_value(rows) {
            Ok(items) => SectionPayload {
                source: Source::Live,
                items,
            },
            Err(e) => {
                tracing::warn!(section = section.key(), error = %e, "serializing live content failed, using defaults");
                SectionPayload::fallback(section)
            }
        },
        Ok(_) => {
            tracing::debug!(section = section.key(), "no live content, using defaults");
            SectionPayload::fallback(section)
        }
        Err(e) => {
            tracing::warn!(section = section.key(), error = %e, "content read failed, using defaults");
            SectionPayload::fallback(section)
        }
    }
}

/// Same rule for singleton content.
pub fn resolve_one<T: Serialize>(
    section: Section,
    read: Result<Option<T>, AppError>,
) -> SectionPayload {
    let mut payload = resolve(section, read.map(|row| row.into_iter().collect::<Vec<_>>()));
    if payload.source == Source::Live {
        if let Value::Array(rows) = &mut payload.items {
            let row = rows.pop().unwrap_or(Value::Null);
            payload.items = row;
        }
    }
    payload
}

/// Default payload per section, shaped like the live rows.
pub fn defaults(section: Section) -> Value {
    match section {
        Section::Slides => json!([
            {
                "id": 1,
                "title": "Events That Leave a Lasting Impression",
                "subtitle": "Weddings, corporate gatherings and celebrations",
                "description": "From the first idea to the final toast, we plan and run every detail.",
                "imageUrl": "/images/hero/celebration.jpg",
                "primaryCtaText": "Plan Your Event",
                "primaryCtaLink": "/contact",
                "secondaryCtaText": "Our Services",
                "secondaryCtaLink": "/services",
                "order": 1,
                "active": true
            },
            {
                "id": 2,
                "title": "Corporate Events, Done Right",
                "subtitle": "Conferences, launches and offsites",
                "description": null,
                "imageUrl": "/images/hero/corporate.jpg",
                "primaryCtaText": "Talk to Us",
                "primaryCtaLink": "/contact",
                "secondaryCtaText": "See Our Work",
                "secondaryCtaLink": "/gallery",
                "order": 2,
                "active": true
            }
        ]),
        Section::Stats => json!([
            { "id": 1, "label": "Events Delivered", "value": 500, "suffix": "+", "order": 1 },
            { "id": 2, "label": "Happy Clients", "value": 350, "suffix": "+", "order": 2 },
            { "id": 3, "label": "Years of Experience", "value": 12, "suffix": null, "order": 3 },
            { "id": 4, "label": "Partner Venues", "value": 80, "suffix": "+", "order": 4 }
        ]),
        Section::Services => json!([
            {
                "id": 1,
                "slug": "weddings",
                "title": "Weddings",
                "description": "Full planning and coordination for ceremonies and receptions.",
                "imageUrl": "/images/services/weddings.jpg",
                "bannerUrl": null,
                "features": [
                    { "title": "Venue sourcing", "description": null },
                    { "title": "Décor and styling", "description": null }
                ],
                "processSteps": [
                    { "order": 1, "title": "Consultation", "description": "We learn what you have in mind." },
                    { "order": 2, "title": "Planning", "description": "Budget, vendors and timeline." },
                    { "order": 3, "title": "Execution", "description": "Our team runs the day." }
                ]
            },
            {
                "id": 2,
                "slug": "corporate-events",
                "title": "Corporate Events",
                "description": "Conferences, product launches, award nights and offsites.",
                "imageUrl": "/images/services/corporate.jpg",
                "bannerUrl": null,
                "features": [
                    { "title": "Stage and AV production", "description": null },
                    { "title": "Guest management", "description": null }
                ],
                "processSteps": []
            },
            {
                "id": 3,
                "slug": "private-parties",
                "title": "Private Parties",
                "description": "Birthdays, anniversaries and milestone celebrations.",
                "imageUrl": "/images/services/parties.jpg",
                "bannerUrl": null,
                "features": [],
                "processSteps": []
            }
        ]),
        Section::Technologies => json!([
            { "id": 1, "icon": "calendar", "title": "Planning Tools", "description": "Shared timelines so nothing slips.", "order": 1, "active": true },
            { "id": 2, "icon": "speaker", "title": "Sound & Lighting", "description": "Professional AV for every room size.", "order": 2, "active": true },
            { "id": 3, "icon": "camera", "title": "Photo & Video", "description": "Capture the day from every angle.", "order": 3, "active": true },
            { "id": 4, "icon": "ticket", "title": "Guest Check-in", "description": "Fast digital registration at the door.", "order": 4, "active": true }
        ]),
        Section::Testimonials => json!([
            {
                "id": 1,
                "content": "Everything ran on time and our guests are still talking about it.",
                "authorName": "Priya & Arjun",
                "authorTitle": "Wedding clients",
                "authorAvatar": null,
                "rating": 5,
                "active": true
            },
            {
                "id": 2,
                "content": "Our annual conference was the smoothest one we have had.",
                "authorName": "Daniel Okafor",
                "authorTitle": "Operations Director",
                "authorAvatar": null,
                "rating": 5,
                "active": true
            },
            {
                "id": 3,
                "content": "They handled every vendor so we could enjoy the party.",
                "authorName": "Sofia Marquez",
                "authorTitle": "Birthday celebration",
                "authorAvatar": null,
                "rating": 4,
                "active": true
            }
        ]),
        Section::Gallery => json!([
            { "id": 1, "title": "Garden Ceremony", "category": "weddings", "description": null, "event": null, "date": null, "imageUrl": "/images/gallery/garden.jpg", "serviceId": null },
            { "id": 2, "title": "Product Launch Stage", "category": "corporate", "description": null, "event": null, "date": null, "imageUrl": "/images/gallery/launch.jpg", "serviceId": null },
            { "id": 3, "title": "Rooftop Birthday", "category": "parties", "description": null, "event": null, "date": null, "imageUrl": "/images/gallery/rooftop.jpg", "serviceId": null }
        ]),
        Section::Blog => json!([
            {
                "id": 1,
                "slug": "choosing-the-right-venue",
                "title": "Choosing the Right Venue",
                "excerpt": "Five questions to ask before you sign a venue contract.",
                "content": "<p>Capacity, access, catering rules, noise limits and backup plans all matter.</p>",
                "authorName": "Event Studio Team",
                "authorAvatar": null,
                "authorBio": null,
                "publishDate": "2024-01-15",
                "category": "Planning",
                "imageUrl": "/images/blog/venue.jpg",
                "tags": ["venues", "planning"],
                "active": true
            }
        ]),
        Section::Team => json!([
            { "id": 1, "name": "Anika Rao", "role": "Founder & Lead Planner", "bio": null, "imageUrl": null, "order": 1 },
            { "id": 2, "name": "Marcus Lee", "role": "Production Manager", "bio": null, "imageUrl": null, "order": 2 },
            { "id": 3, "name": "Leila Haddad", "role": "Client Relations", "bio": null, "imageUrl": null, "order": 3 }
        ]),
        Section::Values => json!([
            { "id": 1, "title": "Attention to Detail", "description": "Small things make an event feel effortless.", "icon": "sparkles", "order": 1 },
            { "id": 2, "title": "Reliability", "description": "We show up early and stay until the last guest leaves.", "icon": "shield", "order": 2 },
            { "id": 3, "title": "Creativity", "description": "Every event gets its own look and story.", "icon": "palette", "order": 3 }
        ]),
        Section::About => json!({
            "id": 1,
            "mission": "To plan and deliver events that feel personal, run smoothly and stay within budget.",
            "vision": "To be the first call for anyone with something worth celebrating.",
            "history": "Founded by a small team of planners, we have grown into a full-service event studio.",
            "teamDescription": "Planners, designers and producers who have worked hundreds of events together.",
            "qualityDescription": "Every vendor is vetted and every timeline is rehearsed.",
            "images": []
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_live_rows_are_used() {
        let payload = resolve(Section::Stats, Ok(vec![json!({ "label": "Live" })]));
        assert_eq!(payload.source, Source::Live);
        assert_eq!(payload.items[0]["label"], "Live");
    }

    #[test]
    fn test_empty_or_failed_reads_use_defaults() {
        let empty: Result<Vec<Value>, AppError> = Ok(vec![]);
        let payload = resolve(Section::Testimonials, empty);
        assert_eq!(payload.source, Source::Fallback);
        assert_eq!(payload.items, defaults(Section::Testimonials));

        let failed: Result<Vec<Value>, AppError> =
            Err(AppError::Database(sqlx::Error::PoolTimedOut));
        let payload = resolve(Section::Slides, failed);
        assert_eq!(payload.source, Source::Fallback);
        assert!(payload.items.as_array().is_some_and(|a| !a.is_empty()));
    }

    #[test]
    fn test_singleton_resolves_to_object() {
        let payload = resolve_one(Section::About, Ok(Some(json!({ "mission": "m" }))));
        assert_eq!(payload.source, Source::Live);
        assert_eq!(payload.items["mission"], "m");

        let payload = resolve_one::<Value>(Section::About, Ok(None));
        assert_eq!(payload.source, Source::Fallback);
        assert!(payload.items.is_object());
    }

    #[test]
    fn test_every_list_default_is_non_empty() {
        for section in [
            Section::Slides,
            Section::Stats,
            Section::Services,
            Section::Technologies,
            Section::Testimonials,
            Section::Gallery,
            Section::Blog,
            Section::Team,
            Section::Values,
        ] {
            let items = defaults(section);
            assert!(
                items.as_array().is_some_and(|a| !a.is_empty()),
                "{} defaults are empty",
                section.key()
            );
        }
    }
}
