//! Page composition for the public site. Every section falls back to static
//! content when its live read is empty or fails, so a page always renders.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::about::current as current_about;
use crate::db::models::{AboutValue, BlogPost, GalleryItem, Slide, Stat, TeamMember, Technology, Testimonial};
use crate::db::record::ListFilter;
use crate::error::AppError;
use crate::fallback::{resolve, resolve_one, Section, SectionPayload};
use crate::state::AppState;

pub const PAGES: &[&str] = &["home", "about", "services", "gallery", "blog"];

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page: &'static str,
    pub sections: BTreeMap<&'static str, SectionPayload>,
}

fn sections(payloads: Vec<(Section, SectionPayload)>) -> BTreeMap<&'static str, SectionPayload> {
    payloads
        .into_iter()
        .map(|(section, payload)| (section.key(), payload))
        .collect()
}

/// GET /api/pages/{page}
pub async fn get_page(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<PageResponse>, AppError> {
    let Some(page) = PAGES.iter().copied().find(|p| *p == page) else {
        return Err(AppError::NotFound(format!("page '{}'", page)));
    };

    let store = &state.store;
    let public = ListFilter::public();

    let payloads = match page {
        "home" => {
            let (slides, stats, services, technologies, testimonials) = tokio::join!(
                store.list::<Slide>(&public),
                store.list::<Stat>(&public),
                store.list_services(&public),
                store.list::<Technology>(&public),
                store.list::<Testimonial>(&public),
            );
            vec![
                (Section::Slides, resolve(Section::Slides, slides)),
                (Section::Stats, resolve(Section::Stats, stats)),
                (Section::Services, resolve(Section::Services, services)),
                (Section::Technologies, resolve(Section::Technologies, technologies)),
                (Section::Testimonials, resolve(Section::Testimonials, testimonials)),
            ]
        }
        "about" => {
            let (about, team, values, stats) = tokio::join!(
                current_about(store),
                store.list::<TeamMember>(&public),
                store.list::<AboutValue>(&public),
                store.list::<Stat>(&public),
            );
            vec![
                (Section::About, resolve_one(Section::About, about)),
                (Section::Team, resolve(Section::Team, team)),
                (Section::Values, resolve(Section::Values, values)),
                (Section::Stats, resolve(Section::Stats, stats)),
            ]
        }
        "services" => {
            let services = store.list_services(&public).await;
            vec![(Section::Services, resolve(Section::Services, services))]
        }
        "gallery" => {
            let gallery = store.list::<GalleryItem>(&public).await;
            vec![(Section::Gallery, resolve(Section::Gallery, gallery))]
        }
        _ => {
            let blog = store.list::<BlogPost>(&public).await;
            vec![(Section::Blog, resolve(Section::Blog, blog))]
        }
    };

    Ok(Json(PageResponse {
        page,
        sections: sections(payloads),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::fallback::{defaults, Section};
    use crate::test_support::{admin_token, send, test_app, test_state};

    #[tokio::test]
    async fn test_empty_store_renders_defaults() {
        let app = test_app(test_state());
        let (status, body) = send(&app, Method::GET, "/api/pages/home", None, None).await;
        assert_eq!(status, StatusCode::OK);
        for key in ["slides", "stats", "services", "technologies", "testimonials"] {
            assert_eq!(body["sections"][key]["source"], "fallback", "section {}", key);
        }
    }

    #[tokio::test]
    async fn test_testimonial_outage_falls_back_while_live_sections_render() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admin/stats",
            Some(&token),
            Some(json!({ "label": "Weddings", "value": 120, "suffix": "+", "order": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        send(
            &app,
            Method::POST,
            "/api/admin/testimonials",
            Some(&token),
            Some(json!({ "content": "Superb", "authorName": "Ravi", "rating": 5 })),
        )
        .await;

        state.store.set_offline("testimonials", true);

        let (status, body) = send(&app, Method::GET, "/api/pages/home", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sections"]["testimonials"]["source"], "fallback");
        assert_eq!(
            body["sections"]["testimonials"]["items"],
            defaults(Section::Testimonials)
        );
        assert_eq!(body["sections"]["stats"]["source"], "live");
        assert_eq!(body["sections"]["stats"]["items"][0]["label"], "Weddings");
    }

    #[tokio::test]
    async fn test_write_during_outage_surfaces_error() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;
        state.store.set_offline("testimonials", true);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admin/testimonials",
            Some(&token),
            Some(json!({ "content": "Superb", "authorName": "Ravi", "rating": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "upstream_unavailable");
    }

    #[tokio::test]
    async fn test_unknown_page_is_not_found() {
        let app = test_app(test_state());
        let (status, _) = send(&app, Method::GET, "/api/pages/careers", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
