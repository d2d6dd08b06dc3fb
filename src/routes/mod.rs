//! HTTP routes: the public content API, the session-gated admin API and
//! health checks.

pub mod about;
pub mod auth;
pub mod contact;
pub mod crud;
pub mod health;
pub mod pages;
pub mod services;
pub mod upload;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::db::models::{
    AboutValueDraft, BlogDraft, BlogPost, EventDraft, GalleryDraft, GalleryItem, Slide, SlideDraft,
    Stat, StatDraft, TeamMemberDraft, Technology, TechnologyDraft, Testimonial, TestimonialDraft,
};
use crate::db::record::Record;
use crate::state::AppState;

/// Request bodies outside the upload route.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// `GET /api/<path>` and `GET /api/<path>/{key}` for a flat table.
fn public<R: Record>(path: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("/api/{}", path), get(crud::list_public::<R>))
        .route(&format!("/api/{}/{{key}}", path), get(crud::get_public::<R>))
}

fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/services", get(services::list).post(services::create))
        .route(
            "/services/{id}",
            get(services::get_admin)
                .put(services::update)
                .delete(services::delete),
        )
        .merge(crud::resource::<GalleryDraft>("/gallery"))
        .merge(crud::resource::<SlideDraft>("/slides"))
        .merge(crud::resource::<TechnologyDraft>("/technologies"))
        .merge(crud::resource::<TestimonialDraft>("/testimonials"))
        .merge(crud::resource::<StatDraft>("/stats"))
        .merge(crud::resource::<BlogDraft>("/blog"))
        .merge(crud::resource::<TeamMemberDraft>("/team"))
        .merge(crud::resource::<AboutValueDraft>("/values"))
        .merge(crud::resource::<EventDraft>("/events"))
        .route("/about", get(about::get_about).put(about::upsert))
        .route("/contact", get(contact::list))
        .route(
            "/contact/{id}",
            get(contact::get).put(contact::update).delete(contact::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}

/// Everything under `/api`, with state still to be supplied.
pub fn api_router(state: AppState) -> Router<AppState> {
    let content = Router::new()
        .route("/api/services", get(services::list))
        .route("/api/services/{key}", get(services::get_public))
        .merge(public::<GalleryItem>("gallery"))
        .merge(public::<Slide>("slides"))
        .merge(public::<Technology>("technologies"))
        .merge(public::<Testimonial>("testimonials"))
        .merge(public::<Stat>("stats"))
        .merge(public::<BlogPost>("blog"))
        .route("/api/about", get(about::get_about))
        .route("/api/pages/{page}", get(pages::get_page))
        .route("/api/contact", post(contact::submit).get(contact::list))
        .route(
            "/api/contact/{id}",
            get(contact::get).put(contact::update).delete(contact::delete),
        )
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .nest("/api/admin", admin_router(state.clone()))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    content.merge(upload::router(state))
}

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_ping))
        .route("/health/ready", get(health::health_ready))
        .route("/health/detailed", get(health::health_detailed))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{admin_token, send, test_app, test_state};

    #[tokio::test]
    async fn test_public_lists_hide_inactive_and_filter_category() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        for (title, category, active) in [
            ("Mandap Ideas", "weddings", true),
            ("Stage Design", "corporate", true),
            ("Unfinished Draft", "weddings", false),
        ] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/admin/blog",
                Some(&token),
                Some(json!({
                    "title": title,
                    "category": category,
                    "content": "<p>Body</p>",
                    "authorName": "Meera",
                    "active": active
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, public) = send(&app, Method::GET, "/api/blog", None, None).await;
        assert_eq!(public["count"], 2);

        let (_, weddings) =
            send(&app, Method::GET, "/api/blog?category=weddings", None, None).await;
        assert_eq!(weddings["count"], 1);
        assert_eq!(weddings["items"][0]["title"], "Mandap Ideas");

        let (_, all) = send(&app, Method::GET, "/api/admin/blog", Some(&token), None).await;
        assert_eq!(all["count"], 3);

        let (_, paged) = send(&app, Method::GET, "/api/blog?limit=1&offset=1", None, None).await;
        assert_eq!(paged["count"], 1);
        assert_eq!(paged["offset"], 1);

        let (status, _) = send(&app, Method::GET, "/api/blog?limit=0", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inactive_row_is_hidden_from_detail_route() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let (_, slide) = send(
            &app,
            Method::POST,
            "/api/admin/slides",
            Some(&token),
            Some(json!({ "title": "Hidden", "imageUrl": "/s.jpg", "active": false })),
        )
        .await;
        let id = slide["id"].as_i64().unwrap();

        let (status, _) = send(&app, Method::GET, &format!("/api/slides/{}", id), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/admin/slides/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blog_tags_round_trip_in_order() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let (status, post) = send(
            &app,
            Method::POST,
            "/api/admin/blog",
            Some(&token),
            Some(json!({
                "title": "Monsoon Weddings",
                "content": "<p>Plan for rain.</p>",
                "authorName": "Meera",
                "tags": ["weather", "weddings", "planning"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = post["id"].as_i64().unwrap();

        let (_, fetched) = send(&app, Method::GET, "/api/blog/monsoon-weddings", None, None).await;
        assert_eq!(fetched["tags"], json!(["weather", "weddings", "planning"]));

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/admin/blog/{}", id),
            Some(&token),
            Some(json!({
                "slug": "monsoon-weddings",
                "title": "Monsoon Weddings",
                "content": "<p>Plan for rain.</p>",
                "authorName": "Meera",
                "publishDate": fetched["publishDate"],
                "tags": ["planning", "weather"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, fetched) = send(&app, Method::GET, &format!("/api/blog/{}", id), None, None).await;
        assert_eq!(fetched["tags"], json!(["planning", "weather"]));
    }

    #[tokio::test]
    async fn test_duplicate_slugs_conflict_for_blog_and_events() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let post = json!({
            "slug": "same-slug",
            "title": "First",
            "content": "<p>Body</p>",
            "authorName": "Meera"
        });
        let (status, _) = send(&app, Method::POST, "/api/admin/blog", Some(&token), Some(post.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, Method::POST, "/api/admin/blog", Some(&token), Some(post)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let event = json!({
            "slug": "gala-2026",
            "title": "Annual Gala",
            "eventType": "corporate",
            "eventDate": "2026-12-01",
            "location": "Mumbai"
        });
        let (status, body) =
            send(&app, Method::POST, "/api/admin/events", Some(&token), Some(event.clone())).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let (status, _) = send(&app, Method::POST, "/api/admin/events", Some(&token), Some(event)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let req = axum::http::Request::post("/api/admin/stats")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let res = tower::ServiceExt::oneshot(app.clone(), req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let (status, _) = send(&app, Method::DELETE, "/api/admin/stats/99", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/api/admin/stats/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_event_update_keeps_image_order() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let mut event = json!({
            "title": "Riverside Wedding",
            "eventType": "wedding",
            "eventDate": "2026-11-14",
            "location": "Udaipur",
            "images": ["/events/b.jpg", "/events/a.jpg"]
        });
        let (status, created) =
            send(&app, Method::POST, "/api/admin/events", Some(&token), Some(event.clone())).await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
        assert_eq!(created["slug"], "riverside-wedding");
        assert_eq!(created["images"], json!(["/events/b.jpg", "/events/a.jpg"]));

        event["status"] = json!("completed");
        event["images"] = json!(["/events/c.jpg", "/events/a.jpg", "/events/b.jpg"]);
        let uri = format!("/api/admin/events/{}", created["id"]);
        let (status, updated) = send(&app, Method::PUT, &uri, Some(&token), Some(event)).await;
        assert_eq!(status, StatusCode::OK, "{}", updated);
        assert_eq!(updated["id"], created["id"]);

        let (status, fetched) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["status"], "completed");
        assert_eq!(
            fetched["images"],
            json!(["/events/c.jpg", "/events/a.jpg", "/events/b.jpg"])
        );
        assert_eq!(fetched["createdAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn test_unauthenticated_writes_leave_existing_rows_untouched() {
        let state = test_state();
        let app = test_app(state.clone());
        let token = admin_token(&state, &app).await;

        let post = json!({
            "slug": "venue-checklist",
            "title": "Venue Checklist",
            "content": "<p>Walk the site.</p>",
            "authorName": "Meera"
        });
        let (status, created) =
            send(&app, Method::POST, "/api/admin/blog", Some(&token), Some(post)).await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/admin/blog/{}", created["id"]);

        let edit = json!({
            "slug": "venue-checklist",
            "title": "Defaced",
            "content": "<p>Gone.</p>",
            "authorName": "Nobody"
        });
        for token in [None, Some("not-a-real-token")] {
            let (status, _) = send(&app, Method::PUT, &uri, token, Some(edit.clone())).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            let (status, _) = send(&app, Method::DELETE, &uri, token, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, fetched) =
            send(&app, Method::GET, "/api/blog/venue-checklist", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Venue Checklist");
        assert_eq!(fetched["authorName"], "Meera");
        assert_eq!(fetched["updatedAt"], created["updatedAt"]);
    }
}
