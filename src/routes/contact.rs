//! Contact form intake (public) and inquiry management (admin).

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::auth::AdminSession;
use super::crud::{self, accept, not_found, Deleted, ListResponse};
use crate::db::models::{ContactForm, ContactSubmission, ContactUpdate};
use crate::db::record::Lookup;
use crate::error::AppError;
use crate::extract::{ListParams, Payload, RowId};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: i64,
    pub message: String,
}

/// POST /api/contact
pub async fn submit(
    State(state): State<AppState>,
    Payload(form): Payload<ContactForm>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let form = accept(form)?;
    let submission = state.store.insert(&form).await?;
    state.notifier.contact_received(&submission);

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            id: submission.id,
            message: "Thank you for reaching out. We will get back to you shortly.".to_string(),
        }),
    ))
}

/// GET /api/contact, GET /api/admin/contact
pub async fn list(
    _admin: AdminSession,
    state: State<AppState>,
    params: ListParams,
) -> Result<Json<ListResponse<ContactSubmission>>, AppError> {
    crud::list_admin::<ContactSubmission>(state, params).await
}

/// GET /api/contact/{id}
pub async fn get(
    _admin: AdminSession,
    state: State<AppState>,
    id: RowId,
) -> Result<Json<ContactSubmission>, AppError> {
    crud::get_admin::<ContactSubmission>(state, id).await
}

/// PUT /api/contact/{id}: status transition and staff response
pub async fn update(
    admin: AdminSession,
    State(state): State<AppState>,
    RowId(id): RowId,
    Payload(change): Payload<ContactUpdate>,
) -> Result<Json<ContactSubmission>, AppError> {
    let change = accept(change)?;
    let submission = state
        .store
        .update(id, &change)
        .await?
        .ok_or_else(|| not_found::<ContactSubmission>(&Lookup::Id(id)))?;
    tracing::info!(
        contact_id = id,
        status = submission.status.as_str(),
        by = %admin.user.username,
        "contact submission updated"
    );
    Ok(Json(submission))
}

/// DELETE /api/contact/{id}
pub async fn delete(
    _admin: AdminSession,
    state: State<AppState>,
    id: RowId,
) -> Result<Json<Deleted>, AppError> {
    crud::delete::<ContactSubmission>(state, id).await
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{admin_token, send, test_app, test_state};

    fn inquiry() -> serde_json::Value {
        json!({
            "name": "Asha",
            "email": "Asha@X.com",
            "phone": "9999999999",
            "eventType": "wedding",
            "message": "Hi"
        })
    }

    #[tokio::test]
    async fn test_contact_round_trip() {
        let state = test_state();
        let app = test_app(state.clone());

        let (status, body) = send(&app, Method::POST, "/api/contact", None, Some(inquiry())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        let id = body["id"].as_i64().unwrap();

        let token = admin_token(&state, &app).await;
        let (status, list) = send(&app, Method::GET, "/api/admin/contact", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["count"], 1);
        assert_eq!(list["items"][0]["status"], "New");
        assert_eq!(list["items"][0]["email"], "asha@x.com");
        let first_updated = list["items"][0]["updatedAt"].clone();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/admin/contact/{}", id),
            Some(&token),
            Some(json!({ "status": "in-progress", "response": "Called back" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "in-progress");

        let (status, fetched) = send(
            &app,
            Method::GET,
            &format!("/api/contact/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["status"], "in-progress");
        assert_eq!(fetched["response"], "Called back");
        assert_ne!(fetched["updatedAt"], first_updated);
    }

    #[tokio::test]
    async fn test_contact_listing_requires_session() {
        let app = test_app(test_state());
        let (status, _) = send(&app, Method::GET, "/api/contact", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_inquiry_names_fields() {
        let app = test_app(test_state());
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/contact",
            None,
            Some(json!({ "name": "", "email": "nope", "phone": "12" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
        let fields: Vec<&str> = body["error"]["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["name", "email", "phone", "eventType", "message"]);
    }

    #[tokio::test]
    async fn test_unknown_status_is_rejected() {
        let state = test_state();
        let app = test_app(state.clone());
        send(&app, Method::POST, "/api/contact", None, Some(inquiry())).await;
        let token = admin_token(&state, &app).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/admin/contact/1",
            Some(&token),
            Some(json!({ "status": "archived" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"][0]["field"], "body");
    }
}
