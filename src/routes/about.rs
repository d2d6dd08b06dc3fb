//! About page: a singleton record plus the team and values lists.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::crud::accept;
use crate::db::models::{About, AboutDraft, AboutValue, TeamMember};
use crate::db::record::ListFilter;
use crate::db::Store;
use crate::error::AppError;
use crate::extract::Payload;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct AboutResponse {
    pub about: Option<About>,
    pub team: Vec<TeamMember>,
    pub values: Vec<AboutValue>,
}

/// The singleton is the lowest-id row; later rows are never created by `upsert`.
pub async fn current(store: &Store) -> Result<Option<About>, AppError> {
    let filter = ListFilter {
        limit: Some(1),
        ..ListFilter::admin()
    };
    Ok(store.list::<About>(&filter).await?.into_iter().next())
}

/// GET /api/about, GET /api/admin/about
pub async fn get_about(State(state): State<AppState>) -> Result<Json<AboutResponse>, AppError> {
    let public = ListFilter::public();
    let (about, team, values) = tokio::join!(
        current(&state.store),
        state.store.list::<TeamMember>(&public),
        state.store.list::<AboutValue>(&public),
    );
    Ok(Json(AboutResponse {
        about: about?,
        team: team?,
        values: values?,
    }))
}

/// PUT /api/admin/about: create the singleton or replace it.
pub async fn upsert(
    State(state): State<AppState>,
    Payload(draft): Payload<AboutDraft>,
) -> Result<(StatusCode, Json<About>), AppError> {
    let draft = accept(draft)?;
    if current(&state.store).await?.is_none() {
        match state.store.insert(&draft).await {
            Ok(about) => {
                tracing::info!(id = about.id, "about content created");
                return Ok((StatusCode::CREATED, Json(about)));
            }
            // Lost the race for the first row; replace the winner's instead.
            Err(AppError::Conflict(_)) => {}
            Err(e) => return Err(e),
        }
    }
    let about = replace(&state.store, &draft).await?;
    tracing::info!(id = about.id, "about content updated");
    Ok((StatusCode::OK, Json(about)))
}

async fn replace(store: &Store, draft: &AboutDraft) -> Result<About, AppError> {
    let existing = current(store)
        .await?
        .ok_or_else(|| AppError::Conflict("about content was removed concurrently".into()))?;
    store
        .update(existing.id, draft)
        .await?
        .ok_or_else(|| AppError::Conflict("about content was removed concurrently".into()))
}
