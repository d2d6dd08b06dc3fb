//! Services carry their features and process steps, so they bypass the
//! generic handlers and use the store's transactional service methods.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::crud::{accept, not_found, Deleted, ListResponse};
use crate::db::models::{Service, ServiceDraft};
use crate::db::record::Lookup;
use crate::error::AppError;
use crate::extract::{ListParams, Payload, RowId};
use crate::state::AppState;

/// GET /api/services and GET /api/admin/services (no inactive flag on services)
pub async fn list(
    State(state): State<AppState>,
    params: ListParams,
) -> Result<Json<ListResponse<Service>>, AppError> {
    let filter = params.into_filter(true);
    let items = state.store.list_services(&filter).await?;
    Ok(Json(ListResponse::new(items, filter.offset)))
}

/// GET /api/services/{slugOrId}
pub async fn get_public(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Service>, AppError> {
    let lookup = Lookup::parse::<Service>(&key)?;
    state
        .store
        .find_service(&lookup)
        .await?
        .map(Json)
        .ok_or_else(|| not_found::<Service>(&lookup))
}

/// GET /api/admin/services/{id}
pub async fn get_admin(
    State(state): State<AppState>,
    RowId(id): RowId,
) -> Result<Json<Service>, AppError> {
    let lookup = Lookup::Id(id);
    state
        .store
        .find_service(&lookup)
        .await?
        .map(Json)
        .ok_or_else(|| not_found::<Service>(&lookup))
}

/// POST /api/admin/services
pub async fn create(
    State(state): State<AppState>,
    Payload(draft): Payload<ServiceDraft>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let draft = accept(draft)?;
    let service = state.store.insert_service(&draft).await?;
    tracing::info!(id = service.id, slug = %service.slug, "service created");
    Ok((StatusCode::CREATED, Json(service)))
}

/// PUT /api/admin/services/{id}: features and steps are replaced wholesale.
pub async fn update(
    State(state): State<AppState>,
    RowId(id): RowId,
    Payload(draft): Payload<ServiceDraft>,
) -> Result<Json<Service>, AppError> {
    let draft = accept(draft)?;
    let service = state
        .store
        .update_service(id, &draft)
        .await?
        .ok_or_else(|| not_found::<Service>(&Lookup::Id(id)))?;
    tracing::info!(id, slug = %service.slug, "service updated");
    Ok(Json(service))
}

/// DELETE /api/admin/services/{id}
pub async fn delete(
    State(state): State<AppState>,
    RowId(id): RowId,
) -> Result<Json<Deleted>, AppError> {
    if !state.store.delete_service(id).await? {
        return Err(not_found::<Service>(&Lookup::Id(id)));
    }
    tracing::info!(id, "service deleted");
    Ok(Json(Deleted { success: true }))
}
