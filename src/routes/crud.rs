//! Generic REST handlers shared by every flat content table.
//!
//! Routes instantiate these per type, e.g. `get(crud::list_public::<Slide>)`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::record::{Draft, Lookup, Record};
use crate::error::AppError;
use crate::extract::{ListParams, Payload, RowId};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub offset: u32,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, offset: u32) -> Self {
        Self {
            count: items.len(),
            items,
            offset,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub success: bool,
}

/// Normalise then validate a write payload; nothing reaches the store otherwise.
pub fn accept<D: Draft>(mut draft: D) -> Result<D, AppError> {
    draft.prepare();
    draft.validate()?;
    Ok(draft)
}

pub fn not_found<R: Record>(lookup: &Lookup) -> AppError {
    AppError::NotFound(format!("{} {}", R::TABLE, lookup))
}

/// Admin list/create plus read/replace/delete by id, mounted at `path`.
pub fn resource<D: Draft>(path: &str) -> Router<AppState> {
    Router::new()
        .route(path, get(list_admin::<D::Record>).post(create::<D>))
        .route(
            &format!("{}/{{id}}", path),
            get(get_admin::<D::Record>)
                .put(update::<D>)
                .delete(delete::<D::Record>),
        )
}

pub async fn list_public<R: Record>(
    State(state): State<AppState>,
    params: ListParams,
) -> Result<Json<ListResponse<R>>, AppError> {
    let filter = params.into_filter(true);
    let items = state.store.list::<R>(&filter).await?;
    Ok(Json(ListResponse::new(items, filter.offset)))
}

pub async fn list_admin<R: Record>(
    State(state): State<AppState>,
    params: ListParams,
) -> Result<Json<ListResponse<R>>, AppError> {
    let filter = params.into_filter(false);
    let items = state.store.list::<R>(&filter).await?;
    Ok(Json(ListResponse::new(items, filter.offset)))
}

/// Inactive rows are hidden from the public as if they did not exist.
pub async fn get_public<R: Record>(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<R>, AppError> {
    let lookup = Lookup::parse::<R>(&key)?;
    match state.store.find::<R>(&lookup).await? {
        Some(row) if row.active() => Ok(Json(row)),
        _ => Err(not_found::<R>(&lookup)),
    }
}

pub async fn get_admin<R: Record>(
    State(state): State<AppState>,
    RowId(id): RowId,
) -> Result<Json<R>, AppError> {
    let lookup = Lookup::Id(id);
    state
        .store
        .find::<R>(&lookup)
        .await?
        .map(Json)
        .ok_or_else(|| not_found::<R>(&lookup))
}

pub async fn create<D: Draft>(
    State(state): State<AppState>,
    Payload(draft): Payload<D>,
) -> Result<(StatusCode, Json<D::Record>), AppError> {
    let draft = accept(draft)?;
    let row = state.store.insert(&draft).await?;
    tracing::info!(table = D::Record::TABLE, id = row.id(), "row created");
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update<D: Draft>(
    State(state): State<AppState>,
    RowId(id): RowId,
    Payload(draft): Payload<D>,
) -> Result<Json<D::Record>, AppError> {
    let draft = accept(draft)?;
    let row = state
        .store
        .update(id, &draft)
        .await?
        .ok_or_else(|| not_found::<D::Record>(&Lookup::Id(id)))?;
    tracing::info!(table = D::Record::TABLE, id, "row updated");
    Ok(Json(row))
}

pub async fn delete<R: Record>(
    State(state): State<AppState>,
    RowId(id): RowId,
) -> Result<Json<Deleted>, AppError> {
    if !state.store.delete::<R>(id).await? {
        return Err(not_found::<R>(&Lookup::Id(id)));
    }
    tracing::info!(table = R::TABLE, id, "row deleted");
    Ok(Json(Deleted { success: true }))
}
