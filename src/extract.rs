//! Request extractors whose rejections are `AppError`s.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::db::record::ListFilter;
use crate::error::AppError;

pub const MAX_PAGE_SIZE: u32 = 500;

/// JSON body. Syntax errors are `BadRequest`; a well-formed body with the wrong
/// shape (types, unknown enum values) is a `Validation` error on `body`.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(JsonRejection::JsonDataError(e)) => Err(AppError::field("body", e.body_text())),
            Err(e) => Err(AppError::BadRequest(e.body_text())),
        }
    }
}

/// Positive numeric `{id}` path segment.
#[derive(Debug, Clone, Copy)]
pub struct RowId(pub i64);

impl<S> FromRequestParts<S> for RowId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        raw.parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(RowId)
            .ok_or_else(|| AppError::BadRequest(format!("invalid id '{}'", raw)))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub category: Option<String>,
}

/// `?limit=&offset=&category=` with range checks applied.
#[derive(Debug, Default)]
pub struct ListParams(pub ListQuery);

impl ListParams {
    pub fn into_filter(self, active_only: bool) -> ListFilter {
        let q = self.0;
        ListFilter {
            active_only,
            category: q.category.filter(|c| !c.trim().is_empty()),
            limit: q.limit,
            offset: q.offset.unwrap_or(0),
        }
    }
}

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ListQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if let Some(limit) = query.limit {
            if limit == 0 || limit > MAX_PAGE_SIZE {
                return Err(AppError::field(
                    "limit",
                    format!("must be between 1 and {}", MAX_PAGE_SIZE),
                ));
            }
        }
        Ok(ListParams(query))
    }
}
