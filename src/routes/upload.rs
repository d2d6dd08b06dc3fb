//! Admin media upload, forwarded to the configured media host.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    middleware,
    routing::post,
    Json, Router,
};

use super::auth::{require_admin, AdminSession};
use crate::error::AppError;
use crate::media::{sniff, UploadedMedia, MAX_VIDEO_BYTES};
use crate::state::AppState;

/// Multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Mounted outside the global body limit, with its own ceiling.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_VIDEO_BYTES + MULTIPART_OVERHEAD))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// POST /api/admin/upload
pub async fn upload(
    State(state): State<AppState>,
    admin: AdminSession,
    mut multipart: Multipart,
) -> Result<Json<UploadedMedia>, AppError> {
    let Some(media) = state.media.clone() else {
        return Err(AppError::UpstreamUnavailable(
            "media hosting is not configured".to_string(),
        ));
    };

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart data: {}", e)))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let name = sanitize_file_name(field.file_name().unwrap_or("upload"));
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read file: {}", e)))?;
            file = Some((name, bytes));
            break;
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(AppError::field("file", "is required"));
    };
    if bytes.is_empty() {
        return Err(AppError::BadRequest("uploaded file is empty".to_string()));
    }
    let Some((kind, mime)) = sniff(&bytes) else {
        return Err(AppError::field(
            "file",
            "must be a JPEG, PNG, GIF, WebP image or an MP4 video",
        ));
    };
    if bytes.len() > kind.max_bytes() {
        return Err(AppError::field(
            "file",
            format!(
                "{} uploads are limited to {} MB",
                kind.resource_type(),
                kind.max_bytes() / (1024 * 1024)
            ),
        ));
    }

    tracing::info!(
        by = %admin.user.username,
        file = %file_name,
        mime,
        size = bytes.len(),
        "forwarding upload to media host"
    );
    let uploaded = media.upload(bytes.to_vec(), &file_name, kind, mime).await?;
    Ok(Json(uploaded))
}
