//! Signed uploads to a Cloudinary-compatible media host.

use std::time::Duration;

use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;

const DEFAULT_UPLOAD_BASE: &str = "https://api.cloudinary.com";

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub upload_base: String,
}

impl MediaConfig {
    /// `None` unless cloud name, key and secret are all present.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            cloud_name: non_empty("MEDIA_CLOUD_NAME")?,
            api_key: non_empty("MEDIA_API_KEY")?,
            api_secret: non_empty("MEDIA_API_SECRET")?,
            folder: non_empty("MEDIA_FOLDER").unwrap_or_else(|| "event-studio".to_string()),
            upload_base: non_empty("MEDIA_UPLOAD_BASE")
                .unwrap_or_else(|| DEFAULT_UPLOAD_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn max_bytes(&self) -> usize {
        match self {
            MediaKind::Image => MAX_IMAGE_BYTES,
            MediaKind::Video => MAX_VIDEO_BYTES,
        }
    }

    pub fn resource_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Identify accepted content from its leading bytes; file names are not trusted.
pub fn sniff(bytes: &[u8]) -> Option<(MediaKind, &'static str)> {
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some((MediaKind::Image, "image/jpeg")),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some((MediaKind::Image, "image/png")),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some((MediaKind::Image, "image/gif")),
        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => {
            Some((MediaKind::Image, "image/webp"))
        }
        // MP4: box size, then "ftyp"
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, ..] => Some((MediaKind::Video, "video/mp4")),
        _ => None,
    }
}

/// SHA-256 over `k=v` pairs sorted by key and joined with `&`, followed by the secret.
pub fn sign(params: &[(&str, String)], secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    pub resource_type: String,
    pub bytes: u64,
}

#[derive(Debug, Deserialize)]
struct HostResponse {
    secure_url: String,
    public_id: String,
    resource_type: Option<String>,
    bytes: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    config: MediaConfig,
}

impl MediaClient {
    pub fn new(config: MediaConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AppError::Internal(format!("media client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, kind: MediaKind) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.config.upload_base,
            self.config.cloud_name,
            kind.resource_type()
        )
    }

    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        kind: MediaKind,
        mime: &'static str,
    ) -> Result<UploadedMedia, AppError> {
        let public_id = uuid::Uuid::new_v4().simple().to_string();
        let params = [
            ("folder", self.config.folder.clone()),
            ("public_id", public_id.clone()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| AppError::Internal(format!("media part: {}", e)))?;
        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = self.endpoint(kind);
        let response = self.http.post(&url).multipart(form).send().await.map_err(|e| {
            tracing::error!(error = %e, "media upload request failed");
            AppError::Upstream("media host request failed".to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "media host rejected upload");
            return Err(AppError::Upstream(format!(
                "media host returned {}",
                status.as_u16()
            )));
        }

        let body: HostResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse media host response");
            AppError::Upstream("unreadable media host response".to_string())
        })?;

        tracing::info!(public_id = %body.public_id, "media uploaded");
        Ok(UploadedMedia {
            url: body.secure_url,
            public_id: body.public_id,
            resource_type: body
                .resource_type
                .unwrap_or_else(|| kind.resource_type().to_string()),
            bytes: body.bytes.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_signatures() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0]).map(|s| s.1), Some("image/jpeg"));
        assert_eq!(
            sniff(b"\x89PNG\r\n\x1a\n").map(|s| s.1),
            Some("image/png")
        );
        assert_eq!(sniff(b"RIFF\0\0\0\0WEBPVP8 ").map(|s| s.1), Some("image/webp"));
        assert_eq!(
            sniff(b"\0\0\0\x18ftypmp42").map(|s| s.0),
            Some(MediaKind::Video)
        );
        assert!(sniff(b"%PDF-1.7").is_none());
        assert!(sniff(b"ab").is_none());
    }

    #[test]
    fn test_sign_sorts_params() {
        let a = sign(
            &[("timestamp", "1".into()), ("folder", "f".into())],
            "secret",
        );
        let b = sign(
            &[("folder", "f".into()), ("timestamp", "1".into())],
            "secret",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut hasher = Sha256::new();
        hasher.update(b"folder=f&timestamp=1secret");
        assert_eq!(a, format!("{:x}", hasher.finalize()));
    }

    #[test]
    fn test_config_requires_credentials() {
        assert!(MediaConfig::from_vars(|_| None).is_none());
        let config = MediaConfig::from_vars(|key| match key {
            "MEDIA_CLOUD_NAME" => Some("demo".into()),
            "MEDIA_API_KEY" => Some("key".into()),
            "MEDIA_API_SECRET" => Some("secret".into()),
            "MEDIA_UPLOAD_BASE" => Some("http://localhost:9000/".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.folder, "event-studio");
        let client = MediaClient::new(config).unwrap();
        assert_eq!(
            client.endpoint(MediaKind::Video),
            "http://localhost:9000/v1_1/demo/video/upload"
        );
    }
}
