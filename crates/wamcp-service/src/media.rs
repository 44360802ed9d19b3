// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media source resolution and attachment storage.
//!
//! Outbound sources are `http(s)://` (fetched) or `file://` (read locally).
//! Only `image/*` content is relayed.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::StreamExt;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use wamcp_core::WaError;
use wamcp_core::ids::sanitize_file_stem;
use wamcp_core::session::WaMedia;
use wamcp_core::types::MediaDescriptor;

/// Largest attachment relayed from a media source.
pub const MAX_MEDIA_BYTES: u64 = 16 * 1024 * 1024;

const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("svg", "image/svg+xml"),
    ("mp4", "video/mp4"),
    ("3gp", "video/3gpp"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/opus"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
];

/// MIME type for a file extension, case-insensitive.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Preferred file extension for a MIME type. Parameters are ignored.
pub fn extension_for_mime(mime: &str) -> &'static str {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    EXTENSIONS
        .iter()
        .find(|(_, m)| m.eq_ignore_ascii_case(essence))
        .map(|(ext, _)| *ext)
        .unwrap_or("bin")
}

/// Where an outbound attachment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Remote(Url),
    Local(PathBuf),
}

impl MediaSource {
    /// Parse a source URI. Schemes other than http, https and file are rejected.
    pub fn parse(source: &str) -> Result<Self, WaError> {
        let url = Url::parse(source.trim())
            .map_err(|_| WaError::InvalidInput(format!("Invalid media source: {source}")))?;
        match url.scheme() {
            "http" | "https" => Ok(MediaSource::Remote(url)),
            "file" => url.to_file_path().map(MediaSource::Local).map_err(|()| {
                WaError::InvalidInput(format!("Invalid file path in media source: {source}"))
            }),
            other => Err(WaError::InvalidInput(format!(
                "Invalid media source scheme `{other}`: use http://, https:// or file://"
            ))),
        }
    }
}

/// An attachment loaded into memory.
#[derive(Debug, Clone)]
pub struct LoadedMedia {
    pub mime_type: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl LoadedMedia {
    /// Reject anything that is not an image.
    pub fn ensure_image(self) -> Result<Self, WaError> {
        if self.mime_type.starts_with("image/") {
            Ok(self)
        } else {
            Err(WaError::InvalidInput(format!(
                "Unsupported media type: {}. Only images are supported",
                self.mime_type
            )))
        }
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

fn guess_mime(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn too_large(limit: u64) -> WaError {
    WaError::InvalidInput(format!("Media exceeds the {limit} byte limit"))
}

/// Fetch or read the bytes behind `source`, up to [`MAX_MEDIA_BYTES`].
pub async fn load(source: &MediaSource, client: &reqwest::Client) -> Result<LoadedMedia, WaError> {
    load_with_limit(source, client, MAX_MEDIA_BYTES).await
}

async fn load_with_limit(
    source: &MediaSource,
    client: &reqwest::Client,
    limit: u64,
) -> Result<LoadedMedia, WaError> {
    match source {
        MediaSource::Remote(url) => {
            let resp = client
                .get(url.clone())
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| WaError::internal_with(format!("Failed to fetch media from {url}"), e))?;
            let filename = url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .unwrap_or("media")
                .to_string();
            let mime_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or_default().trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| guess_mime(Path::new(&filename)));
            if resp.content_length().is_some_and(|len| len > limit) {
                return Err(too_large(limit));
            }
            let mut bytes = Vec::new();
            let mut body = resp.bytes_stream();
            while let Some(chunk) = body.next().await {
                let chunk =
                    chunk.map_err(|e| WaError::internal_with("Failed to read media body", e))?;
                if (bytes.len() + chunk.len()) as u64 > limit {
                    return Err(too_large(limit));
                }
                bytes.extend_from_slice(&chunk);
            }
            debug!(%url, %mime_type, size = bytes.len(), "fetched media");
            Ok(LoadedMedia {
                mime_type,
                filename,
                bytes,
            })
        }
        MediaSource::Local(path) => {
            let read_error = |e: std::io::Error| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WaError::NotFound(format!("Media file not found: {}", path.display()))
                } else {
                    WaError::internal_with(format!("Failed to read {}", path.display()), e)
                }
            };
            if tokio::fs::metadata(path).await.map_err(read_error)?.len() > limit {
                return Err(too_large(limit));
            }
            let bytes = tokio::fs::read(path).await.map_err(read_error)?;
            Ok(LoadedMedia {
                mime_type: guess_mime(path),
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "media".to_string()),
                bytes,
            })
        }
    }
}

/// Decode `media` and save it as `<sanitized-message-id>.<ext>` under `dir`.
pub async fn store(dir: &Path, message_id: &str, media: &WaMedia) -> Result<MediaDescriptor, WaError> {
    let bytes = STANDARD
        .decode(media.data.as_bytes())
        .map_err(|e| WaError::internal_with("Media payload is not valid base64", e))?;
    let filename = format!(
        "{}.{}",
        sanitize_file_stem(message_id),
        extension_for_mime(&media.mimetype)
    );
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| WaError::internal_with(format!("Failed to create {}", dir.display()), e))?;
    let path = dir.join(&filename);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| WaError::internal_with(format!("Failed to write {}", path.display()), e))?;

    Ok(MediaDescriptor {
        message_id: message_id.to_string(),
        file_path: path.display().to_string(),
        mime_type: media.mimetype.clone(),
        filename,
        size: bytes.len() as u64,
    })
}
