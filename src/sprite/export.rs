use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;
use std::path::PathBuf;
use tracing::debug;

use crate::state::data::GeneratedImage;

/// Size of the quick "game asset" export (square)
pub const DEFAULT_EXPORT_SIZE: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("not a base64 data URI: {0}")]
    InvalidDataUri(String),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> Result<Self, ExportError> {
        let invalid = || ExportError::InvalidDataUri(preview(uri));

        let rest = uri.strip_prefix("data:").ok_or_else(invalid)?;
        let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes: BASE64.decode(payload.trim())?,
        })
    }
}

/// A file ready to be saved: suggested name plus contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn original_file_name(id: &str) -> String {
    format!("sprite-{}-original.png", id)
}

pub fn resized_file_name(id: &str, size: u32) -> String {
    format!("sprite-{}-{}x{}.png", id, size, size)
}

/// Export the stored image bytes unchanged
pub fn export_original(record: &GeneratedImage) -> Result<ExportArtifact, ExportError> {
    let decoded = DataUri::parse(&record.image_data)?;
    debug!("Exporting original {} ({}, {} bytes)", record.id, decoded.mime_type, decoded.bytes.len());
    Ok(ExportArtifact {
        file_name: original_file_name(&record.id),
        bytes: decoded.bytes,
    })
}

/// Export a `size`×`size` PNG scaled with nearest-neighbor sampling
pub fn export_resized(record: &GeneratedImage, size: u32) -> Result<ExportArtifact, ExportError> {
    let decoded = DataUri::parse(&record.image_data)?;
    let bytes = resize_nearest(&decoded.bytes, size)?;
    Ok(ExportArtifact {
        file_name: resized_file_name(&record.id, size),
        bytes,
    })
}

/// Decode any supported format, stretch to a square and re-encode as PNG
fn resize_nearest(image_bytes: &[u8], size: u32) -> Result<Vec<u8>, ExportError> {
    let img = image::load_from_memory(image_bytes)?;

    // Non-square sources are stretched, not letterboxed
    let resized = img.resize_exact(size, size, FilterType::Nearest);

    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Directory offered first in the save dialog
/// Returns ~/Downloads when it exists, else the home directory
pub fn default_export_dir() -> Option<PathBuf> {
    dirs::download_dir().or_else(dirs::home_dir)
}

/// Write an artifact to disk
pub async fn save_artifact(artifact: ExportArtifact, path: PathBuf) -> Result<PathBuf, ExportError> {
    tokio::fs::write(&path, &artifact.bytes).await?;
    Ok(path)
}

/// Short, log-safe prefix of a possibly huge URI
fn preview(uri: &str) -> String {
    uri.chars().take(32).collect()
}
