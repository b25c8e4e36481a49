/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the shell, the history store and the UI layer.

use chrono::{DateTime, Utc};

/// Pixel dimensions the image model produces when it reports none
pub const MODEL_DEFAULT_SIZE: u32 = 1024;

/// Represents a single generated sprite in the session history
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Image payload as a `data:<mime>;base64,...` URI
    pub image_data: String,
    /// The exact prompt text that produced this image
    pub prompt: String,
    /// When the generation completed
    pub created_at: DateTime<Utc>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl GeneratedImage {
    /// Build a record for a freshly generated image with a new identifier
    pub fn new(image_data: String, prompt: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            image_data,
            prompt,
            created_at: Utc::now(),
            width: MODEL_DEFAULT_SIZE,
            height: MODEL_DEFAULT_SIZE,
        }
    }
}

/// Lifecycle of the generation request owned by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Pending => "pending",
            RequestState::Succeeded => "succeeded",
            RequestState::Failed => "failed",
        }
    }
}
