//! Arcade error types
//!
//! The simulation core never fails; these only surface at the browser edge
//! (drawing surface, storage, config parsing).

/// Errors raised by the browser shell and storage collaborators
#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    #[error("Drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Unknown game id: {0}")]
    UnknownGame(String),

    #[error("Browser API error: {0}")]
    Browser(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArcadeError>;
