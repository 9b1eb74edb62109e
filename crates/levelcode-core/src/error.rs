//! Error types for levelcode

use thiserror::Error;

/// Result type for levelcode operations
pub type Result<T> = std::result::Result<T, LevelError>;

/// Levelcode error types
///
/// Only the first three variants can come out of [`crate::codec::decode`];
/// everything else a token might carry is normalized instead of rejected.
#[derive(Debug, Error)]
pub enum LevelError {
    /// Token is not valid URL-safe base64
    #[error("Invalid token encoding: {0}")]
    InvalidEncoding(String),

    /// Decoded payload has no parsable `{width}x{height}:` header
    #[error("Malformed level payload: {0}")]
    MalformedPayload(String),

    /// Declared dimensions exceed the cell budget
    #[error("Level too large: {width}x{height} exceeds {max} cells")]
    TooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    /// Rows of a grid disagree on width
    #[error("Ragged grid: row {row} has {len} tiles, expected {expected}")]
    RaggedGrid {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// Tile id outside the alphabet
    #[error("Invalid tile id {0}, expected 0-7")]
    InvalidTile(i64),

    /// Cell or row index outside the level
    #[error("Position out of bounds: row {row}, col {col} (level is {width}x{height})")]
    OutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },

    /// Layout text contains a character outside the alphabet
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Preview rendering error
    #[error("Preview error: {0}")]
    PreviewError(String),

    /// Protocol error
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// I/O error on the transport
    #[error("IO error: {0}")]
    IoError(String),
}

impl LevelError {
    /// True for failures that mean the token does not describe a level at all
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            LevelError::InvalidEncoding(_)
                | LevelError::MalformedPayload(_)
                | LevelError::TooLarge { .. }
        )
    }
}

impl From<serde_json::Error> for LevelError {
    fn from(err: serde_json::Error) -> Self {
        LevelError::SerializationError(err.to_string())
    }
}

/// JSON-RPC error codes for levelcode
pub mod error_codes {
    pub const INVALID_TOKEN: i32 = -32000;
    pub const INVALID_TILE: i32 = -32001;
    pub const OUT_OF_BOUNDS: i32 = -32002;
    pub const INVALID_GRID: i32 = -32003;
    pub const PREVIEW_FAILED: i32 = -32004;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}
