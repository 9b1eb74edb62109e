//! # levelcode-core
//!
//! Core types for levelcode tokens.
//!
//! This crate provides the pieces every levelcode consumer shares:
//! - The tile alphabet (id, wire character, name, preview colour)
//! - Sparse gameplay parameters
//! - The URL-safe token codec
//! - Decoded levels and validated edits

pub mod codec;
pub mod error;
pub mod level;
pub mod params;
pub mod tile;

pub use codec::{MAX_CELLS, decode, encode};
pub use error::{LevelError, Result, error_codes};
pub use level::Level;
pub use params::GameParams;
pub use tile::{TILES, Tile, TileInfo};
