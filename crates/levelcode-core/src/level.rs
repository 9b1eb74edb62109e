//! Decoded levels and the edits the tool layer performs on them
//!
//! Tokens are immutable. Editing a level means decoding it, changing the grid
//! here, and encoding again.

use sha2::{Digest, Sha256};

use crate::codec::{self, check_dimensions};
use crate::error::{LevelError, Result};
use crate::params::GameParams;
use crate::tile::{Tile, char_for_id};

/// A decoded level: row-major tile ids plus gameplay parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub width: usize,
    pub height: usize,
    /// `height` rows of `width` tile ids
    pub grid: Vec<Vec<u8>>,
    pub params: GameParams,
}

impl Level {
    /// Blank level of the given size
    pub fn new(width: usize, height: usize) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            grid: vec![vec![Tile::Empty.id(); width]; height],
            params: GameParams::default(),
        })
    }

    /// Build from rows of tile ids, rejecting ragged rows and unknown ids
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self> {
        let grid = validate_rows(rows)?;
        let width = grid.first().map_or(0, Vec::len);
        let height = grid.len();
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            grid,
            params: GameParams::default(),
        })
    }

    /// Build from rows of tile characters such as `"..GG.R"`
    pub fn from_layout<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let mut grid = Vec::with_capacity(rows.len());
        for (r, text) in rows.iter().enumerate() {
            let row = text
                .as_ref()
                .chars()
                .enumerate()
                .map(|(c, ch)| {
                    Tile::from_char(ch).map(Tile::id).ok_or_else(|| {
                        LevelError::InvalidLayout(format!(
                            "unknown tile character '{ch}' at row {r}, col {c}"
                        ))
                    })
                })
                .collect::<Result<Vec<u8>>>()?;
            grid.push(row);
        }
        Self::from_rows(
            grid.into_iter()
                .map(|row| row.into_iter().map(i64::from).collect())
                .collect(),
        )
    }

    pub fn with_params(mut self, params: GameParams) -> Self {
        self.params = params.normalized();
        self
    }

    pub fn decode(token: &str) -> Result<Self> {
        codec::decode(token)
    }

    pub fn encode(&self) -> String {
        codec::encode(&self.grid, &self.params)
    }

    pub fn tile(&self, row: usize, col: usize) -> Option<Tile> {
        self.grid
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|&id| Tile::from_id(i64::from(id)))
    }

    /// Set one cell
    pub fn set_tile(&mut self, row: usize, col: usize, tile: i64) -> Result<()> {
        if row >= self.height || col >= self.width {
            return Err(self.out_of_bounds(row, col));
        }
        let id = tile_id(tile)?;
        self.grid[row][col] = id;
        Ok(())
    }

    /// Replace a whole row; `tiles` must have exactly `width` entries
    pub fn set_row(&mut self, row: usize, tiles: &[i64]) -> Result<()> {
        if row >= self.height {
            return Err(self.out_of_bounds(row, 0));
        }
        if tiles.len() != self.width {
            return Err(LevelError::RaggedGrid {
                row,
                len: tiles.len(),
                expected: self.width,
            });
        }
        let ids = tiles
            .iter()
            .map(|&t| tile_id(t))
            .collect::<Result<Vec<u8>>>()?;
        self.grid[row] = ids;
        Ok(())
    }

    /// Replace the whole grid, possibly changing the dimensions; params stay
    pub fn replace_grid(&mut self, rows: Vec<Vec<i64>>) -> Result<()> {
        let replacement = Self::from_rows(rows)?;
        self.width = replacement.width;
        self.height = replacement.height;
        self.grid = replacement.grid;
        Ok(())
    }

    pub fn set_params(&mut self, params: GameParams) {
        self.params = params.normalized();
    }

    /// Rows as tile-character strings
    pub fn rows_as_text(&self) -> Vec<String> {
        self.grid
            .iter()
            .map(|row| row.iter().map(|&id| char_for_id(id)).collect())
            .collect()
    }

    /// Hex SHA-256 of the canonical token
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.encode().as_bytes()))
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> LevelError {
        LevelError::OutOfBounds {
            row,
            col,
            width: self.width,
            height: self.height,
        }
    }
}

fn tile_id(tile: i64) -> Result<u8> {
    Tile::from_id(tile)
        .map(Tile::id)
        .ok_or(LevelError::InvalidTile(tile))
}

fn validate_rows(rows: Vec<Vec<i64>>) -> Result<Vec<Vec<u8>>> {
    let expected = rows.first().map_or(0, Vec::len);
    rows.into_iter()
        .enumerate()
        .map(|(r, row)| {
            if row.len() != expected {
                return Err(LevelError::RaggedGrid {
                    row: r,
                    len: row.len(),
                    expected,
                });
            }
            row.into_iter().map(tile_id).collect()
        })
        .collect()
}
