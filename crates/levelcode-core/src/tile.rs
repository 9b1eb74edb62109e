//! Tile alphabet
//!
//! A single table maps every tile id to its wire character, display name and
//! preview colour. All lookups in either direction are derived from [`TILES`].

use serde::Serialize;

/// A tile in the level grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Tile {
    Empty = 0,
    Grass = 1,
    Rock = 2,
    Yellow = 3,
    Ice = 4,
    Fire = 5,
    Spikes = 6,
    Water = 7,
}

/// One row of the alphabet table
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TileInfo {
    pub tile: Tile,
    pub id: u8,
    pub char: char,
    pub name: &'static str,
    /// RGB fill used by previews
    pub color: [u8; 3],
}

/// The authoritative tile table, indexed by id
pub static TILES: [TileInfo; 8] = [
    TileInfo { tile: Tile::Empty, id: 0, char: '.', name: "Empty", color: [0x87, 0xCE, 0xEB] },
    TileInfo { tile: Tile::Grass, id: 1, char: 'G', name: "Grass", color: [0x4C, 0xAF, 0x50] },
    TileInfo { tile: Tile::Rock, id: 2, char: 'R', name: "Rock", color: [0x79, 0x55, 0x48] },
    TileInfo { tile: Tile::Yellow, id: 3, char: 'Y', name: "Yellow", color: [0xFF, 0xD5, 0x4F] },
    TileInfo { tile: Tile::Ice, id: 4, char: 'I', name: "Ice", color: [0xB3, 0xE5, 0xFC] },
    TileInfo { tile: Tile::Fire, id: 5, char: 'F', name: "Fire", color: [0xF4, 0x51, 0x1E] },
    TileInfo { tile: Tile::Spikes, id: 6, char: 'S', name: "Spikes", color: [0x9E, 0x9E, 0x9E] },
    TileInfo { tile: Tile::Water, id: 7, char: 'W', name: "Water", color: [0x1E, 0x88, 0xE5] },
];

/// Wire character of the empty tile, the only run-length compressed symbol
pub const EMPTY_CHAR: char = '.';

impl Tile {
    /// Look up a tile by id, `None` outside 0-7
    pub fn from_id(id: i64) -> Option<Tile> {
        usize::try_from(id)
            .ok()
            .and_then(|i| TILES.get(i))
            .map(|info| info.tile)
    }

    /// Look up a tile by wire character
    pub fn from_char(c: char) -> Option<Tile> {
        TILES.iter().find(|info| info.char == c).map(|info| info.tile)
    }

    pub fn info(self) -> &'static TileInfo {
        &TILES[self as usize]
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn to_char(self) -> char {
        self.info().char
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn color(self) -> [u8; 3] {
        self.info().color
    }
}

/// Wire character for a raw id; anything outside the alphabet becomes empty
pub fn char_for_id(id: u8) -> char {
    Tile::from_id(i64::from(id))
        .unwrap_or(Tile::Empty)
        .to_char()
}

/// Raw id for a wire character; anything outside the alphabet becomes 0
pub fn id_for_char(c: char) -> u8 {
    Tile::from_char(c).unwrap_or(Tile::Empty).id()
}
