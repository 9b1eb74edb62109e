//! Gameplay parameters carried alongside the grid

use base64::Engine;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};

use crate::codec::TOKEN_ENGINE;

/// JSON.stringify writes integral values below this magnitude as plain digits
const JS_EXPONENT_THRESHOLD: f64 = 1e21;

/// Sparse set of gameplay knobs
///
/// A field is present only when it holds a finite value. Absent fields are
/// left out of the wire form entirely; defaults belong to the game runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameParams {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "js_number")]
    pub max_enemies: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "js_number")]
    pub enemy_spawn_chance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "js_number")]
    pub coin_spawn_chance: Option<f64>,
}

/// Write integral values without a fractional part, the way JSON.stringify does
fn js_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < JS_EXPONENT_THRESHOLD => {
            // Shortest round-trip digits padded with zeros, not the exact binary value
            let digits: i128 = format!("{v}").parse().map_err(S::Error::custom)?;
            serializer.serialize_i128(digits)
        }
        Some(v) if v.is_finite() => serializer.serialize_f64(*v),
        _ => serializer.serialize_none(),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl GameParams {
    pub fn new(
        max_enemies: Option<f64>,
        enemy_spawn_chance: Option<f64>,
        coin_spawn_chance: Option<f64>,
    ) -> Self {
        Self {
            max_enemies,
            enemy_spawn_chance,
            coin_spawn_chance,
        }
        .normalized()
    }

    /// Drop every non-finite value
    pub fn normalized(self) -> Self {
        Self {
            max_enemies: finite(self.max_enemies),
            enemy_spawn_chance: finite(self.enemy_spawn_chance),
            coin_spawn_chance: finite(self.coin_spawn_chance),
        }
    }

    pub fn is_empty(&self) -> bool {
        let p = self.normalized();
        p.max_enemies.is_none() && p.enemy_spawn_chance.is_none() && p.coin_spawn_chance.is_none()
    }

    /// Overlay the present values of `other` onto `self`
    pub fn merge(self, other: GameParams) -> Self {
        let other = other.normalized();
        Self {
            max_enemies: other.max_enemies.or(self.max_enemies),
            enemy_spawn_chance: other.enemy_spawn_chance.or(self.enemy_spawn_chance),
            coin_spawn_chance: other.coin_spawn_chance.or(self.coin_spawn_chance),
        }
        .normalized()
    }

    /// Compact JSON object of the present values, keys in wire order
    pub fn to_json(&self) -> String {
        // Serializing a struct of optional numbers into a String cannot fail
        serde_json::to_string(&self.normalized()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a JSON object leniently; anything unusable reads as absent
    pub fn from_json(text: &str) -> Self {
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(text)
        else {
            return Self::default();
        };
        let number = |key: &str| map.get(key).and_then(serde_json::Value::as_f64);
        Self::new(
            number("maxEnemies"),
            number("enemySpawnChance"),
            number("coinSpawnChance"),
        )
    }

    /// The nested base64url block appended after `|`, or `None` when empty
    pub fn encode_block(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(TOKEN_ENGINE.encode(self.to_json()))
    }

    /// Inverse of [`GameParams::encode_block`]; corrupt blocks read as empty
    pub fn decode_block(block: &str) -> Self {
        match TOKEN_ENGINE.decode(block) {
            Ok(bytes) => Self::from_json(&String::from_utf8_lossy(&bytes)),
            Err(_) => Self::default(),
        }
    }
}
