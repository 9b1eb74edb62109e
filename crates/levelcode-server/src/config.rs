//! Server configuration

/// Default pixels per tile edge in previews
pub const DEFAULT_PREVIEW_SCALE: u32 = 16;

/// Configuration for the levelcode MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name reported on initialize
    pub name: String,
    /// Server version reported on initialize
    pub version: String,
    /// Prefix a token is appended to when building play links,
    /// e.g. `https://example.com/play?level=`
    pub game_url: Option<String>,
    /// Pixels per tile edge when a preview request gives no scale
    pub preview_scale: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "levelcode".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            game_url: None,
            preview_scale: DEFAULT_PREVIEW_SCALE,
        }
    }
}

impl ServerConfig {
    /// Create config with a play link prefix
    pub fn with_game_url(game_url: impl Into<String>) -> Self {
        Self {
            game_url: Some(game_url.into()),
            ..Default::default()
        }
    }

    /// Play link for a token, if a game URL is configured
    pub fn play_url(&self, token: &str) -> Option<String> {
        self.game_url
            .as_deref()
            .filter(|base| !base.is_empty())
            .map(|base| format!("{base}{token}"))
    }
}
