//! MCP tool handlers for level editing
//!
//! Every editing tool decodes its input token, applies one validated change
//! and answers with the re-encoded token. Tokens are never patched in place.

use levelcode_core::{GameParams, Level, LevelError, Result, error_codes};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::mcp::{RequestId, Response};
use crate::preview::render_level;

/// Tool definition for MCP tools/list
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn token_property() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "Level token returned by a previous levelcode tool call"
    })
}

fn param_properties() -> serde_json::Value {
    serde_json::json!({
        "MaxEnemies": {
            "type": "number",
            "description": "Maximum enemies alive at once"
        },
        "EnemySpawnChance": {
            "type": "number",
            "description": "Chance an enemy spawns per spawn tick (0-1)"
        },
        "CoinSpawnChance": {
            "type": "number",
            "description": "Chance a coin spawns per spawn tick (0-1)"
        }
    })
}

fn with_params(mut properties: serde_json::Value) -> serde_json::Value {
    if let (Some(target), serde_json::Value::Object(extra)) =
        (properties.as_object_mut(), param_properties())
    {
        target.extend(extra);
    }
    properties
}

/// Get list of available tools
pub fn list_tools() -> Vec<ToolDef> {
    let tile_ids = "Tile ids: 0 Empty, 1 Grass, 2 Rock, 3 Yellow, 4 Ice, 5 Fire, 6 Spikes, 7 Water";
    vec![
        ToolDef {
            name: "create_level".into(),
            description: format!(
                "Create a level token. Give exactly one of Width+Height (blank level), Layout (rows of tile characters \".GRYIFSW\") or Grid (rows of tile ids). Example: {{\"Layout\": [\"......\", \"GGGRRR\"]}}. {tile_ids}"
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_params(serde_json::json!({
                    "Width": { "type": "integer", "minimum": 0, "description": "Columns of a blank level" },
                    "Height": { "type": "integer", "minimum": 0, "description": "Rows of a blank level" },
                    "Layout": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Rows of tile characters, top row first"
                    },
                    "Grid": {
                        "type": "array",
                        "items": { "type": "array", "items": { "type": "integer", "minimum": 0, "maximum": 7 } },
                        "description": "Rows of tile ids, top row first"
                    }
                }))
            }),
        },
        ToolDef {
            name: "decode_level".into(),
            description: "Decode a level token into its dimensions, tile grid, layout rows and gameplay parameters".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": { "Token": token_property() },
                "required": ["Token"]
            }),
        },
        ToolDef {
            name: "set_tile".into(),
            description: format!("Set one tile and return the new token. Row 0 is the top row. {tile_ids}"),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "Token": token_property(),
                    "Row": { "type": "integer", "minimum": 0 },
                    "Col": { "type": "integer", "minimum": 0 },
                    "Tile": { "type": "integer", "minimum": 0, "maximum": 7 }
                },
                "required": ["Token", "Row", "Col", "Tile"]
            }),
        },
        ToolDef {
            name: "set_row".into(),
            description: format!("Replace a whole row; Tiles must have exactly Width entries. {tile_ids}"),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "Token": token_property(),
                    "Row": { "type": "integer", "minimum": 0 },
                    "Tiles": { "type": "array", "items": { "type": "integer", "minimum": 0, "maximum": 7 } }
                },
                "required": ["Token", "Row", "Tiles"]
            }),
        },
        ToolDef {
            name: "set_grid".into(),
            description: "Replace the whole grid (dimensions may change). Gameplay parameters are kept.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "Token": token_property(),
                    "Grid": {
                        "type": "array",
                        "items": { "type": "array", "items": { "type": "integer", "minimum": 0, "maximum": 7 } }
                    }
                },
                "required": ["Token", "Grid"]
            }),
        },
        ToolDef {
            name: "set_metadata".into(),
            description: "Set gameplay parameters. Omitted parameters keep their value unless Clear is true.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": with_params(serde_json::json!({
                    "Token": token_property(),
                    "Clear": {
                        "type": "boolean",
                        "description": "Drop all existing parameters before applying the given ones",
                        "default": false
                    }
                })),
                "required": ["Token"]
            }),
        },
        ToolDef {
            name: "preview_level".into(),
            description: "Render a level token to a PNG image".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "Token": token_property(),
                    "Scale": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 32,
                        "description": "Pixels per tile edge"
                    }
                },
                "required": ["Token"]
            }),
        },
        ToolDef {
            name: "level_fingerprint".into(),
            description: "SHA-256 of the canonical token; equal fingerprints mean equal levels".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": { "Token": token_property() },
                "required": ["Token"]
            }),
        },
    ]
}

/// Gameplay parameter arguments shared by several tools
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParamArgs {
    pub max_enemies: Option<f64>,
    pub enemy_spawn_chance: Option<f64>,
    pub coin_spawn_chance: Option<f64>,
}

impl From<ParamArgs> for GameParams {
    fn from(args: ParamArgs) -> Self {
        GameParams::new(
            args.max_enemies,
            args.enemy_spawn_chance,
            args.coin_spawn_chance,
        )
    }
}

/// Parameters for create_level
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateLevelParams {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub layout: Option<Vec<String>>,
    pub grid: Option<Vec<Vec<i64>>>,
    #[serde(flatten)]
    pub params: ParamArgs,
}

/// Parameters for tools that only take a token
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TokenParams {
    pub token: String,
}

/// Parameters for set_tile
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetTileParams {
    pub token: String,
    pub row: usize,
    pub col: usize,
    pub tile: i64,
}

/// Parameters for set_row
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetRowParams {
    pub token: String,
    pub row: usize,
    pub tiles: Vec<i64>,
}

/// Parameters for set_grid
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetGridParams {
    pub token: String,
    pub grid: Vec<Vec<i64>>,
}

/// Parameters for set_metadata
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SetMetadataParams {
    pub token: String,
    #[serde(default)]
    pub clear: bool,
    #[serde(flatten)]
    pub params: ParamArgs,
}

/// Parameters for preview_level
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreviewParams {
    pub token: String,
    pub scale: Option<u32>,
}

/// Token plus the facts a caller usually wants next to it
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LevelSummary {
    pub token: String,
    pub width: usize,
    pub height: usize,
    pub params: GameParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub play_url: Option<String>,
}

impl LevelSummary {
    pub fn new(level: &Level, config: &ServerConfig) -> Self {
        let token = level.encode();
        Self {
            play_url: config.play_url(&token),
            token,
            width: level.width,
            height: level.height,
            params: level.params,
        }
    }
}

/// Result of a tool before it is wrapped into MCP content
#[derive(Debug)]
pub enum ToolOutput {
    Json(serde_json::Value),
    Image {
        png_base64: String,
        details: serde_json::Value,
    },
}

impl ToolOutput {
    fn into_content(self) -> serde_json::Value {
        match self {
            ToolOutput::Json(value) => serde_json::json!({
                "content": [{ "type": "text", "text": value.to_string() }]
            }),
            ToolOutput::Image {
                png_base64,
                details,
            } => serde_json::json!({
                "content": [
                    { "type": "image", "data": png_base64, "mimeType": "image/png" },
                    { "type": "text", "text": details.to_string() }
                ]
            }),
        }
    }
}

/// JSON-RPC error code for a level error
pub fn error_code(err: &LevelError) -> i32 {
    match err {
        e if e.is_structural() => error_codes::INVALID_TOKEN,
        LevelError::InvalidTile(_) | LevelError::InvalidLayout(_) => error_codes::INVALID_TILE,
        LevelError::OutOfBounds { .. } => error_codes::OUT_OF_BOUNDS,
        LevelError::RaggedGrid { .. } => error_codes::INVALID_GRID,
        LevelError::PreviewError(_) => error_codes::PREVIEW_FAILED,
        LevelError::SerializationError(_) | LevelError::ProtocolError(_) => {
            error_codes::INVALID_PARAMS
        }
        _ => error_codes::INTERNAL_ERROR,
    }
}

/// Handle a tools/call request
pub fn handle_tool_call(
    name: &str,
    params: serde_json::Value,
    id: RequestId,
    config: &ServerConfig,
) -> Response {
    let result = match name {
        "create_level" => handle_create_level(params, config),
        "decode_level" => handle_decode_level(params),
        "set_tile" => handle_set_tile(params, config),
        "set_row" => handle_set_row(params, config),
        "set_grid" => handle_set_grid(params, config),
        "set_metadata" => handle_set_metadata(params, config),
        "preview_level" => handle_preview_level(params, config),
        "level_fingerprint" => handle_fingerprint(params),
        _ => Err(LevelError::ProtocolError(format!("Unknown tool: {}", name))),
    };

    match result {
        Ok(output) => Response::success(id, output.into_content()),
        Err(e) => Response::error(id, error_code(&e), e.to_string()),
    }
}

fn summary(level: &Level, config: &ServerConfig) -> Result<ToolOutput> {
    Ok(ToolOutput::Json(serde_json::to_value(LevelSummary::new(
        level, config,
    ))?))
}

fn handle_create_level(params: serde_json::Value, config: &ServerConfig) -> Result<ToolOutput> {
    let p: CreateLevelParams = serde_json::from_value(params)?;

    let level = match (p.grid, p.layout, p.width, p.height) {
        (Some(grid), None, None, None) => Level::from_rows(grid)?,
        (None, Some(layout), None, None) => Level::from_layout(layout.as_slice())?,
        (None, None, Some(width), Some(height)) => Level::new(width, height)?,
        _ => {
            return Err(LevelError::ProtocolError(
                "give exactly one of Width+Height, Layout or Grid".into(),
            ));
        }
    };
    let level = level.with_params(p.params.into());

    summary(&level, config)
}

fn handle_decode_level(params: serde_json::Value) -> Result<ToolOutput> {
    let p: TokenParams = serde_json::from_value(params)?;
    let level = Level::decode(&p.token)?;

    Ok(ToolOutput::Json(serde_json::json!({
        "Width": level.width,
        "Height": level.height,
        "Grid": level.grid,
        "Layout": level.rows_as_text(),
        "Params": level.params,
    })))
}

fn handle_set_tile(params: serde_json::Value, config: &ServerConfig) -> Result<ToolOutput> {
    let p: SetTileParams = serde_json::from_value(params)?;
    let mut level = Level::decode(&p.token)?;
    level.set_tile(p.row, p.col, p.tile)?;
    summary(&level, config)
}

fn handle_set_row(params: serde_json::Value, config: &ServerConfig) -> Result<ToolOutput> {
    let p: SetRowParams = serde_json::from_value(params)?;
    let mut level = Level::decode(&p.token)?;
    level.set_row(p.row, &p.tiles)?;
    summary(&level, config)
}

fn handle_set_grid(params: serde_json::Value, config: &ServerConfig) -> Result<ToolOutput> {
    let p: SetGridParams = serde_json::from_value(params)?;
    let mut level = Level::decode(&p.token)?;
    level.replace_grid(p.grid)?;
    summary(&level, config)
}

fn handle_set_metadata(params: serde_json::Value, config: &ServerConfig) -> Result<ToolOutput> {
    let p: SetMetadataParams = serde_json::from_value(params)?;
    let mut level = Level::decode(&p.token)?;

    let base = if p.clear {
        GameParams::default()
    } else {
        level.params
    };
    level.set_params(base.merge(p.params.into()));

    summary(&level, config)
}

fn handle_preview_level(params: serde_json::Value, config: &ServerConfig) -> Result<ToolOutput> {
    let p: PreviewParams = serde_json::from_value(params)?;
    let level = Level::decode(&p.token)?;
    let preview = render_level(&level, p.scale.unwrap_or(config.preview_scale))?;

    Ok(ToolOutput::Image {
        png_base64: preview.to_base64(),
        details: serde_json::json!({
            "Width": level.width,
            "Height": level.height,
            "ImageWidth": preview.width,
            "ImageHeight": preview.height,
            "Scale": preview.scale,
        }),
    })
}

fn handle_fingerprint(params: serde_json::Value) -> Result<ToolOutput> {
    let p: TokenParams = serde_json::from_value(params)?;
    let level = Level::decode(&p.token)?;
    Ok(ToolOutput::Json(
        serde_json::json!({ "Fingerprint": level.fingerprint() }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: serde_json::Value) -> Response {
        handle_tool_call(name, args, RequestId::Number(1), &ServerConfig::default())
    }

    /// Parse the JSON text block of a successful tool response
    fn text_of(response: &Response) -> serde_json::Value {
        assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
        let result = response.result.as_ref().unwrap();
        let text = result["content"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["type"] == "text")
            .and_then(|c| c["text"].as_str())
            .unwrap();
        serde_json::from_str(text).unwrap()
    }

    fn token_of(response: &Response) -> String {
        text_of(response)["Token"].as_str().unwrap().to_string()
    }

    fn error_code_of(response: &Response) -> i32 {
        response.error.as_ref().expect("expected an error").code
    }

    #[test]
    fn test_tool_list_names() {
        let names: Vec<String> = list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "create_level",
                "decode_level",
                "set_tile",
                "set_row",
                "set_grid",
                "set_metadata",
                "preview_level",
                "level_fingerprint"
            ]
        );
        let tools = list_tools();
        let create = &tools[0];
        assert!(create.input_schema["properties"]["MaxEnemies"].is_object());
    }

    #[test]
    fn test_create_from_grid_matches_codec() {
        let response = call("create_level", json!({ "Grid": [[1, 0, 0], [0, 0, 2]] }));
        let body = text_of(&response);
        assert_eq!(body["Token"], "M3gyOkcuNFI");
        assert_eq!(body["Width"], 3);
        assert_eq!(body["Height"], 2);
        assert_eq!(body["Params"], json!({}));
        assert!(body.get("PlayUrl").is_none());
    }

    #[test]
    fn test_create_from_layout_with_params() {
        let response = call(
            "create_level",
            json!({ "Layout": ["....", "GGRR"], "MaxEnemies": 3, "CoinSpawnChance": 0.2 }),
        );
        let token = token_of(&response);
        let level = Level::decode(&token).unwrap();
        assert_eq!(level.rows_as_text(), vec!["....", "GGRR"]);
        assert_eq!(level.params, GameParams::new(Some(3.0), None, Some(0.2)));
    }

    #[test]
    fn test_create_requires_one_source() {
        let response = call("create_level", json!({}));
        assert_eq!(error_code_of(&response), error_codes::INVALID_PARAMS);

        let response = call("create_level", json!({ "Width": 2, "Height": 2, "Layout": [".."] }));
        assert_eq!(error_code_of(&response), error_codes::INVALID_PARAMS);

        let response = call("create_level", json!({ "Layout": ["G?"] }));
        assert_eq!(error_code_of(&response), error_codes::INVALID_TILE);
    }

    #[test]
    fn test_play_url_included_when_configured() {
        let config = ServerConfig::with_game_url("https://play.example/?level=");
        let response = handle_tool_call(
            "create_level",
            json!({ "Width": 3, "Height": 1 }),
            RequestId::Number(1),
            &config,
        );
        let body = text_of(&response);
        let token = body["Token"].as_str().unwrap();
        assert_eq!(
            body["PlayUrl"],
            format!("https://play.example/?level={token}")
        );
    }

    #[test]
    fn test_decode_level() {
        let response = call("decode_level", json!({ "Token": "M3gyOkcuNFI" }));
        let body = text_of(&response);
        assert_eq!(body["Grid"], json!([[1, 0, 0], [0, 0, 2]]));
        assert_eq!(body["Layout"], json!(["G..", "..R"]));
        assert_eq!(body["Params"], json!({}));
    }

    #[test]
    fn test_structural_failure_is_not_an_empty_level() {
        // base64url of "not-a-level"
        let response = call("decode_level", json!({ "Token": "bm90LWEtbGV2ZWw" }));
        assert_eq!(error_code_of(&response), error_codes::INVALID_TOKEN);
        assert!(response.result.is_none());

        let response = call(
            "set_tile",
            json!({ "Token": "bm90LWEtbGV2ZWw", "Row": 0, "Col": 0, "Tile": 1 }),
        );
        assert_eq!(error_code_of(&response), error_codes::INVALID_TOKEN);
    }

    #[test]
    fn test_set_tile_and_row() {
        let token = token_of(&call("create_level", json!({ "Width": 4, "Height": 2 })));

        let token = token_of(&call(
            "set_tile",
            json!({ "Token": token, "Row": 1, "Col": 3, "Tile": 7 }),
        ));
        let token = token_of(&call(
            "set_row",
            json!({ "Token": token, "Row": 0, "Tiles": [1, 1, 2, 2] }),
        ));

        let level = Level::decode(&token).unwrap();
        assert_eq!(level.rows_as_text(), vec!["GGRR", "...W"]);
    }

    #[test]
    fn test_edit_validation_errors() {
        let token = token_of(&call("create_level", json!({ "Width": 2, "Height": 2 })));

        let response = call("set_tile", json!({ "Token": token, "Row": 2, "Col": 0, "Tile": 1 }));
        assert_eq!(error_code_of(&response), error_codes::OUT_OF_BOUNDS);

        let response = call("set_tile", json!({ "Token": token, "Row": 0, "Col": 0, "Tile": 8 }));
        assert_eq!(error_code_of(&response), error_codes::INVALID_TILE);

        let response = call("set_tile", json!({ "Token": token, "Row": -1, "Col": 0, "Tile": 1 }));
        assert_eq!(error_code_of(&response), error_codes::INVALID_PARAMS);

        let response = call("set_row", json!({ "Token": token, "Row": 0, "Tiles": [1] }));
        assert_eq!(error_code_of(&response), error_codes::INVALID_GRID);
    }

    #[test]
    fn test_set_grid_keeps_params() {
        let token = token_of(&call(
            "create_level",
            json!({ "Width": 2, "Height": 2, "EnemySpawnChance": 0.4 }),
        ));
        let response = call("set_grid", json!({ "Token": token, "Grid": [[5, 5, 5]] }));
        let body = text_of(&response);
        assert_eq!((body["Width"].clone(), body["Height"].clone()), (json!(3), json!(1)));
        assert_eq!(body["Params"], json!({ "enemySpawnChance": 0.4 }));
    }

    #[test]
    fn test_set_metadata_merge_and_clear() {
        let token = token_of(&call(
            "create_level",
            json!({ "Width": 1, "Height": 1, "MaxEnemies": 2 }),
        ));

        let merged = call("set_metadata", json!({ "Token": token, "CoinSpawnChance": 0.5 }));
        assert_eq!(
            text_of(&merged)["Params"],
            json!({ "maxEnemies": 2, "coinSpawnChance": 0.5 })
        );

        let cleared = call("set_metadata", json!({ "Token": token, "Clear": true }));
        let cleared_token = token_of(&cleared);
        assert_eq!(text_of(&cleared)["Params"], json!({}));
        assert!(Level::decode(&cleared_token).unwrap().params.is_empty());
    }

    #[test]
    fn test_preview_returns_image_content() {
        let token = token_of(&call("create_level", json!({ "Layout": ["GR", "WW"] })));
        let response = call("preview_level", json!({ "Token": token, "Scale": 3 }));
        let content = response.result.as_ref().unwrap()["content"].as_array().unwrap().clone();
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["mimeType"], "image/png");
        assert!(!content[0]["data"].as_str().unwrap().is_empty());

        let details = text_of(&response);
        assert_eq!(details["ImageWidth"], 6);
        assert_eq!(details["Scale"], 3);
    }

    #[test]
    fn test_fingerprint_ignores_encoding_differences() {
        // Same level, once without and once with base64 padding
        let a = call("level_fingerprint", json!({ "Token": "M3gxOi4uLg" }));
        let b = call("level_fingerprint", json!({ "Token": "M3gxOi4uLg==" }));
        assert_eq!(text_of(&a)["Fingerprint"], text_of(&b)["Fingerprint"]);
    }

    #[test]
    fn test_unknown_tool() {
        let response = call("delete_level", json!({}));
        assert_eq!(error_code_of(&response), error_codes::INVALID_PARAMS);
        assert!(response.error.unwrap().message.contains("Unknown tool"));
    }
}
