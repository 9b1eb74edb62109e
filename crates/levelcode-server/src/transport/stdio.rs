//! stdio transport for MCP JSON-RPC

use crate::LevelServer;
use crate::mcp::{
    InitializeParams, InitializeResult, PROTOCOL_VERSION, Request, RequestId, ResourcesCapability,
    Response, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::tools::{handle_tool_call, list_tools};
use levelcode_core::{LevelError, Result, TILES, error_codes};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

const TILES_URI: &str = "level://tiles";
const FORMAT_URI: &str = "level://format";

const FORMAT_DESCRIPTION: &str = "\
A level token is unpadded URL-safe base64 (RFC 4648 section 5) of the UTF-8 text

    {width}x{height}:{tiles}[|{params}]

tiles: the grid row-major, one character per tile from the alphabet \".GRYIFSW\"
(ids 0-7). Any run of more than two empty tiles '.' is written as '.' followed by
the decimal run length, so \"G....R\" becomes \"G.4R\".

params: optional, unpadded URL-safe base64 of a JSON object holding any of
maxEnemies, enemySpawnChance and coinSpawnChance. Omitted when none are set.

Decoding rejects a missing or unparsable {width}x{height}: header. Unknown tile
characters and short tile bodies decode as empty tiles; an unreadable params
block decodes as no params.
";

/// Run the MCP server on stdio
pub async fn run(server: LevelServer) -> Result<()> {
    info!("levelcode MCP server starting on stdio");
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve(reader, writer, &server).await
}

/// Serve line-delimited JSON-RPC until the reader hits EOF
pub async fn serve<R, W>(mut reader: R, mut writer: W, server: &LevelServer) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .map_err(|e| LevelError::IoError(format!("Failed to read stdin: {}", e)))?;

        if bytes_read == 0 {
            // EOF - client disconnected
            info!("Client disconnected (EOF)");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!("Received: {}", trimmed);

        let request: Request = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                continue;
            }
        };

        let Some(response) = handle_request(&request, server) else {
            debug!("Notification handled: {}", request.method);
            continue;
        };
        let response_json = serde_json::to_string(&response)?;

        debug!("Sending: {}", response_json);

        writer
            .write_all(response_json.as_bytes())
            .await
            .map_err(|e| LevelError::IoError(format!("Failed to write stdout: {}", e)))?;
        writer
            .write_all(b"\n")
            .await
            .map_err(|e| LevelError::IoError(format!("Failed to write newline: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| LevelError::IoError(format!("Failed to flush stdout: {}", e)))?;
    }

    Ok(())
}

/// Dispatch one request; notifications yield no response
pub fn handle_request(request: &Request, server: &LevelServer) -> Option<Response> {
    let Some(id) = request.id.clone() else {
        if !request.method.starts_with("notifications/") {
            warn!("Ignoring request without id: {}", request.method);
        }
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(id, request, server),
        "ping" => Response::success(id, serde_json::json!({})),
        "tools/list" => Response::success(id, serde_json::json!({ "tools": list_tools() })),
        "tools/call" => handle_tools_call(id, request, server),
        "resources/list" => handle_resources_list(id),
        "resources/read" => handle_resources_read(id, request),
        _ => Response::error(id, -32601, format!("Method not found: {}", request.method)),
    };
    Some(response)
}

fn handle_initialize(id: RequestId, request: &Request, server: &LevelServer) -> Response {
    let params: InitializeParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid initialize params: {}", e),
            );
        }
    };
    info!(
        "Client connected: {} {} (protocol {})",
        params.client_info.name, params.client_info.version, params.protocol_version
    );

    let config = server.config();
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
            resources: ResourcesCapability {
                subscribe: false,
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: config.name.clone(),
            version: config.version.clone(),
        },
        instructions: Some(
            "Levels are passed around as tokens. Create one with create_level, edit it with \
             set_tile/set_row/set_grid/set_metadata (each returns a new token), inspect it \
             with decode_level and look at it with preview_level."
                .to_string(),
        ),
    };

    match serde_json::to_value(result) {
        Ok(value) => Response::success(id, value),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

fn handle_tools_call(id: RequestId, request: &Request, server: &LevelServer) -> Response {
    #[derive(serde::Deserialize)]
    struct ToolCallParams {
        name: String,
        #[serde(default)]
        arguments: serde_json::Value,
    }

    let params: ToolCallParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid tool call params: {}", e),
            );
        }
    };

    debug!("Tool call: {}", params.name);
    handle_tool_call(&params.name, params.arguments, id, server.config())
}

fn handle_resources_list(id: RequestId) -> Response {
    let resources = vec![
        serde_json::json!({
            "uri": TILES_URI,
            "name": "Tile Alphabet",
            "description": "Tile ids, wire characters, names and preview colours",
            "mimeType": "application/json"
        }),
        serde_json::json!({
            "uri": FORMAT_URI,
            "name": "Token Format",
            "description": "How level tokens are laid out",
            "mimeType": "text/plain"
        }),
    ];

    Response::success(id, serde_json::json!({ "resources": resources }))
}

fn handle_resources_read(id: RequestId, request: &Request) -> Response {
    #[derive(serde::Deserialize)]
    struct ReadParams {
        uri: String,
    }

    let params: ReadParams = match serde_json::from_value(request.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Invalid read params: {}", e),
            );
        }
    };

    let (mime_type, text) = match params.uri.as_str() {
        TILES_URI => (
            "application/json",
            serde_json::json!({ "tiles": TILES }).to_string(),
        ),
        FORMAT_URI => ("text/plain", FORMAT_DESCRIPTION.to_string()),
        _ => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("Unknown resource: {}", params.uri),
            );
        }
    };

    Response::success(
        id,
        serde_json::json!({
            "contents": [{
                "uri": params.uri,
                "mimeType": mime_type,
                "text": text
            }]
        }),
    )
}
