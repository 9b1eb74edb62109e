//! levelcode: MCP server and command-line tool for level tokens
//!
//! `levelcode serve` (the default) speaks MCP over stdio. `encode` and
//! `decode` convert between tile layouts and tokens without a client.

use anyhow::Result;
use clap::{Parser, Subcommand};
use levelcode_core::{GameParams, Level};
use levelcode_server::config::DEFAULT_PREVIEW_SCALE;
use levelcode_server::{LevelServer, ServerConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "levelcode", version, about = "Level token MCP server and codec")]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the MCP server on stdio (the default)
    Serve,
    /// Encode a layout into a token
    Encode(EncodeArgs),
    /// Decode a token and print it as JSON
    Decode {
        /// Level token
        token: String,
    },
}

#[derive(Debug, clap::Args)]
struct ServeArgs {
    /// Prefix for play links; the token is appended to it
    #[arg(long, global = true, env = "LEVELCODE_GAME_URL")]
    game_url: Option<String>,

    /// Pixels per tile edge when a preview request gives no scale
    #[arg(
        long,
        global = true,
        env = "LEVELCODE_PREVIEW_SCALE",
        default_value_t = DEFAULT_PREVIEW_SCALE
    )]
    preview_scale: u32,
}

#[derive(Debug, clap::Args)]
struct EncodeArgs {
    /// One row of tile characters (".GRYIFSW"), top row first; repeat per row
    #[arg(short, long = "row", required = true)]
    rows: Vec<String>,

    #[arg(long)]
    max_enemies: Option<f64>,

    #[arg(long)]
    enemy_spawn_chance: Option<f64>,

    #[arg(long)]
    coin_spawn_chance: Option<f64>,
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // stdout carries the protocol, so logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        game_url: args.game_url,
        preview_scale: args.preview_scale,
        ..Default::default()
    };
    info!(
        "Serving {} v{} (game url: {:?})",
        config.name, config.version, config.game_url
    );

    LevelServer::new(config).run_stdio().await?;
    Ok(())
}

fn encode(args: EncodeArgs) -> Result<()> {
    let params = GameParams::new(
        args.max_enemies,
        args.enemy_spawn_chance,
        args.coin_spawn_chance,
    );
    let level = Level::from_layout(args.rows.as_slice())?.with_params(params);
    println!("{}", level.encode());
    Ok(())
}

fn decode(token: &str) -> Result<()> {
    let level = Level::decode(token)?;
    let body = serde_json::json!({
        "Width": level.width,
        "Height": level.height,
        "Layout": level.rows_as_text(),
        "Params": level.params,
        "Fingerprint": level.fingerprint(),
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        None | Some(Command::Serve) => serve(cli.serve).await,
        Some(Command::Encode(args)) => encode(args),
        Some(Command::Decode { token }) => decode(&token),
    }
}
