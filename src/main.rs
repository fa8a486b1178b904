use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use deckd::{config::DeckConfig, rest, AppContext};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deckd",
    about = "Deck Host — app/game source aggregation daemon",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP status server port
    #[arg(long, env = "DECKD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "DECKD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DECKD_LOG")]
    log: Option<String>,

    /// Bind address for the status server (default: 127.0.0.1)
    #[arg(long, env = "DECKD_BIND")]
    bind_address: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon server (default when no subcommand given).
    Serve,
    /// Query a running daemon's /status endpoint and print the reply.
    Status,
    /// Manage app sources.
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
    /// Manage the games library.
    Game {
        #[command(subcommand)]
        action: GameAction,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Add a remote app source by manifest URL.
    ///
    /// Fetches and validates the manifest before anything is stored; a bad
    /// URL or manifest leaves the registry untouched.
    Add { url: String },
    /// List registered sources and their entry counts.
    List,
    /// Re-fetch a source's manifest and replace its entries.
    Refresh { id: String },
    /// Remove a source and all entries attributed to it.
    Remove { id: String },
}

#[derive(Subcommand)]
enum GameAction {
    /// Add a game source URL (must serve a JSON array of games).
    AddUrl { url: String },
    /// List game source URLs.
    ListUrls,
    /// Remove a game source URL.
    RemoveUrl { url: String },
    /// Fetch all game sources and print the combined library.
    Fetch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = DeckConfig::new(args.port, args.data_dir, args.log, args.bind_address);

    let filter = EnvFilter::try_new(&config.log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Status => status(&config).await,
        Command::Source { action } => source_command(config, action).await,
        Command::Game { action } => game_command(config, action).await,
    }
}

async fn serve(config: DeckConfig) -> Result<()> {
    info!(
        data_dir = %config.data_dir.display(),
        port = config.port,
        "starting deckd v{}",
        env!("CARGO_PKG_VERSION")
    );
    let ctx = AppContext::init(config).await?;
    rest::start_status_server(ctx).await
}

async fn status(config: &DeckConfig) -> Result<()> {
    let url = format!("http://{}:{}/status", config.bind_address, config.port);
    let body = reqwest::get(&url)
        .await
        .with_context(|| format!("daemon not reachable at {url}"))?
        .error_for_status()?
        .text()
        .await?;
    println!("{body}");
    Ok(())
}

async fn source_command(config: DeckConfig, action: SourceAction) -> Result<()> {
    let ctx = AppContext::init(config).await?;
    match action {
        SourceAction::Add { url } => {
            let source = ctx.registry.add_source(&url).await?;
            let entries = ctx.registry.entries().await;
            let count = entries.iter().filter(|e| e.source == source.id).count();
            println!("added source {} ({}) with {count} entries", source.id, source.name);
        }
        SourceAction::List => {
            let entries = ctx.registry.entries().await;
            for source in ctx.registry.sources().await {
                let count = entries.iter().filter(|e| e.source == source.id).count();
                println!("{}\t{}\t{}\t{count} entries", source.id, source.name, source.url);
            }
        }
        SourceAction::Refresh { id } => {
            let refreshed = ctx.registry.refresh_source(&id).await?;
            println!("refreshed {id}: {} entries", refreshed.len());
        }
        SourceAction::Remove { id } => {
            ctx.registry.delete_source(&id).await?;
            println!("removed {id}");
        }
    }
    Ok(())
}

async fn game_command(config: DeckConfig, action: GameAction) -> Result<()> {
    let ctx = AppContext::init(config).await?;
    match action {
        GameAction::AddUrl { url } => {
            ctx.games.add_url(&url).await?;
            println!("added game source {url}");
        }
        GameAction::ListUrls => {
            for url in ctx.games.urls().await {
                println!("{url}");
            }
        }
        GameAction::RemoveUrl { url } => {
            ctx.games.remove_url(&url).await?;
            println!("removed game source {url}");
        }
        GameAction::Fetch => {
            let games = ctx.games.fetch_all().await?;
            for game in &games {
                println!("{}\t{}\t{:?}\t{}", game.id, game.title, game.platform, game.rating);
            }
            println!("{} games total", games.len());
        }
    }
    Ok(())
}
