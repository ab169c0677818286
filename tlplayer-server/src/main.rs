use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tlplayer_common::{LogConfig, init_logging};
use tlplayer_config::{TlplayerConfig, TlplayerConfigLoader};
use tlplayer_server::{AppState, router, serve};

const DEFAULT_CONFIG: &str = "tlplayer.yaml";

/// Serve the timeline media player.
#[derive(Debug, Parser)]
#[command(name = "tlplayer", version)]
struct Cli {
    /// Configuration file. Without it `tlplayer.yaml` is read when present.
    #[arg(short, long, env = "TLPLAYER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => TlplayerConfigLoader::new().with_file(path),
        None => TlplayerConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let cfg: TlplayerConfig = loader.load()?;

    // 2) Logging
    let log_path = init_logging(LogConfig {
        app_name: "tlplayer".into(),
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::info!(
        log = %log_path.display(),
        bind = %cfg.server.bind,
        static_dir = %cfg.server.static_dir.display(),
        "tlplayer.start"
    );

    // 3) Wire and serve
    let state = AppState::from_config(&cfg.twitter)?;
    serve(cfg.server.bind, router(state, &cfg.server.static_dir)).await
}
