//! ChatRoom viewer - live chat client state for plugin template substitution.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chatroom_viewer::clock::Clock;
use chatroom_viewer::config::{apply_env, ConfigLoader, RunMode, ViewerConfig};
use chatroom_viewer::paths::{AppPaths, DirectoryLocator};
use chatroom_viewer::sources::FsCollector;
use chatroom_viewer::viewer::{spawn_signal_listener, RunStatus, Viewer, ViewerError};
use chatroom_viewer::watcher::{NotifyBackend, WatchSpec, WatcherOrchestrator};

#[derive(Parser)]
#[command(
    name = "chatroom-viewer",
    about = "Publish live chat client state as a token-keyed document",
    version
)]
struct Cli {
    /// Stay resident and re-emit whenever a watched file changes.
    #[arg(long)]
    watch: bool,

    /// Config file to use instead of the default search paths.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn mode(&self) -> RunMode {
        if self.watch {
            RunMode::Watch
        } else {
            RunMode::OneShot
        }
    }
}

/// Diagnostics go to stderr only; stdout carries nothing but documents.
fn init_tracing(debug: bool, verbosity: u8) {
    let level = match verbosity {
        0 if debug => "debug",
        0 => "off",
        1 if debug => "debug",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(config: ViewerConfig, mode: RunMode) -> Result<RunStatus, ViewerError> {
    let root = DirectoryLocator::from_current_exe(config.root_override.clone()).locate();
    let paths = AppPaths::from_root(root);
    let clock = Clock::new(&config.timezone);
    let collector = Arc::new(FsCollector::new(
        paths.clone(),
        clock,
        config.recent_messages,
    ));

    let mut viewer = Viewer::new(collector, std::io::stdout()).with_enabled(config.enabled);

    match mode {
        RunMode::OneShot => viewer.run_once().await,
        RunMode::Watch => {
            let cancel = CancellationToken::new();
            let _listener = spawn_signal_listener(cancel.clone());
            let mut orchestrator = WatcherOrchestrator::new(NotifyBackend::new());
            viewer
                .run_watch(&mut orchestrator, WatchSpec::static_plan(&paths), &cancel)
                .await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let (config, config_error) = match loader.load() {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = ViewerConfig::default();
            apply_env(&mut config, |key| std::env::var(key).ok());
            (config, Some(e))
        }
    };

    init_tracing(config.debug, cli.verbose);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Ignoring config file, using defaults");
    }

    let mode = cli.mode();
    tracing::info!(
        mode = ?mode,
        enabled = config.enabled,
        timezone = %config.timezone,
        "Starting chatroom viewer"
    );

    match run(config, mode).await {
        Ok(status) => ExitCode::from(status.code()),
        Err(e) => {
            tracing::error!(error = %e, "Viewer stopped");
            ExitCode::FAILURE
        }
    }
}
