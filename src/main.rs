use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vrm_relay::{config, server, Config};

/// Relay FaceCap OSC data and synthesized speech to VRM clients
#[derive(Debug, Parser)]
#[command(name = "vrm-relay", version, about)]
struct Cli {
    /// Configuration file, extension optional
    #[arg(short, long, default_value = "config/vrm-relay")]
    config: String,

    /// WebSocket port
    #[arg(long, env = "PORT_WS")]
    ws_port: Option<u16>,

    /// OSC (UDP) port FaceCap sends to
    #[arg(long, env = "PORT_OSC")]
    osc_port: Option<u16>,

    /// Port serving synthesized audio
    #[arg(long, env = "PORT_HTTP")]
    http_port: Option<u16>,

    /// Directory for synthesized audio
    #[arg(long, env = "AUDIO_DIR")]
    audio_dir: Option<PathBuf>,

    /// Do not start the standalone simulator session
    #[arg(long)]
    no_simulator: bool,
}

impl Cli {
    fn apply(self, cfg: &mut Config) {
        if let Some(port) = self.ws_port {
            cfg.service.ws.port = port;
        }
        if let Some(port) = self.osc_port {
            cfg.service.osc.port = port;
        }
        if let Some(port) = self.http_port {
            cfg.service.http.port = port;
        }
        if let Some(dir) = self.audio_dir {
            cfg.lipsync.audio_dir = dir;
        }
        if self.no_simulator {
            cfg.simulator.standalone = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file feeds RUST_LOG, the env-backed flags and the TTS key;
    // a missing file is fine
    let env_file = config::load_env_file(None);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone();

    // Port overrides feed the derived audio URL
    let mut cfg = Config::read(&config_path)?;
    cli.apply(&mut cfg);
    cfg.finalize();

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    if let Some(path) = env_file {
        info!("Loaded environment from {}", path.display());
    }
    info!("Audio directory: {}", cfg.lipsync.audio_dir.display());

    let relay = server::start(&cfg).await?;

    info!("Relay ready. Press Ctrl+C to stop.");
    wait_for_shutdown().await;

    relay.shutdown(cfg.service.shutdown_grace()).await;

    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
