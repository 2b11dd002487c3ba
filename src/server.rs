use crate::config::Config;
use crate::error::RelayError;
use crate::http::{self, AppState};
use crate::lipsync::{GoogleTtsEngine, LipsyncBridge, SpeechSynthesizer};
use crate::osc::{OscDispatcher, OscReceiver};
use crate::session::{Session, SessionRegistry};
use crate::ws::{self, BroadcastEgress, ConnectionHub, RelayState};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Running relay: listeners, background tasks and the shared tables
pub struct RelayHandle {
    pub ws_addr: SocketAddr,
    pub http_addr: SocketAddr,
    /// `None` when the OSC port could not be bound
    pub osc_addr: Option<SocketAddr>,
    pub registry: Arc<SessionRegistry>,
    pub hub: Arc<ConnectionHub>,
    /// Broadcast session started at launch; it outlives its registry entry
    /// once a client takes over the simulated identity
    simulator: Option<Arc<Session>>,
    shutdown_tx: watch::Sender<bool>,
    servers: Vec<JoinHandle<()>>,
    osc_task: Option<JoinHandle<()>>,
}

/// Start the relay with the Google Cloud TTS engine
pub async fn start(config: &Config) -> Result<RelayHandle> {
    let synthesizer = GoogleTtsEngine::new(&config.tts).context("Failed to create TTS engine")?;
    start_with(config, Arc::new(synthesizer)).await
}

/// Start the relay with the given speech engine
pub async fn start_with(config: &Config, synthesizer: Arc<dyn SpeechSynthesizer>) -> Result<RelayHandle> {
    let registry = Arc::new(SessionRegistry::new());
    let hub = Arc::new(ConnectionHub::new());
    let policy = Arc::new(config.identities.clone());
    let bridge = Arc::new(LipsyncBridge::new(synthesizer, &config.lipsync));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // WebSocket relay
    let ws_listener = bind_tcp("WebSocket", config.service.ws.socket_addr()?).await?;
    let ws_addr = ws_listener.local_addr()?;
    let ws_router = ws::create_ws_router(RelayState {
        registry: Arc::clone(&registry),
        hub: Arc::clone(&hub),
        policy: Arc::clone(&policy),
        bridge: Arc::clone(&bridge),
        simulator_period: config.simulator.period(),
        default_prompt: Arc::from(config.lipsync.prompt.as_str()),
    });
    info!("WebSocket relay listening on ws://{}", ws_addr);

    // Static audio + status
    let http_listener = bind_tcp("HTTP", config.service.http.socket_addr()?).await?;
    let http_addr = http_listener.local_addr()?;
    let http_router = http::create_router(AppState::new(Arc::clone(&registry), bridge.audio_dir()));
    info!("Audio server listening on http://{}/audio/", http_addr);

    let servers = vec![
        spawn_server("WebSocket", ws_listener, ws_router, shutdown_rx.clone()),
        spawn_server("HTTP", http_listener, http_router, shutdown_rx),
    ];

    // FaceCap ingress; a bind failure leaves the relay running without it
    let dispatcher = Arc::new(OscDispatcher::new(
        Arc::clone(&registry),
        policy.capture.clone(),
        config.capture.clone(),
    ));
    let (osc_addr, osc_task) = match OscReceiver::bind(config.service.osc.socket_addr()?, dispatcher).await {
        Ok(receiver) => {
            let addr = receiver.local_addr().ok();
            (addr, Some(tokio::spawn(receiver.run())))
        }
        Err(e) => {
            error!("OSC ingress disabled: {}", e);
            (None, None)
        }
    };

    let simulator = if config.simulator.standalone {
        let session = Arc::new(Session::new(
            policy.simulated.clone(),
            Arc::new(BroadcastEgress::new(Arc::clone(&hub))),
        ));
        session.start_synthetic_loop(config.simulator.period()).await?;
        registry.register(policy.simulated.clone(), Arc::clone(&session)).await;
        info!("Standalone simulator started for {}", policy.simulated);
        Some(session)
    } else {
        None
    };

    Ok(RelayHandle {
        ws_addr,
        http_addr,
        osc_addr,
        registry,
        hub,
        simulator,
        shutdown_tx,
        servers,
        osc_task,
    })
}

impl RelayHandle {
    /// Close every client, stop every session and the listeners, then wait at
    /// most `grace` for the servers to finish.
    pub async fn shutdown(self, grace: Duration) {
        info!("Shutting down relay");

        self.hub.close_all().await;
        let _ = self.shutdown_tx.send(true);

        for session in self.registry.drain().await {
            session.close().await;
        }
        if let Some(simulator) = self.simulator {
            simulator.close().await;
        }

        if let Some(task) = self.osc_task {
            task.abort();
            match task.await {
                Err(e) if e.is_panic() => warn!("OSC receiver ended with a panic: {}", e),
                _ => info!("OSC port closed"),
            }
        }

        let servers = futures::future::join_all(self.servers);
        match tokio::time::timeout(grace, servers).await {
            Ok(_) => info!("Relay stopped"),
            Err(_) => warn!("Grace period of {}ms elapsed, exiting anyway", grace.as_millis()),
        }
    }
}

async fn bind_tcp(what: &'static str, addr: SocketAddr) -> Result<TcpListener, RelayError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind { what, addr, source })
}

fn spawn_server(
    what: &'static str,
    listener: TcpListener,
    router: axum::Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        };

        if let Err(e) = axum::serve(listener, router).with_graceful_shutdown(shutdown).await {
            error!("{} server error: {}", what, e);
        }
    })
}
