use super::hub::ConnectionEgress;
use super::messages::{ClientMessage, SpeakRequest};
use super::state::RelayState;
use crate::error::Delivery;
use crate::lipsync::LipsyncError;
use crate::session::{ParameterPayload, Session};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Mouth opening sent along with freshly synthesized audio
pub const SPEECH_MOUTH_OPEN: f64 = 0.5;

/// GET / (upgrade)
/// Attach a rendering client
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: RelayState) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let connection_id = state.hub.attach(tx.clone()).await;

    let egress = Arc::new(ConnectionEgress::new(connection_id, tx));
    let (session, displaced) = state
        .registry
        .admit(&state.policy, |identity| Session::new(identity, egress))
        .await;

    // The displaced session keeps running on its own connection until that
    // connection closes; it is just no longer routable by identity.
    if let Some(displaced) = displaced {
        debug!("{} now routes to ws-{}", displaced.identity(), connection_id);
    }

    let identity = session.identity().to_string();
    info!("Client connected: ws-{} as {}", connection_id, identity);

    if state.policy.is_simulated(&identity) {
        if let Err(e) = session.start_synthetic_loop(state.simulator_period).await {
            warn!("Failed to start synthetic loop for {}: {}", identity, e);
        }
    }

    let (mut sender, mut receiver) = socket.split();

    // Writer: drain the connection's queue in order
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if let Err(e) = sender.send(message).await {
                debug!("WebSocket send failed: {}", e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Reader: control messages from the client
    let recv_state = state.clone();
    let recv_identity = identity.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => handle_message(&text, &recv_identity, &recv_state),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => handle_message(&text, &recv_identity, &recv_state),
                    Err(e) => warn!("Ignoring non UTF-8 message from {}: {}", recv_identity, e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket error from {}: {}", recv_identity, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.detach(connection_id).await;
    session.close().await;
    state.registry.release(&identity, &session).await;

    info!("Client disconnected: ws-{} ({})", connection_id, identity);
}

/// Handle one control message. Malformed input is logged and dropped; the
/// connection stays open.
fn handle_message(text: &str, identity: &str, state: &RelayState) {
    let message = match ClientMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to parse client message: {}", e);
            warn!("Raw message: {}", text);
            return;
        }
    };

    if let Some(request) = message.speak_request(identity, &state.default_prompt) {
        info!("{} is ready, synthesizing speech", request.identity);

        // Synthesis runs off the connection's read loop
        let state = state.clone();
        tokio::spawn(async move {
            let identity = request.identity.clone();
            if let Err(e) = speak(&state, request).await {
                error!("Speech synthesis for {} failed: {}", identity, e);
            }
        });
    }
}

/// Synthesize speech and send the result to the requesting identity
pub async fn speak(state: &RelayState, request: SpeakRequest) -> Result<Delivery, LipsyncError> {
    let artifacts = state.bridge.synthesize(&request.prompt).await?;

    let payload = ParameterPayload::new(&request.identity)
        .with_parameter("mouthOpen", SPEECH_MOUTH_OPEN)
        .with_audio(artifacts.audio_url, artifacts.json_url);

    let delivery = state.registry.route(&request.identity, &payload).await;
    match &delivery {
        Delivery::Sent => info!("Sent speech payload to {}", request.identity),
        Delivery::Dropped(reason) => debug!("Speech payload not delivered: {}", reason),
    }

    Ok(delivery)
}
