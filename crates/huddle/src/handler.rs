//! Per-connection handler: session start, request dispatch, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Issue a fresh `ParticipantId` and announce it with `sessionStarted`
//!   2. Loop: receive frames → decode → hand to the coordinator
//!   3. On exit, sweep the participant out of every room
//!
//! Everything the client receives goes through one outbound queue drained
//! by a writer task, so room events and error replies never interleave
//! mid-frame and a slow socket never blocks a room.

use std::sync::Arc;

use huddle_protocol::{Codec, Event, ParticipantId, Request};
use huddle_room::ParticipantSender;
use huddle_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::HuddleError;
use crate::server::ServerState;

/// Drop guard that removes a participant from every room when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics or its task is
/// cancelled. Since `Drop` is synchronous, we spawn a fire-and-forget task
/// for the async sweep.
struct SessionGuard<C: Codec> {
    participant_id: ParticipantId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        let participant_id = self.participant_id.clone();
        let coordinator = Arc::clone(&self.state.coordinator);
        tokio::spawn(async move {
            coordinator.remove_participant(&participant_id).await;
            tracing::info!(%participant_id, "session ended");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), HuddleError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let participant_id = ParticipantId::random();

    let (sender, events) = ParticipantSender::channel(state.outbound_buffer);
    tokio::spawn(write_events(
        Arc::clone(&conn),
        events,
        Arc::clone(&state),
    ));

    let _guard = SessionGuard {
        participant_id: participant_id.clone(),
        state: Arc::clone(&state),
    };
    tracing::info!(%conn_id, %participant_id, "session started");

    sender
        .deliver(
            Event::SessionStarted {
                participant_id: participant_id.clone(),
            },
            state.send_timeout(),
        )
        .await;

    loop {
        let received = match state.idle_timeout {
            Some(idle) => match tokio::time::timeout(idle, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%participant_id, "connection idle, closing");
                    let _ = conn.close().await;
                    break;
                }
            },
            None => conn.recv().await,
        };

        let text = match received {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(%participant_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%participant_id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let request: Request = match state.codec.decode(&text) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(%participant_id, error = %e, "failed to decode request");
                send_error(&sender, &state, e.to_string()).await;
                continue;
            }
        };

        if let Err(e) = state
            .coordinator
            .handle(&participant_id, &sender, request)
            .await
        {
            tracing::debug!(%participant_id, error = %e, "request refused");
            send_error(&sender, &state, e.to_string()).await;
        }
    }

    // _guard drops here → participant removed everywhere.
    Ok(())
}

/// Drains a participant's outbound queue into the socket.
///
/// Ends when every sender is gone (the participant has left all rooms and
/// the handler returned) or the socket refuses a write. Dropping the
/// receiver makes rooms skip this participant from then on.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut events: mpsc::Receiver<Event>,
    state: Arc<ServerState<C>>,
) {
    let conn_id = conn.id();
    while let Some(event) = events.recv().await {
        let text = match state.codec.encode(&event) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%conn_id, event = event.kind(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&text).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Queues an `error` event for this connection only.
async fn send_error<C: Codec>(
    sender: &ParticipantSender,
    state: &ServerState<C>,
    message: String,
) {
    sender
        .deliver(Event::Error { message }, state.send_timeout())
        .await;
}
