//! WebSocket change feed for user records
//!
//! On connect the client receives a `UsersSnapshot` of every user, then a live
//! stream of `UserCreated` / `UserUpdated` / `UserDeleted` messages.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::select;
use tracing::{debug, error, info, warn};

use crate::application::events::{EventMessage, SharedEventBus, UserEvent, UserSummary};
use crate::domain::RepositoryProvider;

/// Optional subscription filter, taken from the query string
#[derive(Debug, Default, Deserialize)]
pub struct ChangeFilter {
    /// Only events about this user
    pub user_id: Option<String>,
    /// Comma-separated event types, e.g. `user_created,user_deleted`
    pub event_types: Option<String>,
}

impl ChangeFilter {
    /// Snapshots always pass; the filter applies to live events only.
    pub fn matches(&self, message: &EventMessage) -> bool {
        if matches!(message.event, UserEvent::UsersSnapshot(_)) {
            return true;
        }
        if let Some(ref wanted) = self.user_id {
            if message.event.user_id() != Some(wanted.as_str()) {
                return false;
            }
        }
        if let Some(ref types) = self.event_types {
            let event_type = message.event.event_type();
            if !types.split(',').map(str::trim).any(|t| t == event_type) {
                return false;
            }
        }
        true
    }
}

#[derive(Clone)]
pub struct ChangeFeedState {
    pub repos: Arc<dyn RepositoryProvider>,
    pub events: SharedEventBus,
}

/// `GET /api/v1/users/changes/ws`
pub async fn ws_user_changes_handler(
    ws: WebSocketUpgrade,
    State(state): State<ChangeFeedState>,
    Query(filter): Query<ChangeFilter>,
) -> impl IntoResponse {
    info!(user_id = ?filter.user_id, event_types = ?filter.event_types, "Change feed upgrade");
    ws.on_upgrade(move |socket| handle_change_socket(socket, state, filter))
}

/// Subscribes before reading the snapshot so no write between the two is lost.
async fn snapshot_message(state: &ChangeFeedState) -> Option<EventMessage> {
    match state.repos.users().find_all().await {
        Ok(users) => Some(EventMessage::new(UserEvent::UsersSnapshot(
            users.iter().map(UserSummary::from).collect(),
        ))),
        Err(e) => {
            error!(error = %e, "Failed to load user snapshot");
            None
        }
    }
}

async fn handle_change_socket(socket: WebSocket, state: ChangeFeedState, filter: ChangeFilter) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscriber = state.events.subscribe();

    let Some(snapshot) = snapshot_message(&state).await else {
        let _ = sender.send(Message::Close(None)).await;
        return;
    };
    if !send_json(&mut sender, &snapshot).await {
        return;
    }

    loop {
        select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "Change feed socket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }

            event = subscriber.recv() => {
                let Some(message) = event else {
                    warn!("Event bus closed");
                    break;
                };
                if !filter.matches(&message) {
                    continue;
                }
                if !send_json(&mut sender, &message).await {
                    break;
                }
                debug!(event_type = message.event.event_type(), "Change sent");
            }
        }
    }

    info!("Change feed client disconnected");
}

async fn send_json<S>(sender: &mut S, message: &EventMessage) -> bool
where
    S: futures_util::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!(error = %e, "Failed to serialize change event");
            return true;
        }
    };
    match sender.send(Message::Text(json.into())).await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Failed to send change event");
            false
        }
    }
}
