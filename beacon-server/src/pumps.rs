//! Relay subscribers bridging the pub/sub channels onto the two WebSocket
//! surfaces. Each pump is an independent task with its own subscription and
//! stops when the shutdown token fires, so no socket send is attempted after
//! drain begins.

use beacon_core::Notification;
use beacon_core::relay::{RelayMessage, channels};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::state::AppState;
use crate::ws::{Envelope, WORKER_NOTIFICATION, tag_for_channel};

/// Spawn the broadcast and targeted pumps.
pub fn spawn(state: &AppState) -> Vec<JoinHandle<()>> {
    vec![
        tokio::spawn(broadcast_pump(state.clone())),
        tokio::spawn(targeted_pump(state.clone())),
    ]
}

/// Fan every published domain event out to all dashboard viewers.
async fn broadcast_pump(state: AppState) {
    let mut urgent = state.relay.subscribe(channels::URGENT_EVENT);
    let mut normal = state.relay.subscribe(channels::NORMAL_EVENT);
    let mut status = state.relay.subscribe(channels::STATUS_EVENT);
    tracing::info!("broadcast pump subscribed");

    loop {
        let keep_running = tokio::select! {
            _ = state.shutdown.cancelled() => false,
            received = urgent.recv() => fan_out(&state, received),
            received = normal.recv() => fan_out(&state, received),
            received = status.recv() => fan_out(&state, received),
        };
        if !keep_running {
            break;
        }
    }

    tracing::info!("broadcast pump stopped");
}

fn fan_out(state: &AppState, received: Result<RelayMessage, RecvError>) -> bool {
    match received {
        Ok(message) => {
            let Some(tag) = tag_for_channel(&message.channel) else {
                return true;
            };
            state.hub.broadcast(&Envelope::new(tag, message.payload));
            true
        }
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "broadcast pump lagged; events dropped");
            true
        }
        Err(RecvError::Closed) => false,
    }
}

/// Deliver each worker notification to the one registered connection for its
/// target user, or log the miss and drop it. No buffering, no retry.
async fn targeted_pump(state: AppState) {
    let mut notifications = state.relay.subscribe(channels::TARGETED_NOTIFICATION);
    tracing::info!("targeted pump subscribed");

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            received = notifications.recv() => match received {
                Ok(message) => deliver(&state, message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "targeted pump lagged; notifications dropped");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    tracing::info!("targeted pump stopped");
}

fn deliver(state: &AppState, message: RelayMessage) {
    let notification: Notification = match serde_json::from_value(message.payload.clone()) {
        Ok(notification) => notification,
        Err(error) => {
            tracing::warn!(%error, "dropping malformed targeted notification");
            return;
        }
    };

    let user_id = notification.target_user_id.as_str();
    let Some(connection) = state.routing.lookup(user_id) else {
        tracing::info!(user_id, "no client registered; notification dropped");
        return;
    };

    let envelope = Envelope::new(WORKER_NOTIFICATION, message.payload);
    let frame = match envelope.to_message() {
        Ok(frame) => frame,
        Err(error) => {
            tracing::error!(%error, user_id, "failed to serialize notification");
            return;
        }
    };

    match connection.send(frame) {
        Ok(()) => {
            tracing::info!(user_id, conn_id = %connection.id, "notification delivered");
        }
        Err(error) => {
            tracing::warn!(%error, user_id, "notification send failed; dropped");
        }
    }
}
