//! `websocket`: SockJS framing carried over a native WebSocket upgrade.
//! Bidirectional — one task polls the session queue and writes, another
//! reads frames and feeds the application.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use sockjs_protocol::{close_frame, decode_messages, encode_batch, message_frame, CLOSE_ANOTHER_CONNECTION, CLOSE_GO_AWAY};

use crate::connection::ConnectionClass;
use crate::session::Session;

const POLL_RECHECK_INTERVAL: Duration = Duration::from_secs(5);

pub async fn handle(mut socket: WebSocket, session: Arc<Session>, connection: Arc<dyn ConnectionClass>) {
    if socket.send(Message::Text("o".into())).await.is_err() {
        return;
    }

    if session.is_expired() {
        let (code, reason) = CLOSE_GO_AWAY;
        let _ = socket.send(Message::Text(close_frame(code, reason, false))).await;
        let _ = socket.close().await;
        return;
    }

    if !session.lock() {
        let (code, reason) = CLOSE_ANOTHER_CONNECTION;
        let _ = socket.send(Message::Text(close_frame(code, reason, false))).await;
        let _ = socket.close().await;
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    let poll_session = session.clone();
    let poll_task = tokio::spawn(async move {
        loop {
            if poll_session.is_expired() {
                let (code, reason) = CLOSE_GO_AWAY;
                let _ = sender.send(Message::Text(close_frame(code, reason, false))).await;
                let _ = sender.close().await;
                break;
            }
            if let Ok(batch) = poll_session.get_messages(POLL_RECHECK_INTERVAL).await {
                if sender
                    .send(Message::Text(message_frame(&encode_batch(&batch))))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    });

    let put_session = session.clone();
    let put_connection = connection.clone();
    let put_task = tokio::spawn(async move {
        while !put_session.is_expired() {
            match receiver.next().await {
                Some(Ok(Message::Text(text))) => {
                    if text.is_empty() {
                        continue;
                    }
                    match decode_messages(text.as_bytes()) {
                        Ok(messages) => {
                            for m in &messages {
                                put_connection.on_message(&put_session, m);
                            }
                            put_session.incr_hits();
                        }
                        Err(_) => break,
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break,
            }
        }
        put_session.kill();
    });

    let _ = tokio::join!(poll_task, put_task);
    session.unlock();
}
