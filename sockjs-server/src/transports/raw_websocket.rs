//! `rawwebsocket`: a bare WebSocket with no SockJS framing at all, bound to
//! a disposable one-shot session identified by a freshly generated id.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::connection::ConnectionClass;
use crate::session::Session;

const POLL_RECHECK_INTERVAL: Duration = Duration::from_secs(5);

pub async fn handle(socket: WebSocket, session: Arc<Session>, connection: Arc<dyn ConnectionClass>) {
    let (mut sender, mut receiver) = socket.split();

    let poll_session = session.clone();
    let poll_task = tokio::spawn(async move {
        loop {
            if poll_session.is_expired() {
                let _ = sender.close().await;
                break;
            }
            if let Ok(batch) = poll_session.get_messages(POLL_RECHECK_INTERVAL).await {
                for msg in batch {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        return;
                    }
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
                    put_connection.on_message(&put_session, &text);
                    put_session.incr_hits();
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(_)) => break,
            }
        }
        put_session.kill();
    });

    let _ = tokio::join!(poll_task, put_task);
}
