// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drives the client against an in-process fake bridge.

use std::path::Path;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use wagent_core::{ChatClientFactory, ClientEvent};
use wagent_whatsapp::BridgeClientFactory;

async fn next_request<S>(ws: &mut tokio_tungstenite::WebSocketStream<S>) -> Value
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    loop {
        match ws.next().await.expect("stream open").expect("frame") {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn request_response_and_events() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let bridge = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let init = next_request(&mut ws).await;
        assert_eq!(init["op"], "init");
        assert_eq!(init["agent_id"], "agent-1");
        assert_eq!(init["session_dir"], "/tmp/sessions/session-agent-1");
        let reply = json!({"type": "response", "id": init["id"], "ok": true});
        ws.send(Message::Text(reply.to_string().into())).await.unwrap();

        let qr = json!({"type": "event", "event": "qr", "qr": "2@abc"});
        ws.send(Message::Text(qr.to_string().into())).await.unwrap();

        let send = next_request(&mut ws).await;
        assert_eq!(send["op"], "reply");
        assert_eq!(send["text"], "hello");
        let err = json!({"type": "response", "id": send["id"], "ok": false, "error": "chat not found"});
        ws.send(Message::Text(err.to_string().into())).await.unwrap();

        ws.close(None).await.unwrap();
    });

    let factory = BridgeClientFactory::new(format!("ws://{addr}"), Duration::from_secs(5));
    let mut conn = factory
        .create("agent-1", Path::new("/tmp/sessions/session-agent-1"))
        .await
        .unwrap();

    conn.client.initialize().await.unwrap();
    assert_eq!(conn.events.recv().await, Some(ClientEvent::Qr("2@abc".into())));

    let err = conn.client.reply("c@c.us", "m1", "hello").await.unwrap_err();
    assert!(err.to_string().contains("chat not found"));

    // Bridge hang-up is reported as a (non-logout) disconnect.
    match conn.events.recv().await {
        Some(ClientEvent::Disconnected(reason)) => assert!(reason.contains("closed")),
        other => panic!("expected disconnect, got {other:?}"),
    }
    assert!(conn.client.send_typing("c@c.us").await.is_err());
    bridge.await.unwrap();
}

#[tokio::test]
async fn unreachable_bridge_fails_create() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let factory = BridgeClientFactory::new(format!("ws://{addr}"), Duration::from_secs(1));
    let result = factory.create("agent-1", Path::new("/tmp/x")).await;
    assert!(result.is_err());
}
