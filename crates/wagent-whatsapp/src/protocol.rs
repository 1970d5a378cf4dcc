// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frames exchanged with the bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use wagent_core::{ChatMessage, ClientEvent};

/// Operations the bridge performs on the agent's WhatsApp-Web client.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request<'a> {
    Init {
        agent_id: &'a str,
        session_dir: &'a str,
    },
    Destroy,
    Info,
    Seen {
        chat_id: &'a str,
    },
    Typing {
        chat_id: &'a str,
    },
    ClearState {
        chat_id: &'a str,
    },
    Reply {
        chat_id: &'a str,
        message_id: &'a str,
        text: &'a str,
    },
    Media {
        message_id: &'a str,
    },
}

#[derive(Debug, Serialize)]
pub struct RequestFrame<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub request: Request<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Response {
        id: u64,
        ok: bool,
        #[serde(default)]
        data: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Event(BridgeEvent),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    Qr {
        qr: String,
    },
    Authenticated,
    Ready,
    AuthFailure {
        #[serde(default)]
        message: String,
    },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    Message {
        message: ChatMessage,
    },
    Error {
        message: String,
    },
}

impl From<BridgeEvent> for ClientEvent {
    fn from(event: BridgeEvent) -> Self {
        match event {
            BridgeEvent::Qr { qr } => ClientEvent::Qr(qr),
            BridgeEvent::Authenticated => ClientEvent::Authenticated,
            BridgeEvent::Ready => ClientEvent::Ready,
            BridgeEvent::AuthFailure { message } => ClientEvent::AuthFailure(message),
            BridgeEvent::Disconnected { reason } => ClientEvent::Disconnected(reason),
            BridgeEvent::Message { message } => ClientEvent::Message(message),
            BridgeEvent::Error { message } => ClientEvent::Error(message),
        }
    }
}

/// Payload of a successful `media` response.
#[derive(Debug, Deserialize)]
pub struct MediaPayload {
    /// Base64 file content.
    pub data: String,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Payload of a successful `info` response.
#[derive(Debug, Default, Deserialize)]
pub struct InfoPayload {
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frames_are_flat() {
        let frame = RequestFrame {
            id: 7,
            request: Request::Reply {
                chat_id: "c",
                message_id: "m",
                text: "hi",
            },
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 7, "op": "reply", "chat_id": "c", "message_id": "m", "text": "hi"})
        );
        let json = serde_json::to_value(RequestFrame {
            id: 1,
            request: Request::Destroy,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "op": "destroy"}));
    }

    #[test]
    fn parses_events_and_responses() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"type":"event","event":"disconnected","reason":"LOGOUT"}"#)
                .unwrap();
        match frame {
            InboundFrame::Event(event) => {
                assert_eq!(
                    ClientEvent::from(event),
                    ClientEvent::Disconnected("LOGOUT".into())
                )
            }
            other => panic!("unexpected {other:?}"),
        }

        let frame: InboundFrame = serde_json::from_str(
            r#"{"type":"event","event":"message","message":{"id":"m1","chat_id":"c@c.us","from":"c@c.us","body":"hola","timestamp":5}}"#,
        )
        .unwrap();
        assert!(matches!(frame, InboundFrame::Event(BridgeEvent::Message { .. })));

        let frame: InboundFrame =
            serde_json::from_str(r#"{"type":"response","id":3,"ok":false,"error":"nope"}"#)
                .unwrap();
        assert!(matches!(
            frame,
            InboundFrame::Response { id: 3, ok: false, .. }
        ));
    }
}
