// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-delimited JSON frames exchanged with the browser driver.
//!
//! Host to driver: `{"type":"request","id":1,"method":"getChats","params":{}}`.
//! Driver to host: responses correlated by `id`, and unsolicited events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wamcp_core::ClientInfo;

/// Frame written to the driver's stdin.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostFrame<'a> {
    Request {
        id: u64,
        method: &'a str,
        params: Value,
    },
}

impl HostFrame<'_> {
    /// Encode as one newline-terminated line.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Frame read from the driver's stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DriverFrame {
    Response {
        id: u64,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Event {
        event: String,
        #[serde(default)]
        data: Value,
    },
}

impl DriverFrame {
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// A message pushed by the driver as it arrives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    /// Fully-serialized message id.
    pub id: String,
    /// Chat the message arrived in.
    pub from: String,
    /// Sender inside a group chat.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    /// Unix seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub is_group: bool,
    /// Push name of the sender, when the driver knows it.
    #[serde(default)]
    pub notify_name: Option<String>,
}

impl IncomingMessage {
    /// Serialized id of the person who sent the message.
    pub fn sender_id(&self) -> &str {
        self.author.as_deref().unwrap_or(&self.from)
    }
}

/// A decoded driver event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A pairing code is available for scanning.
    Qr(String),
    Ready(ClientInfo),
    Authenticated,
    AuthFailure(String),
    Disconnected(String),
    Message(IncomingMessage),
    /// Event name this host does not handle.
    Unknown(String),
}

impl LifecycleEvent {
    /// Decode the `data` payload of an event frame.
    pub fn from_frame(event: &str, data: Value) -> Result<Self, serde_json::Error> {
        Ok(match event {
            "qr" => LifecycleEvent::Qr(serde_json::from_value(data)?),
            "ready" => LifecycleEvent::Ready(serde_json::from_value(data)?),
            "authenticated" => LifecycleEvent::Authenticated,
            "auth_failure" => LifecycleEvent::AuthFailure(text_of(data)),
            "disconnected" => LifecycleEvent::Disconnected(text_of(data)),
            "message" => LifecycleEvent::Message(serde_json::from_value(data)?),
            other => LifecycleEvent::Unknown(other.to_string()),
        })
    }
}

fn text_of(data: Value) -> String {
    match data {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_line_shape() {
        let line = HostFrame::Request {
            id: 7,
            method: "getChats",
            params: json!({}),
        }
        .encode()
        .unwrap();
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(
            value,
            json!({"type": "request", "id": 7, "method": "getChats", "params": {}})
        );
    }

    #[test]
    fn decodes_error_response() {
        let frame = DriverFrame::decode(r#"{"type":"response","id":3,"error":"boom"}"#).unwrap();
        match frame {
            DriverFrame::Response { id, result, error } => {
                assert_eq!(id, 3);
                assert!(result.is_null());
                assert_eq!(error.as_deref(), Some("boom"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decodes_lifecycle_events() {
        assert_eq!(
            LifecycleEvent::from_frame("qr", json!("2@abc")).unwrap(),
            LifecycleEvent::Qr("2@abc".into())
        );
        assert_eq!(
            LifecycleEvent::from_frame("disconnected", json!("LOGOUT")).unwrap(),
            LifecycleEvent::Disconnected("LOGOUT".into())
        );
        let ready = LifecycleEvent::from_frame("ready", json!({"wid": "999@c.us"})).unwrap();
        assert!(matches!(ready, LifecycleEvent::Ready(info) if info.wid == "999@c.us"));
        assert_eq!(
            LifecycleEvent::from_frame("change_battery", Value::Null).unwrap(),
            LifecycleEvent::Unknown("change_battery".into())
        );
    }

    #[test]
    fn group_sender_is_author() {
        let msg: IncomingMessage = serde_json::from_value(json!({
            "id": "false_120363@g.us_AAA",
            "from": "120363@g.us",
            "author": "111@c.us",
            "body": "hi",
            "timestamp": 1700000000,
            "isGroup": true
        }))
        .unwrap();
        assert_eq!(msg.sender_id(), "111@c.us");
    }
}
