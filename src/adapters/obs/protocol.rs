//! obs-websocket v5 frames.
//!
//! Every frame is `{"op": <u8>, "d": {...}}`. The client only ever sends
//! Identify; the server sends Hello, Identified and Events.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::domain::control::ControlToolEvent;

pub const OP_HELLO: u8 = 0;
pub const OP_IDENTIFY: u8 = 1;
pub const OP_IDENTIFIED: u8 = 2;
pub const OP_EVENT: u8 = 5;

pub const RPC_VERSION: u32 = 1;

/// Close code sent when Identify carried a wrong digest.
pub const CLOSE_AUTHENTICATION_FAILED: u16 = 4009;

const SUBSCRIBE_GENERAL: u32 = 1 << 0;
const SUBSCRIBE_SCENES: u32 = 1 << 2;
const SUBSCRIBE_OUTPUTS: u32 = 1 << 6;
const SUBSCRIBE_SCENE_ITEMS: u32 = 1 << 7;

/// Event categories requested in Identify.
pub const EVENT_SUBSCRIPTIONS: u32 =
    SUBSCRIBE_GENERAL | SUBSCRIBE_SCENES | SUBSCRIBE_OUTPUTS | SUBSCRIBE_SCENE_ITEMS;

#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
}

impl RawFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    #[serde(default)]
    pub obs_web_socket_version: Option<String>,
    pub rpc_version: u32,
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Identify {
    rpc_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication: Option<String>,
    event_subscriptions: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrame {
    pub event_type: String,
    #[serde(default)]
    pub event_data: Value,
}

/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
pub fn auth_response(password: &str, salt: &str, challenge: &str) -> String {
    let secret = STANDARD.encode(Sha256::digest(format!("{}{}", password, salt).as_bytes()));
    STANDARD.encode(Sha256::digest(format!("{}{}", secret, challenge).as_bytes()))
}

/// Builds the Identify frame answering `hello`.
///
/// Returns `None` when the server wants authentication and no password
/// is configured.
pub fn identify_frame(hello: &Hello, password: Option<&str>) -> Option<String> {
    let authentication = match (&hello.authentication, password) {
        (Some(auth), Some(password)) => {
            Some(auth_response(password, &auth.salt, &auth.challenge))
        }
        (Some(_), None) => return None,
        (None, _) => None,
    };

    let identify = Identify {
        rpc_version: RPC_VERSION.min(hello.rpc_version),
        authentication,
        event_subscriptions: EVENT_SUBSCRIPTIONS,
    };
    Some(json!({ "op": OP_IDENTIFY, "d": identify }).to_string())
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(data: &Value, key: &str) -> Option<bool> {
    data.get(key).and_then(Value::as_bool)
}

/// Maps an OBS event onto the normalized set. Other events are dropped.
pub fn normalize_event(event: &EventFrame) -> Option<ControlToolEvent> {
    let data = &event.event_data;
    match event.event_type.as_str() {
        "CurrentProgramSceneChanged" => Some(ControlToolEvent::SceneChanged {
            scene_name: str_field(data, "sceneName")?,
        }),
        "StreamStateChanged" => Some(ControlToolEvent::StreamStateChanged {
            active: bool_field(data, "outputActive")?,
            state: str_field(data, "outputState").unwrap_or_default(),
        }),
        "RecordStateChanged" => Some(ControlToolEvent::RecordStateChanged {
            active: bool_field(data, "outputActive")?,
            state: str_field(data, "outputState").unwrap_or_default(),
        }),
        "SceneItemEnableStateChanged" => Some(ControlToolEvent::SourceVisibilityChanged {
            scene_name: str_field(data, "sceneName")?,
            scene_item_id: data.get("sceneItemId").and_then(Value::as_i64)?,
            visible: bool_field(data, "sceneItemEnabled")?,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: &str, data: Value) -> EventFrame {
        EventFrame {
            event_type: event_type.to_string(),
            event_data: data,
        }
    }

    #[test]
    fn auth_response_matches_reference_vector() {
        assert_eq!(
            auth_response(
                "supersecretpassword",
                "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=",
                "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=",
            ),
            "1Ct943GAT+6YQUUX47Ia/ncufilbe6+oD6lY+5kaCu4="
        );
    }

    #[test]
    fn identify_without_auth_omits_digest() {
        let hello: Hello = serde_json::from_value(json!({
            "obsWebSocketVersion": "5.1.0",
            "rpcVersion": 1
        }))
        .unwrap();

        let frame: Value = serde_json::from_str(&identify_frame(&hello, None).unwrap()).unwrap();
        assert_eq!(frame["op"], 1);
        assert_eq!(frame["d"]["rpcVersion"], 1);
        assert_eq!(frame["d"]["eventSubscriptions"], 197);
        assert!(frame["d"].get("authentication").is_none());
    }

    #[test]
    fn identify_requires_password_when_challenged() {
        let hello: Hello = serde_json::from_value(json!({
            "rpcVersion": 1,
            "authentication": { "challenge": "c", "salt": "s" }
        }))
        .unwrap();

        assert!(identify_frame(&hello, None).is_none());
        let frame: Value =
            serde_json::from_str(&identify_frame(&hello, Some("pw")).unwrap()).unwrap();
        assert_eq!(frame["d"]["authentication"], auth_response("pw", "s", "c"));
    }

    #[test]
    fn normalizes_scene_change() {
        assert_eq!(
            normalize_event(&event(
                "CurrentProgramSceneChanged",
                json!({ "sceneName": "Intro" })
            )),
            Some(ControlToolEvent::SceneChanged {
                scene_name: "Intro".to_string()
            })
        );
    }

    #[test]
    fn normalizes_output_state_changes() {
        assert_eq!(
            normalize_event(&event(
                "StreamStateChanged",
                json!({ "outputActive": true, "outputState": "OBS_WEBSOCKET_OUTPUT_STARTED" })
            )),
            Some(ControlToolEvent::StreamStateChanged {
                active: true,
                state: "OBS_WEBSOCKET_OUTPUT_STARTED".to_string()
            })
        );
        assert!(matches!(
            normalize_event(&event("RecordStateChanged", json!({ "outputActive": false }))),
            Some(ControlToolEvent::RecordStateChanged { active: false, .. })
        ));
    }

    #[test]
    fn normalizes_source_visibility() {
        assert_eq!(
            normalize_event(&event(
                "SceneItemEnableStateChanged",
                json!({ "sceneName": "Main", "sceneItemId": 4, "sceneItemEnabled": false })
            )),
            Some(ControlToolEvent::SourceVisibilityChanged {
                scene_name: "Main".to_string(),
                scene_item_id: 4,
                visible: false
            })
        );
    }

    #[test]
    fn other_events_and_incomplete_data_are_dropped() {
        assert!(normalize_event(&event("InputMuteStateChanged", json!({}))).is_none());
        assert!(normalize_event(&event("CurrentProgramSceneChanged", json!({}))).is_none());
    }
}
