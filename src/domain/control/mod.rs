//! Normalized control-tool (OBS) events.

use serde::{Deserialize, Serialize};

/// The control-tool events the portal forwards to viewers.
///
/// Serialized as `{ "type": "scene_changed", "data": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ControlToolEvent {
    SceneChanged {
        scene_name: String,
    },
    StreamStateChanged {
        active: bool,
        state: String,
    },
    RecordStateChanged {
        active: bool,
        state: String,
    },
    SourceVisibilityChanged {
        scene_name: String,
        scene_item_id: i64,
        visible: bool,
    },
}
