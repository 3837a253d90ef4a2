//! Health agent documents.
//!
//! The local agent exposes a status document and a capabilities document.
//! Both are decoded into typed structs so a malformed response is caught
//! at the adapter boundary rather than forwarded to viewers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VideoStatus {
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub devices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AudioStatus {
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObsProcessStatus {
    #[serde(default)]
    pub running: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GpuStatus {
    #[serde(default)]
    pub present: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vendors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub render_nodes: Vec<String>,
}

/// `GET /status` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub timestamp: String,
    pub hostname: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default)]
    pub video: VideoStatus,
    #[serde(default)]
    pub audio: AudioStatus,
    #[serde(default)]
    pub obs: ObsProcessStatus,
    #[serde(default)]
    pub gpu: GpuStatus,
}

/// `GET /capabilities` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AgentCapabilities {
    #[serde(default)]
    pub can_video: bool,
    #[serde(default)]
    pub can_audio: bool,
    #[serde(default)]
    pub can_stream: bool,
}

/// Payload of one `agent_status` message.
///
/// Status fields sit at the top level; capabilities are attached when the
/// capabilities fetch succeeded in the same poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentReport {
    #[serde(flatten)]
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<AgentCapabilities>,
}
