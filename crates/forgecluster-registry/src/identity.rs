//! A node's own identity: `{node_id, host, port}`.
//!
//! Synthesized from a CLI-provided port by default; a `config/<node_id>.json`
//! file, if present, overrides it. This lets a deployment pin a node's
//! identity across restarts without requiring one for the common case of
//! spinning up a local cluster by port number alone.

use std::path::Path;

use forgecluster_types::NodeId;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_id: NodeId,
    pub host: String,
    pub port: u16,
}

impl NodeIdentity {
    #[must_use]
    pub fn synthesize(port: u16) -> Self {
        Self {
            node_id: NodeId::from_port(port),
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    /// Loads identity for `port`: synthesizes the default, then overrides
    /// it with `<config_dir>/<node_id>.json` if that file exists.
    pub fn load(config_dir: &Path, port: u16) -> Result<Self, RegistryError> {
        let default = Self::synthesize(port);
        let path = config_dir.join(format!("{}.json", default.node_id));
        if !path.exists() {
            return Ok(default);
        }

        let bytes = std::fs::read(&path).map_err(|source| RegistryError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| RegistryError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesize_follows_port_convention() {
        let identity = NodeIdentity::synthesize(5001);
        assert_eq!(identity.node_id.as_str(), "node_5001");
        assert_eq!(identity.host, "127.0.0.1");
        assert_eq!(identity.port, 5001);
    }

    #[test]
    fn missing_config_file_falls_back_to_synthesized() {
        let dir = tempfile::tempdir().unwrap();
        let identity = NodeIdentity::load(dir.path(), 5001).unwrap();
        assert_eq!(identity, NodeIdentity::synthesize(5001));
    }

    #[test]
    fn present_config_file_overrides_synthesized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("node_5001.json"),
            r#"{"node_id":"node_5001","host":"10.0.0.4","port":5001}"#,
        )
        .unwrap();

        let identity = NodeIdentity::load(dir.path(), 5001).unwrap();
        assert_eq!(identity.host, "10.0.0.4");
    }
}
