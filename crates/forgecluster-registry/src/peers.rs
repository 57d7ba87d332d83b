//! The shared Peer Registry: `config/peers.json`, the one piece of state
//! every node in the cluster reads and writes.
//!
//! Writers serialize by rewriting the whole file - there is no lock file
//! and no atomic rename here, unlike the per-node snapshot and log. A
//! concurrent writer can lose an update to a racing one; this mirrors the
//! behavior being modeled rather than fixing it, since the registry is
//! meant to be eventually consistent and every operation re-reads before
//! acting.

use std::path::{Path, PathBuf};

use forgecluster_types::NodeId;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerStatus {
    Alive,
    Dead,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    pub host: String,
    pub port: u16,
    pub status: PeerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderPointer {
    pub host: String,
    pub port: u16,
    pub node_id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct RegistryFile {
    peers: Vec<Peer>,
    leader: Option<LeaderPointer>,
}

/// A handle onto the shared registry file. Cheap to construct; every
/// operation re-reads the file, so there's no point caching an instance
/// across a long-lived component beyond convenience.
pub struct PeerRegistry {
    path: PathBuf,
}

impl PeerRegistry {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RegistryFile, RegistryError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| RegistryError::Parse {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(RegistryFile::default()),
            Err(source) => Err(RegistryError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, file: &RegistryFile) -> Result<(), RegistryError> {
        let json =
            serde_json::to_string_pretty(file).expect("registry file serializes infallibly");
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| RegistryError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| RegistryError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Registers `host:port` as alive, adding it if it isn't already known.
    pub fn register(&self, host: &str, port: u16) -> Result<(), RegistryError> {
        self.mark(host, port, PeerStatus::Alive)
    }

    /// Sets the status of `host:port`, adding the peer if it isn't known.
    pub fn mark(&self, host: &str, port: u16, status: PeerStatus) -> Result<(), RegistryError> {
        let mut file = self.read()?;
        if let Some(peer) = file
            .peers
            .iter_mut()
            .find(|p| p.host == host && p.port == port)
        {
            peer.status = status;
        } else {
            file.peers.push(Peer {
                host: host.to_string(),
                port,
                status,
            });
        }
        self.write(&file)
    }

    /// Every known peer, alive or dead.
    pub fn list_all(&self) -> Result<Vec<Peer>, RegistryError> {
        Ok(self.read()?.peers)
    }

    /// All peers currently marked alive, excluding `self_host:self_port`.
    pub fn list_alive_except_self(
        &self,
        self_host: &str,
        self_port: u16,
    ) -> Result<Vec<Peer>, RegistryError> {
        let file = self.read()?;
        Ok(file
            .peers
            .into_iter()
            .filter(|p| p.status == PeerStatus::Alive)
            .filter(|p| !(p.host == self_host && p.port == self_port))
            .collect())
    }

    /// Publishes `node_id` at `host:port` as the current leader.
    pub fn set_leader(&self, host: &str, port: u16, node_id: &NodeId) -> Result<(), RegistryError> {
        let mut file = self.read()?;
        file.leader = Some(LeaderPointer {
            host: host.to_string(),
            port,
            node_id: node_id.clone(),
        });
        self.write(&file)
    }

    pub fn get_leader(&self) -> Result<Option<LeaderPointer>, RegistryError> {
        Ok(self.read()?.leader)
    }

    /// Clears the leader pointer if every known peer is dead - there is no
    /// one left to be leader of.
    pub fn clear_leader_if_all_dead(&self) -> Result<(), RegistryError> {
        let mut file = self.read()?;
        if file.leader.is_some() && file.peers.iter().all(|p| p.status == PeerStatus::Dead) {
            file.leader = None;
            self.write(&file)?;
        }
        Ok(())
    }
}
