//   Copyright 2024. The Tari Project
//
//   Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
//   following conditions are met:
//
//   1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
//   disclaimer.
//
//   2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
//   following disclaimer in the documentation and/or other materials provided with the distribution.
//
//   3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
//   products derived from this software without specific prior written permission.
//
//   THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
//   INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//   DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
//   SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
//   SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
//   WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
//   USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::*;

use crate::{error::PeerCacheError, peer::Peer};

const LOG_TARGET: &str = "chatsim::p2p::peer_cache";

/// The durable mirror of a [`PeerRegistry`](crate::PeerRegistry).
pub trait PeerCache: Send + Sync {
    /// Replace everything in the cache with `peers`.
    fn replace(&self, peers: &[Peer]) -> Result<(), PeerCacheError>;
}

impl<C: PeerCache + ?Sized> PeerCache for Box<C> {
    fn replace(&self, peers: &[Peer]) -> Result<(), PeerCacheError> {
        (**self).replace(peers)
    }
}

impl<C: PeerCache + ?Sized> PeerCache for Arc<C> {
    fn replace(&self, peers: &[Peer]) -> Result<(), PeerCacheError> {
        (**self).replace(peers)
    }
}

/// Keeps the last replaced list in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPeerCache {
    peers: Mutex<Vec<Peer>>,
}

impl MemoryPeerCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn peers(&self) -> Vec<Peer> {
        match self.peers.lock() {
            Ok(peers) => peers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl PeerCache for MemoryPeerCache {
    fn replace(&self, peers: &[Peer]) -> Result<(), PeerCacheError> {
        let mut lock = self
            .peers
            .lock()
            .map_err(|_| PeerCacheError::Unavailable("memory cache lock poisoned".to_string()))?;
        *lock = peers.to_vec();
        Ok(())
    }
}

/// Writes the peer list as a JSON array. The file is written next to the target and renamed into place so readers
/// never see a half written list.
#[derive(Debug, Clone)]
pub struct JsonFilePeerCache {
    path: PathBuf,
}

impl JsonFilePeerCache {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Peer>, PeerCacheError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl PeerCache for JsonFilePeerCache {
    fn replace(&self, peers: &[Peer]) -> Result<(), PeerCacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            serde_json::to_writer_pretty(&mut file, peers)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        trace!(
            target: LOG_TARGET,
            "Wrote {} peer(s) to {}",
            peers.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::peer::NodeId;

    fn peer(n: u8) -> Peer {
        Peer::new(NodeId::from([n; 32]), vec![format!("10.0.0.{}:30303", n).parse().unwrap()])
    }

    #[test]
    fn json_cache_replaces_the_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonFilePeerCache::new(dir.path().join("peers").join("peers.json"));
        assert!(cache.load().unwrap().is_empty());

        cache.replace(&[peer(1), peer(2)]).unwrap();
        assert_eq!(cache.load().unwrap(), vec![peer(1), peer(2)]);

        cache.replace(&[peer(3)]).unwrap();
        assert_eq!(cache.load().unwrap(), vec![peer(3)]);
        assert!(!cache.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn memory_cache_holds_the_last_list() {
        let cache = MemoryPeerCache::new();
        cache.replace(&[peer(1)]).unwrap();
        cache.replace(&[peer(2), peer(3)]).unwrap();
        assert_eq!(cache.peers(), vec![peer(2), peer(3)]);
    }
}
