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
    collections::HashMap,
    sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::*;

use crate::{
    error::PeerRegistryError,
    peer::{NodeId, Peer},
    peer_cache::PeerCache,
};

const LOG_TARGET: &str = "chatsim::p2p::peer_registry";

/// The set of currently known relay peers.
///
/// Readers share a read lock and `update` takes the write lock, so a reader always sees the complete result of
/// some `update` call. The map is only ever replaced as a whole, never patched, which is why a poisoned lock can
/// safely be recovered.
///
/// Updates are serialised on a separate lock held across the swap and the cache write, so once every update has
/// returned the cache holds the same list as memory. Readers never wait on that lock.
pub struct PeerRegistry<C> {
    peers: RwLock<HashMap<NodeId, Peer>>,
    update_lock: Mutex<()>,
    cache: C,
}

impl<C: PeerCache> PeerRegistry<C> {
    pub fn new(cache: C) -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            update_lock: Mutex::new(()),
            cache,
        }
    }

    pub fn exist(&self, node_id: &NodeId) -> bool {
        self.read_lock().contains_key(node_id)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<Peer> {
        self.read_lock().get(node_id).cloned()
    }

    /// Replace every known peer with `peers` and mirror the list to the cache.
    ///
    /// When several peers share a node id the last one wins. The in-memory replacement always happens; if the cache
    /// fails a `SyncError` is returned and the registry is *not* rolled back.
    pub fn update(&self, peers: Vec<Peer>) -> Result<(), PeerRegistryError> {
        let mut replacement = HashMap::with_capacity(peers.len());
        for peer in &peers {
            replacement.insert(peer.node_id, peer.clone());
        }
        let num_peers = replacement.len();

        let _update_guard = self.update_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        {
            let mut lock = self.write_lock();
            *lock = replacement;
        }
        debug!(target: LOG_TARGET, "Peer registry replaced with {} peer(s)", num_peers);

        self.cache.replace(&peers).map_err(|err| {
            warn!(
                target: LOG_TARGET,
                "Peer registry updated but the cache could not be synchronised: {}", err
            );
            PeerRegistryError::from(err)
        })
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    /// A consistent snapshot of every known peer, in no particular order.
    pub fn peers(&self) -> Vec<Peer> {
        self.read_lock().values().cloned().collect()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.read_lock().keys().copied().collect()
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, HashMap<NodeId, Peer>> {
        self.peers.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, HashMap<NodeId, Peer>> {
        self.peers.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod test {
    use std::net::SocketAddr;

    use super::*;
    use crate::{error::PeerCacheError, peer_cache::MemoryPeerCache};

    fn node_id(n: u8) -> NodeId {
        NodeId::from([n; 32])
    }

    fn peer(n: u8, port: u16) -> Peer {
        let address: SocketAddr = format!("10.0.0.{}:{}", n, port).parse().unwrap();
        Peer::new(node_id(n), vec![address])
    }

    struct FailingCache;

    impl PeerCache for FailingCache {
        fn replace(&self, _peers: &[Peer]) -> Result<(), PeerCacheError> {
            Err(PeerCacheError::Unavailable("disk on fire".to_string()))
        }
    }

    #[test]
    fn update_replaces_the_whole_set() {
        let registry = PeerRegistry::new(MemoryPeerCache::new());
        registry.update(vec![peer(1, 1), peer(2, 1)]).unwrap();
        assert!(registry.exist(&node_id(1)));
        assert!(registry.exist(&node_id(2)));
        assert!(!registry.exist(&node_id(3)));

        registry.update(vec![peer(3, 1)]).unwrap();
        assert!(!registry.exist(&node_id(1)));
        assert!(!registry.exist(&node_id(2)));
        assert!(registry.exist(&node_id(3)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn later_duplicates_win() {
        let registry = PeerRegistry::new(MemoryPeerCache::new());
        registry.update(vec![peer(1, 1000), peer(2, 1), peer(1, 2000)]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&node_id(1)).unwrap(), peer(1, 2000));
    }

    #[test]
    fn get_returns_none_on_miss() {
        let registry = PeerRegistry::new(MemoryPeerCache::new());
        assert!(registry.get(&node_id(9)).is_none());
        assert!(registry.is_empty());
        registry.update(vec![peer(1, 1)]).unwrap();
        assert!(registry.get(&node_id(9)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn update_passes_the_input_list_to_the_cache() {
        let registry = PeerRegistry::new(MemoryPeerCache::new());
        registry.update(vec![peer(4, 1), peer(5, 1)]).unwrap();
        assert_eq!(registry.cache().peers(), vec![peer(4, 1), peer(5, 1)]);
        registry.update(vec![]).unwrap();
        assert!(registry.cache().peers().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_sync_keeps_the_new_peers() {
        let registry = PeerRegistry::new(FailingCache);
        let err = registry.update(vec![peer(1, 1)]).unwrap_err();
        assert!(matches!(err, PeerRegistryError::SyncError(_)));
        assert!(registry.exist(&node_id(1)));
        assert_eq!(registry.node_ids(), vec![node_id(1)]);
    }
}
