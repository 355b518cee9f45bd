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
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
        Mutex,
    },
    thread,
    time::Duration,
};

use chatsim_p2p::{
    error::PeerCacheError,
    peer_cache::{JsonFilePeerCache, MemoryPeerCache, PeerCache},
    Fleet,
    NodeId,
    Peer,
    PeerRegistry,
};

fn make_peers(range: std::ops::Range<u8>) -> Vec<Peer> {
    range
        .map(|n| Peer::new(NodeId::from([n; 32]), vec![format!("10.1.0.{}:30303", n).parse().unwrap()]))
        .collect()
}

#[test]
fn readers_never_observe_a_partial_update() {
    let registry = Arc::new(PeerRegistry::new(MemoryPeerCache::new()));
    let set_a = make_peers(0..64);
    let set_b = make_peers(64..128);
    let ids_a = set_a.iter().map(|p| p.node_id).collect::<HashSet<_>>();
    let ids_b = set_b.iter().map(|p| p.node_id).collect::<HashSet<_>>();
    registry.update(set_a.clone()).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let readers = (0..4)
        .map(|_| {
            let registry = registry.clone();
            let done = done.clone();
            let ids_a = ids_a.clone();
            let ids_b = ids_b.clone();
            thread::spawn(move || {
                let mut snapshots = 0usize;
                while !done.load(Ordering::Acquire) {
                    let snapshot = registry.node_ids().into_iter().collect::<HashSet<_>>();
                    assert!(
                        snapshot == ids_a || snapshot == ids_b,
                        "observed a mixture of {} peers",
                        snapshot.len()
                    );
                    snapshots += 1;
                }
                snapshots
            })
        })
        .collect::<Vec<_>>();

    for i in 0..500 {
        let next = if i % 2 == 0 { set_b.clone() } else { set_a.clone() };
        registry.update(next).unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().expect("reader panicked");
    }
}

#[test]
fn every_update_is_fully_visible_once_it_returns() {
    let registry = PeerRegistry::new(MemoryPeerCache::new());
    let mut previous: Vec<Peer> = Vec::new();
    for round in 0..10u8 {
        let current = make_peers(round * 10..round * 10 + 10);
        registry.update(current.clone()).unwrap();
        assert!(current.iter().all(|p| registry.exist(&p.node_id)));
        assert!(previous.iter().all(|p| !registry.exist(&p.node_id)));
        previous = current;
    }
}

#[test]
fn fleet_bootstrap_peers_are_mirrored_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cache = JsonFilePeerCache::new(dir.path().join("peers.json"));
    let registry = PeerRegistry::new(cache);
    let peers = Fleet::Staging.bootstrap_peers();
    registry.update(peers.clone()).unwrap();

    assert_eq!(registry.len(), peers.len());
    let mirrored = registry.cache().load().unwrap();
    assert_eq!(mirrored, peers);
}

/// Records the last list written. Writes of lists starting with an even node id are slow.
#[derive(Default)]
struct SlowCache {
    last: Mutex<Vec<Peer>>,
}

impl PeerCache for SlowCache {
    fn replace(&self, peers: &[Peer]) -> Result<(), PeerCacheError> {
        if peers.first().map(|p| p.node_id.as_bytes()[0] % 2 == 0).unwrap_or(false) {
            thread::sleep(Duration::from_millis(5));
        }
        *self.last.lock().unwrap() = peers.to_vec();
        Ok(())
    }
}

#[test]
fn overlapping_updates_leave_cache_and_memory_in_agreement() {
    let registry = Arc::new(PeerRegistry::new(SlowCache::default()));
    let writers = (0..8u8)
        .map(|n| {
            let registry = registry.clone();
            thread::spawn(move || {
                for round in 0..10u8 {
                    let start = n * 10 + round;
                    registry.update(make_peers(start..start + 3)).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for writer in writers {
        writer.join().expect("writer panicked");
    }

    let in_memory = registry.node_ids().into_iter().collect::<HashSet<_>>();
    let cached = registry
        .cache()
        .last
        .lock()
        .unwrap()
        .iter()
        .map(|p| p.node_id)
        .collect::<HashSet<_>>();
    assert_eq!(cached, in_memory);
}
