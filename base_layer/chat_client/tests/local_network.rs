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

use std::{fs, sync::Arc, time::Duration};

use chatsim_chat_client::{
    local::{LocalMessengerFactory, LocalNetwork, LocalNetworkSession},
    ChatClientConfig,
    SessionController,
};
use chatsim_p2p::{
    peer_cache::{JsonFilePeerCache, PeerCache},
    Fleet,
    PeerRegistry,
};
use tempfile::TempDir;

fn participant(network: &LocalNetwork, dir: &TempDir) -> (SessionController, Arc<PeerRegistry<Box<dyn PeerCache>>>) {
    let config = ChatClientConfig {
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    };
    let cache: Box<dyn PeerCache> = Box::new(JsonFilePeerCache::new(dir.path().join(&config.peer_cache_file)));
    let registry = Arc::new(PeerRegistry::new(cache));
    let session = Arc::new(LocalNetworkSession::new(network.clone(), registry.clone()));
    let controller = SessionController::new(dir.path(), config, session, Arc::new(LocalMessengerFactory));
    (controller, registry)
}

fn read_lines(dir: &TempDir, file: &str) -> Vec<String> {
    fs::read_to_string(dir.path().join(file))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_participants_exchange_public_messages() {
    let network = LocalNetwork::new();
    let (alice_dir, bob_dir) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
    let (mut alice, alice_registry) = participant(&network, &alice_dir);
    let (mut bob, _) = participant(&network, &bob_dir);

    alice.connect("alice", "127.0.0.1:30303".parse().unwrap(), false, false).await.unwrap();
    bob.connect("bob", "127.0.0.1:30304".parse().unwrap(), false, true).await.unwrap();

    // Connecting seeds the registry and mirrors it to disk
    let bootstrap = Fleet::Staging.bootstrap_peers();
    assert_eq!(alice_registry.len(), bootstrap.len());
    let cached = JsonFilePeerCache::new(alice_dir.path().join("peers.json")).load().unwrap();
    assert_eq!(cached.len(), bootstrap.len());

    alice.join_channel("test200").await.unwrap();
    bob.join_channel("test200").await.unwrap();
    alice.load_filters(None).await.unwrap();

    let mut sent = Vec::new();
    for n in 0..3 {
        sent.push(alice.send("test200", format!("message {}", n).as_bytes()).await.unwrap());
    }

    for _ in 0..200 {
        if read_lines(&bob_dir, "private-read.txt").len() >= sent.len() &&
            read_lines(&alice_dir, "private-read.txt").len() >= sent.len()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    alice.disconnect().await.unwrap();
    bob.disconnect().await.unwrap();

    assert_eq!(read_lines(&bob_dir, "private-read.txt"), sent);
    // Public chats are echoed to the sender as well
    assert_eq!(read_lines(&alice_dir, "private-read.txt"), sent);
}

#[tokio::test]
async fn one_to_one_chat_reaches_only_the_counterpart() {
    let network = LocalNetwork::new();
    let dirs = [
        tempfile::tempdir().unwrap(),
        tempfile::tempdir().unwrap(),
        tempfile::tempdir().unwrap(),
    ];
    let (mut alice, _) = participant(&network, &dirs[0]);
    let (mut bob, _) = participant(&network, &dirs[1]);
    let (mut carol, _) = participant(&network, &dirs[2]);
    let address = "127.0.0.1:30303".parse().unwrap();
    alice.connect("alice", address, false, false).await.unwrap();
    bob.connect("bob", address, false, false).await.unwrap();
    carol.connect("carol", address, false, false).await.unwrap();

    let bob_key = bob.identity().unwrap().public_key().clone();
    let chat = alice.create_one_to_one_chat("bob", bob_key).await.unwrap();
    let id = alice.send(&chat.id(), b"just for you").await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    alice.disconnect().await.unwrap();
    bob.disconnect().await.unwrap();
    carol.disconnect().await.unwrap();

    assert_eq!(read_lines(&dirs[1], "private-read.txt"), vec![id]);
    assert!(read_lines(&dirs[0], "private-read.txt").is_empty());
    assert!(read_lines(&dirs[2], "private-read.txt").is_empty());
}

#[tokio::test]
async fn sending_to_an_unjoined_chat_fails() {
    let network = LocalNetwork::new();
    let dir = tempfile::tempdir().unwrap();
    let (mut alice, _) = participant(&network, &dir);
    alice.connect("alice", "127.0.0.1:30303".parse().unwrap(), false, false).await.unwrap();

    let err = alice.send("nowhere", b"hello").await.unwrap_err();
    assert!(matches!(err, chatsim_chat_client::ClientError::TransportError(_)));
    alice.disconnect().await.unwrap();
}
