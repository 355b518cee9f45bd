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

//! An in-process stand-in for the real network stack. Every session created from the same [`LocalNetwork`] can
//! reach every other one, which is enough to run several simulated participants inside one process.

use std::{
    collections::{HashMap, HashSet},
    fs,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
        Mutex,
        MutexGuard,
        RwLock,
    },
};

use async_trait::async_trait;
use blake2::{digest::consts::U32, Blake2b, Digest};
use chatsim_p2p::{peer_cache::PeerCache, CommsPublicKey, PeerRegistry};
use log::*;
use tari_utilities::{hex::Hex, ByteArray};
use tokio::task;

use crate::{
    config::{MessengerOptions, SessionConfig},
    error::{MessengerError, NetworkSessionError, TransportError},
    identity::NodeIdentity,
    messenger::{EphemeralStore, Messenger, MessengerFactory, MessengerHandle, MessengerParams},
    networking::{AccountManager, AccountManagerHandle, Envelope, NetworkSession, Transport, TransportHandle},
    types::{public_key_to_chat_id, Chat, Direction, Message, MessageHash},
};

const LOG_TARGET: &str = "chatsim::chat_client::local";

/// Topic every participant listens on when discovery is enabled
pub const DISCOVERY_TOPIC: &str = "contact-discovery";

const MESSAGE_HASH_DOMAIN: &[u8] = b"chatsim.chat_client.message";

#[derive(Debug, Default)]
struct Bus {
    /// topic -> subscriber keys (hex)
    topics: HashMap<String, HashSet<String>>,
    /// subscriber key (hex) -> undelivered envelopes
    inboxes: HashMap<String, Vec<Envelope>>,
}

/// A shared topic bus. Clones refer to the same bus.
#[derive(Debug, Clone, Default)]
pub struct LocalNetwork {
    bus: Arc<Mutex<Bus>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribers(&self, topic: &str) -> usize {
        self.lock().topics.get(topic).map(HashSet::len).unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Bus> {
        self.bus.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for LocalNetwork {
    fn subscribe(&self, subscriber: &CommsPublicKey, topic: &str) -> Result<(), TransportError> {
        let key = subscriber.to_hex();
        let mut bus = self.lock();
        bus.inboxes.entry(key.clone()).or_default();
        bus.topics.entry(topic.to_string()).or_default().insert(key);
        Ok(())
    }

    fn unsubscribe(&self, subscriber: &CommsPublicKey, topic: &str) {
        let mut bus = self.lock();
        if let Some(subscribers) = bus.topics.get_mut(topic) {
            subscribers.remove(&subscriber.to_hex());
        }
    }

    fn publish(&self, envelope: Envelope) -> Result<(), TransportError> {
        let mut bus = self.lock();
        let subscribers = match bus.topics.get(&envelope.topic) {
            Some(subscribers) => subscribers.iter().cloned().collect::<Vec<_>>(),
            None => Vec::new(),
        };
        trace!(
            target: LOG_TARGET,
            "Publishing to `{}` ({} subscriber(s))",
            envelope.topic,
            subscribers.len()
        );
        for key in subscribers {
            bus.inboxes.entry(key).or_default().push(envelope.clone());
        }
        Ok(())
    }

    fn drain(&self, subscriber: &CommsPublicKey) -> Result<Vec<Envelope>, TransportError> {
        let mut bus = self.lock();
        Ok(bus
            .inboxes
            .get_mut(&subscriber.to_hex())
            .map(std::mem::take)
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct LocalAccountManager {
    accounts: RwLock<Vec<CommsPublicKey>>,
}

impl AccountManager for LocalAccountManager {
    fn accounts(&self) -> Vec<CommsPublicKey> {
        let accounts = self.accounts.read().unwrap_or_else(|e| e.into_inner());
        accounts.iter().rev().cloned().collect()
    }

    fn add_account(&self, public_key: CommsPublicKey) {
        let mut accounts = self.accounts.write().unwrap_or_else(|e| e.into_inner());
        if !accounts.contains(&public_key) {
            accounts.push(public_key);
        }
    }
}

/// A network session on a [`LocalNetwork`]. Starting it creates the session data directory and seeds the peer
/// registry with the fleet's bootstrap peers.
pub struct LocalNetworkSession {
    network: LocalNetwork,
    registry: Arc<PeerRegistry<Box<dyn PeerCache>>>,
    accounts: Arc<LocalAccountManager>,
    running: AtomicBool,
}

impl LocalNetworkSession {
    pub fn new(network: LocalNetwork, registry: Arc<PeerRegistry<Box<dyn PeerCache>>>) -> Self {
        Self {
            network,
            registry,
            accounts: Arc::new(LocalAccountManager::default()),
            running: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &PeerRegistry<Box<dyn PeerCache>> {
        &self.registry
    }
}

#[async_trait]
impl NetworkSession for LocalNetworkSession {
    async fn start(&self, config: &SessionConfig, accounts: AccountManagerHandle) -> Result<(), NetworkSessionError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(NetworkSessionError::AlreadyRunning);
        }
        fs::create_dir_all(config.data_dir())?;

        // The cache write is blocking file IO. The registry keeps the new peers even if they could not be mirrored,
        // so carry on
        let registry = self.registry.clone();
        let bootstrap_peers = config.bootstrap_peers().to_vec();
        match task::spawn_blocking(move || registry.update(bootstrap_peers)).await {
            Ok(Ok(())) => {},
            Ok(Err(err)) => warn!(target: LOG_TARGET, "Bootstrap peers not cached: {}", err),
            Err(err) => warn!(target: LOG_TARGET, "Bootstrap peer update did not complete: {}", err),
        }

        self.running.store(true, Ordering::SeqCst);
        info!(
            target: LOG_TARGET,
            "Local network session `{}` listening on {} (network {}, fleet {}, {} peer(s), {} account(s))",
            config.session_id(),
            config.listen_address(),
            config.network_id(),
            config.fleet(),
            self.registry.len(),
            accounts.accounts().len()
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), NetworkSessionError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(NetworkSessionError::NotRunning);
        }
        info!(target: LOG_TARGET, "Local network session stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn transport(&self) -> Result<TransportHandle, NetworkSessionError> {
        if !self.is_running() {
            return Err(NetworkSessionError::NotRunning);
        }
        Ok(Arc::new(self.network.clone()))
    }

    fn account_manager(&self) -> AccountManagerHandle {
        self.accounts.clone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMessengerFactory;

impl MessengerFactory for LocalMessengerFactory {
    fn create(&self, params: MessengerParams) -> Result<MessengerHandle, MessengerError> {
        Ok(Arc::new(LocalMessenger::new(params)?))
    }
}

/// Publishes each chat on a topic named after its id. One-to-one messages are published on the counterpart's own
/// topic, which every messenger subscribes to on creation.
pub struct LocalMessenger {
    identity: Arc<NodeIdentity>,
    transport: TransportHandle,
    store: EphemeralStore,
    own_topic: String,
    topics: Mutex<HashSet<String>>,
    nonce: AtomicU64,
    is_shut_down: AtomicBool,
}

impl LocalMessenger {
    pub fn new(params: MessengerParams) -> Result<Self, MessengerError> {
        let MessengerParams {
            identity,
            transport,
            app_tag,
            options,
            store,
        } = params;
        if app_tag.trim().is_empty() {
            return Err(MessengerError::InvalidAppTag(app_tag));
        }
        let MessengerOptions {
            datasync,
            discovery_topic,
        } = options;
        debug!(
            target: LOG_TARGET,
            "Creating messenger `{}` (datasync: {}, discovery: {})", app_tag, datasync, discovery_topic
        );

        let own_topic = public_key_to_chat_id(identity.public_key());
        let messenger = Self {
            identity,
            transport,
            store,
            own_topic: own_topic.clone(),
            topics: Mutex::new(HashSet::new()),
            nonce: AtomicU64::new(0),
            is_shut_down: AtomicBool::new(false),
        };
        messenger.subscribe(&own_topic)?;
        if discovery_topic {
            messenger.subscribe(DISCOVERY_TOPIC)?;
        }
        Ok(messenger)
    }

    fn subscribe(&self, topic: &str) -> Result<(), MessengerError> {
        self.transport.subscribe(self.identity.public_key(), topic)?;
        self.topics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(topic.to_string());
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), MessengerError> {
        if self.is_shut_down.load(Ordering::SeqCst) {
            return Err(MessengerError::ShutDown);
        }
        Ok(())
    }

    fn to_message(&self, envelope: Envelope) -> Message {
        let id = hash_envelope(&envelope);
        let chat_id = if envelope.topic == self.own_topic {
            public_key_to_chat_id(&envelope.sender)
        } else {
            envelope.topic
        };
        let direction = if envelope.sender == *self.identity.public_key() {
            Direction::Sent
        } else {
            Direction::Received
        };
        Message {
            id,
            sender: envelope.sender,
            chat_id,
            text: String::from_utf8_lossy(&envelope.payload).into_owned(),
            direction,
        }
    }
}

#[async_trait]
impl Messenger for LocalMessenger {
    async fn send(&self, chat_id: &str, payload: &[u8]) -> Result<MessageHash, MessengerError> {
        self.ensure_running()?;
        let chat = self
            .store
            .get_chat(chat_id)
            .ok_or_else(|| MessengerError::UnknownChat(chat_id.to_string()))?;
        let envelope = Envelope {
            topic: chat.id(),
            sender: self.identity.public_key().clone(),
            payload: payload.to_vec(),
            nonce: self.nonce.fetch_add(1, Ordering::SeqCst),
        };
        let id = hash_envelope(&envelope);
        self.transport.publish(envelope)?;
        Ok(id)
    }

    async fn retrieve_all(&self) -> Result<Vec<Vec<Message>>, MessengerError> {
        self.ensure_running()?;
        let envelopes = self.transport.drain(self.identity.public_key())?;

        // One batch per chat, chats in the order they were first seen
        let mut batches: Vec<Vec<Message>> = Vec::new();
        let mut batch_index = HashMap::new();
        for envelope in envelopes {
            let message = self.to_message(envelope);
            let index = *batch_index.entry(message.chat_id.clone()).or_insert_with(|| {
                batches.push(Vec::new());
                batches.len() - 1
            });
            batches[index].push(message);
        }
        Ok(batches)
    }

    async fn join(&self, chat: &Chat) -> Result<(), MessengerError> {
        self.ensure_running()?;
        if chat.is_public() {
            self.subscribe(&chat.id())?;
        }
        Ok(())
    }

    async fn save_chat(&self, chat: &Chat) -> Result<(), MessengerError> {
        self.ensure_running()?;
        self.store.save_chat(chat.clone());
        Ok(())
    }

    async fn load_filters(&self, chats: Option<&[Chat]>) -> Result<(), MessengerError> {
        self.ensure_running()?;
        let chats = match chats {
            Some(chats) => chats.to_vec(),
            None => self.store.chats(),
        };
        for chat in chats.iter().filter(|c| c.is_public()) {
            self.subscribe(&chat.id())?;
        }
        debug!(target: LOG_TARGET, "Loaded filters for {} chat(s)", chats.len());
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), MessengerError> {
        if self.is_shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let topics = std::mem::take(&mut *self.topics.lock().unwrap_or_else(|e| e.into_inner()));
        for topic in &topics {
            self.transport.unsubscribe(self.identity.public_key(), topic);
        }
        debug!(target: LOG_TARGET, "Messenger shut down, left {} topic(s)", topics.len());
        Ok(())
    }
}

fn hash_envelope(envelope: &Envelope) -> MessageHash {
    let digest = Blake2b::<U32>::new()
        .chain_update(MESSAGE_HASH_DOMAIN)
        .chain_update(envelope.sender.as_bytes())
        .chain_update(envelope.topic.as_bytes())
        .chain_update(envelope.nonce.to_le_bytes())
        .chain_update(&envelope.payload)
        .finalize();
    let mut bytes = [0u8; MessageHash::BYTE_SIZE];
    bytes.copy_from_slice(&digest);
    MessageHash::from(bytes)
}
