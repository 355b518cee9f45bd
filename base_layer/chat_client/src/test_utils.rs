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

//! Scriptable collaborators for exercising the session controller without a network. Used by the tests of this
//! crate and of the crates that drive it.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chatsim_p2p::CommsPublicKey;
use rand::{rngs::OsRng, RngCore};

use crate::{
    config::SessionConfig,
    error::{MessengerError, NetworkSessionError, TransportError},
    local::LocalAccountManager,
    messenger::{Messenger, MessengerFactory, MessengerHandle, MessengerParams},
    networking::{AccountManagerHandle, Envelope, NetworkSession, Transport, TransportHandle},
    types::{Chat, Direction, Message, MessageHash},
};

/// A transport that accepts everything and delivers nothing.
#[derive(Debug, Default)]
pub struct NullTransport {
    pub published: AtomicUsize,
}

impl Transport for NullTransport {
    fn subscribe(&self, _subscriber: &CommsPublicKey, _topic: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn unsubscribe(&self, _subscriber: &CommsPublicKey, _topic: &str) {}

    fn publish(&self, _envelope: Envelope) -> Result<(), TransportError> {
        self.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn drain(&self, _subscriber: &CommsPublicKey) -> Result<Vec<Envelope>, TransportError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct MockNetworkSession {
    running: AtomicBool,
    fail_start: AtomicBool,
    fail_transport: AtomicBool,
    fail_stop: AtomicBool,
    pub start_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub transport: Arc<NullTransport>,
    accounts: Arc<LocalAccountManager>,
}

impl MockNetworkSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn fail_transport(&self) {
        self.fail_transport.store(true, Ordering::SeqCst);
    }

    pub fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    /// Simulates the node dropping off the network while the controller still considers itself running.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkSession for MockNetworkSession {
    async fn start(&self, _config: &SessionConfig, _accounts: AccountManagerHandle) -> Result<(), NetworkSessionError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(NetworkSessionError::Other("port in use".to_string()));
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), NetworkSessionError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(NetworkSessionError::Other("node did not stop cleanly".to_string()));
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn transport(&self) -> Result<TransportHandle, NetworkSessionError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(NetworkSessionError::Other("no transport".to_string()));
        }
        Ok(self.transport.clone())
    }

    fn account_manager(&self) -> AccountManagerHandle {
        self.accounts.clone()
    }
}

pub type RetrieveResult = Result<Vec<Vec<Message>>, MessengerError>;

#[derive(Default)]
pub struct MockMessenger {
    retrieve_script: Mutex<VecDeque<RetrieveResult>>,
    send_delay: Mutex<Option<Duration>>,
    retrieve_delay: Mutex<Option<Duration>>,
    fail_send: AtomicBool,
    fail_shutdown: AtomicBool,
    pub send_calls: AtomicUsize,
    pub retrieve_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
    pub joined: Mutex<Vec<Chat>>,
    pub saved: Mutex<Vec<Chat>>,
    pub filter_loads: AtomicUsize,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result of a future `retrieve_all` call. An empty queue yields no messages.
    pub fn push_retrieve_result(&self, result: RetrieveResult) {
        self.retrieve_script.lock().unwrap_or_else(|e| e.into_inner()).push_back(result);
    }

    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// Every `retrieve_all` takes `delay` to complete, holding the scripted result until then.
    pub fn set_retrieve_delay(&self, delay: Duration) {
        *self.retrieve_delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    pub fn fail_send(&self) {
        self.fail_send.store(true, Ordering::SeqCst);
    }

    pub fn fail_shutdown(&self) {
        self.fail_shutdown.store(true, Ordering::SeqCst);
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdown_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, _chat_id: &str, _payload: &[u8]) -> Result<MessageHash, MessengerError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.send_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(MessengerError::Other("send rejected".to_string()));
        }
        Ok(random_hash())
    }

    async fn retrieve_all(&self) -> Result<Vec<Vec<Message>>, MessengerError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.retrieve_script.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        let delay = *self.retrieve_delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn join(&self, chat: &Chat) -> Result<(), MessengerError> {
        self.joined.lock().unwrap_or_else(|e| e.into_inner()).push(chat.clone());
        Ok(())
    }

    async fn save_chat(&self, chat: &Chat) -> Result<(), MessengerError> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).push(chat.clone());
        Ok(())
    }

    async fn load_filters(&self, _chats: Option<&[Chat]>) -> Result<(), MessengerError> {
        self.filter_loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), MessengerError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown.load(Ordering::SeqCst) {
            return Err(MessengerError::Other("store still busy".to_string()));
        }
        Ok(())
    }
}

/// Hands out the same [`MockMessenger`] every time, or fails if told to.
#[derive(Default)]
pub struct MockMessengerFactory {
    pub messenger: Arc<MockMessenger>,
    fail: AtomicBool,
    pub create_calls: AtomicUsize,
}

impl MockMessengerFactory {
    pub fn new(messenger: Arc<MockMessenger>) -> Self {
        Self {
            messenger,
            fail: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_create(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl MessengerFactory for MockMessengerFactory {
    fn create(&self, _params: MessengerParams) -> Result<MessengerHandle, MessengerError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(MessengerError::Other("database locked".to_string()));
        }
        Ok(self.messenger.clone())
    }
}

pub fn random_hash() -> MessageHash {
    let mut bytes = [0u8; MessageHash::BYTE_SIZE];
    OsRng.fill_bytes(&mut bytes);
    MessageHash::from(bytes)
}

pub fn received_message(sender: &CommsPublicKey, chat_id: &str, text: &str) -> Message {
    Message {
        id: random_hash(),
        sender: sender.clone(),
        chat_id: chat_id.to_string(),
        text: text.to_string(),
        direction: Direction::Received,
    }
}
