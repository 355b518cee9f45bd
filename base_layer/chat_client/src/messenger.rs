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
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::{
    config::MessengerOptions,
    error::MessengerError,
    identity::NodeIdentity,
    networking::TransportHandle,
    types::{Chat, Message, MessageHash},
};

pub type MessengerHandle = Arc<dyn Messenger>;

/// The chat protocol layer sitting on top of a transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: &str, payload: &[u8]) -> Result<MessageHash, MessengerError>;
    /// Everything received since the last call, one batch per chat.
    async fn retrieve_all(&self) -> Result<Vec<Vec<Message>>, MessengerError>;
    async fn join(&self, chat: &Chat) -> Result<(), MessengerError>;
    async fn save_chat(&self, chat: &Chat) -> Result<(), MessengerError>;
    /// Installs receive filters for `chats`, or for every saved chat when `None`.
    async fn load_filters(&self, chats: Option<&[Chat]>) -> Result<(), MessengerError>;
    async fn shutdown(&self) -> Result<(), MessengerError>;
}

/// Everything a messenger is built from.
pub struct MessengerParams {
    pub identity: Arc<NodeIdentity>,
    pub transport: TransportHandle,
    pub app_tag: String,
    pub options: MessengerOptions,
    pub store: EphemeralStore,
}

pub trait MessengerFactory: Send + Sync {
    fn create(&self, params: MessengerParams) -> Result<MessengerHandle, MessengerError>;
}

/// In-memory chat storage. Nothing outlives the session.
#[derive(Debug, Clone, Default)]
pub struct EphemeralStore {
    chats: Arc<RwLock<HashMap<String, Chat>>>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_chat(&self, chat: Chat) {
        let mut chats = self.chats.write().unwrap_or_else(|e| e.into_inner());
        chats.insert(chat.id(), chat);
    }

    pub fn get_chat(&self, chat_id: &str) -> Option<Chat> {
        let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
        chats.get(chat_id).cloned()
    }

    pub fn chats(&self) -> Vec<Chat> {
        let chats = self.chats.read().unwrap_or_else(|e| e.into_inner());
        chats.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.chats.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn store_is_shared_between_clones() {
        let store = EphemeralStore::new();
        let other = store.clone();
        store.save_chat(Chat::public("test200"));
        assert_eq!(other.get_chat("test200"), Some(Chat::public("test200")));
        assert_eq!(other.len(), 1);

        store.save_chat(Chat::public("test200"));
        assert_eq!(other.chats().len(), 1);
        assert!(other.get_chat("missing").is_none());
    }
}
