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

//! The network collaborators a session is built on. The controller only ever talks to them through these traits.

use std::sync::Arc;

use async_trait::async_trait;
use chatsim_p2p::CommsPublicKey;

use crate::{
    config::SessionConfig,
    error::{NetworkSessionError, TransportError},
};

pub type AccountManagerHandle = Arc<dyn AccountManager>;
pub type TransportHandle = Arc<dyn Transport>;

/// Key management owned by the network session.
pub trait AccountManager: Send + Sync {
    /// Keys the account manager currently holds, most recently added first.
    fn accounts(&self) -> Vec<CommsPublicKey>;
    fn add_account(&self, public_key: CommsPublicKey);
}

/// A payload published on a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub topic: String,
    pub sender: CommsPublicKey,
    pub payload: Vec<u8>,
    /// Distinguishes otherwise identical envelopes from the same sender
    pub nonce: u64,
}

/// Topic based message delivery.
pub trait Transport: Send + Sync {
    fn subscribe(&self, subscriber: &CommsPublicKey, topic: &str) -> Result<(), TransportError>;
    fn unsubscribe(&self, subscriber: &CommsPublicKey, topic: &str);
    /// Delivers `envelope` to every subscriber of its topic, including the sender.
    fn publish(&self, envelope: Envelope) -> Result<(), TransportError>;
    /// Takes everything delivered to `subscriber` since the last drain, in arrival order.
    fn drain(&self, subscriber: &CommsPublicKey) -> Result<Vec<Envelope>, TransportError>;
}

/// The background network node.
#[async_trait]
pub trait NetworkSession: Send + Sync {
    async fn start(&self, config: &SessionConfig, accounts: AccountManagerHandle) -> Result<(), NetworkSessionError>;
    async fn stop(&self) -> Result<(), NetworkSessionError>;
    fn is_running(&self) -> bool;
    /// Available only while the session is running.
    fn transport(&self) -> Result<TransportHandle, NetworkSessionError>;
    fn account_manager(&self) -> AccountManagerHandle;
}
