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
    fmt::{self, Debug, Display, Formatter},
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use chatsim_p2p::CommsPublicKey;
use chatsim_shutdown::Shutdown;
use log::*;
use rand::rngs::OsRng;
use tokio::{task::JoinHandle, time};

use crate::{
    config::{ChatClientConfig, MessengerOptions, SessionConfig},
    error::ClientError,
    filter,
    identity::NodeIdentity,
    messenger::{EphemeralStore, MessengerFactory, MessengerHandle, MessengerParams},
    networking::NetworkSession,
    poller::{MessagePoller, PollStats},
    types::{Chat, Message},
};

const LOG_TARGET: &str = "chatsim::chat_client::client";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Running,
    Stopping,
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Running => write!(f, "running"),
            SessionState::Stopping => write!(f, "stopping"),
        }
    }
}

/// Everything that only exists while connected.
struct ActiveSession {
    config: SessionConfig,
    identity: Arc<NodeIdentity>,
    messenger: MessengerHandle,
    shutdown: Shutdown,
    poller: Option<JoinHandle<PollStats>>,
}

/// Drives the lifecycle of one simulated chat participant:
/// `Disconnected -> Connecting -> Running -> Stopping -> Disconnected`.
///
/// Only a `Running` session accepts chat operations. Lifecycle changes take `&mut self`, so at most one of them is in
/// progress at any time.
pub struct SessionController {
    working_dir: PathBuf,
    config: ChatClientConfig,
    network: Arc<dyn NetworkSession>,
    messenger_factory: Arc<dyn MessengerFactory>,
    state: SessionState,
    session: Option<ActiveSession>,
}

impl SessionController {
    pub fn new<P: Into<PathBuf>>(
        working_dir: P,
        config: ChatClientConfig,
        network: Arc<dyn NetworkSession>,
        messenger_factory: Arc<dyn MessengerFactory>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            config,
            network,
            messenger_factory,
            state: SessionState::Disconnected,
            session: None,
        }
    }

    /// Starts a session with a fresh identity.
    ///
    /// If the secret key cannot be persisted the session is left running and `PersistenceError` is returned; call
    /// [`disconnect`](Self::disconnect) to tear it down.
    pub async fn connect(
        &mut self,
        session_id: &str,
        listen_address: SocketAddr,
        enable_datasync: bool,
        enable_discovery_topic: bool,
    ) -> Result<(), ClientError> {
        if self.state != SessionState::Disconnected {
            return Err(ClientError::InvalidState {
                expected: SessionState::Disconnected,
                actual: self.state,
            });
        }
        self.state = SessionState::Connecting;
        info!(
            target: LOG_TARGET,
            "Connecting session `{}` on {}", session_id, listen_address
        );

        let options = MessengerOptions {
            datasync: enable_datasync,
            discovery_topic: enable_discovery_topic,
        };
        let session = match self.start_session(session_id, listen_address, options).await {
            Ok(session) => session,
            Err(err) => {
                warn!(target: LOG_TARGET, "Session `{}` failed to start: {}", session_id, err);
                self.state = SessionState::Disconnected;
                return Err(err);
            },
        };
        let identity = session.identity.clone();
        self.session = Some(session);
        self.state = SessionState::Running;

        let identity_file = self.working_dir.join(&self.config.identity_file);
        identity
            .save_secret_key(&identity_file)
            .map_err(ClientError::PersistenceError)?;

        info!(
            target: LOG_TARGET,
            "Session `{}` running as {}",
            session_id,
            identity.node_id().short_str()
        );
        Ok(())
    }

    async fn start_session(
        &self,
        session_id: &str,
        listen_address: SocketAddr,
        options: MessengerOptions,
    ) -> Result<ActiveSession, ClientError> {
        let identity = Arc::new(NodeIdentity::random(&mut OsRng).map_err(ClientError::IdentityError)?);
        debug!(target: LOG_TARGET, "Generated session identity {:?}", identity);

        let config = SessionConfig::new(
            session_id,
            listen_address,
            &self.config,
            self.working_dir.clone(),
            options,
        );

        let accounts = self.network.account_manager();
        accounts.add_account(identity.public_key().clone());
        self.network
            .start(&config, accounts)
            .await
            .map_err(ClientError::NetworkStartError)?;

        // From here on the network is running and must be stopped if anything else fails
        match self.start_messaging(&config, identity.clone()) {
            Ok((messenger, shutdown, poller)) => Ok(ActiveSession {
                config,
                identity,
                messenger,
                shutdown,
                poller: Some(poller),
            }),
            Err(err) => {
                if let Err(stop_err) = self.network.stop().await {
                    warn!(
                        target: LOG_TARGET,
                        "Could not stop the network after a failed connect: {}", stop_err
                    );
                }
                Err(err)
            },
        }
    }

    fn start_messaging(
        &self,
        config: &SessionConfig,
        identity: Arc<NodeIdentity>,
    ) -> Result<(MessengerHandle, Shutdown, JoinHandle<PollStats>), ClientError> {
        let transport = self
            .network
            .transport()
            .map_err(ClientError::TransportUnavailableError)?;

        let messenger = self
            .messenger_factory
            .create(MessengerParams {
                identity,
                transport,
                app_tag: self.config.app_tag.clone(),
                options: config.messenger_options(),
                store: EphemeralStore::new(),
            })
            .map_err(ClientError::MessagingInitError)?;

        let shutdown = Shutdown::new();
        let poller = MessagePoller::new(
            messenger.clone(),
            self.config.poll_interval,
            self.working_dir.join(&self.config.received_log_file),
            shutdown.to_signal(),
        )
        .spawn();
        Ok((messenger, shutdown, poller))
    }

    /// Tears the session down. Every teardown step is attempted even if an earlier one fails, and the controller
    /// always ends up `Disconnected`. Calling this while disconnected does nothing.
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        let mut session = match self.session.take() {
            Some(session) => session,
            None => {
                self.state = SessionState::Disconnected;
                return Ok(());
            },
        };
        self.state = SessionState::Stopping;
        info!(target: LOG_TARGET, "Stopping session `{}`", session.config.session_id());

        let mut errors = Vec::new();
        session.shutdown.trigger();
        if let Some(poller) = session.poller.take() {
            match poller.await {
                Ok(stats) => debug!(target: LOG_TARGET, "Polling task finished: {:?}", stats),
                Err(err) => errors.push(format!("polling task: {}", err)),
            }
        }
        if let Err(err) = session.messenger.shutdown().await {
            errors.push(format!("messenger: {}", err));
        }
        if let Err(err) = self.network.stop().await {
            errors.push(format!("network: {}", err));
        }
        self.state = SessionState::Disconnected;

        if errors.is_empty() {
            info!(target: LOG_TARGET, "Session `{}` stopped", session.config.session_id());
            Ok(())
        } else {
            warn!(
                target: LOG_TARGET,
                "Session `{}` stopped with {} error(s)",
                session.config.session_id(),
                errors.len()
            );
            Err(ClientError::ShutdownError(errors))
        }
    }

    /// Sends `payload` to `chat_id` and returns the message id as `0x` prefixed hex. Fails without touching the
    /// network when not connected. Not retried.
    pub async fn send(&self, chat_id: &str, payload: &[u8]) -> Result<String, ClientError> {
        let session = match self.session.as_ref() {
            Some(session) if self.state == SessionState::Running && self.connected() => session,
            _ => return Err(ClientError::NotConnectedError),
        };

        let deadline = self.config.send_timeout;
        let hash = time::timeout(deadline, session.messenger.send(chat_id, payload))
            .await
            .map_err(|_| ClientError::TimeoutError(deadline))?
            .map_err(ClientError::TransportError)?;
        trace!(target: LOG_TARGET, "Sent {} to `{}`", hash, chat_id);
        Ok(hash.to_string())
    }

    pub fn connected(&self) -> bool {
        self.network.is_running()
    }

    pub async fn join_channel(&self, name: &str) -> Result<Chat, ClientError> {
        let session = self.running_session()?;
        let chat = Chat::public(name);
        session.messenger.join(&chat).await?;
        session.messenger.save_chat(&chat).await?;
        debug!(target: LOG_TARGET, "Joined {}", chat);
        Ok(chat)
    }

    pub async fn create_one_to_one_chat(&self, name: &str, counterpart: CommsPublicKey) -> Result<Chat, ClientError> {
        let session = self.running_session()?;
        let chat = Chat::one_to_one(name, counterpart);
        session.messenger.save_chat(&chat).await?;
        debug!(target: LOG_TARGET, "Created chat {}", chat);
        Ok(chat)
    }

    /// Installs receive filters for `chats`, or for every saved chat when `None`.
    pub async fn load_filters(&self, chats: Option<&[Chat]>) -> Result<(), ClientError> {
        let session = self.running_session()?;
        session.messenger.load_filters(chats).await?;
        Ok(())
    }

    /// See [`filter::skip_message`]. Without a session only empty messages are skipped.
    pub fn skip_message(&self, message: &Message) -> bool {
        match self.session.as_ref() {
            Some(session) => filter::skip_message(session.identity.public_key(), message),
            None => message.text.is_empty(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn identity(&self) -> Option<&NodeIdentity> {
        self.session.as_ref().map(|s| s.identity.as_ref())
    }

    pub fn session_config(&self) -> Option<&SessionConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn running_session(&self) -> Result<&ActiveSession, ClientError> {
        match self.session.as_ref() {
            Some(session) if self.state == SessionState::Running => Ok(session),
            _ => Err(ClientError::InvalidState {
                expected: SessionState::Running,
                actual: self.state,
            }),
        }
    }
}

impl Debug for SessionController {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("working_dir", &self.working_dir)
            .field("config", &self.config)
            .field("state", &self.state)
            .field("identity", &self.identity())
            .finish()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.shutdown.trigger();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Disconnected.to_string(), "disconnected");
        assert_eq!(SessionState::Running.to_string(), "running");
        assert_eq!(SessionState::Stopping.to_string(), "stopping");
    }
}
