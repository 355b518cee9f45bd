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

use std::{io, time::Duration};

use thiserror::Error;

use crate::client::SessionState;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not generate a session identity: {0}")]
    IdentityError(#[source] IdentityError),
    #[error("The network session failed to start: {0}")]
    NetworkStartError(#[source] NetworkSessionError),
    #[error("The network session has no transport: {0}")]
    TransportUnavailableError(#[source] NetworkSessionError),
    #[error("Could not initialise the messaging layer: {0}")]
    MessagingInitError(#[source] MessengerError),
    #[error("The session started but its identity could not be persisted: {0}")]
    PersistenceError(#[source] IdentityError),
    #[error("Not connected")]
    NotConnectedError,
    #[error("Send did not complete within {0:?}")]
    TimeoutError(Duration),
    #[error("Transport error: {0}")]
    TransportError(#[source] MessengerError),
    #[error("Session shutdown failed: {}", .0.join("; "))]
    ShutdownError(Vec<String>),
    #[error("Operation not allowed while the session is {actual}, it must be {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
    #[error("Messaging layer error: {0}")]
    Messenger(#[from] MessengerError),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),
    #[error("Invalid secret key: {0}")]
    InvalidKey(String),
    #[error("Identity file IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum NetworkSessionError {
    #[error("The network session is already running")]
    AlreadyRunning,
    #[error("The network session is not running")]
    NotRunning,
    #[error("Network session IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Network session error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("The transport has been closed")]
    Closed,
    #[error("Transport error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("The messenger has been shut down")]
    ShutDown,
    #[error("Unknown chat `{0}`")]
    UnknownChat(String),
    #[error("Invalid application tag `{0}`")]
    InvalidAppTag(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Messenger error: {0}")]
    Other(String),
}
