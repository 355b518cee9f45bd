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

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerCacheError {
    #[error("Peer cache IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not serialize peers: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Peer cache unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum PeerRegistryError {
    /// The in-memory registry was replaced but the durable mirror may be stale
    #[error("Failed to synchronise peers to the cache: {0}")]
    SyncError(#[from] PeerCacheError),
}

#[derive(Debug, Error)]
pub enum NodeIdError {
    #[error("Node id must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Node id is not valid hex: {0}")]
    InvalidHex(String),
}
