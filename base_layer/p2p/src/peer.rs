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
    convert::TryFrom,
    fmt::{self, Display, Formatter},
    net::SocketAddr,
    str::FromStr,
};

use blake2::{digest::consts::U32, Blake2b, Digest};
use serde::{Deserialize, Serialize};
use tari_crypto::ristretto::{RistrettoPublicKey, RistrettoSecretKey};
use tari_utilities::{hex, ByteArray};

use crate::error::NodeIdError;

pub type CommsPublicKey = RistrettoPublicKey;
pub type CommsSecretKey = RistrettoSecretKey;

const NODE_ID_DOMAIN: &[u8] = b"chatsim.p2p.node_id";

/// A 32 byte identifier derived from a node's public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId([u8; NodeId::BYTE_SIZE]);

impl NodeId {
    pub const BYTE_SIZE: usize = 32;

    pub fn from_public_key(public_key: &CommsPublicKey) -> Self {
        let digest = Blake2b::<U32>::new()
            .chain_update(NODE_ID_DOMAIN)
            .chain_update(public_key.as_bytes())
            .finalize();
        let mut bytes = [0u8; Self::BYTE_SIZE];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::to_hex(&self.0[..])
    }

    pub fn short_str(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl From<[u8; NodeId::BYTE_SIZE]> for NodeId {
    fn from(bytes: [u8; NodeId::BYTE_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for NodeId {
    type Error = NodeIdError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes = <[u8; NodeId::BYTE_SIZE]>::try_from(bytes).map_err(|_| NodeIdError::InvalidLength {
            expected: NodeId::BYTE_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::from_hex(s.trim()).map_err(|e| NodeIdError::InvalidHex(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(node_id: NodeId) -> Self {
        node_id.to_hex()
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.to_hex())
    }
}

/// A known relay peer. Peers only exist inside a [`PeerRegistry`](crate::PeerRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub node_id: NodeId,
    pub addresses: Vec<SocketAddr>,
}

impl Peer {
    pub fn new(node_id: NodeId, addresses: Vec<SocketAddr>) -> Self {
        Self { node_id, addresses }
    }
}

impl Display for Peer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@", self.node_id.short_str())?;
        let addresses = self.addresses.iter().map(ToString::to_string).collect::<Vec<_>>();
        write!(f, "[{}]", addresses.join(", "))
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::OsRng;
    use tari_crypto::keys::{PublicKey, SecretKey};

    use super::*;

    #[test]
    fn node_id_is_stable_for_a_public_key() {
        let secret = CommsSecretKey::random(&mut OsRng);
        let public_key = CommsPublicKey::from_secret_key(&secret);
        assert_eq!(NodeId::from_public_key(&public_key), NodeId::from_public_key(&public_key));

        let other = CommsPublicKey::from_secret_key(&CommsSecretKey::random(&mut OsRng));
        assert_ne!(NodeId::from_public_key(&public_key), NodeId::from_public_key(&other));
    }

    #[test]
    fn node_id_hex_round_trips_through_serde() {
        let node_id = NodeId::from([7u8; 32]);
        let json = serde_json::to_string(&node_id).unwrap();
        assert_eq!(json, format!("\"{}\"", "07".repeat(32)));
        assert_eq!(serde_json::from_str::<NodeId>(&json).unwrap(), node_id);
    }

    #[test]
    fn node_id_rejects_bad_input() {
        assert!(matches!(
            "abcd".parse::<NodeId>(),
            Err(NodeIdError::InvalidLength { actual: 2, .. })
        ));
        assert!(matches!("zz".parse::<NodeId>(), Err(NodeIdError::InvalidHex(_))));
    }
}
