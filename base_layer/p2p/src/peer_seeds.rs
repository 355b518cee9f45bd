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
    fmt::{Display, Formatter},
    net::SocketAddr,
    str::FromStr,
};

use anyhow::anyhow;
use log::*;
use serde::{Deserialize, Serialize};

use crate::peer::{NodeId, Peer};

const LOG_TARGET: &str = "chatsim::p2p::peer_seeds";

/// A bootstrap peer in the form `<node_id_hex>::<socket_addr>[::<socket_addr>...]`. IPv6 addresses are not
/// supported since `::` is the separator.
///
/// ```text
/// 9c2f4f1cf2bdf0b8a6d8bba0fbbd5e3b38b3d85e1d8a7ff6d0c0b5fbd0c9e4a1::203.0.113.10:30305
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeedPeer {
    pub node_id: NodeId,
    pub addresses: Vec<SocketAddr>,
}

impl SeedPeer {
    pub fn new(node_id: NodeId, addresses: Vec<SocketAddr>) -> Self {
        Self { node_id, addresses }
    }
}

impl FromStr for SeedPeer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split("::").map(|s| s.trim());
        let node_id = parts
            .next()
            .and_then(|s| NodeId::from_str(s).ok())
            .ok_or_else(|| anyhow!("Invalid node id in seed peer string"))?;
        let addresses = parts.map(SocketAddr::from_str).collect::<Result<Vec<_>, _>>()?;
        if addresses.is_empty() {
            return Err(anyhow!("Seed peer string has no addresses"));
        }
        Ok(SeedPeer { node_id, addresses })
    }
}

impl TryFrom<String> for SeedPeer {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl Display for SeedPeer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}::{}",
            self.node_id,
            self.addresses
                .iter()
                .map(|addr| addr.to_string())
                .collect::<Vec<_>>()
                .join("::")
        )
    }
}

impl From<SeedPeer> for String {
    fn from(s: SeedPeer) -> Self {
        s.to_string()
    }
}

impl From<SeedPeer> for Peer {
    fn from(seed: SeedPeer) -> Self {
        Peer::new(seed.node_id, seed.addresses)
    }
}

const STAGING_SEEDS: &[&str] = &[
    "3b1c7f0e52a6d9e84c0f2b7a91d35e6c08f4a2b9c7d1e3f5a6b8c0d2e4f60718::203.0.113.10:30305",
    "a4e2917bd05c3f68e1b7d29a40c6f83e5d17b29c4a06e8f1d3b5c7a9e0f21436::203.0.113.11:30305",
    "5f806d1c2b3a49e7d8c6b5a4f3e2d1c0b9a8f7e6d5c4b3a29180f7e6d5c4b3a2::203.0.113.12:30305",
];

const PRODUCTION_SEEDS: &[&str] = &[
    "d1e0f3c2b5a49786f1e0d3c2b5a49786f1e0d3c2b5a49786f1e0d3c2b5a49786::198.51.100.20:30305",
    "0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f9::198.51.100.21:30305::198.51.100.21:443",
];

/// A named, fixed set of bootstrap endpoints.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Fleet {
    #[default]
    Staging,
    Production,
    /// No bootstrap peers; only sessions inside the same process can reach each other
    LocalNet,
}

impl Fleet {
    fn seed_strings(self) -> &'static [&'static str] {
        match self {
            Fleet::Staging => STAGING_SEEDS,
            Fleet::Production => PRODUCTION_SEEDS,
            Fleet::LocalNet => &[],
        }
    }

    pub fn seed_peers(self) -> Vec<SeedPeer> {
        self.seed_strings()
            .iter()
            .filter_map(|s| match SeedPeer::from_str(s) {
                Ok(peer) => Some(peer),
                Err(err) => {
                    warn!(target: LOG_TARGET, "Ignoring invalid {} seed peer `{}`: {}", self, s, err);
                    None
                },
            })
            .collect()
    }

    pub fn bootstrap_peers(self) -> Vec<Peer> {
        self.seed_peers().into_iter().map(Peer::from).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_parses_and_displays_seed_peers() {
        let s = format!("{}::127.0.0.1:30305::10.0.0.7:30306", "ab".repeat(32));
        let seed = SeedPeer::from_str(&s).unwrap();
        assert_eq!(seed.node_id, NodeId::from([0xab; 32]));
        assert_eq!(seed.addresses.len(), 2);
        assert_eq!(seed.to_string(), s);
    }

    #[test]
    fn it_rejects_malformed_seed_peers() {
        assert!(SeedPeer::from_str("nothex::127.0.0.1:1").is_err());
        assert!(SeedPeer::from_str(&"ab".repeat(32)).is_err());
        assert!(SeedPeer::from_str(&format!("{}::localhost", "ab".repeat(32))).is_err());
    }

    #[test]
    fn every_fleet_seed_is_valid() {
        assert_eq!(Fleet::Staging.seed_peers().len(), STAGING_SEEDS.len());
        assert_eq!(Fleet::Production.seed_peers().len(), PRODUCTION_SEEDS.len());
        assert!(Fleet::LocalNet.bootstrap_peers().is_empty());
    }

    #[test]
    fn fleet_names_parse_case_insensitively() {
        assert_eq!("Staging".parse::<Fleet>().unwrap(), Fleet::Staging);
        assert_eq!("localnet".parse::<Fleet>().unwrap(), Fleet::LocalNet);
        assert_eq!(Fleet::Production.to_string(), "production");
        assert!("devnet".parse::<Fleet>().is_err());
    }
}
