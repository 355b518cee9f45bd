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

use std::fmt::{self, Display, Formatter};

use chatsim_p2p::CommsPublicKey;
use tari_utilities::hex;

/// The 32 byte content hash that identifies a message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MessageHash([u8; MessageHash::BYTE_SIZE]);

impl MessageHash {
    pub const BYTE_SIZE: usize = 32;

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; MessageHash::BYTE_SIZE]> for MessageHash {
    fn from(bytes: [u8; MessageHash::BYTE_SIZE]) -> Self {
        Self(bytes)
    }
}

/// Always `0x` followed by 64 lowercase hex characters.
impl Display for MessageHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::to_hex(&self.0[..]))
    }
}

impl fmt::Debug for MessageHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MessageHash({})", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// An observed message. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageHash,
    pub sender: CommsPublicKey,
    pub chat_id: String,
    pub text: String,
    pub direction: Direction,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_display_is_fixed_width() {
        let hash = MessageHash::from([0u8; 32]);
        assert_eq!(hash.to_string(), format!("0x{}", "0".repeat(64)));

        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let hash = MessageHash::from(bytes);
        let s = hash.to_string();
        assert_eq!(s.len(), 66);
        assert!(s.starts_with("0xab"));
        assert!(s.ends_with("01"));
    }
}
