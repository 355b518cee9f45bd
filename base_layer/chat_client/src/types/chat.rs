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

use std::fmt::{Display, Error, Formatter};

use chatsim_p2p::CommsPublicKey;
use tari_utilities::hex::Hex;

/// A logical message destination.
#[derive(Debug, Clone, PartialEq)]
pub enum Chat {
    /// A named channel anyone may join
    Public { name: String },
    /// A conversation with a single counterpart, addressed by their public key
    OneToOne { name: String, counterpart: CommsPublicKey },
}

impl Chat {
    pub fn public<T: Into<String>>(name: T) -> Self {
        Chat::Public { name: name.into() }
    }

    pub fn one_to_one<T: Into<String>>(name: T, counterpart: CommsPublicKey) -> Self {
        Chat::OneToOne {
            name: name.into(),
            counterpart,
        }
    }

    /// The identifier messages are sent to: the channel name, or the `0x` prefixed counterpart key.
    pub fn id(&self) -> String {
        match self {
            Chat::Public { name } => name.clone(),
            Chat::OneToOne { counterpart, .. } => public_key_to_chat_id(counterpart),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Chat::Public { name } | Chat::OneToOne { name, .. } => name,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Chat::Public { .. })
    }
}

impl Display for Chat {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Chat::Public { name } => write!(f, "#{}", name),
            Chat::OneToOne { name, counterpart } => write!(f, "{} ({})", name, counterpart.to_hex()),
        }
    }
}

pub fn public_key_to_chat_id(public_key: &CommsPublicKey) -> String {
    format!("0x{}", public_key.to_hex())
}

#[cfg(test)]
mod test {
    use chatsim_p2p::CommsSecretKey;
    use rand::rngs::OsRng;
    use tari_crypto::keys::{PublicKey, SecretKey};

    use super::*;

    #[test]
    fn chat_ids() {
        let public = Chat::public("test200");
        assert_eq!(public.id(), "test200");
        assert!(public.is_public());

        let key = CommsPublicKey::from_secret_key(&CommsSecretKey::random(&mut OsRng));
        let direct = Chat::one_to_one("bob", key.clone());
        assert_eq!(direct.id(), format!("0x{}", key.to_hex()));
        assert_eq!(direct.name(), "bob");
        assert!(!direct.is_public());
    }
}
