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

use chatsim_p2p::CommsPublicKey;

use crate::types::Message;

/// True for messages the caller should ignore: those it sent itself and those with no text.
pub fn skip_message(own_public_key: &CommsPublicKey, message: &Message) -> bool {
    message.sender == *own_public_key || message.text.is_empty()
}

#[cfg(test)]
mod test {
    use chatsim_p2p::CommsSecretKey;
    use rand::rngs::OsRng;
    use tari_crypto::keys::{PublicKey, SecretKey};

    use super::*;
    use crate::types::{Direction, MessageHash};

    fn random_key() -> CommsPublicKey {
        CommsPublicKey::from_secret_key(&CommsSecretKey::random(&mut OsRng))
    }

    fn message(sender: &CommsPublicKey, text: &str) -> Message {
        Message {
            id: MessageHash::default(),
            sender: sender.clone(),
            chat_id: "test200".to_string(),
            text: text.to_string(),
            direction: Direction::Received,
        }
    }

    #[test]
    fn truth_table() {
        let own = random_key();
        let other = random_key();

        assert!(skip_message(&own, &message(&own, "hello")));
        assert!(skip_message(&own, &message(&other, "")));
        assert!(skip_message(&own, &message(&own, "")));
        assert!(!skip_message(&own, &message(&other, "hello")));
    }
}
