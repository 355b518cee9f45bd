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
    fmt::{self, Debug, Formatter},
    fs,
    io::Write,
    path::Path,
};

use chatsim_p2p::{CommsPublicKey, CommsSecretKey, NodeId};
use log::*;
use rand::{CryptoRng, RngCore};
use tari_crypto::keys::{PublicKey, SecretKey};
use tari_utilities::hex::Hex;

use crate::error::IdentityError;

const LOG_TARGET: &str = "chatsim::chat_client::identity";

#[cfg(unix)]
const REQUIRED_IDENTITY_PERMS: u32 = 0o600;

/// The key pair a session signs and addresses messages with.
#[derive(Clone)]
pub struct NodeIdentity {
    secret_key: CommsSecretKey,
    public_key: CommsPublicKey,
    node_id: NodeId,
}

impl NodeIdentity {
    /// Generates a fresh identity. Fails if `rng` cannot produce randomness.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, IdentityError> {
        // OsRng only reports failure through the fallible API, so probe it before handing it to the key generator
        let mut probe = [0u8; 32];
        rng.try_fill_bytes(&mut probe)
            .map_err(|e| IdentityError::RandomnessUnavailable(e.to_string()))?;
        Ok(Self::from_secret_key(CommsSecretKey::random(rng)))
    }

    pub fn from_secret_key(secret_key: CommsSecretKey) -> Self {
        let public_key = CommsPublicKey::from_secret_key(&secret_key);
        let node_id = NodeId::from_public_key(&public_key);
        Self {
            secret_key,
            public_key,
            node_id,
        }
    }

    pub fn public_key(&self) -> &CommsPublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &CommsSecretKey {
        &self.secret_key
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Writes the hex encoded secret key to `path`, replacing any existing file. On unix the file is only readable
    /// by the owner.
    pub fn save_secret_key<P: AsRef<Path>>(&self, path: P) -> Result<(), IdentityError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        set_permissions(&file)?;
        file.write_all(self.secret_key.to_hex().as_bytes())?;
        file.sync_all()?;
        debug!(
            target: LOG_TARGET,
            "Saved identity {} to {}",
            self.node_id.short_str(),
            path.display()
        );
        Ok(())
    }

    pub fn load_secret_key<P: AsRef<Path>>(path: P) -> Result<Self, IdentityError> {
        let contents = fs::read_to_string(path)?;
        let secret_key =
            CommsSecretKey::from_hex(contents.trim()).map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }
}

impl Debug for NodeIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeIdentity")
            .field("public_key", &self.public_key.to_hex())
            .field("node_id", &self.node_id)
            .finish()
    }
}

#[cfg(unix)]
fn set_permissions(file: &fs::File) -> Result<(), IdentityError> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(REQUIRED_IDENTITY_PERMS))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_permissions(_file: &fs::File) -> Result<(), IdentityError> {
    Ok(())
}

#[cfg(test)]
mod test {
    use rand::rngs::OsRng;

    use super::*;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "entropy source offline",
            )))
        }
    }

    impl CryptoRng for BrokenRng {}

    #[test]
    fn it_derives_the_public_key_and_node_id() {
        let identity = NodeIdentity::random(&mut OsRng).unwrap();
        assert_eq!(
            identity.public_key(),
            &CommsPublicKey::from_secret_key(identity.secret_key())
        );
        assert_eq!(identity.node_id(), &NodeId::from_public_key(identity.public_key()));
    }

    #[test]
    fn it_fails_without_randomness() {
        let err = NodeIdentity::random(&mut BrokenRng).unwrap_err();
        assert!(matches!(err, IdentityError::RandomnessUnavailable(_)));
    }

    #[test]
    fn secret_key_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("key.txt");
        let identity = NodeIdentity::random(&mut OsRng).unwrap();
        identity.save_secret_key(&path).unwrap();

        let loaded = NodeIdentity::load_secret_key(&path).unwrap();
        assert_eq!(loaded.public_key(), identity.public_key());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, REQUIRED_IDENTITY_PERMS);
        }
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let identity = NodeIdentity::random(&mut OsRng).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains(&identity.secret_key().to_hex()));
    }
}
