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
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use chatsim_common::{serializers, SubConfigPath};
use chatsim_p2p::{Fleet, Peer};
use serde::{Deserialize, Serialize};

/// Settings for the session controller, read from the `[chat_client]` section. Relative paths are resolved against
/// the controller's working directory.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ChatClientConfig {
    /// The fleet whose bootstrap peers seed the peer registry
    pub fleet: Fleet,
    pub network_id: u32,
    /// Application tag handed to the messaging layer
    pub app_tag: String,
    /// How often the polling task asks the messenger for new messages
    #[serde(with = "serializers::milliseconds")]
    pub poll_interval: Duration,
    /// Upper bound on a single send
    #[serde(with = "serializers::milliseconds")]
    pub send_timeout: Duration,
    /// Where the hex encoded secret key is written after a successful connect
    pub identity_file: PathBuf,
    /// One received message id per line
    pub received_log_file: PathBuf,
    /// JSON mirror of the peer registry
    pub peer_cache_file: PathBuf,
    /// Parent of the per-session data directories
    pub data_dir: PathBuf,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            fleet: Fleet::default(),
            network_id: 1,
            app_tag: "test-1".to_string(),
            poll_interval: Duration::from_millis(100),
            send_timeout: Duration::from_secs(1),
            identity_file: PathBuf::from("key.txt"),
            received_log_file: PathBuf::from("private-read.txt"),
            peer_cache_file: PathBuf::from("peers.json"),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl SubConfigPath for ChatClientConfig {
    fn main_key_prefix() -> &'static str {
        "chat_client"
    }
}

impl ChatClientConfig {
    pub fn set_base_path<P: AsRef<Path>>(&mut self, base_path: P) {
        let base_path = base_path.as_ref();
        for path in [
            &mut self.identity_file,
            &mut self.received_log_file,
            &mut self.peer_cache_file,
            &mut self.data_dir,
        ] {
            if !path.is_absolute() {
                *path = base_path.join(path.as_path());
            }
        }
    }
}

/// Toggles passed through to the messaging layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessengerOptions {
    pub datasync: bool,
    pub discovery_topic: bool,
}

/// The settings of a single session. Built once by `connect` and never changed afterwards.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    session_id: String,
    listen_address: SocketAddr,
    network_id: u32,
    fleet: Fleet,
    bootstrap_peers: Vec<Peer>,
    data_dir: PathBuf,
    working_dir: PathBuf,
    messenger_options: MessengerOptions,
}

impl SessionConfig {
    pub fn new<P: Into<PathBuf>>(
        session_id: &str,
        listen_address: SocketAddr,
        client_config: &ChatClientConfig,
        working_dir: P,
        messenger_options: MessengerOptions,
    ) -> Self {
        let working_dir = working_dir.into();
        let data_dir = working_dir
            .join(&client_config.data_dir)
            .join(format!("{}geth", session_id));
        Self {
            session_id: session_id.to_string(),
            listen_address,
            network_id: client_config.network_id,
            fleet: client_config.fleet,
            bootstrap_peers: client_config.fleet.bootstrap_peers(),
            data_dir,
            working_dir,
            messenger_options,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    pub fn network_id(&self) -> u32 {
        self.network_id
    }

    pub fn fleet(&self) -> Fleet {
        self.fleet
    }

    pub fn bootstrap_peers(&self) -> &[Peer] {
        &self.bootstrap_peers
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn messenger_options(&self) -> MessengerOptions {
        self.messenger_options
    }
}

#[cfg(test)]
mod test {
    use chatsim_common::{load_configuration, DefaultConfigLoader};

    use super::*;

    #[test]
    fn defaults() {
        let config = ChatClientConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.send_timeout, Duration::from_millis(1000));
        assert_eq!(config.app_tag, "test-1");
        assert_eq!(config.fleet, Fleet::Staging);
        assert_eq!(config.network_id, 1);
    }

    #[test]
    fn it_loads_a_partial_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chat_client]\npoll_interval = 250\nfleet = \"production\"\n").unwrap();
        let cfg = load_configuration(&path, &[]).unwrap();
        let config = ChatClientConfig::load_from(&cfg).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.fleet, Fleet::Production);
        assert_eq!(config.send_timeout, Duration::from_secs(1));
    }

    #[test]
    fn base_path_only_touches_relative_paths() {
        let mut config = ChatClientConfig {
            identity_file: PathBuf::from("/keys/key.txt"),
            ..Default::default()
        };
        config.set_base_path("/work");
        assert_eq!(config.identity_file, PathBuf::from("/keys/key.txt"));
        assert_eq!(config.received_log_file, PathBuf::from("/work/private-read.txt"));
        assert_eq!(config.data_dir, PathBuf::from("/work/data"));
    }

    #[test]
    fn session_data_dir_is_derived_from_the_session_id() {
        let client_config = ChatClientConfig::default();
        let config = SessionConfig::new(
            "application-1",
            "127.0.0.1:30303".parse().unwrap(),
            &client_config,
            "/work",
            MessengerOptions::default(),
        );
        assert_eq!(config.data_dir(), Path::new("/work/data/application-1geth"));
        assert_eq!(config.bootstrap_peers().len(), Fleet::Staging.bootstrap_peers().len());
        assert_eq!(config.listen_address().port(), 30303);
    }
}
