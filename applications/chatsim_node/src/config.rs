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

use std::{path::PathBuf, time::Duration};

use chatsim_chat_client::ChatClientConfig;
use chatsim_common::{serializers, ConfigurationError, DefaultConfigLoader, SubConfigPath};
use config::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default)]
pub struct ApplicationConfig {
    pub chat_client: ChatClientConfig,
    pub simulation: SimulationConfig,
}

impl ApplicationConfig {
    pub fn load_from(cfg: &Config) -> Result<Self, ConfigurationError> {
        Ok(Self {
            chat_client: ChatClientConfig::load_from(cfg)?,
            simulation: SimulationConfig::load_from(cfg)?,
        })
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct SimulationConfig {
    /// Time between connecting and joining the public chat
    #[serde(with = "serializers::seconds")]
    pub warmup: Duration,
    /// Pause between two sends
    #[serde(with = "serializers::milliseconds")]
    pub send_interval: Duration,
    /// One sent message id per line, relative to the working directory
    pub sent_log_file: PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            send_interval: Duration::from_millis(300),
            sent_log_file: PathBuf::from("public-write.txt"),
        }
    }
}

impl SubConfigPath for SimulationConfig {
    fn main_key_prefix() -> &'static str {
        "simulation"
    }
}

#[cfg(test)]
mod test {
    use chatsim_common::load_configuration;

    use super::*;

    #[test]
    fn overrides_reach_both_sections() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_configuration(dir.path().join("config.toml"), &[
            ("simulation.send_interval".to_string(), "50".to_string()),
            ("chat_client.app_tag".to_string(), "bench".to_string()),
        ])
        .unwrap();
        let config = ApplicationConfig::load_from(&cfg).unwrap();
        assert_eq!(config.simulation.send_interval, Duration::from_millis(50));
        assert_eq!(config.simulation.warmup, Duration::from_secs(2));
        assert_eq!(config.chat_client.app_tag, "bench");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[simulation]\nsend_intervall = 50\n").unwrap();
        let cfg = load_configuration(&path, &[]).unwrap();
        assert!(ApplicationConfig::load_from(&cfg).is_err());
    }
}
