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

//! Layered loading of the application configuration.
//!
//! Every component owns a section of the config file, named by [`SubConfigPath::main_key_prefix`]. Sections are
//! deserialised with [`DefaultConfigLoader::load_from`]; absent sections and absent keys fall back to the
//! component's `Default`.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use log::*;
use serde::de::DeserializeOwned;

use super::error::ConfigurationError;

const LOG_TARGET: &str = "chatsim::common::configuration";

pub trait SubConfigPath {
    /// The top level table this struct is read from, e.g. `chat_client` for `[chat_client]`.
    fn main_key_prefix() -> &'static str;
}

pub trait DefaultConfigLoader: Sized {
    fn load_from(config: &Config) -> Result<Self, ConfigurationError>;
}

/// Structs must use `#[serde(default)]` so that a partially populated section is completed from `Default`.
impl<T> DefaultConfigLoader for T
where T: SubConfigPath + Default + DeserializeOwned
{
    fn load_from(config: &Config) -> Result<Self, ConfigurationError> {
        match config.get::<T>(T::main_key_prefix()) {
            Ok(value) => Ok(value),
            Err(config::ConfigError::NotFound(_)) => {
                debug!(
                    target: LOG_TARGET,
                    "No `{}` section found, using defaults",
                    T::main_key_prefix()
                );
                Ok(T::default())
            },
            Err(err) => Err(err.into()),
        }
    }
}

/// Builds the layered [`Config`]. A missing file is not an error; the defaults are used instead.
pub fn load_configuration<P: AsRef<Path>>(
    config_path: P,
    overrides: &[(String, String)],
) -> Result<Config, ConfigurationError> {
    let config_path = config_path.as_ref();
    if config_path.exists() {
        info!(target: LOG_TARGET, "Loading configuration from {}", config_path.display());
    } else {
        debug!(
            target: LOG_TARGET,
            "Configuration file {} not found, continuing with defaults",
            config_path.display()
        );
    }

    let mut builder = Config::builder()
        .add_source(File::from(config_path).format(FileFormat::Toml).required(false))
        .add_source(
            Environment::with_prefix("CHATSIM")
                .prefix_separator("_")
                .separator("__"),
        );
    for (key, value) in overrides {
        builder = builder.set_override(key.as_str(), value.as_str())?;
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod test {
    use std::{fs, time::Duration};

    use serde::Deserialize;

    use super::*;
    use crate::serializers;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct PollerConfig {
        #[serde(with = "serializers::milliseconds")]
        interval: Duration,
        label: String,
    }

    impl Default for PollerConfig {
        fn default() -> Self {
            Self {
                interval: Duration::from_millis(100),
                label: "poller".to_string(),
            }
        }
    }

    impl SubConfigPath for PollerConfig {
        fn main_key_prefix() -> &'static str {
            "poller"
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_configuration(dir.path().join("nope.toml"), &[]).unwrap();
        assert_eq!(PollerConfig::load_from(&cfg).unwrap(), PollerConfig::default());
    }

    #[test]
    fn file_values_and_overrides_are_layered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[poller]\ninterval = 250\n").unwrap();

        let cfg = load_configuration(&path, &[]).unwrap();
        let poller = PollerConfig::load_from(&cfg).unwrap();
        assert_eq!(poller.interval, Duration::from_millis(250));
        assert_eq!(poller.label, "poller");

        let cfg = load_configuration(&path, &[("poller.label".to_string(), "fast".to_string())]).unwrap();
        let poller = PollerConfig::load_from(&cfg).unwrap();
        assert_eq!(poller.interval, Duration::from_millis(250));
        assert_eq!(poller.label, "fast");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct EnvPollerConfig {
        #[serde(with = "serializers::milliseconds")]
        interval: Duration,
    }

    impl Default for EnvPollerConfig {
        fn default() -> Self {
            Self {
                interval: Duration::from_millis(100),
            }
        }
    }

    impl SubConfigPath for EnvPollerConfig {
        fn main_key_prefix() -> &'static str {
            "env_poller"
        }
    }

    #[test]
    fn environment_overrides_use_a_single_underscore_after_the_prefix() {
        // Section unique to this test so parallel tests do not see the variable
        std::env::set_var("CHATSIM_ENV_POLLER__INTERVAL", "250");
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_configuration(dir.path().join("config.toml"), &[]).unwrap();
        std::env::remove_var("CHATSIM_ENV_POLLER__INTERVAL");

        let poller = EnvPollerConfig::load_from(&cfg).unwrap();
        assert_eq!(poller.interval, Duration::from_millis(250));
    }
}
