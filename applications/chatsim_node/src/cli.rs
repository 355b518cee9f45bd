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

use std::{error::Error, path::PathBuf};

use chatsim_common::dir_utils;
use clap::{Args, Parser};

const DEFAULT_CONFIG: &str = "config/config.toml";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonCliArgs,
    /// Name of this participant; also the name of its working directory
    #[clap(long, default_value = "application-1", env = "CHATSIM_SRC")]
    pub src: String,
    /// Name of the peer this participant is paired with
    #[clap(long, default_value = "application-2", env = "CHATSIM_DST")]
    pub dst: String,
    /// Number of messages to send, 0 for no limit
    #[clap(long, default_value_t = 0)]
    pub messages: u64,
    /// Number of seconds to keep sending for, 0 for no limit
    #[clap(long, default_value_t = 0)]
    pub seconds: u64,
    /// The public chat to send to. Sending is disabled when empty.
    #[clap(long, default_value = "test200")]
    pub public_chat_id: String,
    /// Port to listen on
    #[clap(long, default_value_t = 30303, env = "CHATSIM_PORT")]
    pub port: u16,
    /// Enable datasync in the messaging layer
    #[clap(long)]
    pub datasync: bool,
    /// Listen on the contact discovery topic
    #[clap(long)]
    pub discovery: bool,
    /// Seed for the message text generator, for reproducible runs
    #[clap(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CommonCliArgs {
    /// A path to a directory to store your files
    #[clap(
        short,
        long,
        aliases = &["base_path", "base_dir", "base-dir"],
        default_value_t = defaults::base_path(),
        env = "CHATSIM_BASE_DIR"
    )]
    pub base_path: String,
    /// A path to the configuration file to use (config.toml)
    #[clap(short, long, default_value = DEFAULT_CONFIG)]
    pub config: String,
    /// The path to the log configuration file
    #[clap(short, long, alias = "log_config")]
    pub log_config: Option<PathBuf>,
    /// Overrides for properties in the config file, e.g. -p chat_client.poll_interval=250
    #[clap(short = 'p', parse(try_from_str = parse_key_val), multiple_occurrences(true))]
    pub config_property_overrides: Vec<(String, String)>,
}

// Taken from clap examples
/// Parse a single key-value pair
fn parse_key_val<T, U>(s: &str) -> Result<(T, U), Box<dyn Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: Error + Send + Sync + 'static,
{
    let mut parts = s.splitn(2, '=').map(|s| s.trim());
    let k = parts.next().ok_or("invalid override: string empty`")?;
    let v = parts
        .next()
        .ok_or_else(|| format!("invalid override: expected key=value: no `=` found in `{}`", s))?;
    Ok((k.parse()?, v.parse()?))
}

impl CommonCliArgs {
    pub fn get_base_path(&self) -> PathBuf {
        PathBuf::from(&self.base_path)
    }

    pub fn config_path(&self) -> PathBuf {
        let config_path = PathBuf::from(&self.config);
        if config_path.is_absolute() {
            config_path
        } else {
            self.get_base_path().join(config_path)
        }
    }

    pub fn log_config_path(&self) -> PathBuf {
        match self.log_config {
            Some(ref log_config) if log_config.is_absolute() => log_config.clone(),
            Some(ref log_config) => self.get_base_path().join(log_config),
            None => self.get_base_path().join("config").join("log4rs.yml"),
        }
    }
}

mod defaults {
    use super::dir_utils;

    pub(super) fn base_path() -> String {
        dir_utils::default_base_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["chatsim_node", "--base-path", "/tmp/runs"]);
        assert_eq!(cli.src, "application-1");
        assert_eq!(cli.dst, "application-2");
        assert_eq!(cli.messages, 0);
        assert_eq!(cli.seconds, 0);
        assert_eq!(cli.public_chat_id, "test200");
        assert_eq!(cli.port, 30303);
        assert!(!cli.datasync);
        assert!(!cli.discovery);
        assert_eq!(cli.common.config_path(), PathBuf::from("/tmp/runs/config/config.toml"));
        assert_eq!(cli.common.log_config_path(), PathBuf::from("/tmp/runs/config/log4rs.yml"));
    }

    #[test]
    fn overrides_are_collected() {
        let cli = Cli::parse_from([
            "chatsim_node",
            "-p",
            "chat_client.poll_interval=250",
            "-p",
            "simulation.send_interval = 50",
            "--public-chat-id",
            "",
            "--messages",
            "10",
        ]);
        assert_eq!(cli.common.config_property_overrides, vec![
            ("chat_client.poll_interval".to_string(), "250".to_string()),
            ("simulation.send_interval".to_string(), "50".to_string()),
        ]);
        assert!(cli.public_chat_id.is_empty());
        assert_eq!(cli.messages, 10);
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        assert!(Cli::try_parse_from(["chatsim_node", "-p", "no_equals_sign"]).is_err());
    }
}
