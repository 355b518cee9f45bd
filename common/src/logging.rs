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

use std::{fs, path::Path};

use crate::exit_codes::{ExitCode, ExitError};

/// Set up application-level logging from a log4rs YAML file.
///
/// If `config_file` does not exist it is created from `default_config` first. `{{log_dir}}` in the template is
/// replaced with `base_path` so that log files land next to the session's other outputs.
pub fn initialize_logging(config_file: &Path, base_path: &Path, default_config: &str) -> Result<(), ExitError> {
    println!("Initializing logging according to {:?}", config_file);

    if !config_file.exists() {
        let source = default_config.replace("{{log_dir}}", &base_path.join("log").to_string_lossy());
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ExitError::new(
                    ExitCode::ConfigError,
                    format!("Could not create log config directory: {}", e),
                )
            })?;
        }
        fs::write(config_file, source).map_err(|e| {
            ExitError::new(
                ExitCode::ConfigError,
                format!("Could not write default log config: {}", e),
            )
        })?;
    }

    log4rs::init_file(config_file, Default::default())
        .map_err(|e| ExitError::new(ExitCode::ConfigError, format!("Could not initialize logging: {}", e)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_installs_the_default_config_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config").join("log4rs.yml");
        let template = "refresh_rate: 30 seconds\nappenders:\n  stdout:\n    kind: console\nroot:\n  level: \
                        warn\n  appenders:\n    - stdout\n# {{log_dir}}\n";
        // log4rs can only be initialised once per process, so a second call is allowed to fail
        let _result = initialize_logging(&config_file, dir.path(), template);
        let written = fs::read_to_string(&config_file).unwrap();
        assert!(written.contains(&dir.path().join("log").to_string_lossy().to_string()));
        assert!(!written.contains("{{log_dir}}"));
    }
}
