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

//! # chatsim node
//!
//! Runs a single simulated chat participant.
//!
//! ```text
//! chatsim_node --src application-1 --messages 100
//! chatsim_node --src application-2 --public-chat-id test200 --seconds 60 -p simulation.send_interval=500
//! ```
//!
//! Press Ctrl-C to stop early; the session is always shut down cleanly.

use std::process;

use chatsim_common::{
    dir_utils,
    exit_codes::{ExitCode, ExitError},
    initialize_logging,
    load_configuration,
};
use chatsim_node::{run_node, ApplicationConfig, Cli};
use chatsim_shutdown::Shutdown;
use clap::Parser;
use log::*;

const LOG_TARGET: &str = "chatsim::node::app";

/// Application entry point
fn main() {
    if let Err(err) = main_inner() {
        eprintln!("{:?}", err);
        let exit_code = err.exit_code;
        if let Some(hint) = exit_code.hint() {
            eprintln!();
            eprintln!("{}", hint);
            eprintln!();
        }
        error!(
            target: LOG_TARGET,
            "Exiting with code ({}): {:?}", exit_code as i32, err
        );
        process::exit(exit_code as i32);
    }
}

fn main_inner() -> Result<(), ExitError> {
    let cli = Cli::parse();
    let working_dir = dir_utils::create_session_directory(cli.common.get_base_path(), &cli.src)
        .map_err(|e| ExitError::new(ExitCode::InputError, e))?;
    initialize_logging(
        &cli.common.log_config_path(),
        &working_dir,
        include_str!("../log4rs_sample.yml"),
    )?;
    info!(
        target: LOG_TARGET,
        "Starting chatsim node `{}` version {}",
        cli.src,
        env!("CARGO_PKG_VERSION")
    );

    let cfg = load_configuration(cli.common.config_path(), &cli.common.config_property_overrides)?;
    let config = ApplicationConfig::load_from(&cfg)?;
    debug!(target: LOG_TARGET, "Using configuration: {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ExitError::new(ExitCode::UnknownError, e))?;

    // The shutdown trigger for the system
    let shutdown = Shutdown::new();
    let signal = shutdown.to_signal();
    runtime.block_on(async move {
        let mut trigger = shutdown;
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!(target: LOG_TARGET, "Ctrl-C received, shutting down");
                    trigger.trigger();
                },
                Err(err) => {
                    warn!(target: LOG_TARGET, "Ctrl-C will not be handled: {}", err);
                    // Dropping the trigger would fire the signal
                    std::future::pending::<()>().await;
                },
            }
        });
        run_node(cli, working_dir, config, signal).await
    })
}
