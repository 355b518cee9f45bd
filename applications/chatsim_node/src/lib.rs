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

//! # Chat network participant
//!
//! Connects a single simulated participant to an in-process chat network, joins a public chat and sends messages
//! to it at a fixed cadence while a background task records everything it receives.
//!
//! Outputs, relative to `<base_path>/<src>/`:
//! - `key.txt`: the hex encoded session secret key
//! - `public-write.txt`: ids of sent messages, one per line
//! - `private-read.txt`: ids of received messages, one per line
//! - `peers.json`: the bootstrap peers of the configured fleet

pub mod cli;
pub mod config;
pub mod simulation;

use std::{
    net::{IpAddr, Ipv6Addr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use chatsim_chat_client::{
    append_log::AppendLog,
    local::{LocalMessengerFactory, LocalNetwork, LocalNetworkSession},
    SessionController,
};
use chatsim_common::exit_codes::{ExitCode, ExitError};
use chatsim_p2p::{
    peer_cache::{JsonFilePeerCache, PeerCache},
    PeerRegistry,
};
use chatsim_shutdown::ShutdownSignal;
use log::*;
use rand::{rngs::StdRng, SeedableRng};
use tokio::time::{self, Instant};

pub use crate::{cli::Cli, config::ApplicationConfig};
use crate::simulation::{idle_until_exhausted, SendBudget, SendLoop};

const LOG_TARGET: &str = "chatsim::node";

/// Runs one participant to completion. The session is always disconnected before returning.
pub async fn run_node(
    cli: Cli,
    working_dir: PathBuf,
    config: ApplicationConfig,
    shutdown_signal: ShutdownSignal,
) -> Result<(), ExitError> {
    let mut controller = build_controller(working_dir, &config, LocalNetwork::new());
    let listen_address = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), cli.port);

    if let Err(err) = controller
        .connect(&cli.src, listen_address, cli.datasync, cli.discovery)
        .await
    {
        error!(target: LOG_TARGET, "Could not connect `{}`: {}", cli.src, err);
        if let Err(disconnect_err) = controller.disconnect().await {
            warn!(target: LOG_TARGET, "Cleanup after the failed connect also failed: {}", disconnect_err);
        }
        return Err(ExitError::new(ExitCode::NetworkError, err));
    }
    info!(
        target: LOG_TARGET,
        "`{}` connected, paired with `{}`", cli.src, cli.dst
    );

    let result = run_session(&controller, &cli, &config, shutdown_signal).await;
    let disconnected = controller
        .disconnect()
        .await
        .map_err(|err| ExitError::new(ExitCode::ShutdownError, err));
    result.and(disconnected)
}

pub fn build_controller(working_dir: PathBuf, config: &ApplicationConfig, network: LocalNetwork) -> SessionController {
    let cache: Box<dyn PeerCache> = Box::new(JsonFilePeerCache::new(
        working_dir.join(&config.chat_client.peer_cache_file),
    ));
    let registry = Arc::new(PeerRegistry::new(cache));
    SessionController::new(
        working_dir,
        config.chat_client.clone(),
        Arc::new(LocalNetworkSession::new(network, registry)),
        Arc::new(LocalMessengerFactory),
    )
}

async fn run_session(
    controller: &SessionController,
    cli: &Cli,
    config: &ApplicationConfig,
    mut shutdown_signal: ShutdownSignal,
) -> Result<(), ExitError> {
    let start = Instant::now();
    let budget = SendBudget::new(cli.messages, cli.seconds, start);

    tokio::select! {
        biased;
        _ = &mut shutdown_signal => return Ok(()),
        _ = time::sleep(config.simulation.warmup) => {},
    }

    if cli.public_chat_id.is_empty() {
        info!(target: LOG_TARGET, "No public chat given, only receiving");
        idle_until_exhausted(budget, config.simulation.send_interval, shutdown_signal).await;
        return Ok(());
    }

    let network_error = |err| ExitError::new(ExitCode::NetworkError, err);
    controller.join_channel(&cli.public_chat_id).await.map_err(network_error)?;
    controller.load_filters(None).await.map_err(network_error)?;

    let sent_log = AppendLog::create(controller.working_dir().join(&config.simulation.sent_log_file))
        .await
        .map_err(|err| ExitError::new(ExitCode::IOError, err))?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let report = SendLoop::new(
        controller,
        cli.public_chat_id.clone(),
        config.simulation.send_interval,
        budget,
        rng,
        sent_log,
        shutdown_signal,
    )
    .run()
    .await
    .map_err(|err| {
        error!(target: LOG_TARGET, "Sending stopped: {}", err);
        network_error(err)
    })?;
    info!(
        target: LOG_TARGET,
        "Simulation finished after {:.1?}, {} message(s) sent",
        start.elapsed(),
        report.sent
    );
    Ok(())
}
