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

use chatsim_shutdown::ShutdownSignal;
use log::*;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{append_log::AppendLog, messenger::MessengerHandle};

const LOG_TARGET: &str = "chatsim::chat_client::poller";

/// Counters reported by a finished polling task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ticks: u64,
    pub failed_retrievals: u64,
    pub messages_logged: u64,
}

/// Periodically drains the messenger and writes the id of every received message to the received log.
///
/// A retrieval that is in flight when shutdown is signalled runs to completion first. Once the task has been joined
/// nothing more is written.
pub struct MessagePoller {
    messenger: MessengerHandle,
    interval: Duration,
    log_path: PathBuf,
    shutdown_signal: ShutdownSignal,
}

impl MessagePoller {
    pub fn new(
        messenger: MessengerHandle,
        interval: Duration,
        log_path: PathBuf,
        shutdown_signal: ShutdownSignal,
    ) -> Self {
        Self {
            messenger,
            interval,
            log_path,
            shutdown_signal,
        }
    }

    pub fn spawn(self) -> JoinHandle<PollStats> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) -> PollStats {
        let mut stats = PollStats::default();
        let mut log = match AppendLog::create(&self.log_path).await {
            Ok(log) => log,
            Err(err) => {
                error!(
                    target: LOG_TARGET,
                    "Could not create received log {}: {}. Not polling.",
                    self.log_path.display(),
                    err
                );
                return stats;
            },
        };

        // tokio panics on a zero period
        let period = self.interval.max(Duration::from_millis(1));
        let mut tick = time::interval_at(Instant::now() + period, period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(target: LOG_TARGET, "Polling for messages every {:.0?}", period);

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown_signal => {
                    debug!(target: LOG_TARGET, "Polling stopped because the shutdown signal was received");
                    break;
                },
                _ = tick.tick() => {
                    self.poll_once(&mut log, &mut stats).await;
                },
            }
        }

        if let Err(err) = log.flush().await {
            warn!(target: LOG_TARGET, "Final flush of the received log failed: {}", err);
        }
        debug!(
            target: LOG_TARGET,
            "Polling finished after {} tick(s), {} failed retrieval(s), {} message(s) logged",
            stats.ticks,
            stats.failed_retrievals,
            stats.messages_logged
        );
        stats
    }

    async fn poll_once(&self, log: &mut AppendLog, stats: &mut PollStats) {
        stats.ticks += 1;
        let batches = match self.messenger.retrieve_all().await {
            Ok(batches) => batches,
            Err(err) => {
                // Transient, the next tick tries again
                debug!(target: LOG_TARGET, "Message retrieval failed: {}", err);
                stats.failed_retrievals += 1;
                return;
            },
        };

        for message in batches.into_iter().flatten() {
            match log.append_line(&message.id.to_string()).await {
                Ok(()) => stats.messages_logged += 1,
                Err(err) => warn!(target: LOG_TARGET, "Could not log message {}: {}", message.id, err),
            }
        }
        if let Err(err) = log.flush().await {
            warn!(target: LOG_TARGET, "Could not flush the received log: {}", err);
        }
    }
}
