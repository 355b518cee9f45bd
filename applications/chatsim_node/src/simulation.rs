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

use std::time::Duration;

use chatsim_chat_client::{append_log::AppendLog, ClientError, SessionController};
use chatsim_shutdown::ShutdownSignal;
use log::*;
use rand::{rngs::StdRng, RngCore};
use tokio::time::{self, Instant};

const LOG_TARGET: &str = "chatsim::node::simulation";

/// Limits on how much a send loop may send. Either limit may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendBudget {
    max_messages: Option<u64>,
    deadline: Option<Instant>,
}

impl SendBudget {
    /// `0` means unlimited for both arguments.
    pub fn new(messages: u64, seconds: u64, start: Instant) -> Self {
        Self {
            max_messages: (messages > 0).then(|| messages),
            deadline: (seconds > 0).then(|| start + Duration::from_secs(seconds)),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            max_messages: None,
            deadline: None,
        }
    }

    pub fn is_exhausted(&self, sent: u64, now: Instant) -> bool {
        self.max_messages.map(|max| sent >= max).unwrap_or(false) ||
            self.deadline.map(|deadline| now >= deadline).unwrap_or(false)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    pub sent: u64,
    pub interrupted: bool,
}

/// How a receive-only run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleReport {
    pub intervals: u64,
    pub interrupted: bool,
}

/// Paces a participant that has no chat to send to. Every elapsed `interval` counts against the message budget the
/// way a send would, so a run ends on whichever budget runs out first.
pub async fn idle_until_exhausted(
    budget: SendBudget,
    interval: Duration,
    mut shutdown_signal: ShutdownSignal,
) -> IdleReport {
    let mut report = IdleReport::default();
    while !budget.is_exhausted(report.intervals, Instant::now()) {
        let mut wake_at = Instant::now() + interval;
        if let Some(deadline) = budget.deadline() {
            wake_at = wake_at.min(deadline);
        }
        tokio::select! {
            biased;
            _ = &mut shutdown_signal => {
                report.interrupted = true;
                break;
            },
            _ = time::sleep_until(wake_at) => report.intervals += 1,
        }
    }
    debug!(
        target: LOG_TARGET,
        "Receive-only run ended after {} interval(s){}",
        report.intervals,
        if report.interrupted { ", interrupted" } else { "" }
    );
    report
}

/// The text of the `n`th message. The suffix keeps texts unique across runs.
pub fn message_text<R: RngCore>(n: u64, rng: &mut R) -> String {
    format!("This is one line text message: {} ({:08x})", n, rng.next_u32())
}

/// Sends to one chat at a fixed cadence until the budget runs out, a send fails or shutdown is signalled.
pub struct SendLoop<'a> {
    controller: &'a SessionController,
    chat_id: String,
    interval: Duration,
    budget: SendBudget,
    rng: StdRng,
    sent_log: AppendLog,
    shutdown_signal: ShutdownSignal,
}

impl<'a> SendLoop<'a> {
    pub fn new(
        controller: &'a SessionController,
        chat_id: String,
        interval: Duration,
        budget: SendBudget,
        rng: StdRng,
        sent_log: AppendLog,
        shutdown_signal: ShutdownSignal,
    ) -> Self {
        Self {
            controller,
            chat_id,
            interval,
            budget,
            rng,
            sent_log,
            shutdown_signal,
        }
    }

    /// Returns the first send error, after everything sent before it has been logged.
    pub async fn run(mut self) -> Result<SendReport, ClientError> {
        let mut report = SendReport::default();
        info!(
            target: LOG_TARGET,
            "Sending to `{}` every {:.0?} ({:?})", self.chat_id, self.interval, self.budget
        );

        while !self.budget.is_exhausted(report.sent, Instant::now()) {
            let text = message_text(report.sent, &mut self.rng);
            let id = self.controller.send(&self.chat_id, text.as_bytes()).await?;
            report.sent += 1;
            debug!(target: LOG_TARGET, "Sent message {} as {}", report.sent, id);

            if let Err(err) = self.log_sent(&id).await {
                warn!(target: LOG_TARGET, "Could not log sent message {}: {}", id, err);
            }

            tokio::select! {
                biased;
                _ = &mut self.shutdown_signal => {
                    info!(target: LOG_TARGET, "Sending interrupted by shutdown");
                    report.interrupted = true;
                    break;
                },
                _ = time::sleep(self.interval) => {},
            }
        }

        info!(target: LOG_TARGET, "Sent {} message(s) to `{}`", report.sent, self.chat_id);
        Ok(report)
    }

    async fn log_sent(&mut self, id: &str) -> std::io::Result<()> {
        self.sent_log.append_line(id).await?;
        self.sent_log.flush().await
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn zero_means_unlimited() {
        let start = Instant::now();
        let budget = SendBudget::new(0, 0, start);
        assert_eq!(budget, SendBudget::unlimited());
        assert!(!budget.is_exhausted(u64::MAX, start + Duration::from_secs(3600)));
    }

    #[test]
    fn message_budget() {
        let start = Instant::now();
        let budget = SendBudget::new(3, 0, start);
        assert!(!budget.is_exhausted(2, start));
        assert!(budget.is_exhausted(3, start));
    }

    #[test]
    fn time_budget() {
        let start = Instant::now();
        let budget = SendBudget::new(0, 2, start);
        assert!(!budget.is_exhausted(100, start + Duration::from_millis(1999)));
        assert!(budget.is_exhausted(0, start + Duration::from_secs(2)));
    }

    #[test]
    fn either_budget_ends_sending() {
        let start = Instant::now();
        let budget = SendBudget::new(5, 1, start);
        assert!(budget.is_exhausted(5, start));
        assert!(budget.is_exhausted(1, start + Duration::from_secs(1)));
        assert!(!budget.is_exhausted(1, start));
    }

    #[tokio::test(start_paused = true)]
    async fn idling_counts_intervals_against_the_message_budget() {
        let shutdown = chatsim_shutdown::Shutdown::new();
        let start = Instant::now();

        let report = idle_until_exhausted(
            SendBudget::new(2, 0, start),
            Duration::from_millis(300),
            shutdown.to_signal(),
        )
        .await;

        assert_eq!(report, IdleReport {
            intervals: 2,
            interrupted: false
        });
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn idling_stops_at_the_deadline() {
        let shutdown = chatsim_shutdown::Shutdown::new();
        let start = Instant::now();

        let report = idle_until_exhausted(
            SendBudget::new(100, 1, start),
            Duration::from_millis(300),
            shutdown.to_signal(),
        )
        .await;

        assert_eq!(report.intervals, 4);
        assert!(!report.interrupted);
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_an_unlimited_idle_run() {
        let mut shutdown = chatsim_shutdown::Shutdown::new();
        let signal = shutdown.to_signal();

        let (report, _) = tokio::join!(
            idle_until_exhausted(SendBudget::unlimited(), Duration::from_millis(300), signal),
            async {
                time::sleep(Duration::from_millis(1000)).await;
                shutdown.trigger();
            }
        );

        assert!(report.interrupted);
        assert_eq!(report.intervals, 3);
    }

    #[test]
    fn seeded_texts_are_reproducible() {
        let a = message_text(7, &mut StdRng::seed_from_u64(42));
        let b = message_text(7, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert!(a.starts_with("This is one line text message: 7 ("));
        assert_eq!(a.len(), "This is one line text message: 7 (".len() + 9);
    }
}
