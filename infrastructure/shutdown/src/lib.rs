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

//! A one-shot, idempotent cancellation signal.
//!
//! [`Shutdown`] is held by whoever owns the lifetime of a background task and [`ShutdownSignal`]s are handed to the
//! tasks themselves. Every signal resolves once the trigger fires or once every `Shutdown` clone has been dropped.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

use futures::{
    channel::oneshot,
    future::{FusedFuture, Shared},
    FutureExt,
};

/// The triggering half. Cloning shares the same underlying trigger.
///
/// _Note_: the signal also resolves when the last `Shutdown` is dropped, so keep it alive for as long as the tasks
/// listening on it are expected to run.
#[derive(Clone, Debug)]
pub struct Shutdown {
    sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    receiver: Shared<oneshot::Receiver<()>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver: receiver.shared(),
        }
    }

    /// Fire the signal. Calling this more than once has no further effect.
    pub fn trigger(&mut self) {
        if let Some(sender) = self.take_sender() {
            let _result = sender.send(());
        }
    }

    pub fn is_triggered(&self) -> bool {
        match self.sender.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    pub fn to_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            inner: self.receiver.clone(),
        }
    }

    fn take_sender(&self) -> Option<oneshot::Sender<()>> {
        match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// The listening half. Resolves to `()` whether the trigger fired or was dropped.
#[derive(Clone, Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct ShutdownSignal {
    inner: Shared<oneshot::Receiver<()>>,
}

impl ShutdownSignal {
    /// Non-blocking check, usable at loop boundaries.
    pub fn is_triggered(&self) -> bool {
        self.inner.is_terminated() || self.inner.peek().is_some()
    }
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.inner.is_terminated() {
            return Poll::Ready(());
        }
        // Ok(()) is an explicit trigger, Err(Canceled) means every trigger was dropped
        Pin::new(&mut self.inner).poll(cx).map(|_| ())
    }
}

impl FusedFuture for ShutdownSignal {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use tokio::{task, time};

    use super::*;

    #[tokio::test]
    async fn trigger_resolves_every_signal() {
        let mut shutdown = Shutdown::new();
        let first = shutdown.to_signal();
        let second = first.clone();
        let fut = task::spawn(async move {
            first.await;
            second.await;
        });
        assert!(!shutdown.is_triggered());
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        fut.await.unwrap();
    }

    #[tokio::test]
    async fn trigger_is_idempotent() {
        let mut shutdown = Shutdown::new();
        let signal = shutdown.to_signal();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        signal.await;
    }

    #[tokio::test]
    async fn signal_reports_trigger_without_polling() {
        let mut shutdown = Shutdown::new();
        let signal = shutdown.to_signal();
        assert!(!signal.is_triggered());
        shutdown.trigger();
        // peek only observes the value once the shared future has been driven
        let mut polled = signal.clone();
        time::timeout(Duration::from_secs(1), &mut polled).await.unwrap();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn dropping_every_trigger_resolves_signal() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        let signal = shutdown.to_signal();
        drop(shutdown);
        drop(clone);
        time::timeout(Duration::from_secs(1), signal).await.unwrap();
    }
}
