//! Async utilities for cancellation-aware futures.
//!
//! Provides the `OrCancelExt` trait for racing a future against a
//! `CancellationToken`, and a `Debouncer` that hands out one live token at a
//! time so that restarting a quiet period cancels the work queued behind the
//! previous one.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Error returned when a future is cancelled.
#[derive(Debug, PartialEq, Eq)]
pub enum CancelErr {
    Cancelled,
}

/// Extension trait for making futures cancellable.
///
/// Allows any future to race against a `CancellationToken`, returning
/// `Err(CancelErr::Cancelled)` if the token is cancelled before the
/// future completes.
#[async_trait]
pub trait OrCancelExt: Sized {
    type Output;

    /// Race this future against the cancellation token.
    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, CancelErr>;
}

#[async_trait]
impl<F> OrCancelExt for F
where
    F: Future + Send,
    F::Output: Send,
{
    type Output = F::Output;

    async fn or_cancel(self, token: &CancellationToken) -> Result<Self::Output, CancelErr> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(CancelErr::Cancelled),
            res = self => Ok(res),
        }
    }
}

/// Trailing-edge debounce built on cancellation tokens.
///
/// Every call to [`Debouncer::restart`] cancels the token handed out by the
/// previous call. Work that waits on [`Debouncer::settle`] therefore only
/// proceeds if no newer restart happened during the quiet period, and work
/// that is already running can keep racing the same token to find out it has
/// been superseded.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    current: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: Mutex::new(None),
        }
    }

    /// Cancel the pending window (if any) and open a new one.
    pub fn restart(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    /// Cancel the pending window without opening a new one.
    pub fn cancel(&self) {
        let mut slot = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.cancel();
        }
    }

    /// Wait out the quiet period for `token`.
    ///
    /// Resolves to `Err(CancelErr::Cancelled)` as soon as the window is
    /// superseded or cancelled.
    pub async fn settle(&self, token: &CancellationToken) -> Result<(), CancelErr> {
        tokio::time::sleep(self.delay).or_cancel(token).await
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
