use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::error::{TlsError, TlsResult};

/// The cause attached to a cancellation when it was requested.
/// Cheap to clone so it can travel with every error it produces.
#[derive(Debug, Clone)]
pub struct CancelReason(Arc<str>);

impl CancelReason {
    pub fn new(reason: impl AsRef<str>) -> Self {
        Self(Arc::from(reason.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cancellation signal accepted by the suspendable call shapes.
///
/// Operations poll the token at their suspension points via [`checkpoint`]
/// and settle as cancelled when it has fired. Cancellation raised after a
/// transport write has been issued does not roll that write back; record
/// transmission is not undoable. Timeouts are caller policy, implemented
/// by racing [`cancelled`] against a timer.
///
/// [`checkpoint`]: CancelToken::checkpoint
/// [`cancelled`]: CancelToken::cancelled
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    reason: Option<CancelReason>,
    wakers: Vec<Waker>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal. The first cancellation wins; later calls keep
    /// the original cause.
    pub fn cancel(&self, reason: impl AsRef<str>) {
        let wakers = {
            let mut state = self.inner.lock().unwrap();
            if state.reason.is_some() {
                return;
            }
            state.reason = Some(CancelReason::new(reason));
            std::mem::take(&mut state.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().unwrap().reason.is_some()
    }

    /// The cause the token was cancelled with, if it has fired.
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.lock().unwrap().reason.clone()
    }

    /// Fails with [`TlsError::Cancelled`] once the token has fired.
    /// Called at every suspension point of the async operations.
    pub fn checkpoint(&self) -> TlsResult<()> {
        match self.reason() {
            Some(reason) => Err(TlsError::Cancelled(reason)),
            None => Ok(()),
        }
    }

    /// Resolves with the cancellation cause once the token fires.
    /// Never resolves on a token that is never cancelled.
    pub fn cancelled(&self) -> Cancelled {
        Cancelled { token: self.clone() }
    }
}

pub struct Cancelled {
    token: CancelToken,
}

impl Future for Cancelled {
    type Output = CancelReason;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.token.inner.lock().unwrap();
        if let Some(reason) = state.reason.clone() {
            return Poll::Ready(reason);
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
