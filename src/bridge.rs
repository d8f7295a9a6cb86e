//! Adapters between the suspendable call shape and the legacy
//! begin/end shape.
//!
//! [`to_begin`] turns a future into an in-flight [`Operation`] token
//! whose completion callback fires exactly once, and
//! [`Operation::wait`] is the matching end half that blocks for the
//! settled outcome. The future is driven on a dedicated thread rather
//! than the caller's executor, so a caller that blocks on the token
//! from inside its own scheduling context cannot deadlock against the
//! bridged continuation.

use std::any::Any;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use futures::FutureExt;
use tracing::trace;

use crate::cancel::CancelReason;
use crate::error::{TlsError, TlsResult};

/// Terminal state of a bridged operation. Exactly one of these is
/// recorded per token, whichever the future settles to first.
#[derive(Debug)]
pub enum Outcome<T> {
    Completed(T),
    Faulted(TlsError),
    Cancelled(CancelReason),
}

struct Slot<T> {
    outcome: Option<Outcome<T>>,
    settled: bool,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    done: Condvar,
}

/// In-flight token for a bridged operation. Clones share the same
/// settled outcome; the outcome itself can be taken only once.
pub struct Operation<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Operation<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Bridges a suspendable operation to the begin/end shape.
///
/// Returns immediately with the in-flight token. When the future
/// settles, the outcome is recorded and `callback` is invoked exactly
/// once with a token sharing the same outcome, whether the future
/// completed, faulted or was cancelled.
pub fn to_begin<T, F, C>(future: F, callback: C) -> Operation<T>
where
    T: Send + 'static,
    F: Future<Output = TlsResult<T>> + Send + 'static,
    C: FnOnce(Operation<T>) + Send + 'static,
{
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot {
            outcome: None,
            settled: false,
        }),
        done: Condvar::new(),
    });
    let token = Operation {
        shared: Arc::clone(&shared),
    };
    let callback_token = token.clone();

    // Neutral executor: the continuation never runs on a context the
    // caller might be blocking from.
    thread::spawn(move || {
        // A panicking future must still settle the token, otherwise
        // the end half would wait forever for an outcome that never
        // arrives. Caught panics surface to the waiter as a fault.
        let result = futures::executor::block_on(AssertUnwindSafe(future).catch_unwind());
        let outcome = match result {
            Ok(Ok(value)) => Outcome::Completed(value),
            Ok(Err(TlsError::Cancelled(reason))) => Outcome::Cancelled(reason),
            Ok(Err(err)) => Outcome::Faulted(err),
            Err(panic) => Outcome::Faulted(TlsError::Io(io::Error::new(
                io::ErrorKind::Other,
                panic_message(panic),
            ))),
        };
        trace!(settled = ?settled_kind(&outcome), "bridged operation settled");
        {
            let mut slot = shared.slot.lock().unwrap();
            slot.outcome = Some(outcome);
            slot.settled = true;
        }
        shared.done.notify_all();
        callback(callback_token);
    });

    token
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("bridged operation panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("bridged operation panicked: {message}")
    } else {
        String::from("bridged operation panicked")
    }
}

fn settled_kind<T>(outcome: &Outcome<T>) -> &'static str {
    match outcome {
        Outcome::Completed(_) => "completed",
        Outcome::Faulted(_) => "faulted",
        Outcome::Cancelled(_) => "cancelled",
    }
}

impl<T> Operation<T> {
    /// Whether the underlying operation has settled.
    pub fn is_settled(&self) -> bool {
        self.shared.slot.lock().unwrap().settled
    }

    /// The end half: blocks the calling thread until the operation
    /// settles, then returns its value, re-raises its fault, or
    /// reports cancellation carrying the original cause. Safe to call
    /// from any thread. A second wait on the same token fails with
    /// [`TlsError::OutcomeTaken`] instead of observing a second
    /// outcome.
    pub fn wait(&self) -> TlsResult<T> {
        let mut slot = self.shared.slot.lock().unwrap();
        while !slot.settled {
            slot = self.shared.done.wait(slot).unwrap();
        }
        match slot.outcome.take() {
            Some(Outcome::Completed(value)) => Ok(value),
            Some(Outcome::Faulted(err)) => Err(err),
            Some(Outcome::Cancelled(reason)) => Err(TlsError::Cancelled(reason)),
            None => Err(TlsError::OutcomeTaken),
        }
    }
}

/// Blocks the calling thread on a suspendable operation. The blocking
/// call shapes elsewhere in the crate are this single adapter applied
/// to the one async implementation of each operation.
pub fn wait<F: Future>(future: F) -> F::Output {
    futures::executor::block_on(future)
}
