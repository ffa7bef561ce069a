//! One-shot completion protocol.
//!
//! # Responsibilities
//! - Record the first result handed to `complete` and ignore the rest
//! - Deliver that result, once, to a single waiter
//!
//! # Design Decisions
//! - Backed by `tokio::sync::oneshot`: the slot is buffered, so the producer
//!   never blocks even when nobody is waiting yet
//! - No timeout here; callers wrap the wait in their own deadline
//! - If every producer is dropped without completing, the waiter sees
//!   [`ContextError::Abandoned`]

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Errors surfaced while waiting for a context to complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was dropped before anyone completed it.
    #[error("Execution context dropped before completion")]
    Abandoned,

    /// The handle already delivered its value.
    #[error("Completion result already delivered")]
    AlreadyDelivered,

    /// Someone else took the wait handle.
    #[error("Completion handle already taken")]
    HandleTaken,
}

#[derive(Debug)]
struct CompletionState {
    result: Option<Value>,
    sender: Option<oneshot::Sender<Value>>,
}

/// Shared completion slot.
#[derive(Debug)]
pub(crate) struct Completion {
    state: Mutex<CompletionState>,
}

impl Completion {
    pub(crate) fn new() -> (Arc<Self>, WaitHandle) {
        let (sender, receiver) = oneshot::channel();
        let completion = Arc::new(Self {
            state: Mutex::new(CompletionState {
                result: None,
                sender: Some(sender),
            }),
        });
        (completion, WaitHandle::new(receiver))
    }

    /// Store `result` and deliver it; returns false if already completed.
    pub(crate) fn complete(&self, result: Value) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.result.is_some() {
            return false;
        }
        if let Some(sender) = state.sender.take() {
            // Receiver may be gone; the result is still recorded.
            let _ = sender.send(result.clone());
        }
        state.result = Some(result);
        true
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .result
            .is_some()
    }

    pub(crate) fn result(&self) -> Option<Value> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .result
            .clone()
    }
}

/// Detached producer side of a context's completion.
///
/// Cheap to clone and `'static`, so it can be moved into spawned work.
#[derive(Debug, Clone)]
pub struct Completer {
    completion: Arc<Completion>,
}

impl Completer {
    pub(crate) fn new(completion: Arc<Completion>) -> Self {
        Self { completion }
    }

    /// Complete the owning context. Returns false if it was already completed.
    pub fn complete(&self, result: Value) -> bool {
        self.completion.complete(result)
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }
}

/// Consumer side of a context's completion.
///
/// Await it (`(&mut handle).await` keeps the handle), poll it with
/// [`WaitHandle::try_result`], or block on it outside of an async runtime
/// with [`WaitHandle::blocking_wait`]. The value is delivered exactly once.
#[derive(Debug)]
pub struct WaitHandle {
    slot: Slot,
}

#[derive(Debug)]
enum Slot {
    Waiting(oneshot::Receiver<Value>),
    Delivered,
    Abandoned,
}

impl WaitHandle {
    fn new(receiver: oneshot::Receiver<Value>) -> Self {
        Self {
            slot: Slot::Waiting(receiver),
        }
    }

    /// Non-blocking poll: `Ok(None)` while the context is still pending.
    pub fn try_result(&mut self) -> Result<Option<Value>, ContextError> {
        let receiver = self.receiver()?;
        match receiver.try_recv() {
            Ok(value) => {
                self.slot = Slot::Delivered;
                Ok(Some(value))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => {
                self.slot = Slot::Abandoned;
                Err(ContextError::Abandoned)
            }
        }
    }

    /// Block the current thread until the result arrives.
    ///
    /// Panics if called from within an async runtime, like
    /// `oneshot::Receiver::blocking_recv`.
    pub fn blocking_wait(&mut self) -> Result<Value, ContextError> {
        self.receiver()?;
        let Slot::Waiting(receiver) = std::mem::replace(&mut self.slot, Slot::Delivered) else {
            return Err(ContextError::AlreadyDelivered);
        };
        receiver.blocking_recv().map_err(|_| {
            self.slot = Slot::Abandoned;
            ContextError::Abandoned
        })
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.slot, Slot::Delivered)
    }

    fn receiver(&mut self) -> Result<&mut oneshot::Receiver<Value>, ContextError> {
        match &mut self.slot {
            Slot::Waiting(receiver) => Ok(receiver),
            Slot::Delivered => Err(ContextError::AlreadyDelivered),
            Slot::Abandoned => Err(ContextError::Abandoned),
        }
    }
}

impl Future for WaitHandle {
    type Output = Result<Value, ContextError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let receiver = match self.receiver() {
            Ok(receiver) => receiver,
            Err(e) => return Poll::Ready(Err(e)),
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(value)) => {
                self.slot = Slot::Delivered;
                Poll::Ready(Ok(value))
            }
            Poll::Ready(Err(_)) => {
                self.slot = Slot::Abandoned;
                Poll::Ready(Err(ContextError::Abandoned))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
