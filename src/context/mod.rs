//! Per-request execution context.
//!
//! # Data Flow
//! ```text
//! Decoded request fields
//!     → ExecutionContext::new (assign context id)
//!     → handlers read fields via typed accessors
//!     → handlers share values through the reference side-table
//!     → handlers finish synchronously, or complete later via
//!       trigger_async / completer (completion.rs)
//!     → caller awaits the WaitHandle (with its own deadline)
//! ```
//!
//! # Design Decisions
//! - Request data is read-only for the whole request
//! - Typed accessors never fail: absence or a type mismatch yields the
//!   zero value of the requested type
//! - The side-table stores opaque `Arc<dyn Any>` values; callers agree on
//!   types out of band and a mismatched downcast reads as absent
//! - The context owns everything it references; nothing outlives the request

pub mod completion;

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use self::completion::Completion;
pub use self::completion::{Completer, ContextError, WaitHandle};

type Reference = Arc<dyn Any + Send + Sync>;

/// Carrier of request data, shared references and completion state.
pub struct ExecutionContext {
    id: Uuid,
    data: Map<String, Value>,
    references: DashMap<String, Reference>,
    completion: Arc<Completion>,
    wait_handle: Mutex<Option<WaitHandle>>,
    async_pending: AtomicBool,
}

impl ExecutionContext {
    /// Create a context for one request.
    pub fn new(data: Map<String, Value>) -> Self {
        let (completion, wait_handle) = Completion::new();
        Self {
            id: Uuid::new_v4(),
            data,
            references: DashMap::new(),
            completion,
            wait_handle: Mutex::new(Some(wait_handle)),
            async_pending: AtomicBool::new(false),
        }
    }

    /// Create a context from a decoded JSON value.
    ///
    /// Anything other than an object yields an empty field map.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(data) => Self::new(data),
            _ => Self::new(Map::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Raw request fields.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn string(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Integer view of a numeric field; floats are truncated.
    pub fn int(&self, key: &str) -> i64 {
        match self.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            _ => 0,
        }
    }

    pub fn float(&self, key: &str) -> f64 {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
            _ => 0.0,
        }
    }

    pub fn bool(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    pub fn array(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// Store an opaque value in the side-table, replacing any previous one.
    pub fn set_ref<T>(&self, name: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.references.insert(name.into(), Arc::new(value));
    }

    /// Fetch a side-table value; `None` if absent or stored as another type.
    pub fn get_ref<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let entry = self.references.get(name)?;
        Arc::clone(entry.value()).downcast::<T>().ok()
    }

    pub fn remove_ref(&self, name: &str) -> bool {
        self.references.remove(name).is_some()
    }

    /// Names currently stored in the side-table, sorted.
    pub fn ref_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.references.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Complete the context. Only the first call has any effect.
    pub fn complete(&self, result: Value) -> bool {
        let won = self.completion.complete(result);
        if won {
            tracing::debug!(context_id = %self.id, "Context completed");
        }
        won
    }

    /// Schedule `complete(result)` on an independent task and return a
    /// `Value::Null` placeholder for the calling handler to return.
    ///
    /// Runs on the current Tokio runtime when there is one, otherwise on a
    /// fresh thread.
    pub fn trigger_async(&self, result: Value) -> Value {
        let completer = self.completer();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    completer.complete(result);
                });
            }
            Err(_) => {
                std::thread::spawn(move || {
                    completer.complete(result);
                });
            }
        }
        Value::Null
    }

    /// Detachable producer handle for work that finishes out of band.
    ///
    /// Taking one marks the context as pending asynchronous completion.
    pub fn completer(&self) -> Completer {
        self.async_pending.store(true, Ordering::SeqCst);
        Completer::new(Arc::clone(&self.completion))
    }

    /// Take the single wait handle; later calls return `None`.
    pub fn wait_handle(&self) -> Option<WaitHandle> {
        self.wait_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_completed(&self) -> bool {
        self.completion.is_completed()
    }

    /// The completion result, if any.
    pub fn result(&self) -> Option<Value> {
        self.completion.result()
    }

    /// True once a handler has asked to finish asynchronously.
    pub fn is_async_pending(&self) -> bool {
        self.async_pending.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("references", &self.ref_names())
            .field("completed", &self.is_completed())
            .field("async_pending", &self.is_async_pending())
            .finish()
    }
}
