//! Run context threaded through lifecycle hooks and test methods.
//!
//! A [`Context`] is an immutable chain of typed key/value bindings. Extending it never mutates the original: each
//! hook receives the current context and returns a (possibly) extended one that replaces it for later hooks. This is
//! what keeps per-test extensions out of sibling tests and out of the suite-level after hooks.
//!
//! ```rust
//! use suitekit::{Context, Key};
//!
//! const USER: Key<&str> = Key::new("user");
//!
//! let base = Context::background();
//! let extended = base.with_value(&USER, "alice");
//! assert_eq!(extended.value(&USER), Some(&"alice"));
//! assert_eq!(base.value(&USER), None);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Typed key for a [`Context`] binding.
///
/// Two keys address the same binding when both their name and value type match.
pub struct Key<V> {
    name: &'static str,
    _value: PhantomData<fn() -> V>,
}

impl<V> Key<V> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<V> fmt::Debug for Key<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

struct Binding {
    name: &'static str,
    type_id: TypeId,
    value: Box<dyn Any + Send + Sync>,
    parent: Option<Arc<Binding>>,
}

struct CancelState {
    cancelled: AtomicBool,
    parent: Option<Arc<CancelState>>,
}

impl CancelState {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire) || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

/// Immutable, chainable key/value context.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Binding>>,
    cancel: Option<Arc<CancelState>>,
}

impl Context {
    /// The empty root context every suite run starts from.
    pub fn background() -> Self {
        Self::default()
    }

    /// Return a new context that binds `key` to `value` on top of this one.
    pub fn with_value<V: Any + Send + Sync>(&self, key: &Key<V>, value: V) -> Context {
        Context {
            head: Some(Arc::new(Binding {
                name: key.name,
                type_id: TypeId::of::<V>(),
                value: Box::new(value),
                parent: self.head.clone(),
            })),
            cancel: self.cancel.clone(),
        }
    }

    /// Look up the nearest binding for `key`.
    pub fn value<V: Any + Send + Sync>(&self, key: &Key<V>) -> Option<&V> {
        let wanted = TypeId::of::<V>();
        let mut node = self.head.as_deref();
        while let Some(binding) = node {
            if binding.name == key.name && binding.type_id == wanted {
                return binding.value.downcast_ref::<V>();
            }
            node = binding.parent.as_deref();
        }
        None
    }

    /// Whether `key` is bound anywhere in the chain.
    pub fn contains<V: Any + Send + Sync>(&self, key: &Key<V>) -> bool {
        self.value(key).is_some()
    }

    /// Names of all bindings, nearest first. Shadowed bindings are included.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        let mut node = self.head.as_deref();
        while let Some(binding) = node {
            keys.push(binding.name);
            node = binding.parent.as_deref();
        }
        keys
    }

    /// Derive a cancellable context.
    ///
    /// Cancelling the returned handle cancels the new context and everything derived from it. If this context is
    /// already cancellable, cancelling its handle also cancels the derived one.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let state = Arc::new(CancelState {
            cancelled: AtomicBool::new(false),
            parent: self.cancel.clone(),
        });
        let ctx = Context {
            head: self.head.clone(),
            cancel: Some(state.clone()),
        };
        (ctx, CancelHandle { state })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("keys", &self.keys())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
#[derive(Clone)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.state.is_cancelled())
            .finish()
    }
}
