//! Ambient logging context.
//!
//! A property stack scoped to one future (normally one request). Records
//! emitted while the future runs pick up every property on the stack.
//! Properties are attached with [`LogContext::push_property`] and removed
//! when the returned [`PropertyGuard`] drops, on every exit path: normal
//! return, early `?`, panic unwinding, or the future being dropped.
//!
//! Tokio task-locals are not inherited by spawned tasks. Wrap spawned work
//! in [`LogContext::scope`] and re-push what it needs.

use std::cell::RefCell;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task_local;

task_local! {
    static LOG_CONTEXT: RefCell<ContextState>;
}

/// Guard ids are process-unique so a guard can never remove another
/// scope's entry.
static NEXT_PROPERTY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct ContextState {
    properties: Vec<Property>,
    pushed: u64,
    popped: u64,
}

#[derive(Debug)]
struct Property {
    id: u64,
    name: String,
    value: String,
}

/// Push/pop counters for the active scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContextStats {
    pub pushed: u64,
    pub popped: u64,
}

/// Entry point for the ambient logging context.
pub struct LogContext;

impl LogContext {
    /// Run `fut` with a fresh, empty property stack.
    pub async fn scope<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        LOG_CONTEXT.scope(RefCell::default(), fut).await
    }

    /// Run `f` with a fresh, empty property stack.
    pub fn sync_scope<R>(f: impl FnOnce() -> R) -> R {
        LOG_CONTEXT.sync_scope(RefCell::default(), f)
    }

    /// Run `fut` with its own stack, seeded with a copy of the properties
    /// visible where it is first polled.
    ///
    /// Pushes inside `fut` never reach the enclosing stack and pushes on the
    /// enclosing stack never reach `fut`, so sibling forks polled under one
    /// scope cannot observe each other.
    pub async fn fork<F>(fut: F) -> F::Output
    where
        F: Future,
    {
        let properties = Self::snapshot()
            .into_iter()
            .map(|(name, value)| Property {
                id: NEXT_PROPERTY_ID.fetch_add(1, Ordering::Relaxed),
                name,
                value,
            })
            .collect();
        let state = ContextState {
            properties,
            ..ContextState::default()
        };
        LOG_CONTEXT.scope(RefCell::new(state), fut).await
    }

    /// Run `f` in the active scope, creating one if none is active.
    pub fn ensure_sync<R>(f: impl FnOnce() -> R) -> R {
        if Self::is_active() {
            f()
        } else {
            Self::sync_scope(f)
        }
    }

    pub fn is_active() -> bool {
        LOG_CONTEXT.try_with(|_| ()).is_ok()
    }

    /// Attach `name = value` until the returned guard drops.
    ///
    /// Outside any scope the guard is inert and nothing is attached; use
    /// [`LogContext::fork`] or [`LogContext::ensure_sync`] when attachment
    /// must be guaranteed.
    #[must_use = "the property is removed as soon as the guard drops"]
    pub fn push_property(name: impl Into<String>, value: impl Into<String>) -> PropertyGuard {
        let id = NEXT_PROPERTY_ID.fetch_add(1, Ordering::Relaxed);
        let property = Property {
            id,
            name: name.into(),
            value: value.into(),
        };
        let attached = LOG_CONTEXT
            .try_with(|cell| {
                let mut state = cell.borrow_mut();
                state.properties.push(property);
                state.pushed += 1;
            })
            .is_ok();

        PropertyGuard {
            id: attached.then_some(id),
        }
    }

    /// Most recently pushed value for `name`.
    pub fn property(name: &str) -> Option<String> {
        LOG_CONTEXT
            .try_with(|cell| {
                cell.borrow()
                    .properties
                    .iter()
                    .rev()
                    .find(|p| p.name == name)
                    .map(|p| p.value.clone())
            })
            .ok()
            .flatten()
    }

    /// Every attached property in push order. Empty outside a scope.
    pub fn snapshot() -> Vec<(String, String)> {
        LOG_CONTEXT
            .try_with(|cell| {
                cell.borrow()
                    .properties
                    .iter()
                    .map(|p| (p.name.clone(), p.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of attached properties. Zero outside a scope.
    pub fn depth() -> usize {
        LOG_CONTEXT
            .try_with(|cell| cell.borrow().properties.len())
            .unwrap_or(0)
    }

    pub fn stats() -> Option<ContextStats> {
        LOG_CONTEXT
            .try_with(|cell| {
                let state = cell.borrow();
                ContextStats {
                    pushed: state.pushed,
                    popped: state.popped,
                }
            })
            .ok()
    }
}

/// Removes its property from the ambient context when dropped.
#[derive(Debug)]
pub struct PropertyGuard {
    id: Option<u64>,
}

impl PropertyGuard {
    /// Whether the property was actually attached to a scope.
    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }
}

impl Drop for PropertyGuard {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        // The scope may already be gone if the guard outlived its future.
        let _ = LOG_CONTEXT.try_with(|cell| {
            let mut state = cell.borrow_mut();
            if let Some(pos) = state.properties.iter().rposition(|p| p.id == id) {
                state.properties.remove(pos);
                state.popped += 1;
            }
        });
    }
}
