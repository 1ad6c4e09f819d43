use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::warn;

use crate::event::Event;

/// Error a [`Listener`] may report for one event.
///
/// Listener errors never propagate past [`Listeners::notify`]; they are
/// logged and the next listener still receives the event.
#[derive(Debug, thiserror::Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

/// An observer of [`Event`]s.
///
/// Implementations must be `Send + Sync` because the same listener is
/// shared between the driver and the decoder it attaches to.
pub trait Listener: Send + Sync {
    /// Receive one event.
    ///
    /// # Errors
    ///
    /// Any error is contained by the notifier and only affects this
    /// listener's handling of this event.
    fn process_event(&self, event: &Event) -> Result<(), ListenerError>;
}

impl<F> Listener for F
where
    F: Fn(&Event) -> Result<(), ListenerError> + Send + Sync,
{
    fn process_event(&self, event: &Event) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Ordered set of listeners with per-listener fault isolation.
///
/// Listeners are compared by `Arc` identity: adding the same `Arc` twice
/// registers it twice, and [`remove`](Self::remove) drops the first
/// registration that points at the same allocation.
///
/// ```text
///   notify(evt)
///     ├── L0.process_event(evt)   Ok
///     ├── L1.process_event(evt)   Err / panic → logged, contained
///     └── L2.process_event(evt)   Ok           ← still delivered
/// ```
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Vec<Arc<dyn Listener>>,
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Always succeeds.
    pub fn add(&mut self, listener: Arc<dyn Listener>) -> bool {
        self.inner.push(listener);
        true
    }

    /// Remove a listener by identity.
    ///
    /// Returns `false` if the listener is not registered.
    pub fn remove(&mut self, listener: &Arc<dyn Listener>) -> bool {
        match self.inner.iter().position(|l| same_listener(l, listener)) {
            Some(index) => {
                self.inner.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Listener>> {
        self.inner.iter()
    }

    /// Deliver `event` to every listener in registration order.
    ///
    /// Each call runs inside its own fault boundary: an `Err` or a panic
    /// from one listener is logged and skipped. Returns the number of
    /// listeners that handled the event without fault.
    pub fn notify(&self, event: &Event) -> usize {
        let mut delivered = 0;
        for (index, listener) in self.inner.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| listener.process_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!("listener #{index} rejected {} event: {e}", event.kind),
                Err(_) => warn!("listener #{index} panicked on {} event", event.kind),
            }
        }
        delivered
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.inner.len()).finish()
    }
}

/// Identity comparison on the data pointer only; vtable pointers for the
/// same type may differ between codegen units.
fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}
