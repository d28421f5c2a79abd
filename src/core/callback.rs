use std::sync::{Arc, Mutex, PoisonError};

type Handler = Arc<dyn Fn() + Send + Sync>;

/// A replaceable, shareable observer slot
///
/// `fire` clones the handler out and runs it without holding the slot's
/// lock, so a handler may call back into the component that fired it, and
/// fires from different threads never skip each other.
#[derive(Clone, Default)]
pub struct Callback {
    slot: Arc<Mutex<Option<Handler>>>,
}

impl Callback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(f));
    }

    pub fn is_set(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn fire(&self) {
        let handler = self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback").field("set", &self.is_set()).finish()
    }
}
