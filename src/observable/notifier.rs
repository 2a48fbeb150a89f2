//! Value-change notifier: synchronous callbacks without payload.

use std::fmt;

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut()>;

/// Invokes every registered listener, in registration order, on `notify`.
#[derive(Default)]
pub struct ValueNotifier {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for ValueNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ValueNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn notify(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener();
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
