use std::fmt::Debug;

use futures::stream::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A reactive property that can be watched for changes.
///
/// When the value changes, all watchers are notified automatically. Each
/// watcher gets the current value immediately when subscribing.
#[derive(Clone)]
pub struct Property<T: Clone + Send + Sync + 'static> {
    tx: watch::Sender<T>,
    rx: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> Property<T> {
    /// Creates a new property with an initial value.
    pub fn new(initial: T) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self { tx, rx }
    }

    /// Sets a new value and notifies watchers. Only updates (and only
    /// notifies) if the value actually changed.
    pub(crate) fn set(&self, new_value: T)
    where
        T: PartialEq,
    {
        let _ = self.tx.send_if_modified(|current| {
            if *current != new_value {
                *current = new_value;
                true
            } else {
                false
            }
        });
    }

    /// Gets the current value.
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Watches for changes to this property. The stream immediately yields
    /// the current value, then yields again on every subsequent change.
    pub fn watch(&self) -> impl Stream<Item = T> + Send {
        WatchStream::new(self.rx.clone())
    }
}

impl<T: Clone + Send + Sync + Debug + 'static> Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property").field("value", &self.get()).finish()
    }
}
