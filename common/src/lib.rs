pub mod config;
pub mod sampling;
pub mod sensor;
pub mod tasks;
pub mod telemetry;
pub mod update;

/// Single-slot handoff cell for passing the result of one piece of work to
/// one consumer. For example from a background sampling cycle to the task
/// that publishes the finished reading.
///
/// A value is `set` by the producer and `get` takes it out, so a result is
/// consumed at most once.
pub struct ValueStore<T>(std::sync::Arc<std::sync::Mutex<Option<T>>>);

impl<T> ValueStore<T> {
    /// Sets `value` as the current value, replacing any unconsumed one.
    ///
    /// # Panics
    ///
    /// If locking the internally used mutex fails.
    pub fn set(&self, value: T) {
        let mut data = self.0.lock().unwrap();
        let _ = data.insert(value);
    }

    /// Takes the stored value, leaving the slot empty.
    ///
    /// # Panics
    ///
    /// If locking the internally used mutex fails.
    pub fn get(&self) -> Option<T> {
        let mut data = self.0.lock().unwrap();
        data.take()
    }
}

// Manual impls so `T` does not need to be Clone or Default itself.
impl<T> Clone for ValueStore<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for ValueStore<T> {
    fn default() -> Self {
        Self(Default::default())
    }
}
