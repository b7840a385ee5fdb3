//! Value-or-updater parameters for change handlers.

use std::fmt;

/// A state change delivered to a handler.
///
/// Table widgets report changes either as the complete new value or as a
/// function of the previous one. Both are resolved once per event against
/// the handler's current state.
///
/// # Example
///
/// ```
/// use tablesync_lib::update::Update;
///
/// let direct = Update::Direct(3);
/// assert_eq!(direct.resolve(&1), 3);
///
/// let derived = Update::derive(|n: &i32| n + 1);
/// assert_eq!(derived.resolve(&1), 2);
/// ```
pub enum Update<T> {
    /// Replace the current value.
    Direct(T),
    /// Compute the new value from the current one.
    Derive(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> Update<T> {
    /// Creates an update computed from the current value.
    pub fn derive(f: impl FnOnce(&T) -> T + Send + 'static) -> Self {
        Update::Derive(Box::new(f))
    }

    /// Resolves the update against `current`.
    pub fn resolve(self, current: &T) -> T {
        match self {
            Update::Direct(value) => value,
            Update::Derive(f) => f(current),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Update::Direct(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Direct(value) => f.debug_tuple("Direct").field(value).finish(),
            Update::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}
