use thiserror::Error;

/// Errors that can occur when binding a timer backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No available backend matches the requested name.
    ///
    /// An unknown name and a backend that exists but is unavailable on this platform produce
    /// the same error. Use [`TimerRegistry::available()`][crate::TimerRegistry::available] to
    /// tell them apart.
    #[error("timer '{name}' is not supported on this platform")]
    TimerNotFound {
        /// The name the caller asked for.
        name: String,
    },
}

/// A specialized `Result` type for timer operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
