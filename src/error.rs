use thiserror::Error;

/// Errors surfaced by shell configuration, environment building and backend
/// startup. All of these are fatal for the current invocation; nothing in
/// this crate retries or falls back once a backend has been selected.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Bad or unresolvable configuration: unknown backend name, callback
    /// path that does not import, malformed project file.
    #[error("invalid shell configuration: {0}")]
    Configuration(String),

    /// A user callback raised while the shell environment was being built.
    /// No backend is spawned after this.
    #[error("shell callback `{path}` raised while building the environment")]
    Callback {
        path: String,
        #[source]
        source: pyo3::PyErr,
    },

    /// The selected backend could not be started. Unavailability of an
    /// explicitly configured backend lands here as well; there is no
    /// automatic fallback to a different backend.
    #[error("shell backend `{name}` failed to start: {reason}")]
    BackendStart { name: String, reason: String },

    /// Interpreter-level failure outside the three classes above, e.g. an
    /// exception from a one-shot command evaluation.
    #[error(transparent)]
    Python(#[from] pyo3::PyErr),
}

impl ShellError {
    pub(crate) fn backend_start(name: &str, err: impl std::fmt::Display) -> Self {
        Self::BackendStart {
            name: name.to_string(),
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;
