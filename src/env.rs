use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::{Result, ShellError};

/// Key under which the application handle is seeded into the environment.
/// Callbacks can technically overwrite it; doing so is their own decision.
pub const APP_KEY: &str = "score";

/// Build the variable environment for a shell session: a dict seeded with
/// the application handle, then passed through each callback in configured
/// order. Callbacks mutate the dict in place and may add, overwrite or
/// remove entries.
pub fn build<'py>(
    py: Python<'py>,
    score: &Py<PyAny>,
    callbacks: &[(String, Py<PyAny>)],
) -> Result<Bound<'py, PyDict>> {
    let env = PyDict::new(py);
    env.set_item(APP_KEY, score).map_err(ShellError::Python)?;
    for (path, callback) in callbacks {
        log::debug!("invoking shell callback `{path}`");
        callback
            .call1(py, (&env,))
            .map_err(|source| ShellError::Callback {
                path: path.clone(),
                source,
            })?;
    }
    Ok(env)
}
