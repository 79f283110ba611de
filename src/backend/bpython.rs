use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::ShellBackend;
use crate::error::{Result, ShellError};

const NAME: &str = "bpython";

/// Enhanced backend over the bpython interactive interpreter.
pub struct BPythonShell {
    autoinstall: bool,
}

impl BPythonShell {
    pub fn new(autoinstall: bool) -> Self {
        Self { autoinstall }
    }
}

impl ShellBackend for BPythonShell {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self, py: Python<'_>) -> bool {
        py.import(NAME).is_ok()
    }

    fn spawn(&self, py: Python<'_>, env: &Bound<'_, PyDict>) -> Result<()> {
        if !self.is_available(py) {
            if !self.autoinstall {
                return Err(ShellError::backend_start(
                    NAME,
                    "library is not installed and autoinstall is disabled",
                ));
            }
            super::pip_install(py, NAME)?;
        }
        let bpython = py
            .import(NAME)
            .map_err(|e| ShellError::backend_start(NAME, e))?;
        let kwargs = PyDict::new(py);
        kwargs
            .set_item("locals_", env)
            .map_err(|e| ShellError::backend_start(NAME, e))?;
        // Blocks until the user exits the bpython session.
        bpython
            .getattr("embed")
            .and_then(|embed| embed.call((), Some(&kwargs)))
            .map_err(|e| ShellError::backend_start(NAME, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Runs only where bpython is genuinely absent, which is the situation
    // the no-fallback contract cares about.
    #[test]
    fn missing_library_without_autoinstall_fails_to_start() {
        Python::initialize();
        Python::attach(|py| {
            let backend = BPythonShell::new(false);
            if backend.is_available(py) {
                return;
            }
            let env = PyDict::new(py);
            let err = backend.spawn(py, &env).unwrap_err();
            match err {
                ShellError::BackendStart { name, .. } => assert_eq!(name, "bpython"),
                other => panic!("expected BackendStart error, got {other:?}"),
            }
        });
    }
}
