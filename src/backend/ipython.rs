use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::ShellBackend;
use crate::error::{Result, ShellError};

const NAME: &str = "ipython";
const IMPORT: &str = "IPython";

/// Enhanced backend over the IPython interactive interpreter.
pub struct IPythonShell {
    autoinstall: bool,
}

impl IPythonShell {
    pub fn new(autoinstall: bool) -> Self {
        Self { autoinstall }
    }
}

impl ShellBackend for IPythonShell {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self, py: Python<'_>) -> bool {
        py.import(IMPORT).is_ok()
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
        let ipython = py
            .import(IMPORT)
            .map_err(|e| ShellError::backend_start(NAME, e))?;
        let kwargs = PyDict::new(py);
        kwargs
            .set_item("user_ns", env)
            .map_err(|e| ShellError::backend_start(NAME, e))?;
        // Blocks until the user exits the IPython session.
        ipython
            .getattr("embed")
            .and_then(|embed| embed.call((), Some(&kwargs)))
            .map_err(|e| ShellError::backend_start(NAME, e))?;
        Ok(())
    }
}
