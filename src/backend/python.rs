use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::ShellBackend;
use crate::error::Result;
use crate::repl;

/// The baseline backend: a reedline-driven session over the embedded
/// interpreter. Needs nothing beyond the interpreter itself, so it is
/// always available and terminates every selection order.
pub struct PythonShell;

impl PythonShell {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonShell {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellBackend for PythonShell {
    fn name(&self) -> &str {
        "python"
    }

    fn is_available(&self, _py: Python<'_>) -> bool {
        true
    }

    fn spawn(&self, py: Python<'_>, env: &Bound<'_, PyDict>) -> Result<()> {
        repl::run(py, env)
    }
}
