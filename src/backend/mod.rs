mod bpython;
mod custom;
mod ipython;
mod python;

pub use bpython::BPythonShell;
pub use custom::PyClassBackend;
pub use ipython::IPythonShell;
pub use python::PythonShell;

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::{Result, ShellError};

/// A strategy for running an interactive session over the embedded
/// interpreter. Exactly one backend is active per shell invocation.
pub trait ShellBackend {
    fn name(&self) -> &str;

    /// Whether the underlying interpreter library can be used on this
    /// system. Must not raise; unavailability is a normal outcome.
    fn is_available(&self, py: Python<'_>) -> bool;

    /// Start the interactive session with `env` as its variables. Blocks
    /// until the user ends the session. Failures to *start* surface as
    /// [`ShellError::BackendStart`]; exceptions raised by user code inside
    /// the running session are the interpreter's own business.
    fn spawn(&self, py: Python<'_>, env: &Bound<'_, PyDict>) -> Result<()>;
}

/// The built-in backends in default selection order: enhanced interpreters
/// first, the always-available baseline last.
pub fn builtin_backends(autoinstall: bool) -> Vec<Box<dyn ShellBackend>> {
    vec![
        Box::new(IPythonShell::new(autoinstall)),
        Box::new(BPythonShell::new(autoinstall)),
        Box::new(PythonShell::new()),
    ]
}

/// Look up a built-in backend by its registered name.
pub fn by_name(name: &str, autoinstall: bool) -> Option<Box<dyn ShellBackend>> {
    match name {
        "python" => Some(Box::new(PythonShell::new())),
        "ipython" => Some(Box::new(IPythonShell::new(autoinstall))),
        "bpython" => Some(Box::new(BPythonShell::new(autoinstall))),
        _ => None,
    }
}

/// Pick the first backend whose availability probe succeeds, consuming the
/// candidate list in priority order.
pub fn first_available(
    py: Python<'_>,
    backends: Vec<Box<dyn ShellBackend>>,
) -> Option<Box<dyn ShellBackend>> {
    backends.into_iter().find(|backend| {
        let available = backend.is_available(py);
        log::debug!("backend `{}` available: {available}", backend.name());
        available
    })
}

/// Install a missing interpreter library the way the interpreter itself
/// would: `pip.main(["install", package])`.
pub(crate) fn pip_install(py: Python<'_>, package: &str) -> Result<()> {
    log::info!("installing missing shell backend `{package}` via pip");
    let pip = py
        .import("pip")
        .map_err(|e| ShellError::backend_start(package, format!("pip is not importable: {e}")))?;
    pip.getattr("main")
        .and_then(|main| main.call1((vec!["install", package],)))
        .map_err(|e| ShellError::backend_start(package, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBackend {
        name: &'static str,
        available: bool,
    }

    impl FakeBackend {
        fn new(name: &'static str, available: bool) -> Self {
            Self { name, available }
        }
    }

    impl ShellBackend for FakeBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self, _py: Python<'_>) -> bool {
            self.available
        }

        fn spawn(&self, _py: Python<'_>, _env: &Bound<'_, PyDict>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn selection_prefers_earlier_available_backends() {
        Python::initialize();
        Python::attach(|py| {
            let candidates: Vec<Box<dyn ShellBackend>> = vec![
                Box::new(FakeBackend::new("enhanced-a", false)),
                Box::new(FakeBackend::new("enhanced-b", true)),
                Box::new(FakeBackend::new("baseline", true)),
            ];
            let selected = first_available(py, candidates).unwrap();
            assert_eq!(selected.name(), "enhanced-b");
        });
    }

    #[test]
    fn selection_falls_through_to_the_last_candidate() {
        Python::initialize();
        Python::attach(|py| {
            let candidates: Vec<Box<dyn ShellBackend>> = vec![
                Box::new(FakeBackend::new("enhanced-a", false)),
                Box::new(FakeBackend::new("enhanced-b", false)),
                Box::new(FakeBackend::new("baseline", true)),
            ];
            let selected = first_available(py, candidates).unwrap();
            assert_eq!(selected.name(), "baseline");
        });
    }

    #[test]
    fn selection_yields_none_when_nothing_is_available() {
        Python::initialize();
        Python::attach(|py| {
            let candidates: Vec<Box<dyn ShellBackend>> =
                vec![Box::new(FakeBackend::new("enhanced-a", false))];
            assert!(first_available(py, candidates).is_none());
        });
    }

    #[test]
    fn builtin_order_puts_enhanced_backends_before_the_baseline() {
        let names: Vec<String> = builtin_backends(false)
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        assert_eq!(names, vec!["ipython", "bpython", "python"]);
    }

    #[test]
    fn by_name_resolves_registered_backends() {
        for name in ["python", "ipython", "bpython"] {
            let backend = by_name(name, false).unwrap();
            assert_eq!(backend.name(), name);
        }
    }

    #[test]
    fn by_name_rejects_unknown_backends() {
        assert!(by_name("perl", false).is_none());
    }

    #[test]
    fn baseline_backend_is_always_available() {
        Python::initialize();
        Python::attach(|py| {
            assert!(PythonShell::new().is_available(py));
        });
    }
}
