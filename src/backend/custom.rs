use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::ShellBackend;
use crate::config;
use crate::error::{Result, ShellError};

/// A backend implemented by a user-supplied Python class, referenced from
/// the configuration by its dotted path. The class is instantiated once at
/// configuration time and must expose `is_available()` and `spawn(env)`.
#[derive(Debug)]
pub struct PyClassBackend {
    path: String,
    instance: Py<PyAny>,
}

impl PyClassBackend {
    /// Resolve a dotted path to a conforming backend instance. Anything
    /// short of a class with both required methods is a configuration
    /// error, reported before any shell is spawned.
    pub fn resolve(py: Python<'_>, path: &str) -> Result<Self> {
        let target = config::parse_dotted_path(py, path)?;
        if !target.is_callable() {
            return Err(ShellError::Configuration(format!(
                "custom backend `{path}` is not a class"
            )));
        }
        let instance = target.call0().map_err(|e| {
            ShellError::Configuration(format!("custom backend `{path}` failed to instantiate: {e}"))
        })?;
        for method in ["is_available", "spawn"] {
            if !instance.hasattr(method).unwrap_or(false) {
                return Err(ShellError::Configuration(format!(
                    "custom backend `{path}` does not implement `{method}`"
                )));
            }
        }
        Ok(Self {
            path: path.to_string(),
            instance: instance.unbind(),
        })
    }
}

impl ShellBackend for PyClassBackend {
    fn name(&self) -> &str {
        &self.path
    }

    fn is_available(&self, py: Python<'_>) -> bool {
        // The probe contract is "never raises"; a raising probe counts as
        // unavailable.
        self.instance
            .bind(py)
            .call_method0("is_available")
            .and_then(|flag| flag.extract())
            .unwrap_or(false)
    }

    fn spawn(&self, py: Python<'_>, env: &Bound<'_, PyDict>) -> Result<()> {
        if !self.is_available(py) {
            return Err(ShellError::backend_start(
                &self.path,
                "backend reports itself unavailable",
            ));
        }
        self.instance
            .bind(py)
            .call_method1("spawn", (env,))
            .map_err(|e| ShellError::backend_start(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    /// Register a synthetic module in sys.modules so dotted-path resolution
    /// can find it.
    fn register_module(py: Python<'_>, name: &str, code: &str) {
        let module = PyModule::new(py, name).unwrap();
        let code_cstr = CString::new(code).unwrap();
        py.run(code_cstr.as_c_str(), Some(&module.dict()), None)
            .unwrap();
        let sys_modules = py.import("sys").unwrap().getattr("modules").unwrap();
        sys_modules.set_item(name, module).unwrap();
    }

    const CONFORMING: &str = r#"
class DummyShell:
    def __init__(self):
        self.seen = None

    def is_available(self):
        return True

    def spawn(self, env):
        self.seen = sorted(env)
"#;

    #[test]
    fn conforming_class_resolves_and_spawns() {
        Python::initialize();
        Python::attach(|py| {
            register_module(py, "fakeshell_ok", CONFORMING);
            let backend = PyClassBackend::resolve(py, "fakeshell_ok.DummyShell").unwrap();
            assert_eq!(backend.name(), "fakeshell_ok.DummyShell");
            assert!(backend.is_available(py));

            let env = PyDict::new(py);
            env.set_item("score", py.None()).unwrap();
            backend.spawn(py, &env).unwrap();

            let seen: Vec<String> = backend
                .instance
                .bind(py)
                .getattr("seen")
                .unwrap()
                .extract()
                .unwrap();
            assert_eq!(seen, vec!["score".to_string()]);
        });
    }

    #[test]
    fn class_without_spawn_is_rejected() {
        Python::initialize();
        Python::attach(|py| {
            register_module(
                py,
                "fakeshell_nospawn",
                "class Broken:\n    def is_available(self):\n        return True\n",
            );
            let err = PyClassBackend::resolve(py, "fakeshell_nospawn.Broken").unwrap_err();
            assert!(matches!(err, ShellError::Configuration(_)));
        });
    }

    #[test]
    fn non_class_target_is_rejected() {
        Python::initialize();
        Python::attach(|py| {
            register_module(py, "fakeshell_value", "NOT_A_CLASS = 42\n");
            let err = PyClassBackend::resolve(py, "fakeshell_value.NOT_A_CLASS").unwrap_err();
            assert!(matches!(err, ShellError::Configuration(_)));
        });
    }

    #[test]
    fn raising_probe_counts_as_unavailable() {
        Python::initialize();
        Python::attach(|py| {
            register_module(
                py,
                "fakeshell_raises",
                "class Flaky:\n    def is_available(self):\n        raise RuntimeError('probe exploded')\n    def spawn(self, env):\n        pass\n",
            );
            let backend = PyClassBackend::resolve(py, "fakeshell_raises.Flaky").unwrap();
            assert!(!backend.is_available(py));

            let env = PyDict::new(py);
            let err = backend.spawn(py, &env).unwrap_err();
            assert!(matches!(err, ShellError::BackendStart { .. }));
        });
    }
}
