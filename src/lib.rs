pub mod backend;
pub mod bindings;
pub mod config;
pub mod env;
pub mod error;
pub mod repl;

use std::ffi::CString;

use pyo3::prelude::*;
use pyo3::types::PyDict;

use backend::{PyClassBackend, ShellBackend};

pub use config::{AppConfig, ShellConfig};
pub use error::{Result, ShellError};

/// The resolved shell module: one backend plus the callbacks that extend
/// the session environment. Created once at startup, immutable afterwards.
pub struct ConfiguredShellModule {
    backend: Box<dyn ShellBackend>,
    callbacks: Vec<(String, Py<PyAny>)>,
    score: Py<PyAny>,
}

impl std::fmt::Debug for ConfiguredShellModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredShellModule")
            .field("backend", &self.backend.name())
            .field("callbacks", &self.callbacks)
            .field("score", &self.score)
            .finish()
    }
}

/// Resolve a `[shell]` configuration against the backend registry and the
/// embedded interpreter. `score` is the already-initialized application
/// handle; this crate does not perform application initialization itself.
pub fn init(py: Python<'_>, conf: &ShellConfig, score: Py<PyAny>) -> Result<ConfiguredShellModule> {
    let backend: Box<dyn ShellBackend> = match conf.backend.as_deref() {
        Some(name) => match backend::by_name(name, conf.autoinstall) {
            Some(builtin) => builtin,
            None if name.contains('.') => Box::new(PyClassBackend::resolve(py, name)?),
            None => {
                return Err(ShellError::Configuration(format!(
                    "invalid backend `{name}`"
                )));
            }
        },
        None => backend::first_available(py, backend::builtin_backends(conf.autoinstall))
            .ok_or_else(|| ShellError::Configuration("no shell backend available".to_string()))?,
    };
    log::debug!("selected shell backend `{}`", backend.name());

    let mut callbacks = Vec::with_capacity(conf.callbacks.len());
    for path in &conf.callbacks {
        let callback = config::parse_dotted_path(py, path)?;
        if !callback.is_callable() {
            return Err(ShellError::Configuration(format!(
                "given callback not callable: {path}"
            )));
        }
        callbacks.push((path.clone(), callback.unbind()));
    }

    Ok(ConfiguredShellModule {
        backend,
        callbacks,
        score,
    })
}

impl ConfiguredShellModule {
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Build the session environment and hand control to the backend until
    /// the user exits. When `command` is given, no session is started;
    /// instead the command is evaluated in the environment and its value
    /// returned.
    pub fn shell(&self, py: Python<'_>, command: Option<&str>) -> Result<Option<Py<PyAny>>> {
        let shell_env = env::build(py, &self.score, &self.callbacks)?;
        log::debug!("shell environment built with {} entries", shell_env.len());
        match command {
            None => {
                log::debug!("handing session to backend `{}`", self.backend.name());
                self.backend.spawn(py, &shell_env)?;
                log::debug!("session ended");
                Ok(None)
            }
            Some(command) => {
                import_referenced_modules(py, command, &shell_env)?;
                let code = CString::new(command).map_err(PyErr::from)?;
                let value = py.eval(code.as_c_str(), Some(&shell_env), None)?;
                Ok(Some(value.unbind()))
            }
        }
    }
}

/// Best-effort auto-import for one-shot commands: walk the command's syntax
/// tree, import every dotted name that names a module, and bind top-level
/// module names into the environment when not already bound. Names that do
/// not import are left for evaluation to complain about.
fn import_referenced_modules(
    py: Python<'_>,
    command: &str,
    shell_env: &Bound<'_, PyDict>,
) -> Result<()> {
    let ast = py.import("ast")?;
    let tree = ast.getattr("parse")?.call1((command,))?;
    let name_cls = ast.getattr("Name")?;
    let attribute_cls = ast.getattr("Attribute")?;
    let walker = ast.getattr("walk")?.call1((&tree,))?;
    for node in walker.try_iter()? {
        let node = node?;
        let Some(name) = extract_dotted_path(&node, &name_cls, &attribute_cls)? else {
            continue;
        };
        let Ok(module) = py.import(name.as_str()) else {
            continue;
        };
        if !name.contains('.') && !shell_env.contains(name.as_str())? {
            shell_env.set_item(name.as_str(), module)?;
        }
    }
    Ok(())
}

fn extract_dotted_path(
    node: &Bound<'_, PyAny>,
    name_cls: &Bound<'_, PyAny>,
    attribute_cls: &Bound<'_, PyAny>,
) -> PyResult<Option<String>> {
    if node.is_instance(name_cls)? {
        return Ok(Some(node.getattr("id")?.extract()?));
    }
    if node.is_instance(attribute_cls)?
        && let Some(base) = extract_dotted_path(&node.getattr("value")?, name_cls, attribute_cls)?
    {
        let attr: String = node.getattr("attr")?.extract()?;
        return Ok(Some(format!("{base}.{attr}")));
    }
    Ok(None)
}
