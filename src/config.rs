use std::path::Path;

use pyo3::prelude::*;
use serde::Deserialize;

use crate::error::{Result, ShellError};

/// The `[shell]` section of a project configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Backend name ("python", "ipython", "bpython") or a dotted path to a
    /// custom backend class. When absent, the first available built-in is
    /// selected in priority order.
    pub backend: Option<String>,
    /// Install a configured-but-missing enhanced backend via pip before
    /// giving up on it.
    pub autoinstall: bool,
    /// Dotted paths to functions that receive the shell environment dict
    /// before the session starts.
    pub callbacks: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            backend: None,
            autoinstall: true,
            callbacks: Vec::new(),
        }
    }
}

/// A parsed project configuration: the `[shell]` section plus the full
/// table, which is handed to the Python side as the application's `conf`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub shell: ShellConfig,
    pub table: toml::Table,
}

/// Helper for extracting just the `[shell]` section; other sections belong
/// to the application and are kept as raw TOML.
#[derive(Deserialize, Default)]
struct ShellSection {
    #[serde(default)]
    shell: ShellConfig,
}

impl AppConfig {
    /// Parse a TOML project configuration from a string.
    pub fn parse(text: &str) -> Result<Self> {
        let table: toml::Table = text
            .parse()
            .map_err(|e| ShellError::Configuration(format!("malformed project file: {e}")))?;
        let section: ShellSection = toml::from_str(text)
            .map_err(|e| ShellError::Configuration(format!("invalid [shell] section: {e}")))?;
        Ok(Self {
            shell: section.shell,
            table,
        })
    }

    /// The application name from `[app] name`, falling back to "score".
    pub fn app_name(&self) -> &str {
        self.table
            .get("app")
            .and_then(|app| app.get("name"))
            .and_then(|name| name.as_str())
            .unwrap_or("score")
    }
}

/// Load and parse a project configuration file.
pub fn load(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ShellError::Configuration(format!("cannot read project file {}: {e}", path.display()))
    })?;
    AppConfig::parse(&text)
}

/// Resolve a dotted Python path ("json.dumps", "mypkg.mymod.Thing") to the
/// object it names. The longest importable module prefix wins; the remainder
/// is resolved with attribute lookups.
pub fn parse_dotted_path<'py>(py: Python<'py>, path: &str) -> Result<Bound<'py, PyAny>> {
    if let Ok(module) = py.import(path) {
        return Ok(module.into_any());
    }
    for (idx, _) in path.rmatch_indices('.') {
        let (module_path, attrs) = (&path[..idx], &path[idx + 1..]);
        let Ok(module) = py.import(module_path) else {
            continue;
        };
        let mut target = module.into_any();
        for attr in attrs.split('.') {
            target = target.getattr(attr).map_err(|_| {
                ShellError::Configuration(format!(
                    "cannot resolve `{path}`: `{module_path}` has no attribute `{attr}`"
                ))
            })?;
        }
        return Ok(target);
    }
    Err(ShellError::Configuration(format!(
        "cannot resolve dotted path `{path}`"
    )))
}
