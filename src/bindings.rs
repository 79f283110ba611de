use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::config::AppConfig;
use crate::error::Result;

/// The initialized application handle that seeds every shell session under
/// the `score` key. Exposes the project name and the parsed project
/// configuration as plain Python data.
#[pyclass(frozen, name = "Score")]
pub struct ScoreApp {
    #[pyo3(get)]
    name: String,
    conf: Py<PyDict>,
}

#[pymethods]
impl ScoreApp {
    #[getter]
    fn conf(&self, py: Python<'_>) -> Py<PyDict> {
        self.conf.clone_ref(py)
    }

    fn __repr__(&self) -> String {
        format!("<Score '{}'>", self.name)
    }
}

/// Construct the application handle from a parsed project file.
pub fn initialize(py: Python<'_>, config: &AppConfig) -> Result<Py<PyAny>> {
    let conf = table_to_py(py, &config.table)?;
    let app = ScoreApp {
        name: config.app_name().to_string(),
        conf: conf.unbind(),
    };
    Ok(Py::new(py, app)?.into_any())
}

fn table_to_py<'py>(py: Python<'py>, table: &toml::Table) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (key, value) in table {
        dict.set_item(key, value_to_py(py, value)?)?;
    }
    Ok(dict)
}

/// Convert a TOML value to its Python counterpart.
fn value_to_py<'py>(py: Python<'py>, value: &toml::Value) -> PyResult<Bound<'py, PyAny>> {
    Ok(match value {
        toml::Value::String(s) => s.as_str().into_pyobject(py)?.into_any(),
        toml::Value::Integer(i) => (*i).into_pyobject(py)?.into_any(),
        toml::Value::Float(f) => (*f).into_pyobject(py)?.into_any(),
        toml::Value::Boolean(b) => (*b).into_pyobject(py)?.to_owned().into_any(),
        toml::Value::Datetime(dt) => dt.to_string().into_pyobject(py)?.into_any(),
        toml::Value::Array(items) => {
            let list = PyList::empty(py);
            for item in items {
                list.append(value_to_py(py, item)?)?;
            }
            list.into_any()
        }
        toml::Value::Table(table) => table_to_py(py, table)?.into_any(),
    })
}
