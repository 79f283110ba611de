use std::borrow::Cow;
use std::ffi::CString;

use pyo3::exceptions::{PySyntaxError, PySystemExit};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use reedline::{
    FileBackedHistory, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
    Reedline, Signal,
};

use crate::error::Result;

const HISTORY_FILE: &str = ".score_shell_history";
const HISTORY_CAPACITY: usize = 1000;

/// Prompt for the baseline session: ">>> ", or "... " while a statement is
/// still open.
struct ScorePrompt {
    is_continuation: bool,
}

impl Prompt for ScorePrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.is_continuation {
            Cow::Borrowed("... ")
        } else {
            Cow::Borrowed(">>> ")
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse search) ", prefix))
    }
}

fn make_editor() -> Reedline {
    let mut line_editor = Reedline::create();
    if let Some(dir) = home::home_dir()
        && let Ok(history) = FileBackedHistory::with_file(HISTORY_CAPACITY, dir.join(HISTORY_FILE))
    {
        line_editor = line_editor.with_history(Box::new(history));
    }
    line_editor
}

/// A statement is complete once codeop.compile_command produces a code
/// object; None means "keep reading". Syntax errors count as complete so
/// that execution surfaces them.
fn is_complete_statement(py: Python<'_>, source: &str) -> bool {
    let Ok(codeop) = py.import("codeop") else {
        return true;
    };
    match codeop
        .getattr("compile_command")
        .and_then(|compile| compile.call1((source,)))
    {
        Ok(code) => !code.is_none(),
        Err(_) => true,
    }
}

/// Execute one complete statement against the session environment. Tried as
/// an expression first so results get printed via repr, the way the plain
/// interpreter does; anything that does not parse as an expression runs as a
/// statement suite.
pub(crate) fn execute_line(py: Python<'_>, env: &Bound<'_, PyDict>, source: &str) -> PyResult<()> {
    let code = CString::new(source)?;
    match py.eval(code.as_c_str(), Some(env), None) {
        Ok(result) => {
            if !result.is_none() {
                println!("{}", result.repr()?);
            }
            Ok(())
        }
        Err(err) if err.is_instance_of::<PySyntaxError>(py) => {
            py.run(code.as_c_str(), Some(env), None)
        }
        Err(err) => Err(err),
    }
}

/// Run the baseline interactive session over `env`. Blocks until the user
/// exits via Ctrl-D, exit() or any other SystemExit.
pub fn run(py: Python<'_>, env: &Bound<'_, PyDict>) -> Result<()> {
    let mut line_editor = make_editor();
    let mut buffer = String::new();
    let mut prompt = ScorePrompt {
        is_continuation: false,
    };

    let version = py
        .import("sys")
        .and_then(|sys| sys.getattr("version"))
        .and_then(|version| version.extract::<String>())
        .map(|version| {
            version
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .unwrap_or_default();
    println!("score shell (Python {version})");
    println!("Type exit() or press Ctrl+D to leave the shell");
    println!();

    loop {
        prompt.is_continuation = !buffer.is_empty();

        // Release the interpreter while blocked on user input.
        let sig = py.detach(|| line_editor.read_line(&prompt));

        match sig {
            Ok(Signal::Success(line)) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if !is_complete_statement(py, &buffer) {
                    continue;
                }
                let statement = std::mem::take(&mut buffer);
                if statement.trim().is_empty() {
                    continue;
                }
                if let Err(e) = execute_line(py, env, &statement) {
                    if e.is_instance_of::<PySystemExit>(py) {
                        break;
                    }
                    e.print(py);
                }
            }
            Ok(Signal::CtrlC) => {
                println!("KeyboardInterrupt");
                buffer.clear();
            }
            Ok(Signal::CtrlD) => {
                break;
            }
            Err(err) => {
                eprintln!("Error reading input: {err:?}");
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_statements_are_detected_as_incomplete() {
        Python::initialize();
        Python::attach(|py| {
            assert!(!is_complete_statement(py, "if True:"));
            assert!(!is_complete_statement(py, "def f():"));
            assert!(is_complete_statement(py, "1 + 1"));
            assert!(is_complete_statement(py, "x = 3"));
        });
    }

    #[test]
    fn broken_syntax_counts_as_complete() {
        Python::initialize();
        Python::attach(|py| {
            assert!(is_complete_statement(py, "def = 1 ++"));
        });
    }

    #[test]
    fn statements_mutate_the_environment() {
        Python::initialize();
        Python::attach(|py| {
            let env = PyDict::new(py);
            execute_line(py, &env, "x = 40 + 2").unwrap();
            let x: i64 = env.get_item("x").unwrap().unwrap().extract().unwrap();
            assert_eq!(x, 42);
        });
    }

    #[test]
    fn expressions_read_from_the_environment() {
        Python::initialize();
        Python::attach(|py| {
            let env = PyDict::new(py);
            env.set_item("answer", 21).unwrap();
            execute_line(py, &env, "answer * 2").unwrap();
        });
    }

    #[test]
    fn runtime_errors_propagate_without_rerunning() {
        Python::initialize();
        Python::attach(|py| {
            let env = PyDict::new(py);
            env.set_item("hits", 0).unwrap();
            let err = execute_line(py, &env, "1 / 0").unwrap_err();
            assert!(err.is_instance_of::<pyo3::exceptions::PyZeroDivisionError>(py));
        });
    }

    #[test]
    fn system_exit_surfaces_to_the_caller() {
        Python::initialize();
        Python::attach(|py| {
            let env = PyDict::new(py);
            let err = execute_line(py, &env, "raise SystemExit").unwrap_err();
            assert!(err.is_instance_of::<PySystemExit>(py));
        });
    }
}
