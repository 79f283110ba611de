use std::path::PathBuf;

use clap::Parser;
use pyo3::prelude::*;

use score_shell::{bindings, config};

/// Operate on a score project from an interactive Python shell.
#[derive(Parser, Debug)]
#[command(name = "score-shell", version, about)]
struct Cli {
    /// Path to the project configuration file
    #[arg(short, long, default_value = "score.toml")]
    config: PathBuf,

    /// Shell backend to use, overriding the configured one
    #[arg(short, long)]
    backend: Option<String>,

    /// Evaluate a single expression instead of starting a session
    command: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("CLI args parsed: {cli:?}");

    let mut config = config::load(&cli.config)?;
    if let Some(backend) = cli.backend {
        config.shell.backend = Some(backend);
    }

    Python::initialize();
    Python::attach(|py| -> anyhow::Result<()> {
        let score = bindings::initialize(py, &config)?;
        let module = score_shell::init(py, &config.shell, score)?;
        let result = module.shell(py, cli.command.as_deref())?;
        if let Some(value) = result
            && !value.is_none(py)
        {
            py.import("pprint")?
                .getattr("pprint")?
                .call1((value.bind(py),))?;
        }
        Ok(())
    })
}
