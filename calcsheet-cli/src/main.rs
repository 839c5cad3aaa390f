//! `calcsheet` CLI: run a calculation sheet and write the rendered HTML.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use calcsheet_core::{Interpreter, Settings, Severity};

#[derive(Parser)]
#[command(version, about = "Run a calculation sheet and render it to HTML")]
struct Cli {
    /// Sheet file to run
    file: Option<PathBuf>,

    /// Run inline sheet text instead of reading a file
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Write HTML to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render the sheet as an input form without calculating
    #[arg(long)]
    no_calc: bool,

    /// Stop at the first `#pause` or `#input` instead of resuming
    #[arg(long)]
    no_resume: bool,

    /// JSON settings file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Line ids and an error summary in the output
    #[arg(long)]
    debug: bool,

    /// Attach XML renderings of equations as `data-xml` attributes
    #[arg(long)]
    xml: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("calcsheet=info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(&Cli::parse()) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

/// Returns `false` when the sheet was aborted.
fn run(cli: &Cli) -> Result<bool> {
    let source = read_source(cli)?;
    let mut interp = Interpreter::new();
    if let Some(path) = &cli.settings {
        interp.settings = load_settings(path)?;
    }
    interp.debug = cli.debug;

    let calculate = !cli.no_calc;
    let mut outcome = interp.parse(&source, calculate, cli.xml);
    let mut passes = 1;
    while outcome.is_ok() && interp.is_paused() && !cli.no_resume {
        tracing::info!(pass = passes, "sheet paused, resuming");
        outcome = interp.parse(&source, true, cli.xml);
        passes += 1;
    }
    tracing::debug!(passes, "sheet finished");

    print_diagnostics(&interp);
    write_output(cli, interp.html_result())?;
    Ok(outcome.is_ok())
}

fn read_source(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.eval {
        return Ok(text.replace("\\n", "\n"));
    }
    if let Some(file) = &cli.file {
        return fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()));
    }
    bail!("no input file or expression specified")
}

fn load_settings(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    Settings::from_json(&text).with_context(|| format!("invalid settings in {}", path.display()))
}

fn print_diagnostics(interp: &Interpreter) {
    for err in &interp.errors {
        match err.severity {
            Severity::Info => eprintln!("{err}"),
            Severity::Warning => eprintln!("Warning: {err}"),
            _ => eprintln!("Error: {err}"),
        }
    }
}

fn write_output(cli: &Cli, html: &str) -> Result<()> {
    match &cli.output {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("cannot write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
