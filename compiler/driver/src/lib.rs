//! The compiler driver.

use crate::cli::{Command, CompileOptions};
use build::{CompileState, DefaultAdvisor, ImportScanner, LoadOutcome, Orchestrator};
use colored::Colorize;
use diagnostics::Severity;
use std::{path::Path, process::ExitCode};

mod cli;
mod repl;

pub fn main() -> ExitCode {
    let command = match cli::arguments() {
        Ok(command) => command,
        Err(code) => return code,
    };

    match command {
        Command::Compile { path, options } => compile(&path, &options),
        Command::Repl { arguments } => repl::start(&arguments),
        Command::Serve => {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(error) => {
                    eprintln!("error: cannot start the async runtime: {error}");
                    return ExitCode::FAILURE;
                }
            };
            runtime.block_on(server::serve());
            ExitCode::SUCCESS
        }
    }
}

fn compile(path: &Path, options: &CompileOptions) -> ExitCode {
    let mut workspace = Orchestrator::new(Box::new(ImportScanner), Box::new(DefaultAdvisor));

    for module_path in &options.module_paths {
        if let Err(error) = workspace.register_library(module_path) {
            eprintln!("error: {error}");
        }
    }

    if options.library {
        if let Err(error) = workspace.register_library(path) {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    } else {
        // a loose file gets an ad-hoc single-file library
        workspace.file_created(path.to_owned());
    }

    let outcomes = workspace.reload();

    let mut failed = false;
    for outcome in &outcomes {
        for batch in &outcome.published {
            for diagnostic in &batch.diagnostics {
                if matches!(diagnostic.severity, Severity::Bug | Severity::Error) {
                    failed = true;
                }
                eprintln!("{}", diagnostic.format(None));
                eprintln!();
            }
        }
        failed |= outcome
            .files
            .iter()
            .any(|(_, state)| *state != CompileState::TypeChecked);
    }

    if options.trace {
        trace(&outcomes);
    }

    if let Some(pretty) = &options.pretty {
        if let Err(error) = emit_pretty_artifacts(&outcomes, pretty) {
            eprintln!("error: cannot emit the pretty artifacts: {error}");
            failed = true;
        }
    }

    let verdict = match (failed, options.ascii) {
        (false, false) => format!("{}", "✓ all modules are checked".green()),
        (false, true) => format!("{}", "ok: all modules are checked".green()),
        (true, false) => format!("{}", "✗ compilation failed".red()),
        (true, true) => format!("{}", "error: compilation failed".red()),
    };
    eprintln!("{verdict}");

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// A structured dump of the pass: per library, per file, the reached state.
fn trace(outcomes: &[LoadOutcome]) {
    for outcome in outcomes {
        eprintln!("trace: library {}", outcome.library);
        for (path, state) in &outcome.files {
            eprintln!("trace:   {} {state:?}", path.display());
        }
    }
}

fn emit_pretty_artifacts(
    outcomes: &[LoadOutcome],
    pretty: &cli::PrettyOptions,
) -> std::io::Result<()> {
    use std::io::Write;

    std::fs::create_dir_all(&pretty.dir)?;

    for outcome in outcomes {
        let target = pretty
            .dir
            .join(&outcome.library)
            .with_extension(&pretty.format);
        let mut file = std::fs::File::create(target)?;

        writeln!(file, "library: {}", outcome.library)?;
        writeln!(file, "stage: {}", pretty.stage)?;
        for (path, state) in &outcome.files {
            writeln!(file, "{} {state:?}", path.display())?;
        }
    }

    Ok(())
}
