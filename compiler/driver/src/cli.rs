//! The command-line interface.

use clap::{builder::ValueParser, Arg, ArgAction};
use std::{path::PathBuf, process::ExitCode};

mod subcommand {
    pub(super) const COMPILE: &str = "compile";
    pub(super) const REPL: &str = "repl";
    pub(super) const SERVE: &str = "serve";
}

mod option {
    pub(super) const LIBRARY: &str = "library";
    pub(super) const ASCII: &str = "ascii";
    pub(super) const PRETTY_STAGE: &str = "pretty-stage";
    pub(super) const PRETTY_FORMAT: &str = "pretty-format";
    pub(super) const PRETTY_DIR: &str = "pretty-dir";
    pub(super) const TRACE: &str = "trace";
    pub(super) const MODULE_PATH: &str = "module-path";
}

mod argument {
    pub(super) const PATH: &str = "PATH";
    pub(super) const ARGUMENTS: &str = "ARGUMENTS";
}

pub(crate) enum Command {
    Compile {
        path: PathBuf,
        options: CompileOptions,
    },
    Repl {
        arguments: Vec<String>,
    },
    Serve,
}

pub(crate) struct CompileOptions {
    /// Treat the target as a library root instead of a single file.
    pub(crate) library: bool,
    pub(crate) ascii: bool,
    pub(crate) pretty: Option<PrettyOptions>,
    pub(crate) trace: bool,
    pub(crate) module_paths: Vec<PathBuf>,
}

pub(crate) struct PrettyOptions {
    pub(crate) stage: String,
    pub(crate) format: String,
    pub(crate) dir: PathBuf,
}

pub(crate) fn arguments() -> Result<Command, ExitCode> {
    let compile_arguments = [
        Arg::new(argument::PATH)
            .required(true)
            .value_parser(ValueParser::path_buf())
            .help("The path to a source file, or to a library root with ‘--library’"),
        Arg::new(option::LIBRARY)
            .long("library")
            .action(ArgAction::SetTrue)
            .help("Treat the target as a library root"),
        Arg::new(option::ASCII)
            .long("ascii")
            .action(ArgAction::SetTrue)
            .help("Restrict the output to ASCII"),
        Arg::new(option::PRETTY_STAGE)
            .long("pretty-stage")
            .value_name("STAGE")
            .help("Emit pretty artifacts of the given compiler stage"),
        Arg::new(option::PRETTY_FORMAT)
            .long("pretty-format")
            .value_name("FORMAT")
            .help("The format of the pretty artifacts"),
        Arg::new(option::PRETTY_DIR)
            .long("pretty-dir")
            .value_name("DIR")
            .value_parser(ValueParser::path_buf())
            .help("Where to place the pretty artifacts"),
        Arg::new(option::TRACE)
            .long("trace")
            .action(ArgAction::SetTrue)
            .help("Dump a structured trace of the compilation"),
        Arg::new(option::MODULE_PATH)
            .long("module-path")
            .value_name("DIR")
            .action(ArgAction::Append)
            .value_parser(ValueParser::path_buf())
            .help("An additional module root. May be given several times"),
    ];

    let matches = clap::Command::new("aya")
        .bin_name("aya")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A cubical proof assistant")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands([
            clap::Command::new(subcommand::COMPILE)
                .visible_alias("c")
                .about("Compile the given source file or library")
                .args(compile_arguments),
            clap::Command::new(subcommand::REPL)
                .about("Start the interactive shell")
                .arg(
                    Arg::new(argument::ARGUMENTS)
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true)
                        .help("Options passed through to the REPL"),
                ),
            clap::Command::new(subcommand::SERVE).about("Launch an LSP server"),
        ])
        .try_get_matches();

    let matches = match matches {
        Ok(matches) => matches,
        Err(error) => {
            let code = if error.use_stderr() {
                // covers “no action specified” among other usage errors
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = error.print();
            return Err(code);
        }
    };

    Ok(match matches.subcommand().unwrap() {
        (subcommand::COMPILE, matches) => {
            let pretty = matches
                .get_one::<String>(option::PRETTY_STAGE)
                .cloned()
                .map(|stage| PrettyOptions {
                    stage,
                    format: matches
                        .get_one::<String>(option::PRETTY_FORMAT)
                        .cloned()
                        .unwrap_or_else(|| "text".into()),
                    dir: matches
                        .get_one::<PathBuf>(option::PRETTY_DIR)
                        .cloned()
                        .unwrap_or_else(|| ".".into()),
                });

            Command::Compile {
                path: matches.get_one::<PathBuf>(argument::PATH).cloned().unwrap(),
                options: CompileOptions {
                    library: matches.get_flag(option::LIBRARY),
                    ascii: matches.get_flag(option::ASCII),
                    pretty,
                    trace: matches.get_flag(option::TRACE),
                    module_paths: matches
                        .get_many::<PathBuf>(option::MODULE_PATH)
                        .into_iter()
                        .flatten()
                        .cloned()
                        .collect(),
                },
            }
        }
        (subcommand::REPL, matches) => Command::Repl {
            arguments: matches
                .get_many::<String>(argument::ARGUMENTS)
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
        },
        (subcommand::SERVE, _) => Command::Serve,
        _ => unreachable!(),
    })
}
