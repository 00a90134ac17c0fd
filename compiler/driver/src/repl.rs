//! The REPL entry point.
//!
//! The interactive shell itself is a collaborator living outside of this
//! repository; the driver only forwards its options.

use std::process::ExitCode;

pub(crate) fn start(arguments: &[String]) -> ExitCode {
    let _ = arguments;
    eprintln!("error: no interactive frontend is configured in this build");
    ExitCode::FAILURE
}
