//! version command - Print version information

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Execute the version command
pub fn execute() -> ExitCode {
    let formatter = Formatter::new();
    formatter.println(&banner());
    ExitCode::Success
}

fn banner() -> String {
    match option_env!("FERRY_BUILD_COMMIT") {
        Some(commit) => format!("ferry {} (git-{commit})", env!("CARGO_PKG_VERSION")),
        None => format!("ferry {}", env!("CARGO_PKG_VERSION")),
    }
}
