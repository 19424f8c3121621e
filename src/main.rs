//! Sitebake - Command-line tool for building scripts, HTML and CSS

use std::process::ExitCode;

use sitebake::cli;

fn main() -> ExitCode {
    cli::run()
}
