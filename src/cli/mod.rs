//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Sitebake - build scripts, HTML and CSS from CoffeeScript, Jade and Stylus
#[derive(Parser)]
#[command(name = "bake")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean previous outputs, then build the script bundle, templates and stylesheets
    Build {
        #[command(flatten)]
        paths: PathArgs,

        /// Delete previous outputs before building (default)
        #[arg(long, overrides_with = "no_clean")]
        clean: bool,

        /// Keep previous outputs
        #[arg(long)]
        no_clean: bool,

        /// Fail broken files instead of writing the error in their place
        #[arg(long)]
        strict: bool,

        /// Show what would be built without building
        #[arg(long)]
        dry_run: bool,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,

        /// Show debug output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete previously generated outputs
    Clean {
        #[command(flatten)]
        paths: PathArgs,

        /// Show debug output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Input and output locations. An empty value disables the entry.
#[derive(Args, Debug, Default, Clone)]
pub struct PathArgs {
    /// Script entry point as `path` or `path=alias` [default: ./scripts=app]
    #[arg(long, value_name = "LOCATOR")]
    pub script_in: Option<String>,

    /// Script bundle output file [default: ./scripts/app.js]
    #[arg(long, value_name = "FILE")]
    pub script_out: Option<PathBuf>,

    /// Jade template directory [default: ./templates/jade]
    #[arg(long, value_name = "DIR")]
    pub jade_in: Option<PathBuf>,

    /// HTML output directory [default: ./templates/html]
    #[arg(long, value_name = "DIR")]
    pub jade_out: Option<PathBuf>,

    /// Stylus directory [default: ./styles/stylus]
    #[arg(long, value_name = "DIR")]
    pub stylus_in: Option<PathBuf>,

    /// CSS output directory [default: ./styles/css]
    #[arg(long, value_name = "DIR")]
    pub stylus_out: Option<PathBuf>,

    /// Path to bake.toml (searched upward from the working directory by default)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { paths, clean, no_clean, strict, dry_run, json, verbose } => {
            let clean = match (clean, no_clean) {
                (_, true) => Some(false),
                (true, false) => Some(true),
                (false, false) => None,
            };
            let options = build::BuildOptions { clean, strict, dry_run, json };
            build::run_build(&paths, &options, verbose)
        }
        Commands::Clean { paths, verbose } => build::run_clean(&paths, verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "bake",
            "build",
            "--script-in",
            "./client=main",
            "--jade-out",
            "public",
            "--no-clean",
            "--strict",
        ])
        .unwrap();

        match cli.command {
            Commands::Build { paths, no_clean, strict, dry_run, .. } => {
                assert_eq!(paths.script_in.as_deref(), Some("./client=main"));
                assert_eq!(paths.jade_out, Some(PathBuf::from("public")));
                assert!(no_clean);
                assert!(strict);
                assert!(!dry_run);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_parse_clean() {
        let cli = Cli::try_parse_from(["bake", "clean", "--stylus-out", "out/css"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Clean { paths: PathArgs { stylus_out: Some(_), .. }, .. }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["bake", "build", "--watch"]).is_err());
    }
}
