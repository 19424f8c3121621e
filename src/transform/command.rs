//! Compilers backed by external command-line tools.
//!
//! Each tool reads the source on stdin and writes the result to stdout.
//! A tool that is not installed is simply not detected, which leaves the
//! corresponding capability absent.

use super::{
    ClientTemplate, ScriptCompiler, StyleOptions, StylesheetCompiler, TemplateCompiler,
    TransformError,
};
use std::env;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

/// Placeholder in tool arguments replaced by the source file path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// A program plus its argument template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name (looked up on `PATH`) or path
    pub program: String,
    /// Arguments; `{file}` is substituted with the source path
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Arguments with the file placeholder substituted.
    pub fn args_for(&self, file: &Path) -> Vec<String> {
        let file = file.to_string_lossy();
        self.args.iter().map(|a| a.replace(FILE_PLACEHOLDER, &file)).collect()
    }

    /// Resolve the program to an executable path, if installed.
    pub fn locate(&self) -> Option<PathBuf> {
        find_executable(&self.program)
    }

    /// Run the tool with `input` on stdin and return its stdout.
    ///
    /// A non-zero exit becomes a [`TransformError`] carrying the tool's stderr.
    pub fn run(&self, input: &str, file: &Path, extra: &[String]) -> Result<String, TransformError> {
        let mut child = Command::new(&self.program)
            .args(self.args_for(file))
            .args(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TransformError::new(format!("Error: failed to run {}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransformError::new(format!("Error: no stdin for {}", self.program)))?;
        let input = input.to_owned();
        // Feed stdin from a separate thread so a large stdout cannot deadlock us
        let writer = thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| TransformError::new(format!("Error: {} failed: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("Error: {} exited with {} for {}", self.program, output.status, file.display())
            } else {
                stderr
            };
            return Err(TransformError::new(message));
        }

        match writer.join() {
            Ok(Ok(())) => {}
            // The tool may legitimately stop reading early
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(TransformError::new(format!(
                    "Error: writing to {} failed: {}",
                    self.program, e
                )))
            }
            Err(_) => {
                return Err(TransformError::new(format!(
                    "Error: stdin writer for {} panicked",
                    self.program
                )))
            }
        }

        String::from_utf8(output.stdout).map_err(|e| {
            TransformError::new(format!("Error: {} produced invalid UTF-8: {}", self.program, e))
        })
    }
}

/// Find an executable by name on `PATH`, or check an explicit path.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
        #[cfg(windows)]
        {
            for ext in ["exe", "cmd", "bat"] {
                let with_ext = full.with_extension(ext);
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
        None
    })
}

/// CoffeeScript compiler driven through the `coffee` CLI.
#[derive(Debug, Clone)]
pub struct CommandScriptCompiler {
    command: CommandSpec,
}

impl CommandScriptCompiler {
    /// Wrap a command without checking that it is installed.
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }

    /// Return a compiler only if the command is installed.
    pub fn detect(command: CommandSpec) -> Option<Self> {
        command.locate().map(|_| Self::new(command))
    }
}

impl ScriptCompiler for CommandScriptCompiler {
    fn compile(&self, source: &str, file: &Path) -> Result<String, TransformError> {
        self.command.run(source, file, &[])
    }
}

/// Jade renderer driven through the `jade` CLI.
///
/// Client functions come back without inlined runtime helpers, so the
/// generated modules call the global `jade` object and need the jade
/// runtime (`runtime.js`) loaded on the page before them.
#[derive(Debug, Clone)]
pub struct CommandTemplateCompiler {
    render: CommandSpec,
    client: Option<CommandSpec>,
}

impl CommandTemplateCompiler {
    /// Wrap render (and optional client) commands without checking installation.
    pub fn new(render: CommandSpec, client: Option<CommandSpec>) -> Self {
        Self { render, client }
    }

    /// Return a compiler only if the render command is installed.
    pub fn detect(render: CommandSpec, client: Option<CommandSpec>) -> Option<Self> {
        render.locate().map(|_| Self::new(render, client))
    }
}

impl TemplateCompiler for CommandTemplateCompiler {
    fn render(&self, source: &str, file: &Path) -> Result<String, TransformError> {
        self.render.run(source, file, &[])
    }

    fn compile_client(&self, source: &str, file: &Path) -> Result<ClientTemplate, TransformError> {
        let client = self.client.as_ref().ok_or_else(|| {
            TransformError::new(format!(
                "Error: no client template command configured for {}",
                file.display()
            ))
        })?;
        let function = client.run(source, file, &[])?;
        Ok(ClientTemplate { function: function.trim().to_string(), runtime: None })
    }
}

/// Stylus renderer driven through the `stylus` CLI.
#[derive(Debug, Clone)]
pub struct CommandStylesheetCompiler {
    command: CommandSpec,
}

impl CommandStylesheetCompiler {
    /// Wrap a command without checking that it is installed.
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }

    /// Return a compiler only if the command is installed.
    pub fn detect(command: CommandSpec) -> Option<Self> {
        command.locate().map(|_| Self::new(command))
    }
}

impl CommandStylesheetCompiler {
    /// Check that the tool can load `plugin` by rendering an empty sheet with it.
    pub fn supports_plugin(&self, plugin: &str) -> bool {
        self.command.run("", Path::new(""), &use_args(plugin)).is_ok()
    }
}

impl StylesheetCompiler for CommandStylesheetCompiler {
    fn render(&self, source: &str, options: &StyleOptions) -> Result<String, TransformError> {
        let extra = match &options.mixins {
            Some(plugin) => use_args(plugin),
            None => vec![],
        };
        self.command.run(source, &options.filename, &extra)
    }
}

fn use_args(plugin: &str) -> Vec<String> {
    vec!["--use".to_string(), plugin.to_string()]
}
