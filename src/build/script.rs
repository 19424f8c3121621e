//! Script bundle routine.
//!
//! Configures the bundler with the available source transforms and writes
//! the single combined script. Unlike the per-file routines, a failure
//! here fails the whole routine: there is only one artifact.

use crate::build::task::write_artifact;
use crate::build::{
    BuildContext, BuildError, Capabilities, Dispatcher, FileOutcome, FileStatus, Locator,
    RoutineKind, RoutineReport, COFFEE_EXT, JADE_EXT,
};
use crate::transform::{
    BundleOptions, ExtensionHandler, RelaxHandler, ScriptCompiler, TemplateCompiler,
    TransformError,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info};

/// Build the script bundle.
///
/// A no-op (skipped report) unless a bundler, an entry locator and an
/// output path are all present.
pub fn build_script(ctx: &BuildContext) -> Result<RoutineReport, BuildError> {
    let start = Instant::now();
    let config = ctx.config();
    let caps = ctx.capabilities();

    let Some(bundler) = &caps.bundler else {
        return Ok(skip("no bundler available"));
    };
    let (Some(locator), Some(output)) = (&config.script_in, &config.script_out) else {
        return Ok(skip("no script input or output configured"));
    };

    debug!("Building script {} -> {}", locator.path.display(), output.display());
    let mut report = RoutineReport::new(RoutineKind::Script);

    if ctx.is_dry_run() {
        report.add_file(FileOutcome::new(locator.path.clone(), output.clone(), FileStatus::Planned));
        return Ok(report.with_duration(start.elapsed()));
    }

    let unresolved = Arc::new(Mutex::new(Vec::new()));
    let options = bundle_options(caps, locator, Arc::clone(&unresolved));

    let bundle = bundler.bundle(&options).map_err(BuildError::Bundle)?;
    write_artifact(output, &bundle)?;
    info!("Built script @ {}", output.display());

    report.diagnostics = unresolved.lock().map(|mut list| std::mem::take(&mut *list)).unwrap_or_default();
    report.add_file(FileOutcome::new(locator.path.clone(), output.clone(), FileStatus::Built));
    Ok(report.with_duration(start.elapsed()))
}

fn skip(reason: &str) -> RoutineReport {
    debug!("Skipping script: {}", reason);
    RoutineReport::skipped(RoutineKind::Script, reason)
}

/// Configure the bundler for one entry point.
///
/// Unresolved requires are logged and appended to `unresolved`; they do not
/// stop the bundler.
pub fn bundle_options(
    caps: &Capabilities,
    locator: &Locator,
    unresolved: Arc<Mutex<Vec<String>>>,
) -> BundleOptions {
    let extensions: BTreeMap<String, ExtensionHandler> = script_handlers(caps)
        .into_entries()
        .map(|(ext, handler)| (format!(".{}", ext), handler))
        .collect();

    let relax: RelaxHandler = Arc::new(move |module: &str, from: &Path| {
        let message = format!("Could not find module `{}` from `{}`", module, from.display());
        error!("{}", message);
        if let Ok(mut list) = unresolved.lock() {
            list.push(message);
        }
    });

    let mut requires = BTreeMap::new();
    requires.insert(locator.path.to_string_lossy().into_owned(), locator.alias.clone());

    BundleOptions { cwd: PathBuf::from("."), extensions, relax, requires }
}

/// Source transforms the bundler can use, by extension.
///
/// CoffeeScript is registered only with a script compiler, Jade modules
/// only with a template compiler. Anything else stays unresolvable.
pub fn script_handlers(caps: &Capabilities) -> Dispatcher<ExtensionHandler> {
    let mut handlers = Dispatcher::new();
    if let Some(compiler) = &caps.script {
        handlers.register(COFFEE_EXT, coffee_handler(Arc::clone(compiler)));
    }
    if let Some(compiler) = &caps.templates {
        handlers.register(JADE_EXT, template_module_handler(Arc::clone(compiler)));
    }
    handlers
}

fn coffee_handler(compiler: Arc<dyn ScriptCompiler>) -> ExtensionHandler {
    Arc::new(move |file: &Path| {
        let source = fs::read_to_string(file).map_err(|e| TransformError::unreadable(file, e))?;
        compiler.compile(&source, file)
    })
}

fn template_module_handler(compiler: Arc<dyn TemplateCompiler>) -> ExtensionHandler {
    Arc::new(move |file: &Path| {
        let source = fs::read_to_string(file).map_err(|e| TransformError::unreadable(file, e))?;
        Ok(compiler.compile_client(&source, file)?.into_module_source())
    })
}
