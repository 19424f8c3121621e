//! Build pipeline module for sitebake
//!
//! Turns CoffeeScript, Jade and Stylus sources into a script bundle, HTML
//! pages and CSS files.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Clean**: Delete outputs of a previous run (best effort)
//! - **Script**: Bundle the entry point into a single script
//! - **Templates**: Render every `.jade` file to `.html`
//! - **Stylesheets**: Render every `.styl` file to `.css`, concurrently
//!
//! # Example
//!
//! ```ignore
//! use sitebake::build::{BuildConfig, BuildContext, BuildPipeline};
//! use sitebake::config::{capabilities_from, load_config};
//!
//! let config = load_config(None)?;
//! let build = BuildConfig::resolve(&config, &project_root)?;
//! let context = BuildContext::new(build, capabilities_from(&config.tools));
//!
//! let result = BuildPipeline::new(context).build().await;
//! println!("{}", result.summary());
//! ```

pub mod clean;
pub mod context;
pub mod discovery;
pub mod dispatch;
pub mod locator;
pub mod pipeline;
pub mod result;
pub mod script;
pub mod styles;
pub mod task;
pub mod templates;

pub use clean::*;
pub use context::*;
pub use discovery::*;
pub use dispatch::*;
pub use locator::*;
pub use pipeline::*;
pub use result::*;
pub use script::*;
pub use styles::*;
pub use task::*;
pub use templates::*;
