//! Sitebake - static asset build pipeline
//!
//! This library builds a site's front-end assets:
//! - Bundle a CoffeeScript entry point (and required Jade templates) into one script
//! - Render Jade templates to HTML pages
//! - Render Stylus stylesheets to CSS
//!
//! The languages themselves are external capabilities (see [`transform`]);
//! a template or stylesheet that fails to compile gets its error written in
//! place of its output instead of stopping the build.

pub mod build;
pub mod cli;
pub mod config;
pub mod logging;
pub mod transform;
