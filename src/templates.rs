//! Template loading and rendering using Tera.
//!
//! The page templates are embedded in the binary. A templates directory can
//! override any of them by providing a file with the same name.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tera::{Context, Tera};

/// The task list page.
pub const PAGE_TEMPLATE: &str = "page.html.tera";

/// The generic failure page.
pub const ERROR_TEMPLATE: &str = "error.html.tera";

/// Template name suffixes whose output is HTML-escaped.
const AUTOESCAPE_SUFFIXES: [&str; 2] = [".html.tera", ".html"];

/// Embedded default templates for fallback when files don't exist.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("base.html.tera", include_str!("../templates/base.html.tera"));
    m.insert(PAGE_TEMPLATE, include_str!("../templates/page.html.tera"));
    m.insert(ERROR_TEMPLATE, include_str!("../templates/error.html.tera"));
    m
});

/// Global template engine with caching.
static TERA: Lazy<RwLock<Option<Tera>>> = Lazy::new(|| RwLock::new(None));

/// Initialize the template engine, loading overrides from `templates_dir`.
///
/// If the directory is `None` or doesn't exist, only embedded templates are
/// used.
///
/// # Errors
///
/// Returns an error if the templates directory contains invalid templates,
/// or if an embedded template fails to parse.
pub fn init_templates(templates_dir: Option<&Path>) -> Result<()> {
    let mut tera = Tera::default();

    if let Some(dir) = templates_dir.filter(|d| d.exists()) {
        let glob_pattern = format!("{}/**/*.tera", dir.display());
        tera = Tera::new(&glob_pattern).map_err(|e| {
            Error::Template(format!("Failed to load templates from {}: {e}", dir.display()))
        })?;
    }

    let missing: Vec<(&str, &str)> = EMBEDDED_TEMPLATES
        .iter()
        .filter(|(name, _)| tera.get_template(name).is_err())
        .map(|(name, content)| (*name, *content))
        .collect();
    tera.add_raw_templates(missing)
        .map_err(|e| Error::Template(format!("Invalid embedded template: {e}")))?;
    tera.autoescape_on(AUTOESCAPE_SUFFIXES.to_vec());

    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = Some(tera);

    Ok(())
}

/// Render a template with the given context.
///
/// Templates are lazy-loaded with embedded defaults only if
/// [`init_templates`] has not been called.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render(name: &str, context: &Context) -> Result<String> {
    let needs_init = TERA.read().map_err(|e| Error::Template(e.to_string()))?.is_none();

    if needs_init {
        init_templates(None)?;
    }

    let guard = TERA.read().map_err(|e| Error::Template(e.to_string()))?;
    let tera = guard.as_ref().ok_or_else(|| Error::Template("Templates not initialized".into()))?;
    let rendered = tera
        .render(name, context)
        .map_err(|e| Error::Template(format!("Failed to render template {name}: {e}")))?;
    drop(guard);

    Ok(rendered)
}

/// Reset the template cache, forcing re-initialization on next use.
///
/// # Errors
///
/// Returns an error if the write lock cannot be acquired.
pub fn reset_cache() -> Result<()> {
    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = None;
    Ok(())
}
