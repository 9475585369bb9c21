//! Command implementations
//!
//! Each subcommand lives in its own module; the helpers here turn the global
//! flags and the config file into settings, a selection, or a ready engine.

pub mod categories;
pub mod control;
pub mod once;
pub mod query;
pub mod run;
pub mod status;

use anyhow::{Context as AnyhowContext, Result};
use graphql::HttpTransport;
use reconcile::{Catalog, Selection};
use std::path::PathBuf;

use crate::Context;
use crate::catalog;
use crate::config::{self, Settings};
use crate::engine::Engine;
use crate::family;
use crate::store::JsonFileStore;

fn config_path(ctx: &Context) -> Result<PathBuf> {
    match &ctx.config {
        Some(path) => Ok(path.clone()),
        None => config::default_config_path(),
    }
}

/// Load the config file; commands that talk to the server need one.
pub fn load_settings(ctx: &Context) -> Result<Settings> {
    let path = config_path(ctx)?;
    Settings::load(&path).with_context(|| {
        format!(
            "A config file with at least `endpoint` is required (looked in {})",
            path.display()
        )
    })
}

/// Load the config file if there is one.
///
/// A missing default config is fine; a missing `--config` file is not.
pub fn try_load_settings(ctx: &Context) -> Result<Option<Settings>> {
    let path = config_path(ctx)?;
    if ctx.config.is_none() && !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(None);
    }
    Settings::load(&path).map(Some)
}

/// Categories from `--categories`, else the config file, else the defaults.
pub fn resolve_selection(catalog: &Catalog, ctx: &Context, settings: Option<&Settings>) -> Selection {
    let requested = if ctx.categories.is_empty() {
        settings.map_or(&[][..], |s| s.categories.as_slice())
    } else {
        ctx.categories.as_slice()
    };
    catalog.resolve_selection(requested)
}

/// Everything needed to poll the configured server
pub fn build_engine(ctx: &Context) -> Result<(Settings, Engine)> {
    let settings = load_settings(ctx)?;
    let catalog = catalog::unraid()?;
    let selection = resolve_selection(&catalog, ctx, Some(&settings));

    let api_key = settings.api_key(ctx.api_key.as_deref())?;
    let transport = HttpTransport::with_timeout(
        settings.endpoint.trim(),
        api_key,
        settings.request_timeout(),
    );
    let state_path = settings.state_path();
    let store = JsonFileStore::open(&state_path)
        .with_context(|| format!("Failed to open object store at {}", state_path.display()))?;

    log::debug!(
        "Endpoint {}, {} categories selected, state in {}",
        transport.endpoint(),
        selection.len(),
        state_path.display()
    );
    let engine = Engine::new(
        catalog,
        family::all(),
        Box::new(transport),
        Box::new(store),
        selection,
    );
    Ok((settings, engine))
}
