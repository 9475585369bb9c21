use anyhow::Result;

use crate::Context;
use crate::catalog;
use crate::ui;

/// Print the composed query without contacting the server
pub fn run(ctx: &Context) -> Result<()> {
    let settings = super::try_load_settings(ctx)?;
    let catalog = catalog::unraid()?;
    let selection = super::resolve_selection(&catalog, ctx, settings.as_ref());

    match catalog.compose_query(&selection) {
        Some(query) => println!("{query}"),
        None => ui::warn("The selection composes no query"),
    }
    Ok(())
}
