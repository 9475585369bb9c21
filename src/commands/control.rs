use anyhow::Result;

use crate::Context;
use crate::control::{ControlAction, ControlRequest, ControlTarget};
use crate::ui;

pub fn run(ctx: &Context, target: ControlTarget, action: ControlAction, id: &str) -> Result<()> {
    let request = ControlRequest::new(target, action, id)?;
    let (_settings, mut engine) = super::build_engine(ctx)?;
    engine.initialize()?;

    let report = engine.control(&request)?;
    if !ctx.quiet {
        ui::success(&format!("{action} sent to {target} '{id}'"));
    }
    super::once::print_report(ctx, &report);
    Ok(())
}
