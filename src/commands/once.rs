use anyhow::Result;

use crate::Context;
use crate::engine::{CycleReport, describe_prune};
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (_settings, mut engine) = super::build_engine(ctx)?;

    let (_init, pruned) = engine.initialize()?;
    if !pruned.is_empty() && !ctx.quiet {
        ui::info(&format!("Deselected categories {}", describe_prune(&pruned)));
    }

    let report = engine.poll_once()?;
    print_report(ctx, &report);
    Ok(())
}

/// Print a cycle summary, with per-family detail when verbose
pub fn print_report(ctx: &Context, report: &CycleReport) {
    if ctx.quiet {
        return;
    }
    let summary = format!("Cycle complete: {report}");
    if report.is_success() {
        ui::success(&summary);
    } else {
        ui::warn(&summary);
    }

    if ctx.verbose == 0 {
        return;
    }
    for family in &report.families {
        ui::kv(
            &family.family,
            &format!(
                "{} members, {} created, {} removed",
                family.members,
                family.created.len(),
                family.removed.len()
            ),
        );
    }
    if let Some(error) = &report.flush_error {
        ui::kv("flush", error);
    }
}
