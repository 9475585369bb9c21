use anyhow::{Context as AnyhowContext, Result};
use std::io::{self, BufRead, IsTerminal};
use std::sync::{Arc, Mutex};

use crate::Context;
use crate::engine::{PollingDriver, describe_prune};
use crate::ui;

/// A line typed on the terminal while running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Poll,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "p" | "poll" => Some(Input::Poll),
        "q" | "quit" | "exit" => Some(Input::Quit),
        _ => None,
    }
}

pub fn run(ctx: &Context) -> Result<()> {
    let (settings, mut engine) = super::build_engine(ctx)?;

    let (_init, pruned) = engine.initialize()?;
    let interval = settings.poll_interval();
    if !ctx.quiet {
        ui::info(&format!(
            "Mirroring {} categories from {} every {}s ({} objects known, {})",
            engine.selection().len(),
            settings.endpoint,
            interval.as_secs(),
            engine.tree().len(),
            describe_prune(&pruned)
        ));
    }

    let engine = Arc::new(Mutex::new(engine));
    let mut driver = PollingDriver::spawn(engine, interval);

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        // Non-interactive: poll until the process is terminated
        driver.wait();
        return Ok(());
    }

    if !ctx.quiet {
        ui::dim("p + Enter polls now, q + Enter quits");
    }
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        match parse_input(&line) {
            Some(Input::Poll) => driver.trigger(),
            Some(Input::Quit) => break,
            None if line.trim().is_empty() => {}
            None => ui::warn(&format!("Unknown input '{}'", line.trim())),
        }
    }

    driver.stop();
    if !ctx.quiet {
        ui::success(&format!("Stopped after {} cycles", driver.cycles()));
    }
    Ok(())
}
