use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{self, OnFailure};
use crate::{FIRMWARE_PACKAGE, TARGET};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking firmware builds...".cyan().bold());
    println!();

    let start = Instant::now();

    step::run(
        "Hardware target (STM32H743)",
        "cargo",
        &["check", "-p", FIRMWARE_PACKAGE, "--target", TARGET, "--features", "hardware"],
        OnFailure::Abort,
    )?;
    step::run(
        "Host build (drivers against mocks)",
        "cargo",
        &["check", "-p", FIRMWARE_PACKAGE, "--features", "std", "--all-targets"],
        OnFailure::Abort,
    )?;
    step::run(
        "Platform crate (no_std)",
        "cargo",
        &["check", "-p", "platform", "--target", TARGET, "--no-default-features"],
        OnFailure::Abort,
    )?;
    step::run(
        "Clippy",
        "cargo",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;
    if step::run("Formatting", "cargo", &["fmt", "--all", "--check"], OnFailure::Warn)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    println!(
        "{}",
        format!("✓ All checks completed in {:.2}s", start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();

    Ok(())
}
