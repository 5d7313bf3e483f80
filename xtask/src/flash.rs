use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

use crate::step::{self, OnFailure};
use crate::{FIRMWARE_PACKAGE, TARGET};

/// probe-rs chip name of the board's MCU.
const CHIP: &str = "STM32H743ZITx";

fn binary_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{TARGET}/{profile}/firmware")
}

pub fn run(release: bool) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!("{}", format!("🔨 Building firmware ({mode} mode)...").cyan().bold());
    println!();

    let mut build = vec![
        "build",
        "-p",
        FIRMWARE_PACKAGE,
        "--target",
        TARGET,
        "--features",
        "hardware",
    ];
    if release {
        build.push("--release");
    }
    step::run("Firmware build", "cargo", &build, OnFailure::Abort)?;

    show_binary_size(release);

    println!("{}", "📡 Flashing to STM32H743...".cyan().bold());
    let binary = binary_path(release);
    let flashed = step::run(
        "Flash",
        "probe-rs",
        &["run", &binary, "--chip", CHIP, "--probe-index", "0"],
        OnFailure::Abort,
    );
    flashed.context("check the probe connection and board power (cargo install probe-rs-tools)")?;

    println!("{}", "The demo is running on the board.".bold());
    println!(
        "   {}",
        format!("Use 'probe-rs attach --chip {CHIP}' to view RTT logs").dimmed()
    );
    println!();

    Ok(())
}

/// Print the section sizes if `rust-size` is installed.
fn show_binary_size(release: bool) {
    let output = Command::new("rust-size").arg(binary_path(release)).arg("-A").output();

    if let Ok(out) = output {
        if out.status.success() {
            println!("{}", "📊 Binary size:".cyan());
            for line in String::from_utf8_lossy(&out.stdout).lines() {
                println!("   {}", line.dimmed());
            }
            println!();
        }
    }
}
