// Host tooling crate: unwrap/expect/panic acceptable outside the firmware.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod flash;
mod step;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Target triple of the STM32H743.
pub const TARGET: &str = "thumbv7em-none-eabihf";

/// Firmware package name.
pub const FIRMWARE_PACKAGE: &str = "mds-firmware";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "MDS peripheral board development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the firmware and flash it to the board via probe-rs
    Flash {
        /// Build and flash the release profile
        #[arg(short, long)]
        release: bool,
    },
    /// Check the hardware build, the host build, clippy and formatting
    Check,
    /// Run host tests (unit, integration and doc tests)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash { release } => flash::run(release),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}
