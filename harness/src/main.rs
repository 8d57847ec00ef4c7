// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::{env, time::Instant};

use argh::FromArgs;
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use snafu::{ResultExt, Whatever, whatever};
use tinycount_counter::CounterUnit;
use tinycount_harness::{
    Testbench,
    config::{HarnessConfig, parse_sampling, search_for_config},
    scenario::PHASES,
};
use tinycount_sim::SimRuntime;

/// Run the test sequence of the 8-bit counter peripheral
#[derive(FromArgs)]
struct TinycountCommand {
    #[argh(subcommand)]
    subcommand: Subcommand,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Subcommand {
    Run(RunSubcommand),
    Check(CheckSubcommand),
}

/// run the counter test sequence
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunSubcommand {
    /// path to a tinycount.toml; searched for upward from the current
    /// directory by default
    #[argh(option, short = 'c')]
    config: Option<Utf8PathBuf>,

    /// trace every port to this VCD file under the artifact directory
    #[argh(option)]
    vcd: Option<Utf8PathBuf>,

    /// input sampling mode, `registered` or `direct`
    #[argh(option)]
    sampling: Option<String>,
}

/// check a tinycount.toml without running anything
#[derive(FromArgs)]
#[argh(subcommand, name = "check")]
struct CheckSubcommand {
    /// path to a tinycount.toml; searched for upward from the current
    /// directory by default
    #[argh(option, short = 'c')]
    config: Option<Utf8PathBuf>,
}

fn load_config(path: Option<Utf8PathBuf>) -> Result<HarnessConfig, Whatever> {
    let path = match path {
        Some(path) => Some(path),
        None => search_for_config(
            env::current_dir()
                .whatever_context("Failed to get current directory")?
                .try_into()
                .whatever_context(
                    "Failed to convert current directory to UTF-8",
                )?,
        ),
    };

    match path {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            HarnessConfig::load(&path)
        }
        None => {
            log::info!("No configuration file found, using defaults");
            Ok(HarnessConfig::default())
        }
    }
}

fn run(options: RunSubcommand, log: bool) -> Result<(), Whatever> {
    let mut config = load_config(options.config)?;
    if let Some(sampling) = &options.sampling {
        config.counter.sampling = parse_sampling(sampling)?;
    }
    if options.vcd.is_some() {
        config.vcd = options.vcd;
    }

    let runtime = SimRuntime::new(config.runtime_options(log))?;
    let mut testbench = Testbench::<CounterUnit>::new(
        &runtime,
        &config.counter,
        config.testbench_options(),
    )?;

    let start = Instant::now();
    for (phase, run_phase) in PHASES {
        eprintln!("{} {}", "     Running".bold().cyan(), phase);
        if let Err(error) = run_phase(&mut testbench) {
            eprintln!("{} {}", "      Failed".bold().red(), phase);
            return Err(error).whatever_context(format!("Phase `{phase}` failed"));
        }
        eprintln!(
            "{} {} ({} ns simulated)",
            "      Passed".bold().green(),
            phase,
            testbench.time_ns()
        );
    }

    let counter = testbench
        .finish()
        .whatever_context("Failed to finish test bench")?;
    let duration = start.elapsed();
    eprintln!(
        "{} {} phases in {}.{:02}s, final count {:#04x}",
        "    Finished".bold().green(),
        PHASES.len(),
        duration.as_secs(),
        duration.subsec_millis() / 10,
        counter.value()
    );
    if let Some(vcd) = &config.vcd {
        eprintln!(
            "{} {}",
            "       Trace".bold().green(),
            config.artifact_directory.join(vcd)
        );
    }

    Ok(())
}

fn check(options: CheckSubcommand) -> Result<(), Whatever> {
    let config = load_config(options.config)?;
    if config.artifact_directory.is_file() {
        whatever!(
            "Artifact directory {} exists but is a file",
            config.artifact_directory
        );
    }
    println!("{config:#?}");
    Ok(())
}

#[snafu::report]
fn main() -> Result<(), Whatever> {
    let log = env::var("RUST_LOG").is_ok();
    if log {
        env_logger::init();
    }

    let command: TinycountCommand = argh::from_env();
    match command.subcommand {
        Subcommand::Run(options) => run(options, log),
        Subcommand::Check(options) => check(options),
    }
}
