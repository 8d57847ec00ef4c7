// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! `tinycount.toml` loading.
//!
//! ```toml
//! [clock]
//! period_ns = 10000
//!
//! [counter]
//! input_sampling = "registered"
//! power_up_value = 0
//!
//! [trace]
//! artifact_directory = "artifacts"
//! vcd = "counter.vcd"
//! ```
//!
//! Every key is optional.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use snafu::{OptionExt, ResultExt, Whatever, whatever};
use tinycount_counter::{CounterConfig, InputSampling};
use tinycount_sim::SimRuntimeOptions;

use crate::TestbenchOptions;

pub const CONFIG_FILE_NAME: &str = "tinycount.toml";

/// Everything needed to run the counter's test sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub clock_period_ns: u64,
    pub counter: CounterConfig,
    pub artifact_directory: Utf8PathBuf,
    pub vcd: Option<Utf8PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            clock_period_ns: TestbenchOptions::default().clock_period_ns,
            counter: CounterConfig::default(),
            artifact_directory: SimRuntimeOptions::default().artifact_directory,
            vcd: None,
        }
    }
}

/// Parses an `input_sampling` value.
pub fn parse_sampling(value: &str) -> Result<InputSampling, Whatever> {
    match value {
        "registered" => Ok(InputSampling::Registered),
        "direct" => Ok(InputSampling::Direct),
        other => whatever!(
            "Unknown input sampling mode `{}`, expected `registered` or `direct`",
            other
        ),
    }
}

/// Walks up from `start` looking for a `tinycount.toml`.
pub fn search_for_config(mut start: Utf8PathBuf) -> Option<Utf8PathBuf> {
    loop {
        let candidate = start.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !start.pop() {
            return None;
        }
    }
}

fn table<'a>(
    root: &'a toml::Value,
    name: &str,
) -> Result<Option<&'a toml::Value>, Whatever> {
    match root.get(name) {
        Some(value) if value.is_table() => Ok(Some(value)),
        Some(_) => whatever!("[{}] in {} is not a table", name, CONFIG_FILE_NAME),
        None => Ok(None),
    }
}

fn integer(
    section: Option<&toml::Value>,
    section_name: &str,
    key: &str,
) -> Result<Option<i64>, Whatever> {
    match section.and_then(|section| section.get(key)) {
        Some(value) => value.as_integer().map(Some).whatever_context(format!(
            "{}.{} in {} is not an integer",
            section_name, key, CONFIG_FILE_NAME
        )),
        None => Ok(None),
    }
}

fn string<'a>(
    section: Option<&'a toml::Value>,
    section_name: &str,
    key: &str,
) -> Result<Option<&'a str>, Whatever> {
    match section.and_then(|section| section.get(key)) {
        Some(value) => value.as_str().map(Some).whatever_context(format!(
            "{}.{} in {} is not a string",
            section_name, key, CONFIG_FILE_NAME
        )),
        None => Ok(None),
    }
}

impl HarnessConfig {
    pub fn load(path: &Utf8Path) -> Result<Self, Whatever> {
        let contents = fs::read_to_string(path).whatever_context(format!(
            "Failed to read contents of {} at {}",
            CONFIG_FILE_NAME, path
        ))?;
        Self::from_toml_str(&contents)
            .whatever_context(format!("Invalid configuration at {}", path))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, Whatever> {
        let root: toml::Value = toml::from_str(contents).whatever_context(
            format!("Failed to parse {} as a valid TOML file", CONFIG_FILE_NAME),
        )?;

        let mut config = Self::default();

        let clock = table(&root, "clock")?;
        if let Some(period_ns) = integer(clock, "clock", "period_ns")? {
            if period_ns <= 0 || period_ns % 2 != 0 {
                whatever!(
                    "clock.period_ns must be a positive even number, got {}",
                    period_ns
                );
            }
            config.clock_period_ns = period_ns as u64;
        }

        let counter = table(&root, "counter")?;
        if let Some(sampling) = string(counter, "counter", "input_sampling")? {
            config.counter.sampling = parse_sampling(sampling)?;
        }
        if let Some(power_up_value) =
            integer(counter, "counter", "power_up_value")?
        {
            config.counter.power_up_value = u8::try_from(power_up_value)
                .whatever_context(format!(
                    "counter.power_up_value must be in 0..=255, got {}",
                    power_up_value
                ))?;
        }

        let trace = table(&root, "trace")?;
        if let Some(artifact_directory) =
            string(trace, "trace", "artifact_directory")?
        {
            config.artifact_directory = artifact_directory.into();
        }
        config.vcd = string(trace, "trace", "vcd")?.map(Utf8PathBuf::from);

        Ok(config)
    }

    pub fn runtime_options(&self, log: bool) -> SimRuntimeOptions {
        SimRuntimeOptions {
            artifact_directory: self.artifact_directory.clone(),
            log,
        }
    }

    pub fn testbench_options(&self) -> TestbenchOptions {
        TestbenchOptions {
            clock_period_ns: self.clock_period_ns,
            vcd: self.vcd.clone(),
            ..Default::default()
        }
    }
}
