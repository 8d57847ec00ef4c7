// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::{env, fs, process};

use camino::Utf8PathBuf;
use snafu::{OptionExt, ResultExt, Whatever};
use tinycount_counter::InputSampling;
use tinycount_harness::config::{
    CONFIG_FILE_NAME, HarnessConfig, parse_sampling, search_for_config,
};

#[test]
#[snafu::report]
fn empty_file_is_all_defaults() -> Result<(), Whatever> {
    let config = HarnessConfig::from_toml_str("")?;
    assert_eq!(config, HarnessConfig::default());
    assert_eq!(config.clock_period_ns, 10_000);
    assert_eq!(config.counter.sampling, InputSampling::Registered);
    assert_eq!(config.artifact_directory, "artifacts");
    assert_eq!(config.vcd, None);
    Ok(())
}

#[test]
#[snafu::report]
fn reads_every_section() -> Result<(), Whatever> {
    let config = HarnessConfig::from_toml_str(
        r#"
        [clock]
        period_ns = 20

        [counter]
        input_sampling = "direct"
        power_up_value = 255

        [trace]
        artifact_directory = "out"
        vcd = "run.vcd"
        "#,
    )?;
    assert_eq!(config.clock_period_ns, 20);
    assert_eq!(config.counter.sampling, InputSampling::Direct);
    assert_eq!(config.counter.power_up_value, 0xff);
    assert_eq!(config.artifact_directory, "out");
    assert_eq!(config.vcd.as_deref(), Some("run.vcd".into()));

    let options = config.testbench_options();
    assert_eq!(options.clock_period_ns, 20);
    assert_eq!(options.clock_port, "clk");
    assert!(config.runtime_options(true).log);
    Ok(())
}

#[test]
fn rejects_invalid_values() {
    for contents in [
        "clock = 3",
        "[clock]\nperiod_ns = 0",
        "[clock]\nperiod_ns = 15",
        "[clock]\nperiod_ns = \"fast\"",
        "[counter]\ninput_sampling = \"sometimes\"",
        "[counter]\npower_up_value = 256",
        "[counter]\npower_up_value = -1",
        "[trace]\nvcd = 1",
        "not toml at all = = =",
    ] {
        assert!(
            HarnessConfig::from_toml_str(contents).is_err(),
            "accepted {contents:?}"
        );
    }
    assert!(parse_sampling("Registered").is_err());
}

#[test]
#[snafu::report]
fn searches_upward_for_config() -> Result<(), Whatever> {
    let root = Utf8PathBuf::try_from(
        env::temp_dir().join(format!("tinycount-config-{}", process::id())),
    )
    .whatever_context("temp dir is not UTF-8")?;
    let nested = root.join("a/b");
    fs::create_dir_all(&nested).whatever_context("scratch")?;
    fs::write(root.join(CONFIG_FILE_NAME), "[clock]\nperiod_ns = 4\n")
        .whatever_context("scratch")?;

    let found = search_for_config(nested).whatever_context("not found")?;
    assert_eq!(found, root.join(CONFIG_FILE_NAME));
    assert_eq!(HarnessConfig::load(&found)?.clock_period_ns, 4);

    fs::remove_dir_all(&root).whatever_context("cleanup")?;
    Ok(())
}
