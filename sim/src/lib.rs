// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! This module implements the runtime for instantiating cycle-accurate
//! hardware models behind a pin-level interface.
//!
//! A model is any type implementing [`SimulatedModel`]. The runtime validates
//! the model's port table, constructs it at power-up, and optionally opens a
//! VCD trace for it in the artifact directory. For an example model, see
//! `CounterUnit` (under the "counter/" directory).

use std::{collections::HashSet, fmt, fs};

use camino::{Utf8Path, Utf8PathBuf};
use snafu::{ResultExt, Whatever, whatever};

use crate::{dynamic::DynamicModel, vcd::Vcd};

pub mod dynamic;
pub mod vcd;

/// Storage types for port values, by width class.
pub mod types {
    /// Data representing 1-8 packed bits.
    pub type CData = u8;

    /// Data representing 9-16 packed bits.
    pub type SData = u16;

    /// Data representing 17-32 packed bits.
    pub type IData = u32;

    /// Data representing 33-64 packed bits.
    pub type QData = u64;
}

/// <https://www.digikey.com/en/maker/blogs/2024/verilog-ports-part-7-of-our-verilog-journey>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
    Inout,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
            PortDirection::Inout => "inout",
        }
        .fmt(f)
    }
}

/// A port declaration: `(name, msb, lsb, direction)`.
pub type Port = (&'static str, usize, usize, PortDirection);

/// Width in bits of a port declared as `msb..=lsb`.
pub fn port_width(msb: usize, lsb: usize) -> usize {
    msb + 1 - lsb
}

/// A hardware model that can be driven pin by pin.
///
/// Implementations hold their own state; the runtime never shares state
/// between two instances.
pub trait SimulatedModel: Sized {
    /// Construction-time configuration.
    type Config: Default;

    /// The source-level name of the module.
    fn name() -> &'static str;

    /// The module's interface.
    fn ports() -> &'static [Port];

    /// Use [`SimRuntime::create_model`] instead of calling this directly, so
    /// the port table is validated.
    fn new_model(config: &Self::Config) -> Self;

    /// Re-evaluates the model after any number of input pins have changed.
    fn eval(&mut self);

    /// The current value of `port`, or `None` if the port does not exist or
    /// is not being driven.
    fn read_port(&self, port: &str) -> Option<u64>;

    /// Sets the input `port` to `value`. Returns `false` if no such input
    /// exists.
    fn pin_port(&mut self, port: &str, value: u64) -> bool;
}

/// Optional configuration for creating a [`SimRuntime`]. Usually, you can
/// just use [`SimRuntimeOptions::default()`].
pub struct SimRuntimeOptions {
    /// Where trace files are written. Created lazily.
    pub artifact_directory: Utf8PathBuf,

    /// Whether to use the log crate.
    pub log: bool,
}

impl Default for SimRuntimeOptions {
    fn default() -> Self {
        Self {
            artifact_directory: "artifacts".into(),
            log: false,
        }
    }
}

impl SimRuntimeOptions {
    /// The same as the [`Default`] implementation except that the log crate is
    /// used.
    pub fn default_logging() -> Self {
        Self {
            log: true,
            ..Default::default()
        }
    }
}

/// Runtime for cycle-accurate models.
pub struct SimRuntime {
    options: SimRuntimeOptions,
}

impl SimRuntime {
    /// Creates a new runtime for instantiating hardware models as Rust
    /// objects.
    pub fn new(options: SimRuntimeOptions) -> Result<Self, Whatever> {
        if options.log {
            log::info!("Validating artifact directory");
        }
        if options.artifact_directory.is_file() {
            whatever!(
                "Artifact directory {} exists but is a file",
                options.artifact_directory
            );
        }

        Ok(Self { options })
    }

    pub fn options(&self) -> &SimRuntimeOptions {
        &self.options
    }

    /// Constructs a new model at power-up.
    ///
    /// See also: [`SimRuntime::create_dyn_model`]
    pub fn create_model<M: SimulatedModel>(
        &self,
        config: &M::Config,
    ) -> Result<M, Whatever> {
        if self.options.log {
            log::info!("Validating ports of model {}", M::name());
        }
        validate_ports(M::name(), M::ports())?;

        if self.options.log {
            log::info!("Creating model {}", M::name());
        }
        Ok(M::new_model(config))
    }

    /// Constructs a new model whose ports are accessed by name at runtime.
    ///
    /// See also: [`SimRuntime::create_model`]
    pub fn create_dyn_model<M: SimulatedModel>(
        &self,
        config: &M::Config,
    ) -> Result<DynamicModel<M>, Whatever> {
        let model = self
            .create_model::<M>(config)
            .whatever_context("Failed to create model")?;
        Ok(DynamicModel::new(model))
    }

    /// Opens a VCD trace declaring every port of `M`, at
    /// `artifact_directory/file_name`. One VCD time unit is `timescale_ns`
    /// nanoseconds.
    pub fn open_vcd<M: SimulatedModel>(
        &self,
        file_name: &Utf8Path,
        timescale_ns: u32,
    ) -> Result<Vcd, Whatever> {
        validate_ports(M::name(), M::ports())?;

        let artifact_directory = &self.options.artifact_directory;
        if self.options.log {
            log::info!("Creating artifacts directory {}", artifact_directory);
        }
        fs::create_dir_all(artifact_directory).whatever_context(format!(
            "Failed to create artifacts directory {}",
            artifact_directory
        ))?;

        let path = artifact_directory.join(file_name);
        if self.options.log {
            log::info!("Opening VCD trace {}", path);
        }
        Vcd::create::<M>(&path, timescale_ns)
            .whatever_context(format!("Failed to open VCD trace {}", path))
    }
}

fn validate_ports(name: &str, ports: &[Port]) -> Result<(), Whatever> {
    let mut seen = HashSet::new();
    for (port, msb, lsb, _) in ports {
        if port.chars().any(|c| c == '\\' || c == ' ') {
            whatever!("Escaped port names are not supported");
        }
        if msb < lsb {
            whatever!(
                "Port {} on module {} was specified with the high bit less than the low bit",
                port,
                name
            );
        }
        if port_width(*msb, *lsb) > 64 {
            whatever!(
                "Port {} on module {} is greater than 64 bits",
                port,
                name
            );
        }
        if !seen.insert(*port) {
            whatever!("Port {} on module {} is declared twice", port, name);
        }
    }
    Ok(())
}
