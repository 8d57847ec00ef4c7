// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! A clocked test bench for [`SimulatedModel`]s, and the known test sequence
//! for the counter peripheral.
//!
//! The bench follows the usual driver discipline: set inputs, advance the
//! clock, sample outputs. [`Testbench::clock_cycles`] returns just after the
//! last rising edge it waited for, so samples taken afterwards see the state
//! produced by that edge.

use std::{fmt, io};

use camino::Utf8PathBuf;
use snafu::{ResultExt, Snafu, Whatever, whatever};
use tinycount_sim::{
    PortDirection, SimRuntime, SimulatedModel,
    dynamic::{AsDynamicModel, DynamicModel, DynamicModelError, SimValue},
    vcd::Vcd,
};

pub mod config;
pub mod scenario;

/// The stage of a test sequence a check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Setup,
    Counting,
    Reset,
    Load,
    CountFromLoad,
    Disable,
    Overflow,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => "setup",
            Phase::Counting => "counting",
            Phase::Reset => "reset",
            Phase::Load => "load",
            Phase::CountFromLoad => "count from load",
            Phase::Disable => "disable",
            Phase::Overflow => "overflow",
        }
        .fmt(f)
    }
}

fn display_sample(sample: &Option<u64>) -> String {
    match sample {
        Some(value) => format!("{value:#04x}"),
        None => "an undriven bus".into(),
    }
}

/// Test bench error.
#[derive(Debug, Snafu)]
pub enum TestbenchError {
    #[snafu(display(
        "{phase}: expected {port} to be {expected:#04x} at {time_ns} ns, got {}",
        display_sample(actual)
    ))]
    Mismatch {
        phase: Phase,
        port: String,
        time_ns: u64,
        expected: u64,
        actual: Option<u64>,
    },
    #[snafu(display("{phase}: expected {port} to be driven at {time_ns} ns"))]
    Undriven {
        phase: Phase,
        port: String,
        time_ns: u64,
    },
    #[snafu(display("Failed to access a port of the model under test"))]
    Port { source: DynamicModelError },
    #[snafu(display("Failed to write the VCD trace"))]
    Trace { source: io::Error },
}

/// Optional configuration for creating a [`Testbench`]. Usually, you can just
/// use [`TestbenchOptions::default()`].
pub struct TestbenchOptions {
    /// The 1-bit input driven as the clock.
    pub clock_port: String,

    /// Full clock period. Must be even and nonzero.
    pub clock_period_ns: u64,

    /// If set, every port is traced to this file under the runtime's artifact
    /// directory.
    pub vcd: Option<Utf8PathBuf>,
}

impl Default for TestbenchOptions {
    fn default() -> Self {
        Self {
            clock_port: "clk".into(),
            clock_period_ns: 10_000,
            vcd: None,
        }
    }
}

/// Drives a model with a free-running clock in simulated time.
pub struct Testbench<M: SimulatedModel> {
    dut: DynamicModel<M>,
    clock_port: String,
    clock_high: bool,
    half_period_ns: u64,
    time_ns: u64,
    vcd: Option<Vcd>,
    log: bool,
}

impl<M: SimulatedModel> Testbench<M> {
    /// Creates the model through `runtime` and starts the clock low at time
    /// zero.
    pub fn new(
        runtime: &SimRuntime,
        config: &M::Config,
        options: TestbenchOptions,
    ) -> Result<Self, Whatever> {
        let log = runtime.options().log;

        if options.clock_period_ns == 0 || options.clock_period_ns % 2 != 0 {
            whatever!(
                "Clock period must be even and nonzero, got {} ns",
                options.clock_period_ns
            );
        }
        match M::ports()
            .iter()
            .find(|(name, _, _, _)| *name == options.clock_port)
        {
            Some((_, 0, 0, PortDirection::Input | PortDirection::Inout)) => {}
            Some(_) => whatever!(
                "Clock port {} on module {} is not a 1-bit input",
                options.clock_port,
                M::name()
            ),
            None => whatever!(
                "Clock port {} not found on module {}",
                options.clock_port,
                M::name()
            ),
        }

        let dut = runtime
            .create_dyn_model::<M>(config)
            .whatever_context("Failed to create model under test")?;

        let timescale_ns = 1;
        let vcd = match &options.vcd {
            Some(file_name) => Some(
                runtime
                    .open_vcd::<M>(file_name, timescale_ns)
                    .whatever_context("Failed to open trace for test bench")?,
            ),
            None => None,
        };

        let mut testbench = Self {
            dut,
            clock_port: options.clock_port,
            clock_high: false,
            half_period_ns: options.clock_period_ns / 2,
            time_ns: 0,
            vcd,
            log,
        };
        testbench
            .drive_clock(false)
            .whatever_context("Failed to initialize clock")?;

        if log {
            log::info!(
                "Started {} ns clock on {}.{}",
                options.clock_period_ns,
                M::name(),
                testbench.clock_port
            );
        }
        Ok(testbench)
    }

    /// Sets an input and lets it propagate. Asynchronous inputs take effect
    /// immediately, and are traced at the current time; synchronous ones wait
    /// for the next rising edge. Setting the clock port moves the clock, so
    /// the next [`Testbench::clock_cycles`] continues from that level.
    pub fn set(
        &mut self,
        port: &str,
        value: impl Into<SimValue>,
    ) -> Result<(), TestbenchError> {
        let value = value.into();
        self.dut.pin(port, value).context(PortSnafu)?;
        self.dut.eval();
        if port == self.clock_port {
            self.clock_high = value.as_u64() != 0;
        }
        self.dump_trace()
    }

    /// Waits for `cycles` rising edges of the clock.
    pub fn clock_cycles(&mut self, cycles: usize) -> Result<(), TestbenchError> {
        for _ in 0..cycles {
            if self.clock_high {
                self.time_ns += self.half_period_ns;
                self.drive_clock(false)?;
            }
            self.time_ns += self.half_period_ns;
            self.drive_clock(true)?;
        }
        Ok(())
    }

    /// The current value of an output, or `None` while it is not driven.
    pub fn sample(
        &self,
        port: &str,
    ) -> Result<Option<SimValue>, TestbenchError> {
        match self.dut.read(port) {
            Ok(value) => Ok(Some(value)),
            Err(DynamicModelError::Undriven { .. }) => Ok(None),
            Err(error) => Err(error).context(PortSnafu),
        }
    }

    /// Checks that `port` is driven to `expected`.
    pub fn expect(
        &self,
        phase: Phase,
        port: &str,
        expected: impl Into<SimValue>,
    ) -> Result<(), TestbenchError> {
        let expected = expected.into().as_u64();
        let actual = self.sample(port)?.map(|value| value.as_u64());
        if actual != Some(expected) {
            if self.log {
                log::error!(
                    "{phase}: {port} mismatch at {} ns",
                    self.time_ns
                );
            }
            return MismatchSnafu {
                phase,
                port,
                time_ns: self.time_ns,
                expected,
                actual,
            }
            .fail();
        }
        Ok(())
    }

    /// Like [`Testbench::sample`], but an undriven port is an error.
    pub fn sample_driven(
        &self,
        phase: Phase,
        port: &str,
    ) -> Result<u64, TestbenchError> {
        match self.sample(port)? {
            Some(value) => Ok(value.as_u64()),
            None => UndrivenSnafu {
                phase,
                port,
                time_ns: self.time_ns,
            }
            .fail(),
        }
    }

    pub fn time_ns(&self) -> u64 {
        self.time_ns
    }

    pub fn model(&self) -> &M {
        self.dut.model()
    }

    /// Flushes the trace, if any, and hands back the model.
    pub fn finish(self) -> Result<M, TestbenchError> {
        if let Some(vcd) = self.vcd {
            vcd.close().context(TraceSnafu)?;
        }
        Ok(self.dut.into_inner())
    }

    fn drive_clock(&mut self, high: bool) -> Result<(), TestbenchError> {
        self.dut
            .pin(self.clock_port.as_str(), high as u8)
            .context(PortSnafu)?;
        self.dut.eval();
        self.clock_high = high;
        self.dump_trace()
    }

    fn dump_trace(&mut self) -> Result<(), TestbenchError> {
        if let Some(vcd) = &mut self.vcd {
            vcd.dump(self.time_ns, self.dut.model())
                .context(TraceSnafu)?;
        }
        Ok(())
    }
}
