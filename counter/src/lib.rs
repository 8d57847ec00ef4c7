// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Pin-accurate model of an 8-bit counter peripheral with synchronous count,
//! synchronous parallel load, and asynchronous active-low reset.
//!
//! | Pin           | Dir | Meaning                                    |
//! |---------------|-----|--------------------------------------------|
//! | `clk`         | in  | rising edge is the active edge             |
//! | `rst_n`       | in  | active-low asynchronous reset              |
//! | `ena`         | in  | master enable for load and count           |
//! | `ui_in[2:0]`  | in  | control word, see [`ControlWord`]          |
//! | `uio_in[7:0]` | in  | load value                                 |
//! | `uo_out[7:0]` | out | counter value while `ui_in[2]` is set      |
//!
//! ```
//! use tinycount_counter::{ControlWord, CounterConfig, CounterUnit};
//! use tinycount_sim::SimulatedModel;
//!
//! let mut counter = CounterUnit::new_model(&CounterConfig::direct());
//! counter.ena = 1;
//! counter.rst_n = 1;
//! counter.ui_in = ControlWord::COUNT.encode();
//! counter.tick();
//! counter.tick();
//! assert_eq!(counter.read_output(), Some(2));
//! ```

use tinycount_sim::{Port, PortDirection, SimulatedModel, types};

mod control;
mod register;

pub use control::ControlWord;
pub use register::CounterRegister;

/// When the control word and load bus are sampled relative to the edge that
/// acts on them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputSampling {
    /// `ui_in`/`uio_in` are registered on one rising edge and take effect on
    /// the next. This is the timing the known test sequence was written
    /// against.
    #[default]
    Registered,
    /// `ui_in`/`uio_in` take effect on the edge that samples them.
    Direct,
}

/// Optional configuration for creating a [`CounterUnit`]. Usually, you can
/// just use [`CounterConfig::default()`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CounterConfig {
    pub sampling: InputSampling,

    /// Register contents before the first reset.
    pub power_up_value: u8,
}

impl CounterConfig {
    /// The same as the [`Default`] implementation except that inputs act on
    /// the edge that samples them.
    pub fn direct() -> Self {
        Self {
            sampling: InputSampling::Direct,
            ..Default::default()
        }
    }
}

const PORTS: &[Port] = &[
    ("clk", 0, 0, PortDirection::Input),
    ("rst_n", 0, 0, PortDirection::Input),
    ("ena", 0, 0, PortDirection::Input),
    ("ui_in", 7, 0, PortDirection::Input),
    ("uio_in", 7, 0, PortDirection::Input),
    ("uo_out", 7, 0, PortDirection::Output),
];

/// The counter peripheral. Set input fields, then call
/// [`SimulatedModel::eval`] (or [`CounterUnit::tick`]); `uo_out` is refreshed
/// by every evaluation.
#[derive(Debug, Clone)]
pub struct CounterUnit {
    pub clk: types::CData,
    pub rst_n: types::CData,
    pub ena: types::CData,
    pub ui_in: types::CData,
    pub uio_in: types::CData,
    /// `None` while not driven.
    pub uo_out: Option<types::CData>,

    sampling: InputSampling,
    register: CounterRegister,
    last_clk: types::CData,
    latched_control: ControlWord,
    latched_load: types::CData,
}

impl CounterUnit {
    /// Drives one full clock period: rising edge, then falling edge.
    pub fn tick(&mut self) {
        self.clk = 1;
        self.eval();
        self.clk = 0;
        self.eval();
    }

    /// The output bus as a valid sample: the register value while `ui_in[2]`
    /// is set and reset is deasserted.
    pub fn read_output(&self) -> Option<u8> {
        if self.reset_asserted() {
            None
        } else {
            self.uo_out
        }
    }

    /// The register contents regardless of output gating.
    pub fn value(&self) -> u8 {
        self.register.value()
    }

    /// The control word the next rising edge will act on.
    pub fn latched_control(&self) -> ControlWord {
        match self.sampling {
            InputSampling::Registered => self.latched_control,
            InputSampling::Direct => ControlWord::decode(self.ui_in),
        }
    }

    pub fn reset_asserted(&self) -> bool {
        self.rst_n == 0
    }

    fn on_rising_edge(&mut self) {
        let enable = self.ena != 0;
        match self.sampling {
            InputSampling::Registered => {
                self.register
                    .step(enable, self.latched_control, self.latched_load);
                self.latched_control = ControlWord::decode(self.ui_in);
                self.latched_load = self.uio_in;
            }
            InputSampling::Direct => {
                self.register.step(
                    enable,
                    ControlWord::decode(self.ui_in),
                    self.uio_in,
                );
            }
        }
    }
}

impl SimulatedModel for CounterUnit {
    type Config = CounterConfig;

    fn name() -> &'static str {
        "tt_um_counter"
    }

    fn ports() -> &'static [Port] {
        PORTS
    }

    fn new_model(config: &Self::Config) -> Self {
        Self {
            clk: 0,
            rst_n: 1,
            ena: 0,
            ui_in: 0,
            uio_in: 0,
            uo_out: None,
            sampling: config.sampling,
            register: CounterRegister::new(config.power_up_value),
            last_clk: 0,
            latched_control: ControlWord::default(),
            latched_load: 0,
        }
    }

    fn eval(&mut self) {
        // reset is level-sensitive and checked before any edge, so it acts
        // the moment rst_n falls and pins the register while held
        if self.reset_asserted() {
            self.register.reset();
            self.latched_control = ControlWord::default();
            self.latched_load = 0;
        } else if self.clk != 0 && self.last_clk == 0 {
            self.on_rising_edge();
        }
        self.last_clk = self.clk;

        self.uo_out = ControlWord::decode(self.ui_in)
            .output_en
            .then_some(self.register.value());
    }

    fn read_port(&self, port: &str) -> Option<u64> {
        match port {
            "clk" => Some(self.clk.into()),
            "rst_n" => Some(self.rst_n.into()),
            "ena" => Some(self.ena.into()),
            "ui_in" => Some(self.ui_in.into()),
            "uio_in" => Some(self.uio_in.into()),
            "uo_out" => self.uo_out.map(u64::from),
            _ => None,
        }
    }

    fn pin_port(&mut self, port: &str, value: u64) -> bool {
        let bit = (value & 1) as types::CData;
        let byte = value as types::CData;
        match port {
            "clk" => self.clk = bit,
            "rst_n" => self.rst_n = bit,
            "ena" => self.ena = bit,
            "ui_in" => self.ui_in = byte,
            "uio_in" => self.uio_in = byte,
            _ => return false,
        }
        true
    }
}
