// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! The known test sequence for the counter peripheral.
//!
//! Every control change is followed by one settle edge (the unit registers
//! `ui_in`/`uio_in`) before the first check, and loads are checked two edges
//! after the control change. With [`InputSampling::Direct`] the settle edges
//! already act on the new control word, so the sequence fails in the
//! counting phase.
//!
//! [`InputSampling::Direct`]: tinycount_counter::InputSampling::Direct

use tinycount_counter::{ControlWord, CounterUnit};

use crate::{Phase, Testbench, TestbenchError};

pub const LOAD_VALUE: u8 = 0x42;
pub const OVERFLOW_LOAD_VALUE: u8 = 0xff;
pub const DISABLE_CYCLES: usize = 20;

type Bench = Testbench<CounterUnit>;

/// One step of the sequence.
pub type PhaseFn = fn(&mut Bench) -> Result<(), TestbenchError>;

/// The sequence, in order. Each phase assumes the state left by the previous
/// one.
pub const PHASES: [(Phase, PhaseFn); 7] = [
    (Phase::Setup, setup),
    (Phase::Counting, counting),
    (Phase::Reset, reset),
    (Phase::Load, load),
    (Phase::CountFromLoad, count_from_load),
    (Phase::Disable, disable),
    (Phase::Overflow, overflow),
];

/// Runs every phase of [`PHASES`], stopping at the first failure.
pub fn run_counter_scenario(tb: &mut Bench) -> Result<(), TestbenchError> {
    for (phase, run_phase) in PHASES {
        log::info!("Testing {phase}");
        run_phase(tb)?;
    }
    log::info!("All phases passed");
    Ok(())
}

fn set_control(tb: &mut Bench, control: ControlWord) -> Result<(), TestbenchError> {
    tb.set("ui_in", control.encode())
}

pub fn setup(tb: &mut Bench) -> Result<(), TestbenchError> {
    tb.set("ena", 1u8)?;
    tb.set("rst_n", 1u8)?;
    set_control(tb, ControlWord::HOLD)?;
    tb.set("uio_in", 0u8)?;
    tb.clock_cycles(2)
}

pub fn counting(tb: &mut Bench) -> Result<(), TestbenchError> {
    set_control(tb, ControlWord::COUNT)?;
    tb.clock_cycles(1)?;
    for expected in 1..=4u8 {
        tb.clock_cycles(1)?;
        tb.expect(Phase::Counting, "uo_out", expected)?;
    }
    Ok(())
}

pub fn reset(tb: &mut Bench) -> Result<(), TestbenchError> {
    tb.set("rst_n", 0u8)?;
    tb.clock_cycles(2)?;
    tb.expect(Phase::Reset, "uo_out", 0u8)?;

    // the first edge after release only registers the control word
    tb.set("rst_n", 1u8)?;
    tb.clock_cycles(2)?;
    tb.expect(Phase::Reset, "uo_out", 1u8)
}

pub fn load(tb: &mut Bench) -> Result<(), TestbenchError> {
    tb.set("uio_in", LOAD_VALUE)?;
    set_control(tb, ControlWord::LOAD)?;
    tb.clock_cycles(2)?;
    tb.expect(Phase::Load, "uo_out", LOAD_VALUE)
}

pub fn count_from_load(tb: &mut Bench) -> Result<(), TestbenchError> {
    set_control(tb, ControlWord::COUNT)?;
    tb.clock_cycles(1)?;
    for step in 1..=3u8 {
        tb.clock_cycles(1)?;
        tb.expect(Phase::CountFromLoad, "uo_out", LOAD_VALUE + step)?;
    }
    Ok(())
}

pub fn disable(tb: &mut Bench) -> Result<(), TestbenchError> {
    set_control(tb, ControlWord::HOLD)?;
    tb.clock_cycles(1)?;
    let current = tb.sample_driven(Phase::Disable, "uo_out")?;
    tb.clock_cycles(DISABLE_CYCLES)?;
    tb.expect(Phase::Disable, "uo_out", current)
}

pub fn overflow(tb: &mut Bench) -> Result<(), TestbenchError> {
    tb.set("uio_in", OVERFLOW_LOAD_VALUE)?;
    set_control(tb, ControlWord::LOAD)?;
    tb.clock_cycles(2)?;
    tb.expect(Phase::Overflow, "uo_out", OVERFLOW_LOAD_VALUE)?;

    set_control(tb, ControlWord::COUNT)?;
    tb.clock_cycles(2)?;
    tb.expect(Phase::Overflow, "uo_out", 0u8)
}
