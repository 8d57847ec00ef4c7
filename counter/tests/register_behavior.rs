// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use tinycount_counter::{
    ControlWord, CounterConfig, CounterRegister, CounterUnit, InputSampling,
};
use tinycount_sim::SimulatedModel;

fn running(config: CounterConfig, control: ControlWord) -> CounterUnit {
    let mut counter = CounterUnit::new_model(&config);
    counter.ena = 1;
    counter.rst_n = 1;
    counter.ui_in = control.encode();
    counter.eval();
    counter
}

fn direct_from(value: u8, control: ControlWord) -> CounterUnit {
    running(
        CounterConfig {
            sampling: InputSampling::Direct,
            power_up_value: value,
        },
        control,
    )
}

#[test]
fn control_word_decodes_driver_encodings() {
    assert_eq!(ControlWord::decode(0b100), ControlWord::HOLD);
    assert_eq!(ControlWord::decode(0b110), ControlWord::COUNT);
    assert_eq!(ControlWord::decode(0b101), ControlWord::LOAD);
    assert_eq!(ControlWord::COUNT.encode(), 0b110);

    let noisy = ControlWord::decode(0b1111_1010);
    assert_eq!(noisy, ControlWord::decode(0b010));
    assert!(!noisy.output_en && noisy.count_en && !noisy.load_en);
}

#[test]
fn register_priority_order() {
    let mut register = CounterRegister::new(7);

    register.step(false, ControlWord::COUNT, 0);
    assert_eq!(register.value(), 7);

    let both = ControlWord::decode(0b111);
    register.step(true, both, 0x99);
    assert_eq!(register.value(), 0x99);

    register.step(true, ControlWord::COUNT, 0);
    assert_eq!(register.value(), 0x9a);

    register.step(true, ControlWord::HOLD, 0x11);
    assert_eq!(register.value(), 0x9a);

    register.reset();
    assert_eq!(register.value(), 0);
}

#[test]
fn count_increments_and_wraps_from_every_value() {
    for value in 0..=u8::MAX {
        let mut counter = direct_from(value, ControlWord::COUNT);
        counter.tick();
        assert_eq!(counter.value(), value.wrapping_add(1));
        assert_eq!(counter.read_output(), Some(value.wrapping_add(1)));
    }

    let mut counter = direct_from(0xff, ControlWord::COUNT);
    counter.tick();
    assert_eq!(counter.read_output(), Some(0));
}

#[test]
fn load_replaces_every_prior_value() {
    for prior in [0, 1, 0x42, 0x80, 0xfe, 0xff] {
        for load_value in 0..=u8::MAX {
            let mut counter = direct_from(prior, ControlWord::LOAD);
            counter.uio_in = load_value;
            counter.tick();
            assert_eq!(counter.read_output(), Some(load_value));
        }
    }
}

#[test]
fn load_wins_when_count_is_also_set() {
    let mut counter = direct_from(3, ControlWord::decode(0b111));
    counter.uio_in = 0x10;
    counter.tick();
    assert_eq!(counter.value(), 0x10);
}

#[test]
fn hold_keeps_value_across_many_edges() {
    let mut counter = direct_from(0x5a, ControlWord::HOLD);
    counter.uio_in = 0xff;
    for _ in 0..100 {
        counter.tick();
        assert_eq!(counter.read_output(), Some(0x5a));
    }
}

#[test]
fn master_enable_gates_load_and_count() {
    let mut counter = direct_from(9, ControlWord::COUNT);
    counter.ena = 0;
    counter.tick();
    assert_eq!(counter.value(), 9);

    counter.ui_in = ControlWord::LOAD.encode();
    counter.uio_in = 0x33;
    counter.tick();
    assert_eq!(counter.value(), 9);

    counter.ena = 1;
    counter.tick();
    assert_eq!(counter.value(), 0x33);
}

#[test]
fn reset_acts_immediately_and_dominates() {
    for value in [1, 0x42, 0xff] {
        let mut counter = direct_from(value, ControlWord::COUNT);
        counter.clk = 1;
        counter.eval();
        assert_eq!(counter.value(), value.wrapping_add(1));

        // rst_n falls mid-cycle, no clock edge involved
        counter.rst_n = 0;
        counter.eval();
        assert_eq!(counter.value(), 0);

        counter.clk = 0;
        counter.eval();
        for control in [ControlWord::COUNT, ControlWord::LOAD] {
            counter.ui_in = control.encode();
            counter.uio_in = 0x77;
            for _ in 0..5 {
                counter.tick();
                assert_eq!(counter.value(), 0);
            }
        }
    }
}

#[test]
fn releasing_reset_with_clock_high_is_not_an_edge() {
    let mut counter = direct_from(0, ControlWord::COUNT);
    counter.rst_n = 0;
    counter.clk = 1;
    counter.eval();

    counter.rst_n = 1;
    counter.eval();
    assert_eq!(counter.value(), 0);

    counter.clk = 0;
    counter.eval();
    counter.tick();
    assert_eq!(counter.value(), 1);
}

#[test]
fn output_gating() {
    let count_without_output = ControlWord {
        output_en: false,
        ..ControlWord::COUNT
    };
    let mut counter = direct_from(0, count_without_output);
    counter.tick();
    assert_eq!(counter.uo_out, None);
    assert_eq!(counter.read_output(), None);
    assert_eq!(counter.value(), 1);

    counter.ui_in = ControlWord::HOLD.encode();
    counter.eval();
    assert_eq!(counter.read_output(), Some(1));

    // the bus stays driven during reset, but is not a valid sample
    counter.rst_n = 0;
    counter.eval();
    assert_eq!(counter.uo_out, Some(0));
    assert_eq!(counter.read_output(), None);
}

#[test]
fn registered_inputs_act_one_edge_late() {
    let mut counter = running(CounterConfig::default(), ControlWord::HOLD);
    assert_eq!(counter.latched_control(), ControlWord::default());

    counter.ui_in = ControlWord::COUNT.encode();
    counter.tick();
    assert_eq!(counter.value(), 0);
    assert_eq!(counter.latched_control(), ControlWord::COUNT);

    counter.tick();
    assert_eq!(counter.value(), 1);

    counter.ui_in = ControlWord::LOAD.encode();
    counter.uio_in = 0xc0;
    counter.tick();
    assert_eq!(counter.value(), 2);
    counter.uio_in = 0x01;
    counter.tick();
    assert_eq!(counter.value(), 0xc0);
}

#[test]
fn reset_clears_registered_inputs() {
    let mut counter = running(CounterConfig::default(), ControlWord::COUNT);
    counter.tick();
    counter.tick();
    assert_eq!(counter.value(), 1);

    counter.rst_n = 0;
    counter.eval();
    assert_eq!(counter.latched_control(), ControlWord::default());

    counter.rst_n = 1;
    counter.tick();
    assert_eq!(counter.value(), 0);
    counter.tick();
    assert_eq!(counter.value(), 1);
}

#[test]
fn instances_are_independent() {
    let mut first = direct_from(0, ControlWord::COUNT);
    let mut second = first.clone();
    first.tick();
    first.tick();
    second.rst_n = 0;
    second.eval();
    assert_eq!(first.value(), 2);
    assert_eq!(second.value(), 0);
}
