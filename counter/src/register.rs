// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use crate::control::ControlWord;

/// The 8-bit counting register, without any pins or clock detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRegister {
    value: u8,
}

impl CounterRegister {
    /// A register holding `power_up` before its first reset.
    pub fn new(power_up: u8) -> Self {
        Self { value: power_up }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// One active edge with reset deasserted. Load has priority over count;
    /// nothing happens unless `enable` is set.
    pub fn step(&mut self, enable: bool, control: ControlWord, load_value: u8) {
        if !enable {
            return;
        }
        if control.load_en {
            self.value = load_value;
        } else if control.count_en {
            self.value = self.value.wrapping_add(1);
        }
    }
}
