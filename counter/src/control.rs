// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

/// The 3-bit control word carried on `ui_in[2:0]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlWord {
    /// `ui_in[2]`: drive `uo_out` from the register.
    pub output_en: bool,
    /// `ui_in[1]`: increment on the active edge.
    pub count_en: bool,
    /// `ui_in[0]`: latch `uio_in` on the active edge. Wins over `count_en`.
    pub load_en: bool,
}

impl ControlWord {
    const OUTPUT_EN_BIT: u8 = 1 << 2;
    const COUNT_EN_BIT: u8 = 1 << 1;
    const LOAD_EN_BIT: u8 = 1 << 0;

    /// Output enabled, counter holding.
    pub const HOLD: Self = Self {
        output_en: true,
        count_en: false,
        load_en: false,
    };

    /// Output enabled, counting.
    pub const COUNT: Self = Self {
        output_en: true,
        count_en: true,
        load_en: false,
    };

    /// Output enabled, loading from `uio_in`.
    pub const LOAD: Self = Self {
        output_en: true,
        count_en: false,
        load_en: true,
    };

    /// Decodes `ui_in`. Bits above bit 2 are ignored.
    pub fn decode(ui_in: u8) -> Self {
        Self {
            output_en: ui_in & Self::OUTPUT_EN_BIT != 0,
            count_en: ui_in & Self::COUNT_EN_BIT != 0,
            load_en: ui_in & Self::LOAD_EN_BIT != 0,
        }
    }

    pub fn encode(self) -> u8 {
        let mut ui_in = 0;
        if self.output_en {
            ui_in |= Self::OUTPUT_EN_BIT;
        }
        if self.count_en {
            ui_in |= Self::COUNT_EN_BIT;
        }
        if self.load_en {
            ui_in |= Self::LOAD_EN_BIT;
        }
        ui_in
    }
}

impl From<u8> for ControlWord {
    fn from(ui_in: u8) -> Self {
        Self::decode(ui_in)
    }
}

impl From<ControlWord> for u8 {
    fn from(control: ControlWord) -> Self {
        control.encode()
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0b{:03b} (output_en={}, count_en={}, load_en={})",
            self.encode(),
            self.output_en as u8,
            self.count_en as u8,
            self.load_en as u8
        )
    }
}
