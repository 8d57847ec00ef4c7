// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

use std::{
    fs::File,
    io::{self, BufWriter},
};

use ::vcd::{IdCode, TimescaleUnit, Value, VarType, Writer};
use camino::Utf8Path;

use crate::{SimulatedModel, port_width};

struct TracedPort {
    name: &'static str,
    width: usize,
    id: IdCode,
    /// `None` until first dumped; `Some(None)` while undriven.
    last: Option<Option<u64>>,
}

/// A VCD dump of every port of one model. Use [`super::SimRuntime::open_vcd`].
pub struct Vcd {
    writer: Writer<BufWriter<File>>,
    ports: Vec<TracedPort>,
    last_timestamp: Option<u64>,
}

impl Vcd {
    pub(crate) fn create<M: SimulatedModel>(
        path: &Utf8Path,
        timescale_ns: u32,
    ) -> io::Result<Self> {
        let mut writer = Writer::new(BufWriter::new(File::create(path)?));
        writer.timescale(timescale_ns, TimescaleUnit::NS)?;
        writer.add_module(M::name())?;

        let mut ports = Vec::with_capacity(M::ports().len());
        for (name, msb, lsb, _) in M::ports() {
            let width = port_width(*msb, *lsb);
            let id = writer.add_var(VarType::Wire, width as u32, name, None)?;
            ports.push(TracedPort {
                name: *name,
                width,
                id,
                last: None,
            });
        }

        writer.upscope()?;
        writer.enddefinitions()?;

        Ok(Self {
            writer,
            ports,
            last_timestamp: None,
        })
    }

    /// Writes one time step. Only ports whose value changed since the previous
    /// dump are recorded; undriven ports are written as `z`. Repeated dumps at
    /// the same `timestamp` extend that time step.
    pub fn dump<M: SimulatedModel>(
        &mut self,
        timestamp: u64,
        model: &M,
    ) -> io::Result<()> {
        if self.last_timestamp != Some(timestamp) {
            self.writer.timestamp(timestamp)?;
            self.last_timestamp = Some(timestamp);
        }
        for port in &mut self.ports {
            let current = model.read_port(port.name);
            if port.last == Some(current) {
                continue;
            }
            port.last = Some(current);

            if port.width == 1 {
                let value = match current {
                    Some(0) => Value::V0,
                    Some(_) => Value::V1,
                    None => Value::Z,
                };
                self.writer.change_scalar(port.id, value)?;
            } else {
                let bits = (0..port.width)
                    .rev()
                    .map(|bit| match current {
                        Some(raw) if (raw >> bit) & 1 == 1 => Value::V1,
                        Some(_) => Value::V0,
                        None => Value::Z,
                    })
                    .collect::<Vec<_>>();
                self.writer.change_vector(port.id, bits)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// The VCD is flushed when dropped, but errors are only observable when
    /// closing manually.
    pub fn close(mut self) -> io::Result<()> {
        self.flush()
    }
}
