// Copyright (C) 2024 Ethan Uppal.
//
// This Source Code Form is subject to the terms of the Mozilla Public License,
// v. 2.0. If a copy of the MPL was not distributed with this file, You can
// obtain one at https://mozilla.org/MPL/2.0/.

//! Support for dynamic models.

use std::fmt;

use snafu::Snafu;

use crate::{PortDirection, SimulatedModel, port_width, types};

/// See [`types`].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum SimValue {
    CData(types::CData),
    SData(types::SData),
    IData(types::IData),
    QData(types::QData),
}

impl SimValue {
    /// The maximum number of bits this value takes up.
    pub fn width(&self) -> usize {
        match self {
            Self::CData(_) => 8,
            Self::SData(_) => 16,
            Self::IData(_) => 32,
            Self::QData(_) => 64,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match *self {
            Self::CData(cdata) => cdata.into(),
            Self::SData(sdata) => sdata.into(),
            Self::IData(idata) => idata.into(),
            Self::QData(qdata) => qdata,
        }
    }

    /// The narrowest value type able to hold a port of `width` bits.
    fn for_width(width: usize, raw: u64) -> Self {
        if width <= 8 {
            Self::CData(raw as types::CData)
        } else if width <= 16 {
            Self::SData(raw as types::SData)
        } else if width <= 32 {
            Self::IData(raw as types::IData)
        } else {
            Self::QData(raw)
        }
    }
}

impl fmt::Display for SimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimValue::CData(cdata) => cdata.fmt(f),
            SimValue::SData(sdata) => sdata.fmt(f),
            SimValue::IData(idata) => idata.fmt(f),
            SimValue::QData(qdata) => qdata.fmt(f),
        }
    }
}

impl From<types::CData> for SimValue {
    fn from(value: types::CData) -> Self {
        Self::CData(value)
    }
}

impl From<types::SData> for SimValue {
    fn from(value: types::SData) -> Self {
        Self::SData(value)
    }
}

impl From<types::IData> for SimValue {
    fn from(value: types::IData) -> Self {
        Self::IData(value)
    }
}

impl From<types::QData> for SimValue {
    fn from(value: types::QData) -> Self {
        Self::QData(value)
    }
}

/// Access model ports at runtime.
pub trait AsDynamicModel {
    /// If `port` is a valid output port name for this model and the port is
    /// currently driven, returns the current value of the port.
    fn read(
        &self,
        port: impl Into<String>,
    ) -> Result<SimValue, DynamicModelError>;

    /// If `port` is a valid input port name for this model, and the port's
    /// width is `<=` `value.into().width()`, sets the port to `value`. The
    /// model is not re-evaluated.
    fn pin(
        &mut self,
        port: impl Into<String>,
        value: impl Into<SimValue>,
    ) -> Result<(), DynamicModelError>;
}

/// A hardware model whose ports are addressed by name. See
/// [`super::SimRuntime::create_dyn_model`].
pub struct DynamicModel<M: SimulatedModel> {
    model: M,
}

impl<M: SimulatedModel> DynamicModel<M> {
    pub(crate) fn new(model: M) -> Self {
        Self { model }
    }

    /// Equivalent to [`SimulatedModel::eval`].
    pub fn eval(&mut self) {
        self.model.eval();
    }

    /// The statically-typed model underneath.
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_inner(self) -> M {
        self.model
    }

    fn lookup(
        &self,
        port: &str,
    ) -> Result<(usize, PortDirection), DynamicModelError> {
        M::ports()
            .iter()
            .find(|(name, _, _, _)| *name == port)
            .map(|(_, msb, lsb, direction)| (port_width(*msb, *lsb), *direction))
            .ok_or_else(|| DynamicModelError::NoSuchPort {
                top_module: M::name().to_string(),
                port: port.to_string(),
            })
    }
}

/// Runtime port read/write error.
#[derive(Debug, Snafu)]
pub enum DynamicModelError {
    #[snafu(display("Port {port} not found on module {top_module}"))]
    NoSuchPort { top_module: String, port: String },
    #[snafu(display(
        "Port {port} on module {top_module} has width {width}, but used as if it was in the {attempted_lower} to {attempted_higher} width range"
    ))]
    InvalidPortWidth {
        top_module: String,
        port: String,
        width: usize,
        attempted_lower: usize,
        attempted_higher: usize,
    },
    #[snafu(display(
        "Port {port} on module {top_module} is an {direction} port, but was used as an {attempted_direction} port"
    ))]
    InvalidPortDirection {
        top_module: String,
        port: String,
        direction: PortDirection,
        attempted_direction: PortDirection,
    },
    #[snafu(display(
        "Value {value} does not fit in the {width} bits of port {port} on module {top_module}"
    ))]
    ValueOutOfRange {
        top_module: String,
        port: String,
        width: usize,
        value: u64,
    },
    #[snafu(display("Port {port} on module {top_module} is not being driven"))]
    Undriven { top_module: String, port: String },
}

impl<M: SimulatedModel> AsDynamicModel for DynamicModel<M> {
    fn read(
        &self,
        port: impl Into<String>,
    ) -> Result<SimValue, DynamicModelError> {
        let port: String = port.into();
        let (width, direction) = self.lookup(&port)?;

        if !matches!(direction, PortDirection::Output | PortDirection::Inout) {
            return Err(DynamicModelError::InvalidPortDirection {
                top_module: M::name().to_string(),
                port,
                direction,
                attempted_direction: PortDirection::Output,
            });
        }

        match self.model.read_port(&port) {
            Some(raw) => Ok(SimValue::for_width(width, raw)),
            None => Err(DynamicModelError::Undriven {
                top_module: M::name().to_string(),
                port,
            }),
        }
    }

    fn pin(
        &mut self,
        port: impl Into<String>,
        value: impl Into<SimValue>,
    ) -> Result<(), DynamicModelError> {
        let port: String = port.into();
        let value = value.into();
        let (width, direction) = self.lookup(&port)?;

        let (low, high) = match value {
            SimValue::CData(_) => (0, 8),
            SimValue::SData(_) => (9, 16),
            SimValue::IData(_) => (17, 32),
            SimValue::QData(_) => (33, 64),
        };
        if width > high {
            return Err(DynamicModelError::InvalidPortWidth {
                top_module: M::name().to_string(),
                port,
                width,
                attempted_lower: low,
                attempted_higher: high,
            });
        }

        if !matches!(direction, PortDirection::Input | PortDirection::Inout) {
            return Err(DynamicModelError::InvalidPortDirection {
                top_module: M::name().to_string(),
                port,
                direction,
                attempted_direction: PortDirection::Input,
            });
        }

        let raw = value.as_u64();
        if width < 64 && raw >> width != 0 {
            return Err(DynamicModelError::ValueOutOfRange {
                top_module: M::name().to_string(),
                port,
                width,
                value: raw,
            });
        }

        if !self.model.pin_port(&port, raw) {
            return Err(DynamicModelError::NoSuchPort {
                top_module: M::name().to_string(),
                port,
            });
        }
        Ok(())
    }
}
