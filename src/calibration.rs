use num_traits::Float;

/// A linear anemometer response
///
/// The sensor voltage rises linearly with wind speed from the zero-wind `offset`, with gain
/// `scale` volts per metre-per-second:
///
/// $$
///     V = v \cdot \mathrm{SCALE} + \mathrm{OFFSET}
/// $$
///
/// `scale` must be non-zero for the inverse to exist. Construction does not check this, callers
/// are expected to have validated their inputs first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearCalibration<E> {
    /// Zero-wind voltage in V
    pub(crate) offset: E,
    /// Gain in V/(m/s)
    pub(crate) scale: E,
}

impl<E: Float> LinearCalibration<E> {
    pub const fn new(offset: E, scale: E) -> Self {
        Self { offset, scale }
    }

    pub const fn offset(&self) -> E {
        self.offset
    }

    pub const fn scale(&self) -> E {
        self.scale
    }

    /// The voltage the sensor reports at `wind_speed`
    pub fn voltage_at(&self, wind_speed: E) -> E {
        wind_speed * self.scale + self.offset
    }

    /// The wind speed corresponding to a measured `voltage`
    pub fn wind_speed_at(&self, voltage: E) -> E {
        (voltage - self.offset) / self.scale
    }
}
