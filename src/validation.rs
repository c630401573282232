use std::fmt;
use std::marker::PhantomData;

use num_traits::Float;
use thiserror::Error;

use crate::calibration::LinearCalibration;

/// Parameters that failed a boundary check
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum InputError {
    #[error("SCALE must be positive (got {0})")]
    NonPositiveScale(f64),
    #[error("Wind speed cannot be negative (got {0} m/s)")]
    NegativeWindSpeed(f64),
    #[error("Uncertainties cannot be negative (u({input}) = {value})")]
    NegativeUncertainty { input: Source, value: f64 },
    #[error("OFFSET must be a finite number (got {0})")]
    NonFiniteOffset(f64),
    #[error("missing required parameter `{0}`")]
    Missing(&'static str),
}

/// The three independent inputs to the calibration equation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Voltage,
    Offset,
    Scale,
}

impl Source {
    /// Evaluation order, which is also the tie-break order when ranking contributions
    pub const ALL: [Self; 3] = [Self::Voltage, Self::Offset, Self::Scale];
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voltage => write!(f, "voltage"),
            Self::Offset => write!(f, "offset"),
            Self::Scale => write!(f, "scale"),
        }
    }
}

#[derive(Debug)]
pub enum Checked {}
#[derive(Debug)]
pub enum Unchecked {}

/// The six scalar parameters of one uncertainty evaluation
#[derive(Debug)]
pub struct Inputs<E, S> {
    pub(crate) calibration: LinearCalibration<E>,
    /// Target wind speed in m/s
    pub(crate) wind_speed: E,
    /// Standard uncertainty of the voltage reading in V
    pub(crate) u_voltage: E,
    /// Standard uncertainty of the offset in V
    pub(crate) u_offset: E,
    /// Standard uncertainty of the scale in V/(m/s)
    pub(crate) u_scale: E,
    state: PhantomData<S>,
}

impl<E: Float> Inputs<E, Unchecked> {
    pub const fn new(
        calibration: LinearCalibration<E>,
        wind_speed: E,
        u_voltage: E,
        u_offset: E,
        u_scale: E,
    ) -> Self {
        Self {
            calibration,
            wind_speed,
            u_voltage,
            u_offset,
            u_scale,
            state: PhantomData,
        }
    }

    /// Check the parameters against the physical constraints of the model
    ///
    /// The checks run in a fixed order and stop at the first violation:
    ///
    /// 1. `scale` must be strictly positive, it is both a divisor and a derivative denominator.
    /// 2. `wind_speed` must be non-negative.
    /// 3. Each standard uncertainty must be non-negative.
    ///
    /// Non-finite values fail the check they are tested against, so a `NaN` scale is reported as
    /// a non-positive scale. A non-finite offset is rejected last. Only the returned
    /// [`Checked`] inputs can be handed to [`crate::margin::analyse`].
    ///
    /// # Errors
    /// Returns the first violated constraint, in the order scale, wind speed, uncertainties,
    /// offset.
    pub fn validate(self) -> Result<Inputs<E, Checked>, InputError> {
        let scale = self.calibration.scale;
        if !(scale.is_finite() && scale > E::zero()) {
            return Err(InputError::NonPositiveScale(lossy(scale)));
        }

        if !(self.wind_speed.is_finite() && self.wind_speed >= E::zero()) {
            return Err(InputError::NegativeWindSpeed(lossy(self.wind_speed)));
        }

        for source in Source::ALL {
            let value = self.uncertainty(source);
            if !(value.is_finite() && value >= E::zero()) {
                return Err(InputError::NegativeUncertainty {
                    input: source,
                    value: lossy(value),
                });
            }
        }

        if !self.calibration.offset.is_finite() {
            return Err(InputError::NonFiniteOffset(lossy(self.calibration.offset)));
        }

        tracing::trace!("operating parameters passed validation");

        Ok(Inputs {
            calibration: self.calibration,
            wind_speed: self.wind_speed,
            u_voltage: self.u_voltage,
            u_offset: self.u_offset,
            u_scale: self.u_scale,
            state: PhantomData,
        })
    }
}

impl<E: Copy, S> Inputs<E, S> {
    pub const fn calibration(&self) -> &LinearCalibration<E> {
        &self.calibration
    }

    pub const fn wind_speed(&self) -> E {
        self.wind_speed
    }

    /// The standard uncertainty supplied for `source`
    pub const fn uncertainty(&self, source: Source) -> E {
        match source {
            Source::Voltage => self.u_voltage,
            Source::Offset => self.u_offset,
            Source::Scale => self.u_scale,
        }
    }
}

// Only used for error payloads
fn lossy<E: Float>(value: E) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
