use ndarray::Array1;
use num_traits::Float;
use serde::Serialize;

use crate::calibration::LinearCalibration;
use crate::validation::{Checked, Inputs, Source};

/// Coverage factor applied to the combined standard uncertainty
///
/// Fixed at two, which corresponds to roughly 95% coverage for a normal distribution. It is not
/// derived from effective degrees of freedom.
pub const COVERAGE_FACTOR: u8 = 2;

/// Nominal coverage probability of [`COVERAGE_FACTOR`], in percent
pub const COVERAGE_PERCENT: u8 = 95;

/// One value per independent input
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PerSource<E> {
    pub voltage: E,
    pub offset: E,
    pub scale: E,
}

impl<E: Copy> PerSource<E> {
    pub const fn get(&self, source: Source) -> E {
        match source {
            Source::Voltage => self.voltage,
            Source::Offset => self.offset,
            Source::Scale => self.scale,
        }
    }

    fn to_array(self) -> Array1<E> {
        Array1::from(vec![self.voltage, self.offset, self.scale])
    }

    fn from_array(values: &Array1<E>) -> Self {
        Self {
            voltage: values[0],
            offset: values[1],
            scale: values[2],
        }
    }
}

/// Sensitivity coefficients of the inverse calibration equation
///
/// For $v = (V - \mathrm{OFFSET}) / \mathrm{SCALE}$ the first-order partial derivatives are
///
/// $$
///     \frac{\partial v}{\partial V} = \frac{1}{\mathrm{SCALE}}, \quad
///     \frac{\partial v}{\partial \mathrm{OFFSET}} = -\frac{1}{\mathrm{SCALE}}, \quad
///     \frac{\partial v}{\partial \mathrm{SCALE}} = -\frac{V - \mathrm{OFFSET}}{\mathrm{SCALE}^2}
/// $$
pub type Sensitivities<E> = PerSource<E>;

impl<E: Float> Sensitivities<E> {
    /// Evaluate the partial derivatives at `voltage`
    ///
    /// `calibration.scale` must be non-zero.
    pub fn at(calibration: &LinearCalibration<E>, voltage: E) -> Self {
        let scale = calibration.scale;
        Self {
            voltage: scale.recip(),
            offset: -scale.recip(),
            scale: -(voltage - calibration.offset) / scale / scale,
        }
    }
}

/// The complete result of propagating input uncertainties through the calibration equation
///
/// Built once by [`analyse`] and never modified.
#[derive(Clone, Debug, Serialize)]
pub struct UncertaintyReport<E> {
    wind_speed: E,
    voltage: E,
    offset: E,
    scale: E,
    u_voltage: E,
    u_offset: E,
    u_scale: E,
    combined: E,
    expanded: E,
    coverage_factor: u8,
    relative_percent: E,
    sensitivities: Sensitivities<E>,
    contributions: PerSource<E>,
}

/// Propagate the input uncertainties of `inputs` to the derived wind speed
///
/// The inputs are assumed independent and small enough that the first-order Taylor expansion
/// holds, so the combined standard uncertainty is the root-sum-of-squares of the signed
/// products of each sensitivity with its input uncertainty.
pub fn analyse<E: Float>(inputs: &Inputs<E, Checked>) -> UncertaintyReport<E> {
    let calibration = inputs.calibration();
    let voltage = calibration.voltage_at(inputs.wind_speed());
    let wind_speed = calibration.wind_speed_at(voltage);
    tracing::debug!(
        voltage = voltage.to_f64(),
        wind_speed = wind_speed.to_f64(),
        "evaluating operating point"
    );

    let sensitivities = Sensitivities::at(calibration, voltage);
    let uncertainties = PerSource {
        voltage: inputs.uncertainty(Source::Voltage),
        offset: inputs.uncertainty(Source::Offset),
        scale: inputs.uncertainty(Source::Scale),
    };
    tracing::trace!(
        dv_dvoltage = sensitivities.voltage.to_f64(),
        dv_doffset = sensitivities.offset.to_f64(),
        dv_dscale = sensitivities.scale.to_f64(),
        "sensitivity coefficients"
    );

    let products = sensitivities.to_array() * uncertainties.to_array();
    let magnitudes = products.mapv(|p| p.abs());
    let contributions = PerSource::from_array(&magnitudes);
    let combined = root_sum_of_squares(&magnitudes);
    let expanded = combined * coverage_factor();

    let relative_percent = if wind_speed > E::zero() {
        combined / wind_speed * hundred()
    } else {
        E::zero()
    };
    tracing::debug!(
        combined = combined.to_f64(),
        expanded = expanded.to_f64(),
        relative_percent = relative_percent.to_f64(),
        "combined standard uncertainty"
    );

    UncertaintyReport {
        wind_speed,
        voltage,
        offset: calibration.offset,
        scale: calibration.scale,
        u_voltage: uncertainties.voltage,
        u_offset: uncertainties.offset,
        u_scale: uncertainties.scale,
        combined,
        expanded,
        coverage_factor: COVERAGE_FACTOR,
        relative_percent,
        sensitivities,
        contributions,
    }
}

// Scaled by the largest term so squaring cannot overflow for very small scales
fn root_sum_of_squares<E: Float>(magnitudes: &Array1<E>) -> E {
    let largest = magnitudes.fold(E::zero(), |acc, &m| acc.max(m));
    if largest == E::zero() || !largest.is_finite() {
        return largest;
    }
    largest * magnitudes.mapv(|m| (m / largest).powi(2)).sum().sqrt()
}

fn coverage_factor<E: Float>() -> E {
    E::from(COVERAGE_FACTOR).expect("coverage factor must fit in `E`")
}

fn hundred<E: Float>() -> E {
    E::from(100u8).expect("100 must fit in `E`")
}

impl<E: Copy> UncertaintyReport<E> {
    /// Wind speed recovered from [`Self::voltage`] in m/s
    pub const fn wind_speed(&self) -> E {
        self.wind_speed
    }

    /// Sensor voltage at the operating point in V
    pub const fn voltage(&self) -> E {
        self.voltage
    }

    pub const fn offset(&self) -> E {
        self.offset
    }

    pub const fn scale(&self) -> E {
        self.scale
    }

    /// Input standard uncertainty of `source`
    pub const fn uncertainty(&self, source: Source) -> E {
        match source {
            Source::Voltage => self.u_voltage,
            Source::Offset => self.u_offset,
            Source::Scale => self.u_scale,
        }
    }

    pub const fn sensitivities(&self) -> &Sensitivities<E> {
        &self.sensitivities
    }

    /// Absolute effect of each input on the wind speed uncertainty, in m/s
    pub const fn contributions(&self) -> &PerSource<E> {
        &self.contributions
    }

    /// Combined standard uncertainty $u_c(v)$ in m/s
    pub const fn combined(&self) -> E {
        self.combined
    }

    /// Expanded uncertainty $U = k u_c(v)$ in m/s
    pub const fn expanded(&self) -> E {
        self.expanded
    }

    pub const fn coverage_factor(&self) -> u8 {
        self.coverage_factor
    }

    /// Combined uncertainty relative to the wind speed, zero when the wind speed is zero
    pub const fn relative_percent(&self) -> E {
        self.relative_percent
    }
}

impl<E: Float> UncertaintyReport<E> {
    /// The input with the largest contribution, and that contribution
    ///
    /// Ties go to the source that comes first in [`Source::ALL`].
    pub fn dominant_source(&self) -> (Source, E) {
        Source::ALL
            .into_iter()
            .map(|source| (source, self.contributions.get(source)))
            .fold((Source::Voltage, self.contributions.voltage), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            })
    }
}
