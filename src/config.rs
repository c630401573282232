use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::LinearCalibration;
use crate::validation::{InputError, Inputs, Unchecked};
use crate::Result;

/// Standard uncertainty of a voltage reading from a 4.5-digit multimeter, in V
pub const DEFAULT_U_VOLTAGE: f64 = 0.01;
/// Standard uncertainty of a ten-reading zero-point calibration, in V
pub const DEFAULT_U_OFFSET: f64 = 0.002;
/// Standard uncertainty of a two-point scale calibration, in V/(m/s)
pub const DEFAULT_U_SCALE: f64 = 0.002;

/// Operating parameters as supplied by a parameter file or the command line
///
/// Every field is optional so that sources can be layered with [`Parameters::or`]. Missing
/// uncertainties fall back to the `DEFAULT_*` constants, missing calibration constants or wind
/// speed are an error.
///
/// On disk this is a flat TOML table:
///
/// ```toml
/// offset = 0.4225
/// scale = 0.1975
/// wind_speed = 5.0
/// u_offset = 0.0024
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    pub offset: Option<f64>,
    pub scale: Option<f64>,
    pub wind_speed: Option<f64>,
    pub u_voltage: Option<f64>,
    pub u_offset: Option<f64>,
    pub u_scale: Option<f64>,
}

impl Parameters {
    /// Read a parameter file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid parameter table.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let parameters: Self = toml::from_str(&contents)?;
        tracing::info!(path = %path.display(), "read parameter file");
        Ok(parameters)
    }

    /// Fill the fields missing from `self` with those of `fallback`
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            offset: self.offset.or(fallback.offset),
            scale: self.scale.or(fallback.scale),
            wind_speed: self.wind_speed.or(fallback.wind_speed),
            u_voltage: self.u_voltage.or(fallback.u_voltage),
            u_offset: self.u_offset.or(fallback.u_offset),
            u_scale: self.u_scale.or(fallback.u_scale),
        }
    }

    /// Apply defaults and produce inputs ready for validation
    ///
    /// # Errors
    /// Returns [`InputError::Missing`] naming the first absent required parameter.
    pub fn resolve(self) -> std::result::Result<Inputs<f64, Unchecked>, InputError> {
        let offset = self.offset.ok_or(InputError::Missing("offset"))?;
        let scale = self.scale.ok_or(InputError::Missing("scale"))?;
        let wind_speed = self.wind_speed.ok_or(InputError::Missing("wind-speed"))?;

        Ok(Inputs::new(
            LinearCalibration::new(offset, scale),
            wind_speed,
            self.u_voltage.unwrap_or(DEFAULT_U_VOLTAGE),
            self.u_offset.unwrap_or(DEFAULT_U_OFFSET),
            self.u_scale.unwrap_or(DEFAULT_U_SCALE),
        ))
    }
}
