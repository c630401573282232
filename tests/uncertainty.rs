use ndarray_rand::rand::{Rng, SeedableRng};
use proptest::prelude::*;
use rand_isaac::Isaac64Rng;

use wind_margin::calibration::LinearCalibration;
use wind_margin::config::Parameters;
use wind_margin::margin::{analyse, UncertaintyReport};
use wind_margin::report::{Interpretation, Quality};
use wind_margin::validation::{Inputs, Source};
use wind_margin::Result;

fn evaluate(
    offset: f64,
    scale: f64,
    wind_speed: f64,
    u: [f64; 3],
) -> Result<UncertaintyReport<f64>> {
    let inputs = Inputs::new(LinearCalibration::new(offset, scale), wind_speed, u[0], u[1], u[2])
        .validate()?;
    Ok(analyse(&inputs))
}

#[test]
fn documented_anemometer_scenario() -> Result<()> {
    let report = evaluate(0.4225, 0.1975, 5.0, [0.01, 0.0024, 0.002])?;

    approx::assert_relative_eq!(report.voltage(), 1.41, max_relative = 1e-12);

    let sensitivities = report.sensitivities();
    approx::assert_relative_eq!(sensitivities.voltage, 5.0633, epsilon = 1e-4);
    approx::assert_relative_eq!(sensitivities.offset, -5.0633, epsilon = 1e-4);
    approx::assert_relative_eq!(sensitivities.scale, -25.32, epsilon = 1e-2);

    let contributions = report.contributions();
    approx::assert_relative_eq!(contributions.voltage, 0.05063, epsilon = 1e-5);
    approx::assert_relative_eq!(contributions.offset, 0.01215, epsilon = 1e-5);
    approx::assert_relative_eq!(contributions.scale, 0.05063, epsilon = 1e-5);

    approx::assert_relative_eq!(report.combined(), 0.0726, epsilon = 1e-4);
    approx::assert_relative_eq!(report.expanded(), 0.1453, epsilon = 1e-4);
    approx::assert_relative_eq!(report.relative_percent(), 1.45, epsilon = 1e-2);

    assert_eq!(Interpretation::of(&report).quality, Quality::Excellent);
    Ok(())
}

#[test]
fn defaults_reproduce_the_basic_invocation() -> Result<()> {
    let parameters = Parameters {
        offset: Some(0.4225),
        scale: Some(0.1975),
        wind_speed: Some(5.0),
        ..Parameters::default()
    };
    let report = analyse(&parameters.resolve()?.validate()?);

    approx::assert_relative_eq!(report.uncertainty(Source::Voltage), 0.01);
    approx::assert_relative_eq!(report.uncertainty(Source::Offset), 0.002);
    approx::assert_relative_eq!(report.uncertainty(Source::Scale), 0.002);
    approx::assert_relative_eq!(
        report.contributions().offset,
        0.002 / 0.1975,
        max_relative = 1e-12
    );
    Ok(())
}

#[test]
fn low_wind_speeds_degrade_quality() -> Result<()> {
    let seed = 40;
    let mut rng = Isaac64Rng::seed_from_u64(seed);

    let offset = rng.gen_range(0.3..0.5);
    let scale = rng.gen_range(0.15..0.25);
    let u = [0.01, 0.002, 0.002];

    let calm = evaluate(offset, scale, 0.2, u)?;
    let breeze = evaluate(offset, scale, 5.0, u)?;
    let gale = evaluate(offset, scale, 20.0, u)?;

    assert!(calm.relative_percent() > breeze.relative_percent());
    assert_eq!(Interpretation::of(&calm).quality, Quality::Poor);
    assert!(gale.combined() > breeze.combined());
    assert_eq!(gale.dominant_source().0, Source::Scale);
    Ok(())
}

fn uncertainties() -> impl Strategy<Value = [f64; 3]> {
    [0.0..0.1f64, 0.0..0.1f64, 0.0..0.1f64]
}

proptest! {
    #[test]
    fn calibration_round_trips(
        offset in -2.0..2.0f64,
        scale in 0.01..5.0f64,
        wind_speed in 0.0..80.0f64,
    ) {
        let calibration = LinearCalibration::new(offset, scale);
        let recovered = calibration.wind_speed_at(calibration.voltage_at(wind_speed));
        prop_assert!((recovered - wind_speed).abs() <= 1e-9 * (1.0 + wind_speed));

        let voltage = calibration.voltage_at(wind_speed);
        let back = calibration.voltage_at(calibration.wind_speed_at(voltage));
        prop_assert!((back - voltage).abs() <= 1e-9 * (1.0 + voltage.abs()));
    }

    #[test]
    fn expanded_is_twice_combined(
        offset in -2.0..2.0f64,
        scale in 0.01..5.0f64,
        wind_speed in 0.0..80.0f64,
        u in uncertainties(),
    ) {
        let report = evaluate(offset, scale, wind_speed, u).unwrap();
        prop_assert_eq!(report.expanded(), 2.0 * report.combined());
    }

    #[test]
    fn combined_dominates_each_contribution(
        offset in -2.0..2.0f64,
        scale in 0.01..5.0f64,
        wind_speed in 0.0..80.0f64,
        u in uncertainties(),
    ) {
        let report = evaluate(offset, scale, wind_speed, u).unwrap();
        for source in Source::ALL {
            let contribution = report.contributions().get(source);
            prop_assert!(contribution >= 0.0);
            prop_assert!(report.combined() >= contribution);
        }
        let (_, largest) = report.dominant_source();
        prop_assert!(Source::ALL.iter().all(|&s| report.contributions().get(s) <= largest));
    }

    #[test]
    fn zero_wind_has_zero_relative_uncertainty(
        offset in -2.0..2.0f64,
        scale in 0.01..5.0f64,
        u in uncertainties(),
    ) {
        let report = evaluate(offset, scale, 0.0, u).unwrap();
        prop_assert_eq!(report.relative_percent(), 0.0);
    }

    #[test]
    fn invalid_scale_is_always_rejected(scale in -5.0..=0.0f64) {
        prop_assert!(evaluate(0.4, scale, 5.0, [0.01, 0.002, 0.002]).is_err());
    }
}
