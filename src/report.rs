use std::fmt::{self, Display};
use std::io;

use itertools::Itertools;
use num_traits::Float;
use serde::Serialize;

use crate::margin::{UncertaintyReport, COVERAGE_PERCENT};
use crate::validation::Source;
use crate::Result;

const WIDTH: usize = 65;

/// Qualitative grade of a relative uncertainty
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Quality {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl Quality {
    /// Grade a relative uncertainty given in percent
    ///
    /// Each tier is bounded above by an exclusive threshold: below 3% is excellent, below 5% good,
    /// below 10% acceptable and anything else (including `NaN`) poor.
    pub fn from_relative_percent<E: Float>(percent: E) -> Self {
        let below =
            |threshold: f64| percent < E::from(threshold).expect("threshold must fit in `E`");
        if below(3.0) {
            Self::Excellent
        } else if below(5.0) {
            Self::Good
        } else if below(10.0) {
            Self::Acceptable
        } else {
            Self::Poor
        }
    }

    pub const fn recommendation(self) -> &'static str {
        match self {
            Self::Excellent => "Suitable for publication-quality research.",
            Self::Good => "Suitable for most research applications.",
            Self::Acceptable => "Suitable for preliminary studies.",
            Self::Poor => "Consider recalibration or better equipment.",
        }
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Acceptable => "Acceptable",
            Self::Poor => "Poor",
        };
        f.write_str(name)
    }
}

impl Source {
    /// Row label in the uncertainty budget
    pub const fn budget_label(self) -> &'static str {
        match self {
            Self::Voltage => "Voltage measurement",
            Self::Offset => "OFFSET constant",
            Self::Scale => "SCALE constant",
        }
    }

    /// Name used when this source dominates the budget
    pub const fn description(self) -> &'static str {
        match self {
            Self::Voltage => "Voltage measurement",
            Self::Offset => "OFFSET calibration",
            Self::Scale => "SCALE calibration",
        }
    }

    /// How to reduce the contribution of this source
    pub const fn advice(self) -> &'static str {
        match self {
            Self::Voltage => "Use a more accurate multimeter or ADC.",
            Self::Offset => {
                "Improve zero-point measurement procedure (more readings, better environment)."
            }
            Self::Scale => "Use more calibration points or better reference anemometer.",
        }
    }

    const fn sensitivity_unit(self) -> &'static str {
        match self {
            Self::Voltage | Self::Offset => "m/s/V",
            Self::Scale => "m²/s ",
        }
    }

    const fn uncertainty_unit(self) -> &'static str {
        match self {
            Self::Voltage | Self::Offset => "V   ",
            Self::Scale => "V/m/s",
        }
    }
}

/// The qualitative reading of a report
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Interpretation<E> {
    pub quality: Quality,
    pub recommendation: &'static str,
    pub dominant_source: Source,
    pub dominant_contribution: E,
    pub advice: &'static str,
}

impl<E: Float> Interpretation<E> {
    pub fn of(report: &UncertaintyReport<E>) -> Self {
        let quality = Quality::from_relative_percent(report.relative_percent());
        let (dominant_source, dominant_contribution) = report.dominant_source();
        Self {
            quality,
            recommendation: quality.recommendation(),
            dominant_source,
            dominant_contribution,
            advice: dominant_source.advice(),
        }
    }
}

/// Output layout selected on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Human-readable report
    #[default]
    Text,
    /// Report and interpretation as a TOML document
    Toml,
    /// Uncertainty budget as CSV, one row per input
    Csv,
}

/// Write `report` to `writer` in the requested `format`
///
/// Besides the human-readable text layout, a report can be written as a TOML document (the
/// report plus its interpretation) or as a CSV uncertainty budget with one row per input.
///
/// # Errors
/// Returns an error if serialisation fails or the writer cannot be written to.
pub fn write<E, W>(report: &UncertaintyReport<E>, format: Format, mut writer: W) -> Result<()>
where
    E: Float + Display + Serialize,
    W: io::Write,
{
    match format {
        Format::Text => write!(writer, "{}", Text(report))?,
        Format::Toml => writer.write_all(to_toml(report)?.as_bytes())?,
        Format::Csv => write_budget(report, writer)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct Document<'a, E> {
    report: &'a UncertaintyReport<E>,
    interpretation: Interpretation<E>,
}

/// Serialise `report` and its interpretation as TOML
///
/// # Errors
/// Returns an error if the report cannot be represented in TOML.
pub fn to_toml<E: Float + Serialize>(report: &UncertaintyReport<E>) -> Result<String> {
    let document = Document {
        report,
        interpretation: Interpretation::of(report),
    };
    Ok(toml::to_string(&document)?)
}

#[derive(Serialize)]
struct BudgetRow<E> {
    source: Source,
    sensitivity: E,
    uncertainty: E,
    contribution: E,
}

/// Write the uncertainty budget of `report` as CSV with a header row
///
/// # Errors
/// Returns an error if a row cannot be serialised or written.
pub fn write_budget<E, W>(report: &UncertaintyReport<E>, writer: W) -> Result<()>
where
    E: Float + Serialize,
    W: io::Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for source in Source::ALL {
        wtr.serialize(BudgetRow {
            source,
            sensitivity: report.sensitivities().get(source),
            uncertainty: report.uncertainty(source),
            contribution: report.contributions().get(source),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Text layout of a report
pub struct Text<'a, E>(pub &'a UncertaintyReport<E>);

fn rule(f: &mut fmt::Formatter<'_>, ch: char) -> fmt::Result {
    writeln!(f, "{}", ch.to_string().repeat(WIDTH))
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}")?;
    rule(f, '─')
}

impl<E: Float + Display> Display for Text<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let k = report.coverage_factor();
        let interpretation = Interpretation::of(report);

        writeln!(f)?;
        rule(f, '═')?;
        writeln!(
            f,
            "║{:8}Wind Speed Uncertainty Analysis (GUM Method){:12}║",
            "", ""
        )?;
        rule(f, '═')?;

        heading(f, "INPUT PARAMETERS:")?;
        writeln!(f, "Measured voltage (V):          {:.4} V", report.voltage())?;
        writeln!(f, "Calibration OFFSET:            {:.4} V", report.offset())?;
        writeln!(f, "Calibration SCALE:             {:.4} V/(m/s)", report.scale())?;
        writeln!(f, "Calculated wind speed:         {:.2} m/s", report.wind_speed())?;

        heading(f, "UNCERTAINTY CONTRIBUTIONS:")?;
        writeln!(
            f,
            "{:<20} | {:<11} | {:<11} | Contribution",
            "Source", "Sensitivity", "Uncertainty"
        )?;
        writeln!(f, "{}", [20, 13, 13, 13].iter().map(|w| "─".repeat(*w)).join("┼"))?;
        for source in Source::ALL {
            let sensitivity = report.sensitivities().get(source);
            // The scale coefficient is two orders of magnitude larger than the others
            let precision = if source == Source::Scale { 2 } else { 3 };
            writeln!(
                f,
                "{:<20} | {:>7.*} {} | {:>7.4} {} | {:>7.4} m/s",
                source.budget_label(),
                precision,
                sensitivity,
                source.sensitivity_unit(),
                report.uncertainty(source),
                source.uncertainty_unit(),
                report.contributions().get(source),
            )?;
        }

        heading(f, "COMBINED UNCERTAINTY:")?;
        writeln!(f, "Standard uncertainty u_c(v):   {:.4} m/s", report.combined())?;
        writeln!(
            f,
            "Expanded uncertainty U(k={k}):   {:.4} m/s ({COVERAGE_PERCENT}% confidence)",
            report.expanded()
        )?;
        writeln!(f, "Relative uncertainty:          {:.2}%", report.relative_percent())?;

        writeln!(f)?;
        writeln!(f, "RESULT:")?;
        rule(f, '═')?;
        writeln!(
            f,
            "Wind speed: {:.2} ± {:.2} m/s (k={k})",
            report.wind_speed(),
            report.expanded()
        )?;
        rule(f, '═')?;

        heading(f, "INTERPRETATION:")?;
        writeln!(f, "Uncertainty quality: {}", interpretation.quality)?;
        writeln!(f, "Recommendation: {}", interpretation.recommendation)?;

        heading(f, "DOMINANT UNCERTAINTY SOURCE:")?;
        writeln!(
            f,
            "Largest contributor: {} ({:.4} m/s)",
            interpretation.dominant_source.description(),
            interpretation.dominant_contribution
        )?;
        writeln!(f, "To improve accuracy: {}", interpretation.advice)?;
        writeln!(f)
    }
}
