use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::Level;

use wind_margin::config::Parameters;
use wind_margin::margin::analyse;
use wind_margin::report::{self, Format};
use wind_margin::Result;

#[derive(Parser, Debug)]
#[command(
    name = "wind_margin",
    about = "GUM-compliant wind speed uncertainty calculator",
    after_help = "Default uncertainties:\n  \
        - Voltage: 0.01 V (typical for 4.5-digit multimeter)\n  \
        - OFFSET: 0.002 V (typical for 10-reading zero-point calibration)\n  \
        - SCALE: 0.002 V/(m/s) (typical for 2-point calibration)"
)]
struct Cli {
    /// Calibration OFFSET constant (V)
    #[arg(long, allow_negative_numbers = true)]
    offset: Option<f64>,
    /// Calibration SCALE constant (V/(m/s))
    #[arg(long, allow_negative_numbers = true)]
    scale: Option<f64>,
    /// Wind speed at which to evaluate uncertainty (m/s)
    #[arg(long, allow_negative_numbers = true)]
    wind_speed: Option<f64>,
    /// Standard uncertainty in voltage measurement (V) [default: 0.01]
    #[arg(long, allow_negative_numbers = true)]
    u_voltage: Option<f64>,
    /// Standard uncertainty in OFFSET (V) [default: 0.002]
    #[arg(long, allow_negative_numbers = true)]
    u_offset: Option<f64>,
    /// Standard uncertainty in SCALE (V/(m/s)) [default: 0.002]
    #[arg(long, allow_negative_numbers = true)]
    u_scale: Option<f64>,
    /// TOML parameter file, overridden by any parameter given on the command line
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output layout
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Log to stderr, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn parameters(&self) -> Parameters {
        Parameters {
            offset: self.offset,
            scale: self.scale,
            wind_speed: self.wind_speed,
            u_voltage: self.u_voltage,
            u_offset: self.u_offset,
            u_scale: self.u_scale,
        }
    }

    fn execute(self) -> Result<()> {
        let file = match &self.config {
            Some(path) => Parameters::from_file(path)?,
            None => Parameters::default(),
        };
        let inputs = self.parameters().or(file).resolve()?.validate()?;
        let report = analyse(&inputs);

        let mut stdout = io::stdout().lock();
        report::write(&report, self.format, &mut stdout)?;
        stdout.flush()?;
        Ok(())
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::from(1)
        }
    }
}
