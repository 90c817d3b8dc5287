//! CLI argument definitions for speccheck.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use speccheck_model::{HardwareTest, TestOutcome, TestResultSet};

#[derive(Parser)]
#[command(
    name = "speccheck",
    version,
    about = "Check a refurbished laptop against its order and assign its serial",
    long_about = "Look up an order's SKU, read the running machine's hardware and \
                  compare the two field by field.\n\n\
                  Hardware test results and the machine's serial number can then be \
                  assigned to the order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: speccheck.toml next to the executable,
    /// then the platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Log file, appended to on every run. Use "-" to log to stderr.
    #[arg(
        long = "log-file",
        value_name = "PATH",
        default_value = "speccheck.log",
        global = true
    )]
    pub log_file: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare the running machine with an order's SKU.
    Check(CheckArgs),

    /// Print the running machine's spec.
    Live(LiveArgs),

    /// Assign this machine's serial number to an order.
    Assign(AssignArgs),

    /// List the serial numbers assigned to an order.
    Serials(OrderArg),

    /// Show the spec stored with an assigned serial number.
    Spec(SerialArgs),

    /// Remove a serial number from an order.
    Remove(RemoveArgs),

    /// Watch the battery charge.
    Battery(BatteryArgs),

    /// Interactive check, test and assignment session for one order.
    Session(OrderArg),

    /// Create the order tables in the configured database.
    InitDb,
}

#[derive(Args)]
pub struct OrderArg {
    #[arg(value_name = "ORDER")]
    pub order_number: String,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(value_name = "ORDER")]
    pub order_number: String,

    /// Print the result as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct LiveArgs {
    /// Print the spec as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct AssignArgs {
    #[arg(value_name = "ORDER")]
    pub order_number: String,

    /// Reassign without asking when the serial is bound to another order.
    #[arg(long = "yes", short = 'y')]
    pub yes: bool,

    #[arg(long = "keyboard", value_enum, value_name = "RESULT")]
    pub keyboard: Option<OutcomeArg>,

    #[arg(long = "speaker", value_enum, value_name = "RESULT")]
    pub speaker: Option<OutcomeArg>,

    #[arg(long = "display", value_enum, value_name = "RESULT")]
    pub display: Option<OutcomeArg>,

    #[arg(long = "webcam", value_enum, value_name = "RESULT")]
    pub webcam: Option<OutcomeArg>,

    #[arg(long = "usb", value_enum, value_name = "RESULT")]
    pub usb: Option<OutcomeArg>,
}

impl AssignArgs {
    /// Outcomes given on the command line.
    pub fn results(&self) -> TestResultSet {
        let mut results = TestResultSet::new();
        let flags = [
            (HardwareTest::Keyboard, self.keyboard),
            (HardwareTest::Speaker, self.speaker),
            (HardwareTest::Display, self.display),
            (HardwareTest::Webcam, self.webcam),
            (HardwareTest::Usb, self.usb),
        ];
        for (test, outcome) in flags {
            if let Some(outcome) = outcome {
                results.record(test, outcome.into());
            }
        }
        results
    }
}

#[derive(Args)]
pub struct SerialArgs {
    #[arg(value_name = "ORDER")]
    pub order_number: String,

    #[arg(value_name = "SERIAL")]
    pub serial_number: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub target: SerialArgs,

    /// Remove without asking.
    #[arg(long = "yes", short = 'y')]
    pub yes: bool,
}

#[derive(Args)]
pub struct BatteryArgs {
    /// Seconds between readings.
    #[arg(long = "interval", value_name = "SECS", default_value_t = 5)]
    pub interval: u64,

    /// Stop after this many readings (default: run until interrupted).
    #[arg(long = "count", value_name = "N")]
    pub count: Option<usize>,
}

/// Hardware test result choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    Pass,
    Fail,
}

impl From<OutcomeArg> for TestOutcome {
    fn from(value: OutcomeArg) -> Self {
        match value {
            OutcomeArg::Pass => TestOutcome::Pass,
            OutcomeArg::Fail => TestOutcome::Fail,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
