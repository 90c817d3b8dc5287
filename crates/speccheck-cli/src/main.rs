//! speccheck command line.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use clap::{ColorChoice, Parser};
use speccheck_cli::logging::{LogConfig, LogFormat, init_logging};
use speccheck_cli::workflow::{failure_notice, user_message};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    open_workbench, run_assign, run_battery, run_check, run_init_db, run_live, run_remove,
    run_serials, run_session, run_spec,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let workbench = match open_workbench(cli.config.as_deref()) {
        Ok(workbench) => Arc::new(workbench),
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "startup failed");
            eprintln!("error: {}", user_message(&error));
            std::process::exit(1);
        }
    };

    let (operation, result) = match &cli.command {
        Command::Check(args) => (
            "Search",
            run_check(&workbench, args).map(|all_match| if all_match { 0 } else { 1 }),
        ),
        Command::Live(args) => ("Read", run_live(&workbench, args).map(|()| 0)),
        Command::Assign(args) => ("Assign", run_assign(&workbench, args).map(|_| 0)),
        Command::Serials(args) => (
            "View",
            run_serials(&workbench, &args.order_number).map(|()| 0),
        ),
        Command::Spec(args) => ("View", run_spec(&workbench, args).map(|()| 0)),
        Command::Remove(args) => ("Remove", run_remove(&workbench, args).map(|_| 0)),
        Command::Battery(args) => ("Battery", run_battery(&workbench, args).map(|()| 0)),
        Command::Session(args) => (
            "Session",
            run_session(&workbench, &args.order_number).map(|()| 0),
        ),
        Command::InitDb => ("Initialize database", run_init_db(&workbench).map(|()| 0)),
    };
    let exit_code = match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {}", failure_notice(operation, &error));
            1
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: LevelFilter::INFO,
        ..LogConfig::default()
    };
    if cli.verbosity.is_present() {
        config.level_filter = cli.verbosity.tracing_level_filter();
    }
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let to_stderr = cli.log_file == Path::new("-");
    config.log_file = (!to_stderr).then(|| cli.log_file.clone());
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => to_stderr,
        ColorChoice::Never => false,
        ColorChoice::Auto => to_stderr && io::stderr().is_terminal(),
    };
    config
}
