use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span};

use speccheck_core::{load_config, resolve_config_path};
use speccheck_store::{AssignOutcome, OrderStore, RemoveOutcome, SqliteOrderStore};

use speccheck_cli::progress::BatteryGauge;
use speccheck_cli::scheduler::{spawn_line_reader, spawn_polling};
use speccheck_cli::session::{Console, Session, SessionOptions};
use speccheck_cli::summary::{
    assign_message, gauge_message, live_table, print_check, serials_table, snapshot_table,
};
use speccheck_cli::workflow::{Workbench, search_in_background};

use crate::cli::{AssignArgs, BatteryArgs, CheckArgs, LiveArgs, RemoveArgs, SerialArgs};

type Bench = Arc<Workbench<SqliteOrderStore>>;

/// Load the configuration and build the workbench. Any failure is fatal.
pub fn open_workbench(explicit: Option<&Path>) -> Result<Workbench<SqliteOrderStore>> {
    let path = resolve_config_path(explicit).context("locate configuration")?;
    let config = load_config(&path).context("load configuration")?;
    let workbench = Workbench::from_config(&config, &path);
    info!(
        provider = workbench.reader().provider_name(),
        database = %workbench.manager().store().path().display(),
        "workbench ready"
    );
    Ok(workbench)
}

fn stdin_console() -> Console<io::Stdout> {
    Console::new(io::stdout(), spawn_line_reader(BufReader::new(io::stdin())))
}

/// Returns whether every field matched.
pub fn run_check(workbench: &Bench, args: &CheckArgs) -> Result<bool> {
    let check = search_in_background(workbench, &args.order_number)?
        .ok_or_else(|| anyhow!("order {} was not found", args.order_number))?;
    if args.json {
        let json = serde_json::to_string_pretty(&check).context("serialize check result")?;
        println!("{json}");
    } else {
        print_check(&check);
        let battery = workbench.reader().battery_status();
        println!("Battery: {}", gauge_message(&battery, &battery));
    }
    Ok(check.report.all_match())
}

pub fn run_live(workbench: &Bench, args: &LiveArgs) -> Result<()> {
    let spec = workbench.reader().read();
    if args.json {
        let json = serde_json::to_string_pretty(&spec).context("serialize live spec")?;
        println!("{json}");
    } else {
        println!("{}", live_table(&spec));
    }
    Ok(())
}

/// Assign the live unit with its stored results overlaid by the flags.
pub fn run_assign(workbench: &Bench, args: &AssignArgs) -> Result<AssignOutcome> {
    let span = info_span!("assign_command", order_number = %args.order_number);
    let _guard = span.enter();

    let actual = workbench.reader().read();
    let mut results = workbench
        .manager()
        .previous_results(&args.order_number, actual.serial_number())
        .context("load previous test results")?;
    results.merge(&args.results());

    let outcome = if args.yes {
        let accept = |_: &str, _: &[String], _: &str| true;
        workbench.assign(&args.order_number, &actual, &results, &accept)?
    } else {
        let console = stdin_console();
        workbench.assign(&args.order_number, &actual, &results, &console)?
    };
    println!(
        "{}",
        assign_message(actual.serial_number(), &args.order_number, &outcome)
    );
    Ok(outcome)
}

pub fn run_serials(workbench: &Bench, order_number: &str) -> Result<()> {
    let rows = workbench
        .manager()
        .list(order_number)
        .with_context(|| format!("list serials for order {order_number}"))?;
    if rows.is_empty() {
        println!("No serial numbers are assigned to order {order_number}.");
    } else {
        println!("{}", serials_table(&rows));
    }
    Ok(())
}

pub fn run_spec(workbench: &Bench, args: &SerialArgs) -> Result<()> {
    let snapshot = workbench
        .manager()
        .view_spec(&args.order_number, &args.serial_number)
        .with_context(|| format!("load spec for serial {}", args.serial_number))?
        .ok_or_else(|| {
            anyhow!(
                "serial {} is not assigned to order {}",
                args.serial_number,
                args.order_number
            )
        })?;
    println!("{}", snapshot_table(&snapshot));
    Ok(())
}

pub fn run_remove(workbench: &Bench, args: &RemoveArgs) -> Result<RemoveOutcome> {
    let target = &args.target;
    let outcome = workbench
        .manager()
        .remove(&target.order_number, &target.serial_number, || {
            args.yes
                || stdin_console().confirm(&format!(
                    "Remove serial {} from order {}?",
                    target.serial_number, target.order_number
                ))
        })
        .with_context(|| format!("remove serial {}", target.serial_number))?;
    match outcome {
        RemoveOutcome::Removed => println!(
            "Serial {} removed from order {}.",
            target.serial_number, target.order_number
        ),
        RemoveOutcome::NotFound => println!(
            "Serial {} is not assigned to order {}.",
            target.serial_number, target.order_number
        ),
        RemoveOutcome::Declined => println!("Nothing removed."),
    }
    Ok(outcome)
}

/// Poll the charge until `--count` readings have been shown.
pub fn run_battery(workbench: &Bench, args: &BatteryArgs) -> Result<()> {
    let initial = workbench.reader().battery_status();
    let mut gauge = BatteryGauge::new(initial);

    let poller = Arc::clone(workbench);
    let interval = Duration::from_secs(args.interval.max(1));
    let (task, readings) = spawn_polling("battery", interval, move || {
        poller.reader().battery_status()
    });
    let count = args.count.unwrap_or(usize::MAX);
    for status in readings.iter().take(count) {
        gauge.update(&status);
    }
    task.join();
    gauge.finish();
    Ok(())
}

pub fn run_session(workbench: &Bench, order_number: &str) -> Result<()> {
    let session = Session::new(
        Arc::clone(workbench),
        order_number,
        stdin_console(),
        SessionOptions::default(),
    );
    session.run();
    Ok(())
}

pub fn run_init_db(workbench: &Bench) -> Result<()> {
    let store = workbench.manager().store();
    store.init_schema().context("create order tables")?;
    println!("Order tables ready in {}", store.path().display());
    Ok(())
}
