//! Interactive session for one order.
//!
//! The session searches the order on a worker thread, polls the battery
//! charge in the background for the prompt's gauge and runs the manual
//! hardware tests. Test results stay in memory until they are assigned
//! together with the unit's serial number.

use std::cell::RefCell;
use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{Receiver, select};
use tracing::info;

use speccheck_model::{BatteryStatus, HardwareTest, TestOutcome, TestResultSet};
use speccheck_store::{OrderStore, ReassignPrompt, RemoveOutcome};
use speccheck_telemetry::RemovableDevice;

use crate::scheduler::spawn_polling;
use crate::summary::{
    assign_message, gauge_message, render_check, results_table, serials_table, snapshot_table,
};
use crate::workflow::{OrderCheck, Workbench, failure_notice, search_in_background};

const HELP: &str = "\
Commands:
  test <name>      run a hardware test (keyboard, speaker, display, webcam, usb)
  results          show this unit's test results
  assign           assign this unit's serial number to the order
  serials          list serial numbers assigned to the order
  spec <serial>    show the spec stored for an assigned serial number
  remove <serial>  remove a serial number from the order
  recheck          search the order again
  help             show this help
  quit             end the session";

/// Line-oriented terminal for the session.
///
/// Input arrives over a channel so it can be waited on alongside
/// background results.
pub struct Console<W> {
    out: RefCell<W>,
    input: Receiver<String>,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, input: Receiver<String>) -> Self {
        Self {
            out: RefCell::new(out),
            input,
        }
    }

    pub fn say(&self, text: impl Display) {
        let mut out = self.out.borrow_mut();
        let _ = writeln!(out, "{text}");
    }

    fn prompt(&self, text: impl Display) {
        let mut out = self.out.borrow_mut();
        let _ = write!(out, "{text}");
        let _ = out.flush();
    }

    /// Next input line, or `None` once input is closed.
    pub fn read_line(&self) -> Option<String> {
        self.input.recv().ok()
    }

    pub fn ask(&self, question: &str) -> Option<String> {
        self.prompt(format_args!("{question} "));
        self.read_line()
    }

    /// Ask until the answer is yes or no. Closed input counts as no.
    pub fn confirm(&self, question: &str) -> bool {
        loop {
            let Some(answer) = self.ask(&format!("{question} [y/n]")) else {
                return false;
            };
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.say("Please answer y or n."),
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> ReassignPrompt for Console<W> {
    fn confirm_reassign(&self, serial_number: &str, existing: &[String], target: &str) -> bool {
        self.confirm(&format!(
            "Serial {serial_number} is already assigned to order {}. Reassign it to order {target}?",
            existing.join(", ")
        ))
    }
}

/// A session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Test(HardwareTest),
    Results,
    Assign,
    Serials,
    Spec(String),
    Remove(String),
    Recheck,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments for {command}"));
        }
        let required = |name: &str| {
            argument
                .map(str::to_string)
                .ok_or_else(|| format!("usage: {command} <{name}>"))
        };
        match command.as_str() {
            "test" => required("name")?.parse().map(Self::Test),
            "results" => Ok(Self::Results),
            "assign" => Ok(Self::Assign),
            "serials" => Ok(Self::Serials),
            "spec" => required("serial").map(Self::Spec),
            "remove" => required("serial").map(Self::Remove),
            "recheck" | "search" => Ok(Self::Recheck),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command: {other} (type help)")),
        }
    }
}

/// Polling intervals for a session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub battery_interval: Duration,
    pub device_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            battery_interval: Duration::from_secs(5),
            device_interval: Duration::from_secs(1),
        }
    }
}

pub struct Session<S, W> {
    workbench: Arc<Workbench<S>>,
    console: Console<W>,
    order_number: String,
    options: SessionOptions,
    check: Option<OrderCheck>,
    results: TestResultSet,
    initial_charge: BatteryStatus,
    charge: BatteryStatus,
}

impl<S, W> Session<S, W>
where
    S: OrderStore + Send + Sync + 'static,
    W: Write,
{
    /// Start a session, capturing the battery charge the gauge measures
    /// from.
    pub fn new(
        workbench: Arc<Workbench<S>>,
        order_number: &str,
        console: Console<W>,
        options: SessionOptions,
    ) -> Self {
        let initial_charge = workbench.reader().battery_status();
        Self {
            workbench,
            console,
            order_number: order_number.to_string(),
            options,
            check: None,
            results: TestResultSet::new(),
            initial_charge,
            charge: initial_charge,
        }
    }

    pub fn results(&self) -> &TestResultSet {
        &self.results
    }

    /// Run until `quit` or end of input. Returns the output sink.
    pub fn run(mut self) -> W {
        info!(order_number = %self.order_number, "session started");
        self.recheck();

        let workbench = Arc::clone(&self.workbench);
        let (battery_task, charges) =
            spawn_polling("battery", self.options.battery_interval, move || {
                workbench.reader().battery_status()
            });

        loop {
            if let Some(status) = charges.try_iter().last() {
                self.charge = status;
            }
            self.console.prompt(format_args!(
                "[{}] order {}> ",
                gauge_message(&self.initial_charge, &self.charge),
                self.order_number
            ));
            let Some(line) = self.console.read_line() else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<SessionCommand>() {
                Ok(SessionCommand::Quit) => break,
                Ok(command) => self.execute(command),
                Err(message) => self.console.say(message),
            }
        }

        battery_task.cancel();
        info!(order_number = %self.order_number, "session closed");
        self.console.into_inner()
    }

    pub fn execute(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Test(test) => self.run_test(test),
            SessionCommand::Results => self.console.say(results_table(&self.results)),
            SessionCommand::Assign => self.assign(),
            SessionCommand::Serials => self.list_serials(),
            SessionCommand::Spec(serial) => self.show_spec(&serial),
            SessionCommand::Remove(serial) => self.remove(&serial),
            SessionCommand::Recheck => self.recheck(),
            SessionCommand::Help => self.console.say(HELP),
            SessionCommand::Quit => {}
        }
    }

    /// Search the order on a worker thread and show the comparison.
    ///
    /// Stored results for the unit are loaded under any recorded this
    /// session.
    fn recheck(&mut self) {
        match search_in_background(&self.workbench, &self.order_number) {
            Ok(Some(check)) => {
                self.console.say(render_check(&check));
                let mut results = check.previous.clone();
                results.merge(&self.results);
                self.results = results;
                self.check = Some(check);
            }
            Ok(None) => {
                self.console
                    .say(format!("Order {} was not found.", self.order_number));
                self.check = None;
            }
            Err(error) => self.console.say(failure_notice("Search", &error)),
        }
    }

    fn run_test(&mut self, test: HardwareTest) {
        let outcome = match test {
            HardwareTest::Usb => self.run_usb_test(),
            _ => {
                self.console.say(instructions(test));
                self.ask_outcome(test)
            }
        };
        if let Some(outcome) = outcome {
            self.results.record(test, outcome);
            info!(test = %test, outcome = %outcome, "hardware test recorded");
        }
    }

    /// Watch removable devices until the technician presses Enter.
    fn run_usb_test(&mut self) -> Option<TestOutcome> {
        self.console.say(instructions(HardwareTest::Usb));
        let workbench = Arc::clone(&self.workbench);
        let (task, updates) = spawn_polling("usb devices", self.options.device_interval, move || {
            workbench
                .reader()
                .removable_devices()
                .map_err(|error| error.to_string())
        });

        let mut shown: Option<Vec<RemovableDevice>> = None;
        let mut failed = false;
        loop {
            select! {
                recv(updates) -> update => match update {
                    Ok(Ok(devices)) => {
                        if shown.as_ref() != Some(&devices) {
                            self.console.say(describe_devices(&devices));
                            shown = Some(devices);
                        }
                    }
                    Ok(Err(error)) => {
                        if !failed {
                            self.console.say(format!("Could not list USB devices: {error}"));
                            failed = true;
                        }
                    }
                    Err(_) => {
                        let _ = self.console.read_line();
                        break;
                    }
                },
                recv(self.console.input) -> _ => break,
            }
        }
        task.cancel();
        self.ask_outcome(HardwareTest::Usb)
    }

    /// `None` when the technician skips the question or input ends.
    fn ask_outcome(&self, test: HardwareTest) -> Option<TestOutcome> {
        loop {
            let answer = self
                .console
                .ask(&format!("{} passed? [y/n, Enter to skip]", test.label()))?;
            if answer.trim().is_empty() || answer.trim().eq_ignore_ascii_case("skip") {
                return None;
            }
            match answer.parse::<TestOutcome>() {
                Ok(outcome) => return Some(outcome),
                Err(message) => self.console.say(message),
            }
        }
    }

    fn assign(&self) {
        let Some(check) = &self.check else {
            self.console
                .say("Nothing to assign: search the order first (recheck).");
            return;
        };
        let serial_number = check.actual.serial_number();
        let outcome = self.workbench.assign(
            &self.order_number,
            &check.actual,
            &self.results,
            &self.console,
        );
        match outcome {
            Ok(outcome) => self.console.say(assign_message(
                serial_number,
                &self.order_number,
                &outcome,
            )),
            Err(error) => self.console.say(failure_notice("Assign", &error)),
        }
    }

    fn list_serials(&self) {
        let rows = self
            .workbench
            .manager()
            .list(&self.order_number)
            .with_context(|| format!("list serials for order {}", self.order_number));
        match rows {
            Ok(rows) if rows.is_empty() => self.console.say(format!(
                "No serial numbers are assigned to order {}.",
                self.order_number
            )),
            Ok(rows) => self.console.say(serials_table(&rows)),
            Err(error) => self.console.say(failure_notice("View", &error)),
        }
    }

    fn show_spec(&self, serial_number: &str) {
        let snapshot = self
            .workbench
            .manager()
            .view_spec(&self.order_number, serial_number)
            .with_context(|| format!("load spec for serial {serial_number}"));
        match snapshot {
            Ok(Some(snapshot)) => self.console.say(snapshot_table(&snapshot)),
            Ok(None) => self.console.say(format!(
                "Serial {serial_number} is not assigned to order {}.",
                self.order_number
            )),
            Err(error) => self.console.say(failure_notice("View", &error)),
        }
    }

    fn remove(&self, serial_number: &str) {
        let outcome = self
            .workbench
            .manager()
            .remove(&self.order_number, serial_number, || {
                self.console.confirm(&format!(
                    "Remove serial {serial_number} from order {}?",
                    self.order_number
                ))
            })
            .with_context(|| format!("remove serial {serial_number}"));
        match outcome {
            Ok(RemoveOutcome::Removed) => self.console.say(format!(
                "Serial {serial_number} removed from order {}.",
                self.order_number
            )),
            Ok(RemoveOutcome::NotFound) => self.console.say(format!(
                "Serial {serial_number} is not assigned to order {}.",
                self.order_number
            )),
            Ok(RemoveOutcome::Declined) => self.console.say("Nothing removed."),
            Err(error) => self.console.say(failure_notice("Remove", &error)),
        }
    }
}

fn instructions(test: HardwareTest) -> &'static str {
    match test {
        HardwareTest::Keyboard => "Press every key on the keyboard and check each one registers.",
        HardwareTest::Speaker => "Play a sound and listen on both the left and right speaker.",
        HardwareTest::Display => {
            "Show full-screen red, green, blue, white and black; look for dead pixels and bleed."
        }
        HardwareTest::Webcam => "Open the camera and check the picture is clear.",
        HardwareTest::Usb => {
            "Insert a USB device into each port. Detected devices are listed below; \
             press Enter when done."
        }
    }
}

fn describe_devices(devices: &[RemovableDevice]) -> String {
    if devices.is_empty() {
        return "USB devices: none".to_string();
    }
    let names: Vec<String> = devices.iter().map(ToString::to_string).collect();
    format!("USB devices: {}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            "test USB".parse::<SessionCommand>(),
            Ok(SessionCommand::Test(HardwareTest::Usb))
        );
        assert_eq!(
            "  spec PF1ABC ".parse::<SessionCommand>(),
            Ok(SessionCommand::Spec("PF1ABC".to_string()))
        );
        assert_eq!("exit".parse::<SessionCommand>(), Ok(SessionCommand::Quit));
    }

    #[test]
    fn rejects_bad_commands() {
        assert_eq!(
            "remove".parse::<SessionCommand>(),
            Err("usage: remove <serial>".to_string())
        );
        assert!("test mouse".parse::<SessionCommand>().is_err());
        assert!("spec A B".parse::<SessionCommand>().is_err());
        assert!("dance".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn confirm_repeats_until_answered() {
        let (sender, receiver) = crossbeam_channel::unbounded();
        for line in ["maybe", "Y"] {
            sender.send(line.to_string()).unwrap();
        }
        drop(sender);
        let console = Console::new(Vec::new(), receiver);

        assert!(console.confirm("Proceed?"));
        assert!(!console.confirm("Again?"));
        let output = String::from_utf8(console.into_inner()).unwrap();
        assert!(output.contains("Please answer y or n."));
    }

    #[test]
    fn device_list_is_readable() {
        assert_eq!(describe_devices(&[]), "USB devices: none");
        let devices = vec![RemovableDevice {
            id: "E:".to_string(),
            description: "KINGSTON".to_string(),
        }];
        assert_eq!(describe_devices(&devices), "USB devices: E: - KINGSTON");
    }
}
