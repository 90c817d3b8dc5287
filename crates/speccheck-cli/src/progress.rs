//! Spinner for background searches and the live battery gauge.

use std::time::Duration;

use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};
use speccheck_model::{BatteryStatus, GaugeBand};

use crate::summary::gauge_message;

/// Wait for a background job's result behind a spinner.
///
/// Returns `None` if the job ended without sending a result.
pub fn wait_with_spinner<T>(receiver: &Receiver<T>, message: &'static str) -> Option<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = receiver.recv().ok();
    spinner.finish_and_clear();
    result
}

/// Charge bar colored by band, with the change since the first reading.
pub struct BatteryGauge {
    bar: ProgressBar,
    initial: BatteryStatus,
    band: Option<GaugeBand>,
}

impl BatteryGauge {
    pub fn new(initial: BatteryStatus) -> Self {
        let bar = ProgressBar::new(100);
        bar.set_prefix("Battery");
        let mut gauge = Self {
            bar,
            initial,
            band: None,
        };
        gauge.update(&initial);
        gauge
    }

    pub fn update(&mut self, current: &BatteryStatus) {
        let band = current.band();
        if self.band != Some(band) {
            self.bar.set_style(gauge_style(band));
            self.band = Some(band);
        }
        self.bar
            .set_position(u64::from(current.charge_percent.unwrap_or(0)));
        self.bar.set_message(gauge_message(&self.initial, current));
    }

    pub fn finish(self) {
        self.bar.finish();
    }
}

fn gauge_style(band: GaugeBand) -> ProgressStyle {
    let color = match band {
        GaugeBand::Good => "green",
        GaugeBand::Fair => "yellow",
        GaugeBand::Low => "red",
    };
    ProgressStyle::with_template(&format!("{{prefix}} [{{bar:30.{color}}}] {{msg}}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
