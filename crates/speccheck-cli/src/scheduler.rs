//! Background work owned by the foreground.
//!
//! Workers never touch the terminal; they hand their results over a
//! channel. A polling task lives as long as its [`TaskHandle`]: cancelling
//! or dropping the handle stops it at the next cycle, and it also stops on
//! its own once the receiving side is gone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

/// Owner of a running polling task.
pub struct TaskHandle {
    name: &'static str,
    alive: Arc<AtomicBool>,
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Request the task to stop. Returns immediately.
    pub fn cancel(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            tracing::debug!(task = self.name, "polling task cancelled");
        }
        let _ = self.stop.try_send(());
    }

    /// Whether the task is still running.
    pub fn is_active(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Cancel the task and wait for its thread to finish.
    pub fn join(mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("name", &self.name)
            .field("is_active", &self.is_active())
            .finish()
    }
}

/// Run `poll` now and then every `interval`, sending each value to the
/// returned receiver.
pub fn spawn_polling<T, F>(
    name: &'static str,
    interval: Duration,
    mut poll: F,
) -> (TaskHandle, Receiver<T>)
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let alive = Arc::new(AtomicBool::new(true));
    let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
    let (sender, receiver) = crossbeam_channel::unbounded();

    let flag = Arc::clone(&alive);
    let thread = std::thread::spawn(move || {
        tracing::debug!(task = name, ?interval, "polling task started");
        while flag.load(Ordering::SeqCst) {
            let value = poll();
            if !flag.load(Ordering::SeqCst) {
                break;
            }
            if sender.send(value).is_err() {
                tracing::debug!(task = name, "receiver gone");
                break;
            }
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        flag.store(false, Ordering::SeqCst);
        tracing::debug!(task = name, "polling task stopped");
    });

    let handle = TaskHandle {
        name,
        alive,
        stop: stop_tx,
        thread: Some(thread),
    };
    (handle, receiver)
}

/// Run `job` once on a worker thread. The receiver yields its result, or
/// disconnects without a value if the job panicked.
pub fn spawn_job<T, F>(name: &'static str, job: F) -> Receiver<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let _ = sender.send(job());
        tracing::debug!(task = name, "background job finished");
    });
    receiver
}

/// Forward lines from `input` until it is exhausted or the receiver goes
/// away.
pub fn spawn_line_reader<R>(input: R) -> Receiver<String>
where
    R: std::io::BufRead + Send + 'static,
{
    let (sender, receiver) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}
