use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{PlotError, Result};

/// Wake-up flag shared between mutators and the redraw thread.
#[derive(Debug, Default)]
pub struct DirtySignal {
    dirty: Mutex<bool>,
    wake: Condvar,
}

impl DirtySignal {
    /// Create a clear signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the plot dirty and wake the redraw thread.
    pub fn raise(&self) {
        let mut dirty = self.dirty.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *dirty = true;
        self.wake.notify_one();
    }

    /// Wait until the signal is raised or `timeout` elapses.
    ///
    /// Returns whether the signal was raised, and clears it.
    pub fn wait(&self, timeout: Duration) -> bool {
        let dirty = self.dirty.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let (mut dirty, _) = self
            .wake
            .wait_timeout_while(dirty, timeout, |dirty| !*dirty)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *dirty, false)
    }
}

/// Owner of a background redraw thread.
///
/// Dropping the host stops the loop and blocks until the thread has exited,
/// which also drops everything the draw callback owns.
#[derive(Debug)]
pub struct DisplayHost {
    stop: Arc<AtomicBool>,
    signal: Arc<DirtySignal>,
    handle: Option<JoinHandle<()>>,
}

impl DisplayHost {
    /// Spawn a redraw thread calling `draw` at least once per `tick`.
    ///
    /// `draw` receives whether the wake-up came from the dirty signal.
    pub fn spawn<F>(name: &str, tick: Duration, signal: Arc<DirtySignal>, mut draw: F) -> Result<Self>
    where
        F: FnMut(bool) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(tick_ms = tick.as_millis() as u64, "redraw thread started");
                let mut frames: u64 = 0;
                while !thread_stop.load(Ordering::Acquire) {
                    let dirty = thread_signal.wait(tick);
                    if thread_stop.load(Ordering::Acquire) {
                        break;
                    }
                    let started = Instant::now();
                    draw(dirty);
                    frames += 1;
                    let elapsed = started.elapsed();
                    if elapsed > tick {
                        warn!(
                            elapsed_ms = elapsed.as_millis() as u64,
                            tick_ms = tick.as_millis() as u64,
                            "redraw is lagging behind the tick"
                        );
                    }
                }
                debug!(iterations = frames, "redraw thread stopped");
            })
            .map_err(PlotError::Spawn)?;
        Ok(Self {
            stop,
            signal,
            handle: Some(handle),
        })
    }

    /// Raise the dirty signal.
    pub fn request_redraw(&self) {
        self.signal.raise();
    }

    /// Check whether the thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the thread and wait for it. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.signal.raise();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("redraw thread panicked");
            }
        }
    }
}

impl Drop for DisplayHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn signal_wakes_before_timeout() {
        let signal = Arc::new(DirtySignal::new());
        signal.raise();
        let started = Instant::now();
        assert!(signal.wait(Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!signal.wait(Duration::from_millis(1)));
    }

    #[test]
    fn ticks_without_signal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let host = DisplayHost::spawn(
            "tick-test",
            Duration::from_millis(2),
            Arc::new(DirtySignal::new()),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(host.is_running());
        drop(host);
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn drop_joins_and_releases_callback_state() {
        struct Guard(Arc<AtomicBool>);
        impl Guard {
            fn touch(&self) {}
        }
        impl Drop for Guard {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let released = Arc::new(AtomicBool::new(false));
        let guard = Guard(Arc::clone(&released));
        let host = DisplayHost::spawn(
            "drop-test",
            Duration::from_secs(60),
            Arc::new(DirtySignal::new()),
            move |_| guard.touch(),
        )
        .unwrap();
        drop(host);
        assert!(released.load(Ordering::SeqCst));
    }
}
