use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which a sleeping loop notices a stop request.
const SLICE: Duration = Duration::from_millis(200);

/// Shared stop flag for the poll loops. Cloning hands out another handle to
/// the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Routes Ctrl-C to this signal.
    pub fn install_ctrlc(&self) -> Result<(), ctrlc::Error> {
        let stop = self.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Ctrl-C received, stopping...");
            stop.stop();
        })
    }

    /// Sleeps for `duration` unless stopped first. Returns true if the full
    /// duration elapsed and no stop was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLICE.min(deadline - now));
        }
    }
}

/// Fixed-interval loop driver: the first tick fires immediately, every later
/// one after `interval`. Ends when the stop signal is raised.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    stop: StopSignal,
    first: bool,
}

impl Ticker {
    pub fn new(interval: Duration, stop: StopSignal) -> Self {
        Ticker {
            interval,
            stop,
            first: true,
        }
    }

    /// Blocks until the next tick. Returns false once stopped.
    pub fn tick(&mut self) -> bool {
        if self.first {
            self.first = false;
            return !self.stop.is_stopped();
        }
        self.stop.sleep(self.interval)
    }
}
