// Ctrl-C handling
//
// Ctrl-C only bumps a counter; the launcher polls it between blocking calls.
// Children in the foreground process group (the `tail` processes) still get
// the signal and exit, which returns control to the supervise loop.

use crate::clock::Clock;
use crate::errors::{LaunchError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static SIGINT_COUNT: AtomicUsize = AtomicUsize::new(0);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What to do after the grace period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraceDecision {
    Stop,
    Resume,
}

/// Handle on a pending-interrupt counter
#[derive(Debug, Clone, Copy)]
pub struct Interrupts {
    count: &'static AtomicUsize,
}

impl Interrupts {
    /// Route Ctrl-C to the process-wide counter; only one handler per process
    pub fn install() -> Result<Self> {
        ctrlc::set_handler(|| {
            SIGINT_COUNT.fetch_add(1, Ordering::SeqCst);
        })
        .map_err(|e| LaunchError::Interrupt(e.to_string()))?;

        Ok(Self {
            count: &SIGINT_COUNT,
        })
    }

    /// Counter not connected to any signal; interrupts arrive via `raise`
    pub fn manual() -> Self {
        Self {
            count: Box::leak(Box::new(AtomicUsize::new(0))),
        }
    }

    pub fn raise(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn pending(&self) -> bool {
        self.count.load(Ordering::SeqCst) > 0
    }

    /// Consume pending interrupts; true if there were any
    pub fn take(&self) -> bool {
        self.count.swap(0, Ordering::SeqCst) > 0
    }

    /// Prompt for a second Ctrl-C and wait up to `grace` for it
    pub fn await_confirmation(&self, clock: &dyn Clock, grace: Duration) -> GraceDecision {
        println!("Press Ctrl-C again to stop the server: ");

        let deadline = clock.now() + grace;
        loop {
            if self.take() {
                return GraceDecision::Stop;
            }
            if clock.now() >= deadline {
                break;
            }
            clock.sleep(POLL_INTERVAL);
        }

        println!("Invalid response. Resuming...");
        GraceDecision::Resume
    }
}
