/*!
 * Throttled checkpointing of the dataset.
 *
 * `Throttle` is a pure rate limiter over a caller-supplied clock: the first
 * request fires, requests inside the window are coalesced into a pending
 * flag, and the first request after the window closes fires again.
 * `Checkpointer` puts a throttle in front of a `CheckpointSink`.
 */

use log::debug;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

use crate::dataset::{CharacterRecord, CheckpointSink};
use crate::errors::AppError;

/// Monotonic time source, as an offset from an arbitrary origin
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

/// Bookkeeping for at-most-one fire per window
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Duration,
    last_fired: Option<Duration>,
    pending: bool,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
            pending: false,
        }
    }

    /// Register a request at `now`; true means the caller should fire now
    pub fn request(&mut self, now: Duration) -> bool {
        let open = match self.last_fired {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.window,
        };
        if open {
            self.last_fired = Some(now);
            self.pending = false;
        } else {
            self.pending = true;
        }
        open
    }

    /// Whether a coalesced request has not been served yet
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Serve a pending request regardless of the window; true if there was one
    pub fn take_pending(&mut self, now: Duration) -> bool {
        if self.pending {
            self.pending = false;
            self.last_fired = Some(now);
            true
        } else {
            false
        }
    }
}

/// Throttled writer of whole-dataset checkpoints
pub struct Checkpointer<S> {
    sink: S,
    throttle: Throttle,
    clock: Box<dyn Clock>,
    writes: usize,
}

impl<S: CheckpointSink> Checkpointer<S> {
    /// Checkpointer on the real clock
    pub fn new(sink: S, window: Duration) -> Self {
        Self::with_clock(sink, window, Box::new(SystemClock::new()))
    }

    pub fn with_clock(sink: S, window: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            sink,
            throttle: Throttle::new(window),
            clock,
            writes: 0,
        }
    }

    /// Ask for a checkpoint; writes only if the throttle window allows it.
    ///
    /// Returns whether a write happened.
    pub fn save(&mut self, records: &[CharacterRecord]) -> Result<bool, AppError> {
        if self.throttle.request(self.clock.now()) {
            self.write(records)?;
            Ok(true)
        } else {
            debug!("Checkpoint coalesced into the current throttle window");
            Ok(false)
        }
    }

    /// Write now if a coalesced request is still pending
    pub fn flush(&mut self, records: &[CharacterRecord]) -> Result<bool, AppError> {
        if self.throttle.take_pending(self.clock.now()) {
            self.write(records)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn has_pending(&self) -> bool {
        self.throttle.is_pending()
    }

    /// Number of writes performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn write(&mut self, records: &[CharacterRecord]) -> Result<(), AppError> {
        self.sink.write(records)?;
        self.writes += 1;
        debug!("Checkpoint #{} written ({} records)", self.writes, records.len());
        Ok(())
    }
}
