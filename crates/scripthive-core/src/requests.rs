//! Bookkeeping for in-flight requests: stale-response epochs and the
//! at-most-one-in-flight flag used by submit buttons.

/// A response tagged with the view epoch it was requested under.
#[derive(Debug)]
pub struct Tagged<T> {
    pub epoch: u64,
    pub value: T,
}

/// Counts view mounts. A response whose epoch is no longer current belongs
/// to a view that has been torn down and must be discarded.
#[derive(Debug, Default)]
pub struct ViewEpoch {
    current: u64,
}

impl ViewEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down the current view and mount a new one.
    pub fn advance(&mut self) -> u64 {
        self.current = self.current.wrapping_add(1);
        self.current
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.current
    }
}

/// Tracks whether a request is outstanding.
#[derive(Debug, Default)]
pub struct InFlight {
    pending: bool,
}

impl InFlight {
    /// Mark a request as started. Returns false if one is already pending.
    pub fn try_begin(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn finish(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
