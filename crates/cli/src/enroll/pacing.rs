// Inter-row pacing
//
// The runner pauses after every row to stay under Apollo's rate limit.
// This is a fixed pause, not a backoff.

use std::time::Duration;

pub trait Pacer {
    fn pause(&mut self);
}

/// Blocking sleep of a fixed length. A zero delay never sleeps.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    fn pause(&mut self) {
        if !self.0.is_zero() {
            std::thread::sleep(self.0);
        }
    }
}
