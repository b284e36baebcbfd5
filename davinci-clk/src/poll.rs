//! Busy-waiting on hardware status bits
//!
//! PLL and PSC sequences wait on status registers with interrupts possibly masked and before any
//! scheduler exists, so they spin. How long they may spin is a [`PollPolicy`].

use core::convert::Infallible;

use crate::clocks::ClockError;

/// Default number of status reads before a transition is declared stuck.
pub const DEFAULT_POLL_LIMIT: u32 = 0xffff;

/// How long a status poll may spin.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollPolicy {
    /// Give up with [`ClockError::Timeout`] after this many unsuccessful reads.
    Bounded(u32),
    /// Spin until the hardware answers.
    ///
    /// A module that never acknowledges hangs the caller. Only use this where abandoning a half
    /// finished transition is worse than hanging.
    Forever,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::Bounded(DEFAULT_POLL_LIMIT)
    }
}

impl PollPolicy {
    /// Repeats `step` until it stops returning `WouldBlock`.
    ///
    /// `step` is always called at least once.
    pub fn block_on<F>(self, mut step: F) -> Result<(), ClockError>
    where
        F: FnMut() -> nb::Result<(), Infallible>,
    {
        match self {
            PollPolicy::Forever => match nb::block!(step()) {
                Ok(()) => Ok(()),
                Err(never) => match never {},
            },
            PollPolicy::Bounded(limit) => {
                for _ in 0..limit.max(1) {
                    match step() {
                        Ok(()) => return Ok(()),
                        Err(nb::Error::WouldBlock) => {}
                        Err(nb::Error::Other(never)) => match never {},
                    }
                }
                Err(ClockError::Timeout)
            }
        }
    }
}

/// Turns a status check into a poll step.
pub(crate) fn ready(done: bool) -> nb::Result<(), Infallible> {
    if done {
        Ok(())
    } else {
        Err(nb::Error::WouldBlock)
    }
}
