//! Clock tree
//!
//! Every clock of a DaVinci part (PLL outputs, SYSCLK dividers, PSC module gates, CFGCHIP muxes)
//! implements [`ClkOps`] and is registered into a [`ClockTree`]. The tree owns the parent/child
//! wiring, the enable counts and the cached rates; the node types only know how to drive their
//! own registers.
//!
//! ## Usage
//!
//! ```no_run
//! use davinci_clk::clocks::{ClkInit, ClockTree, FixedFactor, FixedRate};
//! use fugit::{HertzU32, RateExtU32};
//!
//! let mut tree = ClockTree::new();
//! let ref_clk = tree.register(ClkInit::new("ref_clk", FixedRate::new(24.MHz())))?;
//! let half = tree.register(ClkInit::new("ref_half", FixedFactor::new(1, 2)).parent("ref_clk"))?;
//! assert_eq!(tree.get_rate(half), HertzU32::MHz(12));
//! assert_eq!(tree.get_parent(half), Some(ref_clk));
//! # Ok::<(), davinci_clk::ClockError>(())
//! ```
//!
//! See [Chapter 6 "Device Clocking"](https://www.ti.com/lit/pdf/spruh77) of the OMAP-L138
//! technical reference manual for how the clock domains are laid out on a real part.

use core::fmt;

use embedded_hal::delay::DelayNs;
use fugit::HertzU32;

mod fixed;
mod primitives;
mod tree;

pub use fixed::{FixedFactor, FixedRate};
pub(crate) use primitives::{Divider, Gate, Mux};
pub use tree::{ClkId, ClkInit, ClockTree};

/// Errors reported by clock operations.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// No clock with the requested name or handle is registered.
    UnknownClock,
    /// A clock with the same name is already registered.
    DuplicateName,
    /// The selected parent of a clock has not been registered yet.
    MissingParent,
    /// The parent index or register encoding doesn't match any of the clock's parents.
    InvalidParentIndex,
    /// The clock can't perform the requested operation (e.g. a divider fixed by a strap).
    NotSupported,
    /// A divider ratio outside of what the register field can hold.
    InvalidDivider,
    /// A PLL multiplier outside of the PLL's legal range.
    MultiplierOutOfRange,
    /// No legal configuration produces the requested rate.
    RateOutOfRange,
    /// The clock was disabled more often than it was enabled.
    NotEnabled,
    /// Hardware did not acknowledge a transition in time.
    Timeout,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ClockError::UnknownClock => "unknown clock",
            ClockError::DuplicateName => "clock name already registered",
            ClockError::MissingParent => "parent clock not registered",
            ClockError::InvalidParentIndex => "invalid parent index",
            ClockError::NotSupported => "operation not supported",
            ClockError::InvalidDivider => "invalid divider ratio",
            ClockError::MultiplierOutOfRange => "multiplier out of range",
            ClockError::RateOutOfRange => "rate out of range",
            ClockError::NotEnabled => "clock not enabled",
            ClockError::Timeout => "hardware timeout",
        };
        f.write_str(msg)
    }
}

/// Registry-level behaviour of a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClkFlags {
    /// Enabled when registered and never turned off again. Turning these off hangs the chip.
    pub critical: bool,
    /// Rate requests the node can't satisfy on its own are forwarded to its parent.
    pub set_rate_parent: bool,
}

impl ClkFlags {
    /// No special behaviour.
    pub const NONE: ClkFlags = ClkFlags {
        critical: false,
        set_rate_parent: false,
    };

    /// See [`ClkFlags::critical`].
    pub const CRITICAL: ClkFlags = ClkFlags {
        critical: true,
        set_rate_parent: false,
    };

    /// See [`ClkFlags::set_rate_parent`].
    pub const SET_RATE_PARENT: ClkFlags = ClkFlags {
        critical: false,
        set_rate_parent: true,
    };
}

/// Hardware operations of one clock node.
///
/// The defaults describe a clock that is always running, passes its parent rate through and
/// can't be reconfigured.
pub trait ClkOps {
    /// Ungates the clock. Called by the tree once the parent is running.
    fn enable(&self) -> Result<(), ClockError> {
        Ok(())
    }

    /// Gates the clock. Called by the tree before the parent is released.
    fn disable(&self) -> Result<(), ClockError> {
        Ok(())
    }

    /// Hardware view of the gate, or `None` if the clock has no gate of its own.
    fn is_enabled(&self) -> Option<bool> {
        None
    }

    /// Output rate for the given parent rate, as currently programmed.
    fn recalc_rate(&self, parent_rate: HertzU32) -> HertzU32 {
        parent_rate
    }

    /// Closest rate not above `rate` this clock can produce from `parent_rate` by itself.
    fn round_rate(&self, rate: HertzU32, parent_rate: HertzU32) -> Result<HertzU32, ClockError> {
        let _ = (rate, parent_rate);
        Err(ClockError::NotSupported)
    }

    /// Reprograms the clock to `rate`, which must come from [`ClkOps::round_rate`].
    fn set_rate(
        &self,
        rate: HertzU32,
        parent_rate: HertzU32,
        delay: &mut dyn DelayNs,
    ) -> Result<(), ClockError> {
        let _ = (rate, parent_rate, delay);
        Err(ClockError::NotSupported)
    }

    /// Parent rate that makes this clock output `rate` without touching its own settings.
    ///
    /// `None` if the output doesn't follow the parent (fixed rate sources, PLLs).
    fn parent_rate_for(&self, rate: HertzU32) -> Option<HertzU32> {
        Some(rate)
    }

    /// Index of the selected parent.
    fn get_parent(&self) -> Result<usize, ClockError> {
        Ok(0)
    }

    /// Selects the parent at `index`.
    fn set_parent(&self, index: usize) -> Result<(), ClockError> {
        let _ = index;
        Err(ClockError::NotSupported)
    }

    /// Holds the module behind this clock in local reset.
    fn reset_assert(&self) -> Result<(), ClockError> {
        Err(ClockError::NotSupported)
    }

    /// Releases the module behind this clock from local reset.
    fn reset_deassert(&self) -> Result<(), ClockError> {
        Err(ClockError::NotSupported)
    }
}

/// `parent / div`, rounded down.
pub(crate) fn div_rate(parent: HertzU32, div: u32) -> HertzU32 {
    HertzU32::from_raw(parent.raw() / div.max(1))
}

/// `rate * mult`, saturating instead of wrapping.
pub(crate) fn mul_rate(rate: HertzU32, mult: u32) -> HertzU32 {
    HertzU32::from_raw(rate.raw().saturating_mul(mult))
}
