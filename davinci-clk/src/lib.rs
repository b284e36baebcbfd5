//! Clock tree engine for the TI DaVinci family
//!
//! This crate drives the clock hardware shared by the DA830, DA850 (OMAP-L138 / AM18xx), DM355,
//! DM365, DM644x and DM646x parts:
//!
//! * the PLL controllers ([`pll`]): multiplier/divider readback, the closest-rate search and the
//!   bypass / reset / relock reprogram sequence, plus the SYSCLK, AUXCLK, SYSCLKBP and OBSCLK
//!   outputs hanging off each PLL,
//! * the Power and Sleep Controller ([`psc`]): per-module state transitions, power-domain
//!   bring-up and local reset,
//! * the DA8xx CFGCHIP clock gates and muxes ([`cfgchip`]),
//! * a [`ClockTree`](clocks::ClockTree) registry that wires all of the above into a named
//!   parent/child graph with enable counting and rate propagation,
//! * static descriptions of each supported chip ([`soc`]).
//!
//! Register blocks are reached through the [`RegisterAccess`](regmap::RegisterAccess) trait, so
//! the same code runs against memory-mapped hardware or a recorded fake.
//!
//! # Crate features
//!
//! * **defmt** -
//!   Implement `defmt::Format` for several types.

#![warn(missing_docs)]
#![no_std]

extern crate alloc;

pub mod cfgchip;
pub mod clocks;
pub mod pll;
pub mod poll;
pub mod psc;
pub mod regmap;
pub mod soc;

pub use clocks::{ClkFlags, ClkId, ClkInit, ClkOps, ClockError, ClockTree};
pub use poll::PollPolicy;
pub use regmap::RegisterAccess;
