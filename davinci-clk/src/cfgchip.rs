//! DA8xx chip configuration (CFGCHIP) clocks
//!
//! A handful of single-bit gates and two-way muxes live in the CFGCHIPn registers of the DA8xx
//! system configuration module. That block also holds pin muxing and USB PHY controls, so the
//! clocks here should be given a [`Syscon`](crate::regmap::Syscon) window whose offset 0 is
//! CFGCHIP0.

use crate::clocks::{ClkId, ClkInit, ClkOps, ClockError, ClockTree, Gate, Mux};
use crate::regmap::RegisterAccess;

/// Offset of CFGCHIPn from CFGCHIP0.
pub const fn cfgchip(n: u32) -> u32 {
    n * 4
}

/// A gate bit in a CFGCHIP register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CfgchipGateInfo {
    /// Clock name.
    pub name: &'static str,
    /// Parent clock name.
    pub parent: &'static str,
    /// Register offset, see [`cfgchip`].
    pub reg: u32,
    /// Bit number.
    pub bit: u8,
}

/// A two-way mux bit in a CFGCHIP register: clear selects `parents[0]`, set `parents[1]`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CfgchipMuxInfo {
    /// Clock name.
    pub name: &'static str,
    /// Parent clock names.
    pub parents: [&'static str; 2],
    /// Register offset, see [`cfgchip`].
    pub reg: u32,
    /// Bit number.
    pub bit: u8,
}

struct CfgchipGate<'a, R: RegisterAccess + ?Sized> {
    regs: &'a R,
    gate: Gate,
}

impl<R: RegisterAccess + ?Sized> ClkOps for CfgchipGate<'_, R> {
    fn enable(&self) -> Result<(), ClockError> {
        self.gate.enable(self.regs);
        Ok(())
    }

    fn disable(&self) -> Result<(), ClockError> {
        self.gate.disable(self.regs);
        Ok(())
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(self.gate.is_enabled(self.regs))
    }
}

struct CfgchipMux<'a, R: RegisterAccess + ?Sized> {
    regs: &'a R,
    mux: Mux,
}

impl<R: RegisterAccess + ?Sized> ClkOps for CfgchipMux<'_, R> {
    fn get_parent(&self) -> Result<usize, ClockError> {
        self.mux.index(self.regs)
    }

    fn set_parent(&self, index: usize) -> Result<(), ClockError> {
        self.mux.select(self.regs, index)
    }
}

/// Registers a CFGCHIP gate.
pub fn register_gate<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    regs: &'a R,
    info: &CfgchipGateInfo,
) -> Result<ClkId, ClockError> {
    let gate = Gate {
        offset: info.reg,
        bit: info.bit,
    };
    tree.register(ClkInit::new(info.name, CfgchipGate { regs, gate }).parent(info.parent))
}

/// Registers a CFGCHIP mux. Only the parent selected right now has to be registered already.
pub fn register_mux<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    regs: &'a R,
    info: &CfgchipMuxInfo,
) -> Result<ClkId, ClockError> {
    let mux = Mux {
        offset: info.reg,
        shift: info.bit,
        mask: 1,
        table: None,
    };
    tree.register(ClkInit::new(info.name, CfgchipMux { regs, mux }).parents(info.parents))
}
