//! Outputs of a PLL controller: SYSCLKn, AUXCLK, SYSCLKBP and OBSCLK.

use alloc::format;

use embedded_hal::delay::DelayNs;
use fugit::HertzU32;

use super::{
    obsclk_mux, plldiv, Pll, AUX_GATE, BPDIV_DIVIDER, OBSCLK_GATE, OSCDIV_DIVIDER,
    PLLDIV_GATE_BIT,
};
use crate::clocks::{
    mul_rate, ClkFlags, ClkId, ClkInit, ClkOps, ClockError, ClockTree, Divider, Gate, Mux,
};
use crate::regmap::RegisterAccess;

/// Options of one SYSCLK output.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SysclkFlags {
    /// The ratio is set by the hardware and can't be changed.
    pub fixed_ratio: bool,
    /// The output feeds something that must never stop (e.g. the DDR controller).
    pub always_enabled: bool,
    /// The output clocks the ARM core: rate requests it can't serve are passed to the PLL.
    pub arm_rate: bool,
}

impl SysclkFlags {
    /// A plain programmable output.
    pub const NONE: SysclkFlags = SysclkFlags {
        fixed_ratio: false,
        always_enabled: false,
        arm_rate: false,
    };

    /// See [`SysclkFlags::fixed_ratio`].
    pub const FIXED: SysclkFlags = SysclkFlags {
        fixed_ratio: true,
        ..SysclkFlags::NONE
    };

    /// See [`SysclkFlags::always_enabled`].
    pub const ALWAYS_ENABLED: SysclkFlags = SysclkFlags {
        always_enabled: true,
        ..SysclkFlags::NONE
    };

    /// A fixed divider in front of the ARM core.
    pub const ARM_RATE_FIXED: SysclkFlags = SysclkFlags {
        fixed_ratio: true,
        arm_rate: true,
        ..SysclkFlags::NONE
    };
}

/// One PLLDIVn output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SysclkInfo {
    /// Clock name, e.g. `pll0_sysclk1`.
    pub name: &'static str,
    /// Divider number, 1 to 9.
    pub id: u8,
    /// Options.
    pub flags: SysclkFlags,
}

impl SysclkInfo {
    /// Describes PLLDIV`id`.
    pub const fn new(id: u8, name: &'static str, flags: SysclkFlags) -> Self {
        Self { name, id, flags }
    }
}

/// One OBSCLK (observation clock) output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObsclkInfo {
    /// Clock name.
    pub name: &'static str,
    /// Selectable sources.
    pub parents: &'static [&'static str],
    /// OCSEL value of each entry of `parents`.
    pub table: &'static [u32],
}

struct Sysclk<'a, R: RegisterAccess + ?Sized> {
    pll: Pll<'a, R>,
    gate: Gate,
    divider: Divider,
}

impl<R: RegisterAccess + ?Sized> ClkOps for Sysclk<'_, R> {
    fn enable(&self) -> Result<(), ClockError> {
        self.gate.enable(self.pll.regs());
        Ok(())
    }

    fn disable(&self) -> Result<(), ClockError> {
        self.gate.disable(self.pll.regs());
        Ok(())
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(self.gate.is_enabled(self.pll.regs()))
    }

    fn recalc_rate(&self, parent_rate: HertzU32) -> HertzU32 {
        self.divider.recalc(self.pll.regs(), parent_rate)
    }

    fn round_rate(&self, rate: HertzU32, parent_rate: HertzU32) -> Result<HertzU32, ClockError> {
        self.divider.round(rate, parent_rate)
    }

    fn set_rate(
        &self,
        rate: HertzU32,
        parent_rate: HertzU32,
        _delay: &mut dyn DelayNs,
    ) -> Result<(), ClockError> {
        let ratio = self.divider.best_ratio(rate, parent_rate)?;
        self.pll.change_divider(&self.divider, ratio)
    }

    fn parent_rate_for(&self, rate: HertzU32) -> Option<HertzU32> {
        Some(mul_rate(rate, self.divider.ratio(self.pll.regs())))
    }
}

/// Registers PLLDIV`info.id` of `pll` as a child of `<pll>_pllen`.
pub fn register_sysclk<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    info: &SysclkInfo,
) -> Result<ClkId, ClockError> {
    if !(1..=9).contains(&info.id) {
        return Err(ClockError::InvalidDivider);
    }
    let divider = plldiv(info.id, info.flags.fixed_ratio);
    let ops = Sysclk {
        pll: *pll,
        gate: Gate {
            offset: divider.offset,
            bit: PLLDIV_GATE_BIT,
        },
        divider,
    };
    let flags = ClkFlags {
        critical: info.flags.always_enabled,
        set_rate_parent: info.flags.arm_rate,
    };
    tree.register(
        ClkInit::new(info.name, ops)
            .parent(format!("{}_pllen", pll.info().name))
            .flags(flags),
    )
}

struct Auxclk<'a, R: RegisterAccess + ?Sized> {
    pll: Pll<'a, R>,
}

impl<R: RegisterAccess + ?Sized> ClkOps for Auxclk<'_, R> {
    fn enable(&self) -> Result<(), ClockError> {
        AUX_GATE.enable(self.pll.regs());
        Ok(())
    }

    fn disable(&self) -> Result<(), ClockError> {
        AUX_GATE.disable(self.pll.regs());
        Ok(())
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(AUX_GATE.is_enabled(self.pll.regs()))
    }
}

/// Registers `<pll>_auxclk`, the gated PLL input.
pub fn register_auxclk<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    parent_name: &str,
) -> Result<ClkId, ClockError> {
    tree.register(
        ClkInit::new(format!("{}_auxclk", pll.info().name), Auxclk { pll: *pll })
            .parent(parent_name),
    )
}

struct Sysclkbp<'a, R: RegisterAccess + ?Sized> {
    pll: Pll<'a, R>,
}

impl<R: RegisterAccess + ?Sized> ClkOps for Sysclkbp<'_, R> {
    fn recalc_rate(&self, parent_rate: HertzU32) -> HertzU32 {
        BPDIV_DIVIDER.recalc(self.pll.regs(), parent_rate)
    }
}

/// Registers `<pll>_sysclkbp`, the PLL input divided by BPDIV.
pub fn register_sysclkbp<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    parent_name: &str,
) -> Result<ClkId, ClockError> {
    tree.register(
        ClkInit::new(format!("{}_sysclkbp", pll.info().name), Sysclkbp { pll: *pll })
            .parent(parent_name),
    )
}

struct Obsclk<'a, R: RegisterAccess + ?Sized> {
    pll: Pll<'a, R>,
    mux: Mux,
}

impl<R: RegisterAccess + ?Sized> ClkOps for Obsclk<'_, R> {
    fn enable(&self) -> Result<(), ClockError> {
        OBSCLK_GATE.enable(self.pll.regs());
        Ok(())
    }

    fn disable(&self) -> Result<(), ClockError> {
        OBSCLK_GATE.disable(self.pll.regs());
        Ok(())
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(OBSCLK_GATE.is_enabled(self.pll.regs()))
    }

    fn recalc_rate(&self, parent_rate: HertzU32) -> HertzU32 {
        OSCDIV_DIVIDER.recalc(self.pll.regs(), parent_rate)
    }

    fn round_rate(&self, rate: HertzU32, parent_rate: HertzU32) -> Result<HertzU32, ClockError> {
        OSCDIV_DIVIDER.round(rate, parent_rate)
    }

    fn set_rate(
        &self,
        rate: HertzU32,
        parent_rate: HertzU32,
        _delay: &mut dyn DelayNs,
    ) -> Result<(), ClockError> {
        let ratio = OSCDIV_DIVIDER.best_ratio(rate, parent_rate)?;
        OSCDIV_DIVIDER.write_ratio(self.pll.regs(), ratio)
    }

    fn parent_rate_for(&self, rate: HertzU32) -> Option<HertzU32> {
        Some(mul_rate(rate, OSCDIV_DIVIDER.ratio(self.pll.regs())))
    }

    fn get_parent(&self) -> Result<usize, ClockError> {
        self.mux.index(self.pll.regs())
    }

    fn set_parent(&self, index: usize) -> Result<(), ClockError> {
        self.mux.select(self.pll.regs(), index)
    }
}

/// Registers the OBSCLK output of `pll`.
pub fn register_obsclk<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    info: &ObsclkInfo,
) -> Result<ClkId, ClockError> {
    if info.parents.len() != info.table.len() {
        return Err(ClockError::InvalidParentIndex);
    }
    let ops = Obsclk {
        pll: *pll,
        mux: obsclk_mux(info.table),
    };
    tree.register(ClkInit::new(info.name, ops).parents(info.parents.iter().copied()))
}
