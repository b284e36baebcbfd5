//! Phase-Locked Loops (PLL)
//!
//! Each PLL controller is registered as a small chain of clocks:
//!
//! ```text
//! ref_clk > [oscin >] <pll>_pllout -----------------> <pll>_pllen > <pll>_sysclkN
//!                   \ [<pll>_extclksrc] (bypass) ---/
//! ```
//!
//! * `<pll>_pllout` is the PLL proper: `input / prediv * mult / postdiv`. Only PLLs flagged
//!   [`PllFlags::allow_set_rate`] can be reprogrammed at runtime.
//! * `<pll>_pllen` is the bypass multiplexer selected by PLLCTL.PLLEN. It follows the hardware
//!   and forwards rate requests to the PLL.
//! * the SYSCLK, AUXCLK, SYSCLKBP and OBSCLK outputs are registered with the helpers in this
//!   module (see [`register_sysclk`] and friends).
// See [Chapter 6 Section 6.2 "PLL Controller"](https://www.ti.com/lit/pdf/spruh77) for more details

use alloc::format;
use core::ops::RangeInclusive;

use embedded_hal::delay::DelayNs;
use fugit::HertzU32;

use crate::clocks::{
    ClkFlags, ClkId, ClkInit, ClkOps, ClockError, ClockTree, Divider, FixedFactor, Gate, Mux,
};
use crate::poll::{ready, PollPolicy};
use crate::regmap::RegisterAccess;

mod params;
mod sysclk;

pub use params::{PllParams, SEARCH_DIV_RANGE};
pub use sysclk::{
    register_auxclk, register_obsclk, register_sysclk, register_sysclkbp, ObsclkInfo, SysclkFlags,
    SysclkInfo,
};

const PLLCTL: u32 = 0x100;
const OCSEL: u32 = 0x104;
const PLLM: u32 = 0x110;
const PREDIV: u32 = 0x114;
const PLLDIV1: u32 = 0x118;
const OSCDIV: u32 = 0x124;
const POSTDIV: u32 = 0x128;
const BPDIV: u32 = 0x12c;
const PLLCMD: u32 = 0x138;
const PLLSTAT: u32 = 0x13c;
const CKEN: u32 = 0x148;
const PLLDIV4: u32 = 0x160;

const PLLCMD_GOSET: u32 = 1 << 0;
const PLLSTAT_GOSTAT: u32 = 1 << 0;
const CKEN_AUXEN_BIT: u8 = 0;
const CKEN_OBSCLK_BIT: u8 = 1;

const DIV_RATIO_WIDTH: u8 = 5;
const DIV_ENABLE_BIT: u8 = 15;
const DIV_MAX: u32 = 1 << DIV_RATIO_WIDTH;

/// Delay for the PLL controller to switch to bypass. 4 OSCIN cycles are enough above 4 MHz.
const PLL_BYPASS_TIME_US: u32 = 1;
/// Minimum time the PLL is held in reset.
const PLL_RESET_TIME_US: u32 = 1;
/// Lock time when there is no pre-divider to derive it from.
const PLL_LOCK_TIME_US: u32 = 20;

/// Offset of the PLLDIVn register. PLLDIV4 and up don't follow PLLDIV3.
pub(crate) const fn plldiv_offset(id: u8) -> u32 {
    if id < 4 {
        PLLDIV1 + 4 * (id as u32 - 1)
    } else {
        PLLDIV4 + 4 * (id as u32 - 4)
    }
}

bitfield::bitfield! {
    /// PLL control register.
    #[derive(Copy, Clone)]
    struct PllCtl(u32);
    impl Debug;
    pllen, set_pllen: 0;
    pllrst, set_pllrst: 3;
    plldis, set_plldis: 4;
    pllensrc, set_pllensrc: 5;
    extclksrc, set_extclksrc: 9;
}

bitfield::bitfield! {
    /// PREDIV, POSTDIV and PLLDIVn: ratio minus one plus an enable bit.
    #[derive(Copy, Clone)]
    struct DivReg(u32);
    impl Debug;
    u32, ratio_field, set_ratio_field: 4, 0;
    enabled, set_enabled: 15;
}

impl DivReg {
    fn programmed(ratio: u32) -> Self {
        let mut reg = DivReg(0);
        reg.set_ratio_field(ratio - 1);
        reg.set_enabled(true);
        reg
    }
}

/// Hardware options of one PLL controller.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllFlags {
    /// Registers the board oscillator as an `oscin` clock in front of this PLL.
    pub has_oscin: bool,
    /// The PLL has a PREDIV register.
    pub has_prediv: bool,
    /// PREDIV ignores its enable bit.
    pub prediv_always_enabled: bool,
    /// PREDIV is fixed by the hardware and must not be written.
    pub prediv_fixed_div: bool,
    /// PREDIV reads back garbage and is always /8 (DM355).
    pub prediv_fixed8: bool,
    /// The PLL has a POSTDIV register.
    pub has_postdiv: bool,
    /// POSTDIV ignores its enable bit.
    pub postdiv_always_enabled: bool,
    /// POSTDIV is fixed by the hardware and must not be written.
    pub postdiv_fixed_div: bool,
    /// The bypass source is selectable through PLLCTL.EXTCLKSRC.
    pub has_extclksrc: bool,
    /// PLLM holds half of the multiplier (DM365).
    pub pllm_2x: bool,
    /// The PLL may be reprogrammed at runtime.
    pub allow_set_rate: bool,
}

impl PllFlags {
    /// A PLL with nothing but a multiplier.
    pub const NONE: PllFlags = PllFlags {
        has_oscin: false,
        has_prediv: false,
        prediv_always_enabled: false,
        prediv_fixed_div: false,
        prediv_fixed8: false,
        has_postdiv: false,
        postdiv_always_enabled: false,
        postdiv_fixed_div: false,
        has_extclksrc: false,
        pllm_2x: false,
        allow_set_rate: false,
    };
}

/// Static description of one PLL controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllInfo {
    /// Prefix of every clock registered for this PLL, e.g. `pll0`.
    pub name: &'static str,
    /// Bits of PLLM holding the multiplier.
    pub pllm_mask: u32,
    /// Smallest legal PLLM value.
    pub pllm_min: u32,
    /// Largest legal PLLM value.
    pub pllm_max: u32,
    /// Lowest PLL output (before POSTDIV) in Hz, 0 if unconstrained.
    pub pllout_min_rate: u32,
    /// Highest PLL output (before POSTDIV) in Hz, 0 if unconstrained.
    pub pllout_max_rate: u32,
    /// Hardware options.
    pub flags: PllFlags,
    /// Second bypass source when [`PllFlags::has_extclksrc`] is set.
    pub extclksrc_parent: &'static str,
}

impl PllInfo {
    /// Multipliers the PLL can be programmed with.
    ///
    /// With [`PllFlags::pllm_2x`] the PLLM limits are doubled and only even values are legal.
    pub fn mult_range(&self) -> RangeInclusive<u32> {
        if self.flags.pllm_2x {
            self.pllm_min * 2..=self.pllm_max * 2
        } else {
            self.pllm_min..=self.pllm_max
        }
    }

    /// Whether `mult` is one of [`PllInfo::mult_range`].
    pub fn mult_is_legal(&self, mult: u32) -> bool {
        self.mult_range().contains(&mult) && !(self.flags.pllm_2x && mult % 2 != 0)
    }
}

/// One PLL controller register block.
pub struct Pll<'a, R: RegisterAccess + ?Sized> {
    regs: &'a R,
    info: &'static PllInfo,
    poll: PollPolicy,
}

impl<R: RegisterAccess + ?Sized> Clone for Pll<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: RegisterAccess + ?Sized> Copy for Pll<'_, R> {}

impl<'a, R: RegisterAccess + ?Sized> Pll<'a, R> {
    /// Wraps the PLL controller at `regs`.
    pub fn new(regs: &'a R, info: &'static PllInfo) -> Self {
        Self {
            regs,
            info,
            poll: PollPolicy::default(),
        }
    }

    /// Sets how long the SYSCLK divider change sequence waits on PLLSTAT.GOSTAT.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// The static description of this PLL.
    pub fn info(&self) -> &'static PllInfo {
        self.info
    }

    pub(crate) fn regs(&self) -> &'a R {
        self.regs
    }

    fn prediv_programmable(&self) -> bool {
        let flags = &self.info.flags;
        flags.has_prediv && !flags.prediv_fixed_div && !flags.prediv_fixed8
    }

    fn postdiv_programmable(&self) -> bool {
        let flags = &self.info.flags;
        flags.has_postdiv && !flags.postdiv_fixed_div
    }

    /// Current pre-divider ratio. A disabled pre-divider counts as 1.
    pub fn prediv(&self) -> u32 {
        let flags = &self.info.flags;
        if !flags.has_prediv {
            return 1;
        }
        if flags.prediv_fixed8 {
            return 8;
        }
        let reg = DivReg(self.regs.read(PREDIV));
        if flags.prediv_always_enabled || reg.enabled() {
            reg.ratio_field() + 1
        } else {
            1
        }
    }

    /// Current effective multiplier.
    pub fn mult(&self) -> u32 {
        let reg = self.regs.read(PLLM) & self.info.pllm_mask;
        if self.info.flags.pllm_2x {
            reg * 2
        } else {
            reg + 1
        }
    }

    /// Current post-divider ratio. A disabled post-divider counts as 1.
    pub fn postdiv(&self) -> u32 {
        let flags = &self.info.flags;
        if !flags.has_postdiv {
            return 1;
        }
        let reg = DivReg(self.regs.read(POSTDIV));
        if flags.postdiv_always_enabled || reg.enabled() {
            reg.ratio_field() + 1
        } else {
            1
        }
    }

    /// The configuration currently programmed.
    pub fn params(&self) -> PllParams {
        PllParams {
            prediv: self.prediv(),
            mult: self.mult(),
            postdiv: self.postdiv(),
        }
    }

    /// Whether the PLL output is bypassed (PLLCTL.PLLEN clear).
    pub fn is_bypassed(&self) -> bool {
        !PllCtl(self.regs.read(PLLCTL)).pllen()
    }

    fn check(&self, params: &PllParams) -> Result<(), ClockError> {
        let info = self.info;
        if !info.mult_is_legal(params.mult) {
            return Err(ClockError::MultiplierOutOfRange);
        }
        let legal = |div: u32| (1..=DIV_MAX).contains(&div);
        if !legal(params.prediv) || !legal(params.postdiv) {
            return Err(ClockError::InvalidDivider);
        }
        if !self.prediv_programmable() && params.prediv != self.prediv() {
            return Err(ClockError::InvalidDivider);
        }
        if !self.postdiv_programmable() && params.postdiv != self.postdiv() {
            return Err(ClockError::InvalidDivider);
        }
        Ok(())
    }

    fn pllm_field(&self, mult: u32) -> u32 {
        let value = if self.info.flags.pllm_2x {
            mult / 2
        } else {
            mult - 1
        };
        value & self.info.pllm_mask
    }

    /// Reprograms the PLL, switching the output to bypass while it relocks.
    ///
    /// Runs inside a critical section: the PLL is transiently unusable and nothing else may
    /// observe or touch the controller until it is back out of bypass. Lock time is not polled,
    /// the PLL gets a fixed `20 * prediv` microseconds (the datasheet's `2000 * prediv /
    /// sqrt(mult)` OSCIN cycles with `sqrt(mult) ~ 4` at 25 MHz).
    pub fn reprogram_blocking<D: DelayNs + ?Sized>(
        &self,
        params: &PllParams,
        delay: &mut D,
    ) -> Result<(), ClockError> {
        self.check(params)?;
        let locktime = if self.info.flags.has_prediv {
            2000 * params.prediv / 100
        } else {
            PLL_LOCK_TIME_US
        };
        log::debug!(
            "{}: prediv {} mult {} postdiv {}, lock {} us",
            self.info.name,
            params.prediv,
            params.mult,
            params.postdiv,
            locktime
        );

        critical_section::with(|_| {
            let mut ctl = PllCtl(self.regs.read(PLLCTL));

            ctl.set_pllensrc(false);
            ctl.set_pllen(false);
            self.regs.write(PLLCTL, ctl.0);
            delay.delay_us(PLL_BYPASS_TIME_US);

            ctl.set_pllrst(false);
            ctl.set_plldis(false);
            self.regs.write(PLLCTL, ctl.0);

            if self.prediv_programmable() {
                self.regs.write(PREDIV, DivReg::programmed(params.prediv).0);
            }
            self.regs.write(PLLM, self.pllm_field(params.mult));
            if self.postdiv_programmable() {
                self.regs
                    .write(POSTDIV, DivReg::programmed(params.postdiv).0);
            }
            delay.delay_us(PLL_RESET_TIME_US);

            ctl.set_pllrst(true);
            self.regs.write(PLLCTL, ctl.0);
            delay.delay_us(locktime);

            ctl.set_pllen(true);
            self.regs.write(PLLCTL, ctl.0);
        });
        Ok(())
    }

    fn go_idle(&self) -> nb::Result<(), core::convert::Infallible> {
        ready(self.regs.read(PLLSTAT) & PLLSTAT_GOSTAT == 0)
    }

    /// Changes a PLLDIVn ratio with the GO sequence: wait for any previous change, store the
    /// ratio, set PLLCMD.GOSET and wait for the dividers to align.
    pub(crate) fn change_divider(&self, divider: &Divider, ratio: u32) -> Result<(), ClockError> {
        critical_section::with(|_| {
            self.poll.block_on(|| self.go_idle())?;
            divider.write_ratio(self.regs, ratio)?;
            self.regs.update_bits(PLLCMD, PLLCMD_GOSET, PLLCMD_GOSET);
            self.poll.block_on(|| self.go_idle())
        })
        .inspect_err(|e| log::error!("{}: divider change failed: {}", self.info.name, e))
    }
}

/// `<pll>_pllout`
struct PllOut<'a, R: RegisterAccess + ?Sized> {
    pll: Pll<'a, R>,
}

impl<R: RegisterAccess + ?Sized> ClkOps for PllOut<'_, R> {
    fn recalc_rate(&self, parent_rate: HertzU32) -> HertzU32 {
        self.pll.params().resulting_rate(parent_rate)
    }

    fn round_rate(&self, rate: HertzU32, parent_rate: HertzU32) -> Result<HertzU32, ClockError> {
        if !self.pll.info.flags.allow_set_rate {
            return Err(ClockError::NotSupported);
        }
        PllParams::find(parent_rate, rate, self.pll.info)
            .map(|params| params.resulting_rate(parent_rate))
            .ok_or(ClockError::RateOutOfRange)
    }

    fn set_rate(
        &self,
        rate: HertzU32,
        parent_rate: HertzU32,
        delay: &mut dyn DelayNs,
    ) -> Result<(), ClockError> {
        if !self.pll.info.flags.allow_set_rate {
            return Err(ClockError::NotSupported);
        }
        let params =
            PllParams::find(parent_rate, rate, self.pll.info).ok_or(ClockError::RateOutOfRange)?;
        self.pll.reprogram_blocking(&params, delay)
    }

    fn parent_rate_for(&self, _rate: HertzU32) -> Option<HertzU32> {
        None
    }
}

/// `<pll>_pllen`: parent 0 is the bypass source, parent 1 the PLL output.
struct PllEn<'a, R: RegisterAccess + ?Sized> {
    pll: Pll<'a, R>,
}

impl<R: RegisterAccess + ?Sized> ClkOps for PllEn<'_, R> {
    fn get_parent(&self) -> Result<usize, ClockError> {
        Ok(usize::from(!self.pll.is_bypassed()))
    }
}

/// `<pll>_extclksrc`: parent 0 is the oscillator, parent 1 [`PllInfo::extclksrc_parent`].
struct ExtClkSrc<'a, R: RegisterAccess + ?Sized> {
    pll: Pll<'a, R>,
}

impl<R: RegisterAccess + ?Sized> ClkOps for ExtClkSrc<'_, R> {
    fn get_parent(&self) -> Result<usize, ClockError> {
        Ok(usize::from(PllCtl(self.pll.regs.read(PLLCTL)).extclksrc()))
    }

    fn set_parent(&self, index: usize) -> Result<(), ClockError> {
        if index > 1 {
            return Err(ClockError::InvalidParentIndex);
        }
        critical_section::with(|_| {
            let mut ctl = PllCtl(self.pll.regs.read(PLLCTL));
            ctl.set_extclksrc(index == 1);
            self.pll.regs.write(PLLCTL, ctl.0);
        });
        Ok(())
    }
}

/// Name of the clock feeding the PLL proper: `oscin` with [`PllFlags::has_oscin`], else
/// `parent_name`.
fn input_name<'n>(info: &PllInfo, parent_name: &'n str) -> &'n str {
    if info.flags.has_oscin {
        "oscin"
    } else {
        parent_name
    }
}

/// Registers `oscin` (with [`PllFlags::has_oscin`]) and `<pll>_pllout`, and returns the latter.
pub fn register_pll_core<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    parent_name: &str,
) -> Result<ClkId, ClockError> {
    let info = pll.info;
    if info.flags.has_oscin {
        tree.register(ClkInit::new("oscin", FixedFactor::new(1, 1)).parent(parent_name))?;
    }
    tree.register(
        ClkInit::new(format!("{}_pllout", info.name), PllOut { pll: *pll })
            .parent(input_name(info, parent_name)),
    )
}

/// Registers `<pll>_extclksrc`, the bypass source selector.
///
/// When PLLCTL.EXTCLKSRC is set, [`PllInfo::extclksrc_parent`] has to be registered already.
pub fn register_extclksrc<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    parent_name: &str,
) -> Result<ClkId, ClockError> {
    let info = pll.info;
    if !info.flags.has_extclksrc {
        return Err(ClockError::NotSupported);
    }
    tree.register(
        ClkInit::new(format!("{}_extclksrc", info.name), ExtClkSrc { pll: *pll })
            .parents([input_name(info, parent_name), info.extclksrc_parent]),
    )
}

/// Registers `<pll>_pllen`, the bypass multiplexer the SYSCLKs hang off.
///
/// Only the parent PLLCTL.PLLEN currently selects has to be registered.
pub fn register_pllen<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    parent_name: &str,
) -> Result<ClkId, ClockError> {
    let info = pll.info;
    let bypass = if info.flags.has_extclksrc {
        format!("{}_extclksrc", info.name)
    } else {
        input_name(info, parent_name).into()
    };
    tree.register(
        ClkInit::new(format!("{}_pllen", info.name), PllEn { pll: *pll })
            .parents([bypass, format!("{}_pllout", info.name)])
            .flags(ClkFlags::SET_RATE_PARENT),
    )
}

/// Registers the clocks making up one PLL and returns `<pll>_pllout`.
///
/// `parent_name` is the PLL input, usually `ref_clk`. With [`PllFlags::has_oscin`] an `oscin`
/// clock is registered in between first. A PLL whose bypass source is another PLL's output
/// should be registered piecewise instead, see [`register_extclksrc`].
pub fn register_pll<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    parent_name: &str,
) -> Result<ClkId, ClockError> {
    let pllout = register_pll_core(tree, pll, parent_name)?;
    if pll.info.flags.has_extclksrc {
        register_extclksrc(tree, pll, parent_name)?;
    }
    register_pllen(tree, pll, parent_name)?;
    Ok(pllout)
}

pub(crate) fn obsclk_mux(table: &'static [u32]) -> Mux {
    Mux {
        offset: OCSEL,
        shift: 0,
        mask: 0x1f,
        table: Some(table),
    }
}

pub(crate) const fn plldiv(id: u8, read_only: bool) -> Divider {
    Divider {
        offset: plldiv_offset(id),
        shift: 0,
        width: DIV_RATIO_WIDTH,
        enable_bit: None,
        read_only,
    }
}

pub(crate) const OSCDIV_DIVIDER: Divider = Divider {
    offset: OSCDIV,
    shift: 0,
    width: DIV_RATIO_WIDTH,
    enable_bit: None,
    read_only: false,
};

pub(crate) const BPDIV_DIVIDER: Divider = Divider {
    offset: BPDIV,
    shift: 0,
    width: DIV_RATIO_WIDTH,
    enable_bit: None,
    read_only: true,
};

pub(crate) const AUX_GATE: Gate = Gate {
    offset: CKEN,
    bit: CKEN_AUXEN_BIT,
};

pub(crate) const OBSCLK_GATE: Gate = Gate {
    offset: CKEN,
    bit: CKEN_OBSCLK_BIT,
};

pub(crate) const PLLDIV_GATE_BIT: u8 = DIV_ENABLE_BIT;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clocks::FixedRate;
    use crate::regmap::fake::{Access, FakeDelay, FakeRegs};

    static DA850_PLL0: PllInfo = PllInfo {
        name: "pll0",
        pllm_mask: 0x1f,
        pllm_min: 4,
        pllm_max: 32,
        pllout_min_rate: 300_000_000,
        pllout_max_rate: 600_000_000,
        flags: PllFlags {
            has_oscin: true,
            has_prediv: true,
            has_postdiv: true,
            has_extclksrc: true,
            allow_set_rate: true,
            ..PllFlags::NONE
        },
        extclksrc_parent: "pll1_sysclk3",
    };

    static DM355_PLL1: PllInfo = PllInfo {
        name: "pll1",
        pllm_mask: 0xff,
        pllm_min: 92,
        pllm_max: 184,
        pllout_min_rate: 0,
        pllout_max_rate: 0,
        flags: PllFlags {
            has_prediv: true,
            prediv_always_enabled: true,
            prediv_fixed8: true,
            has_postdiv: true,
            postdiv_always_enabled: true,
            postdiv_fixed_div: true,
            ..PllFlags::NONE
        },
        extclksrc_parent: "",
    };

    static DM365_PLL1: PllInfo = PllInfo {
        name: "pll1",
        pllm_mask: 0x3ff,
        pllm_min: 1,
        pllm_max: 1023,
        pllout_min_rate: 0,
        pllout_max_rate: 0,
        flags: PllFlags {
            has_prediv: true,
            has_postdiv: true,
            postdiv_always_enabled: true,
            pllm_2x: true,
            ..PllFlags::NONE
        },
        extclksrc_parent: "",
    };

    #[test]
    fn readback_honours_enable_bits() {
        let regs = FakeRegs::new();
        let pll = Pll::new(&regs, &DA850_PLL0);
        regs.set(PLLM, 24);
        regs.set(PREDIV, 1);
        regs.set(POSTDIV, 0x8001);
        // PREDIV enable bit clear: /1 whatever the field says.
        assert_eq!(
            pll.params(),
            PllParams {
                prediv: 1,
                mult: 25,
                postdiv: 2
            }
        );
        regs.set(PREDIV, 0x8001);
        assert_eq!(pll.prediv(), 2);
    }

    #[test]
    fn quirky_readback() {
        let regs = FakeRegs::new();
        regs.set(PLLM, 143);
        regs.set(PREDIV, 0x3);
        regs.set(POSTDIV, 0x0);
        let dm355 = Pll::new(&regs, &DM355_PLL1);
        assert_eq!(dm355.prediv(), 8);
        assert_eq!(dm355.mult(), 144);
        assert_eq!(dm355.postdiv(), 1);
        assert_eq!(
            dm355.params().resulting_rate(HertzU32::MHz(24)),
            HertzU32::MHz(432)
        );

        regs.set(PLLM, 81);
        let dm365 = Pll::new(&regs, &DM365_PLL1);
        assert_eq!(dm365.mult(), 162);
    }

    #[test]
    fn reprogram_sequence_is_ordered() {
        let regs = FakeRegs::new();
        regs.set(PLLCTL, 0x29);
        let pll = Pll::new(&regs, &DA850_PLL0);
        let params = PllParams {
            prediv: 2,
            mult: 25,
            postdiv: 1,
        };
        pll.reprogram_blocking(&params, &mut FakeDelay(&regs)).unwrap();

        let steps: alloc::vec::Vec<Access> = regs
            .trace()
            .into_iter()
            .filter(|a| !matches!(a, Access::Read(..)))
            .collect();
        assert_eq!(
            steps,
            [
                // Bypass.
                Access::Write(PLLCTL, 0x08),
                Access::DelayUs(1),
                // Reset, enable.
                Access::Write(PLLCTL, 0x00),
                Access::Write(PREDIV, 0x8001),
                Access::Write(PLLM, 24),
                Access::Write(POSTDIV, 0x8000),
                Access::DelayUs(1),
                // Out of reset, lock.
                Access::Write(PLLCTL, 0x08),
                Access::DelayUs(40),
                // Out of bypass.
                Access::Write(PLLCTL, 0x09),
            ]
        );
        assert_eq!(pll.params(), params);
    }

    #[test]
    fn reprogram_rejects_bad_params_untouched() {
        let regs = FakeRegs::new();
        let pll = Pll::new(&regs, &DA850_PLL0);
        let mut delay = FakeDelay(&regs);
        let bad_mult = PllParams {
            prediv: 1,
            mult: 33,
            postdiv: 1,
        };
        assert_eq!(
            pll.reprogram_blocking(&bad_mult, &mut delay),
            Err(ClockError::MultiplierOutOfRange)
        );
        let bad_div = PllParams {
            prediv: 0,
            mult: 20,
            postdiv: 1,
        };
        assert_eq!(
            pll.reprogram_blocking(&bad_div, &mut delay),
            Err(ClockError::InvalidDivider)
        );
        assert!(regs.writes().is_empty());

        // DM355 PREDIV can't be changed.
        let dm355 = Pll::new(&regs, &DM355_PLL1);
        let params = PllParams {
            prediv: 2,
            mult: 144,
            postdiv: 1,
        };
        assert_eq!(
            dm355.reprogram_blocking(&params, &mut delay),
            Err(ClockError::InvalidDivider)
        );
    }

    #[test]
    fn doubled_multiplier_uses_the_whole_field() {
        assert_eq!(DM365_PLL1.mult_range(), 2..=2046);
        assert_eq!(DA850_PLL0.mult_range(), 4..=32);

        let regs = FakeRegs::new();
        let pll = Pll::new(&regs, &DM365_PLL1);
        let mut delay = FakeDelay(&regs);
        let params = PllParams {
            prediv: 8,
            mult: 1200,
            postdiv: 1,
        };
        pll.reprogram_blocking(&params, &mut delay).unwrap();
        assert_eq!(regs.get(PLLM), 600);
        assert_eq!(pll.mult(), 1200);

        regs.clear_trace();
        for mult in [1, 1201, 2048] {
            assert_eq!(
                pll.reprogram_blocking(&PllParams { mult, ..params }, &mut delay),
                Err(ClockError::MultiplierOutOfRange),
                "mult {}",
                mult
            );
        }
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn plldiv_offsets_skip_gap() {
        assert_eq!(plldiv_offset(1), 0x118);
        assert_eq!(plldiv_offset(3), 0x120);
        assert_eq!(plldiv_offset(4), 0x160);
        assert_eq!(plldiv_offset(9), 0x174);
    }

    #[test]
    fn registered_chain_follows_bypass() {
        let regs = FakeRegs::new();
        regs.set(PLLCTL, 0x09);
        regs.set(PLLM, 18);
        let pll = Pll::new(&regs, &DA850_PLL0);
        let mut tree = ClockTree::new();
        tree.register(ClkInit::new("ref_clk", FixedRate::new(HertzU32::MHz(24))))
            .unwrap();
        let pllout = register_pll(&mut tree, &pll, "ref_clk").unwrap();
        let pllen = tree.get("pll0_pllen").unwrap();
        assert_eq!(tree.get_rate(pllout), HertzU32::MHz(456));
        assert_eq!(tree.get_parent(pllen), Some(pllout));
        assert_eq!(tree.get_rate(pllen), HertzU32::MHz(456));
        assert_eq!(tree.name(tree.get_parent(pllout).unwrap()), "oscin");

        // Someone else bypassed the PLL behind the tree's back.
        regs.set(PLLCTL, 0x08);
        tree.recalc_subtree(pllout);
        let extclksrc = tree.get("pll0_extclksrc").unwrap();
        assert_eq!(tree.get_parent(pllen), Some(extclksrc));
        assert_eq!(tree.get_rate(pllen), HertzU32::MHz(24));

        // Reprogramming leaves bypass and the tree follows.
        let rate = tree
            .set_rate(pllout, HertzU32::MHz(300), &mut FakeDelay(&regs))
            .unwrap();
        assert_eq!(rate, HertzU32::MHz(300));
        assert!(!pll.is_bypassed());
        assert_eq!(tree.get_parent(pllen), Some(pllout));
        assert_eq!(tree.get_rate(pllen), HertzU32::MHz(300));
    }

    #[test]
    fn unreachable_rate_leaves_pll_alone() {
        let regs = FakeRegs::new();
        regs.set(PLLCTL, 0x09);
        regs.set(PLLM, 18);
        let pll = Pll::new(&regs, &DA850_PLL0);
        let mut tree = ClockTree::new();
        tree.register(ClkInit::new("ref_clk", FixedRate::new(HertzU32::MHz(24))))
            .unwrap();
        let pllout = register_pll(&mut tree, &pll, "ref_clk").unwrap();
        regs.clear_trace();
        assert_eq!(
            tree.set_rate(pllout, HertzU32::MHz(50), &mut FakeDelay(&regs)),
            Err(ClockError::RateOutOfRange)
        );
        assert!(regs.writes().is_empty());
        assert_eq!(tree.get_rate(pllout), HertzU32::MHz(456));
    }
}
