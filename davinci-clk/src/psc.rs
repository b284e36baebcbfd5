//! Power and Sleep Controller (PSC)
//!
//! Every peripheral of a DaVinci part sits behind a local PSC (LPSC) module with its own state
//! machine. Modules are grouped into power domains which have to be switched on once, the first
//! time any module in them is enabled.
//!
//! A [`Psc`] is one controller register block; each of its modules is registered into the
//! [`ClockTree`] as a gate with [`register_clock`] or [`register_clocks`].
//!
//! ## Usage
//!
//! ```no_run
//! use davinci_clk::psc::{register_clocks, LpscFlags, LpscInfo, Psc};
//! use davinci_clk::{ClockTree, PollPolicy, RegisterAccess};
//!
//! static MODULES: [LpscInfo; 2] = [
//!     LpscInfo::new(9, 0, "uart0", "pll0_sysclk2", LpscFlags::NONE),
//!     LpscInfo::new(14, 0, "arm", "pll0_sysclk6", LpscFlags::ALWAYS_ENABLED),
//! ];
//!
//! fn bring_up<'a, R: RegisterAccess>(tree: &mut ClockTree<'a>, regs: &'a R) {
//!     let psc = Psc::new(regs).with_poll_policy(PollPolicy::Bounded(1000));
//!     register_clocks(tree, &psc, &MODULES);
//! }
//! ```

use core::convert::Infallible;

use crate::clocks::{ClkFlags, ClkId, ClkInit, ClkOps, ClockError, ClockTree};
use crate::poll::{ready, PollPolicy};
use crate::regmap::RegisterAccess;

const EPCPR: u32 = 0x070;
const PTCMD: u32 = 0x120;
const PTSTAT: u32 = 0x128;

const fn pdstat(pd: u32) -> u32 {
    0x200 + 4 * pd
}

const fn pdctl(pd: u32) -> u32 {
    0x300 + 4 * pd
}

const fn mdstat(lpsc: u32) -> u32 {
    0x800 + 4 * lpsc
}

const fn mdctl(lpsc: u32) -> u32 {
    0xa00 + 4 * lpsc
}

const PDSTAT_STATE_MASK: u32 = 0x1f;

bitfield::bitfield! {
    /// Module control register.
    #[derive(Copy, Clone)]
    struct MdCtl(u32);
    impl Debug;
    u32, next, set_next: 4, 0;
    lreset, set_lreset: 8;
    force, set_force: 31;
}

bitfield::bitfield! {
    /// Module status register.
    #[derive(Copy, Clone)]
    struct MdStat(u32);
    impl Debug;
    u32, state, _: 5, 0;
    mckout, _: 12;
}

bitfield::bitfield! {
    /// Power domain control register.
    #[derive(Copy, Clone)]
    struct PdCtl(u32);
    impl Debug;
    next, set_next: 0;
    epcgood, set_epcgood: 8;
}

/// States of the LPSC state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum ModuleState {
    /// Clock off, module in reset.
    SwRstDisable = 0,
    /// Clock on, module in reset.
    SyncReset = 1,
    /// Clock off, module out of reset.
    Disable = 2,
    /// Clock on, module out of reset.
    Enable = 3,
}

impl ModuleState {
    fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            0 => Some(ModuleState::SwRstDisable),
            1 => Some(ModuleState::SyncReset),
            2 => Some(ModuleState::Disable),
            3 => Some(ModuleState::Enable),
            _ => None,
        }
    }
}

/// Per-module quirks.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LpscFlags {
    /// The module must never be disabled (it hangs the chip).
    pub always_enabled: bool,
    /// Transitions need MDCTL.FORCE (SATA, DSP).
    pub force: bool,
    /// The module's local reset is driven separately through
    /// [`ClockTree::reset_assert`]/[`ClockTree::reset_deassert`].
    pub local_reset: bool,
}

impl LpscFlags {
    /// No quirks.
    pub const NONE: LpscFlags = LpscFlags {
        always_enabled: false,
        force: false,
        local_reset: false,
    };

    /// See [`LpscFlags::always_enabled`].
    pub const ALWAYS_ENABLED: LpscFlags = LpscFlags {
        always_enabled: true,
        ..LpscFlags::NONE
    };

    /// See [`LpscFlags::force`].
    pub const FORCE: LpscFlags = LpscFlags {
        force: true,
        ..LpscFlags::NONE
    };

    /// See [`LpscFlags::local_reset`].
    pub const LOCAL_RESET: LpscFlags = LpscFlags {
        local_reset: true,
        ..LpscFlags::NONE
    };
}

/// Static description of one PSC module clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LpscInfo {
    /// Clock name.
    pub name: &'static str,
    /// Parent clock name.
    pub parent: &'static str,
    /// Module number.
    pub lpsc: u32,
    /// Power domain.
    pub pd: u32,
    /// Quirks.
    pub flags: LpscFlags,
}

impl LpscInfo {
    /// Describes module `lpsc` in power domain `pd`.
    pub const fn new(
        lpsc: u32,
        pd: u32,
        name: &'static str,
        parent: &'static str,
        flags: LpscFlags,
    ) -> Self {
        Self {
            name,
            parent,
            lpsc,
            pd,
            flags,
        }
    }
}

/// One PSC register block.
pub struct Psc<'a, R: RegisterAccess + ?Sized> {
    regs: &'a R,
    poll: PollPolicy,
}

impl<R: RegisterAccess + ?Sized> Clone for Psc<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: RegisterAccess + ?Sized> Copy for Psc<'_, R> {}

impl<'a, R: RegisterAccess + ?Sized> Psc<'a, R> {
    /// Wraps the PSC at `regs`, with the default [`PollPolicy`].
    pub fn new(regs: &'a R) -> Self {
        Self {
            regs,
            poll: PollPolicy::default(),
        }
    }

    /// Sets how long transitions may take before they fail with [`ClockError::Timeout`].
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Current state of module `lpsc`, `None` while it is in transition.
    pub fn module_state(&self, lpsc: u32) -> Option<ModuleState> {
        ModuleState::from_bits(MdStat(self.regs.read(mdstat(lpsc))).state())
    }

    /// Whether the module clock of `lpsc` is running (MDSTAT.MCKOUT).
    pub fn module_clock_running(&self, lpsc: u32) -> bool {
        MdStat(self.regs.read(mdstat(lpsc))).mckout()
    }

    fn wait(
        &self,
        what: &str,
        lpsc: u32,
        step: impl FnMut() -> nb::Result<(), Infallible>,
    ) -> Result<(), ClockError> {
        self.poll.block_on(step).inspect_err(|_| {
            log::error!("lpsc {}: timeout waiting for {}", lpsc, what);
        })
    }

    /// Moves module `lpsc` of power domain `pd` to `next` and waits until it gets there.
    ///
    /// Switches the power domain on first if it is off. The whole sequence runs in a critical
    /// section, so transitions of modules sharing this controller never interleave.
    ///
    /// Unless the module is flagged [`LpscFlags::local_reset`], enabling it also releases its
    /// local reset (MDCTL.LRESET set) and disabling it asserts the reset again.
    pub fn set_module_state(
        &self,
        lpsc: u32,
        pd: u32,
        next: ModuleState,
        flags: LpscFlags,
    ) -> Result<(), ClockError> {
        log::debug!("lpsc {}: -> {:?}", lpsc, next);
        let regs = self.regs;
        let pd_bit = 1 << pd;

        critical_section::with(|_| {
            let mut ctl = MdCtl(regs.read(mdctl(lpsc)));
            ctl.set_next(next as u32);
            ctl.set_force(flags.force);
            if !flags.local_reset {
                match next {
                    ModuleState::Enable => ctl.set_lreset(true),
                    ModuleState::Disable => ctl.set_lreset(false),
                    _ => {}
                }
            }
            regs.write(mdctl(lpsc), ctl.0);

            if regs.read(pdstat(pd)) & PDSTAT_STATE_MASK == 0 {
                let mut pdc = PdCtl(regs.read(pdctl(pd)));
                pdc.set_next(true);
                regs.write(pdctl(pd), pdc.0);
                regs.write(PTCMD, pd_bit);
                self.wait("external power", lpsc, || {
                    ready(regs.read(EPCPR) & pd_bit != 0)
                })?;
                let mut pdc = PdCtl(regs.read(pdctl(pd)));
                pdc.set_epcgood(true);
                regs.write(pdctl(pd), pdc.0);
            } else {
                regs.write(PTCMD, pd_bit);
            }

            self.wait("power domain transition", lpsc, || {
                ready(regs.read(PTSTAT) & pd_bit == 0)
            })?;
            self.wait("module state", lpsc, || {
                ready(MdStat(regs.read(mdstat(lpsc))).state() == next as u32)
            })
        })
    }

    /// Drives the local reset of module `lpsc` without a state transition.
    pub fn set_local_reset(&self, lpsc: u32, asserted: bool) {
        critical_section::with(|_| {
            let mut ctl = MdCtl(self.regs.read(mdctl(lpsc)));
            ctl.set_lreset(!asserted);
            self.regs.write(mdctl(lpsc), ctl.0);
        })
    }
}

/// A PSC module as a clock gate.
struct PscClk<'a, R: RegisterAccess + ?Sized> {
    psc: Psc<'a, R>,
    info: LpscInfo,
}

impl<R: RegisterAccess + ?Sized> PscClk<'_, R> {
    fn transition(&self, next: ModuleState) -> Result<(), ClockError> {
        let info = &self.info;
        self.psc
            .set_module_state(info.lpsc, info.pd, next, info.flags)
            .inspect_err(|e| log::warn!("{}: {:?} failed: {}", info.name, next, e))
    }
}

impl<R: RegisterAccess + ?Sized> ClkOps for PscClk<'_, R> {
    fn enable(&self) -> Result<(), ClockError> {
        self.transition(ModuleState::Enable)
    }

    fn disable(&self) -> Result<(), ClockError> {
        self.transition(ModuleState::Disable)
    }

    fn is_enabled(&self) -> Option<bool> {
        Some(self.psc.module_clock_running(self.info.lpsc))
    }

    fn reset_assert(&self) -> Result<(), ClockError> {
        if !self.info.flags.local_reset {
            return Err(ClockError::NotSupported);
        }
        self.psc.set_local_reset(self.info.lpsc, true);
        Ok(())
    }

    fn reset_deassert(&self) -> Result<(), ClockError> {
        if !self.info.flags.local_reset {
            return Err(ClockError::NotSupported);
        }
        self.psc.set_local_reset(self.info.lpsc, false);
        Ok(())
    }
}

/// Registers one module clock. Modules flagged [`LpscFlags::always_enabled`] are switched on
/// right away and stay on.
pub fn register_clock<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    psc: &Psc<'a, R>,
    info: &LpscInfo,
) -> Result<ClkId, ClockError> {
    let flags = if info.flags.always_enabled {
        ClkFlags::CRITICAL
    } else {
        ClkFlags::NONE
    };
    tree.register(
        ClkInit::new(
            info.name,
            PscClk {
                psc: *psc,
                info: *info,
            },
        )
        .parent(info.parent)
        .flags(flags),
    )
}

/// Registers every module of `table`, in order. Entries that fail are logged and skipped.
///
/// Returns how many clocks were registered.
pub fn register_clocks<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    psc: &Psc<'a, R>,
    table: &[LpscInfo],
) -> usize {
    table
        .iter()
        .filter(|info| match register_clock(tree, psc, info) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("failed to register {}: {}", info.name, e);
                false
            }
        })
        .count()
}

#[cfg(test)]
mod tests {
    use fugit::HertzU32;

    use super::*;
    use crate::clocks::FixedRate;
    use crate::regmap::fake::FakeRegs;

    /// A PSC that completes every transition instantly.
    fn psc_regs() -> FakeRegs {
        FakeRegs::with_hook(|values, offset, value| {
            if (0xa00..0xb00).contains(&offset) {
                let lpsc = (offset - 0xa00) / 4;
                let state = value & 0x1f;
                let mckout = if state == 3 { 1 << 12 } else { 0 };
                values.insert(mdstat(lpsc), state | mckout);
            } else if offset == PTCMD {
                for pd in 0..2 {
                    if value & (1 << pd) != 0 {
                        *values.entry(EPCPR).or_insert(0) |= 1 << pd;
                        values.insert(pdstat(pd), 1);
                    }
                }
            }
        })
    }

    static DSP: LpscInfo = LpscInfo::new(
        15,
        1,
        "dsp",
        "ref_clk",
        LpscFlags {
            force: true,
            local_reset: true,
            ..LpscFlags::NONE
        },
    );
    static UART0: LpscInfo = LpscInfo::new(9, 0, "uart0", "ref_clk", LpscFlags::NONE);
    static ARM: LpscInfo = LpscInfo::new(14, 0, "arm", "ref_clk", LpscFlags::ALWAYS_ENABLED);
    static DSP_PEER: LpscInfo = LpscInfo::new(16, 1, "dsp_peer", "ref_clk", LpscFlags::NONE);

    fn tree<'a>() -> ClockTree<'a> {
        let mut tree = ClockTree::new();
        tree.register(ClkInit::new("ref_clk", FixedRate::new(HertzU32::MHz(24))))
            .unwrap();
        tree
    }

    #[test]
    fn force_only_where_flagged() {
        let regs = psc_regs();
        regs.set(pdstat(0), 1);
        let psc = Psc::new(&regs);
        psc.set_module_state(15, 1, ModuleState::Enable, DSP.flags)
            .unwrap();
        psc.set_module_state(9, 0, ModuleState::Enable, UART0.flags)
            .unwrap();
        psc.set_module_state(9, 0, ModuleState::Disable, UART0.flags)
            .unwrap();

        let dsp_writes = regs.writes_to(mdctl(15));
        assert_ne!(dsp_writes[0] & (1 << 31), 0);
        assert!(regs
            .writes_to(mdctl(9))
            .iter()
            .all(|value| value & (1 << 31) == 0));
    }

    #[test]
    fn power_domain_switched_on_once() {
        let regs = psc_regs();
        let psc = Psc::new(&regs);
        let mut tree = tree();
        let dsp = register_clock(&mut tree, &psc, &DSP).unwrap();
        let peer = register_clock(&mut tree, &psc, &DSP_PEER).unwrap();

        tree.enable(dsp).unwrap();
        assert_eq!(regs.writes_to(pdctl(1)), [0x001, 0x101]);
        assert_eq!(psc.module_state(15), Some(ModuleState::Enable));

        // Counted by the tree: no second transition at all.
        tree.enable(dsp).unwrap();
        assert_eq!(regs.writes_to(mdctl(15)).len(), 1);

        // Another module of the same, now running, domain.
        tree.enable(peer).unwrap();
        assert_eq!(regs.writes_to(pdctl(1)).len(), 2);
        assert_eq!(regs.writes_to(PTCMD), [0b10, 0b10]);
        // PDSTAT itself is never written.
        assert!(regs.writes_to(pdstat(1)).is_empty());
    }

    #[test]
    fn always_enabled_module_survives_disable() {
        let regs = psc_regs();
        regs.set(pdstat(0), 1);
        let psc = Psc::new(&regs);
        let mut tree = tree();
        let arm = register_clock(&mut tree, &psc, &ARM).unwrap();
        assert_eq!(psc.module_state(14), Some(ModuleState::Enable));

        regs.clear_trace();
        tree.disable(arm).unwrap();
        assert_eq!(psc.module_state(14), Some(ModuleState::Enable));
        assert!(regs.writes().is_empty());
        assert!(tree.is_enabled(arm));
    }

    #[test]
    fn enable_and_disable_drive_lreset() {
        let regs = psc_regs();
        regs.set(pdstat(0), 1);
        let psc = Psc::new(&regs);
        let mut tree = tree();
        let uart = register_clock(&mut tree, &psc, &UART0).unwrap();
        assert!(!tree.is_enabled(uart));

        tree.enable(uart).unwrap();
        assert_eq!(regs.get(mdctl(9)), 0x103);
        assert!(tree.is_enabled(uart));
        tree.disable(uart).unwrap();
        assert_eq!(regs.get(mdctl(9)), 0x002);
        assert_eq!(psc.module_state(9), Some(ModuleState::Disable));
        assert!(!tree.is_enabled(uart));
    }

    #[test]
    fn local_reset_is_separate() {
        let regs = psc_regs();
        let psc = Psc::new(&regs);
        let mut tree = tree();
        let dsp = register_clock(&mut tree, &psc, &DSP).unwrap();
        let uart = register_clock(&mut tree, &psc, &UART0).unwrap();

        tree.enable(dsp).unwrap();
        // Enabling doesn't release a module that manages its own reset.
        assert_eq!(regs.get(mdctl(15)) & (1 << 8), 0);
        tree.reset_deassert(dsp).unwrap();
        assert_eq!(regs.get(mdctl(15)) & (1 << 8), 1 << 8);
        tree.reset_assert(dsp).unwrap();
        assert_eq!(regs.get(mdctl(15)) & (1 << 8), 0);
        // The state machine wasn't touched.
        assert_eq!(psc.module_state(15), Some(ModuleState::Enable));

        assert_eq!(tree.reset_assert(uart), Err(ClockError::NotSupported));
    }

    #[test]
    fn stuck_module_times_out() {
        let regs = FakeRegs::new();
        regs.set(pdstat(0), 1);
        let psc = Psc::new(&regs).with_poll_policy(PollPolicy::Bounded(16));
        let mut tree = tree();
        let uart = register_clock(&mut tree, &psc, &UART0).unwrap();
        assert_eq!(tree.enable(uart), Err(ClockError::Timeout));
        assert_eq!(tree.enable_count(uart), 0);
        assert_eq!(psc.module_state(9), Some(ModuleState::SwRstDisable));
    }

    #[test]
    fn bad_entries_are_skipped() {
        static TABLE: [LpscInfo; 3] = [
            LpscInfo::new(9, 0, "uart0", "ref_clk", LpscFlags::NONE),
            LpscInfo::new(10, 0, "uart1", "no_such_clk", LpscFlags::NONE),
            LpscInfo::new(11, 0, "uart2", "ref_clk", LpscFlags::NONE),
        ];
        let regs = psc_regs();
        let psc = Psc::new(&regs);
        let mut tree = tree();
        assert_eq!(register_clocks(&mut tree, &psc, &TABLE), 2);
        assert!(tree.lookup("uart1").is_none());
        assert!(tree.lookup("uart2").is_some());
    }
}
