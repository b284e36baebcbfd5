//! Chip descriptions
//!
//! Each module holds the static tables of one part and the functions that register them into a
//! [`ClockTree`]. Registration is best-effort: an entry that can't be registered is logged with
//! its name and skipped, and the rest of the tree is still built. The functions return how
//! many entries made it.
//!
//! The board inputs have to be registered first, as [`FixedRate`](crate::clocks::FixedRate)
//! roots: `ref_clk` on every part, and `aux_clkin` on the DM646x.

use alloc::format;

use crate::clocks::{ClockError, ClockTree};
use crate::pll::{
    register_auxclk, register_extclksrc, register_obsclk, register_pll_core, register_pllen,
    register_sysclk, register_sysclkbp, ObsclkInfo, Pll, PllInfo, SysclkInfo,
};
use crate::regmap::RegisterAccess;

pub mod da830;
pub mod da850;
pub mod dm355;
pub mod dm365;
pub mod dm644x;
pub mod dm646x;

/// Everything registered for one PLL controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllDescription {
    /// The PLL itself.
    pub info: &'static PllInfo,
    /// Clock feeding the PLL.
    pub parent: &'static str,
    /// PLLDIVn outputs.
    pub sysclks: &'static [SysclkInfo],
    /// Parent of `<pll>_auxclk`, if the PLL has one.
    pub auxclk: Option<&'static str>,
    /// Parent of `<pll>_sysclkbp`, if the PLL has one.
    pub sysclkbp: Option<&'static str>,
    /// Observation clock, if the PLL has one.
    pub obsclk: Option<&'static ObsclkInfo>,
}

/// Tally of a best-effort bring-up.
#[derive(Default)]
pub(crate) struct Registered(usize);

impl Registered {
    pub fn note<T>(&mut self, name: &str, result: Result<T, ClockError>) {
        match result {
            Ok(_) => self.0 += 1,
            Err(e) => log::warn!("failed to register {}: {}", name, e),
        }
    }

    pub fn add(&mut self, count: usize) {
        self.0 += count;
    }

    pub fn count(&self) -> usize {
        self.0
    }
}

/// Registers a PLL and its outputs: the PLL, its bypass chain, AUXCLK, SYSCLKBP, each SYSCLK,
/// then OBSCLK.
///
/// Returns how many of these entries were registered.
pub fn register_pll_description<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    regs: &'a R,
    desc: &PllDescription,
) -> usize {
    let pll = Pll::new(regs, desc.info);
    let mut registered = Registered::default();
    registered.note(desc.info.name, register_pll_core(tree, &pll, desc.parent));
    registered.add(register_pll_outputs(tree, &pll, desc));
    registered.count()
}

/// Second half of [`register_pll_description`]: everything after `<pll>_pllout`.
///
/// Split out for PLLs that can be bypassed to another PLL's output, whose outputs have to wait
/// for that PLL.
pub(crate) fn register_pll_outputs<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll: &Pll<'a, R>,
    desc: &PllDescription,
) -> usize {
    let name = desc.info.name;
    let mut registered = Registered::default();

    if desc.info.flags.has_extclksrc {
        registered.note(
            &format!("{}_extclksrc", name),
            register_extclksrc(tree, pll, desc.parent),
        );
    }
    registered.note(&format!("{}_pllen", name), register_pllen(tree, pll, desc.parent));
    if let Some(parent) = desc.auxclk {
        registered.note(&format!("{}_auxclk", name), register_auxclk(tree, pll, parent));
    }
    if let Some(parent) = desc.sysclkbp {
        registered.note(&format!("{}_sysclkbp", name), register_sysclkbp(tree, pll, parent));
    }
    for sysclk in desc.sysclks {
        registered.note(sysclk.name, register_sysclk(tree, pll, sysclk));
    }
    if let Some(obsclk) = desc.obsclk {
        registered.note(obsclk.name, register_obsclk(tree, pll, obsclk));
    }
    registered.count()
}
