//! Simulated DaVinci register blocks for host-side bring-up tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use davinci_clk::clocks::FixedRate;
use davinci_clk::{ClkInit, ClockTree, RegisterAccess};
use embedded_hal::delay::DelayNs;
use fugit::HertzU32;

pub const PLLCTL: u32 = 0x100;
pub const OCSEL: u32 = 0x104;
pub const PLLM: u32 = 0x110;
pub const PREDIV: u32 = 0x114;
pub const POSTDIV: u32 = 0x128;
pub const BPDIV: u32 = 0x12c;
pub const CKEN: u32 = 0x148;

pub const EPCPR: u32 = 0x070;
pub const PTCMD: u32 = 0x120;

pub const fn plldiv(id: u32) -> u32 {
    if id <= 3 {
        0x118 + 4 * (id - 1)
    } else {
        0x160 + 4 * (id - 4)
    }
}

pub const fn pdstat(pd: u32) -> u32 {
    0x200 + 4 * pd
}

pub const fn pdctl(pd: u32) -> u32 {
    0x300 + 4 * pd
}

pub const fn mdstat(lpsc: u32) -> u32 {
    0x800 + 4 * lpsc
}

pub const fn mdctl(lpsc: u32) -> u32 {
    0xa00 + 4 * lpsc
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Behaviour {
    Plain,
    Psc,
}

/// A register block that stores what is written and, for a PSC, completes every transition
/// at once.
pub struct SimBlock {
    values: RefCell<BTreeMap<u32, u32>>,
    writes: RefCell<Vec<(u32, u32)>>,
    behaviour: Behaviour,
}

impl SimBlock {
    /// A block without side effects (PLL controller, CFGCHIP).
    pub fn plain(presets: &[(u32, u32)]) -> Self {
        Self::with(Behaviour::Plain, presets)
    }

    /// A PSC whose power domains start switched off.
    pub fn psc() -> Self {
        Self::with(Behaviour::Psc, &[])
    }

    fn with(behaviour: Behaviour, presets: &[(u32, u32)]) -> Self {
        Self {
            values: RefCell::new(presets.iter().copied().collect()),
            writes: RefCell::new(Vec::new()),
            behaviour,
        }
    }

    pub fn get(&self, offset: u32) -> u32 {
        self.values.borrow().get(&offset).copied().unwrap_or(0)
    }

    pub fn set(&self, offset: u32, value: u32) {
        self.values.borrow_mut().insert(offset, value);
    }

    pub fn writes_to(&self, offset: u32) -> Vec<u32> {
        self.writes
            .borrow()
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }

    fn simulate_psc(values: &mut BTreeMap<u32, u32>, offset: u32, value: u32) {
        if (0xa00..0xb00).contains(&offset) {
            let lpsc = (offset - 0xa00) / 4;
            let state = value & 0x1f;
            let mckout = if state == 3 { 1 << 12 } else { 0 };
            values.insert(mdstat(lpsc), state | mckout);
        } else if offset == PTCMD {
            for pd in 0..32 {
                if value & (1 << pd) != 0 {
                    *values.entry(EPCPR).or_insert(0) |= 1 << pd;
                    values.insert(pdstat(pd), 1);
                }
            }
        }
    }
}

impl RegisterAccess for SimBlock {
    fn read(&self, offset: u32) -> u32 {
        self.get(offset)
    }

    fn write(&self, offset: u32, value: u32) {
        self.writes.borrow_mut().push((offset, value));
        let mut values = self.values.borrow_mut();
        values.insert(offset, value);
        if self.behaviour == Behaviour::Psc {
            Self::simulate_psc(&mut values, offset, value);
        }
    }
}

/// Delays that return immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// A tree holding the board's reference crystal.
pub fn board<'a>(ref_clk: HertzU32) -> ClockTree<'a> {
    let mut tree = ClockTree::new();
    tree.register(ClkInit::new("ref_clk", FixedRate::new(ref_clk)))
        .expect("ref_clk");
    tree
}

pub fn rate(tree: &ClockTree<'_>, name: &str) -> HertzU32 {
    tree.get_rate(tree.get(name).expect(name))
}
