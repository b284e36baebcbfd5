//! Register access
//!
//! Every clock in this crate reaches its hardware through [`RegisterAccess`]. A PLL controller,
//! a PSC or the chip configuration block each hand one implementation to all of their clocks.
//!
//! Two implementations are provided:
//!
//! * [`Mmio`] for a block of memory-mapped registers,
//! * [`Syscon`] for a window into a block that is shared with unrelated drivers (the DA8xx
//!   CFGCHIP registers sit next to the pin muxing and USB PHY controls).

use vcell::VolatileCell;

/// Word-wide access to a block of 32-bit registers, addressed by byte offset.
///
/// Implementations use interior mutability: clocks sharing one block only hold `&R`.
pub trait RegisterAccess {
    /// Reads the register at `offset`.
    fn read(&self, offset: u32) -> u32;

    /// Writes `value` to the register at `offset`.
    fn write(&self, offset: u32, value: u32);

    /// Replaces the bits selected by `mask` with the matching bits of `value`.
    fn update_bits(&self, offset: u32, mask: u32, value: u32) {
        let old = self.read(offset);
        self.write(offset, (old & !mask) | (value & mask));
    }
}

/// A memory-mapped register block.
pub struct Mmio<'a> {
    regs: &'a [VolatileCell<u32>],
}

impl<'a> Mmio<'a> {
    /// Wraps a block of registers that is already mapped.
    pub fn new(regs: &'a [VolatileCell<u32>]) -> Self {
        Self { regs }
    }

    /// Wraps `len` bytes of registers starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be word aligned and point to `len` bytes of device registers that stay mapped
    /// for `'a`. Nothing else may access them through non-volatile loads or stores.
    pub unsafe fn from_raw_parts(base: *mut u32, len: usize) -> Self {
        Self {
            regs: core::slice::from_raw_parts(base as *const VolatileCell<u32>, len / 4),
        }
    }

    /// Size of the block in bytes.
    pub fn len(&self) -> usize {
        self.regs.len() * 4
    }

    /// Whether the block is empty.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `offset` lies outside the block.
    fn cell(&self, offset: u32) -> &VolatileCell<u32> {
        &self.regs[(offset / 4) as usize]
    }
}

impl RegisterAccess for Mmio<'_> {
    fn read(&self, offset: u32) -> u32 {
        self.cell(offset).get()
    }

    fn write(&self, offset: u32, value: u32) {
        self.cell(offset).set(value)
    }
}

/// A register window inside a block shared with other drivers.
///
/// Offsets are relative to `base`. Read-modify-write cycles run inside a critical section so an
/// unrelated driver touching other bits of the same word can't interleave with them.
pub struct Syscon<'a, R: RegisterAccess + ?Sized> {
    regs: &'a R,
    base: u32,
}

impl<'a, R: RegisterAccess + ?Sized> Syscon<'a, R> {
    /// Creates a window starting `base` bytes into `regs`.
    pub fn new(regs: &'a R, base: u32) -> Self {
        Self { regs, base }
    }
}

impl<R: RegisterAccess + ?Sized> RegisterAccess for Syscon<'_, R> {
    fn read(&self, offset: u32) -> u32 {
        self.regs.read(self.base + offset)
    }

    fn write(&self, offset: u32, value: u32) {
        self.regs.write(self.base + offset, value)
    }

    fn update_bits(&self, offset: u32, mask: u32, value: u32) {
        critical_section::with(|_| {
            let old = self.read(offset);
            self.write(offset, (old & !mask) | (value & mask));
        })
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! A register file that remembers every access.

    extern crate std;

    use std::{boxed::Box, cell::RefCell, collections::BTreeMap, vec::Vec};

    use embedded_hal::delay::DelayNs;

    use super::RegisterAccess;

    /// One recorded bus cycle (or delay).
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub enum Access {
        Read(u32, u32),
        Write(u32, u32),
        DelayUs(u32),
    }

    type Hook = Box<dyn Fn(&mut BTreeMap<u32, u32>, u32, u32)>;

    #[derive(Default)]
    pub struct FakeRegs {
        values: RefCell<BTreeMap<u32, u32>>,
        trace: RefCell<Vec<Access>>,
        on_write: Option<Hook>,
    }

    impl FakeRegs {
        pub fn new() -> Self {
            Self::default()
        }

        /// `hook` runs after every write and may update other registers, standing in for the
        /// hardware's reaction.
        pub fn with_hook(hook: impl Fn(&mut BTreeMap<u32, u32>, u32, u32) + 'static) -> Self {
            Self {
                on_write: Some(Box::new(hook)),
                ..Self::default()
            }
        }

        /// Presets a register without recording it.
        pub fn set(&self, offset: u32, value: u32) {
            self.values.borrow_mut().insert(offset, value);
        }

        /// Peeks at a register without recording it.
        pub fn get(&self, offset: u32) -> u32 {
            self.values.borrow().get(&offset).copied().unwrap_or(0)
        }

        pub fn trace(&self) -> Vec<Access> {
            self.trace.borrow().clone()
        }

        pub fn writes(&self) -> Vec<(u32, u32)> {
            self.trace
                .borrow()
                .iter()
                .filter_map(|a| match *a {
                    Access::Write(offset, value) => Some((offset, value)),
                    _ => None,
                })
                .collect()
        }

        pub fn writes_to(&self, offset: u32) -> Vec<u32> {
            self.writes()
                .into_iter()
                .filter(|(o, _)| *o == offset)
                .map(|(_, v)| v)
                .collect()
        }

        pub fn clear_trace(&self) {
            self.trace.borrow_mut().clear();
        }

        pub fn record_delay(&self, us: u32) {
            self.trace.borrow_mut().push(Access::DelayUs(us));
        }
    }

    impl RegisterAccess for FakeRegs {
        fn read(&self, offset: u32) -> u32 {
            let value = self.get(offset);
            self.trace.borrow_mut().push(Access::Read(offset, value));
            value
        }

        fn write(&self, offset: u32, value: u32) {
            {
                let mut values = self.values.borrow_mut();
                values.insert(offset, value);
                if let Some(hook) = &self.on_write {
                    hook(&mut *values, offset, value);
                }
            }
            self.trace.borrow_mut().push(Access::Write(offset, value));
        }
    }

    /// Records delays into the trace of a [`FakeRegs`] so they can be ordered against bus cycles.
    pub struct FakeDelay<'r>(pub &'r FakeRegs);

    impl DelayNs for FakeDelay<'_> {
        fn delay_ns(&mut self, ns: u32) {
            self.0.record_delay(ns.div_ceil(1000));
        }

        fn delay_us(&mut self, us: u32) {
            self.0.record_delay(us);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: VolatileCell<u32> = VolatileCell::new(0);

    #[test]
    fn mmio_reads_back_writes() {
        let cells = [ZERO; 4];
        let regs = Mmio::new(&cells);
        regs.write(0x8, 0xdead_beef);
        assert_eq!(regs.read(0x8), 0xdead_beef);
        assert_eq!(cells[2].get(), 0xdead_beef);
        assert_eq!(regs.len(), 16);
    }

    #[test]
    fn update_bits_only_touches_mask() {
        let cells = [ZERO; 1];
        let regs = Mmio::new(&cells);
        regs.write(0, 0xff00_00ff);
        regs.update_bits(0, 0x0000_0f0f, 0x1234_5678);
        assert_eq!(regs.read(0), 0xff00_06f8);
    }

    #[test]
    fn syscon_window_is_offset() {
        let cells = [ZERO; 8];
        let block = Mmio::new(&cells);
        let syscon = Syscon::new(&block, 0x10);
        syscon.update_bits(0x4, 1 << 4, 1 << 4);
        assert_eq!(cells[5].get(), 1 << 4);
        assert_eq!(syscon.read(0x4), 1 << 4);
    }
}
