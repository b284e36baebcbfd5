//! Gate, divider and mux building blocks shared by the PLL outputs and the CFGCHIP clocks.

use fugit::HertzU32;

use super::{div_rate, ClockError};
use crate::regmap::RegisterAccess;

/// A single enable bit.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Gate {
    pub offset: u32,
    pub bit: u8,
}

impl Gate {
    fn mask(&self) -> u32 {
        1 << self.bit
    }

    pub fn enable<R: RegisterAccess + ?Sized>(&self, regs: &R) {
        regs.update_bits(self.offset, self.mask(), self.mask());
    }

    pub fn disable<R: RegisterAccess + ?Sized>(&self, regs: &R) {
        regs.update_bits(self.offset, self.mask(), 0);
    }

    pub fn is_enabled<R: RegisterAccess + ?Sized>(&self, regs: &R) -> bool {
        regs.read(self.offset) & self.mask() != 0
    }
}

/// A `width` bit field holding `ratio - 1`.
///
/// With an `enable_bit`, the divider passes its input through unchanged while that bit is clear,
/// whatever ratio is stored.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Divider {
    pub offset: u32,
    pub shift: u8,
    pub width: u8,
    pub enable_bit: Option<u8>,
    pub read_only: bool,
}

impl Divider {
    fn field_mask(&self) -> u32 {
        (1 << self.width) - 1
    }

    /// Largest ratio the field can hold.
    pub fn max_ratio(&self) -> u32 {
        1 << self.width
    }

    pub fn ratio<R: RegisterAccess + ?Sized>(&self, regs: &R) -> u32 {
        let value = regs.read(self.offset);
        if let Some(bit) = self.enable_bit {
            if value & (1 << bit) == 0 {
                return 1;
            }
        }
        ((value >> self.shift) & self.field_mask()) + 1
    }

    pub fn recalc<R: RegisterAccess + ?Sized>(&self, regs: &R, parent_rate: HertzU32) -> HertzU32 {
        div_rate(parent_rate, self.ratio(regs))
    }

    /// Smallest ratio that brings `parent_rate` down to `rate` or below.
    ///
    /// Fails with [`ClockError::RateOutOfRange`] when even the largest ratio stays above `rate`.
    pub fn best_ratio(&self, rate: HertzU32, parent_rate: HertzU32) -> Result<u32, ClockError> {
        if self.read_only {
            return Err(ClockError::NotSupported);
        }
        if rate.raw() == 0 {
            return Err(ClockError::RateOutOfRange);
        }
        let ratio = parent_rate.raw().div_ceil(rate.raw()).max(1);
        if ratio > self.max_ratio() {
            return Err(ClockError::RateOutOfRange);
        }
        Ok(ratio)
    }

    pub fn round(&self, rate: HertzU32, parent_rate: HertzU32) -> Result<HertzU32, ClockError> {
        Ok(div_rate(parent_rate, self.best_ratio(rate, parent_rate)?))
    }

    /// Stores `ratio`, setting the enable bit if there is one.
    pub fn write_ratio<R: RegisterAccess + ?Sized>(
        &self,
        regs: &R,
        ratio: u32,
    ) -> Result<(), ClockError> {
        if self.read_only {
            return Err(ClockError::NotSupported);
        }
        if !(1..=self.max_ratio()).contains(&ratio) {
            return Err(ClockError::InvalidDivider);
        }
        let mut mask = self.field_mask() << self.shift;
        let mut value = (ratio - 1) << self.shift;
        if let Some(bit) = self.enable_bit {
            mask |= 1 << bit;
            value |= 1 << bit;
        }
        regs.update_bits(self.offset, mask, value);
        Ok(())
    }
}

/// A parent selector. `table` maps parent index to register value; without one the index is
/// stored as is.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Mux {
    pub offset: u32,
    pub shift: u8,
    pub mask: u32,
    pub table: Option<&'static [u32]>,
}

impl Mux {
    pub fn index<R: RegisterAccess + ?Sized>(&self, regs: &R) -> Result<usize, ClockError> {
        let value = (regs.read(self.offset) >> self.shift) & self.mask;
        match self.table {
            Some(table) => table
                .iter()
                .position(|&v| v == value)
                .ok_or(ClockError::InvalidParentIndex),
            None => Ok(value as usize),
        }
    }

    pub fn select<R: RegisterAccess + ?Sized>(
        &self,
        regs: &R,
        index: usize,
    ) -> Result<(), ClockError> {
        let value = match self.table {
            Some(table) => *table.get(index).ok_or(ClockError::InvalidParentIndex)?,
            None => u32::try_from(index).map_err(|_| ClockError::InvalidParentIndex)?,
        };
        if value & !self.mask != 0 {
            return Err(ClockError::InvalidParentIndex);
        }
        regs.update_bits(self.offset, self.mask << self.shift, value << self.shift);
        Ok(())
    }
}
