//! Clocks without registers: board inputs and fixed pre-scalers.

use fugit::HertzU32;

use super::ClkOps;

/// A root clock running at a constant rate, e.g. the board's reference oscillator.
#[derive(Copy, Clone, Debug)]
pub struct FixedRate {
    rate: HertzU32,
}

impl FixedRate {
    /// Creates a source running at `rate`.
    pub const fn new(rate: HertzU32) -> Self {
        Self { rate }
    }
}

impl ClkOps for FixedRate {
    fn recalc_rate(&self, _parent_rate: HertzU32) -> HertzU32 {
        self.rate
    }

    fn parent_rate_for(&self, _rate: HertzU32) -> Option<HertzU32> {
        None
    }
}

/// Parent rate scaled by `mult / div`.
#[derive(Copy, Clone, Debug)]
pub struct FixedFactor {
    mult: u32,
    div: u32,
}

impl FixedFactor {
    /// Creates a `mult / div` scaler. A zero `div` is treated as 1.
    pub const fn new(mult: u32, div: u32) -> Self {
        Self {
            mult,
            div: if div == 0 { 1 } else { div },
        }
    }
}

impl ClkOps for FixedFactor {
    fn recalc_rate(&self, parent_rate: HertzU32) -> HertzU32 {
        let rate = parent_rate.raw() as u64 * self.mult as u64 / self.div as u64;
        HertzU32::from_raw(rate.min(u32::MAX as u64) as u32)
    }

    fn parent_rate_for(&self, rate: HertzU32) -> Option<HertzU32> {
        if self.mult == 0 {
            return None;
        }
        let parent = rate.raw() as u64 * self.div as u64 / self.mult as u64;
        u32::try_from(parent).ok().map(HertzU32::from_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_factor_scales() {
        let div4p5 = FixedFactor::new(2, 9);
        assert_eq!(
            div4p5.recalc_rate(HertzU32::MHz(456)),
            HertzU32::from_raw(101_333_333)
        );
        assert_eq!(
            div4p5.parent_rate_for(HertzU32::MHz(100)),
            Some(HertzU32::MHz(450))
        );
    }

    #[test]
    fn fixed_rate_ignores_parent() {
        let osc = FixedRate::new(HertzU32::MHz(24));
        assert_eq!(osc.recalc_rate(HertzU32::Hz(0)), HertzU32::MHz(24));
        assert_eq!(osc.parent_rate_for(HertzU32::MHz(24)), None);
    }
}
