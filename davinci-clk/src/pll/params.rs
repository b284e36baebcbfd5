//! PLL multiplier/divider search

use core::ops::RangeInclusive;

use fugit::HertzU32;
use itertools::iproduct;

use super::PllInfo;

/// Pre and post divider values tried by [`PllParams::find`].
///
/// The hardware accepts 1 to 32, but nothing ever needs more than 3.
pub const SEARCH_DIV_RANGE: RangeInclusive<u32> = 1..=3;

/// One PLL configuration: `output = input / prediv * mult / postdiv`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllParams {
    /// Pre-divider ratio.
    pub prediv: u32,
    /// Effective multiplier.
    pub mult: u32,
    /// Post-divider ratio.
    pub postdiv: u32,
}

impl PllParams {
    /// Output rate of a PLL fed with `input` and configured with these parameters.
    pub fn resulting_rate(&self, input: HertzU32) -> HertzU32 {
        let out = input.raw() as u64 / self.prediv.max(1) as u64 * self.mult as u64
            / self.postdiv.max(1) as u64;
        HertzU32::from_raw(out.min(u32::MAX as u64) as u32)
    }

    /// PLL output rate before the post-divider.
    pub fn pllout_rate(&self, input: HertzU32) -> HertzU32 {
        let out = input.raw() as u64 / self.prediv.max(1) as u64 * self.mult as u64;
        HertzU32::from_raw(out.min(u32::MAX as u64) as u32)
    }

    /// Finds the configuration giving the highest output not above `output`.
    ///
    /// The multiplier stays within `info`'s limits and the rate before the post-divider within
    /// its PLLOUT window. Among configurations with the same output the one with the lowest
    /// multiplier wins, since it runs the PLL slower. Dividers the PLL doesn't have (or can't
    /// program) are pinned to 1.
    ///
    /// Returns `None` if no configuration reaches the PLLOUT minimum without exceeding
    /// `output`.
    pub fn find(input: HertzU32, output: HertzU32, info: &PllInfo) -> Option<Self> {
        let flags = &info.flags;
        let prediv_range = if flags.has_prediv && !flags.prediv_fixed_div && !flags.prediv_fixed8 {
            SEARCH_DIV_RANGE
        } else {
            1..=1
        };
        let postdiv_range = if flags.has_postdiv && !flags.postdiv_fixed_div {
            SEARCH_DIV_RANGE
        } else {
            1..=1
        };

        let parent = input.raw() as u64;
        let target = output.raw() as u64;
        let pllout_min = info.pllout_min_rate as u64;
        let pllout_max = match info.pllout_max_rate {
            0 => u64::MAX,
            max => max as u64,
        };

        let mut best: Option<(u64, PllParams)> = None;
        for (postdiv, prediv) in iproduct!(postdiv_range, prediv_range) {
            let reference = parent / prediv as u64;
            if reference == 0 {
                continue;
            }
            // Largest multiplier that could still be useful for this divider pair.
            let top = ((target * postdiv as u64).min(pllout_max) / reference)
                .min(*info.mult_range().end() as u64);
            let bottom = (*info.mult_range().start()).max(1) as u64;
            for mult in (bottom..=top).rev() {
                if !info.mult_is_legal(mult as u32) {
                    continue;
                }
                let pllout = reference * mult;
                if pllout < pllout_min {
                    break;
                }
                let rate = pllout / postdiv as u64;
                if rate > target {
                    continue;
                }
                let best_rate = best.map_or(0, |(rate, _)| rate);
                if rate < best_rate {
                    break;
                }
                let better = match best {
                    None => true,
                    Some((best_rate, params)) => {
                        rate > best_rate || (rate == best_rate && (mult as u32) < params.mult)
                    }
                };
                if better {
                    best = Some((
                        rate,
                        PllParams {
                            prediv,
                            mult: mult as u32,
                            postdiv,
                        },
                    ));
                }
            }
        }
        best.map(|(_, params)| params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pll::PllFlags;

    const DA850_LIKE: PllInfo = PllInfo {
        name: "pll0",
        pllm_mask: 0x1f,
        pllm_min: 4,
        pllm_max: 32,
        pllout_min_rate: 300_000_000,
        pllout_max_rate: 600_000_000,
        flags: PllFlags {
            has_prediv: true,
            has_postdiv: true,
            allow_set_rate: true,
            ..PllFlags::NONE
        },
        extclksrc_parent: "",
    };

    const DM365_LIKE: PllInfo = PllInfo {
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
    fn exact_300mhz_from_24mhz() {
        let params =
            PllParams::find(HertzU32::MHz(24), HertzU32::MHz(300), &DA850_LIKE).unwrap();
        assert_eq!(params.resulting_rate(HertzU32::MHz(24)), HertzU32::MHz(300));
        assert_eq!(params.mult, 25);
        // 24 / 2 * 25 and 24 * 25 / 2 tie; the first one found is kept.
        assert_eq!(
            params,
            PllParams {
                prediv: 2,
                mult: 25,
                postdiv: 1
            }
        );
    }

    #[test]
    fn operating_point_456mhz() {
        let params =
            PllParams::find(HertzU32::MHz(24), HertzU32::MHz(456), &DA850_LIKE).unwrap();
        assert_eq!(
            params,
            PllParams {
                prediv: 1,
                mult: 19,
                postdiv: 1
            }
        );
    }

    #[test]
    fn rounds_down_between_steps() {
        let params =
            PllParams::find(HertzU32::MHz(24), HertzU32::MHz(310), &DA850_LIKE).unwrap();
        let rate = params.resulting_rate(HertzU32::MHz(24));
        // 24 * 13 = 312 MHz overshoots and nothing lands between 300 and 310 MHz.
        assert_eq!(rate, HertzU32::MHz(300));
        let pllout = params.pllout_rate(HertzU32::MHz(24));
        assert!(pllout >= HertzU32::MHz(300) && pllout <= HertzU32::MHz(600));
    }

    #[test]
    fn best_rate_is_maximal_and_uses_smallest_multiplier() {
        let input = HertzU32::MHz(24);
        for target_mhz in [300u32, 333, 375, 408, 456, 500, 600, 650] {
            let target = HertzU32::MHz(target_mhz);
            let found = PllParams::find(input, target, &DA850_LIKE).unwrap();
            let found_rate = found.resulting_rate(input);

            // Brute force over the same ranges.
            let mut best = (0u32, u32::MAX);
            for (d1, m, d2) in iproduct!(1..=3u32, 4..=32u32, 1..=3u32) {
                let p = PllParams {
                    prediv: d1,
                    mult: m,
                    postdiv: d2,
                };
                let pllout = p.pllout_rate(input).raw();
                let r = p.resulting_rate(input).raw();
                if !(300_000_000..=600_000_000).contains(&pllout) || r > target.raw() {
                    continue;
                }
                if r > best.0 || (r == best.0 && m < best.1) {
                    best = (r, m);
                }
            }
            assert_eq!(found_rate.raw(), best.0, "target {} MHz", target_mhz);
            assert_eq!(found.mult, best.1, "target {} MHz", target_mhz);
        }
    }

    #[test]
    fn doubled_multiplier_goes_past_pllm_max() {
        let expected = PllParams {
            prediv: 1,
            mult: 1500,
            postdiv: 1,
        };
        let input = HertzU32::MHz(1);
        assert_eq!(
            PllParams::find(input, HertzU32::MHz(1500), &DM365_LIKE),
            Some(expected)
        );
        // Odd multipliers don't exist.
        assert_eq!(
            PllParams::find(input, HertzU32::MHz(1501), &DM365_LIKE),
            Some(expected)
        );
    }

    #[test]
    fn nothing_below_pllout_minimum() {
        assert_eq!(
            PllParams::find(HertzU32::MHz(24), HertzU32::MHz(50), &DA850_LIKE),
            None
        );
    }

    #[test]
    fn missing_dividers_stay_at_one() {
        let info = PllInfo {
            flags: PllFlags::NONE,
            pllout_min_rate: 0,
            pllout_max_rate: 0,
            ..DA850_LIKE
        };
        let params = PllParams::find(HertzU32::MHz(25), HertzU32::MHz(330), &info).unwrap();
        assert_eq!(
            params,
            PllParams {
                prediv: 1,
                mult: 13,
                postdiv: 1
            }
        );
    }
}
