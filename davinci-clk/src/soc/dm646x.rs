//! DM646x
//!
//! The UARTs run from the separate `aux_clkin` board input.

use super::{register_pll_description, PllDescription, Registered};
use crate::clocks::ClockTree;
use crate::pll::{PllFlags, PllInfo, SysclkFlags, SysclkInfo};
use crate::psc::{self, LpscFlags, LpscInfo, Psc};
use crate::regmap::RegisterAccess;

/// PLL1.
pub static PLL1_INFO: PllInfo = PllInfo {
    name: "pll1",
    pllm_mask: 0x1f,
    pllm_min: 14,
    pllm_max: 32,
    pllout_min_rate: 0,
    pllout_max_rate: 0,
    flags: PllFlags::NONE,
    extclksrc_parent: "",
};

/// PLL1 outputs.
pub static PLL1_SYSCLKS: [SysclkInfo; 9] = [
    SysclkInfo::new(1, "pll1_sysclk1", SysclkFlags::FIXED),
    SysclkInfo::new(2, "pll1_sysclk2", SysclkFlags::FIXED),
    SysclkInfo::new(3, "pll1_sysclk3", SysclkFlags::FIXED),
    SysclkInfo::new(4, "pll1_sysclk4", SysclkFlags::NONE),
    SysclkInfo::new(5, "pll1_sysclk5", SysclkFlags::NONE),
    SysclkInfo::new(6, "pll1_sysclk6", SysclkFlags::NONE),
    SysclkInfo::new(7, "pll1_sysclk7", SysclkFlags::NONE),
    SysclkInfo::new(8, "pll1_sysclk8", SysclkFlags::NONE),
    SysclkInfo::new(9, "pll1_sysclk9", SysclkFlags::NONE),
];

/// PLL1 with its SYSCLKs, SYSCLKBP and AUXCLK.
pub static PLL1: PllDescription = PllDescription {
    info: &PLL1_INFO,
    parent: "ref_clk",
    sysclks: &PLL1_SYSCLKS,
    auxclk: Some("ref_clk"),
    sysclkbp: Some("ref_clk"),
    obsclk: None,
};

/// PLL2.
pub static PLL2_INFO: PllInfo = PllInfo {
    name: "pll2",
    pllm_mask: 0x1f,
    pllm_min: 14,
    pllm_max: 32,
    pllout_min_rate: 0,
    pllout_max_rate: 0,
    flags: PllFlags::NONE,
    extclksrc_parent: "",
};

/// PLL2 outputs.
pub static PLL2_SYSCLKS: [SysclkInfo; 1] =
    [SysclkInfo::new(1, "pll2_sysclk1", SysclkFlags::NONE)];

/// PLL2 with its SYSCLK.
pub static PLL2: PllDescription = PllDescription {
    info: &PLL2_INFO,
    parent: "ref_clk",
    sysclks: &PLL2_SYSCLKS,
    auxclk: None,
    sysclkbp: None,
    obsclk: None,
};

/// PSC modules.
pub static PSC: [LpscInfo; 23] = [
    LpscInfo::new(0, 0, "arm", "pll1_sysclk2", LpscFlags::ALWAYS_ENABLED),
    // No known disable sequence.
    LpscInfo::new(1, 0, "dsp", "pll1_sysclk1", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(4, 0, "edma_cc", "pll1_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(5, 0, "edma_tc0", "pll1_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(6, 0, "edma_tc1", "pll1_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(7, 0, "edma_tc2", "pll1_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(8, 0, "edma_tc3", "pll1_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(10, 0, "ide", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(14, 0, "emac", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(16, 0, "vpif0", "ref_clk", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(17, 0, "vpif1", "ref_clk", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(21, 0, "aemif", "pll1_sysclk3", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(22, 0, "mcasp0", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(23, 0, "mcasp1", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(26, 0, "uart0", "aux_clkin", LpscFlags::NONE),
    LpscInfo::new(27, 0, "uart1", "aux_clkin", LpscFlags::NONE),
    LpscInfo::new(28, 0, "uart2", "aux_clkin", LpscFlags::NONE),
    // Disabling these hangs the chip.
    LpscInfo::new(29, 0, "pwm0", "pll1_sysclk3", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(30, 0, "pwm1", "pll1_sysclk3", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(31, 0, "i2c", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(33, 0, "gpio", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(34, 0, "timer0", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(35, 0, "timer1", "pll1_sysclk3", LpscFlags::NONE),
];

/// Registers both PLLs and their outputs.
pub fn register_pll_clocks<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll1: &'a R,
    pll2: &'a R,
) -> usize {
    let mut registered = Registered::default();
    registered.add(register_pll_description(tree, pll1, &PLL1));
    registered.add(register_pll_description(tree, pll2, &PLL2));
    registered.count()
}

/// Registers the PSC modules.
pub fn register_psc_clocks<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    psc: &'a R,
) -> usize {
    psc::register_clocks(tree, &Psc::new(psc), &PSC)
}
