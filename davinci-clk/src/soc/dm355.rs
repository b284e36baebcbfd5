//! DM355
//!
//! PLL1's pre-divider reads back unreliably and is fixed at /8; both PLLs have fixed
//! post-dividers.

use super::{register_pll_description, PllDescription, Registered};
use crate::clocks::ClockTree;
use crate::pll::{PllFlags, PllInfo, SysclkFlags, SysclkInfo};
use crate::psc::{self, LpscFlags, LpscInfo, Psc};
use crate::regmap::RegisterAccess;

/// PLL1.
pub static PLL1_INFO: PllInfo = PllInfo {
    name: "pll1",
    pllm_mask: 0xff,
    pllm_min: 92,
    pllm_max: 184,
    pllout_min_rate: 0,
    pllout_max_rate: 0,
    flags: PllFlags {
        has_oscin: true,
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

/// PLL1 outputs.
pub static PLL1_SYSCLKS: [SysclkInfo; 4] = [
    SysclkInfo::new(1, "pll1_sysclk1", SysclkFlags::FIXED),
    SysclkInfo::new(2, "pll1_sysclk2", SysclkFlags::FIXED),
    SysclkInfo::new(3, "pll1_sysclk3", SysclkFlags::NONE),
    SysclkInfo::new(4, "pll1_sysclk4", SysclkFlags::NONE),
];

/// PLL1 with its SYSCLKs, AUXCLK and SYSCLKBP.
pub static PLL1: PllDescription = PllDescription {
    info: &PLL1_INFO,
    parent: "ref_clk",
    sysclks: &PLL1_SYSCLKS,
    auxclk: Some("oscin"),
    sysclkbp: Some("oscin"),
    obsclk: None,
};

/// PLL2.
pub static PLL2_INFO: PllInfo = PllInfo {
    name: "pll2",
    pllm_mask: 0xff,
    pllm_min: 92,
    pllm_max: 184,
    pllout_min_rate: 0,
    pllout_max_rate: 0,
    flags: PllFlags {
        has_prediv: true,
        prediv_always_enabled: true,
        has_postdiv: true,
        postdiv_always_enabled: true,
        postdiv_fixed_div: true,
        ..PllFlags::NONE
    },
    extclksrc_parent: "",
};

/// PLL2 outputs.
pub static PLL2_SYSCLKS: [SysclkInfo; 1] =
    [SysclkInfo::new(1, "pll2_sysclk1", SysclkFlags::FIXED)];

/// PLL2 with its SYSCLK and SYSCLKBP.
pub static PLL2: PllDescription = PllDescription {
    info: &PLL2_INFO,
    parent: "oscin",
    sysclks: &PLL2_SYSCLKS,
    auxclk: None,
    sysclkbp: Some("oscin"),
    obsclk: None,
};

/// PSC modules. Everything is in the always-on domain.
pub static PSC: [LpscInfo; 28] = [
    LpscInfo::new(0, 0, "vpss_master", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(1, 0, "vpss_slave", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(5, 0, "timer3", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(6, 0, "spi1", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(7, 0, "mmcsd1", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(8, 0, "asp1", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(9, 0, "usb", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(10, 0, "pwm3", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(11, 0, "spi2", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(12, 0, "rto", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(14, 0, "aemif", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(15, 0, "mmcsd0", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(17, 0, "asp0", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(18, 0, "i2c", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(19, 0, "uart0", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(20, 0, "uart1", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(21, 0, "uart2", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(22, 0, "spi0", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(23, 0, "pwm0", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(24, 0, "pwm1", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(25, 0, "pwm2", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(26, 0, "gpio", "pll1_sysclk2", LpscFlags::NONE),
    LpscInfo::new(27, 0, "timer0", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(28, 0, "timer1", "pll1_auxclk", LpscFlags::NONE),
    // Watchdog.
    LpscInfo::new(29, 0, "timer2", "pll1_auxclk", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(31, 0, "arm", "pll1_sysclk1", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(40, 0, "mjcp", "pll1_sysclk1", LpscFlags::NONE),
    LpscInfo::new(41, 0, "vpss_dac", "pll1_sysclk3", LpscFlags::NONE),
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
