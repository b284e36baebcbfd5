//! DM365
//!
//! PLLM holds half of the effective multiplier on this part.

use super::{register_pll_description, PllDescription, Registered};
use crate::clocks::ClockTree;
use crate::pll::{ObsclkInfo, PllFlags, PllInfo, SysclkFlags, SysclkInfo};
use crate::psc::{self, LpscFlags, LpscInfo, Psc};
use crate::regmap::RegisterAccess;

const PLL_FLAGS: PllFlags = PllFlags {
    has_prediv: true,
    has_postdiv: true,
    postdiv_always_enabled: true,
    pllm_2x: true,
    ..PllFlags::NONE
};

const OBSCLK_PARENTS: &[&str] = &["ref_clk"];
const OBSCLK_TABLE: &[u32] = &[0x10];

/// PLL1.
pub static PLL1_INFO: PllInfo = PllInfo {
    name: "pll1",
    pllm_mask: 0x3ff,
    pllm_min: 1,
    pllm_max: 1023,
    pllout_min_rate: 0,
    pllout_max_rate: 0,
    flags: PLL_FLAGS,
    extclksrc_parent: "",
};

/// PLL1 outputs.
pub static PLL1_SYSCLKS: [SysclkInfo; 9] = [
    SysclkInfo::new(1, "pll1_sysclk1", SysclkFlags::NONE),
    SysclkInfo::new(2, "pll1_sysclk2", SysclkFlags::NONE),
    SysclkInfo::new(3, "pll1_sysclk3", SysclkFlags::NONE),
    SysclkInfo::new(4, "pll1_sysclk4", SysclkFlags::NONE),
    SysclkInfo::new(5, "pll1_sysclk5", SysclkFlags::NONE),
    SysclkInfo::new(6, "pll1_sysclk6", SysclkFlags::NONE),
    SysclkInfo::new(7, "pll1_sysclk7", SysclkFlags::NONE),
    SysclkInfo::new(8, "pll1_sysclk8", SysclkFlags::NONE),
    SysclkInfo::new(9, "pll1_sysclk9", SysclkFlags::NONE),
];

/// CLKOUT0 pin.
pub static PLL1_OBSCLK: ObsclkInfo = ObsclkInfo {
    name: "clkout0",
    parents: OBSCLK_PARENTS,
    table: OBSCLK_TABLE,
};

/// PLL1 with all of its outputs.
pub static PLL1: PllDescription = PllDescription {
    info: &PLL1_INFO,
    parent: "ref_clk",
    sysclks: &PLL1_SYSCLKS,
    auxclk: Some("ref_clk"),
    sysclkbp: Some("ref_clk"),
    obsclk: Some(&PLL1_OBSCLK),
};

/// PLL2.
pub static PLL2_INFO: PllInfo = PllInfo {
    name: "pll2",
    pllm_mask: 0x3ff,
    pllm_min: 1,
    pllm_max: 1023,
    pllout_min_rate: 0,
    pllout_max_rate: 0,
    flags: PLL_FLAGS,
    extclksrc_parent: "",
};

/// PLL2 outputs.
pub static PLL2_SYSCLKS: [SysclkInfo; 5] = [
    SysclkInfo::new(1, "pll2_sysclk1", SysclkFlags::NONE),
    SysclkInfo::new(2, "pll2_sysclk2", SysclkFlags::NONE),
    SysclkInfo::new(3, "pll2_sysclk3", SysclkFlags::NONE),
    SysclkInfo::new(4, "pll2_sysclk4", SysclkFlags::NONE),
    SysclkInfo::new(5, "pll2_sysclk5", SysclkFlags::NONE),
];

/// CLKOUT1 pin.
pub static PLL2_OBSCLK: ObsclkInfo = ObsclkInfo {
    name: "clkout1",
    parents: OBSCLK_PARENTS,
    table: OBSCLK_TABLE,
};

/// PLL2 with its SYSCLKs, AUXCLK and OBSCLK.
pub static PLL2: PllDescription = PllDescription {
    info: &PLL2_INFO,
    parent: "ref_clk",
    sysclks: &PLL2_SYSCLKS,
    auxclk: Some("ref_clk"),
    sysclkbp: None,
    obsclk: Some(&PLL2_OBSCLK),
};

/// PSC modules. The voice codec and video DAC sit in power domain 1.
pub static PSC: [LpscInfo; 30] = [
    LpscInfo::new(1, 0, "vpss_slave", "pll1_sysclk5", LpscFlags::NONE),
    LpscInfo::new(5, 0, "timer3", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(6, 0, "spi1", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(7, 0, "mmcsd1", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(8, 0, "asp0", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(9, 0, "usb", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(10, 0, "pwm3", "ref_clk", LpscFlags::NONE),
    LpscInfo::new(11, 0, "spi2", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(12, 0, "rto", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(14, 0, "aemif", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(15, 0, "mmcsd0", "pll1_sysclk8", LpscFlags::NONE),
    LpscInfo::new(18, 0, "i2c", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(19, 0, "uart0", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(20, 0, "uart1", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(22, 0, "spi0", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(23, 0, "pwm0", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(24, 0, "pwm1", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(25, 0, "pwm2", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(26, 0, "gpio", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(27, 0, "timer0", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(28, 0, "timer1", "pll1_auxclk", LpscFlags::NONE),
    // Watchdog.
    LpscInfo::new(29, 0, "timer2", "pll1_auxclk", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(31, 0, "arm", "pll2_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(38, 0, "spi3", "pll1_sysclk4", LpscFlags::NONE),
    LpscInfo::new(39, 0, "spi4", "pll1_auxclk", LpscFlags::NONE),
    LpscInfo::new(40, 0, "emac", "pll2_sysclk4", LpscFlags::NONE),
    LpscInfo::new(44, 1, "voice_codec", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(46, 1, "vpss_dac", "pll1_sysclk3", LpscFlags::NONE),
    LpscInfo::new(47, 0, "vpss_master", "pll1_sysclk5", LpscFlags::NONE),
    LpscInfo::new(50, 0, "mjcp", "pll1_sysclk3", LpscFlags::NONE),
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
