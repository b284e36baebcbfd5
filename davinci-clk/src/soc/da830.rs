//! DA830 / OMAP-L137 / AM17xx

use super::{register_pll_description, PllDescription, Registered};
use crate::cfgchip::{self, cfgchip, CfgchipGateInfo, CfgchipMuxInfo};
use crate::clocks::{ClkInit, ClockTree, FixedFactor};
use crate::pll::{PllFlags, PllInfo, SysclkFlags, SysclkInfo};
use crate::psc::{self, LpscFlags, LpscInfo, Psc};
use crate::regmap::RegisterAccess;

/// PLL0.
pub static PLL0_INFO: PllInfo = PllInfo {
    name: "pll0",
    pllm_mask: 0x1f,
    pllm_min: 4,
    pllm_max: 32,
    pllout_min_rate: 300_000_000,
    pllout_max_rate: 600_000_000,
    flags: PllFlags {
        has_prediv: true,
        has_postdiv: true,
        ..PllFlags::NONE
    },
    extclksrc_parent: "",
};

/// PLL0 outputs. There is no SYSCLK1.
pub static PLL0_SYSCLKS: [SysclkInfo; 6] = [
    SysclkInfo::new(2, "pll0_sysclk2", SysclkFlags::FIXED),
    SysclkInfo::new(3, "pll0_sysclk3", SysclkFlags::NONE),
    SysclkInfo::new(4, "pll0_sysclk4", SysclkFlags::FIXED),
    SysclkInfo::new(5, "pll0_sysclk5", SysclkFlags::NONE),
    SysclkInfo::new(6, "pll0_sysclk6", SysclkFlags::FIXED),
    SysclkInfo::new(7, "pll0_sysclk7", SysclkFlags::NONE),
];

/// PLL0 with its AUXCLK and SYSCLKs.
pub static PLL0: PllDescription = PllDescription {
    info: &PLL0_INFO,
    parent: "ref_clk",
    sysclks: &PLL0_SYSCLKS,
    auxclk: Some("ref_clk"),
    sysclkbp: None,
    obsclk: None,
};

/// PSC0 modules.
pub static PSC0: [LpscInfo; 15] = [
    LpscInfo::new(0, 0, "tpcc", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(1, 0, "tptc0", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(2, 0, "tptc1", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(3, 0, "aemif", "pll0_sysclk3", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(4, 0, "spi0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(5, 0, "mmcsd", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(6, 0, "aintc", "pll0_sysclk4", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(7, 0, "arm_rom", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(8, 0, "secu_mgr", "pll0_sysclk4", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(9, 0, "uart0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(10, 0, "scr0_ss", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(11, 0, "scr1_ss", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(12, 0, "scr2_ss", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(13, 0, "dmax", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(14, 0, "arm", "pll0_sysclk6", LpscFlags::ALWAYS_ENABLED),
];

/// PSC1 modules.
pub static PSC1: [LpscInfo; 16] = [
    LpscInfo::new(1, 0, "usb0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(2, 0, "usb1", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(3, 0, "gpio", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(5, 0, "emac", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(6, 0, "emif3", "pll0_sysclk5", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(7, 0, "mcasp0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(8, 0, "mcasp1", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(9, 0, "mcasp2", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(10, 0, "spi1", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(11, 0, "i2c1", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(12, 0, "uart1", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(13, 0, "uart2", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(16, 0, "lcdc", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(17, 0, "pwm", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(20, 0, "ecap", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(21, 0, "eqep", "pll0_sysclk2", LpscFlags::NONE),
];

/// Fixed /4.5 tap of PLL0, gated by `div4.5`.
pub const PLL0_DIV4P5: &str = "pll0_div4p5";

/// The `div4.5` gate.
pub static DIV4P5: CfgchipGateInfo = CfgchipGateInfo {
    name: "div4.5",
    parent: PLL0_DIV4P5,
    reg: cfgchip(3),
    bit: 2,
};

/// External memory interface clock sources.
pub static CFGCHIP_MUXES: [CfgchipMuxInfo; 2] = [
    CfgchipMuxInfo {
        name: "ema_clksrc",
        parents: ["pll0_sysclk3", "div4.5"],
        reg: cfgchip(3),
        bit: 1,
    },
    CfgchipMuxInfo {
        name: "emb_clksrc",
        parents: ["pll0_sysclk5", "div4.5"],
        reg: cfgchip(3),
        bit: 0,
    },
];

/// Registers the PLL and its outputs.
pub fn register_pll_clocks<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll0: &'a R,
) -> usize {
    register_pll_description(tree, pll0, &PLL0)
}

/// Registers `div4.5` and the EMIF clock source muxes. `syscon` must start at CFGCHIP0.
pub fn register_cfgchip_clocks<'a, S: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    syscon: &'a S,
) -> usize {
    let mut registered = Registered::default();
    registered.note(
        PLL0_DIV4P5,
        tree.register(ClkInit::new(PLL0_DIV4P5, FixedFactor::new(2, 9)).parent("pll0_pllout")),
    );
    registered.note(DIV4P5.name, cfgchip::register_gate(tree, syscon, &DIV4P5));
    for mux in &CFGCHIP_MUXES {
        registered.note(mux.name, cfgchip::register_mux(tree, syscon, mux));
    }
    registered.count()
}

/// Registers the modules of both PSCs.
pub fn register_psc_clocks<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    psc0: &'a R,
    psc1: &'a R,
) -> usize {
    psc::register_clocks(tree, &Psc::new(psc0), &PSC0)
        + psc::register_clocks(tree, &Psc::new(psc1), &PSC1)
}
