//! DA850 / OMAP-L138 / AM18xx
//!
//! Two PLL controllers (PLL1 is fed from PLL0's `oscin`), two PSCs and the CFGCHIP clock
//! muxes. Both PLLs may be reprogrammed at runtime.

use super::{register_pll_description, register_pll_outputs, PllDescription, Registered};
use crate::cfgchip::{self, cfgchip, CfgchipGateInfo, CfgchipMuxInfo};
use crate::clocks::{ClkInit, ClockTree, FixedFactor};
use crate::pll::{
    register_obsclk, register_pll_core, ObsclkInfo, Pll, PllFlags, PllInfo, SysclkFlags,
    SysclkInfo,
};
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
        has_oscin: true,
        has_prediv: true,
        has_postdiv: true,
        has_extclksrc: true,
        allow_set_rate: true,
        ..PllFlags::NONE
    },
    extclksrc_parent: "pll1_sysclk3",
};

/// PLL0 outputs.
pub static PLL0_SYSCLKS: [SysclkInfo; 7] = [
    SysclkInfo::new(1, "pll0_sysclk1", SysclkFlags::FIXED),
    SysclkInfo::new(2, "pll0_sysclk2", SysclkFlags::FIXED),
    SysclkInfo::new(3, "pll0_sysclk3", SysclkFlags::NONE),
    SysclkInfo::new(4, "pll0_sysclk4", SysclkFlags::FIXED),
    SysclkInfo::new(5, "pll0_sysclk5", SysclkFlags::NONE),
    SysclkInfo::new(6, "pll0_sysclk6", SysclkFlags::ARM_RATE_FIXED),
    SysclkInfo::new(7, "pll0_sysclk7", SysclkFlags::NONE),
];

/// PLL0 observation clock. Registered after PLL1, which it can select.
pub static PLL0_OBSCLK: ObsclkInfo = ObsclkInfo {
    name: "pll0_obsclk",
    parents: &[
        "oscin",
        "pll0_sysclk1",
        "pll0_sysclk2",
        "pll0_sysclk3",
        "pll0_sysclk4",
        "pll0_sysclk5",
        "pll0_sysclk6",
        "pll0_sysclk7",
        "pll1_obsclk",
    ],
    table: &[0x14, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d, 0x1e],
};

/// PLL0 with its AUXCLK and SYSCLKs.
pub static PLL0: PllDescription = PllDescription {
    info: &PLL0_INFO,
    parent: "ref_clk",
    sysclks: &PLL0_SYSCLKS,
    auxclk: Some("oscin"),
    sysclkbp: None,
    obsclk: None,
};

/// PLL1.
pub static PLL1_INFO: PllInfo = PllInfo {
    name: "pll1",
    pllm_mask: 0x1f,
    pllm_min: 4,
    pllm_max: 32,
    pllout_min_rate: 300_000_000,
    pllout_max_rate: 600_000_000,
    flags: PllFlags {
        has_postdiv: true,
        allow_set_rate: true,
        ..PllFlags::NONE
    },
    extclksrc_parent: "",
};

/// PLL1 outputs. SYSCLK1 clocks the DDR controller.
pub static PLL1_SYSCLKS: [SysclkInfo; 3] = [
    SysclkInfo::new(1, "pll1_sysclk1", SysclkFlags::ALWAYS_ENABLED),
    SysclkInfo::new(2, "pll1_sysclk2", SysclkFlags::NONE),
    SysclkInfo::new(3, "pll1_sysclk3", SysclkFlags::NONE),
];

/// PLL1 observation clock.
pub static PLL1_OBSCLK: ObsclkInfo = ObsclkInfo {
    name: "pll1_obsclk",
    parents: &["oscin", "pll1_sysclk1", "pll1_sysclk2", "pll1_sysclk3"],
    table: &[0x14, 0x17, 0x18, 0x19],
};

/// PLL1 with its SYSCLKs and OBSCLK.
pub static PLL1: PllDescription = PllDescription {
    info: &PLL1_INFO,
    parent: "oscin",
    sysclks: &PLL1_SYSCLKS,
    auxclk: None,
    sysclkbp: None,
    obsclk: Some(&PLL1_OBSCLK),
};

/// PSC0 modules.
pub static PSC0: [LpscInfo; 12] = [
    LpscInfo::new(0, 0, "tpcc0", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(1, 0, "tptc0", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(2, 0, "tptc1", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(3, 0, "aemif", "pll0_sysclk3", LpscFlags::NONE),
    LpscInfo::new(4, 0, "spi0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(5, 0, "mmcsd0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(6, 0, "aintc", "pll0_sysclk4", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(7, 0, "arm_rom", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(9, 0, "uart0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(13, 0, "pruss", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(14, 0, "arm", "pll0_sysclk6", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(
        15,
        1,
        "dsp",
        "pll0_sysclk1",
        LpscFlags {
            force: true,
            local_reset: true,
            ..LpscFlags::NONE
        },
    ),
];

/// PSC1 modules.
pub static PSC1: [LpscInfo; 20] = [
    LpscInfo::new(0, 0, "tpcc1", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(1, 0, "usb0", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(2, 0, "usb1", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(3, 0, "gpio", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(5, 0, "emac", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(6, 0, "emif3", "pll0_sysclk5", LpscFlags::ALWAYS_ENABLED),
    LpscInfo::new(7, 0, "mcasp0", "async3", LpscFlags::NONE),
    LpscInfo::new(8, 0, "sata", "pll0_sysclk2", LpscFlags::FORCE),
    LpscInfo::new(9, 0, "vpif", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(10, 0, "spi1", "async3", LpscFlags::NONE),
    LpscInfo::new(11, 0, "i2c1", "pll0_sysclk4", LpscFlags::NONE),
    LpscInfo::new(12, 0, "uart1", "async3", LpscFlags::NONE),
    LpscInfo::new(13, 0, "uart2", "async3", LpscFlags::NONE),
    LpscInfo::new(14, 0, "mcbsp0", "async3", LpscFlags::NONE),
    LpscInfo::new(15, 0, "mcbsp1", "async3", LpscFlags::NONE),
    LpscInfo::new(16, 0, "lcdc", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(17, 0, "ehrpwm", "async3", LpscFlags::NONE),
    LpscInfo::new(18, 0, "mmcsd1", "pll0_sysclk2", LpscFlags::NONE),
    LpscInfo::new(20, 0, "ecap", "async3", LpscFlags::NONE),
    LpscInfo::new(21, 0, "tptc2", "pll0_sysclk2", LpscFlags::ALWAYS_ENABLED),
];

/// Fixed /4.5 tap of PLL0, gated by `div4.5`.
pub const PLL0_DIV4P5: &str = "pll0_div4p5";

/// The `div4.5` gate, the alternate EMIFA clock.
pub static DIV4P5: CfgchipGateInfo = CfgchipGateInfo {
    name: "div4.5",
    parent: PLL0_DIV4P5,
    reg: cfgchip(3),
    bit: 2,
};

/// The eHRPWM time base clock sync gate, behind the PSC1 `ehrpwm` module.
pub static EHRPWM_TBCLK: CfgchipGateInfo = CfgchipGateInfo {
    name: "ehrpwm_tbclk",
    parent: "ehrpwm",
    reg: cfgchip(1),
    bit: 12,
};

/// CFGCHIP muxes, in dependency order.
pub static CFGCHIP_MUXES: [CfgchipMuxInfo; 3] = [
    CfgchipMuxInfo {
        name: "async3",
        parents: ["pll0_sysclk2", "pll1_sysclk2"],
        reg: cfgchip(3),
        bit: 4,
    },
    CfgchipMuxInfo {
        name: "ema_clksrc",
        parents: ["pll0_sysclk3", "div4.5"],
        reg: cfgchip(3),
        bit: 1,
    },
    CfgchipMuxInfo {
        name: "upp_tx_clksrc",
        parents: ["async3", "upp_2xtxclk"],
        reg: cfgchip(3),
        bit: 11,
    },
];

/// Registers both PLLs and all of their outputs.
pub fn register_pll_clocks<'a, R: RegisterAccess + ?Sized + 'a>(
    tree: &mut ClockTree<'a>,
    pll0: &'a R,
    pll1: &'a R,
) -> usize {
    let pll0 = Pll::new(pll0, &PLL0_INFO);
    let mut registered = Registered::default();
    registered.note(PLL0_INFO.name, register_pll_core(tree, &pll0, PLL0.parent));
    // PLL0's bypass may run from pll1_sysclk3 and its OBSCLK may select pll1_obsclk.
    registered.add(register_pll_description(tree, pll1, &PLL1));
    registered.add(register_pll_outputs(tree, &pll0, &PLL0));
    registered.note(PLL0_OBSCLK.name, register_obsclk(tree, &pll0, &PLL0_OBSCLK));
    registered.count()
}

/// Registers `div4.5` and the CFGCHIP muxes. `syscon` must start at CFGCHIP0.
///
/// Needs the PLL clocks; the PSC1 modules behind `async3` need these.
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

/// Register blocks of the DA850 clock hardware.
pub struct Blocks<'a, R: RegisterAccess + ?Sized, S: RegisterAccess + ?Sized> {
    /// PLL0 controller.
    pub pll0: &'a R,
    /// PLL1 controller.
    pub pll1: &'a R,
    /// PSC0.
    pub psc0: &'a R,
    /// PSC1.
    pub psc1: &'a R,
    /// CFGCHIP window of SYSCFG0.
    pub cfgchip: &'a S,
}

/// Registers the whole DA850 tree in dependency order: PLLs, CFGCHIP muxes, PSC modules, then
/// the eHRPWM time base gate.
pub fn register_clocks<'a, R, S>(tree: &mut ClockTree<'a>, blocks: &Blocks<'a, R, S>) -> usize
where
    R: RegisterAccess + ?Sized + 'a,
    S: RegisterAccess + ?Sized + 'a,
{
    let mut registered = Registered::default();
    registered.add(register_pll_clocks(tree, blocks.pll0, blocks.pll1));
    registered.add(register_cfgchip_clocks(tree, blocks.cfgchip));
    registered.add(register_psc_clocks(tree, blocks.psc0, blocks.psc1));
    registered.note(
        EHRPWM_TBCLK.name,
        cfgchip::register_gate(tree, blocks.cfgchip, &EHRPWM_TBCLK),
    );
    registered.count()
}
