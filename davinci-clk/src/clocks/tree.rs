//! The clock registry.

use alloc::{boxed::Box, string::String, vec::Vec};

use embedded_hal::delay::DelayNs;
use fugit::HertzU32;

use super::{ClkFlags, ClkOps, ClockError};

/// Handle to a registered clock.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClkId(usize);

/// Everything needed to register a clock.
pub struct ClkInit<'a> {
    name: String,
    parent_names: Vec<String>,
    flags: ClkFlags,
    ops: Box<dyn ClkOps + 'a>,
}

impl<'a> ClkInit<'a> {
    /// A parentless clock called `name`, driven by `ops`.
    pub fn new(name: impl Into<String>, ops: impl ClkOps + 'a) -> Self {
        Self {
            name: name.into(),
            parent_names: Vec::new(),
            flags: ClkFlags::NONE,
            ops: Box::new(ops),
        }
    }

    /// Appends a parent. Parents are indexed in the order they are added.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent_names.push(name.into());
        self
    }

    /// Appends several parents.
    pub fn parents<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parent_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the registry flags.
    pub fn flags(mut self, flags: ClkFlags) -> Self {
        self.flags = flags;
        self
    }
}

struct Node<'a> {
    name: String,
    parent_names: Vec<String>,
    parent: Option<ClkId>,
    flags: ClkFlags,
    enable_count: u32,
    rate: HertzU32,
    ops: Box<dyn ClkOps + 'a>,
}

/// A set of named clocks and the links between them.
///
/// Parents must be registered before their children. Only the parent a mux currently selects has
/// to exist at registration time; the others are looked up by name when
/// [`ClockTree::set_parent`] switches to them.
///
/// Enabling a clock enables its parent chain first; disabling the last user of a clock disables
/// it and then releases its parent. Rates are cached and refreshed whenever a rate or parent
/// changes through the tree.
#[derive(Default)]
pub struct ClockTree<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> ClockTree<'a> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of registered clocks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no clock is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a clock to the tree.
    ///
    /// Clocks flagged [`ClkFlags::critical`] are enabled right away, together with their
    /// parents, and keep that reference forever.
    pub fn register(&mut self, init: ClkInit<'a>) -> Result<ClkId, ClockError> {
        if self.lookup(&init.name).is_some() {
            return Err(ClockError::DuplicateName);
        }
        let parent = if init.parent_names.is_empty() {
            None
        } else {
            let index = init.ops.get_parent()?;
            let name = init
                .parent_names
                .get(index)
                .ok_or(ClockError::InvalidParentIndex)?;
            Some(self.lookup(name).ok_or(ClockError::MissingParent)?)
        };
        let parent_rate = parent.map_or(HertzU32::from_raw(0), |p| self.node(p).rate);
        let rate = init.ops.recalc_rate(parent_rate);

        let id = ClkId(self.nodes.len());
        self.nodes.push(Node {
            name: init.name,
            parent_names: init.parent_names,
            parent,
            flags: init.flags,
            enable_count: 0,
            rate,
            ops: init.ops,
        });

        if init.flags.critical {
            if let Err(e) = self.enable(id) {
                self.nodes.pop();
                return Err(e);
            }
        }
        log::debug!("{}: registered at {} Hz", self.node(id).name, rate.raw());
        Ok(id)
    }

    /// Finds a clock by name.
    pub fn lookup(&self, name: &str) -> Option<ClkId> {
        self.nodes.iter().position(|n| n.name == name).map(ClkId)
    }

    /// Finds a clock by name, failing with [`ClockError::UnknownClock`].
    pub fn get(&self, name: &str) -> Result<ClkId, ClockError> {
        self.lookup(name).ok_or(ClockError::UnknownClock)
    }

    /// Name of a clock.
    pub fn name(&self, id: ClkId) -> &str {
        &self.node(id).name
    }

    /// Cached rate of a clock.
    pub fn get_rate(&self, id: ClkId) -> HertzU32 {
        self.node(id).rate
    }

    /// Current parent of a clock.
    pub fn get_parent(&self, id: ClkId) -> Option<ClkId> {
        self.node(id).parent
    }

    /// Number of outstanding enables, including the permanent one of critical clocks.
    pub fn enable_count(&self, id: ClkId) -> u32 {
        self.node(id).enable_count
    }

    /// Whether the clock is running. Clocks without a gate of their own report their enable
    /// count.
    pub fn is_enabled(&self, id: ClkId) -> bool {
        let node = self.node(id);
        node.ops.is_enabled().unwrap_or(node.enable_count > 0)
    }

    /// Takes a reference on a clock, ungating it and its parents if needed.
    pub fn enable(&mut self, id: ClkId) -> Result<(), ClockError> {
        if self.node(id).enable_count == 0 {
            let parent = self.node(id).parent;
            if let Some(parent) = parent {
                self.enable(parent)?;
            }
            if let Err(e) = self.node(id).ops.enable() {
                log::warn!("{}: enable failed: {}", self.node(id).name, e);
                if let Some(parent) = parent {
                    // The parent was enabled above; it can be released again.
                    let _ = self.disable(parent);
                }
                return Err(e);
            }
        }
        self.node_mut(id).enable_count += 1;
        Ok(())
    }

    /// Drops a reference on a clock, gating it and releasing its parent when it was the last.
    ///
    /// Dropping the permanent reference of a critical clock is refused silently (with a log
    /// entry): the hardware is left running.
    pub fn disable(&mut self, id: ClkId) -> Result<(), ClockError> {
        let node = self.node(id);
        match node.enable_count {
            0 => return Err(ClockError::NotEnabled),
            1 if node.flags.critical => {
                log::warn!("{}: not disabling critical clock", node.name);
                return Ok(());
            }
            1 => node.ops.disable()?,
            _ => {}
        }
        let node = self.node_mut(id);
        node.enable_count -= 1;
        let release = if node.enable_count == 0 { node.parent } else { None };
        match release {
            Some(parent) => self.disable(parent),
            None => Ok(()),
        }
    }

    /// Switches a mux to the parent called `parent`.
    ///
    /// A running clock keeps running: the new parent is enabled before the switch and the old
    /// one released after it.
    pub fn set_parent(&mut self, id: ClkId, parent: ClkId) -> Result<(), ClockError> {
        let index = {
            let parent_name = &self.node(parent).name;
            self.node(id)
                .parent_names
                .iter()
                .position(|n| n == parent_name)
                .ok_or(ClockError::InvalidParentIndex)?
        };
        let old = self.node(id).parent;
        if old == Some(parent) {
            return Ok(());
        }
        let running = self.node(id).enable_count > 0;
        if running {
            self.enable(parent)?;
        }
        if let Err(e) = self.node(id).ops.set_parent(index) {
            if running {
                if let Err(e) = self.disable(parent) {
                    log::warn!("{}: can't release refused parent: {}", self.node(id).name, e);
                }
            }
            return Err(e);
        }
        self.node_mut(id).parent = Some(parent);
        // The hardware has switched; the tree follows it.
        if running {
            if let Some(old) = old {
                if let Err(e) = self.disable(old) {
                    log::warn!("{}: can't release old parent: {}", self.node(id).name, e);
                }
            }
        }
        self.recalc_subtree(id);
        Ok(())
    }

    /// Rate the clock would run at after [`ClockTree::set_rate`] with `rate`.
    pub fn round_rate(&self, id: ClkId, rate: HertzU32) -> Result<HertzU32, ClockError> {
        let node = self.node(id);
        let parent_rate = self.parent_rate(id);
        match node.ops.round_rate(rate, parent_rate) {
            Err(ClockError::NotSupported) if node.flags.set_rate_parent => {
                let parent = node.parent.ok_or(ClockError::NotSupported)?;
                let wanted = node
                    .ops
                    .parent_rate_for(rate)
                    .ok_or(ClockError::NotSupported)?;
                let parent_rate = self.round_rate(parent, wanted)?;
                Ok(node.ops.recalc_rate(parent_rate))
            }
            other => other,
        }
    }

    /// Changes the rate of a clock and returns the rate it ended up at.
    ///
    /// Clocks that can't change their own rate and are flagged
    /// [`ClkFlags::set_rate_parent`] pass the request up to their parent.
    pub fn set_rate<D: DelayNs>(
        &mut self,
        id: ClkId,
        rate: HertzU32,
        delay: &mut D,
    ) -> Result<HertzU32, ClockError> {
        self.set_rate_dyn(id, rate, delay)
    }

    fn set_rate_dyn(
        &mut self,
        id: ClkId,
        rate: HertzU32,
        delay: &mut dyn DelayNs,
    ) -> Result<HertzU32, ClockError> {
        let parent_rate = self.parent_rate(id);
        let node = self.node(id);
        match node.ops.round_rate(rate, parent_rate) {
            Ok(rounded) => {
                log::debug!("{}: {} Hz -> {} Hz", node.name, node.rate.raw(), rounded.raw());
                node.ops.set_rate(rounded, parent_rate, delay)?;
            }
            Err(ClockError::NotSupported) if node.flags.set_rate_parent => {
                let parent = node.parent.ok_or(ClockError::NotSupported)?;
                let wanted = node
                    .ops
                    .parent_rate_for(rate)
                    .ok_or(ClockError::NotSupported)?;
                self.set_rate_dyn(parent, wanted, delay)?;
            }
            Err(e) => return Err(e),
        }
        self.recalc_subtree(id);
        Ok(self.node(id).rate)
    }

    /// Puts the module behind a clock into local reset.
    pub fn reset_assert(&self, id: ClkId) -> Result<(), ClockError> {
        self.node(id).ops.reset_assert()
    }

    /// Takes the module behind a clock out of local reset.
    pub fn reset_deassert(&self, id: ClkId) -> Result<(), ClockError> {
        self.node(id).ops.reset_deassert()
    }

    /// Re-reads the hardware for a clock and everything below it.
    ///
    /// Muxes that list this clock as a possible parent re-read their selection too, so a PLL
    /// leaving bypass during a reprogram is picked up.
    pub fn recalc_subtree(&mut self, id: ClkId) {
        let parent_rate = self.parent_rate(id);
        let rate = self.node(id).ops.recalc_rate(parent_rate);
        self.node_mut(id).rate = rate;
        let name = self.node(id).name.clone();
        let children: Vec<ClkId> = (0..self.nodes.len())
            .map(ClkId)
            .filter(|&c| c != id && self.node(c).parent_names.contains(&name))
            .collect();
        for child in children {
            let moved = self.sync_parent(child);
            if moved || self.node(child).parent == Some(id) {
                self.recalc_subtree(child);
            }
        }
    }

    /// Points a mux at the parent its hardware selects. Returns whether the parent changed.
    ///
    /// A running mux whose new parent won't enable keeps its old parent.
    fn sync_parent(&mut self, id: ClkId) -> bool {
        let node = self.node(id);
        if node.parent_names.len() < 2 {
            return false;
        }
        let Ok(index) = node.ops.get_parent() else {
            return false;
        };
        let Some(parent) = node.parent_names.get(index).and_then(|n| self.lookup(n)) else {
            return false;
        };
        let old = node.parent;
        if old == Some(parent) {
            return false;
        }
        log::debug!("{}: hardware switched to {}", node.name, self.node(parent).name);
        let running = node.enable_count > 0;
        if running {
            if let Err(e) = self.enable(parent) {
                // Stay on the old parent so its enable count still matches ours.
                log::warn!("{}: can't enable new parent: {}", self.node(id).name, e);
                return false;
            }
        }
        self.node_mut(id).parent = Some(parent);
        if running {
            if let Some(old) = old {
                if let Err(e) = self.disable(old) {
                    log::warn!("{}: can't release old parent: {}", self.node(id).name, e);
                }
            }
        }
        true
    }

    fn parent_rate(&self, id: ClkId) -> HertzU32 {
        self.node(id)
            .parent
            .map_or(HertzU32::from_raw(0), |p| self.node(p).rate)
    }

    fn node(&self, id: ClkId) -> &Node<'a> {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: ClkId) -> &mut Node<'a> {
        &mut self.nodes[id.0]
    }
}
