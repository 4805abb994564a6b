//! Fixed-step time driver.

use crate::core::{error::Result, id::NodeId, world::Core};

/// A per-tick callback. Receives the node and the tick length in seconds.
pub type TickCallback = dyn FnMut(&mut Core, NodeId, f32) -> Result<()>;

/// Handle returned by [`Core::on_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickId(u64);

/// A registered callback.
struct Registration {
    /// Handle.
    id: TickId,
    /// Node the callback belongs to.
    node: NodeId,
    /// The callback. `None` while it runs.
    callback: Option<Box<TickCallback>>,
}

/// Runs tick callbacks at a fixed rate, however time is fed in.
pub(crate) struct TimeDriver {
    /// Seconds per tick.
    tick_time: f32,
    /// Ticks run per call before leftover time is dropped.
    max_ticks: u32,
    /// Time not yet consumed by a tick.
    accumulated: f32,
    /// Next handle.
    next: u64,
    /// Callbacks in registration order.
    callbacks: Vec<Registration>,
}

/// Slack for accumulated float error when comparing against the tick length.
const SLACK: f32 = 1e-6;

impl TimeDriver {
    /// A driver with the given step.
    pub(crate) fn new(tick_time: f32, max_ticks: u32) -> Self {
        Self {
            tick_time,
            max_ticks,
            accumulated: 0.0,
            next: 0,
            callbacks: Vec::new(),
        }
    }

    /// Register a callback.
    pub(crate) fn add(&mut self, node: NodeId, f: Box<TickCallback>) -> TickId {
        let id = TickId(self.next);
        self.next += 1;
        self.callbacks.push(Registration {
            id,
            node,
            callback: Some(f),
        });
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub(crate) fn remove(&mut self, id: TickId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|r| r.id != id);
        before != self.callbacks.len()
    }

    /// Remove every callback belonging to a node.
    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.callbacks.retain(|r| r.node != node);
    }

    /// Feed `dt` seconds in and run whole ticks.
    pub(crate) fn advance(core: &mut Core, dt: f32) -> Result<u32> {
        core.time.accumulated += dt.max(0.0);
        let step = core.time.tick_time;
        let mut ticks = 0;
        while core.time.accumulated + SLACK >= step {
            if ticks == core.time.max_ticks {
                tracing::debug!(dropped = core.time.accumulated, "tick budget exhausted");
                core.time.accumulated = 0.0;
                break;
            }
            core.time.accumulated = (core.time.accumulated - step).max(0.0);
            ticks += 1;
            Self::run(core, step)?;
        }
        Ok(ticks)
    }

    /// Run one tick. Callbacks registered during the tick first run on the
    /// next one; callbacks of inactive nodes are skipped.
    fn run(core: &mut Core, step: f32) -> Result<()> {
        let ids: Vec<TickId> = core.time.callbacks.iter().map(|r| r.id).collect();
        for id in ids {
            let Some(node) = core.time.callbacks.iter().find(|r| r.id == id).map(|r| r.node)
            else {
                continue;
            };
            if !core.is_active(node) {
                continue;
            }
            let Some(mut f) = core
                .time
                .callbacks
                .iter_mut()
                .find(|r| r.id == id)
                .and_then(|r| r.callback.take())
            else {
                continue;
            };
            let out = f(core, node, step);
            if let Some(reg) = core.time.callbacks.iter_mut().find(|r| r.id == id) {
                reg.callback = Some(f);
            }
            out?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::widget::Group;

    #[test]
    fn fixed_steps() -> Result<()> {
        let mut core = Core::new();
        let n = core.create(Group)?;
        core.activate(n)?;
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        core.on_tick(n, move |_, _, _| {
            c.set(c.get() + 1);
            Ok(())
        })?;
        let step = core.config().tick_time;
        assert_eq!(core.tick(step * 0.5)?, 0);
        assert_eq!(core.tick(step * 0.5)?, 1);
        assert_eq!(core.tick(step * 3.0)?, 3);
        assert_eq!(count.get(), 4);
        // Large gaps are capped.
        assert_eq!(core.tick(10.0)?, core.config().max_ticks_per_update);
        assert_eq!(core.tick(0.0)?, 0);
        Ok(())
    }

    #[test]
    fn inactive_and_disposed_skip() -> Result<()> {
        let mut core = Core::new();
        let n = core.create(Group)?;
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let tick = core.on_tick(n, move |_, _, _| {
            c.set(c.get() + 1);
            Ok(())
        })?;
        let step = core.config().tick_time;
        core.tick(step)?;
        assert_eq!(count.get(), 0);
        core.activate(n)?;
        core.tick(step)?;
        assert_eq!(count.get(), 1);
        core.deactivate(n)?;
        core.dispose(n)?;
        assert!(!core.remove_tick(tick));
        Ok(())
    }
}
