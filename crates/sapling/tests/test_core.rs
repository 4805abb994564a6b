//! Integration tests for the arena: invalidation flow, hierarchy and
//! disposal.

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use sapling::{
        Core, NodeId, NodeOptions, Widget,
        error::{Error, Result},
        flags::{HIERARCHY_ASCENDING, LAYOUT, SIZE_CONSTRAINTS, STYLES},
        layout::{HorizontalLayout, LayoutContainer, LayoutData, VerticalLayout},
        testing::{Block, Probe, ProbeLog, init_tracing},
        widget::Group,
    };

    /// Reaches back into its own node while styling.
    struct Reentrant;

    impl Widget for Reentrant {
        fn update_styles(&mut self, core: &mut Core, id: NodeId) -> Result<()> {
            core.with_widget(id, |_: &mut Self, _| Ok(()))
        }
    }

    /// Take the recorded hook calls.
    fn drain(log: &ProbeLog) -> Vec<(NodeId, &'static str)> {
        log.borrow_mut().drain(..).collect()
    }

    #[test]
    fn cascade_and_validate_in_order() -> Result<()> {
        init_tracing();
        let mut core = Core::new();
        let log = ProbeLog::default();
        let root = core.create_container(Probe::new(&log))?;
        let a = core.create(Probe::new(&log))?;
        core.add_child_last(root, a)?;
        core.update(root)?;
        drain(&log);

        core.invalidate(root, STYLES)?;
        assert!(!core.is_valid(a, STYLES | LAYOUT));
        core.update(root)?;
        let (r, a) = (root.id(), a.id());
        assert_eq!(
            drain(&log),
            [
                (r, "styles"),
                (r, "size_constraints"),
                (r, "layout"),
                (a, "styles"),
                (a, "size_constraints"),
                (a, "layout"),
            ]
        );

        // Nothing is dirty, so nothing runs.
        core.update(root)?;
        assert!(drain(&log).is_empty());

        // A child layout change re-measures the parent, but is not pushed down.
        core.invalidate(a, LAYOUT)?;
        core.update(root)?;
        assert_eq!(
            drain(&log),
            [(r, "size_constraints"), (r, "layout"), (a, "layout")]
        );
        Ok(())
    }

    #[test]
    fn bubbling_and_deferred_invalidation() -> Result<()> {
        let mut core = Core::new();
        let root = core.create_container(Group)?;
        let a = core.create(Group)?;
        core.add_child_last(root, a)?;
        core.update(root)?;

        core.invalidate(a, HIERARCHY_ASCENDING)?;
        assert!(!core.is_valid(root, HIERARCHY_ASCENDING | SIZE_CONSTRAINTS));
        core.update(root)?;

        let inv = core.invalidator(a);
        inv.invalidate(STYLES);
        assert!(core.is_valid(a, STYLES));
        core.flush_invalidations()?;
        assert!(!core.is_valid(a, STYLES));
        Ok(())
    }

    #[test]
    fn invalidation_listeners_see_changed_flags() -> Result<()> {
        let mut core = Core::new();
        let a = core.create(Group)?;
        core.update(a)?;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        core.on_invalidated(a, move |_, _, flags| s.borrow_mut().push(flags))?;
        core.invalidate(a, SIZE_CONSTRAINTS)?;
        // Already dirty: no change, no notification.
        core.invalidate(a, LAYOUT)?;
        assert_eq!(*seen.borrow(), [SIZE_CONSTRAINTS | LAYOUT]);
        Ok(())
    }

    #[test]
    fn nested_layouts_remeasure() -> Result<()> {
        let mut core = Core::new();
        let outer = LayoutContainer::create(&mut core, VerticalLayout::default())?;
        let inner = LayoutContainer::create(&mut core, HorizontalLayout::default())?;
        let a = core.create(Block::new(10.0, 20.0))?;
        let b = core.create(Block::new(30.0, 10.0))?;
        let c = core.create(Block::new(50.0, 5.0))?;
        core.add_child_last(inner, a)?;
        core.add_child_last(inner, b)?;
        core.add_child_last(outer, inner)?;
        core.add_child_last(outer, c)?;

        assert_eq!(core.width(outer)?, 50.0);
        assert_eq!(core.height(outer)?, 30.0);
        assert_eq!(core.position(c)?.y, 25.0);

        core.set_layout_data(b, Some(LayoutData::new().with_width(60.0)))?;
        assert_eq!(core.width(inner)?, 75.0);
        assert_eq!(core.width(outer)?, 75.0);
        Ok(())
    }

    #[test]
    fn nan_size_changes_nothing() -> Result<()> {
        let mut core = Core::new();
        let n = core.create(Group)?;
        core.set_size(n, Some(10.0), Some(20.0))?;
        assert_eq!(
            core.set_size(n, Some(30.0), Some(f32::NAN)),
            Err(Error::NanSize(n.id()))
        );
        assert_eq!(core.explicit_width(n)?, Some(10.0));
        assert_eq!(core.explicit_height(n)?, Some(20.0));
        Ok(())
    }

    #[test]
    fn hierarchy_rules() -> Result<()> {
        let mut core = Core::new();
        let p = core.create_container(Group)?;
        let q = core.create_container(Group)?;
        let leaf = core.create(Group)?;
        let a = core.create(Group)?;
        let b = core.create(Group)?;

        core.add_child_last(p, a)?;
        core.add_child(p, 0, b)?;
        assert_eq!(core.children(p)?, [b.id(), a.id()]);
        assert_eq!(core.parent(a)?, Some(p.id()));

        assert_eq!(core.add_child_last(q, a), Err(Error::AlreadyParented(a.id())));
        assert_eq!(core.add_child_last(leaf, a), Err(Error::NotAContainer(leaf.id())));
        core.add_child_last(p, q)?;
        assert_eq!(
            core.add_child_last(q, p),
            Err(Error::WouldCreateCycle {
                parent: q.id(),
                child: p.id()
            })
        );
        assert!(matches!(
            core.add_child(p, 9, leaf),
            Err(Error::IndexOutOfBounds { index: 9, .. })
        ));

        // Moving within the same parent reorders.
        core.add_child_last(p, b)?;
        assert_eq!(core.children(p)?, [a.id(), q.id(), b.id()]);

        assert!(core.remove_child(p, a)?);
        assert!(!core.remove_child(p, a)?);
        assert_eq!(core.parent(a)?, None);
        Ok(())
    }

    #[test]
    fn dispose_rules() -> Result<()> {
        let mut core = Core::new();
        let log = ProbeLog::default();
        let p = core.create_container(Group)?;
        let child = core.create(Probe::new(&log))?;
        core.add_child_last(p, child)?;

        assert_eq!(core.dispose(child), Err(Error::StillAttached(child.id())));
        core.dispose(p)?;
        // Children are detached, not disposed.
        assert!(core.contains(child));
        assert_eq!(core.parent(child)?, None);
        assert!(core.width(p).is_err());

        core.dispose(child)?;
        assert_eq!(drain(&log).last(), Some(&(child.id(), "disposed")));
        assert_eq!(core.dispose(child), Err(Error::AlreadyDisposed(child.id())));
        assert!(core.is_empty());

        let owner = core.create_container(Group)?;
        let kid = core.create(Group)?;
        core.add_child_last(owner, kid)?;
        let owned = core.create_with(Group, NodeOptions::default().owned_by(owner))?;
        assert!(core.owns(owner, owned));

        // An owned node parented elsewhere blocks disposal without side effects.
        let elsewhere = core.create_container(Group)?;
        core.add_child_last(elsewhere, owned)?;
        assert_eq!(core.dispose(owner), Err(Error::StillAttached(owned.id())));
        assert_eq!(core.parent(kid)?, Some(owner.id()));
        assert_eq!(core.parent(owned)?, Some(elsewhere.id()));

        core.remove_child(elsewhere, owned)?;
        core.dispose(owner)?;
        assert!(!core.contains(owned));
        assert_eq!(core.parent(kid)?, None);
        Ok(())
    }

    #[test]
    fn reentrant_widget_access_fails() -> Result<()> {
        let mut core = Core::new();
        let n = core.create(Reentrant)?;
        assert_eq!(
            core.validate(n, STYLES),
            Err(Error::ReentrantWidgetBorrow(n.id()))
        );
        // The widget is restored and the flag stays dirty.
        assert!(!core.is_valid(n, STYLES));
        assert!(core.with_widget(n, |_: &mut Reentrant, _| Ok(())).is_ok());
        Ok(())
    }
}
