//! Dependency-ordered dirty flags.
//!
//! A [`ValidationGraph`] holds one node per flag. Each node names the flags it
//! depends on and carries a validator payload. Invalidating a flag marks it
//! and every transitive dependent dirty; validating resolves dirty nodes in
//! ascending topological order.
//!
//! The graph never calls validators itself. Owners implement [`Validated`]
//! and call [`validate`], which asks the graph for one node at a time. The
//! graph is therefore free to be mutated from inside a validator:
//!
//! - A node invalidating itself while it runs is ignored for the current pass.
//! - A node invalidating an already-resolved node makes that node dirty again.
//!   The next step always picks the lowest dirty node, so it re-runs before
//!   `validate` returns. If the re-invalidated node is a dependency of the
//!   running node, the running node stays dirty and re-runs after it.
//! - The number of steps per call is bounded; exceeding the bound is
//!   [`Error::ValidationOverflow`].
//! - A nested `validate` on a graph that is already validating is a no-op.

use crate::core::{
    error::{Error, Result},
    flags::{self, Flags},
};

/// Step bound used when an owner does not supply one.
pub const DEFAULT_STEP_LIMIT: usize = 1024;

/// One flag in a validation graph.
#[derive(Debug, Clone)]
pub struct ValidationNode<V> {
    /// The bit this node resolves.
    flag: Flags,
    /// Direct dependencies.
    dependencies: Flags,
    /// Registered flags this node depends on, transitively.
    ancestors: Flags,
    /// Registered flags that depend on this node, transitively.
    dependents: Flags,
    /// Topological rank.
    order: usize,
    /// Validator payload.
    validator: V,
}

impl<V> ValidationNode<V> {
    /// The flag this node resolves.
    pub fn flag(&self) -> Flags {
        self.flag
    }

    /// Direct dependencies.
    pub fn dependencies(&self) -> Flags {
        self.dependencies
    }

    /// Transitive dependents.
    pub fn dependents(&self) -> Flags {
        self.dependents
    }

    /// Topological rank. Every dependency has a strictly smaller rank.
    pub fn order(&self) -> usize {
        self.order
    }
}

/// A directed acyclic graph of validation flags.
#[derive(Debug, Clone)]
pub struct ValidationGraph<V> {
    /// Nodes sorted by ascending order. Equal orders keep registration order.
    nodes: Vec<ValidationNode<V>>,
    /// Every registered flag.
    registered: Flags,
    /// Currently dirty flags.
    invalid: Flags,
    /// The flag being resolved, if any.
    current: Option<Flags>,
    /// Set when the running node was re-marked through one of its dependencies.
    redirty: Flags,
}

impl<V> Default for ValidationGraph<V> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            registered: 0,
            invalid: 0,
            current: None,
            redirty: 0,
        }
    }
}

impl<V: Copy> ValidationGraph<V> {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Dependencies on flags that are not registered yet are
    /// allowed and rank as order 0 until they are registered. The new node
    /// starts dirty.
    pub fn add_node(&mut self, flag: Flags, dependencies: Flags, validator: V) -> Result<()> {
        if !flags::is_single(flag) || self.registered & flag != 0 {
            return Err(Error::InvalidFlag(flag));
        }
        if self.closure_of(dependencies) & flag != 0 {
            return Err(Error::CyclicDependency(flag));
        }
        self.nodes.push(ValidationNode {
            flag,
            dependencies,
            ancestors: 0,
            dependents: 0,
            order: 0,
            validator,
        });
        self.registered |= flag;
        self.rebuild();
        self.invalidate(flag);
        Ok(())
    }

    /// Every flag reachable through dependency edges from `deps`, including
    /// `deps` itself.
    fn closure_of(&self, deps: Flags) -> Flags {
        let mut out = deps;
        loop {
            let mut next = out;
            for n in &self.nodes {
                if out & n.flag != 0 {
                    next |= n.dependencies;
                }
            }
            if next == out {
                return out;
            }
            out = next;
        }
    }

    /// Recompute orders, ancestor and dependent sets, and the sort.
    fn rebuild(&mut self) {
        let ancestors: Vec<Flags> = self
            .nodes
            .iter()
            .map(|n| self.closure_of(n.dependencies) & self.registered)
            .collect();
        for (n, a) in self.nodes.iter_mut().zip(ancestors) {
            n.ancestors = a;
        }
        // Ranks settle in at most `nodes.len()` rounds on an acyclic graph.
        for _ in 0..self.nodes.len() {
            let mut changed = false;
            for i in 0..self.nodes.len() {
                let deps = self.nodes[i].dependencies;
                let order = if deps == 0 {
                    0
                } else {
                    1 + self
                        .nodes
                        .iter()
                        .filter(|d| deps & d.flag != 0)
                        .map(|d| d.order)
                        .max()
                        .unwrap_or(0)
                };
                if order != self.nodes[i].order {
                    self.nodes[i].order = order;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        let dependents: Vec<Flags> = self
            .nodes
            .iter()
            .map(|n| {
                self.nodes
                    .iter()
                    .filter(|d| d.ancestors & n.flag != 0)
                    .fold(0, |acc, d| acc | d.flag)
            })
            .collect();
        for (n, d) in self.nodes.iter_mut().zip(dependents) {
            n.dependents = d;
        }
        self.nodes.sort_by_key(|n| n.order);
    }

    /// Registered nodes in resolution order.
    pub fn nodes(&self) -> &[ValidationNode<V>] {
        &self.nodes
    }

    /// Every registered flag.
    pub fn registered(&self) -> Flags {
        self.registered
    }

    /// Transitive dependents of every flag in `mask`.
    pub fn dependents_of(&self, mask: Flags) -> Flags {
        self.nodes
            .iter()
            .filter(|n| mask & n.flag != 0)
            .fold(0, |acc, n| acc | n.dependents)
    }

    /// Transitive dependencies of every flag in `mask`.
    pub fn dependencies_of(&self, mask: Flags) -> Flags {
        self.nodes
            .iter()
            .filter(|n| mask & n.flag != 0)
            .fold(0, |acc, n| acc | n.ancestors)
    }

    /// Mark `flags` and their transitive dependents dirty. Returns the flags
    /// that went from clean to dirty.
    pub fn invalidate(&mut self, flags: Flags) -> Flags {
        let requested = flags & self.registered;
        if requested == 0 {
            return 0;
        }
        let mark = requested | self.dependents_of(requested);
        let changed = mark & !self.invalid;
        self.invalid |= mark;
        if let Some(current) = self.current {
            let others = requested & !current;
            if others != 0 && self.dependents_of(others) & current != 0 {
                self.redirty |= current;
            }
        }
        changed
    }

    /// Currently dirty flags.
    pub fn invalid_flags(&self) -> Flags {
        self.invalid
    }

    /// True if none of `flags` is dirty.
    pub fn is_valid(&self, flags: Flags) -> bool {
        self.invalid & flags == 0
    }

    /// The flag being resolved, if a validation is in progress.
    pub fn current_flag(&self) -> Option<Flags> {
        self.current
    }

    /// True while a validator is running.
    pub fn is_validating(&self) -> bool {
        self.current.is_some()
    }

    /// Start resolving the next dirty node among `flags` and their
    /// dependencies. Returns `None` when nothing is left, or when a
    /// validation is already in progress.
    pub fn begin_next(&mut self, flags: Flags) -> Option<(Flags, V)> {
        if self.current.is_some() {
            return None;
        }
        let wanted = (flags | self.dependencies_of(flags)) & self.invalid;
        if wanted == 0 {
            return None;
        }
        let node = self.nodes.iter().find(|n| wanted & n.flag != 0)?;
        self.current = Some(node.flag);
        self.redirty = 0;
        Some((node.flag, node.validator))
    }

    /// Finish resolving `flag`. The flag is cleared unless one of its
    /// dependencies was invalidated while it ran.
    pub fn finish(&mut self, flag: Flags) {
        if self.redirty & flag == 0 {
            self.invalid &= !flag;
        }
        self.redirty = 0;
        self.current = None;
    }

    /// Abandon the running node, leaving it dirty.
    pub fn abort(&mut self) {
        self.redirty = 0;
        self.current = None;
    }
}

/// Types that own a validation graph and can run its validators.
pub trait Validated {
    /// Validator payload stored in the graph.
    type Validator: Copy;

    /// The graph, or `None` if the owner is gone. Validation of a missing
    /// graph is a no-op.
    fn graph(&mut self) -> Option<&mut ValidationGraph<Self::Validator>>;

    /// Run one validator.
    fn run(&mut self, flag: Flags, validator: Self::Validator) -> Result<()>;

    /// Maximum validator invocations per `validate` call.
    fn step_limit(&self) -> usize {
        DEFAULT_STEP_LIMIT
    }
}

/// Resolve every dirty flag in `flags` (and its dependencies) on `target`.
pub fn validate<T: Validated + ?Sized>(target: &mut T, flags: Flags) -> Result<()> {
    let limit = target.step_limit();
    let mut steps = 0;
    loop {
        let Some(graph) = target.graph() else {
            return Ok(());
        };
        let Some((flag, validator)) = graph.begin_next(flags) else {
            return Ok(());
        };
        if steps >= limit {
            graph.abort();
            return Err(Error::ValidationOverflow(flags));
        }
        steps += 1;
        tracing::trace!(flag = %flags::describe(flag), "validate");
        let mut guard = scopeguard::guard(&mut *target, |t| {
            if let Some(g) = t.graph() {
                g.abort();
            }
        });
        guard.run(flag, validator)?;
        let t = scopeguard::ScopeGuard::into_inner(guard);
        if let Some(g) = t.graph() {
            g.finish(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::core::flags::*;

    /// Validator signature used by the test harness.
    type Step = fn(&mut Harness, Flags) -> Result<()>;

    /// A graph plus a log of validator calls.
    struct Harness {
        /// The graph under test.
        graph: ValidationGraph<Step>,
        /// Flags in the order their validators ran.
        log: Vec<Flags>,
        /// Flags each validator invalidates when it runs, keyed by validator flag.
        side_effects: Vec<(Flags, Flags)>,
    }

    impl Validated for Harness {
        type Validator = Step;

        fn graph(&mut self) -> Option<&mut ValidationGraph<Step>> {
            Some(&mut self.graph)
        }

        fn run(&mut self, flag: Flags, validator: Step) -> Result<()> {
            validator(self, flag)
        }

        fn step_limit(&self) -> usize {
            64
        }
    }

    fn record(h: &mut Harness, flag: Flags) -> Result<()> {
        h.log.push(flag);
        let effects: Vec<Flags> = h
            .side_effects
            .iter()
            .filter(|(f, _)| *f == flag)
            .map(|(_, e)| *e)
            .collect();
        for e in effects {
            h.graph.invalidate(e);
        }
        Ok(())
    }

    fn fail(_h: &mut Harness, _flag: Flags) -> Result<()> {
        Err(Error::Invalid("boom".into()))
    }

    fn standard() -> Result<Harness> {
        let mut graph = ValidationGraph::new();
        for (flag, deps) in STANDARD {
            graph.add_node(flag, deps, record as Step)?;
        }
        Ok(Harness {
            graph,
            log: Vec::new(),
            side_effects: Vec::new(),
        })
    }

    #[test]
    fn orders_follow_dependencies() -> Result<()> {
        let h = standard()?;
        for n in h.graph.nodes() {
            for d in h.graph.nodes() {
                if n.dependencies() & d.flag() != 0 {
                    assert!(d.order() < n.order());
                }
            }
        }
        let layout = h.graph.nodes().iter().find(|n| n.flag() == LAYOUT);
        assert_eq!(layout.map(|n| n.order()), Some(2));
        Ok(())
    }

    #[test]
    fn invalidate_propagates() -> Result<()> {
        let mut h = standard()?;
        validate(&mut h, ALL)?;
        let changed = h.graph.invalidate(SIZE_CONSTRAINTS);
        assert_eq!(changed, SIZE_CONSTRAINTS | LAYOUT);
        assert_eq!(h.graph.invalidate(SIZE_CONSTRAINTS), 0);
        assert_eq!(h.graph.invalidate(STYLES), STYLES);
        Ok(())
    }

    #[test]
    fn validate_in_order() -> Result<()> {
        let mut h = standard()?;
        validate(&mut h, ALL)?;
        h.log.clear();
        h.graph.invalidate(STYLES | TRANSFORM);
        validate(&mut h, ALL)?;
        assert_eq!(
            h.log,
            vec![STYLES, TRANSFORM, SIZE_CONSTRAINTS, CONCATENATED_TRANSFORM, LAYOUT]
        );
        Ok(())
    }

    #[test]
    fn requested_flag_pulls_dependencies() -> Result<()> {
        let mut h = standard()?;
        validate(&mut h, ALL)?;
        h.log.clear();
        h.graph.invalidate(STYLES | TRANSFORM);
        validate(&mut h, LAYOUT)?;
        assert_eq!(h.log, vec![STYLES, SIZE_CONSTRAINTS, LAYOUT]);
        assert!(!h.graph.is_valid(TRANSFORM));
        Ok(())
    }

    #[test]
    fn self_invalidation_is_ignored() -> Result<()> {
        let mut h = standard()?;
        h.side_effects.push((LAYOUT, LAYOUT));
        validate(&mut h, ALL)?;
        assert!(h.graph.is_valid(ALL));
        assert_eq!(h.log.iter().filter(|f| **f == LAYOUT).count(), 1);
        Ok(())
    }

    #[test]
    fn earlier_flag_reruns() -> Result<()> {
        let mut h = standard()?;
        validate(&mut h, ALL)?;
        h.log.clear();
        // Each pass of CONCATENATED_TRANSFORM dirties STYLES once.
        h.side_effects.push((CONCATENATED_TRANSFORM, STYLES));
        h.graph.invalidate(TRANSFORM);
        validate(&mut h, TRANSFORM | CONCATENATED_TRANSFORM | STYLES)?;
        assert_eq!(h.log, vec![TRANSFORM, CONCATENATED_TRANSFORM, STYLES]);
        assert!(h.graph.is_valid(STYLES));
        Ok(())
    }

    #[test]
    fn dependency_reinvalidation_reruns_dependent() -> Result<()> {
        let mut h = standard()?;
        validate(&mut h, ALL)?;
        h.log.clear();
        h.side_effects.push((LAYOUT, SIZE_CONSTRAINTS));
        h.graph.invalidate(LAYOUT);
        // LAYOUT dirties its own dependency on every run and never settles.
        assert_eq!(
            validate(&mut h, LAYOUT),
            Err(Error::ValidationOverflow(LAYOUT))
        );
        assert!(!h.graph.is_validating());
        assert_eq!(h.log[..4], [LAYOUT, SIZE_CONSTRAINTS, LAYOUT, SIZE_CONSTRAINTS]);
        Ok(())
    }

    #[test]
    fn failing_validator_stays_dirty() -> Result<()> {
        let mut h = standard()?;
        h.graph = ValidationGraph::new();
        h.graph.add_node(STYLES, 0, fail as Step)?;
        assert!(validate(&mut h, ALL).is_err());
        assert!(!h.graph.is_validating());
        assert!(!h.graph.is_valid(STYLES));
        Ok(())
    }

    #[test]
    fn registration_errors() -> Result<()> {
        let mut g: ValidationGraph<()> = ValidationGraph::new();
        assert_eq!(g.add_node(3, 0, ()), Err(Error::InvalidFlag(3)));
        g.add_node(1, 2, ())?;
        assert_eq!(g.add_node(1, 0, ()), Err(Error::InvalidFlag(1)));
        // 2 would depend on 1 which already depends on 2.
        assert_eq!(g.add_node(2, 1, ()), Err(Error::CyclicDependency(2)));
        assert_eq!(g.add_node(4, 4, ()), Err(Error::CyclicDependency(4)));
        Ok(())
    }

    #[test]
    fn forward_dependency_reorders() -> Result<()> {
        let mut g: ValidationGraph<()> = ValidationGraph::new();
        g.add_node(1, 2, ())?;
        g.add_node(4, 0, ())?;
        g.add_node(2, 4, ())?;
        let order: Vec<Flags> = g.nodes().iter().map(|n| n.flag()).collect();
        assert_eq!(order, vec![4, 2, 1]);
        assert_eq!(g.dependents_of(4), 3);
        Ok(())
    }

    proptest! {
        #[test]
        fn validate_is_idempotent(mask in any::<u32>()) {
            let mut h = standard().map_err(|e| TestCaseError::fail(e.to_string()))?;
            h.graph.invalidate(mask);
            validate(&mut h, mask).map_err(|e| TestCaseError::fail(e.to_string()))?;
            h.log.clear();
            validate(&mut h, mask).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(h.log.is_empty());
        }

        #[test]
        fn dependencies_clean_before_run(mask in any::<u32>()) {
            let mut h = standard().map_err(|e| TestCaseError::fail(e.to_string()))?;
            validate(&mut h, ALL).map_err(|e| TestCaseError::fail(e.to_string()))?;
            h.log.clear();
            h.graph.invalidate(mask);
            validate(&mut h, ALL).map_err(|e| TestCaseError::fail(e.to_string()))?;
            for (i, flag) in h.log.iter().enumerate() {
                for (dep_flag, deps) in STANDARD {
                    if dep_flag == *flag && deps != 0 {
                        // A dirtied dependency must have run earlier in the log.
                        if h.log.contains(&deps) {
                            let pos = h.log.iter().position(|f| *f == deps);
                            prop_assert!(pos.is_some_and(|p| p < i));
                        }
                    }
                }
            }
        }
    }
}
