//! Virtualized lists.
//!
//! A [`VirtualList`] shows a window onto a long list of items, creating
//! renderers only for the items that fit in its explicit size (plus a
//! buffer). Renderers are pooled by index, so scrolling by a few rows
//! rebinds most renderers to the same items they showed before.
//!
//! The window is anchored with [`VirtualList::set_index_position`], a
//! fractional item index shown at the top edge, or
//! [`VirtualList::set_bottom_index_position`], shown at the bottom edge.
//! Setting one clears the other.

/// Single-renderer placement algorithms.
mod layout;
/// Lists that announce their changes.
mod observable;
/// Index-keyed renderer pooling.
mod pool;
/// Renderer traits and default renderers.
mod renderer;
/// Selected items.
mod selection;

use std::{cell::RefCell, mem, rc::Rc};

pub use layout::{VirtualLayoutAlgorithm, VirtualVerticalLayout, VirtualVerticalLayoutStyle};
pub use observable::{IndexListener, ObservableList, ResetListener};
pub use pool::IndexedPool;
pub use renderer::{ItemRenderer, ItemRow, ListRenderer, NullRow};
pub use selection::Selection;

use crate::{
    core::{
        flags::{LAYOUT, SIZE_CONSTRAINTS},
        id::{NodeId, TypedId},
        signal::ListenerId,
        world::{Core, NodeOptions},
    },
    error::{Error, Result},
    geom::Bounds,
    layout::{ChildElements, clamp},
    widget::Widget,
};

/// Consecutive renderers that do not take part in layout before a walk
/// gives up.
const MAX_SKIPPED: usize = 5;

/// Creates renderer widgets.
type Factory<T> = Box<dyn FnMut() -> T>;

/// Shared observable data.
pub type SharedList<E> = Rc<RefCell<ObservableList<Option<E>>>>;

/// Where the list's items come from.
enum Source<E> {
    /// A plain list, replaced wholesale.
    Items(Vec<Option<E>>),
    /// An observable list, watched for changes.
    Observed {
        /// The list.
        list: SharedList<E>,
        /// Listeners on `added`, `removed`, `changed` and `reset`.
        listeners: [ListenerId; 4],
    },
}

impl<E: Clone> Source<E> {
    /// Number of items.
    fn len(&self) -> Result<usize> {
        self.with_items(<[_]>::len)
    }

    /// The item at `index`. `None` for a missing item or an index out of
    /// range.
    fn get(&self, index: usize) -> Result<Option<E>> {
        self.with_items(|items| items.get(index).cloned().flatten())
    }

    /// Run `f` over the items.
    fn with_items<T>(&self, f: impl FnOnce(&[Option<E>]) -> T) -> Result<T> {
        match self {
            Self::Items(items) => Ok(f(items)),
            Self::Observed { list, .. } => {
                let list = list
                    .try_borrow()
                    .map_err(|_| Error::Invalid("observable list is being modified".into()))?;
                Ok(f(list.as_slice()))
            }
        }
    }

    /// Stop watching an observable list.
    fn unwatch(&self) {
        if let Self::Observed { list, listeners } = self
            && let Ok(mut list) = list.try_borrow_mut()
        {
            let [added, removed, changed, reset] = *listeners;
            list.added.disconnect(added);
            list.removed.disconnect(removed);
            list.changed.disconnect(changed);
            list.reset.disconnect(reset);
        }
    }
}

/// A list widget that materializes renderers only for visible items.
///
/// Items are `Option<E>`: present items are shown by item renderers of type
/// `R`, missing items by null renderers of type `N`. Renderers are child
/// nodes owned by the list and are disposed with it.
///
/// The list does not clip or scroll. Renderers within the buffer around the
/// explicit size stay attached, positioned outside the visible area.
pub struct VirtualList<E, R = ItemRow<E>, N = NullRow, L = VirtualVerticalLayout> {
    /// Placement algorithm.
    layout: L,
    /// Items.
    source: Source<E>,
    /// Fractional index anchored at the leading edge.
    index_position: Option<f32>,
    /// Fractional index anchored at the trailing edge.
    bottom_index_position: Option<f32>,
    /// Cap on renderers obtained in one pass.
    max_items: usize,
    /// Out-of-bounds allowance, as a fraction of the explicit size.
    buffer: f32,
    /// Item renderers.
    items: IndexedPool<NodeId>,
    /// Null renderers.
    nulls: IndexedPool<NodeId>,
    /// Makes item renderers.
    item_factory: Factory<R>,
    /// Makes null renderers.
    null_factory: Factory<N>,
    /// Shown instead of renderers while the list is empty.
    empty_renderer: Option<NodeId>,
    /// Item renderers obtained in the last pass, by index.
    active_items: Vec<(usize, NodeId)>,
    /// Null renderers obtained in the last pass, by index.
    active_nulls: Vec<(usize, NodeId)>,
    /// Renderers laid out within bounds in the last pass, by index.
    laid_out: Vec<(usize, NodeId)>,
    /// Explicit size of the last pass.
    explicit: (Option<f32>, Option<f32>),
    /// Selected items.
    selection: Selection<E>,
}

impl<E, R, N, L> VirtualList<E, R, N, L>
where
    E: Clone + PartialEq + 'static,
    R: ItemRenderer<E>,
    N: ListRenderer + Default,
    L: VirtualLayoutAlgorithm + 'static,
{
    /// Create a list node. Limits and pool capacity come from the core's
    /// configuration.
    pub fn create(
        core: &mut Core,
        layout: L,
        item_factory: impl FnMut() -> R + 'static,
    ) -> Result<TypedId<Self>> {
        let config = core.config();
        let list = Self {
            layout,
            source: Source::Items(Vec::new()),
            index_position: None,
            bottom_index_position: None,
            max_items: config.virtual_list_max_items,
            buffer: config.virtual_list_buffer,
            items: IndexedPool::new(config.renderer_pool_capacity),
            nulls: IndexedPool::new(config.renderer_pool_capacity),
            item_factory: Box::new(item_factory),
            null_factory: Box::new(N::default),
            empty_renderer: None,
            active_items: Vec::new(),
            active_nulls: Vec::new(),
            laid_out: Vec::new(),
            explicit: (None, None),
            selection: Selection::default(),
        };
        core.create_with(list, NodeOptions::container())
    }

    /// Mutate the list widget, invalidating layout if `f` reports a change.
    fn change(core: &mut Core, id: TypedId<Self>, f: impl FnOnce(&mut Self) -> bool) -> Result<()> {
        if core.with_widget(id, |w: &mut Self, _| Ok(f(w)))? {
            core.invalidate(id, LAYOUT)?;
        }
        Ok(())
    }

    /// Read from the list widget after validating its layout.
    fn read<T>(
        core: &mut Core,
        id: TypedId<Self>,
        f: impl FnOnce(&Self, &mut Core) -> Result<T>,
    ) -> Result<T> {
        core.validate(id, LAYOUT)?;
        core.with_widget(id, |w: &mut Self, core| f(w, core))
    }

    /// Show a plain list of items. Selected items no longer present are
    /// deselected.
    pub fn set_data(core: &mut Core, id: TypedId<Self>, data: Vec<Option<E>>) -> Result<()> {
        Self::change(core, id, |w| {
            w.source.unwatch();
            w.selection.deselect_not_containing(&data);
            w.source = Source::Items(data);
            true
        })
    }

    /// Show an observable list, re-laying out whenever it changes. Selected
    /// items no longer present are deselected.
    pub fn set_observable_data(
        core: &mut Core,
        id: TypedId<Self>,
        list: SharedList<E>,
    ) -> Result<()> {
        let inv = core.invalidator(id);
        core.with_widget(id, |w: &mut Self, _| {
            if let Source::Observed { list: current, .. } = &w.source
                && Rc::ptr_eq(current, &list)
            {
                return Ok(());
            }
            let listeners = {
                let mut l = list
                    .try_borrow_mut()
                    .map_err(|_| Error::Invalid("observable list is being modified".into()))?;
                w.selection.deselect_not_containing(l.as_slice());
                let (a, r, c, x) = (inv.clone(), inv.clone(), inv.clone(), inv);
                [
                    l.added.connect(Rc::new(move |_: usize| a.invalidate(LAYOUT))),
                    l.removed.connect(Rc::new(move |_: usize| r.invalidate(LAYOUT))),
                    l.changed.connect(Rc::new(move |_: usize| c.invalidate(LAYOUT))),
                    l.reset.connect(Rc::new(move || x.invalidate(LAYOUT))),
                ]
            };
            w.source.unwatch();
            w.source = Source::Observed { list, listeners };
            Ok(())
        })?;
        core.invalidate(id, LAYOUT)?;
        Ok(())
    }

    /// A copy of the items.
    pub fn data(core: &mut Core, id: TypedId<Self>) -> Result<Vec<Option<E>>> {
        core.with_widget(id, |w: &mut Self, _| w.source.with_items(<[_]>::to_vec))
    }

    /// Anchor the item at `position` to the leading edge, clearing any
    /// bottom anchor.
    pub fn set_index_position(
        core: &mut Core,
        id: TypedId<Self>,
        position: Option<f32>,
    ) -> Result<()> {
        Self::change(core, id, |w| {
            if w.index_position == position {
                return false;
            }
            w.index_position = position;
            w.bottom_index_position = None;
            true
        })
    }

    /// Anchor the item at `position` to the trailing edge, clearing any
    /// leading anchor.
    pub fn set_bottom_index_position(
        core: &mut Core,
        id: TypedId<Self>,
        position: Option<f32>,
    ) -> Result<()> {
        Self::change(core, id, |w| {
            if w.bottom_index_position == position {
                return false;
            }
            w.bottom_index_position = position;
            w.index_position = None;
            true
        })
    }

    /// The leading anchor, if set.
    pub fn index_position(core: &mut Core, id: TypedId<Self>) -> Result<Option<f32>> {
        core.with_widget(id, |w: &mut Self, _| Ok(w.index_position))
    }

    /// The trailing anchor, if set.
    pub fn bottom_index_position(core: &mut Core, id: TypedId<Self>) -> Result<Option<f32>> {
        core.with_widget(id, |w: &mut Self, _| Ok(w.bottom_index_position))
    }

    /// Cap the number of renderers obtained per pass.
    pub fn set_max_items(core: &mut Core, id: TypedId<Self>, max_items: usize) -> Result<()> {
        Self::change(core, id, |w| {
            let changed = w.max_items != max_items;
            w.max_items = max_items;
            changed
        })
    }

    /// Set the out-of-bounds allowance, as a fraction of the explicit size.
    pub fn set_buffer(core: &mut Core, id: TypedId<Self>, buffer: f32) -> Result<()> {
        Self::change(core, id, |w| {
            let changed = w.buffer != buffer;
            w.buffer = buffer;
            changed
        })
    }

    /// Replace the item renderer factory. Existing item renderers are
    /// disposed.
    pub fn set_renderer_factory(
        core: &mut Core,
        id: TypedId<Self>,
        factory: impl FnMut() -> R + 'static,
    ) -> Result<()> {
        let old = core.with_widget(id, |w: &mut Self, _| {
            w.item_factory = Box::new(factory);
            Ok(w.items.clear())
        })?;
        Self::dispose_renderers(core, id.id(), old)?;
        core.invalidate(id, LAYOUT)?;
        Ok(())
    }

    /// Replace the null renderer factory. Existing null renderers are
    /// disposed.
    pub fn set_null_renderer_factory(
        core: &mut Core,
        id: TypedId<Self>,
        factory: impl FnMut() -> N + 'static,
    ) -> Result<()> {
        let old = core.with_widget(id, |w: &mut Self, _| {
            w.null_factory = Box::new(factory);
            Ok(w.nulls.clear())
        })?;
        Self::dispose_renderers(core, id.id(), old)?;
        core.invalidate(id, LAYOUT)?;
        Ok(())
    }

    /// Set the node shown while the list is empty. The previous one is
    /// disposed. The node becomes a hidden child of the list.
    pub fn set_empty_renderer(
        core: &mut Core,
        id: TypedId<Self>,
        renderer: Option<NodeId>,
    ) -> Result<()> {
        let old = core.with_widget(id, |w: &mut Self, _| {
            Ok(mem::replace(&mut w.empty_renderer, renderer))
        })?;
        if let Some(old) = old
            && Some(old) != renderer
        {
            Self::dispose_renderers(core, id.id(), vec![old])?;
        }
        if let Some(r) = renderer {
            core.set_visible(r, false)?;
            if core.parent(r)? != Some(id.id()) {
                core.add_child_last(id, r)?;
            }
        }
        core.invalidate(id, LAYOUT)?;
        Ok(())
    }

    /// Detach and dispose renderers that still exist.
    fn dispose_renderers(core: &mut Core, id: NodeId, renderers: Vec<NodeId>) -> Result<()> {
        for r in renderers {
            if !core.contains(r) {
                continue;
            }
            core.remove_child(id, r)?;
            core.dispose(r)?;
        }
        Ok(())
    }

    /// Every renderer obtained by the last layout, item and null, by index.
    /// This includes renderers laid out in the buffer beyond the explicit
    /// size.
    pub fn active_renderers(core: &mut Core, id: TypedId<Self>) -> Result<Vec<(usize, NodeId)>> {
        Self::read(core, id, |w, _| {
            let mut all: Vec<_> = w
                .active_items
                .iter()
                .chain(&w.active_nulls)
                .copied()
                .collect();
            all.sort_by_key(|(i, _)| *i);
            Ok(all)
        })
    }

    /// Active item renderers, by index.
    pub fn active_item_renderers(
        core: &mut Core,
        id: TypedId<Self>,
    ) -> Result<Vec<(usize, NodeId)>> {
        Self::read(core, id, |w, _| Ok(w.active_items.clone()))
    }

    /// Active null renderers, by index.
    pub fn active_null_renderers(
        core: &mut Core,
        id: TypedId<Self>,
    ) -> Result<Vec<(usize, NodeId)>> {
        Self::read(core, id, |w, _| Ok(w.active_nulls.clone()))
    }

    /// The fractional index of the first visible item. An item half
    /// scrolled past the leading edge at index 3 gives 3.5.
    pub fn visible_position(core: &mut Core, id: TypedId<Self>) -> Result<f32> {
        Self::read(core, id, |w, core| {
            let (ew, eh) = w.explicit;
            let mut position = 0.0;
            for &(index, r) in &w.laid_out {
                let mut els = ChildElements::new(core, vec![r]);
                let offset = w.layout.get_offset(ew, eh, &mut els, 0, false)?;
                position = index as f32 - offset;
                if offset > -1.0 {
                    break;
                }
            }
            Ok(position)
        })
    }

    /// The fractional index of the last visible item. An item half
    /// scrolled past the trailing edge at index 9 gives 8.5.
    pub fn visible_bottom_position(core: &mut Core, id: TypedId<Self>) -> Result<f32> {
        Self::read(core, id, |w, core| {
            let (ew, eh) = w.explicit;
            let mut position = w.source.len()?.saturating_sub(1) as f32;
            for &(index, r) in w.laid_out.iter().rev() {
                let mut els = ChildElements::new(core, vec![r]);
                let offset = w.layout.get_offset(ew, eh, &mut els, 0, true)?;
                position = index as f32 + offset;
                if offset > -1.0 {
                    break;
                }
            }
            Ok(position)
        })
    }

    /// Change the selection, then update the toggled state of the active
    /// item renderers.
    pub fn with_selection<T>(
        core: &mut Core,
        id: TypedId<Self>,
        f: impl FnOnce(&mut Selection<E>) -> T,
    ) -> Result<T> {
        core.with_widget(id, |w: &mut Self, core| {
            let out = f(&mut w.selection);
            let renderers: Vec<NodeId> = w
                .active_items
                .iter()
                .map(|(_, r)| *r)
                .filter(|r| core.contains(*r))
                .collect();
            for r in renderers {
                core.with_widget(r, |item: &mut R, _| {
                    let toggled = item.data().is_some_and(|d| w.selection.is_selected(d));
                    item.set_toggled(toggled);
                    Ok(())
                })?;
            }
            Ok(out)
        })
    }

    /// The selected items.
    pub fn selected(core: &mut Core, id: TypedId<Self>) -> Result<Vec<E>> {
        core.with_widget(id, |w: &mut Self, _| Ok(w.selection.selected().to_vec()))
    }

    /// Obtain and bind the renderer for item `index`.
    fn obtain(
        &mut self,
        core: &mut Core,
        id: NodeId,
        index: usize,
        item: Option<E>,
    ) -> Result<NodeId> {
        let owner = NodeOptions::default().owned_by(id);
        match item {
            None => {
                let factory = &mut self.null_factory;
                let r = self.nulls.obtain(index, || {
                    let r = core.create_with(factory(), owner)?.id();
                    tracing::debug!(?id, index, "create null renderer");
                    Ok(r)
                })?;
                core.with_widget(r, |w: &mut N, _| {
                    w.set_index(index);
                    Ok(())
                })?;
                Ok(r)
            }
            Some(data) => {
                let factory = &mut self.item_factory;
                let r = self.items.obtain(index, || {
                    let r = core.create_with(factory(), owner)?.id();
                    tracing::debug!(?id, index, "create item renderer");
                    Ok(r)
                })?;
                let toggled = self.selection.is_selected(&data);
                let changed = core.with_widget(r, |w: &mut R, _| {
                    w.set_index(index);
                    w.set_toggled(toggled);
                    Ok(w.set_data(data))
                })?;
                if changed {
                    core.invalidate(r, SIZE_CONSTRAINTS | LAYOUT)?;
                }
                Ok(r)
            }
        }
    }

    /// Walk from `from` in one direction, obtaining and placing renderers
    /// until one falls out of bounds, the data runs out, too many renderers
    /// in a row are skipped, or `max_items` renderers are obtained.
    #[allow(clippy::too_many_arguments)]
    fn layout_elements(
        &mut self,
        core: &mut Core,
        id: NodeId,
        len: usize,
        from: isize,
        start_position: f32,
        reversed: bool,
        mut previous: Option<NodeId>,
    ) -> Result<()> {
        let (ew, eh) = self.explicit;
        let step: isize = if reversed { -1 } else { 1 };
        let mut index = from;
        let mut display = from;
        let mut skipped = 0;
        while index >= 0
            && (index as usize) < len
            && skipped < MAX_SKIPPED
            && self.items.obtained_len() + self.nulls.obtained_len() < self.max_items
        {
            let i = index as usize;
            let item = self.source.get(i)?;
            let is_item = item.is_some();
            let r = self.obtain(core, id, i, item)?;
            if is_item {
                self.active_items.push((i, r));
            } else {
                self.active_nulls.push((i, r));
            }
            if core.parent(r)?.is_none() {
                core.add_child_last(id, r)?;
            }
            if core.should_layout(r)? {
                let ids: Vec<NodeId> = previous.into_iter().chain([r]).collect();
                let element = ids.len() - 1;
                let prev = previous.map(|_| 0);
                let mut els = ChildElements::new(core, ids);
                self.layout.update_layout_entry(
                    ew,
                    eh,
                    &mut els,
                    element,
                    prev,
                    display,
                    start_position,
                    reversed,
                )?;
                previous = Some(r);
                if !self
                    .layout
                    .should_show_renderer(ew, eh, &mut els, element, self.buffer)?
                {
                    break;
                }
                skipped = 0;
                self.laid_out.push((i, r));
                display += step;
            } else {
                skipped += 1;
            }
            index += step;
        }
        Ok(())
    }
}

impl<E, R, N, L> Widget for VirtualList<E, R, N, L>
where
    E: Clone + PartialEq + 'static,
    R: ItemRenderer<E>,
    N: ListRenderer + Default,
    L: VirtualLayoutAlgorithm + 'static,
{
    fn name(&self) -> &'static str {
        "virtual_list"
    }

    fn update_layout(
        &mut self,
        core: &mut Core,
        id: NodeId,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        out: &mut Bounds,
    ) -> Result<()> {
        self.explicit = (explicit_width, explicit_height);
        self.active_items.clear();
        self.active_nulls.clear();
        self.laid_out.clear();
        let len = self.source.len()?;

        let reversed = self.bottom_index_position.is_some();
        let last = len.saturating_sub(1) as f32;
        let position = self
            .bottom_index_position
            .or(self.index_position)
            .unwrap_or(0.0);
        let start = clamp(position, 0.0, last);
        let anchor = if reversed { start.ceil() } else { start.floor() } as isize;

        self.layout_elements(core, id, len, anchor, start, reversed, None)?;
        let first = self.laid_out.first().map(|(_, r)| *r);
        let resume = if reversed { anchor + 1 } else { anchor - 1 };
        self.layout_elements(core, id, len, resume, start, !reversed, first)?;
        self.active_items.sort_by_key(|(i, _)| *i);
        self.active_nulls.sort_by_key(|(i, _)| *i);
        self.laid_out.sort_by_key(|(i, _)| *i);

        out.clear();
        let shown: Vec<NodeId> = self.laid_out.iter().map(|(_, r)| *r).collect();
        self.layout.measure(
            explicit_width,
            explicit_height,
            &mut ChildElements::new(core, shown),
            out,
        )?;

        let mut unused = Vec::new();
        self.items.for_each_unused(|_, r| unused.push(*r));
        self.nulls.for_each_unused(|_, r| unused.push(*r));
        for r in unused {
            core.remove_child(id, r)?;
        }
        let mut released = self.items.flip();
        released.extend(self.nulls.flip());
        for r in released {
            if core.contains(r) {
                tracing::debug!(?id, renderer = ?r, "dispose pooled renderer");
                core.dispose(r)?;
            }
        }

        if let Some(empty) = self.empty_renderer.filter(|r| core.contains(*r)) {
            let show = len == 0;
            if core.visible(empty)? != show {
                core.set_visible(empty, show)?;
            }
            if show {
                let mut els = ChildElements::new(core, vec![empty]);
                self.layout.update_layout_entry(
                    explicit_width,
                    explicit_height,
                    &mut els,
                    0,
                    None,
                    0,
                    0.0,
                    false,
                )?;
                self.layout
                    .measure(explicit_width, explicit_height, &mut els, out)?;
            }
        }

        out.expand_to(explicit_width, explicit_height);
        Ok(())
    }

    fn on_disposed(&mut self, _core: &mut Core, _id: NodeId) -> Result<()> {
        self.source.unwatch();
        self.source = Source::Items(Vec::new());
        // Renderers are owned by the list and disposed with it.
        self.items.clear();
        self.nulls.clear();
        self.active_items.clear();
        self.active_nulls.clear();
        self.laid_out.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, testing::widgets::Block};

    type List = VirtualList<usize>;

    fn list(core: &mut Core, n: usize) -> Result<TypedId<List>> {
        let l = List::create(core, VirtualVerticalLayout::default(), || ItemRow::new(20.0))?;
        core.set_size(l, Some(100.0), Some(100.0))?;
        List::set_buffer(core, l, 0.0)?;
        List::set_data(core, l, (0..n).map(Some).collect())?;
        Ok(l)
    }

    fn indices(v: &[(usize, NodeId)]) -> Vec<usize> {
        v.iter().map(|(i, _)| *i).collect()
    }

    #[test]
    fn windows_to_explicit_size() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 100)?;
        let active = List::active_renderers(&mut core, l)?;
        // Rows 0-4 fill the viewport; row 5 is obtained, found out of
        // bounds, and ends the walk.
        assert_eq!(indices(&active), [0, 1, 2, 3, 4, 5]);
        assert_eq!(core.child_count(l)?, 6);
        assert_eq!(core.bounds(l)?, Bounds::new(100.0, 100.0));
        assert_eq!(core.position(active[1].1)?.y, 20.0);
        assert_eq!(core.width(active[1].1)?, 100.0);
        assert_eq!(List::visible_position(&mut core, l)?, 0.0);
        Ok(())
    }

    #[test]
    fn scrolling_reuses_renderers() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 100)?;
        let before = List::active_item_renderers(&mut core, l)?;

        List::set_index_position(&mut core, l, Some(2.5))?;
        let after = List::active_item_renderers(&mut core, l)?;
        assert_eq!(indices(&after), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(before[3], after[2]);
        assert_eq!(core.position(after[1].1)?.y, -10.0);
        assert_eq!(List::visible_position(&mut core, l)?, 2.5);
        assert_eq!(List::visible_bottom_position(&mut core, l)?, 6.5);
        assert_eq!(core.child_count(l)?, 8);
        Ok(())
    }

    #[test]
    fn bottom_anchor() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 100)?;
        List::set_index_position(&mut core, l, Some(10.0))?;
        List::set_bottom_index_position(&mut core, l, Some(99.0))?;
        assert_eq!(List::index_position(&mut core, l)?, None);
        let active = List::active_renderers(&mut core, l)?;
        assert_eq!(indices(&active), [94, 95, 96, 97, 98, 99]);
        assert_eq!(core.position(active[5].1)?.y, 80.0);
        assert_eq!(List::visible_bottom_position(&mut core, l)?, 99.0);
        Ok(())
    }

    #[test]
    fn max_items_caps_renderers() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 100)?;
        List::set_max_items(&mut core, l, 3)?;
        assert_eq!(indices(&List::active_renderers(&mut core, l)?), [0, 1, 2]);
        assert_eq!(core.height(l)?, 100.0);
        core.set_height(l, None)?;
        assert_eq!(core.height(l)?, 60.0);
        Ok(())
    }

    #[test]
    fn missing_items_use_null_renderers() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 0)?;
        List::set_data(&mut core, l, vec![Some(1), None, Some(3)])?;
        assert_eq!(indices(&List::active_null_renderers(&mut core, l)?), [1]);
        assert_eq!(indices(&List::active_item_renderers(&mut core, l)?), [0, 2]);
        let active = List::active_renderers(&mut core, l)?;
        assert_eq!(core.position(active[2].1)?.y, 40.0);
        Ok(())
    }

    #[test]
    fn selection_follows_data() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 10)?;
        List::with_selection(&mut core, l, |s| s.select(2))?;
        let items = List::active_item_renderers(&mut core, l)?;
        let toggled = |core: &mut Core, r: NodeId| {
            core.with_widget(r, |w: &mut ItemRow<usize>, _| Ok(w.toggled()))
        };
        assert!(toggled(&mut core, items[2].1)?);
        assert!(!toggled(&mut core, items[1].1)?);

        List::set_data(&mut core, l, vec![Some(5), Some(2)])?;
        let items = List::active_item_renderers(&mut core, l)?;
        assert!(toggled(&mut core, items[1].1)?);
        List::set_data(&mut core, l, vec![Some(5)])?;
        assert!(List::selected(&mut core, l)?.is_empty());
        Ok(())
    }

    #[test]
    fn observable_data_and_empty_renderer() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 0)?;
        let empty = core.create(Block::new(30.0, 30.0))?;
        List::set_empty_renderer(&mut core, l, Some(empty.id()))?;
        let data: SharedList<usize> = Rc::new(RefCell::new(ObservableList::default()));
        List::set_observable_data(&mut core, l, Rc::clone(&data))?;
        assert!(List::active_renderers(&mut core, l)?.is_empty());
        assert!(core.visible(empty)?);

        data.borrow_mut().push(Some(7));
        data.borrow_mut().push(None);
        assert_eq!(indices(&List::active_renderers(&mut core, l)?), [0, 1]);
        assert!(!core.visible(empty)?);

        List::set_data(&mut core, l, Vec::new())?;
        data.borrow_mut().push(Some(8));
        assert!(data.borrow().added.is_empty());
        assert!(List::active_renderers(&mut core, l)?.is_empty());
        Ok(())
    }

    #[test]
    fn released_renderers_beyond_capacity_are_disposed() -> Result<()> {
        let mut core = Core::with_config(Config {
            renderer_pool_capacity: 1,
            ..Config::default()
        });
        let l = list(&mut core, 100)?;
        let before = List::active_renderers(&mut core, l)?;
        List::set_data(&mut core, l, vec![Some(0), Some(1)])?;
        assert_eq!(core.child_count(l)?, 2);
        let alive = before.iter().filter(|(_, r)| core.contains(*r)).count();
        // Two reclaimed, one kept in the pool.
        assert_eq!(alive, 3);
        Ok(())
    }

    #[test]
    fn factory_change_and_dispose_release_renderers() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 100)?;
        let old = List::active_renderers(&mut core, l)?;
        List::set_renderer_factory(&mut core, l, || ItemRow::new(50.0))?;
        assert!(old.iter().all(|(_, r)| !core.contains(*r)));
        let new = List::active_renderers(&mut core, l)?;
        assert_eq!(indices(&new), [0, 1, 2]);

        core.dispose(l)?;
        assert!(new.iter().all(|(_, r)| !core.contains(*r)));
        assert!(core.is_empty());
        Ok(())
    }
}
