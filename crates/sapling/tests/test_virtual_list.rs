//! Integration tests for virtual list windowing.

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use sapling::{
        Core, TypedId,
        error::Result,
        virtual_list::{ItemRenderer, ItemRow, ObservableList, VirtualList, VirtualVerticalLayout},
    };

    type List = VirtualList<usize>;

    /// A 100x100 list of `n` items in 20px rows, with no buffer.
    fn list(core: &mut Core, n: usize) -> Result<TypedId<List>> {
        let l = List::create(core, VirtualVerticalLayout::default(), || ItemRow::new(20.0))?;
        core.set_size(l, Some(100.0), Some(100.0))?;
        List::set_buffer(core, l, 0.0)?;
        List::set_data(core, l, (0..n).map(Some).collect())?;
        Ok(l)
    }

    #[test]
    fn scrolling_keeps_a_contiguous_window() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 100)?;
        for step in 0..=190 {
            let p = step as f32 * 0.5;
            List::set_index_position(&mut core, l, Some(p))?;
            let active = List::active_renderers(&mut core, l)?;
            assert!(active.len() <= 8, "{} renderers at {p}", active.len());
            assert_eq!(core.child_count(l)?, active.len());
            for pair in active.windows(2) {
                assert_eq!(pair[0].0 + 1, pair[1].0);
            }
            for (index, r) in &active {
                assert_eq!(core.position(*r)?.y, (*index as f32 - p) * 20.0);
            }
            assert_eq!(List::visible_position(&mut core, l)?, p);
        }
        Ok(())
    }

    #[test]
    fn observable_inserts_relayout() -> Result<()> {
        let mut core = Core::new();
        let l = list(&mut core, 0)?;
        let data = Rc::new(RefCell::new(ObservableList::new(vec![Some(10), Some(11)])));
        List::set_observable_data(&mut core, l, Rc::clone(&data))?;
        assert_eq!(List::active_renderers(&mut core, l)?.len(), 2);

        data.borrow_mut().insert(0, Some(9))?;
        let items = List::active_item_renderers(&mut core, l)?;
        assert_eq!(items.len(), 3);
        let first = core.with_widget(items[0].1, |w: &mut ItemRow<usize>, _| {
            Ok(w.data().copied())
        })?;
        assert_eq!(first, Some(9));

        data.borrow_mut().replace_all((0..50).map(Some).collect());
        assert_eq!(List::active_renderers(&mut core, l)?.len(), 6);
        Ok(())
    }
}
