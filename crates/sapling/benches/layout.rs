use criterion::{Criterion, black_box, criterion_group, criterion_main};
use sapling::{
    Core, TypedId,
    error::Result,
    flags::SIZE_CONSTRAINTS,
    layout::{
        FlowLayout, GridColumn, GridLayout, GridLayoutStyle, LayoutAlgorithm, LayoutContainer,
        LayoutData, VerticalLayout,
    },
    testing::Block,
    virtual_list::{ItemRow, VirtualList, VirtualVerticalLayout},
};

/// A container of `n` blocks of varying width under `algorithm`.
fn populated<A: LayoutAlgorithm + 'static>(
    core: &mut Core,
    algorithm: A,
    n: usize,
) -> Result<TypedId<LayoutContainer<A>>> {
    let c = LayoutContainer::create(core, algorithm)?;
    for i in 0..n {
        let b = core.create(Block::new(10.0 + (i % 7) as f32 * 5.0, 12.0))?;
        core.add_child_last(c, b)?;
    }
    core.set_width(c, Some(400.0))?;
    Ok(c)
}

fn benchmark_relayout(c: &mut Criterion) {
    let mut group = c.benchmark_group("relayout");

    let mut core = Core::new();
    let flow = populated(&mut core, FlowLayout::default(), 500).expect("flow setup");
    group.bench_function("flow_500", |b| {
        b.iter(|| {
            core.set_width(flow, Some(300.0)).expect("resize");
            black_box(core.height(flow).expect("measure"));
            core.set_width(flow, Some(400.0)).expect("resize");
            black_box(core.height(flow).expect("measure"));
        });
    });

    let mut core = Core::new();
    let grid = GridLayout::new(GridLayoutStyle {
        columns: vec![GridColumn::default(); 4],
        ..GridLayoutStyle::default()
    });
    let grid = populated(&mut core, grid, 500).expect("grid setup");
    group.bench_function("grid_500", |b| {
        b.iter(|| {
            core.invalidate(grid, SIZE_CONSTRAINTS).expect("invalidate");
            black_box(core.height(grid).expect("measure"));
        });
    });

    let mut core = Core::new();
    let column = populated(&mut core, VerticalLayout::default(), 500).expect("column setup");
    let first = core.children(column).expect("children")[0];
    let mut wide = false;
    group.bench_function("vertical_500_child_resize", |b| {
        b.iter(|| {
            wide = !wide;
            let width = if wide { 200.0 } else { 20.0 };
            core.set_layout_data(first, Some(LayoutData::new().with_width(width)))
                .expect("layout data");
            black_box(core.width(column).expect("measure"));
        });
    });
    group.finish();
}

fn benchmark_virtual_list_scroll(c: &mut Criterion) {
    c.bench_function("virtual_list_scroll_10k", |b| {
        let mut core = Core::new();
        let list = VirtualList::<usize>::create(&mut core, VirtualVerticalLayout::default(), || {
            ItemRow::new(20.0)
        })
        .expect("create");
        core.set_size(list, Some(300.0), Some(600.0)).expect("size");
        VirtualList::set_data(&mut core, list, (0..10_000).map(Some).collect()).expect("data");
        let mut position = 0.0;
        b.iter(|| {
            position = (position + 0.75) % 9_900.0;
            VirtualList::set_index_position(&mut core, list, Some(position)).expect("scroll");
            black_box(VirtualList::active_renderers(&mut core, list).expect("layout"));
        });
    });
}

criterion_group!(benches, benchmark_relayout, benchmark_virtual_list_scroll);
criterion_main!(benches);
