//! Integration tests for the render walk and render filters.

#[cfg(test)]
mod tests {
    use sapling::{
        Core,
        error::Result,
        geom::{Color, Mat4, Rect, Vec3},
        layout::text_flow::{MonospaceMetrics, Text},
        render::ColorTransformationFilter,
        testing::{Block, RecordingBatch},
        widget::Group,
    };

    const CLIP: Rect = Rect::new(0.0, 0.0, 100.0, 100.0);
    const GREY: Color = Color::new(0.5, 0.5, 0.5, 1.0);

    #[test]
    fn draws_visible_children_in_order() -> Result<()> {
        let mut core = Core::new();
        let root = core.create_container(Group)?;
        let a = core.create(Block::new(10.0, 10.0))?;
        let hidden = core.create(Block::new(10.0, 10.0))?;
        let b = core.create(Block::new(10.0, 5.0))?;
        for n in [a, hidden, b] {
            core.add_child_last(root, n)?;
        }
        core.set_visible(hidden, false)?;
        core.move_to(b, 20.0, 0.0)?;

        let mut batch = RecordingBatch::new();
        core.render(root, CLIP, &mut batch)?;
        assert_eq!(batch.nodes(), [a.id(), b.id()]);
        assert_eq!(batch.calls[1].rect, Rect::new(0.0, 0.0, 10.0, 5.0));
        let expected = Mat4::from_translation(Vec3::new(20.0, 0.0, 0.0));
        assert!(batch.calls[1].transform.approx_eq(&expected, 1e-6));

        // Fully transparent subtrees are skipped.
        core.set_alpha(b, 0.0)?;
        let mut batch = RecordingBatch::new();
        core.render(root, CLIP, &mut batch)?;
        assert_eq!(batch.nodes(), [a.id()]);
        Ok(())
    }

    #[test]
    fn color_filters_nest_and_restore() -> Result<()> {
        let mut core = Core::new();
        let root = core.create_container(Group)?;
        let inner = core.create_container(Group)?;
        let a = core.create(Block::new(10.0, 10.0))?;
        let b = core.create(Block::new(10.0, 10.0))?;
        core.add_child_last(root, inner)?;
        core.add_child_last(inner, a)?;
        core.add_child_last(root, b)?;
        let outer_filter = core.add_filter(root, ColorTransformationFilter::new(GREY))?;
        core.add_filter(inner, ColorTransformationFilter::new(GREY))?;

        let mut batch = RecordingBatch::new();
        core.render(root, CLIP, &mut batch)?;
        let colors: Vec<Color> = batch.calls.iter().map(|c| c.color).collect();
        assert_eq!(colors, [Color::new(0.25, 0.25, 0.25, 1.0), GREY]);

        core.set_filter_enabled(root, outer_filter, false)?;
        core.set_color_tint(root, Color::new(1.0, 0.0, 0.0, 1.0))?;
        let mut batch = RecordingBatch::new();
        core.render(root, CLIP, &mut batch)?;
        let colors: Vec<Color> = batch.calls.iter().map(|c| c.color).collect();
        assert_eq!(
            colors,
            [Color::new(0.5, 0.0, 0.0, 1.0), Color::new(1.0, 0.0, 0.0, 1.0)]
        );
        assert!(core.set_filter_enabled(root, 5, true).is_err());
        Ok(())
    }

    #[test]
    fn text_draws_one_quad_per_glyph() -> Result<()> {
        let mut core = Core::new();
        let text = core.create(Text::new("ab c", MonospaceMetrics::default()))?;
        let mut batch = RecordingBatch::new();
        core.render(text, CLIP, &mut batch)?;
        let xs: Vec<f32> = batch.calls.iter().map(|c| c.rect.x).collect();
        assert_eq!(xs, [0.0, 8.0, 24.0]);
        assert_eq!(core.width(text)?, 32.0);

        Text::set_text(&mut core, text, "ab")?;
        let mut batch = RecordingBatch::new();
        core.render(text, CLIP, &mut batch)?;
        assert_eq!(batch.calls.len(), 2);
        assert_eq!(core.width(text)?, 16.0);
        Ok(())
    }
}
