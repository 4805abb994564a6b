use crate::{
    error::Result,
    geom::{Bounds, Pad},
    layout::{LayoutData, LayoutElements},
};

/// Placement along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Place {
    /// Left or top.
    Start,
    /// Centered.
    Center,
    /// Right or bottom.
    End,
}

/// The axis elements are packed along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Axis {
    /// Elements in a row.
    Horizontal,
    /// Elements in a column.
    Vertical,
}

/// Resolved style for one packing pass, expressed along the main axis.
#[derive(Debug, Clone, Copy)]
pub(super) struct Stack {
    /// Main axis.
    pub axis: Axis,
    /// Space between elements.
    pub gap: f32,
    /// Padding around the content.
    pub padding: Pad,
    /// Main-axis placement of the whole run when it underflows.
    pub main: Place,
    /// Default cross-axis placement of each element.
    pub cross: Place,
}

/// An element's extent in main/cross terms.
#[derive(Debug, Clone, Copy)]
struct Extent {
    /// Requested main size.
    main: Option<f32>,
    /// Requested main percent.
    main_percent: Option<f32>,
    /// Requested cross size given an available cross size.
    cross: Option<f32>,
    /// Requested cross percent.
    cross_percent: Option<f32>,
}

impl Stack {
    /// Split the padding into (main start, main end, cross start, cross end).
    fn pads(&self) -> (f32, f32, f32, f32) {
        let p = self.padding;
        match self.axis {
            Axis::Horizontal => (p.left, p.right, p.top, p.bottom),
            Axis::Vertical => (p.top, p.bottom, p.left, p.right),
        }
    }

    /// Read an element's layout data along the main axis.
    fn extent(&self, ld: Option<LayoutData>) -> Extent {
        let ld = ld.unwrap_or_default();
        match self.axis {
            Axis::Horizontal => Extent {
                main: ld.width,
                main_percent: ld.width_percent,
                cross: ld.height,
                cross_percent: ld.height_percent,
            },
            Axis::Vertical => Extent {
                main: ld.height,
                main_percent: ld.height_percent,
                cross: ld.width,
                cross_percent: ld.width_percent,
            },
        }
    }

    /// Set an element's size from main/cross values.
    fn set_size(
        &self,
        elements: &mut dyn LayoutElements,
        i: usize,
        main: Option<f32>,
        cross: Option<f32>,
    ) -> Result<()> {
        match self.axis {
            Axis::Horizontal => elements.set_size(i, main, cross),
            Axis::Vertical => elements.set_size(i, cross, main),
        }
    }

    /// An element's measured (main, cross) size.
    fn size(&self, elements: &mut dyn LayoutElements, i: usize) -> Result<(f32, f32)> {
        let (w, h) = (elements.width(i)?, elements.height(i)?);
        Ok(match self.axis {
            Axis::Horizontal => (w, h),
            Axis::Vertical => (h, w),
        })
    }

    /// Place an element at main/cross coordinates.
    fn move_to(
        &self,
        elements: &mut dyn LayoutElements,
        i: usize,
        main: f32,
        cross: f32,
    ) -> Result<()> {
        match self.axis {
            Axis::Horizontal => elements.move_to(i, main, cross),
            Axis::Vertical => elements.move_to(i, cross, main),
        }
    }

    /// Size and place elements in three passes.
    ///
    /// 1. Elements with no main-axis percent (or no available main size) and
    ///    no cross-axis percent take their preferred size.
    /// 2. Elements with a cross-axis percent are sized against the tallest
    ///    cross extent, and the inflexible total is summed.
    /// 3. Percent elements share what is left, scaled down to fit. Their cross
    ///    size is taken against the available cross size.
    ///
    /// `cross_override` supplies each element's cross placement override.
    pub(super) fn layout(
        &self,
        explicit_width: Option<f32>,
        explicit_height: Option<f32>,
        elements: &mut dyn LayoutElements,
        cross_override: impl Fn(&LayoutData) -> Option<Place>,
        out: &mut Bounds,
    ) -> Result<()> {
        let (main_start, main_end, cross_start, cross_end) = self.pads();
        let (explicit_main, explicit_cross) = match self.axis {
            Axis::Horizontal => (explicit_width, explicit_height),
            Axis::Vertical => (explicit_height, explicit_width),
        };
        let av_main = explicit_main.map(|v| v - main_start - main_end);
        let av_cross = explicit_cross.map(|v| v - cross_start - cross_end);
        let flexible = |e: &Extent| av_main.is_some() && e.main_percent.is_some();
        let preferred_main = |e: &Extent| match (e.main_percent, av_main) {
            (Some(p), Some(a)) => Some(p * a),
            _ => e.main,
        };
        let preferred_cross = |e: &Extent, av: Option<f32>| match (e.cross_percent, av) {
            (Some(p), Some(a)) => Some(p * a),
            _ => e.cross,
        };

        let n = elements.len();
        let mut max_cross = av_cross.unwrap_or(0.0);
        for i in 0..n {
            let e = self.extent(elements.layout_data(i)?);
            if !flexible(&e) && e.cross_percent.is_none() {
                self.set_size(elements, i, preferred_main(&e), preferred_cross(&e, av_cross))?;
                max_cross = max_cross.max(self.size(elements, i)?.1);
            }
        }

        let mut inflexible = 0.0;
        let mut flexible_total = 0.0;
        for i in 0..n {
            let e = self.extent(elements.layout_data(i)?);
            if flexible(&e) {
                flexible_total += e.main_percent.unwrap_or(0.0) * av_main.unwrap_or(0.0);
            } else {
                if e.cross_percent.is_some() {
                    let cross = preferred_cross(&e, Some(max_cross));
                    self.set_size(elements, i, preferred_main(&e), cross)?;
                }
                let (main, cross) = self.size(elements, i)?;
                inflexible += main;
                max_cross = max_cross.max(cross);
            }
            if i + 1 < n {
                inflexible += self.gap;
            }
        }

        let scale = match av_main {
            Some(av) if flexible_total > 0.0 => {
                super::clamp((av - inflexible) / flexible_total, 0.0, 1.0)
            }
            _ => 1.0,
        };
        for i in 0..n {
            let e = self.extent(elements.layout_data(i)?);
            if flexible(&e) {
                let main = e.main_percent.unwrap_or(0.0) * av_main.unwrap_or(0.0) * scale;
                self.set_size(elements, i, Some(main), preferred_cross(&e, av_cross))?;
                max_cross = max_cross.max(self.size(elements, i)?.1);
            }
        }

        let mut pos = main_start;
        if let Some(av) = av_main {
            let d = av - (inflexible + flexible_total * scale);
            if d > 0.0 {
                match self.main {
                    Place::Start => {}
                    Place::Center => pos += (d * 0.5).floor(),
                    Place::End => pos += d,
                }
            }
        }
        for i in 0..n {
            let place = elements
                .layout_data(i)?
                .and_then(|ld| cross_override(&ld))
                .unwrap_or(self.cross);
            let (main, cross) = self.size(elements, i)?;
            let c = match place {
                Place::Start => cross_start,
                Place::Center => cross_start + (max_cross - cross) * 0.5,
                Place::End => cross_start + max_cross - cross,
            };
            self.move_to(elements, i, pos, c)?;
            pos += main;
            if i + 1 < n {
                pos += self.gap;
            }
        }

        let measured_main = pos + main_end;
        let measured_cross = max_cross + cross_start + cross_end;
        match self.axis {
            Axis::Horizontal => out.set(measured_main, measured_cross),
            Axis::Vertical => out.set(measured_cross, measured_main),
        }
        Ok(())
    }
}
