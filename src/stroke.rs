use crate::{
    composite,
    core::{BezPath, Canvas, Point, Rgba8},
    error::{InknoteError, InknoteResult},
    surface::Surface,
};

/// Flattening tolerance for stroke expansion and circle paths, in pixels.
const STROKE_TOLERANCE: f64 = 0.1;

/// Points closer than this collapse to a dot.
const MIN_SEGMENT_LEN: f64 = 1e-6;

/// Rasterize a filled path into a fresh transparent surface.
///
/// Output is antialiased premultiplied RGBA8 and deterministic for identical
/// inputs.
pub fn rasterize_fill(canvas: Canvas, path: &BezPath, color: Rgba8) -> InknoteResult<Surface> {
    let width: u16 = canvas
        .width
        .try_into()
        .map_err(|_| InknoteError::raster("canvas width exceeds u16"))?;
    let height: u16 = canvas
        .height
        .try_into()
        .map_err(|_| InknoteError::raster("canvas height exceeds u16"))?;

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    let mut ctx = vello_cpu::RenderContext::new(width, height);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(path));
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    Surface::from_parts(
        canvas.width,
        canvas.height,
        pixmap.data_as_u8_slice().to_vec(),
    )
}

/// Expand a segment from `a` to `b` into a fill region: round caps, round
/// joins, optional `[on, off]` dash pattern. A degenerate segment becomes a
/// round dot of the stroke width.
pub fn segment_outline(a: Point, b: Point, width: f64, dash: Option<[f64; 2]>) -> BezPath {
    use kurbo::Shape as _;

    if (b - a).hypot() < MIN_SEGMENT_LEN {
        let radius = (width / 2.0).max(0.5);
        return kurbo::Circle::new(a, radius).to_path(STROKE_TOLERANCE);
    }

    let mut path = BezPath::new();
    path.move_to(a);
    path.line_to(b);

    let mut style = kurbo::Stroke::new(width)
        .with_caps(kurbo::Cap::Round)
        .with_join(kurbo::Join::Round);
    if let Some([on, off]) = dash {
        style = style.with_dashes(0.0, [on, off]);
    }

    kurbo::stroke(
        path.elements().iter().copied(),
        &style,
        &kurbo::StrokeOpts::default(),
        STROKE_TOLERANCE,
    )
}

/// Rasterized coverage of one stroke segment on a transparent surface.
pub fn segment_coverage(
    canvas: Canvas,
    a: Point,
    b: Point,
    width: f64,
    color: Rgba8,
    dash: Option<[f64; 2]>,
) -> InknoteResult<Surface> {
    let outline = segment_outline(a, b, width, dash);
    rasterize_fill(canvas, &outline, color)
}

/// Paint one brush segment onto the drawing surface with source-over.
pub fn paint_segment(
    drawing: &mut Surface,
    a: Point,
    b: Point,
    color: Rgba8,
    width: f64,
) -> InknoteResult<()> {
    let coverage = segment_coverage(drawing.canvas(), a, b, width, color, None)?;
    composite::over_in_place(drawing.data_mut(), coverage.data())
}

/// Paint a single round dot, the degenerate zero-length stroke.
pub fn paint_dot(drawing: &mut Surface, p: Point, color: Rgba8, width: f64) -> InknoteResult<()> {
    paint_segment(drawing, p, p, color, width)
}

/// Erase one segment from the drawing surface with destination-out.
pub fn erase_segment(drawing: &mut Surface, a: Point, b: Point, width: f64) -> InknoteResult<()> {
    let coverage = segment_coverage(drawing.canvas(), a, b, width, Rgba8::BLACK, None)?;
    composite::erase_in_place(drawing.data_mut(), coverage.data())
}

/// Erase a single round dot.
pub fn erase_dot(drawing: &mut Surface, p: Point, width: f64) -> InknoteResult<()> {
    erase_segment(drawing, p, p, width)
}

/// Draw the dashed straight-line preview onto the overlay surface.
///
/// The caller clears the overlay first; the preview never touches the
/// drawing surface.
pub fn dashed_segment(
    overlay: &mut Surface,
    a: Point,
    b: Point,
    color: Rgba8,
    width: f64,
) -> InknoteResult<()> {
    let coverage = segment_coverage(overlay.canvas(), a, b, width, color, Some([5.0, 5.0]))?;
    composite::over_in_place(overlay.data_mut(), coverage.data())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba8 = Rgba8 {
        r: 255,
        g: 0,
        b: 0,
        a: 255,
    };

    fn canvas() -> Canvas {
        Canvas {
            width: 64,
            height: 64,
        }
    }

    fn coverage_count(s: &Surface) -> usize {
        s.data().chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    #[test]
    fn dot_is_opaque_at_center() {
        let mut drawing = Surface::new(canvas());
        paint_dot(&mut drawing, Point::new(32.0, 32.0), RED, 10.0).unwrap();
        assert_eq!(drawing.pixel(32, 32), [255, 0, 0, 255]);
    }

    #[test]
    fn zero_length_segment_still_marks() {
        let mut drawing = Surface::new(canvas());
        paint_segment(
            &mut drawing,
            Point::new(20.0, 20.0),
            Point::new(20.0, 20.0),
            RED,
            2.0,
        )
        .unwrap();
        assert!(coverage_count(&drawing) > 0);
    }

    #[test]
    fn segment_covers_both_endpoints_and_midpoint() {
        let mut drawing = Surface::new(canvas());
        paint_segment(
            &mut drawing,
            Point::new(10.0, 32.0),
            Point::new(54.0, 32.0),
            RED,
            4.0,
        )
        .unwrap();
        assert_eq!(drawing.pixel(10, 32), [255, 0, 0, 255]);
        assert_eq!(drawing.pixel(32, 32), [255, 0, 0, 255]);
        assert_eq!(drawing.pixel(54, 32), [255, 0, 0, 255]);
        assert_eq!(drawing.pixel(32, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn erase_clears_painted_region() {
        let mut drawing = Surface::new(canvas());
        paint_segment(
            &mut drawing,
            Point::new(10.0, 32.0),
            Point::new(54.0, 32.0),
            RED,
            6.0,
        )
        .unwrap();
        erase_segment(
            &mut drawing,
            Point::new(10.0, 32.0),
            Point::new(54.0, 32.0),
            10.0,
        )
        .unwrap();
        assert_eq!(drawing.pixel(32, 32), [0, 0, 0, 0]);
    }

    #[test]
    fn dashed_preview_has_gaps() {
        let a = Point::new(4.0, 32.0);
        let b = Point::new(60.0, 32.0);
        let solid = segment_coverage(canvas(), a, b, 2.0, RED, None).unwrap();
        let dashed = segment_coverage(canvas(), a, b, 2.0, RED, Some([5.0, 5.0])).unwrap();
        assert!(coverage_count(&dashed) > 0);
        assert!(coverage_count(&dashed) < coverage_count(&solid));
    }

    #[test]
    fn rasterization_is_deterministic() {
        let a = Point::new(7.3, 11.9);
        let b = Point::new(51.2, 40.6);
        let first = segment_coverage(canvas(), a, b, 3.0, RED, None).unwrap();
        let second = segment_coverage(canvas(), a, b, 3.0, RED, None).unwrap();
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn off_canvas_segment_clips_silently() {
        let mut drawing = Surface::new(canvas());
        paint_segment(
            &mut drawing,
            Point::new(-20.0, 32.0),
            Point::new(20.0, 32.0),
            RED,
            4.0,
        )
        .unwrap();
        assert_eq!(drawing.pixel(10, 32), [255, 0, 0, 255]);
    }
}
