use kurbo::Shape as _;

use crate::{
    composite,
    config::Settings,
    core::{BezPath, Canvas, Rgba8},
    error::InknoteResult,
    stroke,
    surface::Surface,
};

/// Page background pattern. Regenerated from settings on demand, never
/// persisted with the drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStyle {
    Blank,
    Grid,
    Dots,
}

/// Pattern geometry and colors, captured from settings when a page is
/// created so later settings edits never restyle existing pages.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundSpec {
    pub grid_spacing: f64,
    pub grid_line_width: f64,
    pub grid_color: Rgba8,
    pub dot_spacing: f64,
    pub dot_radius: f64,
    pub dot_color: Rgba8,
}

impl BackgroundSpec {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            grid_spacing: settings.grid_spacing,
            grid_line_width: settings.grid_line_width,
            grid_color: settings.grid_color,
            dot_spacing: settings.dot_spacing,
            dot_radius: settings.dot_radius,
            dot_color: settings.dot_color,
        }
    }
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Render an opaque background surface: white base plus the style's marks.
///
/// `scale` multiplies the pattern geometry; export uses it to re-render
/// backgrounds crisply at print resolution while `target` carries the scaled
/// pixel dimensions.
pub fn render_background(
    target: Canvas,
    style: BackgroundStyle,
    spec: &BackgroundSpec,
    scale: f64,
) -> InknoteResult<Surface> {
    let mut bg = Surface::new(target);
    bg.fill(Rgba8::WHITE.to_premul());

    let marks = match style {
        BackgroundStyle::Blank => return Ok(bg),
        BackgroundStyle::Grid => {
            let path = grid_path(
                target,
                spec.grid_spacing * scale,
                spec.grid_line_width * scale,
            );
            stroke::rasterize_fill(target, &path, spec.grid_color)?
        }
        BackgroundStyle::Dots => {
            let path = dots_path(target, spec.dot_spacing * scale, spec.dot_radius * scale);
            stroke::rasterize_fill(target, &path, spec.dot_color)?
        }
    };

    composite::over_in_place(bg.data_mut(), marks.data())?;
    Ok(bg)
}

/// Grid lines every `spacing` pixels, both axes, including the borders.
fn grid_path(target: Canvas, spacing: f64, line_width: f64) -> BezPath {
    let w = f64::from(target.width);
    let h = f64::from(target.height);
    let half = line_width / 2.0;
    let mut path = BezPath::new();

    let mut x = 0.0;
    while x <= w + 1e-9 {
        push_rect(&mut path, kurbo::Rect::new(x - half, 0.0, x + half, h));
        x += spacing;
    }
    let mut y = 0.0;
    while y <= h + 1e-9 {
        push_rect(&mut path, kurbo::Rect::new(0.0, y - half, w, y + half));
        y += spacing;
    }
    path
}

/// Round dots at interior grid intersections.
fn dots_path(target: Canvas, spacing: f64, radius: f64) -> BezPath {
    let w = f64::from(target.width);
    let h = f64::from(target.height);
    let mut path = BezPath::new();

    let mut y = spacing;
    while y < h {
        let mut x = spacing;
        while x < w {
            let circle = kurbo::Circle::new((x, y), radius).to_path(0.1);
            for el in circle.elements() {
                path.push(*el);
            }
            x += spacing;
        }
        y += spacing;
    }
    path
}

fn push_rect(path: &mut BezPath, rect: kurbo::Rect) {
    for el in rect.to_path(0.1).elements() {
        path.push(*el);
    }
}
