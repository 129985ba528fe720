//! Multi-page PDF export.
//!
//! Every page is rasterized at the configured print resolution, fitted onto
//! an A4 sheet with its aspect ratio preserved, and embedded as a
//! zlib-compressed RGB image. The whole document is assembled in memory and
//! written in one step, so a failed export never leaves a partial file.

use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use flate2::{Compression, write::ZlibEncoder};
use image::imageops::FilterType;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

use crate::{
    background::{self, BackgroundSpec, BackgroundStyle},
    composite,
    config::{ExportQuality, Settings},
    core::Canvas,
    error::{InknoteError, InknoteResult},
    notebook::Notebook,
    surface::Surface,
};

/// A4 sheet in PostScript points (210 x 297 mm at 72 pt/inch).
pub const A4_WIDTH_PT: f64 = 210.0 / 25.4 * 72.0;
pub const A4_HEIGHT_PT: f64 = 297.0 / 25.4 * 72.0;

pub const MIN_EXPORT_DPI: u32 = 150;
pub const MAX_EXPORT_DPI: u32 = 600;

#[derive(Clone, Debug)]
pub struct PdfConfig {
    pub out_path: PathBuf,
    pub overwrite: bool,
    /// Raster resolution of the embedded page images, in dots per inch of
    /// printed A4 output.
    pub dpi: u32,
    pub quality: ExportQuality,
}

impl PdfConfig {
    pub fn validate(&self) -> InknoteResult<()> {
        if !(MIN_EXPORT_DPI..=MAX_EXPORT_DPI).contains(&self.dpi) {
            return Err(InknoteError::validation(format!(
                "export dpi must be between {MIN_EXPORT_DPI} and {MAX_EXPORT_DPI}"
            )));
        }
        Ok(())
    }

    pub fn with_out_path(mut self, out_path: impl Into<PathBuf>) -> Self {
        self.out_path = out_path.into();
        self
    }
}

/// Export configuration seeded from notebook settings.
pub fn default_pdf_config(out_path: impl Into<PathBuf>, settings: &Settings) -> PdfConfig {
    PdfConfig {
        out_path: out_path.into(),
        overwrite: false,
        dpi: settings.export_dpi,
        quality: settings.export_quality,
    }
}

pub fn ensure_parent_dir(path: &Path) -> InknoteResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Render the whole notebook to PDF and write it to the configured path.
#[tracing::instrument(skip(notebook, config))]
pub fn export_pdf(notebook: &Notebook, config: &PdfConfig) -> InknoteResult<()> {
    config.validate()?;
    if !config.overwrite && config.out_path.exists() {
        return Err(InknoteError::validation(format!(
            "output file '{}' already exists",
            config.out_path.display()
        )));
    }

    let bytes = render_pdf(notebook, config.dpi, config.quality)?;

    ensure_parent_dir(&config.out_path)?;
    std::fs::write(&config.out_path, &bytes)
        .with_context(|| format!("failed to write '{}'", config.out_path.display()))?;
    Ok(())
}

/// Build the PDF document in memory, one A4 page per notebook page.
pub fn render_pdf(
    notebook: &Notebook,
    dpi: u32,
    quality: ExportQuality,
) -> InknoteResult<Vec<u8>> {
    if !(MIN_EXPORT_DPI..=MAX_EXPORT_DPI).contains(&dpi) {
        return Err(InknoteError::validation(format!(
            "export dpi must be between {MIN_EXPORT_DPI} and {MAX_EXPORT_DPI}"
        )));
    }

    let canvas = notebook.canvas();
    let (draw_w_pt, draw_h_pt, x_pt, y_pt) = fit_a4(canvas);
    let px_w = (draw_w_pt / 72.0 * f64::from(dpi)).round() as u32;
    let px_h =
        (f64::from(px_w) * f64::from(canvas.height) / f64::from(canvas.width)).round() as u32;
    let scale = f64::from(px_w) / f64::from(canvas.width);
    let target = Canvas {
        width: px_w,
        height: px_h,
    };

    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    pdf.catalog(catalog_id).pages(tree_id);

    let page_count = notebook.page_count();
    let page_ids: Vec<Ref> = (0..page_count)
        .map(|i| Ref::new(3 + 3 * i as i32))
        .collect();
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(page_count as i32);

    for (i, (style, drawing)) in notebook.drawings().enumerate() {
        let image_id = Ref::new(4 + 3 * i as i32);
        let content_id = Ref::new(5 + 3 * i as i32);

        let rgb = render_page_rgb(
            target,
            scale,
            style,
            notebook.background_spec(),
            drawing,
            quality,
        )?;
        let data = {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(&rgb)
                .context("failed to compress page image")?;
            encoder.finish().context("failed to compress page image")?
        };

        let mut image = pdf.image_xobject(image_id, &data);
        image.filter(Filter::FlateDecode);
        image.width(px_w as i32);
        image.height(px_h as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, A4_WIDTH_PT as f32, A4_HEIGHT_PT as f32));
        page.parent(tree_id);
        page.contents(content_id);
        page.resources().x_objects().pair(Name(b"Im0"), image_id);
        page.finish();

        let mut content = Content::new();
        content.save_state();
        content.transform([
            draw_w_pt as f32,
            0.0,
            0.0,
            draw_h_pt as f32,
            x_pt as f32,
            y_pt as f32,
        ]);
        content.x_object(Name(b"Im0"));
        content.restore_state();
        pdf.stream(content_id, &content.finish());
    }

    Ok(pdf.finish())
}

/// Rasterize one page at export resolution and return opaque RGB bytes.
///
/// The background is re-rendered from its vector description at the scaled
/// size; the drawing layer is resampled up with the configured filter.
fn render_page_rgb(
    target: Canvas,
    scale: f64,
    style: BackgroundStyle,
    spec: &BackgroundSpec,
    drawing: &Surface,
    quality: ExportQuality,
) -> InknoteResult<Vec<u8>> {
    let mut page = background::render_background(target, style, spec, scale)?;

    let pixels = drawing.data().to_vec();
    let src = image::RgbaImage::from_raw(drawing.width(), drawing.height(), pixels)
        .ok_or_else(|| InknoteError::export("drawing buffer size mismatch"))?;
    let filter = match quality {
        ExportQuality::Normal => FilterType::Nearest,
        ExportQuality::High => FilterType::Triangle,
        ExportQuality::Ultra => FilterType::CatmullRom,
    };
    let scaled = image::imageops::resize(&src, target.width, target.height, filter);
    composite::over_in_place(page.data_mut(), scaled.as_raw())?;

    // The background is opaque, so the composite has full alpha everywhere
    // and the premultiplied channels are the displayed colors.
    let mut rgb = Vec::with_capacity(target.byte_len() / 4 * 3);
    for px in page.data().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    Ok(rgb)
}

/// Placement of the canvas on an A4 sheet: drawn size in points plus the
/// offset that centers it.
fn fit_a4(canvas: Canvas) -> (f64, f64, f64, f64) {
    let w = f64::from(canvas.width);
    let h = f64::from(canvas.height);
    let (draw_w, draw_h) = if w / h > A4_WIDTH_PT / A4_HEIGHT_PT {
        (A4_WIDTH_PT, A4_WIDTH_PT * h / w)
    } else {
        (A4_HEIGHT_PT * w / h, A4_HEIGHT_PT)
    };
    let x = (A4_WIDTH_PT - draw_w) / 2.0;
    let y = (A4_HEIGHT_PT - draw_h) / 2.0;
    (draw_w, draw_h, x, y)
}

/// Suggested file name for an export started at the given unix time, e.g.
/// `drawing-2026-08-23.pdf`.
pub fn default_file_name(now_secs: u64) -> String {
    let (y, m, d) = civil_from_days((now_secs / 86_400) as i64);
    format!("drawing-{y:04}-{m:02}-{d:02}.pdf")
}

/// Gregorian calendar date for a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}
