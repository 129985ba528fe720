use crate::{
    background::BackgroundStyle,
    core::Rgba8,
    error::{InknoteError, InknoteResult},
};

/// Resampling quality for the drawing layer during PDF export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    Normal,
    High,
    Ultra,
}

/// Notebook-level configuration.
///
/// Read when a notebook or page is created; later edits never restyle
/// already-created pages. Unknown or missing fields fall back to defaults so
/// older documents keep loading.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Background style for newly created pages.
    pub default_background: BackgroundStyle,
    pub brush_color: Rgba8,
    pub brush_width: f64,
    pub eraser_width: f64,
    pub grid_spacing: f64,
    pub grid_line_width: f64,
    pub grid_color: Rgba8,
    pub dot_spacing: f64,
    pub dot_radius: f64,
    pub dot_color: Rgba8,
    /// Print resolution for PDF export, 150-600 dpi.
    pub export_dpi: u32,
    pub export_quality: ExportQuality,
    /// When true, a press outside a held selection both commits it and starts
    /// a new gesture at the same point; when false the press only commits.
    pub select_click_through: bool,
    /// Suggested interval for hosts that poll page serialization. The engine
    /// itself runs no timer.
    pub autosave_interval_secs: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_background: BackgroundStyle::Grid,
            brush_color: Rgba8::BLACK,
            brush_width: 2.0,
            eraser_width: 10.0,
            grid_spacing: 20.0,
            grid_line_width: 0.5,
            grid_color: Rgba8::new(224, 224, 224, 255),
            dot_spacing: 20.0,
            dot_radius: 1.0,
            dot_color: Rgba8::new(224, 224, 224, 255),
            export_dpi: 300,
            export_quality: ExportQuality::High,
            select_click_through: true,
            autosave_interval_secs: 30,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> InknoteResult<()> {
        for (name, value) in [
            ("brush_width", self.brush_width),
            ("eraser_width", self.eraser_width),
            ("grid_spacing", self.grid_spacing),
            ("grid_line_width", self.grid_line_width),
            ("dot_spacing", self.dot_spacing),
            ("dot_radius", self.dot_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(InknoteError::validation(format!(
                    "{name} must be a positive finite number"
                )));
            }
        }
        if !(150..=600).contains(&self.export_dpi) {
            return Err(InknoteError::validation(
                "export_dpi must be between 150 and 600",
            ));
        }
        if self.autosave_interval_secs < 5 {
            return Err(InknoteError::validation(
                "autosave_interval_secs must be at least 5",
            ));
        }
        Ok(())
    }
}
