use crate::{
    background::{self, BackgroundSpec, BackgroundStyle},
    composite,
    core::{Canvas, PageId},
    error::{InknoteError, InknoteResult},
    surface::Surface,
};

/// Page metadata and its persisted drawing bitmap.
#[derive(Clone, Debug)]
pub struct Page {
    pub id: PageId,
    /// Display name, derived from the page's ordinal position.
    pub name: String,
    pub style: BackgroundStyle,
    /// PNG data URL of the drawing surface, refreshed on page switches and
    /// explicit serialization. `None` until the page is first serialized.
    pub bitmap: Option<String>,
    pub created_at: u64,
}

impl Page {
    pub fn new(id: PageId, ordinal: usize, style: BackgroundStyle) -> Self {
        Self {
            id,
            name: format!("Page {ordinal}"),
            style,
            bitmap: None,
            created_at: unix_now(),
        }
    }
}

/// The four surfaces backing one page.
///
/// Background is derived and rendered lazily; drawing accumulates committed
/// pixels and is the only surface that persists; overlay holds transient
/// previews and selection chrome; composite is a projection recomputed from
/// the other three and is never a source of truth.
#[derive(Debug)]
pub struct LayerSet {
    canvas: Canvas,
    style: BackgroundStyle,
    spec: BackgroundSpec,
    background: Option<Surface>,
    pub drawing: Surface,
    pub overlay: Surface,
    composite: Surface,
}

impl LayerSet {
    pub fn new(canvas: Canvas, style: BackgroundStyle, spec: BackgroundSpec) -> Self {
        Self {
            canvas,
            style,
            spec,
            background: None,
            drawing: Surface::new(canvas),
            overlay: Surface::new(canvas),
            composite: Surface::new(canvas),
        }
    }

    /// Build a layer set around an already-decoded drawing surface.
    pub fn with_drawing(
        canvas: Canvas,
        style: BackgroundStyle,
        spec: BackgroundSpec,
        drawing: Surface,
    ) -> Self {
        let mut layers = Self::new(canvas, style, spec);
        layers.drawing = drawing;
        layers
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn style(&self) -> BackgroundStyle {
        self.style
    }

    /// Change the background style, dropping the cached background surface.
    /// The drawing surface is untouched.
    pub fn set_style(&mut self, style: BackgroundStyle) {
        if self.style != style {
            self.style = style;
            self.background = None;
        }
    }

    fn ensure_background(&mut self) -> InknoteResult<()> {
        if self.background.is_none() {
            self.background = Some(background::render_background(
                self.canvas,
                self.style,
                &self.spec,
                1.0,
            )?);
        }
        Ok(())
    }

    /// The rendered background, materialized on first use.
    pub fn background(&mut self) -> InknoteResult<&Surface> {
        self.ensure_background()?;
        self.background
            .as_ref()
            .ok_or_else(|| InknoteError::raster("background surface missing"))
    }

    /// Recompute the visible projection: background, then drawing, then
    /// overlay, all source-over.
    pub fn composite(&mut self) -> InknoteResult<&Surface> {
        self.ensure_background()?;
        let bg = self
            .background
            .as_ref()
            .ok_or_else(|| InknoteError::raster("background surface missing"))?;

        self.composite.data_mut().copy_from_slice(bg.data());
        composite::over_in_place(self.composite.data_mut(), self.drawing.data())?;
        composite::over_in_place(self.composite.data_mut(), self.overlay.data())?;
        Ok(&self.composite)
    }
}

/// Seconds since the unix epoch; zero when the clock reads before it.
pub fn unix_now() -> u64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(d) => d.as_secs(),
        Err(_) => 0,
    }
}
