use crate::{
    composite,
    core::{Canvas, PixelRect},
    error::{InknoteError, InknoteResult},
};

/// Owned premultiplied RGBA8 pixel buffer, row-major, tightly packed.
///
/// Every layer of a page (background, drawing, overlay, composite) and every
/// captured selection is one of these. Surfaces never resize after creation.
#[derive(Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Fully transparent surface of the canvas dimensions.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.byte_len()],
        }
    }

    /// Wrap an existing premultiplied RGBA8 buffer, checking its length.
    pub fn from_parts(width: u32, height: u32, data: Vec<u8>) -> InknoteResult<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(InknoteError::raster(
                "surface byte length must be width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Fill every pixel with one premultiplied RGBA8 value.
    pub fn fill(&mut self, premul: [u8; 4]) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    /// Read one pixel. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Extract a rectangular region into a new surface.
    ///
    /// The rectangle must be normalized and lie fully inside this surface.
    pub fn copy_region(&self, rect: PixelRect) -> InknoteResult<Surface> {
        if rect.w < 0
            || rect.h < 0
            || rect.x < 0
            || rect.y < 0
            || rect.x + rect.w > self.width as i32
            || rect.y + rect.h > self.height as i32
        {
            return Err(InknoteError::raster("copy_region rect out of bounds"));
        }

        let w = rect.w as usize;
        let mut out = Vec::with_capacity(w * rect.h as usize * 4);
        for row in 0..rect.h as usize {
            let y = rect.y as usize + row;
            let start = (y * self.width as usize + rect.x as usize) * 4;
            out.extend_from_slice(&self.data[start..start + w * 4]);
        }
        Surface::from_parts(rect.w as u32, rect.h as u32, out)
    }

    /// Set every pixel inside the rectangle to transparent. Clips silently.
    pub fn clear_region(&mut self, rect: PixelRect) {
        let Some(rect) = rect.normalized().intersect_canvas(self.canvas()) else {
            return;
        };
        let w = rect.w as usize;
        for row in 0..rect.h as usize {
            let y = rect.y as usize + row;
            let start = (y * self.width as usize + rect.x as usize) * 4;
            self.data[start..start + w * 4].fill(0);
        }
    }

    /// Composite `src` onto this surface at `(x, y)` with source-over,
    /// clipping to the destination bounds.
    pub fn stamp(&mut self, src: &Surface, x: i32, y: i32) -> InknoteResult<()> {
        let placed = PixelRect::new(x, y, src.width as i32, src.height as i32);
        let Some(visible) = placed.intersect_canvas(self.canvas()) else {
            return Ok(());
        };

        let src_x0 = (visible.x - x) as usize;
        let src_y0 = (visible.y - y) as usize;
        let w = visible.w as usize;

        for row in 0..visible.h as usize {
            let dst_start =
                ((visible.y as usize + row) * self.width as usize + visible.x as usize) * 4;
            let src_start = ((src_y0 + row) * src.width as usize + src_x0) * 4;
            composite::over_in_place(
                &mut self.data[dst_start..dst_start + w * 4],
                &src.data[src_start..src_start + w * 4],
            )?;
        }
        Ok(())
    }
}
