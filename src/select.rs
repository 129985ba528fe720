//! Rectangular selection: marquee, capture, move, and clipboard transfer.
//!
//! The engine is an explicit state machine over the drawing surface. Captured
//! pixels stay in the drawing until a move begins; only then is the source
//! region cleared and the selection carried as floating pixels. Pasted
//! content is floating from the start. Floating pixels are stamped back on
//! release or commit, so cancelling or switching tools never loses ink.

use kurbo::Shape as _;

use crate::{
    core::{BezPath, Canvas, PixelRect, Point, Rgba8},
    error::InknoteResult,
    stroke,
    surface::Surface,
};

/// Marquees with a normalized width or height at or below this are treated
/// as accidental clicks and discarded on release.
pub const MIN_SELECTION_PX: i32 = 5;

/// Offset applied to the clipboard source rectangle when pasting.
pub const PASTE_OFFSET_PX: i32 = 16;

/// Side length of the square corner handles drawn around a selection.
const HANDLE_PX: f64 = 6.0;

#[derive(Debug)]
enum SelectState {
    Idle,
    /// Rubber-band drag in progress. `rect` extents may be negative while
    /// the pointer is above or left of the origin.
    Marquee { origin: (i32, i32), rect: PixelRect },
    /// A captured selection at rest. When `floating` is false the pixels are
    /// still present in the drawing and committing is a no-op; when true
    /// (pasted content) they exist only here and commit stamps them down.
    Held {
        rect: PixelRect,
        pixels: Surface,
        floating: bool,
    },
    /// Selection following the pointer. The source region has been cleared,
    /// so the pixels are always floating.
    Moving {
        rect: PixelRect,
        pixels: Surface,
        grab: (i32, i32),
    },
}

/// Externally visible phase of the selection engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectPhase {
    Idle,
    Marqueeing,
    HasSelection,
    Moving,
}

/// What a pointer press did, so the caller can decide whether to re-route
/// the same press as the start of a new gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    StartedMarquee,
    StartedMove,
    /// The press landed outside a held selection; the selection was
    /// committed and the press itself is still unconsumed.
    Committed,
}

/// Holds the most recent copy or cut together with its source rectangle,
/// which anchors where a paste lands.
#[derive(Debug, Default)]
pub struct Clipboard {
    content: Option<(Surface, PixelRect)>,
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    pub fn set(&mut self, pixels: Surface, rect: PixelRect) {
        self.content = Some((pixels, rect));
    }

    pub fn get(&self) -> Option<(&Surface, PixelRect)> {
        self.content.as_ref().map(|(s, r)| (s, *r))
    }
}

#[derive(Debug)]
pub struct SelectionEngine {
    canvas: Canvas,
    state: SelectState,
}

impl SelectionEngine {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            state: SelectState::Idle,
        }
    }

    pub fn phase(&self) -> SelectPhase {
        match self.state {
            SelectState::Idle => SelectPhase::Idle,
            SelectState::Marquee { .. } => SelectPhase::Marqueeing,
            SelectState::Held { .. } => SelectPhase::HasSelection,
            SelectState::Moving { .. } => SelectPhase::Moving,
        }
    }

    /// The held or moving selection rectangle, if any.
    pub fn selection_rect(&self) -> Option<PixelRect> {
        match &self.state {
            SelectState::Held { rect, .. } | SelectState::Moving { rect, .. } => Some(*rect),
            _ => None,
        }
    }

    /// Route a pointer press.
    ///
    /// Inside a held selection the press starts a move, clearing the source
    /// region if the pixels were not already floating. Outside, the
    /// selection is committed and [`PressOutcome::Committed`] tells the
    /// caller the press has not been consumed.
    pub fn press(&mut self, drawing: &mut Surface, x: i32, y: i32) -> InknoteResult<PressOutcome> {
        match std::mem::replace(&mut self.state, SelectState::Idle) {
            SelectState::Held {
                rect,
                pixels,
                floating,
            } if rect.contains(x, y) => {
                if !floating {
                    drawing.clear_region(rect);
                }
                self.state = SelectState::Moving {
                    rect,
                    pixels,
                    grab: (x - rect.x, y - rect.y),
                };
                Ok(PressOutcome::StartedMove)
            }
            SelectState::Held {
                rect,
                pixels,
                floating,
            } => {
                if floating {
                    drawing.stamp(&pixels, rect.x, rect.y)?;
                }
                Ok(PressOutcome::Committed)
            }
            SelectState::Moving { rect, pixels, .. } => {
                drawing.stamp(&pixels, rect.x, rect.y)?;
                Ok(PressOutcome::Committed)
            }
            SelectState::Idle | SelectState::Marquee { .. } => {
                self.state = SelectState::Marquee {
                    origin: (x, y),
                    rect: PixelRect::new(x, y, 0, 0),
                };
                Ok(PressOutcome::StartedMarquee)
            }
        }
    }

    /// Route a pointer drag. Grows the marquee or carries the selection,
    /// keeping a moving selection fully inside the canvas.
    pub fn drag(&mut self, x: i32, y: i32) {
        match &mut self.state {
            SelectState::Marquee { origin, rect } => {
                *rect = PixelRect::new(origin.0, origin.1, x - origin.0, y - origin.1);
            }
            SelectState::Moving { rect, grab, .. } => {
                let next = PixelRect::new(x - grab.0, y - grab.1, rect.w, rect.h);
                *rect = next.clamp_into(self.canvas);
            }
            SelectState::Idle | SelectState::Held { .. } => {}
        }
    }

    /// Route a pointer release.
    ///
    /// Ends a marquee by capturing the covered pixels, or ends a move by
    /// stamping the floating pixels at their final position. Marquees at or
    /// below [`MIN_SELECTION_PX`] in either extent are discarded.
    pub fn release(&mut self, drawing: &mut Surface) -> InknoteResult<()> {
        match std::mem::replace(&mut self.state, SelectState::Idle) {
            SelectState::Marquee { rect, .. } => {
                let norm = rect.normalized();
                if norm.w <= MIN_SELECTION_PX || norm.h <= MIN_SELECTION_PX {
                    return Ok(());
                }
                let Some(clipped) = norm.intersect_canvas(self.canvas) else {
                    return Ok(());
                };
                let pixels = drawing.copy_region(clipped)?;
                self.state = SelectState::Held {
                    rect: clipped,
                    pixels,
                    floating: false,
                };
                Ok(())
            }
            SelectState::Moving { rect, pixels, .. } => drawing.stamp(&pixels, rect.x, rect.y),
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Resolve any pending selection without losing ink, returning to idle.
    ///
    /// Floating pixels are stamped at their current position; a non-floating
    /// hold is simply released (its pixels never left the drawing); an
    /// unfinished marquee is dropped.
    pub fn commit(&mut self, drawing: &mut Surface) -> InknoteResult<()> {
        match std::mem::replace(&mut self.state, SelectState::Idle) {
            SelectState::Held {
                rect,
                pixels,
                floating: true,
            }
            | SelectState::Moving { rect, pixels, .. } => drawing.stamp(&pixels, rect.x, rect.y),
            _ => Ok(()),
        }
    }

    /// Copy the held selection into the clipboard. Clipboard operations act
    /// on a settled selection only, so this returns `false` both when
    /// nothing is selected and while a move is still in flight.
    pub fn copy_selection(&self, clipboard: &mut Clipboard) -> bool {
        match &self.state {
            SelectState::Held { rect, pixels, .. } => {
                clipboard.set(pixels.clone(), *rect);
                true
            }
            _ => false,
        }
    }

    /// Copy the held selection into the clipboard and remove it from the
    /// drawing. A selection mid-move is left to finish its drag.
    pub fn cut_selection(
        &mut self,
        drawing: &mut Surface,
        clipboard: &mut Clipboard,
    ) -> InknoteResult<bool> {
        match std::mem::replace(&mut self.state, SelectState::Idle) {
            SelectState::Held {
                rect,
                pixels,
                floating,
            } => {
                if !floating {
                    drawing.clear_region(rect);
                }
                clipboard.set(pixels, rect);
                Ok(true)
            }
            other => {
                self.state = other;
                Ok(false)
            }
        }
    }

    /// Remove the held selection without touching the clipboard. A selection
    /// mid-move is left to finish its drag.
    pub fn delete_selection(&mut self, drawing: &mut Surface) -> InknoteResult<bool> {
        match std::mem::replace(&mut self.state, SelectState::Idle) {
            SelectState::Held { rect, floating, .. } => {
                if !floating {
                    drawing.clear_region(rect);
                }
                Ok(true)
            }
            other => {
                self.state = other;
                Ok(false)
            }
        }
    }

    /// Land the clipboard content as a new floating selection, offset from
    /// its source rectangle and clamped onto the canvas. Any pending
    /// selection is committed first. Returns `false` on an empty clipboard.
    pub fn paste(&mut self, drawing: &mut Surface, clipboard: &Clipboard) -> InknoteResult<bool> {
        let Some((pixels, source)) = clipboard.get() else {
            return Ok(false);
        };
        self.commit(drawing)?;

        let rect = PixelRect::new(
            source.x + PASTE_OFFSET_PX,
            source.y + PASTE_OFFSET_PX,
            source.w,
            source.h,
        )
        .clamp_into(self.canvas);
        self.state = SelectState::Held {
            rect,
            pixels: pixels.clone(),
            floating: true,
        };
        Ok(true)
    }

    /// Redraw the overlay for the current state: marquee band, selection
    /// border with corner handles, and any floating pixels.
    pub fn render_overlay(&self, overlay: &mut Surface) -> InknoteResult<()> {
        overlay.clear();
        match &self.state {
            SelectState::Idle => Ok(()),
            SelectState::Marquee { rect, .. } => {
                let norm = rect.normalized();
                if norm.w > 0 && norm.h > 0 {
                    dashed_border(overlay, norm)?;
                }
                Ok(())
            }
            SelectState::Held {
                rect,
                pixels,
                floating,
            } => {
                if *floating {
                    overlay.stamp(pixels, rect.x, rect.y)?;
                }
                dashed_border(overlay, *rect)?;
                corner_handles(overlay, *rect)
            }
            SelectState::Moving { rect, pixels, .. } => {
                overlay.stamp(pixels, rect.x, rect.y)?;
                dashed_border(overlay, *rect)?;
                corner_handles(overlay, *rect)
            }
        }
    }
}

/// Dashed one-pixel border along the inside edge of the rectangle.
fn dashed_border(overlay: &mut Surface, rect: PixelRect) -> InknoteResult<()> {
    let x0 = f64::from(rect.x) + 0.5;
    let y0 = f64::from(rect.y) + 0.5;
    let x1 = f64::from(rect.x + rect.w) - 0.5;
    let y1 = f64::from(rect.y + rect.h) - 0.5;

    stroke::dashed_segment(overlay, Point::new(x0, y0), Point::new(x1, y0), Rgba8::BLACK, 1.0)?;
    stroke::dashed_segment(overlay, Point::new(x1, y0), Point::new(x1, y1), Rgba8::BLACK, 1.0)?;
    stroke::dashed_segment(overlay, Point::new(x1, y1), Point::new(x0, y1), Rgba8::BLACK, 1.0)?;
    stroke::dashed_segment(overlay, Point::new(x0, y1), Point::new(x0, y0), Rgba8::BLACK, 1.0)
}

/// Filled squares on the four selection corners.
fn corner_handles(overlay: &mut Surface, rect: PixelRect) -> InknoteResult<()> {
    let half = HANDLE_PX / 2.0;
    let mut path = BezPath::new();
    for (cx, cy) in [
        (rect.x, rect.y),
        (rect.x + rect.w, rect.y),
        (rect.x, rect.y + rect.h),
        (rect.x + rect.w, rect.y + rect.h),
    ] {
        let (cx, cy) = (f64::from(cx), f64::from(cy));
        push_rect(
            &mut path,
            kurbo::Rect::new(cx - half, cy - half, cx + half, cy + half),
        );
    }
    let coverage = stroke::rasterize_fill(overlay.canvas(), &path, Rgba8::BLACK)?;
    crate::composite::over_in_place(overlay.data_mut(), coverage.data())
}

fn push_rect(path: &mut BezPath, rect: kurbo::Rect) {
    for el in rect.to_path(0.1).elements() {
        path.push(*el);
    }
}
