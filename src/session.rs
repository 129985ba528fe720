//! Pointer input routing and tool state.
//!
//! A session owns one notebook plus the interaction state around it: the
//! active tool, the selection engine with its clipboard, and the phase of
//! the current pointer gesture. Every pointer event enters through the
//! session, which queries the active tool once at dispatch and routes the
//! whole gesture accordingly.

use crate::{
    background::BackgroundStyle,
    config::Settings,
    core::{Canvas, PageId, Point, Rgba8, Tool},
    error::{InknoteError, InknoteResult},
    export::{self, PdfConfig},
    model::NotebookDoc,
    notebook::{InsertAt, Notebook},
    select::{Clipboard, PressOutcome, SelectPhase, SelectionEngine},
    stroke,
    surface::Surface,
};

/// The active tool and its drawing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolState {
    pub tool: Tool,
    pub color: Rgba8,
    pub brush_width: f64,
    pub eraser_width: f64,
}

impl ToolState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tool: Tool::Brush,
            color: settings.brush_color,
            brush_width: settings.brush_width,
            eraser_width: settings.eraser_width,
        }
    }
}

/// Phase of the pointer gesture in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
enum InputPhase {
    Idle,
    /// Brush or eraser stroke; `last` is the previous sample point.
    Stroking { last: Point },
    /// Straight-line tool waiting for release; the dashed preview lives on
    /// the overlay.
    LinePending { anchor: Point },
    /// Pointer is down with the selection tool; events route to the engine.
    Selecting,
}

/// One open notebook with live interaction state.
pub struct Session {
    notebook: Notebook,
    tools: ToolState,
    selection: SelectionEngine,
    clipboard: Clipboard,
    click_through: bool,
    input: InputPhase,
}

impl Session {
    pub fn new(canvas: Canvas, settings: Settings) -> InknoteResult<Self> {
        let tools = ToolState::from_settings(&settings);
        let click_through = settings.select_click_through;
        let notebook = Notebook::new(canvas, settings)?;
        Ok(Self {
            notebook,
            tools,
            selection: SelectionEngine::new(canvas),
            clipboard: Clipboard::default(),
            click_through,
            input: InputPhase::Idle,
        })
    }

    /// Open a session over a deserialized notebook document.
    pub fn from_doc(doc: &NotebookDoc, settings: Settings) -> InknoteResult<Self> {
        let tools = ToolState::from_settings(&settings);
        let click_through = settings.select_click_through;
        let notebook = Notebook::from_doc(doc, settings)?;
        Ok(Self {
            selection: SelectionEngine::new(notebook.canvas()),
            notebook,
            tools,
            clipboard: Clipboard::default(),
            click_through,
            input: InputPhase::Idle,
        })
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn selection_phase(&self) -> SelectPhase {
        self.selection.phase()
    }

    /// The current visible projection of the active page.
    #[tracing::instrument(skip(self))]
    pub fn composite(&mut self) -> InknoteResult<&Surface> {
        self.notebook.active_layers_mut().composite()
    }

    /// Switch tools. A pending line preview is discarded; a pending
    /// selection is committed so switching never loses ink.
    pub fn set_tool(&mut self, tool: Tool) -> InknoteResult<()> {
        if self.tools.tool == tool {
            return Ok(());
        }
        self.resolve_pending()?;
        self.tools.tool = tool;
        Ok(())
    }

    pub fn set_color(&mut self, color: Rgba8) {
        self.tools.color = color;
    }

    pub fn set_brush_width(&mut self, width: f64) -> InknoteResult<()> {
        if !width.is_finite() || width <= 0.0 {
            return Err(InknoteError::validation(
                "brush width must be a positive finite number",
            ));
        }
        self.tools.brush_width = width;
        Ok(())
    }

    pub fn set_eraser_width(&mut self, width: f64) -> InknoteResult<()> {
        if !width.is_finite() || width <= 0.0 {
            return Err(InknoteError::validation(
                "eraser width must be a positive finite number",
            ));
        }
        self.tools.eraser_width = width;
        Ok(())
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> InknoteResult<()> {
        let p = Point::new(x, y);
        match self.tools.tool {
            Tool::Brush => {
                let layers = self.notebook.active_layers_mut();
                stroke::paint_dot(
                    &mut layers.drawing,
                    p,
                    self.tools.color,
                    self.tools.brush_width,
                )?;
                self.input = InputPhase::Stroking { last: p };
            }
            Tool::Eraser => {
                let layers = self.notebook.active_layers_mut();
                stroke::erase_dot(&mut layers.drawing, p, self.tools.eraser_width)?;
                self.input = InputPhase::Stroking { last: p };
            }
            Tool::Line => {
                let layers = self.notebook.active_layers_mut();
                layers.overlay.clear();
                stroke::dashed_segment(
                    &mut layers.overlay,
                    p,
                    p,
                    self.tools.color,
                    self.tools.brush_width,
                )?;
                self.input = InputPhase::LinePending { anchor: p };
            }
            Tool::Select => {
                let (px, py) = (x.floor() as i32, y.floor() as i32);
                let layers = self.notebook.active_layers_mut();
                let outcome = self.selection.press(&mut layers.drawing, px, py)?;
                if outcome == PressOutcome::Committed && self.click_through {
                    // The press was not consumed: the same point starts the
                    // next gesture.
                    self.selection.press(&mut layers.drawing, px, py)?;
                }
                self.selection.render_overlay(&mut layers.overlay)?;
                self.input = InputPhase::Selecting;
            }
        }
        Ok(())
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> InknoteResult<()> {
        let p = Point::new(x, y);
        match self.input {
            InputPhase::Idle => Ok(()),
            InputPhase::Stroking { last } => {
                let layers = self.notebook.active_layers_mut();
                match self.tools.tool {
                    Tool::Brush => stroke::paint_segment(
                        &mut layers.drawing,
                        last,
                        p,
                        self.tools.color,
                        self.tools.brush_width,
                    )?,
                    Tool::Eraser => stroke::erase_segment(
                        &mut layers.drawing,
                        last,
                        p,
                        self.tools.eraser_width,
                    )?,
                    _ => {}
                }
                self.input = InputPhase::Stroking { last: p };
                Ok(())
            }
            InputPhase::LinePending { anchor } => {
                let layers = self.notebook.active_layers_mut();
                layers.overlay.clear();
                stroke::dashed_segment(
                    &mut layers.overlay,
                    anchor,
                    p,
                    self.tools.color,
                    self.tools.brush_width,
                )
            }
            InputPhase::Selecting => {
                self.selection.drag(x.floor() as i32, y.floor() as i32);
                let layers = self.notebook.active_layers_mut();
                self.selection.render_overlay(&mut layers.overlay)
            }
        }
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> InknoteResult<()> {
        let p = Point::new(x, y);
        match self.input {
            InputPhase::Idle => Ok(()),
            InputPhase::Stroking { last } => {
                if p != last {
                    let layers = self.notebook.active_layers_mut();
                    match self.tools.tool {
                        Tool::Brush => stroke::paint_segment(
                            &mut layers.drawing,
                            last,
                            p,
                            self.tools.color,
                            self.tools.brush_width,
                        )?,
                        Tool::Eraser => stroke::erase_segment(
                            &mut layers.drawing,
                            last,
                            p,
                            self.tools.eraser_width,
                        )?,
                        _ => {}
                    }
                }
                self.input = InputPhase::Idle;
                Ok(())
            }
            InputPhase::LinePending { anchor } => {
                let layers = self.notebook.active_layers_mut();
                layers.overlay.clear();
                stroke::paint_segment(
                    &mut layers.drawing,
                    anchor,
                    p,
                    self.tools.color,
                    self.tools.brush_width,
                )?;
                self.input = InputPhase::Idle;
                Ok(())
            }
            InputPhase::Selecting => {
                let layers = self.notebook.active_layers_mut();
                self.selection.release(&mut layers.drawing)?;
                self.selection.render_overlay(&mut layers.overlay)?;
                self.input = InputPhase::Idle;
                Ok(())
            }
        }
    }

    /// Abort the gesture in progress. Ink already deposited stays; a line
    /// preview is discarded; a pending selection is committed in place.
    pub fn cancel(&mut self) -> InknoteResult<()> {
        self.resolve_pending()
    }

    /// Copy the selection into the clipboard. Returns `false` when nothing
    /// is selected.
    pub fn copy_selection(&mut self) -> bool {
        self.selection.copy_selection(&mut self.clipboard)
    }

    pub fn cut_selection(&mut self) -> InknoteResult<bool> {
        let layers = self.notebook.active_layers_mut();
        let cut = self
            .selection
            .cut_selection(&mut layers.drawing, &mut self.clipboard)?;
        self.selection.render_overlay(&mut layers.overlay)?;
        Ok(cut)
    }

    pub fn delete_selection(&mut self) -> InknoteResult<bool> {
        let layers = self.notebook.active_layers_mut();
        let deleted = self.selection.delete_selection(&mut layers.drawing)?;
        self.selection.render_overlay(&mut layers.overlay)?;
        Ok(deleted)
    }

    /// Paste the clipboard as a floating selection and activate the
    /// selection tool so it is immediately movable. Any gesture in progress
    /// ends as it does on a tool switch: a pending line preview is
    /// discarded, not committed.
    pub fn paste(&mut self) -> InknoteResult<bool> {
        let layers = self.notebook.active_layers_mut();
        let pasted = self.selection.paste(&mut layers.drawing, &self.clipboard)?;
        self.selection.render_overlay(&mut layers.overlay)?;
        if pasted {
            self.tools.tool = Tool::Select;
            self.input = InputPhase::Idle;
        }
        Ok(pasted)
    }

    pub fn create_page(&mut self, at: InsertAt) -> InknoteResult<PageId> {
        self.resolve_pending()?;
        self.notebook.create_page(at)
    }

    pub fn switch_page(&mut self, id: PageId) -> InknoteResult<()> {
        self.resolve_pending()?;
        self.notebook.switch_to(id)
    }

    pub fn close_page(&mut self, id: PageId) -> InknoteResult<()> {
        self.resolve_pending()?;
        self.notebook.close_page(id)
    }

    pub fn move_page(&mut self, id: PageId, new_index: usize) {
        self.notebook.move_page(id, new_index);
    }

    pub fn set_page_style(&mut self, id: PageId, style: BackgroundStyle) {
        self.notebook.set_page_style(id, style);
    }

    /// Snapshot the notebook, committing any floating selection first so the
    /// document never loses ink that was only held in the overlay.
    pub fn to_doc(&mut self) -> InknoteResult<NotebookDoc> {
        self.resolve_pending()?;
        self.notebook.to_doc()
    }

    /// Export every page to a PDF file.
    pub fn export_pdf(&mut self, config: &PdfConfig) -> InknoteResult<()> {
        self.resolve_pending()?;
        export::export_pdf(&self.notebook, config)
    }

    /// Commit the selection, drop any preview, and return to idle.
    fn resolve_pending(&mut self) -> InknoteResult<()> {
        let layers = self.notebook.active_layers_mut();
        self.selection.commit(&mut layers.drawing)?;
        self.selection.render_overlay(&mut layers.overlay)?;
        self.input = InputPhase::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let canvas = Canvas {
            width: 100,
            height: 100,
        };
        Session::new(canvas, Settings::default()).unwrap()
    }

    fn drawing_pixel(session: &mut Session, x: u32, y: u32) -> [u8; 4] {
        session.notebook.active_layers_mut().drawing.pixel(x, y)
    }

    fn overlay_is_empty(session: &mut Session) -> bool {
        session
            .notebook
            .active_layers_mut()
            .overlay
            .data()
            .iter()
            .all(|&b| b == 0)
    }

    #[test]
    fn brush_click_without_motion_deposits_a_dot() {
        let mut s = session();
        s.set_brush_width(8.0).unwrap();
        s.pointer_down(50.0, 50.0).unwrap();
        s.pointer_up(50.0, 50.0).unwrap();
        assert_eq!(drawing_pixel(&mut s, 50, 50), [0, 0, 0, 255]);
    }

    #[test]
    fn brush_drag_paints_a_contiguous_stroke() {
        let mut s = session();
        s.pointer_down(10.0, 50.0).unwrap();
        s.pointer_move(50.0, 50.0).unwrap();
        s.pointer_up(90.0, 50.0).unwrap();
        for x in [10, 30, 50, 70] {
            assert_eq!(drawing_pixel(&mut s, x, 50), [0, 0, 0, 255], "x={x}");
        }
        // The release point carries the round cap's antialiased edge.
        assert!(drawing_pixel(&mut s, 90, 50)[3] > 0);
    }

    #[test]
    fn eraser_removes_brush_ink() {
        let mut s = session();
        s.pointer_down(50.0, 50.0).unwrap();
        s.pointer_up(50.0, 50.0).unwrap();

        s.set_tool(Tool::Eraser).unwrap();
        s.pointer_down(50.0, 50.0).unwrap();
        s.pointer_up(50.0, 50.0).unwrap();
        assert_eq!(drawing_pixel(&mut s, 50, 50), [0, 0, 0, 0]);
    }

    #[test]
    fn line_preview_stays_on_overlay_until_release() {
        let mut s = session();
        s.set_tool(Tool::Line).unwrap();
        s.pointer_down(10.0, 10.0).unwrap();
        s.pointer_move(90.0, 10.0).unwrap();

        assert!(!overlay_is_empty(&mut s));
        assert_eq!(drawing_pixel(&mut s, 50, 10), [0, 0, 0, 0]);

        s.pointer_up(90.0, 10.0).unwrap();
        assert!(overlay_is_empty(&mut s));
        for x in [10, 30, 50, 70] {
            assert_eq!(drawing_pixel(&mut s, x, 10), [0, 0, 0, 255], "x={x}");
        }
        assert!(drawing_pixel(&mut s, 90, 10)[3] > 0);
    }

    #[test]
    fn tool_switch_discards_line_preview() {
        let mut s = session();
        s.set_tool(Tool::Line).unwrap();
        s.pointer_down(10.0, 10.0).unwrap();
        s.pointer_move(90.0, 10.0).unwrap();

        s.set_tool(Tool::Brush).unwrap();
        assert!(overlay_is_empty(&mut s));
        s.pointer_up(90.0, 10.0).unwrap();
        assert_eq!(drawing_pixel(&mut s, 50, 10), [0, 0, 0, 0]);
    }

    fn draw_block_and_select(s: &mut Session) {
        s.pointer_down(30.0, 30.0).unwrap();
        s.pointer_move(40.0, 40.0).unwrap();
        s.pointer_up(40.0, 40.0).unwrap();
        s.set_tool(Tool::Select).unwrap();
        s.pointer_down(20.0, 20.0).unwrap();
        s.pointer_move(50.0, 50.0).unwrap();
        s.pointer_up(50.0, 50.0).unwrap();
        assert_eq!(s.selection_phase(), SelectPhase::HasSelection);
    }

    #[test]
    fn outside_press_commits_and_starts_a_new_marquee() {
        let mut s = session();
        draw_block_and_select(&mut s);

        s.pointer_down(80.0, 80.0).unwrap();
        assert_eq!(s.selection_phase(), SelectPhase::Marqueeing);
        s.pointer_up(81.0, 81.0).unwrap();
        assert_eq!(s.selection_phase(), SelectPhase::Idle);
    }

    #[test]
    fn outside_press_only_commits_when_click_through_disabled() {
        let canvas = Canvas {
            width: 100,
            height: 100,
        };
        let settings = Settings {
            select_click_through: false,
            ..Settings::default()
        };
        let mut s = Session::new(canvas, settings).unwrap();
        draw_block_and_select(&mut s);

        s.pointer_down(80.0, 80.0).unwrap();
        assert_eq!(s.selection_phase(), SelectPhase::Idle);
    }

    #[test]
    fn paste_floats_and_activates_the_selection_tool() {
        let mut s = session();
        draw_block_and_select(&mut s);
        assert!(s.copy_selection());
        s.set_tool(Tool::Brush).unwrap();

        assert!(s.paste().unwrap());
        assert_eq!(s.tools().tool, Tool::Select);
        assert_eq!(s.selection_phase(), SelectPhase::HasSelection);
    }

    #[test]
    fn paste_with_empty_clipboard_reports_false() {
        let mut s = session();
        assert!(!s.paste().unwrap());
        assert_eq!(s.tools().tool, Tool::Brush);
    }

    #[test]
    fn paste_discards_a_pending_line_preview() {
        let mut s = session();
        draw_block_and_select(&mut s);
        assert!(s.copy_selection());
        s.set_tool(Tool::Line).unwrap();
        s.pointer_down(10.0, 90.0).unwrap();

        assert!(s.paste().unwrap());
        assert_eq!(s.tools().tool, Tool::Select);
        // The release that follows must not commit a line from the stale
        // anchor, and the pasted selection stays on the overlay.
        s.pointer_up(90.0, 90.0).unwrap();
        assert_eq!(drawing_pixel(&mut s, 70, 90), [0, 0, 0, 0]);
        assert!(!overlay_is_empty(&mut s));
        assert_eq!(s.selection_phase(), SelectPhase::HasSelection);
    }

    #[test]
    fn cut_then_paste_relocates_ink() {
        let mut s = session();
        draw_block_and_select(&mut s);
        assert!(s.cut_selection().unwrap());
        assert_eq!(drawing_pixel(&mut s, 35, 35), [0, 0, 0, 0]);

        assert!(s.paste().unwrap());
        s.set_tool(Tool::Brush).unwrap();
        // Committed 16 px down-right of the original capture.
        assert_eq!(drawing_pixel(&mut s, 51, 51), [0, 0, 0, 255]);
    }

    #[test]
    fn page_switch_commits_a_floating_selection() {
        let mut s = session();
        draw_block_and_select(&mut s);
        assert!(s.cut_selection().unwrap());
        assert!(s.paste().unwrap());

        let first = s.notebook().active_id();
        s.create_page(InsertAt::AtEnd).unwrap();
        s.switch_page(first).unwrap();
        assert_eq!(drawing_pixel(&mut s, 51, 51), [0, 0, 0, 255]);
        assert!(overlay_is_empty(&mut s));
    }

    #[test]
    fn setters_validate_widths() {
        let mut s = session();
        assert!(s.set_brush_width(0.0).is_err());
        assert!(s.set_eraser_width(f64::NAN).is_err());
        s.set_brush_width(4.0).unwrap();
        assert_eq!(s.tools().brush_width, 4.0);
    }
}
