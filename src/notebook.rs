use crate::{
    background::{BackgroundSpec, BackgroundStyle},
    codec,
    config::Settings,
    core::{Canvas, PageId},
    error::{InknoteError, InknoteResult},
    model::{DOC_VERSION, NotebookDoc, PageDoc},
    page::{LayerSet, Page},
    surface::Surface,
};

/// Where a newly created page lands in the page order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertAt {
    AfterActive,
    AtEnd,
}

struct Entry {
    page: Page,
    layers: LayerSet,
}

/// An ordered collection of pages with exactly one active page.
///
/// Edits only ever reach the active page, so every inactive page's `bitmap`
/// cache stays in sync with its drawing surface; the cache is refreshed
/// whenever a page is deactivated. Settings are read when the notebook or a
/// page is created and later changes never restyle existing pages.
pub struct Notebook {
    canvas: Canvas,
    settings: Settings,
    spec: BackgroundSpec,
    entries: Vec<Entry>,
    active: usize,
    next_id: u64,
}

impl Notebook {
    /// Create a notebook holding a single blank "Page 1".
    pub fn new(canvas: Canvas, settings: Settings) -> InknoteResult<Self> {
        canvas.validate()?;
        settings.validate()?;
        let spec = BackgroundSpec::from_settings(&settings);
        let page = Page::new(PageId(1), 1, settings.default_background);
        let layers = LayerSet::new(canvas, page.style, spec.clone());
        Ok(Self {
            canvas,
            settings,
            spec,
            entries: vec![Entry { page, layers }],
            active: 0,
            next_id: 2,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn page_count(&self) -> usize {
        self.entries.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_id(&self) -> PageId {
        self.entries[self.active].page.id
    }

    pub fn active_page(&self) -> &Page {
        &self.entries[self.active].page
    }

    pub fn active_layers_mut(&mut self) -> &mut LayerSet {
        &mut self.entries[self.active].layers
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.entries.iter().map(|e| &e.page)
    }

    /// Style and drawing surface of every page in order, for export.
    pub fn drawings(&self) -> impl Iterator<Item = (BackgroundStyle, &Surface)> {
        self.entries
            .iter()
            .map(|e| (e.page.style, &e.layers.drawing))
    }

    pub fn background_spec(&self) -> &BackgroundSpec {
        &self.spec
    }

    fn index_of(&self, id: PageId) -> Option<usize> {
        self.entries.iter().position(|e| e.page.id == id)
    }

    /// Insert a blank page and make it active. The outgoing page's bitmap
    /// cache is refreshed first.
    pub fn create_page(&mut self, at: InsertAt) -> InknoteResult<PageId> {
        self.serialize_active_page()?;

        let id = PageId(self.next_id);
        self.next_id += 1;
        let page = Page::new(id, 0, self.settings.default_background);
        let layers = LayerSet::new(self.canvas, page.style, self.spec.clone());

        let index = match at {
            InsertAt::AfterActive => self.active + 1,
            InsertAt::AtEnd => self.entries.len(),
        };
        self.entries.insert(index, Entry { page, layers });
        self.active = index;
        self.renumber();
        Ok(id)
    }

    /// Make another page active. Switching to the current page or to an
    /// unknown id does nothing.
    pub fn switch_to(&mut self, id: PageId) -> InknoteResult<()> {
        if id == self.active_id() {
            return Ok(());
        }
        let Some(index) = self.index_of(id) else {
            tracing::debug!(id = id.0, "switch to unknown page ignored");
            return Ok(());
        };
        self.serialize_active_page()?;
        self.active = index;
        Ok(())
    }

    /// Remove a page. The last remaining page cannot be closed. Closing the
    /// active page activates the previous page, or the first when none
    /// precedes it. Remaining pages are renamed to match their new ordinals.
    pub fn close_page(&mut self, id: PageId) -> InknoteResult<()> {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(id = id.0, "close of unknown page ignored");
            return Ok(());
        };
        if self.entries.len() == 1 {
            return Err(InknoteError::validation("cannot delete the last page"));
        }

        self.entries.remove(index);
        if index == self.active {
            self.active = index.saturating_sub(1);
        } else if index < self.active {
            self.active -= 1;
        }
        self.renumber();
        Ok(())
    }

    /// Reorder a page to `new_index`, clamped to the valid range. The active
    /// page keeps its identity across the reorder.
    pub fn move_page(&mut self, id: PageId, new_index: usize) {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(id = id.0, "move of unknown page ignored");
            return;
        };
        let active_id = self.active_id();
        let new_index = new_index.min(self.entries.len() - 1);
        let entry = self.entries.remove(index);
        self.entries.insert(new_index, entry);
        if let Some(active) = self.index_of(active_id) {
            self.active = active;
        }
        self.renumber();
    }

    /// Change one page's background style in place. The drawing is kept.
    pub fn set_page_style(&mut self, id: PageId, style: BackgroundStyle) {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(id = id.0, "restyle of unknown page ignored");
            return;
        };
        let entry = &mut self.entries[index];
        entry.page.style = style;
        entry.layers.set_style(style);
    }

    fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.page.name = format!("Page {}", i + 1);
        }
    }

    /// Refresh the active page's PNG data URL from its drawing surface.
    pub fn serialize_active_page(&mut self) -> InknoteResult<()> {
        let entry = &mut self.entries[self.active];
        entry.page.bitmap = Some(codec::encode_data_url(&entry.layers.drawing)?);
        Ok(())
    }

    /// Snapshot the notebook as a serializable document.
    pub fn to_doc(&mut self) -> InknoteResult<NotebookDoc> {
        self.serialize_active_page()?;
        Ok(NotebookDoc {
            version: DOC_VERSION,
            canvas: self.canvas,
            active: self.active,
            pages: self
                .entries
                .iter()
                .map(|e| PageDoc {
                    name: e.page.name.clone(),
                    style: e.page.style,
                    bitmap: e.page.bitmap.clone(),
                    created_at: e.page.created_at,
                })
                .collect(),
        })
    }

    /// Rebuild a notebook from a document, decoding every stored bitmap.
    /// Page ids are assigned fresh.
    #[tracing::instrument(skip(doc, settings))]
    pub fn from_doc(doc: &NotebookDoc, settings: Settings) -> InknoteResult<Self> {
        doc.validate()?;
        settings.validate()?;
        let spec = BackgroundSpec::from_settings(&settings);

        let mut entries = Vec::with_capacity(doc.pages.len());
        for (i, pd) in doc.pages.iter().enumerate() {
            let id = PageId(i as u64 + 1);
            let layers = match &pd.bitmap {
                Some(url) => {
                    let drawing = codec::decode_data_url(url, doc.canvas)?;
                    LayerSet::with_drawing(doc.canvas, pd.style, spec.clone(), drawing)
                }
                None => LayerSet::new(doc.canvas, pd.style, spec.clone()),
            };
            entries.push(Entry {
                page: Page {
                    id,
                    name: pd.name.clone(),
                    style: pd.style,
                    bitmap: pd.bitmap.clone(),
                    created_at: pd.created_at,
                },
                layers,
            });
        }

        Ok(Self {
            canvas: doc.canvas,
            settings,
            spec,
            entries,
            active: doc.active,
            next_id: doc.pages.len() as u64 + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::PNG_DATA_URL_PREFIX,
        core::{Point, Rgba8},
        stroke,
    };

    fn small_notebook() -> Notebook {
        let canvas = Canvas {
            width: 64,
            height: 64,
        };
        Notebook::new(canvas, Settings::default()).unwrap()
    }

    fn mark(nb: &mut Notebook) {
        stroke::paint_dot(
            &mut nb.active_layers_mut().drawing,
            Point::new(32.0, 32.0),
            Rgba8::new(200, 40, 40, 255),
            6.0,
        )
        .unwrap();
    }

    #[test]
    fn new_notebook_has_one_named_page() {
        let nb = small_notebook();
        assert_eq!(nb.page_count(), 1);
        assert_eq!(nb.active_page().name, "Page 1");
        assert_eq!(nb.active_id(), PageId(1));
        assert!(nb.active_page().bitmap.is_none());
    }

    #[test]
    fn create_after_active_switches_and_renumbers() {
        let mut nb = small_notebook();
        let second = nb.create_page(InsertAt::AtEnd).unwrap();
        assert_eq!(nb.active_id(), second);

        // Jump back to the first page, then insert after it.
        nb.switch_to(PageId(1)).unwrap();
        let third = nb.create_page(InsertAt::AfterActive).unwrap();
        assert_eq!(nb.active_index(), 1);
        assert_eq!(nb.active_id(), third);

        let names: Vec<_> = nb.pages().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["Page 1", "Page 2", "Page 3"]);
        let ids: Vec<_> = nb.pages().map(|p| p.id).collect();
        assert_eq!(ids, [PageId(1), PageId(3), PageId(2)]);
    }

    #[test]
    fn deactivation_refreshes_bitmap_and_pixels_survive() {
        let mut nb = small_notebook();
        mark(&mut nb);
        let before = nb.active_layers_mut().drawing.data().to_vec();

        nb.create_page(InsertAt::AtEnd).unwrap();
        let first = nb.pages().next().unwrap();
        let bitmap = first.bitmap.clone().unwrap();
        assert!(bitmap.starts_with(PNG_DATA_URL_PREFIX));

        nb.switch_to(PageId(1)).unwrap();
        assert_eq!(nb.active_layers_mut().drawing.data(), &before[..]);

        // The stored bitmap decodes back to the same pixels.
        let decoded = codec::decode_data_url(&bitmap, nb.canvas()).unwrap();
        assert_eq!(decoded.data(), &before[..]);
    }

    #[test]
    fn switch_to_unknown_or_active_is_a_no_op() {
        let mut nb = small_notebook();
        nb.switch_to(PageId(99)).unwrap();
        assert_eq!(nb.active_id(), PageId(1));

        nb.switch_to(PageId(1)).unwrap();
        // Self-switch skips serialization entirely.
        assert!(nb.active_page().bitmap.is_none());
    }

    #[test]
    fn closing_the_last_page_is_refused() {
        let mut nb = small_notebook();
        let err = nb.close_page(PageId(1)).unwrap_err();
        assert!(err.to_string().contains("last page"));
        assert_eq!(nb.page_count(), 1);
    }

    #[test]
    fn closing_the_active_page_activates_previous() {
        let mut nb = small_notebook();
        nb.create_page(InsertAt::AtEnd).unwrap();
        let third = nb.create_page(InsertAt::AtEnd).unwrap();
        assert_eq!(nb.active_id(), third);

        nb.close_page(third).unwrap();
        assert_eq!(nb.page_count(), 2);
        assert_eq!(nb.active_id(), PageId(2));
        let names: Vec<_> = nb.pages().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["Page 1", "Page 2"]);
    }

    #[test]
    fn closing_the_first_page_while_active_activates_first_remaining() {
        let mut nb = small_notebook();
        nb.create_page(InsertAt::AtEnd).unwrap();
        nb.switch_to(PageId(1)).unwrap();

        nb.close_page(PageId(1)).unwrap();
        assert_eq!(nb.active_id(), PageId(2));
        assert_eq!(nb.active_page().name, "Page 1");
    }

    #[test]
    fn closing_a_page_before_the_active_keeps_identity() {
        let mut nb = small_notebook();
        let second = nb.create_page(InsertAt::AtEnd).unwrap();
        let third = nb.create_page(InsertAt::AtEnd).unwrap();
        assert_eq!(nb.active_id(), third);

        nb.close_page(second).unwrap();
        assert_eq!(nb.active_id(), third);
        assert_eq!(nb.active_index(), 1);
    }

    #[test]
    fn move_page_reorders_and_follows_active() {
        let mut nb = small_notebook();
        nb.create_page(InsertAt::AtEnd).unwrap();
        nb.create_page(InsertAt::AtEnd).unwrap();
        nb.switch_to(PageId(1)).unwrap();

        nb.move_page(PageId(1), 2);
        assert_eq!(nb.active_id(), PageId(1));
        assert_eq!(nb.active_index(), 2);
        let names: Vec<_> = nb.pages().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["Page 1", "Page 2", "Page 3"]);
        let ids: Vec<_> = nb.pages().map(|p| p.id).collect();
        assert_eq!(ids, [PageId(2), PageId(3), PageId(1)]);
    }

    #[test]
    fn move_page_clamps_out_of_range_index() {
        let mut nb = small_notebook();
        nb.create_page(InsertAt::AtEnd).unwrap();
        nb.move_page(PageId(1), 99);
        let ids: Vec<_> = nb.pages().map(|p| p.id).collect();
        assert_eq!(ids, [PageId(2), PageId(1)]);
    }

    #[test]
    fn set_page_style_restyles_layers() {
        let mut nb = small_notebook();
        nb.set_page_style(PageId(1), BackgroundStyle::Dots);
        assert_eq!(nb.active_page().style, BackgroundStyle::Dots);
        assert_eq!(nb.active_layers_mut().style(), BackgroundStyle::Dots);
    }

    #[test]
    fn doc_roundtrip_preserves_pages_and_pixels() {
        let mut nb = small_notebook();
        mark(&mut nb);
        let before = nb.active_layers_mut().drawing.data().to_vec();
        nb.create_page(InsertAt::AtEnd).unwrap();
        nb.set_page_style(PageId(2), BackgroundStyle::Dots);

        let doc = nb.to_doc().unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.active, 1);

        let mut back = Notebook::from_doc(&doc, Settings::default()).unwrap();
        assert_eq!(back.page_count(), 2);
        assert_eq!(back.active_index(), 1);
        assert_eq!(back.active_page().style, BackgroundStyle::Dots);

        back.switch_to(PageId(1)).unwrap();
        assert_eq!(back.active_layers_mut().drawing.data(), &before[..]);
    }

    #[test]
    fn from_doc_rejects_mismatched_bitmap_size() {
        let mut nb = small_notebook();
        let mut doc = nb.to_doc().unwrap();
        doc.canvas = Canvas {
            width: 32,
            height: 32,
        };
        assert!(Notebook::from_doc(&doc, Settings::default()).is_err());
    }
}
