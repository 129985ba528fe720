use crate::{
    background::BackgroundStyle,
    codec,
    core::Canvas,
    error::{InknoteError, InknoteResult},
};

pub const DOC_VERSION: u32 = 1;

/// Persisted form of a notebook: canvas dimensions, active page index, and
/// every page's metadata plus its drawing bitmap.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NotebookDoc {
    pub version: u32,
    pub canvas: Canvas,
    pub active: usize,
    pub pages: Vec<PageDoc>,
}

/// Persisted form of one page. The bitmap holds only committed drawing
/// pixels (never background or selection overlay), encoded as a PNG data
/// URL; `None` means the page has never been drawn on.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PageDoc {
    pub name: String,
    pub style: BackgroundStyle,
    pub bitmap: Option<String>,
    pub created_at: u64,
}

impl NotebookDoc {
    pub fn validate(&self) -> InknoteResult<()> {
        if self.version != DOC_VERSION {
            return Err(InknoteError::validation(format!(
                "unsupported document version {}",
                self.version
            )));
        }
        self.canvas.validate()?;
        if self.pages.is_empty() {
            return Err(InknoteError::validation(
                "document must contain at least one page",
            ));
        }
        if self.active >= self.pages.len() {
            return Err(InknoteError::validation(format!(
                "active page index {} out of range for {} pages",
                self.active,
                self.pages.len()
            )));
        }
        for (i, page) in self.pages.iter().enumerate() {
            if let Some(bitmap) = &page.bitmap
                && !bitmap.starts_with(codec::PNG_DATA_URL_PREFIX)
            {
                return Err(InknoteError::validation(format!(
                    "page {i} bitmap must be a png data url"
                )));
            }
        }
        Ok(())
    }
}
