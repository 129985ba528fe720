#![forbid(unsafe_code)]

pub mod background;
pub mod codec;
pub mod composite;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod model;
pub mod notebook;
pub mod page;
pub mod select;
pub mod session;
pub mod stroke;
pub mod surface;

pub use background::BackgroundStyle;
pub use config::{ExportQuality, Settings};
pub use core::{Canvas, PageId, PixelRect, Rgba8, Tool};
pub use error::{InknoteError, InknoteResult};
pub use export::PdfConfig;
pub use model::{NotebookDoc, PageDoc};
pub use notebook::{InsertAt, Notebook};
pub use select::SelectPhase;
pub use session::{Session, ToolState};
pub use surface::Surface;
