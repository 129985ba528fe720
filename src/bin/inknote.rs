use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "inknote", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single page as a PNG.
    Page(PageArgs),
    /// Export the whole notebook as a PDF.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct PageArgs {
    /// Input notebook JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Page index (0-based).
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input notebook JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PDF path. Defaults to drawing-YYYY-MM-DD.pdf in the current
    /// directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Raster resolution of the embedded page images.
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// Resampling quality for the drawing layer.
    #[arg(long, value_enum, default_value_t = QualityChoice::High)]
    quality: QualityChoice,

    /// Replace the output file if it already exists.
    #[arg(long)]
    overwrite: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityChoice {
    Normal,
    High,
    Ultra,
}

impl From<QualityChoice> for inknote::ExportQuality {
    fn from(choice: QualityChoice) -> Self {
        match choice {
            QualityChoice::Normal => inknote::ExportQuality::Normal,
            QualityChoice::High => inknote::ExportQuality::High,
            QualityChoice::Ultra => inknote::ExportQuality::Ultra,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Page(args) => cmd_page(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn read_doc_json(path: &Path) -> anyhow::Result<inknote::NotebookDoc> {
    let f = File::open(path).with_context(|| format!("open notebook '{}'", path.display()))?;
    let r = BufReader::new(f);
    let doc: inknote::NotebookDoc =
        serde_json::from_reader(r).with_context(|| "parse notebook JSON")?;
    Ok(doc)
}

fn cmd_page(args: PageArgs) -> anyhow::Result<()> {
    let doc = read_doc_json(&args.in_path)?;
    doc.validate()?;

    let mut notebook = inknote::Notebook::from_doc(&doc, inknote::Settings::default())?;
    if args.page >= notebook.page_count() {
        anyhow::bail!(
            "page {} out of bounds ({} pages)",
            args.page,
            notebook.page_count()
        );
    }
    // Pages are numbered from 1 in document order.
    notebook.switch_to(inknote::PageId(args.page as u64 + 1))?;
    let canvas = notebook.canvas();
    let composite = notebook.active_layers_mut().composite()?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        composite.data(),
        canvas.width,
        canvas.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let doc = read_doc_json(&args.in_path)?;
    doc.validate()?;

    let notebook = inknote::Notebook::from_doc(&doc, inknote::Settings::default())?;
    let out_path = args.out.unwrap_or_else(|| {
        PathBuf::from(inknote::export::default_file_name(inknote::page::unix_now()))
    });

    let config = inknote::PdfConfig {
        out_path,
        overwrite: args.overwrite,
        dpi: args.dpi,
        quality: args.quality.into(),
    };
    inknote::export::export_pdf(&notebook, &config)?;

    eprintln!("wrote {}", config.out_path.display());
    Ok(())
}
