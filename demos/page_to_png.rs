use inknote::{NotebookDoc, Session, Settings};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let s = include_str!("../tests/data/simple_notebook.json");
    let doc: NotebookDoc = serde_json::from_str(s)?;
    doc.validate()?;

    let mut session = Session::from_doc(&doc, Settings::default())?;
    let nb = session.notebook();
    println!(
        "page {}/{}: {}",
        nb.active_index() + 1,
        nb.page_count(),
        nb.active_page().name
    );

    // The composite is opaque, so premultiplied bytes are valid PNG output.
    let frame = session.composite()?;
    let out_path = std::path::Path::new("target").join("page_to_png.png");
    image::save_buffer_with_format(
        &out_path,
        frame.data(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )?;

    eprintln!("wrote {}", out_path.display());
    Ok(())
}
