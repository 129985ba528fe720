use inknote::{Canvas, ExportQuality, InsertAt, PdfConfig, Session, Settings, Tool};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut session = Session::new(Canvas::default(), Settings::default())?;

    // Freehand wave across the first page.
    session.pointer_down(100.0, 400.0)?;
    for i in 1..=60 {
        let x = 100.0 + f64::from(i) * 10.0;
        let y = 400.0 + (f64::from(i) * 0.35).sin() * 120.0;
        session.pointer_move(x, y)?;
    }
    session.pointer_up(700.0, 400.0)?;

    // Straight diagonal on a second page.
    session.create_page(InsertAt::AtEnd)?;
    session.set_tool(Tool::Line)?;
    session.pointer_down(80.0, 80.0)?;
    session.pointer_move(720.0, 1040.0)?;
    session.pointer_up(720.0, 1040.0)?;

    let out_path = std::path::Path::new("target").join("sketch_and_export.pdf");
    let config = PdfConfig {
        out_path: out_path.clone(),
        overwrite: true,
        dpi: 150,
        quality: ExportQuality::Normal,
    };
    session.export_pdf(&config)?;

    eprintln!("wrote {}", out_path.display());
    Ok(())
}
