use std::path::PathBuf;

use inknote::{BackgroundStyle, Canvas, NotebookDoc, PageDoc, model::DOC_VERSION};

fn simple_doc() -> NotebookDoc {
    NotebookDoc {
        version: DOC_VERSION,
        canvas: Canvas {
            width: 64,
            height: 64,
        },
        active: 0,
        pages: vec![
            PageDoc {
                name: "Page 1".to_string(),
                style: BackgroundStyle::Grid,
                bitmap: None,
                created_at: 0,
            },
            PageDoc {
                name: "Page 2".to_string(),
                style: BackgroundStyle::Blank,
                bitmap: None,
                created_at: 0,
            },
        ],
    }
}

fn bin_path() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_inknote")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "inknote.exe"
            } else {
                "inknote"
            });
            p
        })
}

#[test]
fn cli_page_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let doc_path = dir.join("notebook.json");
    let out_path = dir.join("page.png");
    let _ = std::fs::remove_file(&out_path);

    let f = std::fs::File::create(&doc_path).unwrap();
    serde_json::to_writer_pretty(f, &simple_doc()).unwrap();

    let doc_arg = doc_path.to_string_lossy().to_string();
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(bin_path())
        .args(["page", "--in", doc_arg.as_str(), "--page", "1", "--out"])
        .arg(out_arg.as_str())
        .status()
        .unwrap();

    assert!(status.success());
    assert!(out_path.exists());
}

#[test]
fn cli_export_writes_pdf() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let doc_path = dir.join("notebook_pdf.json");
    let out_path = dir.join("notebook.pdf");
    let _ = std::fs::remove_file(&out_path);

    let f = std::fs::File::create(&doc_path).unwrap();
    serde_json::to_writer_pretty(f, &simple_doc()).unwrap();

    let doc_arg = doc_path.to_string_lossy().to_string();
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(bin_path())
        .args([
            "export",
            "--in",
            doc_arg.as_str(),
            "--dpi",
            "150",
            "--overwrite",
            "--out",
        ])
        .arg(out_arg.as_str())
        .status()
        .unwrap();

    assert!(status.success());
    let bytes = std::fs::read(&out_path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}
